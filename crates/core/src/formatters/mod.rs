//! HTML fragment to formatted text conversion.
//!
//! The extractor only depends on the [`TextConverter`] trait, so the Markdown
//! backend can be swapped without touching the pipeline.

pub mod markdown;

pub use markdown::{PlainTextConverter, default_text_converter};
#[cfg(feature = "markdown")]
pub use markdown::HtmdConverter;

use crate::Result;

/// Converts an HTML fragment into lightweight formatted text.
pub trait TextConverter: Send + Sync {
    fn to_formatted_text(&self, html: &str) -> Result<String>;
}
