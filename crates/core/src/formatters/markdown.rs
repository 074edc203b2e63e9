use std::sync::Arc;

use scraper::Html;

use super::TextConverter;
use crate::Result;

/// Markdown conversion backed by the `htmd` crate, with ATX headings.
#[cfg(feature = "markdown")]
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmdConverter;

#[cfg(feature = "markdown")]
impl TextConverter for HtmdConverter {
    fn to_formatted_text(&self, html: &str) -> Result<String> {
        htmd::convert(html).map_err(|e| crate::BlinkpressError::ConversionError(format!("HTML to Markdown: {}", e)))
    }
}

/// Fallback that keeps only the text nodes of the fragment.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextConverter;

impl TextConverter for PlainTextConverter {
    fn to_formatted_text(&self, html: &str) -> Result<String> {
        let fragment = Html::parse_fragment(html);
        Ok(fragment.root_element().text().collect::<String>().trim().to_string())
    }
}

/// Markdown when the `markdown` feature is enabled, plain text otherwise.
#[cfg(feature = "markdown")]
pub fn default_text_converter() -> Arc<dyn TextConverter> {
    Arc::new(HtmdConverter)
}

/// Markdown when the `markdown` feature is enabled, plain text otherwise.
#[cfg(not(feature = "markdown"))]
pub fn default_text_converter() -> Arc<dyn TextConverter> {
    Arc::new(PlainTextConverter)
}
