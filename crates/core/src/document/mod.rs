//! Output document converters.
//!
//! The assembler writes each section to its own Markdown file and then asks a
//! [`DocumentConverter`] to concatenate those files, in order, into the final
//! document.

pub mod markdown;
#[cfg(feature = "pdf")]
pub mod pdf;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use markdown::MarkdownConverter;
#[cfg(feature = "pdf")]
pub use pdf::PdfConverter;

use crate::config::DocumentFormat;
use crate::{BlinkpressError, Result};

/// Concatenates ordered Markdown files into one document.
pub trait DocumentConverter: Send + Sync {
    /// File extension of the produced documents, without the dot.
    fn extension(&self) -> &'static str;

    /// Writes `sources`, in order, into a single document at `target` and returns its path.
    fn concat_to_document(&self, title: &str, sources: &[PathBuf], target: &Path) -> Result<PathBuf>;
}

/// Returns the converter producing `format`.
pub fn converter_for(format: DocumentFormat) -> Result<Arc<dyn DocumentConverter>> {
    match format {
        DocumentFormat::Markdown => Ok(Arc::new(MarkdownConverter)),
        #[cfg(feature = "pdf")]
        DocumentFormat::Pdf => Ok(Arc::new(PdfConverter::default())),
        #[cfg(not(feature = "pdf"))]
        DocumentFormat::Pdf => Err(BlinkpressError::ConfigError(
            "PDF output requires the `pdf` feature".to_string(),
        )),
    }
}

/// Reads and joins the sources with a blank line between them.
pub(crate) fn read_sources(sources: &[PathBuf]) -> Result<String> {
    let mut parts = Vec::with_capacity(sources.len());
    for source in sources {
        let content = std::fs::read_to_string(source)
            .map_err(|e| BlinkpressError::ConversionError(format!("cannot read {}: {}", source.display(), e)))?;
        parts.push(content.trim_end().to_string());
    }
    Ok(parts.join("\n\n"))
}

pub(crate) fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| BlinkpressError::ConversionError(format!("cannot create {}: {}", parent.display(), e)))?;
    }
    Ok(())
}
