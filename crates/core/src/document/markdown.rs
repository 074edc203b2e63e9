use std::path::{Path, PathBuf};

use super::{DocumentConverter, ensure_parent, read_sources};
use crate::{BlinkpressError, Result};

/// Writes the sections as one Markdown document.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownConverter;

impl DocumentConverter for MarkdownConverter {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn concat_to_document(&self, _title: &str, sources: &[PathBuf], target: &Path) -> Result<PathBuf> {
        let mut content = read_sources(sources)?;
        if !content.is_empty() {
            content.push('\n');
        }

        ensure_parent(target)?;
        std::fs::write(target, content)
            .map_err(|e| BlinkpressError::ConversionError(format!("cannot write {}: {}", target.display(), e)))?;

        Ok(target.to_path_buf())
    }
}
