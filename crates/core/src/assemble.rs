//! Turns extracted sections into the final per-book document.
//!
//! Sections are first written to temporary Markdown files, the files are
//! concatenated in extraction order by a [`DocumentConverter`], and the
//! temporary files and their directory are removed once the document exists.
//! A failure part way through leaves the temporary files behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, info};

use crate::document::DocumentConverter;
use crate::item::{Item, OutputDocument, Section};
use crate::{BlinkpressError, Result};

/// Writes, concatenates and cleans up the sections of one book.
#[derive(Clone)]
pub struct Assembler {
    output_dir: PathBuf,
    converter: Arc<dyn DocumentConverter>,
}

impl Assembler {
    pub fn new(output_dir: impl Into<PathBuf>, converter: Arc<dyn DocumentConverter>) -> Self {
        Self { output_dir: output_dir.into(), converter }
    }

    /// Path the document for `item` is written to.
    pub fn document_path(&self, item: &Item) -> PathBuf {
        item.document_path(&self.output_dir, self.converter.extension())
    }

    /// Assembles `sections` into the document for `item`.
    ///
    /// The document content follows the order of `sections`, regardless of
    /// the order in which the concurrent writes finish.
    pub async fn assemble(&self, item: &Item, sections: &[Section]) -> Result<OutputDocument> {
        let written = try_join_all(sections.iter().map(write_section)).await?;
        debug!(item = %item, files = written.len(), "wrote section files");

        let target = self.document_path(item);
        let path = self.convert(item.title(), written.clone(), target).await?;
        info!(item = %item, path = %path.display(), "document written");

        remove_sections(&written).await?;

        Ok(OutputDocument { item: item.clone(), path, section_count: sections.len() })
    }

    async fn convert(&self, title: String, sources: Vec<PathBuf>, target: PathBuf) -> Result<PathBuf> {
        let converter = Arc::clone(&self.converter);
        tokio::task::spawn_blocking(move || converter.concat_to_document(&title, &sources, &target))
            .await
            .map_err(|e| BlinkpressError::ConversionError(format!("converter task failed: {}", e)))?
    }
}

async fn write_section(section: &Section) -> Result<PathBuf> {
    if let Some(parent) = section.path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BlinkpressError::io(parent, e))?;
    }

    tokio::fs::write(&section.path, &section.content)
        .await
        .map_err(|e| BlinkpressError::io(&section.path, e))?;

    Ok(section.path.clone())
}

/// Deletes the section files, then their now-empty directories.
async fn remove_sections(files: &[PathBuf]) -> Result<()> {
    try_join_all(files.iter().map(|file| async move {
        tokio::fs::remove_file(file).await.map_err(|e| BlinkpressError::io(file, e))
    }))
    .await?;

    let mut dirs: Vec<&Path> = files
        .iter()
        .filter_map(|file| file.parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect();
    dirs.sort();
    dirs.dedup();

    for dir in dirs {
        tokio::fs::remove_dir(dir).await.map_err(|e| BlinkpressError::io(dir, e))?;
        debug!(dir = %dir.display(), "removed section directory");
    }

    Ok(())
}
