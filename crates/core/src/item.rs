//! Pipeline data types: the item to download, its sections and the final document.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::naming::title_case;
use crate::{BlinkpressError, Result};

/// Identifier of one book on the reader site, e.g. `deep-work`.
///
/// The identifier names a URL segment and a directory, so it is validated on
/// construction: it must be non-empty and free of path separators and `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Item(String);

impl Item {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();

        if trimmed.is_empty() {
            return Err(BlinkpressError::ConfigError("book identifier is empty".to_string()));
        }

        if trimmed.contains(['/', '\\']) || trimmed.contains("..") || trimmed.chars().any(char::is_control) {
            return Err(BlinkpressError::ConfigError(format!(
                "book identifier '{}' must not contain path separators",
                id
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human readable title derived from the identifier (`deep-work` → `Deep Work`).
    pub fn title(&self) -> String {
        title_case(&self.0)
    }

    /// Directory holding the item's temporary section files.
    pub fn section_dir(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.0)
    }

    /// Path of the final document for the given file extension.
    pub fn document_path(&self, output_dir: &Path, extension: &str) -> PathBuf {
        output_dir.join(format!("{}.{}", self.0, extension))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Item {
    type Error = BlinkpressError;

    fn try_from(value: String) -> Result<Self> {
        Item::new(value)
    }
}

impl From<Item> for String {
    fn from(item: Item) -> Self {
        item.0
    }
}

impl std::str::FromStr for Item {
    type Err = BlinkpressError;

    fn from_str(s: &str) -> Result<Self> {
        Item::new(s)
    }
}

/// One heading-delimited chunk of an item, rendered as Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Temporary file the section is written to.
    pub path: PathBuf,
    /// Heading text as it appeared in the page.
    pub heading: String,
    /// Markdown content, including the relabelled heading.
    pub content: String,
}

/// The assembled document for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    pub item: Item,
    pub path: PathBuf,
    pub section_count: usize,
}
