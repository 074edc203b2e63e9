//! Run configuration: credentials, the list of books and output settings.
//!
//! Configuration is read from a JSON file:
//!
//! ```json
//! {
//!     "username": "reader@example.com",
//!     "password": "secret",
//!     "books": ["deep-work", "atomic-habits"],
//!     "format": "pdf",
//!     "concurrency": 4
//! }
//! ```
//!
//! When no explicit path is given, [`Config::discover`] looks for
//! `config/default.json` in the working directory, then for
//! `blinkpress/config.json` in the platform config directory.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::item::Item;
use crate::{BlinkpressError, Result};

/// Default site the reader content is downloaded from.
pub const DEFAULT_BASE_URL: &str = "https://www.blinkist.com";

/// Account used to log in.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// One concatenated Markdown file per book.
    Markdown,
    /// One PDF per book.
    Pdf,
}

impl Default for DocumentFormat {
    fn default() -> Self {
        if cfg!(feature = "pdf") { DocumentFormat::Pdf } else { DocumentFormat::Markdown }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "pdf" => Ok(Self::Pdf),
            _ => Err(format!("Invalid format: {}. Valid options: pdf, markdown", s)),
        }
    }
}

/// What happens to the other books when one book's pipeline fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Remaining books keep running to their own completion or failure.
    #[default]
    Continue,
    /// The first failure cancels in-flight books and skips queued ones.
    CancelRemaining,
}

/// Complete run configuration.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub username: String,
    pub password: String,
    /// Books to download, in the order they are reported.
    pub books: Vec<Item>,
    /// Reader language code used in reader URLs.
    #[serde(default = "default_language")]
    pub language: String,
    /// Directory receiving the temporary section files and final documents.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub format: DocumentFormat,
    /// Maximum number of books processed at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Per-request timeout; no timeout when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("books", &self.books)
            .field("language", &self.language)
            .field("output_dir", &self.output_dir)
            .field("base_url", &self.base_url)
            .field("format", &self.format)
            .field("concurrency", &self.concurrency)
            .field("failure_policy", &self.failure_policy)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("books")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_concurrency() -> usize {
    4
}

impl Config {
    /// Starts a builder with the given credentials and default settings.
    pub fn builder(username: impl Into<String>, password: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(username, password)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| BlinkpressError::ConfigError(format!("Invalid configuration: {}", e)))
    }

    /// Loads a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            BlinkpressError::ConfigError(format!("Cannot read config file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| BlinkpressError::ConfigError(format!("Invalid configuration in {}: {}", path.display(), e)))
    }

    /// Loads the first configuration file found in the standard locations.
    pub fn discover() -> Result<Self> {
        let candidates = Self::search_paths();
        match candidates.iter().find(|path| path.exists()) {
            Some(path) => Self::load(path),
            None => Err(BlinkpressError::ConfigError(format!(
                "No configuration file found (looked in {})",
                candidates.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
            ))),
        }
    }

    /// Standard configuration locations in priority order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config").join("default.json")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("blinkpress").join("config.json"));
        }
        paths
    }

    /// Checks values that deserialization alone cannot.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(BlinkpressError::ConfigError("username is empty".to_string()));
        }

        if self.password.is_empty() {
            return Err(BlinkpressError::ConfigError("password is empty".to_string()));
        }

        if self.language.is_empty() || !self.language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(BlinkpressError::ConfigError(format!("invalid language code '{}'", self.language)));
        }

        if let Some(item) = first_duplicate(&self.books) {
            return Err(BlinkpressError::ConfigError(format!("book '{}' is listed more than once", item)));
        }

        if self.concurrency == 0 {
            return Err(BlinkpressError::ConfigError("concurrency must be at least 1".to_string()));
        }

        self.site_url()?;
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    pub fn site_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| BlinkpressError::InvalidUrl(format!("{}: {}", self.base_url, e)))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// First item that appears more than once, in list order.
pub(crate) fn first_duplicate(items: &[Item]) -> Option<&Item> {
    let mut seen = HashSet::new();
    items.iter().find(|item| !seen.insert(item.as_str()))
}

/// Fluent builder for [`Config`].
///
/// # Example
///
/// ```rust
/// use blinkpress_core::{Config, DocumentFormat};
///
/// let config = Config::builder("reader@example.com", "secret")
///     .book("deep-work")
///     .unwrap()
///     .format(DocumentFormat::Markdown)
///     .concurrency(2)
///     .build();
/// assert_eq!(config.books.len(), 1);
/// ```
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            config: Config {
                username: username.into(),
                password: password.into(),
                books: Vec::new(),
                language: default_language(),
                output_dir: default_output_dir(),
                base_url: default_base_url(),
                format: DocumentFormat::default(),
                concurrency: default_concurrency(),
                failure_policy: FailurePolicy::default(),
                timeout_secs: None,
            },
        }
    }

    /// Appends a book identifier.
    pub fn book(mut self, id: &str) -> Result<Self> {
        self.config.books.push(Item::new(id)?);
        Ok(self)
    }

    pub fn books(mut self, books: Vec<Item>) -> Self {
        self.config.books = books;
        self
    }

    pub fn language(mut self, value: impl Into<String>) -> Self {
        self.config.language = value.into();
        self
    }

    pub fn output_dir(mut self, value: impl Into<PathBuf>) -> Self {
        self.config.output_dir = value.into();
        self
    }

    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.config.base_url = value.into();
        self
    }

    pub fn format(mut self, value: DocumentFormat) -> Self {
        self.config.format = value;
        self
    }

    pub fn concurrency(mut self, value: usize) -> Self {
        self.config.concurrency = value;
        self
    }

    pub fn failure_policy(mut self, value: FailurePolicy) -> Self {
        self.config.failure_policy = value;
        self
    }

    pub fn timeout_secs(mut self, value: u64) -> Self {
        self.config.timeout_secs = Some(value);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::from_json(
            r#"{"username": "reader@example.com", "password": "secret", "books": ["deep-work"]}"#,
        )
        .unwrap();

        assert_eq!(config.language, "en");
        assert_eq!(config.output_dir, PathBuf::from("books"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert!(config.timeout().is_none());
        assert_eq!(config.books[0].as_str(), "deep-work");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_json(
            r#"{
                "username": "reader@example.com",
                "password": "secret",
                "books": ["deep-work", "atomic-habits"],
                "language": "de",
                "output_dir": "out",
                "format": "markdown",
                "concurrency": 2,
                "failure_policy": "cancel_remaining",
                "timeout_secs": 15
            }"#,
        )
        .unwrap();

        assert_eq!(config.format, DocumentFormat::Markdown);
        assert_eq!(config.failure_policy, FailurePolicy::CancelRemaining);
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.books.len(), 2);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = Config::from_json(r#"{"username": "u", "password": "p", "books": [], "colour": "red"}"#);
        assert!(matches!(result, Err(BlinkpressError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_book_rejected() {
        let result = Config::from_json(r#"{"username": "u", "password": "p", "books": ["../../etc"]}"#);
        assert!(matches!(result, Err(BlinkpressError::ConfigError(_))));
    }

    #[test]
    fn test_validate() {
        assert!(Config::builder("", "secret").build().validate().is_err());
        assert!(Config::builder("user", "").build().validate().is_err());
        assert!(Config::builder("user", "pw").concurrency(0).build().validate().is_err());
        assert!(Config::builder("user", "pw").language("e/n").build().validate().is_err());
        assert!(Config::builder("user", "pw").base_url("not a url").build().validate().is_err());
        assert!(Config::builder("user", "pw").build().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_books() {
        let config = Config::from_json(
            r#"{"username": "u", "password": "p", "books": ["deep-work", "atomic-habits", " deep-work"]}"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(&err, BlinkpressError::ConfigError(msg) if msg.contains("deep-work")));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"username": "u", "password": "p", "books": ["deep-work"]}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.username, "u");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/blinkpress/config.json");
        assert!(matches!(result, Err(BlinkpressError::ConfigError(_))));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("reader@example.com", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("reader@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("md".parse::<DocumentFormat>().unwrap(), DocumentFormat::Markdown);
        assert_eq!("PDF".parse::<DocumentFormat>().unwrap(), DocumentFormat::Pdf);
        assert!("docx".parse::<DocumentFormat>().is_err());
    }

    #[test]
    fn test_search_paths_start_with_local_config() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from("config/default.json"));
    }
}
