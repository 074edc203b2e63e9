//! Error types for Blinkpress operations.
//!
//! This module defines the main error type [`BlinkpressError`] which represents
//! every failure the download pipeline can surface: network and HTTP status
//! failures, markup that no longer matches what the site serves, rejected
//! credentials, filesystem problems and document conversion failures.
//!
//! # Example
//!
//! ```rust
//! use blinkpress_core::{BlinkpressError, ErrorKind, Result};
//!
//! fn require_token(token: Option<&str>) -> Result<String> {
//!     token
//!         .map(str::to_string)
//!         .ok_or_else(|| BlinkpressError::ParseError("csrf-token meta tag missing".to_string()))
//! }
//!
//! let err = require_token(None).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Parse);
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the download pipeline.
#[derive(Error, Debug)]
pub enum BlinkpressError {
    /// Transport-level HTTP failures from reqwest.
    ///
    /// Covers DNS failures, refused connections, TLS problems, timeouts and
    /// bodies that could not be read.
    #[error("HTTP request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The server answered with a non-success status where success was required.
    #[error("HTTP {status} returned by {url}")]
    HttpStatus { status: u16, url: String },

    /// Invalid URL provided or derived from configuration.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Expected markup or response field is absent.
    ///
    /// Usually means the site changed its page structure.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The site rejected the supplied credentials.
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Filesystem read, write or delete failure.
    #[error("I/O error on {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document converter rejected its input or could not write the target.
    #[error("Document conversion failed: {0}")]
    ConversionError(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The item pipeline was cancelled after a sibling failed.
    #[error("Cancelled after another item failed")]
    Cancelled,
}

/// Coarse classification of [`BlinkpressError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    Auth,
    Io,
    Conversion,
    Config,
    Cancelled,
}

impl BlinkpressError {
    /// Wraps an I/O error together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BlinkpressError::IoError { path: path.into(), source }
    }

    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BlinkpressError::NetworkError(_) | BlinkpressError::HttpStatus { .. } | BlinkpressError::InvalidUrl(_) => {
                ErrorKind::Network
            }
            BlinkpressError::ParseError(_) => ErrorKind::Parse,
            BlinkpressError::AuthError(_) => ErrorKind::Auth,
            BlinkpressError::IoError { .. } => ErrorKind::Io,
            BlinkpressError::ConversionError(_) => ErrorKind::Conversion,
            BlinkpressError::ConfigError(_) => ErrorKind::Config,
            BlinkpressError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Result type alias for BlinkpressError.
pub type Result<T> = std::result::Result<T, BlinkpressError>;
