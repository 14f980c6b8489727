//! Javelin error types.
//!
//! All errors are typed and provide root cause information. Expected
//! "not found" conditions (unresolved call targets, missing component
//! matches) are never modeled as errors; they are stub values or absent
//! records handled by the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Javelin operations.
#[derive(Error, Debug)]
pub enum JavelinError {
    /// I/O error during file operations.
    #[error("I/O error for path {path}: {source}")]
    Io {
        /// The file path that caused the I/O error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Tree-sitter parsing error, scoped to one source file.
    #[error("Parse error in {file}: {message}")]
    Parse {
        /// The file that failed to parse.
        file: PathBuf,
        /// The parse error message.
        message: String,
    },

    /// Graph store error.
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Missing or invalid configuration, raised before any work begins.
    #[error("Configuration error: {0}")]
    Config(String),

    /// UTF-8 validation error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Generic error with context.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for JavelinError {
    fn from(err: std::io::Error) -> Self {
        JavelinError::Io {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

/// Result type alias for Javelin operations.
pub type Result<T> = std::result::Result<T, JavelinError>;
