//! Error types for the downloader.

use std::path::PathBuf;
use thiserror::Error;

/// Downloader-specific error types.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network/transport error.
    #[error("network error: {0}")]
    Network(String),

    /// Server answered with a non-200 status.
    #[error("HTTP {status} downloading {url}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// URL that failed.
        url: String,
    },

    /// I/O error with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl DownloadError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Result type for download operations.
pub type Result<T> = std::result::Result<T, DownloadError>;
