//! Error types for index operations.

use std::path::PathBuf;
use thiserror::Error;

/// Index-specific error types.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Network/HTTP error.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// I/O error with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Index or API response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The historical archive has no matching release.
    #[error("no release of '{module}' matching '{constraint}' in the historical archive")]
    NotFound {
        /// Module name.
        module: String,
        /// Requested version constraint.
        constraint: String,
    },

    /// The historical API returned an unexpected status.
    #[error("historical API error: HTTP {status}")]
    Api {
        /// HTTP status code.
        status: u16,
    },
}

impl IndexError {
    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Create a network error with status code.
    #[must_use]
    pub fn network_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Network {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
