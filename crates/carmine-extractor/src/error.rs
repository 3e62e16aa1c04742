//! Error types for metadata extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Extraction-specific error types.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Gzip or tar failure.
    #[error("archive error: {0}")]
    Archive(String),

    /// I/O error with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Malformed JSON or YAML metadata.
    #[error("metadata parse error: {0}")]
    Parse(String),

    /// The tarball ships no usable metadata file.
    #[error("no META.json or META.yml found in tarball")]
    NoMetadata,

    /// The configure subprocess failed or produced no output.
    ///
    /// Recovered internally by falling back to static metadata; only
    /// surfaces when static metadata is missing too.
    #[error("configure failed: {0}")]
    ConfigureFailed(String),
}

impl ExtractError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
