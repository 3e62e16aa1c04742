//! Error types for resolution.

use carmine_downloader::DownloadError;
use carmine_index::IndexError;
use thiserror::Error;

/// Resolution-specific error types. The first unrecoverable failure aborts
/// the whole resolve; metadata extraction failures are handled internally
/// and never surface here.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No source provides a satisfying version of a module.
    #[error("resolving {module}: {source}")]
    Resolve {
        /// Module that could not be resolved.
        module: String,
        /// Underlying index failure.
        #[source]
        source: IndexError,
    },

    /// A tarball download failed.
    #[error("downloading {module}: {source}")]
    Download {
        /// Module whose tarball failed to download.
        module: String,
        /// Underlying download failure.
        #[source]
        source: DownloadError,
    },
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
