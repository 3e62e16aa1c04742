//! Parallel tarball downloader for Carmine.
//!
//! Fetches a batch of URLs into caller-specified destination paths with
//! bounded parallelism. Destinations double as an on-disk cache: a job whose
//! destination already exists succeeds immediately without a network
//! request. Writes go through an adjacent `.tmp` file and an atomic rename,
//! so a destination is always either absent or complete.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod downloader;
mod error;

pub use downloader::{DownloadResult, Downloader, Fetched, Job};
pub use error::{DownloadError, Result};
