//! Batch downloads with bounded parallelism and cache-hit elision.

use crate::error::{DownloadError, Result};
use carmine_core::Source;
use futures_util::stream::{self, StreamExt};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

/// One download job: fetch `url` into `dest`.
///
/// Callers must never submit two concurrent jobs with the same destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Tarball URL.
    pub url: String,
    /// Destination path on disk.
    pub dest: PathBuf,
    /// Which index produced this job.
    pub source: Source,
}

/// Successful outcome of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fetched {
    /// Destination already existed; no request was made.
    pub cached: bool,
    /// Bytes written (zero on a cache hit).
    pub bytes: u64,
}

/// Per-job result. Results arrive in completion order, not submission
/// order; correlate through the embedded job.
#[derive(Debug)]
pub struct DownloadResult {
    /// The job this result belongs to.
    pub job: Job,
    /// Success or the first error the job hit.
    pub outcome: Result<Fetched>,
}

/// Downloader with a fixed worker budget and a shared HTTP client.
#[derive(Debug)]
pub struct Downloader {
    workers: usize,
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl Downloader {
    /// Create a downloader with `workers` parallel fetch slots, caching
    /// primary-mirror tarballs under `cache_dir`.
    pub fn new(workers: usize, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            workers: workers.max(1),
            cache_dir: cache_dir.into(),
            client: reqwest::Client::new(),
        }
    }

    /// The primary cache directory.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache destination for an author-relative pathname, mirroring the
    /// on-mirror tree.
    #[must_use]
    pub fn cache_path(&self, pathname: &str) -> PathBuf {
        self.cache_dir.join(pathname)
    }

    /// Download a batch of jobs, at most `workers` in flight at a time.
    ///
    /// Always returns one result per job; individual failures are carried
    /// in each result rather than aborting the batch.
    pub async fn download(&self, jobs: Vec<Job>) -> Vec<DownloadResult> {
        stream::iter(jobs)
            .map(|job| async move {
                let outcome = self.fetch_one(&job).await;
                DownloadResult { job, outcome }
            })
            .buffer_unordered(self.workers)
            .collect()
            .await
    }

    async fn fetch_one(&self, job: &Job) -> Result<Fetched> {
        if tokio::fs::metadata(&job.dest).await.is_ok() {
            trace!(dest = %job.dest.display(), "cache hit");
            return Ok(Fetched {
                cached: true,
                bytes: 0,
            });
        }

        if let Some(parent) = job.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, &e))?;
        }

        debug!(url = %job.url, source = %job.source, "downloading");

        let response = self.client.get(&job.url).send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(DownloadError::Http {
                status,
                url: job.url.clone(),
            });
        }

        // Stream into an adjacent temp file; the guard removes it on any
        // early return, and the rename makes the destination appear whole.
        let tmp = TempPath::beside(&job.dest);
        let mut file = tokio::fs::File::create(&tmp.path)
            .await
            .map_err(|e| DownloadError::io(&tmp.path, &e))?;

        let mut bytes = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(&tmp.path, &e))?;
            bytes += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| DownloadError::io(&tmp.path, &e))?;
        drop(file);

        tokio::fs::rename(&tmp.path, &job.dest)
            .await
            .map_err(|e| DownloadError::io(&job.dest, &e))?;
        tmp.disarm();

        debug!(dest = %job.dest.display(), bytes, "downloaded");
        Ok(Fetched {
            cached: false,
            bytes,
        })
    }
}

/// Temp file path that is deleted on drop unless disarmed after the rename.
struct TempPath {
    path: PathBuf,
    armed: bool,
}

impl TempPath {
    fn beside(dest: &Path) -> Self {
        let mut name = OsString::from(dest.as_os_str());
        name.push(".tmp");
        Self {
            path: PathBuf::from(name),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempPath {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
