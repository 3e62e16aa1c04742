//! Historical archive lookup via a remote JSON query API.

use crate::error::{IndexError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Default historical query API.
pub const DEFAULT_API_URL: &str = "https://fastapi.metacpan.org";

/// API response for a historical release lookup. The `version` and
/// `status` fields may arrive as strings or numbers; both are flex-coerced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoricalRelease {
    /// Direct tarball URL.
    pub download_url: String,
    /// Version of the matched release.
    #[serde(default = "zero", deserialize_with = "carmine_core::deserialize_flex")]
    pub version: String,
    /// Release status reported by the API (e.g. `backpan`, `latest`).
    #[serde(default = "zero", deserialize_with = "carmine_core::deserialize_flex")]
    pub status: String,
}

fn zero() -> String {
    "0".to_string()
}

/// Client for the historical lookup service.
///
/// Resolves a (module, version constraint) pair to a direct tarball URL and
/// manages the flat directory historical downloads land in.
#[derive(Debug)]
pub struct HistoricalIndex {
    api_url: Url,
    downloads_dir: PathBuf,
    client: reqwest::Client,
}

impl HistoricalIndex {
    /// Create a client against the default API.
    pub fn new(downloads_dir: impl Into<PathBuf>) -> Self {
        Self::with_api_url(
            Url::parse(DEFAULT_API_URL).expect("valid URL"),
            downloads_dir,
        )
    }

    /// Create a client against a custom API root.
    pub fn with_api_url(api_url: Url, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_url,
            downloads_dir: downloads_dir.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Query the API for a release of `module` matching `constraint`.
    ///
    /// The constraint is passed through verbatim as the `version` query
    /// parameter unless it is empty or `0`.
    ///
    /// # Errors
    /// HTTP 404 maps to [`IndexError::NotFound`]; any other non-200 status
    /// to [`IndexError::Api`]; a malformed body to [`IndexError::Parse`].
    pub async fn lookup(&self, module: &str, constraint: &str) -> Result<HistoricalRelease> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| IndexError::Parse(format!("invalid API URL: {}", self.api_url)))?
            .extend(["v1", "download_url", module]);
        if !constraint.is_empty() && constraint != "0" {
            url.query_pairs_mut().append_pair("version", constraint);
        }

        debug!(module = %module, url = %url, "historical lookup");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(IndexError::NotFound {
                module: module.to_string(),
                constraint: constraint.to_string(),
            });
        }
        if status != 200 {
            return Err(IndexError::Api { status });
        }

        response
            .json()
            .await
            .map_err(|e| IndexError::Parse(format!("historical API response: {e}")))
    }

    /// Local destination for a tarball URL: its basename inside the
    /// downloads directory.
    #[must_use]
    pub fn local_path(&self, download_url: &str) -> PathBuf {
        let basename = download_url.rsplit('/').next().unwrap_or(download_url);
        self.downloads_dir.join(basename)
    }

    /// Create the downloads directory and its parents.
    ///
    /// # Errors
    /// Returns an I/O error on filesystem failure.
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.downloads_dir)
            .await
            .map_err(|e| IndexError::io(&self.downloads_dir, &e))
    }

    /// The historical downloads directory.
    #[must_use]
    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }
}
