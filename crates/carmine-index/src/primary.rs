//! Primary mirror index: the flat `02packages.details.txt` table.

use crate::error::{IndexError, Result};
use ahash::AHashMap;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Mirror-relative location of the gzipped index.
const INDEX_PATH: &str = "modules/02packages.details.txt.gz";

/// Name of the decompressed on-disk cache file.
const CACHE_FILE: &str = "02packages.details.txt";

/// How long a cached index is considered fresh.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// One line of the index: the latest published version of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Module name, e.g. `JSON::PP`.
    pub module: String,
    /// Latest version, possibly the literal `undef`.
    pub version: String,
    /// Author-relative tarball pathname.
    pub pathname: String,
}

/// Lookup table for the latest version of every module on the mirror.
///
/// [`load`](Self::load) must be called before [`lookup`](Self::lookup); it
/// fetches the gzipped index from the mirror unless a cache younger than
/// [`CACHE_TTL`] exists on disk. The cache is stored decompressed and
/// replaced atomically.
#[derive(Debug)]
pub struct PrimaryIndex {
    mirror: String,
    cache_dir: PathBuf,
    cache_file: PathBuf,
    client: reqwest::Client,
    modules: AHashMap<String, IndexEntry>,
}

impl PrimaryIndex {
    /// Create an index for the given mirror, caching under `cache_dir`.
    ///
    /// A trailing `/` on the mirror URL is stripped.
    pub fn new(mirror: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        let mirror = mirror.into();
        let mirror = mirror.trim_end_matches('/').to_string();
        let cache_dir = cache_dir.into();
        let cache_file = cache_dir.join(CACHE_FILE);
        Self {
            mirror,
            cache_dir,
            cache_file,
            client: reqwest::Client::new(),
            modules: AHashMap::new(),
        }
    }

    /// Download (if stale) and parse the index.
    ///
    /// # Errors
    /// Returns a network error on a non-200 response, an I/O error on
    /// filesystem failure, and a parse error if decompression fails.
    pub async fn load(&mut self) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| IndexError::io(&self.cache_dir, &e))?;

        if !self.cache_is_fresh() {
            self.refresh().await?;
        }

        self.parse_cache()
    }

    /// Find a module in the index.
    #[must_use]
    pub fn lookup(&self, module: &str) -> Option<&IndexEntry> {
        self.modules.get(module)
    }

    /// The configured mirror root, without trailing `/`.
    #[must_use]
    pub fn mirror(&self) -> &str {
        &self.mirror
    }

    /// Path of the decompressed cache file.
    #[must_use]
    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Number of modules in the loaded index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the index is empty (not yet loaded, or an empty mirror).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Freshness is wall-clock against the cache file's mtime; no
    /// conditional requests, a stale cache triggers a full redownload.
    fn cache_is_fresh(&self) -> bool {
        let Ok(meta) = std::fs::metadata(&self.cache_file) else {
            return false;
        };
        meta.modified()
            .ok()
            .and_then(|m| m.elapsed().ok())
            .is_some_and(|age| age < CACHE_TTL)
    }

    async fn refresh(&self) -> Result<()> {
        let url = format!("{}/{INDEX_PATH}", self.mirror);
        debug!(url = %url, "fetching primary index");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() != 200 {
            return Err(IndexError::network_with_status(
                format!("index fetch from {url} failed"),
                status.as_u16(),
            ));
        }

        let body = response.bytes().await?;
        let mut text = Vec::new();
        GzDecoder::new(body.as_ref())
            .read_to_end(&mut text)
            .map_err(|e| IndexError::Parse(format!("decompressing index: {e}")))?;

        // Write beside the cache file and rename so readers never observe a
        // partially written index.
        let tmp = self.cache_file.with_extension("txt.tmp");
        tokio::fs::write(&tmp, &text)
            .await
            .map_err(|e| IndexError::io(&tmp, &e))?;
        tokio::fs::rename(&tmp, &self.cache_file)
            .await
            .map_err(|e| IndexError::io(&self.cache_file, &e))?;

        info!(bytes = text.len(), "primary index refreshed");
        Ok(())
    }

    /// Parse the cached index: header lines up to the first blank line,
    /// then whitespace-separated `module version pathname` records. Extra
    /// fields are ignored; short lines are skipped. The literal `undef`
    /// version is preserved for the constraint checker to interpret.
    fn parse_cache(&mut self) -> Result<()> {
        let text = std::fs::read_to_string(&self.cache_file)
            .map_err(|e| IndexError::io(&self.cache_file, &e))?;

        self.modules.clear();
        let mut in_header = true;
        for line in text.lines() {
            if in_header {
                if line.is_empty() {
                    in_header = false;
                }
                continue;
            }

            let mut fields = line.split_whitespace();
            let (Some(module), Some(version), Some(pathname)) =
                (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };

            self.modules.insert(
                module.to_string(),
                IndexEntry {
                    module: module.to_string(),
                    version: version.to_string(),
                    pathname: pathname.to_string(),
                },
            );
        }

        debug!(modules = self.modules.len(), "primary index parsed");
        Ok(())
    }
}
