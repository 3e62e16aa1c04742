//! The recursive resolution engine.

use crate::corelist;
use crate::error::{ResolveError, Result};
use ahash::{AHashMap, AHashSet};
use carmine_core::{satisfies, Dist, Requirement, Source};
use carmine_downloader::{Downloader, Job};
use carmine_extractor::{MetaExtractor, MetaFile, ProvidesEntry};
use carmine_index::{HistoricalIndex, PrimaryIndex};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Transitive dependency resolver.
///
/// Owns its indexes, downloader and extractor, and carries the resolution
/// state for one resolve operation. The resolver itself is single-threaded;
/// the only parallelism lives inside the downloader it delegates to.
pub struct Resolver {
    primary: PrimaryIndex,
    historical: HistoricalIndex,
    downloader: Downloader,
    extractor: MetaExtractor,
    /// Module name to the record that provides it.
    resolved: AHashMap<String, Arc<Dist>>,
    /// Modules currently on the DFS stack, for cycle detection.
    resolving: AHashSet<String>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("resolved", &self.resolved.len())
            .field("resolving", &self.resolving.len())
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Create a resolver over a loaded primary index.
    pub fn new(
        primary: PrimaryIndex,
        historical: HistoricalIndex,
        downloader: Downloader,
        extractor: MetaExtractor,
    ) -> Self {
        Self {
            primary,
            historical,
            downloader,
            extractor,
            resolved: AHashMap::new(),
            resolving: AHashSet::new(),
        }
    }

    /// Resolve all requirements transitively.
    ///
    /// Returns one record per bound module; a distribution providing
    /// several modules appears once per module, so consumers deduplicate by
    /// pathname (the snapshot emitter does).
    ///
    /// # Errors
    /// The first unrecoverable failure aborts the operation; files already
    /// downloaded stay in the cache.
    pub async fn resolve(&mut self, requirements: &[Requirement]) -> Result<Vec<Arc<Dist>>> {
        for req in requirements {
            self.resolve_module(&req.module, &req.constraint).await?;
        }
        Ok(self.resolved.values().cloned().collect())
    }

    /// Resolve a single module against a constraint.
    ///
    /// Boxed because the future recurses through the requirement graph.
    fn resolve_module<'a>(
        &'a mut self,
        module: &'a str,
        constraint: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            if corelist::is_core(module) {
                return Ok(());
            }

            // Reuse the bound record when it already satisfies the
            // constraint; otherwise fall through to a fresh lookup.
            if let Some(dist) = self.resolved.get(module) {
                let provided = dist.provides.get(module).map_or("", String::as_str);
                if satisfies(provided, constraint) {
                    return Ok(());
                }
            }

            if self.resolving.contains(module) {
                debug!(module, "skipping circular dependency");
                return Ok(());
            }

            self.resolving.insert(module.to_string());
            let result = self.resolve_uncached(module, constraint).await;
            self.resolving.remove(module);
            result
        })
    }

    async fn resolve_uncached(&mut self, module: &str, constraint: &str) -> Result<()> {
        debug!(module, constraint, "resolving");

        // Source selection: primary index first, historical archive when
        // the latest published version cannot satisfy the constraint.
        let (url, pathname, source, dest) = match self.primary.lookup(module) {
            Some(entry) if satisfies(&entry.version, constraint) => {
                let pathname = entry.pathname.clone();
                let url = format!("{}/authors/id/{pathname}", self.primary.mirror());
                let dest = self.downloader.cache_path(&pathname);
                debug!(module, pathname = %pathname, "found on primary index");
                (url, pathname, Source::Primary, dest)
            }
            _ => {
                debug!(module, constraint, "trying historical archive");
                let release = self
                    .historical
                    .lookup(module, constraint)
                    .await
                    .map_err(|source| ResolveError::Resolve {
                        module: module.to_string(),
                        source,
                    })?;
                let pathname = pathname_from_url(&release.download_url);
                let dest = self.historical.local_path(&release.download_url);
                debug!(module, pathname = %pathname, "found on historical archive");
                (release.download_url, pathname, Source::Historical, dest)
            }
        };

        let mut results = self
            .downloader
            .download(vec![Job {
                url,
                dest: dest.clone(),
                source,
            }])
            .await;
        let result = results.pop().expect("one result per job");
        if let Err(source) = result.outcome {
            return Err(ResolveError::Download {
                module: module.to_string(),
                source,
            });
        }

        // Metadata failures degrade to a minimal record; they never abort
        // the resolve.
        let meta = match self.extractor.extract_with_configure(&dest) {
            Ok(meta) => meta,
            Err(err) => {
                warn!(module, error = %err, "metadata extraction failed, using minimal metadata");
                minimal_meta(module, constraint, &pathname)
            }
        };

        let mut provides: BTreeMap<String, String> = meta
            .provides
            .iter()
            .map(|(name, entry)| (name.clone(), entry.version.clone()))
            .collect();
        provides
            .entry(module.to_string())
            .or_insert_with(|| meta.version.clone());

        let dist = Arc::new(Dist {
            name: Dist::name_from_pathname(&pathname),
            pathname,
            provides,
            requirements: meta.requirements,
            source: Some(source),
        });

        // Bind before recursing so cycles find the record. The requested
        // module always rebinds; every other provided module binds only if
        // still free (first writer wins).
        self.resolved
            .insert(module.to_string(), Arc::clone(&dist));
        for provided in dist.provides.keys() {
            if !self.resolved.contains_key(provided) {
                self.resolved.insert(provided.clone(), Arc::clone(&dist));
            }
        }

        let requirements: Vec<(String, String)> = dist
            .requirements
            .iter()
            .map(|(m, c)| (m.clone(), c.clone()))
            .collect();
        for (dep_module, dep_constraint) in &requirements {
            self.resolve_module(dep_module, dep_constraint).await?;
        }

        Ok(())
    }
}

/// Derive an author-relative pathname from a tarball URL: the suffix after
/// `/authors/id/` when present, else the basename.
fn pathname_from_url(url: &str) -> String {
    const MARKER: &str = "/authors/id/";
    if let Some(idx) = url.find(MARKER) {
        return url[idx + MARKER.len()..].to_string();
    }
    url.rsplit('/').next().unwrap_or(url).to_string()
}

/// Fallback metadata when extraction fails: the distribution is assumed to
/// provide exactly the requested module at the requested version, with no
/// further requirements.
fn minimal_meta(module: &str, constraint: &str, pathname: &str) -> MetaFile {
    let mut provides = BTreeMap::new();
    provides.insert(
        module.to_string(),
        ProvidesEntry {
            file: None,
            version: constraint.to_string(),
        },
    );
    MetaFile {
        name: Dist::name_from_pathname(pathname),
        version: "0".to_string(),
        provides,
        requirements: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carmine_test_utils::{MockHistorical, MockMirror, TarballBuilder};
    use std::path::Path;
    use url::Url;

    fn meta_json(name: &str, version: &str, provides: &[(&str, &str)], requires: &[(&str, &str)]) -> String {
        let provides: serde_json::Map<String, serde_json::Value> = provides
            .iter()
            .map(|(m, v)| {
                (
                    (*m).to_string(),
                    serde_json::json!({ "file": format!("lib/{}.pm", m.replace("::", "/")), "version": v }),
                )
            })
            .collect();
        let requires: serde_json::Map<String, serde_json::Value> = requires
            .iter()
            .map(|(m, c)| ((*m).to_string(), serde_json::json!(c)))
            .collect();
        serde_json::json!({
            "name": name,
            "version": version,
            "provides": provides,
            "prereqs": { "runtime": { "requires": requires } }
        })
        .to_string()
    }

    fn dist_tarball(topdir: &str, meta: &str) -> Vec<u8> {
        TarballBuilder::new(topdir).file("META.json", meta).build()
    }

    async fn resolver_for(mirror: &MockMirror, historical: &MockHistorical, dir: &Path) -> Resolver {
        let mut primary = PrimaryIndex::new(mirror.url(), dir.join("cache"));
        primary.load().await.unwrap();
        let hist = HistoricalIndex::with_api_url(
            Url::parse(&historical.url()).unwrap(),
            dir.join("historical"),
        );
        hist.ensure_dir().await.unwrap();
        let downloader = Downloader::new(2, dir.join("cache"));
        Resolver::new(primary, hist, downloader, MetaExtractor::new())
    }

    fn unique_by_pathname(dists: Vec<Arc<Dist>>) -> Vec<Arc<Dist>> {
        let mut seen = AHashSet::new();
        dists
            .into_iter()
            .filter(|d| seen.insert(d.pathname.clone()))
            .collect()
    }

    #[tokio::test]
    async fn trivial_resolve_produces_one_record() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror
            .publish_index(&[("JSON", "2.97001", "M/MA/MAKAMAKA/JSON-2.97001.tar.gz")])
            .await;
        mirror
            .publish_tarball(
                "M/MA/MAKAMAKA/JSON-2.97001.tar.gz",
                dist_tarball(
                    "JSON-2.97001",
                    &meta_json("JSON", "2.97001", &[("JSON", "2.97001")], &[]),
                ),
            )
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let dists = resolver
            .resolve(&[Requirement::new("JSON", "")])
            .await
            .unwrap();

        let dists = unique_by_pathname(dists);
        assert_eq!(dists.len(), 1);
        let dist = &dists[0];
        assert_eq!(dist.name, "JSON-2.97001");
        assert_eq!(dist.pathname, "M/MA/MAKAMAKA/JSON-2.97001.tar.gz");
        assert_eq!(dist.provides["JSON"], "2.97001");
        assert_eq!(dist.source, Some(Source::Primary));
        assert!(dist.requirements.is_empty());
    }

    #[tokio::test]
    async fn constrained_resolve_recurses_into_requirements() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror
            .publish_index(&[
                ("Moo", "2.005005", "H/HA/HAARG/Moo-2.005005.tar.gz"),
                (
                    "Class::Method::Modifiers",
                    "2.15",
                    "E/ET/ETHER/Class-Method-Modifiers-2.15.tar.gz",
                ),
                ("Role::Tiny", "2.002004", "H/HA/HAARG/Role-Tiny-2.002004.tar.gz"),
            ])
            .await;
        mirror
            .publish_tarball(
                "H/HA/HAARG/Moo-2.005005.tar.gz",
                dist_tarball(
                    "Moo-2.005005",
                    &meta_json(
                        "Moo",
                        "2.005005",
                        &[("Moo", "2.005005")],
                        &[("Class::Method::Modifiers", "1.10"), ("Role::Tiny", "2.0")],
                    ),
                ),
            )
            .await;
        mirror
            .publish_tarball(
                "E/ET/ETHER/Class-Method-Modifiers-2.15.tar.gz",
                dist_tarball(
                    "Class-Method-Modifiers-2.15",
                    &meta_json(
                        "Class-Method-Modifiers",
                        "2.15",
                        &[("Class::Method::Modifiers", "2.15")],
                        &[],
                    ),
                ),
            )
            .await;
        mirror
            .publish_tarball(
                "H/HA/HAARG/Role-Tiny-2.002004.tar.gz",
                dist_tarball(
                    "Role-Tiny-2.002004",
                    &meta_json("Role-Tiny", "2.002004", &[("Role::Tiny", "2.002004")], &[]),
                ),
            )
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let dists = resolver
            .resolve(&[Requirement::new("Moo", ">= 2.0, < 3.0")])
            .await
            .unwrap();

        let mut names: Vec<String> = unique_by_pathname(dists)
            .iter()
            .map(|d| d.name.clone())
            .collect();
        names.sort();
        assert_eq!(
            names,
            [
                "Class-Method-Modifiers-2.15",
                "Moo-2.005005",
                "Role-Tiny-2.002004"
            ]
        );
    }

    #[tokio::test]
    async fn historical_fallback_when_primary_cannot_satisfy() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror
            .publish_index(&[("Foo", "1.0", "X/XX/XXX/Foo-1.0.tar.gz")])
            .await;

        let url = format!("{}/authors/id/X/XX/XXX/Foo-2.1.tar.gz", mirror.url());
        historical.publish_release("Foo", &url, "2.1").await;
        mirror
            .publish_tarball(
                "X/XX/XXX/Foo-2.1.tar.gz",
                dist_tarball("Foo-2.1", &meta_json("Foo", "2.1", &[("Foo", "2.1")], &[])),
            )
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let dists = resolver
            .resolve(&[Requirement::new("Foo", ">= 2.0")])
            .await
            .unwrap();

        let dists = unique_by_pathname(dists);
        assert_eq!(dists.len(), 1);
        assert_eq!(dists[0].name, "Foo-2.1");
        assert_eq!(dists[0].pathname, "X/XX/XXX/Foo-2.1.tar.gz");
        assert_eq!(dists[0].source, Some(Source::Historical));
        // The tarball lands in the flat historical downloads directory.
        assert!(dir.path().join("historical/Foo-2.1.tar.gz").exists());
    }

    #[tokio::test]
    async fn cycles_are_skipped_not_fatal() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror
            .publish_index(&[
                ("Cycle::A", "1.0", "C/CY/CYC/Cycle-A-1.0.tar.gz"),
                ("Cycle::B", "1.0", "C/CY/CYC/Cycle-B-1.0.tar.gz"),
            ])
            .await;
        mirror
            .publish_tarball(
                "C/CY/CYC/Cycle-A-1.0.tar.gz",
                dist_tarball(
                    "Cycle-A-1.0",
                    &meta_json("Cycle-A", "1.0", &[("Cycle::A", "1.0")], &[("Cycle::B", "1.0")]),
                ),
            )
            .await;
        // B's back-edge demands a version A does not provide, forcing the
        // lookup past the resolved check and into the cycle guard.
        mirror
            .publish_tarball(
                "C/CY/CYC/Cycle-B-1.0.tar.gz",
                dist_tarball(
                    "Cycle-B-1.0",
                    &meta_json("Cycle-B", "1.0", &[("Cycle::B", "1.0")], &[("Cycle::A", ">= 9.9")]),
                ),
            )
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let dists = resolver
            .resolve(&[Requirement::new("Cycle::A", "1.0")])
            .await
            .unwrap();

        let mut names: Vec<String> = unique_by_pathname(dists)
            .iter()
            .map(|d| d.name.clone())
            .collect();
        names.sort();
        assert_eq!(names, ["Cycle-A-1.0", "Cycle-B-1.0"]);
    }

    #[tokio::test]
    async fn core_modules_resolve_to_nothing() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror.publish_index(&[]).await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let dists = resolver
            .resolve(&[Requirement::new("strict", ""), Requirement::new("warnings", "0")])
            .await
            .unwrap();

        assert!(dists.is_empty());
        // Only the index fetch itself; no tarball requests.
        assert_eq!(mirror.received_requests().await, 1);
    }

    #[tokio::test]
    async fn extraction_failure_degrades_to_minimal_record() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror
            .publish_index(&[("Broken", "1.0", "B/BR/BRK/Broken-1.0.tar.gz")])
            .await;
        mirror
            .publish_tarball("B/BR/BRK/Broken-1.0.tar.gz", b"not a tarball".to_vec())
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let dists = resolver
            .resolve(&[Requirement::new("Broken", "0.5")])
            .await
            .unwrap();

        let dists = unique_by_pathname(dists);
        assert_eq!(dists.len(), 1);
        assert_eq!(dists[0].name, "Broken-1.0");
        assert_eq!(dists[0].provides["Broken"], "0.5");
        assert!(dists[0].requirements.is_empty());
    }

    #[tokio::test]
    async fn unresolvable_module_is_a_resolve_error() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror.publish_index(&[]).await;
        historical.publish_missing("No::Such").await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let err = resolver
            .resolve(&[Requirement::new("No::Such", "1.0")])
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Resolve { ref module, .. } if module == "No::Such"));
    }

    #[tokio::test]
    async fn missing_tarball_is_a_download_error() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror
            .publish_index(&[("Gone", "1.0", "G/GO/GONE/Gone-1.0.tar.gz")])
            .await;
        // Index entry exists but the tarball is never published.

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let err = resolver
            .resolve(&[Requirement::new("Gone", "")])
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Download { ref module, .. } if module == "Gone"));
    }

    #[tokio::test]
    async fn bound_records_are_reused_for_satisfied_requirements() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror
            .publish_index(&[
                ("Multi", "2.0", "M/MU/MULTI/Multi-2.0.tar.gz"),
                ("Multi::Util", "2.0", "M/MU/MULTI/Multi-2.0.tar.gz"),
            ])
            .await;
        mirror
            .publish_tarball(
                "M/MU/MULTI/Multi-2.0.tar.gz",
                dist_tarball(
                    "Multi-2.0",
                    &meta_json(
                        "Multi",
                        "2.0",
                        &[("Multi", "2.0"), ("Multi::Util", "2.0")],
                        &[],
                    ),
                ),
            )
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let dists = resolver
            .resolve(&[
                Requirement::new("Multi", "2.0"),
                Requirement::new("Multi::Util", "1.0"),
            ])
            .await
            .unwrap();

        assert_eq!(unique_by_pathname(dists).len(), 1);
        // Index fetch plus exactly one tarball download.
        assert_eq!(mirror.received_requests().await, 2);
    }

    #[tokio::test]
    async fn unsatisfied_rebinding_falls_through_to_a_fresh_lookup() {
        let mirror = MockMirror::start().await;
        let historical = MockHistorical::start().await;
        mirror
            .publish_index(&[("Foo", "1.0", "X/XX/XXX/Foo-1.0.tar.gz")])
            .await;
        mirror
            .publish_tarball(
                "X/XX/XXX/Foo-1.0.tar.gz",
                dist_tarball("Foo-1.0", &meta_json("Foo", "1.0", &[("Foo", "1.0")], &[])),
            )
            .await;

        let url = format!("{}/authors/id/X/XX/XXX/Foo-2.1.tar.gz", mirror.url());
        historical.publish_release("Foo", &url, "2.1").await;
        mirror
            .publish_tarball(
                "X/XX/XXX/Foo-2.1.tar.gz",
                dist_tarball("Foo-2.1", &meta_json("Foo", "2.1", &[("Foo", "2.1")], &[])),
            )
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut resolver = resolver_for(&mirror, &historical, dir.path()).await;
        let dists = resolver
            .resolve(&[
                Requirement::new("Foo", ""),
                Requirement::new("Foo", ">= 2.0"),
            ])
            .await
            .unwrap();

        // The second requirement rebinds the primary key to the historical
        // record; the superseded record drops out of the output.
        let dists = unique_by_pathname(dists);
        assert_eq!(dists.len(), 1);
        assert_eq!(dists[0].name, "Foo-2.1");
        assert_eq!(dists[0].source, Some(Source::Historical));
    }

    #[test]
    fn pathname_from_url_prefers_the_authors_tree() {
        assert_eq!(
            pathname_from_url("https://host/authors/id/A/AU/AUTHOR/Dist-1.0.tar.gz"),
            "A/AU/AUTHOR/Dist-1.0.tar.gz"
        );
        assert_eq!(
            pathname_from_url("https://host/some/other/Dist-1.0.tar.gz"),
            "Dist-1.0.tar.gz"
        );
    }
}
