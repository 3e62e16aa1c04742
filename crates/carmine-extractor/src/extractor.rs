//! The extraction pipeline: scan, select, optionally configure.

use crate::archive::{self, ScannedTarball};
use crate::configure;
use crate::error::{ExtractError, Result};
use crate::meta::{self, MetaFile};
use std::path::Path;
use tracing::debug;

/// Extracts normalized metadata from distribution tarballs.
///
/// Construct with [`with_container`](Self::with_container) to run configure
/// scripts inside a container image instead of on the host.
#[derive(Debug, Default)]
pub struct MetaExtractor {
    container_image: Option<String>,
}

impl MetaExtractor {
    /// Extractor that runs configure scripts on the host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor that runs configure scripts inside the given container
    /// image, with the extracted distribution mounted at its working
    /// directory.
    pub fn with_container(image: impl Into<String>) -> Self {
        Self {
            container_image: Some(image.into()),
        }
    }

    /// Read static metadata only: `META.json`, then `META.yml`.
    ///
    /// # Errors
    /// [`ExtractError::NoMetadata`] when neither file is present; archive
    /// and parse errors otherwise.
    pub fn extract(&self, tarball: &Path) -> Result<MetaFile> {
        let scanned = archive::scan(tarball)?;
        self.static_metadata(&scanned)
    }

    /// Extract with dynamic configure: prefer `MYMETA` files from the
    /// tarball, else run the configure script to generate them, else fall
    /// back to static metadata.
    ///
    /// # Errors
    /// Configure failures are recovered by the static fallback; only a
    /// tarball with no usable metadata at all errors.
    pub fn extract_with_configure(&self, tarball: &Path) -> Result<MetaFile> {
        let scanned = archive::scan(tarball)?;

        if let Some(data) = &scanned.mymeta_json {
            return meta::parse_json(data);
        }
        if let Some(data) = &scanned.mymeta_yml {
            return meta::parse_yaml(data);
        }

        if scanned.has_build_pl || scanned.has_makefile_pl {
            match self.generate_mymeta(tarball, &scanned) {
                Ok(meta) => return Ok(meta),
                Err(err) => {
                    debug!(error = %err, "configure failed, falling back to static metadata");
                }
            }
        }

        self.static_metadata(&scanned)
    }

    fn static_metadata(&self, scanned: &ScannedTarball) -> Result<MetaFile> {
        if let Some(data) = &scanned.meta_json {
            return meta::parse_json(data);
        }
        if let Some(data) = &scanned.meta_yml {
            return meta::parse_yaml(data);
        }
        Err(ExtractError::NoMetadata)
    }

    /// Unpack the distribution, run its configure script, and read the
    /// generated `MYMETA` file.
    fn generate_mymeta(&self, tarball: &Path, scanned: &ScannedTarball) -> Result<MetaFile> {
        let tmp = tempfile::Builder::new()
            .prefix("carmine-configure-")
            .tempdir()
            .map_err(|e| ExtractError::ConfigureFailed(format!("creating temp dir: {e}")))?;

        let dist_dir = archive::unpack(tarball, tmp.path())?;

        let script = if scanned.has_build_pl {
            "Build.PL"
        } else {
            "Makefile.PL"
        };
        configure::run(&dist_dir, script, self.container_image.as_deref())?;

        if let Ok(data) = std::fs::read(dist_dir.join("MYMETA.json")) {
            return meta::parse_json(&data);
        }
        if let Ok(data) = std::fs::read(dist_dir.join("MYMETA.yml")) {
            return meta::parse_yaml(&data);
        }
        Err(ExtractError::ConfigureFailed(
            "no MYMETA file generated".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carmine_test_utils::TarballBuilder;
    use std::path::PathBuf;

    fn write_tarball(builder: TarballBuilder) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist.tar.gz");
        builder.write_to(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn static_mode_prefers_meta_json() {
        let (_dir, tarball) = write_tarball(
            TarballBuilder::new("Dist-1.0")
                .file("META.json", r#"{"name":"FromJson","version":"1.0"}"#)
                .file("META.yml", "---\nname: FromYaml\nversion: '9.9'\n"),
        );

        let meta = MetaExtractor::new().extract(&tarball).unwrap();
        assert_eq!(meta.name, "FromJson");
    }

    #[test]
    fn static_mode_falls_back_to_meta_yml() {
        let (_dir, tarball) = write_tarball(
            TarballBuilder::new("Dist-1.0").file("META.yml", "---\nname: FromYaml\nversion: '1.1'\n"),
        );

        let meta = MetaExtractor::new().extract(&tarball).unwrap();
        assert_eq!(meta.name, "FromYaml");
        assert_eq!(meta.version, "1.1");
    }

    #[test]
    fn no_metadata_at_all_is_an_error() {
        let (_dir, tarball) =
            write_tarball(TarballBuilder::new("Dist-1.0").file("lib/Dist.pm", "package Dist;"));

        assert!(matches!(
            MetaExtractor::new().extract(&tarball),
            Err(ExtractError::NoMetadata)
        ));
    }

    #[test]
    fn configure_mode_prefers_shipped_mymeta() {
        let (_dir, tarball) = write_tarball(
            TarballBuilder::new("Dist-1.0")
                .file("META.json", r#"{"name":"Static","version":"1.0"}"#)
                .file(
                    "MYMETA.json",
                    r#"{"name":"Dynamic","version":"1.0",
                        "prereqs":{"runtime":{"requires":{"Detected::Dep":"2.0"}}}}"#,
                )
                .file("Makefile.PL", "exit 1"),
        );

        let meta = MetaExtractor::new().extract_with_configure(&tarball).unwrap();
        assert_eq!(meta.name, "Dynamic");
        assert_eq!(meta.requirements["Detected::Dep"], "2.0");
    }

    #[test]
    fn failed_configure_falls_back_to_static() {
        // The configure script cannot run (no usable interpreter invocation
        // for this fixture), so static META.json must win.
        let (_dir, tarball) = write_tarball(
            TarballBuilder::new("Dist-1.0")
                .file("META.json", r#"{"name":"Static","version":"1.0"}"#)
                .file("Makefile.PL", "die 'no dynamic metadata here';"),
        );

        let meta = MetaExtractor::new().extract_with_configure(&tarball).unwrap();
        assert_eq!(meta.name, "Static");
    }

    #[test]
    fn configure_mode_without_scripts_reads_static() {
        let (_dir, tarball) = write_tarball(
            TarballBuilder::new("Dist-1.0")
                .file("META.json", r#"{"name":"OnlyStatic","version":"0.1"}"#),
        );

        let meta = MetaExtractor::new().extract_with_configure(&tarball).unwrap();
        assert_eq!(meta.name, "OnlyStatic");
    }

    #[test]
    fn mymeta_yml_is_second_choice() {
        let (_dir, tarball) = write_tarball(
            TarballBuilder::new("Dist-1.0")
                .file("MYMETA.yml", "---\nname: DynamicYaml\nversion: '0.2'\n")
                .file("META.json", r#"{"name":"Static","version":"1.0"}"#),
        );

        let meta = MetaExtractor::new().extract_with_configure(&tarball).unwrap();
        assert_eq!(meta.name, "DynamicYaml");
    }
}
