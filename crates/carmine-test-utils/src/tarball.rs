//! In-memory construction of distribution tarballs.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::Path;

/// Builder for a gzip-compressed tar archive shaped like a real
/// distribution: a single top-level directory containing the given files.
#[derive(Debug, Clone)]
pub struct TarballBuilder {
    topdir: String,
    files: Vec<(String, Vec<u8>)>,
}

impl TarballBuilder {
    /// Start a tarball whose entries live under `topdir/`.
    pub fn new(topdir: impl Into<String>) -> Self {
        Self {
            topdir: topdir.into(),
            files: Vec::new(),
        }
    }

    /// Add a file directly under the top-level directory.
    #[must_use]
    pub fn file(self, name: &str, content: impl AsRef<[u8]>) -> Self {
        let topdir = self.topdir.clone();
        self.entry(format!("{topdir}/{name}"), content)
    }

    /// Add a file at an arbitrary path inside the archive.
    #[must_use]
    pub fn entry(mut self, path: impl Into<String>, content: impl AsRef<[u8]>) -> Self {
        self.files.push((path.into(), content.as_ref().to_vec()));
        self
    }

    /// Serialize to gzipped tar bytes.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut archive = tar::Builder::new(encoder);
        for (path, content) in &self.files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            archive
                .append_data(&mut header, path, content.as_slice())
                .expect("appending tar entry");
        }
        archive
            .into_inner()
            .expect("finishing tar")
            .finish()
            .expect("finishing gzip")
    }

    /// Write the tarball to a file.
    ///
    /// # Errors
    /// Returns any I/O error from the write.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        file.write_all(&self.build())
    }
}
