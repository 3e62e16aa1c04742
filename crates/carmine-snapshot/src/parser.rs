//! Snapshot parsing: the inverse of emission.

use carmine_core::Dist;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Snapshot-specific error types.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// I/O error with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Provides,
    Requirements,
}

/// Parse snapshot text into distribution records.
///
/// Indentation is significant: two spaces introduce a distribution, four a
/// field or section header, six a module line whose version is the entire
/// rest of the line. Comment lines, the `DISTRIBUTIONS` marker, blank and
/// unrecognized lines are skipped, so parsing is total.
#[must_use]
pub fn parse(input: &str) -> Vec<Arc<Dist>> {
    let mut dists = Vec::new();
    let mut current: Option<Dist> = None;
    let mut section = Section::None;

    for line in input.lines() {
        if line.starts_with('#') || line == "DISTRIBUTIONS" || line.is_empty() {
            continue;
        }

        // Module line: six spaces, module token, single space, version rest.
        if let Some(rest) = line.strip_prefix("      ") {
            if let Some(current) = current.as_mut() {
                if let Some((module, version)) = rest.split_once(' ') {
                    if !module.is_empty() && !version.is_empty() {
                        match section {
                            Section::Provides => {
                                current
                                    .provides
                                    .insert(module.to_string(), version.to_string());
                            }
                            Section::Requirements => {
                                current
                                    .requirements
                                    .insert(module.to_string(), version.to_string());
                            }
                            Section::None => {}
                        }
                    }
                }
            }
            continue;
        }

        // Field or section header: four spaces.
        if let Some(rest) = line.strip_prefix("    ") {
            if let Some(current) = current.as_mut() {
                if let Some(pathname) = rest.strip_prefix("pathname: ") {
                    current.pathname = pathname.to_string();
                } else if rest == "provides:" {
                    section = Section::Provides;
                } else if rest == "requirements:" {
                    section = Section::Requirements;
                }
            }
            continue;
        }

        // Distribution name: two spaces and a single non-space token.
        if let Some(rest) = line.strip_prefix("  ") {
            if !rest.is_empty() && !rest.contains(char::is_whitespace) {
                if let Some(done) = current.take() {
                    dists.push(Arc::new(done));
                }
                current = Some(Dist {
                    name: rest.to_string(),
                    pathname: String::new(),
                    provides: BTreeMap::new(),
                    requirements: BTreeMap::new(),
                    source: None,
                });
                section = Section::None;
            }
        }
    }

    if let Some(done) = current.take() {
        dists.push(Arc::new(done));
    }

    dists
}

/// Read and parse a snapshot file.
///
/// # Errors
/// Returns an I/O error if the file cannot be read.
pub fn load(path: &Path) -> Result<Vec<Arc<Dist>>, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|e| SnapshotError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(parse(&text))
}
