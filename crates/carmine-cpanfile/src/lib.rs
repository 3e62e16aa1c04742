//! `cpanfile` manifest parsing.
//!
//! Understands the subset of the DSL that declares requirements:
//!
//! ```text
//! requires 'Plack', '>= 1.0';
//! on 'test' => sub {
//!     requires 'Test::More', '0.98';
//! };
//! ```
//!
//! Requirements outside any `on` block belong to the runtime phase.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use carmine_core::{Phase, Requirement};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static REQUIRES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*requires\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#)
        .expect("valid regex")
});
static ON_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*on\s+['"](\w+)['"]\s*=>\s*sub\s*\{"#).expect("valid regex")
});
static CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\}").expect("valid regex"));

/// Manifest-specific error types.
#[derive(Error, Debug)]
pub enum CpanfileError {
    /// I/O error with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

/// Parsed manifest: requirements grouped by phase.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cpanfile {
    /// Requirements per declared phase, in declaration order.
    pub requirements: BTreeMap<Phase, Vec<Requirement>>,
}

impl Cpanfile {
    /// All requirements across every phase, in phase order.
    #[must_use]
    pub fn all_requirements(&self) -> Vec<Requirement> {
        self.requirements.values().flatten().cloned().collect()
    }

    /// Total requirement count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.values().map(Vec::len).sum()
    }

    /// Whether the manifest declares no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse manifest text.
///
/// Comments and unrecognized lines are skipped; a bare
/// `requires 'Module';` defaults its constraint to `0`.
#[must_use]
pub fn parse(input: &str) -> Cpanfile {
    let mut cpanfile = Cpanfile::default();
    let mut phase = Phase::Runtime;
    let mut in_block = false;

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(captures) = ON_BLOCK_RE.captures(line) {
            phase = Phase::parse(&captures[1]);
            in_block = true;
            continue;
        }

        if in_block && CLOSE_RE.is_match(line) {
            phase = Phase::Runtime;
            in_block = false;
            continue;
        }

        if let Some(captures) = REQUIRES_RE.captures(line) {
            let module = captures[1].to_string();
            let constraint = captures
                .get(2)
                .map_or_else(|| "0".to_string(), |m| m.as_str().to_string());
            cpanfile
                .requirements
                .entry(phase)
                .or_default()
                .push(Requirement::new(module, constraint));
        }
    }

    cpanfile
}

/// Read and parse a manifest file.
///
/// # Errors
/// Returns an I/O error if the file cannot be read.
pub fn load(path: &Path) -> Result<Cpanfile, CpanfileError> {
    let text = std::fs::read_to_string(path).map_err(|e| CpanfileError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(parse(&text))
}
