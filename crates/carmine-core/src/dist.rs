//! Distribution records and requirements.

use std::collections::BTreeMap;
use std::fmt;

/// Where a distribution was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The primary mirror index (latest published versions).
    Primary,
    /// The historical lookup service (any previously published version).
    Historical,
}

impl Source {
    /// Get the string representation of the source tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Historical => "historical",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved distribution: one versioned tarball and the modules it carries.
///
/// Records are immutable once inserted into the resolver's resolved set.
/// `provides` and `requirements` are kept in sorted maps so snapshot
/// emission is canonical without extra sorting passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dist {
    /// Distribution name, e.g. `Module-Name-1.23`.
    pub name: String,
    /// Author-relative pathname, e.g. `A/AU/AUTHOR/Module-Name-1.23.tar.gz`.
    pub pathname: String,
    /// Module name to provided version.
    pub provides: BTreeMap<String, String>,
    /// Module name to version constraint.
    pub requirements: BTreeMap<String, String>,
    /// Source tag; `None` for records parsed back from a snapshot.
    pub source: Option<Source>,
}

impl Dist {
    /// Derive a distribution name from an author-relative pathname.
    ///
    /// `A/AU/AUTHOR/Dist-Name-1.23.tar.gz` becomes `Dist-Name-1.23`.
    #[must_use]
    pub fn name_from_pathname(pathname: &str) -> String {
        let base = pathname.rsplit('/').next().unwrap_or(pathname);
        base.strip_suffix(".tar.gz")
            .or_else(|| base.strip_suffix(".tgz"))
            .unwrap_or(base)
            .to_string()
    }
}

/// A (module, constraint) pair from a manifest or a distribution's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Module name, e.g. `Plack::Middleware`.
    pub module: String,
    /// Version constraint, e.g. `>= 1.0, < 2.0`. `0` or empty means any.
    pub constraint: String,
}

impl Requirement {
    /// Create a new requirement.
    pub fn new(module: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            constraint: constraint.into(),
        }
    }
}

/// Dependency phase declared in a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Needed at runtime (the default phase).
    Runtime,
    /// Needed to run the test suite.
    Test,
    /// Needed for development only.
    Develop,
    /// Needed to build the distribution.
    Build,
}

impl Phase {
    /// Parse a phase name; unknown names fall back to runtime.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "test" => Self::Test,
            "develop" => Self::Develop,
            "build" => Self::Build,
            _ => Self::Runtime,
        }
    }

    /// Get the string representation of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::Develop => "develop",
            Self::Build => "build",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
