//! Deterministic snapshot emission.

use crate::HEADER;
use carmine_core::Dist;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::Arc;

/// Write records as a snapshot.
///
/// Distributions are sorted by name and deduplicated by pathname: a
/// distribution bound under several module keys appears exactly once, and
/// any later record sharing a pathname with an earlier one is dropped.
/// Empty `provides` and `requirements` sections are omitted entirely.
///
/// # Errors
/// Returns any I/O error from the writer.
pub fn emit<W: Write>(writer: &mut W, dists: &[Arc<Dist>]) -> io::Result<()> {
    writer.write_all(emit_to_string(dists).as_bytes())
}

/// Render records as a snapshot string.
#[must_use]
pub fn emit_to_string(dists: &[Arc<Dist>]) -> String {
    let mut sorted: Vec<&Arc<Dist>> = dists.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seen = HashSet::new();
    let mut out = String::from(HEADER);
    out.push_str("DISTRIBUTIONS\n");

    for dist in sorted {
        if !seen.insert(dist.pathname.as_str()) {
            continue;
        }

        let _ = writeln!(out, "  {}", dist.name);
        let _ = writeln!(out, "    pathname: {}", dist.pathname);

        if !dist.provides.is_empty() {
            out.push_str("    provides:\n");
            for (module, version) in &dist.provides {
                let version = if version.is_empty() { "undef" } else { version };
                let _ = writeln!(out, "      {module} {version}");
            }
        }

        if !dist.requirements.is_empty() {
            out.push_str("    requirements:\n");
            for (module, constraint) in &dist.requirements {
                let _ = writeln!(out, "      {module} {}", normalize_requirement(constraint));
            }
        }
    }

    out
}

/// Normalize a requirement constraint for the snapshot: keep only the part
/// before the first comma and strip a leading `>=`, `>`, `==` or `=`.
/// Upper-bound and exclusion operators are left intact; an empty result
/// becomes `0`.
#[must_use]
pub fn normalize_requirement(constraint: &str) -> String {
    let mut v = constraint.trim();
    if let Some(idx) = v.find(',') {
        v = v[..idx].trim();
    }
    v = v
        .strip_prefix(">=")
        .or_else(|| v.strip_prefix("=="))
        .or_else(|| v.strip_prefix('>'))
        .or_else(|| v.strip_prefix('='))
        .unwrap_or(v);
    let v = v.trim();
    if v.is_empty() {
        "0".to_string()
    } else {
        v.to_string()
    }
}
