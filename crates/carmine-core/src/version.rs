//! Perl-style version comparison and constraint satisfaction.
//!
//! Version strings come in two conventions, detected by shape:
//!
//! - **Dotted**: optional leading `v`, two or more dot-separated components,
//!   or a single integer. `3.18.0` compares as `[3, 18, 0]`.
//! - **Decimal**: exactly two components where the fractional part is longer
//!   than three digits. The fraction is cut into groups of three digits,
//!   each an integer: `3.007004` compares as `[3, 7, 4]`.
//!
//! Comparison is lexicographic over the integer sequences with missing
//! trailing components treated as zero, so `1.001` and `1.1` are equal while
//! `2.005005` sorts above `2.005`.
//!
//! The literal `undef` is an unknown version that satisfies every
//! constraint; the empty string equals `0`.

use std::cmp::Ordering;

/// Compare two version strings.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    let av = components(a);
    let bv = components(b);
    let len = av.len().max(bv.len());
    for i in 0..len {
        let x = av.get(i).copied().unwrap_or(0);
        let y = bv.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

/// Parse a version string into its integer components.
///
/// Non-numeric components parse as zero, which keeps the comparator total
/// over arbitrary input.
fn components(v: &str) -> Vec<u64> {
    let v = v.strip_prefix('v').unwrap_or(v);
    if v.is_empty() {
        return vec![0];
    }

    let parts: Vec<&str> = v.split('.').collect();
    if parts.len() == 1 {
        return vec![parse_component(parts[0])];
    }

    // Decimal shape: a single fractional component longer than three digits.
    if parts.len() == 2 && parts[1].len() > 3 {
        let mut out = vec![parse_component(parts[0])];
        let mut frac = parts[1];
        while !frac.is_empty() {
            let cut = frac.len().min(3);
            out.push(parse_component(&frac[..cut]));
            frac = &frac[cut..];
        }
        return out;
    }

    parts.iter().map(|p| parse_component(p)).collect()
}

fn parse_component(s: &str) -> u64 {
    s.parse().unwrap_or(0)
}

/// Comparison operator of a single constraint clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
    Ne,
}

impl Op {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Ge => ord != Ordering::Less,
            Self::Gt => ord == Ordering::Greater,
            Self::Le => ord != Ordering::Greater,
            Self::Lt => ord == Ordering::Less,
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    op: Op,
    version: String,
}

/// A parsed version constraint: a comma-separated intersection of clauses.
///
/// Each clause is an operator (`>=`, `>`, `<=`, `<`, `==`, `!=`) followed by
/// a version; a bare version means `>=`. Empty input or `0` parses to an
/// unconstrained value that every version satisfies. Parsing is total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    clauses: Vec<Clause>,
}

impl Constraint {
    /// Parse a constraint string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut clauses = Vec::new();
        for raw in s.split(',') {
            let raw = raw.trim();
            if raw.is_empty() || raw == "0" {
                continue;
            }
            clauses.push(parse_clause(raw));
        }
        Self { clauses }
    }

    /// Whether this constraint accepts every version.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Check whether a version satisfies every clause.
    ///
    /// The literal `undef` satisfies any constraint; an empty version
    /// compares as `0`.
    #[must_use]
    pub fn accepts(&self, version: &str) -> bool {
        if version == "undef" {
            return true;
        }
        let version = if version.is_empty() { "0" } else { version };
        self.clauses
            .iter()
            .all(|c| c.op.holds(compare(version, &c.version)))
    }
}

/// Two-character operators are matched before their one-character prefixes.
fn parse_clause(raw: &str) -> Clause {
    let (op, rest) = if let Some(rest) = raw.strip_prefix(">=") {
        (Op::Ge, rest)
    } else if let Some(rest) = raw.strip_prefix("<=") {
        (Op::Le, rest)
    } else if let Some(rest) = raw.strip_prefix("!=") {
        (Op::Ne, rest)
    } else if let Some(rest) = raw.strip_prefix("==") {
        (Op::Eq, rest)
    } else if let Some(rest) = raw.strip_prefix('>') {
        (Op::Gt, rest)
    } else if let Some(rest) = raw.strip_prefix('<') {
        (Op::Lt, rest)
    } else {
        (Op::Ge, raw)
    };
    Clause {
        op,
        version: rest.trim().to_string(),
    }
}

/// Check whether `version` satisfies `constraint`.
///
/// Convenience wrapper over [`Constraint::parse`] and
/// [`Constraint::accepts`] for the common one-shot case.
#[must_use]
pub fn satisfies(version: &str, constraint: &str) -> bool {
    let trimmed = constraint.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return true;
    }
    Constraint::parse(constraint).accepts(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_is_reflexive() {
        for v in ["0", "1.2.3", "3.007004", "undef-ish", "v5.8.1", ""] {
            assert_eq!(compare(v, v), Ordering::Equal, "cmp({v},{v})");
        }
    }

    #[test]
    fn compare_is_antisymmetric() {
        let pairs = [("1.0", "2.0"), ("3.18.0", "3.007004"), ("0.01", "0.001")];
        for (a, b) in pairs {
            assert_eq!(compare(a, b), compare(b, a).reverse());
        }
    }

    #[test]
    fn dotted_decimal_parity() {
        assert_eq!(compare("3.18.0", "3.007004"), Ordering::Greater);
        assert_eq!(compare("2.005005", "2.005"), Ordering::Greater);
        assert_eq!(compare("1.001", "1.1"), Ordering::Equal);
    }

    #[test]
    fn decimal_grouping() {
        // 3.007004 -> [3, 7, 4]
        assert_eq!(compare("3.007004", "3.7.4"), Ordering::Equal);
        // 0.080001 -> [0, 80, 1]
        assert_eq!(compare("0.080001", "0.80.1"), Ordering::Equal);
        // Trailing partial group: 1.23456 -> [1, 234, 56]
        assert_eq!(compare("1.23456", "1.234.56"), Ordering::Equal);
    }

    #[test]
    fn missing_components_are_zero() {
        assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("1", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("", "0"), Ordering::Equal);
    }

    #[test]
    fn v_prefix_is_ignored() {
        assert_eq!(compare("v5.8.1", "5.8.1"), Ordering::Equal);
    }

    #[test]
    fn undef_satisfies_everything() {
        for c in ["", "0", ">= 99", "< 0.1", "== 2.0", ">= 1.0, < 2.0"] {
            assert!(satisfies("undef", c), "undef vs {c:?}");
        }
    }

    #[test]
    fn empty_and_zero_constraints_accept_all() {
        for v in ["0", "1.5", "99.99", ""] {
            assert!(satisfies(v, ""));
            assert!(satisfies(v, "0"));
        }
    }

    #[test]
    fn range_constraints() {
        assert!(satisfies("2.5", ">= 2.0, < 3.0"));
        assert!(satisfies("2.0", ">= 2.0, < 3.0"));
        assert!(!satisfies("3.0", ">= 2.0, < 3.0"));
        assert!(!satisfies("1.9", ">= 2.0, < 3.0"));
    }

    #[test]
    fn bare_version_means_at_least() {
        assert!(satisfies("1.5", "1.0"));
        assert!(!satisfies("0.9", "1.0"));
    }

    #[test]
    fn explicit_operators() {
        assert!(satisfies("2.0", "> 1.0"));
        assert!(!satisfies("1.0", "> 1.0"));
        assert!(satisfies("1.0", "<= 1.0"));
        assert!(satisfies("1.0", "== 1.0"));
        assert!(!satisfies("1.0", "!= 1.0"));
        assert!(satisfies("1.1", "!= 1.0"));
    }

    #[test]
    fn empty_version_compares_as_zero() {
        assert!(satisfies("", "0"));
        assert!(!satisfies("", ">= 1.0"));
    }

    #[test]
    fn decimal_constraint_against_dotted_version() {
        // 2.005005 is [2, 5, 5]; 2.6.0 exceeds it.
        assert!(satisfies("2.6.0", ">= 2.005005"));
        assert!(!satisfies("2.4", ">= 2.005005"));
    }
}
