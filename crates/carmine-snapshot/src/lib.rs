//! Carton v1.0 snapshot format.
//!
//! The snapshot is the canonical textual output of a resolve: every chosen
//! distribution with its pathname, the modules it provides, and the
//! requirements it declares. Emission is deterministic (distributions sort
//! by name, module lines by module name), so any permutation of the same
//! record set produces identical bytes. The parser is the exact inverse.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod emitter;
mod parser;

pub use emitter::{emit, emit_to_string, normalize_requirement};
pub use parser::{load, parse, SnapshotError};

/// First line of every snapshot file.
pub const HEADER: &str = "# carton snapshot format: version 1.0\n";
