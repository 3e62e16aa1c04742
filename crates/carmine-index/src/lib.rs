//! Module indexes for Carmine.
//!
//! Two tiers of lookup:
//! - [`PrimaryIndex`]: the flat `02packages.details.txt` table published by
//!   a mirror, cached on disk with a 24 hour TTL. Answers "what is the
//!   latest version of module X and where does its tarball live".
//! - [`HistoricalIndex`]: a remote JSON query API that resolves a module
//!   plus version constraint to a direct tarball URL for any previously
//!   published release. Used when the primary index cannot satisfy a
//!   constraint.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod historical;
mod primary;

pub use error::{IndexError, Result};
pub use historical::{HistoricalIndex, HistoricalRelease, DEFAULT_API_URL};
pub use primary::{IndexEntry, PrimaryIndex, CACHE_TTL};
