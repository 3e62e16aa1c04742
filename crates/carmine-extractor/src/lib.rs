//! Distribution metadata extraction.
//!
//! Reads a gzip-compressed tar archive of a distribution and produces a
//! normalized [`MetaFile`]: the distribution's identity, the modules it
//! provides, and a flat map of its declared requirements.
//!
//! Metadata comes in two schema generations (the modern `prereqs` tree and
//! the legacy top-level `requires` family) plus a vendor extension
//! (`x_alienfile`); all three are folded into one requirements map. In
//! with-dynamic-configure mode the extractor prefers `MYMETA` files and,
//! when the tarball only ships a configure script, runs it (on the host or
//! in a container) to generate them.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod archive;
mod configure;
mod error;
mod extractor;
mod meta;

pub use error::{ExtractError, Result};
pub use extractor::MetaExtractor;
pub use meta::{MetaFile, ProvidesEntry};
