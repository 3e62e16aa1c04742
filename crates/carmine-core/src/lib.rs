//! Core types and utilities for the Carmine snapshot generator.
//!
//! This crate provides the foundational pieces shared by every other
//! Carmine crate:
//! - The [`Dist`] distribution record and requirement types
//! - Perl-style version comparison across dotted and decimal formats
//! - Version constraint parsing and satisfaction
//! - Flex coercion for metadata fields that may be string or number

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod dist;
pub mod flex;
pub mod version;

pub use dist::{Dist, Phase, Requirement, Source};
pub use flex::{deserialize_flex, flex_string};
pub use version::{compare, satisfies, Constraint};
