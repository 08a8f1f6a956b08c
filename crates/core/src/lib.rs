//! Domain types and pure logic for the camwatch data layer.
//!
//! This crate has no I/O: cameras, tags, demographics configuration and
//! detection records, range validation, filter normalization, distribution
//! summaries, and pagination maths. The client and data crates build on it.

pub mod analytics;
pub mod camera;
pub mod demographics;
pub mod error;
pub mod filters;
pub mod pagination;
pub mod types;
pub mod validation;
