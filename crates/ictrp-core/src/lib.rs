//! Core types for the ICTRP weekly trial-list pipeline.
//!
//! This crate is free of I/O. It defines the trial record as it moves through
//! the pipeline, the registries trials come from, and the per-registry date
//! rules. Every other crate depends on it.

pub mod date;
pub mod error;
pub mod lookup;
pub mod registry;
pub mod snapshot;
pub mod trial;

pub use error::{Error, Result};
