//! Output sinks for processed article batches.
//!
//! # Submodules
//!
//! - [`csv`]: Writes a `BatchReport` as tabular CSV, one row per article,
//!   with a fixed header equal to the normalizer's output catalog.

pub mod csv;
