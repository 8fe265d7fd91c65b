//! Runtime layer for the scan timeline.
//!
//! Owns the in-memory view session: asynchronous file ingestion that keeps
//! the last good dataset on failure, and re-filterable snapshots for the
//! presentation layer.

pub mod session;

pub use timeline_core as core;
pub use timeline_data as data;
