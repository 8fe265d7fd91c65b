//! Data ingestion layer for the scan timeline.
//!
//! Responsible for reading `.json` / `.jsonl` scan-event logs, pairing
//! start/end events into completed scans, computing statistics and running
//! the top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod reader;

pub use timeline_core as core;
