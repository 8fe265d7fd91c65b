//! Shared model and configuration layer for the scan timeline.
//!
//! Holds the scan-event data model, the error type, timestamp parsing,
//! duration formatting, timezone handling and command-line settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
pub mod timestamps;

pub use error::{Result, TimelineError};
