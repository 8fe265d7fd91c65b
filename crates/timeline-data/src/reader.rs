//! Event-log parsing for the scan timeline.
//!
//! Detects the input format from the file extension and parses either a
//! single JSON array (`.json`) or one JSON object per line (`.jsonl`) into
//! [`ScanEvent`] records. Parsing is all-or-nothing: the first malformed
//! document or line aborts the whole batch.

use std::path::Path;

use timeline_core::error::{Result, TimelineError};
use timeline_core::models::ScanEvent;
use tracing::debug;

// ── InputFormat ───────────────────────────────────────────────────────────────

/// Supported event-log layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A single JSON document whose top-level value is an array of events.
    Json,
    /// UTF-8 text with one JSON event object per non-empty line.
    JsonLines,
}

impl InputFormat {
    /// Pick the format from the file extension (`.json` or `.jsonl`,
    /// compared case-insensitively).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(InputFormat::Json),
            Some("jsonl") => Ok(InputFormat::JsonLines),
            _ => Err(TimelineError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse already-read text in the given format.
pub fn parse_events(text: &str, format: InputFormat) -> Result<Vec<ScanEvent>> {
    let events = match format {
        InputFormat::Json => parse_json_array(text)?,
        InputFormat::JsonLines => parse_json_lines(text)?,
    };
    debug!("Parsed {} events ({:?})", events.len(), format);
    Ok(events)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_json_array(text: &str) -> Result<Vec<ScanEvent>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_array() {
        return Err(TimelineError::NotAnArray);
    }
    Ok(serde_json::from_value(value)?)
}

/// Parse one event per non-empty line; line numbers in errors are 1-based.
fn parse_json_lines(text: &str) -> Result<Vec<ScanEvent>> {
    let mut events = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event = serde_json::from_str::<ScanEvent>(trimmed).map_err(|source| {
            TimelineError::JsonLine {
                line: idx + 1,
                source,
            }
        })?;
        events.push(event);
    }

    Ok(events)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
