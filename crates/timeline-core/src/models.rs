use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::error::TimelineError;

/// Maximum `template_id` length shown verbatim in a timeline row.
pub const DISPLAY_NAME_MAX_CHARS: usize = 30;

/// Number of characters kept when a `template_id` has to be shortened.
const DISPLAY_NAME_KEEP_CHARS: usize = 27;

/// Whether an event marks the beginning or the end of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ScanStart,
    ScanEnd,
    /// Any other `event_type` string. Ignored when pairing.
    #[serde(other)]
    Unrecognized,
}

/// A single record read from an event log.
///
/// Only the key fields and `event_type` are required; `scan_end` events
/// usually omit the template metadata. A null or absent `time` leaves the
/// corresponding slot of the scan unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Scanned endpoint identifier.
    pub target: String,
    /// Template identifier.
    pub template_id: String,
    /// Category label, e.g. `"http"` or `"dns"`.
    #[serde(default)]
    pub template_type: Option<String>,
    /// Filesystem-like path of the template definition.
    #[serde(default)]
    pub template_path: Option<String>,
    /// Declared request budget for the scan.
    #[serde(default)]
    pub max_requests: Option<u64>,
    /// ISO-8601 timestamp string, parsed lazily during grouping.
    #[serde(default)]
    pub time: Option<String>,
    pub event_type: EventType,
}

impl ScanEvent {
    /// Composite pairing key: `"{template_id}_{target}"`.
    pub fn group_key(&self) -> String {
        format!("{}_{}", self.template_id, self.target)
    }
}

/// A matched start/end pair with its derived display fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedScan {
    pub template_id: String,
    pub target: String,
    pub template_type: Option<String>,
    pub template_path: Option<String>,
    pub max_requests: Option<u64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `end_time - start_time` in milliseconds. Negative when the log has the
    /// two timestamps inverted.
    pub duration: i64,
    /// `duration / 1000`.
    pub duration_seconds: f64,
    /// Start instant as epoch milliseconds.
    pub start_timestamp: i64,
    /// Label used for timeline rows; see [`display_name`].
    pub display_name: String,
}

impl CompletedScan {
    /// Build a completed scan from its key fields and the two instants.
    pub fn new(
        template_id: String,
        target: String,
        template_type: Option<String>,
        template_path: Option<String>,
        max_requests: Option<u64>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let duration = (end_time - start_time).num_milliseconds();
        let display_name = display_name(&template_id);
        Self {
            template_id,
            target,
            template_type,
            template_path,
            max_requests,
            start_time,
            end_time,
            duration,
            duration_seconds: duration as f64 / 1000.0,
            start_timestamp: start_time.timestamp_millis(),
            display_name,
        }
    }

    /// `true` when `template_path` starts with `prefix`.
    ///
    /// The empty prefix matches every scan, including those without a path.
    pub fn matches_path_prefix(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return true;
        }
        self.template_path
            .as_deref()
            .map(|p| p.starts_with(prefix))
            .unwrap_or(false)
    }
}

/// Shorten a `template_id` for display.
///
/// Ids longer than 30 characters become their first 27 characters followed
/// by `"..."`; shorter ids are returned unchanged.
pub fn display_name(template_id: &str) -> String {
    if template_id.chars().count() > DISPLAY_NAME_MAX_CHARS {
        let head: String = template_id.chars().take(DISPLAY_NAME_KEEP_CHARS).collect();
        format!("{}...", head)
    } else {
        template_id.to_string()
    }
}

/// Summary figures over a set of completed scans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub count: usize,
    /// Arithmetic mean of all durations; `0.0` for an empty set.
    pub average_duration_ms: f64,
    pub longest_duration_ms: f64,
    pub shortest_duration_ms: f64,
    /// Earliest start instant. `None` for an empty set.
    pub time_range_start: Option<DateTime<Utc>>,
    /// Latest `start + duration` instant. `None` for an empty set.
    pub time_range_end: Option<DateTime<Utc>>,
}

/// Request-rate figures derived from the declared `max_requests` budgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestThroughput {
    pub total_requests: u64,
    pub time_span_seconds: f64,
    pub mean_requests_per_sec: f64,
}

/// Counters collected during one grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingReport {
    pub events_processed: usize,
    /// Distinct `template_id` + `target` keys.
    pub unique_scans: usize,
    pub completed_scans: usize,
    /// Keys that only saw one side of the start/end pair.
    pub incomplete_scans: usize,
    /// Events with an unrecognised `event_type`.
    pub ignored_events: usize,
    pub invalid_timestamps: usize,
    pub negative_durations: usize,
}

// ── View configuration ───────────────────────────────────────────────────────

/// How many of the longest scans to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TopN {
    #[default]
    All,
    Limit(NonZeroUsize),
}

impl TopN {
    /// The row limit, or `None` for [`TopN::All`].
    pub fn limit(&self) -> Option<usize> {
        match self {
            TopN::All => None,
            TopN::Limit(n) => Some(n.get()),
        }
    }
}

impl FromStr for TopN {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(TopN::All);
        }
        trimmed
            .parse::<NonZeroUsize>()
            .map(TopN::Limit)
            .map_err(|_| TimelineError::InvalidTopN(s.to_string()))
    }
}

impl TryFrom<String> for TopN {
    type Error = TimelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TopN> for String {
    fn from(value: TopN) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TopN {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopN::All => write!(f, "all"),
            TopN::Limit(n) => write!(f, "{}", n),
        }
    }
}

/// Display selection applied to the duration-sorted scan list.
///
/// Statistics are never computed through a view; they always cover the
/// complete dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub top_n: TopN,
    pub path_prefix: String,
}

impl ViewConfig {
    pub fn new(top_n: TopN, path_prefix: impl Into<String>) -> Self {
        Self {
            top_n,
            path_prefix: path_prefix.into(),
        }
    }
}
