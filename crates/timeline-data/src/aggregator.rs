//! Pairing of `scan_start` / `scan_end` events into completed scans.
//!
//! [`EventAggregator::group`] is a single pass over the event list keyed by
//! `template_id` + `target`. The filters and statistics below are pure
//! functions over the duration-sorted result, so a caller can re-run them on
//! every view change without re-parsing the log.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use timeline_core::models::{
    CompletedScan, EventType, GroupingReport, RequestThroughput, ScanEvent, Statistics, TopN,
    ViewConfig,
};
use timeline_core::timestamps::TimestampProcessor;
use tracing::{debug, warn};

// ── ScanGroup ─────────────────────────────────────────────────────────────────

/// Mutable accumulator for one `template_id` + `target` key.
#[derive(Debug, Clone)]
struct ScanGroup {
    template_id: String,
    target: String,
    template_type: Option<String>,
    template_path: Option<String>,
    max_requests: Option<u64>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl ScanGroup {
    fn new(event: &ScanEvent) -> Self {
        Self {
            template_id: event.template_id.clone(),
            target: event.target.clone(),
            template_type: event.template_type.clone(),
            template_path: event.template_path.clone(),
            max_requests: event.max_requests,
            start_time: None,
            end_time: None,
        }
    }

    /// Fill metadata the group does not have yet. The first non-null value
    /// seen for a field is kept.
    fn merge_metadata(&mut self, event: &ScanEvent) {
        if self.template_type.is_none() {
            self.template_type = event.template_type.clone();
        }
        if self.template_path.is_none() {
            self.template_path = event.template_path.clone();
        }
        if self.max_requests.is_none() {
            self.max_requests = event.max_requests;
        }
    }

    fn into_completed(self) -> Option<CompletedScan> {
        let start = self.start_time?;
        let end = self.end_time?;
        Some(CompletedScan::new(
            self.template_id,
            self.target,
            self.template_type,
            self.template_path,
            self.max_requests,
            start,
            end,
        ))
    }
}

// ── EventAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that turns scan events into ranked completed scans.
pub struct EventAggregator;

impl EventAggregator {
    /// Pair start/end events and return completed scans, longest first.
    pub fn group(events: &[ScanEvent]) -> Vec<CompletedScan> {
        Self::group_with_report(events).0
    }

    /// Same as [`EventAggregator::group`], also returning the pass counters.
    ///
    /// * Groups are created on first sight of a key, in input order.
    /// * A repeated `scan_start` (or `scan_end`) overwrites the earlier time.
    /// * A missing or unparsable `time` leaves the slot untouched.
    /// * Unrecognised event types are counted and otherwise ignored.
    /// * Ties in duration keep first-seen key order (the sort is stable).
    pub fn group_with_report(events: &[ScanEvent]) -> (Vec<CompletedScan>, GroupingReport) {
        let mut report = GroupingReport {
            events_processed: events.len(),
            ..Default::default()
        };

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<ScanGroup> = Vec::new();

        for event in events {
            let key = event.group_key();
            let idx = match index.get(&key).copied() {
                Some(idx) => {
                    groups[idx].merge_metadata(event);
                    idx
                }
                None => {
                    groups.push(ScanGroup::new(event));
                    index.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };
            let group = &mut groups[idx];

            let slot = match event.event_type {
                EventType::ScanStart => &mut group.start_time,
                EventType::ScanEnd => &mut group.end_time,
                EventType::Unrecognized => {
                    report.ignored_events += 1;
                    continue;
                }
            };

            match event.time.as_deref().and_then(TimestampProcessor::parse) {
                Some(ts) => *slot = Some(ts),
                None => report.invalid_timestamps += 1,
            }
        }

        report.unique_scans = groups.len();

        let mut scans: Vec<CompletedScan> = groups
            .into_iter()
            .filter_map(ScanGroup::into_completed)
            .collect();
        scans.sort_by(|a, b| b.duration.cmp(&a.duration));

        report.completed_scans = scans.len();
        report.incomplete_scans = report.unique_scans - report.completed_scans;
        report.negative_durations = scans.iter().filter(|s| s.duration < 0).count();

        debug!(
            "Grouping: {} events, {} keys, {} completed, {} incomplete, {} ignored, {} bad timestamps",
            report.events_processed,
            report.unique_scans,
            report.completed_scans,
            report.incomplete_scans,
            report.ignored_events,
            report.invalid_timestamps,
        );
        if report.negative_durations > 0 {
            warn!(
                "{} completed scans end before they start; durations passed through as negative",
                report.negative_durations
            );
        }

        (scans, report)
    }

    /// First `top_n` scans of the duration-sorted input, or all of them.
    pub fn filter_top_n(scans: &[CompletedScan], top_n: TopN) -> Vec<CompletedScan> {
        let limit = top_n.limit().unwrap_or(scans.len()).min(scans.len());
        scans[..limit].to_vec()
    }

    /// Scans whose `template_path` starts with `prefix` (case-sensitive).
    ///
    /// The empty prefix returns the input unchanged. Order is preserved.
    pub fn filter_by_path_prefix(scans: &[CompletedScan], prefix: &str) -> Vec<CompletedScan> {
        scans
            .iter()
            .filter(|s| s.matches_path_prefix(prefix))
            .cloned()
            .collect()
    }

    /// Apply a [`ViewConfig`]: the path filter narrows the candidates first,
    /// then top-N limits the count.
    pub fn apply_view(scans: &[CompletedScan], view: &ViewConfig) -> Vec<CompletedScan> {
        let filtered = Self::filter_by_path_prefix(scans, &view.path_prefix);
        Self::filter_top_n(&filtered, view.top_n)
    }

    /// Summary statistics over the complete completed-scan set.
    ///
    /// An empty input yields the zero record with no time range.
    pub fn compute_statistics(scans: &[CompletedScan]) -> Statistics {
        if scans.is_empty() {
            return Statistics::default();
        }

        let count = scans.len();
        let total: f64 = scans.iter().map(|s| s.duration as f64).sum();
        let longest = scans.iter().map(|s| s.duration).max().unwrap_or(0);
        let shortest = scans.iter().map(|s| s.duration).min().unwrap_or(0);

        let time_range_start = scans.iter().map(|s| s.start_time).min();
        let time_range_end = scans
            .iter()
            .map(|s| s.start_time + Duration::milliseconds(s.duration))
            .max();

        Statistics {
            count,
            average_duration_ms: total / count as f64,
            longest_duration_ms: longest as f64,
            shortest_duration_ms: shortest as f64,
            time_range_start,
            time_range_end,
        }
    }

    /// Declared request volume per second across the whole run.
    ///
    /// The span covers every start and end instant. A zero-length span
    /// reports the request total itself as the rate.
    pub fn compute_throughput(scans: &[CompletedScan]) -> RequestThroughput {
        if scans.is_empty() {
            return RequestThroughput::default();
        }

        let total_requests: u64 = scans.iter().filter_map(|s| s.max_requests).sum();

        let instants = scans.iter().flat_map(|s| [s.start_time, s.end_time]);
        let earliest = instants.clone().min();
        let latest = instants.max();
        let time_span_seconds = match (earliest, latest) {
            (Some(lo), Some(hi)) => (hi - lo).num_milliseconds() as f64 / 1000.0,
            _ => 0.0,
        };

        let mean_requests_per_sec = if time_span_seconds > 0.0 {
            total_requests as f64 / time_span_seconds
        } else {
            total_requests as f64
        };

        RequestThroughput {
            total_requests,
            time_span_seconds,
            mean_requests_per_sec,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
