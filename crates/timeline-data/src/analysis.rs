//! Analysis pipeline for the scan timeline.
//!
//! Runs grouping, statistics and throughput over one parsed event list and
//! returns an [`AnalysisResult`] ready for any presentation layer.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use timeline_core::error::Result;
use timeline_core::models::{
    CompletedScan, GroupingReport, RequestThroughput, ScanEvent, Statistics, ViewConfig,
};
use tracing::info;

use crate::aggregator::EventAggregator;
use crate::reader::{parse_events, InputFormat};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// File the events were read from, when known.
    pub source: Option<String>,
    /// Wall-clock seconds spent reading and parsing the input.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent grouping and computing statistics.
    pub transform_time_seconds: f64,
}

/// The complete output of one ingestion pass.
///
/// `scans` holds every completed scan, longest first. Statistics and
/// throughput always describe this full set; use [`AnalysisResult::view`]
/// for a filtered selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub scans: Vec<CompletedScan>,
    pub statistics: Statistics,
    pub throughput: RequestThroughput,
    pub report: GroupingReport,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// The scans selected by `view`, without touching the statistics.
    pub fn view(&self, view: &ViewConfig) -> Vec<CompletedScan> {
        EventAggregator::apply_view(&self.scans, view)
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run grouping, statistics and throughput over `events`.
pub fn analyze_events(events: &[ScanEvent]) -> AnalysisResult {
    let transform_start = std::time::Instant::now();
    let (scans, report) = EventAggregator::group_with_report(events);
    let statistics = EventAggregator::compute_statistics(&scans);
    let throughput = EventAggregator::compute_throughput(&scans);
    let transform_time = transform_start.elapsed().as_secs_f64();

    AnalysisResult {
        scans,
        statistics,
        throughput,
        report,
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            source: None,
            load_time_seconds: 0.0,
            transform_time_seconds: transform_time,
        },
    }
}

/// Parse event-log text read from `path` and analyse it.
///
/// `path` picks the input format and is recorded as the result's source.
/// `load_time_seconds` is the time the caller spent reading the file; parse
/// time is added to it. Any format or parse error aborts the whole pass.
pub fn analyze_text(path: &Path, text: &str, load_time_seconds: f64) -> Result<AnalysisResult> {
    let format = InputFormat::from_path(path)?;

    let parse_start = std::time::Instant::now();
    let events = parse_events(text, format)?;
    let parse_time = parse_start.elapsed().as_secs_f64();

    let mut result = analyze_events(&events);
    result.metadata.source = Some(path.display().to_string());
    result.metadata.load_time_seconds = load_time_seconds + parse_time;

    info!(
        "Analysed {}: {} events, {} completed scans",
        path.display(),
        result.report.events_processed,
        result.statistics.count
    );

    Ok(result)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_core::error::TimelineError;
    use timeline_core::models::TopN;

    const EVENTS: &str = r#"{"template_id":"t1","target":"h1","event_type":"scan_start","time":"2025-01-01T00:00:00.000Z","template_path":"/a/t1.yaml","template_type":"http","max_requests":1}
{"template_id":"t1","target":"h1","event_type":"scan_end","time":"2025-01-01T00:00:02.500Z"}
{"template_id":"t2","target":"h1","event_type":"scan_start","time":"2025-01-01T00:00:01.000Z"}
{"template_id":"t3","target":"h1","event_type":"scan_start","time":"2025-01-01T00:00:01.000Z","template_path":"/b/t3.yaml","max_requests":4}
{"template_id":"t3","target":"h1","event_type":"scan_end","time":"2025-01-01T00:00:02.000Z"}
"#;

    fn analyze(name: &str, text: &str) -> Result<AnalysisResult> {
        analyze_text(Path::new(name), text, 0.25)
    }

    #[test]
    fn test_analyze_text_jsonl() {
        let result = analyze("/logs/events.jsonl", EVENTS).unwrap();
        assert_eq!(result.scans.len(), 2);
        assert_eq!(result.scans[0].template_id, "t1");
        assert_eq!(result.statistics.count, 2);
        assert_eq!(result.statistics.longest_duration_ms, 2500.0);
        assert_eq!(result.statistics.shortest_duration_ms, 1000.0);
        assert_eq!(result.throughput.total_requests, 5);
        assert_eq!(result.report.incomplete_scans, 1);
        assert_eq!(result.metadata.source.as_deref(), Some("/logs/events.jsonl"));
        assert!(result.metadata.load_time_seconds >= 0.25);
    }

    #[test]
    fn test_analyze_text_json_array() {
        let body = format!("[{}]", EVENTS.trim_end().replace('\n', ","));
        let result = analyze("events.json", &body).unwrap();
        assert_eq!(result.statistics.count, 2);
    }

    #[test]
    fn test_analyze_text_unsupported_format() {
        assert!(matches!(
            analyze("events.txt", EVENTS),
            Err(TimelineError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_analyze_text_bad_line_aborts() {
        let text = format!("{}{{oops\n", EVENTS);
        assert!(matches!(
            analyze("events.jsonl", &text),
            Err(TimelineError::JsonLine { line: 6, .. })
        ));
    }

    #[test]
    fn test_view_does_not_change_statistics() {
        let result = analyze("events.jsonl", EVENTS).unwrap();
        let before = result.statistics.clone();

        let shown = result.view(&ViewConfig::new(TopN::All, "/b/"));
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].template_id, "t3");
        assert_ne!(EventAggregator::compute_statistics(&shown), before);

        let shown = result.view(&ViewConfig::new("1".parse().unwrap(), ""));
        assert_eq!(ids(&shown), vec!["t1"]);

        assert_eq!(result.statistics, before);
        assert_eq!(result.statistics.count, 2);
    }

    #[test]
    fn test_analyze_events_empty() {
        let result = analyze_events(&[]);
        assert!(result.scans.is_empty());
        assert_eq!(result.statistics.count, 0);
        assert!(result.metadata.source.is_none());
    }

    fn ids(scans: &[CompletedScan]) -> Vec<&str> {
        scans.iter().map(|s| s.template_id.as_str()).collect()
    }
}
