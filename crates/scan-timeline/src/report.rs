//! Text and JSON rendering of a [`TimelineSnapshot`].

use timeline_core::formatting::{format_duration, format_number};
use timeline_core::models::CompletedScan;
use timeline_core::time_utils::TimezoneHandler;
use timeline_runtime::session::TimelineSnapshot;
use unicode_width::UnicodeWidthStr;

/// Widest target column before values are shortened.
const MAX_TARGET_WIDTH: usize = 40;

/// Pretty-printed JSON document of the snapshot.
pub fn render_json(snapshot: &TimelineSnapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(snapshot)
}

/// Plain-text table of the selected scans followed by dataset statistics.
pub fn render_text(snapshot: &TimelineSnapshot, tz: &TimezoneHandler) -> String {
    let mut out = String::new();
    let stats = &snapshot.statistics;

    out.push_str(&format!(
        "Scan timeline: {}\n",
        snapshot.source.as_deref().unwrap_or("<input>")
    ));
    out.push_str(&format!(
        "Showing {} of {} completed scans (top-n: {}, path prefix: {:?})\n\n",
        snapshot.scans.len(),
        stats.count,
        snapshot.view.top_n,
        snapshot.view.path_prefix
    ));

    if snapshot.scans.is_empty() {
        out.push_str("No completed scans match the current view.\n");
    } else {
        render_rows(&mut out, &snapshot.scans, tz);
    }

    out.push_str("\nStatistics (all completed scans)\n");
    out.push_str(&format!("  Completed scans:    {}\n", stats.count));
    out.push_str(&format!(
        "  Average duration:   {}\n",
        format_duration(stats.average_duration_ms)
    ));
    out.push_str(&format!(
        "  Longest scan:       {}\n",
        format_duration(stats.longest_duration_ms)
    ));
    out.push_str(&format!(
        "  Shortest scan:      {}\n",
        format_duration(stats.shortest_duration_ms)
    ));
    if let (Some(start), Some(end)) = (stats.time_range_start, stats.time_range_end) {
        out.push_str(&format!(
            "  Time range:         {} -> {}\n",
            tz.format_instant(start),
            tz.format_instant(end)
        ));
    }

    let throughput = &snapshot.throughput;
    out.push_str("\nThroughput\n");
    out.push_str(&format!(
        "  Total requests:     {}\n",
        format_number(throughput.total_requests as f64, 0)
    ));
    out.push_str(&format!(
        "  Time span:          {:.2}s\n",
        throughput.time_span_seconds
    ));
    out.push_str(&format!(
        "  Mean requests/sec:  {:.3}\n",
        throughput.mean_requests_per_sec
    ));

    let report = &snapshot.report;
    out.push_str(&format!(
        "\nEvents: {} processed, {} unique scans, {} incomplete, {} ignored, {} invalid timestamps\n",
        report.events_processed,
        report.unique_scans,
        report.incomplete_scans,
        report.ignored_events,
        report.invalid_timestamps
    ));
    if report.negative_durations > 0 {
        out.push_str(&format!(
            "Warning: {} scans end before they start\n",
            report.negative_durations
        ));
    }

    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn render_rows(out: &mut String, scans: &[CompletedScan], tz: &TimezoneHandler) {
    let targets: Vec<String> = scans
        .iter()
        .map(|s| shorten(&s.target, MAX_TARGET_WIDTH))
        .collect();
    let durations: Vec<String> = scans
        .iter()
        .map(|s| format_duration(s.duration as f64))
        .collect();

    let rank_w = scans.len().to_string().len().max(1);
    let name_w = column_width("Template", scans.iter().map(|s| s.display_name.as_str()));
    let target_w = column_width("Target", targets.iter().map(String::as_str));
    let dur_w = column_width("Duration", durations.iter().map(String::as_str));

    out.push_str(&format!(
        "{}  {}  {}  {}  Start\n",
        pad("#", rank_w),
        pad("Template", name_w),
        pad("Target", target_w),
        pad("Duration", dur_w)
    ));

    for (i, scan) in scans.iter().enumerate() {
        out.push_str(&format!(
            "{}  {}  {}  {}  {}\n",
            pad(&(i + 1).to_string(), rank_w),
            pad(&scan.display_name, name_w),
            pad(&targets[i], target_w),
            pad(&durations[i], dur_w),
            tz.format_instant(scan.start_time)
        ));
    }
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0)
        .max(header.width())
}

/// Right-pad `s` with spaces to `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}

/// Cut `s` to at most `max` display columns, ending in `"..."` when cut.
fn shorten(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut result = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max.saturating_sub(3) {
            break;
        }
        result.push(c);
        used += w;
    }
    result.push_str("...");
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use timeline_core::models::{TopN, ViewConfig};
    use timeline_runtime::session::ScanSession;

    const EVENTS: &str = r#"{"template_id":"cve-2024-0001-very-long-template-name","target":"https://a.example","event_type":"scan_start","time":"2025-01-01T00:00:00Z","template_path":"http/cves/a.yaml","max_requests":10}
{"template_id":"cve-2024-0001-very-long-template-name","target":"https://a.example","event_type":"scan_end","time":"2025-01-01T00:02:05.300Z"}
{"template_id":"dns-probe","target":"a.example","event_type":"scan_start","time":"2025-01-01T00:00:01Z","template_path":"dns/probe.yaml","max_requests":1}
{"template_id":"dns-probe","target":"a.example","event_type":"scan_end","time":"2025-01-01T00:00:01.500Z"}
"#;

    fn snapshot(view: ViewConfig) -> TimelineSnapshot {
        let mut session = ScanSession::new(view);
        session.ingest_str("events.jsonl", EVENTS).unwrap();
        session.snapshot().unwrap()
    }

    #[test]
    fn test_render_text_contains_rows_and_statistics() {
        let text = render_text(&snapshot(ViewConfig::default()), &TimezoneHandler::new("UTC"));

        assert!(text.contains("Scan timeline: events.jsonl"));
        assert!(text.contains("Showing 2 of 2 completed scans"));
        assert!(text.contains("cve-2024-0001-very-long-tem..."));
        assert!(text.contains("2m 5.3s"));
        assert!(text.contains("500ms"));
        assert!(text.contains("Completed scans:    2"));
        assert!(text.contains("2025-01-01 00:00:00.000 UTC -> 2025-01-01 00:02:05.300 UTC"));
        assert!(text.contains("Total requests:     11"));
    }

    #[test]
    fn test_render_text_rows_sorted_longest_first() {
        let text = render_text(&snapshot(ViewConfig::default()), &TimezoneHandler::new("UTC"));
        let long = text.find("cve-2024-0001").unwrap();
        let short = text.find("dns-probe").unwrap();
        assert!(long < short);
    }

    #[test]
    fn test_render_text_filtered_view_keeps_full_statistics() {
        let view = ViewConfig::new(TopN::All, "dns/");
        let text = render_text(&snapshot(view), &TimezoneHandler::new("UTC"));
        assert!(text.contains("Showing 1 of 2 completed scans"));
        assert!(!text.contains("cve-2024-0001"));
        assert!(text.contains("Longest scan:       2m 5.3s"));
    }

    #[test]
    fn test_render_text_empty_view() {
        let view = ViewConfig::new(TopN::All, "nothing/");
        let text = render_text(&snapshot(view), &TimezoneHandler::new("UTC"));
        assert!(text.contains("No completed scans match the current view."));
    }

    #[test]
    fn test_render_json_shape() {
        let json = render_json(&snapshot(ViewConfig::new("1".parse().unwrap(), ""))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["file"].as_str().unwrap().ends_with("events.jsonl"));
        assert_eq!(value["view"]["top_n"], "1");
        assert_eq!(value["scans"].as_array().unwrap().len(), 1);
        assert_eq!(value["scans"][0]["duration"], 125_300);
        assert_eq!(value["statistics"]["count"], 2);
        assert_eq!(value["throughput"]["total_requests"], 11);
    }

    #[test]
    fn test_shorten_and_pad() {
        assert_eq!(shorten("short", 10), "short");
        assert_eq!(shorten("abcdefghijkl", 8), "abcde...");
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("abcdef", 4), "abcdef");
    }
}
