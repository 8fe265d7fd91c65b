use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses the `time` field of scan events.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Parse an ISO 8601 / RFC 3339 timestamp into a UTC [`DateTime`].
    ///
    /// Accepts a `Z` suffix or any fixed offset. Timestamps without an
    /// offset are interpreted as UTC. Returns `None` for empty or
    /// unrecognised strings.
    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        const FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

        for fmt in FORMATS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        debug!("TimestampProcessor: could not parse timestamp \"{}\"", s);
        None
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
