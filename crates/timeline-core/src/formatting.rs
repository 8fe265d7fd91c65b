/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use timeline_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact binary midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        // `frac_str` looks like "0.50"; keep ".50".
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a scan duration given in milliseconds.
///
/// * `< 1000` ms → whole milliseconds, `"500ms"`
/// * `< 60000` ms → seconds with two decimals, `"12.34s"`
/// * otherwise → minutes plus seconds with one decimal, `"2m 5.3s"`
///
/// Negative durations fall into the millisecond branch.
///
/// # Examples
///
/// ```
/// use timeline_core::formatting::format_duration;
///
/// assert_eq!(format_duration(500.0), "500ms");
/// assert_eq!(format_duration(12_340.0), "12.34s");
/// assert_eq!(format_duration(125_300.0), "2m 5.3s");
/// ```
pub fn format_duration(ms: f64) -> String {
    // Branches are chosen on the value rounded to each branch's precision,
    // so nothing renders as "1000ms", "60.00s" or "1m 60.0s".
    let whole_ms = ms.round();
    if whole_ms < 1000.0 {
        return format!("{}ms", whole_ms as i64);
    }

    let centiseconds = (ms / 10.0).round();
    if centiseconds < 6000.0 {
        return format!("{:.2}s", centiseconds / 100.0);
    }

    let deciseconds = (ms / 100.0).round() as i64;
    let minutes = deciseconds / 600;
    let seconds = (deciseconds % 600) as f64 / 10.0;
    format!("{}m {:.1}s", minutes, seconds)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    // ── format_duration ──────────────────────────────────────────────────────

    #[test]
    fn test_format_duration_milliseconds() {
        assert_eq!(format_duration(0.0), "0ms");
        assert_eq!(format_duration(500.0), "500ms");
        assert_eq!(format_duration(999.0), "999ms");
    }

    #[test]
    fn test_format_duration_fractional_milliseconds_round() {
        assert_eq!(format_duration(12.6), "13ms");
    }

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration(1000.0), "1.00s");
        assert_eq!(format_duration(2500.0), "2.50s");
        assert_eq!(format_duration(12_340.0), "12.34s");
    }

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(60_000.0), "1m 0.0s");
        assert_eq!(format_duration(125_300.0), "2m 5.3s");
        assert_eq!(format_duration(3_600_000.0), "60m 0.0s");
    }

    #[test]
    fn test_format_duration_rounds_into_next_unit() {
        assert_eq!(format_duration(999.4), "999ms");
        assert_eq!(format_duration(999.6), "1.00s");
        assert_eq!(format_duration(59_994.0), "59.99s");
        assert_eq!(format_duration(59_999.0), "1m 0.0s");
        assert_eq!(format_duration(119_990.0), "2m 0.0s");
        assert_eq!(format_duration(119_940.0), "1m 59.9s");
    }

    #[test]
    fn test_format_duration_negative() {
        assert_eq!(format_duration(-1500.0), "-1500ms");
    }
}
