//! Shift-time normalization and ordering.
//!
//! Attendance exports encode the start time three different ways depending
//! on which tool produced the sheet: a preformatted `HH:MM` string, a
//! spreadsheet serial fraction of a day, or a full timestamp. Everything
//! is reduced to a canonical `HH:MM` string once, at the boundary, and the
//! rest of the app only ever sees the canonical form.
//!
//! Ordering follows the business day, not the clock: the operation runs
//! into the small hours, so 00:00–09:59 belong to the *previous* night and
//! must sort after 10:00–23:59.

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde_json::Value;

/// First hour of a new business day. Anything earlier is late-night
/// carry-over from the previous day's roster.
const DAY_ROLLOVER_HOUR: u32 = 10;

/// Normalize a raw time cell to canonical `HH:MM`.
///
/// Resolution order: already-canonical strings pass through unchanged,
/// timestamp strings are reduced to their local wall-clock `HH:MM`, serial
/// fractions are converted, and anything else is coerced to its string
/// form (empty for null).
pub fn normalize(raw: &Value) -> String {
    match raw {
        Value::Null => String::new(),
        Value::String(s) => normalize_str(s),
        Value::Number(n) => n.as_f64().map(normalize_serial).unwrap_or_default(),
        other => other.to_string(),
    }
}

/// String flavor of [`normalize`].
pub fn normalize_str(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if is_canonical(raw) {
        return raw.to_string();
    }
    if raw.contains('T') {
        // Offset-carrying timestamps are converted to local wall-clock
        // time; bare ones are taken as local already.
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            let local = dt.with_timezone(&Local);
            return format!("{:02}:{:02}", local.hour(), local.minute());
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return format!("{:02}:{:02}", dt.hour(), dt.minute());
            }
        }
    }
    raw.to_string()
}

/// Convert a spreadsheet serial time (fraction of a day) to `HH:MM`.
///
/// Rounded to the nearest minute and wrapped modulo 24h, so both bare time
/// fractions (`0.5`) and full date-time serials (`45123.5`) reduce to the
/// same wall-clock minute.
pub fn normalize_serial(fraction: f64) -> String {
    let total = ((fraction * 1440.0).round() as i64).rem_euclid(1440);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Business-day minute offset for a canonical time string.
///
/// Hours below [`DAY_ROLLOVER_HOUR`] get +24h before comparison, which
/// puts a 01:00 start after a 23:30 start on the same logical day.
/// Unparseable input keys to 0 so sorting stays total and deterministic.
pub fn ordering_key(time: &str) -> u32 {
    let Some((h, m)) = time.split_once(':') else {
        return 0;
    };
    let (Ok(hours), Ok(minutes)) = (h.trim().parse::<u32>(), m.trim().parse::<u32>()) else {
        return 0;
    };
    let hours = if hours < DAY_ROLLOVER_HOUR {
        hours + 24
    } else {
        hours
    };
    hours * 60 + minutes
}

fn is_canonical(s: &str) -> bool {
    match s.split_once(':') {
        Some((h, m)) => {
            (1..=2).contains(&h.len())
                && m.len() == 2
                && h.bytes().all(|b| b.is_ascii_digit())
                && m.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_canonical_strings_pass_through_unchanged() {
        assert_eq!(normalize(&json!("19:30")), "19:30");
        // Single-digit hours are not zero-padded on the way through.
        assert_eq!(normalize(&json!("9:05")), "9:05");
    }

    #[test]
    fn test_serial_fractions() {
        assert_eq!(normalize(&json!(0.5)), "12:00");
        assert_eq!(normalize(&json!(0.0)), "00:00");
        assert_eq!(normalize_serial(0.8125), "19:30");
        // A fraction that rounds up to minute 1440 wraps to midnight.
        assert_eq!(normalize_serial(0.9999999), "00:00");
        // Full date-time serials reduce to the time component.
        assert_eq!(normalize_serial(45123.5), "12:00");
    }

    #[test]
    fn test_bare_timestamp_reduces_to_wall_clock() {
        assert_eq!(normalize(&json!("2026-08-07T13:30:00")), "13:30");
        assert_eq!(normalize(&json!("2026-08-07T01:05")), "01:05");
    }

    #[test]
    fn test_offset_timestamp_yields_canonical_shape() {
        // The exact value depends on the host timezone; the shape must
        // still be canonical HH:MM.
        let out = normalize(&json!("2026-08-07T13:30:00+09:00"));
        assert!(is_canonical(&out), "got {out:?}");
    }

    #[test]
    fn test_fallback_coercion() {
        assert_eq!(normalize(&json!(null)), "");
        assert_eq!(normalize(&json!("open")), "open");
        assert_eq!(normalize_str(""), "");
    }

    #[test]
    fn test_ordering_key_rolls_early_hours_over() {
        assert!(ordering_key("09:59") > ordering_key("23:59"));
        assert!(ordering_key("10:00") < ordering_key("23:59"));
        assert!(ordering_key("01:00") > ordering_key("23:30"));
        assert_eq!(ordering_key("12:00"), 720);
        assert_eq!(ordering_key("00:30"), 24 * 60 + 30);
    }

    #[test]
    fn test_ordering_key_is_pure_and_total() {
        assert_eq!(ordering_key("9:59"), ordering_key("9:59"));
        assert_eq!(ordering_key(""), 0);
        assert_eq!(ordering_key("open"), 0);
    }
}
