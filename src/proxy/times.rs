//! Time Normalizer
//!
//! Reduces the upstream service metadata document to a list of ISO-8601
//! instants, most recent first.
//!
//! Upstream servers report time-steps in several shapes. In order of
//! precedence:
//! 1. `timeInfo.timeValues`: epoch milliseconds, 10-digit epoch seconds as
//!    strings, or date strings
//! 2. `timeInfo.timeExtent`: `[start, end]`, the end instant is used
//! 3. top-level `timeExtent`: same as above
//! 4. nothing usable: the current instant stands in for "live"

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Largest magnitude of epoch milliseconds accepted as an instant
/// (±100,000,000 days around the epoch).
const MAX_EPOCH_MS: f64 = 8.64e15;

/// Naive date-time layouts accepted for string values, read as UTC.
const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only layouts, read as midnight UTC.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%b %d %Y"];

// == Normalize ==
/// Derives the time list from a parsed metadata document.
///
/// Entries that cannot be read as instants are dropped. An extent whose end
/// cannot be read yields an empty list.
pub fn normalize_times(doc: &Value, now: DateTime<Utc>) -> Vec<String> {
    let time_info = doc
        .get("timeInfo")
        .filter(|v| is_truthy(v))
        .or_else(|| doc.get("timeinfo").filter(|v| is_truthy(v)));

    if let Some(values) = time_info
        .and_then(|info| info.get("timeValues"))
        .and_then(Value::as_array)
        .filter(|values| !values.is_empty())
    {
        let mut times: Vec<String> = values
            .iter()
            .filter_map(parse_time_value)
            .map(to_iso)
            .collect();
        times.reverse();
        return times;
    }

    if let Some(end) = time_info
        .and_then(|info| info.get("timeExtent"))
        .and_then(extent_end)
    {
        return js_number(end)
            .and_then(from_epoch_ms)
            .map(|instant| vec![to_iso(instant)])
            .unwrap_or_default();
    }

    if let Some(end) = doc.get("timeExtent").and_then(extent_end) {
        return instant_from_value(end)
            .map(|instant| vec![to_iso(instant)])
            .unwrap_or_default();
    }

    vec![to_iso(now)]
}

/// Formats an instant as `YYYY-MM-DDTHH:MM:SS.sssZ`.
///
/// Years outside 0..=9999 use the expanded form `±YYYYYY`.
pub fn to_iso(instant: DateTime<Utc>) -> String {
    let year = instant.year();
    if (0..=9999).contains(&year) {
        return instant.to_rfc3339_opts(SecondsFormat::Millis, true);
    }
    let sign = if year < 0 { '-' } else { '+' };
    format!(
        "{}{:06}-{}",
        sign,
        year.unsigned_abs(),
        instant.format("%m-%dT%H:%M:%S%.3fZ")
    )
}

/// Second element of a range with at least two elements.
fn extent_end(extent: &Value) -> Option<&Value> {
    extent.as_array().filter(|range| range.len() >= 2).map(|range| &range[1])
}

/// Reads one `timeValues` entry.
///
/// Numbers are epoch milliseconds. Strings of exactly ten ASCII digits are
/// epoch seconds; other strings go through general date parsing.
fn parse_time_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_epoch_ms),
        Value::String(s) if s.len() == 10 && s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse::<i64>()
            .ok()
            .and_then(|secs| from_epoch_ms(secs as f64 * 1000.0)),
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

/// Reads a number or a date string, without the epoch-seconds rule.
///
/// Null and booleans count as epoch milliseconds 0 and 1.
fn instant_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_epoch_ms),
        Value::String(s) => parse_date_str(s),
        Value::Null => from_epoch_ms(0.0),
        Value::Bool(b) => from_epoch_ms(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Numeric coercion for extent bounds: numbers as-is, numeric strings parsed,
/// blank strings and null as zero.
fn js_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn from_epoch_ms(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() || ms.abs() > MAX_EPOCH_MS {
        return None;
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64)
}

fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
