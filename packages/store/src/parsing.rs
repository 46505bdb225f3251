//! Date and coordinate parsing for the vacancy CSV.
//!
//! Exports of the dataset have shipped `issued_date` in several shapes
//! (Socrata ISO timestamps, plain dates, US-style dates), so each format is
//! tried in turn.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Datetime formats tried after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

/// Date-only formats.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Parses an `issued_date` value into a calendar date.
///
/// Time-of-day and offsets are discarded. Returns `None` if no known format
/// matches.
#[must_use]
pub fn parse_issued_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Parses an optional coordinate field. Returns `None` if missing, blank,
/// unparseable or not finite.
#[must_use]
pub fn parse_coordinate(s: Option<&str>) -> Option<f64> {
    let value = s?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}
