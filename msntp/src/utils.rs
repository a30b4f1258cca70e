//! Helpers to present millisecond UNIX times with `chrono`
//!
//! All functions return `None` when the time lies outside of the range `chrono`
//! can represent.
use chrono::{DateTime, Local, SecondsFormat, Utc};

/// Convert milliseconds since UNIX epoch to a UTC date and time
#[must_use]
pub fn to_utc(time_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(time_ms)
}

/// Convert milliseconds since UNIX epoch to the local time zone
#[must_use]
pub fn to_local(time_ms: i64) -> Option<DateTime<Local>> {
    to_utc(time_ms).map(|time| time.with_timezone(&Local))
}

/// Format milliseconds since UNIX epoch as RFC 3339 in UTC, e.g.
/// `2023-11-14T22:13:20.123Z`
#[must_use]
pub fn format_rfc3339(time_ms: i64) -> Option<String> {
    to_utc(time_ms).map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
}
