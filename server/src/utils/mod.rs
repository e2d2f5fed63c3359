pub mod error;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Hive reports times as UTC without a zone suffix, e.g. `2024-05-01T12:34:56`.
const HIVE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses an upstream timestamp. Returns `None` for anything that is not a
/// Hive timestamp or an RFC 3339 date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    NaiveDateTime::parse_from_str(raw, HIVE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|time| time.with_timezone(&Utc)))
        .ok()
}
