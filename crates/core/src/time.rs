use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{Result, TracefallError};

pub fn parse_duration_str(input: &str) -> Result<Duration> {
    humantime::parse_duration(input)
        .map_err(|e| TracefallError::Parse(format!("invalid duration {input}: {e}")))
}

/// Accepts the timestamp spellings seen in span exports: RFC3339, the
/// ClickHouse `YYYY-MM-DD HH:MM:SS.fff` form, or unix nanoseconds.
pub fn parse_span_timestamp(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(nanos) = input.parse::<i64>() {
        return Ok(nanos_to_dt(nanos));
    }
    Err(TracefallError::Parse(format!(
        "expected RFC3339 or unix-nanosecond timestamp, got {input}"
    )))
}

pub fn nanos_to_dt(nanos: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos)
}

pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
