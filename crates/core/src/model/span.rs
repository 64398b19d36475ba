use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One timed operation within a trace, as delivered by the telemetry export.
///
/// `span_id` must be unique within a trace's span set. The engine does not
/// validate this; a duplicate id makes the later span win parent lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpanRecord {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub start_ts: DateTime<Utc>,
    pub duration_ns: u64,
    pub status: Option<String>,
    pub attrs_json: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusClass {
    Ok,
    Error,
    Unset,
}

impl SpanRecord {
    pub fn end_ts(&self) -> DateTime<Utc> {
        self.start_ts + Duration::nanoseconds(self.duration_ns.min(i64::MAX as u64) as i64)
    }

    /// Collapses the raw status code into an outcome tier. Accepts both the
    /// bare (`ERROR`) and OTLP (`STATUS_CODE_ERROR`) spellings.
    pub fn status_class(&self) -> StatusClass {
        let Some(code) = self.status.as_deref() else {
            return StatusClass::Unset;
        };
        match code.to_ascii_uppercase().as_str() {
            "ERROR" | "STATUS_CODE_ERROR" => StatusClass::Error,
            "OK" | "STATUS_CODE_OK" => StatusClass::Ok,
            _ => StatusClass::Unset,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn span_with_status(status: Option<&str>) -> SpanRecord {
        SpanRecord {
            trace_id: "t".to_string(),
            span_id: "s".to_string(),
            parent_span_id: None,
            name: "op".to_string(),
            start_ts: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            duration_ns: 1_500_000,
            status: status.map(|s| s.to_string()),
            attrs_json: "{}".to_string(),
        }
    }

    #[test]
    fn end_ts_adds_duration() {
        let span = span_with_status(None);
        assert_eq!((span.end_ts() - span.start_ts).num_nanoseconds(), Some(1_500_000));
    }

    #[test]
    fn status_tiers() {
        assert_eq!(span_with_status(None).status_class(), StatusClass::Unset);
        assert_eq!(span_with_status(Some("ok")).status_class(), StatusClass::Ok);
        assert_eq!(
            span_with_status(Some("STATUS_CODE_ERROR")).status_class(),
            StatusClass::Error
        );
        assert_eq!(
            span_with_status(Some("UNRECOGNIZED")).status_class(),
            StatusClass::Unset
        );
    }
}
