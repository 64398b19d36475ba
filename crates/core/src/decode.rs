use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, TracefallError};
use crate::model::span::SpanRecord;
use crate::time::{nanos_to_dt, parse_span_timestamp};

/// One span as it appears in a telemetry export: camelCase keys, timestamp
/// as a string or unix nanoseconds, attributes as an opaque object.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSpan {
    #[serde(default)]
    trace_id: Option<String>,
    span_id: String,
    #[serde(default)]
    parent_span_id: Option<String>,
    span_name: String,
    timestamp: Value,
    duration_ns: Value,
    #[serde(default)]
    status_code: Option<String>,
    #[serde(default)]
    span_attributes: serde_json::Map<String, Value>,
}

/// Decodes a span export: either a bare JSON array of spans or an object
/// with a `spans` array.
///
/// Decoding is best-effort the way the rest of the pipeline is: a record
/// that cannot be made sense of is skipped with a warning rather than
/// failing the whole export. Only unusable top-level JSON is an error.
pub fn decode_spans(raw: &str) -> Result<Vec<SpanRecord>> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|e| TracefallError::Parse(format!("invalid span export: {e}")))?;

    let items = match root {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("spans") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(TracefallError::Parse(
                    "span export object has no spans array".to_string(),
                ));
            }
        },
        _ => {
            return Err(TracefallError::Parse(
                "span export must be a JSON array or object".to_string(),
            ));
        }
    };

    let mut spans = Vec::with_capacity(items.len());
    for item in items {
        match decode_one(item) {
            Ok(span) => spans.push(span),
            Err(err) => tracing::warn!(%err, "skipping undecodable span record"),
        }
    }
    Ok(spans)
}

fn decode_one(item: Value) -> Result<SpanRecord> {
    let wire: WireSpan = serde_json::from_value(item)
        .map_err(|e| TracefallError::Parse(format!("bad span record: {e}")))?;

    let start_ts = match &wire.timestamp {
        Value::String(s) => parse_span_timestamp(s)?,
        Value::Number(n) => {
            let nanos = n.as_i64().ok_or_else(|| {
                TracefallError::Parse(format!("timestamp out of range: {n}"))
            })?;
            nanos_to_dt(nanos)
        }
        other => {
            return Err(TracefallError::Parse(format!(
                "timestamp must be a string or number, got {other}"
            )));
        }
    };

    let duration_ns = match &wire.duration_ns {
        Value::Number(n) => n.as_u64().ok_or_else(|| {
            TracefallError::Parse(format!("durationNs must be non-negative: {n}"))
        })?,
        Value::String(s) => s.parse::<u64>().map_err(|e| {
            TracefallError::Parse(format!("durationNs must be non-negative: {e}"))
        })?,
        other => {
            return Err(TracefallError::Parse(format!(
                "durationNs must be a number, got {other}"
            )));
        }
    };

    Ok(SpanRecord {
        trace_id: wire.trace_id.unwrap_or_default(),
        span_id: wire.span_id,
        // ClickHouse-style exports use an empty string for "no parent".
        parent_span_id: wire.parent_span_id.filter(|p| !p.is_empty()),
        name: wire.span_name,
        start_ts,
        duration_ns,
        status: wire.status_code.filter(|s| !s.is_empty()),
        attrs_json: Value::Object(wire.span_attributes).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_array_export() {
        let raw = r#"[
            {
                "traceId": "t1",
                "spanId": "root",
                "spanName": "GET /v1/sandboxes",
                "timestamp": "2026-02-01T00:00:00Z",
                "durationNs": 100000000,
                "statusCode": "OK",
                "spanAttributes": {"http.method": "GET"}
            },
            {
                "traceId": "t1",
                "spanId": "child",
                "parentSpanId": "root",
                "spanName": "db.query",
                "timestamp": "2026-02-01T00:00:00.010Z",
                "durationNs": 50000000
            }
        ]"#;
        let spans = decode_spans(raw).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].span_id, "root");
        assert_eq!(spans[0].parent_span_id, None);
        assert_eq!(spans[0].status.as_deref(), Some("OK"));
        assert!(spans[0].attrs_json.contains("http.method"));
        assert_eq!(spans[1].parent_span_id.as_deref(), Some("root"));
        assert_eq!(spans[1].duration_ns, 50_000_000);
    }

    #[test]
    fn decodes_wrapped_export_and_numeric_timestamps() {
        let raw = r#"{"spans": [
            {"spanId": "a", "spanName": "op", "timestamp": 1700000000000000000, "durationNs": "250"}
        ]}"#;
        let spans = decode_spans(raw).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].duration_ns, 250);
    }

    #[test]
    fn empty_parent_means_root() {
        let raw = r#"[{"spanId": "a", "parentSpanId": "", "spanName": "op",
                       "timestamp": "2026-02-01T00:00:00Z", "durationNs": 1}]"#;
        let spans = decode_spans(raw).unwrap();
        assert_eq!(spans[0].parent_span_id, None);
    }

    #[test]
    fn skips_undecodable_records() {
        let raw = r#"[
            {"spanId": "good", "spanName": "op", "timestamp": "2026-02-01T00:00:00Z", "durationNs": 1},
            {"spanName": "missing id"},
            {"spanId": "bad-ts", "spanName": "op", "timestamp": "yesterday", "durationNs": 1}
        ]"#;
        let spans = decode_spans(raw).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].span_id, "good");
    }

    #[test]
    fn rejects_unusable_export() {
        assert!(decode_spans("not json").is_err());
        assert!(decode_spans("42").is_err());
        assert!(decode_spans(r#"{"records": []}"#).is_err());
    }
}
