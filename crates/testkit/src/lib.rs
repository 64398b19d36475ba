use chrono::{Duration, TimeZone, Utc};
use tracefall_core::model::span::SpanRecord;

pub fn span(
    trace_id: &str,
    span_id: &str,
    parent: Option<&str>,
    name: &str,
    offset_ms: i64,
    duration_ms: u64,
    status: Option<&str>,
) -> SpanRecord {
    let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    SpanRecord {
        trace_id: trace_id.to_string(),
        span_id: span_id.to_string(),
        parent_span_id: parent.map(|p| p.to_string()),
        name: name.to_string(),
        start_ts: base + Duration::milliseconds(offset_ms),
        duration_ns: duration_ms * 1_000_000,
        status: status.map(|s| s.to_string()),
        attrs_json: "{}".to_string(),
    }
}

/// Root plus two sequential children, the canonical waterfall shape.
pub fn sample_trace(trace_id: &str) -> Vec<SpanRecord> {
    vec![
        span(trace_id, "root", None, "GET /v1/sandboxes", 0, 100, Some("OK")),
        span(trace_id, "child1", Some("root"), "db.query", 10, 50, Some("OK")),
        span(
            trace_id,
            "child2",
            Some("root"),
            "cache.get redis",
            70,
            20,
            Some("ERROR"),
        ),
    ]
}

/// A trace whose only span points at a parent that was never collected.
pub fn orphan_trace(trace_id: &str) -> Vec<SpanRecord> {
    vec![span(
        trace_id,
        "stray",
        Some("never-arrived"),
        "orphaned.op",
        0,
        5,
        None,
    )]
}

/// Two spans that name each other as parents.
pub fn cyclic_trace(trace_id: &str) -> Vec<SpanRecord> {
    vec![
        span(trace_id, "a", Some("b"), "op.a", 5, 0, None),
        span(trace_id, "b", Some("a"), "op.b", 0, 10, None),
    ]
}

/// Serializes spans in the camelCase export shape the CLI decodes.
pub fn export_json(spans: &[SpanRecord]) -> String {
    let items: Vec<serde_json::Value> = spans
        .iter()
        .map(|s| {
            serde_json::json!({
                "traceId": s.trace_id,
                "spanId": s.span_id,
                "parentSpanId": s.parent_span_id,
                "spanName": s.name,
                "timestamp": s.start_ts.to_rfc3339(),
                "durationNs": s.duration_ns,
                "statusCode": s.status,
                "spanAttributes": serde_json::from_str::<serde_json::Value>(&s.attrs_json)
                    .unwrap_or_else(|_| serde_json::json!({})),
            })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}
