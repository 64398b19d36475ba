use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, bail};
use serde::Serialize;
use tracefall_core::decode::decode_spans;
use tracefall_core::layout::TraceWindow;
use tracefall_core::model::span::{SpanRecord, StatusClass};
use tracefall_core::tree::build_ordered_spans;

pub fn load_spans(path: &Path) -> anyhow::Result<Vec<SpanRecord>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read span export from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("read span export {}", path.display()))?
    };
    let spans = decode_spans(&raw)?;
    tracing::debug!(spans = spans.len(), "decoded span export");
    Ok(spans)
}

/// Narrows an export to one trace's spans. With no explicit id the export
/// must contain exactly one trace; an id that matches nothing selects an
/// empty span set (the renderer reports it, not us).
pub fn select_trace(
    spans: Vec<SpanRecord>,
    wanted: Option<&str>,
) -> anyhow::Result<(String, Vec<SpanRecord>)> {
    match wanted {
        Some(id) => {
            let picked: Vec<SpanRecord> =
                spans.into_iter().filter(|s| s.trace_id == id).collect();
            Ok((id.to_string(), picked))
        }
        None => {
            let ids = distinct_trace_ids(&spans);
            if ids.len() > 1 {
                bail!(
                    "export contains {} traces, pick one with --trace: {}",
                    ids.len(),
                    ids.join(", ")
                );
            }
            let id = ids.into_iter().next().unwrap_or_default();
            Ok((id, spans))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceSummary {
    pub trace_id: String,
    pub span_count: usize,
    pub duration_ns: i64,
    pub root_name: String,
    pub error_count: usize,
}

pub fn summarize_traces(spans: &[SpanRecord]) -> Vec<TraceSummary> {
    distinct_trace_ids(spans)
        .into_iter()
        .map(|id| {
            let group: Vec<SpanRecord> = spans
                .iter()
                .filter(|s| s.trace_id == id)
                .cloned()
                .collect();
            let ordered = build_ordered_spans(&group);
            let duration_ns = TraceWindow::of(&ordered).map(|w| w.duration_ns()).unwrap_or(0);
            TraceSummary {
                trace_id: id,
                span_count: group.len(),
                duration_ns,
                root_name: ordered
                    .first()
                    .map(|n| n.span.name.clone())
                    .unwrap_or_default(),
                error_count: group
                    .iter()
                    .filter(|s| s.status_class() == StatusClass::Error)
                    .count(),
            }
        })
        .collect()
}

// First-seen order keeps listings stable across runs.
fn distinct_trace_ids(spans: &[SpanRecord]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for span in spans {
        if !ids.iter().any(|id| id == &span.trace_id) {
            ids.push(span.trace_id.clone());
        }
    }
    ids
}
