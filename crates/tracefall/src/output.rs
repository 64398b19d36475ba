use std::io::IsTerminal;

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracefall_core::config::{ColorMode, Config};
use tracefall_core::layout::{LayoutEntry, TraceWindow, format_duration};
use tracefall_core::model::span::StatusClass;
use tracefall_core::time::format_ts;
use tracefall_core::tree::SpanNode;

use crate::input::TraceSummary;

/// One ordered span zipped with its waterfall geometry; the JSON shape of
/// `render` output.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedSpan {
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub depth: usize,
    pub start_ts: DateTime<Utc>,
    pub duration_ns: u64,
    pub status: Option<String>,
    pub offset_percent: f64,
    pub width_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub trace_id: String,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub duration_ns: i64,
    pub spans: Vec<RenderedSpan>,
}

pub fn render_response(
    trace_id: &str,
    ordered: &[SpanNode],
    layout: &[LayoutEntry],
) -> RenderResponse {
    let window = TraceWindow::of(ordered);
    RenderResponse {
        trace_id: trace_id.to_string(),
        window_start: window.map(|w| w.start),
        window_end: window.map(|w| w.end),
        duration_ns: window.map(|w| w.duration_ns()).unwrap_or(0),
        spans: ordered
            .iter()
            .zip(layout)
            .map(|(node, entry)| RenderedSpan {
                span_id: node.span.span_id.clone(),
                parent_span_id: node.span.parent_span_id.clone(),
                name: node.span.name.clone(),
                depth: node.depth,
                start_ts: node.span.start_ts,
                duration_ns: node.span.duration_ns,
                status: node.span.status.clone(),
                offset_percent: entry.offset_percent,
                width_percent: entry.width_percent,
            })
            .collect(),
    }
}

pub fn print_waterfall_human(
    trace_id: &str,
    ordered: &[SpanNode],
    layout: &[LayoutEntry],
    cfg: &Config,
) {
    if ordered.is_empty() {
        println!("No spans found for this trace.");
        return;
    }

    print_trace_header(trace_id, ordered);
    let color = use_color(cfg);
    for (node, entry) in ordered.iter().zip(layout) {
        let name = name_cell(node, cfg);
        let bar = paint(track(entry, cfg.track_width), node.span.status_class(), color);
        let dur = format_duration(node.span.duration_ns);
        println!("{name} |{bar}| {dur:>9}");
    }
}

pub fn print_tree_human(trace_id: &str, ordered: &[SpanNode], cfg: &Config) {
    if ordered.is_empty() {
        println!("No spans found for this trace.");
        return;
    }

    print_trace_header(trace_id, ordered);
    for node in ordered {
        let indent = " ".repeat(node.depth * cfg.indent);
        println!(
            "{}{} ({}) {}",
            indent,
            node.span.name,
            format_duration(node.span.duration_ns),
            node.span.status.as_deref().unwrap_or("-")
        );
    }
}

pub fn print_span_human(node: &SpanNode, entry: &LayoutEntry) {
    println!(
        "SPAN {} name={} status={} duration={}",
        node.span.span_id,
        node.span.name,
        node.span.status.as_deref().unwrap_or("-"),
        format_duration(node.span.duration_ns)
    );
    println!(
        "parent={} depth={}",
        node.span.parent_span_id.as_deref().unwrap_or("-"),
        node.depth
    );
    println!(
        "start={} offset={:.1}% width={:.1}%",
        format_ts(node.span.start_ts),
        entry.offset_percent,
        entry.width_percent
    );
    let attrs = serde_json::from_str::<serde_json::Value>(&node.span.attrs_json)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or_else(|_| node.span.attrs_json.clone());
    println!("attrs={attrs}");
}

pub fn print_traces_human(summaries: &[TraceSummary]) {
    for item in summaries {
        println!(
            "trace={} duration={} spans={} errors={} root=\"{}\"",
            item.trace_id,
            format_duration(item.duration_ns.max(0) as u64),
            item.span_count,
            item.error_count,
            item.root_name
        );
    }
    println!("-- {} traces --", summaries.len());
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_trace_header(trace_id: &str, ordered: &[SpanNode]) {
    let duration_ns = TraceWindow::of(ordered)
        .map(|w| w.duration_ns())
        .unwrap_or(0);
    let errors = ordered
        .iter()
        .filter(|n| n.span.status_class() == StatusClass::Error)
        .count();
    println!(
        "TRACE {} duration={} spans={} errors={}",
        trace_id,
        format_duration(duration_ns.max(0) as u64),
        ordered.len(),
        errors
    );
}

fn name_cell(node: &SpanNode, cfg: &Config) -> String {
    let indent = node.depth * cfg.indent;
    let mut cell = format!("{:indent$}{}", "", node.span.name);
    let len = cell.chars().count();
    if len > cfg.name_width {
        cell = cell.chars().take(cfg.name_width.saturating_sub(1)).collect();
        cell.push('…');
    } else {
        cell.extend(std::iter::repeat(' ').take(cfg.name_width - len));
    }
    cell
}

// Maps window percentages onto a character track. The layout already clamps
// offsets below 100 and widths to at least 1%, so every bar lands on the
// track with at least one cell.
fn track(entry: &LayoutEntry, width: usize) -> String {
    let start = ((entry.offset_percent / 100.0) * width as f64).floor() as usize;
    let start = start.min(width.saturating_sub(1));
    let len = ((entry.width_percent / 100.0) * width as f64).round() as usize;
    let len = len.clamp(1, width - start);
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat(' ').take(start));
    bar.extend(std::iter::repeat('▇').take(len));
    bar.extend(std::iter::repeat(' ').take(width - start - len));
    bar
}

fn use_color(cfg: &Config) -> bool {
    match cfg.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

fn paint(bar: String, class: StatusClass, color: bool) -> String {
    if !color {
        return bar;
    }
    match class {
        StatusClass::Error => bar.red().to_string(),
        StatusClass::Ok => bar.green().to_string(),
        StatusClass::Unset => bar.blue().to_string(),
    }
}
