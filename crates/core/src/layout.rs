use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tree::SpanNode;

/// Waterfall geometry for one span, parallel to the ordered span list.
/// Percentages are proportional to the trace window, not a stacked partition:
/// siblings may overlap and need not sum to 100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutEntry {
    pub span_id: String,
    pub depth: usize,
    /// Start position within the trace window, clamped to [0, 99] so a bar
    /// anchored at the very end of the window stays on the track.
    pub offset_percent: f64,
    /// Duration as a share of the trace window, clamped to [1, 100] so
    /// zero-duration spans stay visible as a sliver.
    pub width_percent: f64,
}

/// The half-open interval covering every span's start and end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TraceWindow {
    pub fn of(ordered: &[SpanNode]) -> Option<Self> {
        let start = ordered.iter().map(|n| n.span.start_ts).min()?;
        let end = ordered.iter().map(|n| n.span.end_ts()).max()?;
        Some(Self { start, end })
    }

    pub fn duration_ns(&self) -> i64 {
        (self.end - self.start).num_nanoseconds().unwrap_or(i64::MAX)
    }
}

/// Computes per-span offset/width percentages over the trace window.
///
/// A degenerate window (empty input, or every span at one instant) renders
/// full-width rather than dividing by zero.
pub fn compute_layout(ordered: &[SpanNode]) -> Vec<LayoutEntry> {
    let Some(window) = TraceWindow::of(ordered) else {
        return Vec::new();
    };
    let total_ns = window.duration_ns() as f64;

    ordered
        .iter()
        .map(|node| {
            let (offset_percent, width_percent) = if total_ns <= 0.0 {
                (0.0, 100.0)
            } else {
                let offset_ns = (node.span.start_ts - window.start)
                    .num_nanoseconds()
                    .unwrap_or(0) as f64;
                (
                    (offset_ns / total_ns * 100.0).clamp(0.0, 99.0),
                    (node.span.duration_ns as f64 / total_ns * 100.0).clamp(1.0, 100.0),
                )
            };
            LayoutEntry {
                span_id: node.span.span_id.clone(),
                depth: node.depth,
                offset_percent,
                width_percent,
            }
        })
        .collect()
}

/// Renders a nanosecond count in its most readable unit: whole microseconds
/// below 1ms, milliseconds with two decimals below 1s, seconds above.
pub fn format_duration(duration_ns: u64) -> String {
    let ms = duration_ns as f64 / 1_000_000.0;
    if ms < 1.0 {
        format!("{:.0}µs", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{ms:.2}ms")
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::model::span::SpanRecord;
    use crate::tree::build_ordered_spans;

    fn span(id: &str, parent: Option<&str>, offset_ms: i64, duration_ms: u64) -> SpanRecord {
        let base = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        SpanRecord {
            trace_id: "trace".to_string(),
            span_id: id.to_string(),
            parent_span_id: parent.map(|p| p.to_string()),
            name: format!("op.{id}"),
            start_ts: base + Duration::milliseconds(offset_ms),
            duration_ns: duration_ms * 1_000_000,
            status: None,
            attrs_json: "{}".to_string(),
        }
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        assert!(compute_layout(&[]).is_empty());
    }

    #[test]
    fn waterfall_geometry_matches_window() {
        let spans = vec![
            span("root", None, 0, 100),
            span("child1", Some("root"), 10, 50),
            span("child2", Some("root"), 70, 20),
        ];
        let ordered = build_ordered_spans(&spans);
        let layout = compute_layout(&ordered);

        assert_eq!(layout.len(), 3);
        assert_eq!(layout[0].span_id, "root");
        assert!((layout[0].offset_percent - 0.0).abs() < 1e-9);
        assert!((layout[0].width_percent - 100.0).abs() < 1e-9);
        assert_eq!(layout[1].span_id, "child1");
        assert!((layout[1].offset_percent - 10.0).abs() < 1e-9);
        assert!((layout[1].width_percent - 50.0).abs() < 1e-9);
        assert_eq!(layout[2].span_id, "child2");
        assert!((layout[2].offset_percent - 70.0).abs() < 1e-9);
        assert!((layout[2].width_percent - 20.0).abs() < 1e-9);
    }

    #[test]
    fn single_zero_duration_span_renders_full_width() {
        let ordered = build_ordered_spans(&[span("only", None, 0, 0)]);
        let layout = compute_layout(&ordered);
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].offset_percent, 0.0);
        assert_eq!(layout[0].width_percent, 100.0);
    }

    #[test]
    fn zero_duration_child_keeps_minimum_width() {
        let spans = vec![span("root", None, 0, 100), span("blip", Some("root"), 50, 0)];
        let layout = compute_layout(&build_ordered_spans(&spans));
        assert_eq!(layout[1].span_id, "blip");
        assert_eq!(layout[1].width_percent, 1.0);
    }

    #[test]
    fn span_at_window_end_stays_on_track() {
        // A zero-width bar anchored at the very end clamps to 99%.
        let spans = vec![span("root", None, 0, 100), span("tail", Some("root"), 100, 0)];
        let layout = compute_layout(&build_ordered_spans(&spans));
        assert_eq!(layout[1].offset_percent, 99.0);
    }

    #[test]
    fn bounds_hold_for_disjoint_roots() {
        let spans = vec![
            span("a", None, 0, 10),
            span("b", None, 500, 10),
            span("c", None, 990, 10),
        ];
        let layout = compute_layout(&build_ordered_spans(&spans));
        for entry in &layout {
            assert!((0.0..=99.0).contains(&entry.offset_percent));
            assert!((1.0..=100.0).contains(&entry.width_percent));
        }
    }

    #[test]
    fn window_spans_min_start_to_max_end() {
        let spans = vec![span("a", None, 20, 30), span("b", None, 0, 10)];
        let ordered = build_ordered_spans(&spans);
        let window = TraceWindow::of(&ordered).unwrap();
        assert_eq!(window.duration_ns(), 50 * 1_000_000);
    }

    #[test]
    fn formats_duration_tiers() {
        assert_eq!(format_duration(0), "0µs");
        assert_eq!(format_duration(750), "1µs");
        assert_eq!(format_duration(999_499), "999µs");
        assert_eq!(format_duration(1_000_000), "1.00ms");
        assert_eq!(format_duration(42_500_000), "42.50ms");
        assert_eq!(format_duration(999_990_000), "999.99ms");
        assert_eq!(format_duration(1_000_000_000), "1.00s");
        assert_eq!(format_duration(83_250_000_000), "83.25s");
    }
}
