mod input;
mod output;
mod telemetry;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracefall_core::config::Config;
use tracefall_core::layout::{LayoutEntry, compute_layout};
use tracefall_core::time::parse_duration_str;
use tracefall_core::tree::{SpanNode, build_ordered_spans};

use crate::output::{
    print_json, print_span_human, print_traces_human, print_tree_human, print_waterfall_human,
    render_response,
};

#[derive(Parser, Debug)]
#[command(name = "tracefall")]
#[command(about = "Render distributed-trace waterfalls in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "List traces found in a span export")]
    Traces {
        #[arg(help = "Span export file, or - for stdin")]
        file: PathBuf,
    },
    #[command(about = "Render one trace as a waterfall")]
    Render {
        #[arg(help = "Span export file, or - for stdin")]
        file: PathBuf,
        #[arg(long)]
        trace: Option<String>,
        #[arg(long, help = "Hide spans shorter than this (e.g. 5ms)")]
        min_duration: Option<String>,
        #[arg(long, help = "Waterfall track width in columns")]
        width: Option<usize>,
    },
    #[command(about = "Print one trace as an indented call tree")]
    Tree {
        #[arg(help = "Span export file, or - for stdin")]
        file: PathBuf,
        #[arg(long)]
        trace: Option<String>,
    },
    #[command(about = "Inspect a specific span")]
    Span {
        #[arg(help = "Span export file, or - for stdin")]
        file: PathBuf,
        span_id: String,
        #[arg(long)]
        trace: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    telemetry::init_cli_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Traces { file } => {
            let spans = input::load_spans(&file)?;
            let summaries = input::summarize_traces(&spans);
            if cli.json {
                print_json(&summaries)
            } else {
                print_traces_human(&summaries);
                Ok(())
            }
        }
        Commands::Render {
            file,
            trace,
            min_duration,
            width,
        } => {
            let mut cfg = Config::load().context("load render configuration")?;
            if let Some(width) = width {
                if width < 10 {
                    bail!("--width must be at least 10 columns");
                }
                cfg.track_width = width;
            }
            let min_duration_ns = min_duration
                .as_deref()
                .map(parse_duration_str)
                .transpose()?
                .map(|d| d.as_nanos().min(u64::MAX as u128) as u64);

            let spans = input::load_spans(&file)?;
            let (trace_id, spans) = input::select_trace(spans, trace.as_deref())?;
            let ordered = build_ordered_spans(&spans);
            let layout = compute_layout(&ordered);
            let (ordered, layout) = hide_short_spans(ordered, layout, min_duration_ns);

            if cli.json {
                print_json(&render_response(&trace_id, &ordered, &layout))
            } else {
                print_waterfall_human(&trace_id, &ordered, &layout, &cfg);
                Ok(())
            }
        }
        Commands::Tree { file, trace } => {
            let cfg = Config::load().context("load render configuration")?;
            let spans = input::load_spans(&file)?;
            let (trace_id, spans) = input::select_trace(spans, trace.as_deref())?;
            let ordered = build_ordered_spans(&spans);
            if cli.json {
                let layout = compute_layout(&ordered);
                print_json(&render_response(&trace_id, &ordered, &layout))
            } else {
                print_tree_human(&trace_id, &ordered, &cfg);
                Ok(())
            }
        }
        Commands::Span {
            file,
            span_id,
            trace,
        } => {
            let spans = input::load_spans(&file)?;
            let (trace_id, spans) = input::select_trace(spans, trace.as_deref())?;
            let ordered = build_ordered_spans(&spans);
            let layout = compute_layout(&ordered);
            let Some(idx) = ordered.iter().position(|n| n.span.span_id == span_id) else {
                bail!("span {span_id} not found in trace");
            };
            if cli.json {
                let mut response = render_response(&trace_id, &ordered, &layout);
                print_json(&response.spans.swap_remove(idx))
            } else {
                print_span_human(&ordered[idx], &layout[idx]);
                Ok(())
            }
        }
    }
}

// Render-side filter only: geometry is computed over the full trace window
// first, so hiding short spans never reshapes the bars that remain.
fn hide_short_spans(
    ordered: Vec<SpanNode>,
    layout: Vec<LayoutEntry>,
    min_duration_ns: Option<u64>,
) -> (Vec<SpanNode>, Vec<LayoutEntry>) {
    let Some(min) = min_duration_ns else {
        return (ordered, layout);
    };
    ordered
        .into_iter()
        .zip(layout)
        .filter(|(node, _)| node.span.duration_ns >= min)
        .unzip()
}
