//! Router front end.
//!
//! Reads an arrival trace (stdin by default), runs it through the selected queueing discipline
//! and prints the event log on stdout. Diagnostics go to stderr.
//!
//! # Example
//!
//! ```bash
//! feeder --rate 10 --burst 4 --flows 3 --seed 1 | router --policy rr --output-rate 20
//! router --policy wfq --weights 3,2,1 --input trace.txt --format json
//! ```

use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use routersim::{
    driver,
    input::{self, Mode},
    units::PacketsPerSec,
    Config, Policy, Weights,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Simplified network-layer router simulation.
#[derive(Parser, Debug)]
#[command(name = "router")]
#[command(version, about, long_about = None)]
struct Args {
    /// Queueing discipline: fcfs, priority, rr or wfq
    #[arg(long, default_value = "fcfs")]
    policy: Policy,

    /// Transmission rate in packets per second
    #[arg(long, default_value = "10")]
    output_rate: f64,

    /// Comma-separated WFQ weights for flows 1, 2, ...
    #[arg(long)]
    weights: Option<Weights>,

    /// JSON run configuration. Overrides --policy, --output-rate and --weights.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read the trace from a file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Abort on the first malformed input line instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Event log format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,routersim=info")),
        )
        .init();

    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => driver::read_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::builder()
            .policy(args.policy)
            .output_rate(PacketsPerSec::new(args.output_rate))
            .weights(args.weights.clone().unwrap_or_default())
            .build(),
    };
    cfg.validate()?;

    let mode = if args.strict { Mode::Strict } else { Mode::Lenient };
    let trace = match &args.input {
        Some(path) => driver::read_packets(path, mode)
            .with_context(|| format!("failed to read trace {}", path.display()))?,
        None => input::parse_trace(io::stdin().lock(), mode)?,
    };
    info!(policy = %cfg.policy, packets = trace.packets.len(), "trace loaded");

    let report = driver::run(&cfg, trace.packets)?;

    let mut out = BufWriter::new(io::stdout().lock());
    for ev in &report.events {
        match args.format {
            Format::Text => writeln!(out, "{ev}")?,
            Format::Json => writeln!(out, "{}", serde_json::to_string(ev)?)?,
        }
    }
    match args.format {
        Format::Text => writeln!(out, "[INFO] Simulation complete.")?,
        Format::Json => writeln!(
            out,
            "{}",
            serde_json::to_string(&report.summary.completion())?
        )?,
    }
    out.flush()?;

    for (flow, stats) in &report.summary.flows {
        info!(
            %flow,
            sent = stats.sent,
            bytes = %stats.bytes,
            mean_delay_ms = %stats.mean_delay().unwrap_or_default(),
            "flow summary"
        );
    }
    if !trace.rejected.is_empty() {
        info!(rejected = trace.rejected.len(), "malformed lines were skipped");
    }
    Ok(())
}
