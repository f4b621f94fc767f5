//! Datagram feeder.
//!
//! Prints a synthetic arrival trace in the router's input format, followed by `# END`.
//! Timestamps are logical; the trace is produced immediately rather than paced in real time.
//!
//! # Example
//!
//! ```bash
//! feeder --rate 10 --burst 4 --flows 3 --duration 5 --priorities random --seed 42
//! ```

use std::{
    io::{self, BufWriter, Write},
    num::NonZeroU64,
};

use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use routersim::{
    feeder::{self, FeederConfig, PriorityScheme},
    units::{PacketsPerSec, Secs},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generates dummy datagram arrivals for the router simulation.
#[derive(Parser, Debug)]
#[command(name = "feeder")]
#[command(version, about, long_about = None)]
struct Args {
    /// Bursts per second
    #[arg(long, default_value = "10")]
    rate: f64,

    /// Datagrams per burst
    #[arg(long, default_value = "1")]
    burst: NonZeroU64,

    /// Number of flows
    #[arg(long, default_value = "1")]
    flows: NonZeroU64,

    /// Duration in seconds
    #[arg(long, default_value = "5")]
    duration: u64,

    /// Priority assignment: random, by-flow or uniform
    #[arg(long, default_value = "random")]
    priorities: PriorityScheme,

    /// Random seed. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,
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
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, "generating trace");

    let cfg = FeederConfig::builder()
        .rate(PacketsPerSec::new(args.rate))
        .burst(args.burst)
        .flows(args.flows)
        .duration(Secs::new(args.duration))
        .priorities(args.priorities)
        .build();
    let pkts = feeder::generate(&cfg, &mut StdRng::seed_from_u64(seed))?;

    let mut out = BufWriter::new(io::stdout().lock());
    for pkt in &pkts {
        writeln!(out, "{pkt}")?;
    }
    writeln!(out, "# END")?;
    out.flush()?;
    Ok(())
}
