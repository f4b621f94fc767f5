use std::{fmt, fs::File, io::BufReader, path::Path, str::FromStr};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

use crate::{
    data::Report,
    ident::FlowId,
    input::{self, Mode, ParseError, Trace},
    packet::Packet,
    queue::{FifoQ, PrioQ, QDisc, RoundRobinQ, WfqQ},
    simulation::Simulation,
    time::Delta,
    units::{PacketsPerSec, Weight},
};

/// The queueing discipline for a run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// First-come-first-served.
    Fcfs,
    /// Strict priority, lowest value first.
    #[serde(alias = "prio")]
    Priority,
    /// Packet round robin across flows.
    #[serde(alias = "rr")]
    RoundRobin,
    /// Weighted fair queueing.
    Wfq,
}

impl FromStr for Policy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fcfs" | "fifo" => Ok(Policy::Fcfs),
            "priority" | "prio" => Ok(Policy::Priority),
            "rr" | "round_robin" | "round-robin" => Ok(Policy::RoundRobin),
            "wfq" => Ok(Policy::Wfq),
            _ => Err(Error::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Policy::Fcfs => "fcfs",
            Policy::Priority => "priority",
            Policy::RoundRobin => "rr",
            Policy::Wfq => "wfq",
        })
    }
}

/// Per-flow WFQ weights. The i-th weight (zero-based) belongs to flow `i + 1`.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Weights(Vec<Weight>);

impl Weights {
    pub fn new(weights: Vec<Weight>) -> Self {
        Self(weights)
    }

    pub fn get(&self, flow: FlowId) -> Option<Weight> {
        let idx = usize::try_from(flow.inner()).ok()?.checked_sub(1)?;
        self.0.get(idx).copied()
    }

    pub(crate) fn to_map(&self) -> FxHashMap<FlowId, Weight> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, &w)| (FlowId::from_usize(i + 1), w))
            .collect()
    }

    delegate::delegate! {
        to self.0 {
            pub fn is_empty(&self) -> bool;
            pub fn len(&self) -> usize;
        }
    }
}

/// Parses a comma-separated list such as `3,2,1`.
impl FromStr for Weights {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Weights::default());
        }
        s.split(',')
            .map(|w| {
                let w = w.trim();
                w.parse::<f64>()
                    .map(Weight::new)
                    .map_err(|_| Error::InvalidWeight(w.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Weights)
    }
}

/// Run configuration.
#[derive(Debug, Clone, typed_builder::TypedBuilder, serde::Serialize, serde::Deserialize)]
pub struct Config {
    pub policy: Policy,
    /// Transmissions per second.
    #[builder(setter(into))]
    pub output_rate: PacketsPerSec,
    /// Only consulted for [`Policy::Wfq`].
    #[builder(default)]
    #[serde(default)]
    pub weights: Weights,
}

impl Config {
    /// Rejects configurations that cannot run.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.output_rate.is_valid() {
            return Err(Error::InvalidRate(self.output_rate.into_f64()));
        }
        if self.policy == Policy::Wfq {
            if self.weights.is_empty() {
                return Err(Error::MissingWeights);
            }
            if let Some(w) = self.weights.0.iter().find(|w| !w.is_valid()) {
                return Err(Error::InvalidWeight(w.to_string()));
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Delta {
        self.output_rate.interval()
    }
}

/// Validates `cfg` and simulates the given arrivals to completion.
pub fn run(cfg: &Config, packets: Vec<Packet>) -> Result<Report, Error> {
    cfg.validate()?;
    validate_arrivals(&packets)?;
    info!(
        policy = %cfg.policy,
        output_rate = %cfg.output_rate,
        packets = packets.len(),
        "configured run"
    );
    let interval = cfg.interval();
    let report = match cfg.policy {
        Policy::Fcfs => simulate(FifoQ::new(), interval, packets),
        Policy::Priority => simulate(PrioQ::new(), interval, packets),
        Policy::RoundRobin => simulate(RoundRobinQ::new(), interval, packets),
        Policy::Wfq => {
            warn_unweighted(&cfg.weights, &packets);
            simulate(WfqQ::new(cfg.weights.to_map()), interval, packets)
        }
    };
    Ok(report)
}

// The event loop's clock starts at zero and only moves forward.
fn validate_arrivals(packets: &[Packet]) -> Result<(), Error> {
    match packets.iter().find(|pkt| {
        let ms = pkt.arrival.into_f64();
        !ms.is_finite() || ms.is_sign_negative()
    }) {
        Some(pkt) => Err(Error::InvalidArrival {
            arrival: pkt.arrival.into_f64(),
            payload: pkt.payload.clone(),
        }),
        None => Ok(()),
    }
}

fn simulate<Q: QDisc>(queue: Q, interval: Delta, packets: Vec<Packet>) -> Report {
    Simulation::builder()
        .arrivals(packets)
        .queue(queue)
        .interval(interval)
        .build()
        .run()
}

fn warn_unweighted(weights: &Weights, packets: &[Packet]) {
    let mut seen = FxHashSet::default();
    for pkt in packets {
        if weights.get(pkt.flow_id).is_none() && seen.insert(pkt.flow_id) {
            warn!(flow = %pkt.flow_id, "no weight configured for flow, using 1");
        }
    }
}

/// Reads and parses a trace file.
pub fn read_packets(path: impl AsRef<Path>, mode: Mode) -> Result<Trace, Error> {
    let file = File::open(path)?;
    input::parse_trace(BufReader::new(file), mode)
}

/// Reads a JSON run configuration.
pub fn read_config(path: impl AsRef<Path>) -> Result<Config, Error> {
    let s = std::fs::read_to_string(path)?;
    let cfg: Config = serde_json::from_str(&s)?;
    cfg.validate()?;
    Ok(cfg)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed input on line {line_no}: `{line}`")]
    Parse {
        line_no: usize,
        line: String,
        source: ParseError,
    },

    #[error("unknown queueing policy `{0}` (expected fcfs, priority, rr or wfq)")]
    UnknownPolicy(String),

    #[error("output rate must be a positive number of packets per second, got {0}")]
    InvalidRate(f64),

    #[error("wfq requires per-flow weights")]
    MissingWeights,

    #[error("weights must be positive numbers, got `{0}`")]
    InvalidWeight(String),

    #[error("arrival time must be finite and non-negative, got {arrival} for `{payload}`")]
    InvalidArrival { arrival: f64, payload: String },
}
