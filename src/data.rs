use std::collections::BTreeMap;

use crate::{
    ident::{FlowId, Priority},
    simulation::event::Event,
    time::{Delta, Time},
    units::Bytes,
};

/// A transmission record, one per sent packet.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    /// The flow the packet belonged to.
    pub flow_id: FlowId,
    pub priority: Priority,
    pub size: Bytes,
    /// When the packet arrived at the queue.
    pub arrival: Time,
    /// When the packet was sent.
    pub departure: Time,
}

impl Record {
    /// Time spent resident in the queue.
    pub fn delay(&self) -> Delta {
        self.departure - self.arrival
    }
}

/// Aggregate counters for one flow.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlowStats {
    pub sent: usize,
    pub bytes: Bytes,
    pub total_delay: Delta,
}

impl FlowStats {
    pub fn mean_delay(&self) -> Option<Delta> {
        (self.sent > 0).then(|| self.total_delay.scale_by(1.0 / self.sent as f64))
    }
}

/// Aggregate counters for a completed run.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Summary {
    pub enqueued: usize,
    pub sent: usize,
    pub bytes_sent: Bytes,
    /// Time of the last event, or zero for an empty run.
    pub end_time: Time,
    pub flows: BTreeMap<FlowId, FlowStats>,
}

impl Summary {
    pub(crate) fn from_records(enqueued: usize, end_time: Time, records: &[Record]) -> Self {
        let mut flows = BTreeMap::<FlowId, FlowStats>::new();
        for record in records {
            let stats = flows.entry(record.flow_id).or_default();
            stats.sent += 1;
            stats.bytes += record.size;
            stats.total_delay = stats.total_delay + record.delay();
        }
        Self {
            enqueued,
            sent: records.len(),
            bytes_sent: records.iter().map(|r| r.size).sum(),
            end_time,
            flows,
        }
    }
}

/// The record that closes a JSON event log, after the last event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Completion<'a> {
    kind: &'static str,
    summary: &'a Summary,
}

impl Summary {
    pub fn completion(&self) -> Completion<'_> {
        Completion {
            kind: "COMPLETE",
            summary: self,
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Report {
    /// The time-ordered event log.
    pub events: Vec<Event>,
    /// Sent packets, in send order.
    pub records: Vec<Record>,
    pub summary: Summary,
}
