use std::{
    collections::{BTreeMap, VecDeque},
    ops::Bound::{Excluded, Unbounded},
};

use crate::{ident::FlowId, packet::Packet, units::Bytes};

use super::QDisc;

/// Packet-by-packet round robin across flows, in ascending flow-id order.
///
/// Only flows with pending packets are kept in `flows`. A flow that drains leaves the map and
/// rejoins at its sorted position on its next enqueue, so rotation order depends on flow ids
/// alone, never on how recently a flow became active.
#[derive(Debug, Default, derive_new::new)]
pub struct RoundRobinQ {
    #[new(default)]
    flows: BTreeMap<FlowId, VecDeque<Packet>>,
    #[new(default)]
    last_served: Option<FlowId>,
    #[new(default)]
    len: usize,
    #[new(default)]
    qsize: Bytes,
}

impl RoundRobinQ {
    // The active flow after the last served one, wrapping around. If the last served flow has
    // since drained, service restarts at the smallest active flow id.
    fn pick(&self) -> Option<FlowId> {
        let next = self
            .last_served
            .filter(|last| self.flows.contains_key(last))
            .and_then(|last| self.flows.range((Excluded(last), Unbounded)).next())
            .map(|(&id, _)| id);
        next.or_else(|| self.flows.keys().next().copied())
    }

    /// Number of flows with at least one pending packet.
    pub fn active_flows(&self) -> usize {
        self.flows.len()
    }
}

impl QDisc for RoundRobinQ {
    fn enqueue(&mut self, pkt: Packet) {
        self.len += 1;
        self.qsize += pkt.size;
        self.flows.entry(pkt.flow_id).or_default().push_back(pkt);
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let id = self.pick()?;
        let queue = self.flows.get_mut(&id)?;
        let pkt = queue.pop_front()?;
        if queue.is_empty() {
            self.flows.remove(&id);
        }
        self.last_served = Some(id);
        self.len -= 1;
        self.qsize -= pkt.size;
        Some(pkt)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn bytes(&self) -> Bytes {
        self.qsize
    }
}
