#![allow(clippy::non_canonical_partial_ord_impl)]

use std::{cmp::Reverse, collections::BinaryHeap};

use rustc_hash::FxHashMap;

use crate::{
    ident::{FlowId, Seq},
    packet::Packet,
    time::VirtualTime,
    units::{Bytes, Weight},
};

use super::QDisc;

/// Weighted fair queueing.
///
/// On arrival a packet is stamped with a virtual finish time
/// `max(vclock, last_finish[flow]) + size / weight[flow]`. Dequeue serves the smallest finish
/// time (insertion order on ties) and moves the virtual clock up to it. Flows without a
/// configured weight use [`Weight::ONE`].
#[derive(Debug, Default)]
pub struct WfqQ {
    weights: FxHashMap<FlowId, Weight>,
    finish: FxHashMap<FlowId, VirtualTime>,
    vclock: VirtualTime,
    heap: BinaryHeap<Entry>,
    next_seq: Seq,
    qsize: Bytes,
}

#[derive(Debug, derivative::Derivative)]
#[derivative(PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    key: Reverse<(VirtualTime, Seq)>,
    #[derivative(PartialEq = "ignore", PartialOrd = "ignore", Ord = "ignore")]
    pkt: Packet,
}

impl WfqQ {
    // PRECONDITION: every weight is finite and positive
    pub fn new(weights: FxHashMap<FlowId, Weight>) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    pub fn weight(&self, flow: FlowId) -> Weight {
        self.weights.get(&flow).copied().unwrap_or(Weight::ONE)
    }

    pub fn virtual_time(&self) -> VirtualTime {
        self.vclock
    }
}

impl QDisc for WfqQ {
    fn enqueue(&mut self, pkt: Packet) {
        let weight = self.weight(pkt.flow_id);
        let last = self
            .finish
            .get(&pkt.flow_id)
            .copied()
            .unwrap_or(VirtualTime::ZERO);
        let start = std::cmp::max(self.vclock, last);
        let finish = start + VirtualTime::new(pkt.size.into_f64() / weight.into_f64());
        self.finish.insert(pkt.flow_id, finish);

        let seq = self.next_seq.bump();
        self.qsize += pkt.size;
        self.heap.push(Entry {
            key: Reverse((finish, seq)),
            pkt,
        });
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let Entry {
            key: Reverse((finish, _)),
            pkt,
        } = self.heap.pop()?;
        self.vclock = finish;
        self.qsize -= pkt.size;
        Some(pkt)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn bytes(&self) -> Bytes {
        self.qsize
    }
}

#[cfg(test)]
mod tests {
    use crate::time::Time;

    use super::*;

    fn mk_pkt(flow: u64, size: u64) -> Packet {
        Packet::builder()
            .arrival(Time::ZERO)
            .flow_id(FlowId::new(flow))
            .size(Bytes::new(size))
            .build()
    }

    fn weights(ws: &[f64]) -> FxHashMap<FlowId, Weight> {
        ws.iter()
            .enumerate()
            .map(|(i, &w)| (FlowId::from_usize(i + 1), Weight::new(w)))
            .collect()
    }

    fn check_wfq_sequence(q: &mut WfqQ, sequence: &[u64]) {
        for &flow in sequence {
            let pkt = q.dequeue().expect("queue empty");
            assert_eq!(pkt.flow_id, FlowId::new(flow));
        }
    }

    #[test]
    fn wfq_empty_none() {
        let mut q = WfqQ::new(weights(&[1.0]));
        assert!(q.dequeue().is_none());
    }

    #[test]
    fn wfq_respects_weights() {
        let mut q = WfqQ::new(weights(&[3.0, 1.0]));
        for _ in 0..6 {
            q.enqueue(mk_pkt(1, 300));
            q.enqueue(mk_pkt(2, 300));
        }
        // Finish times: flow 1 at 100, 200, 300, ...; flow 2 at 300, 600, ...
        check_wfq_sequence(&mut q, &[1, 1, 2, 1, 1, 1, 2, 1]);
        assert_eq!(q.virtual_time(), VirtualTime::new(600.0));
    }

    #[test]
    fn wfq_smaller_packets_finish_first() {
        let mut q = WfqQ::new(weights(&[1.0, 1.0]));
        q.enqueue(mk_pkt(1, 1500));
        q.enqueue(mk_pkt(2, 256));
        check_wfq_sequence(&mut q, &[2, 1]);
    }

    #[test]
    fn wfq_late_flow_starts_at_virtual_clock() {
        let mut q = WfqQ::new(weights(&[1.0, 1.0]));
        for _ in 0..4 {
            q.enqueue(mk_pkt(1, 100));
        }
        check_wfq_sequence(&mut q, &[1, 1]);
        assert_eq!(q.virtual_time(), VirtualTime::new(200.0));

        // Flow 2 was idle and must not have banked credit: its first finish is 200 + 100
        q.enqueue(mk_pkt(2, 100));
        check_wfq_sequence(&mut q, &[1, 2, 1]);
        assert!(q.is_empty());
    }

    #[test]
    fn wfq_unweighted_flow_defaults_to_one() {
        let q = WfqQ::new(weights(&[4.0]));
        assert_eq!(q.weight(FlowId::new(1)), Weight::new(4.0));
        assert_eq!(q.weight(FlowId::new(9)), Weight::ONE);
    }
}
