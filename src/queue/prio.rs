#![allow(clippy::non_canonical_partial_ord_impl)]

use std::{cmp::Reverse, collections::BinaryHeap};

use crate::{
    ident::{Priority, Seq},
    packet::Packet,
    time::Time,
    units::Bytes,
};

use super::QDisc;

/// Strict priority. Lowest priority value first, then earliest arrival, then insertion order.
#[derive(Debug, Default, derive_new::new)]
pub struct PrioQ {
    #[new(default)]
    heap: BinaryHeap<Entry>,
    #[new(default)]
    next_seq: Seq,
    #[new(default)]
    qsize: Bytes,
}

#[derive(Debug, derivative::Derivative)]
#[derivative(PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    key: Reverse<(Priority, Time, Seq)>,
    #[derivative(PartialEq = "ignore", PartialOrd = "ignore", Ord = "ignore")]
    pkt: Packet,
}

impl QDisc for PrioQ {
    fn enqueue(&mut self, pkt: Packet) {
        let seq = self.next_seq.bump();
        self.qsize += pkt.size;
        self.heap.push(Entry {
            key: Reverse((pkt.priority, pkt.arrival, seq)),
            pkt,
        });
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let Entry { pkt, .. } = self.heap.pop()?;
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
