use std::collections::VecDeque;

use crate::{packet::Packet, units::Bytes};

use super::QDisc;

/// First-come-first-served.
#[derive(Debug, Default, derive_new::new)]
pub struct FifoQ {
    #[new(default)]
    inner: VecDeque<Packet>,
    #[new(default)]
    qsize: Bytes,
}

impl QDisc for FifoQ {
    fn enqueue(&mut self, pkt: Packet) {
        self.qsize += pkt.size;
        self.inner.push_back(pkt);
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let pkt = self.inner.pop_front()?;
        self.qsize -= pkt.size;
        Some(pkt)
    }

    delegate::delegate! {
        to self.inner {
            fn len(&self) -> usize;
            fn is_empty(&self) -> bool;
        }
    }

    fn bytes(&self) -> Bytes {
        self.qsize
    }
}
