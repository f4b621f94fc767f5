//! Queueing disciplines.
//!
//! Every discipline implements [`QDisc`]. The simulation is generic over the discipline, so the
//! choice is made once when a run is set up and never re-examined per packet.

mod fifo;
mod prio;
mod round_robin;
mod wfq;

use crate::{packet::Packet, units::Bytes};

pub use fifo::FifoQ;
pub use prio::PrioQ;
pub use round_robin::RoundRobinQ;
pub use wfq::WfqQ;

/// A queueing discipline.
pub trait QDisc {
    /// Admits a packet. Admission never fails and never drops.
    fn enqueue(&mut self, pkt: Packet);

    /// Removes the next packet to transmit, or `None` if nothing is eligible.
    fn dequeue(&mut self) -> Option<Packet>;

    /// Number of resident packets.
    fn len(&self) -> usize;

    /// Total size of resident packets.
    fn bytes(&self) -> Bytes;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
