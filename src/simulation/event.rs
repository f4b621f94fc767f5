use std::fmt;

use crate::{packet::Packet, time::Time};

/// One line of the event log.
#[derive(Debug, Clone, PartialEq, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct Event {
    pub time: Time,
    pub kind: EventKind,
    #[serde(flatten)]
    pub packet: Packet,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// The packet was admitted to the queue.
    Enqueue,
    /// The packet was dequeued and transmitted.
    Send,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            EventKind::Enqueue => "ENQUEUE",
            EventKind::Send => "SEND",
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pkt = &self.packet;
        write!(
            f,
            "[t={:6.1}ms] {:<7} flow={} prio={} size={} payload={}",
            self.time, self.kind, pkt.flow_id, pkt.priority, pkt.size, pkt.payload
        )
    }
}
