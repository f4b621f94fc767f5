use std::fmt;

use typed_builder::TypedBuilder;

use crate::{
    ident::{FlowId, Priority},
    time::Time,
    units::Bytes,
};

/// A datagram waiting to be forwarded.
///
/// Packets are created once per input line and never mutated afterwards. The scheduler only
/// looks at the arrival time, flow and priority; size and payload are carried along for the log.
#[derive(Debug, Clone, PartialEq, TypedBuilder, serde::Serialize, serde::Deserialize)]
pub struct Packet {
    #[builder(setter(into))]
    pub arrival: Time,
    pub flow_id: FlowId,
    #[builder(default)]
    pub priority: Priority,
    #[builder(setter(into))]
    pub size: Bytes,
    #[builder(default, setter(into))]
    pub payload: String,
}

/// Renders the packet as a single trace line, in the form the input parser accepts.
impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} {} {} {} {}",
            self.arrival, self.flow_id, self.priority, self.size, self.payload
        )
    }
}
