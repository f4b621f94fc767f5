pub mod driver;
pub mod feeder;
pub mod ident;
pub mod input;
pub mod queue;
pub mod time;
pub mod units;

pub(crate) mod data;
pub(crate) mod packet;
pub(crate) mod simulation;

pub use data::{Completion, FlowStats, Record, Report, Summary};
pub use driver::{run, Config, Error, Policy, Weights};
pub use ident::{FlowId, Priority};
pub use packet::Packet;
pub use simulation::event::{Event, EventKind};
