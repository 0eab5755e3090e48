pub mod algorithms;
pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod simulation;

pub use error::{DecodeError, SendError, SimulationError};
pub use protocol::{LinkStateRouter, Packet, PacketKind, PacketOutcome, Transport};

/// Address of a router. Ordering is only used to break ties deterministically.
pub type NodeAddress = String;

/// Local outgoing port, unique per live adjacency.
pub type Port = u32;

/// Link cost as carried in advertisements.
pub type Cost = f64;
