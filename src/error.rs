use thiserror::Error;

use crate::{NodeAddress, Port};

/// Why an incoming packet could not be turned into a [`crate::protocol::Message`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("advertisement payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("advertisement from {originator} reports invalid cost {cost} towards {neighbor}")]
    InvalidCost {
        originator: NodeAddress,
        neighbor: NodeAddress,
        cost: f64,
    },

    #[error("data packet from {0} has no destination")]
    MissingDestination(NodeAddress),
}

/// Failure of a single best-effort send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("port {0} is not connected")]
    UnknownPort(Port),
}

/// Misuse of the in-memory simulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("unknown router {0}")]
    UnknownRouter(NodeAddress),

    #[error("router {0} already exists")]
    DuplicateRouter(NodeAddress),

    #[error("no link between {0} and {1}")]
    UnknownLink(NodeAddress, NodeAddress),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}
