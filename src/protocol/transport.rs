use std::collections::BTreeSet;
use crate::Port;
use crate::error::SendError;
use super::Packet;

/// Best-effort, non-blocking send primitive provided by the host.
pub trait Transport {
    fn send(&mut self, port: Port, packet: &Packet) -> Result<(), SendError>;
}

/// Transport that records every packet it accepts. Ports listed as closed
/// fail with [`SendError::UnknownPort`].
#[derive(Debug, Default)]
pub struct CollectingTransport {
    pub sent: Vec<(Port, Packet)>,
    closed: BTreeSet<Port>,
}

impl CollectingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close_port(&mut self, port: Port) {
        self.closed.insert(port);
    }

    /// Returns and clears what has been sent so far.
    pub fn take(&mut self) -> Vec<(Port, Packet)> {
        std::mem::take(&mut self.sent)
    }

    pub fn ports(&self) -> Vec<Port> {
        self.sent.iter().map(|(port, _)| *port).collect()
    }
}

impl Transport for CollectingTransport {
    fn send(&mut self, port: Port, packet: &Packet) -> Result<(), SendError> {
        if self.closed.contains(&port) {
            return Err(SendError::UnknownPort(port));
        }
        self.sent.push((port, packet.clone()));
        Ok(())
    }
}
