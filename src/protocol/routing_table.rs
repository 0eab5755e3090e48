use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::{Cost, NodeAddress, Port};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardingEntry {
    pub port: Port,
    pub metric: Cost,
}

/// Destination to outgoing port. Always rebuilt wholesale by the path
/// computation, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardingTable {
    entries: BTreeMap<NodeAddress, ForwardingEntry>,
}

impl ForwardingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, destination: NodeAddress, port: Port, metric: Cost) {
        self.entries.insert(destination, ForwardingEntry { port, metric });
    }

    pub fn get(&self, destination: &str) -> Option<&ForwardingEntry> {
        self.entries.get(destination)
    }

    pub fn port_for(&self, destination: &str) -> Option<Port> {
        self.entries.get(destination).map(|entry| entry.port)
    }

    pub fn cost_to(&self, destination: &str) -> Option<Cost> {
        self.entries.get(destination).map(|entry| entry.metric)
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.entries.contains_key(destination)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeAddress, &ForwardingEntry)> {
        self.entries.iter()
    }

    pub fn destinations(&self) -> impl Iterator<Item = &NodeAddress> {
        self.entries.keys()
    }
}
