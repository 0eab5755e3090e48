use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::{Cost, NodeAddress, Port};

/// A live adjacency seen from the local side of a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub port: Port,
    pub neighbor: NodeAddress,
    pub cost: Cost,
}

/// Dijkstra needs finite, non-negative weights.
pub fn is_valid_cost(cost: Cost) -> bool {
    cost.is_finite() && cost >= 0.0
}

/// Local links keyed by port. This is also the neighbor set: a port is a
/// neighbor exactly while it has a link here.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    links: BTreeMap<Port, Link>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the link on `port`, returning the previous one.
    pub fn upsert(&mut self, port: Port, neighbor: NodeAddress, cost: Cost) -> Option<Link> {
        self.links.insert(port, Link { port, neighbor, cost })
    }

    pub fn remove(&mut self, port: Port) -> Option<Link> {
        self.links.remove(&port)
    }

    pub fn get(&self, port: Port) -> Option<&Link> {
        self.links.get(&port)
    }

    pub fn neighbor(&self, port: Port) -> Option<&NodeAddress> {
        self.links.get(&port).map(|link| &link.neighbor)
    }

    pub fn ports(&self) -> impl Iterator<Item = Port> + '_ {
        self.links.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Port towards `neighbor`. With parallel links the lowest port wins.
    pub fn port_for(&self, neighbor: &str) -> Option<Port> {
        self.links
            .values()
            .find(|link| link.neighbor == neighbor)
            .map(|link| link.port)
    }

    /// Port to neighbor mapping handed to the path computation.
    pub fn neighbor_set(&self) -> BTreeMap<Port, NodeAddress> {
        self.links
            .iter()
            .map(|(port, link)| (*port, link.neighbor.clone()))
            .collect()
    }

    /// Neighbor to cost mapping as advertised by this node. Parallel links to
    /// the same neighbor advertise the cheapest one.
    pub fn advertised_links(&self) -> BTreeMap<NodeAddress, Cost> {
        let mut advertised: BTreeMap<NodeAddress, Cost> = BTreeMap::new();
        for link in self.links.values() {
            advertised
                .entry(link.neighbor.clone())
                .and_modify(|cost| *cost = cost.min(link.cost))
                .or_insert(link.cost);
        }
        advertised
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_neighbor_on_same_port() {
        let mut table = LinkTable::new();
        table.upsert(1, "B".to_string(), 1.0);
        let previous = table.upsert(1, "C".to_string(), 4.0);

        assert_eq!(previous.map(|l| l.neighbor), Some("B".to_string()));
        assert_eq!(table.len(), 1);
        assert_eq!(table.neighbor(1), Some(&"C".to_string()));
        assert!(table.advertised_links().get("B").is_none());
    }

    #[test]
    fn parallel_links_advertise_cheapest_and_route_through_lowest_port() {
        let mut table = LinkTable::new();
        table.upsert(7, "B".to_string(), 2.0);
        table.upsert(3, "B".to_string(), 5.0);

        assert_eq!(table.advertised_links().get("B"), Some(&2.0));
        assert_eq!(table.port_for("B"), Some(3));
    }

    #[test]
    fn remove_unknown_port_is_none() {
        let mut table = LinkTable::new();
        assert!(table.remove(4).is_none());
        assert!(table.is_empty());
    }
}
