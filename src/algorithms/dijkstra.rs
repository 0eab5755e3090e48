use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::cmp::Ordering;
use crate::{Cost, NodeAddress, Port};
use crate::network::LinkStateDatabase;
use crate::protocol::ForwardingTable;

#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub cost: Cost,
    pub first_hop: NodeAddress,
    /// Routers from the source (inclusive) to the destination (inclusive).
    pub path: Vec<NodeAddress>,
}

#[derive(Debug)]
struct State {
    cost: Cost,
    router: NodeAddress,
}

impl Eq for State {}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap, ties broken by the smaller address
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.router.cmp(&self.router))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source shortest paths over the directed graph described by `lsdb`.
///
/// Edge costs are taken from the reporting router's advertisement. Routers
/// that are only referenced as somebody's neighbor are reachable but never
/// expanded. Among equal-cost alternatives the lexicographically smallest
/// predecessor is kept, so the result depends only on the database content.
pub fn calculate_shortest_paths(
    lsdb: &LinkStateDatabase,
    source: &str,
) -> BTreeMap<NodeAddress, ShortestPath> {
    let mut distances: BTreeMap<NodeAddress, Cost> = BTreeMap::new();
    let mut previous: BTreeMap<NodeAddress, NodeAddress> = BTreeMap::new();
    let mut settled: BTreeSet<NodeAddress> = BTreeSet::new();
    let mut heap = BinaryHeap::new();

    distances.insert(source.to_string(), 0.0);
    heap.push(State {
        cost: 0.0,
        router: source.to_string(),
    });

    while let Some(State { cost, router }) = heap.pop() {
        // Skip stale entries and routers that are already settled
        if cost > distance_to(&distances, &router) || !settled.insert(router.clone()) {
            continue;
        }

        let Some(links) = lsdb.links_of(&router) else {
            continue;
        };

        // BTreeMap iteration gives ascending neighbor order
        for (neighbor, link_cost) in links {
            let new_cost = cost + link_cost;
            let known = distance_to(&distances, neighbor);

            if new_cost < known {
                distances.insert(neighbor.clone(), new_cost);
                previous.insert(neighbor.clone(), router.clone());
                heap.push(State {
                    cost: new_cost,
                    router: neighbor.clone(),
                });
            } else if new_cost == known && !settled.contains(neighbor) {
                if let Some(prev) = previous.get_mut(neighbor) {
                    if router < *prev {
                        *prev = router.clone();
                    }
                }
            }
        }
    }

    let mut paths = BTreeMap::new();

    for (destination, &cost) in &distances {
        if destination == source || !cost.is_finite() {
            continue;
        }

        if let Some(path) = reconstruct_path(&previous, source, destination) {
            paths.insert(
                destination.clone(),
                ShortestPath {
                    cost,
                    first_hop: path[1].clone(),
                    path,
                },
            );
        }
    }

    paths
}

/// Builds the forwarding table from scratch for `source`.
pub fn recompute(
    source: &str,
    lsdb: &LinkStateDatabase,
    neighbors: &BTreeMap<Port, NodeAddress>,
) -> ForwardingTable {
    let mut table = ForwardingTable::new();

    for (destination, path) in calculate_shortest_paths(lsdb, source) {
        let port = neighbors
            .iter()
            .find(|(_, neighbor)| **neighbor == path.first_hop)
            .map(|(port, _)| *port);

        if let Some(port) = port {
            table.insert(destination, port, path.cost);
        }
    }

    table
}

fn distance_to(distances: &BTreeMap<NodeAddress, Cost>, router: &str) -> Cost {
    distances.get(router).copied().unwrap_or(Cost::INFINITY)
}

fn reconstruct_path(
    previous: &BTreeMap<NodeAddress, NodeAddress>,
    source: &str,
    dest: &str,
) -> Option<Vec<NodeAddress>> {
    let mut path = vec![dest.to_string()];
    let mut current = dest;

    while current != source {
        let prev = previous.get(current)?;
        path.push(prev.clone());
        current = prev;
    }

    path.reverse();
    Some(path)
}
