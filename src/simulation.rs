use std::collections::{BTreeMap, BTreeSet, VecDeque};
use log::{info, debug, warn};
use serde::Serialize;
use crate::{Cost, NodeAddress, Port};
use crate::config::{LinkEvent, ScenarioConfig};
use crate::error::{SendError, SimulationError};
use crate::protocol::{ForwardingTable, LinkStateRouter, Packet, PacketOutcome, Transport};

pub type LinkId = usize;

/// Upper bound on deliveries per drain; flooding always terminates well
/// below this because stale advertisements are never re-flooded.
pub const MAX_DELIVERIES: usize = 1_000_000;

#[derive(Debug, Clone)]
struct SimLink {
    a: NodeAddress,
    port_a: Port,
    b: NodeAddress,
    port_b: Port,
    cost: Cost,
}

#[derive(Debug, Clone)]
struct Delivery {
    to: NodeAddress,
    port: Port,
    packet: Packet,
}

/// Sends from one router onto the simulated links.
struct Outbox<'a> {
    node: &'a str,
    links: &'a BTreeMap<LinkId, SimLink>,
    queue: &'a mut VecDeque<Delivery>,
}

impl Transport for Outbox<'_> {
    fn send(&mut self, port: Port, packet: &Packet) -> Result<(), SendError> {
        let (to, remote_port) = self
            .links
            .values()
            .find_map(|link| {
                if link.a == self.node && link.port_a == port {
                    Some((link.b.clone(), link.port_b))
                } else if link.b == self.node && link.port_b == port {
                    Some((link.a.clone(), link.port_a))
                } else {
                    None
                }
            })
            .ok_or(SendError::UnknownPort(port))?;

        self.queue.push_back(Delivery {
            to,
            port: remote_port,
            packet: packet.clone(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub delivered: usize,
    /// Packets whose link disappeared while they were in flight.
    pub lost_in_flight: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TraceResult {
    Delivered,
    /// The router at the end of the path had no route.
    Unreachable,
    /// The router at the end of the path could not use its route.
    SendFailed,
    /// A router was visited twice.
    Looped,
    HopLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trace {
    pub from: NodeAddress,
    pub to: NodeAddress,
    pub path: Vec<NodeAddress>,
    pub result: TraceResult,
}

impl Trace {
    pub fn is_delivered(&self) -> bool {
        self.result == TraceResult::Delivered
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub time_ms: u64,
    pub stats: NetworkStats,
    pub tables: BTreeMap<NodeAddress, ForwardingTable>,
    pub traces: Vec<Trace>,
}

/// Deterministic in-memory host for a set of routers.
///
/// Owns every router, the bidirectional links between them and a FIFO of
/// packets in flight. Events are delivered one at a time.
#[derive(Debug)]
pub struct Network {
    heartbeat_ms: u64,
    time_ms: u64,
    routers: BTreeMap<NodeAddress, LinkStateRouter>,
    links: BTreeMap<LinkId, SimLink>,
    next_link: LinkId,
    next_port: BTreeMap<NodeAddress, Port>,
    queue: VecDeque<Delivery>,
    stats: NetworkStats,
}

impl Network {
    pub fn new(heartbeat_ms: u64) -> Self {
        Self {
            heartbeat_ms,
            time_ms: 0,
            routers: BTreeMap::new(),
            links: BTreeMap::new(),
            next_link: 0,
            next_port: BTreeMap::new(),
            queue: VecDeque::new(),
            stats: NetworkStats::default(),
        }
    }

    pub fn time_ms(&self) -> u64 {
        self.time_ms
    }

    pub fn stats(&self) -> NetworkStats {
        self.stats
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn router(&self, address: &str) -> Option<&LinkStateRouter> {
        self.routers.get(address)
    }

    pub fn routers(&self) -> impl Iterator<Item = &LinkStateRouter> {
        self.routers.values()
    }

    pub fn add_router(&mut self, address: impl Into<NodeAddress>) -> Result<(), SimulationError> {
        let address = address.into();
        if self.routers.contains_key(&address) {
            return Err(SimulationError::DuplicateRouter(address));
        }
        self.routers
            .insert(address.clone(), LinkStateRouter::new(address, self.heartbeat_ms));
        Ok(())
    }

    pub fn find_link(&self, a: &str, b: &str) -> Option<LinkId> {
        self.links
            .iter()
            .find(|(_, link)| (link.a == a && link.b == b) || (link.a == b && link.b == a))
            .map(|(id, _)| *id)
    }

    /// Connects `a` and `b` with a fresh port on each side. Both routers are
    /// notified; their advertisements stay queued until the next drain.
    pub fn add_link(&mut self, a: &str, b: &str, cost: Cost) -> Result<LinkId, SimulationError> {
        for endpoint in [a, b] {
            if !self.routers.contains_key(endpoint) {
                return Err(SimulationError::UnknownRouter(endpoint.to_string()));
            }
        }

        let port_a = self.allocate_port(a);
        let port_b = self.allocate_port(b);
        let id = self.next_link;
        self.next_link += 1;
        self.links.insert(id, SimLink {
            a: a.to_string(),
            port_a,
            b: b.to_string(),
            port_b,
            cost,
        });
        info!("link {} up: {}:{} <-> {}:{} cost {}", id, a, port_a, b, port_b, cost);

        self.notify_link(id);
        Ok(id)
    }

    pub fn set_link_cost(&mut self, a: &str, b: &str, cost: Cost) -> Result<(), SimulationError> {
        let id = self
            .find_link(a, b)
            .ok_or_else(|| SimulationError::UnknownLink(a.to_string(), b.to_string()))?;
        if let Some(link) = self.links.get_mut(&id) {
            link.cost = cost;
        }
        info!("link {} cost changed to {}", id, cost);

        self.notify_link(id);
        Ok(())
    }

    /// Tears the link down. Packets still in flight on it are lost.
    pub fn remove_link(&mut self, a: &str, b: &str) -> Result<(), SimulationError> {
        let id = self
            .find_link(a, b)
            .ok_or_else(|| SimulationError::UnknownLink(a.to_string(), b.to_string()))?;
        let Some(link) = self.links.remove(&id) else {
            return Ok(());
        };
        info!("link {} down: {} <-> {}", id, link.a, link.b);

        let Self { routers, links, queue, .. } = self;
        let links = &*links;
        for (node, port) in [(&link.a, link.port_a), (&link.b, link.port_b)] {
            if let Some(router) = routers.get_mut(node.as_str()) {
                let mut outbox = Outbox { node, links, queue: &mut *queue };
                router.handle_remove_link(port, &mut outbox);
            }
        }
        Ok(())
    }

    /// Delivers queued packets until the queue is empty or `max` deliveries
    /// were made. Returns the number of deliveries.
    pub fn run_until_quiet(&mut self, max: usize) -> usize {
        let mut delivered = 0;

        while delivered < max {
            let Some(delivery) = self.queue.pop_front() else {
                break;
            };
            delivered += 1;

            if !self.port_is_live(&delivery.to, delivery.port) {
                debug!("packet for {}:{} lost in flight", delivery.to, delivery.port);
                self.stats.lost_in_flight += 1;
                continue;
            }

            let Self { routers, links, queue, stats, .. } = &mut *self;
            let links = &*links;
            if let Some(router) = routers.get_mut(&delivery.to) {
                let mut outbox = Outbox { node: &delivery.to, links, queue: &mut *queue };
                router.handle_packet(delivery.port, &delivery.packet, &mut outbox);
                stats.delivered += 1;
            }
        }

        if !self.queue.is_empty() {
            warn!("stopped draining with {} packets still queued", self.queue.len());
        }
        delivered
    }

    /// Advances the clock by `duration_ms` in steps of `step_ms`, ticking every
    /// router and draining the queue after each step.
    pub fn advance(&mut self, duration_ms: u64, step_ms: u64) {
        let step_ms = step_ms.max(1);
        let target = self.time_ms + duration_ms;

        while self.time_ms < target {
            self.time_ms = (self.time_ms + step_ms).min(target);
            self.tick();
            self.run_until_quiet(MAX_DELIVERIES);
        }
    }

    /// Follows a probe from `from` towards `to`, hop by hop, without touching
    /// the main packet queue.
    pub fn trace(&mut self, from: &str, to: &str, max_hops: usize) -> Result<Trace, SimulationError> {
        if !self.routers.contains_key(from) {
            return Err(SimulationError::UnknownRouter(from.to_string()));
        }

        let mut path = vec![from.to_string()];
        let mut visited: BTreeSet<NodeAddress> = path.iter().cloned().collect();
        let mut probes = VecDeque::new();

        let Self { routers, links, .. } = self;
        let links = &*links;
        let mut outcome = match routers.get_mut(from) {
            Some(router) => {
                let mut outbox = Outbox { node: from, links, queue: &mut probes };
                router.originate_probe(to, &mut outbox)
            }
            None => PacketOutcome::Unreachable,
        };

        let result = loop {
            match outcome {
                PacketOutcome::Delivered => break TraceResult::Delivered,
                PacketOutcome::Forwarded(_) => {}
                PacketOutcome::SendFailed(_) => break TraceResult::SendFailed,
                _ => break TraceResult::Unreachable,
            }

            let Some(hop) = probes.pop_front() else {
                break TraceResult::SendFailed;
            };
            path.push(hop.to.clone());
            if !visited.insert(hop.to.clone()) {
                break TraceResult::Looped;
            }
            if path.len() > max_hops {
                break TraceResult::HopLimit;
            }

            outcome = match routers.get_mut(&hop.to) {
                Some(router) => {
                    let mut outbox = Outbox { node: &hop.to, links, queue: &mut probes };
                    router.handle_packet(hop.port, &hop.packet, &mut outbox)
                }
                None => PacketOutcome::Unreachable,
            };
        };

        debug!("trace {} -> {}: {:?} via {:?}", from, to, result, path);
        Ok(Trace {
            from: from.to_string(),
            to: to.to_string(),
            path,
            result,
        })
    }

    /// Builds the network described by `config`, plays its timed events and
    /// traces its probes.
    pub fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioReport, SimulationError> {
        config
            .validate()
            .map_err(|e| SimulationError::InvalidScenario(e.to_string()))?;

        let mut network = Network::new(config.heartbeat_interval_ms);
        for router in &config.routers {
            network.add_router(router.clone())?;
        }
        for link in &config.links {
            network.add_link(&link.a, &link.b, link.cost)?;
        }
        network.run_until_quiet(MAX_DELIVERIES);

        let mut events = config.events.clone();
        events.sort_by_key(|timed| timed.at_ms);
        let mut events = events.into_iter().peekable();

        while network.time_ms < config.duration_ms {
            while let Some(timed) = events.next_if(|timed| timed.at_ms <= network.time_ms) {
                network.apply(&timed.event)?;
            }
            network.run_until_quiet(MAX_DELIVERIES);

            let step = config.tick_ms.min(config.duration_ms - network.time_ms);
            network.advance(step, step);
        }
        for timed in events {
            network.apply(&timed.event)?;
        }
        network.run_until_quiet(MAX_DELIVERIES);

        let max_hops = network.routers.len() + 1;
        let traces = config
            .probes
            .iter()
            .map(|probe| network.trace(&probe.from, &probe.to, max_hops))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ScenarioReport {
            time_ms: network.time_ms,
            stats: network.stats,
            tables: network.forwarding_tables(),
            traces,
        })
    }

    pub fn apply(&mut self, event: &LinkEvent) -> Result<(), SimulationError> {
        match event {
            LinkEvent::Up { a, b, cost } => {
                if self.find_link(a, b).is_some() {
                    self.set_link_cost(a, b, *cost)
                } else {
                    self.add_link(a, b, *cost).map(|_| ())
                }
            }
            LinkEvent::Down { a, b } => self.remove_link(a, b),
            LinkEvent::Cost { a, b, cost } => self.set_link_cost(a, b, *cost),
        }
    }

    pub fn forwarding_tables(&self) -> BTreeMap<NodeAddress, ForwardingTable> {
        self.routers
            .iter()
            .map(|(address, router)| (address.clone(), router.forwarding_table().clone()))
            .collect()
    }

    fn tick(&mut self) {
        let now = self.time_ms;
        let Self { routers, links, queue, .. } = self;
        let links = &*links;
        for (address, router) in routers.iter_mut() {
            let mut outbox = Outbox { node: address, links, queue: &mut *queue };
            router.handle_time(now, &mut outbox);
        }
    }

    fn notify_link(&mut self, id: LinkId) {
        let Self { routers, links, queue, .. } = self;
        let links = &*links;
        let Some(link) = links.get(&id) else {
            return;
        };

        for (node, port, neighbor) in [
            (&link.a, link.port_a, &link.b),
            (&link.b, link.port_b, &link.a),
        ] {
            if let Some(router) = routers.get_mut(node.as_str()) {
                let mut outbox = Outbox { node, links, queue: &mut *queue };
                router.handle_new_link(port, neighbor.clone(), link.cost, &mut outbox);
            }
        }
    }

    fn allocate_port(&mut self, node: &str) -> Port {
        let next = self.next_port.entry(node.to_string()).or_insert(1);
        let port = *next;
        *next += 1;
        port
    }

    fn port_is_live(&self, node: &str, port: Port) -> bool {
        self.links.values().any(|link| {
            (link.a == node && link.port_a == port) || (link.b == node && link.port_b == port)
        })
    }
}
