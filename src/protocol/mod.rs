pub mod messages;
pub mod routing_table;
pub mod transport;

pub use messages::*;
pub use routing_table::*;
pub use transport::*;

use crate::{Cost, NodeAddress, Port};
use crate::algorithms::dijkstra::{self, ShortestPath};
use crate::config::RouterConfig;
use crate::network::{is_valid_cost, LinkStateDatabase, LinkTable};
use std::collections::BTreeMap;
use log::{info, debug, trace, warn};

/// What happened to a packet handed to [`LinkStateRouter::handle_packet`].
///
/// Purely informational: every outcome is already fully handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    /// Data packet addressed to this router.
    Delivered,
    /// Data packet sent on the given port.
    Forwarded(Port),
    /// No forwarding entry for the destination.
    Unreachable,
    /// The forwarding entry pointed at a port that could not be used.
    SendFailed(Port),
    /// Payload could not be decoded.
    Malformed,
    /// Advertisement not newer than the stored one.
    Stale,
    /// Advertisement accepted and re-flooded on `sent` ports.
    Flooded { changed: bool, sent: usize },
}

/// Link-state routing engine for one router.
///
/// Every handler runs to completion: update state, recompute if needed, then
/// send through the provided [`Transport`]. Send failures on one port never
/// prevent sending on the others.
#[derive(Debug, Clone)]
pub struct LinkStateRouter {
    address: NodeAddress,
    heartbeat_time: u64,
    last_time: u64,
    links: LinkTable,
    lsdb: LinkStateDatabase,
    forwarding_table: ForwardingTable,
    seq_num: u64,
}

impl LinkStateRouter {
    pub fn new(address: impl Into<NodeAddress>, heartbeat_time: u64) -> Self {
        let address = address.into();
        Self {
            lsdb: LinkStateDatabase::new(address.clone()),
            address,
            heartbeat_time,
            last_time: 0,
            links: LinkTable::new(),
            forwarding_table: ForwardingTable::new(),
            seq_num: 0,
        }
    }

    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.address.clone(), config.heartbeat_interval_ms)
    }

    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    pub fn heartbeat_time(&self) -> u64 {
        self.heartbeat_time
    }

    pub fn forwarding_table(&self) -> &ForwardingTable {
        &self.forwarding_table
    }

    pub fn lsdb(&self) -> &LinkStateDatabase {
        &self.lsdb
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn sequence_number(&self) -> u64 {
        self.seq_num
    }

    /// Full shortest-path view over the current database.
    pub fn shortest_paths(&self) -> BTreeMap<NodeAddress, ShortestPath> {
        dijkstra::calculate_shortest_paths(&self.lsdb, &self.address)
    }

    /// A link came up on `port`, or its neighbor or cost changed. Negative or
    /// non-finite costs are refused and leave the router untouched.
    pub fn handle_new_link(
        &mut self,
        port: Port,
        endpoint: impl Into<NodeAddress>,
        cost: Cost,
        transport: &mut dyn Transport,
    ) {
        let endpoint = endpoint.into();
        if !is_valid_cost(cost) {
            warn!("{}: refusing link on port {} to {} with cost {}", self.address, port, endpoint, cost);
            return;
        }
        info!("{}: link up on port {} to {} (cost {})", self.address, port, endpoint, cost);

        self.links.upsert(port, endpoint, cost);
        self.lsdb.record_local_links(self.links.advertised_links());
        self.recompute();
        self.broadcast_link_state(transport);
    }

    /// The link on `port` went down. Unknown ports are ignored.
    pub fn handle_remove_link(&mut self, port: Port, transport: &mut dyn Transport) {
        let Some(removed) = self.links.remove(port) else {
            debug!("{}: link down on unknown port {}, ignoring", self.address, port);
            return;
        };
        info!("{}: link down on port {} to {}", self.address, port, removed.neighbor);

        self.lsdb.record_local_links(self.links.advertised_links());
        self.recompute();
        self.broadcast_link_state(transport);
    }

    pub fn handle_packet(
        &mut self,
        port: Port,
        packet: &Packet,
        transport: &mut dyn Transport,
    ) -> PacketOutcome {
        match packet.decode() {
            Ok(Message::Data { destination, .. }) => self.route_data(packet, &destination, transport),
            Ok(Message::Advertisement(advertisement)) => {
                self.handle_advertisement(port, packet, advertisement, transport)
            }
            Err(e) => {
                debug!("{}: dropping packet from {} on port {}: {}", self.address, packet.src_addr, port, e);
                PacketOutcome::Malformed
            }
        }
    }

    /// Periodic soft-state refresh. Returns whether an advertisement was flooded.
    pub fn handle_time(&mut self, time_ms: u64, transport: &mut dyn Transport) -> bool {
        if time_ms.saturating_sub(self.last_time) < self.heartbeat_time {
            return false;
        }
        self.last_time = time_ms;

        if self.links.is_empty() {
            return false;
        }

        trace!("{}: heartbeat at {} ms", self.address, time_ms);
        self.broadcast_link_state(transport);
        true
    }

    /// Injects a data packet originated by this router towards `destination`.
    pub fn originate_probe(
        &mut self,
        destination: impl Into<NodeAddress>,
        transport: &mut dyn Transport,
    ) -> PacketOutcome {
        let destination = destination.into();
        let packet = Packet::data(self.address.clone(), destination.clone(), "probe".to_string());
        self.route_data(&packet, &destination, transport)
    }

    fn route_data(
        &self,
        packet: &Packet,
        destination: &str,
        transport: &mut dyn Transport,
    ) -> PacketOutcome {
        if destination == self.address {
            trace!("{}: delivered data packet from {}", self.address, packet.src_addr);
            return PacketOutcome::Delivered;
        }

        let Some(port) = self.forwarding_table.port_for(destination) else {
            trace!("{}: no route to {}, dropping", self.address, destination);
            return PacketOutcome::Unreachable;
        };

        match transport.send(port, packet) {
            Ok(()) => {
                trace!("{}: forwarded data for {} on port {}", self.address, destination, port);
                PacketOutcome::Forwarded(port)
            }
            Err(e) => {
                debug!("{}: failed to forward data for {}: {}", self.address, destination, e);
                PacketOutcome::SendFailed(port)
            }
        }
    }

    fn handle_advertisement(
        &mut self,
        port: Port,
        packet: &Packet,
        advertisement: Advertisement,
        transport: &mut dyn Transport,
    ) -> PacketOutcome {
        // Only local link events may change our own entry
        if advertisement.originator == self.address {
            trace!("{}: ignoring own advertisement seq {}", self.address, advertisement.sequence);
            return PacketOutcome::Stale;
        }

        let acceptance = self.lsdb.accept_advertisement(
            &advertisement.originator,
            advertisement.sequence,
            advertisement.links,
        );

        if !acceptance.accepted {
            trace!(
                "{}: stale advertisement from {} seq {}",
                self.address, advertisement.originator, advertisement.sequence
            );
            return PacketOutcome::Stale;
        }

        debug!(
            "{}: accepted advertisement from {} seq {} (changed: {})",
            self.address, advertisement.originator, advertisement.sequence, acceptance.changed
        );

        if acceptance.changed {
            self.recompute();
        }

        let sent = self.send_all(packet, Some(port), transport);
        PacketOutcome::Flooded { changed: acceptance.changed, sent }
    }

    fn recompute(&mut self) {
        self.forwarding_table =
            dijkstra::recompute(&self.address, &self.lsdb, &self.links.neighbor_set());
        debug!("{}: forwarding table has {} routes", self.address, self.forwarding_table.len());
    }

    fn broadcast_link_state(&mut self, transport: &mut dyn Transport) {
        self.seq_num += 1;
        self.lsdb.set_local_sequence(self.seq_num);

        let advertisement = Advertisement {
            originator: self.address.clone(),
            sequence: self.seq_num,
            links: self.links.advertised_links(),
        };

        let packet = match Packet::advertisement(&advertisement) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("{}: failed to encode advertisement: {}", self.address, e);
                return;
            }
        };

        let sent = self.send_all(&packet, None, transport);
        debug!("{}: flooded advertisement seq {} on {} ports", self.address, self.seq_num, sent);
    }

    /// Sends `packet` on every live port except `except`. Returns how many
    /// sends succeeded.
    fn send_all(&self, packet: &Packet, except: Option<Port>, transport: &mut dyn Transport) -> usize {
        let mut sent = 0;
        for port in self.links.ports().filter(|port| Some(*port) != except) {
            match transport.send(port, packet) {
                Ok(()) => sent += 1,
                Err(e) => debug!("{}: send on port {} failed: {}", self.address, port, e),
            }
        }
        sent
    }
}
