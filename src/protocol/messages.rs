use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::{Cost, NodeAddress};
use crate::error::DecodeError;
use crate::network::is_valid_cost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketKind {
    /// End-user probe traffic routed by the forwarding table.
    Data,
    /// Link-state advertisement, flooded.
    Routing,
}

/// Envelope exchanged between routers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub kind: PacketKind,
    pub src_addr: NodeAddress,
    pub dst_addr: Option<NodeAddress>,
    pub content: String,
}

/// JSON body of a routing packet. The originator travels in `src_addr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvertisementPayload {
    pub links: BTreeMap<NodeAddress, Cost>,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advertisement {
    pub originator: NodeAddress,
    pub sequence: u64,
    pub links: BTreeMap<NodeAddress, Cost>,
}

/// A packet after boundary decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Advertisement(Advertisement),
    Data {
        source: NodeAddress,
        destination: NodeAddress,
    },
}

impl Packet {
    pub fn data(src_addr: NodeAddress, dst_addr: NodeAddress, content: String) -> Self {
        Self {
            kind: PacketKind::Data,
            src_addr,
            dst_addr: Some(dst_addr),
            content,
        }
    }

    pub fn advertisement(advertisement: &Advertisement) -> Result<Self, serde_json::Error> {
        let payload = AdvertisementPayload {
            links: advertisement.links.clone(),
            sequence: advertisement.sequence,
        };

        Ok(Self {
            kind: PacketKind::Routing,
            src_addr: advertisement.originator.clone(),
            dst_addr: None,
            content: serde_json::to_string(&payload)?,
        })
    }

    pub fn is_data(&self) -> bool {
        self.kind == PacketKind::Data
    }

    pub fn is_routing(&self) -> bool {
        self.kind == PacketKind::Routing
    }

    /// Decodes the packet into a typed message. Costs must be finite and
    /// non-negative for the advertisement to be usable by the path computation.
    pub fn decode(&self) -> Result<Message, DecodeError> {
        match self.kind {
            PacketKind::Data => {
                let destination = self
                    .dst_addr
                    .clone()
                    .ok_or_else(|| DecodeError::MissingDestination(self.src_addr.clone()))?;
                Ok(Message::Data {
                    source: self.src_addr.clone(),
                    destination,
                })
            }
            PacketKind::Routing => {
                let payload: AdvertisementPayload = serde_json::from_str(&self.content)?;

                if let Some((neighbor, cost)) = payload
                    .links
                    .iter()
                    .find(|(_, cost)| !is_valid_cost(**cost))
                {
                    return Err(DecodeError::InvalidCost {
                        originator: self.src_addr.clone(),
                        neighbor: neighbor.clone(),
                        cost: *cost,
                    });
                }

                Ok(Message::Advertisement(Advertisement {
                    originator: self.src_addr.clone(),
                    sequence: payload.sequence,
                    links: payload.links,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routing(src: &str, content: &str) -> Packet {
        Packet {
            kind: PacketKind::Routing,
            src_addr: src.to_string(),
            dst_addr: None,
            content: content.to_string(),
        }
    }

    #[test]
    fn advertisement_wire_format() {
        let advertisement = Advertisement {
            originator: "B".to_string(),
            sequence: 4,
            links: [("A".to_string(), 1.0), ("D".to_string(), 2.5)].into_iter().collect(),
        };
        let packet = Packet::advertisement(&advertisement).unwrap();

        assert!(packet.is_routing());
        assert_eq!(packet.dst_addr, None);
        assert_eq!(packet.content, r#"{"links":{"A":1.0,"D":2.5},"sequence":4}"#);
        assert_eq!(packet.decode().unwrap(), Message::Advertisement(advertisement));
    }

    #[test]
    fn integer_costs_are_accepted() {
        let message = routing("B", r#"{"links":{"A":3},"sequence":1}"#).decode().unwrap();
        let Message::Advertisement(advertisement) = message else {
            panic!("expected advertisement");
        };
        assert_eq!(advertisement.links["A"], 3.0);
    }

    #[test]
    fn malformed_payloads_are_typed_errors() {
        assert!(matches!(routing("B", "not json").decode(), Err(DecodeError::Json(_))));
        assert!(matches!(routing("B", r#"{"links":{}}"#).decode(), Err(DecodeError::Json(_))));
        assert!(matches!(routing("B", r#"{"sequence":1}"#).decode(), Err(DecodeError::Json(_))));
        assert!(matches!(
            routing("B", r#"{"links":{"A":1},"sequence":-1}"#).decode(),
            Err(DecodeError::Json(_))
        ));
        assert!(matches!(
            routing("B", r#"{"links":{"A":-2},"sequence":1}"#).decode(),
            Err(DecodeError::InvalidCost { .. })
        ));
    }

    #[test]
    fn data_packet_requires_destination() {
        let mut packet = Packet::data("A".to_string(), "D".to_string(), "probe".to_string());
        assert_eq!(
            packet.decode().unwrap(),
            Message::Data { source: "A".to_string(), destination: "D".to_string() }
        );

        packet.dst_addr = None;
        assert!(matches!(packet.decode(), Err(DecodeError::MissingDestination(_))));
    }
}
