use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use anyhow::{bail, Context, Result};
use crate::{Cost, NodeAddress};
use crate::network::is_valid_cost;

/// A simulated network and what happens to it over time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub heartbeat_interval_ms: u64,
    pub tick_ms: u64,
    pub duration_ms: u64,
    pub routers: Vec<NodeAddress>,
    pub links: Vec<LinkConfig>,
    pub events: Vec<TimedEvent>,
    /// Traced once the run is over.
    pub probes: Vec<ProbeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub a: NodeAddress,
    pub b: NodeAddress,
    pub cost: Cost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: LinkEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkEvent {
    Up { a: NodeAddress, b: NodeAddress, cost: Cost },
    Down { a: NodeAddress, b: NodeAddress },
    Cost { a: NodeAddress, b: NodeAddress, cost: Cost },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub from: NodeAddress,
    pub to: NodeAddress,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 1_000,
            tick_ms: 100,
            duration_ms: 10_000,
            routers: vec![],
            links: vec![],
            events: vec![],
            probes: vec![],
        }
    }
}

impl ScenarioConfig {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path))?;
        let config: ScenarioConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing scenario {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            bail!("tick_ms must be greater than zero");
        }

        let routers: BTreeSet<&str> = self.routers.iter().map(String::as_str).collect();
        if routers.len() != self.routers.len() {
            bail!("router addresses must be unique");
        }

        let check_endpoints = |a: &str, b: &str| -> Result<()> {
            for endpoint in [a, b] {
                if !routers.contains(endpoint) {
                    bail!("link references unknown router {}", endpoint);
                }
            }
            if a == b {
                bail!("link from {} to itself", a);
            }
            Ok(())
        };
        let check_cost = |cost: Cost| -> Result<()> {
            if !is_valid_cost(cost) {
                bail!("invalid link cost {}", cost);
            }
            Ok(())
        };

        for link in &self.links {
            check_endpoints(link.a.as_str(), link.b.as_str())?;
            check_cost(link.cost)?;
        }

        for timed in &self.events {
            match &timed.event {
                LinkEvent::Up { a, b, cost } | LinkEvent::Cost { a, b, cost } => {
                    check_endpoints(a.as_str(), b.as_str())?;
                    check_cost(*cost)?;
                }
                LinkEvent::Down { a, b } => check_endpoints(a.as_str(), b.as_str())?,
            }
        }

        for probe in &self.probes {
            if !routers.contains(probe.from.as_str()) {
                bail!("probe from unknown router {}", probe.from);
            }
        }

        Ok(())
    }

    /// Small diamond used by `--dump-config` as a starting point.
    pub fn example() -> Self {
        let link = |a: &str, b: &str, cost: Cost| LinkConfig {
            a: a.to_string(),
            b: b.to_string(),
            cost,
        };

        Self {
            routers: ["A", "B", "C", "D"].iter().map(|r| r.to_string()).collect(),
            links: vec![
                link("A", "B", 1.0),
                link("A", "C", 5.0),
                link("B", "D", 1.0),
                link("C", "D", 1.0),
            ],
            events: vec![TimedEvent {
                at_ms: 5_000,
                event: LinkEvent::Down { a: "B".to_string(), b: "D".to_string() },
            }],
            probes: vec![ProbeConfig { from: "A".to_string(), to: "D".to_string() }],
            ..Self::default()
        }
    }
}
