pub mod scenario;

pub use scenario::{LinkConfig, LinkEvent, ProbeConfig, ScenarioConfig, TimedEvent};

use serde::{Deserialize, Serialize};
use std::fs;
use anyhow::{Context, Result};
use crate::NodeAddress;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub address: NodeAddress,
    pub heartbeat_interval_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            address: "router".to_string(),
            heartbeat_interval_ms: 30_000, // 30 seconds
        }
    }
}

impl RouterConfig {
    pub fn new(address: impl Into<NodeAddress>, heartbeat_interval_ms: u64) -> Self {
        Self {
            address: address.into(),
            heartbeat_interval_ms,
        }
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading router config {}", path))?;
        let config: RouterConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing router config {}", path))?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: RouterConfig = serde_json::from_str(r#"{"address": "A"}"#).unwrap();
        assert_eq!(config.address, "A");
        assert_eq!(config.heartbeat_interval_ms, 30_000);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("ls-router-config-{}.json", std::process::id()));
        let path = path.to_str().unwrap();

        RouterConfig::new("B", 500).save(path).unwrap();
        let loaded = RouterConfig::load(path).unwrap();
        std::fs::remove_file(path).unwrap();

        assert_eq!(loaded.address, "B");
        assert_eq!(loaded.heartbeat_interval_ms, 500);
    }
}
