//! Configuration types

use crate::dataplane::{
    BlacklistKey, BlacklistStore, BlacklistStoreBuilder, CidrKey, ClassifierOptions,
    PortDirection, PortKey, Transport,
};
use crate::protocol::MacAddr;
use crate::telemetry::LogConfig;
use crate::{Error, Result};
use serde::Deserialize;
use std::thread;
use tracing::debug;

/// User-defined configuration (config.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LogConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub blacklist: BlacklistConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Counter shards; 0 means one per available CPU
    pub shards: usize,
    pub strict_ipv4_header_len: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            shards: 0,
            strict_ipv4_header_len: true,
        }
    }
}

/// Blacklist entries in their textual form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    pub mac: Vec<String>,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
    pub tcp: Vec<PortEntry>,
    pub udp: Vec<PortEntry>,
}

impl BlacklistConfig {
    pub fn is_empty(&self) -> bool {
        self.mac.is_empty()
            && self.ipv4.is_empty()
            && self.ipv6.is_empty()
            && self.tcp.is_empty()
            && self.udp.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct PortEntry {
    pub direction: Direction,
    pub port: u16,
}

impl PortEntry {
    pub fn key(&self) -> PortKey {
        PortKey::new(self.direction.into(), self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "src")]
    Source,
    #[serde(alias = "dst", alias = "destination")]
    Dest,
}

impl From<Direction> for PortDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Source => PortDirection::Source,
            Direction::Dest => PortDirection::Dest,
        }
    }
}

impl Config {
    /// Parse every entry and populate a fresh store.
    ///
    /// Duplicates are accepted; malformed entries fail the whole build.
    pub fn build_store(&self) -> Result<BlacklistStore> {
        let mut builder = BlacklistStoreBuilder::new();
        for key in self.blacklist_keys()? {
            if !builder.insert(key)? {
                debug!(?key, "duplicate blacklist entry");
            }
        }
        Ok(builder.build())
    }

    /// Every configured entry as a typed key, in file order.
    pub fn blacklist_keys(&self) -> Result<Vec<BlacklistKey>> {
        let bl = &self.blacklist;
        let mut keys = Vec::new();

        for mac in &bl.mac {
            keys.push(BlacklistKey::Mac(mac.parse::<MacAddr>()?));
        }
        for (list, width, entries) in [("ipv4", 32, &bl.ipv4), ("ipv6", 128, &bl.ipv6)] {
            for entry in entries {
                let cidr = entry.parse::<CidrKey>()?;
                if cidr.address.width() != width {
                    return Err(Error::Config(format!(
                        "blacklist.{}: '{}' is not an {} prefix",
                        list, entry, list
                    )));
                }
                keys.push(BlacklistKey::Cidr(cidr));
            }
        }
        for entry in &bl.tcp {
            keys.push(BlacklistKey::Port(Transport::Tcp, entry.key()));
        }
        for entry in &bl.udp {
            keys.push(BlacklistKey::Port(Transport::Udp, entry.key()));
        }
        Ok(keys)
    }

    pub fn options(&self) -> ClassifierOptions {
        ClassifierOptions {
            strict_ipv4_header_len: self.classifier.strict_ipv4_header_len,
        }
    }

    /// Configured shard count with 0 resolved to the CPU count
    pub fn shard_count(&self) -> usize {
        match self.classifier.shards {
            0 => thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        }
    }
}
