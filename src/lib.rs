//! layerfw - inline layer 2/3/4 blacklist classifier
//!
//! Classifies each received Ethernet frame against MAC, IPv4/IPv6 prefix and
//! TCP/UDP port blacklists, producing exactly one action per frame and
//! keeping per-action packet/byte counters in per-worker shards.

pub mod config;
pub mod dataplane;
pub mod error;
pub mod protocol;
pub mod replay;
pub mod telemetry;

pub use error::{Error, Result};
