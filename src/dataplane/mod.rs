//! Data plane components
//!
//! Handles packet classification: header parsing, blacklist lookups,
//! disposition selection and per-action accounting.

mod blacklist;
mod classifier;
mod disposition;
mod dispatcher;
mod stats;

pub use blacklist::{
    BlacklistKey, BlacklistStore, BlacklistStoreBuilder, CidrAddr, CidrKey, LpmTable,
    PortDirection, PortKey, Table, Transport,
};
pub use classifier::{
    classify_ethernet, classify_ipv4, classify_ipv6, classify_transport, HitKind, Outcome,
    MAX_VLAN_DEPTH,
};
pub use disposition::Disposition;
pub use dispatcher::{ClassifierOptions, Dispatcher, Stage, Verdict};
pub use stats::{StatsRecorder, StatsSnapshot};
