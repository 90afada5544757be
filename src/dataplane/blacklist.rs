//! Blacklist tables
//!
//! Five read-only tables back the classifier:
//! - MAC source addresses (exact match)
//! - IPv4 and IPv6 source prefixes (longest-prefix-match membership)
//! - TCP and UDP ports, keyed by port and direction (exact match)
//!
//! The classifier only ever holds a shared [`BlacklistStore`]. All mutation
//! happens on a [`BlacklistStoreBuilder`] owned by the control plane, which
//! produces a fresh store to swap in.

use crate::protocol::{IpProtocol, MacAddr};
use crate::{Error, Result};
use layerfw_common::{decode_mac_key, LpmKeyV4, LpmKeyV6};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use tracing::debug;

pub use layerfw_common::{PortDirection, PortKey};

/// Transport protocol owning a port table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
}

impl Transport {
    /// Map a parser `next_protocol` value to a transport, if it is one.
    pub fn from_protocol(protocol: u16) -> Option<Self> {
        let protocol = u8::try_from(protocol).ok()?;
        match IpProtocol::from_u8(protocol)? {
            IpProtocol::Tcp => Some(Transport::Tcp),
            IpProtocol::Udp => Some(Transport::Udp),
            _ => None,
        }
    }

    pub fn table(self) -> Table {
        match self {
            Transport::Tcp => Table::TcpPorts,
            Transport::Udp => Table::UdpPorts,
        }
    }
}

/// Table identifiers, named after the maps the control plane manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Mac,
    Ipv4,
    Ipv6,
    TcpPorts,
    UdpPorts,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Mac,
        Table::Ipv4,
        Table::Ipv6,
        Table::TcpPorts,
        Table::UdpPorts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Mac => "mac_blacklist",
            Table::Ipv4 => "v4_blacklist",
            Table::Ipv6 => "v6_blacklist",
            Table::TcpPorts => "tcp_port_blacklist",
            Table::UdpPorts => "udp_port_blacklist",
        }
    }
}

/// Address bytes of a prefix key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CidrAddr {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl CidrAddr {
    /// Address width in bits
    pub fn width(&self) -> u32 {
        match self {
            CidrAddr::V4(_) => 32,
            CidrAddr::V6(_) => 128,
        }
    }
}

/// Prefix key: a prefix length in bits over a 4- or 16-byte address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrKey {
    pub prefix_len: u32,
    pub address: CidrAddr,
}

impl CidrKey {
    pub fn v4(prefix_len: u32, octets: [u8; 4]) -> Self {
        Self {
            prefix_len,
            address: CidrAddr::V4(octets),
        }
    }

    pub fn v6(prefix_len: u32, octets: [u8; 16]) -> Self {
        Self {
            prefix_len,
            address: CidrAddr::V6(octets),
        }
    }

    /// Full-width key for a single address, the form the classifier queries with
    pub fn host(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(a) => Self::v4(32, a.octets()),
            IpAddr::V6(a) => Self::v6(128, a.octets()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.prefix_len <= self.address.width()
    }

    /// Same prefix with every bit past `prefix_len` cleared
    pub fn network(&self) -> Self {
        let mut key = *self;
        match &mut key.address {
            CidrAddr::V4(octets) => mask_octets(octets, self.prefix_len),
            CidrAddr::V6(octets) => mask_octets(octets, self.prefix_len),
        }
        key
    }

    pub fn has_host_bits(&self) -> bool {
        self.network() != *self
    }
}

fn mask_octets(octets: &mut [u8], prefix_len: u32) {
    for (i, byte) in octets.iter_mut().enumerate() {
        let start = i as u32 * 8;
        if prefix_len >= start + 8 {
            continue;
        }
        if prefix_len <= start {
            *byte = 0;
        } else {
            *byte &= 0xFFu8 << (8 - (prefix_len - start));
        }
    }
}

impl fmt::Display for CidrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            CidrAddr::V4(octets) => write!(f, "{}/{}", Ipv4Addr::from(octets), self.prefix_len),
            CidrAddr::V6(octets) => write!(f, "{}/{}", Ipv6Addr::from(octets), self.prefix_len),
        }
    }
}

impl FromStr for CidrKey {
    type Err = Error;

    /// Parse "10.0.0.0/8", "2001:db8::/32", or a bare address (full width).
    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };
        let addr: IpAddr = addr
            .trim()
            .parse()
            .map_err(|_| Error::Parse(format!("invalid address in prefix '{}'", s)))?;

        let mut key = CidrKey::host(addr);
        if let Some(prefix) = prefix {
            key.prefix_len = prefix
                .trim()
                .parse()
                .map_err(|_| Error::Parse(format!("invalid prefix length in '{}'", s)))?;
        }
        if !key.is_valid() {
            return Err(Error::Parse(format!(
                "prefix length {} exceeds {} bits in '{}'",
                key.prefix_len,
                key.address.width(),
                s
            )));
        }
        Ok(key)
    }
}

/// Key for any of the tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlacklistKey {
    Mac(MacAddr),
    Cidr(CidrKey),
    Port(Transport, PortKey),
}

impl BlacklistKey {
    pub fn table(&self) -> Table {
        match self {
            BlacklistKey::Mac(_) => Table::Mac,
            BlacklistKey::Cidr(key) => match key.address {
                CidrAddr::V4(_) => Table::Ipv4,
                CidrAddr::V6(_) => Table::Ipv6,
            },
            BlacklistKey::Port(transport, _) => transport.table(),
        }
    }

    /// Wire encoding expected by the table this key belongs to
    pub fn encode(&self) -> Vec<u8> {
        match self {
            BlacklistKey::Mac(mac) => mac.octets().to_vec(),
            BlacklistKey::Cidr(key) => match key.address {
                CidrAddr::V4(octets) => LpmKeyV4::new(key.prefix_len, octets).to_bytes().to_vec(),
                CidrAddr::V6(octets) => LpmKeyV6::new(key.prefix_len, octets).to_bytes().to_vec(),
            },
            BlacklistKey::Port(_, key) => key.to_bytes().to_vec(),
        }
    }

    /// Decode a wire-encoded key for `table`.
    pub fn decode(table: Table, bytes: &[u8]) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidKey {
            table: table.name(),
            reason: format!("{} ({} bytes)", reason, bytes.len()),
        };
        match table {
            Table::Mac => decode_mac_key(bytes)
                .map(|octets| BlacklistKey::Mac(MacAddr(octets)))
                .ok_or_else(|| invalid("expected 6 address bytes")),
            Table::Ipv4 => LpmKeyV4::from_bytes(bytes)
                .map(|k| BlacklistKey::Cidr(CidrKey::v4(k.prefix_len, k.data)))
                .ok_or_else(|| invalid("expected prefix length <= 32 and 4 address bytes")),
            Table::Ipv6 => LpmKeyV6::from_bytes(bytes)
                .map(|k| BlacklistKey::Cidr(CidrKey::v6(k.prefix_len, k.data)))
                .ok_or_else(|| invalid("expected prefix length <= 128 and 16 address bytes")),
            Table::TcpPorts => PortKey::from_bytes(bytes)
                .map(|k| BlacklistKey::Port(Transport::Tcp, k))
                .ok_or_else(|| invalid("expected direction byte and 2 port bytes")),
            Table::UdpPorts => PortKey::from_bytes(bytes)
                .map(|k| BlacklistKey::Port(Transport::Udp, k))
                .ok_or_else(|| invalid("expected direction byte and 2 port bytes")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TrieNode {
    /// Child index per bit value; 0 means absent (the root is never a child)
    children: [u32; 2],
    /// A stored prefix ends at this node
    terminal: bool,
}

/// Binary trie answering "does any stored prefix cover this address"
///
/// Lookups walk at most `N * 8` levels, one per address bit.
#[derive(Debug, Clone)]
pub struct LpmTable<const N: usize> {
    nodes: Vec<TrieNode>,
    prefixes: usize,
}

impl<const N: usize> LpmTable<N> {
    pub const WIDTH: u32 = N as u32 * 8;

    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            prefixes: 0,
        }
    }

    fn insert(&mut self, prefix_len: u32, addr: &[u8; N]) {
        let mut node = 0usize;
        for depth in 0..prefix_len.min(Self::WIDTH) {
            let bit = bit_at(addr, depth);
            let child = self.nodes[node].children[bit];
            node = if child == 0 {
                let next = self.nodes.len();
                self.nodes.push(TrieNode::default());
                self.nodes[node].children[bit] = next as u32;
                next
            } else {
                child as usize
            };
        }
        if !self.nodes[node].terminal {
            self.nodes[node].terminal = true;
            self.prefixes += 1;
        }
    }

    /// Full-width membership query
    pub fn covers(&self, addr: &[u8; N]) -> bool {
        self.covers_prefix(addr, Self::WIDTH)
    }

    /// True if a stored prefix of length <= `query_len` matches the first
    /// `query_len` bits of `addr`.
    pub fn covers_prefix(&self, addr: &[u8; N], query_len: u32) -> bool {
        let mut node = 0usize;
        for depth in 0..query_len.min(Self::WIDTH) {
            if self.nodes[node].terminal {
                return true;
            }
            let child = self.nodes[node].children[bit_at(addr, depth)];
            if child == 0 {
                return false;
            }
            node = child as usize;
        }
        self.nodes[node].terminal
    }

    /// Number of stored prefixes
    pub fn len(&self) -> usize {
        self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes == 0
    }
}

impl<const N: usize> Default for LpmTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn bit_at<const N: usize>(addr: &[u8; N], depth: u32) -> usize {
    let byte = addr[(depth / 8) as usize];
    ((byte >> (7 - depth % 8)) & 1) as usize
}

/// Immutable set of blacklist tables shared by every classifier
#[derive(Debug, Clone, Default)]
pub struct BlacklistStore {
    mac: HashSet<MacAddr>,
    ipv4: LpmTable<4>,
    ipv6: LpmTable<16>,
    tcp_ports: HashSet<PortKey>,
    udp_ports: HashSet<PortKey>,
}

impl BlacklistStore {
    /// A store with every table empty; classifies everything as unlisted
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &BlacklistKey) -> bool {
        match key {
            BlacklistKey::Mac(mac) => self.contains_mac(mac),
            BlacklistKey::Cidr(key) => match key.address {
                CidrAddr::V4(octets) => self.ipv4.covers_prefix(&octets, key.prefix_len),
                CidrAddr::V6(octets) => self.ipv6.covers_prefix(&octets, key.prefix_len),
            },
            BlacklistKey::Port(transport, key) => self.contains_port(*transport, key),
        }
    }

    pub fn contains_mac(&self, mac: &MacAddr) -> bool {
        self.mac.contains(mac)
    }

    pub fn covers_ipv4(&self, addr: &[u8; 4]) -> bool {
        self.ipv4.covers(addr)
    }

    pub fn covers_ipv6(&self, addr: &[u8; 16]) -> bool {
        self.ipv6.covers(addr)
    }

    pub fn contains_port(&self, transport: Transport, key: &PortKey) -> bool {
        match transport {
            Transport::Tcp => self.tcp_ports.contains(key),
            Transport::Udp => self.udp_ports.contains(key),
        }
    }

    pub fn table_len(&self, table: Table) -> usize {
        match table {
            Table::Mac => self.mac.len(),
            Table::Ipv4 => self.ipv4.len(),
            Table::Ipv6 => self.ipv6.len(),
            Table::TcpPorts => self.tcp_ports.len(),
            Table::UdpPorts => self.udp_ports.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Table::ALL.iter().all(|t| self.table_len(*t) == 0)
    }
}

/// Control-plane view of the tables: insert, remove, then build.
#[derive(Debug, Clone, Default)]
pub struct BlacklistStoreBuilder {
    mac: BTreeSet<MacAddr>,
    ipv4: BTreeSet<(u32, [u8; 4])>,
    ipv6: BTreeSet<(u32, [u8; 16])>,
    tcp_ports: BTreeSet<PortKey>,
    udp_ports: BTreeSet<PortKey>,
}

impl BlacklistStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Prefix keys are stored with host bits cleared.
    ///
    /// Returns `false` if the key was already present.
    pub fn insert(&mut self, key: BlacklistKey) -> Result<bool> {
        let inserted = match key {
            BlacklistKey::Mac(mac) => self.mac.insert(mac),
            BlacklistKey::Cidr(cidr) => match checked_network(&cidr)?.address {
                CidrAddr::V4(octets) => self.ipv4.insert((cidr.prefix_len, octets)),
                CidrAddr::V6(octets) => self.ipv6.insert((cidr.prefix_len, octets)),
            },
            BlacklistKey::Port(Transport::Tcp, port) => self.tcp_ports.insert(port),
            BlacklistKey::Port(Transport::Udp, port) => self.udp_ports.insert(port),
        };
        Ok(inserted)
    }

    /// Remove a key. Returns `false` if it was not present.
    pub fn remove(&mut self, key: &BlacklistKey) -> Result<bool> {
        let removed = match key {
            BlacklistKey::Mac(mac) => self.mac.remove(mac),
            BlacklistKey::Cidr(cidr) => match checked_network(cidr)?.address {
                CidrAddr::V4(octets) => self.ipv4.remove(&(cidr.prefix_len, octets)),
                CidrAddr::V6(octets) => self.ipv6.remove(&(cidr.prefix_len, octets)),
            },
            BlacklistKey::Port(Transport::Tcp, port) => self.tcp_ports.remove(port),
            BlacklistKey::Port(Transport::Udp, port) => self.udp_ports.remove(port),
        };
        Ok(removed)
    }

    /// Insert a wire-encoded key into `table`.
    pub fn insert_raw(&mut self, table: Table, bytes: &[u8]) -> Result<bool> {
        let key = BlacklistKey::decode(table, bytes)?;
        self.insert(key)
    }

    /// Remove a wire-encoded key from `table`.
    pub fn remove_raw(&mut self, table: Table, bytes: &[u8]) -> Result<bool> {
        let key = BlacklistKey::decode(table, bytes)?;
        self.remove(&key)
    }

    pub fn table_len(&self, table: Table) -> usize {
        match table {
            Table::Mac => self.mac.len(),
            Table::Ipv4 => self.ipv4.len(),
            Table::Ipv6 => self.ipv6.len(),
            Table::TcpPorts => self.tcp_ports.len(),
            Table::UdpPorts => self.udp_ports.len(),
        }
    }

    pub fn build(&self) -> BlacklistStore {
        let mut ipv4 = LpmTable::new();
        for (prefix_len, octets) in &self.ipv4 {
            ipv4.insert(*prefix_len, octets);
        }
        let mut ipv6 = LpmTable::new();
        for (prefix_len, octets) in &self.ipv6 {
            ipv6.insert(*prefix_len, octets);
        }

        let store = BlacklistStore {
            mac: self.mac.iter().copied().collect(),
            ipv4,
            ipv6,
            tcp_ports: self.tcp_ports.iter().copied().collect(),
            udp_ports: self.udp_ports.iter().copied().collect(),
        };

        debug!(
            mac = store.table_len(Table::Mac),
            ipv4 = store.table_len(Table::Ipv4),
            ipv6 = store.table_len(Table::Ipv6),
            tcp_ports = store.table_len(Table::TcpPorts),
            udp_ports = store.table_len(Table::UdpPorts),
            "built blacklist store"
        );
        store
    }
}

fn checked_network(key: &CidrKey) -> Result<CidrKey> {
    if !key.is_valid() {
        return Err(Error::InvalidKey {
            table: BlacklistKey::Cidr(*key).table().name(),
            reason: format!(
                "prefix length {} exceeds {} bits",
                key.prefix_len,
                key.address.width()
            ),
        });
    }
    Ok(key.network())
}
