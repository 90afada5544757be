//! Ethernet II header and 802.1Q/802.1ad tags

use super::{EtherType, MacAddr};

/// Ethernet header size (dst MAC, src MAC, EtherType)
pub const HEADER_SIZE: usize = 14;
/// VLAN tag size (TCI + encapsulated EtherType)
pub const VLAN_TAG_SIZE: usize = 4;
/// Maximum Ethernet frame size (without FCS, with two VLAN tags)
pub const MAX_FRAME_SIZE: usize = 1526;

/// Ethernet header (zero-copy reference)
#[derive(Debug, Clone, Copy)]
pub struct EthernetHeader<'a> {
    buffer: &'a [u8],
}

impl<'a> EthernetHeader<'a> {
    /// Wrap a header slice; `None` if it is shorter than [`HEADER_SIZE`]
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < HEADER_SIZE {
            return None;
        }
        Some(Self { buffer })
    }

    pub fn dst_mac(&self) -> MacAddr {
        MacAddr([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
            self.buffer[4],
            self.buffer[5],
        ])
    }

    pub fn src_mac(&self) -> MacAddr {
        MacAddr([
            self.buffer[6],
            self.buffer[7],
            self.buffer[8],
            self.buffer[9],
            self.buffer[10],
            self.buffer[11],
        ])
    }

    pub fn ethertype(&self) -> u16 {
        u16::from_be_bytes([self.buffer[12], self.buffer[13]])
    }
}

/// 802.1Q / 802.1ad tag following a VLAN TPID (zero-copy reference)
#[derive(Debug, Clone, Copy)]
pub struct VlanHeader<'a> {
    buffer: &'a [u8],
}

impl<'a> VlanHeader<'a> {
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < VLAN_TAG_SIZE {
            return None;
        }
        Some(Self { buffer })
    }

    /// Priority Code Point (3 bits)
    pub fn pcp(&self) -> u8 {
        self.buffer[0] >> 5
    }

    /// VLAN ID (12 bits)
    pub fn vid(&self) -> u16 {
        u16::from_be_bytes([self.buffer[0], self.buffer[1]]) & 0x0FFF
    }

    pub fn encapsulated_proto(&self) -> u16 {
        u16::from_be_bytes([self.buffer[2], self.buffer[3]])
    }
}

/// Builder for constructing Ethernet frames, VLAN stacks included
pub struct FrameBuilder {
    buffer: Vec<u8>,
}

impl FrameBuilder {
    pub fn new(dst: MacAddr, src: MacAddr) -> Self {
        let mut buffer = Vec::with_capacity(MAX_FRAME_SIZE);
        buffer.extend_from_slice(&dst.0);
        buffer.extend_from_slice(&src.0);
        Self { buffer }
    }

    /// Push a tag; `tpid` is written in the EtherType position.
    pub fn vlan(mut self, tpid: EtherType, vid: u16) -> Self {
        self.buffer.extend_from_slice(&(tpid as u16).to_be_bytes());
        self.buffer.extend_from_slice(&(vid & 0x0FFF).to_be_bytes());
        self
    }

    pub fn ethertype(mut self, ethertype: u16) -> Self {
        self.buffer.extend_from_slice(&ethertype.to_be_bytes());
        self
    }

    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.buffer.extend_from_slice(payload);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}
