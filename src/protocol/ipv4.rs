//! IPv4 header - RFC 791

use std::net::Ipv4Addr;

/// Minimum IPv4 header size (without options)
pub const MIN_HEADER_SIZE: usize = 20;
/// Minimum valid IHL value (in 32-bit words)
pub const MIN_IHL: u8 = 5;

/// IPv4 header (zero-copy reference)
///
/// Only the fixed 20-byte part is guaranteed to be present; options are
/// reached through [`Ipv4Header::header_len`] by the caller.
#[derive(Debug, Clone, Copy)]
pub struct Ipv4Header<'a> {
    buffer: &'a [u8],
}

impl<'a> Ipv4Header<'a> {
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < MIN_HEADER_SIZE {
            return None;
        }
        Some(Self { buffer })
    }

    pub fn version(&self) -> u8 {
        self.buffer[0] >> 4
    }

    pub fn ihl(&self) -> u8 {
        self.buffer[0] & 0x0F
    }

    /// Header length in bytes as declared by IHL
    pub fn header_len(&self) -> u32 {
        self.ihl() as u32 * 4
    }

    /// Declared datagram length; never checked against the frame.
    pub fn total_length(&self) -> u16 {
        u16::from_be_bytes([self.buffer[2], self.buffer[3]])
    }

    pub fn ttl(&self) -> u8 {
        self.buffer[8]
    }

    pub fn protocol(&self) -> u8 {
        self.buffer[9]
    }

    pub fn src_octets(&self) -> [u8; 4] {
        [
            self.buffer[12],
            self.buffer[13],
            self.buffer[14],
            self.buffer[15],
        ]
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.src_octets())
    }

    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(
            self.buffer[16],
            self.buffer[17],
            self.buffer[18],
            self.buffer[19],
        )
    }
}

/// Build a 20-byte IPv4 header with no options and a zero checksum.
pub fn build_header(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, payload_len: u16) -> Vec<u8> {
    build_header_with_ihl(src, dst, protocol, payload_len, MIN_IHL)
}

/// Build a 20-byte IPv4 header declaring an arbitrary IHL.
///
/// Option bytes are not emitted; the caller appends them (or deliberately
/// leaves them out) to produce the frame under test.
pub fn build_header_with_ihl(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    protocol: u8,
    payload_len: u16,
    ihl: u8,
) -> Vec<u8> {
    let total_length = (ihl as u16 * 4).saturating_add(payload_len);
    let mut header = Vec::with_capacity(MIN_HEADER_SIZE);
    header.push(0x40 | (ihl & 0x0F));
    header.push(0); // DSCP/ECN
    header.extend_from_slice(&total_length.to_be_bytes());
    header.extend_from_slice(&[0, 0]); // identification
    header.extend_from_slice(&[0x40, 0]); // DF, offset 0
    header.push(64); // TTL
    header.push(protocol);
    header.extend_from_slice(&[0, 0]); // checksum
    header.extend_from_slice(&src.octets());
    header.extend_from_slice(&dst.octets());
    header
}
