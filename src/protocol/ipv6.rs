//! IPv6 header - RFC 8200

use std::net::Ipv6Addr;

/// IPv6 header size (fixed, unlike IPv4)
pub const HEADER_SIZE: usize = 40;

/// IPv6 base header (zero-copy reference)
#[derive(Debug, Clone, Copy)]
pub struct Ipv6Header<'a> {
    buffer: &'a [u8],
}

impl<'a> Ipv6Header<'a> {
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < HEADER_SIZE {
            return None;
        }
        Some(Self { buffer })
    }

    pub fn version(&self) -> u8 {
        self.buffer[0] >> 4
    }

    /// Payload Length (does not include header)
    pub fn payload_length(&self) -> u16 {
        u16::from_be_bytes([self.buffer[4], self.buffer[5]])
    }

    /// Next Header, which may name an extension header
    pub fn next_header(&self) -> u8 {
        self.buffer[6]
    }

    pub fn hop_limit(&self) -> u8 {
        self.buffer[7]
    }

    pub fn src_octets(&self) -> [u8; 16] {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.buffer[8..24]);
        octets
    }

    pub fn src_addr(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.src_octets())
    }

    pub fn dst_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.buffer[24..40]);
        Ipv6Addr::from(octets)
    }
}

/// Build a 40-byte IPv6 header.
pub fn build_header(src: Ipv6Addr, dst: Ipv6Addr, next_header: u8, payload_len: u16) -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(&[0x60, 0, 0, 0]); // version, traffic class, flow label
    header.extend_from_slice(&payload_len.to_be_bytes());
    header.push(next_header);
    header.push(64); // hop limit
    header.extend_from_slice(&src.octets());
    header.extend_from_slice(&dst.octets());
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields() {
        let src: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let dst: Ipv6Addr = "fe80::2".parse().unwrap();
        let bytes = build_header(src, dst, 17, 8);
        let header = Ipv6Header::parse(&bytes).unwrap();

        assert_eq!(header.version(), 6);
        assert_eq!(header.payload_length(), 8);
        assert_eq!(header.next_header(), 17);
        assert_eq!(header.hop_limit(), 64);
        assert_eq!(header.src_addr(), src);
        assert_eq!(header.dst_addr(), dst);
    }

    #[test]
    fn test_parse_too_short() {
        assert!(Ipv6Header::parse(&[0x60; 39]).is_none());
    }
}
