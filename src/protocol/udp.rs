//! UDP header - RFC 768

/// UDP header size (fixed)
pub const HEADER_SIZE: usize = 8;

/// UDP header (zero-copy reference)
#[derive(Debug, Clone, Copy)]
pub struct UdpHeader<'a> {
    buffer: &'a [u8],
}

impl<'a> UdpHeader<'a> {
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < HEADER_SIZE {
            return None;
        }
        Some(Self { buffer })
    }

    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes([self.buffer[0], self.buffer[1]])
    }

    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes([self.buffer[2], self.buffer[3]])
    }

    /// Length (header + data)
    pub fn length(&self) -> u16 {
        u16::from_be_bytes([self.buffer[4], self.buffer[5]])
    }
}

/// Build an 8-byte UDP header; the checksum is left at zero.
pub fn build_header(src_port: u16, dst_port: u16, payload_len: u16) -> Vec<u8> {
    let length = (HEADER_SIZE as u16).saturating_add(payload_len);
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(&src_port.to_be_bytes());
    header.extend_from_slice(&dst_port.to_be_bytes());
    header.extend_from_slice(&length.to_be_bytes());
    header.extend_from_slice(&[0, 0]);
    header
}
