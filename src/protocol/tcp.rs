//! TCP header - RFC 793

/// Minimum TCP header size (without options)
pub const MIN_HEADER_SIZE: usize = 20;

/// TCP header (zero-copy reference)
#[derive(Debug, Clone, Copy)]
pub struct TcpHeader<'a> {
    buffer: &'a [u8],
}

impl<'a> TcpHeader<'a> {
    pub fn parse(buffer: &'a [u8]) -> Option<Self> {
        if buffer.len() < MIN_HEADER_SIZE {
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

    pub fn seq_number(&self) -> u32 {
        u32::from_be_bytes([
            self.buffer[4],
            self.buffer[5],
            self.buffer[6],
            self.buffer[7],
        ])
    }

    /// Data offset in 32-bit words
    pub fn data_offset(&self) -> u8 {
        self.buffer[12] >> 4
    }

    pub fn flags(&self) -> u8 {
        self.buffer[13]
    }
}

/// TCP flag bits
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const ACK: u8 = 0x10;
}

/// Build a 20-byte TCP header with the given ports and flags.
pub fn build_header(src_port: u16, dst_port: u16, flags: u8) -> Vec<u8> {
    let mut header = Vec::with_capacity(MIN_HEADER_SIZE);
    header.extend_from_slice(&src_port.to_be_bytes());
    header.extend_from_slice(&dst_port.to_be_bytes());
    header.extend_from_slice(&1u32.to_be_bytes()); // seq
    header.extend_from_slice(&0u32.to_be_bytes()); // ack
    header.push(5 << 4); // data offset
    header.push(flags);
    header.extend_from_slice(&65535u16.to_be_bytes()); // window
    header.extend_from_slice(&[0, 0, 0, 0]); // checksum, urgent pointer
    header
}
