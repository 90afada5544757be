// Blacklist key encodings.
//
// MAC key:  6 OCTETS ADDRESS
// LPM key:  4 OCTETS PREFIX LENGTH (bits, host order), then 4 or 16 OCTETS ADDRESS
// Port key: 1 OCTET DIRECTION (0 = source, 1 = dest), then 2 OCTETS PORT (host order)

pub const MAC_KEY_SIZE: usize = 6;
pub const PORT_KEY_SIZE: usize = 3;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PortDirection {
    Source = 0,
    Dest = 1,
}

impl PortDirection {
    #[inline(always)]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Source),
            1 => Some(Self::Dest),
            _ => None,
        }
    }
}

#[inline(always)]
pub fn decode_mac_key(bytes: &[u8]) -> Option<[u8; MAC_KEY_SIZE]> {
    bytes.try_into().ok()
}

macro_rules! lpm_key {
    ($name:ident, $addr_len:expr, $key_size:ident) => {
        pub const $key_size: usize = 4 + $addr_len;

        #[repr(C)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            pub prefix_len: u32,
            pub data: [u8; $addr_len],
        }

        impl $name {
            pub const MAX_PREFIX_LEN: u32 = ($addr_len * 8) as u32;

            #[inline(always)]
            pub fn new(prefix_len: u32, data: [u8; $addr_len]) -> Self {
                Self { prefix_len, data }
            }

            #[inline(always)]
            pub fn to_bytes(&self) -> [u8; $key_size] {
                let mut out = [0u8; $key_size];
                out[..4].copy_from_slice(&self.prefix_len.to_ne_bytes());
                out[4..].copy_from_slice(&self.data);
                out
            }

            // Rejects wrong lengths and prefixes wider than the address.
            #[inline(always)]
            pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
                if bytes.len() != $key_size {
                    return None;
                }
                let prefix_len = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                if prefix_len > Self::MAX_PREFIX_LEN {
                    return None;
                }
                let data: [u8; $addr_len] = bytes[4..].try_into().ok()?;
                Some(Self { prefix_len, data })
            }
        }
    };
}

lpm_key!(LpmKeyV4, 4, LPM_V4_KEY_SIZE);
lpm_key!(LpmKeyV6, 16, LPM_V6_KEY_SIZE);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortKey {
    pub direction: PortDirection,
    pub port: u16,
}

impl PortKey {
    #[inline(always)]
    pub fn new(direction: PortDirection, port: u16) -> Self {
        Self { direction, port }
    }

    #[inline(always)]
    pub fn to_bytes(&self) -> [u8; PORT_KEY_SIZE] {
        let port = self.port.to_ne_bytes();
        [self.direction as u8, port[0], port[1]]
    }

    #[inline(always)]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PORT_KEY_SIZE {
            return None;
        }
        let direction = PortDirection::from_u8(bytes[0])?;
        let port = u16::from_ne_bytes([bytes[1], bytes[2]]);
        Some(Self { direction, port })
    }
}
