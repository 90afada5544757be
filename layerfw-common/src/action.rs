// Action ordinals follow the host's own XDP action constants, so the counters
// array can be indexed the same way by the classifier and by the reporter.

pub const XDP_ABORTED: u32 = 0;
pub const XDP_DROP: u32 = 1;
pub const XDP_PASS: u32 = 2;
pub const XDP_TX: u32 = 3;
pub const XDP_REDIRECT: u32 = 4;

pub const XDP_MAX_ACTIONS: usize = 5;

pub const ACTION_NAMES: [&str; XDP_MAX_ACTIONS] = [
    "XDP_ABORTED",
    "XDP_DROP",
    "XDP_PASS",
    "XDP_TX",
    "XDP_REDIRECT",
];

#[inline(always)]
pub fn action_name(action: u32) -> Option<&'static str> {
    ACTION_NAMES.get(action as usize).copied()
}

#[inline(always)]
pub fn action_from_name(name: &str) -> Option<u32> {
    let mut i = 0;
    while i < XDP_MAX_ACTIONS {
        if ACTION_NAMES[i] == name {
            return Some(i as u32);
        }
        i += 1;
    }
    None
}

// One slot per (shard, action).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActionCounters {
    pub packets: u64,
    pub bytes: u64,
}

impl ActionCounters {
    #[inline(always)]
    pub fn merge(&mut self, other: &ActionCounters) {
        self.packets = self.packets.wrapping_add(other.packets);
        self.bytes = self.bytes.wrapping_add(other.bytes);
    }
}
