//! Terminal per-frame actions

use crate::Error;
use layerfw_common::{
    action_from_name, action_name, XDP_ABORTED, XDP_DROP, XDP_MAX_ACTIONS, XDP_PASS,
    XDP_REDIRECT, XDP_TX,
};
use std::fmt;
use std::str::FromStr;

/// The single action assigned to one frame
///
/// Ordinals match the counters array index read by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Disposition {
    Aborted = XDP_ABORTED,
    Drop = XDP_DROP,
    Pass = XDP_PASS,
    /// Retransmit out of the receiving interface
    Transmit = XDP_TX,
    Redirect = XDP_REDIRECT,
}

impl Disposition {
    pub const COUNT: usize = XDP_MAX_ACTIONS;

    pub const ALL: [Disposition; XDP_MAX_ACTIONS] = [
        Disposition::Aborted,
        Disposition::Drop,
        Disposition::Pass,
        Disposition::Transmit,
        Disposition::Redirect,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Host action name, e.g. `XDP_PASS`
    pub fn name(self) -> &'static str {
        // every variant is a valid ordinal
        action_name(self as u32).unwrap_or("XDP_UNKNOWN")
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Disposition {
    type Err = Error;

    /// Accepts host names (`XDP_TX`) and short names (`tx`, `pass`), any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let full = if upper.starts_with("XDP_") {
            upper
        } else {
            format!("XDP_{}", upper)
        };
        action_from_name(&full)
            .and_then(Disposition::from_index)
            .ok_or_else(|| Error::Parse(format!("unknown action '{}'", s)))
    }
}
