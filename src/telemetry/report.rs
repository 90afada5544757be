//! Timestamped counter reports

use crate::dataplane::{StatsRecorder, StatsSnapshot};
use chrono::{DateTime, Utc};
use std::fmt;

/// Aggregated counters plus the time they were read
#[derive(Debug, Clone)]
pub struct StatsReport {
    pub taken_at: DateTime<Utc>,
    pub frames: u64,
    pub snapshot: StatsSnapshot,
}

impl StatsReport {
    pub fn capture(stats: &StatsRecorder) -> Self {
        let snapshot = stats.snapshot();
        Self {
            taken_at: Utc::now(),
            frames: snapshot.total_packets(),
            snapshot,
        }
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "# {} frames, {}",
            self.frames,
            self.taken_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f)?;
        write!(f, "{}", self.snapshot)
    }
}
