//! Per-action packet and byte counters
//!
//! One shard per worker. Workers only ever `fetch_add` into their own shard
//! with relaxed ordering; readers sum across shards when they want a total.

use super::disposition::Disposition;
use layerfw_common::ActionCounters;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

#[derive(Debug, Default)]
struct Slot {
    packets: AtomicU64,
    bytes: AtomicU64,
}

impl Slot {
    fn load(&self) -> ActionCounters {
        ActionCounters {
            packets: self.packets.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Counters for one worker, padded to its own cache line
#[derive(Debug, Default)]
#[repr(align(64))]
struct Shard {
    slots: [Slot; Disposition::COUNT],
}

/// Sharded counter table indexed by (shard, disposition)
#[derive(Debug)]
pub struct StatsRecorder {
    shards: Box<[Shard]>,
}

impl StatsRecorder {
    /// Create a recorder with `shards` shards (at least one).
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| Shard::default()).collect();
        Self { shards }
    }

    /// One shard per available CPU
    pub fn with_available_parallelism() -> Self {
        let n = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::new(n)
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Add one packet of `bytes` bytes to `disposition` in `shard`.
    ///
    /// Shard indices wrap modulo [`shard_count`](Self::shard_count).
    #[inline]
    pub fn record(&self, shard: usize, disposition: Disposition, bytes: u64) {
        let slot = &self.shards[shard % self.shards.len()].slots[disposition.index()];
        slot.packets.fetch_add(1, Ordering::Relaxed);
        slot.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Raw counters for one disposition, one entry per shard.
    pub fn per_shard(&self, disposition: Disposition) -> Vec<ActionCounters> {
        self.shards
            .iter()
            .map(|shard| shard.slots[disposition.index()].load())
            .collect()
    }

    /// Sum every shard per disposition.
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut totals = [ActionCounters::default(); Disposition::COUNT];
        for shard in self.shards.iter() {
            for (total, slot) in totals.iter_mut().zip(shard.slots.iter()) {
                total.merge(&slot.load());
            }
        }
        StatsSnapshot { totals }
    }
}

impl Default for StatsRecorder {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

/// Aggregated counters at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    totals: [ActionCounters; Disposition::COUNT],
}

impl StatsSnapshot {
    pub fn get(&self, disposition: Disposition) -> ActionCounters {
        self.totals[disposition.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Disposition, ActionCounters)> + '_ {
        Disposition::ALL.iter().map(move |d| (*d, self.get(*d)))
    }

    pub fn total_packets(&self) -> u64 {
        self.totals.iter().map(|c| c.packets).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.totals.iter().map(|c| c.bytes).sum()
    }

    /// Flat `(name, value)` list, e.g. `("xdp_drop_packets", 3)`
    pub fn export(&self) -> Vec<(String, u64)> {
        let mut out = Vec::with_capacity(Disposition::COUNT * 2);
        for (disposition, counters) in self.iter() {
            let name = disposition.name().to_ascii_lowercase();
            out.push((format!("{}_packets", name), counters.packets));
            out.push((format!("{}_bytes", name), counters.bytes));
        }
        out
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (disposition, counters) in self.iter() {
            writeln!(f, "Action '{}':", disposition)?;
            writeln!(f, "Packets: {}", counters.packets)?;
            writeln!(f, "Bytes:   {} Bytes", counters.bytes)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_and_snapshot() {
        let stats = StatsRecorder::new(2);
        stats.record(0, Disposition::Pass, 60);
        stats.record(1, Disposition::Pass, 100);
        stats.record(1, Disposition::Drop, 14);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.get(Disposition::Pass), ActionCounters { packets: 2, bytes: 160 });
        assert_eq!(snapshot.get(Disposition::Drop), ActionCounters { packets: 1, bytes: 14 });
        assert_eq!(snapshot.get(Disposition::Transmit), ActionCounters::default());
        assert_eq!(snapshot.total_packets(), 3);
        assert_eq!(snapshot.total_bytes(), 174);
    }

    #[test]
    fn test_per_shard_layout() {
        let stats = StatsRecorder::new(3);
        stats.record(2, Disposition::Drop, 64);
        stats.record(5, Disposition::Drop, 64); // wraps to shard 2

        let shards = stats.per_shard(Disposition::Drop);
        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0].packets, 0);
        assert_eq!(shards[2], ActionCounters { packets: 2, bytes: 128 });
    }

    #[test]
    fn test_zero_shards_clamped() {
        let stats = StatsRecorder::new(0);
        assert_eq!(stats.shard_count(), 1);
        stats.record(7, Disposition::Aborted, 1);
        assert_eq!(stats.snapshot().get(Disposition::Aborted).packets, 1);
    }

    #[test]
    fn test_shard_is_cache_line_aligned() {
        assert_eq!(std::mem::align_of::<Shard>(), 64);
    }

    #[test]
    fn test_concurrent_recording() {
        let stats = Arc::new(StatsRecorder::new(4));
        thread::scope(|s| {
            for shard in 0..4 {
                let stats = &stats;
                s.spawn(move || {
                    for _ in 0..1000 {
                        stats.record(shard, Disposition::Pass, 10);
                    }
                });
            }
        });

        let pass = stats.snapshot().get(Disposition::Pass);
        assert_eq!(pass.packets, 4000);
        assert_eq!(pass.bytes, 40_000);
    }

    #[test]
    fn test_display_format() {
        let stats = StatsRecorder::new(1);
        stats.record(0, Disposition::Drop, 42);
        let text = stats.snapshot().to_string();

        assert!(text.starts_with("Action 'XDP_ABORTED':\nPackets: 0\nBytes:   0 Bytes\n\n"));
        assert!(text.contains("Action 'XDP_DROP':\nPackets: 1\nBytes:   42 Bytes\n\n"));
        assert!(text.ends_with("Action 'XDP_REDIRECT':\nPackets: 0\nBytes:   0 Bytes\n\n"));
    }

    #[test]
    fn test_export_names() {
        let stats = StatsRecorder::new(1);
        stats.record(0, Disposition::Transmit, 5);
        let export = stats.snapshot().export();

        assert_eq!(export.len(), 10);
        assert!(export.contains(&("xdp_tx_packets".to_string(), 1)));
        assert!(export.contains(&("xdp_tx_bytes".to_string(), 5)));
    }
}
