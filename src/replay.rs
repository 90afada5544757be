//! Offline frame replay
//!
//! Feeds recorded frames through a [`Dispatcher`] from a fixed pool of worker
//! threads, each owning one counter shard.

use crate::dataplane::Dispatcher;
use crate::{Error, Result};
use std::path::Path;
use std::thread;
use tracing::debug;

/// One recorded frame and the line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub line: usize,
    pub bytes: Vec<u8>,
}

/// Parse hex-encoded frames, one per line.
///
/// Whitespace inside a line is ignored; blank lines and `#` comments are skipped.
pub fn parse_frames(text: &str) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        let hex_text: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if hex_text.is_empty() {
            continue;
        }
        let bytes =
            hex::decode(&hex_text).map_err(|e| Error::Parse(format!("line {}: {}", i + 1, e)))?;
        frames.push(Frame { line: i + 1, bytes });
    }

    Ok(frames)
}

pub fn read_frames<P: AsRef<Path>>(path: P) -> Result<Vec<Frame>> {
    let text = std::fs::read_to_string(path)?;
    parse_frames(&text)
}

/// Classify `frames` across `workers` threads; worker `n` records into shard `n`.
pub fn replay(dispatcher: &Dispatcher, frames: &[Frame], workers: usize) {
    if frames.is_empty() {
        return;
    }
    let chunk_size = frames.len().div_ceil(workers.max(1));

    thread::scope(|s| {
        for (shard, chunk) in frames.chunks(chunk_size).enumerate() {
            s.spawn(move || {
                for frame in chunk {
                    let verdict = dispatcher.classify_detailed(shard, &frame.bytes);
                    debug!(
                        shard,
                        line = frame.line,
                        len = frame.bytes.len(),
                        disposition = %verdict.disposition,
                        outcome = ?verdict.outcome,
                        stage = ?verdict.stage,
                        "frame classified"
                    );
                }
            });
        }
    });
}
