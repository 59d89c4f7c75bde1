//! Rolling history of raw PCM windows on the sender
//!
//! The scheduler re-encodes windows it has already seen, so the last
//! `depth` windows are kept verbatim, indexed by sequence modulo depth.
//! Depth must exceed the largest lookback or a slot would be overwritten
//! before its last re-encode.

use super::SlotIndex;

/// Fixed-depth ring of raw PCM windows.
pub struct WindowHistory {
    /// One pre-allocated window per slot
    windows: Vec<Vec<i16>>,
    depth: usize,
    /// Interleaved samples per window
    window_len: usize,
}

impl WindowHistory {
    pub fn new(depth: usize, window_len: usize) -> Self {
        Self {
            windows: vec![vec![0i16; window_len]; depth],
            depth,
            window_len,
        }
    }

    /// Record the window for `sequence`, overwriting whatever the slot held
    /// `depth` windows ago.
    pub fn store(&mut self, sequence: i64, pcm: &[i16]) {
        debug_assert_eq!(pcm.len(), self.window_len);
        let slot = SlotIndex::of(sequence, self.depth as i64);
        self.windows[slot.index()].copy_from_slice(pcm);
    }

    /// Fetch the window stored for `sequence`.
    ///
    /// Only valid for sequences within `depth` of the most recent store;
    /// older sequences alias newer windows.
    pub fn get(&self, sequence: i64) -> &[i16] {
        let slot = SlotIndex::of(sequence, self.depth as i64);
        &self.windows[slot.index()]
    }
}
