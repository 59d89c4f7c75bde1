//! Receiver-side delay buffer
//!
//! Copies of each window arrive spread across several packets, so the
//! receiver holds a ring of `depth` payload slots and reads `playout_delay`
//! windows behind the newest primary sequence. Each slot keeps the longest
//! copy seen for its window; CBR ties payload length to tier bitrate, so
//! the longest copy is always the highest-quality one.
//!
//! Reads are pulled with [`DelayBuffer::next_due`], which yields nothing
//! while a window is still inside its grace period, and
//! [`DelayBuffer::next_remaining`], which flushes the tail once the stream
//! has ended. Copies for already-read windows are discarded, as are copies
//! so far ahead that they would alias an unread slot.

use bytes::Bytes;

use super::SlotIndex;
use crate::config::AppConfig;
use crate::protocol::{AudioPacket, Tier, TIER_COUNT};

/// One window pulled out of the buffer, in playout order.
#[derive(Debug, Clone)]
pub struct DelayedWindow {
    pub sequence: i64,
    /// Best copy received, or `None` if every copy was lost.
    pub payload: Option<Bytes>,
}

/// Counters for buffer traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelayBufferStats {
    /// Copies written into a slot (including upgrades)
    pub copies_stored: u64,
    /// Stored copies that replaced a shorter one
    pub copies_upgraded: u64,
    /// Copies for windows already read
    pub copies_stale: u64,
    /// Copies too far ahead of the cursor to store
    pub copies_ahead: u64,
    /// Windows handed to the caller
    pub windows_read: u64,
    /// Read windows with no surviving copy
    pub windows_missing: u64,
}

/// Ring of encoded windows between the network and the decoder.
pub struct DelayBuffer {
    slots: Vec<Vec<u8>>,
    depth: i64,
    lookbacks: [i64; TIER_COUNT],
    playout_delay: i64,
    /// Next sequence to read; set by the first packet
    cursor: Option<i64>,
    /// Highest primary sequence seen
    highest: i64,
    stats: DelayBufferStats,
}

impl DelayBuffer {
    pub fn new(config: &AppConfig) -> Self {
        let depth = config.redundancy.depth;
        let max_payload = config.tier_capacities()[0];
        Self {
            slots: (0..depth).map(|_| Vec::with_capacity(max_payload)).collect(),
            depth: depth as i64,
            lookbacks: config.lookbacks(),
            playout_delay: config.playout_delay(),
            cursor: None,
            highest: 0,
            stats: DelayBufferStats::default(),
        }
    }

    /// Spread a packet's copies into their window slots.
    ///
    /// The first packet pins the read cursor to its sequence. Empty slots
    /// are skipped; non-empty copies land at `sequence - lookback` and only
    /// stick if they are longer than what the slot already holds.
    pub fn fill(&mut self, packet: &AudioPacket) {
        let sequence = i64::from(packet.header.sequence);
        let cursor = match self.cursor {
            Some(cursor) => {
                if sequence > self.highest {
                    self.highest = sequence;
                }
                cursor
            }
            None => {
                self.cursor = Some(sequence);
                self.highest = sequence;
                sequence
            }
        };

        for tier in Tier::ALL {
            let copy = packet.payload(tier);
            if copy.is_empty() {
                continue;
            }
            let target = sequence - self.lookbacks[tier.index()];
            if target < cursor {
                self.stats.copies_stale += 1;
                continue;
            }
            if target >= cursor + self.depth {
                self.stats.copies_ahead += 1;
                continue;
            }
            let slot = SlotIndex::of(target, self.depth);
            let held = &mut self.slots[slot.index()];
            if copy.len() > held.len() {
                if !held.is_empty() {
                    self.stats.copies_upgraded += 1;
                }
                held.clear();
                held.extend_from_slice(copy);
                self.stats.copies_stored += 1;
            }
        }
    }

    /// Pull the next window if its grace period has elapsed.
    ///
    /// A window is due once packets `playout_delay` ahead of it have had a
    /// chance to arrive, i.e. the cursor trails the highest sequence by at
    /// least that much.
    pub fn next_due(&mut self) -> Option<DelayedWindow> {
        let cursor = self.cursor?;
        if cursor + self.playout_delay > self.highest {
            return None;
        }
        Some(self.take_window(cursor))
    }

    /// Pull the next window regardless of grace period. Flushes the trailing
    /// `playout_delay` windows once the sender has stopped.
    pub fn next_remaining(&mut self) -> Option<DelayedWindow> {
        let cursor = self.cursor?;
        if cursor > self.highest {
            return None;
        }
        Some(self.take_window(cursor))
    }

    fn take_window(&mut self, sequence: i64) -> DelayedWindow {
        let slot = SlotIndex::of(sequence, self.depth);
        let held = &mut self.slots[slot.index()];
        let payload = if held.is_empty() {
            self.stats.windows_missing += 1;
            None
        } else {
            let copy = Bytes::copy_from_slice(held);
            held.clear();
            Some(copy)
        };
        self.stats.windows_read += 1;
        self.cursor = Some(sequence + 1);
        DelayedWindow { sequence, payload }
    }

    /// Windows between the cursor and the newest sequence, inclusive.
    pub fn pending(&self) -> i64 {
        match self.cursor {
            Some(cursor) if self.highest >= cursor => self.highest - cursor + 1,
            _ => 0,
        }
    }

    /// Get statistics
    pub fn stats(&self) -> DelayBufferStats {
        self.stats
    }
}
