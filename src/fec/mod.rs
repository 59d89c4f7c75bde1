//! Temporal redundancy scheme
//!
//! The loss tolerance in this crate comes from time diversity rather than
//! parity math: every window is encoded at four bitrates and the copies are
//! spread over four packets (offsets 0, 1, 3 and 7). The sender side lives
//! in [`scheduler`] backed by [`history`]; the receiver side reassembles in
//! [`delay_buffer`] and decodes in [`playout`].

pub mod delay_buffer;
pub mod history;
pub mod playout;
pub mod scheduler;

pub use delay_buffer::{DelayBuffer, DelayBufferStats, DelayedWindow};
pub use history::WindowHistory;
pub use playout::{DecodeOrchestrator, DecodedBlock, PlayoutStats};
pub use scheduler::RedundancyScheduler;

/// Position of a window in a fixed-depth ring, `sequence mod depth`.
///
/// Both rings key their slots by sequence number; raw indices never leave
/// the module that owns the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotIndex(usize);

impl SlotIndex {
    pub(crate) fn of(sequence: i64, depth: i64) -> Self {
        SlotIndex(sequence.rem_euclid(depth) as usize)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}
