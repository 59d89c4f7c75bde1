//! Playout: turns delayed windows into a continuous PCM stream
//!
//! The orchestrator sits between the delay buffer and the audio sink. Every
//! window the buffer releases goes through exactly one decoder call: real
//! data when a copy survived, concealment when none did. That keeps the
//! decoder's prediction state moving at one window per window, which is what
//! makes concealment blend instead of glitch.

use tracing::warn;

use crate::codec::WindowDecoder;
use crate::fec::delay_buffer::{DelayBuffer, DelayedWindow};

/// One decoded window, ready for the sink.
#[derive(Debug, Clone)]
pub struct DecodedBlock {
    pub sequence: i64,
    /// Interleaved samples for the whole window
    pub samples: Vec<i16>,
    /// True when the window was synthesized by concealment
    pub concealed: bool,
}

/// Counters for playout traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayoutStats {
    pub windows_decoded: u64,
    pub windows_concealed: u64,
    /// Decoder errors; the affected windows were skipped
    pub decode_failures: u64,
}

/// Drives one decoder over the windows a [`DelayBuffer`] releases.
pub struct DecodeOrchestrator<D> {
    decoder: D,
    last_sequence: Option<i64>,
    stats: PlayoutStats,
}

impl<D: WindowDecoder> DecodeOrchestrator<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            last_sequence: None,
            stats: PlayoutStats::default(),
        }
    }

    /// Decode or conceal one window.
    ///
    /// A decoder error is logged and counted but does not stop the stream;
    /// the window is dropped and the next one proceeds.
    pub fn process(&mut self, window: DelayedWindow) -> Option<DecodedBlock> {
        if let Some(last) = self.last_sequence {
            debug_assert_eq!(window.sequence, last + 1, "windows must arrive in order");
        }
        self.last_sequence = Some(window.sequence);

        let (result, concealed) = match &window.payload {
            Some(copy) => (self.decoder.decode_window(copy), false),
            None => (self.decoder.conceal_window(), true),
        };

        match result {
            Ok(samples) => {
                if concealed {
                    self.stats.windows_concealed += 1;
                } else {
                    self.stats.windows_decoded += 1;
                }
                Some(DecodedBlock {
                    sequence: window.sequence,
                    samples,
                    concealed,
                })
            }
            Err(e) => {
                warn!("Failed to decode window {}: {}", window.sequence, e);
                self.stats.decode_failures += 1;
                None
            }
        }
    }

    /// Decode every window currently due and hand the blocks to `emit`.
    pub fn drain_due<F>(&mut self, buffer: &mut DelayBuffer, mut emit: F) -> std::io::Result<()>
    where
        F: FnMut(DecodedBlock) -> std::io::Result<()>,
    {
        while let Some(window) = buffer.next_due() {
            if let Some(block) = self.process(window) {
                emit(block)?;
            }
        }
        Ok(())
    }

    /// Decode the buffered tail after the stream has ended.
    pub fn drain_remaining<F>(
        &mut self,
        buffer: &mut DelayBuffer,
        mut emit: F,
    ) -> std::io::Result<()>
    where
        F: FnMut(DecodedBlock) -> std::io::Result<()>,
    {
        while let Some(window) = buffer.next_remaining() {
            if let Some(block) = self.process(window) {
                emit(block)?;
            }
        }
        Ok(())
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Get statistics
    pub fn stats(&self) -> PlayoutStats {
        self.stats
    }
}
