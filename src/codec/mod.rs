//! Opus codec wrappers
//!
//! One encoder session per quality tier on the sender (each tier keeps its
//! own bitrate and bitstream state), one decoder session on the receiver.
//! The decoder side is abstracted behind [`WindowDecoder`] so the playout
//! path can be exercised without libopus.

pub mod decoder;
pub mod encoder;

pub use decoder::{DecoderStats, OpusDecoder};
pub use encoder::{EncoderStats, OpusEncoder};

use crate::error::CodecError;

/// Decode-or-conceal seam used by the playout path.
///
/// Implementations are stateful: concealment quality depends on the history
/// of prior calls, which is why the caller must invoke exactly one of these
/// per window, in window order.
pub trait WindowDecoder {
    /// Decode one window's worth of samples from real bitstream data.
    fn decode_window(&mut self, payload: &[u8]) -> Result<Vec<i16>, CodecError>;

    /// Synthesize one window's worth of samples with no data (packet loss
    /// concealment).
    fn conceal_window(&mut self) -> Result<Vec<i16>, CodecError>;
}
