//! Opus encoder wrapper
//!
//! One instance encodes at one fixed bitrate. The redundancy scheduler owns
//! four of these, one per tier; they are never shared because each carries
//! its own bitrate, and libopus encoder state is tied to its own bitstream
//! history.

use bytes::Bytes;
use opus::{Application, Channels};

use crate::error::CodecError;

/// Opus encoder session pinned to one bitrate.
///
/// Settings follow the deployment this replaces: hard CBR, complexity 10,
/// in-band FEC off (redundancy is handled a layer up). Hard CBR means every
/// successful encode yields exactly `bitrate * frame_ms / 8000` bytes, the
/// tier's capacity.
pub struct OpusEncoder {
    encoder: opus::Encoder,
    /// Interleaved samples expected per encode call
    window_len: usize,
    /// Encoding buffer, sized to the tier capacity (reused to avoid allocations)
    encode_buffer: Vec<u8>,
    /// Windows encoded
    windows_encoded: u64,
    /// Total bytes produced
    bytes_produced: u64,
}

impl OpusEncoder {
    /// Create an encoder for one tier.
    ///
    /// `max_payload` is the tier's capacity and bounds every encode result.
    pub fn new(
        sample_rate: u32,
        channels: u16,
        bitrate: u32,
        max_payload: usize,
        samples_per_window: usize,
    ) -> Result<Self, CodecError> {
        let opus_channels = match channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            _ => {
                return Err(CodecError::EncoderInit(format!(
                    "Unsupported channel count: {channels}"
                )))
            }
        };

        let mut encoder = opus::Encoder::new(sample_rate, opus_channels, Application::Audio)
            .map_err(|e| CodecError::EncoderInit(e.to_string()))?;

        encoder
            .set_bitrate(opus::Bitrate::Bits(bitrate as i32))
            .map_err(|e| CodecError::EncoderInit(format!("Failed to set bitrate: {e}")))?;
        encoder
            .set_vbr(false)
            .map_err(|e| CodecError::EncoderInit(format!("Failed to set CBR: {e}")))?;
        encoder
            .set_complexity(10)
            .map_err(|e| CodecError::EncoderInit(format!("Failed to set complexity: {e}")))?;
        encoder
            .set_inband_fec(false)
            .map_err(|e| CodecError::EncoderInit(format!("Failed to disable FEC: {e}")))?;

        Ok(Self {
            encoder,
            window_len: samples_per_window * channels as usize,
            encode_buffer: vec![0u8; max_payload],
            windows_encoded: 0,
            bytes_produced: 0,
        })
    }

    /// Encode one window of interleaved S16 samples.
    pub fn encode(&mut self, pcm: &[i16]) -> Result<Bytes, CodecError> {
        if pcm.len() != self.window_len {
            return Err(CodecError::InvalidWindowSize {
                got: pcm.len(),
                expected: self.window_len,
            });
        }

        let size = self
            .encoder
            .encode(pcm, &mut self.encode_buffer)
            .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;

        self.windows_encoded += 1;
        self.bytes_produced += size as u64;

        Ok(Bytes::copy_from_slice(&self.encode_buffer[..size]))
    }

    /// Largest payload this encoder can emit.
    pub fn max_payload(&self) -> usize {
        self.encode_buffer.len()
    }

    /// Interleaved samples expected per encode call.
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Get statistics
    pub fn stats(&self) -> EncoderStats {
        EncoderStats {
            windows_encoded: self.windows_encoded,
            bytes_produced: self.bytes_produced,
            average_payload: if self.windows_encoded > 0 {
                self.bytes_produced as f32 / self.windows_encoded as f32
            } else {
                0.0
            },
        }
    }
}

/// Encoder statistics
#[derive(Debug, Clone)]
pub struct EncoderStats {
    pub windows_encoded: u64,
    pub bytes_produced: u64,
    pub average_payload: f32,
}
