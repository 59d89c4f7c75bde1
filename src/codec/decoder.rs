//! Opus decoder wrapper
//!
//! Provides Opus decoding with packet loss concealment. One session serves
//! the whole stream: concealment extrapolates from the decoder's internal
//! state, so every window must pass through the same instance, in order.

use opus::Channels;

use crate::codec::WindowDecoder;
use crate::error::CodecError;

/// Opus decoder session.
pub struct OpusDecoder {
    decoder: opus::Decoder,
    channels: u16,
    /// Samples per window, per channel
    samples_per_window: usize,
    /// Decoding buffer (reused to avoid allocations)
    decode_buffer: Vec<i16>,
    /// Windows decoded from real data
    windows_decoded: u64,
    /// Windows synthesized by concealment
    windows_concealed: u64,
}

impl OpusDecoder {
    /// Create a decoder for the configured audio geometry.
    pub fn new(
        sample_rate: u32,
        channels: u16,
        samples_per_window: usize,
    ) -> Result<Self, CodecError> {
        let opus_channels = match channels {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            _ => {
                return Err(CodecError::DecoderInit(format!(
                    "Unsupported channel count: {channels}"
                )))
            }
        };

        let decoder = opus::Decoder::new(sample_rate, opus_channels)
            .map_err(|e| CodecError::DecoderInit(e.to_string()))?;

        Ok(Self {
            decoder,
            channels,
            samples_per_window,
            decode_buffer: vec![0i16; samples_per_window * channels as usize],
            windows_decoded: 0,
            windows_concealed: 0,
        })
    }

    /// Decode one encoded window to interleaved samples.
    pub fn decode(&mut self, payload: &[u8]) -> Result<Vec<i16>, CodecError> {
        let samples = self
            .decoder
            .decode(payload, &mut self.decode_buffer, false)
            .map_err(|e| CodecError::DecodingFailed(e.to_string()))?;

        self.windows_decoded += 1;
        Ok(self.decode_buffer[..samples * self.channels as usize].to_vec())
    }

    /// Synthesize one window with no payload.
    ///
    /// libopus treats an empty packet as loss and extrapolates from its
    /// internal state; the output length request is the window size.
    pub fn conceal(&mut self) -> Result<Vec<i16>, CodecError> {
        let samples = self
            .decoder
            .decode(&[], &mut self.decode_buffer, false)
            .map_err(|e| CodecError::DecodingFailed(e.to_string()))?;

        self.windows_concealed += 1;
        Ok(self.decode_buffer[..samples * self.channels as usize].to_vec())
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Samples per window, per channel.
    pub fn samples_per_window(&self) -> usize {
        self.samples_per_window
    }

    /// Get statistics
    pub fn stats(&self) -> DecoderStats {
        DecoderStats {
            windows_decoded: self.windows_decoded,
            windows_concealed: self.windows_concealed,
        }
    }
}

impl WindowDecoder for OpusDecoder {
    fn decode_window(&mut self, payload: &[u8]) -> Result<Vec<i16>, CodecError> {
        self.decode(payload)
    }

    fn conceal_window(&mut self) -> Result<Vec<i16>, CodecError> {
        self.conceal()
    }
}

/// Decoder statistics
#[derive(Debug, Clone)]
pub struct DecoderStats {
    pub windows_decoded: u64,
    pub windows_concealed: u64,
}
