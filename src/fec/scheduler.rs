//! Sender-side redundancy scheduling
//!
//! Every PCM window is encoded up to four times, once per tier, but the
//! copies ride in different packets. Packet `n` carries:
//!
//! ```text
//! slot        window   bitrate (defaults)
//! primary     n        192 kbit/s
//! secondary   n - 1    128 kbit/s
//! quaternary  n - 3     96 kbit/s
//! octonary    n - 7     64 kbit/s
//! ```
//!
//! so window `n` is spread across packets `n`, `n+1`, `n+3` and `n+7`.
//! Losing any three of those still leaves one decodable copy.

use chrono::Utc;

use crate::codec::{EncoderStats, OpusEncoder};
use crate::config::AppConfig;
use crate::error::CodecError;
use crate::fec::history::WindowHistory;
use crate::protocol::{AudioPacket, PacketHeader, Tier, TIER_COUNT};

/// Builds one multi-tier packet per ingest window.
pub struct RedundancyScheduler {
    history: WindowHistory,
    /// One encoder per tier, in wire order. Each keeps its own Opus state
    /// so the tiers form independent streams.
    encoders: Vec<OpusEncoder>,
    lookbacks: [i64; TIER_COUNT],
    window_len: usize,
    frame_ms: i64,
    /// Sequence of the next ingest window
    sequence: i64,
    /// Wall-clock milliseconds when the stream started
    epoch_ms: i64,
}

impl RedundancyScheduler {
    pub fn new(config: &AppConfig) -> Result<Self, CodecError> {
        let capacities = config.tier_capacities();
        let mut encoders = Vec::with_capacity(TIER_COUNT);
        for tier in Tier::ALL {
            encoders.push(OpusEncoder::new(
                config.audio.sample_rate,
                config.audio.channels,
                config.tier_bitrate(tier),
                capacities[tier.index()],
                config.audio.samples_per_window(),
            )?);
        }

        Ok(Self {
            history: WindowHistory::new(config.redundancy.depth, config.audio.window_len()),
            encoders,
            lookbacks: config.lookbacks(),
            window_len: config.audio.window_len(),
            frame_ms: config.audio.frame_ms as i64,
            sequence: 0,
            epoch_ms: Utc::now().timestamp_millis(),
        })
    }

    /// Ingest one window and build the packet for it.
    ///
    /// Tiers whose lookback reaches before the start of the stream are left
    /// empty, so the first `max_lookback` packets are short. An encoder
    /// failure aborts the whole packet and leaves the sequence counter
    /// untouched; nothing partial goes on the wire.
    pub fn next_packet(&mut self, pcm: &[i16]) -> Result<AudioPacket, CodecError> {
        if pcm.len() != self.window_len {
            return Err(CodecError::InvalidWindowSize {
                got: pcm.len(),
                expected: self.window_len,
            });
        }

        let sequence = self.sequence;
        self.history.store(sequence, pcm);

        let mut payloads: [bytes::Bytes; TIER_COUNT] = Default::default();
        for tier in Tier::ALL {
            let target = sequence - self.lookbacks[tier.index()];
            if target < 0 {
                continue;
            }
            payloads[tier.index()] = self.encoders[tier.index()].encode(self.history.get(target))?;
        }

        self.sequence += 1;
        Ok(AudioPacket {
            header: PacketHeader {
                sequence: sequence as i32,
                timestamp_ms: self.epoch_ms + sequence * self.frame_ms,
            },
            payloads,
        })
    }

    /// Sequence the next ingest window will get.
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Statistics for one tier's encoder.
    pub fn encoder_stats(&self, tier: Tier) -> EncoderStats {
        self.encoders[tier.index()].stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::OpusDecoder;

    fn tone_window(config: &AppConfig, amplitude: f32) -> Vec<i16> {
        let samples = config.audio.samples_per_window();
        let channels = config.audio.channels as usize;
        let mut pcm = vec![0i16; samples * channels];
        for i in 0..samples {
            let t = i as f32 / config.audio.sample_rate as f32;
            let value = (amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()) as i16;
            for ch in 0..channels {
                pcm[i * channels + ch] = value;
            }
        }
        pcm
    }

    fn mean_abs(pcm: &[i16]) -> f32 {
        pcm.iter().map(|s| (*s as f32).abs()).sum::<f32>() / pcm.len() as f32
    }

    #[test]
    fn test_warmup_leaves_deep_slots_empty() {
        let config = AppConfig::default();
        let mut scheduler = RedundancyScheduler::new(&config).unwrap();
        let window = tone_window(&config, 8000.0);

        let packet = scheduler.next_packet(&window).unwrap();
        assert!(!packet.payload(Tier::Primary).is_empty());
        assert!(packet.payload(Tier::Secondary).is_empty());
        assert!(packet.payload(Tier::Quaternary).is_empty());
        assert!(packet.payload(Tier::Octonary).is_empty());

        let packet = scheduler.next_packet(&window).unwrap();
        assert!(!packet.payload(Tier::Primary).is_empty());
        assert!(!packet.payload(Tier::Secondary).is_empty());
        assert!(packet.payload(Tier::Quaternary).is_empty());
        assert!(packet.payload(Tier::Octonary).is_empty());
    }

    #[test]
    fn test_all_tiers_populated_after_warmup() {
        let config = AppConfig::default();
        let capacities = config.tier_capacities();
        let mut scheduler = RedundancyScheduler::new(&config).unwrap();
        let window = tone_window(&config, 8000.0);

        let mut last = None;
        for _ in 0..8 {
            last = Some(scheduler.next_packet(&window).unwrap());
        }
        let packet = last.unwrap();

        // CBR pins every copy to its tier budget, so lengths are strictly
        // ordered and length alone identifies the better copy downstream.
        for tier in Tier::ALL {
            assert_eq!(
                packet.payload(tier).len(),
                capacities[tier.index()],
                "tier {}",
                tier.label()
            );
        }
    }

    #[test]
    fn test_lookback_slots_carry_older_windows() {
        let config = AppConfig::default();
        let mut scheduler = RedundancyScheduler::new(&config).unwrap();

        // Window 0 silent, window 1 loud: packet 1's secondary slot must
        // hold window 0, so it should decode quiet while primary is loud.
        let silence = vec![0i16; config.audio.window_len()];
        let tone = tone_window(&config, 8000.0);
        scheduler.next_packet(&silence).unwrap();
        let packet = scheduler.next_packet(&tone).unwrap();

        let mut primary_decoder = OpusDecoder::new(
            config.audio.sample_rate,
            config.audio.channels,
            config.audio.samples_per_window(),
        )
        .unwrap();
        let mut secondary_decoder = OpusDecoder::new(
            config.audio.sample_rate,
            config.audio.channels,
            config.audio.samples_per_window(),
        )
        .unwrap();

        let loud = primary_decoder.decode(packet.payload(Tier::Primary)).unwrap();
        let quiet = secondary_decoder
            .decode(packet.payload(Tier::Secondary))
            .unwrap();

        assert!(mean_abs(&loud) > 500.0, "primary should carry the tone");
        assert!(mean_abs(&quiet) < 100.0, "secondary should carry the silence");
    }

    #[test]
    fn test_sequence_and_timestamp_advance() {
        let config = AppConfig::default();
        let mut scheduler = RedundancyScheduler::new(&config).unwrap();
        let window = tone_window(&config, 4000.0);

        let first = scheduler.next_packet(&window).unwrap();
        let second = scheduler.next_packet(&window).unwrap();

        assert_eq!(first.header.sequence, 0);
        assert_eq!(second.header.sequence, 1);
        assert_eq!(
            second.header.timestamp_ms - first.header.timestamp_ms,
            config.audio.frame_ms as i64
        );
        assert_eq!(scheduler.sequence(), 2);
    }

    #[test]
    fn test_wrong_window_size_leaves_state_untouched() {
        let config = AppConfig::default();
        let mut scheduler = RedundancyScheduler::new(&config).unwrap();

        let result = scheduler.next_packet(&[0i16; 10]);
        assert!(matches!(
            result,
            Err(CodecError::InvalidWindowSize { got: 10, .. })
        ));
        assert_eq!(scheduler.sequence(), 0);

        let window = tone_window(&config, 4000.0);
        let packet = scheduler.next_packet(&window).unwrap();
        assert_eq!(packet.header.sequence, 0);
    }
}
