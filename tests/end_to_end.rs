//! Full-pipeline tests: scheduler -> wire framing -> delay buffer -> decoder.
//!
//! These run the real Opus codec end to end, with loss injected between the
//! framing and the delay buffer where the network would sit.

use tiercast::codec::OpusDecoder;
use tiercast::config::AppConfig;
use tiercast::fec::{DecodeOrchestrator, DecodedBlock, DelayBuffer, RedundancyScheduler};
use tiercast::protocol::{AudioPacket, Tier};

const STREAM_WINDOWS: i64 = 20;

fn tone_window(config: &AppConfig) -> Vec<i16> {
    let samples = config.audio.samples_per_window();
    let channels = config.audio.channels as usize;
    let mut pcm = vec![0i16; samples * channels];
    for i in 0..samples {
        let t = i as f32 / config.audio.sample_rate as f32;
        let value = (8000.0 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()) as i16;
        for ch in 0..channels {
            pcm[i * channels + ch] = value;
        }
    }
    pcm
}

fn mean_abs(pcm: &[i16]) -> f32 {
    pcm.iter().map(|s| (*s as f32).abs()).sum::<f32>() / pcm.len() as f32
}

/// Encode a tone stream and play every packet through the wire codec and the
/// receive path, except packets and window copies the filters reject.
fn run_pipeline(
    config: &AppConfig,
    drop_packet: impl Fn(i64) -> bool,
    suppress_window: impl Fn(i64) -> bool,
) -> Vec<DecodedBlock> {
    let codec = config.packet_codec();
    let mut scheduler = RedundancyScheduler::new(config).unwrap();
    let mut buffer = DelayBuffer::new(config);
    let decoder = OpusDecoder::new(
        config.audio.sample_rate,
        config.audio.channels,
        config.audio.samples_per_window(),
    )
    .unwrap();
    let mut orchestrator = DecodeOrchestrator::new(decoder);

    let window = tone_window(config);
    let mut blocks = Vec::new();

    for seq in 0..STREAM_WINDOWS {
        let mut packet = scheduler.next_packet(&window).unwrap();
        if drop_packet(seq) {
            continue;
        }
        for tier in Tier::ALL {
            let target = seq - config.tier_lookback(tier);
            if suppress_window(target) {
                packet.payloads[tier.index()] = bytes::Bytes::new();
            }
        }

        // Through the wire format, as the network would carry it
        let datagram = codec.encode(&packet).unwrap();
        let received: AudioPacket = codec.decode(&datagram).unwrap();

        buffer.fill(&received);
        orchestrator
            .drain_due(&mut buffer, |block| {
                blocks.push(block);
                Ok(())
            })
            .unwrap();
    }

    orchestrator
        .drain_remaining(&mut buffer, |block| {
            blocks.push(block);
            Ok(())
        })
        .unwrap();

    blocks
}

#[test]
fn test_clean_stream_decodes_every_window() {
    let config = AppConfig::default();
    let blocks = run_pipeline(&config, |_| false, |_| false);

    assert_eq!(blocks.len() as i64, STREAM_WINDOWS);
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.sequence, i as i64);
        assert!(!block.concealed, "window {} should not be concealed", i);
        assert_eq!(block.samples.len(), config.audio.window_len());
    }
}

#[test]
fn test_periodic_packet_loss_recovers_from_backup_copies() {
    let config = AppConfig::default();
    // Every 5th packet vanishes; every window still has copies in other packets
    let blocks = run_pipeline(&config, |seq| seq % 5 == 2, |_| false);

    assert_eq!(blocks.len() as i64, STREAM_WINDOWS);
    for block in &blocks {
        assert!(
            !block.concealed,
            "window {} should have been recovered from a backup copy",
            block.sequence
        );
    }

    // The recovered audio is real signal, not silence
    let recovered = &blocks[2];
    assert!(mean_abs(&recovered.samples) > 1000.0);
}

#[test]
fn test_burst_loss_conceals_only_the_dead_windows() {
    let config = AppConfig::default();
    // All four copies of windows 4, 9, 14 and 19 are lost
    let blocks = run_pipeline(&config, |_| false, |window| window % 5 == 4);

    assert_eq!(blocks.len() as i64, STREAM_WINDOWS);
    let concealed: Vec<i64> = blocks
        .iter()
        .filter(|b| b.concealed)
        .map(|b| b.sequence)
        .collect();
    assert_eq!(concealed, vec![4, 9, 14, 19]);

    // Concealment still fills the whole window so the stream stays continuous
    for block in &blocks {
        assert_eq!(block.samples.len(), config.audio.window_len());
    }
}

#[test]
fn test_heavy_random_loss_keeps_stream_contiguous() {
    let config = AppConfig::default();
    // Drop a third of all packets in a fixed pattern
    let blocks = run_pipeline(&config, |seq| seq % 3 == 2, |_| false);

    assert_eq!(blocks.len() as i64, STREAM_WINDOWS);
    for (i, block) in blocks.iter().enumerate() {
        assert_eq!(block.sequence, i as i64);
    }
}
