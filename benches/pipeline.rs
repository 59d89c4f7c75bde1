//! Hot-path benchmarks: wire framing and delay buffer traffic.
//!
//! The per-window budget at the default geometry is 20 ms; everything here
//! should be orders of magnitude below that.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use tiercast::config::AppConfig;
use tiercast::fec::DelayBuffer;
use tiercast::protocol::{AudioPacket, PacketHeader, Tier, TIER_COUNT};

/// A packet with every tier slot filled to capacity, as a steady-state
/// sender emits.
fn full_packet(config: &AppConfig, sequence: i64) -> AudioPacket {
    let capacities = config.tier_capacities();
    let mut payloads: [Bytes; TIER_COUNT] = Default::default();
    for tier in Tier::ALL {
        payloads[tier.index()] = Bytes::from(vec![0xAB; capacities[tier.index()]]);
    }
    AudioPacket {
        header: PacketHeader {
            sequence: sequence as i32,
            timestamp_ms: sequence * config.audio.frame_ms as i64,
        },
        payloads,
    }
}

fn bench_wire_framing(c: &mut Criterion) {
    let config = AppConfig::default();
    let codec = config.packet_codec();
    let packet = full_packet(&config, 42);
    let datagram = codec.encode(&packet).unwrap();

    let mut group = c.benchmark_group("wire");
    group.throughput(Throughput::Bytes(datagram.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| codec.encode(black_box(&packet)).unwrap());
    });
    group.bench_function("decode", |b| {
        b.iter(|| codec.decode(black_box(&datagram)).unwrap());
    });
    group.finish();
}

fn bench_delay_buffer(c: &mut Criterion) {
    let config = AppConfig::default();
    let packets: Vec<AudioPacket> = (0..100).map(|seq| full_packet(&config, seq)).collect();

    c.bench_function("delay_buffer_stream_100", |b| {
        b.iter(|| {
            let mut buffer = DelayBuffer::new(&config);
            let mut windows = 0usize;
            for packet in &packets {
                buffer.fill(black_box(packet));
                while let Some(window) = buffer.next_due() {
                    windows += window.payload.is_some() as usize;
                }
            }
            while let Some(window) = buffer.next_remaining() {
                windows += window.payload.is_some() as usize;
            }
            black_box(windows)
        });
    });
}

criterion_group!(benches, bench_wire_framing, bench_delay_buffer);
criterion_main!(benches);
