//! Audio Receiver Application
//!
//! Receives redundant audio packets, reassembles each window from the best
//! surviving copy and writes a continuous S16LE PCM stream.
//!
//! Usage: receiver <output.pcm> [config.toml]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiercast::{
    codec::OpusDecoder,
    config::AppConfig,
    fec::{DecodeOrchestrator, DelayBuffer},
    network::{bind_listener, PacketReceiver},
    pcm::PcmWriter,
};

const USAGE: &str = "usage: receiver <output.pcm> [config.toml]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tiercast receiver");

    let output_path = PathBuf::from(std::env::args().nth(1).context(USAGE)?);
    let config_path = std::env::args().nth(2).map(PathBuf::from);

    let config = AppConfig::load(config_path.as_deref())?;

    let socket = bind_listener(config.network.port)?;
    let mut receiver = PacketReceiver::new(socket, config.packet_codec());
    let mut buffer = DelayBuffer::new(&config);
    let decoder = OpusDecoder::new(
        config.audio.sample_rate,
        config.audio.channels,
        config.audio.samples_per_window(),
    )?;
    let mut orchestrator = DecodeOrchestrator::new(decoder);
    let mut writer = PcmWriter::create(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    tracing::info!(
        "Listening on port {}, playout delay {} windows ({} ms), writing {}",
        config.network.port,
        config.playout_delay(),
        config.playout_delay() * config.audio.frame_ms as i64,
        output_path.display()
    );

    let stats_period = Duration::from_secs(5);
    let mut stats_timer =
        tokio::time::interval_at(tokio::time::Instant::now() + stats_period, stats_period);

    loop {
        tokio::select! {
            result = receiver.recv() => {
                if let Some(packet) = result? {
                    buffer.fill(&packet);
                    // Every window whose grace period just ran out goes to
                    // the decoder now; nothing polls in between
                    orchestrator.drain_due(&mut buffer, |block| {
                        writer.write_block(&block.samples)
                    })?;
                }
            }
            _ = stats_timer.tick() => {
                let net = receiver.stats();
                let play = orchestrator.stats();
                tracing::info!(
                    "{} packets in ({} invalid), {} windows out ({} concealed), {} buffered",
                    net.packets_received,
                    net.invalid_packets,
                    play.windows_decoded + play.windows_concealed,
                    play.windows_concealed,
                    buffer.pending()
                );
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    // The playout delay was holding back the newest windows; flush them
    orchestrator.drain_remaining(&mut buffer, |block| writer.write_block(&block.samples))?;
    writer.flush()?;

    let net = receiver.stats();
    let buf = buffer.stats();
    let play = orchestrator.stats();
    tracing::info!(
        "Done: {} packets received, {} windows written ({} concealed, {} copies upgraded), {} samples",
        net.packets_received,
        buf.windows_read,
        play.windows_concealed,
        buf.copies_upgraded,
        writer.samples_written()
    );

    Ok(())
}
