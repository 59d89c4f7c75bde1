//! Audio Sender Application
//!
//! Reads S16LE PCM from a file and streams it over UDP with temporal
//! redundancy: each window goes out at four bitrates spread over four
//! packets.
//!
//! Usage: sender <target-addr> <input.pcm> [config.toml]

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiercast::{
    config::AppConfig,
    fec::RedundancyScheduler,
    network::{bind_sender, PacketSender},
    pcm::PcmReader,
    protocol::Tier,
};

const USAGE: &str = "usage: sender <target-addr> <input.pcm> [config.toml]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tiercast sender");

    let target_addr: SocketAddr = std::env::args()
        .nth(1)
        .context(USAGE)?
        .parse()
        .context("Invalid target address")?;
    let input_path = PathBuf::from(std::env::args().nth(2).context(USAGE)?);
    let config_path = std::env::args().nth(3).map(PathBuf::from);

    let config = AppConfig::load(config_path.as_deref())?;

    let mut reader = PcmReader::open(&input_path, config.audio.window_len())
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let mut scheduler = RedundancyScheduler::new(&config)?;
    let socket = bind_sender().await?;
    let mut sender = PacketSender::new(socket, target_addr, config.packet_codec());

    tracing::info!(
        "Streaming {} to {} ({} Hz, {} ch, {} ms windows)",
        input_path.display(),
        target_addr,
        config.audio.sample_rate,
        config.audio.channels,
        config.audio.frame_ms
    );
    for tier in Tier::ALL {
        tracing::info!(
            "  {} tier: {} kbit/s, {} window(s) back",
            tier.label(),
            config.tier_bitrate(tier) / 1000,
            config.tier_lookback(tier)
        );
    }

    let loss_percent = config.network.simulated_loss_percent;
    if loss_percent > 0 {
        tracing::warn!("Simulating {}% packet loss", loss_percent);
    }

    // Absolute-deadline pacing: tick n fires at start + n * window, so a
    // slow iteration does not push every later window back.
    let mut ticker = tokio::time::interval(config.audio.frame_duration());

    loop {
        ticker.tick().await;

        let Some(window) = reader.read_window()? else {
            break;
        };
        let packet = scheduler.next_packet(&window)?;

        if loss_percent > 0 && rand::thread_rng().gen_range(0..100) < loss_percent {
            continue;
        }
        let wire_bytes = sender.send(&packet).await?;
        tracing::debug!(
            "Window {}: {} PCM bytes -> {} on the wire",
            packet.header.sequence,
            window.len() * 2,
            wire_bytes
        );

        let sent = sender.stats().packets_sent;
        if sent % 250 == 0 {
            let stats = sender.stats();
            tracing::info!(
                "Sent {} packets, {:.1} KB on the wire",
                stats.packets_sent,
                stats.bytes_sent as f64 / 1024.0
            );
        }
    }

    let stats = sender.stats();
    tracing::info!(
        "End of stream: {} windows in {} packets, {:.1} KB total",
        scheduler.sequence(),
        stats.packets_sent,
        stats.bytes_sent as f64 / 1024.0
    );
    for tier in Tier::ALL {
        let enc = scheduler.encoder_stats(tier);
        tracing::info!(
            "  {} tier: {} windows encoded, avg {:.0} bytes",
            tier.label(),
            enc.windows_encoded,
            enc.average_payload
        );
    }

    Ok(())
}
