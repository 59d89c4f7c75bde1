//! Configuration for the sender and receiver
//!
//! The whole surface is symmetric: both sides must load the same audio
//! geometry and tier ladder or the derived sequence offsets and payload
//! capacities will not line up. Values can come from a TOML file (explicit
//! path, or the platform config directory) and fall back to the defaults
//! in [`crate::constants`]: 48 kHz stereo, 20 ms windows, 192/128/96/64
//! kbit/s tiers at lookbacks 0/1/3/7, 13-slot buffers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Error, Result};
use crate::protocol::{PacketCodec, Tier, TIER_COUNT};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub redundancy: RedundancyConfig,
    pub network: NetworkConfig,
}

/// Audio geometry. Must be Opus-legal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz (8000, 12000, 16000, 24000 or 48000)
    pub sample_rate: u32,
    /// Channel count (1 or 2)
    pub channels: u16,
    /// Window duration in milliseconds (5, 10, 20, 40 or 60)
    pub frame_ms: u32,
}

/// One rung of the tier ladder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierParams {
    /// Target bitrate in bits per second
    pub bitrate: u32,
    /// How many windows this tier's copy trails the live window by
    pub lookback: u32,
}

/// The redundancy scheme: tier ladder plus buffer geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedundancyConfig {
    /// Tier ladder in wire order (bitrates strictly decreasing,
    /// lookbacks strictly increasing from 0)
    pub tiers: [TierParams; TIER_COUNT],
    /// Ring depth of the sender history and the receiver delay buffer,
    /// in windows; must exceed the largest lookback
    pub depth: usize,
    /// Read-cursor lag in windows; the end-to-end latency knob.
    /// Defaults to the largest lookback so every backup copy can arrive
    /// before its window is read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playout_delay: Option<u32>,
}

/// Transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Destination/listen UDP port
    pub port: u16,
    /// Sender-side testing aid: percentage of packets to drop instead of
    /// sending (0 disables)
    pub simulated_loss_percent: u8,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: constants::DEFAULT_SAMPLE_RATE,
            channels: constants::DEFAULT_CHANNELS,
            frame_ms: constants::DEFAULT_FRAME_MS,
        }
    }
}

impl Default for RedundancyConfig {
    fn default() -> Self {
        let mut tiers = [TierParams {
            bitrate: 0,
            lookback: 0,
        }; TIER_COUNT];
        for (i, tier) in tiers.iter_mut().enumerate() {
            tier.bitrate = constants::DEFAULT_TIER_BITRATES[i];
            tier.lookback = constants::DEFAULT_TIER_LOOKBACKS[i];
        }
        Self {
            tiers,
            depth: constants::DEFAULT_BUFFER_DEPTH,
            playout_delay: None,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_UDP_PORT,
            simulated_loss_percent: 0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            redundancy: RedundancyConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl AudioConfig {
    /// Samples per window, per channel.
    pub fn samples_per_window(&self) -> usize {
        (self.sample_rate as usize * self.frame_ms as usize) / 1000
    }

    /// Interleaved samples per window (all channels).
    pub fn window_len(&self) -> usize {
        self.samples_per_window() * self.channels as usize
    }

    /// Raw S16LE bytes per window.
    pub fn window_bytes(&self) -> usize {
        self.window_len() * std::mem::size_of::<i16>()
    }

    /// Window duration as a [`Duration`].
    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms as u64)
    }
}

impl AppConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist and parse. With no path, the platform
    /// config directory is consulted and compiled defaults are used if no
    /// file is present there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Self::from_toml_str(&text)
            }
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::info!("Loading config from {}", path.display());
                    let text = std::fs::read_to_string(&path)?;
                    Self::from_toml_str(&text)
                }
                None => {
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            },
        }
    }

    /// Platform config file location (e.g. ~/.config/tiercast/config.toml).
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tiercast")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Bitrate of the given tier.
    pub fn tier_bitrate(&self, tier: Tier) -> u32 {
        self.redundancy.tiers[tier.index()].bitrate
    }

    /// Lookback offset of the given tier, in windows.
    pub fn tier_lookback(&self, tier: Tier) -> i64 {
        self.redundancy.tiers[tier.index()].lookback as i64
    }

    /// All lookback offsets in wire order.
    pub fn lookbacks(&self) -> [i64; TIER_COUNT] {
        let mut out = [0i64; TIER_COUNT];
        for tier in Tier::ALL {
            out[tier.index()] = self.tier_lookback(tier);
        }
        out
    }

    /// Largest lookback in the ladder.
    pub fn max_lookback(&self) -> i64 {
        self.lookbacks()[TIER_COUNT - 1]
    }

    /// Effective read-cursor lag in windows.
    pub fn playout_delay(&self) -> i64 {
        self.redundancy
            .playout_delay
            .map(|d| d as i64)
            .unwrap_or_else(|| self.max_lookback())
    }

    /// Worst-case encoded bytes per window for each tier.
    ///
    /// CBR at bitrate B over a frame of F milliseconds yields exactly
    /// B * F / 8000 bytes.
    pub fn tier_capacities(&self) -> [usize; TIER_COUNT] {
        let mut out = [0usize; TIER_COUNT];
        for tier in Tier::ALL {
            let bitrate = self.tier_bitrate(tier) as usize;
            out[tier.index()] = bitrate * self.audio.frame_ms as usize / 8000;
        }
        out
    }

    /// Wire codec for this tier ladder.
    pub fn packet_codec(&self) -> PacketCodec {
        PacketCodec::new(self.tier_capacities())
    }

    /// Check the invariants the pipeline depends on.
    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        if ![8000, 12000, 16000, 24000, 48000].contains(&audio.sample_rate) {
            return Err(Error::Config(format!(
                "sample_rate {} is not Opus-legal",
                audio.sample_rate
            )));
        }
        if !(1..=2).contains(&audio.channels) {
            return Err(Error::Config(format!(
                "channels must be 1 or 2, got {}",
                audio.channels
            )));
        }
        if ![5, 10, 20, 40, 60].contains(&audio.frame_ms) {
            return Err(Error::Config(format!(
                "frame_ms {} is not an Opus frame duration",
                audio.frame_ms
            )));
        }

        let capacities = self.tier_capacities();
        for pair in capacities.windows(2) {
            if pair[1] >= pair[0] {
                return Err(Error::Config(format!(
                    "tier capacities must be strictly decreasing, got {capacities:?}"
                )));
            }
        }
        if capacities[0] > u16::MAX as usize {
            return Err(Error::Config(format!(
                "primary tier capacity {} does not fit a u16 length field",
                capacities[0]
            )));
        }

        let lookbacks = self.lookbacks();
        if lookbacks[0] != 0 {
            return Err(Error::Config(format!(
                "primary tier lookback must be 0, got {}",
                lookbacks[0]
            )));
        }
        for pair in lookbacks.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::Config(format!(
                    "tier lookbacks must be strictly increasing, got {lookbacks:?}"
                )));
            }
        }

        let depth = self.redundancy.depth;
        if depth as i64 <= self.max_lookback() {
            return Err(Error::Config(format!(
                "buffer depth {} must exceed the largest lookback {}",
                depth,
                self.max_lookback()
            )));
        }
        if self.playout_delay() >= depth as i64 {
            return Err(Error::Config(format!(
                "playout_delay {} must be below the buffer depth {}",
                self.playout_delay(),
                depth
            )));
        }

        if self.network.simulated_loss_percent > 100 {
            return Err(Error::Config(format!(
                "simulated_loss_percent must be 0..=100, got {}",
                self.network.simulated_loss_percent
            )));
        }

        let datagram = self.packet_codec().max_datagram_len();
        if datagram > constants::MAX_DATAGRAM_SIZE {
            tracing::warn!(
                "worst-case datagram {} bytes exceeds the usual {}-byte MTU budget; \
                 expect IP fragmentation",
                datagram,
                constants::MAX_DATAGRAM_SIZE
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();

        assert_eq!(config.audio.samples_per_window(), 960);
        assert_eq!(config.audio.window_len(), 1920);
        assert_eq!(config.audio.window_bytes(), 3840);
        assert_eq!(config.tier_capacities(), [480, 320, 240, 160]);
        assert_eq!(config.lookbacks(), [0, 1, 3, 7]);
        assert_eq!(config.max_lookback(), 7);
        assert_eq!(config.playout_delay(), 7);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = AppConfig::from_toml_str(
            r#"
            [network]
            port = 9001

            [redundancy]
            depth = 16
            playout_delay = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.network.port, 9001);
        assert_eq!(config.redundancy.depth, 16);
        assert_eq!(config.playout_delay(), 5);
        // Untouched sections keep their defaults
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.tier_capacities(), [480, 320, 240, 160]);
    }

    #[test]
    fn test_tier_ladder_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            [redundancy]
            depth = 10
            tiers = [
                { bitrate = 96000, lookback = 0 },
                { bitrate = 64000, lookback = 1 },
                { bitrate = 48000, lookback = 2 },
                { bitrate = 32000, lookback = 4 },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.tier_capacities(), [240, 160, 120, 80]);
        assert_eq!(config.max_lookback(), 4);
    }

    #[test]
    fn test_rejects_shallow_depth() {
        let mut config = AppConfig::default();
        config.redundancy.depth = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_decreasing_bitrates() {
        let mut config = AppConfig::default();
        config.redundancy.tiers[1].bitrate = 192_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nonzero_primary_lookback() {
        let mut config = AppConfig::default();
        config.redundancy.tiers[0].lookback = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unordered_lookbacks() {
        let mut config = AppConfig::default();
        config.redundancy.tiers[2].lookback = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_audio_geometry() {
        let mut config = AppConfig::default();
        config.audio.sample_rate = 44100;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.audio.channels = 3;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.audio.frame_ms = 25;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_playout_delay_at_depth() {
        let mut config = AppConfig::default();
        config.redundancy.playout_delay = Some(13);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.tier_capacities(), config.tier_capacities());
        assert_eq!(parsed.redundancy.depth, config.redundancy.depth);
        assert_eq!(parsed.network.port, config.network.port);
    }
}
