//! # Tiercast
//!
//! Loss-tolerant PCM audio streaming over UDP using temporal redundancy.
//!
//! Every 20 ms window is encoded at four bitrates and the copies ride in
//! four different packets, offset 0, 1, 3 and 7 windows into the future.
//! A receiver that misses a packet usually still holds a lower-bitrate
//! copy of its window; only a burst that kills all four packets forces
//! the decoder into concealment. No retransmission, no parity packets,
//! no extra round trips.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────── SENDER ───────────────────────────────┐
//! │                                                                     │
//! │  PCM source ──▶ 20 ms window n ──▶ WindowHistory (ring)             │
//! │                                         │                           │
//! │          ┌──────────────┬───────────────┼──────────────┐            │
//! │          ▼              ▼               ▼              ▼            │
//! │    ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐       │
//! │    │ Opus enc │   │ Opus enc │   │ Opus enc │   │ Opus enc │       │
//! │    │ 192 kb/s │   │ 128 kb/s │   │  96 kb/s │   │  64 kb/s │       │
//! │    │ window n │   │ wnd n-1  │   │ wnd n-3  │   │ wnd n-7  │       │
//! │    └────┬─────┘   └────┬─────┘   └────┬─────┘   └────┬─────┘       │
//! │         └──────────────┴───────┬──────┴──────────────┘             │
//! │                                ▼                                   │
//! │        [ver│seq│ts│len×4│payloads]   one datagram per window       │
//! └────────────────────────────────┬────────────────────────────────────┘
//!                                  │ UDP
//! ┌────────────────────────────────▼────────────────────────────────────┐
//! │                             RECEIVER                                │
//! │                                                                     │
//! │  PacketReceiver ──▶ DelayBuffer (ring, reads behind the newest      │
//! │                         │         sequence, keeps the longest       │
//! │                         │         copy per window)                  │
//! │                         ▼                                           │
//! │                 DecodeOrchestrator ──▶ Opus decode / conceal        │
//! │                         │                                           │
//! │                         ▼                                           │
//! │                    PCM sink (S16LE)                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod fec;
pub mod network;
pub mod pcm;
pub mod protocol;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    use crate::protocol::TIER_COUNT;

    /// Default sample rate for audio processing
    pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

    /// Default channel count (stereo)
    pub const DEFAULT_CHANNELS: u16 = 2;

    /// Default window duration in milliseconds
    pub const DEFAULT_FRAME_MS: u32 = 20;

    /// Default tier bitrates in bits per second, best first
    pub const DEFAULT_TIER_BITRATES: [u32; TIER_COUNT] =
        [192_000, 128_000, 96_000, 64_000];

    /// Default tier lookbacks in windows: which past window each slot carries
    pub const DEFAULT_TIER_LOOKBACKS: [u32; TIER_COUNT] = [0, 1, 3, 7];

    /// Default ring depth, in windows, of the sender history and the
    /// receiver delay buffer
    pub const DEFAULT_BUFFER_DEPTH: usize = 13;

    /// Default UDP port for audio streaming
    pub const DEFAULT_UDP_PORT: u16 = 8080;

    /// Maximum datagram size before IP fragmentation (MTU - IP/UDP headers)
    pub const MAX_DATAGRAM_SIZE: usize = 1472;
}
