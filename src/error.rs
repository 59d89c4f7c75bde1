//! Error types for the streaming pipeline

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Encoder initialization failed: {0}")]
    EncoderInit(String),

    #[error("Decoder initialization failed: {0}")]
    DecoderInit(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Invalid window size: got {got} samples, expected {expected}")]
    InvalidWindowSize { got: usize, expected: usize },
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Socket bind failed: {0}")]
    BindFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Wire format errors
///
/// Raised when a datagram does not parse as a valid audio packet. The
/// receiver drops such datagrams without touching stream state.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Datagram too short: {len} bytes, header needs {min}")]
    Truncated { len: usize, min: usize },

    #[error("Unsupported wire version: {0}")]
    UnsupportedVersion(u8),

    #[error("Negative sequence number: {0}")]
    InvalidSequence(i32),

    #[error("Tier {tier} payload {len} bytes exceeds capacity {capacity}")]
    PayloadTooLarge {
        tier: &'static str,
        len: usize,
        capacity: usize,
    },

    #[error("Datagram length {got} does not match declared payloads ({expected})")]
    LengthMismatch { got: usize, expected: usize },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
