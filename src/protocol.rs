//! Wire format for redundant audio packets
//!
//! Every datagram carries one header plus four encoded copies of *different*
//! windows, one per quality tier. Slot order on the wire is the tier ladder
//! (highest bitrate first). Only the used prefix of each payload is
//! transmitted; the header declares the four lengths explicitly.
//!
//! Layout (little-endian):
//!
//! ```text
//! offset 0   u8     wire version
//! offset 1   i32    sequence (the primary window's sequence, >= 0)
//! offset 5   i64    timestamp in milliseconds since the sender's epoch
//! offset 13  u16x4  payload lengths, one per tier
//! offset 21  ...    payloads, concatenated in tier order
//! ```
//!
//! The sequence numbers of the non-primary slots are never transmitted: the
//! receiver derives them from the header sequence and the per-tier lookback
//! offsets, which both sides take from the same configuration.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::FrameError;

/// Current wire version. Datagrams with any other leading byte are dropped.
pub const WIRE_VERSION: u8 = 1;

/// Number of quality tiers (and payload slots per packet).
pub const TIER_COUNT: usize = 4;

/// Fixed header size: version + sequence + timestamp + four lengths.
pub const HEADER_LEN: usize = 1 + 4 + 8 + 2 * TIER_COUNT;

/// Quality tier of one encoded copy.
///
/// Each tier encodes at a successively lower bitrate and trails the live
/// window by a successively larger lookback, so the four copies of a window
/// spread across four different packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Primary,
    Secondary,
    Quaternary,
    Octonary,
}

impl Tier {
    /// All tiers in wire order (highest bitrate first).
    pub const ALL: [Tier; TIER_COUNT] = [
        Tier::Primary,
        Tier::Secondary,
        Tier::Quaternary,
        Tier::Octonary,
    ];

    /// Slot position of this tier in a packet.
    pub fn index(self) -> usize {
        match self {
            Tier::Primary => 0,
            Tier::Secondary => 1,
            Tier::Quaternary => 2,
            Tier::Octonary => 3,
        }
    }

    /// Human-readable tier name for logs and errors.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
            Tier::Quaternary => "quaternary",
            Tier::Octonary => "octonary",
        }
    }
}

/// Packet header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Sequence number of the primary window in this packet.
    pub sequence: i32,
    /// Sender timestamp, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

/// One parsed (or to-be-sent) datagram: header plus four payload slots.
///
/// An empty payload means the slot was not filled: either the sender was
/// still warming up its history, or (receiver side) nothing was stored.
#[derive(Debug, Clone)]
pub struct AudioPacket {
    pub header: PacketHeader,
    pub payloads: [Bytes; TIER_COUNT],
}

impl AudioPacket {
    /// Payload carried in the given tier's slot.
    pub fn payload(&self, tier: Tier) -> &Bytes {
        &self.payloads[tier.index()]
    }

    /// Total encoded bytes across all four slots.
    pub fn payload_bytes(&self) -> usize {
        self.payloads.iter().map(|p| p.len()).sum()
    }
}

/// Encoder/decoder for the wire layout.
///
/// Holds the per-tier capacity bounds so both directions can validate
/// payload lengths against the configured tier ladder.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    capacities: [usize; TIER_COUNT],
}

impl PacketCodec {
    pub fn new(capacities: [usize; TIER_COUNT]) -> Self {
        Self { capacities }
    }

    /// Upper bound for a datagram under this tier ladder.
    pub fn max_datagram_len(&self) -> usize {
        HEADER_LEN + self.capacities.iter().sum::<usize>()
    }

    /// Per-tier capacity bounds.
    pub fn capacities(&self) -> [usize; TIER_COUNT] {
        self.capacities
    }

    /// Serialize a packet into one owned datagram.
    ///
    /// Fails if any payload exceeds its tier capacity; a partially built
    /// datagram is never returned.
    pub fn encode(&self, packet: &AudioPacket) -> Result<Bytes, FrameError> {
        for tier in Tier::ALL {
            let len = packet.payload(tier).len();
            let capacity = self.capacities[tier.index()];
            if len > capacity {
                return Err(FrameError::PayloadTooLarge {
                    tier: tier.label(),
                    len,
                    capacity,
                });
            }
        }

        let mut buf = BytesMut::with_capacity(HEADER_LEN + packet.payload_bytes());
        buf.put_u8(WIRE_VERSION);
        buf.put_i32_le(packet.header.sequence);
        buf.put_i64_le(packet.header.timestamp_ms);
        for payload in &packet.payloads {
            buf.put_u16_le(payload.len() as u16);
        }
        for payload in &packet.payloads {
            buf.put_slice(payload);
        }
        Ok(buf.freeze())
    }

    /// Parse one datagram.
    ///
    /// Rejects anything that is not exactly one well-formed packet: short
    /// datagrams, unknown versions, negative sequences, declared lengths
    /// above a tier's capacity, and total-length mismatches (truncation or
    /// trailing bytes). Rejection carries no side effects.
    pub fn decode(&self, datagram: &[u8]) -> Result<AudioPacket, FrameError> {
        if datagram.len() < HEADER_LEN {
            return Err(FrameError::Truncated {
                len: datagram.len(),
                min: HEADER_LEN,
            });
        }

        let mut buf = datagram;
        let version = buf.get_u8();
        if version != WIRE_VERSION {
            return Err(FrameError::UnsupportedVersion(version));
        }

        let sequence = buf.get_i32_le();
        if sequence < 0 {
            return Err(FrameError::InvalidSequence(sequence));
        }
        let timestamp_ms = buf.get_i64_le();

        let mut lengths = [0usize; TIER_COUNT];
        for tier in Tier::ALL {
            let len = buf.get_u16_le() as usize;
            let capacity = self.capacities[tier.index()];
            if len > capacity {
                return Err(FrameError::PayloadTooLarge {
                    tier: tier.label(),
                    len,
                    capacity,
                });
            }
            lengths[tier.index()] = len;
        }

        let expected = HEADER_LEN + lengths.iter().sum::<usize>();
        if datagram.len() != expected {
            return Err(FrameError::LengthMismatch {
                got: datagram.len(),
                expected,
            });
        }

        let mut payloads: [Bytes; TIER_COUNT] = Default::default();
        for tier in Tier::ALL {
            let len = lengths[tier.index()];
            payloads[tier.index()] = Bytes::copy_from_slice(&buf[..len]);
            buf.advance(len);
        }

        Ok(AudioPacket {
            header: PacketHeader {
                sequence,
                timestamp_ms,
            },
            payloads,
        })
    }
}
