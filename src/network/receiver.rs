//! Packet reception

use tokio::net::UdpSocket;
use tracing::debug;

use crate::constants::MAX_DATAGRAM_SIZE;
use crate::error::{NetworkError, Result};
use crate::protocol::{AudioPacket, PacketCodec};

/// Receives and unframes audio packets.
pub struct PacketReceiver {
    socket: UdpSocket,
    codec: PacketCodec,
    /// Receive buffer; anything longer than a maximal frame is junk anyway
    buf: Vec<u8>,
    packets_received: u64,
    bytes_received: u64,
    invalid_packets: u64,
}

/// Reception counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiverStats {
    pub packets_received: u64,
    pub bytes_received: u64,
    /// Datagrams that failed framing checks and were discarded
    pub invalid_packets: u64,
}

impl PacketReceiver {
    pub fn new(socket: UdpSocket, codec: PacketCodec) -> Self {
        let buf_len = codec.max_datagram_len().max(MAX_DATAGRAM_SIZE);
        Self {
            socket,
            codec,
            buf: vec![0u8; buf_len],
            packets_received: 0,
            bytes_received: 0,
            invalid_packets: 0,
        }
    }

    /// Wait for the next datagram.
    ///
    /// Malformed datagrams are dropped and reported as `Ok(None)` so one
    /// bad sender cannot take the stream down; socket errors surface.
    pub async fn recv(&mut self) -> Result<Option<AudioPacket>> {
        let (len, from) = self
            .socket
            .recv_from(&mut self.buf)
            .await
            .map_err(|e| NetworkError::ReceiveFailed(e.to_string()))?;

        match self.codec.decode(&self.buf[..len]) {
            Ok(packet) => {
                self.packets_received += 1;
                self.bytes_received += len as u64;
                Ok(Some(packet))
            }
            Err(e) => {
                debug!("Discarding {len}-byte datagram from {from}: {e}");
                self.invalid_packets += 1;
                Ok(None)
            }
        }
    }

    /// Get statistics
    pub fn stats(&self) -> ReceiverStats {
        ReceiverStats {
            packets_received: self.packets_received,
            bytes_received: self.bytes_received,
            invalid_packets: self.invalid_packets,
        }
    }
}
