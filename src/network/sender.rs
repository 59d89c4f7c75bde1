//! Packet transmission

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::error::{NetworkError, Result};
use crate::protocol::{AudioPacket, PacketCodec};

/// Sends framed audio packets to one destination.
pub struct PacketSender {
    socket: UdpSocket,
    dest: SocketAddr,
    codec: PacketCodec,
    packets_sent: u64,
    bytes_sent: u64,
}

/// Transmission counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
}

impl PacketSender {
    pub fn new(socket: UdpSocket, dest: SocketAddr, codec: PacketCodec) -> Self {
        Self {
            socket,
            dest,
            codec,
            packets_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Frame and transmit one packet, returning the datagram length.
    pub async fn send(&mut self, packet: &AudioPacket) -> Result<usize> {
        let datagram = self.codec.encode(packet)?;
        self.socket
            .send_to(&datagram, self.dest)
            .await
            .map_err(|e| NetworkError::SendFailed(format!("{}: {e}", self.dest)))?;

        self.packets_sent += 1;
        self.bytes_sent += datagram.len() as u64;
        Ok(datagram.len())
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    /// Get statistics
    pub fn stats(&self) -> SenderStats {
        SenderStats {
            packets_sent: self.packets_sent,
            bytes_sent: self.bytes_sent,
        }
    }
}
