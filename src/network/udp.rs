//! UDP socket setup
//!
//! The listening socket gets an enlarged kernel receive buffer: a short
//! stall on the receive task must not shed packets the redundancy scheme
//! could still have drained copies from.

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::NetworkError;

/// Kernel receive buffer size for the listening socket.
const RECV_BUFFER_BYTES: usize = 1 << 20;

/// Bind the receiver's listening socket on all interfaces.
pub fn bind_listener(port: u16) -> Result<UdpSocket, NetworkError> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| NetworkError::BindFailed(e.to_string()))?;
    socket
        .set_recv_buffer_size(RECV_BUFFER_BYTES)
        .map_err(|e| NetworkError::BindFailed(e.to_string()))?;
    socket
        .set_nonblocking(true)
        .map_err(|e| NetworkError::BindFailed(e.to_string()))?;
    socket
        .bind(&addr.into())
        .map_err(|e| NetworkError::BindFailed(format!("port {port}: {e}")))?;

    UdpSocket::from_std(socket.into()).map_err(|e| NetworkError::BindFailed(e.to_string()))
}

/// Bind an ephemeral local socket for the sender.
pub async fn bind_sender() -> Result<UdpSocket, NetworkError> {
    UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| NetworkError::BindFailed(e.to_string()))
}
