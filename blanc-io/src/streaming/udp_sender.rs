//! UDP sender for forwarding local readings to the paired unit
//!
//! Fire-and-forget: one datagram per reading, no acknowledgment, no retry,
//! no ordering. A lost reading is superseded by the next one anyway.

use crate::core::types::Reading;
use crate::error::{Error, Result};
use crate::reconnect::ReconnectPolicy;
use crate::streaming::messages::encode_reading;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// UDP client sending reading messages to one peer
pub struct UdpSender {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpSender {
    /// Resolve the peer and create the client socket, retrying until both succeed
    pub fn connect(host: &str, port: u16, policy: &ReconnectPolicy) -> Self {
        let what = format!("relay sender to {}:{}", host, port);
        policy.retry(&what, || Self::try_connect(host, port))
    }

    /// Single connection attempt
    pub fn try_connect(host: &str, port: u16) -> Result<Self> {
        let peer = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            Error::Other(format!("No address found for {}:{}", host, port))
        })?;

        let bind_addr = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)?;

        log::info!("Relay sender ready: {} -> {}", socket.local_addr()?, peer);

        Ok(Self { socket, peer })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send one reading as a single datagram
    pub fn send(&mut self, reading: &Reading) -> Result<()> {
        let bytes = encode_reading(reading)?;
        self.socket.send_to(&bytes, self.peer)?;
        log::trace!("Sent {} to {}", reading, self.peer);
        Ok(())
    }
}
