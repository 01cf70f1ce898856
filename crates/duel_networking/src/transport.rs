//! # Transport Layer
//!
//! Unreliable, unordered delivery of fixed-size packets to the one peer.
//!
//! ## Design
//!
//! - Raw UDP, no reliability of its own (the sync engine retransmits)
//! - Non-blocking: an empty socket reports "no packet", never waits
//! - Sends are fire-and-forget; failures are counted, not returned

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::error::{NetError, NetResult};
use crate::protocol::WirePacket;

/// Receive buffer size. Anything larger than a packet is malformed anyway.
const RECV_BUFFER_SIZE: usize = 64;

/// Receive errors tolerated in one poll before giving up until the next.
const MAX_RECV_ERRORS_PER_POLL: u32 = 16;

/// Packet send/receive primitives the sync engine is built on.
pub trait Transport {
    /// Sends a packet to the peer. No delivery confirmation.
    fn send(&mut self, packet: WirePacket);

    /// Returns the next pending packet, or `None` if nothing is waiting.
    fn try_receive(&mut self) -> Option<WirePacket>;
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportStats {
    /// Packets sent.
    pub packets_sent: u64,
    /// Packets received.
    pub packets_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Send errors.
    pub send_errors: u64,
    /// Receive errors.
    pub recv_errors: u64,
    /// Datagrams with the wrong size.
    pub malformed: u64,
}

/// UDP socket connected to a single peer.
pub struct UdpTransport {
    /// The underlying socket.
    socket: UdpSocket,
    /// Local address.
    local_addr: SocketAddr,
    /// Peer address.
    peer_addr: SocketAddr,
    /// Receive buffer.
    recv_buffer: [u8; RECV_BUFFER_SIZE],
    /// Statistics.
    stats: TransportStats,
}

impl UdpTransport {
    /// Binds `0.0.0.0:self_port` and connects to the peer.
    ///
    /// The connected socket only delivers datagrams from the peer address.
    pub fn connect(self_port: u16, peer_host: &str, peer_port: u16) -> NetResult<Self> {
        let peer_addr = (peer_host, peer_port)
            .to_socket_addrs()?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| NetError::AddressResolution(format!("{peer_host}:{peer_port}")))?;

        Self::bind(SocketAddr::from(([0, 0, 0, 0], self_port)), peer_addr)
    }

    /// Binds `local` and connects to `peer_addr`.
    pub fn bind(local: SocketAddr, peer_addr: SocketAddr) -> NetResult<Self> {
        let socket = UdpSocket::bind(local)?;
        socket.connect(peer_addr)?;
        socket.set_nonblocking(true)?;

        let local_addr = socket.local_addr()?;
        tracing::info!("udp transport bound to {local_addr}, peer {peer_addr}");

        Ok(Self {
            socket,
            local_addr,
            peer_addr,
            recv_buffer: [0u8; RECV_BUFFER_SIZE],
            stats: TransportStats::default(),
        })
    }

    /// Returns the local address.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the peer address.
    #[must_use]
    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, packet: WirePacket) {
        match self.socket.send(&packet.to_bytes()) {
            Ok(n) => {
                self.stats.packets_sent += 1;
                self.stats.bytes_sent += n as u64;
            }
            Err(e) => {
                // The peer not listening yet shows up here as ECONNREFUSED.
                self.stats.send_errors += 1;
                tracing::debug!("send failed: {e}");
            }
        }
    }

    fn try_receive(&mut self) -> Option<WirePacket> {
        let mut errors = 0;
        loop {
            match self.socket.recv(&mut self.recv_buffer) {
                Ok(len) => {
                    self.stats.packets_received += 1;
                    self.stats.bytes_received += len as u64;
                    match WirePacket::from_bytes(&self.recv_buffer[..len]) {
                        Ok(packet) => return Some(packet),
                        Err(e) => {
                            self.stats.malformed += 1;
                            tracing::warn!("dropping datagram from {}: {e}", self.peer_addr);
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return None,
                Err(e) => {
                    // ICMP errors from a peer that is not up yet. The error is
                    // consumed by this call; datagrams behind it are still queued.
                    self.stats.recv_errors += 1;
                    tracing::debug!("receive failed: {e}");
                    errors += 1;
                    if errors >= MAX_RECV_ERRORS_PER_POLL {
                        return None;
                    }
                }
            }
        }
    }
}
