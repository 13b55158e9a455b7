use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use crate::dns::{Message, constants::MAX_UDP_PAYLOAD};
use crate::resolver::Resolver;

/// Serves one datagram at a time: receive, decode, respond, send.
pub struct UdpServer {
    socket: UdpSocket,
    resolver: Resolver,
}

impl UdpServer {
    pub async fn bind(addr: SocketAddr, resolver: Resolver) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket, resolver))
    }

    pub fn from_socket(socket: UdpSocket, resolver: Resolver) -> Self {
        UdpServer { socket, resolver }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Produces the reply bytes for one request, or `None` if it should be dropped.
    pub async fn handle_datagram(&self, datagram: &[u8]) -> Option<Vec<u8>> {
        let request = match Message::parse(datagram) {
            Ok(request) => request,
            Err(e) => {
                debug!("Dropping malformed datagram ({} bytes): {}", datagram.len(), e);
                return None;
            }
        };

        for question in request.questions() {
            debug!("DNS query for: {}", question);
        }

        let response = self.resolver.respond(&request).await;
        match response.serialize() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("Failed to serialize response {}: {}", response.header().id, e);
                None
            }
        }
    }

    /// Runs until a message arrives on `shutdown_rx` or its sender is dropped.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> io::Result<()> {
        info!("UDP DNS server listening on {}", self.socket.local_addr()?);

        let mut buf = [0u8; MAX_UDP_PAYLOAD];

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("UDP server received shutdown signal");
                    break;
                }

                result = self.socket.recv_from(&mut buf) => {
                    let (read_bytes, src_addr) = match result {
                        Ok(received) => received,
                        Err(e) => {
                            warn!("Error receiving datagram: {}", e);
                            continue;
                        }
                    };
                    trace!("Received {} bytes from {}", read_bytes, src_addr);

                    let Some(response) = self.handle_datagram(&buf[..read_bytes]).await else {
                        continue;
                    };
                    if let Err(e) = self.socket.send_to(&response, src_addr).await {
                        error!("Failed to send UDP response to {}: {:?}", src_addr, e);
                    }
                }
            }
        }

        info!("UDP server shutdown complete");
        Ok(())
    }
}
