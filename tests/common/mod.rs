//! Shared helpers for the integration tests

#![allow(dead_code)]

use bifrost::{resolver::Resolver, server::UdpServer};
use std::net::SocketAddr;
use tokio::{sync::broadcast, task::JoinHandle};

/// Encodes a dotted name as uncompressed labels followed by the root byte.
pub fn encode_name(domain: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in domain.split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

/// Raw query bytes with one header and an `IN` question per domain.
pub fn query_bytes(id: u16, flags: u16, questions: &[(&str, u16)]) -> Vec<u8> {
    let mut packet = Vec::new();
    packet.extend_from_slice(&id.to_be_bytes());
    packet.extend_from_slice(&flags.to_be_bytes());
    packet.extend_from_slice(&(questions.len() as u16).to_be_bytes());
    packet.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    for (domain, qtype) in questions {
        packet.extend_from_slice(&encode_name(domain));
        packet.extend_from_slice(&qtype.to_be_bytes());
        packet.extend_from_slice(&[0x00, 0x01]);
    }
    packet
}

/// Starts a server on an ephemeral loopback port.
pub async fn start_server(
    resolver: Resolver,
) -> (SocketAddr, broadcast::Sender<()>, JoinHandle<()>) {
    let server = UdpServer::bind("127.0.0.1:0".parse().unwrap(), resolver)
        .await
        .expect("bind test server");
    let addr = server.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(async move {
        server.run(shutdown_rx).await.expect("server run");
    });

    (addr, shutdown_tx, handle)
}
