//! Cross-process relay over UDP.
//!
//! Every worker binds one socket and knows the addresses of its peers.
//! Each mutation travels as a single JSON datagram; a listener task feeds
//! datagrams from configured peers into the local subscriber channel.
//! Datagrams from any other address are dropped.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{new_origin, CacheMutationEvent, CacheRelay, OriginId, RelayMessage};
use crate::error::{AppError, Result};

/// Largest datagram accepted from a peer.
const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

pub struct UdpRelay {
    socket: Arc<UdpSocket>,
    peers: Arc<[SocketAddr]>,
    local: broadcast::Sender<RelayMessage>,
    origin: OriginId,
    listener: JoinHandle<()>,
}

impl UdpRelay {
    /// Binds the relay socket and starts the peer listener.
    pub async fn bind(
        bind_addr: SocketAddr,
        peers: Vec<SocketAddr>,
        capacity: usize,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            AppError::Configuration(format!("failed to bind relay socket {}: {}", bind_addr, e))
        })?;
        Ok(Self::from_socket(socket, peers, capacity))
    }

    /// Starts the relay on an already bound socket.
    pub fn from_socket(socket: UdpSocket, peers: Vec<SocketAddr>, capacity: usize) -> Self {
        let socket = Arc::new(socket);
        let peers: Arc<[SocketAddr]> = peers.into();
        let (local, _) = broadcast::channel(capacity.max(1));
        let origin = new_origin();

        let listener = tokio::spawn(run_listener(
            socket.clone(),
            peers.clone(),
            origin,
            local.clone(),
        ));

        info!(
            bind = ?socket.local_addr().ok(),
            peers = ?peers,
            origin,
            "UDP cache relay started"
        );

        Self {
            socket,
            peers,
            local,
            origin,
            listener,
        }
    }

    /// Address the relay socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| AppError::Internal(format!("relay socket has no address: {}", e)))
    }

    pub fn peers(&self) -> &[SocketAddr] {
        &self.peers
    }
}

impl Drop for UdpRelay {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl CacheRelay for UdpRelay {
    /// Sends the event to every peer. Fails only when no peer could be
    /// reached at all.
    async fn publish(&self, event: CacheMutationEvent) -> Result<()> {
        let message = RelayMessage::new(self.origin, event);
        let bytes = serde_json::to_vec(&message)
            .map_err(|e| AppError::Internal(format!("failed to encode relay event: {}", e)))?;

        let mut delivered = 0usize;
        for peer in self.peers.iter() {
            match self.socket.send_to(&bytes, peer).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    warn!(peer = %peer, key = %message.event.key(), error = %e, "Failed to relay cache event");
                }
            }
        }

        if delivered == 0 && !self.peers.is_empty() {
            return Err(AppError::RelayUnavailable(format!(
                "no peer reachable for {}",
                message.event.key()
            )));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RelayMessage> {
        self.local.subscribe()
    }

    fn origin(&self) -> OriginId {
        self.origin
    }

    fn name(&self) -> &'static str {
        "udp"
    }
}

async fn run_listener(
    socket: Arc<UdpSocket>,
    peers: Arc<[SocketAddr]>,
    origin: OriginId,
    local: broadcast::Sender<RelayMessage>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                // ICMP port-unreachable from a dead peer surfaces here on some platforms
                debug!(error = %e, "Relay socket receive error");
                continue;
            }
        };

        if !peers.contains(&from) {
            warn!(from = %from, "Dropping relay datagram from unknown sender");
            continue;
        }

        let message: RelayMessage = match serde_json::from_slice(&buf[..len]) {
            Ok(message) => message,
            Err(e) => {
                warn!(from = %from, error = %e, "Discarding malformed relay datagram");
                continue;
            }
        };

        if message.origin == origin {
            continue;
        }

        debug!(
            from = %from,
            op = message.event.op(),
            key = %message.event.key(),
            "Received relay event"
        );

        if local.send(message).is_err() {
            debug!("No local subscribers for relay event");
        }
    }
}
