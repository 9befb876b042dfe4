//! Relay Module
//!
//! Propagates store mutations to every worker process so that each
//! process-local store converges on the same contents.
//!
//! A worker applies its own writes to its local store first and then
//! publishes them. Other workers apply what they receive from
//! [`CacheRelay::subscribe`] (see [`crate::tasks::spawn_relay_sync_task`]),
//! skipping messages stamped with their own [`CacheRelay::origin`].
//!
//! # Implementations
//! - [`BroadcastRelay`] - one process group inside a single OS process
//! - [`UdpRelay`] - JSON datagrams between worker processes

mod broadcast;
mod event;
mod udp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast::Receiver;

use crate::cache::CacheValue;
use crate::config::{RelayConfig, RelayMode};
use crate::error::Result;

pub use self::broadcast::BroadcastRelay;
pub use event::{new_origin, CacheMutationEvent, OriginId, RelayMessage};
pub use udp::UdpRelay;

// == Relay Trait ==
#[async_trait]
pub trait CacheRelay: Send + Sync {
    /// Broadcasts an event to the other workers, stamped with [`Self::origin`].
    ///
    /// An error means other workers may not see the event. The local store is
    /// not touched here.
    async fn publish(&self, event: CacheMutationEvent) -> Result<()>;

    /// Subscribes to messages delivered to this worker.
    fn subscribe(&self) -> Receiver<RelayMessage>;

    /// Origin stamped on everything this handle publishes.
    fn origin(&self) -> OriginId;

    /// Relay name for logs and diagnostics.
    fn name(&self) -> &'static str;

    async fn publish_set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        self.publish(CacheMutationEvent::set(key, value, ttl)).await
    }

    async fn publish_delete(&self, key: &str) -> Result<()> {
        self.publish(CacheMutationEvent::delete(key)).await
    }
}

/// Builds the relay selected by configuration.
pub async fn from_config(config: &RelayConfig) -> Result<Arc<dyn CacheRelay>> {
    match config.mode {
        RelayMode::Broadcast => Ok(Arc::new(BroadcastRelay::new(config.channel_capacity))),
        RelayMode::Udp => {
            let relay = UdpRelay::bind(
                config.bind_addr,
                config.peers.clone(),
                config.channel_capacity,
            )
            .await?;
            Ok(Arc::new(relay))
        }
    }
}
