//! In-process relay over a tokio broadcast channel.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{new_origin, CacheMutationEvent, CacheRelay, OriginId, RelayMessage};
use crate::error::{AppError, Result};

/// Relay for workers that live in the same OS process.
///
/// Every handle shares one channel. Use [`BroadcastRelay::worker`] to get a
/// handle with its own origin for each simulated worker.
#[derive(Debug, Clone)]
pub struct BroadcastRelay {
    sender: broadcast::Sender<RelayMessage>,
    origin: OriginId,
}

impl BroadcastRelay {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            origin: new_origin(),
        }
    }

    /// Handle on the same channel with a fresh origin.
    pub fn worker(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            origin: new_origin(),
        }
    }

    /// Number of workers currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl CacheRelay for BroadcastRelay {
    async fn publish(&self, event: CacheMutationEvent) -> Result<()> {
        self.sender
            .send(RelayMessage::new(self.origin, event))
            .map(|_| ())
            .map_err(|e| {
                AppError::RelayUnavailable(format!("no subscribers for {}", e.0.event.key()))
            })
    }

    fn subscribe(&self) -> broadcast::Receiver<RelayMessage> {
        self.sender.subscribe()
    }

    fn origin(&self) -> OriginId {
        self.origin
    }

    fn name(&self) -> &'static str {
        "broadcast"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheValue;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let relay = BroadcastRelay::new(16);
        let mut worker_a = relay.subscribe();
        let mut worker_b = relay.subscribe();
        assert_eq!(relay.subscriber_count(), 2);

        assert_ok!(
            relay
                .publish_set("x", CacheValue::Code("y".to_string()), Duration::from_secs(1))
                .await
        );

        let expected = RelayMessage::new(
            relay.origin(),
            CacheMutationEvent::set("x", CacheValue::Code("y".to_string()), Duration::from_secs(1)),
        );
        assert_eq!(worker_a.recv().await.unwrap(), expected);
        assert_eq!(worker_b.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_worker_handles_share_channel_with_own_origin() {
        let relay = BroadcastRelay::new(16);
        let other = relay.worker();
        let mut events = relay.subscribe();

        assert_ne!(relay.origin(), other.origin());
        assert_eq!(other.subscriber_count(), 1);

        assert_ok!(other.publish_delete("k").await);
        let message = events.recv().await.unwrap();
        assert_eq!(message.origin, other.origin());
        assert_eq!(message.event, CacheMutationEvent::delete("k"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_unavailable() {
        let relay = BroadcastRelay::new(16);

        let result = relay.publish_delete("x").await;
        assert_err!(&result);
        assert!(matches!(result, Err(AppError::RelayUnavailable(_))));
    }
}
