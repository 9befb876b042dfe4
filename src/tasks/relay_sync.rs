//! Relay Sync Task
//!
//! Applies relay messages from other workers to the local store.

use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::SharedStore;
use crate::relay::{OriginId, RelayMessage};

/// Spawns the task that keeps the local store in step with the relay.
///
/// Messages stamped with `origin` were already applied locally by the worker
/// that published them and are skipped, so a late echo never overwrites a
/// newer local write.
///
/// Subscribe before anything publishes: messages sent before `events` was
/// created are not replayed.
///
/// # Example
/// ```ignore
/// let store = TtlStore::shared();
/// let handle = spawn_relay_sync_task(store.clone(), relay.subscribe(), relay.origin());
/// ```
pub fn spawn_relay_sync_task(
    store: SharedStore,
    mut events: Receiver<RelayMessage>,
    origin: OriginId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(origin, "Relay sync task started");

        loop {
            match events.recv().await {
                Ok(message) if message.origin == origin => {}
                Ok(message) => {
                    let event = &message.event;
                    debug!(
                        op = event.op(),
                        key = %event.key(),
                        from = message.origin,
                        "Applying relay event"
                    );
                    store.write().await.apply(event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Relay subscriber lagged, cache events were dropped");
                }
                Err(RecvError::Closed) => {
                    info!("Relay channel closed, stopping sync task");
                    break;
                }
            }
        }
    })
}
