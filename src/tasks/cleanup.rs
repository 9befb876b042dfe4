//! TTL Cleanup Task
//!
//! Optional background sweep of expired entries. Reads already evict expired
//! entries, so the sweep only bounds memory held by keys nobody reads again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedStore;

/// Spawns a background task that periodically removes expired entries.
///
/// The returned handle is aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = TtlStore::shared();
/// let cleanup_handle = spawn_cleanup_task(store.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(store: SharedStore, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.write().await.cleanup_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
