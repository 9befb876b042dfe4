//! TTL Store Module
//!
//! Per-process key-value storage with lazy TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, CacheValue};
use crate::relay::CacheMutationEvent;

/// Store handle shared by the tasks and services of one process.
pub type SharedStore = Arc<RwLock<TtlStore>>;

// == TTL Store ==
/// In-process key-value store with per-entry expiry.
///
/// Expiry is checked when an entry is read; the optional cleanup task can
/// sweep the rest.
#[derive(Debug, Default)]
pub struct TtlStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Access statistics
    stats: CacheStats,
}

impl TtlStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store wrapped for sharing across tasks.
    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(Self::new()))
    }

    // == Set ==
    /// Stores a value expiring `ttl` from now, overwriting any previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: CacheValue, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(value, ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// An expired entry is removed on the spot and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<CacheValue> {
        let now = current_timestamp_ms();

        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
            debug!(key = %key, "Evicted expired entry on read");
        }

        self.stats.record_miss();
        None
    }

    // == Delete ==
    /// Removes an entry. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Apply ==
    /// Applies a mutation event delivered by the relay.
    pub fn apply(&mut self, event: &CacheMutationEvent) {
        match event {
            CacheMutationEvent::Set { key, value, ttl_ms } => {
                self.set(key.clone(), value.clone(), Duration::from_millis(*ttl_ms));
            }
            CacheMutationEvent::Delete { key } => {
                self.delete(key);
            }
        }
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| Duration::from_millis(entry.ttl_remaining_ms()))
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let count = before - self.entries.len();
        self.stats.record_expirations(count);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Keys ==
    /// Sorted keys of live entries.
    pub fn keys(&self) -> Vec<String> {
        let now = current_timestamp_ms();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}
