//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support,
//! and the concrete value kinds the verification flow stores.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Value ==
/// A value held by the store.
///
/// Only three kinds of payload are ever cached: the verification code itself,
/// the timestamp of the last send, and the attempt counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CacheValue {
    /// A verification code
    Code(String),
    /// Unix timestamp in milliseconds
    Timestamp(u64),
    /// Attempt counter
    Counter(u32),
}

impl CacheValue {
    pub fn as_code(&self) -> Option<&str> {
        match self {
            CacheValue::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<u64> {
        match self {
            CacheValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_counter(&self) -> Option<u32> {
        match self {
            CacheValue::Counter(count) => Some(*count),
            _ => None,
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: CacheValue,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    pub fn new(value: CacheValue, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time, so a zero TTL is never readable.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds; `0` once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
