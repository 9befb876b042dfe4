//! Cache Module
//!
//! Provides the per-process in-memory store with lazy TTL expiration.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, CacheValue};
pub use stats::CacheStats;
pub use store::{SharedStore, TtlStore};
