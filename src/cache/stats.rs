//! Cache Statistics Module
//!
//! Tracks read hits, misses, and lazily evicted expired entries.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache access metrics. Diagnostics only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of reads that found a live entry
    pub hits: u64,
    /// Number of reads that found nothing (missing or expired)
    pub misses: u64,
    /// Number of entries dropped because their TTL lapsed
    pub expirations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total reads served, live or not.
    pub fn reads(&self) -> u64 {
        self.hits + self.misses
    }

    /// Share of reads that found a live entry; 0.0 before the first read.
    pub fn hit_rate(&self) -> f64 {
        match self.reads() {
            0 => 0.0,
            reads => self.hits as f64 / reads as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
