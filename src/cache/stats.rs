//! Cache Statistics Module
//!
//! Tracks per-tier performance metrics: hits, misses, evictions, occupancy
//! and a rolling average of hit latency.

use serde::Serialize;

// == Cache Stats ==
/// Per-tier counters. Handed out only as snapshot copies.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Number of successful retrievals
    pub hits: u64,
    /// Number of failed retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted to make room for new ones
    pub evictions: u64,
    /// Bytes currently charged against the tier
    pub size_bytes: u64,
    /// Tier capacity in bytes
    pub capacity_bytes: u64,
    /// Current number of entries
    pub item_count: usize,
    /// Rolling average of hit latency in milliseconds
    pub avg_access_time_ms: f64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats for a tier of the given capacity.
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            capacity_bytes,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Counts a hit and folds its latency into the rolling average.
    pub fn record_hit(&mut self, elapsed_ms: f64) {
        self.hits += 1;
        let n = self.hits as f64;
        self.avg_access_time_ms = (self.avg_access_time_ms * (n - 1.0) + elapsed_ms) / n;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Occupancy ==
    /// Updates size and item counters after a mutation.
    pub fn set_occupancy(&mut self, size_bytes: u64, item_count: usize) {
        self.size_bytes = size_bytes;
        self.item_count = item_count;
    }
}
