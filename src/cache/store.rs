//! Bounded Store Module
//!
//! Byte-budgeted key/value storage with TTL expiration and
//! expiry-soonest-first eviction. This is the synchronous core behind
//! [`MemoryTier`](crate::cache::MemoryTier).

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Bounded Store ==
/// Key/value storage whose charged bytes never exceed its capacity.
#[derive(Debug)]
pub struct BoundedStore {
    /// Tier name, used in errors and logs
    name: String,
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// Capacity budget in bytes
    capacity_bytes: u64,
    /// Bytes charged by the entries currently held
    current_size_bytes: u64,
}

impl BoundedStore {
    // == Constructor ==
    /// Creates an empty store with the given byte budget.
    pub fn new(name: impl Into<String>, capacity_bytes: u64) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            stats: CacheStats::new(capacity_bytes),
            capacity_bytes,
            current_size_bytes: 0,
        }
    }

    // == Set ==
    /// Stores a value with optional TTL in seconds.
    ///
    /// An existing value under the same key is released before the new one
    /// is charged. When the new value does not fit, entries closest to
    /// expiry are evicted first. A value larger than the whole capacity is
    /// rejected without evicting anything.
    pub fn set(&mut self, key: String, value: Value, ttl: Option<u64>) -> Result<()> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key must be between 1 and {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let entry = CacheEntry::new(value, ttl)?;
        let size = entry.size_bytes;

        if size > self.capacity_bytes {
            return Err(CacheError::CapacityExceeded {
                tier: self.name.clone(),
                required: size,
                capacity: self.capacity_bytes,
            });
        }

        // Overwrite: release the old charge first
        self.remove_entry(&key);

        if self.current_size_bytes + size > self.capacity_bytes {
            let required = self.current_size_bytes + size - self.capacity_bytes;
            self.evict(required);
        }

        self.current_size_bytes += size;
        self.entries.insert(key, entry);
        self.sync_occupancy();

        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and counted as misses. Exactly one of
    /// hits/misses is incremented per call.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let start = Instant::now();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.sync_occupancy();
            self.stats.record_miss();
            return None;
        }

        let value = self.entries.get(key).map(|entry| entry.value.clone());
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.stats.record_hit(elapsed_ms);
        value
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.remove_entry(key);
        if removed {
            self.sync_occupancy();
        }
        removed
    }

    // == Clear ==
    /// Drops every entry. Hit/miss history is preserved.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_size_bytes = 0;
        self.sync_occupancy();
    }

    // == Stats ==
    /// Returns a snapshot of the tier statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.sync_occupancy();
        expired_keys.len()
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_size_bytes(&self) -> u64 {
        self.current_size_bytes
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Eviction ==
    /// Frees at least `required` bytes, soonest-to-expire first, or until
    /// the store is empty. Returns the bytes freed.
    fn evict(&mut self, required: u64) -> u64 {
        let mut candidates: Vec<(u64, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.eviction_rank(), key.clone()))
            .collect();
        candidates.sort();

        let mut freed = 0;
        for (_, key) in candidates {
            if freed >= required {
                break;
            }
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size_bytes -= entry.size_bytes;
                freed += entry.size_bytes;
                self.stats.record_eviction();
                debug!(tier = %self.name, key = %key, bytes = entry.size_bytes, "evicted entry");
            }
        }
        freed
    }

    /// Removes an entry and reverses its size charge.
    fn remove_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.current_size_bytes -= entry.size_bytes;
                true
            }
            None => false,
        }
    }

    fn sync_occupancy(&mut self) {
        self.stats
            .set_occupancy(self.current_size_bytes, self.entries.len());
    }
}
