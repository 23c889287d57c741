//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::error::Result;

// == Cache Entry ==
/// A single value held by one tier, together with its expiry and the
/// number of bytes charged against the tier's capacity.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Value,
    /// Serialized size charged to the owning tier
    pub size_bytes: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// Fails if the value cannot be serialized; a value is never stored
    /// without its size being known. A TTL too large to represent as a
    /// millisecond timestamp means the entry never expires.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_seconds` - Optional TTL in seconds
    pub fn new(value: Value, ttl_seconds: Option<u64>) -> Result<Self> {
        let size_bytes = serialized_size(&value)?;
        let now = current_timestamp_ms();
        let expires_at = ttl_seconds.and_then(|ttl| ttl.checked_mul(1000)?.checked_add(now));

        Ok(Self {
            value,
            size_bytes,
            created_at: now,
            expires_at,
        })
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal
    /// to its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against a fixed clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Eviction Rank ==
    /// Effective expiration used to order eviction candidates.
    /// Entries without expiration rank last.
    pub fn eviction_rank(&self) -> u64 {
        self.expires_at.unwrap_or(u64::MAX)
    }
}

// == Utility Functions ==
/// Number of bytes the value occupies once encoded as JSON.
pub fn serialized_size(value: &Value) -> Result<u64> {
    let bytes = serde_json::to_vec(value)?;
    Ok(bytes.len() as u64)
}

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new(json!("test_value"), None).unwrap();

        assert_eq!(entry.value, json!("test_value"));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired());
        assert_eq!(entry.eviction_rank(), u64::MAX);
    }

    #[test]
    fn test_entry_size_is_json_length() {
        let entry = CacheEntry::new(json!("abc"), None).unwrap();
        // "abc" encodes with its quotes
        assert_eq!(entry.size_bytes, 5);

        let entry = CacheEntry::new(json!({"a": 1}), None).unwrap();
        assert_eq!(entry.size_bytes, r#"{"a":1}"#.len() as u64);
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new(json!(42), Some(60)).unwrap();

        let expires = entry.expires_at.unwrap();
        assert_eq!(expires, entry.created_at + 60_000);
        assert!(!entry.is_expired());
        assert_eq!(entry.eviction_rank(), expires);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(json!("short"), Some(1)).unwrap();
        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        for ttl in [u64::MAX / 100, u64::MAX / 1000, u64::MAX] {
            let entry = CacheEntry::new(json!("v"), Some(ttl)).unwrap();
            assert!(entry.expires_at.is_none(), "ttl {} should not wrap", ttl);
            assert!(!entry.is_expired());
        }
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry {
            value: json!("test"),
            size_bytes: 6,
            created_at: now,
            expires_at: Some(now),
        };

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - 1));
    }
}
