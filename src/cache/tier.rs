//! Storage tier contract
//!
//! Every tier, in-process or remote, is driven by the orchestrator through
//! this trait. Remote tiers surface transport failures as
//! [`CacheError::Tier`](crate::error::CacheError::Tier).

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheStats;
use crate::error::{CacheError, Result};

/// Broad class of a tier, consulted by placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierKind {
    /// In-process memory
    Memory,
    /// Shared store reached over the network
    Distributed,
    /// Region-local store close to consumers
    Edge,
}

impl TierKind {
    pub fn parse(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(TierKind::Memory),
            "distributed" => Ok(TierKind::Distributed),
            "edge" => Ok(TierKind::Edge),
            other => Err(CacheError::Config(format!("unknown tier kind '{}'", other))),
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierKind::Memory => write!(f, "memory"),
            TierKind::Distributed => write!(f, "distributed"),
            TierKind::Edge => write!(f, "edge"),
        }
    }
}

/// Name, kind and size of a tier, in orchestrator order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierDescriptor {
    pub name: String,
    pub kind: TierKind,
    /// Byte budget, None when the tier does not advertise one
    pub capacity_bytes: Option<u64>,
}

impl TierDescriptor {
    /// Whether a value of `size_bytes` could ever be stored here.
    pub fn can_hold(&self, size_bytes: u64) -> bool {
        self.capacity_bytes.map_or(true, |capacity| size_bytes <= capacity)
    }
}

/// Uniform get/set/delete/clear/stats contract of one cache tier.
#[async_trait]
pub trait StorageTier: Send + Sync {
    /// Unique tier name
    fn name(&self) -> &str;

    fn kind(&self) -> TierKind;

    /// Byte budget of the tier, if it has a fixed one.
    fn capacity_bytes(&self) -> Option<u64> {
        None
    }

    /// Returns the value if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores a value, expiring after `ttl` seconds when given.
    async fn set(&self, key: &str, value: Value, ttl: Option<u64>) -> Result<()>;

    /// Removes a key. Returns whether it was present.
    async fn delete(&self, key: &str) -> Result<bool>;

    async fn clear(&self) -> Result<()>;

    async fn stats(&self) -> CacheStats;

    /// Drops expired entries. Tiers that expire on their own keep the default.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    fn descriptor(&self) -> TierDescriptor {
        TierDescriptor {
            name: self.name().to_string(),
            kind: self.kind(),
            capacity_bytes: self.capacity_bytes(),
        }
    }
}
