//! In-process tier backed by a [`BoundedStore`].

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{BoundedStore, CacheStats, StorageTier, TierKind};
use crate::error::Result;

/// Memory tier. All mutations go through a single write lock, so
/// operations from one call site apply in issue order.
#[derive(Debug)]
pub struct MemoryTier {
    name: String,
    kind: TierKind,
    capacity_bytes: u64,
    store: RwLock<BoundedStore>,
}

impl MemoryTier {
    pub fn new(name: impl Into<String>, capacity_bytes: u64) -> Self {
        Self::with_kind(name, TierKind::Memory, capacity_bytes)
    }

    /// Memory-backed tier that reports a different kind to placement,
    /// e.g. an edge stand-in during development.
    pub fn with_kind(name: impl Into<String>, kind: TierKind, capacity_bytes: u64) -> Self {
        let name = name.into();
        Self {
            store: RwLock::new(BoundedStore::new(name.clone(), capacity_bytes)),
            name,
            kind,
            capacity_bytes,
        }
    }
}

#[async_trait]
impl StorageTier for MemoryTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TierKind {
        self.kind
    }

    fn capacity_bytes(&self) -> Option<u64> {
        Some(self.capacity_bytes)
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        // Write lock: expiry removal and stats mutate the store
        let mut store = self.store.write().await;
        Ok(store.get(key))
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<u64>) -> Result<()> {
        let mut store = self.store.write().await;
        store.set(key.to_string(), value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        Ok(store.delete(key))
    }

    async fn clear(&self) -> Result<()> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(self.store.write().await.cleanup_expired())
    }
}
