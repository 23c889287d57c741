//! Tiered cache orchestrator.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::breaker::{CircuitBreaker, ErrorThreshold};
use crate::cache::{serialized_size, MemoryTier, StorageTier, TierDescriptor, MAX_KEY_LENGTH};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::orchestrator::{Lookup, TierReport};
use crate::placement::{
    AdaptivePlacement, CacheAnalysis, DemandSource, PlacementConfig, PlacementDecision,
    PlacementStrategy, SetOptions, UniformDemand,
};

/// TTL in seconds given to values copied into a faster tier on read.
pub const DEFAULT_PROMOTION_TTL: u64 = 300;

/// A tier paired with the breaker guarding it.
#[derive(Clone)]
struct TierSlot {
    tier: Arc<dyn StorageTier>,
    breaker: Arc<CircuitBreaker>,
}

// == Tiered Cache ==
/// Multi-tier cache. Tiers are ordered fastest first and are only ever
/// mutated through this type.
pub struct TieredCache {
    tiers: Vec<TierSlot>,
    placement: Arc<dyn PlacementStrategy>,
    demand: Arc<dyn DemandSource>,
    promotion_ttl: u64,
}

impl TieredCache {
    // == Constructors ==
    /// Builds a cache over `tiers` (fastest first), creating one breaker per
    /// tier with the shared `threshold`.
    pub fn new(
        tiers: Vec<Arc<dyn StorageTier>>,
        threshold: ErrorThreshold,
        placement: Arc<dyn PlacementStrategy>,
    ) -> Result<Self> {
        if tiers.is_empty() {
            return Err(CacheError::Config("at least one tier is required".to_string()));
        }

        let mut slots: Vec<TierSlot> = Vec::with_capacity(tiers.len());
        for tier in tiers {
            if slots.iter().any(|s| s.tier.name() == tier.name()) {
                return Err(CacheError::Config(format!(
                    "duplicate tier name '{}'",
                    tier.name()
                )));
            }
            let breaker = Arc::new(CircuitBreaker::new(tier.name(), threshold));
            slots.push(TierSlot { tier, breaker });
        }

        Ok(Self {
            tiers: slots,
            placement,
            demand: Arc::new(UniformDemand),
            promotion_ttl: DEFAULT_PROMOTION_TTL,
        })
    }

    /// Builds in-process tiers, breakers and placement from configuration.
    pub fn initialize(config: &Config) -> Result<Self> {
        let threshold = config.error_threshold()?;
        let tiers: Vec<Arc<dyn StorageTier>> = config
            .tier_specs()?
            .into_iter()
            .map(|spec| {
                info!(
                    tier = %spec.name,
                    kind = %spec.kind,
                    capacity_bytes = spec.capacity_bytes,
                    "initializing tier"
                );
                Arc::new(MemoryTier::with_kind(spec.name, spec.kind, spec.capacity_bytes))
                    as Arc<dyn StorageTier>
            })
            .collect();

        let placement = AdaptivePlacement::new(PlacementConfig {
            default_ttl: config.default_ttl,
            ..PlacementConfig::default()
        });

        Ok(Self::new(tiers, threshold, Arc::new(placement))?.with_promotion_ttl(config.promotion_ttl))
    }

    pub fn with_demand(mut self, demand: Arc<dyn DemandSource>) -> Self {
        self.demand = demand;
        self
    }

    pub fn with_promotion_ttl(mut self, ttl_secs: u64) -> Self {
        self.promotion_ttl = ttl_secs;
        self
    }

    /// Tier names and kinds, fastest first.
    pub fn tiers(&self) -> Vec<TierDescriptor> {
        self.tiers.iter().map(|slot| slot.tier.descriptor()).collect()
    }

    // == Get ==
    /// Returns the value from the fastest tier holding it.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.lookup(key).await.into_value()
    }

    /// Asks tiers fastest first. Failing or open tiers are logged and
    /// skipped. A hit below the first tier is copied one tier up in the
    /// background; the caller does not wait for it.
    pub async fn lookup(&self, key: &str) -> Lookup {
        let mut failures = 0;

        for (index, slot) in self.tiers.iter().enumerate() {
            match slot.breaker.execute(|| slot.tier.get(key)).await {
                Ok(Some(value)) => {
                    debug!(tier = %slot.tier.name(), key = %key, "cache hit");
                    if index > 0 {
                        self.promote(&self.tiers[index - 1], key, &value);
                    }
                    return Lookup::Hit {
                        value,
                        tier: slot.tier.name().to_string(),
                    };
                }
                Ok(None) => {}
                Err(err) => {
                    failures += 1;
                    warn!(tier = %slot.tier.name(), key = %key, error = %err, "tier lookup failed, trying next tier");
                }
            }
        }

        if failures == self.tiers.len() {
            Lookup::Unavailable
        } else {
            Lookup::Miss
        }
    }

    fn promote(&self, target: &TierSlot, key: &str, value: &Value) {
        let slot = target.clone();
        let key = key.to_string();
        let value = value.clone();
        let ttl = self.promotion_ttl;

        tokio::spawn(async move {
            match slot
                .breaker
                .execute(|| slot.tier.set(&key, value, Some(ttl)))
                .await
            {
                Ok(()) => debug!(tier = %slot.tier.name(), key = %key, "promoted value"),
                Err(err) => warn!(tier = %slot.tier.name(), key = %key, error = %err, "promotion failed"),
            }
        });
    }

    // == Set ==
    /// Writes `value` to every tier chosen by placement, concurrently.
    ///
    /// Every target is attempted. If any write fails the first failure is
    /// returned; the other tiers keep whatever they accepted.
    pub async fn set(&self, key: &str, value: Value, options: SetOptions) -> Result<PlacementDecision> {
        validate_key(key)?;

        let analysis = self.analyze(key, &value, &options)?;
        let descriptors = self.tiers();
        let decision = self.placement.determine(&analysis, &descriptors);

        if decision.target_tiers.is_empty() {
            if let Some(largest) = largest_bounded(&descriptors, analysis.size_bytes) {
                return Err(CacheError::CapacityExceeded {
                    tier: largest.name.clone(),
                    required: analysis.size_bytes,
                    capacity: largest.capacity_bytes.unwrap_or_default(),
                });
            }
        }

        let targets: Vec<&TierSlot> = decision
            .target_tiers
            .iter()
            .filter_map(|name| {
                let slot = self.tiers.iter().find(|slot| slot.tier.name() == name);
                if slot.is_none() {
                    warn!(tier = %name, "placement chose an unknown tier");
                }
                slot
            })
            .collect();

        if targets.is_empty() {
            return Err(CacheError::Internal(format!(
                "placement selected no usable tier for '{}'",
                key
            )));
        }

        debug!(
            key = %key,
            tiers = ?decision.target_tiers,
            ttl = ?decision.ttl,
            compress = decision.compress,
            replicate = decision.replicate,
            "placing value"
        );

        let writes = targets.into_iter().map(|slot| {
            let value = value.clone();
            let ttl = decision.ttl;
            async move {
                let result = slot
                    .breaker
                    .execute(|| slot.tier.set(key, value, ttl))
                    .await;
                (slot.tier.name(), result)
            }
        });

        let mut first_error = None;
        for (tier, result) in join_all(writes).await {
            if let Err(err) = result {
                warn!(tier = %tier, key = %key, error = %err, "tier write failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(decision),
        }
    }

    fn analyze(&self, key: &str, value: &Value, options: &SetOptions) -> Result<CacheAnalysis> {
        Ok(CacheAnalysis {
            size_bytes: serialized_size(value)?,
            access_frequency: self.demand.access_frequency(key),
            importance: options.importance,
            geography: options
                .region
                .clone()
                .or_else(|| self.demand.region(key)),
            ttl: options.ttl,
            compress_hint: options.compress,
            consistency: options.consistency,
        })
    }

    // == Delete ==
    /// Removes `key` from every tier. Returns whether any tier held it;
    /// the first tier failure is returned after all tiers were attempted.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut removed = false;
        let mut first_error = None;

        for slot in &self.tiers {
            match slot.breaker.execute(|| slot.tier.delete(key)).await {
                Ok(hit) => removed |= hit,
                Err(err) => {
                    warn!(tier = %slot.tier.name(), key = %key, error = %err, "tier delete failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }

    // == Clear ==
    pub async fn clear(&self) -> Result<()> {
        let mut first_error = None;
        for slot in &self.tiers {
            if let Err(err) = slot.breaker.execute(|| slot.tier.clear()).await {
                warn!(tier = %slot.tier.name(), error = %err, "tier clear failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // == Stats ==
    pub async fn stats(&self) -> Vec<TierReport> {
        let mut reports = Vec::with_capacity(self.tiers.len());
        for slot in &self.tiers {
            let stats = slot.tier.stats().await;
            reports.push(TierReport {
                tier: slot.tier.name().to_string(),
                kind: slot.tier.kind(),
                hit_rate: stats.hit_rate(),
                stats,
                circuit: slot.breaker.snapshot().await,
            });
        }
        reports
    }

    // == Maintenance ==
    /// Drops expired entries in every reachable tier. Returns the count.
    pub async fn purge_expired(&self) -> usize {
        let mut removed = 0;
        for slot in &self.tiers {
            match slot.breaker.execute(|| slot.tier.purge_expired()).await {
                Ok(count) => removed += count,
                Err(err) if err.is_circuit_open() => {
                    debug!(tier = %slot.tier.name(), "skipping purge, circuit open")
                }
                Err(err) => warn!(tier = %slot.tier.name(), error = %err, "purge failed"),
            }
        }
        removed
    }

    /// Empties every tier, bypassing the breakers. Breaker history is kept.
    pub async fn dispose(&self) {
        for slot in &self.tiers {
            if let Err(err) = slot.tier.clear().await {
                warn!(tier = %slot.tier.name(), error = %err, "failed to clear tier on dispose");
            }
        }
        info!("tiered cache disposed");
    }
}

/// The roomiest tier, when every tier is bounded and none can take
/// `size_bytes`.
fn largest_bounded(tiers: &[TierDescriptor], size_bytes: u64) -> Option<&TierDescriptor> {
    if tiers.iter().any(|t| t.can_hold(size_bytes)) {
        return None;
    }
    tiers.iter().max_by_key(|t| t.capacity_bytes)
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
