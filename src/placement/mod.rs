//! Placement Module
//!
//! Decides which tiers a write lands in, how long it lives there and
//! whether it is compressed or replicated. Placement is a pure function of
//! its inputs; demand data is supplied by an injected [`DemandSource`].

use serde::{Deserialize, Serialize};

use crate::cache::{TierDescriptor, TierKind};

// == Hints ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    #[default]
    Weak,
    Strong,
}

// == Set Options ==
/// Caller-supplied options for a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetOptions {
    /// Lifetime in seconds; falls back to the placement default
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub importance: Importance,
    /// Ask for compression regardless of size
    #[serde(default)]
    pub compress: bool,
    /// Region the value is mostly read from
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub consistency: Consistency,
}

impl SetOptions {
    pub fn with_ttl(ttl: u64) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    pub fn importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = consistency;
        self
    }
}

// == Analysis ==
/// Everything placement looks at for one write.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheAnalysis {
    pub size_bytes: u64,
    /// Observed or predicted reads per minute
    pub access_frequency: f64,
    pub importance: Importance,
    /// Region the value is demanded from, if known
    pub geography: Option<String>,
    pub ttl: Option<u64>,
    pub compress_hint: bool,
    pub consistency: Consistency,
}

// == Decision ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementDecision {
    /// Tier names, fastest first
    pub target_tiers: Vec<String>,
    pub ttl: Option<u64>,
    pub compress: bool,
    pub replicate: bool,
}

// == Demand Source ==
/// External lookup for how hot a key is and where it is read from.
pub trait DemandSource: Send + Sync {
    fn access_frequency(&self, key: &str) -> f64;

    fn region(&self, key: &str) -> Option<String>;
}

/// No demand data: every key is treated as moderately warm.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformDemand;

impl DemandSource for UniformDemand {
    fn access_frequency(&self, _key: &str) -> f64 {
        1.0
    }

    fn region(&self, _key: &str) -> Option<String> {
        None
    }
}

// == Strategy ==
pub trait PlacementStrategy: Send + Sync {
    /// `tiers` is the orchestrator's tier list, fastest first.
    fn determine(&self, analysis: &CacheAnalysis, tiers: &[TierDescriptor]) -> PlacementDecision;
}

/// Tunables for [`AdaptivePlacement`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    /// TTL applied when the caller gives none; None keeps values forever
    pub default_ttl: Option<u64>,
    /// Values at least this large are compressed
    pub compress_threshold_bytes: u64,
    /// Values at least this large and colder than `cold_frequency` skip fast tiers
    pub large_value_bytes: u64,
    pub cold_frequency: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            default_ttl: Some(3600),
            compress_threshold_bytes: 16 * 1024,
            large_value_bytes: 1024 * 1024,
            cold_frequency: 0.1,
        }
    }
}

/// Importance, geography and demand aware placement.
#[derive(Debug, Clone, Default)]
pub struct AdaptivePlacement {
    config: PlacementConfig,
}

impl AdaptivePlacement {
    pub fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// Tiers too small to ever hold the value are never chosen.
    fn select<'a>(&self, analysis: &CacheAnalysis, tiers: &'a [TierDescriptor]) -> Vec<&'a str> {
        let eligible: Vec<&TierDescriptor> = tiers
            .iter()
            .filter(|t| t.can_hold(analysis.size_bytes))
            .collect();
        let names = || eligible.iter().copied().map(|t| t.name.as_str());

        let mut targets: Vec<&str> = match analysis.importance {
            Importance::Critical => return names().collect(),
            Importance::High => names().take(2).collect(),
            _ if analysis.access_frequency < self.config.cold_frequency
                && analysis.size_bytes >= self.config.large_value_bytes =>
            {
                names().last().into_iter().collect()
            }
            _ => {
                let mut picked: Vec<&str> = names().take(1).collect();
                if analysis.geography.is_some() {
                    picked.extend(
                        eligible
                            .iter()
                            .copied()
                            .skip(1)
                            .filter(|t| t.kind == TierKind::Edge)
                            .map(|t| t.name.as_str()),
                    );
                }
                picked
            }
        };

        if analysis.consistency == Consistency::Strong {
            targets.truncate(1);
        }
        targets
    }
}

impl PlacementStrategy for AdaptivePlacement {
    fn determine(&self, analysis: &CacheAnalysis, tiers: &[TierDescriptor]) -> PlacementDecision {
        let target_tiers: Vec<String> = self
            .select(analysis, tiers)
            .into_iter()
            .map(str::to_string)
            .collect();

        PlacementDecision {
            replicate: target_tiers.len() > 1,
            target_tiers,
            ttl: analysis.ttl.or(self.config.default_ttl),
            compress: analysis.compress_hint
                || analysis.size_bytes >= self.config.compress_threshold_bytes,
        }
    }
}
