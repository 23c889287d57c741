//! Result and report types returned by the orchestrator.

use serde::Serialize;
use serde_json::Value;

use crate::breaker::BreakerSnapshot;
use crate::cache::{CacheStats, TierKind};

// == Lookup ==
/// Outcome of a read across all tiers.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Found in `tier`
    Hit { value: Value, tier: String },
    /// At least one tier answered and none had the key
    Miss,
    /// Every tier failed or had its circuit open
    Unavailable,
}

impl Lookup {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Lookup::Hit { value, .. } => Some(value),
            Lookup::Miss | Lookup::Unavailable => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit { .. })
    }
}

// == Tier Report ==
/// Stats of one tier together with its breaker state.
#[derive(Debug, Clone, Serialize)]
pub struct TierReport {
    pub tier: String,
    pub kind: TierKind,
    /// hits / (hits + misses) of this tier
    pub hit_rate: f64,
    pub stats: CacheStats,
    pub circuit: BreakerSnapshot,
}
