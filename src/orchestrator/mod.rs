//! Orchestrator Module
//!
//! Composes the ordered tiers, each behind its own circuit breaker, into a
//! single cache: sequential reads with promotion, placement-driven fan-out
//! writes.

mod tiered;
mod types;

pub use tiered::{TieredCache, DEFAULT_PROMOTION_TTL};
pub use types::{Lookup, TierReport};
