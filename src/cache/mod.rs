//! Cache Module
//!
//! Storage tiers: the [`StorageTier`] contract, the byte-bounded in-process
//! store with TTL expiration and expiry-soonest-first eviction, and the
//! per-tier statistics.

mod entry;
mod memory;
mod size;
mod stats;
mod store;
mod tier;


// Re-export public types
pub use entry::{current_timestamp_ms, serialized_size, CacheEntry};
pub use memory::MemoryTier;
pub use size::parse_capacity;
pub use stats::CacheStats;
pub use store::BoundedStore;
pub use tier::{StorageTier, TierDescriptor, TierKind};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
