//! Tiered Cache - A multi-tier cache server
//!
//! Reads walk ordered storage tiers fastest first and promote hits toward
//! faster tiers. Writes fan out to the tiers chosen by a placement policy.
//! Every tier sits behind its own circuit breaker and stays within its byte
//! budget through expiry-soonest-first eviction.

pub mod api;
pub mod breaker;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod placement;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use orchestrator::{Lookup, TieredCache};
pub use placement::SetOptions;
pub use tasks::spawn_cleanup_task;
