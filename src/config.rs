//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::breaker::ErrorThreshold;
use crate::cache::{parse_capacity, TierKind};
use crate::error::{CacheError, Result};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tier layout, fastest first: `name[:kind]=capacity,...`
    pub tiers: String,
    /// Failures that open a tier's circuit
    pub breaker_failure_limit: u32,
    /// Window in seconds within which failures are counted together
    pub breaker_window_secs: u64,
    /// Seconds a circuit stays open before a trial call
    pub breaker_reset_secs: u64,
    /// TTL in seconds for values promoted into a faster tier
    pub promotion_ttl: u64,
    /// Default TTL in seconds for writes without explicit TTL, None = never expire
    pub default_ttl: Option<u64>,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

/// One parsed entry of [`Config::tiers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSpec {
    pub name: String,
    pub kind: TierKind,
    pub capacity_bytes: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TIERS` - Tier layout (default: `l1=64MB,l2=512MB`)
    /// - `BREAKER_FAILURE_LIMIT` - Failures before a circuit opens (default: 5)
    /// - `BREAKER_WINDOW_SECS` - Failure evaluation window (default: 60)
    /// - `BREAKER_RESET_SECS` - Open-circuit cool down (default: 30)
    /// - `PROMOTION_TTL` - TTL of promoted copies (default: 300)
    /// - `DEFAULT_TTL` - Default TTL in seconds, 0 disables expiry (default: 3600)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tiers: env::var("TIERS").unwrap_or(defaults.tiers),
            breaker_failure_limit: env_or("BREAKER_FAILURE_LIMIT", defaults.breaker_failure_limit),
            breaker_window_secs: env_or("BREAKER_WINDOW_SECS", defaults.breaker_window_secs),
            breaker_reset_secs: env_or("BREAKER_RESET_SECS", defaults.breaker_reset_secs),
            promotion_ttl: env_or("PROMOTION_TTL", defaults.promotion_ttl),
            default_ttl: match env::var("DEFAULT_TTL").ok().and_then(|v| v.parse().ok()) {
                Some(0) => None,
                Some(ttl) => Some(ttl),
                None => defaults.default_ttl,
            },
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Parses the tier layout. Fails on malformed entries, unknown kinds,
    /// bad capacities or duplicate names.
    pub fn tier_specs(&self) -> Result<Vec<TierSpec>> {
        let mut specs: Vec<TierSpec> = Vec::new();

        for raw in self.tiers.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (label, capacity) = raw.split_once('=').ok_or_else(|| {
                CacheError::Config(format!("tier '{}' must look like name[:kind]=capacity", raw))
            })?;

            let (name, kind) = match label.split_once(':') {
                Some((name, kind)) => (name.trim(), TierKind::parse(kind)?),
                None => (label.trim(), TierKind::Memory),
            };

            if name.is_empty() {
                return Err(CacheError::Config(format!("tier '{}' has no name", raw)));
            }
            if specs.iter().any(|s| s.name == name) {
                return Err(CacheError::Config(format!("duplicate tier name '{}'", name)));
            }

            specs.push(TierSpec {
                name: name.to_string(),
                kind,
                capacity_bytes: parse_capacity(capacity)?,
            });
        }

        if specs.is_empty() {
            return Err(CacheError::Config("at least one tier is required".to_string()));
        }
        Ok(specs)
    }

    pub fn error_threshold(&self) -> Result<ErrorThreshold> {
        ErrorThreshold::new(
            self.breaker_failure_limit,
            Duration::from_secs(self.breaker_window_secs),
            Duration::from_secs(self.breaker_reset_secs),
        )
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tiers: "l1=64MB,l2=512MB".to_string(),
            breaker_failure_limit: 5,
            breaker_window_secs: 60,
            breaker_reset_secs: 30,
            promotion_ttl: 300,
            default_ttl: Some(3600),
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}
