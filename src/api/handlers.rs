//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};
use crate::orchestrator::{Lookup, TieredCache};

/// Application state shared across all handlers.
///
/// The tiered cache synchronizes internally, so it is shared through a
/// plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TieredCache>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: TieredCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Fails if the tier layout or breaker thresholds are malformed.
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        Ok(Self::new(TieredCache::initialize(config)?))
    }
}

/// Handler for PUT /set
///
/// Stores a value in the tiers chosen by placement.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let placement = state.cache.set(&req.key, req.value, req.options).await?;

    Ok(Json(SetResponse::new(req.key, placement)))
}

/// Handler for GET /get/:key
///
/// Answers from the fastest tier holding the key. Distinguishes a plain
/// miss (404) from every tier being unavailable (503).
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.lookup(&key).await {
        Lookup::Hit { value, tier } => Ok(Json(GetResponse::new(key, value, tier))),
        Lookup::Miss => Err(CacheError::NotFound(key)),
        Lookup::Unavailable => Err(CacheError::Unavailable),
    }
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from every tier.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.delete(&key).await? {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.cache.clear().await?;
    Ok(Json(ClearResponse::cleared()))
}

/// Handler for GET /stats
///
/// Returns per-tier statistics and circuit states.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn test_state() -> AppState {
        let config = Config {
            tiers: "l1=4KB,l2=16KB".to_string(),
            ..Config::default()
        };
        AppState::from_config(&config).unwrap()
    }

    fn set_request(key: &str, value: serde_json::Value) -> SetRequest {
        serde_json::from_value(json!({"key": key, "value": value})).unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let result = set_handler(State(state.clone()), Json(set_request("test_key", json!("test_value")))).await;
        assert!(result.is_ok());

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!("test_value"));
        assert_eq!(response.tier, "l1");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();

        set_handler(State(state.clone()), Json(set_request("to_delete", json!(1))))
            .await
            .unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = test_state();
        set_handler(State(state.clone()), Json(set_request("a", json!(1))))
            .await
            .unwrap();

        clear_handler(State(state.clone())).await.unwrap();

        let result = get_handler(State(state), Path("a".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.tiers.len(), 2);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();

        let result = set_handler(State(state), Json(set_request("", json!("value")))).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_set_too_large_for_every_tier() {
        let state = test_state();
        let huge = json!("x".repeat(20 * 1024));

        let result = set_handler(State(state), Json(set_request("huge", huge))).await;
        assert!(matches!(result, Err(CacheError::CapacityExceeded { .. })));
    }
}
