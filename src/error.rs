//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for tiers, breakers, the orchestrator and the server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in any tier
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A value can never fit in the tier, even after evicting everything
    #[error("Tier '{tier}' cannot hold {required} bytes (capacity {capacity} bytes)")]
    CapacityExceeded {
        tier: String,
        required: u64,
        capacity: u64,
    },

    /// The tier's circuit breaker rejected the call without invoking it
    #[error("Circuit open for tier '{0}'")]
    CircuitOpen(String),

    /// The underlying store failed
    #[error("Tier '{tier}' failed: {message}")]
    Tier { tier: String, message: String },

    /// Every tier failed to answer a lookup
    #[error("All cache tiers are unavailable")]
    Unavailable,

    /// The value could not be serialized for size accounting
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed configuration detected at initialization
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true when the error came from a breaker short-circuit
    /// rather than from the tier itself.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CacheError::CircuitOpen(_))
    }

    /// Returns true when the store itself failed. Request-level errors such
    /// as an invalid key or a value that can never fit are the caller's
    /// fault and say nothing about the tier's health.
    pub fn is_tier_failure(&self) -> bool {
        matches!(
            self,
            CacheError::Tier { .. } | CacheError::Serialization(_) | CacheError::Internal(_)
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::CapacityExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CacheError::CircuitOpen(_) | CacheError::Unavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::Tier { .. } => StatusCode::BAD_GATEWAY,
            CacheError::Config(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the tiered cache.
pub type Result<T> = std::result::Result<T, CacheError>;
