//! Circuit Breaker Module
//!
//! Per-tier failure isolation. A breaker counts failed tier calls and, once
//! the configured limit is reached, short-circuits further calls until the
//! reset timeout has elapsed. The first call after that is a trial: success
//! closes the circuit again.

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{CacheError, Result};

// == Circuit State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls flow through and failures are counted
    Closed,
    /// Calls are rejected without reaching the tier
    Open,
    /// Reset timeout elapsed; calls are let through as trials
    HalfOpen,
}

// == Error Threshold ==
/// Immutable breaker policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorThreshold {
    /// Failures that open the circuit
    pub failure_limit: u32,
    /// A failure further than this from the previous one restarts the count
    pub evaluation_window: Duration,
    /// How long the circuit stays open before a trial call is allowed
    pub reset_timeout: Duration,
}

impl ErrorThreshold {
    pub fn new(
        failure_limit: u32,
        evaluation_window: Duration,
        reset_timeout: Duration,
    ) -> Result<Self> {
        if failure_limit == 0 {
            return Err(CacheError::Config(
                "breaker failure limit must be at least 1".to_string(),
            ));
        }
        if evaluation_window.is_zero() {
            return Err(CacheError::Config(
                "breaker evaluation window must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            failure_limit,
            evaluation_window,
            reset_timeout,
        })
    }
}

impl Default for ErrorThreshold {
    fn default() -> Self {
        Self {
            failure_limit: 5,
            evaluation_window: Duration::from_secs(60),
            reset_timeout: Duration::from_secs(30),
        }
    }
}

// == Breaker Snapshot ==
/// Point-in-time view of a breaker for observers.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    /// Calls refused while open
    pub rejected_calls: u64,
    /// Milliseconds since the last recorded failure
    pub last_failure_ago_ms: Option<u64>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    rejected_calls: u64,
}

// == Circuit Breaker ==
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Name of the guarded tier
    name: String,
    threshold: ErrorThreshold,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, threshold: ErrorThreshold) -> Self {
        Self {
            name: name.into(),
            threshold,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
                rejected_calls: 0,
            }),
        }
    }

    // == Execute ==
    /// Runs `operation` unless the circuit is open.
    ///
    /// Tier failures from `operation` are recorded; every error is returned
    /// unchanged. Request-level errors (see [`CacheError::is_tier_failure`])
    /// leave the breaker untouched. A rejected call yields
    /// [`CacheError::CircuitOpen`] and never invokes `operation`. The lock
    /// is not held while `operation` runs.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.admit().await?;

        let result = operation().await;

        match &result {
            Ok(_) => self.on_success().await,
            Err(err) if err.is_tier_failure() => self.on_failure(err).await,
            Err(_) => {}
        }

        result
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    pub async fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock().await;
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            rejected_calls: inner.rejected_calls,
            last_failure_ago_ms: inner
                .last_failure
                .map(|at| at.elapsed().as_millis() as u64),
        }
    }

    async fn admit(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if inner.state != CircuitState::Open {
            return Ok(());
        }

        let elapsed = inner
            .last_failure
            .map(|at| at.elapsed() >= self.threshold.reset_timeout)
            .unwrap_or(true);

        if elapsed {
            inner.state = CircuitState::HalfOpen;
            info!(tier = %self.name, "circuit half-open, allowing trial call");
            Ok(())
        } else {
            inner.rejected_calls += 1;
            Err(CacheError::CircuitOpen(self.name.clone()))
        }
    }

    async fn on_success(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            inner.failure_count = 0;
            info!(tier = %self.name, "circuit closed, tier recovered");
        }
    }

    async fn on_failure(&self, err: &CacheError) {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        if let Some(last) = inner.last_failure {
            if now.duration_since(last) > self.threshold.evaluation_window {
                inner.failure_count = 0;
            }
        }

        inner.failure_count += 1;
        inner.last_failure = Some(now);

        if inner.failure_count >= self.threshold.failure_limit {
            inner.state = CircuitState::Open;
            inner.failure_count = 0;
            warn!(
                tier = %self.name,
                error = %err,
                reset_after_ms = self.threshold.reset_timeout.as_millis() as u64,
                "circuit opened"
            );
        }
    }
}
