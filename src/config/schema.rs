//! Configuration schema definitions.
//!
//! Every field has a default equal to the fixed resilience policy, so an
//! empty config file (or no file at all) yields the standard behavior.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FetchConfig {
    /// Circuit breaker policy.
    pub breaker: BreakerConfig,

    /// Retry and timeout policy.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Demo driver settings.
    pub driver: DriverConfig,

    /// Flaky demo upstream settings.
    pub server: ServerConfig,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures while Closed before the breaker opens.
    pub trip_threshold: u32,

    /// Seconds an Open breaker waits before allowing a probe.
    pub cooldown_secs: u64,
}

impl BreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            trip_threshold: 3,
            cooldown_secs: 10,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per fetch, including the first one.
    pub max_attempts: u32,

    /// Linear backoff step in milliseconds (attempt n sleeps n * step).
    pub backoff_step_ms: u64,

    /// Per-attempt request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Count connection-level errors as retryable failures.
    /// When false they are returned immediately without touching the breaker.
    pub retry_transport_errors: bool,
}

impl RetryConfig {
    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step_ms: 1000,
            request_timeout_secs: 5,
            retry_transport_errors: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Demo driver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DriverConfig {
    /// URL fetched on every iteration.
    pub target_url: String,

    /// Number of fetches to issue.
    pub iterations: u32,

    /// Pause between fetches in milliseconds.
    pub interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            target_url: "http://127.0.0.1:8000/example".to_string(),
            iterations: 100,
            interval_ms: 1000,
        }
    }
}

/// Flaky upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Probability in [0, 1] that a request is answered with 502.
    pub failure_rate: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            failure_rate: 0.5,
        }
    }
}
