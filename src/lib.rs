//! Resilient HTTP client: bounded retry with linear backoff behind a
//! per-upstream circuit breaker.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::FetchConfig;
pub use http::{FetchError, ResilientClient};
pub use resilience::{Breaker, BreakerRegistry, CircuitState};
