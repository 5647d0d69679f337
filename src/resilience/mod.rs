//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! fetch(url):
//!     → circuit_breaker.rs (allow? fail fast when Open)
//!     → one GET with request timeout
//!     → retries.rs (classify outcome)
//!     → circuit_breaker.rs (record success/failure)
//!     → On retryable failure: backoff.rs (linear delay), try again
//! ```
//!
//! # Design Decisions
//! - Breakers are explicit values, one per upstream (registry.rs)
//! - Time is read through clock.rs so cooldowns can be tested
//! - Backoff only between attempts, never after the last one

pub mod backoff;
pub mod circuit_breaker;
pub mod clock;
pub mod registry;
pub mod retries;

pub use circuit_breaker::{Breaker, BreakerSnapshot, CircuitState};
pub use clock::{Clock, MockClock, SystemClock};
pub use registry::BreakerRegistry;
pub use retries::RequestOutcome;
