//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! breaker transitions, retry decisions, server requests
//!     → tracing events with structured fields
//!     → logging.rs (subscriber, filter, stdout)
//! ```
//!
//! # Design Decisions
//! - Request ID span wraps every attempt of one fetch
//! - No metrics export

pub mod logging;

pub use logging::init_tracing;
