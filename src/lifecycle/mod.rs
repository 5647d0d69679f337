//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → flaky server drains, driver loop stops
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
