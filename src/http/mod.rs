//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → client.rs (ResilientClient::fetch, retry loop)
//!     → request.rs (request ID per logical fetch)
//!     → upstream (e.g. server.rs, the flaky demo upstream)
//!     → error.rs (typed FetchError back to the caller)
//! ```

pub mod client;
pub mod error;
pub mod request;
pub mod server;

pub use client::ResilientClient;
pub use error::{FetchError, FetchResult};
pub use request::{RequestId, X_REQUEST_ID};
pub use server::FlakyServer;
