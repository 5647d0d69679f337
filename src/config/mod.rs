//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FetchConfig (validated, immutable)
//!     → BreakerConfig / RetryConfig handed to the client
//! ```
//!
//! # Design Decisions
//! - All fields have defaults equal to the fixed resilience policy
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, revalidate, ConfigError};
pub use schema::BreakerConfig;
pub use schema::DriverConfig;
pub use schema::FetchConfig;
pub use schema::ObservabilityConfig;
pub use schema::RetryConfig;
pub use schema::ServerConfig;
