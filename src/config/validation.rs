//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, timeouts > 0, rates in [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FetchConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::FetchConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be at least {min}")]
    TooSmall { field: &'static str, min: u64 },

    #[error("server.failure_rate must be within [0, 1], got {0}")]
    FailureRateOutOfRange(f64),

    #[error("driver.target_url is not a valid URL: {0}")]
    InvalidUrl(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &FetchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let minimums: [(&'static str, u64, u64); 4] = [
        ("breaker.trip_threshold", config.breaker.trip_threshold as u64, 1),
        ("breaker.cooldown_secs", config.breaker.cooldown_secs, 1),
        ("retry.max_attempts", config.retry.max_attempts as u64, 1),
        ("retry.request_timeout_secs", config.retry.request_timeout_secs, 1),
    ];
    for (field, value, min) in minimums {
        if value < min {
            errors.push(ValidationError::TooSmall { field, min });
        }
    }

    let rate = config.server.failure_rate;
    if !(0.0..=1.0).contains(&rate) {
        errors.push(ValidationError::FailureRateOutOfRange(rate));
    }

    if Url::parse(&config.driver.target_url).is_err() {
        errors.push(ValidationError::InvalidUrl(config.driver.target_url.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
