//! Attempt classification.
//!
//! # Responsibilities
//! - Map one HTTP attempt to a `RequestOutcome`
//! - Decide which failures are worth another attempt
//!
//! # Design Decisions
//! - Only 500, 502, 503, 504 are retryable status codes
//! - 4xx and other non-200 codes are NOT failures of the upstream
//! - Connection errors are retryable unless disabled in config

use reqwest::StatusCode;

/// Status codes that indicate a transient upstream failure.
pub const RETRYABLE_STATUS_CODES: [StatusCode; 4] = [
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Classification of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    RetryableFailure,
    NonRetryableFailure,
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

/// Classify an attempt that produced a response.
pub fn classify_status(status: StatusCode) -> RequestOutcome {
    if status == StatusCode::OK {
        RequestOutcome::Success
    } else if is_retryable_status(status) {
        RequestOutcome::RetryableFailure
    } else {
        RequestOutcome::NonRetryableFailure
    }
}

/// Classify an attempt that failed before a response arrived.
pub fn classify_transport_error(retry_transport_errors: bool) -> RequestOutcome {
    if retry_transport_errors {
        RequestOutcome::RetryableFailure
    } else {
        RequestOutcome::NonRetryableFailure
    }
}
