//! Errors returned by `ResilientClient::fetch`.

use reqwest::StatusCode;
use thiserror::Error;

/// Why a fetch did not produce a body.
///
/// None of these are fatal to the process; the caller decides whether to
/// log and continue or abort.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The breaker denied the attempt; no request was sent.
    #[error("request not allowed: circuit open")]
    CircuitOpen,

    /// Connection-level failure (refused, timeout, DNS).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Every attempt ended in a retryable status.
    #[error("retries exhausted after {attempts} attempts (last status {last_status})")]
    ExhaustedRetries { attempts: u32, last_status: StatusCode },

    /// Status outside both the success and retryable sets.
    #[error("unexpected status code {0}")]
    UnexpectedStatus(StatusCode),

    /// The upstream answered 200 but the body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
