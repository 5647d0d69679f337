//! Resilient HTTP client.
//!
//! # Responsibilities
//! - Gate every attempt through the upstream's circuit breaker
//! - Issue GET requests with a per-attempt timeout
//! - Classify responses and report outcomes to the breaker
//! - Retry retryable failures with linear backoff, up to the attempt cap
//!
//! # Design Decisions
//! - The breaker is re-checked before every attempt, including retries
//! - A denied attempt fails fast and sends nothing
//! - Non-retryable statuses are returned untouched and never counted
//!   against the breaker

use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::Instrument;
use url::Url;

use crate::config::RetryConfig;
use crate::http::error::{FetchError, FetchResult};
use crate::http::request::{RequestId, X_REQUEST_ID};
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::circuit_breaker::Breaker;
use crate::resilience::retries::{classify_status, classify_transport_error, RequestOutcome};

/// HTTP client combining bounded retry with a circuit breaker.
///
/// Cheap to clone; clones share the connection pool and the breaker.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    http: Client,
    breaker: Option<Arc<Breaker>>,
    retry: RetryConfig,
}

impl ResilientClient {
    /// Create a client guarded by `breaker`.
    pub fn new(retry: RetryConfig, breaker: Arc<Breaker>) -> FetchResult<Self> {
        Self::build(retry, Some(breaker))
    }

    /// Create a client that retries but has no breaker.
    pub fn retry_only(retry: RetryConfig) -> FetchResult<Self> {
        Self::build(retry, None)
    }

    fn build(retry: RetryConfig, breaker: Option<Arc<Breaker>>) -> FetchResult<Self> {
        // Proxies are not read from the environment.
        let http = Client::builder()
            .timeout(retry.request_timeout())
            .no_proxy()
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            http,
            breaker,
            retry,
        })
    }

    /// The breaker guarding this client, if any.
    pub fn breaker(&self) -> Option<&Arc<Breaker>> {
        self.breaker.as_ref()
    }

    /// GET `url` and return the body of a 200 response.
    pub async fn fetch(&self, url: &str) -> FetchResult<String> {
        let url = Url::parse(url)?;
        let request_id = RequestId::new();
        let span = tracing::info_span!("fetch", request_id = %request_id, url = %url);

        self.fetch_with_retries(url, request_id).instrument(span).await
    }

    async fn fetch_with_retries(&self, url: Url, request_id: RequestId) -> FetchResult<String> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;

            if !self.allow() {
                tracing::warn!(attempt = attempts, "Request not allowed, circuit open");
                return Err(FetchError::CircuitOpen);
            }

            tracing::debug!(attempt = attempts, "Sending request");
            let result = self
                .http
                .get(url.clone())
                .header(X_REQUEST_ID, request_id.to_string())
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(attempt = attempts, error = %e, "Upstream transport error");
                    if classify_transport_error(self.retry.retry_transport_errors)
                        != RequestOutcome::RetryableFailure
                    {
                        return Err(FetchError::Transport(e));
                    }

                    self.record_failure();
                    if attempts >= max_attempts {
                        return Err(FetchError::Transport(e));
                    }
                    self.backoff(attempts).await;
                    continue;
                }
            };

            let status = response.status();
            match classify_status(status) {
                RequestOutcome::Success => {
                    self.record_success();
                    tracing::info!(attempt = attempts, "Request succeeded");
                    return response.text().await.map_err(|e| {
                        tracing::warn!(error = %e, "Failed to read response body");
                        FetchError::Body(e)
                    });
                }
                RequestOutcome::RetryableFailure => {
                    self.record_failure();
                    tracing::warn!(
                        attempt = attempts,
                        status = %status,
                        "Upstream returned retryable status"
                    );
                    if attempts >= max_attempts {
                        return Err(exhausted(attempts, status));
                    }
                    self.backoff(attempts).await;
                }
                RequestOutcome::NonRetryableFailure => {
                    tracing::warn!(
                        attempt = attempts,
                        status = %status,
                        "Status code not retryable"
                    );
                    return Err(FetchError::UnexpectedStatus(status));
                }
            }
        }
    }

    fn allow(&self) -> bool {
        self.breaker.as_ref().map_or(true, |b| b.allow())
    }

    fn record_success(&self) {
        if let Some(breaker) = &self.breaker {
            breaker.on_success();
        }
    }

    fn record_failure(&self) {
        if let Some(breaker) = &self.breaker {
            breaker.on_failure();
        }
    }

    async fn backoff(&self, attempt: u32) {
        let delay = calculate_backoff(attempt, self.retry.backoff_step());
        tracing::info!(attempt, delay = ?delay, "Retrying request");
        tokio::time::sleep(delay).await;
    }
}

fn exhausted(attempts: u32, last_status: StatusCode) -> FetchError {
    tracing::error!(attempts, status = %last_status, "Retries exhausted");
    FetchError::ExhaustedRetries {
        attempts,
        last_status,
    }
}
