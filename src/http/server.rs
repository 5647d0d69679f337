//! Flaky demo upstream.
//!
//! # Responsibilities
//! - Serve `GET /example`
//! - Fail a configurable share of requests with 502 Bad Gateway
//! - Shut down gracefully on the lifecycle signal
//!
//! Used by the `flaky-server` binary and by integration tests as a
//! realistic misbehaving upstream.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use rand::Rng;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::http::request::X_REQUEST_ID;

/// Body returned on success.
pub const SUCCESS_BODY: &str = "Message from server!";

#[derive(Clone)]
struct FlakyState {
    failure_rate: f64,
}

/// HTTP server that randomly answers with 502.
pub struct FlakyServer {
    router: Router,
    config: ServerConfig,
}

impl FlakyServer {
    pub fn new(config: ServerConfig) -> Self {
        let state = Arc::new(FlakyState {
            failure_rate: effective_failure_rate(config.failure_rate),
        });
        let router = Router::new()
            .route("/example", get(example_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Self { router, config }
    }

    /// Serve on `listener` until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            failure_rate = self.config.failure_rate,
            "Flaky server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Flaky server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Clamp to [0, 1]; NaN and infinities never inject failures.
fn effective_failure_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

async fn example_handler(
    State(state): State<Arc<FlakyState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    if rand::thread_rng().gen_bool(state.failure_rate) {
        tracing::debug!(request_id = %request_id, "Injecting failure");
        return StatusCode::BAD_GATEWAY.into_response();
    }

    tracing::debug!(request_id = %request_id, "Serving request");
    (StatusCode::OK, SUCCESS_BODY).into_response()
}
