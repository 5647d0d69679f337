//! One breaker per upstream.
//!
//! Breakers are keyed by URL authority (`host:port`), so every path on the
//! same upstream shares health state while different upstreams stay
//! isolated.

use dashmap::DashMap;
use std::sync::Arc;
use url::Url;

use crate::config::BreakerConfig;
use crate::resilience::circuit_breaker::Breaker;
use crate::resilience::clock::{Clock, SystemClock};

/// Lazily creates and hands out per-upstream breakers.
#[derive(Debug)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    breakers: DashMap<String, Arc<Breaker>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            breakers: DashMap::new(),
        }
    }

    /// Breaker guarding the upstream `url` points at.
    pub fn breaker_for(&self, url: &str) -> Result<Arc<Breaker>, url::ParseError> {
        let key = upstream_key(&Url::parse(url)?);
        let breaker = self
            .breakers
            .entry(key)
            .or_insert_with(|| {
                Arc::new(Breaker::with_clock(self.config.clone(), self.clock.clone()))
            })
            .clone();
        Ok(breaker)
    }

    /// Number of upstreams seen so far.
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

fn upstream_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
