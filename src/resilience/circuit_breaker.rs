//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: upstream assumed down, requests fail fast
//! - Half-Open: probation, the next request is a probe
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= trip_threshold
//! Open → Half-Open: on allow(), once cooldown has elapsed
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails
//! ```
//!
//! # Design Decisions
//! - Per-upstream circuit breaker (not global)
//! - Fail fast in Open state (no waiting for timeout)
//! - A single failed probe re-opens immediately, no threshold
//! - `allow()` is advisory: concurrent callers may both be admitted

use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::config::BreakerConfig;
use crate::resilience::clock::{Clock, SystemClock};

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    /// Set when entering Open; untouched until the next Open transition.
    opened_at: Option<Instant>,
}

impl Inner {
    fn transition(&mut self, to: CircuitState) {
        tracing::info!(from = %self.state, to = %to, "Circuit breaker state change");
        self.state = to;
    }
}

/// Health gate for a single upstream.
///
/// Every operation takes the one lock for its whole read-modify-write, so
/// calls never interleave. Network calls are not serialized by it.
#[derive(Debug)]
pub struct Breaker {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl Breaker {
    /// Create a Closed breaker using the system clock.
    pub fn new(config: BreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a Closed breaker driven by `clock`.
    pub fn with_clock(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The guarded fields are always left consistent, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return true if an attempt may proceed now.
    ///
    /// The only mutation is Open → HalfOpen once the cooldown has strictly
    /// elapsed since the breaker opened.
    pub fn allow(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|opened| self.clock.now().saturating_duration_since(opened))
                    .unwrap_or_default();
                if elapsed > self.config.cooldown() {
                    inner.consecutive_failures = 0;
                    inner.transition(CircuitState::HalfOpen);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful attempt.
    pub fn on_success(&self) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            inner.transition(CircuitState::Closed);
        }
        inner.consecutive_failures = 0;
    }

    /// Record a failed attempt. Must follow an `allow()` that returned true.
    pub fn on_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);

        let trip = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.consecutive_failures >= self.config.trip_threshold,
            CircuitState::Open => false,
        };
        if trip {
            inner.opened_at = Some(self.clock.now());
            inner.transition(CircuitState::Open);
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Instant of the most recent Open transition.
    pub fn opened_at(&self) -> Option<Instant> {
        self.lock().opened_at
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
        }
    }
}

impl Default for Breaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::clock::MockClock;
    use std::time::Duration;

    fn breaker() -> (Breaker, MockClock) {
        let clock = MockClock::new();
        let breaker = Breaker::with_clock(BreakerConfig::default(), Arc::new(clock.clone()));
        (breaker, clock)
    }

    fn open(breaker: &Breaker) {
        for _ in 0..3 {
            assert!(breaker.allow());
            breaker.on_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_starts_closed() {
        let (breaker, _) = breaker();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
        assert!(breaker.opened_at().is_none());
        assert!(breaker.allow());
    }

    #[test]
    fn test_opens_exactly_on_third_failure() {
        let (breaker, clock) = breaker();

        breaker.on_failure();
        clock.advance(Duration::from_secs(1));
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 2);
        assert!(breaker.opened_at().is_none());

        clock.advance(Duration::from_secs(1));
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.opened_at(), Some(clock.now()));
    }

    #[test]
    fn test_success_between_failures_resets_count() {
        let (breaker, _) = breaker();
        breaker.on_failure();
        breaker.on_failure();
        breaker.on_success();
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 1);
    }

    #[test]
    fn test_open_denies_until_cooldown_strictly_elapsed() {
        let (breaker, clock) = breaker();
        open(&breaker);

        assert!(!breaker.allow());
        clock.advance(Duration::from_secs(5));
        assert!(!breaker.allow());
        clock.advance(Duration::from_secs(5));
        // Exactly 10s is not enough.
        assert!(!breaker.allow());
        assert_eq!(breaker.state(), CircuitState::Open);

        clock.advance(Duration::from_millis(1));
        assert!(breaker.allow());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let (breaker, clock) = breaker();
        open(&breaker);
        let first_open = breaker.opened_at();

        clock.advance(Duration::from_secs(11));
        assert!(breaker.allow());
        breaker.on_failure();

        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.consecutive_failures(), 1);
        assert_ne!(breaker.opened_at(), first_open);
        assert_eq!(breaker.opened_at(), Some(clock.now()));
        assert!(!breaker.allow());
    }

    #[test]
    fn test_half_open_allows_probe_repeatedly() {
        let (breaker, clock) = breaker();
        open(&breaker);
        clock.advance(Duration::from_secs(11));

        assert!(breaker.allow());
        assert!(breaker.allow());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_success_closes() {
        let (breaker, clock) = breaker();
        open(&breaker);
        clock.advance(Duration::from_secs(11));
        assert!(breaker.allow());

        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn test_success_while_open_closes() {
        let (breaker, _) = breaker();
        open(&breaker);

        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
        assert!(breaker.allow());
    }

    #[test]
    fn test_on_success_idempotent_when_closed() {
        let (breaker, _) = breaker();
        for _ in 0..5 {
            breaker.on_success();
            assert_eq!(
                breaker.snapshot(),
                BreakerSnapshot {
                    state: CircuitState::Closed,
                    consecutive_failures: 0
                }
            );
        }
    }

    #[test]
    fn test_custom_threshold() {
        let clock = MockClock::new();
        let config = BreakerConfig {
            trip_threshold: 1,
            cooldown_secs: 2,
        };
        let breaker = Breaker::with_clock(config, Arc::new(clock.clone()));

        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        clock.advance(Duration::from_secs(3));
        assert!(breaker.allow());
    }

    #[test]
    fn test_concurrent_failures_are_counted() {
        let breaker = Arc::new(Breaker::new(BreakerConfig {
            trip_threshold: 1000,
            cooldown_secs: 10,
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let breaker = breaker.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        breaker.on_failure();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(breaker.consecutive_failures(), 800);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_snapshot_serializes() {
        let (breaker, _) = breaker();
        breaker.on_failure();
        let json = serde_json::to_string(&breaker.snapshot()).unwrap();
        assert_eq!(json, r#"{"state":"Closed","consecutive_failures":1}"#);
    }
}
