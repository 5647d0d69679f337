//! Linear backoff between retry attempts.

use std::time::Duration;

/// Delay to wait after failed attempt number `attempt` (1-based).
///
/// Attempt n sleeps `n * step`; attempt 0 never sleeps.
pub fn calculate_backoff(attempt: u32, step: Duration) -> Duration {
    step.saturating_mul(attempt)
}
