//! Circuit breaker guarding the Yahoo endpoints.
//!
//! A 403 opens it at once; a run of failed requests (429s included) opens
//! it too. While open every request is refused until the cooldown passes,
//! after which the next check closes it again.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Cooldown after the breaker opens.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30 * 60);

/// Failed requests in a row that open the breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Closed { failures: u32 },
    Open { since: Instant },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    gate: Mutex<Gate>,
    cooldown: Duration,
    threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_threshold(cooldown, DEFAULT_FAILURE_THRESHOLD)
    }

    pub fn with_threshold(cooldown: Duration, threshold: u32) -> Self {
        Self {
            gate: Mutex::new(Gate::Closed { failures: 0 }),
            cooldown,
            threshold: threshold.max(1),
        }
    }

    /// The breaker the live provider uses.
    pub fn default_provider() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }

    fn gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when a request may go out. Closes an expired breaker.
    pub fn is_allowed(&self) -> bool {
        let mut gate = self.gate();
        if let Gate::Open { since } = *gate {
            if since.elapsed() < self.cooldown {
                return false;
            }
            tracing::info!("circuit breaker cooldown over");
            *gate = Gate::Closed { failures: 0 };
        }
        true
    }

    pub fn record_success(&self) {
        let mut gate = self.gate();
        if let Gate::Closed { failures } = &mut *gate {
            *failures = 0;
        }
    }

    pub fn record_failure(&self) {
        let mut gate = self.gate();
        if let Gate::Closed { failures } = *gate {
            let failures = failures + 1;
            if failures >= self.threshold {
                tracing::warn!(failures, "circuit breaker opened after repeated failures");
                *gate = Gate::Open {
                    since: Instant::now(),
                };
            } else {
                *gate = Gate::Closed { failures };
            }
        }
    }

    /// Open immediately, e.g. on 403 Forbidden.
    pub fn trip(&self) {
        tracing::warn!("circuit breaker opened by a forbidden response");
        *self.gate() = Gate::Open {
            since: Instant::now(),
        };
    }

    /// Time left before requests are allowed again.
    pub fn remaining_cooldown(&self) -> Duration {
        match *self.gate() {
            Gate::Closed { .. } => Duration::ZERO,
            Gate::Open { since } => self.cooldown.saturating_sub(since.elapsed()),
        }
    }
}
