//! Bounded retry with exponential backoff, as an explicit state machine.
//!
//! # States
//!
//! ```text
//! Attempting(n) ── success ───────────────────────▶ Succeeded
//! Attempting(n) ── client error ──────────────────▶ FailedTerminal
//! Attempting(n) ── transient, n + 1 < max ────────▶ Backoff(n, delay)
//! Attempting(n) ── transient, n + 1 == max ───────▶ FailedExhausted
//! Backoff(n, _) ── resume ────────────────────────▶ Attempting(n + 1)
//! ```
//!
//! The machine never sleeps. The driver performs the attempt, reports the
//! [`AttemptOutcome`], and when the machine enters [`RetryState::Backoff`]
//! waits through a [`Sleeper`] before calling [`RetryMachine::resume`].
//! Tests substitute a sleeper that only records the requested delays.

use std::time::Duration;

use async_trait::async_trait;

/// Classification of one finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// HTTP 2xx.
    Success,
    /// A status that retrying cannot fix (4xx other than 429, and any
    /// non-2xx status that is not transient).
    ClientError,
    /// HTTP 429 or 5xx.
    Transient,
    /// The exchange did not complete: DNS, connect, reset, body read.
    TransportFailure,
}

impl AttemptOutcome {
    /// Classifies a completed HTTP exchange by status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            429 | 500..=599 => Self::Transient,
            _ => Self::ClientError,
        }
    }

    /// Returns `true` if another attempt may help.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::TransportFailure)
    }
}

/// Retry limits and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `0` is treated as `1`.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// One initial attempt plus two retries.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// One second before the first retry, two before the second.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Effective attempt cap, at least one.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }

    /// Delay before retry `retry_index` (0-indexed): `base * 2^retry_index`.
    #[must_use]
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry_index);
        self.base_delay.saturating_mul(factor)
    }
}

/// Where a retry sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `attempt` (0-indexed) is in flight or about to start.
    Attempting {
        /// Zero-based attempt index.
        attempt: u32,
    },
    /// Attempt `attempt` failed transiently; wait `delay` before the next.
    Backoff {
        /// Zero-based index of the attempt that just failed.
        attempt: u32,
        /// How long to wait before resuming.
        delay: Duration,
    },
    /// The last attempt returned 2xx.
    Succeeded,
    /// The last attempt returned a status that must not be retried.
    FailedTerminal,
    /// Every allowed attempt failed transiently.
    FailedExhausted,
}

impl RetryState {
    /// Returns `true` for the three final states.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::FailedTerminal | Self::FailedExhausted
        )
    }
}

/// Drives a single retry sequence under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryMachine {
    policy: RetryPolicy,
    state: RetryState,
    attempts_made: u32,
}

impl RetryMachine {
    /// Starts a sequence at `Attempting { attempt: 0 }`.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Attempting { attempt: 0 },
            attempts_made: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RetryState {
        self.state
    }

    /// Number of attempts whose outcome has been observed.
    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Records the outcome of the in-flight attempt and returns the new state.
    ///
    /// Outside `Attempting` the outcome is ignored and the state is returned
    /// unchanged.
    pub fn observe(&mut self, outcome: AttemptOutcome) -> RetryState {
        let RetryState::Attempting { attempt } = self.state else {
            return self.state;
        };
        self.attempts_made += 1;
        self.state = match outcome {
            AttemptOutcome::Success => RetryState::Succeeded,
            AttemptOutcome::ClientError => RetryState::FailedTerminal,
            AttemptOutcome::Transient | AttemptOutcome::TransportFailure => {
                if attempt + 1 < self.policy.attempts() {
                    RetryState::Backoff {
                        attempt,
                        delay: self.policy.delay_for(attempt),
                    }
                } else {
                    RetryState::FailedExhausted
                }
            }
        };
        self.state
    }

    /// Leaves `Backoff` for the next attempt. A no-op in any other state.
    pub fn resume(&mut self) -> RetryState {
        if let RetryState::Backoff { attempt, .. } = self.state {
            self.state = RetryState::Attempting {
                attempt: attempt + 1,
            };
        }
        self.state
    }
}

/// Suspends the current task between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
