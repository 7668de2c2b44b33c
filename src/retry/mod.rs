//! Retry and backoff engine
//!
//! The decision logic ([`RetryPolicyState::on_failure`]) is independent of how
//! the caller waits. [`RetryPolicy::execute_blocking`] sleeps the thread,
//! [`RetryPolicy::execute`] suspends the task on a tokio timer; both delegate
//! every decision to the same code.

use rand::Rng;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::{classify_failure, ClientError, ErrorClassification, ErrorKind};
use crate::transport::{Endpoint, TransportFailure};

pub mod asynchronous;
pub mod blocking;
pub mod report;

pub use report::RetryReport;

/// Default attempt bound, first attempt included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound of the computed exponential delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Largest jitter added on top of the exponential delay, as a fraction of it
pub const MAX_JITTER_FRACTION: f64 = 0.25;

/// Bounded exponential backoff with jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per logical operation, first attempt included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap applied to the exponential delay
    pub max_delay: Duration,
    /// Whether random jitter is added
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that makes a single attempt
    pub fn no_retries() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Set the attempt bound (at least one attempt is always made)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base delay
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Set the delay cap
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Disable jitter, making delays deterministic
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Exponential part of the delay after failed attempt `attempt` (1-based)
    pub fn exponential_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay after failed attempt `attempt` when the server gave no hint
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = self.exponential_delay(attempt);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let fraction = rand::rng().random_range(0.0..=MAX_JITTER_FRACTION);
        delay + delay.mul_f64(fraction)
    }

    /// Classify a failure, update `state` and decide what happens next
    ///
    /// Logging and metrics for the decision happen here so both drivers
    /// report identically.
    pub fn after_failure(
        &self,
        state: &mut RetryPolicyState,
        endpoint: Endpoint,
        idempotency: Idempotency,
        failure: &TransportFailure,
    ) -> RetryDecision {
        let classification = classify_failure(failure);
        let decision = state.on_failure(self, endpoint, idempotency, classification);

        match &decision {
            RetryDecision::Retry { delay, cause } => {
                let report = RetryReport::new(self, state, endpoint, cause, *delay);
                warn!(
                    endpoint = %endpoint,
                    kind = %cause.kind,
                    attempt = state.attempt_count,
                    max_attempts = self.max_attempts,
                    "{}",
                    report.format_retry()
                );
                crate::metrics::record_retry_backoff(endpoint, *delay, state.attempt_count);
            }
            RetryDecision::Fail(err) if err.is_exhausted() => {
                if let Some(cause) = err.classification() {
                    let report = RetryReport::new(self, state, endpoint, cause, Duration::ZERO);
                    error!("{}", report.format_failure());
                }
            }
            RetryDecision::Fail(_) => {}
        }

        decision
    }

    /// Log a success that needed more than one attempt
    pub(crate) fn after_success(&self, state: &RetryPolicyState, endpoint: Endpoint) {
        if state.attempt_count > 1 {
            info!(
                endpoint = %endpoint,
                attempt = state.attempt_count,
                waited_ms = state.cumulative_delay.as_millis() as u64,
                "Retry attempt {}/{} succeeded for {}",
                state.attempt_count,
                self.max_attempts,
                endpoint
            );
        }
    }
}

/// How safe it is to repeat an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Repeating the request has no additional effect
    Idempotent,
    /// The request advances server-side state and may have been applied even
    /// though no response arrived
    Consuming,
}

impl Idempotency {
    /// Whether a failure of `kind` may be retried
    ///
    /// A rate-limit rejection means the request was refused before it ran, so
    /// it is safe to repeat even for consuming operations.
    pub fn allows_retry(&self, kind: ErrorKind) -> bool {
        match self {
            Idempotency::Idempotent => kind.is_retryable(),
            Idempotency::Consuming => kind == ErrorKind::RateLimit,
        }
    }
}

/// Progress of one logical operation through the retry policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicyState {
    /// Attempts started so far
    pub attempt_count: u32,
    /// Total time spent waiting between attempts
    pub cumulative_delay: Duration,
    /// Kind of the most recent failure
    pub last_error_kind: Option<ErrorKind>,
}

impl RetryPolicyState {
    /// Fresh state
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all progress before a new logical operation
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Count a new attempt and return its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt_count += 1;
        self.attempt_count
    }

    /// Decide how to proceed after the current attempt failed
    pub fn on_failure(
        &mut self,
        policy: &RetryPolicy,
        endpoint: Endpoint,
        idempotency: Idempotency,
        classification: ErrorClassification,
    ) -> RetryDecision {
        self.last_error_kind = Some(classification.kind);
        let operation = endpoint.name();

        if !(classification.retryable && idempotency.allows_retry(classification.kind)) {
            return RetryDecision::Fail(ClientError::Api {
                operation,
                classification,
            });
        }

        if self.attempt_count >= policy.max_attempts {
            return RetryDecision::Fail(ClientError::ExhaustedRetries {
                operation,
                attempts: self.attempt_count,
                classification,
            });
        }

        let delay = classification
            .retry_after
            .unwrap_or_else(|| policy.backoff(self.attempt_count));
        self.cumulative_delay += delay;

        RetryDecision::Retry {
            delay,
            cause: classification,
        }
    }
}

/// Outcome of [`RetryPolicyState::on_failure`]
#[derive(Debug, Clone)]
pub enum RetryDecision {
    /// Wait `delay`, then attempt again
    Retry {
        /// Time to wait
        delay: Duration,
        /// Failure being retried
        cause: ErrorClassification,
    },
    /// Surface the error to the caller
    Fail(ClientError),
}
