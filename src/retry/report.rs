//! Retry message formatting
//!
//! Produces the consistent, user-facing lines logged while the engine retries
//! and when it finally gives up.

use std::time::Duration;

use super::{RetryPolicy, RetryPolicyState};
use crate::error::ErrorClassification;
use crate::transport::Endpoint;

/// Snapshot of a retry decision for message formatting
#[derive(Debug, Clone)]
pub struct RetryReport {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    /// Attempt bound of the policy
    pub max_attempts: u32,
    /// Failure that triggered the decision
    pub cause: ErrorClassification,
    /// Wait until the next attempt
    pub delay: Duration,
    /// Total wait so far
    pub cumulative_delay: Duration,
    /// Operation being retried
    pub endpoint: Endpoint,
}

impl RetryReport {
    /// Build a report from the engine state
    pub fn new(
        policy: &RetryPolicy,
        state: &RetryPolicyState,
        endpoint: Endpoint,
        cause: &ErrorClassification,
        delay: Duration,
    ) -> Self {
        Self {
            attempt: state.attempt_count,
            max_attempts: policy.max_attempts,
            cause: cause.clone(),
            delay,
            cumulative_delay: state.cumulative_delay,
            endpoint,
        }
    }

    /// One-line message logged before waiting
    pub fn format_retry(&self) -> String {
        let source = if self.cause.retry_after.is_some() {
            " (server hint)"
        } else {
            ""
        };
        let mut message = format!(
            "Retrying {} (attempt {}/{}) after {} - waiting {:.1} seconds{}...",
            self.endpoint,
            self.attempt,
            self.max_attempts,
            self.cause.kind.description(),
            self.delay.as_secs_f64(),
            source
        );
        if let Some(quota) = &self.cause.quota {
            message.push_str(&format!(" [remaining: {quota}]"));
        }
        message
    }

    /// Multi-line summary logged when the attempt bound is reached
    pub fn format_failure(&self) -> String {
        let mut lines = vec![
            format!(
                "[FAILED] {} failed after {} attempts",
                self.endpoint, self.attempt
            ),
            format!("  Last error: {}", self.cause),
            format!(
                "  Waited: {:.1} seconds in total",
                self.cumulative_delay.as_secs_f64()
            ),
            "  Suggestions:".to_string(),
        ];
        for suggestion in self.cause.kind.suggestions() {
            lines.push(format!("    - {suggestion}"));
        }
        lines.push(format!(
            "    - Try increasing --max-retries (current: {})",
            self.max_attempts
        ));
        lines.join("\n")
    }
}
