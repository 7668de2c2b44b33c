//! Async retry driver

use std::future::Future;

use super::{Idempotency, RetryDecision, RetryPolicy, RetryPolicyState};
use crate::error::ClientResult;
use crate::transport::{Endpoint, TransportResult};

impl RetryPolicy {
    /// Run `attempt` until it succeeds, fails permanently, or the attempt
    /// bound is reached, suspending on a tokio timer between attempts
    ///
    /// `state` is reset first and reflects the whole operation afterwards.
    /// Dropping the returned future abandons the in-flight attempt.
    pub async fn execute<T, F, Fut>(
        &self,
        state: &mut RetryPolicyState,
        endpoint: Endpoint,
        idempotency: Idempotency,
        mut attempt: F,
    ) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        state.reset();
        loop {
            state.begin_attempt();
            match attempt().await {
                Ok(value) => {
                    self.after_success(state, endpoint);
                    return Ok(value);
                }
                Err(failure) => match self.after_failure(state, endpoint, idempotency, &failure) {
                    RetryDecision::Retry { delay, .. } => tokio::time::sleep(delay).await,
                    RetryDecision::Fail(err) => return Err(err),
                },
            }
        }
    }
}
