//! Thread-blocking retry driver

use std::thread;

use super::{Idempotency, RetryDecision, RetryPolicy, RetryPolicyState};
use crate::error::ClientResult;
use crate::transport::{Endpoint, TransportResult};

impl RetryPolicy {
    /// Run `attempt` until it succeeds, fails permanently, or the attempt
    /// bound is reached, sleeping the current thread between attempts
    ///
    /// `state` is reset first and reflects the whole operation afterwards.
    pub fn execute_blocking<T, F>(
        &self,
        state: &mut RetryPolicyState,
        endpoint: Endpoint,
        idempotency: Idempotency,
        mut attempt: F,
    ) -> ClientResult<T>
    where
        F: FnMut() -> TransportResult<T>,
    {
        state.reset();
        loop {
            state.begin_attempt();
            match attempt() {
                Ok(value) => {
                    self.after_success(state, endpoint);
                    return Ok(value);
                }
                Err(failure) => match self.after_failure(state, endpoint, idempotency, &failure) {
                    RetryDecision::Retry { delay, .. } => thread::sleep(delay),
                    RetryDecision::Fail(err) => return Err(err),
                },
            }
        }
    }
}
