//! Thread-blocking generator

use std::sync::Arc;

use super::config::GeneratorConfig;
use super::plan::{BatchPlanner, Pulled, StreamCursor};
use crate::error::{ClientError, ClientResult};
use crate::retry::{RetryPolicy, RetryPolicyState};
use crate::transport::lines::{decode_identifiers, decode_line};
use crate::transport::{ApiRequest, BlockingTransport, LineIter, TransportFailure};

/// Generator whose calls block the current thread
#[derive(Clone)]
pub struct BlockingGenerator {
    transport: Arc<dyn BlockingTransport>,
    policy: RetryPolicy,
    config: GeneratorConfig,
}

impl BlockingGenerator {
    /// Generator over `config` using `transport`
    pub fn new(
        transport: Arc<dyn BlockingTransport>,
        policy: RetryPolicy,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            transport,
            policy,
            config,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Same generator with a different configuration
    #[must_use]
    pub fn with_config(&self, config: GeneratorConfig) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy,
            config,
        }
    }

    /// See [`GeneratorConfig::with_limit`]
    #[must_use]
    pub fn with_limit(&self, limit: u64) -> Self {
        self.with_config(self.config.with_limit(limit))
    }

    /// See [`GeneratorConfig::with_batch_size`]
    #[must_use]
    pub fn with_batch_size(&self, batch_size: u64) -> Self {
        self.with_config(self.config.with_batch_size(batch_size))
    }

    /// See [`GeneratorConfig::starting_from`]
    #[must_use]
    pub fn starting_from(&self, sequence: u64) -> Self {
        self.with_config(self.config.starting_from(sequence))
    }

    /// See [`GeneratorConfig::with_dry_run`]
    #[must_use]
    pub fn with_dry_run(&self) -> Self {
        self.with_config(self.config.with_dry_run())
    }

    /// Generate `count` identifiers in order
    ///
    /// Fewer are returned only if the server runs out of identifiers.
    pub fn generate(&self, count: u64) -> ClientResult<Vec<String>> {
        let endpoint = self.config.endpoint();
        let idempotency = self.config.idempotency();
        let mut planner = BatchPlanner::new(&self.config, Some(count));
        let mut state = RetryPolicyState::new();
        let mut slugs = Vec::with_capacity(count.min(self.config.batch_size()) as usize);

        while let Some(batch) = planner.next_batch() {
            let request = self.config.batch_request(batch.count, batch.sequence, false);
            let ids = self.policy.execute_blocking(&mut state, endpoint, idempotency, || {
                self.transport.call(&request).and_then(decode_identifiers)
            })?;

            let received = ids.len() as u64;
            slugs.extend(ids.into_iter().take(batch.count as usize));
            planner.record(batch, received);
        }

        Ok(slugs)
    }

    /// Lazily pull identifiers one at a time
    ///
    /// The next batch is requested only when the current one is used up.
    pub fn stream(&self) -> BlockingSlugStream {
        BlockingSlugStream {
            transport: Arc::clone(&self.transport),
            policy: self.policy,
            cursor: StreamCursor::new(self.config.clone()),
            lines: None,
            state: RetryPolicyState::new(),
        }
    }
}

impl IntoIterator for &BlockingGenerator {
    type Item = ClientResult<String>;
    type IntoIter = BlockingSlugStream;

    fn into_iter(self) -> Self::IntoIter {
        self.stream()
    }
}

/// Iterator returned by [`BlockingGenerator::stream`]
///
/// Dropping it closes the open response.
pub struct BlockingSlugStream {
    transport: Arc<dyn BlockingTransport>,
    policy: RetryPolicy,
    cursor: StreamCursor,
    lines: Option<LineIter>,
    state: RetryPolicyState,
}

impl BlockingSlugStream {
    /// Identifiers yielded so far
    pub fn produced(&self) -> u64 {
        self.cursor.produced()
    }

    /// Retry state of the most recent batch request
    pub fn retry_state(&self) -> &RetryPolicyState {
        &self.state
    }

    fn open(&mut self, request: &ApiRequest) -> ClientResult<LineIter> {
        let endpoint = request.endpoint;
        let idempotency = self.cursor.config().idempotency();
        let transport = &self.transport;

        if request.is_streaming() {
            return self
                .policy
                .execute_blocking(&mut self.state, endpoint, idempotency, || {
                    transport.call_lines(request)
                });
        }

        let ids = self
            .policy
            .execute_blocking(&mut self.state, endpoint, idempotency, || {
                transport.call(request).and_then(decode_identifiers)
            })?;
        Ok(Box::new(
            ids.into_iter().map(Ok::<String, TransportFailure>),
        ))
    }

    fn fail(&mut self, failure: &TransportFailure) -> ClientError {
        self.lines = None;
        self.cursor.fail();
        ClientError::from_failure(self.cursor.config().endpoint().name(), failure)
    }
}

impl Iterator for BlockingSlugStream {
    type Item = ClientResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(lines) = self.lines.as_mut() {
                match lines.next() {
                    Some(Ok(line)) => match decode_line(&line) {
                        Ok(Some(id)) => {
                            if self.cursor.pulled() == Pulled::BatchComplete {
                                self.lines = None;
                            }
                            return Some(Ok(id));
                        }
                        Ok(None) => continue,
                        Err(failure) => return Some(Err(self.fail(&failure))),
                    },
                    Some(Err(failure)) => return Some(Err(self.fail(&failure))),
                    None => {
                        self.lines = None;
                        self.cursor.end_batch();
                        continue;
                    }
                }
            }

            let request = self.cursor.open_next()?;
            match self.open(&request) {
                Ok(lines) => self.lines = Some(lines),
                Err(err) => {
                    self.cursor.fail();
                    return Some(Err(err));
                }
            }
        }
    }
}
