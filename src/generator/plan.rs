//! Batch planning shared by the blocking and async generators
//!
//! Nothing here performs I/O. The drivers ask what to request next, perform
//! the call, and report back what arrived.

use super::config::GeneratorConfig;
use crate::transport::ApiRequest;

/// One planned call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRequest {
    /// Identifiers requested
    pub count: u64,
    /// Offset of the first identifier
    pub sequence: u64,
}

/// Splits a (possibly unbounded) request into batches
///
/// Offsets advance by the requested count of each batch. Planning stops
/// when the limit is reached or when the server returns fewer identifiers
/// than requested, which signals an exhausted series.
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    batch_size: u64,
    limit: Option<u64>,
    next_sequence: u64,
    produced: u64,
    batches: u64,
    exhausted: bool,
}

impl BatchPlanner {
    /// Planner for `config`, capped at `limit` when given
    pub fn new(config: &GeneratorConfig, limit: Option<u64>) -> Self {
        Self {
            batch_size: config.batch_size().max(1),
            limit,
            next_sequence: config.starting_sequence().unwrap_or(0),
            produced: 0,
            batches: 0,
            exhausted: false,
        }
    }

    /// Next batch to request, or `None` when generation is complete
    pub fn next_batch(&self) -> Option<BatchRequest> {
        if self.exhausted {
            return None;
        }
        let count = match self.limit {
            Some(limit) => self.batch_size.min(limit.saturating_sub(self.produced)),
            None => self.batch_size,
        };
        (count > 0).then_some(BatchRequest {
            count,
            sequence: self.next_sequence,
        })
    }

    /// Record the outcome of `batch`
    pub fn record(&mut self, batch: BatchRequest, received: u64) {
        self.batches += 1;
        self.produced += received.min(batch.count);
        self.next_sequence = batch.sequence.saturating_add(batch.count);
        if received < batch.count {
            self.exhausted = true;
        }
    }

    /// Identifiers produced so far
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// Batches completed so far
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Whether the server reported the end of the sequence
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// What an element pull means for the open batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulled {
    /// More elements may follow in this batch
    More,
    /// The batch delivered everything it asked for; close it
    BatchComplete,
}

#[derive(Debug, Clone, Copy)]
struct OpenBatch {
    batch: BatchRequest,
    received: u64,
}

/// Streaming state: at most one batch open at a time
///
/// The next batch is only planned once the open one has ended, so the
/// drivers never prefetch more than the batch being consumed.
#[derive(Debug, Clone)]
pub struct StreamCursor {
    config: GeneratorConfig,
    planner: BatchPlanner,
    open: Option<OpenBatch>,
    finished: bool,
}

impl StreamCursor {
    /// Cursor over `config`, honouring its limit
    pub fn new(config: GeneratorConfig) -> Self {
        let planner = BatchPlanner::new(&config, config.limit());
        Self {
            config,
            planner,
            open: None,
            finished: false,
        }
    }

    /// Configuration being streamed
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Whether a batch is open
    pub fn has_open_batch(&self) -> bool {
        self.open.is_some()
    }

    /// Open the next batch and return its request, or `None` when done
    pub fn open_next(&mut self) -> Option<ApiRequest> {
        if self.finished || self.open.is_some() {
            return None;
        }
        match self.planner.next_batch() {
            Some(batch) => {
                self.open = Some(OpenBatch { batch, received: 0 });
                Some(
                    self.config
                        .batch_request(batch.count, batch.sequence, self.config.streams()),
                )
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    /// Count one element delivered from the open batch
    pub fn pulled(&mut self) -> Pulled {
        match self.open.as_mut() {
            Some(open) => {
                open.received += 1;
                if open.received >= open.batch.count {
                    self.end_batch();
                    Pulled::BatchComplete
                } else {
                    Pulled::More
                }
            }
            None => Pulled::BatchComplete,
        }
    }

    /// The open batch ran out of elements
    pub fn end_batch(&mut self) {
        if let Some(open) = self.open.take() {
            self.planner.record(open.batch, open.received);
        }
    }

    /// Stop after a failure; nothing more will be requested
    pub fn fail(&mut self) {
        self.open = None;
        self.finished = true;
    }

    /// Elements yielded so far
    pub fn produced(&self) -> u64 {
        self.planner.produced() + self.open.map_or(0, |o| o.received)
    }

    /// Completed batches
    pub fn batches(&self) -> u64 {
        self.planner.batches()
    }

    /// Whether the stream has ended
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
