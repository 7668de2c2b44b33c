//! Immutable generation request description

use serde_json::{json, Map, Value};

use crate::retry::Idempotency;
use crate::transport::{ApiRequest, Endpoint};

/// Identifiers requested per call unless overridden
pub const DEFAULT_BATCH_SIZE: u64 = 100_000;

/// What the identifiers are generated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A registered series; `None` is the series bound to the API key
    Series(Option<String>),
    /// An ad-hoc pattern, optionally seeded
    Pattern {
        /// Pattern source, parsed by the server
        pattern: String,
        /// Seed making the output reproducible
        seed: Option<String>,
    },
}

/// Description of one generation operation
///
/// Every `with_*` method returns a new value and leaves `self` untouched, so
/// a configuration can be branched and shared freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    limit: Option<u64>,
    batch_size: u64,
    starting_sequence: Option<u64>,
    dry_run: bool,
    target: Target,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            limit: None,
            batch_size: DEFAULT_BATCH_SIZE,
            starting_sequence: None,
            dry_run: false,
            target: Target::Series(None),
        }
    }
}

impl GeneratorConfig {
    /// Configuration for the series bound to the API key
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for a named series
    pub fn for_series(slug: impl Into<String>) -> Self {
        Self::default().with_series(slug)
    }

    /// Configuration for an ad-hoc pattern
    pub fn for_pattern(pattern: impl Into<String>) -> Self {
        Self::default().with_pattern(pattern)
    }

    /// Upper bound on identifiers produced
    #[must_use]
    pub fn with_limit(&self, limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..self.clone()
        }
    }

    /// Remove the upper bound
    #[must_use]
    pub fn unlimited(&self) -> Self {
        Self {
            limit: None,
            ..self.clone()
        }
    }

    /// Identifiers requested per call; zero is treated as one
    #[must_use]
    pub fn with_batch_size(&self, batch_size: u64) -> Self {
        Self {
            batch_size: batch_size.max(1),
            ..self.clone()
        }
    }

    /// Start at an explicit offset of the generation sequence
    #[must_use]
    pub fn starting_from(&self, sequence: u64) -> Self {
        Self {
            starting_sequence: Some(sequence),
            ..self.clone()
        }
    }

    /// Preview without advancing the series counter
    #[must_use]
    pub fn with_dry_run(&self) -> Self {
        Self {
            dry_run: true,
            ..self.clone()
        }
    }

    /// Target a named series
    #[must_use]
    pub fn with_series(&self, slug: impl Into<String>) -> Self {
        Self {
            target: Target::Series(Some(slug.into())),
            ..self.clone()
        }
    }

    /// Target an ad-hoc pattern, keeping the seed if one is set
    #[must_use]
    pub fn with_pattern(&self, pattern: impl Into<String>) -> Self {
        let seed = match &self.target {
            Target::Pattern { seed, .. } => seed.clone(),
            Target::Series(_) => None,
        };
        Self {
            target: Target::Pattern {
                pattern: pattern.into(),
                seed,
            },
            ..self.clone()
        }
    }

    /// Seed the pattern target; no effect on series targets
    #[must_use]
    pub fn with_seed(&self, seed: impl Into<String>) -> Self {
        match &self.target {
            Target::Pattern { pattern, .. } => Self {
                target: Target::Pattern {
                    pattern: pattern.clone(),
                    seed: Some(seed.into()),
                },
                ..self.clone()
            },
            Target::Series(_) => self.clone(),
        }
    }

    /// Upper bound on identifiers produced
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Identifiers requested per call
    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Explicit starting offset, if set
    pub fn starting_sequence(&self) -> Option<u64> {
        self.starting_sequence
    }

    /// Whether this is a non-consuming preview
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Generation target
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Endpoint the batches are sent to
    pub fn endpoint(&self) -> Endpoint {
        match (&self.target, self.dry_run) {
            (Target::Pattern { .. }, _) => Endpoint::Forge,
            (Target::Series(_), true) => Endpoint::Slice,
            (Target::Series(_), false) => Endpoint::Mint,
        }
    }

    /// Whether batches use the line-delimited endpoint variant
    pub fn streams(&self) -> bool {
        self.endpoint().supports_streaming()
    }

    /// Retry safety of the batches
    ///
    /// Only a mint without an explicit offset advances a counter the client
    /// cannot reproduce.
    pub fn idempotency(&self) -> Idempotency {
        if self.endpoint() == Endpoint::Mint && self.starting_sequence.is_none() {
            Idempotency::Consuming
        } else {
            Idempotency::Idempotent
        }
    }

    /// Request for one batch
    ///
    /// `sequence` is the planner's offset for the batch; it is only sent when
    /// the server needs it (previews, explicit offsets, pattern batches after
    /// the first).
    pub fn batch_request(&self, count: u64, sequence: u64, streaming: bool) -> ApiRequest {
        let mut body = Map::new();

        match &self.target {
            Target::Series(series) => {
                body.insert("count".to_string(), json!(count));
                if self.dry_run || self.starting_sequence.is_some() {
                    body.insert("sequence".to_string(), json!(sequence));
                }
                if let Some(series) = series {
                    body.insert("series".to_string(), json!(series));
                }
            }
            Target::Pattern { pattern, seed } => {
                body.insert("pattern".to_string(), json!(pattern));
                if let Some(seed) = seed {
                    body.insert("seed".to_string(), json!(seed));
                }
                if self.starting_sequence.is_some() || sequence > 0 {
                    body.insert("sequence".to_string(), json!(sequence));
                }
                body.insert("count".to_string(), json!(count));
            }
        }

        let request = ApiRequest::new(self.endpoint()).with_body(Value::Object(body));
        if streaming {
            request.streaming()
        } else {
            request
        }
    }
}
