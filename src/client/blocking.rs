//! Thread-blocking client

use std::sync::Arc;

use super::calls::{self, Call, DEFAULT_TAGS_LIMIT};
use super::require_api_key;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::generator::{BlockingGenerator, GeneratorConfig};
use crate::retry::{RetryPolicy, RetryPolicyState};
use crate::transport::blocking::BlockingHttpTransport;
use crate::transport::BlockingTransport;
use crate::{
    DictionaryInfo, KeyInfo, PaginatedTags, PatternInfo, SeriesInfo, SeriesList, StatsItem,
    SubscriptionFeatures,
};

/// Blocking SlugKit client
///
/// Must not be created or used from inside an async runtime.
#[derive(Clone)]
pub struct BlockingClient {
    transport: Arc<dyn BlockingTransport>,
    policy: RetryPolicy,
    has_api_key: bool,
}

impl BlockingClient {
    /// Client over HTTP using `config`
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = BlockingHttpTransport::new(&config)?;
        Ok(Self::with_transport(
            Arc::new(transport),
            config.retry,
            config.has_api_key(),
        ))
    }

    /// Client configured from `SLUGKIT_*` environment variables
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Client over a custom transport
    pub fn with_transport(
        transport: Arc<dyn BlockingTransport>,
        policy: RetryPolicy,
        has_api_key: bool,
    ) -> Self {
        Self {
            transport,
            policy,
            has_api_key,
        }
    }

    /// Retry policy applied to every call
    pub fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Check that the service is reachable
    pub fn ping(&self) -> ClientResult<()> {
        self.run(calls::ping())
    }

    /// Describe the configured API key
    pub fn key_info(&self) -> ClientResult<KeyInfo> {
        self.run(calls::key_info())
    }

    /// Limits of the organisation's subscription
    pub fn limits(&self) -> ClientResult<SubscriptionFeatures> {
        self.run(calls::limits())
    }

    /// Series operations, scoped to the key's series until [`BlockingSeriesClient::named`]
    pub fn series(&self) -> ClientResult<BlockingSeriesClient> {
        require_api_key(self.has_api_key)?;
        Ok(BlockingSeriesClient {
            client: self.clone(),
            series: None,
        })
    }

    /// Pattern and dictionary operations
    pub fn forge(&self) -> ClientResult<BlockingForgeClient> {
        require_api_key(self.has_api_key)?;
        Ok(BlockingForgeClient {
            client: self.clone(),
        })
    }

    fn generator(&self, config: GeneratorConfig) -> BlockingGenerator {
        BlockingGenerator::new(Arc::clone(&self.transport), self.policy, config)
    }

    fn run<T>(&self, call: Call<T>) -> ClientResult<T> {
        let mut state = RetryPolicyState::new();
        let value = self
            .policy
            .execute_blocking(&mut state, call.endpoint(), call.idempotency, || {
                self.transport.call(&call.request)
            })?;
        call.decode(value)
    }
}

/// Operations on one series
#[derive(Clone)]
pub struct BlockingSeriesClient {
    client: BlockingClient,
    series: Option<String>,
}

impl BlockingSeriesClient {
    /// Handle for the series `slug`
    #[must_use]
    pub fn named(&self, slug: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            series: Some(slug.into()),
        }
    }

    /// Series slug, `None` for the key's own series
    pub fn slug(&self) -> Option<&str> {
        self.series.as_deref()
    }

    /// Generator over this series with default settings
    pub fn generator(&self) -> BlockingGenerator {
        let config = match &self.series {
            Some(slug) => GeneratorConfig::for_series(slug.as_str()),
            None => GeneratorConfig::new(),
        };
        self.client.generator(config)
    }

    /// Consuming generator
    pub fn mint(&self) -> BlockingGenerator {
        self.generator()
    }

    /// Non-consuming preview generator
    pub fn slice(&self) -> BlockingGenerator {
        self.generator().with_dry_run()
    }

    /// Usage statistics
    pub fn stats(&self) -> ClientResult<Vec<StatsItem>> {
        self.client.run(calls::stats(self.slug()))
    }

    /// Series metadata
    pub fn info(&self) -> ClientResult<SeriesInfo> {
        self.client.run(calls::series_info(self.slug()))
    }

    /// Series visible to the key
    pub fn list(&self) -> ClientResult<SeriesList> {
        self.client.run(calls::series_list())
    }

    /// Register a new series
    pub fn create(&self, name: &str, pattern: &str) -> ClientResult<SeriesInfo> {
        self.client.run(calls::series_create(name, pattern))
    }

    /// Rename this series or change its pattern
    pub fn update(&self, name: &str, pattern: &str) -> ClientResult<SeriesInfo> {
        self.client
            .run(calls::series_update(self.slug(), name, pattern))
    }

    /// Delete this series
    pub fn delete(&self) -> ClientResult<()> {
        self.client.run(calls::series_delete(self.slug()))
    }

    /// Reset the series counter
    pub fn reset(&self) -> ClientResult<()> {
        self.client.run(calls::reset(self.slug()))
    }
}

/// Pattern-based generation and dictionary metadata
#[derive(Clone)]
pub struct BlockingForgeClient {
    client: BlockingClient,
}

impl BlockingForgeClient {
    /// Batched generator over `pattern`
    pub fn generator(&self, pattern: impl Into<String>) -> BlockingGenerator {
        self.client.generator(GeneratorConfig::for_pattern(pattern))
    }

    /// Generate `count` identifiers from `pattern` in a single call
    pub fn forge(
        &self,
        pattern: &str,
        seed: Option<&str>,
        sequence: Option<u64>,
        count: u64,
    ) -> ClientResult<Vec<String>> {
        self.client
            .run(calls::forge(pattern, seed, sequence, count))
    }

    /// Capacity and complexity of `pattern`
    pub fn pattern_info(&self, pattern: &str) -> ClientResult<PatternInfo> {
        self.client.run(calls::pattern_info(pattern))
    }

    /// Size of every dictionary
    pub fn dictionary_info(&self) -> ClientResult<Vec<DictionaryInfo>> {
        self.client.run(calls::dictionary_info())
    }

    /// First page of tags for dictionary `kind`
    pub fn dictionary_tags(&self, kind: &str) -> ClientResult<PaginatedTags> {
        self.dictionary_tags_page(kind, DEFAULT_TAGS_LIMIT, 0)
    }

    /// One page of tags for dictionary `kind`
    pub fn dictionary_tags_page(
        &self,
        kind: &str,
        limit: u32,
        offset: u32,
    ) -> ClientResult<PaginatedTags> {
        self.client.run(calls::dictionary_tags(kind, limit, offset))
    }
}
