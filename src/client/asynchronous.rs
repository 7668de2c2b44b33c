//! Async client

use std::sync::Arc;

use super::calls::{self, Call, DEFAULT_TAGS_LIMIT};
use super::require_api_key;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::generator::{AsyncGenerator, GeneratorConfig};
use crate::retry::{RetryPolicy, RetryPolicyState};
use crate::transport::http::HttpTransport;
use crate::transport::AsyncTransport;
use crate::{
    DictionaryInfo, KeyInfo, PaginatedTags, PatternInfo, SeriesInfo, SeriesList, StatsItem,
    SubscriptionFeatures,
};

/// Async SlugKit client
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn AsyncTransport>,
    policy: RetryPolicy,
    has_api_key: bool,
}

impl Client {
    /// Client over HTTP using `config`
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config)?;
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
        transport: Arc<dyn AsyncTransport>,
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
    pub async fn ping(&self) -> ClientResult<()> {
        self.run(calls::ping()).await
    }

    /// Describe the configured API key
    pub async fn key_info(&self) -> ClientResult<KeyInfo> {
        self.run(calls::key_info()).await
    }

    /// Limits of the organisation's subscription
    pub async fn limits(&self) -> ClientResult<SubscriptionFeatures> {
        self.run(calls::limits()).await
    }

    /// Series operations, scoped to the key's series until [`SeriesClient::named`]
    pub fn series(&self) -> ClientResult<SeriesClient> {
        require_api_key(self.has_api_key)?;
        Ok(SeriesClient {
            client: self.clone(),
            series: None,
        })
    }

    /// Pattern and dictionary operations
    pub fn forge(&self) -> ClientResult<ForgeClient> {
        require_api_key(self.has_api_key)?;
        Ok(ForgeClient {
            client: self.clone(),
        })
    }

    fn generator(&self, config: GeneratorConfig) -> AsyncGenerator {
        AsyncGenerator::new(Arc::clone(&self.transport), self.policy, config)
    }

    async fn run<T>(&self, call: Call<T>) -> ClientResult<T> {
        let mut state = RetryPolicyState::new();
        let transport = &self.transport;
        let request = &call.request;
        let value = self
            .policy
            .execute(&mut state, call.endpoint(), call.idempotency, move || {
                transport.call(request)
            })
            .await?;
        call.decode(value)
    }
}

/// Operations on one series
#[derive(Clone)]
pub struct SeriesClient {
    client: Client,
    series: Option<String>,
}

impl SeriesClient {
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
    pub fn generator(&self) -> AsyncGenerator {
        let config = match &self.series {
            Some(slug) => GeneratorConfig::for_series(slug.as_str()),
            None => GeneratorConfig::new(),
        };
        self.client.generator(config)
    }

    /// Consuming generator
    pub fn mint(&self) -> AsyncGenerator {
        self.generator()
    }

    /// Non-consuming preview generator
    pub fn slice(&self) -> AsyncGenerator {
        self.generator().with_dry_run()
    }

    /// Usage statistics
    pub async fn stats(&self) -> ClientResult<Vec<StatsItem>> {
        self.client.run(calls::stats(self.slug())).await
    }

    /// Series metadata
    pub async fn info(&self) -> ClientResult<SeriesInfo> {
        self.client.run(calls::series_info(self.slug())).await
    }

    /// Series visible to the key
    pub async fn list(&self) -> ClientResult<SeriesList> {
        self.client.run(calls::series_list()).await
    }

    /// Register a new series
    pub async fn create(&self, name: &str, pattern: &str) -> ClientResult<SeriesInfo> {
        self.client.run(calls::series_create(name, pattern)).await
    }

    /// Rename this series or change its pattern
    pub async fn update(&self, name: &str, pattern: &str) -> ClientResult<SeriesInfo> {
        self.client
            .run(calls::series_update(self.slug(), name, pattern))
            .await
    }

    /// Delete this series
    pub async fn delete(&self) -> ClientResult<()> {
        self.client.run(calls::series_delete(self.slug())).await
    }

    /// Reset the series counter
    pub async fn reset(&self) -> ClientResult<()> {
        self.client.run(calls::reset(self.slug())).await
    }
}

/// Pattern-based generation and dictionary metadata
#[derive(Clone)]
pub struct ForgeClient {
    client: Client,
}

impl ForgeClient {
    /// Batched generator over `pattern`
    pub fn generator(&self, pattern: impl Into<String>) -> AsyncGenerator {
        self.client.generator(GeneratorConfig::for_pattern(pattern))
    }

    /// Generate `count` identifiers from `pattern` in a single call
    pub async fn forge(
        &self,
        pattern: &str,
        seed: Option<&str>,
        sequence: Option<u64>,
        count: u64,
    ) -> ClientResult<Vec<String>> {
        self.client
            .run(calls::forge(pattern, seed, sequence, count))
            .await
    }

    /// Capacity and complexity of `pattern`
    pub async fn pattern_info(&self, pattern: &str) -> ClientResult<PatternInfo> {
        self.client.run(calls::pattern_info(pattern)).await
    }

    /// Size of every dictionary
    pub async fn dictionary_info(&self) -> ClientResult<Vec<DictionaryInfo>> {
        self.client.run(calls::dictionary_info()).await
    }

    /// First page of tags for dictionary `kind`
    pub async fn dictionary_tags(&self, kind: &str) -> ClientResult<PaginatedTags> {
        self.dictionary_tags_page(kind, DEFAULT_TAGS_LIMIT, 0).await
    }

    /// One page of tags for dictionary `kind`
    pub async fn dictionary_tags_page(
        &self,
        kind: &str,
        limit: u32,
        offset: u32,
    ) -> ClientResult<PaginatedTags> {
        self.client
            .run(calls::dictionary_tags(kind, limit, offset))
            .await
    }
}
