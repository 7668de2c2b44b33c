//! # SlugKit Client Library
//!
//! Client for the SlugKit service, which generates human-readable unique
//! identifiers ("slugs") from server-side patterns and series.
//!
//! ## Features
//!
//! - **Batched generation**: bulk and lazily streamed identifiers, in server order
//! - **Previews**: non-consuming dry runs starting at any offset
//! - **Rate-limit aware retries**: bounded exponential backoff honouring `Retry-After`
//! - **Classified errors**: every failure maps to a fixed [`ErrorKind`]
//! - **Blocking and async**: both variants share the same planning and retry logic
//!
//! ## Quick Start
//!
//! ```no_run
//! use slugkit::{Client, ClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("https://dev.slugkit.dev/api/v1").with_api_key("my-key");
//! let client = Client::new(config)?;
//!
//! // Mint 10 identifiers from the series bound to the key
//! let slugs = client.series()?.mint().generate(10).await?;
//! for slug in slugs {
//!     println!("{slug}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`transport`] - Single HTTP calls, JSON and line-delimited bodies
//! - [`error`] - Failure classification and the client error type
//! - [`retry`] - Backoff policy and the blocking/async retry drivers
//! - [`generator`] - Batch planning and identifier streams
//! - [`client`] - Public entry points for series, forge and account calls
//!
//! ## Response Types
//!
//! - [`StatsItem`] - Usage statistics per event type and period
//! - [`SeriesInfo`] - Series metadata and capacity
//! - [`PatternInfo`] - Pattern capacity and complexity
//! - [`DictionaryInfo`], [`DictionaryTag`], [`PaginatedTags`] - Dictionary metadata
//! - [`KeyInfo`] - Calling API key
//! - [`SubscriptionFeatures`] - Plan limits; `None` means not available

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// CLI command implementations
pub mod cli;

/// Public client entry points
pub mod client;

/// Client configuration
pub mod config;

/// Error classification
pub mod error;

/// Generator and stream controller
pub mod generator;

/// Observability metrics
pub mod metrics;

/// Retry and backoff engine
pub mod retry;

/// Graceful shutdown coordination
pub mod shutdown;

/// HTTP transport
pub mod transport;

// Re-export commonly used types
pub use client::{
    BlockingClient, BlockingForgeClient, BlockingSeriesClient, Client, ForgeClient, SeriesClient,
};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorClassification, ErrorKind, QuotaRemaining};
pub use generator::{AsyncGenerator, BlockingGenerator, GeneratorConfig, SlugStream, Target};
pub use retry::{Idempotency, RetryPolicy, RetryPolicyState};

/// Kind of generation event counted in statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Pattern generation
    Forge,
    /// Consuming series generation
    Mint,
    /// Preview generation
    Slice,
    /// Counter reset
    Reset,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::Forge => "forge",
            EventType::Mint => "mint",
            EventType::Slice => "slice",
            EventType::Reset => "reset",
        };
        write!(f, "{s}")
    }
}

/// Aggregation period of a statistics row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    /// Current hour
    Hour,
    /// Current day
    Day,
    /// Current week
    Week,
    /// Current month
    Month,
    /// Current year
    Year,
    /// All time
    Total,
}

impl std::fmt::Display for DatePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DatePart::Hour => "hour",
            DatePart::Day => "day",
            DatePart::Week => "week",
            DatePart::Month => "month",
            DatePart::Year => "year",
            DatePart::Total => "total",
        };
        write!(f, "{s}")
    }
}

/// One statistics row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsItem {
    /// Event counted
    pub event_type: EventType,
    /// Aggregation period
    pub date_part: DatePart,
    /// Identifiers produced
    pub total_count: u64,
    /// Requests served
    pub request_count: u64,
    /// Total server time in microseconds
    pub total_duration_us: u64,
    /// Mean server time per request in microseconds
    pub avg_duration_us: f64,
}

/// Series metadata
///
/// Capacity and counters are decimal strings because they can exceed 64 bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesInfo {
    /// Series slug
    pub slug: String,
    /// Owning organisation
    pub org_slug: String,
    /// Display name, when set
    #[serde(default)]
    pub name: Option<String>,
    /// Generation pattern
    pub pattern: String,
    /// Longest identifier the pattern can produce
    pub max_pattern_length: u32,
    /// Total identifiers the pattern can produce
    pub capacity: String,
    /// Identifiers minted so far
    pub generated_count: String,
    /// Last modification time as reported by the server
    pub mtime: String,
}

impl SeriesInfo {
    /// Identifiers left before the series is exhausted
    pub fn remaining_capacity(&self) -> Option<u128> {
        let capacity: u128 = self.capacity.parse().ok()?;
        let generated: u128 = self.generated_count.parse().ok()?;
        Some(capacity.saturating_sub(generated))
    }

    /// Parsed modification time, if it is RFC 3339
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.mtime)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Series available to the key, slug to display name
pub type SeriesList = BTreeMap<String, String>;

/// Pattern metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternInfo {
    /// Normalised pattern
    pub pattern: String,
    /// Total identifiers the pattern can produce, as a decimal string
    pub capacity: String,
    /// Longest identifier the pattern can produce
    pub max_slug_length: u32,
    /// Complexity score
    pub complexity: u32,
    /// Number of pattern components
    pub components: u32,
}

/// Size of one dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryInfo {
    /// Dictionary kind, e.g. `noun`
    pub kind: String,
    /// Words in the dictionary
    pub count: u64,
}

/// Tag that selects a subset of a dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryTag {
    /// Dictionary kind
    pub kind: String,
    /// Tag name
    pub tag: String,
    /// Description, when provided
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the tag must be requested explicitly
    pub opt_in: bool,
    /// Words carrying the tag
    pub word_count: u64,
}

/// One page of dictionary tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedTags {
    /// Tags on this page
    pub data: Vec<DictionaryTag>,
    /// Page size requested
    pub limit: u32,
    /// Offset of the page
    pub offset: u32,
    /// Tags in total
    pub total: u64,
    /// Whether another page follows
    pub has_more: bool,
}

/// Scope an API key is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScope {
    /// Organisation-wide key
    Org,
    /// Key bound to a single series
    Series,
}

impl std::fmt::Display for KeyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyScope::Org => write!(f, "org"),
            KeyScope::Series => write!(f, "series"),
        }
    }
}

/// The calling API key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Key type
    #[serde(rename = "type")]
    pub key_type: String,
    /// Scope of the key
    pub key_scope: KeyScope,
    /// Key slug
    pub slug: String,
    /// Owning organisation
    pub org_slug: String,
    /// Series the key is bound to, for series keys
    #[serde(default)]
    pub series_slug: Option<String>,
    /// Granted permissions
    pub scopes: Vec<String>,
    /// Whether the key is active
    pub enabled: bool,
}

/// Limits and features of the organisation's plan
///
/// Every field is optional: `None` means the limit or feature is not
/// available on the plan, which is different from `Some(0)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFeatures {
    /// Plan name
    #[serde(default)]
    pub plan: Option<String>,
    /// Requests allowed per minute
    #[serde(default)]
    pub req_per_minute: Option<u64>,
    /// Requests allowed per day
    #[serde(default)]
    pub req_per_day: Option<u64>,
    /// Requests allowed per month
    #[serde(default)]
    pub req_per_month: Option<u64>,
    /// Requests allowed over the subscription lifetime
    #[serde(default)]
    pub req_lifetime: Option<u64>,
    /// Largest `count` accepted in one request
    #[serde(default)]
    pub max_batch_size: Option<u64>,
    /// Series the organisation may register
    #[serde(default)]
    pub max_series: Option<u64>,
    /// Longest pattern accepted
    #[serde(default)]
    pub max_pattern_length: Option<u64>,
    /// Whether line-delimited streaming endpoints are enabled
    #[serde(default)]
    pub streaming: Option<bool>,
    /// Whether custom dictionaries are enabled
    #[serde(default)]
    pub custom_dictionaries: Option<bool>,
}

impl SubscriptionFeatures {
    /// Limits as (label, value) pairs for display; `None` values are "not available"
    pub fn limits(&self) -> Vec<(&'static str, Option<u64>)> {
        vec![
            ("Requests per minute", self.req_per_minute),
            ("Requests per day", self.req_per_day),
            ("Requests per month", self.req_per_month),
            ("Requests lifetime", self.req_lifetime),
            ("Max batch size", self.max_batch_size),
            ("Max series", self.max_series),
            ("Max pattern length", self.max_pattern_length),
        ]
    }
}
