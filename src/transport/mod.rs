//! Transport adapter for the SlugKit HTTP API
//!
//! A transport performs exactly one request per call and never retries. It
//! returns either the decoded JSON document, a lazily consumed sequence of
//! response lines, or a [`TransportFailure`] describing what went wrong. Retry
//! and classification live above this layer.

use async_trait::async_trait;
use futures_util::Stream;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::pin::Pin;

pub mod blocking;
pub mod http;
pub mod lines;

pub use blocking::BlockingHttpTransport;
pub use http::HttpTransport;

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "x-api-key";

/// Suffix appended to generation paths for the line-delimited variant
pub const STREAM_SUFFIX: &str = "/stream";

/// Logical API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Connectivity check
    Ping,
    /// Information about the calling API key
    KeyInfo,
    /// Subscription limits and features
    Limits,
    /// Consume-and-advance generation against a series
    Mint,
    /// Non-consuming preview generation
    Slice,
    /// Ad-hoc pattern generation
    Forge,
    /// Series counter reset
    Reset,
    /// Usage statistics
    Stats,
    /// Series metadata
    SeriesInfo,
    /// Series listing
    SeriesList,
    /// Series creation
    SeriesCreate,
    /// Series update
    SeriesUpdate,
    /// Series deletion
    SeriesDelete,
    /// Pattern metadata
    PatternInfo,
    /// Dictionary metadata
    DictionaryInfo,
    /// Paginated dictionary tags
    DictionaryTags,
}

impl Endpoint {
    /// Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Ping => "/ping",
            Endpoint::KeyInfo => "/key-info",
            Endpoint::Limits => "/limits",
            Endpoint::Mint => "/gen/mint",
            Endpoint::Slice => "/gen/slice",
            Endpoint::Forge => "/gen/forge",
            Endpoint::Reset => "/gen/reset",
            Endpoint::Stats => "/gen/stats/latest",
            Endpoint::SeriesInfo => "/gen/series-info",
            Endpoint::SeriesList => "/gen/series/list",
            Endpoint::SeriesCreate => "/gen/series/create",
            Endpoint::SeriesUpdate => "/gen/series/update",
            Endpoint::SeriesDelete => "/gen/series/delete",
            Endpoint::PatternInfo => "/gen/pattern-info",
            Endpoint::DictionaryInfo => "/gen/dictionary-info",
            Endpoint::DictionaryTags => "/gen/dictionary-tags",
        }
    }

    /// HTTP method used by the endpoint
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Ping
            | Endpoint::Limits
            | Endpoint::SeriesList
            | Endpoint::DictionaryInfo
            | Endpoint::DictionaryTags => Method::GET,
            Endpoint::SeriesUpdate => Method::PUT,
            Endpoint::SeriesDelete => Method::DELETE,
            _ => Method::POST,
        }
    }

    /// Short operation name used in logs, metrics and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Ping => "ping",
            Endpoint::KeyInfo => "key_info",
            Endpoint::Limits => "limits",
            Endpoint::Mint => "mint",
            Endpoint::Slice => "slice",
            Endpoint::Forge => "forge",
            Endpoint::Reset => "reset",
            Endpoint::Stats => "stats",
            Endpoint::SeriesInfo => "series_info",
            Endpoint::SeriesList => "series_list",
            Endpoint::SeriesCreate => "series_create",
            Endpoint::SeriesUpdate => "series_update",
            Endpoint::SeriesDelete => "series_delete",
            Endpoint::PatternInfo => "pattern_info",
            Endpoint::DictionaryInfo => "dictionary_info",
            Endpoint::DictionaryTags => "dictionary_tags",
        }
    }

    /// Whether the endpoint has a line-delimited `/stream` variant
    pub fn supports_streaming(&self) -> bool {
        matches!(self, Endpoint::Mint | Endpoint::Slice)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single request against the API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Logical endpoint
    pub endpoint: Endpoint,
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL
    pub path: String,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Request for an endpoint with its default method and path
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            method: endpoint.method(),
            path: endpoint.path().to_string(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a path segment, e.g. the dictionary kind
    pub fn with_path_segment(mut self, segment: &str) -> Self {
        self.path.push('/');
        self.path.push_str(segment);
        self
    }

    /// Switch to the line-delimited variant of the endpoint
    pub fn streaming(mut self) -> Self {
        if !self.path.ends_with(STREAM_SUFFIX) {
            self.path.push_str(STREAM_SUFFIX);
        }
        self
    }

    /// Whether this request targets a `/stream` path
    pub fn is_streaming(&self) -> bool {
        self.path.ends_with(STREAM_SUFFIX)
    }
}

/// Failure of a single transport call
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportFailure {
    /// No response was received (DNS, refused connection, timeout, reset)
    #[error("connection failed: {message}")]
    Connection {
        /// Error reported by the HTTP stack
        message: String,
        /// Whether the request hit the configured timeout
        timed_out: bool,
    },

    /// A response arrived but its body could not be decoded
    #[error("malformed response: {message}")]
    Malformed {
        /// Decoder error
        message: String,
    },

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code
        status: u16,
        /// Response headers
        headers: HeaderMap,
        /// Raw response body
        body: String,
    },
}

impl TransportFailure {
    /// Build a failure from a reqwest error raised before a status was available
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            return TransportFailure::Malformed {
                message: err.to_string(),
            };
        }
        TransportFailure::Connection {
            message: err.to_string(),
            timed_out: err.is_timeout(),
        }
    }
}

/// Result of a transport call
pub type TransportResult<T> = Result<T, TransportFailure>;

/// Lines of a streamed response, pulled on demand by a blocking caller
pub type LineIter = Box<dyn Iterator<Item = TransportResult<String>> + Send>;

/// Lines of a streamed response, pulled on demand by an async caller
pub type LineStream = Pin<Box<dyn Stream<Item = TransportResult<String>> + Send>>;

/// Thread-blocking transport
pub trait BlockingTransport: Send + Sync {
    /// Perform one request and decode the body as a single JSON document
    fn call(&self, request: &ApiRequest) -> TransportResult<Value>;

    /// Perform one request and hand back its body as lines
    ///
    /// Dropping the returned iterator closes the response.
    fn call_lines(&self, request: &ApiRequest) -> TransportResult<LineIter>;
}

/// Cooperative (async) transport
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    /// Perform one request and decode the body as a single JSON document
    async fn call(&self, request: &ApiRequest) -> TransportResult<Value>;

    /// Perform one request and hand back its body as lines
    ///
    /// Dropping the returned stream closes the response.
    async fn call_lines(&self, request: &ApiRequest) -> TransportResult<LineStream>;
}

/// Decode a response body into JSON; empty bodies become `null`
pub(crate) fn decode_body(body: &[u8]) -> TransportResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| TransportFailure::Malformed {
        message: format!("invalid JSON body: {e}"),
    })
}
