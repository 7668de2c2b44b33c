//! Client configuration

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;

/// Environment variable holding the API base URL
pub const BASE_URL_ENV: &str = "SLUGKIT_BASE_URL";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "SLUGKIT_API_KEY";

/// Environment variable overriding the request timeout, in seconds
pub const TIMEOUT_ENV: &str = "SLUGKIT_TIMEOUT_SECS";

/// Environment variable overriding the maximum attempt count
pub const MAX_RETRIES_ENV: &str = "SLUGKIT_MAX_RETRIES";

/// Overall time allowed for one request, body included
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed to establish the TCP/TLS connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only settings shared by every operation of a client
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// API key sent as `x-api-key`
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Retry policy applied to every call
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Configuration for `base_url` with default timeouts and retry policy
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Read configuration from `SLUGKIT_*` environment variables
    pub fn from_env() -> ClientResult<Self> {
        let base_url = env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ClientError::Configuration(format!("{BASE_URL_ENV} is not set")))?;

        let mut config = Self::new(base_url);

        if let Some(key) = env::var(API_KEY_ENV).ok().filter(|v| !v.is_empty()) {
            config = config.with_api_key(key);
        }

        if let Ok(raw) = env::var(TIMEOUT_ENV) {
            let secs: f64 = raw.trim().parse().map_err(|_| {
                ClientError::Configuration(format!("{TIMEOUT_ENV} must be a number, got '{raw}'"))
            })?;
            let timeout = Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|t| !t.is_zero())
                .ok_or_else(|| {
                    ClientError::Configuration(format!(
                        "{TIMEOUT_ENV} must be a positive number of seconds, got '{raw}'"
                    ))
                })?;
            config = config.with_timeout(timeout);
        }

        if let Ok(raw) = env::var(MAX_RETRIES_ENV) {
            let attempts: u32 = raw.trim().parse().map_err(|_| {
                ClientError::Configuration(format!(
                    "{MAX_RETRIES_ENV} must be a positive integer, got '{raw}'"
                ))
            })?;
            let retry = config.retry.with_max_attempts(attempts);
            config = config.with_retry_policy(retry);
        }

        Ok(config)
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Absolute URL for a request path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}
