//! Error taxonomy for SlugKit operations
//!
//! Every failed call is reduced to an [`ErrorClassification`] carrying one of
//! a fixed set of [`ErrorKind`]s. Callers match on the kind instead of on
//! error types.

use serde::Serialize;
use std::fmt;

use crate::transport::TransportFailure;

pub mod classify;

pub use classify::{
    classify_failure, classify_status, ErrorClassification, QuotaRemaining,
    DAILY_REMAINING_HEADER, LIFETIME_REMAINING_HEADER, MONTHLY_REMAINING_HEADER,
    RATE_LIMIT_REASON_HEADER, RPM_REMAINING_HEADER,
};

/// Fixed classification of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response: DNS, refused connection, reset, timeout
    Connection,
    /// 401/403
    Authentication,
    /// 400/422, or a response that could not be decoded
    Validation,
    /// 404
    NotFound,
    /// 429 for per-minute or daily limits
    RateLimit,
    /// 429 for monthly or lifetime limits
    QuotaExceeded,
    /// 429 for requests the plan can never satisfy
    PermanentRejection,
    /// 5xx, or a 429 with an unrecognised reason
    ServerError,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    /// Stable machine-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::PermanentRejection => "permanent_rejection",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// User-facing description used in log and error messages
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection failed",
            ErrorKind::Authentication => "authentication failed",
            ErrorKind::Validation => "invalid request",
            ErrorKind::NotFound => "resource not found",
            ErrorKind::RateLimit => "rate limit exceeded",
            ErrorKind::QuotaExceeded => "quota exhausted",
            ErrorKind::PermanentRejection => "request rejected by plan",
            ErrorKind::ServerError => "server error",
            ErrorKind::Unknown => "unexpected response",
        }
    }

    /// Actionable recovery suggestions
    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            ErrorKind::Connection => &[
                "Verify the server URL is correct and accessible",
                "Check your internet connection",
                "Try again in a few moments (network issues are often temporary)",
                "Check if there are any firewall or proxy restrictions",
            ],
            ErrorKind::Authentication => &[
                "Verify your API key is correct",
                "Check if your API key has expired",
                "Ensure your API key has the required permissions",
            ],
            ErrorKind::Validation => &[
                "Review the request parameters and format",
                "Review the pattern syntax in the SlugKit documentation",
                "Use pattern-info to test a pattern before use",
            ],
            ErrorKind::NotFound => &[
                "Check the series slug for typos",
                "List available series with series-list",
            ],
            ErrorKind::RateLimit => &[
                "Wait before making additional requests",
                "Reduce request frequency or use larger batches",
                "Consider upgrading your plan for higher rate limits",
            ],
            ErrorKind::QuotaExceeded => &[
                "Check your current usage against your plan limits",
                "Consider upgrading your plan for higher quotas",
                "Review and optimize your slug generation patterns",
            ],
            ErrorKind::PermanentRejection => &[
                "Reduce the batch size below the plan's request size limit",
                "Check which features your plan includes with the limits command",
            ],
            ErrorKind::ServerError => &[
                "Try again in a few moments",
                "Contact support if the issue persists",
            ],
            ErrorKind::Unknown => &[
                "Review the error message for specific details",
                "Enable debug logging (RUST_LOG=slugkit=debug) for more information",
            ],
        }
    }

    /// Whether the retry engine retries this kind automatically
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Connection | ErrorKind::RateLimit)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the client
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// A call failed and was not retried
    #[error("{operation} failed: {classification}")]
    Api {
        /// Operation name
        operation: &'static str,
        /// Classified failure
        classification: ErrorClassification,
    },

    /// A retryable failure persisted through every allowed attempt
    #[error("{operation} failed after {attempts} attempts: {classification}")]
    ExhaustedRetries {
        /// Operation name
        operation: &'static str,
        /// Attempts made, including the first
        attempts: u32,
        /// Classification of the last failure
        classification: ErrorClassification,
    },

    /// The client is not configured for the requested operation
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Classification of the failure, if it came from the API
    pub fn classification(&self) -> Option<&ErrorClassification> {
        match self {
            ClientError::Api { classification, .. }
            | ClientError::ExhaustedRetries { classification, .. } => Some(classification),
            ClientError::Configuration(_) => None,
        }
    }

    /// Kind of the failure, if it came from the API
    pub fn kind(&self) -> Option<ErrorKind> {
        self.classification().map(|c| c.kind)
    }

    /// Whether the attempt bound was reached
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ClientError::ExhaustedRetries { .. })
    }

    /// Recovery suggestions for the failure
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            ClientError::Configuration(_) => vec![
                "Verify your configuration settings",
                "Check environment variables are set correctly (SLUGKIT_BASE_URL, SLUGKIT_API_KEY)",
            ],
            other => {
                let mut suggestions: Vec<&'static str> = other
                    .kind()
                    .map(|k| k.suggestions().to_vec())
                    .unwrap_or_default();
                if other.is_exhausted() {
                    suggestions.push("Try increasing --max-retries");
                }
                suggestions
            }
        }
    }

    /// Surface a transport failure without retrying it
    pub(crate) fn from_failure(operation: &'static str, failure: &TransportFailure) -> Self {
        ClientError::Api {
            operation,
            classification: classify_failure(failure),
        }
    }

    /// Wrap a response decoding failure
    pub(crate) fn decode(operation: &'static str, message: impl Into<String>) -> Self {
        ClientError::Api {
            operation,
            classification: ErrorClassification::validation(message),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
