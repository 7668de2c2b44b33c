//! Mapping of failed transport calls onto [`ErrorKind`]s

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use super::ErrorKind;
use crate::transport::TransportFailure;

/// Reason code attached to 429 responses
pub const RATE_LIMIT_REASON_HEADER: &str = "x-ratelimit-reason";
/// Requests left in the current minute
pub const RPM_REMAINING_HEADER: &str = "x-ratelimit-rpm-remaining";
/// Requests left today
pub const DAILY_REMAINING_HEADER: &str = "x-ratelimit-daily-remaining";
/// Requests left this month
pub const MONTHLY_REMAINING_HEADER: &str = "x-ratelimit-monthly-remaining";
/// Requests left over the subscription lifetime
pub const LIFETIME_REMAINING_HEADER: &str = "x-ratelimit-lifetime-remaining";

/// Remaining quota reported by the server
///
/// Each counter is `None` when the server did not report it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuotaRemaining {
    /// Remaining requests in the current minute
    pub per_minute: Option<u64>,
    /// Remaining requests today
    pub daily: Option<u64>,
    /// Remaining requests this month
    pub monthly: Option<u64>,
    /// Remaining requests over the subscription lifetime
    pub lifetime: Option<u64>,
}

impl QuotaRemaining {
    /// Parse the four quota headers, ignoring absent or unparsable ones
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            per_minute: header_u64(headers, RPM_REMAINING_HEADER),
            daily: header_u64(headers, DAILY_REMAINING_HEADER),
            monthly: header_u64(headers, MONTHLY_REMAINING_HEADER),
            lifetime: header_u64(headers, LIFETIME_REMAINING_HEADER),
        }
    }

    /// Whether no counter was reported
    pub fn is_empty(&self) -> bool {
        self.per_minute.is_none()
            && self.daily.is_none()
            && self.monthly.is_none()
            && self.lifetime.is_none()
    }

    /// Publish the reported counters as gauges
    pub fn record(&self) {
        if !self.is_empty() {
            crate::metrics::record_quota(self);
        }
    }
}

impl fmt::Display for QuotaRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("per-minute", self.per_minute),
            ("daily", self.daily),
            ("monthly", self.monthly),
            ("lifetime", self.lifetime),
        ]
        .iter()
        .filter_map(|(label, value)| value.map(|v| format!("{label} {v}")))
        .collect();

        if parts.is_empty() {
            f.write_str("unknown")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// A failed call reduced to what callers and the retry engine need
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorClassification {
    /// Error kind
    pub kind: ErrorKind,
    /// Whether the retry engine may retry the call
    pub retryable: bool,
    /// Server-supplied wait before retrying
    #[serde(serialize_with = "serialize_secs")]
    pub retry_after: Option<Duration>,
    /// Quota counters, when any were reported
    pub quota: Option<QuotaRemaining>,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Rate-limit reason code, when one was given
    pub reason: Option<String>,
    /// Human-readable detail
    pub message: String,
}

impl ErrorClassification {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            retryable: kind.is_retryable(),
            retry_after: None,
            quota: None,
            status: None,
            reason: None,
            message: message.into(),
        }
    }

    /// Connection or timeout failure
    pub fn connection(message: impl Into<String>, timed_out: bool) -> Self {
        let message = message.into();
        let message = if timed_out {
            format!("request timed out: {message}")
        } else {
            message
        };
        Self::new(ErrorKind::Connection, message)
    }

    /// Undecodable request or response
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.description())?;
        match (self.status, &self.reason) {
            (Some(status), Some(reason)) => write!(f, " (HTTP {status}, {reason})")?,
            (Some(status), None) => write!(f, " (HTTP {status})")?,
            _ => {}
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(quota) = &self.quota {
            write!(f, " [remaining: {quota}]")?;
        }
        Ok(())
    }
}

/// Classify a failed transport call
pub fn classify_failure(failure: &TransportFailure) -> ErrorClassification {
    match failure {
        TransportFailure::Connection { message, timed_out } => {
            ErrorClassification::connection(message.clone(), *timed_out)
        }
        TransportFailure::Malformed { message } => ErrorClassification::validation(message.clone()),
        TransportFailure::Status {
            status,
            headers,
            body,
        } => classify_status(*status, headers, body),
    }
}

/// Classify a non-2xx response
pub fn classify_status(status: u16, headers: &HeaderMap, body: &str) -> ErrorClassification {
    let parsed_body: Option<Value> = serde_json::from_str(body).ok();
    let reason = header_str(headers, RATE_LIMIT_REASON_HEADER).or_else(|| {
        parsed_body
            .as_ref()
            .and_then(|b| b.get("reason"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    let kind = match status {
        401 | 403 => ErrorKind::Authentication,
        400 | 422 => ErrorKind::Validation,
        404 => ErrorKind::NotFound,
        429 => match reason.as_deref() {
            Some("rate-limit-exceeded") | Some("daily-limit-exceeded") => ErrorKind::RateLimit,
            Some("monthly-limit-exceeded") | Some("lifetime-limit-exceeded") => {
                ErrorKind::QuotaExceeded
            }
            Some("request-size-exceeded") | Some("not-available") => ErrorKind::PermanentRejection,
            _ => ErrorKind::ServerError,
        },
        500..=599 => ErrorKind::ServerError,
        _ => ErrorKind::Unknown,
    };

    let mut classification =
        ErrorClassification::new(kind, error_message(status, parsed_body.as_ref(), body));
    classification.status = Some(status);
    classification.reason = reason;

    if kind == ErrorKind::RateLimit {
        classification.retry_after = retry_after(headers);
    }

    let quota = QuotaRemaining::from_headers(headers);
    if !quota.is_empty() {
        classification.quota = Some(quota);
    }

    classification
}

fn error_message(status: u16, body: Option<&Value>, raw: &str) -> String {
    const MAX_RAW_BODY: usize = 200;

    let from_json = body.and_then(|b| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|field| b.get(*field).and_then(Value::as_str))
            .map(str::to_string)
    });
    if let Some(message) = from_json {
        return message;
    }

    let raw = raw.trim();
    if !raw.is_empty() {
        return raw.chars().take(MAX_RAW_BODY).collect();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("no response body")
        .to_string()
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = header_str(headers, RETRY_AFTER.as_str())?;
    let secs: f64 = raw.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name).and_then(|v| v.parse().ok())
}

fn serialize_secs<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(d) => serializer.serialize_some(&d.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}
