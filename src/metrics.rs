//! Observability metrics for SlugKit calls
//!
//! Counters and histograms for requests, rate-limit rejections, retry
//! backoff and remaining quota. Nothing is exported unless
//! [`init_metrics`] installs the Prometheus listener; until then the
//! `metrics` macros are no-ops.
//!
//! ## Metrics
//!
//! - `slugkit_requests_total{endpoint,status}`
//! - `slugkit_rate_limited_total{endpoint}`
//! - `slugkit_request_duration_seconds{endpoint}`
//! - `slugkit_retries_total{endpoint,attempt}`
//! - `slugkit_retry_backoff_seconds{endpoint}`
//! - `slugkit_quota_remaining{window}`
//! - `slugkit_identifiers_total{endpoint}`

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::QuotaRemaining;
use crate::transport::Endpoint;

static METRICS_INITIALIZED: Lazy<Arc<RwLock<bool>>> = Lazy::new(|| Arc::new(RwLock::new(false)));

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Install the Prometheus exporter on `addr`
///
/// Idempotent: later calls are ignored.
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "slugkit_requests_total",
        Unit::Count,
        "Requests sent to the SlugKit service"
    );
    describe_counter!(
        "slugkit_rate_limited_total",
        Unit::Count,
        "Responses rejected with 429"
    );
    describe_histogram!(
        "slugkit_request_duration_seconds",
        Unit::Seconds,
        "Time until response headers arrived"
    );
    describe_counter!(
        "slugkit_retries_total",
        Unit::Count,
        "Retry attempts scheduled"
    );
    describe_histogram!(
        "slugkit_retry_backoff_seconds",
        Unit::Seconds,
        "Wait before each retry"
    );
    describe_gauge!(
        "slugkit_quota_remaining",
        Unit::Count,
        "Remaining quota reported by the service"
    );
    describe_counter!(
        "slugkit_identifiers_total",
        Unit::Count,
        "Identifiers delivered to the caller"
    );

    *initialized = true;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Whether [`init_metrics`] has installed the exporter
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// New correlation id for request tracing
pub fn generate_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{id:08x}")
}

/// Timing and outcome of one HTTP request
pub struct HttpRequestMetrics {
    endpoint: Endpoint,
    start_time: Instant,
    correlation_id: String,
}

impl HttpRequestMetrics {
    /// Start timing a request to `endpoint`
    pub fn start(endpoint: Endpoint) -> Self {
        let correlation_id = generate_correlation_id();
        debug!(
            correlation_id = %correlation_id,
            endpoint = %endpoint,
            "Sending request"
        );
        Self {
            endpoint,
            start_time: Instant::now(),
            correlation_id,
        }
    }

    /// The request produced a response with `status_code`
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();
        let endpoint = self.endpoint.name();

        counter!(
            "slugkit_requests_total",
            "endpoint" => endpoint,
            "status" => status_code.to_string(),
        )
        .increment(1);
        histogram!("slugkit_request_duration_seconds", "endpoint" => endpoint)
            .record(duration.as_secs_f64());

        if status_code == 429 {
            counter!("slugkit_rate_limited_total", "endpoint" => endpoint).increment(1);
            warn!(
                correlation_id = %self.correlation_id,
                endpoint = endpoint,
                duration_ms = duration.as_millis(),
                "Rate limit response (429)"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            endpoint = endpoint,
            status = status_code,
            duration_ms = duration.as_millis(),
            "Response received"
        );
    }

    /// The request failed before a status arrived
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();
        let endpoint = self.endpoint.name();

        counter!(
            "slugkit_requests_total",
            "endpoint" => endpoint,
            "status" => "network_error",
        )
        .increment(1);
        histogram!("slugkit_request_duration_seconds", "endpoint" => endpoint)
            .record(duration.as_secs_f64());

        warn!(
            correlation_id = %self.correlation_id,
            endpoint = endpoint,
            duration_ms = duration.as_millis(),
            "Network error"
        );
    }

    /// Correlation id of this request
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// A retry of `endpoint` was scheduled after `duration`
pub fn record_retry_backoff(endpoint: Endpoint, duration: Duration, attempt: u32) {
    counter!(
        "slugkit_retries_total",
        "endpoint" => endpoint.name(),
        "attempt" => attempt.to_string(),
    )
    .increment(1);
    histogram!("slugkit_retry_backoff_seconds", "endpoint" => endpoint.name())
        .record(duration.as_secs_f64());

    debug!(
        endpoint = %endpoint,
        attempt = attempt,
        backoff_ms = duration.as_millis(),
        "Retry backoff recorded"
    );
}

/// Publish the quota counters present in a response
pub fn record_quota(quota: &QuotaRemaining) {
    let windows = [
        ("minute", quota.per_minute),
        ("day", quota.daily),
        ("month", quota.monthly),
        ("lifetime", quota.lifetime),
    ];
    for (window, remaining) in windows {
        if let Some(remaining) = remaining {
            gauge!("slugkit_quota_remaining", "window" => window).set(remaining as f64);
        }
    }

    if quota.per_minute == Some(0) || quota.daily == Some(0) {
        warn!(quota = %quota, "Rate limit window used up");
    }
}

/// `count` identifiers from `endpoint` reached the caller
pub fn record_identifiers(endpoint: Endpoint, count: u64) {
    counter!("slugkit_identifiers_total", "endpoint" => endpoint.name()).increment(count);
}
