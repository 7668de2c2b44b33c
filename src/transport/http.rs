//! Async HTTP transport backed by `reqwest`

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::lines::split_lines;
use super::{
    decode_body, ApiRequest, AsyncTransport, LineStream, TransportFailure, TransportResult,
    API_KEY_HEADER,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, QuotaRemaining};
use crate::metrics::HttpRequestMetrics;

/// Async transport for the SlugKit HTTP API
///
/// The inner `reqwest::Client` pools connections and is cheap to clone, so one
/// transport can be shared by every generator created from a client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport from client configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .default_headers(default_headers(config)?)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.timeout,
        })
    }

    async fn send(&self, request: &ApiRequest) -> TransportResult<Response> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(
            endpoint = %request.endpoint,
            method = %request.method,
            url = %url,
            "Sending request"
        );

        let mut builder = self.client.request(request.method.clone(), &url);
        // Streamed bodies are bounded per read instead of end to end.
        if !request.is_streaming() {
            builder = builder.timeout(self.timeout);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let metrics = HttpRequestMetrics::start(request.endpoint);
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics.record_network_error();
                return Err(TransportFailure::from_reqwest(&e));
            }
        };

        let status = response.status();
        metrics.record_complete(status.as_u16());
        QuotaRemaining::from_headers(response.headers()).record();

        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(TransportFailure::Status {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[async_trait]
impl AsyncTransport for HttpTransport {
    async fn call(&self, request: &ApiRequest) -> TransportResult<Value> {
        let response = self.send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::from_reqwest(&e))?;
        decode_body(&body)
    }

    async fn call_lines(&self, request: &ApiRequest) -> TransportResult<LineStream> {
        let response = self.send(request).await?;
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportFailure::from_reqwest(&e)));
        Ok(split_lines(Box::pin(chunks)))
    }
}

/// Headers attached to every request
pub(crate) fn default_headers(config: &ClientConfig) -> ClientResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
        let mut value = HeaderValue::from_str(key).map_err(|_| {
            ClientError::Configuration("API key contains invalid header characters".to_string())
        })?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
    }
    Ok(headers)
}
