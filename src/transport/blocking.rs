//! Thread-blocking HTTP transport backed by `reqwest::blocking`

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use std::io::{BufRead, BufReader};
use tracing::debug;

use super::http::default_headers;
use super::{
    decode_body, ApiRequest, BlockingTransport, LineIter, TransportFailure, TransportResult,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, QuotaRemaining};
use crate::metrics::HttpRequestMetrics;

/// Blocking transport for the SlugKit HTTP API
///
/// Must not be created or used from inside an async runtime.
#[derive(Debug, Clone)]
pub struct BlockingHttpTransport {
    client: Client,
    base_url: String,
}

impl BlockingHttpTransport {
    /// Build a transport from client configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        // The blocking client applies its timeout to each read of the body.
        let client = Client::builder()
            .default_headers(default_headers(config)?)
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn send(&self, request: &ApiRequest) -> TransportResult<Response> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(
            endpoint = %request.endpoint,
            method = %request.method,
            url = %url,
            "Sending request"
        );

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let metrics = HttpRequestMetrics::start(request.endpoint);
        let response = match builder.send() {
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
        let body = response.text().unwrap_or_default();
        Err(TransportFailure::Status {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

impl BlockingTransport for BlockingHttpTransport {
    fn call(&self, request: &ApiRequest) -> TransportResult<Value> {
        let response = self.send(request)?;
        let body = response
            .bytes()
            .map_err(|e| TransportFailure::from_reqwest(&e))?;
        decode_body(&body)
    }

    fn call_lines(&self, request: &ApiRequest) -> TransportResult<LineIter> {
        let response = self.send(request)?;
        let mut failed = false;
        let lines = BufReader::new(response).lines().map_while(move |line| {
            if failed {
                return None;
            }
            Some(line.map_err(|e| {
                failed = true;
                let timed_out = e.kind() == std::io::ErrorKind::TimedOut;
                if e.kind() == std::io::ErrorKind::InvalidData {
                    TransportFailure::Malformed {
                        message: format!("response line is not UTF-8: {e}"),
                    }
                } else {
                    TransportFailure::Connection {
                        message: e.to_string(),
                        timed_out,
                    }
                }
            }))
        });
        Ok(Box::new(lines))
    }
}
