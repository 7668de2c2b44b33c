//! Scripted in-memory transports shared by the test suites

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use slugkit::transport::{
    ApiRequest, AsyncTransport, BlockingTransport, LineIter, LineStream, TransportFailure,
    TransportResult,
};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    /// JSON document for `call`
    Json(Value),
    /// Line-delimited body for `call_lines`
    Lines(Vec<TransportResult<String>>),
    /// Failure for either kind of call
    Fail(TransportFailure),
}

impl Reply {
    /// Line body with `n` identifiers named `{prefix}-{i}`
    pub fn lines(prefix: &str, n: usize) -> Self {
        Reply::Lines((0..n).map(|i| Ok(format!("{prefix}-{i}"))).collect())
    }

    /// JSON batch with `n` identifiers named `{prefix}-{i}`
    pub fn batch(prefix: &str, n: usize) -> Self {
        Reply::Json(Value::Array(
            (0..n).map(|i| Value::String(format!("{prefix}-{i}"))).collect(),
        ))
    }

    /// Non-2xx response
    pub fn status(status: u16, headers: &[(&'static str, &str)], body: &str) -> Self {
        Reply::Fail(status_failure(status, headers, body))
    }

    /// Connection failure
    pub fn connection() -> Self {
        Reply::Fail(TransportFailure::Connection {
            message: "connection refused".to_string(),
            timed_out: false,
        })
    }
}

/// Build a `Status` failure
pub fn status_failure(status: u16, headers: &[(&'static str, &str)], body: &str) -> TransportFailure {
    TransportFailure::Status {
        status,
        headers: header_map(headers),
        body: body.to_string(),
    }
}

/// Build a header map from pairs
pub fn header_map(headers: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    map
}

struct CloseGuard(Arc<AtomicUsize>);

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Transport replaying a fixed script, usable from both drivers
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    /// Transport answering with `replies` in order
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Default::default()
        })
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Bodies of the requests received so far
    pub fn bodies(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .map(|r| r.body.unwrap_or(Value::Null))
            .collect()
    }

    /// Line bodies released so far
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn next(&self, request: &ApiRequest) -> Reply {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {}", request.path))
    }

    fn json(&self, request: &ApiRequest) -> TransportResult<Value> {
        match self.next(request) {
            Reply::Json(value) => Ok(value),
            Reply::Fail(failure) => Err(failure),
            Reply::Lines(_) => panic!("line body scripted for JSON call to {}", request.path),
        }
    }

    fn line_items(&self, request: &ApiRequest) -> TransportResult<Vec<TransportResult<String>>> {
        match self.next(request) {
            Reply::Lines(lines) => Ok(lines),
            Reply::Fail(failure) => Err(failure),
            Reply::Json(_) => panic!("JSON body scripted for line call to {}", request.path),
        }
    }
}

impl BlockingTransport for ScriptedTransport {
    fn call(&self, request: &ApiRequest) -> TransportResult<Value> {
        self.json(request)
    }

    fn call_lines(&self, request: &ApiRequest) -> TransportResult<LineIter> {
        let lines = self.line_items(request)?;
        let guard = CloseGuard(Arc::clone(&self.closed));
        Ok(Box::new(lines.into_iter().map(move |line| {
            let _open = &guard;
            line
        })))
    }
}

#[async_trait]
impl AsyncTransport for ScriptedTransport {
    async fn call(&self, request: &ApiRequest) -> TransportResult<Value> {
        self.json(request)
    }

    async fn call_lines(&self, request: &ApiRequest) -> TransportResult<LineStream> {
        let lines = self.line_items(request)?;
        let guard = CloseGuard(Arc::clone(&self.closed));
        Ok(Box::pin(stream::iter(lines).map(move |line| {
            let _open = &guard;
            line
        })))
    }
}
