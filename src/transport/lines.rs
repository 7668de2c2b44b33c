//! Line-delimited body handling
//!
//! Streamed generation responses carry one identifier record per line. A
//! record is either a bare identifier, a JSON string, or a JSON object with a
//! `slug` field. Bodies are split incrementally so a large batch is never
//! held in memory at once.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use futures_util::Stream;
use serde_json::Value;
use std::collections::VecDeque;

use super::{LineStream, TransportFailure, TransportResult};

/// Decode one response line into an identifier
///
/// Returns `Ok(None)` for blank lines.
pub fn decode_line(line: &str) -> TransportResult<Option<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if !(trimmed.starts_with('"') || trimmed.starts_with('{')) {
        return Ok(Some(trimmed.to_string()));
    }

    let value: Value = serde_json::from_str(trimmed).map_err(|e| TransportFailure::Malformed {
        message: format!("invalid JSON line: {e}"),
    })?;

    match value {
        Value::String(id) => Ok(Some(id)),
        Value::Object(map) => match map.get("slug") {
            Some(Value::String(id)) => Ok(Some(id.clone())),
            _ => Err(TransportFailure::Malformed {
                message: "JSON line has no string `slug` field".to_string(),
            }),
        },
        _ => Err(TransportFailure::Malformed {
            message: format!("unexpected JSON line: {trimmed}"),
        }),
    }
}

/// Extract identifiers from a JSON batch response
///
/// Accepts an array of identifier records or an object wrapping one in `slugs`.
pub fn decode_identifiers(value: Value) -> TransportResult<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("slugs") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(TransportFailure::Malformed {
                    message: "expected an array of identifiers".to_string(),
                })
            }
        },
        Value::Null => Vec::new(),
        other => {
            return Err(TransportFailure::Malformed {
                message: format!("expected an array of identifiers, got {other}"),
            })
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(id) => Ok(id),
            Value::Object(map) => match map.get("slug") {
                Some(Value::String(id)) => Ok(id.clone()),
                _ => Err(TransportFailure::Malformed {
                    message: "identifier object has no string `slug` field".to_string(),
                }),
            },
            other => Err(TransportFailure::Malformed {
                message: format!("unexpected identifier record: {other}"),
            }),
        })
        .collect()
}

/// Accumulates raw bytes and yields complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<TransportResult<String>> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let raw = std::mem::take(&mut self.pending);
                lines.push(Self::to_line(raw));
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Flush a trailing line without newline terminator
    pub fn finish(&mut self) -> Option<TransportResult<String>> {
        if self.pending.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.pending);
        Some(Self::to_line(raw))
    }

    fn to_line(raw: Vec<u8>) -> TransportResult<String> {
        String::from_utf8(raw).map_err(|e| TransportFailure::Malformed {
            message: format!("response line is not UTF-8: {e}"),
        })
    }
}

struct SplitState<S> {
    chunks: S,
    buffer: LineBuffer,
    ready: VecDeque<TransportResult<String>>,
    done: bool,
}

/// Turn a stream of body chunks into a stream of lines
///
/// The stream ends after the first failure. Dropping it drops the chunk
/// source, which closes the underlying connection.
pub fn split_lines<S>(chunks: S) -> LineStream
where
    S: Stream<Item = TransportResult<Bytes>> + Send + Unpin + 'static,
{
    let state = SplitState {
        chunks,
        buffer: LineBuffer::new(),
        ready: VecDeque::new(),
        done: false,
    };

    let lines = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                if line.is_err() {
                    state.ready.clear();
                    state.done = true;
                }
                return Some((line, state));
            }

            if state.done {
                return None;
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.buffer.push(&chunk);
                    state.ready.extend(lines);
                }
                Some(Err(failure)) => {
                    state.done = true;
                    return Some((Err(failure), state));
                }
                None => {
                    state.done = true;
                    if let Some(tail) = state.buffer.finish() {
                        state.ready.push_back(tail);
                    }
                }
            }
        }
    });

    Box::pin(lines)
}
