//! Request construction and response decoding for single-shot operations
//!
//! Each operation is described once as a [`Call`]; the blocking and async
//! clients only differ in how they drive it through the retry engine.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::{ClientError, ClientResult};
use crate::retry::Idempotency;
use crate::transport::lines::decode_identifiers;
use crate::transport::{ApiRequest, Endpoint};
use crate::{
    DictionaryInfo, KeyInfo, PaginatedTags, PatternInfo, SeriesInfo, SeriesList, StatsItem,
    SubscriptionFeatures,
};

/// Page size used when listing dictionary tags
pub const DEFAULT_TAGS_LIMIT: u32 = 100;

type Decoder<T> = fn(Value) -> Result<T, String>;

/// One request plus the decoder for its response
pub(crate) struct Call<T> {
    pub(crate) request: ApiRequest,
    pub(crate) idempotency: Idempotency,
    decode: Decoder<T>,
}

impl<T> Call<T> {
    fn new(request: ApiRequest, decode: Decoder<T>) -> Self {
        Self {
            request,
            idempotency: Idempotency::Idempotent,
            decode,
        }
    }

    fn consuming(mut self) -> Self {
        self.idempotency = Idempotency::Consuming;
        self
    }

    pub(crate) fn endpoint(&self) -> Endpoint {
        self.request.endpoint
    }

    /// Decode a successful response; failures classify as validation errors
    pub(crate) fn decode(&self, value: Value) -> ClientResult<T> {
        (self.decode)(value).map_err(|message| {
            ClientError::decode(
                self.request.endpoint.name(),
                format!("unexpected {} response: {message}", self.request.endpoint),
            )
        })
    }
}

fn decode_json<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn ignore(_: Value) -> Result<(), String> {
    Ok(())
}

fn identifiers(value: Value) -> Result<Vec<String>, String> {
    decode_identifiers(value).map_err(|failure| failure.to_string())
}

fn series_body(series: Option<&str>) -> Value {
    let mut body = Map::new();
    if let Some(series) = series {
        body.insert("series".to_string(), json!(series));
    }
    Value::Object(body)
}

pub(crate) fn ping() -> Call<()> {
    Call::new(ApiRequest::new(Endpoint::Ping), ignore)
}

pub(crate) fn key_info() -> Call<KeyInfo> {
    Call::new(ApiRequest::new(Endpoint::KeyInfo), decode_json)
}

pub(crate) fn limits() -> Call<SubscriptionFeatures> {
    Call::new(ApiRequest::new(Endpoint::Limits), decode_json)
}

pub(crate) fn stats(series: Option<&str>) -> Call<Vec<StatsItem>> {
    let request = ApiRequest::new(Endpoint::Stats).with_body(series_body(series));
    Call::new(request, decode_json)
}

pub(crate) fn series_info(series: Option<&str>) -> Call<SeriesInfo> {
    let request = ApiRequest::new(Endpoint::SeriesInfo).with_body(series_body(series));
    Call::new(request, decode_json)
}

pub(crate) fn series_list() -> Call<SeriesList> {
    Call::new(ApiRequest::new(Endpoint::SeriesList), decode_json)
}

pub(crate) fn series_create(name: &str, pattern: &str) -> Call<SeriesInfo> {
    let request = ApiRequest::new(Endpoint::SeriesCreate)
        .with_body(json!({ "name": name, "pattern": pattern }));
    Call::new(request, decode_json).consuming()
}

pub(crate) fn series_update(series: Option<&str>, name: &str, pattern: &str) -> Call<SeriesInfo> {
    let mut body = series_body(series);
    if let Value::Object(map) = &mut body {
        map.insert("name".to_string(), json!(name));
        map.insert("pattern".to_string(), json!(pattern));
    }
    Call::new(
        ApiRequest::new(Endpoint::SeriesUpdate).with_body(body),
        decode_json,
    )
}

pub(crate) fn series_delete(series: Option<&str>) -> Call<()> {
    let request = ApiRequest::new(Endpoint::SeriesDelete).with_body(series_body(series));
    Call::new(request, ignore)
}

pub(crate) fn reset(series: Option<&str>) -> Call<()> {
    let request = ApiRequest::new(Endpoint::Reset).with_body(series_body(series));
    Call::new(request, ignore)
}

/// Single forge call; `sequence` 0 is the server default and is not sent
pub(crate) fn forge(
    pattern: &str,
    seed: Option<&str>,
    sequence: Option<u64>,
    count: u64,
) -> Call<Vec<String>> {
    let mut body = Map::new();
    body.insert("pattern".to_string(), json!(pattern));
    if let Some(seed) = seed.filter(|s| !s.is_empty()) {
        body.insert("seed".to_string(), json!(seed));
    }
    if let Some(sequence) = sequence.filter(|s| *s > 0) {
        body.insert("sequence".to_string(), json!(sequence));
    }
    if count > 0 {
        body.insert("count".to_string(), json!(count));
    }
    let request = ApiRequest::new(Endpoint::Forge).with_body(Value::Object(body));
    Call::new(request, identifiers)
}

pub(crate) fn pattern_info(pattern: &str) -> Call<PatternInfo> {
    let request = ApiRequest::new(Endpoint::PatternInfo).with_body(json!({ "pattern": pattern }));
    Call::new(request, decode_json)
}

pub(crate) fn dictionary_info() -> Call<Vec<DictionaryInfo>> {
    Call::new(ApiRequest::new(Endpoint::DictionaryInfo), decode_json)
}

pub(crate) fn dictionary_tags(kind: &str, limit: u32, offset: u32) -> Call<PaginatedTags> {
    let request = ApiRequest::new(Endpoint::DictionaryTags)
        .with_path_segment(kind)
        .with_query("limit", limit)
        .with_query("offset", offset);
    Call::new(request, decode_json)
}
