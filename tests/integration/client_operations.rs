//! Client operations end to end over a scripted transport

use reqwest::Method;
use serde_json::json;
use std::time::Duration;

use slugkit::client::API_KEY_REQUIRED;
use slugkit::{BlockingClient, Client, ClientError, ErrorKind, RetryPolicy};

use crate::support::{Reply, ScriptedTransport};

fn series_info(slug: &str, name: &str) -> serde_json::Value {
    json!({
        "slug": slug,
        "org_slug": "acme",
        "name": name,
        "pattern": "{adjective}-{noun}",
        "max_pattern_length": 24,
        "capacity": "1000",
        "generated_count": "0",
        "mtime": "2024-05-01T10:00:00Z"
    })
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_base_delay(Duration::from_millis(1))
        .without_jitter()
}

#[tokio::test]
async fn test_key_scoped_operations_require_api_key() {
    let transport = ScriptedTransport::new(vec![]);
    let client = Client::with_transport(transport.clone(), RetryPolicy::default(), false);

    for err in [
        client.series().err().unwrap(),
        client.forge().err().unwrap(),
    ] {
        assert!(matches!(err, ClientError::Configuration(ref m) if m == API_KEY_REQUIRED));
        assert_eq!(err.kind(), None);
    }
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_ping_works_without_api_key() {
    let transport = ScriptedTransport::new(vec![Reply::Json(json!(null))]);
    let client = Client::with_transport(transport.clone(), RetryPolicy::default(), false);

    client.ping().await.unwrap();

    assert_eq!(transport.requests()[0].path, "/ping");
}

#[tokio::test]
async fn test_series_lifecycle_requests() {
    let transport = ScriptedTransport::new(vec![
        Reply::Json(series_info("orders", "Orders")),
        Reply::Json(series_info("orders", "Invoices")),
        Reply::Json(json!({"orders": "Invoices", "alpha": "First"})),
        Reply::Json(json!(null)),
        Reply::Json(json!(null)),
    ]);
    let client = Client::with_transport(transport.clone(), RetryPolicy::default(), true);
    let series = client.series().unwrap();

    let created = series.create("Orders", "{adjective}-{noun}").await.unwrap();
    let orders = series.named(created.slug.as_str());
    let updated = orders.update("Invoices", "{adjective}-{noun}").await.unwrap();
    let list = series.list().await.unwrap();
    orders.reset().await.unwrap();
    orders.delete().await.unwrap();

    assert_eq!(updated.name.as_deref(), Some("Invoices"));
    assert_eq!(list.keys().next().map(String::as_str), Some("alpha"));

    let requests = transport.requests();
    let summary: Vec<(Method, &str)> = requests
        .iter()
        .map(|r| (r.method.clone(), r.path.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Method::POST, "/gen/series/create"),
            (Method::PUT, "/gen/series/update"),
            (Method::GET, "/gen/series/list"),
            (Method::POST, "/gen/reset"),
            (Method::DELETE, "/gen/series/delete"),
        ]
    );
    assert_eq!(
        transport.bodies(),
        vec![
            json!({"name": "Orders", "pattern": "{adjective}-{noun}"}),
            json!({"series": "orders", "name": "Invoices", "pattern": "{adjective}-{noun}"}),
            json!(null),
            json!({"series": "orders"}),
            json!({"series": "orders"}),
        ]
    );
}

#[tokio::test]
async fn test_series_create_is_not_retried_after_connection_failure() {
    let transport = ScriptedTransport::new(vec![Reply::connection()]);
    let client = Client::with_transport(transport.clone(), fast_policy(), true);

    let err = client
        .series()
        .unwrap()
        .create("Orders", "{noun}")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Connection));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_reset_is_retried_after_connection_failure() {
    let transport = ScriptedTransport::new(vec![Reply::connection(), Reply::Json(json!(null))]);
    let client = Client::with_transport(transport.clone(), fast_policy(), true);

    client.series().unwrap().named("orders").reset().await.unwrap();

    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_stats_and_info_for_key_series() {
    let transport = ScriptedTransport::new(vec![
        Reply::Json(json!([{
            "event_type": "forge",
            "date_part": "total",
            "total_count": 10,
            "request_count": 2,
            "total_duration_us": 400,
            "avg_duration_us": 200.0
        }])),
        Reply::Json(series_info("own", "Own")),
    ]);
    let client = Client::with_transport(transport.clone(), RetryPolicy::default(), true);
    let series = client.series().unwrap();

    let stats = series.stats().await.unwrap();
    let info = series.info().await.unwrap();

    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_count, 10);
    assert_eq!(info.slug, "own");
    assert_eq!(transport.bodies(), vec![json!({}), json!({})]);
}

#[tokio::test]
async fn test_unexpected_response_shape_is_validation_error() {
    let transport = ScriptedTransport::new(vec![Reply::Json(json!({"unexpected": true}))]);
    let client = Client::with_transport(transport, RetryPolicy::default(), true);

    let err = client.series().unwrap().info().await.unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Validation));
    assert!(err.to_string().contains("series_info"));
}

#[tokio::test]
async fn test_dictionary_tags_default_page() {
    let transport = ScriptedTransport::new(vec![Reply::Json(json!({
        "data": [],
        "limit": 100,
        "offset": 0,
        "total": 0,
        "has_more": false
    }))]);
    let client = Client::with_transport(transport.clone(), RetryPolicy::default(), true);

    let page = client.forge().unwrap().dictionary_tags("adverb").await.unwrap();

    assert!(page.data.is_empty());
    let request = &transport.requests()[0];
    assert_eq!(request.path, "/gen/dictionary-tags/adverb");
    assert_eq!(
        request.query,
        vec![
            ("limit".to_string(), "100".to_string()),
            ("offset".to_string(), "0".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_pattern_info_and_dictionary_info() {
    let transport = ScriptedTransport::new(vec![
        Reply::Json(json!({
            "pattern": "{adjective}-{noun}",
            "capacity": "123456",
            "max_slug_length": 20,
            "complexity": 2,
            "components": 2
        })),
        Reply::Json(json!([{"kind": "noun", "count": 5000}, {"kind": "verb", "count": 900}])),
    ]);
    let client = Client::with_transport(transport.clone(), RetryPolicy::default(), true);
    let forge = client.forge().unwrap();

    let info = forge.pattern_info("{adjective}-{noun}").await.unwrap();
    let dictionaries = forge.dictionary_info().await.unwrap();

    assert_eq!(info.capacity, "123456");
    assert_eq!(dictionaries.len(), 2);
    assert_eq!(transport.bodies()[0], json!({"pattern": "{adjective}-{noun}"}));
}

#[test]
fn test_blocking_client_matches_async_requests() {
    let replies = || {
        vec![
            Reply::Json(json!({"req_per_minute": 60, "plan": "free"})),
            Reply::batch("f", 2),
        ]
    };

    let blocking_transport = ScriptedTransport::new(replies());
    let client = BlockingClient::with_transport(blocking_transport.clone(), RetryPolicy::default(), true);
    let limits = client.limits().unwrap();
    let ids = client
        .forge()
        .unwrap()
        .forge("{noun}", Some("s"), Some(4), 2)
        .unwrap();

    let async_transport = ScriptedTransport::new(replies());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let (async_limits, async_ids) = runtime.block_on(async {
        let client = Client::with_transport(async_transport.clone(), RetryPolicy::default(), true);
        let limits = client.limits().await.unwrap();
        let ids = client
            .forge()
            .unwrap()
            .forge("{noun}", Some("s"), Some(4), 2)
            .await
            .unwrap();
        (limits, ids)
    });

    assert_eq!(limits, async_limits);
    assert_eq!(ids, async_ids);
    assert_eq!(blocking_transport.requests(), async_transport.requests());
}
