//! Retry engine behaviour: server hints, backoff bounds and idempotency

use serde_json::json;
use std::time::Duration;

use slugkit::client::{BlockingClient, Client};
use slugkit::generator::{AsyncGenerator, GeneratorConfig};
use slugkit::retry::RetryReport;
use slugkit::transport::Endpoint;
use slugkit::{ClientError, ErrorKind, Idempotency, RetryPolicy, RetryPolicyState};

use crate::support::{status_failure, Reply, ScriptedTransport};

fn rate_limited(retry_after: &str) -> Reply {
    Reply::status(
        429,
        &[
            ("x-ratelimit-reason", "rate-limit-exceeded"),
            ("retry-after", retry_after),
            ("x-ratelimit-rpm-remaining", "0"),
        ],
        "",
    )
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(max_attempts)
        .with_base_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
        .without_jitter()
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_hint_is_waited_out_once() {
    let transport = ScriptedTransport::new(vec![rate_limited("2"), Reply::batch("f", 1)]);
    let client = Client::with_transport(transport.clone(), RetryPolicy::default(), true);

    let started = tokio::time::Instant::now();
    let ids = client
        .forge()
        .unwrap()
        .forge("{noun}", Some("seed"), None, 1)
        .await
        .unwrap();

    assert_eq!(ids, vec!["f-0"]);
    assert_eq!(transport.requests().len(), 2);
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_state_tracks_attempts_and_delay() {
    let transport = ScriptedTransport::new(vec![rate_limited("2"), Reply::Json(json!(["a"]))]);
    let policy = RetryPolicy::default();
    let mut state = RetryPolicyState::new();
    let request = GeneratorConfig::new()
        .with_dry_run()
        .batch_request(1, 0, false);

    let value = policy
        .execute(&mut state, Endpoint::Slice, Idempotency::Idempotent, || {
            slugkit::transport::AsyncTransport::call(transport.as_ref(), &request)
        })
        .await
        .unwrap();

    assert_eq!(value, json!(["a"]));
    assert_eq!(state.attempt_count, 2);
    assert_eq!(state.cumulative_delay, Duration::from_secs(2));
    assert_eq!(state.last_error_kind, Some(ErrorKind::RateLimit));
}

#[tokio::test(start_paused = true)]
async fn test_monthly_quota_is_not_retried() {
    let transport = ScriptedTransport::new(vec![Reply::status(
        429,
        &[
            ("x-ratelimit-reason", "monthly-limit-exceeded"),
            ("x-ratelimit-monthly-remaining", "0"),
        ],
        "",
    )]);
    let client = Client::with_transport(transport.clone(), RetryPolicy::default(), true);

    let err = client.series().unwrap().info().await.unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::QuotaExceeded));
    assert!(!err.is_exhausted());
    assert_eq!(transport.requests().len(), 1);
    let quota = err.classification().unwrap().quota.unwrap();
    assert_eq!(quota.monthly, Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_connection_failures_exhaust_attempts() {
    let transport = ScriptedTransport::new(vec![
        Reply::connection(),
        Reply::connection(),
        Reply::connection(),
    ]);
    let client = Client::with_transport(
        transport.clone(),
        RetryPolicy::default().with_max_attempts(3),
        true,
    );

    let err = client.ping().await.unwrap_err();

    match &err {
        ClientError::ExhaustedRetries {
            operation,
            attempts,
            classification,
        } => {
            assert_eq!(*operation, "ping");
            assert_eq!(*attempts, 3);
            assert_eq!(classification.kind, ErrorKind::Connection);
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
    assert!(err.suggestions().contains(&"Try increasing --max-retries"));
    assert_eq!(transport.remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_consuming_mint_is_not_retried_on_connection_failure() {
    let transport = ScriptedTransport::new(vec![Reply::connection()]);
    let generator = AsyncGenerator::new(transport.clone(), RetryPolicy::default(), GeneratorConfig::new());

    let err = generator.generate(3).await.unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Connection));
    assert!(!err.is_exhausted());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_consuming_mint_is_retried_after_rate_limit() {
    let transport = ScriptedTransport::new(vec![rate_limited("1"), Reply::batch("m", 3)]);
    let generator = AsyncGenerator::new(transport.clone(), RetryPolicy::default(), GeneratorConfig::new());

    let ids = generator.generate(3).await.unwrap();

    assert_eq!(ids.len(), 3);
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_mint_with_explicit_sequence_is_retried() {
    let transport = ScriptedTransport::new(vec![Reply::connection(), Reply::batch("m", 2)]);
    let generator = AsyncGenerator::new(
        transport.clone(),
        RetryPolicy::default(),
        GeneratorConfig::new().starting_from(50),
    );

    let ids = generator.generate(2).await.unwrap();

    assert_eq!(ids, vec!["m-0", "m-1"]);
    assert_eq!(transport.bodies()[0], transport.bodies()[1]);
}

#[test]
fn test_blocking_driver_follows_same_policy() {
    let transport = ScriptedTransport::new(vec![
        Reply::status(503, &[], "{\"message\": \"maintenance\"}"),
    ]);
    let client = BlockingClient::with_transport(transport.clone(), fast_policy(5), true);

    let err = client.limits().unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::ServerError));
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_blocking_driver_retries_rate_limit() {
    let transport = ScriptedTransport::new(vec![
        rate_limited("0.01"),
        rate_limited("0.01"),
        Reply::Json(json!({"req_per_minute": 60})),
    ]);
    let client = BlockingClient::with_transport(transport.clone(), fast_policy(5), true);

    let limits = client.limits().unwrap();

    assert_eq!(limits.req_per_minute, Some(60));
    assert_eq!(limits.max_series, None);
    assert_eq!(transport.requests().len(), 3);
}

#[test]
fn test_backoff_is_bounded() {
    let policy = RetryPolicy::default()
        .with_base_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(8));

    for attempt in 1..=10 {
        let delay = policy.backoff(attempt);
        let base = policy.exponential_delay(attempt);
        assert!(delay >= base);
        assert!(delay <= Duration::from_secs(10));
    }
    assert_eq!(policy.exponential_delay(1), Duration::from_secs(1));
    assert_eq!(policy.exponential_delay(3), Duration::from_secs(4));
    assert_eq!(policy.exponential_delay(9), Duration::from_secs(8));
}

#[test]
fn test_on_failure_is_pure_decision() {
    let policy = fast_policy(2);
    let mut state = RetryPolicyState::new();
    let classification = slugkit::error::classify_failure(&status_failure(
        429,
        &[("x-ratelimit-reason", "daily-limit-exceeded"), ("retry-after", "30")],
        "",
    ));

    state.begin_attempt();
    match state.on_failure(&policy, Endpoint::Mint, Idempotency::Consuming, classification.clone()) {
        slugkit::retry::RetryDecision::Retry { delay, .. } => {
            assert_eq!(delay, Duration::from_secs(30))
        }
        other => panic!("expected retry, got {other:?}"),
    }

    state.begin_attempt();
    match state.on_failure(&policy, Endpoint::Mint, Idempotency::Consuming, classification) {
        slugkit::retry::RetryDecision::Fail(err) => assert!(err.is_exhausted()),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_retry_report_mentions_attempts() {
    let policy = RetryPolicy::default();
    let mut state = RetryPolicyState::new();
    state.begin_attempt();
    let cause = slugkit::error::classify_failure(&status_failure(
        429,
        &[("x-ratelimit-reason", "rate-limit-exceeded"), ("x-ratelimit-daily-remaining", "12")],
        "",
    ));

    let report = RetryReport::new(&policy, &state, Endpoint::Mint, &cause, Duration::from_secs(2));
    let message = report.format_retry();

    assert!(message.contains("mint"));
    assert!(message.contains("1/5"));
    assert!(message.contains("12"));
}
