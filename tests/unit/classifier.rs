//! Failure classification across statuses, reasons and headers

use std::time::Duration;

use slugkit::error::{classify_failure, classify_status};
use slugkit::transport::TransportFailure;
use slugkit::ErrorKind;

use crate::support::header_map;

fn rate_limit(reason: &str) -> ErrorKind {
    let headers = header_map(&[("x-ratelimit-reason", reason)]);
    classify_status(429, &headers, "").kind
}

#[test]
fn test_status_codes_map_to_kinds() {
    let empty = header_map(&[]);
    let cases = [
        (400, ErrorKind::Validation),
        (401, ErrorKind::Authentication),
        (403, ErrorKind::Authentication),
        (404, ErrorKind::NotFound),
        (422, ErrorKind::Validation),
        (500, ErrorKind::ServerError),
        (502, ErrorKind::ServerError),
        (503, ErrorKind::ServerError),
        (418, ErrorKind::Unknown),
    ];

    for (status, expected) in cases {
        let classification = classify_status(status, &empty, "");
        assert_eq!(classification.kind, expected, "status {status}");
        assert_eq!(classification.status, Some(status));
        assert!(!classification.retryable, "status {status} must not retry");
    }
}

#[test]
fn test_rate_limit_reasons() {
    assert_eq!(rate_limit("rate-limit-exceeded"), ErrorKind::RateLimit);
    assert_eq!(rate_limit("daily-limit-exceeded"), ErrorKind::RateLimit);
    assert_eq!(rate_limit("monthly-limit-exceeded"), ErrorKind::QuotaExceeded);
    assert_eq!(rate_limit("lifetime-limit-exceeded"), ErrorKind::QuotaExceeded);
    assert_eq!(
        rate_limit("request-size-exceeded"),
        ErrorKind::PermanentRejection
    );
    assert_eq!(rate_limit("not-available"), ErrorKind::PermanentRejection);
    assert_eq!(rate_limit("something-new"), ErrorKind::ServerError);
}

#[test]
fn test_reason_falls_back_to_body() {
    let classification = classify_status(
        429,
        &header_map(&[]),
        r#"{"reason": "monthly-limit-exceeded", "detail": "Monthly quota used up"}"#,
    );
    assert_eq!(classification.kind, ErrorKind::QuotaExceeded);
    assert_eq!(classification.reason.as_deref(), Some("monthly-limit-exceeded"));
    assert_eq!(classification.message, "Monthly quota used up");
}

#[test]
fn test_retry_after_accepts_fractional_seconds() {
    let headers = header_map(&[
        ("x-ratelimit-reason", "rate-limit-exceeded"),
        ("retry-after", "1.5"),
    ]);
    let classification = classify_status(429, &headers, "");
    assert!(classification.retryable);
    assert_eq!(classification.retry_after, Some(Duration::from_millis(1500)));
}

#[test]
fn test_unparsable_retry_after_is_ignored() {
    let headers = header_map(&[
        ("x-ratelimit-reason", "rate-limit-exceeded"),
        ("retry-after", "soon"),
    ]);
    assert_eq!(classify_status(429, &headers, "").retry_after, None);
}

#[test]
fn test_out_of_range_retry_after_is_ignored() {
    for raw in ["1e30", "2e19", "-3", "inf", "NaN"] {
        let headers = header_map(&[
            ("x-ratelimit-reason", "rate-limit-exceeded"),
            ("retry-after", raw),
        ]);
        let classification = classify_status(429, &headers, "");
        assert_eq!(classification.kind, ErrorKind::RateLimit, "{raw}");
        assert!(classification.retryable, "{raw}");
        assert_eq!(classification.retry_after, None, "{raw}");
    }
}

#[test]
fn test_quota_headers_are_parsed() {
    let headers = header_map(&[
        ("x-ratelimit-reason", "daily-limit-exceeded"),
        ("x-ratelimit-rpm-remaining", "7"),
        ("x-ratelimit-daily-remaining", "0"),
        ("x-ratelimit-lifetime-remaining", "not-a-number"),
    ]);
    let quota = classify_status(429, &headers, "").quota.unwrap();

    assert_eq!(quota.per_minute, Some(7));
    assert_eq!(quota.daily, Some(0));
    assert_eq!(quota.monthly, None);
    assert_eq!(quota.lifetime, None);
    assert_eq!(quota.to_string(), "per-minute 7, daily 0");
}

#[test]
fn test_no_quota_headers_means_no_quota() {
    let classification = classify_status(500, &header_map(&[]), "boom");
    assert!(classification.quota.is_none());
    assert_eq!(classification.message, "boom");
}

#[test]
fn test_message_prefers_json_detail_fields() {
    let empty = header_map(&[]);
    assert_eq!(
        classify_status(400, &empty, r#"{"detail": "bad pattern"}"#).message,
        "bad pattern"
    );
    assert_eq!(
        classify_status(400, &empty, r#"{"message": "bad count"}"#).message,
        "bad count"
    );
    assert_eq!(
        classify_status(400, &empty, r#"{"error": "bad seed"}"#).message,
        "bad seed"
    );
    assert_eq!(classify_status(404, &empty, "").message, "Not Found");
}

#[test]
fn test_connection_failures() {
    let refused = classify_failure(&TransportFailure::Connection {
        message: "connection refused".to_string(),
        timed_out: false,
    });
    assert_eq!(refused.kind, ErrorKind::Connection);
    assert!(refused.retryable);
    assert_eq!(refused.status, None);

    let timed_out = classify_failure(&TransportFailure::Connection {
        message: "30s elapsed".to_string(),
        timed_out: true,
    });
    assert_eq!(timed_out.kind, ErrorKind::Connection);
    assert!(timed_out.message.contains("timed out"));
}

#[test]
fn test_malformed_response_is_validation() {
    let classification = classify_failure(&TransportFailure::Malformed {
        message: "expected JSON array".to_string(),
    });
    assert_eq!(classification.kind, ErrorKind::Validation);
    assert!(!classification.retryable);
}

#[test]
fn test_display_includes_status_reason_and_quota() {
    let headers = header_map(&[
        ("x-ratelimit-reason", "rate-limit-exceeded"),
        ("x-ratelimit-rpm-remaining", "0"),
    ]);
    let text = classify_status(429, &headers, r#"{"detail": "Slow down"}"#).to_string();
    assert_eq!(
        text,
        "rate limit exceeded (HTTP 429, rate-limit-exceeded): Slow down [remaining: per-minute 0]"
    );
}
