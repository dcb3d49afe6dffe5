//! Tests for the retry loop and response checking

use super::*;
use crate::app::models::UnitSystem;
use crate::app::services::request_formatter::RequestFormatter;
use crate::app::services::upload_worker::{RetryPolicy, check_response, post_with_retries};

fn create_request() -> UploadRequest {
    RequestFormatter::new(
        Arc::new(FieldMap::default_layout()),
        Arc::new(StandardUnits::new()),
        "http://localhost/update",
        ApiKey::new(TEST_API_KEY).unwrap(),
    )
    .unwrap()
    .format(&Record::new(1_700_000_000, UnitSystem::Us).with_value("outTemp", 32.5))
    .unwrap()
}

fn policy(max_tries: u32) -> RetryPolicy {
    RetryPolicy {
        max_tries,
        retry_wait: Duration::from_secs(5),
        timeout: Duration::from_secs(2),
    }
}

#[test]
fn test_check_response() {
    assert!(check_response("1").is_ok());
    assert!(check_response("4711").is_ok());
    assert!(check_response("").is_ok());
    assert!(matches!(check_response("0"), Err(Error::LogicalFailure { .. })));
    assert!(check_response("0\n").is_err());
    assert!(check_response("0\r\n ").is_err());
    assert!(check_response("10").is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_first_attempt_success() {
    let transport = ScriptedTransport::new(vec![]);
    let mut failures = Vec::new();

    let used = post_with_retries(&*transport, &create_request(), &policy(3), |n, _| {
        failures.push(n)
    })
    .await
    .unwrap();

    assert_eq!(used, 1);
    assert!(failures.is_empty());
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_bound_and_spacing() {
    let transport = ScriptedTransport::always(Scripted::Respond(500, "error"), 10);
    let mut failures = Vec::new();
    let started = Instant::now();

    let err = post_with_retries(&*transport, &create_request(), &policy(3), |n, e| {
        failures.push((n, e.to_string()))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { tries: 3 }));
    let sent = transport.sent();
    assert_eq!(sent.len(), 3);
    for pair in sent.windows(2) {
        let gap = pair[1].at - pair[0].at;
        assert!(gap >= Duration::from_secs(5), "gap {gap:?}");
        assert!(gap < Duration::from_secs(6), "gap {gap:?}");
    }
    // No wait after the last attempt
    assert!(started.elapsed() < Duration::from_secs(11));
    assert_eq!(failures.len(), 3);
    assert!(failures[0].1.contains("500"));
}

#[tokio::test(start_paused = true)]
async fn test_zero_body_is_retried() {
    let transport = ScriptedTransport::new(vec![
        Scripted::Respond(200, "0"),
        Scripted::Respond(200, "0\n"),
        Scripted::Respond(200, "1"),
    ]);
    let mut failures = Vec::new();

    let used = post_with_retries(&*transport, &create_request(), &policy(3), |n, _| {
        failures.push(n)
    })
    .await
    .unwrap();

    assert_eq!(used, 3);
    assert_eq!(failures, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_then_success() {
    let transport = ScriptedTransport::new(vec![Scripted::Fail("connection refused")]);

    let used = post_with_retries(&*transport, &create_request(), &policy(2), |_, e| {
        assert!(matches!(e, Error::Transport { .. }))
    })
    .await
    .unwrap();

    assert_eq!(used, 2);
}

#[tokio::test(start_paused = true)]
async fn test_hung_attempt_times_out() {
    let transport = ScriptedTransport::always(Scripted::Hang, 2);
    let started = Instant::now();
    let mut errors = Vec::new();

    let err = post_with_retries(&*transport, &create_request(), &policy(2), |_, e| {
        errors.push(matches!(e, Error::Timeout { seconds: 2 }))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { tries: 2 }));
    assert_eq!(errors, vec![true, true]);
    // Two 2 s timeouts plus one 5 s wait
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(9), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(10), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_single_try_does_not_wait() {
    let transport = ScriptedTransport::always(Scripted::Respond(503, ""), 1);
    let started = Instant::now();

    let result = post_with_retries(&*transport, &create_request(), &policy(1), |_, _| {}).await;

    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(1));
}
