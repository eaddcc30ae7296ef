//! Retry transport tests
//!
//! Backoff timing tests run under a paused tokio clock so the exponential
//! schedule can be asserted exactly without real waiting.

use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;
use crate::test_support::{test_event, FailingTransport, FlakyTransport};
use crate::transport::Transport;
use crate::{RetryPolicy, RetryTransport};

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        min_timeout: Duration::from_millis(100),
        max_timeout: Duration::from_millis(1000),
        retry_factor: 2.0,
    }
}

#[test]
fn test_delay_follows_exponential_schedule() {
    let policy = fast_policy(5);

    assert_eq!(policy.delay(1), Duration::from_millis(100));
    assert_eq!(policy.delay(2), Duration::from_millis(200));
    assert_eq!(policy.delay(3), Duration::from_millis(400));
    assert_eq!(policy.delay(4), Duration::from_millis(800));
}

#[test]
fn test_delay_is_capped_at_max_timeout() {
    let policy = fast_policy(20);

    assert_eq!(policy.delay(10), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_after_transient_failures() {
    let inner = Arc::new(FlakyTransport::failing_first(2));
    let retry = RetryTransport::with_policy(inner.clone(), fast_policy(5));

    retry.handle(vec![test_event("PressEvent")]).await.unwrap();

    assert_eq!(inner.call_count(), 3);
    assert_eq!(inner.delivered.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_timing_between_attempts() {
    let inner = Arc::new(FlakyTransport::failing_first(2));
    let retry = RetryTransport::with_policy(inner.clone(), fast_policy(5));

    retry.handle(vec![test_event("PressEvent")]).await.unwrap();

    let times = inner.call_times.lock();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_millis(100));
    assert_eq!(times[2] - times[1], Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_surfaces_last_failure() {
    let retry = RetryTransport::with_policy(Arc::new(FailingTransport), fast_policy(3));

    let error = retry.handle(vec![test_event("lost")]).await.unwrap_err();

    match error {
        TransportError::RetryExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, TransportError::SendFailed { .. }));
        }
        other => panic!("expected RetryExhausted, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_batches_retry_independently() {
    let inner = Arc::new(FlakyTransport::failing_first(1));
    let retry = Arc::new(RetryTransport::with_policy(inner.clone(), fast_policy(5)));

    let a = {
        let retry = Arc::clone(&retry);
        tokio::spawn(async move { retry.handle(vec![test_event("a")]).await })
    };
    let b = {
        let retry = Arc::clone(&retry);
        tokio::spawn(async move { retry.handle(vec![test_event("b")]).await })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(inner.delivered.lock().len(), 2);
}

#[tokio::test]
async fn test_empty_batch_is_noop_success() {
    let inner = Arc::new(FailingTransport);
    let retry = RetryTransport::new(inner);

    retry.handle(vec![]).await.unwrap();
}
