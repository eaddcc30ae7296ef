//! Retry transport - exponential backoff around an inner transport
//!
//! Each `handle` call retries independently; concurrent in-flight batches
//! do not share attempt counters. Exhausting the policy surfaces the last
//! failure wrapped in `RetryExhausted` so the caller (typically the queue
//! engine) can re-queue the batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use spoor_schema::TrackerEvent;

use crate::error::{Result, TransportError};
use crate::transport::Transport;

/// Backoff policy for `RetryTransport`.
///
/// The delay before retry `n` (1-based) is
/// `min(max_timeout, min_timeout * retry_factor^(n-1))`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the initial one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub min_timeout: Duration,

    /// Upper bound on any single delay
    pub max_timeout: Duration,

    /// Multiplier applied per retry
    pub retry_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            min_timeout: Duration::from_millis(1000),
            max_timeout: Duration::from_millis(10_000),
            retry_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before retry `retry_index` (1-based)
    pub fn delay(&self, retry_index: u32) -> Duration {
        let factor = self.retry_factor.powi(retry_index.saturating_sub(1) as i32);
        let delay = self.min_timeout.mul_f64(factor);
        delay.min(self.max_timeout)
    }
}

/// Retries the inner transport with exponential backoff.
pub struct RetryTransport {
    inner: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl Transport for RetryTransport {
    fn name(&self) -> &str {
        "retry"
    }

    fn is_usable(&self) -> bool {
        self.inner.is_usable()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.handle(events.clone()).await {
                Ok(()) => return Ok(()),
                Err(error) if attempt >= max_attempts => {
                    tracing::warn!(
                        attempts = attempt,
                        error = %error,
                        "retry policy exhausted"
                    );
                    return Err(TransportError::RetryExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                Err(error) => {
                    let delay = self.policy.delay(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "send failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
