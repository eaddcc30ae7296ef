//! Queue engine - batching scheduler over a persistent store
//!
//! The engine owns a `QueueStore` and a wrapped transport. A periodic tokio
//! task is the only autonomous trigger: on each tick it dispatches up to
//! `batch_size` entries once either the batch-size or batch-delay threshold
//! is met. Failed batches go back to the front of the store in order; the
//! engine never counts retries - that policy belongs to `RetryTransport`
//! composed beneath it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use spoor_schema::TrackerEvent;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::store::{QueueEntry, QueueStore};
use crate::transport::Transport;

/// Batching thresholds for the queue engine.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum entries dispatched per batch
    pub batch_size: usize,

    /// Period of the dispatch timer
    pub batch_interval: Duration,

    /// Dispatch a partial batch once the oldest entry is this old
    pub batch_delay: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_interval: Duration::from_millis(1000),
            batch_delay: Duration::from_millis(1000),
        }
    }
}

/// Options for `QueueEngine::wait_until`.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Polling period
    pub interval: Duration,

    /// Give up after this long; the wait resolves `false` instead of erroring
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            timeout: Duration::from_millis(2000),
        }
    }
}

/// Batching scheduler driving a `QueuedTransport`.
///
/// States: *idle* (no timer task) and *running* (periodic task spawned by
/// `run`). Entries are removed from the store only after the wrapped
/// transport reports success, so delivery is at-least-once across restarts
/// when backed by a durable store.
pub struct QueueEngine {
    transport: Arc<dyn Transport>,
    store: Arc<dyn QueueStore>,
    config: QueueConfig,
    runner: Mutex<Option<JoinHandle<()>>>,
}

impl QueueEngine {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn QueueStore>) -> Self {
        Self::with_config(transport, store, QueueConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn Transport>,
        store: Arc<dyn QueueStore>,
        config: QueueConfig,
    ) -> Self {
        Self {
            transport,
            store,
            config,
            runner: Mutex::new(None),
        }
    }

    /// The wrapped transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Append events to the store. Returns once they are persisted; actual
    /// delivery happens on a later tick.
    pub fn enqueue(&self, events: Vec<TrackerEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().timestamp_millis();
        let entries: Vec<QueueEntry> = events
            .into_iter()
            .map(|event| QueueEntry {
                event,
                enqueued_at: now,
            })
            .collect();

        tracing::trace!(count = entries.len(), pending = self.store.len(), "enqueue");
        self.store.append(entries)
    }

    /// Start the periodic dispatch timer. Idempotent: calling `run` on an
    /// already-running engine is a no-op.
    pub fn run(self: &Arc<Self>) {
        let mut runner = self.runner.lock();
        if runner.is_some() {
            return;
        }

        let engine = Arc::clone(self);
        let interval = self.config.batch_interval;
        *runner = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick of a tokio interval completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                engine.tick().await;
            }
        }));
        tracing::debug!(interval_ms = interval.as_millis() as u64, "queue engine running");
    }

    /// Whether the periodic timer is active
    pub fn is_running(&self) -> bool {
        self.runner.lock().is_some()
    }

    /// Cancel the periodic timer. Pending entries stay in the store.
    pub fn stop(&self) {
        if let Some(handle) = self.runner.lock().take() {
            handle.abort();
            tracing::debug!("queue engine stopped");
        }
    }

    /// One scheduler tick: dispatch a batch when a threshold is met.
    async fn tick(&self) {
        if !self.threshold_met() {
            return;
        }

        if let Err(error) = self.dispatch_head().await {
            tracing::warn!(error = %error, pending = self.store.len(), "batch dispatch failed, re-queued");
        }
    }

    fn threshold_met(&self) -> bool {
        if self.store.len() >= self.config.batch_size {
            return true;
        }
        match self.store.oldest_enqueued_at() {
            Some(enqueued_at) => {
                let age = chrono::Utc::now().timestamp_millis() - enqueued_at;
                age >= self.config.batch_delay.as_millis() as i64
            }
            None => false,
        }
    }

    /// Dispatch up to one batch from the head of the store.
    ///
    /// On failure the batch is pushed back to the front, preserving order.
    async fn dispatch_head(&self) -> Result<()> {
        let entries = self.store.take_head(self.config.batch_size)?;
        if entries.is_empty() {
            return Ok(());
        }

        let events: Vec<TrackerEvent> = entries.iter().map(|e| e.event.clone()).collect();
        let count = events.len();

        match self.transport.handle(events).await {
            Ok(()) => {
                tracing::debug!(count, pending = self.store.len(), "batch delivered");
                Ok(())
            }
            Err(error) => {
                self.store.push_front(entries)?;
                Err(error)
            }
        }
    }

    /// Force immediate dispatch of everything queued, ignoring thresholds.
    ///
    /// Stops at the first failing batch; that batch (and everything behind
    /// it) stays queued for the next tick.
    pub async fn flush(&self) -> Result<()> {
        while !self.store.is_empty() {
            self.dispatch_head().await?;
        }
        Ok(())
    }

    /// Poll until the store is empty, or `timeout` elapses.
    ///
    /// Resolves `true` when the queue drained in time; `false` on timeout,
    /// never an error, so callers can decide whether to flush anyway.
    pub async fn wait_for_idle(&self, options: WaitOptions) -> bool {
        self.wait_until(options, |store| store.is_empty()).await
    }

    /// Poll an arbitrary predicate over the store at `options.interval`
    /// until it holds or `options.timeout` elapses.
    pub async fn wait_until<F>(&self, options: WaitOptions, predicate: F) -> bool
    where
        F: Fn(&dyn QueueStore) -> bool,
    {
        let deadline = tokio::time::Instant::now() + options.timeout;
        loop {
            if predicate(self.store.as_ref()) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(options.interval).await;
        }
    }
}

impl Drop for QueueEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.runner.lock().take() {
            handle.abort();
        }
    }
}
