//! Shared test doubles for transport tests

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use spoor_schema::{compose_event, ContextsConfig, EventTemplate, TrackerEvent};

use crate::error::{Result, TransportError};
use crate::transport::Transport;

/// Build a minimal event for tests
pub fn test_event(name: &str) -> TrackerEvent {
    compose_event(
        &ContextsConfig::new(),
        &ContextsConfig::new(),
        &EventTemplate::new(name),
    )
}

/// Records every batch it receives; usability is switchable at runtime.
#[derive(Default)]
pub struct RecordingTransport {
    pub batches: Mutex<Vec<Vec<TrackerEvent>>>,
    unusable: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unusable() -> Self {
        let transport = Self::default();
        transport.unusable.store(true, Ordering::SeqCst);
        transport
    }

    pub fn set_usable(&self, usable: bool) {
        self.unusable.store(!usable, Ordering::SeqCst);
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    /// Event names across all received batches, in arrival order
    pub fn received_names(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|event| event.event_name.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    fn is_usable(&self) -> bool {
        !self.unusable.load(Ordering::SeqCst)
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        self.batches.lock().push(events);
        Ok(())
    }
}

/// Fails the first `failures` calls, then succeeds and records batches.
pub struct FlakyTransport {
    failures: u32,
    pub calls: AtomicU32,
    pub call_times: Mutex<Vec<tokio::time::Instant>>,
    pub delivered: Mutex<Vec<Vec<TrackerEvent>>>,
}

impl FlakyTransport {
    pub fn failing_first(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            call_times: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    fn name(&self) -> &str {
        "flaky"
    }

    fn is_usable(&self) -> bool {
        true
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().push(tokio::time::Instant::now());
        if call < self.failures {
            return Err(TransportError::send_failed(format!("induced failure {call}")));
        }
        self.delivered.lock().push(events);
        Ok(())
    }
}

/// Always fails with a send error.
pub struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    fn name(&self) -> &str {
        "failing"
    }

    fn is_usable(&self) -> bool {
        true
    }

    async fn handle(&self, _events: Vec<TrackerEvent>) -> Result<()> {
        Err(TransportError::send_failed("always fails"))
    }
}
