//! Queued transport - the asynchronous boundary in the delivery chain
//!
//! `handle` persists events into the engine's store and returns immediately;
//! actual delivery is decoupled from the caller and driven by the engine's
//! periodic tick.

use std::sync::Arc;

use async_trait::async_trait;
use spoor_schema::TrackerEvent;

use crate::error::Result;
use crate::queue::QueueEngine;
use crate::transport::Transport;

/// Enqueues batches into a `QueueEngine` instead of sending them inline.
pub struct QueuedTransport {
    engine: Arc<QueueEngine>,
}

impl QueuedTransport {
    pub fn new(engine: Arc<QueueEngine>) -> Self {
        Self { engine }
    }

    /// The engine backing this transport
    pub fn engine(&self) -> &Arc<QueueEngine> {
        &self.engine
    }
}

#[async_trait]
impl Transport for QueuedTransport {
    fn name(&self) -> &str {
        "queued"
    }

    fn is_usable(&self) -> bool {
        self.engine.transport().is_usable()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        self.engine.enqueue(events)
    }
}
