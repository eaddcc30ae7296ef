//! Switch transport - delegates to the first usable child
//!
//! Usability is re-evaluated on every `handle` call, not cached, so a child
//! that loses a capability at runtime (e.g. a sender that only works before
//! page unload) reroutes traffic to the next child automatically.

use std::sync::Arc;

use async_trait::async_trait;
use spoor_schema::TrackerEvent;

use crate::error::{Result, TransportError};
use crate::transport::Transport;

/// Delegates each batch to the first usable child transport.
pub struct TransportSwitch {
    transports: Vec<Arc<dyn Transport>>,
}

impl TransportSwitch {
    pub fn new(transports: Vec<Arc<dyn Transport>>) -> Self {
        Self { transports }
    }

    fn first_usable(&self) -> Option<&Arc<dyn Transport>> {
        self.transports.iter().find(|t| t.is_usable())
    }
}

#[async_trait]
impl Transport for TransportSwitch {
    fn name(&self) -> &str {
        "switch"
    }

    fn is_usable(&self) -> bool {
        self.transports.iter().any(|t| t.is_usable())
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        match self.first_usable() {
            Some(transport) => {
                tracing::trace!(child = %transport.name(), count = events.len(), "switch routing batch");
                transport.handle(events).await
            }
            None => Err(TransportError::NoUsableTransport),
        }
    }
}
