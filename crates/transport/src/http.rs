//! HTTP transport - POSTs event batches to the collector
//!
//! Wire payload: `{ "events": [...], "transport_time": epochMillis }` as the
//! JSON request body. Each event is stamped with its transport time right
//! before serialization. Non-success responses become typed send errors so
//! the retry layer can act on them.

use async_trait::async_trait;
use serde::Serialize;
use spoor_schema::TrackerEvent;

use crate::error::{Result, TransportError};
use crate::transport::Transport;

/// Request body sent to the collector.
#[derive(Debug, Serialize)]
pub struct CollectorPayload {
    pub events: Vec<TrackerEvent>,
    pub transport_time: i64,
}

impl CollectorPayload {
    /// Stamp every event and wrap the batch for sending.
    pub fn new(mut events: Vec<TrackerEvent>) -> Self {
        let transport_time = chrono::Utc::now().timestamp_millis();
        for event in &mut events {
            event.set_transport_time(transport_time);
        }
        Self {
            events,
            transport_time,
        }
    }
}

/// Concrete leaf transport delivering to an HTTP collector endpoint.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `endpoint`.
    ///
    /// Fails synchronously when the endpoint is not a valid absolute URL;
    /// a misconfigured endpoint is a programming mistake, not a transient
    /// network condition.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        reqwest::Url::parse(&endpoint)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        Ok(Self {
            endpoint,
            client: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn is_usable(&self) -> bool {
        true
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let count = events.len();
        let payload = CollectorPayload::new(events);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::send_failed(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(count, endpoint = %self.endpoint, "batch posted");
            Ok(())
        } else {
            Err(TransportError::rejected(
                status.as_u16(),
                format!("collector rejected batch of {count}"),
            ))
        }
    }
}
