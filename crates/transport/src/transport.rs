//! Transport trait - the single capability all delivery backends implement

use async_trait::async_trait;
use spoor_schema::TrackerEvent;

use crate::error::Result;

/// A delivery backend for tracked events.
///
/// Implemented both by concrete leaves (HTTP) and by composition decorators
/// (switch, retry, queued). Failures must be signaled through a
/// `TransportError`, never silently dropped.
///
/// `handle` receives events by value; an empty batch is a successful no-op
/// so decorators never have to special-case it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs (e.g. "http", "retry", "switch")
    fn name(&self) -> &str;

    /// Whether this transport can deliver in the current environment.
    ///
    /// Re-evaluated on every routing decision; a transport may become
    /// unusable (or usable again) at runtime.
    fn is_usable(&self) -> bool;

    /// Deliver a batch of events.
    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()>;
}
