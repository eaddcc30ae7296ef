//! Spoor Transport - Reliable delivery for tracked events
//!
//! This crate provides the delivery half of the tracking SDK: a polymorphic
//! `Transport` trait plus the composable decorators that turn an unreliable
//! network call into at-least-once delivery.
//!
//! # Architecture
//!
//! ```text
//! [Tracker] ──→ QueuedTransport ──→ QueueEngine (batching timer)
//!                                        │
//!                                   QueueStore (memory / file, survives restart)
//!                                        │ batch
//!                                   RetryTransport (exponential backoff)
//!                                        │
//!                                   TransportSwitch (first usable child)
//!                                        │
//!                                   HttpTransport ──→ collector
//! ```
//!
//! # Key Design
//!
//! - **Decorator chain**: Switch/Retry/Queued are plain structs wrapping an
//!   inner `Arc<dyn Transport>`, composed by explicit construction
//! - **At-least-once**: the queue engine removes entries only after the
//!   wrapped transport reported success; failed batches return to the front
//!   of the store in order
//! - **Single mutation thread**: store mutation happens on the engine's
//!   tokio task; the periodic tick is the only autonomous trigger
//! - **No retry counting in the queue**: retry policy lives solely in
//!   `RetryTransport`, composed beneath the queue

mod error;
mod http;
mod queue;
mod queued;
mod retry;
mod store;
mod switch;
mod transport;

pub use error::{Result, TransportError};
pub use http::{CollectorPayload, HttpTransport};
pub use queue::{QueueConfig, QueueEngine, WaitOptions};
pub use queued::QueuedTransport;
pub use retry::{RetryPolicy, RetryTransport};
pub use store::{FileQueueStore, MemoryQueueStore, QueueEntry, QueueStore};
pub use switch::TransportSwitch;
pub use transport::Transport;

#[cfg(test)]
mod retry_test;
#[cfg(test)]
mod switch_test;
#[cfg(test)]
pub(crate) mod test_support;
