//! Spoor Tracker - Core of the event tracking SDK
//!
//! Ties the schema and transport crates together:
//!
//! - `Tracker` - composes events from configured context fragments and hands
//!   them to a transport
//! - `PluginChain` - ordered, fail-soft validation and enrichment hooks
//! - `LocationRegistry` - detects two elements claiming the same resolved
//!   location path
//!
//! # Control Flow
//!
//! ```text
//! caller ──→ compose_event (tracker ++ call ++ template contexts)
//!               │
//!          run_validation   (diagnostic, never blocks)
//!               │ stamp time
//!          run_enrichment   (the one in-place mutation point)
//!               │
//!          Transport::handle
//! ```
//!
//! # Error Philosophy
//!
//! Programming mistakes (bad configuration, path collisions, missing
//! tracker) surface immediately through the error reporter; transient
//! delivery failures are the transport layer's job and never reach here
//! until retry policy is exhausted.

mod error;
mod plugin;
mod registry;
mod tracker;

pub use error::{default_error_reporter, ErrorReporter, Result, TrackerError};
pub use plugin::{ApplicationContextPlugin, PluginChain, PluginError, TrackerPlugin};
pub use registry::{LocationCollision, LocationRegistry, SharedLocationRegistry};
pub use tracker::{Tracker, TrackerBuilder};
