//! Spoor Schema - Context and event model for the tracking SDK
//!
//! This crate provides the value types that flow through the tracking
//! pipeline:
//! - `Context` - a typed, identified piece of metadata
//! - `LocationStack` - ordered contexts describing UI nesting, outermost first
//! - `GlobalContexts` - insertion-ordered contexts describing global state
//! - `ContextsConfig` - a composable fragment of both lists
//! - `TrackerEvent` - the immutable event record built by `compose_event`
//!
//! # Design Principles
//!
//! - **Value semantics**: contexts and events are plain owned data; merging
//!   and composition never mutate their inputs
//! - **Deterministic ordering**: location stacks and global context lists
//!   preserve the order their fragments were supplied in
//! - **No async, no I/O**: this is a leaf crate usable from any layer

mod context;
mod event;

pub use context::{
    Context, ContextsConfig, GlobalContexts, LocationStack, merge_contexts,
    LOCATION_PATH_SEPARATOR,
};
pub use event::{compose_event, EventTemplate, TrackerEvent};
