//! Event factory - builds immutable event records from composed contexts
//!
//! `compose_event` is the single place where tracker-level, call-level and
//! template-level context fragments are combined into a `TrackerEvent`.
//! The tracker-level fragment is always outermost, the template innermost.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{Context, ContextsConfig, GlobalContexts, LocationStack};

/// Input template for a tracked interaction.
///
/// Carries the event name plus any contexts known at the template level
/// (typically contributed by an element/location resolver). The template
/// never carries an id or timestamps; those are computed at composition
/// and dispatch time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTemplate {
    /// Discriminating event name (e.g. "PressEvent", "VisibleEvent")
    pub event_name: String,

    /// Location contexts resolved for the interacted element
    pub location_stack: LocationStack,

    /// Global contexts supplied with the template
    pub global_contexts: GlobalContexts,
}

impl EventTemplate {
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            location_stack: LocationStack::new(),
            global_contexts: GlobalContexts::new(),
        }
    }

    /// Append an inner location context
    #[must_use]
    pub fn with_location(mut self, context: Context) -> Self {
        self.location_stack.push(context);
        self
    }

    /// Append a global context
    #[must_use]
    pub fn with_global(mut self, context: Context) -> Self {
        self.global_contexts.push(context);
        self
    }
}

/// An immutable tracked event record.
///
/// Created once per interaction by `compose_event`. The `id` is generated
/// at construction; `time` and `transport_time` are stamped at dispatch
/// boundaries and each assigned at most once. Events move through the
/// pipeline by value; the plugin enrichment step is the only place that
/// mutates one after composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    /// Unique event identifier, random v4 UUID generated at composition
    pub id: Uuid,

    /// Discriminating event name
    #[serde(rename = "_type")]
    pub event_name: String,

    /// Composed location stack, outermost first
    pub location_stack: LocationStack,

    /// Composed global contexts, insertion order
    pub global_contexts: GlobalContexts,

    /// Epoch millis when the tracker handed the event to its transport
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,

    /// Epoch millis when a concrete transport actually sent the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_time: Option<i64>,
}

impl TrackerEvent {
    /// Stamp the tracking time. First write wins; later writes are ignored.
    pub fn set_time(&mut self, epoch_millis: i64) {
        if self.time.is_some() {
            tracing::debug!(event = %self.id, "time already set, ignoring");
            return;
        }
        self.time = Some(epoch_millis);
    }

    /// Stamp the transport time. First write wins; later writes are ignored.
    pub fn set_transport_time(&mut self, epoch_millis: i64) {
        if self.transport_time.is_some() {
            tracing::debug!(event = %self.id, "transport_time already set, ignoring");
            return;
        }
        self.transport_time = Some(epoch_millis);
    }
}

/// Compose a new event from configuration fragments and a template.
///
/// The resolved location stack is `tracker ++ call ++ template` and the
/// resolved global contexts follow the same rule: tracker-level context is
/// always outermost. A fresh id is generated; the template's fields never
/// override computed fields. No input is mutated and the returned event
/// shares no state with them.
pub fn compose_event(
    tracker_config: &ContextsConfig,
    call_config: &ContextsConfig,
    template: &EventTemplate,
) -> TrackerEvent {
    let location_stack: LocationStack = tracker_config
        .location_contexts()
        .iter()
        .chain(call_config.location_contexts())
        .chain(template.location_stack.iter())
        .cloned()
        .collect();

    let global_contexts: GlobalContexts = tracker_config
        .global_context_slice()
        .iter()
        .chain(call_config.global_context_slice())
        .chain(template.global_contexts.iter())
        .cloned()
        .collect();

    TrackerEvent {
        id: Uuid::new_v4(),
        event_name: template.event_name.clone(),
        location_stack,
        global_contexts,
        time: None,
        transport_time: None,
    }
}
