//! Context model - ordered context lists and their merge rules
//!
//! A `Context` is a typed, identified piece of metadata attached to events.
//! Contexts come in two flavors with different ordering semantics:
//!
//! - `LocationStack`: order is significant, outermost UI container first
//! - `GlobalContexts`: insertion order, set-like (duplicates tolerated but
//!   semantically discouraged)
//!
//! `ContextsConfig` is a partial fragment of both lists, used to compose
//! tracker-level, call-level and template-level context into one event.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Separator between rendered location path segments.
pub const LOCATION_PATH_SEPARATOR: &str = " / ";

/// A single piece of contextual metadata.
///
/// Serializes with `_type` discriminator plus any type-specific properties
/// flattened into the same object, matching the collector's context schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Context type discriminator (e.g. "SectionContext", "ButtonContext")
    #[serde(rename = "_type")]
    pub context_type: String,

    /// Identifier, unique within its siblings
    pub id: String,

    /// Type-specific properties (e.g. `href` for links)
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl Context {
    /// Create a context with no extra properties
    pub fn new(context_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            context_type: context_type.into(),
            id: id.into(),
            properties: Map::new(),
        }
    }

    /// Attach a type-specific property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Render this context as a `Type:id` path segment
    pub fn path_segment(&self) -> String {
        format!("{}:{}", self.context_type, self.id)
    }
}

/// Ordered sequence of location contexts, outermost-to-innermost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationStack(Vec<Context>);

impl LocationStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an inner context
    pub fn push(&mut self, context: Context) {
        self.0.push(context);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Context> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Context] {
        &self.0
    }

    /// Render the stack as a path string, e.g. `"Section:root / Button:ok"`.
    ///
    /// The empty stack renders as the empty string.
    pub fn render_path(&self) -> String {
        self.0
            .iter()
            .map(Context::path_segment)
            .collect::<Vec<_>>()
            .join(LOCATION_PATH_SEPARATOR)
    }
}

impl From<Vec<Context>> for LocationStack {
    fn from(contexts: Vec<Context>) -> Self {
        Self(contexts)
    }
}

impl FromIterator<Context> for LocationStack {
    fn from_iter<T: IntoIterator<Item = Context>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for LocationStack {
    type Item = Context;
    type IntoIter = std::vec::IntoIter<Context>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Insertion-ordered sequence of global contexts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalContexts(Vec<Context>);

impl GlobalContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, context: Context) {
        self.0.push(context);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Context> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Context] {
        &self.0
    }
}

impl From<Vec<Context>> for GlobalContexts {
    fn from(contexts: Vec<Context>) -> Self {
        Self(contexts)
    }
}

impl FromIterator<Context> for GlobalContexts {
    fn from_iter<T: IntoIterator<Item = Context>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for GlobalContexts {
    type Item = Context;
    type IntoIter = std::vec::IntoIter<Context>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A composable, partial fragment of contextual configuration.
///
/// Missing fields are treated as empty sequences by `merge_contexts` and
/// `compose_event`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextsConfig {
    /// Location contexts contributed by this fragment, outermost first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_stack: Option<LocationStack>,

    /// Global contexts contributed by this fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_contexts: Option<GlobalContexts>,
}

impl ContextsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the location stack fragment
    #[must_use]
    pub fn with_location_stack(mut self, stack: impl Into<LocationStack>) -> Self {
        self.location_stack = Some(stack.into());
        self
    }

    /// Set the global contexts fragment
    #[must_use]
    pub fn with_global_contexts(mut self, contexts: impl Into<GlobalContexts>) -> Self {
        self.global_contexts = Some(contexts.into());
        self
    }

    /// Location contexts of this fragment, empty slice when absent
    pub fn location_contexts(&self) -> &[Context] {
        self.location_stack.as_ref().map_or(&[], LocationStack::as_slice)
    }

    /// Global contexts of this fragment, empty slice when absent
    pub fn global_context_slice(&self) -> &[Context] {
        self.global_contexts.as_ref().map_or(&[], GlobalContexts::as_slice)
    }
}

/// Merge configuration fragments by concatenation, in argument order.
///
/// Earlier fragments are "more outer": their location contexts come first in
/// the merged stack, and their global contexts come first in the merged list.
/// Missing fields are treated as empty sequences. Inputs are never mutated.
///
/// A field in the result is `Some` iff at least one fragment supplied it, so
/// merging pure-absence fragments stays absence.
pub fn merge_contexts(fragments: &[ContextsConfig]) -> ContextsConfig {
    let mut location_stack: Option<LocationStack> = None;
    let mut global_contexts: Option<GlobalContexts> = None;

    for fragment in fragments {
        if let Some(stack) = &fragment.location_stack {
            location_stack
                .get_or_insert_with(LocationStack::new)
                .0
                .extend(stack.iter().cloned());
        }
        if let Some(globals) = &fragment.global_contexts {
            global_contexts
                .get_or_insert_with(GlobalContexts::new)
                .0
                .extend(globals.iter().cloned());
        }
    }

    ContextsConfig {
        location_stack,
        global_contexts,
    }
}
