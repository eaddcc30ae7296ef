//! Plugin pipeline - ordered, fail-soft hooks over events before dispatch
//!
//! Plugins run in registration order at two execution points:
//!
//! - `validate`: diagnostic checks; findings are reported but never block
//!   delivery
//! - `enrich`: the only place an event is mutated after composition,
//!   typically appending enrichment contexts (device, application, path)
//!
//! A failing hook is skipped and surfaced through the error reporter;
//! subsequent plugins still run.

use std::sync::Arc;

use spoor_schema::{Context, TrackerEvent};
use thiserror::Error;

use crate::error::{ErrorReporter, TrackerError};

/// Failure reported by a plugin hook
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PluginError(pub String);

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A tracker plugin with optional hooks.
///
/// Default implementations make every hook a no-op, so a plugin implements
/// only the capabilities it has. Hooks return `Result` rather than
/// panicking; a panicking plugin is out of contract.
pub trait TrackerPlugin: Send + Sync {
    /// Name used in logs and error reports
    fn name(&self) -> &str;

    /// Whether this plugin should run in the current environment.
    /// Checked before each hook invocation.
    fn is_usable(&self) -> bool {
        true
    }

    /// Diagnostic validation of a composed event
    fn validate(&self, _event: &TrackerEvent) -> std::result::Result<(), PluginError> {
        Ok(())
    }

    /// Mutate the event before it is handed to the transport
    fn enrich(&self, _event: &mut TrackerEvent) -> std::result::Result<(), PluginError> {
        Ok(())
    }
}

/// Registration-ordered plugin list.
///
/// Cloning shares the (immutable) plugin instances but copies the list
/// itself, so a cloned tracker can extend its chain independently.
#[derive(Clone, Default)]
pub struct PluginChain {
    plugins: Vec<Arc<dyn TrackerPlugin>>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin; it runs after all previously registered ones
    pub fn register(&mut self, plugin: Arc<dyn TrackerPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run every usable plugin's `validate` hook in registration order.
    ///
    /// Findings are logged and forwarded to `reporter`; validation is
    /// diagnostic and never aborts delivery.
    pub fn run_validation(&self, event: &TrackerEvent, reporter: &ErrorReporter) {
        for plugin in self.usable() {
            if let Err(error) = plugin.validate(event) {
                tracing::warn!(
                    plugin = %plugin.name(),
                    event = %event.id,
                    finding = %error,
                    "validation finding"
                );
                reporter(&TrackerError::Plugin {
                    plugin: plugin.name().to_owned(),
                    hook: "validate",
                    message: error.0,
                });
            }
        }
    }

    /// Run every usable plugin's `enrich` hook in registration order.
    ///
    /// A failing plugin contributes nothing but does not prevent later
    /// plugins from running.
    pub fn run_enrichment(&self, event: &mut TrackerEvent, reporter: &ErrorReporter) {
        for plugin in self.usable() {
            if let Err(error) = plugin.enrich(event) {
                tracing::warn!(
                    plugin = %plugin.name(),
                    event = %event.id,
                    error = %error,
                    "enrichment failed, skipping plugin"
                );
                reporter(&TrackerError::Plugin {
                    plugin: plugin.name().to_owned(),
                    hook: "enrich",
                    message: error.0,
                });
            }
        }
    }

    fn usable(&self) -> impl Iterator<Item = &Arc<dyn TrackerPlugin>> {
        self.plugins.iter().filter(|p| p.is_usable())
    }

    /// Consume the chain, yielding its plugins in registration order
    pub fn into_plugins(self) -> Vec<Arc<dyn TrackerPlugin>> {
        self.plugins
    }
}

/// Built-in plugin appending an `ApplicationContext` global context.
///
/// Registered by default so every event carries the application it was
/// tracked from. Skips the append when an ApplicationContext is already
/// present (e.g. supplied at the call site).
pub struct ApplicationContextPlugin {
    application_id: String,
}

impl ApplicationContextPlugin {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
        }
    }
}

impl TrackerPlugin for ApplicationContextPlugin {
    fn name(&self) -> &str {
        "application_context"
    }

    fn enrich(&self, event: &mut TrackerEvent) -> std::result::Result<(), PluginError> {
        let already_present = event
            .global_contexts
            .iter()
            .any(|ctx| ctx.context_type == "ApplicationContext");
        if !already_present {
            event
                .global_contexts
                .push(Context::new("ApplicationContext", self.application_id.clone()));
        }
        Ok(())
    }
}
