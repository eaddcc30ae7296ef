//! Tracker - composes events and hands them to a transport
//!
//! A `Tracker` is created once per application (or session) through
//! `TrackerBuilder`. Construction validates configuration synchronously:
//! unless explicitly built composition-only, a tracker needs a transport or
//! an endpoint to build one from.
//!
//! The canonical way to derive a specialized tracker is `clone_with`, which
//! copies all state and appends extra context fragments; the clone's lists
//! are independent of the parent's.

use std::fmt;
use std::sync::Arc;

use spoor_schema::{compose_event, merge_contexts, ContextsConfig, EventTemplate, TrackerEvent};
use spoor_transport::{HttpTransport, RetryTransport, Transport};

use crate::error::{default_error_reporter, ErrorReporter, Result, TrackerError};
use crate::plugin::{ApplicationContextPlugin, PluginChain, TrackerPlugin};

/// Builder for `Tracker`; validates configuration at `build` time.
pub struct TrackerBuilder {
    application_id: String,
    tracker_id: Option<String>,
    config: ContextsConfig,
    plugins: PluginChain,
    transport: Option<Arc<dyn Transport>>,
    endpoint: Option<String>,
    composition_only: bool,
    error_reporter: Option<ErrorReporter>,
    default_plugins: bool,
}

impl TrackerBuilder {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            tracker_id: None,
            config: ContextsConfig::new(),
            plugins: PluginChain::new(),
            transport: None,
            endpoint: None,
            composition_only: false,
            error_reporter: None,
            default_plugins: true,
        }
    }

    /// Stable tracker identity; defaults to the application id. Used to key
    /// persistent queue stores, so concurrent trackers need distinct ids.
    #[must_use]
    pub fn tracker_id(mut self, id: impl Into<String>) -> Self {
        self.tracker_id = Some(id.into());
        self
    }

    /// Collector endpoint; used to build the default transport chain when
    /// no explicit transport is supplied
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Explicit transport, overriding the endpoint-derived default
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build a tracker without any transport; events are composed,
    /// validated and enriched but not delivered
    #[must_use]
    pub fn composition_only(mut self) -> Self {
        self.composition_only = true;
        self
    }

    /// Base context fragment applied to every event, outermost
    #[must_use]
    pub fn contexts(mut self, config: ContextsConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a plugin; plugins run in registration order
    #[must_use]
    pub fn plugin(mut self, plugin: Arc<dyn TrackerPlugin>) -> Self {
        self.plugins.register(plugin);
        self
    }

    /// Disable the built-in default plugins (application context)
    #[must_use]
    pub fn without_default_plugins(mut self) -> Self {
        self.default_plugins = false;
        self
    }

    /// Route surfaced errors to a custom callback instead of the default
    /// `tracing` reporter
    #[must_use]
    pub fn error_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.error_reporter = Some(reporter);
        self
    }

    /// Validate the configuration and build the tracker.
    ///
    /// Fails when the application id is empty, the endpoint is invalid, or
    /// neither a transport nor an endpoint was provided for a delivering
    /// tracker.
    pub fn build(self) -> Result<Tracker> {
        if self.application_id.is_empty() {
            return Err(TrackerError::Configuration(
                "application_id must not be empty".into(),
            ));
        }

        let transport = if self.composition_only {
            None
        } else {
            match (self.transport, &self.endpoint) {
                (Some(transport), _) => Some(transport),
                (None, Some(endpoint)) => {
                    // Default chain: retry with backoff around the HTTP leaf
                    let http = HttpTransport::new(endpoint.clone())?;
                    Some(Arc::new(RetryTransport::new(Arc::new(http))) as Arc<dyn Transport>)
                }
                (None, None) => {
                    return Err(TrackerError::Configuration(
                        "either a transport or an endpoint is required".into(),
                    ));
                }
            }
        };

        let mut plugins = PluginChain::new();
        if self.default_plugins {
            plugins.register(Arc::new(ApplicationContextPlugin::new(
                self.application_id.clone(),
            )));
        }
        // User plugins run after the defaults, in registration order
        let user_plugins = self.plugins;
        plugins = merge_chains(plugins, user_plugins);

        let tracker_id = self.tracker_id.unwrap_or_else(|| self.application_id.clone());
        tracing::debug!(
            application = %self.application_id,
            tracker = %tracker_id,
            plugins = plugins.len(),
            delivering = transport.is_some(),
            "tracker created"
        );

        Ok(Tracker {
            application_id: self.application_id,
            tracker_id,
            config: self.config,
            plugins,
            transport,
            error_reporter: self.error_reporter.unwrap_or_else(default_error_reporter),
        })
    }
}

fn merge_chains(mut base: PluginChain, extra: PluginChain) -> PluginChain {
    for plugin in extra.into_plugins() {
        base.register(plugin);
    }
    base
}

/// Composes, validates, enriches and dispatches tracked events.
///
/// Not `derive(Debug)`: the transport and error reporter are trait objects.
pub struct Tracker {
    application_id: String,
    tracker_id: String,
    config: ContextsConfig,
    plugins: PluginChain,
    transport: Option<Arc<dyn Transport>>,
    error_reporter: ErrorReporter,
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("application_id", &self.application_id)
            .field("tracker_id", &self.tracker_id)
            .field("config", &self.config)
            .field("plugins", &self.plugins.len())
            .field("delivering", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

impl Tracker {
    pub fn builder(application_id: impl Into<String>) -> TrackerBuilder {
        TrackerBuilder::new(application_id)
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn tracker_id(&self) -> &str {
        &self.tracker_id
    }

    /// The tracker's base context fragment
    pub fn contexts(&self) -> &ContextsConfig {
        &self.config
    }

    /// Track an interaction described by `template`, with an optional
    /// call-level context fragment.
    ///
    /// Composition, validation and enrichment are synchronous and happen in
    /// call order; delivery awaits the transport, which for a queued chain
    /// returns as soon as the event is persisted. The returned event is the
    /// exact record handed to the transport.
    pub async fn track(
        &self,
        template: EventTemplate,
        call_config: Option<&ContextsConfig>,
    ) -> Result<TrackerEvent> {
        let empty = ContextsConfig::new();
        let call = call_config.unwrap_or(&empty);

        let mut event = compose_event(&self.config, call, &template);

        self.plugins.run_validation(&event, &self.error_reporter);

        event.set_time(chrono::Utc::now().timestamp_millis());
        self.plugins.run_enrichment(&mut event, &self.error_reporter);

        if let Some(transport) = &self.transport {
            if transport.is_usable() {
                transport.handle(vec![event.clone()]).await?;
            } else {
                tracing::warn!(
                    event = %event.id,
                    transport = %transport.name(),
                    "transport not usable, event not delivered"
                );
                // A dead transport at dispatch time is an environment/config
                // problem the host should hear about, not a silent drop
                (self.error_reporter)(&TrackerError::Transport(
                    spoor_transport::TransportError::NoUsableTransport,
                ));
            }
        }

        Ok(event)
    }

    /// Resolve the tracker a call site should use.
    ///
    /// Bindings call this with an optional explicitly-supplied tracker and
    /// their ambient one; when neither exists the error is surfaced through
    /// `reporter` and returned, so callers fail loudly but uniformly.
    pub fn require<'a>(
        supplied: Option<&'a Tracker>,
        ambient: Option<&'a Tracker>,
        reporter: &ErrorReporter,
    ) -> Result<&'a Tracker> {
        match supplied.or(ambient) {
            Some(tracker) => Ok(tracker),
            None => {
                let error = TrackerError::MissingTracker;
                reporter(&error);
                Err(error)
            }
        }
    }

    /// Derive an independent tracker with `extra` context appended after
    /// this tracker's base fragment.
    ///
    /// All state is copied; mutating the clone's context lists or plugin
    /// chain never affects this tracker.
    #[must_use]
    pub fn clone_with(&self, extra: ContextsConfig) -> Tracker {
        Tracker {
            application_id: self.application_id.clone(),
            tracker_id: self.tracker_id.clone(),
            config: merge_contexts(&[self.config.clone(), extra]),
            plugins: self.plugins.clone(),
            transport: self.transport.clone(),
            error_reporter: Arc::clone(&self.error_reporter),
        }
    }
}
