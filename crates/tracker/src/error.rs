//! Tracker error types and the injectable error reporter

use std::sync::Arc;

use thiserror::Error;

use crate::registry::LocationCollision;

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors raised by the tracker core
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Invalid construction-time configuration; fatal and synchronous
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No tracker was available at a call site and none was supplied
    #[error("no tracker available and none was provided")]
    MissingTracker,

    /// A plugin hook reported a failure; diagnostic, delivery proceeds
    #[error("plugin '{plugin}' {hook} failed: {message}")]
    Plugin {
        plugin: String,
        hook: &'static str,
        message: String,
    },

    /// Two elements resolved to the same location path
    #[error(
        "location collision: '{}' claimed by '{}' is already owned by '{}'",
        .0.location_path, .0.colliding_element_id, .0.existing_element_id
    )]
    Collision(LocationCollision),

    /// Delivery failed after the transport layer exhausted its policy
    #[error(transparent)]
    Transport(#[from] spoor_transport::TransportError),
}

/// Callback invoked for every surfaced tracker error.
///
/// Injectable so host applications can route findings to their own
/// developer-facing channel; the default logs through `tracing`.
pub type ErrorReporter = Arc<dyn Fn(&TrackerError) + Send + Sync>;

/// Default reporter: structured log at error level.
pub fn default_error_reporter() -> ErrorReporter {
    Arc::new(|error| {
        tracing::error!(error = %error, "tracker error");
    })
}
