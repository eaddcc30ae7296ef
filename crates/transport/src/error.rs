//! Transport error types
//!
//! Send failures are typed and recoverable; decorators wrap them rather than
//! swallowing them so the caller can distinguish exhaustion from routing.

use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors produced by transports and the queue engine
#[derive(Debug, Error)]
pub enum TransportError {
    /// The collector rejected the batch or the network call failed
    #[error("send failed{}: {message}", status_suffix(.status))]
    SendFailed {
        /// Human-readable failure description
        message: String,
        /// HTTP status when the collector answered with a non-success code
        status: Option<u16>,
    },

    /// A switch found no usable child transport at call time
    #[error("no usable transport")]
    NoUsableTransport,

    /// Retry policy exhausted without a successful delivery
    #[error("retry exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        /// Attempts performed, including the initial one
        attempts: u32,
        /// The failure of the final attempt
        #[source]
        last: Box<TransportError>,
    },

    /// Persistent queue store could not be read or written
    #[error("queue store error: {0}")]
    Store(String),

    /// Endpoint failed validation at construction time
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Underlying HTTP client failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Payload could not be serialized
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TransportError {
    /// Build a send failure from a plain message
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
            status: None,
        }
    }

    /// Build a send failure carrying an HTTP status code
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
            status: Some(status),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" ({code})"),
        None => String::new(),
    }
}
