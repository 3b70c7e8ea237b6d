//! Error types for the client.

use thiserror::Error;

/// Errors that can occur when talking to the chat server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network-level failure (includes timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Transient errors are retried on the next poll tick and never
    /// surfaced as fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Serialization(_) => false,
        }
    }
}
