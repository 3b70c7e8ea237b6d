//! Core domain errors.

use thiserror::Error;

/// Typed errors raised by the chat store and service layers.
///
/// The transport layer maps these to HTTP status codes:
/// validation -> 400, forbidden -> 403, not found -> 404,
/// invalid state transition -> 409.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Malformed or missing required fields.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown session.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Role/ownership mismatch.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Illegal status transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}
