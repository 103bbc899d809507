//! Domain error types.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Identifier is malformed
    #[error("invalid {kind}: '{value}'")]
    InvalidId { kind: &'static str, value: String },
}

/// Message store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The underlying database could not be opened or reached
    #[error("message store unavailable: {0}")]
    Unavailable(String),

    /// A statement failed
    #[error("message store query failed: {0}")]
    Query(String),
}

/// Errors when pushing a payload into one session's outbound queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionPushError {
    /// The session's bounded outbound queue is full
    #[error("outbound queue of session '{0}' is full")]
    QueueFull(String),

    /// The session's writer has gone away
    #[error("session '{0}' is closed")]
    Closed(String),
}
