//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server URL cannot be turned into chat endpoints
    #[error("Invalid server URL '{0}': expected ws:// or wss://")]
    InvalidUrl(String),

    /// The server answered the handshake with an error status
    #[error("Server rejected the connection with status {0}")]
    Rejected(u16),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
