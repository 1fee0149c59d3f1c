//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// `send` was called before any transport was created
    #[error("Connection is not initialized")]
    NotInitialized,

    /// The transport did not become ready within the readiness wait
    #[error("Connection was not ready after {attempts} attempts")]
    ConnectionTimeout { attempts: u32 },

    /// Low-level transport fault
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Inbound payload could not be decoded as a wire message
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The connection manager task is no longer running
    #[error("Connection manager has shut down")]
    Shutdown,
}
