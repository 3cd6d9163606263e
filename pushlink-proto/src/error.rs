//! Error types for the protocol layer.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtoResult<T> = Result<T, ProtoError>;

/// Errors that can occur during a request/response exchange.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Transport-level failure (connection, timeout, I/O).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status code. The message is
    /// the backend's `status_message`, verbatim.
    #[error("{message}")]
    Status {
        /// The backend status code.
        code: i64,
        /// The backend's `status_message`.
        message: String,
    },

    /// The response body was not a well-formed envelope.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
