//! Error types for the SDK.

use pushlink_proto::ProtoError;
use thiserror::Error;

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Errors surfaced to SDK consumers.
///
/// Nothing here is fatal to the hosting process: every failure path degrades
/// to "notify and continue". Statistics and app-open reporting swallow their
/// errors entirely and never produce one of these.
#[derive(Debug, Error)]
pub enum SdkError {
    /// A request/response exchange failed (transport, backend status, or
    /// decode failure). Displays as the human-readable message.
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// The platform notification channel failed.
    #[error("channel error: {0}")]
    Channel(String),

    /// An operation needs an active subscription and there is none.
    #[error("not subscribed")]
    NotSubscribed,
}
