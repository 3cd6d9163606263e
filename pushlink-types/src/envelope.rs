//! Wire envelopes and the backend status convention.
//!
//! Every request body wraps its payload under a single top-level `request`
//! key; every response carries `status_code`, `status_message` and an
//! optional method-specific `response` payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code for a full success.
pub const STATUS_OK: i64 = 200;

/// Status code for a partial/soft success the caller may still treat as
/// success (e.g. a tag update where some tags were skipped).
pub const STATUS_PARTIAL: i64 = 103;

/// The outbound wire envelope: `{"request": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope<T> {
    /// The method-specific request payload.
    pub request: T,
}

impl<T> RequestEnvelope<T> {
    /// Wraps a payload in the envelope.
    pub fn new(request: T) -> Self {
        Self { request }
    }
}

/// The inbound wire envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Backend status code; see [`ResponseEnvelope::is_success`].
    pub status_code: i64,
    /// Human-readable status message; the error message on failure.
    #[serde(default)]
    pub status_message: String,
    /// Method-specific response payload, if the method returns one.
    #[serde(default)]
    pub response: Option<Value>,
}

impl ResponseEnvelope {
    /// Whether the status code signals success (200 or 103).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK || self.status_code == STATUS_PARTIAL
    }
}
