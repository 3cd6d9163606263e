//! Envelope encoding and decoding.

use crate::error::{ProtoError, ProtoResult};
use pushlink_types::{RequestEnvelope, ResponseEnvelope};
use serde::Serialize;

/// Serializes a request payload into the wire envelope
/// `{"request": <payload>}`.
pub fn encode<T: Serialize>(payload: &T) -> ProtoResult<String> {
    Ok(serde_json::to_string(&RequestEnvelope::new(payload))?)
}

/// Parses a response body into a [`ResponseEnvelope`].
///
/// A body that is not valid JSON, or that lacks `status_code`, is a
/// [`ProtoError::Decode`] — a malformed reply must surface as a failure,
/// never as a silent success.
pub fn decode(body: &str) -> ProtoResult<ResponseEnvelope> {
    serde_json::from_str(body).map_err(|e| ProtoError::Decode(format!("malformed response: {e}")))
}
