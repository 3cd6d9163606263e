//! The asynchronous request client.
//!
//! One HTTP POST per call, resolving exactly once: either the decoded
//! `response` payload or an error message. Callers that do not care about
//! the outcome use [`RequestClient::send_detached`], which spawns the
//! exchange and only logs the result.

use crate::codec;
use crate::error::{ProtoError, ProtoResult};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Request timeout enforced by the transport. No escalation beyond this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the backend's request/response API.
///
/// The base URL is fixed at construction and never reconfigured afterwards;
/// the target URL for a call is `base_url + method`.
#[derive(Debug, Clone)]
pub struct RequestClient {
    base_url: String,
    client: Client,
}

impl RequestClient {
    /// Creates a client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Performs one request/response exchange.
    ///
    /// Resolves exactly once: `Ok` with the method-specific `response`
    /// payload on status 200/103, or an error carrying the transport
    /// message, the backend's `status_message`, or a decode failure.
    /// No retries, no cancellation.
    pub async fn send<T: Serialize>(
        &self,
        method: &str,
        payload: &T,
    ) -> ProtoResult<Option<Value>> {
        let url = format!("{}{}", self.base_url, method);
        let body = codec::encode(payload)?;

        debug!(method, "sending request");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ProtoError::Network(format!("{method}: {e}")))?;

        let http_status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProtoError::Network(format!("{method}: {e}")))?;

        let envelope = match codec::decode(&text) {
            Ok(envelope) => envelope,
            // A non-2xx reply without a valid envelope is a transport-level
            // failure, not a protocol error.
            Err(_) if !http_status.is_success() => {
                return Err(ProtoError::Network(format!("{method}: HTTP {http_status}")));
            }
            Err(e) => return Err(e),
        };

        if envelope.is_success() {
            debug!(method, status = envelope.status_code, "request succeeded");
            Ok(envelope.response)
        } else {
            Err(ProtoError::Status {
                code: envelope.status_code,
                message: envelope.status_message,
            })
        }
    }

    /// Spawns one exchange on the runtime and forgets it.
    ///
    /// Used where failure is not actionable (statistics, app-open pings).
    /// The outcome is logged, never surfaced.
    pub fn send_detached<T>(&self, method: &str, payload: T)
    where
        T: Serialize + Send + Sync + 'static,
    {
        let client = self.clone();
        let method = method.to_string();

        tokio::spawn(async move {
            match client.send(&method, &payload).await {
                Ok(_) => debug!(method, "detached request succeeded"),
                Err(e) => warn!(method, error = %e, "detached request failed"),
            }
        });
    }
}
