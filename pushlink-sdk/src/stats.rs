//! Fire-and-forget delivery and open statistics.
//!
//! Neither call surfaces its outcome: a lost statistic is not actionable,
//! so failures are logged by the detached send and otherwise swallowed.

use crate::config::{SdkConfig, methods};
use crate::device::DeviceInfo;
use pushlink_proto::RequestClient;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct StatRequest {
    application: String,
    hwid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
}

/// Reports app-open and push-open events to the backend.
#[derive(Clone)]
pub struct StatisticsService {
    client: RequestClient,
    application: String,
    hwid: String,
}

impl StatisticsService {
    /// Creates the service.
    pub fn new(client: RequestClient, config: &SdkConfig, device: &DeviceInfo) -> Self {
        Self {
            client,
            application: config.app_id.clone(),
            hwid: device.hwid.clone(),
        }
    }

    /// Reports that a push with the given hash was opened.
    pub fn send_push_open(&self, hash: &str) {
        self.client.send_detached(
            methods::PUSH_STAT,
            StatRequest {
                application: self.application.clone(),
                hwid: self.hwid.clone(),
                hash: Some(hash.to_string()),
            },
        );
    }

    /// Reports that the application was opened.
    pub fn send_app_open(&self) {
        self.client.send_detached(
            methods::APPLICATION_OPEN,
            StatRequest {
                application: self.application.clone(),
                hwid: self.hwid.clone(),
                hash: None,
            },
        );
    }
}
