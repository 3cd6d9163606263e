//! Device registration and unregistration with the backend.

use crate::config::{DEVICE_TYPE, SdkConfig, methods};
use crate::device::DeviceInfo;
use crate::error::SdkResult;
use pushlink_proto::RequestClient;
use serde::Serialize;

/// Registration payload. Built fresh per attempt and dropped once the
/// exchange resolves; nothing is retained between attempts.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest {
    pub application: String,
    pub hwid: String,
    pub device_type: i64,
    pub push_token: String,
    pub language: String,
    /// Local UTC offset in seconds.
    pub timezone: f64,
    pub os_version: String,
    pub device_model: String,
}

impl RegistrationRequest {
    /// Builds a registration payload from the config, device identity and
    /// the freshly assigned push token.
    pub fn new(config: &SdkConfig, device: &DeviceInfo, push_token: impl Into<String>) -> Self {
        Self {
            application: config.app_id.clone(),
            hwid: device.hwid.clone(),
            device_type: DEVICE_TYPE,
            push_token: push_token.into(),
            language: device.language.clone(),
            timezone: device.timezone_offset_secs,
            os_version: device.os_version.clone(),
            device_model: device.device_model.clone(),
        }
    }
}

/// Identity-only payload shared by unregistration, tag fetches and
/// statistics pings.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityRequest {
    pub application: String,
    pub hwid: String,
}

impl IdentityRequest {
    pub fn new(config: &SdkConfig, device: &DeviceInfo) -> Self {
        Self {
            application: config.app_id.clone(),
            hwid: device.hwid.clone(),
        }
    }
}

/// Registers and unregisters the device with the backend.
pub struct RegistrationService {
    client: RequestClient,
    config: SdkConfig,
    device: DeviceInfo,
}

impl RegistrationService {
    /// Creates the service.
    pub fn new(client: RequestClient, config: SdkConfig, device: DeviceInfo) -> Self {
        Self {
            client,
            config,
            device,
        }
    }

    /// Registers the device under the given push token.
    pub async fn register(&self, push_token: &str) -> SdkResult<()> {
        let request = RegistrationRequest::new(&self.config, &self.device, push_token);
        self.client
            .send(methods::REGISTER_DEVICE, &request)
            .await?;
        Ok(())
    }

    /// Tells the backend this device no longer receives pushes.
    pub async fn unregister(&self) -> SdkResult<()> {
        let request = IdentityRequest::new(&self.config, &self.device);
        self.client
            .send(methods::UNREGISTER_DEVICE, &request)
            .await?;
        Ok(())
    }
}
