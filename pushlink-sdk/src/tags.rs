//! Tag sync with the backend.

use crate::config::{SdkConfig, methods};
use crate::device::DeviceInfo;
use crate::error::SdkResult;
use pushlink_proto::ProtoError;
use pushlink_proto::RequestClient;
use pushlink_types::{SkippedTag, TagValue};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
struct SetTagsRequest {
    application: String,
    hwid: String,
    tags: HashMap<String, TagValue>,
}

#[derive(Debug, Clone, Serialize)]
struct GetTagsRequest {
    application: String,
    hwid: String,
}

/// Sends tag updates and fetches the device's current tags.
///
/// Overlapping mutating calls are not serialized; if two updates are in
/// flight, the later response wins for the skipped-tag report. Callers
/// should not issue concurrent updates.
#[derive(Clone)]
pub struct TagsService {
    client: RequestClient,
    application: String,
    hwid: String,
}

impl TagsService {
    /// Creates the service.
    pub fn new(client: RequestClient, config: &SdkConfig, device: &DeviceInfo) -> Self {
        Self {
            client,
            application: config.app_id.clone(),
            hwid: device.hwid.clone(),
        }
    }

    /// Sends a tag update.
    ///
    /// Returns the tags the backend rejected; an empty list means all tags
    /// were accepted (the backend omits `skipped` in that case).
    pub async fn set_tags(&self, tags: HashMap<String, TagValue>) -> SdkResult<Vec<SkippedTag>> {
        let request = SetTagsRequest {
            application: self.application.clone(),
            hwid: self.hwid.clone(),
            tags,
        };

        let response = self.client.send(methods::SET_TAGS, &request).await?;

        let skipped = match response.as_ref().and_then(|r| r.get("skipped")) {
            Some(list) => serde_json::from_value(list.clone()).map_err(|e| {
                ProtoError::Decode(format!("malformed skipped tag list: {e}"))
            })?,
            None => Vec::new(),
        };

        if !skipped.is_empty() {
            debug!(count = skipped.len(), "backend skipped tags");
        }

        Ok(skipped)
    }

    /// Fetches the device's tags; delivers the raw response payload.
    pub async fn get_tags(&self) -> SdkResult<Option<Value>> {
        let request = GetTagsRequest {
            application: self.application.clone(),
            hwid: self.hwid.clone(),
        };
        Ok(self.client.send(methods::GET_TAGS, &request).await?)
    }
}
