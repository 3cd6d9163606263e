//! SDK configuration and backend method names.

use url::Url;

/// Device type constant sent with every registration.
pub const DEVICE_TYPE: i64 = 5;

/// Default backend host.
pub const DEFAULT_HOST: &str = "https://cp.pushlink.io/";

/// Well-known name of the platform notification channel.
pub const CHANNEL_NAME: &str = "PL-Channel";

/// Backend method names, appended to the request base URL.
pub mod methods {
    pub const REGISTER_DEVICE: &str = "registerDevice";
    pub const UNREGISTER_DEVICE: &str = "unregisterDevice";
    pub const SET_TAGS: &str = "setTags";
    pub const GET_TAGS: &str = "getTags";
    pub const PUSH_STAT: &str = "pushStat";
    pub const APPLICATION_OPEN: &str = "applicationOpen";
    pub const GET_NEAREST_ZONE: &str = "getNearestZone";
}

/// SDK configuration.
///
/// `host` is fixed for the lifetime of the SDK instance; there is no
/// reconfiguration after the first request goes out.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Backend application id.
    pub app_id: String,
    /// Backend host, with trailing slash.
    pub host: String,
    /// Name of the platform notification channel to create or reuse.
    pub channel_name: String,
    /// Optional name of the external push service to bind the channel to.
    pub service_name: Option<String>,
    /// Trusted servers for tile images, passed to tile binding.
    pub tile_trusted_servers: Vec<Url>,
}

impl SdkConfig {
    /// Creates a configuration for an application id with defaults.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            host: DEFAULT_HOST.to_string(),
            channel_name: CHANNEL_NAME.to_string(),
            service_name: None,
            tile_trusted_servers: Vec::new(),
        }
    }

    /// Overrides the backend host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the external push service name for channel creation.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Sets the trusted servers for tile images.
    #[must_use]
    pub fn with_tile_trusted_servers(mut self, servers: Vec<Url>) -> Self {
        self.tile_trusted_servers = servers;
        self
    }

    /// Base URL for API requests.
    #[must_use]
    pub fn request_base(&self) -> String {
        format!("{}json/1.3/", self.host)
    }

    /// URL of a backend-hosted HTML content page.
    #[must_use]
    pub fn html_page_url(&self, html_id: i64) -> String {
        format!("{}content/{}", self.host, html_id)
    }
}
