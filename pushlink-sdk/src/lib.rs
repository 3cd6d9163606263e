//! Push registration, tag sync, statistics and geozone reporting.
//!
//! The SDK registers the device for push notifications with the backend,
//! keeps the registration in sync (token, tags, unregistration), reports
//! delivery/open statistics, and optionally reports throttled location
//! updates.
//!
//! # Architecture
//!
//! - **Channel lifecycle controller**: owns the platform notification
//!   channel and drives registration off its events
//! - **Tag sync**: tag updates and fetches, with skipped-tag diagnostics
//! - **Statistics**: fire-and-forget app-open and push-open reports
//! - **Geozone**: throttled location reporting with adaptive thresholds
//!
//! All of it sits on the request/response protocol layer in
//! `pushlink-proto`.
//!
//! # Example
//!
//! ```no_run
//! use pushlink_sdk::{PushLink, SdkConfig};
//! use pushlink_sdk::channel::mock::MockProvider;
//! use pushlink_sdk::geozone::mock::MockLocationSource;
//! use pushlink_sdk::launcher::NoopLauncher;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let config = SdkConfig::new("APP-12345");
//! let sdk = PushLink::new(
//!     config,
//!     MockProvider::new(),
//!     Arc::new(NoopLauncher),
//!     MockLocationSource::new(),
//! );
//!
//! let mut events = sdk.take_events().unwrap();
//! sdk.subscribe().await.unwrap();
//! while let Some(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # }
//! ```

pub mod channel;
mod config;
mod controller;
mod device;
mod error;
mod events;
pub mod geozone;
pub mod launcher;
mod registration;
mod stats;
mod tags;

pub use config::{CHANNEL_NAME, DEFAULT_HOST, DEVICE_TYPE, SdkConfig, methods};
pub use controller::{ChannelController, ChannelState};
pub use device::DeviceInfo;
pub use error::{SdkError, SdkResult};
pub use events::{PushEvent, StartPushSlot};
pub use geozone::{
    DEFAULT_MOVEMENT_THRESHOLD, GeozoneService, GeozoneThrottle, LocationSource,
    MIN_SEND_INTERVAL,
};
pub use launcher::ContentLauncher;
pub use registration::{IdentityRequest, RegistrationRequest, RegistrationService};
pub use stats::StatisticsService;
pub use tags::TagsService;

pub use channel::{ChannelEvent, ChannelProvider, PushChannel};
pub use pushlink_types::{GeoPosition, SkippedTag, TagValue, ToastPush};

use pushlink_proto::RequestClient;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// The SDK context object.
///
/// Construct exactly one per process and pass it to collaborators; the
/// platform allows only a single live notification channel, and this object
/// is its owner. There is no ambient global state.
pub struct PushLink {
    config: SdkConfig,
    device: DeviceInfo,
    controller: ChannelController,
    tags: TagsService,
    stats: StatisticsService,
    geozone: GeozoneService,
    start_push: Arc<StartPushSlot>,
    events: Mutex<Option<UnboundedReceiver<PushEvent>>>,
}

impl PushLink {
    /// Creates the SDK, collecting the current device's identity.
    pub fn new(
        config: SdkConfig,
        provider: Arc<dyn ChannelProvider>,
        launcher: Arc<dyn ContentLauncher>,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        Self::with_device(config, DeviceInfo::collect(), provider, launcher, location)
    }

    /// Creates the SDK with an explicit device identity (tests, hosts with
    /// their own introspection).
    pub fn with_device(
        config: SdkConfig,
        device: DeviceInfo,
        provider: Arc<dyn ChannelProvider>,
        launcher: Arc<dyn ContentLauncher>,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        let client = RequestClient::new(config.request_base());
        let start_push = Arc::new(StartPushSlot::new());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let controller = ChannelController::new(
            client.clone(),
            config.clone(),
            device.clone(),
            provider,
            launcher,
            start_push.clone(),
            events_tx,
        );
        let tags = TagsService::new(client.clone(), &config, &device);
        let stats = StatisticsService::new(client.clone(), &config, &device);
        let geozone = GeozoneService::new(client, &config, &device, location);

        Self {
            config,
            device,
            controller,
            tags,
            stats,
            geozone,
            start_push,
            events: Mutex::new(Some(events_rx)),
        }
    }

    // ── Events ──────────────────────────────────────────────────

    /// Takes the SDK notification stream. Drain it on your designated
    /// (UI-affinity) context. Yields `None` after the first call.
    pub fn take_events(&self) -> Option<UnboundedReceiver<PushEvent>> {
        self.events.lock().unwrap().take()
    }

    /// Stores the payload of a push that launched the application; the next
    /// [`subscribe`](Self::subscribe) replays it exactly once.
    pub fn set_start_push(&self, payload: &str) {
        self.start_push.set(payload);
    }

    // ── Subscription ────────────────────────────────────────────

    /// Creates or reuses the notification channel and registers the device.
    pub async fn subscribe(&self) -> SdkResult<()> {
        self.controller.subscribe().await
    }

    /// Unsubscribes from pushes and unregisters with the backend.
    pub async fn unsubscribe(&self) -> SdkResult<()> {
        self.controller.unsubscribe().await
    }

    // ── Tags ────────────────────────────────────────────────────

    /// Sends a tag update; returns the tags the backend skipped.
    pub async fn send_tags(
        &self,
        tags: HashMap<String, TagValue>,
    ) -> SdkResult<Vec<SkippedTag>> {
        self.tags.set_tags(tags).await
    }

    /// Fetches the device's tags as the raw response payload.
    pub async fn get_tags(&self) -> SdkResult<Option<Value>> {
        self.tags.get_tags().await
    }

    // ── Statistics ──────────────────────────────────────────────

    /// Reports an application open. Fire-and-forget.
    pub fn report_app_open(&self) {
        self.stats.send_app_open();
    }

    // ── Geolocation ─────────────────────────────────────────────

    /// Starts throttled geozone reporting.
    pub fn start_geolocation(&self) -> SdkResult<()> {
        self.geozone.start()
    }

    /// Stops geozone reporting.
    pub fn stop_geolocation(&self) {
        self.geozone.stop();
    }

    // ── Read-only state ─────────────────────────────────────────

    /// The current push token; empty until registration completes.
    pub fn push_token(&self) -> String {
        self.controller.push_token()
    }

    /// The unique hardware id used in backend communication.
    pub fn device_unique_id(&self) -> &str {
        &self.device.hwid
    }

    /// Content of the last push received, or empty.
    pub fn last_push_content(&self) -> String {
        self.controller.last_push_content()
    }

    /// User data of the last push received, or empty.
    pub fn user_data(&self) -> String {
        self.controller.user_data()
    }

    /// Lifecycle state of the notification channel.
    pub fn channel_state(&self) -> ChannelState {
        self.controller.state()
    }

    /// The SDK configuration.
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }
}
