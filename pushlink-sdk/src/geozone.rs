//! Throttled geozone location reporting.
//!
//! Coarse movement filtering happens in the location source itself (the
//! movement threshold); on top of that the service enforces a minimum time
//! between sends, and adapts the threshold from the backend's `distance`
//! feedback: a smaller distance means denser server-side zones, so the
//! client reacts to finer movement.

use crate::config::{SdkConfig, methods};
use crate::device::DeviceInfo;
use crate::error::SdkResult;
use pushlink_proto::RequestClient;
use pushlink_types::GeoPosition;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default movement threshold handed to the location source, in the
/// provider's distance unit.
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 100.0;

/// Minimum time between position sends.
pub const MIN_SEND_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// A platform location provider.
///
/// Applies the movement threshold upstream: positions arrive only when the
/// device moved at least that far.
pub trait LocationSource: Send + Sync {
    /// Starts producing positions, filtering by the given movement
    /// threshold. Yields the position stream.
    fn start(&self, movement_threshold: f64) -> SdkResult<UnboundedReceiver<GeoPosition>>;

    /// Updates the movement threshold of a running source.
    fn set_movement_threshold(&self, threshold: f64);

    /// Stops producing positions.
    fn stop(&self);
}

/// Pure send-throttling policy.
///
/// `mark_sent` records the time a send was *issued*, not whether it
/// succeeded, so a failed send cannot cause rapid retries before the next
/// interval elapses.
#[derive(Debug, Clone)]
pub struct GeozoneThrottle {
    min_interval: Duration,
    last_send: Option<Instant>,
}

impl GeozoneThrottle {
    /// Creates a throttle with the given minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_send: None,
        }
    }

    /// Whether a send issued at `now` is admitted.
    #[must_use]
    pub fn should_send(&self, now: Instant) -> bool {
        self.last_send
            .is_none_or(|last| now.duration_since(last) >= self.min_interval)
    }

    /// Records that a send was issued at `now`.
    pub fn mark_sent(&mut self, now: Instant) {
        self.last_send = Some(now);
    }
}

impl Default for GeozoneThrottle {
    fn default() -> Self {
        Self::new(MIN_SEND_INTERVAL)
    }
}

#[derive(Debug, Clone, Serialize)]
struct GeozoneRequest {
    application: String,
    hwid: String,
    lat: f64,
    lng: f64,
}

/// Subscribes to location updates and reports them, throttled.
pub struct GeozoneService {
    client: RequestClient,
    application: String,
    hwid: String,
    source: Arc<dyn LocationSource>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl GeozoneService {
    /// Creates the service around a location source.
    pub fn new(
        client: RequestClient,
        config: &SdkConfig,
        device: &DeviceInfo,
        source: Arc<dyn LocationSource>,
    ) -> Self {
        Self {
            client,
            application: config.app_id.clone(),
            hwid: device.hwid.clone(),
            source,
            task: Mutex::new(None),
        }
    }

    /// Starts location reporting. Idempotent: a second start while running
    /// is a no-op.
    pub fn start(&self) -> SdkResult<()> {
        let mut task = self.task.lock().unwrap();
        if task.is_some() {
            return Ok(());
        }

        let positions = self.source.start(DEFAULT_MOVEMENT_THRESHOLD)?;
        debug!("geozone reporting started");

        let client = self.client.clone();
        let application = self.application.clone();
        let hwid = self.hwid.clone();
        let source = self.source.clone();

        *task = Some(tokio::spawn(async move {
            run_loop(client, application, hwid, source, positions).await;
        }));
        Ok(())
    }

    /// Stops location reporting. Idempotent.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
            self.source.stop();
            debug!("geozone reporting stopped");
        }
    }

    /// Whether reporting is currently running.
    pub fn is_running(&self) -> bool {
        self.task.lock().unwrap().is_some()
    }
}

impl Drop for GeozoneService {
    fn drop(&mut self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}

async fn run_loop(
    client: RequestClient,
    application: String,
    hwid: String,
    source: Arc<dyn LocationSource>,
    mut positions: UnboundedReceiver<GeoPosition>,
) {
    let mut throttle = GeozoneThrottle::default();

    while let Some(position) = positions.recv().await {
        let now = Instant::now();
        if !throttle.should_send(now) {
            debug!("position dropped by send throttle");
            continue;
        }
        throttle.mark_sent(now);

        let request = GeozoneRequest {
            application: application.clone(),
            hwid: hwid.clone(),
            lat: position.latitude,
            lng: position.longitude,
        };

        match client.send(methods::GET_NEAREST_ZONE, &request).await {
            Ok(response) => {
                if let Some(distance) = response.as_ref().and_then(zone_distance) {
                    if distance > 0.0 {
                        // Halve the server's zone distance into the new
                        // movement threshold.
                        source.set_movement_threshold(distance / 2.0);
                        debug!(distance, "movement threshold adapted");
                    }
                }
            }
            Err(e) => warn!(error = %e, "geozone send failed"),
        }
    }
}

fn zone_distance(response: &Value) -> Option<f64> {
    response.get("distance").and_then(Value::as_f64)
}

/// Mock location source for testing.
pub mod mock {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedSender};

    #[derive(Debug, Default)]
    struct MockSourceState {
        running: bool,
        threshold: Option<f64>,
        sender: Option<UnboundedSender<GeoPosition>>,
    }

    /// A location source driven by the test.
    #[derive(Debug, Default)]
    pub struct MockLocationSource {
        state: Mutex<MockSourceState>,
    }

    impl MockLocationSource {
        /// Creates a mock source.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Feeds a position into the stream.
        pub fn push_position(&self, position: GeoPosition) {
            if let Some(sender) = &self.state.lock().unwrap().sender {
                let _ = sender.send(position);
            }
        }

        /// The most recently applied movement threshold.
        pub fn threshold(&self) -> Option<f64> {
            self.state.lock().unwrap().threshold
        }

        /// Whether the source is running.
        pub fn is_running(&self) -> bool {
            self.state.lock().unwrap().running
        }
    }

    impl LocationSource for MockLocationSource {
        fn start(&self, movement_threshold: f64) -> SdkResult<UnboundedReceiver<GeoPosition>> {
            let (tx, rx) = mpsc::unbounded_channel();
            let mut state = self.state.lock().unwrap();
            state.running = true;
            state.threshold = Some(movement_threshold);
            state.sender = Some(tx);
            Ok(rx)
        }

        fn set_movement_threshold(&self, threshold: f64) {
            self.state.lock().unwrap().threshold = Some(threshold);
        }

        fn stop(&self) {
            let mut state = self.state.lock().unwrap();
            state.running = false;
            state.sender = None;
        }
    }
}
