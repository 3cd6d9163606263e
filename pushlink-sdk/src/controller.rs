//! Channel lifecycle controller.
//!
//! Owns the single platform notification channel and drives everything off
//! its events: URI assignment triggers backend registration, inbound toasts
//! become accepted pushes, platform errors become token failures.
//!
//! State machine: `Closed → Opening → Open → {Error, Closed}`. Event
//! handlers attach before the channel opens so the URI-updated event can
//! never be missed. All event handling runs on one task, so state mutations
//! are serialized.

use crate::channel::{ChannelEvent, ChannelProvider, PushChannel};
use crate::config::SdkConfig;
use crate::device::DeviceInfo;
use crate::error::{SdkError, SdkResult};
use crate::events::{PushEvent, StartPushSlot};
use crate::launcher::ContentLauncher;
use crate::registration::RegistrationService;
use crate::stats::StatisticsService;
use pushlink_proto::RequestClient;
use pushlink_types::ToastPush;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Lifecycle state of the notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No channel, or the channel was released by unsubscription.
    Closed,
    /// The channel exists but has no URI yet.
    Opening,
    /// The channel has its URI; the token is known.
    Open,
    /// The platform reported a channel error. The channel is not torn down
    /// automatically.
    Error,
}

#[derive(Debug)]
struct Shared {
    state: ChannelState,
    push_token: String,
    last_push: Option<ToastPush>,
    /// Bumped by unsubscription; a registration outcome from a stale
    /// generation is discarded so a late success cannot resurrect a
    /// cleared token.
    generation: u64,
}

struct Inner {
    config: SdkConfig,
    registration: RegistrationService,
    stats: StatisticsService,
    provider: Arc<dyn ChannelProvider>,
    launcher: Arc<dyn ContentLauncher>,
    events: UnboundedSender<PushEvent>,
    start_push: Arc<StartPushSlot>,
    shared: Mutex<Shared>,
    channel: Mutex<Option<Arc<dyn PushChannel>>>,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

/// Controller for the platform notification channel.
///
/// Sole owner and mutator of the process's one channel. Cheap to clone;
/// clones share state.
#[derive(Clone)]
pub struct ChannelController {
    inner: Arc<Inner>,
}

impl ChannelController {
    /// Creates a controller. The channel itself is not touched until
    /// [`subscribe`](Self::subscribe).
    pub fn new(
        client: RequestClient,
        config: SdkConfig,
        device: DeviceInfo,
        provider: Arc<dyn ChannelProvider>,
        launcher: Arc<dyn ContentLauncher>,
        start_push: Arc<StartPushSlot>,
        events: UnboundedSender<PushEvent>,
    ) -> Self {
        let registration = RegistrationService::new(client.clone(), config.clone(), device.clone());
        let stats = StatisticsService::new(client, &config, &device);

        Self {
            inner: Arc::new(Inner {
                config,
                registration,
                stats,
                provider,
                launcher,
                events,
                start_push,
                shared: Mutex::new(Shared {
                    state: ChannelState::Closed,
                    push_token: String::new(),
                    last_push: None,
                    generation: 0,
                }),
                channel: Mutex::new(None),
                event_task: Mutex::new(None),
            }),
        }
    }

    // ── Public API ──────────────────────────────────────────────

    /// Creates or reuses the platform channel and subscribes to pushes.
    ///
    /// Replays a pending start push (one that launched the application)
    /// through the normal accepted path exactly once. A second call while
    /// subscribed is a no-op.
    pub async fn subscribe(&self) -> SdkResult<()> {
        if let Some(push) = self.inner.start_push.take() {
            debug!("replaying start push");
            self.store_and_accept(push);
        }

        if self.inner.channel.lock().unwrap().is_some() {
            return Ok(());
        }

        let (channel, created) = match self.inner.provider.find(&self.inner.config.channel_name).await
        {
            Some(existing) => {
                debug!("channel exists, reusing it");
                (existing, false)
            }
            None => {
                debug!("creating a new channel");
                let channel = self
                    .inner
                    .provider
                    .create(
                        &self.inner.config.channel_name,
                        self.inner.config.service_name.as_deref(),
                    )
                    .await?;
                (channel, true)
            }
        };

        // Attach handlers before opening; the URI event may fire right away.
        let events = channel
            .take_events()
            .ok_or_else(|| SdkError::Channel("channel event stream already taken".to_string()))?;

        {
            let mut shared = self.inner.shared.lock().unwrap();
            shared.state = ChannelState::Opening;
        }
        *self.inner.channel.lock().unwrap() = Some(channel.clone());
        self.spawn_event_loop(events);

        if created {
            channel.open().await?;
        }

        // A reused channel may already carry its URI; treat it as if the
        // URI-updated event had just fired.
        if let Some(uri) = channel.uri() {
            self.handle_uri_updated(uri).await;
        }

        Ok(())
    }

    /// Unsubscribes: detaches handlers, unbinds, closes the channel, clears
    /// the token and notifies the backend. Idempotent — a second call is a
    /// no-op that returns `Ok`.
    pub async fn unsubscribe(&self) -> SdkResult<()> {
        let channel = {
            let mut shared = self.inner.shared.lock().unwrap();
            shared.generation += 1;
            shared.push_token.clear();
            shared.state = ChannelState::Closed;
            self.inner.channel.lock().unwrap().take()
        };

        if let Some(task) = self.inner.event_task.lock().unwrap().take() {
            task.abort();
        }

        let Some(channel) = channel else {
            return Ok(());
        };

        channel.unbind_tile().await;
        channel.unbind_toast().await;
        channel.close().await;
        info!("channel closed");

        self.inner.registration.unregister().await
    }

    /// The current push token; empty until registration and after
    /// unsubscription.
    pub fn push_token(&self) -> String {
        self.inner.shared.lock().unwrap().push_token.clone()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.inner.shared.lock().unwrap().state
    }

    /// The last push received, if any.
    pub fn last_push(&self) -> Option<ToastPush> {
        self.inner.shared.lock().unwrap().last_push.clone()
    }

    /// Content of the last push, or empty.
    pub fn last_push_content(&self) -> String {
        self.last_push().map(|p| p.content).unwrap_or_default()
    }

    /// User data of the last push, or empty.
    pub fn user_data(&self) -> String {
        self.last_push().map(|p| p.user_data).unwrap_or_default()
    }

    // ── Event handling ──────────────────────────────────────────

    fn spawn_event_loop(&self, mut events: UnboundedReceiver<ChannelEvent>) {
        let controller = self.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                controller.handle_event(event).await;
            }
            debug!("channel event stream ended");
        });
        *self.inner.event_task.lock().unwrap() = Some(task);
    }

    async fn handle_event(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::UriUpdated(uri) => self.handle_uri_updated(uri).await,
            ChannelEvent::Error(message) => {
                warn!(%message, "channel error");
                self.inner.shared.lock().unwrap().state = ChannelState::Error;
                self.emit(PushEvent::TokenFailed(message));
            }
            ChannelEvent::ToastReceived(payload) => {
                debug!("toast received");
                let mut push = ToastPush::parse(&payload);
                push.on_start = false;
                self.store_and_accept(push);
            }
        }
    }

    async fn handle_uri_updated(&self, uri: String) {
        info!("channel opened, uri assigned");

        let generation = {
            let mut shared = self.inner.shared.lock().unwrap();
            shared.push_token = uri.clone();
            shared.state = ChannelState::Open;
            shared.generation
        };

        match self.inner.registration.register(&uri).await {
            Ok(()) if self.is_current(generation) => {
                self.emit(PushEvent::TokenReceived(uri));
            }
            Ok(()) => debug!("discarding registration success from a stale generation"),
            Err(e) if self.is_current(generation) => {
                self.emit(PushEvent::TokenFailed(e.to_string()));
            }
            Err(e) => debug!(error = %e, "discarding registration failure from a stale generation"),
        }

        self.bind_notifications().await;
    }

    /// Best-effort, idempotent tile/toast binding. Failures are logged,
    /// never fatal.
    async fn bind_notifications(&self) {
        let Some(channel) = self.inner.channel.lock().unwrap().clone() else {
            return;
        };

        if channel.is_toast_bound() {
            debug!("already bound to toast notifications");
        } else if let Err(e) = channel.bind_toast().await {
            warn!(error = %e, "toast binding failed");
        }

        if channel.is_tile_bound() {
            debug!("already bound to tile notifications");
        } else if let Err(e) = channel
            .bind_tile(&self.inner.config.tile_trusted_servers)
            .await
        {
            warn!(error = %e, "tile binding failed");
        }
    }

    fn store_and_accept(&self, push: ToastPush) {
        self.inner.shared.lock().unwrap().last_push = Some(push.clone());
        self.accept_push(push);
    }

    /// The accepted-push path: report the open statistic, launch external
    /// content when the push carries any, then notify the consumer.
    fn accept_push(&self, push: ToastPush) {
        self.inner.stats.send_push_open(&push.hash);

        if let Some(url) = content_url(&push, &self.inner.config) {
            if let Err(e) = self.inner.launcher.open(&url) {
                warn!(error = %e, "content launch failed");
            }
        }

        self.emit(PushEvent::PushAccepted(push));
    }

    fn emit(&self, event: PushEvent) {
        // A dropped receiver means the consumer went away; nothing to do.
        let _ = self.inner.events.send(event);
    }

    fn is_current(&self, generation: u64) -> bool {
        let shared = self.inner.shared.lock().unwrap();
        shared.generation == generation
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.event_task.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// Resolves the external content a push points at: its direct URL, or the
/// backend HTML page for its content id.
fn content_url(push: &ToastPush, config: &SdkConfig) -> Option<Url> {
    if let Some(url) = &push.url {
        return Some(url.clone());
    }
    if push.html_id != -1 {
        match Url::parse(&config.html_page_url(push.html_id)) {
            Ok(url) => return Some(url),
            Err(e) => warn!(error = %e, "invalid html content url"),
        }
    }
    None
}
