//! Platform notification channel abstraction.
//!
//! The platform channel is a black box that produces a channel URI and
//! asynchronous events. These traits let the lifecycle controller drive any
//! platform implementation, and the `mock` module provides a scriptable one
//! for tests.

use crate::error::SdkResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;

/// An asynchronous event produced by the platform channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel was assigned (or re-assigned) its URI.
    UriUpdated(String),
    /// The channel failed; carries the platform error message.
    Error(String),
    /// An inbound toast push arrived; carries the raw encoded payload.
    ToastReceived(String),
}

/// A platform notification channel.
///
/// Exactly one live instance exists per process; the lifecycle controller is
/// its sole owner and detaches the event stream before releasing it.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// The channel URI, once the platform has assigned one.
    fn uri(&self) -> Option<String>;

    /// Opens the channel. Attach to events first: the URI event can fire
    /// immediately after opening.
    async fn open(&self) -> SdkResult<()>;

    /// Closes the channel and releases the platform resource.
    async fn close(&self);

    /// Binds the channel to toast notifications.
    async fn bind_toast(&self) -> SdkResult<()>;

    /// Binds the channel to tile notifications, optionally allowing tile
    /// images from the given trusted servers.
    async fn bind_tile(&self, trusted_servers: &[Url]) -> SdkResult<()>;

    /// Whether the channel is bound to toast notifications.
    fn is_toast_bound(&self) -> bool;

    /// Whether the channel is bound to tile notifications.
    fn is_tile_bound(&self) -> bool;

    /// Removes the toast binding. A no-op when not bound.
    async fn unbind_toast(&self);

    /// Removes the tile binding. A no-op when not bound.
    async fn unbind_tile(&self);

    /// Takes the channel's event stream. Yields `None` after the first call;
    /// there is exactly one consumer.
    fn take_events(&self) -> Option<UnboundedReceiver<ChannelEvent>>;
}

/// Finds or creates platform channels by their well-known name.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    /// Returns the existing channel with this name, if the platform already
    /// has one (e.g. from a previous run of the application).
    async fn find(&self, name: &str) -> Option<Arc<dyn PushChannel>>;

    /// Creates a new channel, optionally bound to a named external push
    /// service. The returned channel is not yet open.
    async fn create(
        &self,
        name: &str,
        service_name: Option<&str>,
    ) -> SdkResult<Arc<dyn PushChannel>>;
}

/// Mock channel and provider for testing.
pub mod mock {
    use super::*;
    use crate::error::SdkError;
    use std::sync::Mutex;
    use tokio::sync::mpsc::{self, UnboundedSender};

    #[derive(Debug, Default)]
    struct MockChannelState {
        uri: Option<String>,
        open_calls: usize,
        closed: bool,
        toast_bound: bool,
        tile_bound: bool,
        toast_bind_calls: usize,
        tile_bind_calls: usize,
        fail_toast_bind: bool,
        fail_open: bool,
    }

    /// A scriptable in-memory channel.
    pub struct MockChannel {
        state: Mutex<MockChannelState>,
        events_tx: UnboundedSender<ChannelEvent>,
        events_rx: Mutex<Option<UnboundedReceiver<ChannelEvent>>>,
    }

    impl MockChannel {
        /// Creates a mock channel with no URI assigned yet.
        pub fn new() -> Arc<Self> {
            let (tx, rx) = mpsc::unbounded_channel();
            Arc::new(Self {
                state: Mutex::new(MockChannelState::default()),
                events_tx: tx,
                events_rx: Mutex::new(Some(rx)),
            })
        }

        /// Creates a mock channel that already has a URI (a reused channel).
        pub fn with_uri(uri: impl Into<String>) -> Arc<Self> {
            let channel = Self::new();
            channel.state.lock().unwrap().uri = Some(uri.into());
            channel
        }

        /// Scripts an event. `UriUpdated` also records the URI.
        pub fn emit(&self, event: ChannelEvent) {
            if let ChannelEvent::UriUpdated(uri) = &event {
                self.state.lock().unwrap().uri = Some(uri.clone());
            }
            let _ = self.events_tx.send(event);
        }

        /// Makes the next toast binding fail.
        pub fn fail_toast_bind(&self) {
            self.state.lock().unwrap().fail_toast_bind = true;
        }

        /// Makes `open` fail.
        pub fn fail_open(&self) {
            self.state.lock().unwrap().fail_open = true;
        }

        /// Number of `open` calls.
        pub fn open_calls(&self) -> usize {
            self.state.lock().unwrap().open_calls
        }

        /// Whether the channel has been closed.
        pub fn is_closed(&self) -> bool {
            self.state.lock().unwrap().closed
        }

        /// Number of toast bind attempts.
        pub fn toast_bind_calls(&self) -> usize {
            self.state.lock().unwrap().toast_bind_calls
        }

        /// Number of tile bind attempts.
        pub fn tile_bind_calls(&self) -> usize {
            self.state.lock().unwrap().tile_bind_calls
        }
    }

    #[async_trait]
    impl PushChannel for MockChannel {
        fn uri(&self) -> Option<String> {
            self.state.lock().unwrap().uri.clone()
        }

        async fn open(&self) -> SdkResult<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_open {
                return Err(SdkError::Channel("open failed".to_string()));
            }
            state.open_calls += 1;
            Ok(())
        }

        async fn close(&self) {
            self.state.lock().unwrap().closed = true;
        }

        async fn bind_toast(&self) -> SdkResult<()> {
            let mut state = self.state.lock().unwrap();
            state.toast_bind_calls += 1;
            if state.fail_toast_bind {
                return Err(SdkError::Channel("toast binding rejected".to_string()));
            }
            state.toast_bound = true;
            Ok(())
        }

        async fn bind_tile(&self, _trusted_servers: &[Url]) -> SdkResult<()> {
            let mut state = self.state.lock().unwrap();
            state.tile_bind_calls += 1;
            state.tile_bound = true;
            Ok(())
        }

        fn is_toast_bound(&self) -> bool {
            self.state.lock().unwrap().toast_bound
        }

        fn is_tile_bound(&self) -> bool {
            self.state.lock().unwrap().tile_bound
        }

        async fn unbind_toast(&self) {
            self.state.lock().unwrap().toast_bound = false;
        }

        async fn unbind_tile(&self) {
            self.state.lock().unwrap().tile_bound = false;
        }

        fn take_events(&self) -> Option<UnboundedReceiver<ChannelEvent>> {
            self.events_rx.lock().unwrap().take()
        }
    }

    /// A provider backed by mock channels.
    #[derive(Default)]
    pub struct MockProvider {
        existing: Mutex<Option<Arc<MockChannel>>>,
        created: Mutex<Vec<Arc<MockChannel>>>,
    }

    impl MockProvider {
        /// Creates a provider with no pre-existing channel.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Creates a provider that will hand out an existing channel.
        pub fn with_existing(channel: Arc<MockChannel>) -> Arc<Self> {
            let provider = Self::default();
            *provider.existing.lock().unwrap() = Some(channel);
            Arc::new(provider)
        }

        /// Channels created through this provider.
        pub fn created(&self) -> Vec<Arc<MockChannel>> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChannelProvider for MockProvider {
        async fn find(&self, _name: &str) -> Option<Arc<dyn PushChannel>> {
            self.existing
                .lock()
                .unwrap()
                .clone()
                .map(|c| c as Arc<dyn PushChannel>)
        }

        async fn create(
            &self,
            _name: &str,
            _service_name: Option<&str>,
        ) -> SdkResult<Arc<dyn PushChannel>> {
            let channel = MockChannel::new();
            self.created.lock().unwrap().push(channel.clone());
            Ok(channel)
        }
    }
}
