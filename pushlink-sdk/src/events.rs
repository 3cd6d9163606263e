//! SDK notifications and the pending start-push slot.

use pushlink_types::ToastPush;
use std::sync::Mutex;

/// Notifications the SDK emits to its consumer.
///
/// Delivered through an unbounded channel; the consumer drains the receiver
/// on its designated single-threaded (UI-affinity) context, which is what
/// satisfies platform threading rules.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// Registration succeeded; carries the push token.
    TokenReceived(String),
    /// Registration or the platform channel failed; carries the message.
    TokenFailed(String),
    /// A push was accepted and should be shown/handled by the app.
    PushAccepted(ToastPush),
}

/// Take-once slot for a push that launched the application.
///
/// When a push starts the app before any controller exists, the bootstrap
/// code stores its payload here; the first `subscribe` call replays it
/// through the normal push-accepted path exactly once and clears the slot.
#[derive(Debug, Default)]
pub struct StartPushSlot {
    inner: Mutex<Option<ToastPush>>,
}

impl StartPushSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores a launch push payload, marking it `on_start`.
    /// A later `set` overwrites an unclaimed earlier one.
    pub fn set(&self, payload: &str) {
        let mut push = ToastPush::parse(payload);
        push.on_start = true;
        *self.inner.lock().expect("start push slot poisoned") = Some(push);
    }

    /// Reads and clears the slot atomically.
    pub fn take(&self) -> Option<ToastPush> {
        self.inner.lock().expect("start push slot poisoned").take()
    }

    /// Whether a launch push is waiting.
    pub fn is_pending(&self) -> bool {
        self.inner.lock().expect("start push slot poisoned").is_some()
    }
}
