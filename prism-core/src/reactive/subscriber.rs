//! Subscriber types for the reactive system.
//!
//! A subscriber is anything that wants to hear about a change: memos and
//! effects through automatic tracking, or plain callbacks registered by hand
//! with [`Signal::subscribe`](super::Signal::subscribe).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a subscriber.
///
/// Each subscriber (memo, effect, or manual callback) gets a unique ID when
/// created. The runtime uses it to record dependencies and to deduplicate
/// effects queued during a single propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A manually registered change callback.
///
/// The callback is reference counted so a signal can snapshot its notifier
/// list and release its lock before invoking anything.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl Subscriber {
    /// Create a subscriber with a fresh ID.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_id(SubscriberId::new(), notify)
    }

    /// Create a subscriber for an existing ID.
    pub fn with_id<F>(id: SubscriberId, notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id,
            notify: Arc::new(notify),
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Notify the subscriber that the value it watches changed.
    pub fn notify(&self) {
        (self.notify)();
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}
