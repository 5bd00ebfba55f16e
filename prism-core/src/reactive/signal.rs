//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (memo/effect), the
//!    read is recorded together with the signal's current version.
//!
//! 2. When a write changes the value (per the signal's equality), the
//!    version advances and all dependents are notified.
//!
//! 3. A write of an equal value is a no-op: no version bump, no notification.
//!
//! # Thread Safety
//!
//! The value is protected by a `parking_lot` RwLock. Notifier callbacks are
//! snapshotted before they run so a callback may subscribe or unsubscribe
//! without deadlocking.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::readable::ReadSignal;
use super::runtime::{next_source_id, Runtime, Source, SourceHandle};
use super::subscriber::{Subscriber, SubscriberId};

/// Equality used to decide whether a write is a change.
pub(crate) type EqualsFn<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// A reactive signal holding a value of type T.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<SignalInner<T>>,
}

struct SignalInner<T> {
    id: u64,
    value: RwLock<T>,
    /// Advances on every write that changes the value.
    version: AtomicU64,
    equals: EqualsFn<T>,
    notifiers: RwLock<Vec<Subscriber>>,
    _registration: SourceHandle,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    ///
    /// Writes that compare equal (`PartialEq`) to the current value are
    /// ignored.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(value, |a, b| a == b)
    }

    /// Create a signal that uses `equals` to detect changes.
    ///
    /// `equals` is called as `equals(new, current)`; a write is skipped when
    /// it returns `true`.
    pub fn with_equality<F>(value: T, equals: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let id = next_source_id();
        let inner = Arc::new_cyclic(|weak: &Weak<SignalInner<T>>| {
            let source: Weak<dyn Source> = weak.clone();
            SignalInner {
                id,
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                equals: Arc::new(equals),
                notifiers: RwLock::new(Vec::new()),
                _registration: Runtime::register_source(id, source),
            }
        });

        Self { inner }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the signal's change version.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Get the current value.
    ///
    /// If called within a reactive context, this also registers the
    /// current computation as a subscriber.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Borrow the current value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Runtime::track(self.inner.id, self.version());
        f(&*self.inner.value.read())
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value without tracking dependencies.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.read())
    }

    /// Set a new value and notify subscribers if it differs from the
    /// current one.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.inner.value.write();
            if (self.inner.equals)(&value, &*guard) {
                return;
            }
            *guard = value;
            self.inner.version.fetch_add(1, Ordering::SeqCst);
        }

        self.notify_subscribers();
        Runtime::notify_signal_change(self.inner.id);
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&*self.inner.value.read());
        self.set(new_value);
    }

    /// Register a notification callback for a subscriber.
    ///
    /// The callback will be invoked after every change of the value.
    pub fn subscribe<F>(&self, subscriber_id: SubscriberId, notify: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner
            .notifiers
            .write()
            .push(Subscriber::with_id(subscriber_id, notify));
    }

    /// Remove a subscriber.
    pub fn unsubscribe(&self, subscriber_id: SubscriberId) {
        self.inner
            .notifiers
            .write()
            .retain(|subscriber| subscriber.id() != subscriber_id);
    }

    fn notify_subscribers(&self) {
        let notifiers = self.inner.notifiers.read().clone();
        for subscriber in &notifiers {
            subscriber.notify();
        }
    }

    /// Get the number of subscribers, manual and tracked.
    pub fn subscriber_count(&self) -> usize {
        self.inner.notifiers.read().len() + Runtime::dependent_count(self.inner.id)
    }

    /// Get a read-only view of this signal.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal::new(self.clone())
    }
}

impl<T> Source for SignalInner<T>
where
    T: Send + Sync,
{
    fn source_id(&self) -> u64 {
        self.id
    }

    fn refresh(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &self.get_untracked())
            .field("version", &self.version())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
