//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, memos, and
//! effects. It keeps the dependency graph and propagates changes.
//!
//! # How It Works
//!
//! 1. Signals and memos register as *sources*; memos and effects register as
//!    *subscribers*. Both registries hold weak references only.
//!
//! 2. When a subscriber reads a source inside its reactive context, the
//!    runtime records the edge `source -> subscriber`.
//!
//! 3. When a source's value changes, the runtime:
//!    a. Finds all dependent memos/effects
//!    b. Marks them as "maybe dirty" (memos forward this to their own dependents)
//!    c. Queues effects, deduplicated, until the outermost propagation ends
//!    d. Flushes the queue; each effect pulls its sources and only re-runs
//!       if one of them really changed
//!
//! Memos are lazy: they never recompute during propagation, only on read.
//!
//! # Thread Safety
//!
//! The registries are process-wide concurrent maps so handles can move
//! between threads (timers fire on tokio workers). The tracking context and
//! the pending-effect queue are thread-local.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::subscriber::SubscriberId;

/// A computation that can be notified when its dependencies change.
pub trait Reactive: Send + Sync {
    /// Get the subscriber ID for this reactive value.
    fn subscriber_id(&self) -> SubscriberId;

    /// Mark this reactive value as potentially needing update.
    fn mark_maybe_dirty(&self);

    /// Schedule this reactive value for execution (effects only).
    fn schedule(&self);

    /// Check if this reactive value is an effect (eager) or memo (lazy).
    fn is_eager(&self) -> bool;
}

/// A readable value whose changes are versioned.
pub trait Source: Send + Sync {
    /// The source's unique ID.
    fn source_id(&self) -> u64;

    /// Bring the value up to date and return its current version.
    ///
    /// The version advances exactly when the observable value changes.
    fn refresh(&self) -> u64;
}

/// Allocate an ID in the shared signal/memo ID space.
pub(crate) fn next_source_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a registered subscriber.
///
/// Dropping this handle unregisters the subscriber from the runtime.
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

/// Handle to a registered source.
///
/// Dropping this handle unregisters the source and forgets its dependents.
pub struct SourceHandle {
    source_id: u64,
}

impl Drop for SourceHandle {
    fn drop(&mut self) {
        Runtime::unregister_source(self.source_id);
    }
}

/// The global reactive runtime.
pub struct Runtime;

type DependentList = SmallVec<[SubscriberId; 4]>;

static REGISTRY: OnceLock<DashMap<SubscriberId, Weak<dyn Reactive>>> = OnceLock::new();
static SOURCES: OnceLock<DashMap<u64, Weak<dyn Source>>> = OnceLock::new();
static SIGNAL_SUBSCRIBERS: OnceLock<DashMap<u64, DependentList>> = OnceLock::new();

thread_local! {
    static PROPAGATION_DEPTH: Cell<usize> = const { Cell::new(0) };
    static PENDING_EFFECTS: RefCell<Vec<Arc<dyn Reactive>>> = const { RefCell::new(Vec::new()) };
}

fn get_registry() -> &'static DashMap<SubscriberId, Weak<dyn Reactive>> {
    REGISTRY.get_or_init(DashMap::new)
}

fn get_sources() -> &'static DashMap<u64, Weak<dyn Source>> {
    SOURCES.get_or_init(DashMap::new)
}

fn get_signal_subscribers() -> &'static DashMap<u64, DependentList> {
    SIGNAL_SUBSCRIBERS.get_or_init(DashMap::new)
}

/// Keeps the propagation depth balanced if a `mark_maybe_dirty` panics.
struct PropagationGuard;

impl PropagationGuard {
    fn enter() -> Self {
        PROPAGATION_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for PropagationGuard {
    fn drop(&mut self) {
        PROPAGATION_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

impl Runtime {
    /// Register a subscriber with the runtime.
    ///
    /// Returns a handle that unregisters the subscriber when dropped.
    pub fn register(id: SubscriberId, reactive: Weak<dyn Reactive>) -> ReactiveHandle {
        get_registry().insert(id, reactive);
        tracing::trace!(?id, "registered subscriber");
        ReactiveHandle { subscriber_id: id }
    }

    /// Register a source with the runtime.
    pub fn register_source(source_id: u64, source: Weak<dyn Source>) -> SourceHandle {
        get_sources().insert(source_id, source);
        SourceHandle { source_id }
    }

    fn unregister(id: SubscriberId) {
        get_registry().remove(&id);
        tracing::trace!(?id, "unregistered subscriber");
    }

    fn unregister_source(source_id: u64) {
        get_sources().remove(&source_id);
        get_signal_subscribers().remove(&source_id);
    }

    /// Record that a subscriber depends on a source.
    pub fn add_dependency(source_id: u64, subscriber_id: SubscriberId) {
        let mut dependents = get_signal_subscribers().entry(source_id).or_default();
        if !dependents.contains(&subscriber_id) {
            dependents.push(subscriber_id);
        }
    }

    /// Remove the given edges of a subscriber.
    ///
    /// Called before re-running a computation with the sources it read last
    /// time, so stale dependencies do not keep notifying it.
    pub fn remove_dependencies<I>(subscriber_id: SubscriberId, source_ids: I)
    where
        I: IntoIterator<Item = u64>,
    {
        let subscribers = get_signal_subscribers();
        for source_id in source_ids {
            if let Some(mut dependents) = subscribers.get_mut(&source_id) {
                dependents.retain(|s| *s != subscriber_id);
            }
        }
    }

    /// Swap a subscriber's recorded dependencies for the ones its latest
    /// run read.
    ///
    /// Edges to sources in `previous` that are missing from `current` are
    /// removed; edges for `current` were already added while tracking.
    pub fn drop_stale_dependencies(
        subscriber_id: SubscriberId,
        previous: &[(u64, u64)],
        current: &[(u64, u64)],
    ) {
        let stale = previous
            .iter()
            .map(|&(source_id, _)| source_id)
            .filter(|source_id| !current.iter().any(|(id, _)| id == source_id));
        Self::remove_dependencies(subscriber_id, stale);
    }

    /// Number of subscribers that currently depend on a source.
    pub fn dependent_count(source_id: u64) -> usize {
        get_signal_subscribers()
            .get(&source_id)
            .map(|dependents| dependents.len())
            .unwrap_or(0)
    }

    /// Record a read of `source_id` by the current computation, if any.
    pub fn track(source_id: u64, version: u64) {
        if let Some(subscriber_id) = ReactiveContext::current_subscriber() {
            ReactiveContext::track_dependency(source_id, version);
            Self::add_dependency(source_id, subscriber_id);
        }
    }

    /// Bring a source up to date and return its version.
    ///
    /// Returns `None` when the source no longer exists.
    pub fn source_version(source_id: u64) -> Option<u64> {
        let weak = get_sources().get(&source_id).map(|entry| entry.value().clone())?;
        weak.upgrade().map(|source| source.refresh())
    }

    /// Check whether any of the observed `(source, version)` pairs is stale.
    pub fn any_changed(observed: &[(u64, u64)]) -> bool {
        observed.iter().any(|&(source_id, seen)| {
            Self::source_version(source_id).is_some_and(|current| current != seen)
        })
    }

    /// Notify all subscribers that a source changed.
    ///
    /// This is the core update propagation mechanism.
    pub fn notify_signal_change(source_id: u64) {
        let subscriber_ids = match get_signal_subscribers().get(&source_id) {
            Some(dependents) => dependents.value().clone(),
            None => return,
        };

        let mut dead = Vec::new();
        {
            let _guard = PropagationGuard::enter();

            for sub_id in subscriber_ids {
                let weak = get_registry().get(&sub_id).map(|entry| entry.value().clone());
                let Some(reactive) = weak.and_then(|weak| weak.upgrade()) else {
                    dead.push(sub_id);
                    continue;
                };

                reactive.mark_maybe_dirty();

                if reactive.is_eager() {
                    PENDING_EFFECTS.with(|pending| pending.borrow_mut().push(reactive));
                }
            }
        }

        if !dead.is_empty() {
            if let Some(mut dependents) = get_signal_subscribers().get_mut(&source_id) {
                dependents.retain(|s| !dead.contains(s));
            }
        }

        if PROPAGATION_DEPTH.with(Cell::get) == 0 {
            Self::flush_effects();
        }
    }

    /// Run queued effects until the queue stays empty.
    ///
    /// A panicking effect does not stop the others queued by the same write;
    /// the first panic is resumed once the queue is drained.
    fn flush_effects() {
        let mut failure = None;

        loop {
            let batch = PENDING_EFFECTS.with(|pending| std::mem::take(&mut *pending.borrow_mut()));
            if batch.is_empty() {
                break;
            }

            let mut seen = HashSet::with_capacity(batch.len());
            for effect in batch {
                let id = effect.subscriber_id();
                if !seen.insert(id) {
                    continue;
                }

                let result = panic::catch_unwind(AssertUnwindSafe(|| effect.schedule()));
                if let Err(payload) = result {
                    tracing::warn!(?id, "effect panicked");
                    failure.get_or_insert(payload);
                }
            }
        }

        if let Some(payload) = failure {
            panic::resume_unwind(payload);
        }
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if we're inside a tracking context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}
