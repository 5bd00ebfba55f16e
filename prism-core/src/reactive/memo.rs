//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Memos Work
//!
//! 1. On first access, the memo runs its computation and caches the result,
//!    remembering the version of every source it read.
//!
//! 2. When accessed again, if no dependencies have changed, returns cached value.
//!
//! 3. When a dependency changes, the memo is marked "maybe dirty" and forwards
//!    that mark to its own dependents. Nothing is recomputed yet.
//!
//! 4. On next access, the memo pulls the current version of each source.
//!
//! 5. If a version moved, recompute. Otherwise, mark clean and return cache.
//!
//! The memo's own version only advances when a recomputation yields a value
//! that differs from the cached one, so dependents downstream of an
//! unchanged memo are not recomputed either.
//!
//! # Failure Modes
//!
//! A panicking computation leaves the previous cache, the recorded source
//! versions and the dirty state in place, so the next read retries.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use super::context::ReactiveContext;
use super::readable::SignalValue;
use super::runtime::{next_source_id, Reactive, ReactiveHandle, Runtime, Source, SourceHandle};
use super::subscriber::SubscriberId;

/// Dirty state for a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency might have changed. Need to check.
    MaybeDirty,

    /// The memo definitely needs to recompute.
    Dirty,
}

/// A cached derived value that recomputes only when dependencies change.
///
/// Cloning a `Memo` creates a new handle to the same cache.
pub struct Memo<T>
where
    T: SignalValue,
{
    inner: Arc<MemoInner<T>>,
}

struct MemoInner<T> {
    /// Source ID, shared ID space with signals.
    id: u64,
    subscriber_id: SubscriberId,
    compute: Box<dyn Fn() -> T + Send + Sync>,
    /// The cached value (None if never computed).
    value: RwLock<Option<T>>,
    state: Mutex<MemoState>,
    version: AtomicU64,
    /// `(source id, version)` pairs read by the last computation.
    dependencies: Mutex<Vec<(u64, u64)>>,
    recompute_count: AtomicU64,
    _subscriber: ReactiveHandle,
    _source: SourceHandle,
}

impl<T> Memo<T>
where
    T: SignalValue,
{
    /// Create a new memo with the given computation function.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let id = next_source_id();
        let subscriber_id = SubscriberId::new();

        let inner = Arc::new_cyclic(|weak: &Weak<MemoInner<T>>| {
            let reactive: Weak<dyn Reactive> = weak.clone();
            let source: Weak<dyn Source> = weak.clone();
            MemoInner {
                id,
                subscriber_id,
                compute: Box::new(compute),
                value: RwLock::new(None),
                state: Mutex::new(MemoState::Dirty),
                version: AtomicU64::new(0),
                dependencies: Mutex::new(Vec::new()),
                recompute_count: AtomicU64::new(0),
                _subscriber: Runtime::register(subscriber_id, reactive),
                _source: Runtime::register_source(id, source),
            }
        });

        Self { inner }
    }

    /// Get the memo's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the subscriber ID for this memo.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// This is the main entry point for reading a memo's value.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Borrow the current value, recomputing if necessary.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let version = self.inner.refresh();
        Runtime::track(self.inner.id, version);
        self.inner.read_cached(f)
    }

    /// Get the current value without registering a dependency.
    ///
    /// The value is still brought up to date first.
    pub fn get_untracked(&self) -> T {
        self.inner.refresh();
        self.inner.read_cached(T::clone)
    }

    /// Mark the memo as potentially needing recomputation.
    pub fn mark_maybe_dirty(&self) {
        self.inner.mark_maybe_dirty();
    }

    /// Mark the memo as definitely needing recomputation.
    pub fn mark_dirty(&self) {
        let was_clean = {
            let mut state = self.inner.state.lock();
            let was_clean = *state == MemoState::Clean;
            *state = MemoState::Dirty;
            was_clean
        };
        if was_clean {
            Runtime::notify_signal_change(self.inner.id);
        }
    }

    /// Get the current dirty state.
    pub fn state(&self) -> MemoState {
        *self.inner.state.lock()
    }

    /// Get the memo's change version.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Number of times the computation has run.
    pub fn recompute_count(&self) -> u64 {
        self.inner.recompute_count.load(Ordering::SeqCst)
    }

    /// Get the number of dependents.
    pub fn dependent_count(&self) -> usize {
        Runtime::dependent_count(self.inner.id)
    }

    /// Get the number of sources read by the last computation.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.lock().len()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }
}

impl<T> MemoInner<T>
where
    T: SignalValue,
{
    fn read_cached<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.value.read();
        f(guard.as_ref().expect("refreshed memo should have a value"))
    }

    /// Bring the cache up to date and return the current version.
    fn refresh(&self) -> u64 {
        let state = *self.state.lock();

        match state {
            MemoState::Clean => {}
            MemoState::MaybeDirty => {
                let observed = self.dependencies.lock().clone();
                if Runtime::any_changed(&observed) {
                    self.recompute();
                } else {
                    *self.state.lock() = MemoState::Clean;
                }
            }
            MemoState::Dirty => self.recompute(),
        }

        self.version.load(Ordering::SeqCst)
    }

    /// Recompute the memo's value.
    ///
    /// This runs the computation function within a reactive context to
    /// track dependencies.
    fn recompute(&self) {
        let _guard = RecomputeGuard { state: &self.state };
        let (new_value, observed) = {
            let _ctx = ReactiveContext::enter(self.subscriber_id);
            let new_value = (self.compute)();
            (new_value, ReactiveContext::take_dependencies())
        };

        let previous = std::mem::replace(&mut *self.dependencies.lock(), observed.clone());
        Runtime::drop_stale_dependencies(self.subscriber_id, &previous, &observed);
        self.recompute_count.fetch_add(1, Ordering::SeqCst);

        {
            let mut cached = self.value.write();
            if cached.as_ref() != Some(&new_value) {
                *cached = Some(new_value);
                self.version.fetch_add(1, Ordering::SeqCst);
            }
        }

        *self.state.lock() = MemoState::Clean;
        tracing::trace!(memo = self.id, version = self.version.load(Ordering::SeqCst), "memo recomputed");
    }

    fn mark_maybe_dirty(&self) {
        let forward = {
            let mut state = self.state.lock();
            match *state {
                MemoState::Clean => {
                    *state = MemoState::MaybeDirty;
                    true
                }
                // Left by a failed recompute; dependents still need waking
                MemoState::Dirty => true,
                MemoState::MaybeDirty => false,
            }
        };

        // Dependents of this memo may be affected too
        if forward {
            Runtime::notify_signal_change(self.id);
        }
    }
}

/// Leaves a memo `Dirty` if its computation unwinds.
struct RecomputeGuard<'a> {
    state: &'a Mutex<MemoState>,
}

impl Drop for RecomputeGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            *self.state.lock() = MemoState::Dirty;
        }
    }
}

impl<T> Reactive for MemoInner<T>
where
    T: SignalValue,
{
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn mark_maybe_dirty(&self) {
        MemoInner::mark_maybe_dirty(self);
    }

    fn schedule(&self) {}

    fn is_eager(&self) -> bool {
        false
    }
}

impl<T> Source for MemoInner<T>
where
    T: SignalValue,
{
    fn source_id(&self) -> u64 {
        self.id
    }

    fn refresh(&self) -> u64 {
        MemoInner::refresh(self)
    }
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        let dependencies = std::mem::take(self.dependencies.get_mut());
        Runtime::remove_dependencies(self.subscriber_id, dependencies.into_iter().map(|(id, _)| id));
    }
}

impl<T> Clone for Memo<T>
where
    T: SignalValue,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: SignalValue + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("value", &*self.inner.value.read())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
