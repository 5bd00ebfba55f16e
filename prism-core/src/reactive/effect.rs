//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency is invalidated, the runtime queues the effect. Once
//!    the write that caused it has finished propagating, the effect pulls its
//!    sources and re-runs only if one of them really changed.
//!
//! 3. Before re-running, the effect clears its old dependencies and tracks
//!    new ones during execution.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──run──> Running ──> Idle ──change──> Running ──> ...
//!                     │                            │
//!                     └──── dispose / one-shot ────┴──> Disposed
//! ```
//!
//! A change that arrives while the effect is running (for example because
//! the effect wrote one of its own sources) is remembered and handled by one
//! more run right after the current one.
//!
//! # Cleanup
//!
//! Cleanup hooks registered with [`Effect::on_cleanup`] run once, when the
//! effect is disposed. Dropping the last handle disposes the effect.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use super::subscriber::SubscriberId;

/// Counter for generating unique effect IDs.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// What an effect run asks for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectFlow {
    /// Keep reacting to changes.
    Continue,
    /// Dispose the effect now.
    Dispose,
}

/// Lifecycle state of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// Never run.
    Created,
    /// Currently executing. `rerun` records a change that arrived meanwhile.
    Running { rerun: bool },
    /// Waiting for a dependency change.
    Idle,
    /// Permanently stopped.
    Disposed,
}

type Cleanup = Box<dyn FnOnce() + Send>;

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let effect = Effect::new(move || {
///     println!("Count is: {}", count.get());
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// ```
#[must_use = "dropping the last handle disposes the effect"]
pub struct Effect {
    inner: Arc<EffectInner>,
}

struct EffectInner {
    id: u64,
    subscriber_id: SubscriberId,
    run: Box<dyn Fn() -> EffectFlow + Send + Sync>,
    state: Mutex<EffectState>,
    /// `(source id, version)` pairs read by the last run.
    dependencies: Mutex<Vec<(u64, u64)>>,
    run_count: AtomicUsize,
    cleanups: Mutex<Vec<Cleanup>>,
    _registration: ReactiveHandle,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_flow(move || {
            run();
            EffectFlow::Continue
        })
    }

    /// Create an effect whose function decides after each run whether the
    /// effect stays alive.
    ///
    /// The function runs immediately; if that first run returns
    /// [`EffectFlow::Dispose`] the returned effect is already disposed.
    pub fn with_flow<F>(run: F) -> Self
    where
        F: Fn() -> EffectFlow + Send + Sync + 'static,
    {
        let effect = Self::build(Box::new(run));
        effect.execute();
        effect
    }

    /// Create a new effect without running it immediately.
    ///
    /// It has no dependencies until [`execute`](Effect::execute) is called.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::build(Box::new(move || {
            run();
            EffectFlow::Continue
        }))
    }

    fn build(run: Box<dyn Fn() -> EffectFlow + Send + Sync>) -> Self {
        let subscriber_id = SubscriberId::new();
        let inner = Arc::new_cyclic(|weak: &Weak<EffectInner>| {
            let reactive: Weak<dyn Reactive> = weak.clone();
            EffectInner {
                id: next_effect_id(),
                subscriber_id,
                run,
                state: Mutex::new(EffectState::Created),
                dependencies: Mutex::new(Vec::new()),
                run_count: AtomicUsize::new(0),
                cleanups: Mutex::new(Vec::new()),
                _registration: Runtime::register(subscriber_id, reactive),
            }
        });

        Self { inner }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the subscriber ID for this effect.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Execute the effect function unconditionally (unless disposed).
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Re-run the effect if one of its dependencies changed.
    pub fn schedule(&self) {
        self.inner.schedule();
    }

    /// Dispose of the effect.
    ///
    /// After disposal, the effect will not run again and its cleanup hooks
    /// have run.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Register a hook that runs when the effect is disposed.
    ///
    /// If the effect is already disposed the hook runs immediately.
    pub fn on_cleanup<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_disposed() {
            cleanup();
            return;
        }
        self.inner.cleanups.lock().push(Box::new(cleanup));
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state() == EffectState::Disposed
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> EffectState {
        *self.inner.state.lock()
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of dependencies.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.lock().len()
    }
}

/// Returns a running effect to `Idle` if its function unwinds.
///
/// The dependencies recorded by the last completed run are left in place.
struct RunGuard<'a> {
    state: &'a Mutex<EffectState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = self.state.lock();
            if matches!(*state, EffectState::Running { .. }) {
                *state = EffectState::Idle;
            }
        }
    }
}

impl EffectInner {
    fn execute(&self) {
        {
            let mut state = self.state.lock();
            match *state {
                EffectState::Disposed => return,
                EffectState::Running { .. } => {
                    *state = EffectState::Running { rerun: true };
                    return;
                }
                EffectState::Created | EffectState::Idle => {
                    *state = EffectState::Running { rerun: false };
                }
            }
        }

        let _guard = RunGuard { state: &self.state };

        loop {
            let flow = self.run_once();

            let mut state = self.state.lock();
            match (*state, flow) {
                (EffectState::Disposed, _) => {
                    drop(state);
                    self.release_dependencies();
                    return;
                }
                (_, EffectFlow::Dispose) => {
                    drop(state);
                    self.dispose();
                    return;
                }
                (EffectState::Running { rerun: true }, _) => {
                    *state = EffectState::Running { rerun: false };
                }
                _ => {
                    *state = EffectState::Idle;
                    return;
                }
            }
        }
    }

    fn run_once(&self) -> EffectFlow {
        let (flow, observed) = {
            let _ctx = ReactiveContext::enter(self.subscriber_id);
            let flow = (self.run)();
            (flow, ReactiveContext::take_dependencies())
        };

        // Recorded versions only move once a run completes
        let previous = std::mem::replace(&mut *self.dependencies.lock(), observed.clone());
        Runtime::drop_stale_dependencies(self.subscriber_id, &previous, &observed);

        let runs = self.run_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(effect = self.id, runs, "effect ran");
        flow
    }

    fn schedule(&self) {
        {
            let mut state = self.state.lock();
            match *state {
                EffectState::Disposed => return,
                EffectState::Running { .. } => {
                    *state = EffectState::Running { rerun: true };
                    return;
                }
                EffectState::Created | EffectState::Idle => {}
            }
        }

        let observed = self.dependencies.lock().clone();
        if Runtime::any_changed(&observed) {
            self.execute();
        }
    }

    fn dispose(&self) {
        {
            let mut state = self.state.lock();
            if *state == EffectState::Disposed {
                return;
            }
            *state = EffectState::Disposed;
        }

        self.release_dependencies();
        self.run_cleanups();
        tracing::debug!(effect = self.id, "effect disposed");
    }

    fn release_dependencies(&self) {
        let previous = std::mem::take(&mut *self.dependencies.lock());
        Runtime::remove_dependencies(self.subscriber_id, previous.into_iter().map(|(id, _)| id));
    }

    fn run_cleanups(&self) {
        let cleanups = std::mem::take(&mut *self.cleanups.lock());
        for cleanup in cleanups {
            cleanup();
        }
    }
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn mark_maybe_dirty(&self) {}

    fn schedule(&self) {
        EffectInner::schedule(self);
    }

    fn is_eager(&self) -> bool {
        true
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
