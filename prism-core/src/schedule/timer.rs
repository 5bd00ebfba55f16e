//! Timer facility used by throttled and debounced effects.
//!
//! Effects never sleep: they hand a task to a [`Timer`] and return. Two
//! implementations are provided:
//!
//! - [`TokioTimer`] spawns a sleeping task on a tokio runtime. It reads the
//!   clock through `tokio::time`, so paused test time applies to it.
//! - [`ManualTimer`] keeps a virtual clock that only moves when
//!   [`ManualTimer::advance`] is called. Due tasks run on the calling thread,
//!   in deadline order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
pub use tokio::time::Instant;

use crate::error::Result;

/// A task scheduled on a timer.
pub type TimerTask = Box<dyn FnOnce() + Send>;

/// Schedule-after-delay and cancel-by-handle primitives.
pub trait Timer: Send + Sync + 'static {
    /// Current time on this timer's clock.
    fn now(&self) -> Instant;

    /// Run `task` once `delay` has elapsed.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Handle to a pending timer task.
///
/// Dropping the handle leaves the task scheduled; call
/// [`cancel`](TimerHandle::cancel) to withdraw it. Cancelling a task that
/// already ran is a no-op.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// Create a handle that runs `cancel` when cancelled.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Withdraw the task if it has not run yet.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tokio
// ----------------------------------------------------------------------------

/// Timer backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: tokio::runtime::Handle,
}

impl TokioTimer {
    /// Bind to the runtime the caller is running in.
    pub fn current() -> Result<Self> {
        Ok(Self {
            handle: tokio::runtime::Handle::try_current()?,
        })
    }

    /// Bind to an explicit runtime handle.
    pub fn from_handle(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }
}

impl Timer for TokioTimer {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        tracing::trace!(?delay, "timer scheduled");
        TimerHandle::new(move || join.abort())
    }
}

// ----------------------------------------------------------------------------
// Manual
// ----------------------------------------------------------------------------

/// Timer with a hand-driven virtual clock.
///
/// Clones share the same clock and task queue.
#[derive(Clone)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualState>>,
}

struct ManualState {
    now: Instant,
    next_seq: u64,
    /// Keyed by deadline, then scheduling order.
    tasks: BTreeMap<(Instant, u64), TimerTask>,
}

impl ManualTimer {
    /// Create a timer whose clock starts at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a timer whose clock starts at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                now: start,
                next_seq: 0,
                tasks: BTreeMap::new(),
            })),
        }
    }

    /// Move the clock forward, running every task that falls due.
    ///
    /// Tasks run without the timer's lock held, so they may schedule or
    /// cancel other tasks; newly scheduled tasks that fall due within the
    /// same window run too.
    pub fn advance(&self, by: Duration) {
        let target = self.state.lock().now + by;

        loop {
            let task = {
                let mut state = self.state.lock();
                let due = state
                    .tasks
                    .first_key_value()
                    .map(|(key, _)| *key)
                    .filter(|(deadline, _)| *deadline <= target);
                match due {
                    Some(key) => {
                        state.now = key.0;
                        state.tasks.remove(&key)
                    }
                    None => None,
                }
            };

            match task {
                Some(task) => task(),
                None => break,
            }
        }

        let mut state = self.state.lock();
        if state.now < target {
            state.now = target;
        }
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.state.lock().tasks.len()
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> Instant {
        self.state.lock().now
    }

    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let key = {
            let mut state = self.state.lock();
            let key = (state.now + delay, state.next_seq);
            state.next_seq += 1;
            state.tasks.insert(key, task);
            key
        };

        let state: Weak<Mutex<ManualState>> = Arc::downgrade(&self.state);
        TimerHandle::new(move || {
            if let Some(state) = state.upgrade() {
                state.lock().tasks.remove(&key);
            }
        })
    }
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualTimer")
            .field("now", &state.now)
            .field("pending", &state.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> TimerTask) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |label: &'static str| -> TimerTask {
            let sink = sink.clone();
            Box::new(move || sink.lock().push(label))
        };
        (log, make)
    }

    #[test]
    fn manual_timer_runs_due_tasks_in_deadline_order() {
        let timer = ManualTimer::new();
        let (log, task) = recorder();

        let _late = timer.schedule(Duration::from_millis(30), task("late"));
        let _early = timer.schedule(Duration::from_millis(10), task("early"));
        let _tie = timer.schedule(Duration::from_millis(10), task("tie"));

        timer.advance(Duration::from_millis(20));
        assert_eq!(*log.lock(), vec!["early", "tie"]);
        assert_eq!(timer.pending(), 1);

        timer.advance(Duration::from_millis(10));
        assert_eq!(*log.lock(), vec!["early", "tie", "late"]);
    }

    #[test]
    fn manual_timer_clock_moves_with_advance() {
        let timer = ManualTimer::new();
        let start = timer.now();

        timer.advance(Duration::from_millis(75));
        assert_eq!(timer.now() - start, Duration::from_millis(75));
    }

    #[test]
    fn cancelled_task_never_runs() {
        let timer = ManualTimer::new();
        let (log, task) = recorder();

        let handle = timer.schedule(Duration::from_millis(5), task("cancelled"));
        handle.cancel();

        timer.advance(Duration::from_millis(10));
        assert!(log.lock().is_empty());
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn task_scheduled_by_task_runs_in_same_advance() {
        let timer = ManualTimer::new();
        let (log, task) = recorder();
        let inner_timer = timer.clone();
        let follow_up = task("second");

        let _first = timer.schedule(
            Duration::from_millis(5),
            Box::new(move || {
                let _ = inner_timer.schedule(Duration::from_millis(5), follow_up);
            }),
        );

        timer.advance(Duration::from_millis(10));
        assert_eq!(*log.lock(), vec!["second"]);
    }

    #[test]
    fn tokio_timer_requires_runtime() {
        assert!(TokioTimer::current().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_fires_after_delay() {
        let timer = TokioTimer::current().unwrap();
        let (log, task) = recorder();

        let _handle = timer.schedule(Duration::from_millis(50), task("fired"));

        tokio::time::sleep(Duration::from_millis(49)).await;
        assert!(log.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(*log.lock(), vec!["fired"]);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_timer_cancel_aborts_task() {
        let timer = TokioTimer::current().unwrap();
        let (log, task) = recorder();

        let handle = timer.schedule(Duration::from_millis(50), task("aborted"));
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(log.lock().is_empty());
    }
}
