//! Throttled and debounced effects.
//!
//! Both variants evaluate their source like any other effect; only the user
//! callback is deferred or dropped. The last-run instant and the pending
//! timer live inside the effect's closure, so two effects never share
//! timing state.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::timer::{Instant, Timer, TimerHandle};
use crate::reactive::{untrack, Effect, Readable};

/// Call `f` with the source value at most once per `window`.
///
/// The first evaluation always fires. Evaluations that arrive before
/// `window` has elapsed since the last call are dropped; nothing is replayed
/// when the window closes.
pub fn throttle_effect<S, F>(source: &S, window: Duration, timer: &Arc<dyn Timer>, f: F) -> Effect
where
    S: Readable,
    F: Fn(&S::Value) + Send + Sync + 'static,
{
    let source = source.clone();
    let timer = Arc::clone(timer);
    let last_run: Mutex<Option<Instant>> = Mutex::new(None);

    Effect::new(move || {
        let value = source.get();
        let now = timer.now();

        {
            let mut last_run = last_run.lock();
            let open = match *last_run {
                Some(previous) => now.saturating_duration_since(previous) >= window,
                None => true,
            };
            if !open {
                tracing::trace!(?window, "throttled evaluation dropped");
                return;
            }
            *last_run = Some(now);
        }

        untrack(|| f(&value));
    })
}

/// Call `f` once the source has been quiet for `delay`.
///
/// Every evaluation, the initial one included, cancels the pending timer and
/// starts a new one carrying the value it observed. Disposing the effect
/// cancels whatever is still pending.
pub fn debounce_effect<S, F>(source: &S, delay: Duration, timer: &Arc<dyn Timer>, f: F) -> Effect
where
    S: Readable,
    F: Fn(&S::Value) + Send + Sync + 'static,
{
    let source = source.clone();
    let timer = Arc::clone(timer);
    let callback = Arc::new(f);
    let pending: Arc<Mutex<Option<TimerHandle>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&pending);

    let effect = Effect::new(move || {
        let value = source.get();
        let callback = Arc::clone(&callback);

        let mut slot = slot.lock();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
        *slot = Some(timer.schedule(
            delay,
            Box::new(move || untrack(|| callback(&value))),
        ));
    });

    effect.on_cleanup(move || {
        if let Some(handle) = pending.lock().take() {
            handle.cancel();
        }
    });

    effect
}
