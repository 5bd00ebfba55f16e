//! Effect Scheduling
//!
//! Effects that gate when their callback runs:
//!
//! - [`watch_signal`] skips the initial evaluation and reports
//!   `(current, previous)` on every change.
//! - [`watch_until`] fires once for the first matching value, then disposes.
//! - [`throttle_effect`] runs at most once per window.
//! - [`debounce_effect`] runs after a quiet period.
//!
//! Timed variants take a shared [`Timer`]. [`EffectScheduler`] bundles one
//! with a [`SchedulerConfig`] so call sites do not repeat durations.

mod config;
mod timed;
mod timer;
mod watch;

use std::sync::Arc;

pub use config::SchedulerConfig;
pub use timed::{debounce_effect, throttle_effect};
pub use timer::{Instant, ManualTimer, Timer, TimerHandle, TimerTask, TokioTimer};
pub use watch::{watch_signal, watch_until};

use crate::error::Result;
use crate::reactive::{Effect, ReadSignal, Readable, SignalValue};

/// A timer plus default durations for timed effects.
#[derive(Clone)]
pub struct EffectScheduler {
    timer: Arc<dyn Timer>,
    config: SchedulerConfig,
}

impl EffectScheduler {
    /// Create a scheduler on an explicit timer.
    pub fn new(timer: Arc<dyn Timer>, config: SchedulerConfig) -> Self {
        tracing::debug!(
            debounce_ms = config.debounce_ms,
            throttle_ms = config.throttle_ms,
            "effect scheduler created"
        );
        Self { timer, config }
    }

    /// Create a scheduler on the current tokio runtime.
    ///
    /// Fails with [`Error::NoRuntime`](crate::Error::NoRuntime) when called
    /// outside a runtime.
    pub fn tokio(config: SchedulerConfig) -> Result<Self> {
        let timer = TokioTimer::current()?;
        Ok(Self::new(Arc::new(timer), config))
    }

    /// The shared timer.
    pub fn timer(&self) -> &Arc<dyn Timer> {
        &self.timer
    }

    /// The configured durations.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// [`throttle_effect`] with the configured window.
    pub fn throttle<S, F>(&self, source: &S, f: F) -> Effect
    where
        S: Readable,
        F: Fn(&S::Value) + Send + Sync + 'static,
    {
        throttle_effect(source, self.config.throttle_window(), &self.timer, f)
    }

    /// [`debounce_effect`] with the configured quiet period.
    pub fn debounce<S, F>(&self, source: &S, f: F) -> Effect
    where
        S: Readable,
        F: Fn(&S::Value) + Send + Sync + 'static,
    {
        debounce_effect(source, self.config.debounce_delay(), &self.timer, f)
    }

    /// [`debounce_signal`](crate::derive::debounce_signal) with the
    /// configured quiet period.
    pub fn debounce_signal<S>(&self, source: &S) -> ReadSignal<S::Value>
    where
        S: Readable,
        S::Value: SignalValue,
    {
        crate::derive::debounce_signal(source, self.config.debounce_delay(), &self.timer)
    }
}

impl std::fmt::Debug for EffectScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[test]
    fn scheduler_uses_configured_durations() {
        let clock = ManualTimer::new();
        let config = SchedulerConfig::new()
            .with_debounce(Duration::from_millis(30))
            .with_throttle(Duration::from_millis(40));
        let scheduler = EffectScheduler::new(Arc::new(clock.clone()), config);

        let signal = Signal::new(0);
        let debounced = Arc::new(Mutex::new(Vec::new()));
        let throttled = Arc::new(Mutex::new(Vec::new()));
        let (d, t) = (debounced.clone(), throttled.clone());

        let _debounce = scheduler.debounce(&signal, move |v: &i32| d.lock().push(*v));
        let _throttle = scheduler.throttle(&signal, move |v: &i32| t.lock().push(*v));

        clock.advance(Duration::from_millis(10));
        signal.set(1);
        clock.advance(Duration::from_millis(29));
        assert!(debounced.lock().is_empty());
        clock.advance(Duration::from_millis(1));
        assert_eq!(*debounced.lock(), vec![1]);

        signal.set(2);
        assert_eq!(*throttled.lock(), vec![0, 2]);
    }

    #[test]
    fn tokio_scheduler_needs_runtime() {
        let err = EffectScheduler::tokio(SchedulerConfig::default()).unwrap_err();
        assert!(matches!(err, crate::Error::NoRuntime(_)));
    }

    #[tokio::test]
    async fn tokio_scheduler_inside_runtime() {
        let scheduler = EffectScheduler::tokio(SchedulerConfig::default()).unwrap();
        assert_eq!(scheduler.config().debounce_ms, 250);
    }
}
