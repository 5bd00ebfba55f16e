//! Gated effects over a single source: change watching and one-shot waits.

use parking_lot::Mutex;

use crate::reactive::{untrack, Effect, EffectFlow, Readable};

/// What a watcher has seen so far.
enum Observed<T> {
    /// The initial evaluation has not happened yet.
    Nothing,
    /// Value seen at the last evaluation.
    Value(T),
}

/// Call `f(current, previous)` on every change of `source`.
///
/// The initial evaluation only records the value, so `f` first runs on the
/// first real change. `previous` is always the value seen by the evaluation
/// before.
pub fn watch_signal<S, F>(source: &S, f: F) -> Effect
where
    S: Readable,
    F: Fn(&S::Value, &S::Value) + Send + Sync + 'static,
{
    let source = source.clone();
    let observed = Mutex::new(Observed::Nothing);

    Effect::new(move || {
        let value = source.get();
        let previous = std::mem::replace(&mut *observed.lock(), Observed::Value(value.clone()));

        if let Observed::Value(previous) = previous {
            untrack(|| f(&value, &previous));
        }
    })
}

/// Call `f` once, with the first value of `source` that satisfies
/// `predicate`, then dispose.
///
/// The current value counts: if it already matches, `f` runs before this
/// function returns and the returned effect is disposed.
pub fn watch_until<S, P, F>(source: &S, predicate: P, f: F) -> Effect
where
    S: Readable,
    P: Fn(&S::Value) -> bool + Send + Sync + 'static,
    F: Fn(&S::Value) + Send + Sync + 'static,
{
    let source = source.clone();

    Effect::with_flow(move || {
        let value = source.get();
        if !predicate(&value) {
            return EffectFlow::Continue;
        }

        untrack(|| f(&value));
        EffectFlow::Dispose
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Memo, Signal};
    use std::sync::Arc;

    #[test]
    fn watch_signal_skips_initial_value() {
        let signal = Signal::new(1);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();

        let _watch = watch_signal(&signal, move |current: &i32, previous: &i32| {
            sink.lock().push((*current, *previous));
        });
        assert!(calls.lock().is_empty());

        signal.set(2);
        signal.set(5);
        assert_eq!(*calls.lock(), vec![(2, 1), (5, 2)]);
    }

    #[test]
    fn watch_signal_ignores_unchanged_memo() {
        let signal = Signal::new(10);
        let source = signal.clone();
        let tens = Memo::new(move || source.get() / 10);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();

        let _watch = watch_signal(&tens, move |current: &i32, previous: &i32| {
            sink.lock().push((*current, *previous));
        });

        signal.set(15);
        signal.set(21);
        assert_eq!(*calls.lock(), vec![(2, 1)]);
    }

    #[test]
    fn callback_reads_are_not_dependencies() {
        let watched = Signal::new(0);
        let other = Signal::new(0);
        let calls = Arc::new(Mutex::new(0));
        let sink = calls.clone();
        let reader = other.clone();

        let watch = watch_signal(&watched, move |_: &i32, _: &i32| {
            reader.get();
            *sink.lock() += 1;
        });

        watched.set(1);
        other.set(1);
        other.set(2);
        assert_eq!(*calls.lock(), 1);
        assert_eq!(watch.dependency_count(), 1);
    }

    #[test]
    fn watch_until_fires_once() {
        let signal = Signal::new(3);
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = hits.clone();

        let effect = watch_until(&signal, |v: &i32| *v > 5, move |v: &i32| sink.lock().push(*v));

        for value in [4, 7, 9] {
            signal.set(value);
        }

        assert_eq!(*hits.lock(), vec![7]);
        assert!(effect.is_disposed());
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn watch_until_matches_current_value() {
        let signal = Signal::new(8);
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = hits.clone();

        let effect = watch_until(&signal, |v: &i32| *v > 5, move |v: &i32| sink.lock().push(*v));

        assert!(effect.is_disposed());
        signal.set(9);
        assert_eq!(*hits.lock(), vec![8]);
    }

    #[test]
    fn disposed_watcher_stops() {
        let signal = Signal::new(0);
        let calls = Arc::new(Mutex::new(0));
        let sink = calls.clone();

        let watch = watch_signal(&signal, move |_: &i32, _: &i32| *sink.lock() += 1);
        signal.set(1);
        watch.dispose();
        signal.set(2);

        assert_eq!(*calls.lock(), 1);
    }
}
