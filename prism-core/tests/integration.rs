//! Integration Tests for Derivations and Scheduled Effects
//!
//! These tests verify that signals, derived values and gated effects work
//! together correctly through the public API.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indexmap::{indexmap, IndexMap};
use parking_lot::Mutex;

use prism_core::derive::{
    array_signal_filter, array_signal_sort, combine_signals, distinct_signal, map_signal,
    omit_signal, pick_signal,
};
use prism_core::reactive::{Effect, Memo, ReactiveContext, Readable, Runtime, Signal, SubscriberId};
use prism_core::schedule::{
    debounce_effect, throttle_effect, watch_signal, watch_until, EffectScheduler, ManualTimer, SchedulerConfig,
    Timer, TokioTimer,
};

fn manual_timer() -> (ManualTimer, Arc<dyn Timer>) {
    let clock = ManualTimer::new();
    let timer: Arc<dyn Timer> = Arc::new(clock.clone());
    (clock, timer)
}

/// Test that a mapped memo equals `f(source)` right after every write.
#[test]
fn mapped_memo_matches_source_after_each_write() {
    let signal = Signal::new(0i64);
    let squared = map_signal(&signal, |v: &i64| v * v);

    for value in [3, -4, 10, 10, 0] {
        signal.set(value);
        assert_eq!(squared.get(), value * value);
    }
}

/// Test that a combination yields source values in order.
#[test]
fn combine_three_heterogeneous_sources() {
    let a = Signal::new(1);
    let b = Signal::new("hello");
    let c = Signal::new(true);

    let combined = combine_signals((a.clone(), b.clone(), c.clone()));
    assert_eq!(combined.get(), (1, "hello", true));

    a.set(2);
    assert_eq!(combined.get(), (2, "hello", true));
}

/// Test that a distinct view ignores writes of the current value.
#[test]
fn distinct_signal_ignores_repeats() {
    let signal = Signal::with_equality(1, |_: &i32, _: &i32| false);
    let distinct = distinct_signal(&signal);
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let reader = distinct.clone();

    let _effect = Effect::new(move || {
        reader.get();
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // The source accepts the repeated write, the distinct view does not
    signal.set(1);
    assert_eq!(distinct.get(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    signal.set(2);
    assert_eq!(distinct.get(), 2);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Test that a throttled effect fires once per window.
#[test]
fn throttle_fires_once_per_window() {
    let (clock, timer) = manual_timer();
    let signal = Signal::new(0);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();

    let _effect = throttle_effect(&signal, Duration::from_millis(100), &timer, move |v: &i32| {
        sink.lock().push(*v);
    });

    for value in 1..=5 {
        clock.advance(Duration::from_millis(10));
        signal.set(value);
    }
    assert_eq!(*calls.lock(), vec![0]);

    clock.advance(Duration::from_millis(60));
    signal.set(6);
    assert_eq!(*calls.lock(), vec![0, 6]);
}

/// Test that a debounced effect fires once with the last value.
#[test]
fn debounce_fires_once_after_quiet_period() {
    let (clock, timer) = manual_timer();
    let signal = Signal::new(0);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let start = timer.now();

    let _effect = debounce_effect(&signal, Duration::from_millis(50), &timer, move |v: &i32| {
        sink.lock().push(*v);
    });

    signal.set(1);
    clock.advance(Duration::from_millis(5));
    signal.set(2);
    clock.advance(Duration::from_millis(5));
    signal.set(3);
    let last_write = timer.now();

    clock.advance(Duration::from_millis(49));
    assert!(calls.lock().is_empty());

    clock.advance(Duration::from_millis(1));
    assert_eq!(*calls.lock(), vec![3]);
    assert_eq!(timer.now() - last_write, Duration::from_millis(50));
    assert_eq!(last_write - start, Duration::from_millis(10));
}

/// Test that a one-shot watcher fires for the first match only.
#[test]
fn watch_until_fires_once_for_first_match() {
    let signal = Signal::new(3);
    let hits = Arc::new(Mutex::new(Vec::new()));
    let sink = hits.clone();

    let effect = watch_until(&signal, |v: &i32| *v > 5, move |v: &i32| sink.lock().push(*v));

    for value in [4, 7, 9] {
        signal.set(value);
    }

    assert_eq!(*hits.lock(), vec![7]);
    assert!(effect.is_disposed());
}

/// Test array lens laws: filtering is idempotent and sorting copies.
#[test]
fn array_filter_idempotent_and_sort_copies() {
    let list = Signal::new(vec![4, 9, 1, 6, 3]);

    let once = array_signal_filter(&list, |v: &i32, _| v % 2 == 1);
    let twice = array_signal_filter(&once, |v: &i32, _| v % 2 == 1);
    assert_eq!(once.get(), twice.get());

    let sorted = array_signal_sort(&list);
    assert_eq!(sorted.get(), vec![1, 3, 4, 6, 9]);
    assert_eq!(list.get(), vec![4, 9, 1, 6, 3]);

    list.set(vec![7, 2]);
    assert_eq!(twice.get(), vec![7]);
    assert_eq!(sorted.get(), vec![2, 7]);
}

/// Test that pick and omit with the same keys partition the record.
#[test]
fn pick_and_omit_partition_keys() {
    let record: Signal<IndexMap<String, u32>> = Signal::new(indexmap! {
        "a".to_string() => 1,
        "b".to_string() => 2,
        "c".to_string() => 3,
        "d".to_string() => 4,
    });
    let keys = ["b".to_string(), "d".to_string(), "zz".to_string()];

    let picked = pick_signal(&record, keys.clone());
    let rest = omit_signal(&record, keys);

    let picked = picked.get();
    let rest = rest.get();
    assert!(picked.keys().all(|key| !rest.contains_key(key)));

    let mut union: Vec<_> = picked.keys().chain(rest.keys()).cloned().collect();
    union.sort();
    assert_eq!(union, vec!["a", "b", "c", "d"]);
}

/// Test that a change deep in a memo chain that cancels out stops early.
#[test]
fn memo_chain_stops_at_unchanged_value() {
    let signal = Signal::new(1);
    let parity = map_signal(&signal, |v: &i32| v % 2);
    let label = map_signal(&parity, |p: &i32| if *p == 0 { "even" } else { "odd" });
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let reader = label.clone();

    let _effect = Effect::new(move || {
        reader.get();
        counter.fetch_add(1, Ordering::SeqCst);
    });

    signal.set(3);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(label.recompute_count(), 1);

    signal.set(4);
    assert_eq!(label.get(), "even");
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Test that one write reaching an effect through two paths runs it once.
#[test]
fn diamond_runs_effect_once_per_write() {
    let signal = Signal::new(1);
    let left = map_signal(&signal, |v: &i32| v + 1);
    let right = map_signal(&signal, |v: &i32| v * 10);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let (l, r) = (left.clone(), right.clone());

    let _effect = Effect::new(move || {
        sink.lock().push((l.get(), r.get()));
    });

    signal.set(2);
    assert_eq!(*seen.lock(), vec![(2, 10), (3, 20)]);
}

/// Test that nested contexts keep their own dependencies.
#[test]
fn nested_reactive_contexts() {
    let outer_id = SubscriberId::new();
    let inner_id = SubscriberId::new();

    let _outer_ctx = ReactiveContext::enter(outer_id);
    ReactiveContext::track_dependency(1, 0);
    ReactiveContext::track_dependency(2, 0);

    {
        let _inner_ctx = ReactiveContext::enter(inner_id);
        ReactiveContext::track_dependency(3, 5);

        let inner_deps = ReactiveContext::get_dependencies();
        assert_eq!(inner_deps, vec![(3, 5)]);
    }

    let outer_deps = ReactiveContext::get_dependencies();
    assert_eq!(outer_deps, vec![(1, 0), (2, 0)]);
}

/// Test that dropping derived handles releases runtime registrations.
#[test]
fn dropped_memo_releases_dependency() {
    let signal = Signal::new(1);
    let memo: Memo<i32> = map_signal(&signal, |v: &i32| v + 1);

    assert_eq!(memo.get(), 2);
    assert_eq!(Runtime::dependent_count(signal.id()), 1);

    drop(memo);
    signal.set(5);
    assert_eq!(Runtime::dependent_count(signal.id()), 0);
}

/// Test that a watcher whose callback panicked keeps watching.
#[test]
fn watcher_survives_panicking_callback() {
    let signal = Signal::new(0);
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();

    let watcher = watch_signal(&signal, move |current: &i32, previous: &i32| {
        if *current == 1 {
            panic!("callback failed");
        }
        sink.lock().push((*current, *previous));
    });

    let result = panic::catch_unwind(AssertUnwindSafe(|| signal.set(1)));
    assert!(result.is_err());

    signal.set(2);
    assert_eq!(*calls.lock(), vec![(2, 1)]);
    assert!(!watcher.is_disposed());
}

/// Test that one panicking effect does not cost its siblings the write.
#[test]
fn sibling_effect_sees_write_that_panicked_elsewhere() {
    let signal = Signal::new(0);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let failing_source = signal.clone();
    let _failing = Effect::new(move || {
        if failing_source.get() == 1 {
            panic!("effect failed");
        }
    });

    let sink = seen.clone();
    let source = signal.clone();
    let _recorder = Effect::new(move || sink.lock().push(source.get()));

    let result = panic::catch_unwind(AssertUnwindSafe(|| signal.set(1)));
    assert!(result.is_err());
    assert_eq!(*seen.lock(), vec![0, 1]);

    signal.set(2);
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
}

/// Test that an effect reading a memo that panicked wakes on the next write.
#[test]
fn effect_over_failed_memo_recovers() {
    let signal = Signal::new(0);
    let checked = map_signal(&signal, |v: &i32| {
        if *v == 1 {
            panic!("computation failed");
        }
        *v
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let reader = checked.clone();

    let _effect = Effect::new(move || sink.lock().push(reader.get()));

    let result = panic::catch_unwind(AssertUnwindSafe(|| signal.set(1)));
    assert!(result.is_err());

    signal.set(2);
    assert_eq!(*seen.lock(), vec![0, 2]);
    assert_eq!(checked.get(), 2);
}

/// Test a configured scheduler against tokio's paused clock.
#[tokio::test(start_paused = true)]
async fn scheduler_on_paused_tokio_clock() {
    let config = SchedulerConfig::from_json(r#"{ "debounce_ms": 40 }"#).unwrap();
    let scheduler = EffectScheduler::tokio(config).unwrap();
    assert_eq!(scheduler.config().throttle_ms, 100);

    let query = Signal::new(String::new());
    let settled = scheduler.debounce_signal(&query);

    for text in ["p", "pr", "pri"] {
        query.set(text.to_string());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(settled.get_untracked(), "");

    tokio::time::sleep(Duration::from_millis(31)).await;
    assert_eq!(settled.get(), "pri");
}

/// Test that a tokio timer cancels a pending debounce on dispose.
#[tokio::test(start_paused = true)]
async fn disposed_debounce_never_fires_on_tokio() {
    let timer: Arc<dyn Timer> = Arc::new(TokioTimer::current().unwrap());
    let signal = Signal::new(0);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let effect = debounce_effect(&signal, Duration::from_millis(20), &timer, move |_: &i32| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    signal.set(1);
    effect.dispose();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
