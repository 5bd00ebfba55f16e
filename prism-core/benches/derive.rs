//! Benchmark: derived value read-after-write and fan-in

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prism_core::derive::{array_signal_filter, combine_signals, map_signal};
use prism_core::reactive::{Effect, Memo, Signal};

fn benchmark_memo_read_after_write(c: &mut Criterion) {
    let signal = Signal::new(0u64);
    let doubled = map_signal(&signal, |v: &u64| v * 2);
    let mut next = 0u64;

    c.bench_function("memo_read_after_write", |b| {
        b.iter(|| {
            next += 1;
            signal.set(next);
            black_box(doubled.get())
        });
    });
}

fn benchmark_memo_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("memo_chain");

    for depth in [1usize, 8, 32] {
        let signal = Signal::new(0u64);
        let mut tail: Memo<u64> = map_signal(&signal, |v: &u64| v + 1);
        for _ in 1..depth {
            tail = map_signal(&tail, |v: &u64| v + 1);
        }
        let mut next = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                next += 1;
                signal.set(next);
                black_box(tail.get())
            });
        });
    }

    group.finish();
}

fn benchmark_combine_fan_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine_fan_in");

    for width in [4usize, 64] {
        let signals: Vec<Signal<u64>> = (0..width as u64).map(Signal::new).collect();
        let combined = combine_signals(signals.clone());
        let reader = combined.clone();
        // Keeps the combination eagerly pulled on every write
        let _effect = Effect::new(move || {
            black_box(reader.get());
        });
        let mut next = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                next += 1;
                signals[(next as usize) % width].set(next);
            });
        });
    }

    group.finish();
}

fn benchmark_array_filter(c: &mut Criterion) {
    let list = Signal::new((0..1_000u32).collect::<Vec<_>>());
    let evens = array_signal_filter(&list, |v: &u32, _| v % 2 == 0);

    c.bench_function("array_filter_1000", |b| {
        b.iter(|| {
            list.update(|items| items.iter().map(|v| v + 1).collect());
            black_box(evens.get().len())
        });
    });
}

criterion_group!(
    benches,
    benchmark_memo_read_after_write,
    benchmark_memo_chain,
    benchmark_combine_fan_in,
    benchmark_array_filter
);
criterion_main!(benches);
