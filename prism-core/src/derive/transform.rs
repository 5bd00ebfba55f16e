//! Derivations over whole values: map, combine, distinct, filter, debounce.
//!
//! `map_signal` and `combine_signals` are plain memos. The other three keep
//! state between evaluations (the last emitted value, or a pending timer), so
//! they are built as an effect that writes an owned signal, handed out as a
//! [`ReadSignal`] that keeps the effect alive.

use std::sync::Arc;
use std::time::Duration;

use crate::reactive::{Effect, Memo, ReadSignal, Readable, Signal, SignalValue};
use crate::schedule::{debounce_effect, Timer};

/// Derive a value from `source` with `f`.
pub fn map_signal<S, R, F>(source: &S, f: F) -> Memo<R>
where
    S: Readable,
    R: SignalValue,
    F: Fn(&S::Value) -> R + Send + Sync + 'static,
{
    let source = source.clone();
    Memo::new(move || source.with(|value| f(value)))
}

/// An ordered group of sources read together.
///
/// Implemented for tuples of up to eight sources of any value types, and for
/// `Vec`s of sources of one type.
pub trait Combine: Send + Sync + 'static {
    /// Current values, in source order.
    type Output: SignalValue;

    /// Read every source, tracking each read.
    fn current(&self) -> Self::Output;
}

macro_rules! impl_combine_for_tuple {
    ($($source:ident $index:tt),+) => {
        impl<$($source),+> Combine for ($($source,)+)
        where
            $($source: Readable, <$source as Readable>::Value: SignalValue,)+
        {
            type Output = ($(<$source as Readable>::Value,)+);

            fn current(&self) -> Self::Output {
                ($(self.$index.get(),)+)
            }
        }
    };
}

impl_combine_for_tuple!(A 0);
impl_combine_for_tuple!(A 0, B 1);
impl_combine_for_tuple!(A 0, B 1, C 2);
impl_combine_for_tuple!(A 0, B 1, C 2, D 3);
impl_combine_for_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_combine_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_combine_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_combine_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

impl<S> Combine for Vec<S>
where
    S: Readable,
    S::Value: SignalValue,
{
    type Output = Vec<S::Value>;

    fn current(&self) -> Self::Output {
        self.iter().map(Readable::get).collect()
    }
}

/// Derive the current values of several sources, in order.
///
/// ```rust,ignore
/// let name = Signal::new("ada".to_string());
/// let age = Signal::new(36);
/// let both = combine_signals((name, age));
/// assert_eq!(both.get(), ("ada".to_string(), 36));
/// ```
pub fn combine_signals<C>(sources: C) -> Memo<C::Output>
where
    C: Combine,
{
    Memo::new(move || sources.current())
}

/// Follow `source`, emitting only values that differ from the last one
/// emitted.
pub fn distinct_signal<S>(source: &S) -> ReadSignal<S::Value>
where
    S: Readable,
    S::Value: PartialEq,
{
    distinct_signal_by(source, |a, b| a == b)
}

/// Like [`distinct_signal`], with `equals` deciding what counts as the same
/// value.
///
/// Each source value is compared with the output's current value, not with
/// the previous source value, so a slow drift that never moves far from the
/// last emission is suppressed entirely. `equals` is called as
/// `equals(new, last_emitted)`.
pub fn distinct_signal_by<S, E>(source: &S, equals: E) -> ReadSignal<S::Value>
where
    S: Readable,
    E: Fn(&S::Value, &S::Value) -> bool + Send + Sync + 'static,
{
    let output = Signal::with_equality(source.get_untracked(), equals);
    let writer = output.clone();
    let source = source.clone();

    let driver = Effect::new(move || writer.set(source.get()));
    ReadSignal::driven(output, driver)
}

/// Follow the values of `source` that satisfy `predicate`, starting from
/// `initial`.
///
/// The current source value is checked right away, so the output starts at
/// the source value if it already matches.
pub fn filter_signal<S, P>(source: &S, predicate: P, initial: S::Value) -> ReadSignal<S::Value>
where
    S: Readable,
    S::Value: PartialEq,
    P: Fn(&S::Value) -> bool + Send + Sync + 'static,
{
    let output = Signal::new(initial);
    let writer = output.clone();
    let source = source.clone();

    let driver = Effect::new(move || {
        let value = source.get();
        if predicate(&value) {
            writer.set(value);
        }
    });
    ReadSignal::driven(output, driver)
}

/// Follow `source` once it has been quiet for `delay`.
///
/// Starts at the source's current value. Every change restarts the quiet
/// period; when it ends, the value seen by the last change is written.
pub fn debounce_signal<S>(source: &S, delay: Duration, timer: &Arc<dyn Timer>) -> ReadSignal<S::Value>
where
    S: Readable,
    S::Value: PartialEq,
{
    let output = Signal::new(source.get_untracked());
    let writer = output.clone();

    let driver = debounce_effect(source, delay, timer, move |value| writer.set(value.clone()));
    ReadSignal::driven(output, driver)
}
