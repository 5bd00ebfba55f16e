//! Lenses and writers for `Vec`-valued signals.
//!
//! Lenses are memos and never touch their source; `array_signal_sort` sorts
//! a copy. Callbacks for map, filter and find get each item with its index.

use std::cmp::Ordering;

use crate::reactive::{Memo, Readable, Signal, SignalValue};

/// Append `item` to the end of `signal`'s vector.
pub fn array_signal_push<T>(signal: &Signal<Vec<T>>, item: T)
where
    T: Clone + Send + Sync + 'static,
{
    signal.update(move |items| {
        let mut next = Vec::with_capacity(items.len() + 1);
        next.extend_from_slice(items);
        next.push(item);
        next
    });
}

/// Remove the item at `index`, returning it.
///
/// An index past the end leaves the signal untouched and returns `None`.
pub fn array_signal_remove_at<T>(signal: &Signal<Vec<T>>, index: usize) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    let mut items = signal.get_untracked();
    if index >= items.len() {
        return None;
    }

    let removed = items.remove(index);
    signal.set(items);
    Some(removed)
}

/// Map every item with `f(item, index)`.
pub fn array_signal_map<S, T, R, F>(source: &S, f: F) -> Memo<Vec<R>>
where
    S: Readable<Value = Vec<T>>,
    T: Clone + Send + Sync + 'static,
    R: SignalValue,
    F: Fn(&T, usize) -> R + Send + Sync + 'static,
{
    let source = source.clone();
    Memo::new(move || {
        source.with(|items| {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| f(item, index))
                .collect()
        })
    })
}

/// Keep the items for which `predicate(item, index)` holds.
pub fn array_signal_filter<S, T, P>(source: &S, predicate: P) -> Memo<Vec<T>>
where
    S: Readable<Value = Vec<T>>,
    T: SignalValue,
    P: Fn(&T, usize) -> bool + Send + Sync + 'static,
{
    let source = source.clone();
    Memo::new(move || {
        source.with(|items| {
            items
                .iter()
                .enumerate()
                .filter(|&(index, item)| predicate(item, index))
                .map(|(_, item)| item.clone())
                .collect()
        })
    })
}

/// Sorted copy of the source, in ascending order.
pub fn array_signal_sort<S, T>(source: &S) -> Memo<Vec<T>>
where
    S: Readable<Value = Vec<T>>,
    T: SignalValue + Ord,
{
    array_signal_sort_by(source, Ord::cmp)
}

/// Sorted copy of the source, ordered by `compare`.
///
/// The sort is stable: items that compare equal keep their source order.
pub fn array_signal_sort_by<S, T, C>(source: &S, compare: C) -> Memo<Vec<T>>
where
    S: Readable<Value = Vec<T>>,
    T: SignalValue,
    C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    let source = source.clone();
    Memo::new(move || {
        let mut sorted = source.get();
        sorted.sort_by(|a, b| compare(a, b));
        sorted
    })
}

/// First item for which `predicate(item, index)` holds.
pub fn array_signal_find<S, T, P>(source: &S, predicate: P) -> Memo<Option<T>>
where
    S: Readable<Value = Vec<T>>,
    T: SignalValue,
    P: Fn(&T, usize) -> bool + Send + Sync + 'static,
{
    let source = source.clone();
    Memo::new(move || {
        source.with(|items| {
            items
                .iter()
                .enumerate()
                .find(|&(index, item)| predicate(item, index))
                .map(|(_, item)| item.clone())
        })
    })
}

/// Number of items.
pub fn array_signal_length<S, T>(source: &S) -> Memo<usize>
where
    S: Readable<Value = Vec<T>>,
    T: Clone + Send + Sync + 'static,
{
    let source = source.clone();
    Memo::new(move || source.with(Vec::len))
}

/// Whether the source has no items.
pub fn array_signal_is_empty<S, T>(source: &S) -> Memo<bool>
where
    S: Readable<Value = Vec<T>>,
    T: Clone + Send + Sync + 'static,
{
    let source = source.clone();
    Memo::new(move || source.with(Vec::is_empty))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
