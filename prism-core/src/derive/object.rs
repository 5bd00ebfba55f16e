//! Lenses and writers for record-valued signals.
//!
//! A record is a keyed collection with a stable iteration order: an
//! [`IndexMap`] (insertion order), a [`BTreeMap`] (key order) or a
//! [`serde_json::Map`]. The [`Record`] trait is the small surface the lenses
//! need from each.

use std::collections::BTreeMap;
use std::hash::Hash;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::reactive::{Memo, Readable, Signal};

/// A keyed collection the object lenses can read and rebuild.
pub trait Record: Clone + Send + Sync + 'static {
    type Key: Clone + Eq + Send + Sync + 'static;
    type Field: Clone + Send + Sync + 'static;
    type Fields<'a>: Iterator<Item = (&'a Self::Key, &'a Self::Field)>
    where
        Self: 'a;

    /// A record with no fields.
    fn empty() -> Self;

    /// The field under `key`, if present.
    fn field(&self, key: &Self::Key) -> Option<&Self::Field>;

    /// Set a field. An existing key keeps its position.
    fn insert_field(&mut self, key: Self::Key, value: Self::Field);

    /// Remove a field, keeping the order of the others.
    fn remove_field(&mut self, key: &Self::Key) -> Option<Self::Field>;

    /// Fields in iteration order.
    fn fields(&self) -> Self::Fields<'_>;
}

impl<K, V> Record for IndexMap<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Key = K;
    type Field = V;
    type Fields<'a> = indexmap::map::Iter<'a, K, V>;

    fn empty() -> Self {
        IndexMap::new()
    }

    fn field(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn insert_field(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn remove_field(&mut self, key: &K) -> Option<V> {
        self.shift_remove(key)
    }

    fn fields(&self) -> Self::Fields<'_> {
        self.iter()
    }
}

impl<K, V> Record for BTreeMap<K, V>
where
    K: Clone + Ord + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Key = K;
    type Field = V;
    type Fields<'a> = std::collections::btree_map::Iter<'a, K, V>;

    fn empty() -> Self {
        BTreeMap::new()
    }

    fn field(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn insert_field(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn remove_field(&mut self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn fields(&self) -> Self::Fields<'_> {
        self.iter()
    }
}

impl Record for Map<String, Value> {
    type Key = String;
    type Field = Value;
    type Fields<'a> = serde_json::map::Iter<'a>;

    fn empty() -> Self {
        Map::new()
    }

    fn field(&self, key: &String) -> Option<&Value> {
        self.get(key)
    }

    fn insert_field(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }

    fn remove_field(&mut self, key: &String) -> Option<Value> {
        self.remove(key)
    }

    fn fields(&self) -> Self::Fields<'_> {
        self.iter()
    }
}

/// Shallow-merge `patch` into `signal`'s record.
///
/// Keys already present keep their position and take the patched value;
/// new keys are added after them.
pub fn patch_signal<R>(signal: &Signal<R>, patch: R)
where
    R: Record,
{
    signal.update(move |current| {
        let mut next = current.clone();
        for (key, value) in patch.fields() {
            next.insert_field(key.clone(), value.clone());
        }
        next
    });
}

/// Record with only the listed keys, in the order they are listed.
///
/// Keys missing from the source are skipped.
pub fn pick_signal<S, R>(source: &S, keys: impl IntoIterator<Item = R::Key>) -> Memo<R>
where
    S: Readable<Value = R>,
    R: Record + PartialEq,
{
    let source = source.clone();
    let keys: Vec<R::Key> = keys.into_iter().collect();

    Memo::new(move || {
        source.with(|record| {
            let mut picked = R::empty();
            for key in &keys {
                if let Some(value) = record.field(key) {
                    picked.insert_field(key.clone(), value.clone());
                }
            }
            picked
        })
    })
}

/// Record without the listed keys, in source order.
pub fn omit_signal<S, R>(source: &S, keys: impl IntoIterator<Item = R::Key>) -> Memo<R>
where
    S: Readable<Value = R>,
    R: Record + PartialEq,
{
    let source = source.clone();
    let keys: Vec<R::Key> = keys.into_iter().collect();

    Memo::new(move || {
        let mut rest = source.get();
        for key in &keys {
            rest.remove_field(key);
        }
        rest
    })
}

/// The value under `key`, or `None` when the key is absent.
pub fn pluck_signal<S, R>(source: &S, key: R::Key) -> Memo<Option<R::Field>>
where
    S: Readable<Value = R>,
    R: Record,
    R::Field: PartialEq,
{
    let source = source.clone();
    Memo::new(move || source.with(|record| record.field(&key).cloned()))
}

/// Keys in iteration order.
pub fn object_signal_keys<S, R>(source: &S) -> Memo<Vec<R::Key>>
where
    S: Readable<Value = R>,
    R: Record,
{
    let source = source.clone();
    Memo::new(move || source.with(|record| record.fields().map(|(key, _)| key.clone()).collect()))
}

/// Values in iteration order.
pub fn object_signal_values<S, R>(source: &S) -> Memo<Vec<R::Field>>
where
    S: Readable<Value = R>,
    R: Record,
    R::Field: PartialEq,
{
    let source = source.clone();
    Memo::new(move || source.with(|record| record.fields().map(|(_, value)| value.clone()).collect()))
}

/// `(key, value)` pairs in iteration order.
pub fn object_signal_entries<S, R>(source: &S) -> Memo<Vec<(R::Key, R::Field)>>
where
    S: Readable<Value = R>,
    R: Record,
    R::Field: PartialEq,
{
    let source = source.clone();
    Memo::new(move || {
        source.with(|record| {
            record
                .fields()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
