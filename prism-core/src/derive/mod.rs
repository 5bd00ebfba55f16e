//! Derived Values
//!
//! Read-only projections of signals. Every lens takes any [`Readable`]
//! source and returns either a [`Memo`] (pure projections) or a
//! [`ReadSignal`] (projections that remember what they last emitted).
//!
//! - [`transform`]: whole-value derivations such as map, combine, distinct,
//!   filter and debounce.
//! - [`array`]: lenses over `Vec` values, plus push and remove writers.
//! - [`object`]: lenses over keyed records, plus a shallow patch writer.
//!
//! [`Readable`]: crate::reactive::Readable
//! [`Memo`]: crate::reactive::Memo
//! [`ReadSignal`]: crate::reactive::ReadSignal

pub mod array;
pub mod object;
pub mod transform;

pub use array::{
    array_signal_filter, array_signal_find, array_signal_is_empty, array_signal_length,
    array_signal_map, array_signal_push, array_signal_remove_at, array_signal_sort,
    array_signal_sort_by,
};
pub use object::{
    object_signal_entries, object_signal_keys, object_signal_values, omit_signal, patch_signal,
    pick_signal, pluck_signal, Record,
};
pub use transform::{
    combine_signals, debounce_signal, distinct_signal, distinct_signal_by, filter_signal,
    map_signal, Combine,
};
