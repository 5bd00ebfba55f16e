//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, memos, and effects.
//! Everything else in the crate is built from these three.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as a memo or effect), the signal automatically
//! registers that context as a dependent. When the signal's value changes, all
//! dependents are notified.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result. It re-evaluates only when
//! one of its dependencies changes, and only when it is read.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its dependencies
//! change. Effects are used to synchronize reactive state with external systems,
//! such as element attributes or timers.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to automatically
//! detect dependencies. When a signal is read, we check if there is an active
//! tracking context and, if so, register the dependency together with the
//! version that was read. Invalidation is pushed eagerly; values are pulled
//! lazily and compared by version.

mod signal;
mod context;
mod subscriber;
mod memo;
mod effect;
mod runtime;
mod readable;

pub use signal::Signal;
pub use context::{untrack, ReactiveContext};
pub use subscriber::{Subscriber, SubscriberId};
pub use memo::{Memo, MemoState};
pub use effect::{Effect, EffectFlow, EffectState};
pub use runtime::{Runtime, Reactive, ReactiveHandle, Source, SourceHandle};
pub use readable::{Readable, ReadSignal, SignalValue};
