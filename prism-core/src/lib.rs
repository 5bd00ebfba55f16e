//! Prism Core
//!
//! This crate provides the reactive toolkit behind Prism. It implements:
//!
//! - Reactive primitives (signals, memos, effects) with automatic dependency
//!   tracking
//! - Derived values over signals: map, combine, distinct, filter, debounce
//! - Lenses over `Vec` and record values
//! - Gated effects: watch, watch-until, throttle, debounce
//! - Class-list merging and attribute binding
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `derive`: Read-only projections built on memos
//! - `schedule`: Effects that gate their callbacks, plus the timers they use
//! - `attr`: Class merging and attribute binding through a sink trait
//!
//! Invalidation is pushed eagerly when a signal changes; values are pulled
//! lazily when read. A memo whose recomputation yields an equal value does
//! not disturb anything downstream.
//!
//! # Example
//!
//! ```rust,ignore
//! use prism_core::reactive::{Effect, Signal};
//! use prism_core::derive::map_signal;
//!
//! // Create a signal
//! let count = Signal::new(0);
//!
//! // Create a derived value
//! let doubled = map_signal(&count, |n| n * 2);
//!
//! // Create an effect
//! let reader = doubled.clone();
//! let _effect = Effect::new(move || {
//!     println!("Doubled: {}", reader.get());
//! });
//!
//! // Update the signal
//! count.set(5);
//! // Effect automatically runs, prints: "Doubled: 10"
//! ```

pub mod attr;
pub mod derive;
pub mod reactive;
pub mod schedule;

mod error;

pub use error::{Error, Result};

pub use attr::{bind_attribute, bind_classes, class_names, AttributeSink, ClassValue};
pub use reactive::{untrack, Effect, Memo, ReadSignal, Readable, Signal};
pub use schedule::{
    debounce_effect, throttle_effect, watch_signal, watch_until, EffectScheduler, SchedulerConfig,
};
