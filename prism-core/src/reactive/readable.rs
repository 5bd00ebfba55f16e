//! Read access shared by every reactive value.
//!
//! Derivations and effects in this crate accept any [`Readable`] source, so a
//! lens can sit on top of a [`Signal`], a [`Memo`](super::Memo) or another
//! lens's output without caring which.

use std::fmt::Debug;

use super::effect::Effect;
use super::memo::Memo;
use super::signal::Signal;

/// Values that can live in a memoized derivation.
///
/// Memos need `PartialEq` to tell whether a recomputation produced a new
/// value.
pub trait SignalValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T> SignalValue for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// A reactive value that can be read and observed.
///
/// Tracked reads ([`get`](Readable::get), [`with`](Readable::with)) made
/// inside a memo or effect register that computation as a dependent.
pub trait Readable: Clone + Send + Sync + 'static {
    /// The type of value produced.
    type Value: Clone + Send + Sync + 'static;

    /// Borrow the current value, tracking the read.
    fn with<R>(&self, f: impl FnOnce(&Self::Value) -> R) -> R;

    /// Get the current value without tracking the read.
    fn get_untracked(&self) -> Self::Value;

    /// Get the current value, tracking the read.
    fn get(&self) -> Self::Value {
        self.with(|value| value.clone())
    }
}

impl<T> Readable for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Value = T;

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Signal::with(self, f)
    }

    fn get_untracked(&self) -> T {
        Signal::get_untracked(self)
    }
}

impl<T> Readable for Memo<T>
where
    T: SignalValue,
{
    type Value = T;

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Memo::with(self, f)
    }

    fn get_untracked(&self) -> T {
        Memo::get_untracked(self)
    }
}

/// A read-only view of a signal.
///
/// Views produced by derivations such as `filter_signal` also own the effect
/// that writes the underlying signal; the effect lives as long as any clone
/// of the view does.
pub struct ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    signal: Signal<T>,
    driver: Option<Effect>,
}

impl<T> ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(signal: Signal<T>) -> Self {
        Self { signal, driver: None }
    }

    /// Wrap `signal`, keeping `driver` alive alongside it.
    pub(crate) fn driven(signal: Signal<T>, driver: Effect) -> Self {
        Self {
            signal,
            driver: Some(driver),
        }
    }

    /// Get the underlying signal's unique ID.
    pub fn id(&self) -> u64 {
        self.signal.id()
    }

    /// Get the underlying signal's change version.
    pub fn version(&self) -> u64 {
        self.signal.version()
    }

    /// Get the effect feeding this view, if any.
    pub fn driver(&self) -> Option<&Effect> {
        self.driver.as_ref()
    }
}

impl<T> Readable for ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Value = T;

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    fn get_untracked(&self) -> T {
        self.signal.get_untracked()
    }
}

impl<T> Clone for ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            driver: self.driver.clone(),
        }
    }
}

impl<T> Debug for ReadSignal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSignal")
            .field("signal", &self.signal)
            .field("driven", &self.driver.is_some())
            .finish()
    }
}
