//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal or memo is read,
//! the current computation is registered as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing computation.
//! When entering a reactive context (e.g., running a memo or effect), we push
//! the subscriber onto the stack. When the computation completes, we pop it.
//!
//! An untracked frame can be pushed on top of a tracked one. Reads made while
//! it is on top are not recorded anywhere; this is how user callbacks run
//! inside effects without becoming dependencies of those effects.

use std::cell::RefCell;
use super::SubscriberId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = RefCell::new(Vec::new());
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone)]
struct ContextEntry {
    /// The computation being tracked, `None` for an untracked frame.
    subscriber_id: Option<SubscriberId>,
    /// `(source id, version)` pairs read during this computation, in first-read
    /// order. A source read twice keeps the version of its first read.
    dependencies: Vec<(u64, u64)>,
}

/// Guard that pops the context when dropped.
///
/// This keeps the stack balanced even if the computation panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// While this context is active, any source that is read will register
    /// the subscriber as a dependent.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        Self::push(Some(subscriber_id))
    }

    /// Enter an untracked frame. Reads made until the guard drops are not
    /// recorded.
    pub fn untracked() -> Self {
        Self::push(None)
    }

    fn push(subscriber_id: Option<SubscriberId>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber_id,
                dependencies: Vec::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| {
            stack.borrow().last().and_then(|entry| entry.subscriber_id)
        })
    }

    /// Record a read of `source_id` at `version` in the current context.
    pub fn track_dependency(source_id: u64, version: u64) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if entry.subscriber_id.is_none() {
                    return;
                }
                if !entry.dependencies.iter().any(|(id, _)| *id == source_id) {
                    entry.dependencies.push((source_id, version));
                }
            }
        });
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> Vec<(u64, u64)> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.clone())
                .unwrap_or_default()
        })
    }

    /// Move the dependencies collected in the current context out of it.
    pub fn take_dependencies() -> Vec<(u64, u64)> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow_mut()
                .last_mut()
                .map(|entry| std::mem::take(&mut entry.dependencies))
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}

/// Run `f` without tracking any reads it makes.
///
/// ```rust,ignore
/// let effect = Effect::new(move || {
///     let value = source.get();               // tracked
///     untrack(|| log_with_config(config.get(), value)); // not tracked
/// });
/// ```
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}
