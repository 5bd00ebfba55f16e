//! Error types.
//!
//! Reactive evaluation itself never returns errors: callback panics unwind
//! unchanged. Only setup steps are fallible.

/// Errors raised while setting up scheduling.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A tokio-backed timer was requested outside a tokio runtime.
    #[error("no tokio runtime available for timers: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// The scheduler configuration could not be parsed.
    #[error("invalid scheduler configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
