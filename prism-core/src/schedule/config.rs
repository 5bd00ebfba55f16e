//! Scheduler configuration.
//!
//! Default durations for timed effects, loadable from JSON:
//!
//! ```json
//! { "debounce_ms": 300, "throttle_ms": 50 }
//! ```
//!
//! Missing fields fall back to their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

const DEFAULT_DEBOUNCE_MS: u64 = 250;
const DEFAULT_THROTTLE_MS: u64 = 100;

/// Default quiet period and throttle window for an [`EffectScheduler`](super::EffectScheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Quiet period before a debounced callback fires, in milliseconds.
    pub debounce_ms: u64,
    /// Minimum spacing between throttled invocations, in milliseconds.
    pub throttle_ms: u64,
}

impl SchedulerConfig {
    /// Create a configuration with the default durations.
    pub fn new() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            throttle_ms: DEFAULT_THROTTLE_MS,
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the debounce quiet period.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce_ms = duration_ms(delay);
        self
    }

    /// Set the throttle window.
    pub fn with_throttle(mut self, window: Duration) -> Self {
        self.throttle_ms = duration_ms(window);
        self
    }

    /// The debounce quiet period.
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The throttle window.
    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
