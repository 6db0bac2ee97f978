//! Mediator configuration

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable keys read by [`MediatorConfig::from_env`]
pub mod keys {
    /// Catch panics raised by component callbacks (bool)
    pub const CATCH_PANICS: &str = "PANELBUS_CATCH_PANICS";
    /// Number of recent publishes kept for introspection (usize)
    pub const HISTORY_CAPACITY: &str = "PANELBUS_HISTORY_CAPACITY";
    /// Log a warning when a subscriber has no local handler (bool)
    pub const WARN_ON_UNHANDLED: &str = "PANELBUS_WARN_ON_UNHANDLED";
}

const DEFAULT_HISTORY_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Treat a panicking handler like one returning an error
    pub catch_panics: bool,
    /// Recent publish records kept for the pub/sub status view
    pub history_capacity: usize,
    pub warn_on_unhandled: bool,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            catch_panics: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            warn_on_unhandled: true,
        }
    }
}

impl MediatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_warn_on_unhandled(mut self, warn_on_unhandled: bool) -> Self {
        self.warn_on_unhandled = warn_on_unhandled;
        self
    }

    /// Defaults overridden by `PANELBUS_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(value) = read_env(keys::CATCH_PANICS) {
            config.catch_panics = value;
        }
        if let Some(value) = read_env(keys::HISTORY_CAPACITY) {
            config.history_capacity = value;
        }
        if let Some(value) = read_env(keys::WARN_ON_UNHANDLED) {
            config.warn_on_unhandled = value;
        }
        config
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "[MediatorConfig] Ignoring invalid value");
            None
        }
    }
}
