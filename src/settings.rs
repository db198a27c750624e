//! External settings collaborator.
//!
//! The lifecycle reads a single value at construction: the default request
//! timeout in milliseconds under the key `xhr.timeout`. The accessor is a
//! trait so the surrounding application can plug in whatever configuration
//! store it already has.

use std::collections::HashMap;

/// Key for the default request timeout in milliseconds.
pub const TIMEOUT_KEY: &str = "xhr.timeout";

/// Default request timeout when the settings provider has no value.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Read-only settings accessor.
pub trait Settings: Send + Sync {
    /// Look up a raw setting value.
    fn get(&self, key: &str) -> Option<String>;

    /// Look up a numeric value, falling back to `default` when the key is
    /// absent or not parseable as an integer.
    fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(default)
    }
}

/// Map-backed settings, mostly useful for tests and small embedders.
#[derive(Debug, Default, Clone)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    /// An empty settings store. Every lookup falls back to defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl Settings for StaticSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
