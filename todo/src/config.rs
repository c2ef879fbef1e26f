//! Configuration management for the todo application.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Values that are missing or fail to parse fall back to the default.

use crate::persistence::DEFAULT_STORAGE_KEY;
use crate::types::{MAX_UNFINISHED_TODOS, PERSIST_DEBOUNCE, SUCCESS_MESSAGE_TTL};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "todo=info,tasklist_runtime=info";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoConfig {
    /// Directory holding the durable store (`TODO_DATA_DIR`)
    pub data_dir: PathBuf,
    /// Durable key of the collection (`TODO_STORAGE_KEY`)
    pub storage_key: String,
    /// Debounce window in milliseconds (`TODO_PERSIST_DEBOUNCE_MS`)
    pub persist_debounce_ms: u64,
    /// Success message lifetime in milliseconds (`TODO_MESSAGE_TTL_MS`)
    pub message_ttl_ms: u64,
    /// Capacity bound on unfinished todos (`TODO_MAX_UNFINISHED`)
    pub max_unfinished: usize,
    /// Tracing filter used when `RUST_LOG` is unset (`TODO_LOG`)
    pub log_filter: String,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".todo"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            persist_debounce_ms: duration_ms(PERSIST_DEBOUNCE),
            message_ttl_ms: duration_ms(SUCCESS_MESSAGE_TTL),
            max_unfinished: MAX_UNFINISHED_TODOS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl TodoConfig {
    /// Load configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, one call per variable name
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup("TODO_DATA_DIR")
                .map_or(defaults.data_dir, PathBuf::from),
            storage_key: lookup("TODO_STORAGE_KEY")
                .filter(|key| !key.trim().is_empty())
                .unwrap_or(defaults.storage_key),
            persist_debounce_ms: lookup("TODO_PERSIST_DEBOUNCE_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.persist_debounce_ms),
            message_ttl_ms: lookup("TODO_MESSAGE_TTL_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.message_ttl_ms),
            max_unfinished: lookup("TODO_MAX_UNFINISHED")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_unfinished),
            log_filter: lookup("TODO_LOG").unwrap_or(defaults.log_filter),
        }
    }

    /// Debounce window for durable writes
    #[must_use]
    pub const fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    /// Lifetime of success messages
    #[must_use]
    pub const fn message_ttl(&self) -> Duration {
        Duration::from_millis(self.message_ttl_ms)
    }
}
