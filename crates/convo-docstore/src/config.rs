//! Configuration for convo-docstore.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default upper bound on `from + size` for a single search.
pub const DEFAULT_MAX_RESULT_WINDOW: usize = 10_000;

/// Configuration for the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to store data on disk. If None, data is kept in memory only.
    pub data_path: Option<PathBuf>,

    /// Make every write visible to search immediately, as if `refresh`
    /// had been called after it.
    pub refresh_on_write: bool,

    /// Maximum `from + size` accepted by a search.
    pub max_result_window: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: None,
            refresh_on_write: false,
            max_result_window: DEFAULT_MAX_RESULT_WINDOW,
        }
    }
}

impl Config {
    /// Create an in-memory configuration.
    ///
    /// Data will not be persisted and will be lost when the process exits.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Create a persistent configuration.
    ///
    /// Data will be stored at the specified path and loaded on startup.
    pub fn persistent<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            data_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Enable or disable refresh after every write.
    pub fn with_refresh_on_write(mut self, enabled: bool) -> Self {
        self.refresh_on_write = enabled;
        self
    }

    /// Set the maximum search window.
    pub fn with_max_result_window(mut self, window: usize) -> Self {
        self.max_result_window = window;
        self
    }

    /// Whether this configuration persists to disk.
    pub fn is_persistent(&self) -> bool {
        self.data_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config() {
        let config = Config::memory();
        assert!(!config.is_persistent());
        assert!(!config.refresh_on_write);
        assert_eq!(config.max_result_window, DEFAULT_MAX_RESULT_WINDOW);
    }

    #[test]
    fn test_persistent_config() {
        let config = Config::persistent("/tmp/convo")
            .with_refresh_on_write(true)
            .with_max_result_window(500);

        assert_eq!(config.data_path, Some(PathBuf::from("/tmp/convo")));
        assert!(config.refresh_on_write);
        assert_eq!(config.max_result_window, 500);
    }
}
