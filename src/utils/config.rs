//! TOML-based configuration for convo-memory
//!
//! Loaded from `convo-memory.toml`. Every section and field has a default,
//! so an empty file (or no file at all) gives an in-memory store with access
//! control on. A few settings can be overridden from the environment:
//!
//! | variable | overrides |
//! |----------|-----------|
//! | `CONVO_STORE_PATH` | `store.path` (and switches the provider to `embedded`) |
//! | `CONVO_ACCESS_CONTROL` | `memory.access_control` |
//! | `CONVO_LOG_LEVEL` | `logging.level` |
//!
//! Use `ConfigManager` for shared, lock-free access to the current config.

use crate::db::DocumentStoreProvider;
use crate::memory::schema::{DEFAULT_DRAIN_PAGE_SIZE, DEFAULT_MAX_RESULTS};
use crate::types::MemoryError;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "convo-memory.toml";

pub const ENV_STORE_PATH: &str = "CONVO_STORE_PATH";
pub const ENV_ACCESS_CONTROL: &str = "CONVO_ACCESS_CONTROL";
pub const ENV_LOG_LEVEL: &str = "CONVO_LOG_LEVEL";

/// Root configuration structure loaded from convo-memory.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub memory: MemorySettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= Store Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Embedded store persisted under `path`
    Embedded,
    /// Embedded store kept in memory
    #[default]
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub provider: StoreKind,

    /// Data directory, required for the embedded provider
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Make every write searchable immediately
    #[serde(default)]
    pub refresh_on_write: bool,

    #[serde(default = "default_max_result_window")]
    pub max_result_window: usize,
}

fn default_max_result_window() -> usize {
    convo_docstore::config::DEFAULT_MAX_RESULT_WINDOW
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StoreKind::default(),
            path: None,
            refresh_on_write: false,
            max_result_window: default_max_result_window(),
        }
    }
}

// ============= Memory Configuration =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Honour the requester identity for ownership checks
    #[serde(default = "default_true")]
    pub access_control: bool,

    /// Page size of the cascading delete drain
    #[serde(default = "default_drain_page_size")]
    pub drain_page_size: usize,

    /// Page size when a caller does not give one
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
}

fn default_true() -> bool {
    true
}

fn default_drain_page_size() -> usize {
    DEFAULT_DRAIN_PAGE_SIZE
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            access_control: true,
            drain_page_size: default_drain_page_size(),
            default_max_results: default_max_results(),
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{name}' has invalid value '{value}'")]
    InvalidEnvVar { name: String, value: String },
}

impl From<ConfigError> for MemoryError {
    fn from(e: ConfigError) -> Self {
        MemoryError::Configuration(e.to_string())
    }
}

impl MemoryConfig {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate the result.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config: MemoryConfig = toml::from_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            return Self::load(path);
        }

        let mut config = MemoryConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string without touching the environment.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MemoryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CONVO_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_STORE_PATH).filter(|p| !p.is_empty()) {
            self.store.provider = StoreKind::Embedded;
            self.store.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup(ENV_ACCESS_CONTROL) {
            self.memory.access_control = parse_bool(&value).ok_or(ConfigError::InvalidEnvVar {
                name: ENV_ACCESS_CONTROL.to_string(),
                value,
            })?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|l| !l.is_empty()) {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory.drain_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "memory.drain_page_size must be greater than zero".into(),
            ));
        }
        if self.memory.default_max_results == 0 {
            return Err(ConfigError::ValidationError(
                "memory.default_max_results must be greater than zero".into(),
            ));
        }
        if self.store.max_result_window == 0 {
            return Err(ConfigError::ValidationError(
                "store.max_result_window must be greater than zero".into(),
            ));
        }
        if self.memory.drain_page_size > self.store.max_result_window {
            return Err(ConfigError::ValidationError(
                "memory.drain_page_size must not exceed store.max_result_window".into(),
            ));
        }
        if self.store.provider == StoreKind::Embedded && self.store.path.is_none() {
            return Err(ConfigError::ValidationError(
                "store.path is required for the embedded provider".into(),
            ));
        }
        Ok(())
    }

    /// The document store described by the `[store]` section.
    pub fn store_provider(&self) -> DocumentStoreProvider {
        match (self.store.provider, &self.store.path) {
            (StoreKind::Embedded, Some(path)) => DocumentStoreProvider::Embedded {
                path: path.clone(),
                refresh_on_write: self.store.refresh_on_write,
                max_result_window: self.store.max_result_window,
            },
            _ => DocumentStoreProvider::Memory {
                refresh_on_write: self.store.refresh_on_write,
                max_result_window: self.store.max_result_window,
            },
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============= Configuration Manager =============

/// Thread-safe holder of the current configuration
pub struct ConfigManager {
    config: Arc<ArcSwap<MemoryConfig>>,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load the config at `path` (defaults if the file is absent).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let config = MemoryConfig::load_or_default(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: Some(path),
        })
    }

    /// Create a manager directly from a config. `reload` is a no-op.
    pub fn from_config(config: MemoryConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: None,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<MemoryConfig> {
        self.config.load_full()
    }

    /// Reload the configuration from disk. On error the current config stays.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let Some(ref path) = self.config_path else {
            return Ok(());
        };
        info!("Reloading configuration from {:?}", path);

        let new_config = MemoryConfig::load_or_default(path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }
}
