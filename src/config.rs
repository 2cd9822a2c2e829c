//! Configuration module for Hoard.

use serde::Deserialize;
use std::path::Path;

use crate::tree::FileNamePolicy;
use crate::{HoardError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where uploaded bytes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Sharded directory on the local filesystem.
    #[default]
    Disk,
    /// Process memory; lost on restart together with the tree.
    Memory,
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Base directory for the disk backend.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "data/blobs".to_string()
}

fn default_max_upload_size() -> u64 {
    50
}

impl StorageConfig {
    /// Maximum upload size in bytes. Saturates at `u64::MAX`.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Namespace tree configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeConfig {
    /// Display name of the root folder.
    #[serde(default = "default_root_name")]
    pub root_name: String,
    /// What happens when an upload reuses an existing file name.
    #[serde(default)]
    pub file_name_policy: FileNamePolicy,
    /// Folders created under the root at start-up.
    #[serde(default = "default_seed_folders")]
    pub seed_folders: Vec<String>,
    /// Default number of entries in the recent files view.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_root_name() -> String {
    crate::tree::ROOT_NAME.to_string()
}

fn default_seed_folders() -> Vec<String> {
    vec![
        "Documents".to_string(),
        "Images".to_string(),
        "Videos".to_string(),
    ]
}

fn default_recent_limit() -> usize {
    crate::tree::DEFAULT_RECENT_LIMIT
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_name: default_root_name(),
            file_name_policy: FileNamePolicy::default(),
            seed_folders: default_seed_folders(),
            recent_limit: default_recent_limit(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/hoard.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Namespace tree configuration.
    #[serde(default)]
    pub tree: TreeConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(HoardError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| HoardError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `HOARD_STORAGE_PATH`: blob storage directory
    /// - `HOARD_PORT`: listen port
    /// - `HOARD_LOG_LEVEL`: log level
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env("HOARD_STORAGE_PATH") {
            self.storage.path = path;
        }

        if let Some(port) = non_empty_env("HOARD_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid HOARD_PORT"),
            }
        }

        if let Some(level) = non_empty_env("HOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.max_upload_size_mb == 0 {
            return Err(HoardError::Config(
                "storage.max_upload_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.tree.recent_limit == 0 {
            return Err(HoardError::Config(
                "tree.recent_limit must be greater than 0".to_string(),
            ));
        }
        if self.tree.root_name.trim().is_empty() {
            return Err(HoardError::Config(
                "tree.root_name must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
