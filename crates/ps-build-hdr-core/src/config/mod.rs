//! Configuration management for ps-build-hdr.
//!
//! Configuration is read from an optional TOML file. Every field has a
//! default, so a missing file (or a partial one) is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Batch grouping
    pub batch: BatchConfig,

    /// External program names
    pub tools: ToolsConfig,

    /// Exposure metadata backend
    pub metadata: MetadataConfig,

    /// Run log file
    pub log: LogConfig,

    /// Diagnostic logging
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// - macOS: ~/Library/Application Support/com.ps-build-hdr.ps-build-hdr/config.toml
    /// - Linux: ~/.config/ps-build-hdr/config.toml
    ///
    /// Falls back to ~/.ps-build-hdr/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "ps-build-hdr", "ps-build-hdr")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".ps-build-hdr").join("config.toml")
            })
    }

    /// Get the resolved run log path (with ~ expansion).
    pub fn log_path(&self) -> PathBuf {
        let path_str = self.log.path.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }
}
