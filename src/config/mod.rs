//! Configuration management.
//!
//! Settings live in a TOML file (by default `<config dir>/agentflow/config.toml`).
//! A missing file means defaults; every section and field is optional.

pub mod defaults;
pub mod loader;
pub mod validation;

use crate::chat::transport::HttpTransportConfig;
use crate::graph::FrontmanPolicy;
use crate::layout::{LayoutMode, LayoutSettings, Point};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub layout: LayoutConfig,
    pub chat: ChatConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
}

/// Graph layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub center_x: f64,
    pub center_y: f64,
    pub base_radius: f64,
    pub level_spacing: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub rank_separation: f64,
    pub node_separation: f64,
    pub default_mode: LayoutMode,
    pub frontman_policy: FrontmanPolicy,
}

/// Agent server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub endpoint: String,
    pub max_retries: u32,
    pub timeout_seconds: u64,
    /// Identity sent with every request
    pub user: String,
}

impl From<&LayoutConfig> for LayoutSettings {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            center: Point::new(config.center_x, config.center_y),
            base_radius: config.base_radius,
            level_spacing: config.level_spacing,
            node_width: config.node_width,
            node_height: config.node_height,
            rank_separation: config.rank_separation,
            node_separation: config.node_separation,
            frontman_policy: config.frontman_policy,
        }
    }
}

impl From<&ChatConfig> for HttpTransportConfig {
    fn from(config: &ChatConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),
}

/// Configuration manager
#[derive(Debug)]
pub struct ConfigManager {
    config: Config,
    config_path: PathBuf,
    loader: ConfigLoader,
    validator: ConfigValidator,
}

impl ConfigManager {
    /// Load the configuration at `config_path`, or the default location.
    ///
    /// A missing file yields the defaults; an invalid one is an error.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = config_path.unwrap_or_else(loader::default_config_path);
        let loader = ConfigLoader::new();
        let validator = ConfigValidator::new();

        let config = if config_path.exists() {
            let config = loader.load_from_file(&config_path)?;
            validator.validate(&config)?;
            config
        } else {
            Config::default()
        };

        Ok(Self {
            config,
            config_path,
            loader,
            validator,
        })
    }

    /// Reload from disk
    pub fn load(&mut self) -> Result<(), ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(self.config_path.clone()));
        }
        let config = self.loader.load_from_file(&self.config_path)?;
        self.validator.validate(&config)?;
        self.config = config;
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.loader.save_to_file(&self.config, &self.config_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Update a configuration value; the change is rolled back if it fails validation
    pub fn update<F>(&mut self, updater: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Config),
    {
        let mut candidate = self.config.clone();
        updater(&mut candidate);
        self.validator.validate(&candidate)?;
        self.config = candidate;
        Ok(())
    }

    pub fn reset_to_default(&mut self) {
        self.config = Config::default();
    }

    /// Render the current configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.config)?)
    }
}
