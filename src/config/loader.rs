//! Configuration loading and saving utilities.

use crate::config::{Config, ConfigError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<config dir>/agentflow/config.toml`, falling back to the working directory
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentflow")
        .join("config.toml")
}

/// Configuration loader/saver
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_from_file(&self, path: &Path) -> Result<Config, ConfigError> {
        debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, config: &Config, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(config)?;
        std::fs::write(path, content)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }
}
