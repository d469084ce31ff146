//! Configuration validation utilities.

use crate::config::{ChatConfig, Config, ConfigError, GeneralConfig, LayoutConfig};
use std::collections::HashSet;
use url::Url;

/// Configuration validator
#[derive(Debug)]
pub struct ConfigValidator {
    valid_log_levels: HashSet<String>,
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigValidator {
    pub fn new() -> Self {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"]
            .iter()
            .map(|level| level.to_string())
            .collect();

        Self { valid_log_levels }
    }

    pub fn validate(&self, config: &Config) -> Result<(), ConfigError> {
        self.validate_general(&config.general)?;
        self.validate_layout(&config.layout)?;
        self.validate_chat(&config.chat)?;
        Ok(())
    }

    fn validate_general(&self, general: &GeneralConfig) -> Result<(), ConfigError> {
        self.validate_non_empty(&general.log_level, "log_level")?;
        if !self.valid_log_levels.contains(&general.log_level.to_lowercase()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Valid options are: error, warn, info, debug, trace",
                general.log_level
            )));
        }
        Ok(())
    }

    fn validate_layout(&self, layout: &LayoutConfig) -> Result<(), ConfigError> {
        self.validate_positive(layout.base_radius, "layout.base_radius")?;
        self.validate_positive(layout.level_spacing, "layout.level_spacing")?;
        self.validate_positive(layout.node_width, "layout.node_width")?;
        self.validate_positive(layout.node_height, "layout.node_height")?;
        self.validate_positive(layout.rank_separation, "layout.rank_separation")?;
        self.validate_positive(layout.node_separation, "layout.node_separation")?;

        if !layout.center_x.is_finite() || !layout.center_y.is_finite() {
            return Err(ConfigError::ValidationError(
                "layout center must be a finite point".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_chat(&self, chat: &ChatConfig) -> Result<(), ConfigError> {
        self.validate_non_empty(&chat.endpoint, "chat.endpoint")?;
        let url = Url::parse(&chat.endpoint).map_err(|e| {
            ConfigError::ValidationError(format!("Invalid chat.endpoint '{}': {}", chat.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "chat.endpoint must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if chat.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "chat.max_retries must be at least 1".to_string(),
            ));
        }
        if chat.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "chat.timeout_seconds must be at least 1".to_string(),
            ));
        }
        self.validate_non_empty(&chat.user, "chat.user")?;
        Ok(())
    }

    fn validate_positive(&self, value: f64, field_name: &str) -> Result<(), ConfigError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "{}={} must be a positive number",
                field_name, value
            )));
        }
        Ok(())
    }

    fn validate_non_empty(&self, value: &str, field_name: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field_name
            )));
        }
        Ok(())
    }
}
