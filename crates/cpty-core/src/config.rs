//! Configuration management
//!
//! Handles configuration from environment variables and TOML files with
//! defaults that match the documented extraction heuristics.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction heuristics
    pub extractor: ExtractorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.extractor.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.extractor.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        self.extractor.validate()?;
        Ok(self)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<memory>"),
            message: e.to_string(),
        })
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CPTY_MIN_LINE_LEN") {
            self.extractor.min_line_len = parse_usize("CPTY_MIN_LINE_LEN", value)?;
        }
        if let Some(value) = lookup("CPTY_MIN_ENTITY_LEN") {
            self.extractor.min_entity_len = parse_usize("CPTY_MIN_ENTITY_LEN", value)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(value) = lookup("LOG_JSON") {
            self.logging.json_format = match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "LOG_JSON".to_string(),
                        value,
                    })
                }
            };
        }

        Ok(())
    }
}

fn parse_usize(key: &str, value: String) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Tunable thresholds for the counterparty heuristics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Minimum characters for a line to count as an entity-like line
    pub min_line_len: usize,

    /// Minimum characters for a final counterparty name
    pub min_entity_len: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_line_len: 4,
            min_entity_len: 3,
        }
    }
}

impl ExtractorConfig {
    /// Reject thresholds that would let empty names through
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_line_len == 0 {
            return Err(ConfigError::InvalidValue {
                key: "min_line_len".to_string(),
                value: self.min_line_len.to_string(),
            });
        }
        if self.min_entity_len == 0 {
            return Err(ConfigError::InvalidValue {
                key: "min_entity_len".to_string(),
                value: self.min_entity_len.to_string(),
            });
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
