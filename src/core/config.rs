//! Configuration management for the analysis data store
//!
//! Settings are read from an optional TOML file and can be overridden through
//! environment variables.

use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "cas-graph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// JSON codec configuration
    #[serde(default)]
    pub codec: CodecConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Layout of the feature structure section in a payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsLayout {
    /// JSON array of records each carrying its own `%ID`
    #[default]
    Array,
    /// JSON object keyed by record id
    Map,
}

/// JSON codec configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Layout of the `%FEATURE_STRUCTURES` section
    #[serde(default)]
    pub fs_layout: FsLayout,

    /// Pretty-print the payload
    #[serde(default)]
    pub pretty: bool,

    /// Emit the `%TYPES` section with user-defined types
    #[serde(default = "default_include_types")]
    pub include_types: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_include_types() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            fs_layout: FsLayout::Array,
            pretty: false,
            include_types: default_include_types(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from the default file (if present) and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(level) = env::var("CAS_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("CAS_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(pretty) = env::var("CAS_JSON_PRETTY") {
            self.codec.pretty = parse_bool(&pretty)
                .ok_or_else(|| Error::config(format!("Invalid CAS_JSON_PRETTY: {}", pretty)))?;
        }

        if let Ok(include) = env::var("CAS_INCLUDE_TYPES") {
            self.codec.include_types = parse_bool(&include)
                .ok_or_else(|| Error::config(format!("Invalid CAS_INCLUDE_TYPES: {}", include)))?;
        }

        if let Ok(layout) = env::var("CAS_FS_LAYOUT") {
            self.codec.fs_layout = match layout.as_str() {
                "array" => FsLayout::Array,
                "map" => FsLayout::Map,
                _ => {
                    return Err(Error::config(format!(
                        "Invalid feature structure layout: {}. Valid options: array, map",
                        layout
                    )))
                }
            };
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => return Err(Error::config("Invalid log format")),
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
