//! Configuration management

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::heap::DEFAULT_STACK_TRACE_LIMIT;

/// Default parser stack limit in KiB.
pub const DEFAULT_MAX_STACK_SIZE_KB: usize = 984;

/// Errors raised while loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// YAML document did not match the config schema
    #[error("Invalid YAML config: {0}")]
    Yaml(String),

    /// JSON document did not match the config schema
    #[error("Invalid JSON config: {0}")]
    Json(String),

    /// File extension is neither YAML nor JSON
    #[error("Unsupported config format: '{path}'")]
    UnsupportedFormat {
        /// Path of the rejected file.
        path: String,
    },

    /// A field holds a value the dispatcher cannot use
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Parser stack limit handed to each job, in KiB
    pub max_stack_size_kb: usize,
    /// Frames captured into an error's `stack` property
    pub stack_trace_limit: usize,
    /// Run eligible parses on a worker thread
    pub parse_on_background: bool,
    /// Log level
    pub log_level: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_stack_size_kb: DEFAULT_MAX_STACK_SIZE_KB,
            stack_trace_limit: DEFAULT_STACK_TRACE_LIMIT,
            parse_on_background: true,
            log_level: "info".to_string(),
        }
    }
}

impl DispatcherConfig {
    /// Parses a YAML document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Yaml`] on malformed input, or any validation error.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|err| ConfigError::Yaml(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] on malformed input, or any validation error.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Json(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.yaml`, `.yml` or `.json` file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedFormat`] for other extensions, IO and parse
    /// errors otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&std::fs::read_to_string(path)?),
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Checks field values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a zero stack size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_stack_size_kb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_stack_size_kb",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
