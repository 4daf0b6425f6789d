//! Configuration file loading and parsing.

use crate::types::FormProducerConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Config file name inside the project directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to write config: {0}")]
    WriteError(#[source] filetalk_common_core::Error),

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error("unknown configuration key: {key}")]
    UnknownKey { key: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: PathBuf,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is valid")
    })
}

impl ConfigLoader {
    /// Create a loader for `<project_dir>/.form-producer/config.yaml`.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            config_path: filetalk_common_fs::path::project_dir(project_dir).join(CONFIG_FILE_NAME),
        }
    }

    /// Create a loader for an explicit config file.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// The config file this loader reads and writes.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration, returning defaults when the file does not exist.
    pub fn load(&self) -> Result<FormProducerConfig, ConfigError> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(FormProducerConfig::default());
        }

        let contents = std::fs::read_to_string(&self.config_path)?;
        if contents.trim().is_empty() {
            return Ok(FormProducerConfig::default());
        }
        let expanded = self.expand_env_vars(&contents)?;

        let config: FormProducerConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        self.validate(&config)?;
        debug!(path = %self.config_path.display(), "loaded config");
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in env_var_pattern().captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Validate configuration values.
    fn validate(&self, config: &FormProducerConfig) -> Result<(), ConfigError> {
        if config.inbox.poll_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "inbox.poll_ms must be greater than 0".to_string(),
            });
        }

        if matches!(&config.channel, Some(c) if c.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                message: "channel must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to file (atomically).
    pub fn save(&self, config: &FormProducerConfig) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        filetalk_common_fs::write_string_atomic(&self.config_path, &yaml)
            .map_err(ConfigError::WriteError)?;
        debug!(path = %self.config_path.display(), "saved config");
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}
