//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::loader::ConfigError;

/// Dotted key names understood by the configuration store.
pub mod keys {
    /// Default output channel.
    pub const CHANNEL: &str = "channel";
    /// OUTBOX directory.
    pub const OUTBOX: &str = "path.outbox";
    /// INBOX directory.
    pub const INBOX: &str = "path.inbox";
    /// INBOX polling interval in milliseconds.
    pub const INBOX_POLL_MS: &str = "inbox.poll_ms";

    /// Every known key, in display order.
    pub const ALL: [&str; 4] = [CHANNEL, OUTBOX, INBOX, INBOX_POLL_MS];

    /// Whether `key` is a known key.
    pub fn is_known(key: &str) -> bool {
        ALL.contains(&key)
    }
}

/// Root configuration, stored in `.form-producer/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormProducerConfig {
    /// Default output channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Shared directory locations.
    pub paths: PathsConfig,
    /// Inbox watcher settings.
    pub inbox: InboxConfig,
}

/// Shared directory locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where emitted messages are written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbox: Option<PathBuf>,
    /// Where incoming messages are read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbox: Option<PathBuf>,
}

/// Inbox watcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxConfig {
    /// Polling interval (ms).
    pub poll_ms: u64,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self { poll_ms: 1000 }
    }
}

impl FormProducerConfig {
    /// Read a value by dotted key.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            keys::CHANNEL => self.channel.clone(),
            keys::OUTBOX => self.paths.outbox.as_ref().map(|p| p.display().to_string()),
            keys::INBOX => self.paths.inbox.as_ref().map(|p| p.display().to_string()),
            keys::INBOX_POLL_MS => Some(self.inbox.poll_ms.to_string()),
            _ => return Err(ConfigError::UnknownKey { key: key.to_string() }),
        };
        Ok(value)
    }

    /// Write a value by dotted key. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());
        match key {
            keys::CHANNEL => self.channel = optional(value),
            keys::OUTBOX => self.paths.outbox = optional(value).map(PathBuf::from),
            keys::INBOX => self.paths.inbox = optional(value).map(PathBuf::from),
            keys::INBOX_POLL_MS => {
                let poll_ms: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected a positive integer, got '{value}'"),
                })?;
                if poll_ms == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: "must be greater than 0".to_string(),
                    });
                }
                self.inbox.poll_ms = poll_ms;
            }
            _ => return Err(ConfigError::UnknownKey { key: key.to_string() }),
        }
        Ok(())
    }
}
