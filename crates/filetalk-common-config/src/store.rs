//! The configuration store collaborator.
//!
//! Consumers read settings through [`ConfigStore`] instead of any process-wide
//! state, so every lookup is explicit and can be substituted in tests.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::env::Environment;
use crate::loader::{ConfigError, ConfigLoader};
use crate::types::{keys, FormProducerConfig};

/// Named-setting store.
pub trait ConfigStore {
    /// Read a setting. `Ok(None)` means "not configured".
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;

    /// Write a setting. An empty value clears it.
    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;
}

impl<S: ConfigStore + ?Sized> ConfigStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        (**self).set(key, value)
    }
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    config: FormProducerConfig,
}

impl MemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter. Invalid settings are logged and skipped.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        if let Err(e) = self.config.set(key, value) {
            warn!(key, error = %e, "ignoring invalid setting");
        }
        self
    }

    /// The underlying configuration.
    pub fn config(&self) -> &FormProducerConfig {
        &self.config
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        self.config.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.config.set(key, value)
    }
}

/// File-backed store with non-persistent overrides layered on top.
///
/// Lookup order: explicit overrides (command line), then environment
/// overrides, then the config file.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    loader: ConfigLoader,
    config: FormProducerConfig,
    overrides: HashMap<String, String>,
}

impl FileConfigStore {
    /// Load the store from `loader`'s file (defaults if absent).
    pub fn open(loader: ConfigLoader) -> Result<Self, ConfigError> {
        let config = loader.load()?;
        Ok(Self {
            loader,
            config,
            overrides: HashMap::new(),
        })
    }

    /// Apply `FORM_PRODUCER_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        for (key, value) in Environment::store_overrides() {
            debug!(key, "environment override");
            self.overrides.entry(key.to_string()).or_insert(value);
        }
        self
    }

    /// Add an override that is never written back to disk.
    pub fn with_override(mut self, key: &str, value: impl Into<String>) -> Result<Self, ConfigError> {
        if !keys::is_known(key) {
            return Err(ConfigError::UnknownKey { key: key.to_string() });
        }
        // Validate the value against the schema without keeping it.
        let value = value.into();
        self.config.clone().set(key, &value)?;
        self.overrides.insert(key.to_string(), value);
        Ok(self)
    }

    /// The config file backing this store.
    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    /// All known keys with their effective values.
    pub fn entries(&self) -> Result<Vec<(&'static str, Option<String>)>, ConfigError> {
        let mut entries = Vec::with_capacity(keys::ALL.len());
        for key in keys::ALL {
            entries.push((key, self.get(key)?));
        }
        Ok(entries)
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        if let Some(value) = self.overrides.get(key) {
            return Ok(Some(value.clone()));
        }
        self.config.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut updated = self.config.clone();
        updated.set(key, value)?;
        self.loader.save(&updated)?;
        self.config = updated;
        if self.overrides.contains_key(key) {
            warn!(key, "setting saved but an override still takes precedence");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryConfigStore::new().with(keys::CHANNEL, "bugs");
        assert_eq!(store.get(keys::CHANNEL).unwrap(), Some("bugs".to_string()));
        assert_eq!(store.get(keys::OUTBOX).unwrap(), None);

        store.set(keys::OUTBOX, "/tmp/out").unwrap();
        assert_eq!(store.get(keys::OUTBOX).unwrap(), Some("/tmp/out".to_string()));
        assert!(store.set("bogus", "x").is_err());
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempdir().unwrap();
        let mut store = FileConfigStore::open(ConfigLoader::new(dir.path())).unwrap();
        store.set(keys::CHANNEL, "tickets").unwrap();

        let reopened = FileConfigStore::open(ConfigLoader::new(dir.path())).unwrap();
        assert_eq!(reopened.get(keys::CHANNEL).unwrap(), Some("tickets".to_string()));
    }

    #[test]
    fn test_overrides_take_precedence_and_are_not_saved() {
        let dir = tempdir().unwrap();
        let mut store = FileConfigStore::open(ConfigLoader::new(dir.path()))
            .unwrap()
            .with_override(keys::CHANNEL, "from-cli")
            .unwrap();
        store.set(keys::CHANNEL, "from-file").unwrap();
        assert_eq!(store.get(keys::CHANNEL).unwrap(), Some("from-cli".to_string()));

        let reopened = FileConfigStore::open(ConfigLoader::new(dir.path())).unwrap();
        assert_eq!(reopened.get(keys::CHANNEL).unwrap(), Some("from-file".to_string()));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::open(ConfigLoader::new(dir.path())).unwrap();
        assert!(store.clone().with_override("nope", "x").is_err());
        assert!(store.with_override(keys::INBOX_POLL_MS, "0").is_err());
    }

    #[test]
    fn test_entries_lists_every_key() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::open(ConfigLoader::new(dir.path())).unwrap();
        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), keys::ALL.len());
        assert_eq!(entries[3], (keys::INBOX_POLL_MS, Some("1000".to_string())));
    }
}
