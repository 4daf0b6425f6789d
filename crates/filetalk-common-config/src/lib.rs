//! Configuration for FileTalk components.
//!
//! Settings live in `.form-producer/config.yaml` and are read through the
//! [`ConfigStore`] trait using dotted keys (`channel`, `path.outbox`,
//! `path.inbox`, `inbox.poll_ms`).

pub mod env;
pub mod loader;
pub mod store;
pub mod types;

pub use env::*;
pub use loader::*;
pub use store::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_sensible_values() {
        let config = FormProducerConfig::default();
        assert!(config.channel.is_none());
        assert!(config.paths.outbox.is_none());
        assert!(config.paths.inbox.is_none());
        assert_eq!(config.inbox.poll_ms, 1000);
    }

    #[test]
    fn test_config_serializes_to_yaml() {
        let mut config = FormProducerConfig::default();
        config.channel = Some("bugs".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();

        assert!(yaml.contains("channel: bugs"));
        assert!(yaml.contains("paths:"));
        assert!(yaml.contains("poll_ms: 1000"));
        // Unset paths are omitted rather than written as null
        assert!(!yaml.contains("outbox"));
    }
}
