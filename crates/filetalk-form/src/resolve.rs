//! Directive and channel resolution.
//!
//! Every effective setting is chosen by the same priority: a directive in
//! the form text, then the configuration store, then a built-in default.

use std::path::PathBuf;

use filetalk_common_config::{keys, ConfigError, ConfigStore};
use tracing::debug;

use crate::parser::Directives;

/// Channel used when neither the form nor the configuration names one.
pub const DEFAULT_CHANNEL: &str = "output";
/// Outbox used when neither the form nor the configuration names one.
pub const DEFAULT_OUTBOX: &str = "OUTBOX";
/// Inbox used when the configuration does not name one.
pub const DEFAULT_INBOX: &str = "INBOX";

/// Where a form's message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub channel: String,
    pub outbox: PathBuf,
}

fn configured<S: ConfigStore + ?Sized>(store: &S, key: &str) -> Result<Option<String>, ConfigError> {
    Ok(store.get(key)?.filter(|v| !v.trim().is_empty()))
}

/// Configured default channel, else [`DEFAULT_CHANNEL`].
pub fn default_channel<S: ConfigStore + ?Sized>(store: &S) -> Result<String, ConfigError> {
    Ok(configured(store, keys::CHANNEL)?.unwrap_or_else(|| DEFAULT_CHANNEL.to_string()))
}

/// Effective channel for a form.
pub fn resolve_channel<S: ConfigStore + ?Sized>(
    directives: &Directives,
    store: &S,
) -> Result<String, ConfigError> {
    if let Some(channel) = &directives.channel {
        return Ok(channel.clone());
    }
    default_channel(store)
}

/// Effective outbox directory for a form.
pub fn resolve_outbox<S: ConfigStore + ?Sized>(
    directives: &Directives,
    store: &S,
) -> Result<PathBuf, ConfigError> {
    if let Some(outbox) = &directives.outbox {
        return Ok(PathBuf::from(outbox));
    }
    Ok(configured(store, keys::OUTBOX)?
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTBOX)))
}

/// Outbox for messages not tied to a form, such as the component card.
pub fn default_outbox<S: ConfigStore + ?Sized>(store: &S) -> Result<PathBuf, ConfigError> {
    resolve_outbox(&Directives::default(), store)
}

/// Inbox directory. Forms cannot redirect it.
pub fn resolve_inbox<S: ConfigStore + ?Sized>(store: &S) -> Result<PathBuf, ConfigError> {
    Ok(configured(store, keys::INBOX)?
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INBOX)))
}

/// Channel and outbox together.
pub fn resolve_route<S: ConfigStore + ?Sized>(
    directives: &Directives,
    store: &S,
) -> Result<Route, ConfigError> {
    let route = Route {
        channel: resolve_channel(directives, store)?,
        outbox: resolve_outbox(directives, store)?,
    };
    debug!(channel = %route.channel, outbox = %route.outbox.display(), "resolved route");
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use filetalk_common_config::MemoryConfigStore;

    struct BrokenStore;

    impl ConfigStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, ConfigError> {
            Err(ConfigError::ValidationError {
                message: "store unavailable".to_string(),
            })
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), ConfigError> {
            unreachable!("resolver never writes")
        }
    }

    #[test]
    fn test_channel_from_config_when_no_directive() {
        let spec = parse("a -- bool").unwrap();
        let store = MemoryConfigStore::new().with(keys::CHANNEL, "x");
        assert_eq!(resolve_channel(spec.directives(), &store).unwrap(), "x");
    }

    #[test]
    fn test_directive_beats_config() {
        let spec = parse("# channel: y\na -- bool").unwrap();
        let store = MemoryConfigStore::new().with(keys::CHANNEL, "x");
        assert_eq!(resolve_channel(spec.directives(), &store).unwrap(), "y");
    }

    #[test]
    fn test_channel_default() {
        let spec = parse("a -- bool").unwrap();
        assert_eq!(
            resolve_channel(spec.directives(), &MemoryConfigStore::new()).unwrap(),
            "output"
        );
    }

    #[test]
    fn test_outbox_priority() {
        let store = MemoryConfigStore::new().with(keys::OUTBOX, "/srv/out");
        let plain = parse("a -- bool").unwrap();
        let directed = parse("# outbox: /tmp/elsewhere").unwrap();

        assert_eq!(
            resolve_outbox(plain.directives(), &store).unwrap(),
            PathBuf::from("/srv/out")
        );
        assert_eq!(
            resolve_outbox(directed.directives(), &store).unwrap(),
            PathBuf::from("/tmp/elsewhere")
        );
        assert_eq!(
            resolve_outbox(plain.directives(), &MemoryConfigStore::new()).unwrap(),
            PathBuf::from("OUTBOX")
        );
    }

    #[test]
    fn test_inbox_default_and_configured() {
        assert_eq!(resolve_inbox(&MemoryConfigStore::new()).unwrap(), PathBuf::from("INBOX"));
        let store = MemoryConfigStore::new().with(keys::INBOX, "/srv/in");
        assert_eq!(resolve_inbox(&store).unwrap(), PathBuf::from("/srv/in"));
    }

    #[test]
    fn test_store_failure_is_surfaced() {
        let spec = parse("a -- bool").unwrap();
        assert!(resolve_channel(spec.directives(), &BrokenStore).is_err());
        assert!(resolve_inbox(&BrokenStore).is_err());
    }

    #[test]
    fn test_directive_needs_no_store_lookup() {
        let spec = parse("# channel: y\n# outbox: out").unwrap();
        let route = resolve_route(spec.directives(), &BrokenStore).unwrap();
        assert_eq!(route.channel, "y");
        assert_eq!(route.outbox, PathBuf::from("out"));
    }
}
