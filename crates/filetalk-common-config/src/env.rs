//! Environment variable handling.

use std::env;

use crate::types::keys;

/// Environment variable names.
pub mod vars {
    // Overrides for the configuration store
    pub const FORM_PRODUCER_OUTBOX: &str = "FORM_PRODUCER_OUTBOX";
    pub const FORM_PRODUCER_INBOX: &str = "FORM_PRODUCER_INBOX";
    pub const FORM_PRODUCER_CHANNEL: &str = "FORM_PRODUCER_CHANNEL";
    pub const FORM_PRODUCER_CONFIG: &str = "FORM_PRODUCER_CONFIG";
}

/// Environment configuration.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Initialize environment from .env files (later files override earlier).
    ///
    /// Variables already set in the process are never replaced.
    pub fn init() -> Self {
        let _ = dotenvy::from_filename(".env");
        let _ = dotenvy::from_filename(".env.local");
        Self { _guard: () }
    }

    /// Get an optional, non-empty string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.trim().is_empty())
    }

    /// Store overrides taken from `FORM_PRODUCER_*` variables, as `(key, value)` pairs.
    pub fn store_overrides() -> Vec<(&'static str, String)> {
        [
            (keys::OUTBOX, vars::FORM_PRODUCER_OUTBOX),
            (keys::INBOX, vars::FORM_PRODUCER_INBOX),
            (keys::CHANNEL, vars::FORM_PRODUCER_CHANNEL),
        ]
        .into_iter()
        .filter_map(|(key, var)| Self::get(var).map(|value| (key, value)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_unset() {
        env::set_var("FILETALK_TEST_EMPTY", "  ");
        assert_eq!(Environment::get("FILETALK_TEST_EMPTY"), None);
        assert_eq!(Environment::get("FILETALK_TEST_UNSET_VAR"), None);
        env::remove_var("FILETALK_TEST_EMPTY");
    }

    #[test]
    fn test_store_overrides() {
        env::set_var(vars::FORM_PRODUCER_INBOX, "/srv/inbox");
        let overrides = Environment::store_overrides();
        assert!(overrides.contains(&(keys::INBOX, "/srv/inbox".to_string())));
        env::remove_var(vars::FORM_PRODUCER_INBOX);
    }
}
