//! Component card: a self-description other components use for discovery.

use std::path::PathBuf;

use filetalk_common_config::{ConfigError, ConfigStore};
use filetalk_common_fs::{self as fs, path::absolutize};
use filetalk_form::{default_channel, default_outbox, resolve_channel, resolve_inbox, FormSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::envelope::{channels, MessageEnvelope};

/// Card format version understood by other components.
pub const CARD_SCHEMA_VERSION: u32 = 1;
/// Human-readable name announced on the card.
pub const CARD_TITLE: &str = "FileTalk Form Producer";

/// This component's external surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCard {
    pub schema_version: u32,
    pub title: String,
    /// Absolute inbox path, `null` when there is no inbox directory.
    pub inbox: Option<PathBuf>,
    /// Absolute outbox path.
    pub outbox: PathBuf,
    pub channels: CardChannels,
}

/// Channels this component listens on and emits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardChannels {
    /// Always just `text`.
    #[serde(rename = "in")]
    pub inputs: Vec<String>,
    /// First-seen order, no duplicates, never `text`.
    #[serde(rename = "out")]
    pub outputs: Vec<String>,
}

impl ComponentCard {
    /// The card as a message on the `card` channel.
    pub fn to_envelope(&self) -> Result<MessageEnvelope, serde_json::Error> {
        Ok(MessageEnvelope::new(channels::CARD, serde_json::to_value(self)?))
    }
}

/// Describe this component given its configuration and open forms.
///
/// Channels are the configured default, then each form's effective channel,
/// then `card`. The `text` channel is input only and never listed.
pub fn build_card<S: ConfigStore + ?Sized>(
    store: &S,
    open_forms: &[&FormSpec],
) -> Result<ComponentCard, ConfigError> {
    let inbox = resolve_inbox(store)?;
    let inbox = fs::is_dir(&inbox).then(|| absolutize(&inbox));
    let outbox = absolutize(default_outbox(store)?);

    let mut listed: Vec<String> = Vec::new();
    let mut add = |channel: String| {
        if channel != channels::TEXT && !listed.contains(&channel) {
            listed.push(channel);
        }
    };
    add(default_channel(store)?);
    for form in open_forms {
        add(resolve_channel(form.directives(), store)?);
    }
    add(channels::CARD.to_string());

    debug!(channels = ?listed, "built component card");
    Ok(ComponentCard {
        schema_version: CARD_SCHEMA_VERSION,
        title: CARD_TITLE.to_string(),
        inbox,
        outbox,
        channels: CardChannels {
            inputs: vec![channels::TEXT.to_string()],
            outputs: listed,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetalk_common_config::{keys, MemoryConfigStore};
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_card_lists_channels_in_order() {
        let dir = tempdir().unwrap();
        let store = MemoryConfigStore::new()
            .with(keys::CHANNEL, "bugs")
            .with(keys::OUTBOX, &dir.path().join("out").display().to_string());
        let a = FormSpec::parse("# channel: tickets\na -- bool").unwrap();
        let b = FormSpec::parse("b -- bool").unwrap();
        let c = FormSpec::parse("# channel: text\nc -- bool").unwrap();
        let d = FormSpec::parse("# channel: tickets\nd -- bool").unwrap();

        let card = build_card(&store, &[&a, &b, &c, &d]).unwrap();
        assert_eq!(card.channels.outputs, vec!["bugs", "tickets", "card"]);
        assert_eq!(card.outbox, dir.path().join("out"));
    }

    #[test]
    fn test_card_defaults() {
        let card = build_card(&MemoryConfigStore::new(), &[]).unwrap();
        assert_eq!(card.channels.outputs, vec!["output", "card"]);
        assert_eq!(card.channels.inputs, vec!["text"]);
        assert!(card.outbox.is_absolute());
        assert!(card.outbox.ends_with("OUTBOX"));
    }

    #[test]
    fn test_inbox_present_only_when_directory_exists() {
        let dir = tempdir().unwrap();
        let inbox = dir.path().join("INBOX");
        let store = MemoryConfigStore::new().with(keys::INBOX, &inbox.display().to_string());

        assert_eq!(build_card(&store, &[]).unwrap().inbox, None);

        std::fs::create_dir(&inbox).unwrap();
        assert_eq!(build_card(&store, &[]).unwrap().inbox, Some(inbox));
    }

    #[test]
    fn test_card_envelope_shape() {
        let card = ComponentCard {
            schema_version: CARD_SCHEMA_VERSION,
            title: CARD_TITLE.to_string(),
            inbox: None,
            outbox: PathBuf::from("/srv/out"),
            channels: CardChannels {
                inputs: vec!["text".into()],
                outputs: vec!["output".into(), "card".into()],
            },
        };
        let env = card.to_envelope().unwrap();
        assert_eq!(env.channel, "card");
        assert_eq!(
            env.signal,
            json!({
                "schema_version": 1,
                "title": "FileTalk Form Producer",
                "inbox": null,
                "outbox": "/srv/out",
                "channels": {"in": ["text"], "out": ["output", "card"]}
            })
        );
    }

    #[test]
    fn test_built_card_announces_schema_and_title() {
        let card = build_card(&MemoryConfigStore::new(), &[]).unwrap();
        assert_eq!(card.schema_version, 1);
        assert_eq!(card.title, "FileTalk Form Producer");

        let signal = card.to_envelope().unwrap().signal;
        let keys: Vec<_> = signal.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["schema_version", "title", "inbox", "outbox", "channels"]);
    }
}
