//! Outbox emitter.

use std::path::{Path, PathBuf};

use filetalk_common_core::MessageId;
use filetalk_common_log::spans;
use thiserror::Error;
use tracing::info;

use crate::envelope::MessageEnvelope;

/// Failure to publish a message.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write message into {}: {source}", dir.display())]
    Io {
        dir: PathBuf,
        #[source]
        source: filetalk_common_core::Error,
    },
}

/// A published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedMessage {
    pub id: MessageId,
    pub path: PathBuf,
}

/// A directory that messages are dropped into.
///
/// Each message is written under a fresh random `<uuid>.json` name through a
/// hidden temporary file and a rename, so a scanner of the directory never
/// sees a partial file.
#[derive(Debug, Clone)]
pub struct Outbox {
    dir: PathBuf,
}

impl Outbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `envelope` into the outbox, creating the directory if needed.
    pub fn emit(&self, envelope: &MessageEnvelope) -> Result<EmittedMessage, EmitError> {
        let _span = spans::emit_span(&envelope.channel).entered();

        let line = envelope.to_json_line()?;
        let id = MessageId::new();
        let path = self.dir.join(id.file_name());

        filetalk_common_fs::write_string_atomic(&path, &line).map_err(|source| EmitError::Io {
            dir: self.dir.clone(),
            source,
        })?;

        info!(channel = %envelope.channel, path = %path.display(), "message emitted");
        Ok(EmittedMessage { id, path })
    }
}

/// Write `envelope` into `dir`. See [`Outbox::emit`].
pub fn emit(envelope: &MessageEnvelope, dir: impl Into<PathBuf>) -> Result<EmittedMessage, EmitError> {
    Outbox::new(dir).emit(envelope)
}
