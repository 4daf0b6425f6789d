//! File-based message transport.
//!
//! Components talk by dropping JSON envelopes into shared directories:
//! an outbox for what this component emits, an inbox for what it receives.
//! Every file is written atomically under a random unique name and every
//! inbox file is consumed exactly once.

pub mod card;
pub mod envelope;
pub mod inbox;
pub mod outbox;
pub mod watcher;

pub use card::{build_card, CardChannels, ComponentCard, CARD_SCHEMA_VERSION, CARD_TITLE};
pub use envelope::{
    build_form_envelope, build_signal, channels, encode_value, MessageEnvelope, ValueDefect,
    ValueDefectReason,
};
pub use inbox::{
    poll_inbox, ConsumePolicy, IgnoredMessage, Inbox, InboxError, InboxReport, IngestedForm,
    IngestionDiagnostic, IngestionProblem, PolicyError,
};
pub use outbox::{emit, EmitError, EmittedMessage, Outbox};
pub use watcher::{InboxWatcher, WatchEvent, WatcherHandle};
