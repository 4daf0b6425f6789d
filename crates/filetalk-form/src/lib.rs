//! Form description language.
//!
//! Parses compact text descriptions into typed field definitions plus
//! per-form directives, and resolves where a filled-in form should be sent.

pub mod field_type;
pub mod parser;
pub mod resolve;
pub mod value;

pub use field_type::{parse_type_spec, FieldType, TypeSpecError};
pub use parser::{
    parse, DefectReason, DirectiveKind, Directives, FieldDefinition, FormSpec, ParseDefect,
};
pub use resolve::{
    default_channel, default_outbox, resolve_channel, resolve_inbox, resolve_outbox,
    resolve_route, Route, DEFAULT_CHANNEL, DEFAULT_INBOX, DEFAULT_OUTBOX,
};
pub use value::{FieldValue, FieldValues, FormRenderer};
