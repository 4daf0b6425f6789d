//! FileTalk common core types and utilities.

pub mod error;
pub mod id;
pub mod timestamp;

pub use error::{Error, ErrorCategory, ErrorCode, Result};
pub use id::{FormId, IdParseError, MessageId};
pub use timestamp::Timestamp;
