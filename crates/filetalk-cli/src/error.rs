//! CLI error handling.

use std::io;
use std::path::PathBuf;

use filetalk_common_config::ConfigError;
use filetalk_form::ParseDefect;
use filetalk_patchboard::{EmitError, InboxError, PolicyError, ValueDefect};
use thiserror::Error;

use crate::renderer::RenderError;
use crate::Exit;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// CLI error type with context for the user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
        hint: Option<String>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<BoxError>,
        path: Option<PathBuf>,
    },

    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
        line: Option<usize>,
    },

    #[error("{message}")]
    User { message: String, hint: Option<String> },

    #[error("interrupted")]
    Interrupted,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Get the error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "E001",
            Self::Io { .. } => "E002",
            Self::Validation { .. } => "E004",
            Self::User { .. } => "E010",
            Self::Interrupted => "E130",
            Self::Other(_) => "E999",
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> Exit {
        match self {
            Self::Config { .. } => Exit::ConfigError,
            Self::Io { .. } => Exit::IoError,
            Self::Validation { .. } => Exit::ValidationError,
            Self::Interrupted => Exit::Interrupted,
            Self::User { .. } | Self::Other(_) => Exit::GeneralError,
        }
    }

    /// Get hint for this error if available
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } | Self::User { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// Where the error happened, when known
    pub fn location(&self) -> Option<String> {
        match self {
            Self::Validation { line: Some(line), .. } => Some(format!("line {line}")),
            Self::Validation { field: Some(field), .. } => Some(format!("field '{field}'")),
            Self::Io { path: Some(path), .. } => Some(path.display().to_string()),
            _ => None,
        }
    }

    /// Create a user error with hint
    pub fn user_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create an IO error with path
    pub fn io_with_path(
        message: impl Into<String>,
        source: impl Into<BoxError>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source.into()),
            path: Some(path.into()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(Box::new(err)),
            path: None,
        }
    }
}

impl From<filetalk_common_core::Error> for CliError {
    fn from(err: filetalk_common_core::Error) -> Self {
        let path = err.path().map(PathBuf::from);
        Self::Io {
            message: err.to_string(),
            source: Some(Box::new(err)),
            path,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation {
            message: format!("Invalid JSON: {err}"),
            field: None,
            line: None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::UnknownKey { .. } => "Run `form-producer config list` to see known keys",
            _ => "Check .form-producer/config.yaml",
        };
        Self::Config {
            message: format!("Configuration error: {err}"),
            source: Some(Box::new(err)),
            hint: Some(hint.to_string()),
        }
    }
}

impl From<ParseDefect> for CliError {
    fn from(defect: ParseDefect) -> Self {
        Self::Validation {
            message: format!("Invalid form description: {defect}"),
            field: None,
            line: Some(defect.line),
        }
    }
}

impl From<ValueDefect> for CliError {
    fn from(defect: ValueDefect) -> Self {
        Self::Validation {
            message: format!("Invalid value: {defect}"),
            field: Some(defect.field.clone()),
            line: None,
        }
    }
}

impl From<RenderError> for CliError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownField(name) => Self::Validation {
                message: format!("No field named '{name}' in this form"),
                field: Some(name),
                line: None,
            },
            RenderError::ValuesFile { path, source } => Self::Validation {
                message: format!("Invalid values file {}: {source}", path.display()),
                field: None,
                line: None,
            },
        }
    }
}

impl From<EmitError> for CliError {
    fn from(err: EmitError) -> Self {
        match err {
            EmitError::Io { dir, source } => Self::io_with_path(
                format!("Cannot write to outbox {}: {source}", dir.display()),
                source,
                dir,
            ),
            EmitError::Serialize(e) => Self::Other(anyhow::Error::new(e).context("serializing message")),
        }
    }
}

impl From<InboxError> for CliError {
    fn from(err: InboxError) -> Self {
        let message = err.to_string();
        let path = err.dir.clone();
        Self::io_with_path(message, err, path)
    }
}

impl From<PolicyError> for CliError {
    fn from(err: PolicyError) -> Self {
        Self::user_with_hint(err.to_string(), "pass a --move-to directory outside the inbox")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defect_is_validation() {
        let defect = filetalk_form::parse("a -- nosuchtype").unwrap_err();
        let err = CliError::from(defect);
        assert_eq!(err.code(), "E004");
        assert!(matches!(err.exit_code(), Exit::ValidationError));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_config_error_has_hint() {
        let err = CliError::from(ConfigError::UnknownKey {
            key: "nope".to_string(),
        });
        assert!(matches!(err.exit_code(), Exit::ConfigError));
        assert!(err.hint().unwrap().contains("config list"));
    }

    #[test]
    fn test_value_defect_names_field() {
        let spec = filetalk_form::parse("ok -- bool").unwrap();
        let values = filetalk_form::FieldValues::new();
        let defect = filetalk_patchboard::build_signal(&spec, &values).unwrap_err();
        let err = CliError::from(defect);
        assert_eq!(err.location().as_deref(), Some("field 'ok'"));
    }

    #[test]
    fn test_io_error_exit_code() {
        let err = CliError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(matches!(err.exit_code(), Exit::IoError));
        assert_eq!(err.code(), "E002");
    }
}
