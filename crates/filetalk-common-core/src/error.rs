//! Error types shared by FileTalk crates.

use std::fmt;

use thiserror::Error;

/// Stable machine-readable error code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    pub const FILE_NOT_FOUND: Self = Self("FS001");
    pub const FILE_READ_ERROR: Self = Self("FS002");
    pub const FILE_WRITE_ERROR: Self = Self("FS003");
    pub const SERIALIZATION: Self = Self("SR001");

    /// The code as a string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorCode({})", self.0)
    }
}

/// Broad error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    FileSystem,
    Serialization,
}

/// The main error type for FileTalk operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File system error with the offending path.
    #[error("{message}")]
    FileSystem {
        code: ErrorCode,
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a file system error from an I/O failure.
    pub fn io(
        code: ErrorCode,
        message: impl Into<String>,
        path: &std::path::Path,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            code,
            message: message.into(),
            path: Some(path.to_string_lossy().to_string()),
            source: Some(Box::new(source)),
        }
    }

    /// The error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::FileSystem { code, .. } => *code,
            Self::Serialization(_) => ErrorCode::SERIALIZATION,
        }
    }

    /// The error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileSystem { .. } => ErrorCategory::FileSystem,
            Self::Serialization(_) => ErrorCategory::Serialization,
        }
    }

    /// The path involved, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::FileSystem { path, .. } => path.as_deref(),
            _ => None,
        }
    }

    /// Whether this is a missing-file error.
    pub fn is_not_found(&self) -> bool {
        self.code() == ErrorCode::FILE_NOT_FOUND
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using FileTalk's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    #[test]
    fn test_io_error_carries_path_and_code() {
        let err = Error::io(
            ErrorCode::FILE_WRITE_ERROR,
            "failed to write",
            Path::new("/tmp/x.json"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code(), ErrorCode::FILE_WRITE_ERROR);
        assert_eq!(err.category(), ErrorCategory::FileSystem);
        assert_eq!(err.path(), Some("/tmp/x.json"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Serialization);
        assert_eq!(err.code().as_str(), "SR001");
    }
}
