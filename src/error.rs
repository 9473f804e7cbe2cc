//! Error types for companion-core
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Companion-core error types
#[derive(Error, Debug)]
pub enum Error {
    /// Missing, empty, non-numeric or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Byte buffer is not a valid embedding container
    #[error("Format error: {0}")]
    Format(String),

    /// Statistic cannot be computed for the given sample
    #[error("Computation error: {0}")]
    Computation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Error category, for callers that branch on cause rather than message text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Validation`]
    Validation,
    /// See [`Error::Format`]
    Format,
    /// See [`Error::Computation`]
    Computation,
    /// See [`Error::Io`]
    Io,
    /// See [`Error::Other`]
    Other,
}

impl ErrorKind {
    /// Get category name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Format => "format",
            Self::Computation => "computation",
            Self::Io => "io",
            Self::Other => "other",
        }
    }
}

impl Error {
    /// Category of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Format(_) => ErrorKind::Format,
            Self::Computation(_) => ErrorKind::Computation,
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Message without the category prefix, as surfaced in error payloads
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::Format(msg)
            | Self::Computation(msg)
            | Self::Other(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("Invalid JSON: {err}"))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::Validation(format!("Invalid base64: {err}"))
    }
}
