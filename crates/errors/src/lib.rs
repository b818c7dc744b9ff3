#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the lockcheck harness
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so reports can keep a copy of the failure.

use std::borrow::Cow;

use thiserror::Error;

pub mod check;
pub mod config;
pub mod document;
pub mod platform;
pub mod scenario;

// Re-export all error types at the root
pub use check::CheckError;
pub use config::ConfigError;
pub use document::DocumentError;
pub use platform::PlatformError;
pub use scenario::ScenarioError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("check failed: {0}")]
    Check(#[from] CheckError),

    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// Shorthand for a skipped scenario
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Scenario(ScenarioError::Skipped {
            reason: reason.into(),
        })
    }

    /// Returns the skip reason if this error marks a skipped scenario
    #[must_use]
    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            Self::Scenario(ScenarioError::Skipped { reason }) => Some(reason),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Document(DocumentError::Parse {
            kind: "JSON".to_string(),
            message: err.to_string(),
        })
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Document(DocumentError::Parse {
            kind: "TOML".to_string(),
            message: err.to_string(),
        })
    }
}

/// Result type alias for lockcheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Config(err) => err.user_message(),
            Error::Platform(err) => err.user_message(),
            Error::Document(err) => err.user_message(),
            Error::Check(err) => err.user_message(),
            Error::Scenario(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            Error::Internal(_) => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Config(err) => err.user_hint(),
            Error::Platform(err) => err.user_hint(),
            Error::Scenario(err) => err.user_hint(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Platform(err) => err.is_retryable(),
            Error::Document(err) => err.is_retryable(),
            Error::Check(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Config(err) => err.user_code(),
            Error::Platform(err) => err.user_code(),
            Error::Document(err) => err.user_code(),
            Error::Check(err) => err.user_code(),
            Error::Scenario(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
