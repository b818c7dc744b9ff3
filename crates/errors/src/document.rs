//! Manifest, lock file and requirement parsing errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("{kind} not found at {path}")]
    Missing { kind: String, path: String },

    #[error("failed to parse {kind}: {message}")]
    Parse { kind: String, message: String },

    #[error("invalid requirement `{input}`: {reason}")]
    InvalidRequirement { input: String, reason: String },
}

impl UserFacingError for DocumentError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    // A missing lock file usually means the tool died half way through.
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Missing { .. } => "document.missing",
            Self::Parse { .. } => "document.parse",
            Self::InvalidRequirement { .. } => "document.invalid_requirement",
        };
        Some(code)
    }
}
