//! Assertion failures raised by scenario checks

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error("`{key}` missing from {section}; present: [{present}]")]
    MissingKey {
        section: String,
        key: String,
        present: String,
    },

    #[error("`{key}` must not appear in {section}")]
    UnexpectedKey { section: String, key: String },

    #[error("{location}: expected {expected}, found {actual}")]
    ValueMismatch {
        location: String,
        expected: String,
        actual: String,
    },

    #[error("`{command}` exited with code {code:?}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    UnexpectedExit {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl UserFacingError for CheckError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn is_retryable(&self) -> bool {
        true
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::MissingKey { .. } => "check.missing_key",
            Self::UnexpectedKey { .. } => "check.unexpected_key",
            Self::ValueMismatch { .. } => "check.value_mismatch",
            Self::UnexpectedExit { .. } => "check.unexpected_exit",
        };
        Some(code)
    }
}
