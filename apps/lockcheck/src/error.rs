//! CLI error handling

use std::fmt;

use lockcheck_errors::UserFacingError;
use serde::Serialize;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Harness, configuration or platform error
    Lockcheck(lockcheck_errors::Error),
    /// Rendering output failed
    Output(String),
    /// I/O error
    Io(std::io::Error),
}

impl CliError {
    /// Machine-readable form for `--json` mode
    pub fn to_json(&self) -> serde_json::Value {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            error: String,
            code: Option<&'a str>,
            hint: Option<&'a str>,
            retryable: bool,
        }

        let body = match self {
            CliError::Lockcheck(e) => ErrorBody {
                error: e.user_message().into_owned(),
                code: e.user_code(),
                hint: e.user_hint(),
                retryable: e.is_retryable(),
            },
            other => ErrorBody {
                error: other.to_string(),
                code: None,
                hint: None,
                retryable: false,
            },
        };
        serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Lockcheck(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::Output(msg) => write!(f, "Output error: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Lockcheck(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Output(_) => None,
        }
    }
}

impl From<lockcheck_errors::Error> for CliError {
    fn from(e: lockcheck_errors::Error) -> Self {
        CliError::Lockcheck(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
