//! Scenario selection and lifecycle errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ScenarioError {
    #[error("unknown scenario: {name}")]
    UnknownScenario { name: String },

    #[error("unknown marker: {marker}")]
    UnknownMarker { marker: String },

    #[error("scenario skipped: {reason}")]
    Skipped { reason: String },
}

impl UserFacingError for ScenarioError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownScenario { .. } => Some("Run `lockcheck list` to see available scenarios."),
            Self::UnknownMarker { .. } => Some(
                "Valid markers: vcs, install, needs-internet, files, urls, editable, tablib, index.",
            ),
            Self::Skipped { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnknownScenario { .. } => "scenario.unknown",
            Self::UnknownMarker { .. } => "scenario.unknown_marker",
            Self::Skipped { .. } => "scenario.skipped",
        };
        Some(code)
    }
}
