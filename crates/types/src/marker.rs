//! Scenario markers used for selection

use lockcheck_errors::ScenarioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag attached to a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    Vcs,
    Install,
    NeedsInternet,
    Files,
    Urls,
    Editable,
    Tablib,
    Index,
}

impl Marker {
    pub const ALL: [Self; 8] = [
        Self::Vcs,
        Self::Install,
        Self::NeedsInternet,
        Self::Files,
        Self::Urls,
        Self::Editable,
        Self::Tablib,
        Self::Index,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vcs => "vcs",
            Self::Install => "install",
            Self::NeedsInternet => "needs-internet",
            Self::Files => "files",
            Self::Urls => "urls",
            Self::Editable => "editable",
            Self::Tablib => "tablib",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marker {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| ScenarioError::UnknownMarker {
                marker: s.to_string(),
            })
    }
}

// Implement clap::ValueEnum for Marker
impl clap::ValueEnum for Marker {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}
