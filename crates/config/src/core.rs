//! Configuration sections

use crate::constants::DEFAULT_TOOL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Tool under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_program")]
    pub program: String,
    /// Extra environment passed to every invocation
    #[serde(default)]
    pub extra_env: BTreeMap<String, String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64, // 0 = no timeout
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_TOOL.to_string(),
            extra_env: BTreeMap::new(),
            timeout_secs: 600, // 10 minutes
        }
    }
}

/// Package index mirror
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Base URL of a local mirror; `/simple` is appended for the tool
    pub url: Option<String>,
}

/// Network access and retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_network_enabled")]
    pub enabled: bool,
    /// Total runs allowed for a flaky scenario, first run included
    #[serde(default = "default_max_runs")]
    pub max_runs: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_runs: 2,
            retry_delay_ms: 500,
        }
    }
}

/// Path configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Directory holding `pypi/<name>/<wheel>` fixtures
    pub fixtures_dir: Option<PathBuf>,
    /// Parent for project temp dirs (system temp dir if unset)
    pub work_dir: Option<PathBuf>,
}

// Default value functions for serde
fn default_program() -> String {
    DEFAULT_TOOL.to_string()
}

fn default_timeout_secs() -> u64 {
    600 // 10 minutes
}

fn default_network_enabled() -> bool {
    true
}

fn default_max_runs() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}
