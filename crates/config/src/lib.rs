#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for lockcheck
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/lockcheck/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod core;

pub use crate::core::{IndexConfig, NetworkConfig, PathConfig, ToolConfig};

use lockcheck_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::CONFIG_FILE_NAME))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::from(ConfigError::NotFound {
                    path: path.display().to_string(),
                })
            } else {
                Error::io_with_path(&e, path)
            }
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge overrides from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for values that do not parse.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // LOCKCHECK_TOOL
        if let Some(tool) = lookup(constants::ENV_TOOL) {
            if tool.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: constants::ENV_TOOL.to_string(),
                    value: tool,
                }
                .into());
            }
            self.tool.program = tool;
        }

        // LOCKCHECK_INDEX_URL (empty clears it)
        if let Some(url) = lookup(constants::ENV_INDEX_URL) {
            self.index.url = if url.trim().is_empty() { None } else { Some(url) };
        }

        // LOCKCHECK_NETWORK
        if let Some(network) = lookup(constants::ENV_NETWORK) {
            self.network.enabled = match network.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: constants::ENV_NETWORK.to_string(),
                        value: network,
                    }
                    .into())
                }
            };
        }

        // LOCKCHECK_MAX_RUNS
        if let Some(runs) = lookup(constants::ENV_MAX_RUNS) {
            self.network.max_runs = runs.parse().map_err(|_| ConfigError::InvalidValue {
                field: constants::ENV_MAX_RUNS.to_string(),
                value: runs,
            })?;
        }

        // LOCKCHECK_TIMEOUT
        if let Some(timeout) = lookup(constants::ENV_TIMEOUT) {
            self.tool.timeout_secs = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: constants::ENV_TIMEOUT.to_string(),
                value: timeout,
            })?;
        }

        // LOCKCHECK_FIXTURES
        if let Some(fixtures) = lookup(constants::ENV_FIXTURES) {
            self.paths.fixtures_dir = Some(PathBuf::from(fixtures));
        }

        self.validate()
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error if the program is empty or `max_runs` is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.tool.program.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "tool.program".to_string(),
            }
            .into());
        }
        if self.network.max_runs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.max_runs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Timeout applied to each tool invocation, if any
    #[must_use]
    pub fn tool_timeout(&self) -> Option<Duration> {
        (self.tool.timeout_secs > 0).then(|| Duration::from_secs(self.tool.timeout_secs))
    }

    /// Index URL in the form the tool expects (`<mirror>/simple`)
    #[must_use]
    pub fn index_simple_url(&self) -> Option<String> {
        self.index.url.as_ref().map(|url| {
            let trimmed = url.trim_end_matches('/');
            if trimmed.ends_with("/simple") {
                trimmed.to_string()
            } else {
                format!("{trimmed}/simple")
            }
        })
    }

    /// Get the fixtures directory (with default)
    #[must_use]
    pub fn fixtures_dir(&self) -> PathBuf {
        self.paths
            .fixtures_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("fixtures"))
    }
}
