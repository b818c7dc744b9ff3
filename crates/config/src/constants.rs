//! Environment variables and fixed names understood by the harness

/// Program launched when nothing else is configured
pub const DEFAULT_TOOL: &str = "pipenv";

pub const ENV_TOOL: &str = "LOCKCHECK_TOOL";
pub const ENV_INDEX_URL: &str = "LOCKCHECK_INDEX_URL";
pub const ENV_NETWORK: &str = "LOCKCHECK_NETWORK";
pub const ENV_MAX_RUNS: &str = "LOCKCHECK_MAX_RUNS";
pub const ENV_FIXTURES: &str = "LOCKCHECK_FIXTURES";
pub const ENV_TIMEOUT: &str = "LOCKCHECK_TIMEOUT";

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "lockcheck";
pub const CONFIG_FILE_NAME: &str = "config.toml";
