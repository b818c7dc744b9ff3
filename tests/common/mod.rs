//! Common test utilities for the integration suites
//!
//! `FakeTool` is a shell script standing in for the tool under test. It logs
//! its arguments, optionally dumps its environment, and copies canned
//! `Pipfile` / `Pipfile.lock` documents into the project:
//!
//! - `FAKE_LOG`: file each invocation's arguments are appended to
//! - `FAKE_ENV_DUMP`: file the environment is written to
//! - `FAKE_PIPFILE`: copied over the project's `Pipfile` on `install`
//! - `FAKE_LOCK`: copied to `Pipfile.lock` on every invocation
//! - `FAKE_SWITCH_ON` / `FAKE_LOCK_SWITCHED`: lock file used instead when the
//!   project's `Pipfile` contains the pattern
//! - `FAKE_EXIT`: exit code (default 0)

#![allow(dead_code)]

#[cfg(unix)]
use async_trait::async_trait;
use lockcheck_config::Config;
#[cfg(unix)]
use lockcheck_errors::Error;
#[cfg(unix)]
use lockcheck_platform::{
    CommandOutput, NativeProcessOperations, PlatformCommand, ProcessOperations,
};
#[cfg(unix)]
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::sync::Mutex;
#[cfg(unix)]
use tempfile::TempDir;

#[cfg(unix)]
const SCRIPT: &str = r#"#!/bin/sh
project=$(dirname "${PIPENV_PIPFILE:-./Pipfile}")

if [ -n "$FAKE_LOG" ]; then
    printf '%s\n' "$*" >> "$FAKE_LOG"
fi
if [ -n "$FAKE_ENV_DUMP" ]; then
    env > "$FAKE_ENV_DUMP"
fi

if [ "$1" = "install" ] && [ -n "$FAKE_PIPFILE" ]; then
    cp "$FAKE_PIPFILE" "$project/Pipfile"
fi

lock_src="$FAKE_LOCK"
if [ -n "$FAKE_SWITCH_ON" ] && grep -q "$FAKE_SWITCH_ON" "$project/Pipfile" 2>/dev/null; then
    lock_src="$FAKE_LOCK_SWITCHED"
fi
if [ -n "$lock_src" ]; then
    cp "$lock_src" "$project/Pipfile.lock"
fi

exit "${FAKE_EXIT:-0}"
"#;

#[cfg(unix)]
pub struct FakeTool {
    dir: TempDir,
    program: PathBuf,
}

#[cfg(unix)]
impl FakeTool {
    pub fn install() -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let program = dir.path().join("pipenv");
        std::fs::write(&program, SCRIPT).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir, program }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write a canned document next to the script; returns its path
    pub fn document(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("invocations.log")
    }

    /// Arguments of every invocation so far, one line each
    pub fn invocations(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Config running this script, logging invocations, with `env` passed
    /// through to it. Flaky scenarios run once.
    pub fn config(&self, env: &[(&str, &str)]) -> Config {
        let mut config = Config::default();
        config.tool.program = self.program.display().to_string();
        config.tool.timeout_secs = 30;
        config.network.max_runs = 1;
        config.paths.fixtures_dir = Some(self.dir.path().join("fixtures"));
        config
            .tool
            .extra_env
            .insert("FAKE_LOG".to_string(), self.log_path().display().to_string());
        for (key, value) in env {
            config
                .tool
                .extra_env
                .insert((*key).to_string(), (*value).to_string());
        }
        config
    }
}

/// Host process operations with `git clone` replaced by creating the
/// destination directory; cloned URLs are recorded
#[cfg(unix)]
#[derive(Default)]
pub struct OfflineGit {
    inner: NativeProcessOperations,
    clones: Mutex<Vec<String>>,
}

#[cfg(unix)]
impl OfflineGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clones(&self) -> Vec<String> {
        self.clones.lock().unwrap().clone()
    }
}

#[cfg(unix)]
#[async_trait]
impl ProcessOperations for OfflineGit {
    async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandOutput, Error> {
        let args = cmd.get_args();
        if cmd.program() != "git" || args.first().map(String::as_str) != Some("clone") {
            return self.inner.execute_command(cmd).await;
        }

        self.clones.lock().unwrap().push(args[1].clone());
        let mut mkdir = self.inner.create_command("mkdir");
        mkdir.arg("-p").arg(&args[2]);
        self.inner.execute_command(mkdir).await
    }

    async fn which(&self, program: &str) -> Result<PathBuf, Error> {
        self.inner.which(program).await
    }
}

/// Configuration for live runs against the real tool, or `None` unless
/// `LOCKCHECK_LIVE` is set
pub async fn live_config() -> Option<Config> {
    if std::env::var_os("LOCKCHECK_LIVE").is_none() {
        eprintln!("skipping: set LOCKCHECK_LIVE=1 to run scenarios against the real tool");
        return None;
    }
    let mut config = Config::load_or_default(None).await.unwrap();
    config.merge_env().unwrap();
    Some(config)
}
