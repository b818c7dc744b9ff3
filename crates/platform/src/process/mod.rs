//! Process execution operations

use async_trait::async_trait;
use lockcheck_errors::Error;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

/// Command builder handed to `ProcessOperations::execute_command`
#[derive(Debug, Clone)]
pub struct PlatformCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    env_vars: BTreeMap<String, String>,
    env_removals: Vec<String>,
    timeout: Option<Duration>,
}

impl PlatformCommand {
    /// Create a new platform command
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            current_dir: None,
            env_vars: BTreeMap::new(),
            env_removals: Vec::new(),
            timeout: None,
        }
    }

    /// Add an argument to the command
    pub fn arg<S: AsRef<str>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments to the command
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Set the working directory for the command
    pub fn current_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Set an environment variable for the child only
    pub fn env<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        let key = key.into();
        self.env_removals.retain(|k| *k != key);
        self.env_vars.insert(key, value.into());
        self
    }

    /// Make sure the child does not inherit `key`
    pub fn env_remove<K: Into<String>>(&mut self, key: K) -> &mut Self {
        let key = key.into();
        self.env_vars.remove(&key);
        self.env_removals.push(key);
        self
    }

    /// Kill the child if it runs longer than `timeout`
    pub fn timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Get the program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the arguments
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the current directory
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Get the environment overrides
    pub fn get_env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }

    /// Get the variables removed from the inherited environment
    pub fn get_env_removals(&self) -> &[String] {
        &self.env_removals
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for PlatformCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Output from command execution
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, `None` when the process was killed by a signal
    #[must_use]
    pub fn return_code(&self) -> Option<i32> {
        self.status.code()
    }

    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Trait for process execution operations
#[async_trait]
pub trait ProcessOperations: Send + Sync {
    /// Execute a command and return the output
    async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandOutput, Error>;

    /// Create a new command builder
    fn create_command(&self, program: &str) -> PlatformCommand {
        PlatformCommand::new(program)
    }

    /// Find the path to an executable
    async fn which(&self, program: &str) -> Result<PathBuf, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let mut cmd = PlatformCommand::new("pipenv");
        cmd.arg("install")
            .args(["-e", "./six"])
            .current_dir("/tmp/project")
            .env("PIPENV_NOSPIN", "1")
            .timeout(Some(Duration::from_secs(5)));

        assert_eq!(cmd.program(), "pipenv");
        assert_eq!(cmd.get_args(), ["install", "-e", "./six"]);
        assert_eq!(cmd.get_current_dir(), Some(Path::new("/tmp/project")));
        assert_eq!(cmd.get_env_vars()["PIPENV_NOSPIN"], "1");
        assert_eq!(cmd.get_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(cmd.to_string(), "pipenv install -e ./six");
    }

    #[test]
    fn test_env_remove_overrides_set() {
        let mut cmd = PlatformCommand::new("pipenv");
        cmd.env("VIRTUAL_ENV", "/venv").env_remove("VIRTUAL_ENV");
        assert!(cmd.get_env_vars().is_empty());
        assert_eq!(cmd.get_env_removals(), ["VIRTUAL_ENV"]);

        cmd.env("VIRTUAL_ENV", "/other");
        assert!(cmd.get_env_removals().is_empty());
    }

    #[test]
    fn test_display_quotes_whitespace() {
        let mut cmd = PlatformCommand::new("git");
        cmd.args(["clone", "https://example.invalid/six.git", "/tmp/with space"]);
        assert_eq!(
            cmd.to_string(),
            "git clone https://example.invalid/six.git \"/tmp/with space\""
        );
    }
}
