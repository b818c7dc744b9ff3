//! Disposable project fixture
//!
//! A `ProjectInstance` owns a temporary project directory (optionally holding
//! an empty `Pipfile`) and runs the tool under test against it with an
//! isolated environment: no pyenv, no outer virtualenv, the virtualenv inside
//! the project, and a fresh cache directory for every invocation.

use lockcheck_config::Config;
use lockcheck_errors::{DocumentError, Error};
use lockcheck_platform::{CommandOutput, ProcessOperations};
use lockcheck_types::{Lockfile, Pipfile, LOCKFILE, PIPFILE};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info, warn};

/// Variables set for every invocation
const BASE_ENV: [(&str, &str); 6] = [
    ("PIPENV_DONT_USE_PYENV", "1"),
    ("PIPENV_IGNORE_VIRTUALENVS", "1"),
    ("PIPENV_VENV_IN_PROJECT", "1"),
    ("PIPENV_NOSPIN", "1"),
    ("PIPENV_YES", "1"),
    ("CI", "1"),
];

/// Builder for [`ProjectInstance`]
pub struct ProjectInstanceBuilder {
    ops: Arc<dyn ProcessOperations>,
    program: String,
    extra_env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    work_dir: Option<PathBuf>,
    index_url: Option<String>,
    use_index: bool,
    pipfile: bool,
    chdir: bool,
}

impl ProjectInstanceBuilder {
    pub fn new(config: &Config, ops: Arc<dyn ProcessOperations>) -> Self {
        Self {
            ops,
            program: config.tool.program.clone(),
            extra_env: config.tool.extra_env.clone(),
            timeout: config.tool_timeout(),
            work_dir: config.paths.work_dir.clone(),
            index_url: config.index_simple_url(),
            use_index: true,
            pipfile: true,
            chdir: false,
        }
    }

    /// Create an empty `Pipfile` and point the tool at it (default: on)
    #[must_use]
    pub fn pipfile(mut self, enabled: bool) -> Self {
        self.pipfile = enabled;
        self
    }

    /// Run commands from inside the project directory (default: off)
    #[must_use]
    pub fn chdir(mut self, enabled: bool) -> Self {
        self.chdir = enabled;
        self
    }

    /// Resolve against the configured index mirror, if any (default: on)
    #[must_use]
    pub fn index_mirror(mut self, enabled: bool) -> Self {
        self.use_index = enabled;
        self
    }

    /// Create the project directory
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories or the initial
    /// `Pipfile` cannot be created.
    pub async fn create(self) -> Result<ProjectInstance, Error> {
        let mut dir_builder = tempfile::Builder::new();
        dir_builder.prefix("pipenv-").suffix("-project");
        let dir = match &self.work_dir {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io_with_path(&e, parent))?;
                dir_builder.tempdir_in(parent)?
            }
            None => dir_builder.tempdir()?,
        };
        let src_dir = tempfile::Builder::new()
            .prefix("pipenv-")
            .suffix("-src")
            .tempdir()?;

        let pipfile_path = if self.pipfile {
            let path = dir.path().join(PIPFILE);
            fs::write(&path, b"")
                .await
                .map_err(|e| Error::io_with_path(&e, &path))?;
            Some(path)
        } else {
            None
        };

        debug!(project = %dir.path().display(), chdir = self.chdir, "created project instance");

        Ok(ProjectInstance {
            dir,
            src_dir,
            ops: self.ops,
            program: self.program,
            extra_env: self.extra_env,
            timeout: self.timeout,
            index_url: if self.use_index { self.index_url } else { None },
            pipfile_path,
            chdir: self.chdir,
        })
    }
}

/// A disposable project the tool under test runs against
pub struct ProjectInstance {
    dir: TempDir,
    src_dir: TempDir,
    ops: Arc<dyn ProcessOperations>,
    program: String,
    extra_env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    index_url: Option<String>,
    pipfile_path: Option<PathBuf>,
    chdir: bool,
}

impl ProjectInstance {
    pub fn builder(config: &Config, ops: Arc<dyn ProcessOperations>) -> ProjectInstanceBuilder {
        ProjectInstanceBuilder::new(config, ops)
    }

    /// Project directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory editable VCS checkouts are cloned into (`PIP_SRC`)
    pub fn src_dir(&self) -> &Path {
        self.src_dir.path()
    }

    pub fn pipfile_path(&self) -> PathBuf {
        self.path().join(PIPFILE)
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.path().join(LOCKFILE)
    }

    pub fn index_url(&self) -> Option<&str> {
        self.index_url.as_deref()
    }

    pub fn ops(&self) -> &dyn ProcessOperations {
        self.ops.as_ref()
    }

    /// Run the tool with `args`
    ///
    /// A non-zero exit is not an error here; callers decide what to check.
    ///
    /// # Errors
    ///
    /// Returns an error if the per-invocation cache directory cannot be
    /// created or the process cannot be started or times out.
    pub async fn run<I, S>(&self, args: I) -> Result<CommandOutput, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cache_dir = tempfile::Builder::new()
            .prefix("pipenv-")
            .suffix("-cache")
            .tempdir()?;

        let mut cmd = self.ops.create_command(&self.program);
        cmd.args(args).timeout(self.timeout);

        for (key, value) in BASE_ENV {
            cmd.env(key, value);
        }
        match &self.pipfile_path {
            Some(path) => cmd.env("PIPENV_PIPFILE", path.to_string_lossy()),
            None => cmd.env_remove("PIPENV_PIPFILE"),
        };
        cmd.env("PIPENV_CACHE_DIR", cache_dir.path().to_string_lossy())
            .env("PIP_SRC", self.src_dir().to_string_lossy());
        match &self.index_url {
            Some(url) => cmd.env("PIPENV_TEST_INDEX", url.as_str()),
            None => cmd.env_remove("PIPENV_TEST_INDEX"),
        };
        for (key, value) in &self.extra_env {
            cmd.env(key.as_str(), value.as_str());
        }
        if self.chdir {
            cmd.current_dir(self.path());
        }

        let line = cmd.to_string();
        info!(project = %self.path().display(), "$ {line}");
        let output = self.ops.execute_command(cmd).await?;

        debug!(stdout = %output.stdout_lossy(), stderr = %output.stderr_lossy(), "$ {line}");
        if !output.success() {
            warn!(exit_code = ?output.return_code(), "command failed: {line}");
        }

        drop(cache_dir);
        Ok(output)
    }

    /// Raw manifest text
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Missing` if there is no `Pipfile`.
    pub async fn pipfile_raw(&self) -> Result<String, Error> {
        read_document(&self.pipfile_path(), PIPFILE).await
    }

    /// Parsed manifest
    ///
    /// # Errors
    ///
    /// Returns an error if the `Pipfile` is missing or unparsable.
    pub async fn pipfile(&self) -> Result<Pipfile, Error> {
        Pipfile::parse(&self.pipfile_raw().await?)
    }

    /// Parsed lock file
    ///
    /// # Errors
    ///
    /// Returns an error if `Pipfile.lock` is missing or unparsable.
    pub async fn lockfile(&self) -> Result<Lockfile, Error> {
        Lockfile::parse(&read_document(&self.lockfile_path(), LOCKFILE).await?)
    }

    /// Replace the manifest with `contents`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write_pipfile(&self, contents: &str) -> Result<(), Error> {
        let path = self.pipfile_path();
        fs::write(&path, contents)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))
    }

    /// Byte-level replace of every `from` in the manifest; returns the count
    ///
    /// # Errors
    ///
    /// Returns an error if the `Pipfile` cannot be read or written.
    pub async fn replace_in_pipfile(&self, from: &str, to: &str) -> Result<usize, Error> {
        let contents = self.pipfile_raw().await?;
        let count = contents.matches(from).count();
        if count > 0 {
            self.write_pipfile(&contents.replace(from, to)).await?;
        }
        Ok(count)
    }
}

async fn read_document(path: &Path, kind: &str) -> Result<String, Error> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DocumentError::Missing {
            kind: kind.to_string(),
            path: path.display().to_string(),
        }
        .into()),
        Err(e) => Err(Error::io_with_path(&e, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lockcheck_platform::PlatformCommand;
    use std::sync::Mutex;

    /// Records commands instead of running them
    #[derive(Default)]
    struct RecordingOps {
        commands: Mutex<Vec<PlatformCommand>>,
    }

    #[cfg(unix)]
    fn exit_status(code: i32) -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code << 8)
    }

    #[cfg(windows)]
    fn exit_status(code: i32) -> std::process::ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code as u32)
    }

    #[async_trait]
    impl ProcessOperations for RecordingOps {
        async fn execute_command(&self, cmd: PlatformCommand) -> Result<CommandOutput, Error> {
            // The cache dir must exist while the command runs
            let cache = PathBuf::from(&cmd.get_env_vars()["PIPENV_CACHE_DIR"]);
            assert!(cache.is_dir());
            self.commands.lock().unwrap().push(cmd);
            Ok(CommandOutput {
                status: exit_status(0),
                stdout: b"ok".to_vec(),
                stderr: Vec::new(),
            })
        }

        async fn which(&self, program: &str) -> Result<PathBuf, Error> {
            Ok(PathBuf::from(program))
        }
    }

    fn config_with_index() -> Config {
        let mut config = Config::default();
        config.index.url = Some("http://127.0.0.1:9999".to_string());
        config.tool.program = "fake-pipenv".to_string();
        config
            .tool
            .extra_env
            .insert("PIPENV_VERBOSITY".to_string(), "-1".to_string());
        config
    }

    #[tokio::test]
    async fn test_create_makes_empty_pipfile() {
        let ops = Arc::new(RecordingOps::default());
        let p = ProjectInstance::builder(&Config::default(), ops)
            .create()
            .await
            .unwrap();

        let dir_name = p.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(dir_name.starts_with("pipenv-"));
        assert!(dir_name.ends_with("-project"));
        assert_eq!(p.pipfile_raw().await.unwrap(), "");
        assert!(p.pipfile().await.unwrap().packages.is_empty());
    }

    #[tokio::test]
    async fn test_run_sets_isolated_environment() {
        let ops = Arc::new(RecordingOps::default());
        let p = ProjectInstance::builder(&config_with_index(), ops.clone())
            .chdir(true)
            .create()
            .await
            .unwrap();

        let output = p.run(["install", "gitdb2"]).await.unwrap();
        assert!(output.success());

        let commands = ops.commands.lock().unwrap();
        let cmd = &commands[0];
        assert_eq!(cmd.program(), "fake-pipenv");
        assert_eq!(cmd.get_args(), ["install", "gitdb2"]);
        assert_eq!(cmd.get_current_dir(), Some(p.path()));

        let env = cmd.get_env_vars();
        for (key, value) in BASE_ENV {
            assert_eq!(env[key], value);
        }
        assert_eq!(
            PathBuf::from(&env["PIPENV_PIPFILE"]),
            p.pipfile_path()
        );
        assert_eq!(PathBuf::from(&env["PIP_SRC"]), p.src_dir());
        assert_eq!(env["PIPENV_TEST_INDEX"], "http://127.0.0.1:9999/simple");
        assert_eq!(env["PIPENV_VERBOSITY"], "-1");
    }

    #[tokio::test]
    async fn test_cache_dir_is_fresh_per_invocation() {
        let ops = Arc::new(RecordingOps::default());
        let p = ProjectInstance::builder(&Config::default(), ops.clone())
            .create()
            .await
            .unwrap();

        p.run(["lock"]).await.unwrap();
        p.run(["lock"]).await.unwrap();

        let commands = ops.commands.lock().unwrap();
        let first = &commands[0].get_env_vars()["PIPENV_CACHE_DIR"];
        let second = &commands[1].get_env_vars()["PIPENV_CACHE_DIR"];
        assert_ne!(first, second);
        assert!(!Path::new(first).exists());
    }

    #[tokio::test]
    async fn test_without_pipfile_or_index() {
        let ops = Arc::new(RecordingOps::default());
        let p = ProjectInstance::builder(&config_with_index(), ops.clone())
            .pipfile(false)
            .index_mirror(false)
            .create()
            .await
            .unwrap();

        assert!(!p.pipfile_path().exists());
        assert_eq!(p.index_url(), None);
        p.run(["--version"]).await.unwrap();

        let commands = ops.commands.lock().unwrap();
        let cmd = &commands[0];
        assert!(cmd.get_current_dir().is_none());
        assert!(cmd.get_env_removals().iter().any(|k| k == "PIPENV_PIPFILE"));
        assert!(cmd.get_env_removals().iter().any(|k| k == "PIPENV_TEST_INDEX"));

        let err = p.pipfile().await.unwrap_err();
        assert!(matches!(err, Error::Document(DocumentError::Missing { .. })));
    }

    #[tokio::test]
    async fn test_missing_lockfile_is_reported() {
        let ops = Arc::new(RecordingOps::default());
        let p = ProjectInstance::builder(&Config::default(), ops)
            .create()
            .await
            .unwrap();

        let err = p.lockfile().await.unwrap_err();
        assert!(err.to_string().contains("Pipfile.lock not found"));
    }

    #[tokio::test]
    async fn test_replace_in_pipfile() {
        let ops = Arc::new(RecordingOps::default());
        let p = ProjectInstance::builder(&Config::default(), ops)
            .create()
            .await
            .unwrap();

        p.write_pipfile(
            "[packages]\nstructlog = {git = \"https://github.com/hynek/structlog.git\", ref = \"16.1.0\", editable = true}\n",
        )
        .await
        .unwrap();

        assert_eq!(p.replace_in_pipfile("16.1.0", "18.1.0").await.unwrap(), 1);
        assert_eq!(p.replace_in_pipfile("16.1.0", "18.1.0").await.unwrap(), 0);

        let pipfile = p.pipfile().await.unwrap();
        match &pipfile.packages["structlog"] {
            lockcheck_types::PackageEntry::Detailed(d) => {
                assert_eq!(d.reference.as_deref(), Some("18.1.0"));
            }
            other => panic!("unexpected entry {other:?}"),
        }
    }
}
