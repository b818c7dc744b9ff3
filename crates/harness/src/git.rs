//! Git helpers for scenarios that need a local checkout

use lockcheck_errors::{Error, PlatformError};
use lockcheck_platform::ProcessOperations;
use std::path::Path;
use tracing::info;
use url::Url;

/// `git clone <url> <dest>`
///
/// # Errors
///
/// Returns `PlatformError::CommandFailed` if git exits non-zero, or the
/// underlying error if git cannot be started.
pub async fn clone(ops: &dyn ProcessOperations, url: &str, dest: &Path) -> Result<(), Error> {
    let mut cmd = ops.create_command("git");
    cmd.arg("clone")
        .arg(url)
        .arg(dest.to_string_lossy())
        .env("GIT_TERMINAL_PROMPT", "0");
    let line = cmd.to_string();

    info!("$ {line}");
    let output = ops.execute_command(cmd).await?;
    if output.success() {
        Ok(())
    } else {
        Err(PlatformError::CommandFailed {
            command: line,
            code: output.return_code(),
            stderr: tail(&output.stderr_lossy(), 20),
        }
        .into())
    }
}

/// `file://` URI for a local path, made absolute first
///
/// # Errors
///
/// Returns an error if the current directory is unavailable or the path
/// cannot be expressed as a URL.
pub fn file_uri(path: &Path) -> Result<String, Error> {
    let absolute = std::path::absolute(path).map_err(|e| Error::io_with_path(&e, path))?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| Error::internal(format!("cannot build file URI for {}", absolute.display())))
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_file_uri() {
        let uri = file_uri(Path::new("/tmp/project/six")).unwrap();
        assert_eq!(uri, "file:///tmp/project/six");

        let spaced = file_uri(Path::new("/tmp/with space/six-1.11.0-py2.py3-none-any.whl")).unwrap();
        assert_eq!(
            spaced,
            "file:///tmp/with%20space/six-1.11.0-py2.py3-none-any.whl"
        );
    }

    #[test]
    fn test_relative_paths_are_made_absolute() {
        let uri = file_uri(Path::new("six")).unwrap();
        assert!(uri.starts_with("file://"));
        assert!(uri.ends_with("/six"));
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc", 2), "b\nc");
        assert_eq!(tail("a", 5), "a");
        assert_eq!(tail("", 5), "");
    }
}
