//! Install requirement specifiers
//!
//! Classifies the arguments handed to `install`: VCS URLs, archive/wheel URLs,
//! local paths and plain named requirements.

use lockcheck_errors::DocumentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version control systems understood in `<vcs>+<url>` requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Git,
    Hg,
    Svn,
    Bzr,
}

impl VcsKind {
    /// The scheme prefix, also the key the manifest stores the URL under
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Hg => "hg",
            Self::Svn => "svn",
            Self::Bzr => "bzr",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "git" => Some(Self::Git),
            "hg" => Some(Self::Hg),
            "svn" => Some(Self::Svn),
            "bzr" => Some(Self::Bzr),
            _ => None,
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requirement as passed on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Requirement {
    /// `git+https://host/repo.git@rev#egg=name`
    Vcs {
        vcs: VcsKind,
        url: String,
        revision: Option<String>,
        egg: Option<String>,
    },
    /// Remote or `file://` archive/wheel
    File { url: String, egg: Option<String> },
    /// Local directory or archive path
    Path { path: String },
    /// `name`, `name==1.0`, `name[extra]>=2`
    Named {
        name: String,
        specifier: Option<String>,
    },
}

const VERSION_OPERATORS: [&str; 8] = ["===", "==", ">=", "<=", "!=", "~=", ">", "<"];

impl Requirement {
    /// Parse a requirement string
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidRequirement` if the string is empty, a
    /// VCS URL lacks a location, or a named requirement has an invalid name.
    pub fn parse(s: &str) -> Result<Self, DocumentError> {
        let input = s.trim();
        if input.is_empty() {
            return Err(invalid(s, "empty requirement"));
        }

        if let Some(req) = Self::parse_vcs(input)? {
            return Ok(req);
        }

        if ["http://", "https://", "file://"]
            .iter()
            .any(|scheme| input.starts_with(scheme))
        {
            let (url, fragment) = split_fragment(input);
            return Ok(Self::File {
                url: url.to_string(),
                egg: fragment.and_then(egg_from_fragment),
            });
        }

        if is_path_like(input) {
            return Ok(Self::Path {
                path: input.to_string(),
            });
        }

        Self::parse_named(input)
    }

    // The `+` and a location are both required: `gitdb2` or `git-lfs` are
    // ordinary package names, not VCS requirements.
    fn parse_vcs(input: &str) -> Result<Option<Self>, DocumentError> {
        let Some((prefix, rest)) = input.split_once('+') else {
            return Ok(None);
        };
        let Some(vcs) = VcsKind::from_prefix(prefix) else {
            return Ok(None);
        };
        if !(rest.contains("://") || rest.starts_with("git@")) {
            return Ok(None);
        }

        let (location, fragment) = split_fragment(rest);
        let (url, revision) = split_revision(location);
        if url.is_empty() || url.ends_with("://") {
            return Err(invalid(input, "VCS requirement has no repository location"));
        }

        Ok(Some(Self::Vcs {
            vcs,
            url: url.to_string(),
            revision: revision.map(str::to_string),
            egg: fragment.and_then(egg_from_fragment),
        }))
    }

    fn parse_named(input: &str) -> Result<Self, DocumentError> {
        let cut = VERSION_OPERATORS
            .iter()
            .filter_map(|op| input.find(op))
            .chain(input.find('['))
            .chain(input.find(';'))
            .min();

        let (name, specifier) = match cut {
            Some(pos) => (input[..pos].trim(), Some(input[pos..].trim())),
            None => (input, None),
        };

        if name.is_empty() {
            return Err(invalid(input, "missing package name"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid(input, "package name contains invalid characters"));
        }

        Ok(Self::Named {
            name: name.to_string(),
            specifier: specifier.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }

    /// Whether the requirement points at a version control repository
    #[must_use]
    pub fn is_vcs(&self) -> bool {
        matches!(self, Self::Vcs { .. })
    }

    /// Package name the tool is expected to record, when it can be derived
    ///
    /// Local paths return `None`: the tool derives their key itself.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        match self {
            Self::Vcs { egg, .. } => egg.clone(),
            Self::File { url, egg } => egg.clone().or_else(|| wheel_name(url)),
            Self::Path { .. } => None,
            Self::Named { name, .. } => Some(name.clone()),
        }
    }
}

impl FromStr for Requirement {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vcs {
                vcs,
                url,
                revision,
                egg,
            } => {
                write!(f, "{vcs}+{url}")?;
                if let Some(rev) = revision {
                    write!(f, "@{rev}")?;
                }
                if let Some(egg) = egg {
                    write!(f, "#egg={egg}")?;
                }
                Ok(())
            }
            Self::File { url, egg } => match egg {
                Some(egg) => write!(f, "{url}#egg={egg}"),
                None => f.write_str(url),
            },
            Self::Path { path } => f.write_str(path),
            Self::Named { name, specifier } => {
                write!(f, "{name}{}", specifier.as_deref().unwrap_or(""))
            }
        }
    }
}

fn invalid(input: &str, reason: &str) -> DocumentError {
    DocumentError::InvalidRequirement {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

fn split_fragment(s: &str) -> (&str, Option<&str>) {
    match s.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (s, None),
    }
}

fn egg_from_fragment(fragment: &str) -> Option<String> {
    fragment
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "egg")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

// `@rev` only counts inside the path; `ssh://git@host/...` carries user info.
fn split_revision(location: &str) -> (&str, Option<&str>) {
    let path_start = if let Some(idx) = location.find("://") {
        let after = idx + 3;
        location[after..]
            .find('/')
            .map_or(location.len(), |slash| after + slash)
    } else {
        location.find(':').map_or(0, |colon| colon + 1)
    };

    match location[path_start..].rfind('@') {
        Some(at) => {
            let at = path_start + at;
            let rev = &location[at + 1..];
            if rev.is_empty() {
                (&location[..at], None)
            } else {
                (&location[..at], Some(rev))
            }
        }
        None => (location, None),
    }
}

fn is_path_like(input: &str) -> bool {
    input == "."
        || input.starts_with("./")
        || input.starts_with("../")
        || input.starts_with('/')
        || input.starts_with('~')
        || input.starts_with(".\\")
        || (input.len() > 2 && input.as_bytes()[1] == b':' && input.as_bytes()[0].is_ascii_alphabetic())
}

fn wheel_name(url: &str) -> Option<String> {
    let file = url.rsplit('/').next()?;
    let stem = file.strip_suffix(".whl")?;
    stem.split('-').next().map(str::to_string)
}

/// Builder for `install` argument vectors
#[derive(Debug, Clone, Default)]
pub struct InstallArgs {
    args: Vec<String>,
}

impl InstallArgs {
    #[must_use]
    pub fn new() -> Self {
        Self {
            args: vec!["install".to_string()],
        }
    }

    /// Install a requirement in editable (`-e`) mode
    #[must_use]
    pub fn editable(mut self, req: &Requirement) -> Self {
        self.args.push("-e".to_string());
        self.args.push(req.to_string());
        self
    }

    #[must_use]
    pub fn package(mut self, req: &Requirement) -> Self {
        self.args.push(req.to_string());
        self
    }

    /// Install everything listed in a requirements file (`-r`)
    #[must_use]
    pub fn requirements(mut self, location: impl Into<String>) -> Self {
        self.args.push("-r".to_string());
        self.args.push(location.into());
        self
    }

    /// Resolve from the named `[[source]]` (`--index`)
    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.args.push("--index".to_string());
        self.args.push(name.into());
        self
    }

    #[must_use]
    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}
