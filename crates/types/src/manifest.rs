//! `Pipfile` manifest types
//!
//! Only the parts the harness inspects are typed; anything else the tool
//! writes is kept in flattened maps so a read/write cycle does not lose it.

use indexmap::IndexMap;
use lockcheck_errors::{DocumentError, Error};
use serde::{Deserialize, Serialize};

/// Parsed `Pipfile`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<Source>,
    #[serde(default)]
    pub packages: IndexMap<String, PackageEntry>,
    #[serde(default, rename = "dev-packages")]
    pub dev_packages: IndexMap<String, PackageEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Requires>,
    /// `[scripts]`, `[pipenv]` and other sections the harness does not inspect
    #[serde(flatten)]
    pub other: IndexMap<String, toml::Value>,
}

/// `[[source]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

/// `[requires]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requires {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_full_version: Option<String>,
}

/// A package specifier: `six = "*"` or `six = { git = "...", editable = true }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageEntry {
    Version(String),
    Detailed(DetailedEntry),
}

/// Table form of a package specifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    #[serde(flatten)]
    pub other: IndexMap<String, toml::Value>,
}

fn default_verify_ssl() -> bool {
    true
}

impl Pipfile {
    /// Parse manifest text
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Parse` if the text is not valid TOML or does
    /// not match the manifest layout.
    pub fn parse(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents).map_err(|e| {
            DocumentError::Parse {
                kind: "Pipfile".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Serialize back to TOML
    ///
    /// # Errors
    ///
    /// Returns an error if a flattened value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string(self).map_err(|e| Error::internal(format!("Pipfile serialization: {e}")))
    }

    /// Look up a `[[source]]` by name
    #[must_use]
    pub fn source_named(&self, name: &str) -> Option<&Source> {
        self.source.iter().find(|s| s.name == name)
    }
}

impl PackageEntry {
    /// Whether the table form carries `field`
    ///
    /// The plain version-string form has no fields.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        match self {
            Self::Version(_) => false,
            Self::Detailed(d) => match field {
                "version" => d.version.is_some(),
                "git" => d.git.is_some(),
                "ref" => d.reference.is_some(),
                "file" => d.file.is_some(),
                "path" => d.path.is_some(),
                "editable" => d.editable.is_some(),
                "index" => d.index.is_some(),
                "extras" => !d.extras.is_empty(),
                other => d.other.contains_key(other),
            },
        }
    }

    /// The version string, from either form
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Version(v) => Some(v),
            Self::Detailed(d) => d.version.as_deref(),
        }
    }

    #[must_use]
    pub fn git(&self) -> Option<&str> {
        match self {
            Self::Version(_) => None,
            Self::Detailed(d) => d.git.as_deref(),
        }
    }

    #[must_use]
    pub fn is_vcs(&self) -> bool {
        ["git", "hg", "svn", "bzr"].iter().any(|f| self.has_field(f))
    }

    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Detailed(d) if d.editable == Some(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SOURCES: &str = r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[[source]]
url = "https://test.pypi.org/simple"
verify_ssl = true
name = "testpypi"

[packages]
six = "*"

[dev-packages]
"#;

    #[test]
    fn test_parse_sources_and_plain_versions() {
        let pipfile = Pipfile::parse(TWO_SOURCES).unwrap();
        assert_eq!(pipfile.source.len(), 2);
        assert_eq!(
            pipfile.source_named("testpypi").unwrap().url,
            "https://test.pypi.org/simple"
        );
        assert_eq!(pipfile.packages["six"], PackageEntry::Version("*".to_string()));
        assert!(pipfile.dev_packages.is_empty());
    }

    #[test]
    fn test_parse_table_entries() {
        let pipfile = Pipfile::parse(
            r#"
[packages]
structlog = { git = "https://github.com/hynek/structlog.git", ref = "16.1.0", editable = true }
gitdb2 = "*"
e1839a8 = { path = "./six", editable = true }
records = "==0.5.2"

[requires]
python_version = "3.11"

[pipenv]
allow_prereleases = false
"#,
        )
        .unwrap();

        let structlog = &pipfile.packages["structlog"];
        assert!(structlog.is_vcs());
        assert!(structlog.is_editable());
        assert!(structlog.has_field("ref"));
        assert_eq!(structlog.git(), Some("https://github.com/hynek/structlog.git"));

        assert!(!pipfile.packages["gitdb2"].is_vcs());
        assert!(pipfile.packages["e1839a8"].has_field("path"));
        assert_eq!(pipfile.packages["records"].version(), Some("==0.5.2"));
        assert_eq!(
            pipfile.requires.as_ref().and_then(|r| r.python_version.as_deref()),
            Some("3.11")
        );
        assert!(pipfile.other.contains_key("pipenv"));

        // Document order is preserved
        let keys: Vec<&str> = pipfile.packages.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["structlog", "gitdb2", "e1839a8", "records"]);
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let pipfile = Pipfile::parse(
            r#"
[packages]
django = { version = "*", markers = "python_version >= '3'" }
"#,
        )
        .unwrap();
        assert!(pipfile.packages["django"].has_field("markers"));

        let reparsed = Pipfile::parse(&pipfile.to_toml_string().unwrap()).unwrap();
        assert_eq!(reparsed, pipfile);
    }

    #[test]
    fn test_empty_manifest() {
        let pipfile = Pipfile::parse("").unwrap();
        assert!(pipfile.packages.is_empty());
        assert!(pipfile.source.is_empty());
    }

    #[test]
    fn test_invalid_manifest() {
        let err = Pipfile::parse("[packages\nsix = 1").unwrap_err();
        assert!(err.to_string().contains("Pipfile"));
    }
}
