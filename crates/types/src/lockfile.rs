//! `Pipfile.lock` types

use indexmap::IndexMap;
use lockcheck_errors::{DocumentError, Error};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed lock file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(rename = "_meta", default)]
    pub meta: LockMeta,
    #[serde(default)]
    pub default: IndexMap<String, LockedPackage>,
    #[serde(default)]
    pub develop: IndexMap<String, LockedPackage>,
}

/// `_meta` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockMeta {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub hash: Map<String, Value>,
    #[serde(
        default,
        rename = "pipfile-spec",
        skip_serializing_if = "Option::is_none"
    )]
    pub pipfile_spec: Option<u32>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub requires: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<LockSource>,
}

/// Source recorded in `_meta.sources`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub verify_ssl: bool,
}

/// One resolved package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockedPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Vec<String>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Lockfile {
    /// Parse lock file text
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Parse` if the text is not valid JSON or does
    /// not match the lock file layout.
    pub fn parse(contents: &str) -> Result<Self, Error> {
        serde_json::from_str(contents).map_err(|e| {
            DocumentError::Parse {
                kind: "Pipfile.lock".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

impl LockedPackage {
    /// Whether the entry carries `field`
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        match field {
            "version" => self.version.is_some(),
            "git" => self.git.is_some(),
            "ref" => self.reference.is_some(),
            "editable" => self.editable.is_some(),
            "file" => self.file.is_some(),
            "path" => self.path.is_some(),
            "index" => self.index.is_some(),
            "hashes" => self.hashes.is_some(),
            "markers" => self.markers.is_some(),
            "extras" => self.extras.is_some(),
            other => self.other.contains_key(other),
        }
    }

    #[must_use]
    pub fn is_vcs(&self) -> bool {
        ["git", "hg", "svn", "bzr"].iter().any(|f| self.has_field(f))
    }

    /// The entry as a JSON object, exactly the keys the tool wrote
    #[must_use]
    pub fn as_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
