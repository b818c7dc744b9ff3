#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for lockcheck
//!
//! This crate models what the harness reads and writes around the tool under
//! test: install requirement specifiers, the `Pipfile` manifest, the
//! `Pipfile.lock` lock file and the markers scenarios are tagged with.

pub mod lockfile;
pub mod manifest;
pub mod marker;
pub mod requirement;

// Re-export commonly used types
pub use indexmap::IndexMap;
pub use lockfile::{LockMeta, LockSource, LockedPackage, Lockfile};
pub use manifest::{DetailedEntry, PackageEntry, Pipfile, Requires, Source};
pub use marker::Marker;
pub use requirement::{InstallArgs, Requirement, VcsKind};

/// File name of the project manifest
pub const PIPFILE: &str = "Pipfile";

/// File name of the lock file written next to the manifest
pub const LOCKFILE: &str = "Pipfile.lock";

/// Normalize a distribution name the way package indexes compare them
///
/// Lowercases and collapses runs of `-`, `_` and `.` into a single `-`.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('-');
        }
        pending_sep = false;
        out.extend(ch.to_lowercase());
    }
    out
}

/// Look up `name` in a package table, falling back to canonical-name comparison
pub fn find_package<'a, V>(table: &'a IndexMap<String, V>, name: &str) -> Option<(&'a str, &'a V)> {
    if let Some((key, value)) = table.get_key_value(name) {
        return Some((key.as_str(), value));
    }
    let wanted = canonical_name(name);
    table
        .iter()
        .find(|(key, _)| canonical_name(key) == wanted)
        .map(|(key, value)| (key.as_str(), value))
}
