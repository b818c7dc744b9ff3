//! Result-returning assertions for scenarios
//!
//! Failures carry enough of the document to diagnose them from a report
//! without re-running the scenario.

use lockcheck_errors::CheckError;
use lockcheck_platform::CommandOutput;
use lockcheck_types::{find_package, IndexMap, LockedPackage, PackageEntry};
use std::fmt::Debug;

/// Section label for `[packages]` in the manifest
pub const PACKAGES: &str = "Pipfile [packages]";

/// Section label for `default` in the lock file
pub const LOCK_DEFAULT: &str = "Pipfile.lock default";

/// Keyed field lookup shared by manifest and lock file entries
pub trait HasFields {
    fn has_field(&self, field: &str) -> bool;
}

impl HasFields for PackageEntry {
    fn has_field(&self, field: &str) -> bool {
        PackageEntry::has_field(self, field)
    }
}

impl HasFields for LockedPackage {
    fn has_field(&self, field: &str) -> bool {
        LockedPackage::has_field(self, field)
    }
}

/// The command exited zero
///
/// # Errors
///
/// Returns `CheckError::UnexpectedExit` with the captured output otherwise.
pub fn exit_ok(output: &CommandOutput, command: &str) -> Result<(), CheckError> {
    if output.success() {
        return Ok(());
    }
    Err(CheckError::UnexpectedExit {
        command: command.to_string(),
        code: output.return_code(),
        stdout: output.stdout_lossy(),
        stderr: output.stderr_lossy(),
    })
}

/// `name` is present in `table`; returns its entry
///
/// # Errors
///
/// Returns `CheckError::MissingKey` listing the keys that are present.
pub fn contains<'a, V>(
    section: &str,
    table: &'a IndexMap<String, V>,
    name: &str,
) -> Result<&'a V, CheckError> {
    find_package(table, name)
        .map(|(_, value)| value)
        .ok_or_else(|| CheckError::MissingKey {
            section: section.to_string(),
            key: name.to_string(),
            present: keys(table),
        })
}

/// `key` is present in `table` exactly as spelled
///
/// Keys the tool derives itself must match between documents byte for byte.
///
/// # Errors
///
/// Returns `CheckError::MissingKey` listing the keys that are present.
pub fn contains_exact<'a, V>(
    section: &str,
    table: &'a IndexMap<String, V>,
    key: &str,
) -> Result<&'a V, CheckError> {
    table.get(key).ok_or_else(|| CheckError::MissingKey {
        section: section.to_string(),
        key: key.to_string(),
        present: keys(table),
    })
}

/// `name` is not present in `table`, under any spelling
///
/// # Errors
///
/// Returns `CheckError::UnexpectedKey` if it is.
pub fn absent<V>(section: &str, table: &IndexMap<String, V>, name: &str) -> Result<(), CheckError> {
    match find_package(table, name) {
        None => Ok(()),
        Some((key, _)) => Err(CheckError::UnexpectedKey {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// First entry of `table` in document order
///
/// # Errors
///
/// Returns `CheckError::MissingKey` if the section is empty.
pub fn first<'a, V>(
    section: &str,
    table: &'a IndexMap<String, V>,
) -> Result<(&'a str, &'a V), CheckError> {
    table
        .first()
        .map(|(key, value)| (key.as_str(), value))
        .ok_or_else(|| CheckError::MissingKey {
            section: section.to_string(),
            key: "<any package>".to_string(),
            present: String::new(),
        })
}

/// `entry` carries `field`
///
/// # Errors
///
/// Returns `CheckError::MissingKey` naming the entry otherwise.
pub fn has_field<E: HasFields + Debug>(
    location: &str,
    entry: &E,
    field: &str,
) -> Result<(), CheckError> {
    if entry.has_field(field) {
        Ok(())
    } else {
        Err(CheckError::MissingKey {
            section: location.to_string(),
            key: field.to_string(),
            present: format!("{entry:?}"),
        })
    }
}

/// `entry` does not carry `field`
///
/// # Errors
///
/// Returns `CheckError::UnexpectedKey` otherwise.
pub fn lacks_field<E: HasFields>(location: &str, entry: &E, field: &str) -> Result<(), CheckError> {
    if entry.has_field(field) {
        Err(CheckError::UnexpectedKey {
            section: location.to_string(),
            key: field.to_string(),
        })
    } else {
        Ok(())
    }
}

/// `actual == expected`
///
/// # Errors
///
/// Returns `CheckError::ValueMismatch` otherwise.
pub fn equals<T: PartialEq + Debug + ?Sized>(
    location: &str,
    expected: &T,
    actual: &T,
) -> Result<(), CheckError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CheckError::ValueMismatch {
            location: location.to_string(),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        })
    }
}

/// A text substitution touched at least one occurrence of `pattern`
///
/// # Errors
///
/// Returns `CheckError::ValueMismatch` when nothing was replaced.
pub fn replaced(location: &str, pattern: &str, count: usize) -> Result<(), CheckError> {
    if count > 0 {
        Ok(())
    } else {
        Err(CheckError::ValueMismatch {
            location: location.to_string(),
            expected: format!("at least one occurrence of {pattern:?}"),
            actual: "none".to_string(),
        })
    }
}

fn keys<V>(table: &IndexMap<String, V>) -> String {
    table.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}
