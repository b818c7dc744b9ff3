//! Built-in scenario catalogue

mod install_uri;

pub use install_uri::{
    BasicVcsInstall, EditableVcsInstall, FileUrlsWork, GetVcsRefs, InstallEditableGitTag,
    InstallLocalVcsNotInLockfile, InstallNamedIndexAlias, InstallRemoteRequirements,
    LocalVcsUrlsWork, UrlsWork,
};

use crate::scenario::Scenario;

/// Every built-in scenario, in reporting order
#[must_use]
pub fn all() -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(BasicVcsInstall),
        Box::new(UrlsWork),
        Box::new(FileUrlsWork),
        Box::new(LocalVcsUrlsWork),
        Box::new(InstallRemoteRequirements),
        Box::new(EditableVcsInstall),
        Box::new(InstallEditableGitTag),
        Box::new(InstallNamedIndexAlias),
        Box::new(InstallLocalVcsNotInLockfile),
        Box::new(GetVcsRefs),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockcheck_types::Marker;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let scenarios = all();
        let names: HashSet<_> = scenarios.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), scenarios.len());
        assert_eq!(scenarios.len(), 10);
    }

    #[test]
    fn test_markers_and_flakiness() {
        let scenarios = all();
        let find = |name: &str| {
            scenarios
                .iter()
                .find(|s| s.name() == name)
                .unwrap_or_else(|| panic!("{name} missing"))
        };

        let file_urls = find("file_urls_work");
        assert!(!file_urls.needs_network());
        assert!(file_urls.has_marker(Marker::Files));
        assert_eq!(
            file_urls.requires(),
            ["pypi/six/six-1.11.0-py2.py3-none-any.whl"]
        );

        let tag = find("install_editable_git_tag");
        assert!(tag.flaky());
        assert!(tag.has_marker(Marker::Tablib));

        assert!(find("editable_vcs_install").has_marker(Marker::Editable));
        assert!(find("install_named_index_alias").has_marker(Marker::Index));
        assert!(!find("get_vcs_refs").flaky());

        let flaky: Vec<_> = scenarios
            .iter()
            .filter(|s| s.flaky())
            .map(|s| s.name())
            .collect();
        assert_eq!(
            flaky,
            [
                "basic_vcs_install",
                "urls_work",
                "install_remote_requirements",
                "editable_vcs_install",
                "install_editable_git_tag"
            ]
        );

        // Everything except the local wheel install reaches the network
        assert_eq!(scenarios.iter().filter(|s| s.needs_network()).count(), 9);
    }
}
