//! Installing from URIs: VCS repositories, archives, wheels, requirements
//! files and named indexes

use async_trait::async_trait;
use lockcheck_errors::Error;
use lockcheck_platform::CommandOutput;
use lockcheck_types::{canonical_name, InstallArgs, Marker, Requirement};
use tokio::fs;
use tracing::debug;

use crate::check::{self, LOCK_DEFAULT, PACKAGES};
use crate::git;
use crate::instance::ProjectInstance;
use crate::scenario::{Scenario, ScenarioContext};

const SIX_REPO: &str = "https://github.com/benjaminp/six.git";
const SIX_VCS: &str = "git+https://github.com/benjaminp/six.git#egg=six";
const SIX_VCS_TAG: &str = "git+https://github.com/benjaminp/six.git@1.11.0#egg=six";
const SIX_WHEEL: &str = "pypi/six/six-1.11.0-py2.py3-none-any.whl";
const REQUESTS_VCS: &str = "git+https://github.com/requests/requests.git#egg=requests";
const STRUCTLOG_VCS: &str = "git+https://github.com/hynek/structlog.git@16.1.0#egg=structlog";
const STRUCTLOG_16_1_0: &str = "a39f6906a268fb2f4c365042b31d0200468fb492";
const STRUCTLOG_18_1_0: &str = "a73fbd3a9c3cafb11f43168582083f839b883034";
const DJANGO_CMS_ZIP: &str = "https://github.com/divio/django-cms/archive/release/3.4.x.zip";
const REMOTE_REQUIREMENTS: &str = "https://raw.githubusercontent.com/kennethreitz/pipenv/3688148ac7cfecefb085c474b092c31d791952c1/tests/test_artifacts/requirements.txt";

const NAMED_INDEX_PIPFILE: &str = r#"[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[[source]]
url = "https://test.pypi.org/simple"
verify_ssl = true
name = "testpypi"

[packages]
six = "*"

[dev-packages]"#;

/// Run the tool and require a zero exit
async fn succeed(p: &ProjectInstance, args: Vec<String>) -> Result<CommandOutput, Error> {
    let line = args.join(" ");
    let output = p.run(&args).await?;
    check::exit_ok(&output, &line)?;
    Ok(output)
}

fn install(req: &Requirement) -> Vec<String> {
    InstallArgs::new().package(req).into_args()
}

fn install_editable(req: &Requirement) -> Vec<String> {
    InstallArgs::new().editable(req).into_args()
}

pub struct BasicVcsInstall;

#[async_trait]
impl Scenario for BasicVcsInstall {
    fn name(&self) -> &'static str {
        "basic_vcs_install"
    }

    fn description(&self) -> &'static str {
        "git+https install next to a package whose name starts with a VCS prefix"
    }

    fn markers(&self) -> &'static [Marker] {
        &[Marker::Vcs, Marker::Install, Marker::NeedsInternet]
    }

    fn flaky(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx.project().chdir(true).create().await?;
        let six = Requirement::parse(SIX_VCS)?;
        let gitdb2 = Requirement::parse("gitdb2")?;

        succeed(&p, install(&six)).await?;
        succeed(&p, install(&gitdb2)).await?;

        let pipfile = p.pipfile().await?;
        let six_entry = check::contains(PACKAGES, &pipfile.packages, "six")?;
        check::contains(PACKAGES, &pipfile.packages, "gitdb2")?;
        check::has_field("Pipfile six", six_entry, "git")?;

        let lock = p.lockfile().await?;
        let locked_six = check::contains(LOCK_DEFAULT, &lock.default, "six")?;
        check::equals("Pipfile.lock six.git", &Some(SIX_REPO), &locked_six.git.as_deref())?;
        let locked_gitdb2 = check::contains(LOCK_DEFAULT, &lock.default, "gitdb2")?;
        check::lacks_field("Pipfile.lock gitdb2", locked_gitdb2, "git")?;
        Ok(())
    }
}

pub struct UrlsWork;

#[async_trait]
impl Scenario for UrlsWork {
    fn name(&self) -> &'static str {
        "urls_work"
    }

    fn description(&self) -> &'static str {
        "install a remote release archive"
    }

    fn markers(&self) -> &'static [Marker] {
        &[Marker::Files, Marker::Urls, Marker::NeedsInternet]
    }

    fn flaky(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx.project().create().await?;
        succeed(&p, install(&Requirement::parse(DJANGO_CMS_ZIP)?)).await?;

        let pipfile = p.pipfile().await?;
        let (key, dep) = check::first(PACKAGES, &pipfile.packages)?;
        check::has_field(&format!("Pipfile {key}"), dep, "file")?;

        let lock = p.lockfile().await?;
        let (key, dep) = check::first(LOCK_DEFAULT, &lock.default)?;
        check::has_field(&format!("Pipfile.lock {key}"), dep, "file")?;
        Ok(())
    }
}

pub struct FileUrlsWork;

#[async_trait]
impl Scenario for FileUrlsWork {
    fn name(&self) -> &'static str {
        "file_urls_work"
    }

    fn description(&self) -> &'static str {
        "install a local wheel through a file:// URI"
    }

    fn markers(&self) -> &'static [Marker] {
        &[Marker::Files, Marker::Urls]
    }

    fn requires(&self) -> &'static [&'static str] {
        &[SIX_WHEEL]
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let wheel = ctx.fixture(SIX_WHEEL);
        if fs::metadata(&wheel).await.is_err() {
            return Err(Error::skipped(format!(
                "wheel fixture not found at {}",
                wheel.display()
            )));
        }
        let wheel = fs::canonicalize(&wheel)
            .await
            .map_err(|e| Error::io_with_path(&e, &wheel))?;
        let uri = git::file_uri(&wheel)?;
        debug!(%uri, "installing wheel fixture");

        let p = ctx
            .project()
            .chdir(true)
            .index_mirror(false)
            .create()
            .await?;
        succeed(&p, install(&Requirement::parse(&uri)?)).await?;

        let pipfile = p.pipfile().await?;
        let six = check::contains(PACKAGES, &pipfile.packages, "six")?;
        check::has_field("Pipfile six", six, "file")?;
        Ok(())
    }
}

pub struct LocalVcsUrlsWork;

#[async_trait]
impl Scenario for LocalVcsUrlsWork {
    fn name(&self) -> &'static str {
        "local_vcs_urls_work"
    }

    fn description(&self) -> &'static str {
        "install from a git+file:// URI pointing at a local clone"
    }

    fn markers(&self) -> &'static [Marker] {
        &[Marker::Files, Marker::Urls, Marker::NeedsInternet]
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx.project().chdir(true).create().await?;
        let six_path = p.path().join("six");
        git::clone(ctx.ops(), SIX_REPO, &six_path).await?;

        let req = Requirement::parse(&format!("git+{}#egg=six", git::file_uri(&six_path)?))?;
        succeed(&p, install(&req)).await?;
        Ok(())
    }
}

pub struct InstallRemoteRequirements;

#[async_trait]
impl Scenario for InstallRemoteRequirements {
    fn name(&self) -> &'static str {
        "install_remote_requirements"
    }

    fn description(&self) -> &'static str {
        "install -r from a requirements file served over https"
    }

    fn markers(&self) -> &'static [Marker] {
        &[Marker::Files, Marker::Urls, Marker::NeedsInternet]
    }

    fn flaky(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx.project().create().await?;
        succeed(
            &p,
            InstallArgs::new()
                .requirements(REMOTE_REQUIREMENTS)
                .into_args(),
        )
        .await?;

        let pipfile = p.pipfile().await?;
        for (name, pinned) in [("requests", "==2.18.4"), ("records", "==0.5.2")] {
            let entry = check::contains(PACKAGES, &pipfile.packages, name)?;
            check::equals(&format!("Pipfile {name}"), &Some(pinned), &entry.version())?;
        }

        let lock = p.lockfile().await?;
        check::contains(LOCK_DEFAULT, &lock.default, "requests")?;
        check::contains(LOCK_DEFAULT, &lock.default, "records")?;
        Ok(())
    }
}

pub struct EditableVcsInstall;

#[async_trait]
impl Scenario for EditableVcsInstall {
    fn name(&self) -> &'static str {
        "editable_vcs_install"
    }

    fn description(&self) -> &'static str {
        "editable git install locks the package and its dependencies"
    }

    fn markers(&self) -> &'static [Marker] {
        &[
            Marker::Editable,
            Marker::Vcs,
            Marker::Install,
            Marker::NeedsInternet,
        ]
    }

    fn flaky(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx.project().create().await?;
        succeed(&p, install_editable(&Requirement::parse(REQUESTS_VCS)?)).await?;

        let pipfile = p.pipfile().await?;
        let requests = check::contains(PACKAGES, &pipfile.packages, "requests")?;
        check::has_field("Pipfile requests", requests, "git")?;
        check::has_field("Pipfile requests", requests, "editable")?;

        let lock = p.lockfile().await?;
        let locked = check::contains(LOCK_DEFAULT, &lock.default, "requests")?;
        check::has_field("Pipfile.lock requests", locked, "editable")?;
        for dependency in ["chardet", "idna", "urllib3", "certifi"] {
            check::contains(LOCK_DEFAULT, &lock.default, dependency)?;
        }
        Ok(())
    }
}

pub struct InstallEditableGitTag;

#[async_trait]
impl Scenario for InstallEditableGitTag {
    fn name(&self) -> &'static str {
        "install_editable_git_tag"
    }

    fn description(&self) -> &'static str {
        "editable git install pinned to a tag records the resolved ref"
    }

    fn markers(&self) -> &'static [Marker] {
        &[
            Marker::Install,
            Marker::Vcs,
            Marker::Tablib,
            Marker::NeedsInternet,
        ]
    }

    fn flaky(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx.project().create().await?;
        let six = Requirement::parse(SIX_VCS_TAG)?;
        succeed(&p, install_editable(&six)).await?;

        let pipfile = p.pipfile().await?;
        check::contains(PACKAGES, &pipfile.packages, "six")?;

        let lock = p.lockfile().await?;
        let locked = check::contains(LOCK_DEFAULT, &lock.default, "six")?;
        check::has_field("Pipfile.lock six", locked, "git")?;
        check::equals("Pipfile.lock six.git", &Some(SIX_REPO), &locked.git.as_deref())?;
        check::has_field("Pipfile.lock six", locked, "ref")?;
        Ok(())
    }
}

pub struct InstallNamedIndexAlias;

#[async_trait]
impl Scenario for InstallNamedIndexAlias {
    fn name(&self) -> &'static str {
        "install_named_index_alias"
    }

    fn description(&self) -> &'static str {
        "install --index <name> resolves against a named [[source]]"
    }

    fn markers(&self) -> &'static [Marker] {
        &[Marker::Install, Marker::Index, Marker::NeedsInternet]
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx.project().create().await?;
        p.write_pipfile(NAMED_INDEX_PIPFILE).await?;

        let package = Requirement::parse("pipenv-test-private-package")?;
        succeed(
            &p,
            InstallArgs::new()
                .package(&package)
                .index("testpypi")
                .into_args(),
        )
        .await?;
        Ok(())
    }
}

pub struct InstallLocalVcsNotInLockfile;

#[async_trait]
impl Scenario for InstallLocalVcsNotInLockfile {
    fn name(&self) -> &'static str {
        "install_local_vcs_not_in_lockfile"
    }

    fn description(&self) -> &'static str {
        "a local editable checkout is locked under its own key, not as a VCS ref"
    }

    fn markers(&self) -> &'static [Marker] {
        &[Marker::Vcs, Marker::Install, Marker::NeedsInternet]
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx
            .project()
            .chdir(true)
            .index_mirror(false)
            .create()
            .await?;
        git::clone(ctx.ops(), SIX_REPO, &p.path().join("six")).await?;

        succeed(&p, install_editable(&Requirement::parse("./six")?)).await?;
        let six_key = {
            let pipfile = p.pipfile().await?;
            let (key, _) = check::first(PACKAGES, &pipfile.packages)?;
            key.to_string()
        };
        debug!(%six_key, "local checkout recorded");

        succeed(&p, install_editable(&Requirement::parse(REQUESTS_VCS)?)).await?;
        succeed(&p, vec!["lock".to_string()]).await?;

        let pipfile = p.pipfile().await?;
        let lock = p.lockfile().await?;
        check::contains(PACKAGES, &pipfile.packages, "requests")?;
        check::contains(LOCK_DEFAULT, &lock.default, "requests")?;
        check::contains_exact(PACKAGES, &pipfile.packages, &six_key)?;
        check::contains_exact(LOCK_DEFAULT, &lock.default, &six_key)?;

        // Tools that key local paths by project name legitimately record `six`
        if canonical_name(&six_key) != "six" {
            check::absent(LOCK_DEFAULT, &lock.default, "six")?;
        }
        Ok(())
    }
}

pub struct GetVcsRefs;

impl GetVcsRefs {
    async fn check_ref(p: &ProjectInstance, expected: &str) -> Result<(), Error> {
        let pipfile = p.pipfile().await?;
        check::contains(PACKAGES, &pipfile.packages, "structlog")?;

        let lock = p.lockfile().await?;
        let structlog = check::contains(LOCK_DEFAULT, &lock.default, "structlog")?;
        check::contains(LOCK_DEFAULT, &lock.default, "six")?;
        check::equals(
            "Pipfile.lock structlog.ref",
            &Some(expected),
            &structlog.reference.as_deref(),
        )?;
        Ok(())
    }
}

#[async_trait]
impl Scenario for GetVcsRefs {
    fn name(&self) -> &'static str {
        "get_vcs_refs"
    }

    fn description(&self) -> &'static str {
        "re-locking after editing a tag in the Pipfile resolves the new commit"
    }

    fn markers(&self) -> &'static [Marker] {
        &[Marker::Vcs, Marker::Install, Marker::NeedsInternet]
    }

    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error> {
        let p = ctx
            .project()
            .chdir(true)
            .index_mirror(false)
            .create()
            .await?;

        succeed(&p, install_editable(&Requirement::parse(STRUCTLOG_VCS)?)).await?;
        Self::check_ref(&p, STRUCTLOG_16_1_0).await?;

        let replaced = p.replace_in_pipfile("16.1.0", "18.1.0").await?;
        check::replaced("Pipfile structlog tag", "16.1.0", replaced)?;
        debug!(replaced, "bumped structlog tag in Pipfile");

        succeed(&p, vec!["lock".to_string()]).await?;
        Self::check_ref(&p, STRUCTLOG_18_1_0).await
    }
}
