//! Scenario trait and the context scenarios run in

use async_trait::async_trait;
use lockcheck_config::Config;
use lockcheck_errors::Error;
use lockcheck_platform::ProcessOperations;
use lockcheck_types::Marker;
use std::path::PathBuf;
use std::sync::Arc;

use crate::instance::ProjectInstanceBuilder;

/// One black-box install/lock scenario
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Stable identifier used for selection and reporting
    fn name(&self) -> &'static str;

    /// One-line summary for `list`
    fn description(&self) -> &'static str;

    fn markers(&self) -> &'static [Marker];

    /// Known to fail intermittently for reasons outside the tool under test
    fn flaky(&self) -> bool {
        false
    }

    fn needs_network(&self) -> bool {
        self.markers().contains(&Marker::NeedsInternet)
    }

    /// Fixture files the scenario reads, relative to the fixtures directory
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    fn has_marker(&self, marker: Marker) -> bool {
        self.markers().contains(&marker)
    }

    /// Drive the tool and check what it leaves behind
    async fn run(&self, ctx: &ScenarioContext) -> Result<(), Error>;
}

/// What a scenario gets to work with
#[derive(Clone)]
pub struct ScenarioContext {
    config: Arc<Config>,
    ops: Arc<dyn ProcessOperations>,
}

impl ScenarioContext {
    pub fn new(config: Arc<Config>, ops: Arc<dyn ProcessOperations>) -> Self {
        Self { config, ops }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ops(&self) -> &dyn ProcessOperations {
        self.ops.as_ref()
    }

    /// Builder for a fresh project using this context's tool and index
    pub fn project(&self) -> ProjectInstanceBuilder {
        ProjectInstanceBuilder::new(&self.config, Arc::clone(&self.ops))
    }

    /// Absolute location of a fixture file
    pub fn fixture(&self, relative: &str) -> PathBuf {
        self.config.fixtures_dir().join(relative)
    }
}
