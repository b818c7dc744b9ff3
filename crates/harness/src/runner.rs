//! Scenario selection, execution and reporting

use chrono::{DateTime, Utc};
use lockcheck_config::Config;
use lockcheck_errors::{Error, ScenarioError, UserFacingError};
use lockcheck_platform::ProcessOperations;
use lockcheck_types::Marker;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::retry::RetryPolicy;
use crate::scenario::{Scenario, ScenarioContext};
use crate::scenarios;

/// Which scenarios to run
#[derive(Debug, Clone, Default)]
pub struct ScenarioFilter {
    /// Exact scenario names; empty selects everything
    pub names: Vec<String>,
    /// Keep scenarios carrying any of these markers; empty keeps everything
    pub markers: Vec<Marker>,
    /// Skip scenarios that need network access
    pub offline: bool,
}

/// How a scenario ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed {
        message: String,
        code: Option<String>,
    },
    Skipped {
        reason: String,
    },
}

impl Outcome {
    fn from_result(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => Self::Passed,
            Err(e) => match e.skip_reason() {
                Some(reason) => Self::Skipped {
                    reason: reason.to_string(),
                },
                None => Self::Failed {
                    message: e.user_message().into_owned(),
                    code: e.user_code().map(str::to_string),
                },
            },
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub markers: Vec<Marker>,
    pub outcome: Outcome,
    /// Runs made, zero when skipped before running
    pub attempts: u32,
    pub duration_ms: u64,
}

impl ScenarioReport {
    fn skipped(scenario: &dyn Scenario, reason: impl Into<String>) -> Self {
        Self {
            name: scenario.name().to_string(),
            markers: scenario.markers().to_vec(),
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
            attempts: 0,
            duration_ms: 0,
        }
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ScenarioReport>,
}

impl RunReport {
    /// No scenario failed
    #[must_use]
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Runs scenarios one after another against the configured tool
pub struct ScenarioRunner {
    context: ScenarioContext,
    retry: RetryPolicy,
    scenarios: Vec<Box<dyn Scenario>>,
}

impl ScenarioRunner {
    /// Runner over the built-in scenario catalogue
    pub fn new(config: Config, ops: Arc<dyn ProcessOperations>) -> Self {
        let retry = RetryPolicy::from(&config.network);
        Self {
            context: ScenarioContext::new(Arc::new(config), ops),
            retry,
            scenarios: scenarios::all(),
        }
    }

    /// Replace the catalogue
    #[must_use]
    pub fn with_scenarios(mut self, scenarios: Vec<Box<dyn Scenario>>) -> Self {
        self.scenarios = scenarios;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn scenarios(&self) -> &[Box<dyn Scenario>] {
        &self.scenarios
    }

    pub fn context(&self) -> &ScenarioContext {
        &self.context
    }

    /// Scenarios matching `filter`, in catalogue order
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError::UnknownScenario` for a name not in the
    /// catalogue.
    pub fn select(&self, filter: &ScenarioFilter) -> Result<Vec<&dyn Scenario>, Error> {
        if let Some(unknown) = filter
            .names
            .iter()
            .find(|name| !self.scenarios.iter().any(|s| s.name() == name.as_str()))
        {
            return Err(ScenarioError::UnknownScenario {
                name: unknown.clone(),
            }
            .into());
        }

        Ok(self
            .scenarios
            .iter()
            .map(Box::as_ref)
            .filter(|s| filter.names.is_empty() || filter.names.iter().any(|n| n == s.name()))
            .filter(|s| filter.markers.is_empty() || filter.markers.iter().any(|m| s.has_marker(*m)))
            .collect())
    }

    /// Run every selected scenario
    ///
    /// Scenario failures are recorded in the report, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the filter names an unknown scenario.
    pub async fn run(&self, filter: &ScenarioFilter) -> Result<RunReport, Error> {
        let selected = self.select(filter)?;
        let started_at = Utc::now();
        let program = &self.context.config().tool.program;

        let tool_missing = match self.context.ops().which(program).await {
            Ok(path) => {
                info!(tool = %path.display(), "using tool under test");
                None
            }
            Err(e) => {
                warn!(tool = %program, error = %e, "tool under test not found, skipping all scenarios");
                Some(format!("`{program}` not found on PATH"))
            }
        };
        let offline = filter.offline || !self.context.config().network.enabled;

        let mut results = Vec::with_capacity(selected.len());
        for scenario in selected {
            let report = if let Some(reason) = &tool_missing {
                ScenarioReport::skipped(scenario, reason.as_str())
            } else if offline && scenario.needs_network() {
                ScenarioReport::skipped(scenario, "network access disabled")
            } else if let Some(missing) = self.missing_fixture(scenario).await {
                ScenarioReport::skipped(scenario, format!("fixture not found: {missing}"))
            } else {
                self.run_one(scenario).await
            };
            results.push(report);
        }

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            results,
        })
    }

    /// Run a single scenario, retrying it if it is flaky
    pub async fn run_one(&self, scenario: &dyn Scenario) -> ScenarioReport {
        let name = scenario.name();
        let policy = if scenario.flaky() {
            self.retry.clone()
        } else {
            RetryPolicy::once()
        };

        info!(scenario = name, "running");
        let start = Instant::now();
        let ctx = &self.context;
        let (result, attempts) = policy.run(name, move |_| scenario.run(ctx)).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = Outcome::from_result(result);
        match &outcome {
            Outcome::Passed => info!(scenario = name, attempts, duration_ms, "passed"),
            Outcome::Skipped { reason } => info!(scenario = name, %reason, "skipped"),
            Outcome::Failed { message, .. } => {
                warn!(scenario = name, attempts, duration_ms, "failed: {message}");
            }
        }

        ScenarioReport {
            name: name.to_string(),
            markers: scenario.markers().to_vec(),
            outcome,
            attempts,
            duration_ms,
        }
    }

    async fn missing_fixture(&self, scenario: &dyn Scenario) -> Option<String> {
        for relative in scenario.requires() {
            let path = self.context.fixture(relative);
            if tokio::fs::metadata(&path).await.is_err() {
                return Some(path.display().to_string());
            }
        }
        None
    }
}
