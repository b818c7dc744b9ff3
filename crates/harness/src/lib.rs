#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Scenario harness for Pipfile-based dependency managers
//!
//! Each scenario gets a disposable project directory, drives the tool under
//! test as a subprocess and checks the `Pipfile` and `Pipfile.lock` it leaves
//! behind. The tool itself is a black box: only exit codes and the two
//! documents are inspected.

pub mod check;
pub mod git;
pub mod instance;
pub mod retry;
pub mod runner;
pub mod scenario;
pub mod scenarios;

pub use instance::{ProjectInstance, ProjectInstanceBuilder};
pub use retry::RetryPolicy;
pub use runner::{Outcome, RunReport, ScenarioFilter, ScenarioReport, ScenarioRunner};
pub use scenario::{Scenario, ScenarioContext};
