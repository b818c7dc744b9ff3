#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! lockcheck - install/lock scenarios for Pipfile-based dependency managers
//!
//! Loads configuration, selects scenarios and hands them to the harness
//! runner, then renders the report as a table or JSON.

mod cli;
mod display;
mod error;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::{OutputRenderer, ScenarioInfo};
use crate::error::CliError;
use clap::Parser;
use lockcheck_config::Config;
use lockcheck_harness::{ScenarioFilter, ScenarioRunner};
use lockcheck_platform::NativeProcessOperations;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("Application error: {}", e);
            if json_mode {
                println!("{}", e.to_json());
            } else {
                eprintln!("Error: {e}");
            }
            process::exit(2);
        }
    }
}

/// Main application logic; `Ok(false)` when a scenario failed
async fn run(cli: Cli) -> Result<bool, CliError> {
    info!("Starting lockcheck v{}", env!("CARGO_PKG_VERSION"));

    // 1. File config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Environment variables
    config.merge_env()?;

    // 3. CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command)?;

    let renderer = OutputRenderer::new(cli.global.json);
    let runner = ScenarioRunner::new(config, Arc::new(NativeProcessOperations::new()));

    match cli.command {
        Commands::List { markers } => {
            let filter = ScenarioFilter {
                markers,
                ..ScenarioFilter::default()
            };
            let listed: Vec<ScenarioInfo> = runner
                .select(&filter)?
                .into_iter()
                .map(ScenarioInfo::from_scenario)
                .collect();
            renderer.render_list(&listed)?;
            Ok(true)
        }
        Commands::Run {
            names,
            markers,
            offline,
            ..
        } => {
            let filter = ScenarioFilter {
                names,
                markers,
                offline,
            };
            let report = runner.run(&filter).await?;
            renderer.render_report(&report)?;
            info!(
                passed = report.passed(),
                failed = report.failed(),
                skipped = report.skipped(),
                "run finished"
            );
            Ok(report.success())
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &GlobalArgs,
    command: &Commands,
) -> Result<(), CliError> {
    if let Some(tool) = &global.tool {
        config.tool.program.clone_from(tool);
    }
    if let Some(url) = &global.index_url {
        config.index.url = if url.is_empty() {
            None
        } else {
            Some(url.clone())
        };
    }
    if let Some(dir) = &global.fixtures {
        config.paths.fixtures_dir = Some(dir.clone());
    }

    if let Commands::Run {
        max_runs: Some(max_runs),
        ..
    } = command
    {
        config.network.max_runs = *max_runs;
    }

    config.validate()?;
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode {
        // JSON mode: keep stdout clean for the report
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(
                        "info,lockcheck=debug,lockcheck_harness=debug,lockcheck_platform=debug",
                    )
                }),
            )
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,lockcheck=warn,lockcheck_harness=warn")
                }),
            )
            .init();
    }
}
