//! Command line interface definition

use clap::{Parser, Subcommand};
use lockcheck_types::Marker;
use std::path::PathBuf;

/// lockcheck - install/lock scenarios for Pipfile-based dependency managers
#[derive(Parser)]
#[command(name = "lockcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Install/lock scenarios for Pipfile-based dependency managers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Program under test
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub tool: Option<String>,

    /// Local package index mirror (`/simple` is appended)
    #[arg(long, global = true, value_name = "URL")]
    pub index_url: Option<String>,

    /// Directory holding wheel fixtures
    #[arg(long, global = true, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// List available scenarios
    #[command(alias = "ls")]
    List {
        /// Only scenarios carrying any of these markers
        #[arg(short, long = "marker", value_enum, value_name = "MARKER")]
        markers: Vec<Marker>,
    },

    /// Run scenarios against the tool under test
    Run {
        /// Scenario names (empty = all)
        names: Vec<String>,

        /// Only scenarios carrying any of these markers
        #[arg(short, long = "marker", value_enum, value_name = "MARKER")]
        markers: Vec<Marker>,

        /// Skip scenarios that need network access
        #[arg(long)]
        offline: bool,

        /// Total runs allowed for flaky scenarios
        #[arg(long, value_name = "N")]
        max_runs: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_filters() {
        let cli = Cli::try_parse_from([
            "lockcheck",
            "--json",
            "run",
            "get_vcs_refs",
            "-m",
            "vcs",
            "--marker",
            "needs-internet",
            "--offline",
            "--tool",
            "/opt/pipenv/bin/pipenv",
        ])
        .unwrap();

        assert!(cli.global.json);
        assert_eq!(cli.global.tool.as_deref(), Some("/opt/pipenv/bin/pipenv"));
        match cli.command {
            Commands::Run {
                names,
                markers,
                offline,
                max_runs,
            } => {
                assert_eq!(names, ["get_vcs_refs"]);
                assert_eq!(markers, [Marker::Vcs, Marker::NeedsInternet]);
                assert!(offline);
                assert_eq!(max_runs, None);
            }
            Commands::List { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn test_unknown_marker_is_rejected() {
        assert!(Cli::try_parse_from(["lockcheck", "list", "--marker", "slow"]).is_err());
    }
}
