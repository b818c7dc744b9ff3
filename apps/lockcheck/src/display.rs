//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use lockcheck_harness::{Outcome, RunReport, Scenario};
use lockcheck_types::Marker;
use serde::Serialize;

use crate::error::CliError;

/// Scenario listing entry, as rendered by `list --json`
#[derive(Debug, Serialize)]
pub struct ScenarioInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub markers: Vec<Marker>,
    pub flaky: bool,
    pub needs_network: bool,
}

impl ScenarioInfo {
    pub fn from_scenario(scenario: &dyn Scenario) -> Self {
        Self {
            name: scenario.name(),
            description: scenario.description(),
            markers: scenario.markers().to_vec(),
            flaky: scenario.flaky(),
            needs_network: scenario.needs_network(),
        }
    }
}

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render the scenario catalogue
    pub fn render_list(&self, scenarios: &[ScenarioInfo]) -> Result<(), CliError> {
        if self.json_output {
            return print_json(scenarios);
        }

        if scenarios.is_empty() {
            println!("No scenarios match.");
            return Ok(());
        }

        let mut table = new_table();
        table.set_header(vec![
            header("Scenario"),
            header("Markers"),
            header("Flaky"),
            header("Description"),
        ]);
        for info in scenarios {
            table.add_row(vec![
                Cell::new(info.name),
                Cell::new(join_markers(&info.markers)),
                Cell::new(if info.flaky { "yes" } else { "-" }),
                Cell::new(info.description),
            ]);
        }

        println!("{table}");
        Ok(())
    }

    /// Render a finished run
    pub fn render_report(&self, report: &RunReport) -> Result<(), CliError> {
        if self.json_output {
            return print_json(report);
        }

        let mut table = new_table();
        table.set_header(vec![
            header("Scenario"),
            header("Result"),
            header("Runs"),
            header("Time"),
            header("Detail"),
        ]);
        for result in &report.results {
            table.add_row(vec![
                Cell::new(&result.name),
                outcome_cell(&result.outcome),
                Cell::new(result.attempts),
                Cell::new(format_duration(result.duration_ms)),
                Cell::new(detail(&result.outcome)),
            ]);
        }
        println!("{table}");

        let elapsed = report.finished_at - report.started_at;
        #[allow(clippy::cast_precision_loss)]
        let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
        println!(
            "{} passed, {} failed, {} skipped in {seconds:.1}s",
            report.passed(),
            report.failed(),
            report.skipped(),
        );

        for result in &report.results {
            if let Outcome::Failed { message, .. } = &result.outcome {
                println!();
                println!("--- {} ---", result.name);
                println!("{message}");
            }
        }
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn outcome_cell(outcome: &Outcome) -> Cell {
    let color = match outcome {
        Outcome::Passed => Color::Green,
        Outcome::Failed { .. } => Color::Red,
        Outcome::Skipped { .. } => Color::Yellow,
    };
    Cell::new(outcome.label()).fg(color)
}

fn detail(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Passed => String::new(),
        Outcome::Skipped { reason } => reason.clone(),
        Outcome::Failed { message, code } => {
            let first_line = message.lines().next().unwrap_or_default();
            match code {
                Some(code) => format!("[{code}] {first_line}"),
                None => first_line.to_string(),
            }
        }
    }
}

fn join_markers(markers: &[Marker]) -> String {
    markers
        .iter()
        .copied()
        .map(Marker::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{}.{}s", ms / 1000, (ms % 1000) / 100)
    }
}
