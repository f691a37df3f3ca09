//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use crate::checks::{self, Check, CheckContext, Marker};
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::interpreter::Interpreter;
use crate::project::SampleProject;
use crate::settings;

use super::runner::{self, ConsoleReporter, Selection};
use super::{CliError, CliResult, ExitCode};

// ============================================================================
// Session setup
// ============================================================================

/// Render a harness error the way miette prints it (code, message, help).
pub fn render_error(err: HarnessError) -> String {
    format!("{:?}", miette::Report::new(err))
}

/// Probe the interpreter and resolve the project once for the whole session.
fn prepare_context(config: HarnessConfig) -> CliResult<CheckContext> {
    let interpreter = Interpreter::probe(&config.python).map_err(|e| CliError::failure(render_error(e)))?;
    let project = SampleProject::new(&config.project_dir)
        .canonicalize()
        .map_err(|e| CliError::failure(render_error(e)))?;

    Ok(CheckContext {
        config,
        interpreter,
        project,
    })
}

// ============================================================================
// Commands
// ============================================================================

/// Run the selected checks and exit non-zero if any failed.
pub fn run_checks(config: HarnessConfig, selection: &Selection, verbose: bool) -> CliResult<ExitCode> {
    for setting in &config.wheel_config_settings {
        setting.validate().map_err(|e| CliError::failure(render_error(e)))?;
    }

    let ctx = prepare_context(config)?;
    let mut reporter = ConsoleReporter::new(verbose);
    let summary = runner::run_session(checks::all_checks(), &ctx, selection, &mut reporter);

    if summary.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// One line per check: id and markers.
pub fn render_listing(checks: &[Box<dyn Check>], marker: Option<Marker>) -> String {
    let mut out = String::new();
    for check in checks {
        if marker.is_some_and(|m| !check.has_marker(m)) {
            continue;
        }
        let markers: Vec<&str> = check.markers().iter().map(|m| m.name()).collect();
        out.push_str(&format!("{} [{}]\n", check.id(), markers.join(", ")));
    }
    out
}

/// Print the available checks without running anything.
pub fn list_checks(marker: Option<Marker>) -> CliResult<ExitCode> {
    print!("{}", render_listing(&checks::all_checks(), marker));
    Ok(ExitCode::SUCCESS)
}

/// Print the backend settings schema as pretty JSON.
pub fn print_schema() -> CliResult<ExitCode> {
    let schema = serde_json::to_string_pretty(&settings::json_schema())
        .map_err(|e| CliError::failure(format!("Error serializing schema: {}", e)))?;
    println!("{}", schema);
    Ok(ExitCode::SUCCESS)
}
