//! Check command - report backing fields that can become auto-properties.

use anyhow::Result;

use crate::cancel::CancellationToken;
use crate::cli::args::CheckCommand;
use crate::cli::exit_status::ExitStatus;
use crate::cli::report;
use crate::engine::coordinator::run_pass;

use super::helper::load_project;

pub fn check(cmd: CheckCommand, verbose: bool) -> Result<ExitStatus> {
    let project = load_project(&cmd.args.common, verbose)?;
    let token = CancellationToken::new();

    let outcome = run_pass(&project.snapshot, &project.options, &token)?;

    if verbose {
        for event in &outcome.telemetry {
            eprintln!("warning: analysis degraded: {}", event.message);
        }
    }

    if outcome.diagnostics.is_empty() {
        report::print_no_candidates(project.snapshot.files.len());
        return Ok(ExitStatus::Success);
    }

    report::report(&outcome.diagnostics, &project.snapshot);
    Ok(ExitStatus::Failure)
}
