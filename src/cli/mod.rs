//! Command-line interface layer.

pub mod args;
pub mod commands;
pub mod exit_status;
pub mod report;

use anyhow::Result;

pub use args::{Arguments, Command};
pub use exit_status::ExitStatus;

pub fn run_cli(args: Arguments) -> Result<ExitStatus> {
    let verbose = args.verbose();

    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success);
    };

    match args.command {
        Some(Command::Check(cmd)) => commands::check::check(cmd, verbose),
        Some(Command::Fix(cmd)) => commands::fix::fix(cmd, verbose),
        Some(Command::Init) => commands::init(),
        None => Ok(ExitStatus::Success),
    }
}
