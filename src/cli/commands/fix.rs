//! Fix command - promote every reported pair in one merged transaction.
//!
//! Default is dry-run mode: the planned promotions are previewed without
//! touching any file. Use `--apply` to commit the transaction and write
//! the updated file texts. The commit is all-or-nothing: a conflict or a
//! stale snapshot aborts the whole transaction.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cancel::CancellationToken;
use crate::cli::args::FixCommand;
use crate::cli::exit_status::ExitStatus;
use crate::cli::report;
use crate::diagnostics::Diagnostic;
use crate::engine::coordinator::{fix_all, run_pass};
use crate::engine::{CommitFailure, FixFailure};

use super::helper::load_project;

pub fn fix(cmd: FixCommand, verbose: bool) -> Result<ExitStatus> {
    let args = &cmd.args;
    let project = load_project(&args.common, verbose)?;
    let token = CancellationToken::new();

    let outcome = run_pass(&project.snapshot, &project.options, &token)?;
    if outcome.diagnostics.is_empty() {
        report::print_no_candidates(project.snapshot.files.len());
        return Ok(ExitStatus::Success);
    }

    if !args.apply {
        preview(&outcome.diagnostics, &project.snapshot);
        println!(
            "{} {} backing field(s).",
            "Would promote".yellow().bold(),
            outcome.diagnostics.len()
        );
        println!("Run with {} to rewrite the files.", "--apply".cyan());
        return Ok(ExitStatus::Failure);
    }

    let fixed = match fix_all(&project.snapshot, &outcome.diagnostics, &token) {
        Ok(fixed) => fixed,
        Err(FixFailure::Commit(CommitFailure::Conflict(report))) => {
            eprintln!("{} fix-all conflict: {}", "error:".bold().red(), report);
            return Ok(ExitStatus::Error);
        }
        Err(failure) => return Err(failure.into()),
    };

    for file_id in &fixed.touched_files {
        let Some(file) = fixed.snapshot.file(*file_id) else {
            continue;
        };
        let path = resolve(&project.root, &file.path);
        fs::write(&path, &file.text)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        if verbose {
            eprintln!("rewrote {}", path.display());
        }
    }

    println!(
        "{} {} backing field(s) in {} file(s).",
        "Promoted".green().bold(),
        outcome.diagnostics.len(),
        fixed.touched_files.len()
    );
    Ok(ExitStatus::Success)
}

fn preview(diagnostics: &[Diagnostic], snapshot: &crate::snapshot::ProjectSnapshot) {
    for diagnostic in diagnostics {
        let path = snapshot
            .file(diagnostic.location.file)
            .map(|f| f.path.as_str())
            .unwrap_or("<unknown>");
        println!(
            "  {} {} {} auto-property  ({})",
            "-".dimmed(),
            diagnostic.label,
            "->".dimmed(),
            path
        );
    }
}

fn resolve(root: &Path, path: &str) -> std::path::PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}
