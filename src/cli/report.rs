//! Report formatting and printing utilities.
//!
//! Displays diagnostics in cargo-style format. Separate from the engine so
//! autoprop can be used as a library without pulling in terminal output.

use std::io::{self, Write};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::diagnostics::{Diagnostic, Severity};
use crate::snapshot::ProjectSnapshot;

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print diagnostics in cargo-style format to stdout.
pub fn report(diagnostics: &[Diagnostic], snapshot: &ProjectSnapshot) {
    report_to(diagnostics, snapshot, &mut io::stdout().lock());
}

/// Print diagnostics to a custom writer.
///
/// Useful for testing or redirecting output.
pub fn report_to<W: Write>(
    diagnostics: &[Diagnostic],
    snapshot: &ProjectSnapshot,
    writer: &mut W,
) {
    if diagnostics.is_empty() {
        return;
    }

    let mut sorted = diagnostics.to_vec();
    sorted.sort();

    let max_line_width = calculate_max_line_width(&sorted, snapshot);

    for diagnostic in &sorted {
        print_diagnostic(diagnostic, snapshot, writer, max_line_width);
    }

    print_summary(&sorted, writer);
}

/// Print a success message when nothing is promotable.
pub fn print_no_candidates(source_files: usize) {
    print_no_candidates_to(source_files, &mut io::stdout().lock());
}

/// Print a success message to a custom writer.
pub fn print_no_candidates_to<W: Write>(source_files: usize, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Checked {} source {} - no promotable backing fields found",
            source_files,
            if source_files == 1 { "file" } else { "files" }
        )
        .green()
    );
}

// ============================================================
// Internal Functions
// ============================================================

fn print_diagnostic<W: Write>(
    diagnostic: &Diagnostic,
    snapshot: &ProjectSnapshot,
    writer: &mut W,
    max_line_width: usize,
) {
    let severity_str = match diagnostic.severity {
        Severity::Error => "error".bold().red(),
        Severity::Warning => "warning".bold().yellow(),
    };

    let _ = writeln!(
        writer,
        "{}: \"{}\" can be merged into an auto-property  {}",
        severity_str,
        diagnostic.label,
        format!("[{}]", diagnostic.id).dimmed()
    );

    let Some(file) = snapshot.file(diagnostic.location.file) else {
        let _ = writeln!(writer);
        return;
    };
    let (line, col) = file.line_col(diagnostic.location.range.start);
    let _ = writeln!(
        writer,
        "  {} {}:{}:{}",
        "-->".blue().bold(),
        file.path,
        line,
        col
    );

    // Source line with a caret under the promotable unit.
    let source_line = file.line_text(diagnostic.location.range.start);
    let line_label = line.to_string();
    let pad = " ".repeat(max_line_width.saturating_sub(line_label.len()));
    let gutter = " ".repeat(max_line_width);
    let _ = writeln!(writer, " {} {}", gutter, "|".blue().bold());
    let _ = writeln!(
        writer,
        " {}{} {} {}",
        pad,
        line_label.blue().bold(),
        "|".blue().bold(),
        source_line
    );

    let prefix_width = UnicodeWidthStr::width(&source_line[..(col - 1).min(source_line.len())]);
    let unit_len = diagnostic
        .location
        .range
        .len()
        .min(source_line.len().saturating_sub(col - 1))
        .max(1);
    let underline_width = UnicodeWidthStr::width(
        &source_line[(col - 1).min(source_line.len())
            ..(col - 1 + unit_len).min(source_line.len())],
    )
    .max(1);
    let _ = writeln!(
        writer,
        " {} {} {}{}",
        gutter,
        "|".blue().bold(),
        " ".repeat(prefix_width),
        "^".repeat(underline_width).yellow().bold()
    );
    let _ = writeln!(writer);
}

fn print_summary<W: Write>(diagnostics: &[Diagnostic], writer: &mut W) {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;

    let mut parts = Vec::new();
    if errors > 0 {
        parts.push(format!("{} error(s)", errors).red().bold().to_string());
    }
    if warnings > 0 {
        parts.push(format!("{} warning(s)", warnings).yellow().bold().to_string());
    }
    let _ = writeln!(
        writer,
        "{} Found {} promotable backing field(s): {}",
        FAILURE_MARK.red(),
        diagnostics.len(),
        parts.join(", ")
    );
}

fn calculate_max_line_width(diagnostics: &[Diagnostic], snapshot: &ProjectSnapshot) -> usize {
    diagnostics
        .iter()
        .filter_map(|d| {
            snapshot
                .file(d.location.file)
                .map(|f| f.line_col(d.location.range.start).0)
        })
        .map(|line| line.to_string().len())
        .max()
        .unwrap_or(1)
}
