//! End-to-end pass, fix, and fix-all drivers.
//!
//! Per-field state machine:
//! `Discovered → Analyzed{Eligible|Ineligible} → Rewritten → Committed`.
//! `Ineligible` and `Committed` are terminal; only `Eligible` fields reach
//! `Rewritten`. The coordinator owns all cross-stage sequencing; the
//! stages themselves are pure functions of the snapshot.

use std::collections::BTreeMap;
use std::fmt;

use glob::Pattern;

use crate::adapter::LanguageAdapter;
use crate::cancel::{CancellationToken, Cancelled};
use crate::diagnostics::{Diagnostic, Severity};
use crate::snapshot::{FileId, Location, ProjectSnapshot, SymbolId};

use super::context::{AnalysisContext, FieldAnalysis};
use super::eligibility::EligibilityVerdict;
use super::plan::{EditPlan, PlanFailure, build_plan};
use super::transaction::{CommitFailure, commit};
use super::TelemetryEvent;

/// Lifecycle state of one field within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Discovered,
    Analyzed(EligibilityVerdict),
    Rewritten,
    Committed,
}

/// Options for one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct PassOptions {
    pub severity: Option<Severity>,
    /// `Type.field` labels to suppress, as glob patterns.
    pub ignore: Vec<Pattern>,
}

impl PassOptions {
    fn severity(&self) -> Severity {
        self.severity.unwrap_or(Severity::Warning)
    }

    fn is_ignored(&self, label: &str) -> bool {
        self.ignore.iter().any(|p| p.matches(label))
    }
}

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    /// One diagnostic per `Analyzed{Eligible}` field, sorted.
    pub diagnostics: Vec<Diagnostic>,
    /// Verdicts for every classified field, for observability and tests.
    pub analyses: Vec<FieldAnalysis>,
    /// Final state of every discovered field.
    pub states: BTreeMap<SymbolId, FieldState>,
    pub telemetry: Vec<TelemetryEvent>,
}

/// Result of a committed fix or fix-all.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    /// The published snapshot, under the next stamp.
    pub snapshot: ProjectSnapshot,
    pub touched_files: Vec<FileId>,
    /// State transitions of the promoted fields.
    pub states: BTreeMap<SymbolId, FieldState>,
}

/// Why a fix did not commit. Distinct from ineligibility, which never
/// reaches the fix path at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixFailure {
    Plan(PlanFailure),
    Commit(CommitFailure),
    Cancelled,
}

impl fmt::Display for FixFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixFailure::Plan(failure) => write!(f, "plan construction failed: {}", failure),
            FixFailure::Commit(failure) => write!(f, "commit failed: {}", failure),
            FixFailure::Cancelled => write!(f, "fix cancelled"),
        }
    }
}

impl std::error::Error for FixFailure {}

impl From<PlanFailure> for FixFailure {
    fn from(failure: PlanFailure) -> Self {
        FixFailure::Plan(failure)
    }
}

impl From<CommitFailure> for FixFailure {
    fn from(failure: CommitFailure) -> Self {
        FixFailure::Commit(failure)
    }
}

impl From<Cancelled> for FixFailure {
    fn from(_: Cancelled) -> Self {
        FixFailure::Cancelled
    }
}

/// Run one analysis pass: enumerate fields, collect usages, classify, and
/// emit a diagnostic for every eligible pair.
pub fn run_pass(
    snapshot: &ProjectSnapshot,
    options: &PassOptions,
    token: &CancellationToken,
) -> Result<PassOutcome, Cancelled> {
    let ctx = AnalysisContext::new(snapshot, token.clone());
    let results = ctx.results()?;

    let mut states = BTreeMap::new();
    for field in snapshot.field_symbols() {
        states.insert(field, FieldState::Discovered);
    }

    let mut diagnostics = Vec::new();
    for analysis in &results.analyses {
        states.insert(analysis.field, FieldState::Analyzed(analysis.verdict));

        let EligibilityVerdict::Eligible {
            backing_field,
            property,
        } = analysis.verdict
        else {
            continue;
        };

        // The promotable unit anchors the diagnostic: the whole statement
        // for a sole declarator, the declarator otherwise.
        let Some((stmt, declarator_index)) = snapshot.field_statement(backing_field) else {
            continue;
        };
        let unit = ctx.adapter.promotable_unit(stmt, declarator_index);
        let label = format!(
            "{}.{}",
            snapshot.type_name(stmt.declaring_type).unwrap_or("<type>"),
            stmt.declarators[declarator_index].name
        );
        if options.is_ignored(&label) {
            continue;
        }

        diagnostics.push(Diagnostic::use_auto_property(
            Location::new(stmt.file, unit),
            options.severity(),
            backing_field,
            property,
            &label,
        ));
    }
    diagnostics.sort();

    Ok(PassOutcome {
        diagnostics,
        analyses: results.analyses.clone(),
        states,
        telemetry: results.telemetry.clone(),
    })
}

/// Apply the fix for one diagnostic as a single transaction.
pub fn fix(
    snapshot: &ProjectSnapshot,
    diagnostic: &Diagnostic,
    token: &CancellationToken,
) -> Result<FixOutcome, FixFailure> {
    fix_fields(snapshot, &[(diagnostic.field, diagnostic.property)], token)
}

/// Apply the fixes for a set of diagnostics as one merged transaction.
/// Plans touching disjoint files merge freely; a same-file overlap is a
/// conflict, reported rather than silently dropping a plan.
pub fn fix_all(
    snapshot: &ProjectSnapshot,
    diagnostics: &[Diagnostic],
    token: &CancellationToken,
) -> Result<FixOutcome, FixFailure> {
    // A field participates in at most one promotion.
    let mut pairs: Vec<(SymbolId, SymbolId)> = Vec::new();
    for diagnostic in diagnostics {
        if !pairs.iter().any(|(field, _)| *field == diagnostic.field) {
            pairs.push((diagnostic.field, diagnostic.property));
        }
    }
    fix_fields(snapshot, &pairs, token)
}

fn fix_fields(
    snapshot: &ProjectSnapshot,
    pairs: &[(SymbolId, SymbolId)],
    token: &CancellationToken,
) -> Result<FixOutcome, FixFailure> {
    let ctx = AnalysisContext::new(snapshot, token.clone());
    let usages = ctx.usage_map()?;

    let mut states = BTreeMap::new();
    let mut plans: Vec<EditPlan> = Vec::new();
    for &(field, property) in pairs {
        token.checkpoint()?;
        let plan = build_plan(snapshot, &ctx.adapter, usages, field, property)?;
        states.insert(field, FieldState::Rewritten);
        plans.push(plan);
    }

    let new_snapshot = commit(snapshot, &plans, token)?;

    let mut touched_files: Vec<FileId> = plans.iter().flat_map(|p| p.touched_files()).collect();
    touched_files.sort();
    touched_files.dedup();

    for &(field, _) in pairs {
        states.insert(field, FieldState::Committed);
    }

    Ok(FixOutcome {
        snapshot: new_snapshot,
        touched_files,
        states,
    })
}
