//! Core promotion engine.
//!
//! - `usage`: project-wide field reference collection (parallel scan)
//! - `eligibility`: promotability classification with reason codes
//! - `plan`: multi-file edit-plan construction
//! - `transaction`: atomic all-or-nothing commit and fix-all merging
//! - `context`: per-snapshot lazy analysis cache
//! - `coordinator`: the end-to-end pass, fix, and fix-all drivers

pub mod context;
pub mod coordinator;
pub mod eligibility;
pub mod plan;
pub mod transaction;
pub mod usage;

use std::fmt;

use crate::snapshot::SymbolId;

pub use context::{AnalysisContext, FieldAnalysis};
pub use coordinator::{FieldState, FixFailure, FixOutcome, PassOptions, PassOutcome};
pub use eligibility::{EligibilityVerdict, IneligibleReason};
pub use plan::{EditOp, EditPlan, PlanFailure};
pub use transaction::{CommitFailure, ConflictReport};
pub use usage::{UsageKind, UsageMap, UsageSet, UsageSite};

/// A collaborator broke its contract: the snapshot handed the engine an
/// identity it cannot resolve. Caught at per-field scope, recorded as
/// telemetry, and degraded to "no diagnostic for this field", never an
/// abort of the whole pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContractError {
    message: String,
}

impl HostContractError {
    pub fn new(message: String) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HostContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host contract violation: {}", self.message)
    }
}

impl std::error::Error for HostContractError {}

/// One observability event recorded during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEvent {
    /// The field whose analysis degraded, when attributable.
    pub field: Option<SymbolId>,
    pub message: String,
}
