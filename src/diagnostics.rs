//! Diagnostic records exposed to the host.
//!
//! One diagnostic id exists: `use-auto-property`, emitted at the field
//! declaration site of every field classified `Eligible`. Ineligibility is
//! not an error and produces no diagnostic; its reason is retained on the
//! analysis for observability.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::snapshot::{Location, SymbolId};

/// The single diagnostic id this engine emits.
pub const USE_AUTO_PROPERTY: &str = "use-auto-property";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A promotable field/property pair, anchored at the field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable diagnostic id; always [`USE_AUTO_PROPERTY`].
    pub id: &'static str,
    /// The field declaration site (the promotable unit).
    pub location: Location,
    pub severity: Severity,
    /// The backing field to remove.
    pub field: SymbolId,
    /// The property to promote.
    pub property: SymbolId,
    /// `Type.field` label for reporting and ignore matching.
    pub label: String,
}

impl Diagnostic {
    pub fn use_auto_property(
        location: Location,
        severity: Severity,
        field: SymbolId,
        property: SymbolId,
        label: &str,
    ) -> Self {
        Self {
            id: USE_AUTO_PROPERTY,
            location,
            severity,
            field,
            property,
            label: label.to_string(),
        }
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        // Sort by file, then offset, then label. The label comparison keeps
        // ordering deterministic when parallel analysis produces diagnostics
        // in nondeterministic order.
        self.location
            .file
            .cmp(&other.location.file)
            .then_with(|| self.location.range.start.cmp(&other.location.range.start))
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
