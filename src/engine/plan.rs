//! Edit-plan construction for a promotable pair.
//!
//! A plan is an ordered set of per-file text edits computed against one
//! immutable snapshot: remove the field declarator (or its whole statement),
//! replace the property's accessor block with an auto-property accessor
//! list, and rewrite every remaining read/write site to the property. All
//! offsets reference the plan's base snapshot, so edits never interact.
//!
//! Plan construction fails closed: if any expected syntactic shape is
//! missing, typically because the snapshot changed after eligibility was
//! computed, no plan is produced and nothing is applied.

use std::fmt;

use crate::adapter::{Adapter, LanguageAdapter};
use crate::snapshot::{
    FileId, Location, ProjectSnapshot, PropertyFragment, SnapshotStamp, SymbolId, TextRange,
};

use super::usage::{UsageKind, UsageMap};

/// Whether a rewritten site keeps an explicit self-qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualificationStyle {
    Bare,
    SelfQualified,
}

/// The semantic operation a text edit performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Remove the promoted declarator (the whole statement when it is the
    /// sole declarator).
    RemoveDeclarator,
    /// Replace the accessor block with an auto-property accessor list,
    /// carrying the field's initializer when present.
    ReplaceAccessorsWithAutoProperty {
        has_setter: bool,
        initializer: Option<String>,
    },
    /// Rewrite a usage site to reference the property, preserving the
    /// site's qualification style.
    RewriteUsageToProperty {
        site: Location,
        qualification: QualificationStyle,
    },
}

/// One text edit in one file, with its semantic operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub file: FileId,
    pub range: TextRange,
    pub replacement: String,
    pub op: EditOp,
}

/// The multi-file edit transaction for one promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    /// Stamp of the snapshot all offsets reference. Commit rejects the
    /// plan when the snapshot has moved on.
    pub base_stamp: SnapshotStamp,
    pub field: SymbolId,
    pub property: SymbolId,
    /// Edits sorted by (file, start); disjoint by construction.
    pub edits: Vec<FileEdit>,
}

impl EditPlan {
    /// Files this plan touches, deduplicated, in order.
    pub fn touched_files(&self) -> Vec<FileId> {
        let mut files: Vec<FileId> = self.edits.iter().map(|e| e.file).collect();
        files.sort();
        files.dedup();
        files
    }
}

/// Why plan construction failed. Distinct from ineligibility: these are
/// fix failures reported to the caller, not verdicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanFailure {
    /// The field has no declaration in the snapshot.
    FieldMissing(SymbolId),
    /// The property has no declaration in the snapshot.
    PropertyMissing(SymbolId),
    /// The property no longer trivially delegates to the field.
    DelegationShapeMissing(SymbolId),
    /// A recorded range does not fit the file it points into.
    MalformedRange { file: FileId },
    /// Two edits of the same plan overlapped; the snapshot shapes are
    /// inconsistent.
    OverlappingEdits { file: FileId },
}

impl fmt::Display for PlanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanFailure::FieldMissing(sym) => write!(f, "field {} not found in snapshot", sym),
            PlanFailure::PropertyMissing(sym) => {
                write!(f, "property {} not found in snapshot", sym)
            }
            PlanFailure::DelegationShapeMissing(sym) => {
                write!(f, "property {} no longer trivially delegates", sym)
            }
            PlanFailure::MalformedRange { file } => {
                write!(f, "edit range out of bounds in {}", file)
            }
            PlanFailure::OverlappingEdits { file } => {
                write!(f, "overlapping edits in {}", file)
            }
        }
    }
}

impl std::error::Error for PlanFailure {}

/// Build the edit plan for an `Eligible` field/property pair.
pub fn build_plan(
    snapshot: &ProjectSnapshot,
    adapter: &Adapter,
    usages: &UsageMap,
    field: SymbolId,
    property: SymbolId,
) -> Result<EditPlan, PlanFailure> {
    let (stmt, declarator_index) = snapshot
        .field_statement(field)
        .ok_or(PlanFailure::FieldMissing(field))?;
    let prop = snapshot
        .property(property)
        .ok_or(PlanFailure::PropertyMissing(property))?;
    let shape = adapter
        .delegation_shape(prop, &snapshot.symbols)
        .filter(|s| s.getter.field == field && s.setter.is_none_or(|set| set.field == field))
        .ok_or(PlanFailure::DelegationShapeMissing(property))?;
    let fragment = &prop.fragments[shape.fragment_index];
    let declarator = &stmt.declarators[declarator_index];

    let mut edits = Vec::new();

    // Field declaration: drop the whole statement when the promoted
    // declarator is the only one, otherwise split the statement and drop
    // just that declarator with its separator.
    let removal = if stmt.declarators.len() == 1 {
        let file = snapshot
            .file(stmt.file)
            .ok_or(PlanFailure::MalformedRange { file: stmt.file })?;
        widen_removal(&file.text, stmt.range)
    } else if declarator_index + 1 < stmt.declarators.len() {
        TextRange::new(
            declarator.range.start,
            stmt.declarators[declarator_index + 1].range.start,
        )
    } else {
        TextRange::new(
            stmt.declarators[declarator_index - 1].range.end,
            declarator.range.end,
        )
    };
    edits.push(FileEdit {
        file: stmt.file,
        range: removal,
        replacement: String::new(),
        op: EditOp::RemoveDeclarator,
    });

    // Accessor block: the adapter renders the auto-property form; the
    // field's initializer moves onto the property verbatim.
    let has_setter = shape.setter.is_some();
    let initializer = declarator.initializer.clone();
    edits.push(FileEdit {
        file: fragment.file,
        range: fragment.accessor_list_range,
        replacement: adapter.render_auto_accessors(has_setter, initializer.as_deref()),
        op: EditOp::ReplaceAccessorsWithAutoProperty {
            has_setter,
            initializer,
        },
    });

    // Every other read/write site is rewritten to the property name. The
    // getter/setter bodies are discarded with the accessor block and are
    // excluded here; ambiguous Other sites were never bound to the field
    // and are left alone.
    let property_name = &prop.name;
    for site in usages.sites(field) {
        if !matches!(site.kind, UsageKind::Read | UsageKind::Write) {
            continue;
        }
        if inside_accessors(fragment, site.location) {
            continue;
        }
        edits.push(FileEdit {
            file: site.location.file,
            range: site.location.range,
            replacement: property_name.clone(),
            op: EditOp::RewriteUsageToProperty {
                site: site.location,
                qualification: if site.qualified {
                    QualificationStyle::SelfQualified
                } else {
                    QualificationStyle::Bare
                },
            },
        });
    }

    edits.sort_by_key(|e| (e.file, e.range.start));
    validate_edits(snapshot, &edits)?;

    Ok(EditPlan {
        base_stamp: snapshot.stamp,
        field,
        property,
        edits,
    })
}

/// Extend a statement removal over the whitespace it leaves behind: the
/// trailing spaces on the same line, and the whole line (with its newline)
/// when the statement sat alone on it.
fn widen_removal(text: &str, range: TextRange) -> TextRange {
    let mut end = range.end;
    let bytes = text.as_bytes();
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
        end += 1;
    }

    let line_start = text[..range.start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let leading_blank = text[line_start..range.start].chars().all(|c| c == ' ' || c == '\t');
    if leading_blank && end < bytes.len() && bytes[end] == b'\n' {
        return TextRange::new(line_start, end + 1);
    }
    TextRange::new(range.start, end)
}

/// True if the site falls inside the fragment's accessor bodies.
fn inside_accessors(fragment: &PropertyFragment, site: Location) -> bool {
    if site.file != fragment.file {
        return false;
    }
    let in_getter = fragment
        .getter
        .as_ref()
        .is_some_and(|g| g.range.contains_range(&site.range));
    let in_setter = fragment
        .setter
        .as_ref()
        .is_some_and(|s| s.range.contains_range(&site.range));
    in_getter || in_setter
}

/// Bounds- and overlap-check a sorted edit list against the snapshot.
fn validate_edits(snapshot: &ProjectSnapshot, edits: &[FileEdit]) -> Result<(), PlanFailure> {
    for (idx, edit) in edits.iter().enumerate() {
        let file = snapshot
            .file(edit.file)
            .ok_or(PlanFailure::MalformedRange { file: edit.file })?;
        if edit.range.end > file.text.len() || edit.range.start > edit.range.end {
            return Err(PlanFailure::MalformedRange { file: edit.file });
        }
        if let Some(next) = edits.get(idx + 1)
            && next.file == edit.file
            && next.range.start < edit.range.end
        {
            return Err(PlanFailure::OverlappingEdits { file: edit.file });
        }
    }
    Ok(())
}
