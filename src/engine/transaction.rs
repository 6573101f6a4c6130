//! Atomic application of edit plans.
//!
//! Commit is all-or-nothing: either every file touched by the merged plans
//! is updated and a new snapshot is published under the next stamp, or
//! nothing is, with no observable intermediate state. Plans from different
//! fields may be merged; plans touching the same file compose only when
//! their edits are disjoint; an overlap is reported as a conflict rather
//! than silently dropping one plan.
//!
//! The published snapshot is structurally updated as well: promoted
//! declarators are gone, promoted properties are auto, remaining usage
//! sites are rebound to the property, and every surviving range in a
//! touched file is remapped through the applied edits so re-analysis works
//! without a host round-trip.

use std::collections::HashMap;
use std::fmt;

use crate::cancel::CancellationToken;
use crate::snapshot::{
    Expr, FieldStatement, FileId, ProjectSnapshot, SnapshotStamp, SourceFile, SymbolId, TextRange,
};

use super::plan::{EditPlan, FileEdit};

/// Two plans tried to edit overlapping ranges of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictReport {
    pub file: FileId,
    pub first: SymbolId,
    pub second: SymbolId,
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "plans for {} and {} overlap in {}",
            self.first, self.second, self.file
        )
    }
}

/// Why a transaction did not commit. Fail closed: no partial write ever
/// reaches the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitFailure {
    /// The plan was computed against an older snapshot.
    StaleSnapshot {
        plan: SnapshotStamp,
        snapshot: SnapshotStamp,
    },
    /// Merged plans collide in one file.
    Conflict(ConflictReport),
    /// An edit range does not fit its file.
    MalformedEdit { file: FileId },
    /// Cooperative cancellation before publishing.
    Cancelled,
}

impl fmt::Display for CommitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitFailure::StaleSnapshot { plan, snapshot } => {
                write!(f, "plan {} is stale against snapshot {}", plan, snapshot)
            }
            CommitFailure::Conflict(report) => write!(f, "{}", report),
            CommitFailure::MalformedEdit { file } => {
                write!(f, "edit range out of bounds in {}", file)
            }
            CommitFailure::Cancelled => write!(f, "transaction cancelled"),
        }
    }
}

impl std::error::Error for CommitFailure {}

/// Apply one or more plans as a single transaction, returning the new
/// snapshot. The caller holds the only mutable reference to the published
/// snapshot slot, which serializes concurrent commits.
pub fn commit(
    snapshot: &ProjectSnapshot,
    plans: &[EditPlan],
    token: &CancellationToken,
) -> Result<ProjectSnapshot, CommitFailure> {
    if token.is_cancelled() {
        return Err(CommitFailure::Cancelled);
    }

    for plan in plans {
        if plan.base_stamp != snapshot.stamp {
            return Err(CommitFailure::StaleSnapshot {
                plan: plan.base_stamp,
                snapshot: snapshot.stamp,
            });
        }
    }

    // Merge all edits, remembering which field owns each for conflict
    // reporting. Disjoint files merge freely; same-file edits must not
    // overlap (by invariant, two plans never touch the same declaration).
    let mut merged: Vec<(&FileEdit, SymbolId)> = plans
        .iter()
        .flat_map(|plan| plan.edits.iter().map(move |edit| (edit, plan.field)))
        .collect();
    merged.sort_by_key(|(edit, _)| (edit.file, edit.range.start, edit.range.end));
    for window in merged.windows(2) {
        let (a, owner_a) = &window[0];
        let (b, owner_b) = &window[1];
        if a.file == b.file && b.range.start < a.range.end {
            return Err(CommitFailure::Conflict(ConflictReport {
                file: a.file,
                first: *owner_a,
                second: *owner_b,
            }));
        }
    }

    if token.is_cancelled() {
        return Err(CommitFailure::Cancelled);
    }

    // Apply per file, building the new text and the offset remapper.
    let mut new_texts: HashMap<FileId, String> = HashMap::new();
    let mut remappers: HashMap<FileId, Remapper> = HashMap::new();
    let mut idx = 0;
    while idx < merged.len() {
        let file_id = merged[idx].0.file;
        let end = merged[idx..]
            .iter()
            .position(|(e, _)| e.file != file_id)
            .map(|p| idx + p)
            .unwrap_or(merged.len());
        let file_edits: Vec<&FileEdit> = merged[idx..end].iter().map(|(e, _)| *e).collect();
        idx = end;

        let file = snapshot
            .file(file_id)
            .ok_or(CommitFailure::MalformedEdit { file: file_id })?;
        let (text, remapper) = apply_file_edits(&file.text, &file_edits)
            .ok_or(CommitFailure::MalformedEdit { file: file_id })?;
        new_texts.insert(file_id, text);
        remappers.insert(file_id, remapper);
    }

    if token.is_cancelled() {
        return Err(CommitFailure::Cancelled);
    }

    // Publish: new file texts plus the structural update, under the next
    // stamp. Nothing before this point escaped the function.
    let promoted: HashMap<SymbolId, (SymbolId, String)> = plans
        .iter()
        .filter_map(|plan| {
            snapshot
                .property(plan.property)
                .map(|prop| (plan.field, (plan.property, prop.name.clone())))
        })
        .collect();
    let promoted_properties: Vec<SymbolId> = plans.iter().map(|p| p.property).collect();

    let files: Vec<SourceFile> = snapshot
        .files
        .iter()
        .map(|file| match new_texts.remove(&file.id) {
            Some(text) => SourceFile {
                id: file.id,
                path: file.path.clone(),
                text,
            },
            None => file.clone(),
        })
        .collect();

    let fields = rebuild_fields(&snapshot.fields, &promoted, &remappers);
    let properties = rebuild_properties(snapshot, &promoted, &promoted_properties, &remappers);
    let exprs = rebuild_exprs(snapshot, &promoted, &remappers);

    Ok(ProjectSnapshot {
        stamp: snapshot.stamp.next(),
        language: snapshot.language,
        language_version: snapshot.language_version,
        files,
        symbols: snapshot.symbols.clone(),
        fields,
        properties,
        exprs,
        type_names: snapshot.type_names.clone(),
    })
}

/// Maps pre-edit offsets of one file to post-edit offsets.
struct Remapper {
    /// Applied edits in ascending order: (old range, replacement length).
    edits: Vec<(TextRange, usize)>,
}

impl Remapper {
    fn map(&self, pos: usize) -> usize {
        let mut delta: isize = 0;
        for (range, new_len) in &self.edits {
            if pos >= range.end {
                delta += *new_len as isize - range.len() as isize;
            } else if pos > range.start {
                let within = (pos - range.start).min(*new_len);
                return (range.start as isize + delta) as usize + within;
            } else {
                break;
            }
        }
        (pos as isize + delta) as usize
    }

    fn map_range(&self, range: TextRange) -> TextRange {
        TextRange::new(self.map(range.start), self.map(range.end))
    }
}

fn remap(remappers: &HashMap<FileId, Remapper>, file: FileId, range: TextRange) -> TextRange {
    match remappers.get(&file) {
        Some(remapper) => remapper.map_range(range),
        None => range,
    }
}

/// Apply sorted, disjoint edits to one file's text.
fn apply_file_edits(text: &str, edits: &[&FileEdit]) -> Option<(String, Remapper)> {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut applied = Vec::with_capacity(edits.len());
    for edit in edits {
        if edit.range.start < cursor || edit.range.end > text.len() {
            return None;
        }
        out.push_str(&text[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
        applied.push((edit.range, edit.replacement.len()));
    }
    out.push_str(&text[cursor..]);
    Some((out, Remapper { edits: applied }))
}

fn rebuild_fields(
    fields: &[FieldStatement],
    promoted: &HashMap<SymbolId, (SymbolId, String)>,
    remappers: &HashMap<FileId, Remapper>,
) -> Vec<FieldStatement> {
    fields
        .iter()
        .filter_map(|stmt| {
            let mut stmt = stmt.clone();
            stmt.declarators.retain(|d| !promoted.contains_key(&d.symbol));
            if stmt.declarators.is_empty() {
                return None;
            }
            stmt.range = remap(remappers, stmt.file, stmt.range);
            for declarator in &mut stmt.declarators {
                declarator.range = remap(remappers, stmt.file, declarator.range);
            }
            Some(stmt)
        })
        .collect()
}

fn rebuild_properties(
    snapshot: &ProjectSnapshot,
    promoted: &HashMap<SymbolId, (SymbolId, String)>,
    promoted_properties: &[SymbolId],
    remappers: &HashMap<FileId, Remapper>,
) -> Vec<crate::snapshot::PropertyDecl> {
    snapshot
        .properties
        .iter()
        .map(|prop| {
            let mut prop = prop.clone();
            let is_promoted = promoted_properties.contains(&prop.symbol);
            for fragment in &mut prop.fragments {
                if is_promoted && (fragment.getter.is_some() || fragment.setter.is_some()) {
                    fragment.getter = None;
                    fragment.setter = None;
                    fragment.is_auto = true;
                }
                fragment.range = remap(remappers, fragment.file, fragment.range);
                fragment.accessor_list_range =
                    remap(remappers, fragment.file, fragment.accessor_list_range);
                if let Some(getter) = &mut fragment.getter {
                    getter.range = remap(remappers, fragment.file, getter.range);
                    remap_expr(&mut getter.body, fragment.file, promoted, remappers);
                }
                if let Some(setter) = &mut fragment.setter {
                    setter.range = remap(remappers, fragment.file, setter.range);
                    remap_expr(&mut setter.body, fragment.file, promoted, remappers);
                }
            }
            prop
        })
        .collect()
}

fn rebuild_exprs(
    snapshot: &ProjectSnapshot,
    promoted: &HashMap<SymbolId, (SymbolId, String)>,
    remappers: &HashMap<FileId, Remapper>,
) -> Vec<crate::snapshot::ExprRoot> {
    snapshot
        .exprs
        .iter()
        .map(|root| {
            let mut root = root.clone();
            remap_expr(&mut root.expr, root.file, promoted, remappers);
            root
        })
        .collect()
}

/// Remap every range inside an expression and rebind rewritten usage
/// sites from the demoted field to the property.
fn remap_expr(
    expr: &mut Expr,
    file: FileId,
    promoted: &HashMap<SymbolId, (SymbolId, String)>,
    remappers: &HashMap<FileId, Remapper>,
) {
    match expr {
        Expr::Name(name_ref) => {
            name_ref.range = remap(remappers, file, name_ref.range);
            if let Some(binding) = name_ref.binding
                && let Some((property, name)) = promoted.get(&binding)
            {
                name_ref.binding = Some(*property);
                name_ref.name = name.clone();
            }
        }
        Expr::ValueParam { range } => {
            *range = remap(remappers, file, *range);
        }
        Expr::Assign { target, value } => {
            remap_expr(target, file, promoted, remappers);
            remap_expr(value, file, promoted, remappers);
        }
        Expr::Call { callee, args } => {
            if let Some(callee) = callee {
                remap_expr(callee, file, promoted, remappers);
            }
            for arg in args {
                remap_expr(&mut arg.expr, file, promoted, remappers);
            }
        }
        Expr::AddressOf { operand } => {
            remap_expr(operand, file, promoted, remappers);
        }
        Expr::Group { children } => {
            for child in children {
                remap_expr(child, file, promoted, remappers);
            }
        }
    }
}
