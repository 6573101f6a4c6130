//! The immutable project snapshot.
//!
//! All engine state lives here. The host exports one snapshot per analysis
//! pass (JSON on the wire for the CLI); committed transactions publish a
//! replacement snapshot under a fresh stamp and never mutate the original.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapter::{Language, LanguageVersion};

use super::source::{FileId, SourceFile};
use super::symbols::{SymbolId, SymbolTable, TypeId};
use super::syntax::{ExprRoot, FieldStatement, PropertyDecl};

/// Monotonic snapshot version. A plan computed against one stamp can only
/// be committed against a snapshot carrying the same stamp.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SnapshotStamp(pub u64);

impl SnapshotStamp {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SnapshotStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// One in-memory project snapshot: files, resolved symbols, declarations,
/// and every expression root the usage collector traverses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub stamp: SnapshotStamp,
    pub language: Language,
    pub language_version: LanguageVersion,
    pub files: Vec<SourceFile>,
    pub symbols: SymbolTable,
    #[serde(default)]
    pub fields: Vec<FieldStatement>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub exprs: Vec<ExprRoot>,
    /// Display names for declaring types, indexed by `TypeId`.
    #[serde(default)]
    pub type_names: Vec<String>,
}

impl ProjectSnapshot {
    /// Look up a file by id. `None` indicates a broken host contract.
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Display name of a declaring type.
    pub fn type_name(&self, id: TypeId) -> Option<&str> {
        self.type_names.get(id.0 as usize).map(String::as_str)
    }

    /// The field statement declaring `symbol`, with the declarator index.
    pub fn field_statement(&self, symbol: SymbolId) -> Option<(&FieldStatement, usize)> {
        self.fields
            .iter()
            .find_map(|stmt| stmt.declarator_index(symbol).map(|idx| (stmt, idx)))
    }

    /// The property declaration for `symbol`.
    pub fn property(&self, symbol: SymbolId) -> Option<&PropertyDecl> {
        self.properties.iter().find(|p| p.symbol == symbol)
    }

    /// Every field symbol declared in this snapshot, in declaration order.
    pub fn field_symbols(&self) -> Vec<SymbolId> {
        self.fields
            .iter()
            .flat_map(|stmt| stmt.declarators.iter().map(|d| d.symbol))
            .collect()
    }

    /// Load a snapshot from a host-exported JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        let snapshot: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the host-contract invariants that the engine relies on.
    ///
    /// A snapshot that fails here is not analyzable at all; per-field
    /// degradation only applies to failures discovered later.
    pub fn validate(&self) -> Result<()> {
        for stmt in &self.fields {
            self.file(stmt.file)
                .with_context(|| format!("Field statement references unknown {}", stmt.file))?;
            for decl in &stmt.declarators {
                self.symbols
                    .get(decl.symbol)
                    .with_context(|| format!("Field declarator references unknown {}", decl.symbol))?;
            }
        }
        for prop in &self.properties {
            self.symbols
                .get(prop.symbol)
                .with_context(|| format!("Property '{}' references unknown {}", prop.name, prop.symbol))?;
            for fragment in &prop.fragments {
                self.file(fragment.file).with_context(|| {
                    format!("Property '{}' fragment references unknown {}", prop.name, fragment.file)
                })?;
            }
        }
        for root in &self.exprs {
            self.file(root.file)
                .with_context(|| format!("Expression root references unknown {}", root.file))?;
        }
        Ok(())
    }
}
