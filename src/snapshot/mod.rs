//! In-memory project snapshot supplied by the host.
//!
//! The engine consumes already-resolved syntax and symbol bindings; this
//! module defines the data model the host fills in: source files with
//! byte-offset ranges, an interned symbol table, resolved expression trees,
//! and field/property declarations. Nothing here parses source text.

pub mod project;
pub mod source;
pub mod symbols;
pub mod syntax;

pub use project::{ProjectSnapshot, SnapshotStamp};
pub use source::{FileId, Location, SourceFile, TextRange};
pub use symbols::{SymbolId, SymbolInfo, SymbolKind, SymbolTable, TypeId};
pub use syntax::{
    Accessibility, Accessor, Argument, Expr, ExprRoot, FieldDeclarator, FieldModifiers,
    FieldStatement, NameRef, PropertyDecl, PropertyFragment, RefModifier,
};
