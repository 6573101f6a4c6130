//! Resolved syntax fragments supplied by the host.
//!
//! This is not a parser output format; it is the already-bound shape the
//! host's semantic engine exports: every name reference carries its symbol
//! binding (or candidate list), every argument carries its by-reference
//! modifier, and every declaration carries byte ranges into the snapshot's
//! immutable file text.

use serde::{Deserialize, Serialize};

use super::source::{FileId, TextRange};
use super::symbols::{SymbolId, TypeId};

/// Declared accessibility of a member or accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Accessibility {
    Private,
    Protected,
    Internal,
    Public,
}

/// By-reference modifier on a call argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefModifier {
    #[default]
    None,
    Ref,
    Out,
}

/// A bound name reference: bare identifier or self-qualified member access
/// (`this.x` / `Me.x`). The range covers the identifier token only, so a
/// rewrite that swaps the identifier preserves the qualification style of
/// the site untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameRef {
    pub name: String,
    pub range: TextRange,
    /// True when the site is written with an explicit self-qualifier.
    pub qualified: bool,
    /// The symbol the host bound this reference to, if binding succeeded.
    pub binding: Option<SymbolId>,
    /// Candidate symbols when the binding is ambiguous.
    #[serde(default)]
    pub candidates: Vec<SymbolId>,
}

impl NameRef {
    pub fn bound(name: &str, range: TextRange, qualified: bool, symbol: SymbolId) -> Self {
        Self {
            name: name.to_string(),
            range,
            qualified,
            binding: Some(symbol),
            candidates: Vec::new(),
        }
    }

    pub fn ambiguous(
        name: &str,
        range: TextRange,
        qualified: bool,
        candidates: Vec<SymbolId>,
    ) -> Self {
        Self {
            name: name.to_string(),
            range,
            qualified,
            binding: None,
            candidates,
        }
    }
}

/// One argument in a call, with its by-reference modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    #[serde(default)]
    pub modifier: RefModifier,
    pub expr: Expr,
}

/// A resolved expression tree.
///
/// Shapes the collector recognizes get their own variants; everything else
/// is a `Group` the traversal descends through. This mirrors how the host
/// reports expressions: classification needs the syntactic position of a
/// reference, not the full grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expr {
    Name(NameRef),
    /// The setter's implicit value parameter.
    ValueParam { range: TextRange },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: Option<Box<Expr>>,
        args: Vec<Argument>,
    },
    AddressOf { operand: Box<Expr> },
    /// Any other expression shape; children are traversed as reads.
    Group { children: Vec<Expr> },
}

impl Expr {
    pub fn name(name: &str, range: TextRange, symbol: SymbolId) -> Self {
        Expr::Name(NameRef::bound(name, range, false, symbol))
    }

    pub fn self_name(name: &str, range: TextRange, symbol: SymbolId) -> Self {
        Expr::Name(NameRef::bound(name, range, true, symbol))
    }
}

/// One expression root the collector traverses, e.g. a statement inside a
/// method body. Accessor bodies live on their property fragments and are
/// traversed separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExprRoot {
    pub file: FileId,
    pub expr: Expr,
}

/// Field modifiers the analyzer cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldModifiers {
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_read_only: bool,
}

/// One declarator inside a field statement: `int a = 1, b;` has two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDeclarator {
    pub symbol: SymbolId,
    pub name: String,
    /// The declarator's own span: name plus initializer, excluding commas.
    pub range: TextRange,
    /// Verbatim initializer expression text, if any.
    pub initializer: Option<String>,
}

/// A field declaration statement with one or more declarators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStatement {
    pub file: FileId,
    /// The whole statement including the terminator.
    pub range: TextRange,
    pub declaring_type: TypeId,
    pub accessibility: Accessibility,
    #[serde(default)]
    pub modifiers: FieldModifiers,
    /// Attribute source text attached to the statement, in order.
    #[serde(default)]
    pub attributes: Vec<String>,
    pub declarators: Vec<FieldDeclarator>,
}

impl FieldStatement {
    /// Index of the declarator declaring `symbol`, if present.
    pub fn declarator_index(&self, symbol: SymbolId) -> Option<usize> {
        self.declarators.iter().position(|d| d.symbol == symbol)
    }
}

/// An accessor with its resolved body.
///
/// Getter bodies are the returned expression; setter bodies are the
/// assignment statement. An accessor without a body (an auto accessor)
/// is represented by its absence on the fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub range: TextRange,
    pub body: Expr,
    #[serde(default)]
    pub accessibility: Option<Accessibility>,
}

/// One syntax fragment of a property declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFragment {
    pub file: FileId,
    /// The full declaration span of this fragment.
    pub range: TextRange,
    /// The span the rewriter replaces when promoting: the accessor block
    /// for C#, the body through `End Property` for VB.
    pub accessor_list_range: TextRange,
    pub accessibility: Accessibility,
    #[serde(default)]
    pub getter: Option<Accessor>,
    #[serde(default)]
    pub setter: Option<Accessor>,
    /// True once the fragment is an auto-property (no explicit bodies).
    #[serde(default)]
    pub is_auto: bool,
}

/// A property declaration. One logical symbol owning a collection of
/// syntax fragments: types split across files contribute the same
/// `declaring_type` from different `file`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDecl {
    pub symbol: SymbolId,
    pub name: String,
    pub declaring_type: TypeId,
    pub fragments: Vec<PropertyFragment>,
}

impl PropertyDecl {
    /// The fragments that carry explicit accessor bodies.
    pub fn accessor_fragments(&self) -> impl Iterator<Item = &PropertyFragment> {
        self.fragments
            .iter()
            .filter(|f| f.getter.is_some() || f.setter.is_some())
    }
}
