//! Per-language syntax-shape predicates and capability flags.
//!
//! The engine is parameterized by one adapter per source language, selected
//! once from the compilation's language at the start of a pass. Adapters are
//! pure: every method is a function of a syntax fragment and the active
//! language version, with no side effects. Core algorithms never inspect
//! the language themselves.

pub mod csharp;
pub mod vb;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::snapshot::{
    Expr, FieldStatement, PropertyDecl, SymbolId, SymbolKind, SymbolTable, TextRange,
};

pub use csharp::CSharpAdapter;
pub use vb::VisualBasicAdapter;

/// Source language of a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Language {
    CSharp,
    VisualBasic,
}

/// Major language version of the active compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LanguageVersion(pub u32);

/// How one accessor delegates to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorDelegation {
    pub field: SymbolId,
    /// True when the accessor body self-qualifies the field reference.
    pub qualified: bool,
}

/// Result of the trivial-delegation shape test on a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationShape {
    /// Index of the fragment carrying the accessor bodies.
    pub fragment_index: usize,
    pub getter: AccessorDelegation,
    /// Present iff the property declares a setter.
    pub setter: Option<AccessorDelegation>,
}

/// Syntax-shape predicates and capability flags for one source language.
#[enum_dispatch]
pub trait LanguageAdapter {
    /// Test a property against the trivial-delegation shape: a getter body
    /// that is exactly a field read and, when present, a setter body that
    /// is exactly a field-equals-value assignment. Returns the delegated
    /// field per accessor; the analyzer checks that both name the same
    /// symbol.
    fn delegation_shape(&self, prop: &PropertyDecl, symbols: &SymbolTable)
    -> Option<DelegationShape>;

    /// Whether the language version supports getter-only auto-properties.
    fn supports_read_only_properties(&self, version: LanguageVersion) -> bool;

    /// Whether the language version supports initializers on auto-properties.
    fn supports_property_initializer(&self, version: LanguageVersion) -> bool;

    /// The span to treat as the promotable unit for a field declarator:
    /// the whole statement when it is the sole declarator, otherwise just
    /// that declarator.
    fn promotable_unit(&self, stmt: &FieldStatement, declarator_index: usize) -> TextRange;

    /// The self-qualification keyword of the language.
    fn self_qualifier(&self) -> &'static str;

    /// Render the replacement text for a promoted property's accessor span.
    fn render_auto_accessors(&self, has_setter: bool, initializer: Option<&str>) -> String;
}

/// Adapter instance dispatched without runtime type inspection.
#[enum_dispatch(LanguageAdapter)]
#[derive(Debug, Clone, Copy)]
pub enum Adapter {
    CSharp(CSharpAdapter),
    VisualBasic(VisualBasicAdapter),
}

impl Adapter {
    /// Select the adapter for a compilation's language.
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::CSharp => Adapter::CSharp(CSharpAdapter),
            Language::VisualBasic => Adapter::VisualBasic(VisualBasicAdapter),
        }
    }
}

/// Shared shape test over the normalized accessor bodies.
///
/// Exactly one fragment may carry accessor bodies; a property whose
/// accessors are split across fragments never matches.
pub(crate) fn trivial_delegation(
    prop: &PropertyDecl,
    symbols: &SymbolTable,
) -> Option<DelegationShape> {
    let mut accessor_fragments = prop
        .fragments
        .iter()
        .enumerate()
        .filter(|(_, f)| f.getter.is_some() || f.setter.is_some());
    let (fragment_index, fragment) = accessor_fragments.next()?;
    if accessor_fragments.next().is_some() || fragment.is_auto {
        return None;
    }

    let getter = delegated_read(&fragment.getter.as_ref()?.body, symbols)?;
    let setter = match &fragment.setter {
        Some(accessor) => Some(delegated_write(&accessor.body, symbols)?),
        None => None,
    };

    Some(DelegationShape {
        fragment_index,
        getter,
        setter,
    })
}

/// `return field` / `Return field`, optionally self-qualified.
fn delegated_read(body: &Expr, symbols: &SymbolTable) -> Option<AccessorDelegation> {
    let Expr::Name(name_ref) = body else {
        return None;
    };
    let field = name_ref.binding?;
    if symbols.kind(field)? != SymbolKind::Field {
        return None;
    }
    Some(AccessorDelegation {
        field,
        qualified: name_ref.qualified,
    })
}

/// `field = value`, optionally self-qualified on the target.
fn delegated_write(body: &Expr, symbols: &SymbolTable) -> Option<AccessorDelegation> {
    let Expr::Assign { target, value } = body else {
        return None;
    };
    if !matches!(value.as_ref(), Expr::ValueParam { .. }) {
        return None;
    }
    delegated_read(target, symbols)
}

/// Shared promotable-unit selection: single-declarator statements promote
/// as the whole statement, multi-declarator statements as one declarator.
pub(crate) fn promotable_unit(stmt: &FieldStatement, declarator_index: usize) -> TextRange {
    if stmt.declarators.len() == 1 {
        stmt.range
    } else {
        stmt.declarators[declarator_index].range
    }
}
