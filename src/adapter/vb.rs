//! Visual Basic language adapter.
//!
//! Auto-properties with initializers arrived in VB 10; read-only
//! auto-properties in VB 14. Getter-only full properties already carry the
//! `ReadOnly` modifier in their header, so promotion only removes the body.

use crate::snapshot::{FieldStatement, PropertyDecl, SymbolTable, TextRange};

use super::{DelegationShape, LanguageAdapter, LanguageVersion};

const READ_ONLY_AUTO_PROPERTIES: u32 = 14;
const AUTO_PROPERTY_INITIALIZERS: u32 = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct VisualBasicAdapter;

impl LanguageAdapter for VisualBasicAdapter {
    fn delegation_shape(
        &self,
        prop: &PropertyDecl,
        symbols: &SymbolTable,
    ) -> Option<DelegationShape> {
        super::trivial_delegation(prop, symbols)
    }

    fn supports_read_only_properties(&self, version: LanguageVersion) -> bool {
        version.0 >= READ_ONLY_AUTO_PROPERTIES
    }

    fn supports_property_initializer(&self, version: LanguageVersion) -> bool {
        version.0 >= AUTO_PROPERTY_INITIALIZERS
    }

    fn promotable_unit(&self, stmt: &FieldStatement, declarator_index: usize) -> TextRange {
        super::promotable_unit(stmt, declarator_index)
    }

    fn self_qualifier(&self) -> &'static str {
        "Me"
    }

    fn render_auto_accessors(&self, _has_setter: bool, initializer: Option<&str>) -> String {
        // A VB auto-property is just the header; the body and `End Property`
        // are dropped. The setter's presence is already encoded in the
        // header's ReadOnly modifier.
        match initializer {
            Some(init) => format!(" = {}", init),
            None => String::new(),
        }
    }
}
