//! C# language adapter.
//!
//! Auto-properties exist since C# 3; getter-only auto-properties and
//! auto-property initializers both arrived in C# 6.

use crate::snapshot::{FieldStatement, PropertyDecl, SymbolTable, TextRange};

use super::{DelegationShape, LanguageAdapter, LanguageVersion};

const READ_ONLY_AUTO_PROPERTIES: u32 = 6;
const AUTO_PROPERTY_INITIALIZERS: u32 = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpAdapter;

impl LanguageAdapter for CSharpAdapter {
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
        "this"
    }

    fn render_auto_accessors(&self, has_setter: bool, initializer: Option<&str>) -> String {
        let accessors = if has_setter { "{ get; set; }" } else { "{ get; }" };
        match initializer {
            Some(init) => format!("{} = {};", accessors, init),
            None => accessors.to_string(),
        }
    }
}
