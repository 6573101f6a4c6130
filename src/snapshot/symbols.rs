//! Symbol identities resolved by the host.
//!
//! The engine never resolves names itself; every reference in the snapshot
//! arrives pre-bound to a `SymbolId` (or a candidate list when the host's
//! binder was ambiguous). A declared entity is one logical symbol that may
//! own syntax in several files; collectors and rewriters always go through
//! the symbol, never through a file path.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of one resolved symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym#{}", self.0)
    }
}

/// Identity of a declaring type. Partial types share one `TypeId` across
/// all of their fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Field,
    Property,
    Method,
    Local,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    pub containing_type: TypeId,
}

/// Flat symbol table indexed by `SymbolId`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    symbols: Vec<SymbolInfo>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a symbol and return its id.
    pub fn insert(&mut self, name: &str, kind: SymbolKind, containing_type: TypeId) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolInfo {
            name: name.to_string(),
            kind,
            containing_type,
        });
        id
    }

    /// Look up a symbol. `None` means the host handed out an id it never
    /// registered, a broken collaborator contract the caller must surface.
    pub fn get(&self, id: SymbolId) -> Option<&SymbolInfo> {
        self.symbols.get(id.0 as usize)
    }

    pub fn name(&self, id: SymbolId) -> Option<&str> {
        self.get(id).map(|s| s.name.as_str())
    }

    pub fn kind(&self, id: SymbolId) -> Option<SymbolKind> {
        self.get(id).map(|s| s.kind)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut table = SymbolTable::new();
        let ty = TypeId(0);
        let field = table.insert("i", SymbolKind::Field, ty);
        let prop = table.insert("P", SymbolKind::Property, ty);

        assert_eq!(table.name(field), Some("i"));
        assert_eq!(table.kind(prop), Some(SymbolKind::Property));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unknown_id_is_none() {
        let table = SymbolTable::new();
        assert!(table.get(SymbolId(7)).is_none());
    }
}
