//! Shared snapshot fixtures for integration tests.
//!
//! Tests describe source text and carve byte ranges out of it with
//! substring searches, so fixtures stay readable and offsets stay honest.
#![allow(dead_code)]

use autoprop::adapter::{Language, LanguageVersion};
use autoprop::snapshot::{
    ExprRoot, FieldStatement, FileId, ProjectSnapshot, PropertyDecl, SnapshotStamp, SourceFile,
    SymbolId, SymbolKind, SymbolTable, TextRange, TypeId,
};

/// Byte range of the first occurrence of `needle` in `text`.
pub fn range_of(text: &str, needle: &str) -> TextRange {
    let start = text
        .find(needle)
        .unwrap_or_else(|| panic!("fixture text does not contain {:?}", needle));
    TextRange::new(start, start + needle.len())
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Byte range of `needle` searched only inside the first occurrence of
/// `context`, returned as absolute offsets. Matches at token boundaries,
/// so `ident_in(text, "int i;", "i")` finds the declarator, not the `i`
/// inside `int`.
pub fn ident_in(text: &str, context: &str, needle: &str) -> TextRange {
    let outer = range_of(text, context);
    let hay = &text[outer.start..outer.end];
    let bytes = hay.as_bytes();
    let mut search = 0;
    while let Some(pos) = hay[search..].find(needle) {
        let start = search + pos;
        let end = start + needle.len();
        let before_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return TextRange::new(outer.start + start, outer.start + end);
        }
        search = start + 1;
    }
    panic!("{:?} does not contain token {:?}", context, needle)
}

pub struct SnapshotBuilder {
    language: Language,
    version: u32,
    files: Vec<SourceFile>,
    pub symbols: SymbolTable,
    pub fields: Vec<FieldStatement>,
    pub properties: Vec<PropertyDecl>,
    pub exprs: Vec<ExprRoot>,
    type_names: Vec<String>,
}

impl SnapshotBuilder {
    pub fn csharp(version: u32) -> Self {
        Self::new(Language::CSharp, version)
    }

    pub fn vb(version: u32) -> Self {
        Self::new(Language::VisualBasic, version)
    }

    fn new(language: Language, version: u32) -> Self {
        Self {
            language,
            version,
            files: Vec::new(),
            symbols: SymbolTable::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            exprs: Vec::new(),
            type_names: Vec::new(),
        }
    }

    pub fn file(&mut self, path: &str, text: &str) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile::new(id, path, text));
        id
    }

    pub fn ty(&mut self, name: &str) -> TypeId {
        let id = TypeId(self.type_names.len() as u32);
        self.type_names.push(name.to_string());
        id
    }

    pub fn field_symbol(&mut self, name: &str, ty: TypeId) -> SymbolId {
        self.symbols.insert(name, SymbolKind::Field, ty)
    }

    pub fn property_symbol(&mut self, name: &str, ty: TypeId) -> SymbolId {
        self.symbols.insert(name, SymbolKind::Property, ty)
    }

    pub fn local_symbol(&mut self, name: &str, ty: TypeId) -> SymbolId {
        self.symbols.insert(name, SymbolKind::Local, ty)
    }

    pub fn finish(self) -> ProjectSnapshot {
        let snapshot = ProjectSnapshot {
            stamp: SnapshotStamp::default(),
            language: self.language,
            language_version: LanguageVersion(self.version),
            files: self.files,
            symbols: self.symbols,
            fields: self.fields,
            properties: self.properties,
            exprs: self.exprs,
            type_names: self.type_names,
        };
        snapshot.validate().expect("fixture snapshot is consistent");
        snapshot
    }
}
