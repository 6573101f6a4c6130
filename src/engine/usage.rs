//! Project-wide field usage collection.
//!
//! For every field symbol, find each syntax location in the project that
//! binds to it and tag it with a usage kind. The scan covers every file,
//! not just the declaring one, because partial types and same-assembly
//! references live anywhere in the snapshot.
//!
//! Worker threads scan disjoint expression subtrees in parallel; each
//! produces a local map, and the maps are merged with a commutative union
//! after the barrier join. Observations are only ever added, so the final
//! per-field kind set is independent of traversal order.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::cancel::{CancellationToken, Cancelled};
use crate::snapshot::{
    Expr, FileId, Location, NameRef, ProjectSnapshot, RefModifier, SymbolId, SymbolKind,
    SymbolTable,
};

/// How a reference site uses a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UsageKind {
    Read,
    Write,
    RefOrOutArgument,
    AddressOf,
    /// An ambiguous candidate reference outside argument position; observed
    /// but neither rewritten nor disqualifying.
    Other,
}

impl UsageKind {
    fn bit(self) -> u8 {
        match self {
            UsageKind::Read => 1 << 0,
            UsageKind::Write => 1 << 1,
            UsageKind::RefOrOutArgument => 1 << 2,
            UsageKind::AddressOf => 1 << 3,
            UsageKind::Other => 1 << 4,
        }
    }
}

/// Append-only set of usage kinds with commutative union semantics.
///
/// Writers only insert; merging unions bit masks, so the result never
/// depends on the order worker threads observed the sites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSet(u8);

impl UsageSet {
    pub fn insert(&mut self, kind: UsageKind) {
        self.0 |= kind.bit();
    }

    pub fn contains(&self, kind: UsageKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn union(&mut self, other: UsageSet) {
        self.0 |= other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if any usage permanently disqualifies promotion.
    pub fn has_by_reference_usage(&self) -> bool {
        self.contains(UsageKind::RefOrOutArgument) || self.contains(UsageKind::AddressOf)
    }
}

/// One observed reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UsageSite {
    pub location: Location,
    pub kind: UsageKind,
    /// Whether the site self-qualifies the reference.
    pub qualified: bool,
}

/// All observations for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldUsage {
    pub kinds: UsageSet,
    pub sites: Vec<UsageSite>,
}

/// Usage observations for every field in the snapshot, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageMap {
    map: HashMap<SymbolId, FieldUsage>,
}

impl UsageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, symbol: SymbolId, site: UsageSite) {
        let usage = self.map.entry(symbol).or_default();
        usage.kinds.insert(site.kind);
        usage.sites.push(site);
    }

    /// Union another map into this one. Commutative and associative.
    pub fn merge(&mut self, other: UsageMap) {
        for (symbol, usage) in other.map {
            let entry = self.map.entry(symbol).or_default();
            entry.kinds.union(usage.kinds);
            entry.sites.extend(usage.sites);
        }
    }

    /// The kind set for a field; empty when the field is never referenced.
    pub fn kinds(&self, symbol: SymbolId) -> UsageSet {
        self.map.get(&symbol).map(|u| u.kinds).unwrap_or_default()
    }

    pub fn sites(&self, symbol: SymbolId) -> &[UsageSite] {
        self.map.get(&symbol).map(|u| u.sites.as_slice()).unwrap_or(&[])
    }

    /// Sort all site lists for deterministic downstream iteration. Called
    /// once after the barrier join; kind sets are order-independent already.
    fn normalize(&mut self) {
        for usage in self.map.values_mut() {
            usage.sites.sort();
            usage.sites.dedup();
        }
    }
}

/// Scan the whole snapshot and classify every field reference.
///
/// Expression roots and accessor bodies are scanned as disjoint parallel
/// tasks; cancellation is observed at task boundaries.
pub fn collect_usages(
    snapshot: &ProjectSnapshot,
    token: &CancellationToken,
) -> Result<UsageMap, Cancelled> {
    token.checkpoint()?;

    // Accessor bodies are usage sites too: a getter of one property may
    // read the backing field of another pair.
    let mut tasks: Vec<(FileId, &Expr)> = snapshot
        .exprs
        .iter()
        .map(|root| (root.file, &root.expr))
        .collect();
    for prop in &snapshot.properties {
        for fragment in &prop.fragments {
            if let Some(getter) = &fragment.getter {
                tasks.push((fragment.file, &getter.body));
            }
            if let Some(setter) = &fragment.setter {
                tasks.push((fragment.file, &setter.body));
            }
        }
    }

    let locals: Vec<UsageMap> = tasks
        .par_iter()
        .map(|(file, expr)| {
            token.checkpoint()?;
            let mut local = UsageMap::new();
            walk(expr, *file, RefContext::Read, &snapshot.symbols, &mut local);
            Ok(local)
        })
        .collect::<Result<_, Cancelled>>()?;

    // Sequential merge after the barrier join; union is commutative, so
    // the completion order of the workers above cannot change the result.
    let mut merged = UsageMap::new();
    for local in locals {
        merged.merge(local);
    }
    merged.normalize();
    Ok(merged)
}

/// Syntactic position of the expression currently being visited.
#[derive(Debug, Clone, Copy)]
enum RefContext {
    Read,
    Write,
    RefOrOut,
    AddressOf,
}

fn walk(expr: &Expr, file: FileId, ctx: RefContext, symbols: &SymbolTable, out: &mut UsageMap) {
    match expr {
        Expr::Name(name_ref) => record_name(name_ref, file, ctx, symbols, out),
        Expr::ValueParam { .. } => {}
        Expr::Assign { target, value } => {
            walk(target, file, RefContext::Write, symbols, out);
            walk(value, file, RefContext::Read, symbols, out);
        }
        Expr::Call { callee, args } => {
            if let Some(callee) = callee {
                walk(callee, file, RefContext::Read, symbols, out);
            }
            for arg in args {
                let arg_ctx = match arg.modifier {
                    RefModifier::None => RefContext::Read,
                    RefModifier::Ref | RefModifier::Out => RefContext::RefOrOut,
                };
                walk(&arg.expr, file, arg_ctx, symbols, out);
            }
        }
        Expr::AddressOf { operand } => {
            walk(operand, file, RefContext::AddressOf, symbols, out);
        }
        Expr::Group { children } => {
            for child in children {
                walk(child, file, RefContext::Read, symbols, out);
            }
        }
    }
}

fn record_name(
    name_ref: &NameRef,
    file: FileId,
    ctx: RefContext,
    symbols: &SymbolTable,
    out: &mut UsageMap,
) {
    let location = Location::new(file, name_ref.range);

    if let Some(symbol) = name_ref.binding
        && symbols.kind(symbol) == Some(SymbolKind::Field)
    {
        let kind = match ctx {
            RefContext::Read => UsageKind::Read,
            RefContext::Write => UsageKind::Write,
            RefContext::RefOrOut => UsageKind::RefOrOutArgument,
            RefContext::AddressOf => UsageKind::AddressOf,
        };
        out.observe(
            symbol,
            UsageSite {
                location,
                kind,
                qualified: name_ref.qualified,
            },
        );
    }

    // Ambiguous bindings: every field candidate is observed. In argument
    // position the candidates inherit the by-reference classification so
    // a possibly-ref usage disqualifies all of them; elsewhere they are
    // recorded as Other and never rewritten.
    for &candidate in &name_ref.candidates {
        if symbols.kind(candidate) != Some(SymbolKind::Field) {
            continue;
        }
        let kind = match ctx {
            RefContext::RefOrOut => UsageKind::RefOrOutArgument,
            RefContext::AddressOf => UsageKind::AddressOf,
            RefContext::Read | RefContext::Write => UsageKind::Other,
        };
        out.observe(
            candidate,
            UsageSite {
                location,
                kind,
                qualified: name_ref.qualified,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::snapshot::{Argument, TextRange};

    use super::*;

    fn field_table() -> (SymbolTable, SymbolId) {
        let mut symbols = SymbolTable::new();
        let field = symbols.insert("i", SymbolKind::Field, crate::snapshot::TypeId(0));
        (symbols, field)
    }

    fn scan(expr: &Expr, symbols: &SymbolTable) -> UsageMap {
        let mut map = UsageMap::new();
        walk(expr, FileId(0), RefContext::Read, symbols, &mut map);
        map
    }

    #[test]
    fn read_site_is_classified_read() {
        let (symbols, field) = field_table();
        let expr = Expr::name("i", TextRange::new(0, 1), field);
        let map = scan(&expr, &symbols);
        assert!(map.kinds(field).contains(UsageKind::Read));
        assert!(!map.kinds(field).has_by_reference_usage());
    }

    #[test]
    fn assignment_target_is_write() {
        let (symbols, field) = field_table();
        let expr = Expr::Assign {
            target: Box::new(Expr::name("i", TextRange::new(0, 1), field)),
            value: Box::new(Expr::Group { children: vec![] }),
        };
        let map = scan(&expr, &symbols);
        assert!(map.kinds(field).contains(UsageKind::Write));
        assert!(!map.kinds(field).contains(UsageKind::Read));
    }

    #[test]
    fn ref_argument_is_by_reference() {
        let (symbols, field) = field_table();
        let expr = Expr::Call {
            callee: None,
            args: vec![Argument {
                modifier: RefModifier::Ref,
                expr: Expr::name("i", TextRange::new(5, 6), field),
            }],
        };
        let map = scan(&expr, &symbols);
        assert!(map.kinds(field).has_by_reference_usage());
    }

    #[test]
    fn ambiguous_ref_argument_marks_all_field_candidates() {
        let mut symbols = SymbolTable::new();
        let a = symbols.insert("x", SymbolKind::Field, crate::snapshot::TypeId(0));
        let b = symbols.insert("x", SymbolKind::Field, crate::snapshot::TypeId(1));
        let local = symbols.insert("x", SymbolKind::Local, crate::snapshot::TypeId(0));

        let expr = Expr::Call {
            callee: None,
            args: vec![Argument {
                modifier: RefModifier::Out,
                expr: Expr::Name(NameRef::ambiguous(
                    "x",
                    TextRange::new(3, 4),
                    false,
                    vec![a, b, local],
                )),
            }],
        };
        let map = scan(&expr, &symbols);
        assert!(map.kinds(a).has_by_reference_usage());
        assert!(map.kinds(b).has_by_reference_usage());
        assert!(map.kinds(local).is_empty());
    }

    #[test]
    fn union_is_order_independent() {
        let (symbols, field) = field_table();
        let exprs = [
            Expr::name("i", TextRange::new(0, 1), field),
            Expr::Assign {
                target: Box::new(Expr::name("i", TextRange::new(10, 11), field)),
                value: Box::new(Expr::Group { children: vec![] }),
            },
            Expr::AddressOf {
                operand: Box::new(Expr::name("i", TextRange::new(20, 21), field)),
            },
        ];

        // Merge the per-subtree maps in every permutation; the result must
        // never change.
        let locals: Vec<UsageMap> = exprs.iter().map(|e| scan(e, &symbols)).collect();
        let orders: &[[usize; 3]] = &[
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let mut results = Vec::new();
        for order in orders {
            let mut merged = UsageMap::new();
            for &idx in order {
                merged.merge(locals[idx].clone());
            }
            merged.normalize();
            results.push(merged);
        }
        for result in &results[1..] {
            assert_eq!(results[0], *result);
        }
        assert!(results[0].kinds(field).has_by_reference_usage());
    }

    #[test]
    fn cancelled_scan_returns_no_partial_result() {
        let (symbols, field) = field_table();
        let snapshot = ProjectSnapshot {
            stamp: Default::default(),
            language: crate::adapter::Language::CSharp,
            language_version: crate::adapter::LanguageVersion(7),
            files: vec![crate::snapshot::SourceFile::new(FileId(0), "C.cs", "i")],
            symbols,
            fields: Vec::new(),
            properties: Vec::new(),
            exprs: vec![crate::snapshot::ExprRoot {
                file: FileId(0),
                expr: Expr::name("i", TextRange::new(0, 1), field),
            }],
            type_names: Vec::new(),
        };
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(collect_usages(&snapshot, &token), Err(Cancelled));
    }
}
