//! Transaction semantics: staleness, conflicts, and the VB adapter path.

mod common;

use autoprop::adapter::{Adapter, Language};
use autoprop::cancel::CancellationToken;
use autoprop::engine::coordinator::run_pass;
use autoprop::engine::plan::build_plan;
use autoprop::engine::transaction::commit;
use autoprop::engine::usage::collect_usages;
use autoprop::engine::{CommitFailure, IneligibleReason, PassOptions};
use autoprop::snapshot::{
    Accessibility, Accessor, Expr, FieldDeclarator, FieldModifiers, FieldStatement, FileId,
    ProjectSnapshot, PropertyDecl, PropertyFragment, SymbolId,
};
use pretty_assertions::assert_eq;

use common::{SnapshotBuilder, ident_in, range_of};

fn token() -> CancellationToken {
    CancellationToken::new()
}

fn csharp_pair() -> (ProjectSnapshot, SymbolId, SymbolId) {
    const SRC: &str = "class C { int i; int P { get { return i; } } }";
    let mut b = SnapshotBuilder::csharp(7);
    let file = b.file("C.cs", SRC);
    let ty = b.ty("C");
    let field = b.field_symbol("i", ty);
    let property = b.property_symbol("P", ty);
    b.fields.push(FieldStatement {
        file,
        range: range_of(SRC, "int i;"),
        declaring_type: ty,
        accessibility: Accessibility::Private,
        modifiers: FieldModifiers::default(),
        attributes: Vec::new(),
        declarators: vec![FieldDeclarator {
            symbol: field,
            name: "i".to_string(),
            range: ident_in(SRC, "int i;", "i"),
            initializer: None,
        }],
    });
    b.properties.push(PropertyDecl {
        symbol: property,
        name: "P".to_string(),
        declaring_type: ty,
        fragments: vec![PropertyFragment {
            file,
            range: range_of(SRC, "int P { get { return i; } }"),
            accessor_list_range: range_of(SRC, "{ get { return i; } }"),
            accessibility: Accessibility::Public,
            getter: Some(Accessor {
                range: range_of(SRC, "get { return i; }"),
                body: Expr::name("i", ident_in(SRC, "return i;", "i"), field),
                accessibility: None,
            }),
            setter: None,
            is_auto: false,
        }],
    });
    (b.finish(), field, property)
}

#[test]
fn stale_plan_is_rejected_at_commit() {
    let (snapshot, field, property) = csharp_pair();
    let adapter = Adapter::for_language(Language::CSharp);
    let usages = collect_usages(&snapshot, &token()).unwrap();
    let plan = build_plan(&snapshot, &adapter, &usages, field, property).unwrap();

    // The snapshot moves on before the plan commits.
    let mut moved = snapshot.clone();
    moved.stamp = moved.stamp.next();

    let failure = commit(&moved, &[plan], &token()).unwrap_err();
    assert!(matches!(failure, CommitFailure::StaleSnapshot { .. }));
    // Nothing was published.
    assert_eq!(moved.file(FileId(0)).unwrap().text, snapshot.files[0].text);
}

#[test]
fn overlapping_plans_report_a_conflict() {
    let (snapshot, field, property) = csharp_pair();
    let adapter = Adapter::for_language(Language::CSharp);
    let usages = collect_usages(&snapshot, &token()).unwrap();
    let plan_a = build_plan(&snapshot, &adapter, &usages, field, property).unwrap();
    let mut plan_b = plan_a.clone();
    plan_b.field = SymbolId(99);

    let failure = commit(&snapshot, &[plan_a, plan_b], &token()).unwrap_err();
    let CommitFailure::Conflict(report) = failure else {
        panic!("expected conflict, got {:?}", failure);
    };
    assert_eq!(report.file, FileId(0));
}

#[test]
fn cancelled_commit_publishes_nothing() {
    let (snapshot, field, property) = csharp_pair();
    let adapter = Adapter::for_language(Language::CSharp);
    let usages = collect_usages(&snapshot, &token()).unwrap();
    let plan = build_plan(&snapshot, &adapter, &usages, field, property).unwrap();

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    assert_eq!(
        commit(&snapshot, &[plan], &cancelled).unwrap_err(),
        CommitFailure::Cancelled
    );
}

fn vb_pair(version: u32) -> ProjectSnapshot {
    const SRC: &str = "Class C\n    Private i As Integer\n    ReadOnly Property P As Integer\n        Get\n            Return i\n        End Get\n    End Property\nEnd Class\n";
    const BODY: &str =
        "\n        Get\n            Return i\n        End Get\n    End Property";
    let mut b = SnapshotBuilder::vb(version);
    let file = b.file("C.vb", SRC);
    let ty = b.ty("C");
    let field = b.field_symbol("i", ty);
    let property = b.property_symbol("P", ty);
    b.fields.push(FieldStatement {
        file,
        range: range_of(SRC, "Private i As Integer"),
        declaring_type: ty,
        accessibility: Accessibility::Private,
        modifiers: FieldModifiers::default(),
        attributes: Vec::new(),
        declarators: vec![FieldDeclarator {
            symbol: field,
            name: "i".to_string(),
            range: ident_in(SRC, "Private i As Integer", "i"),
            initializer: None,
        }],
    });
    b.properties.push(PropertyDecl {
        symbol: property,
        name: "P".to_string(),
        declaring_type: ty,
        fragments: vec![PropertyFragment {
            file,
            range: range_of(SRC, &format!("ReadOnly Property P As Integer{}", BODY)),
            accessor_list_range: range_of(SRC, BODY),
            accessibility: Accessibility::Public,
            getter: Some(Accessor {
                range: range_of(SRC, "Get\n            Return i\n        End Get"),
                body: Expr::name("i", ident_in(SRC, "Return i", "i"), field),
                accessibility: None,
            }),
            setter: None,
            is_auto: false,
        }],
    });
    b.finish()
}

#[test]
fn vb_read_only_property_promotes_at_vb14() {
    let snapshot = vb_pair(14);
    let outcome = run_pass(&snapshot, &PassOptions::default(), &token()).unwrap();
    assert_eq!(outcome.diagnostics.len(), 1);

    let fixed =
        autoprop::engine::coordinator::fix(&snapshot, &outcome.diagnostics[0], &token()).unwrap();
    assert_eq!(
        fixed.snapshot.file(FileId(0)).unwrap().text,
        "Class C\n    ReadOnly Property P As Integer\nEnd Class\n"
    );
}

#[test]
fn vb_read_only_property_is_gated_before_vb14() {
    let snapshot = vb_pair(12);
    let outcome = run_pass(&snapshot, &PassOptions::default(), &token()).unwrap();
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(
        outcome.analyses[0].verdict.ineligible_reason(),
        Some(IneligibleReason::ReadOnlyPropertyUnsupported)
    );
}
