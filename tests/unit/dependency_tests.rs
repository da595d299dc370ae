//! Unit tests for composite-type dependency resolution

use plsql2pg::model::{resolve_creation_order, CompositeType, TypeAttribute};

fn ty(name: &str) -> CompositeType {
    CompositeType::new("hr", name)
}

fn ty_ref(name: &str, referenced: &str) -> CompositeType {
    CompositeType::new("hr", name).with_attributes(vec![TypeAttribute::referencing(
        "member",
        referenced,
        format!("hr.{referenced}"),
    )])
}

#[test]
fn test_chain_orders_dependencies_first() {
    // a references b, b references c
    let types = vec![ty_ref("a", "b"), ty_ref("b", "c"), ty("c")];
    let analysis = resolve_creation_order(&types);
    assert_eq!(analysis.ordered, vec!["hr.c", "hr.b", "hr.a"]);
    assert!(!analysis.has_cycles());
}

#[test]
fn test_independent_types_keep_input_order() {
    let types = vec![ty("zeta"), ty("alpha"), ty("mid")];
    let analysis = resolve_creation_order(&types);
    assert_eq!(analysis.ordered, vec!["hr.zeta", "hr.alpha", "hr.mid"]);
}

#[test]
fn test_two_type_cycle_reported() {
    let types = vec![ty_ref("a", "b"), ty_ref("b", "a")];
    let analysis = resolve_creation_order(&types);

    assert!(analysis.has_cycles());
    assert_eq!(analysis.cycles.len(), 1);

    let chain = &analysis.cycles[0].chain;
    assert_eq!(chain.len(), 3, "two-type cycle closes back on itself");
    assert_eq!(chain.first(), chain.last());

    // Cyclic types still get a creation attempt
    assert_eq!(analysis.ordered.len(), 2);
    assert!(analysis.ordered.contains(&"hr.a".to_string()));
    assert!(analysis.ordered.contains(&"hr.b".to_string()));
}

#[test]
fn test_cycle_display_joins_with_arrows() {
    let types = vec![ty_ref("a", "b"), ty_ref("b", "a")];
    let analysis = resolve_creation_order(&types);
    let rendered = analysis.cycles[0].to_string();
    assert!(rendered.contains(" -> "), "got: {rendered}");
}

#[test]
fn test_out_of_scope_references_ignored() {
    // b is not part of this run, so a has no in-scope dependencies
    let types = vec![ty_ref("a", "b")];
    let analysis = resolve_creation_order(&types);
    assert_eq!(analysis.ordered, vec!["hr.a"]);
    assert!(!analysis.has_cycles());
    assert!(analysis.graph["hr.a"].is_empty());
}

#[test]
fn test_self_reference_is_not_a_dependency() {
    let types = vec![ty_ref("node", "node")];
    let analysis = resolve_creation_order(&types);
    assert_eq!(analysis.ordered, vec!["hr.node"]);
    assert!(!analysis.has_cycles());
}

#[test]
fn test_duplicate_references_collapse_to_one_edge() {
    let types = vec![
        CompositeType::new("hr", "pair").with_attributes(vec![
            TypeAttribute::referencing("first", "point", "hr.point"),
            TypeAttribute::referencing("second", "point", "hr.point"),
        ]),
        ty("point"),
    ];
    let analysis = resolve_creation_order(&types);
    assert_eq!(analysis.graph["hr.pair"], vec!["hr.point"]);
    assert_eq!(analysis.ordered, vec!["hr.point", "hr.pair"]);
}

#[test]
fn test_diamond_is_deterministic() {
    // top references left and right; both reference base
    let types = vec![
        CompositeType::new("hr", "top").with_attributes(vec![
            TypeAttribute::referencing("l", "left", "hr.left"),
            TypeAttribute::referencing("r", "right", "hr.right"),
        ]),
        ty_ref("left", "base"),
        ty_ref("right", "base"),
        ty("base"),
    ];
    let analysis = resolve_creation_order(&types);
    assert_eq!(
        analysis.ordered,
        vec!["hr.base", "hr.left", "hr.right", "hr.top"]
    );

    // Same input, same order, every time
    let again = resolve_creation_order(&types);
    assert_eq!(again.ordered, analysis.ordered);
}

#[test]
fn test_cycle_plus_independent_type() {
    let types = vec![ty_ref("a", "b"), ty_ref("b", "a"), ty("standalone")];
    let analysis = resolve_creation_order(&types);

    assert_eq!(analysis.cycles.len(), 1);
    assert_eq!(analysis.ordered.len(), 3);
    // The acyclic type orders first; cyclic leftovers append in input order
    assert_eq!(analysis.ordered, vec!["hr.standalone", "hr.a", "hr.b"]);
}

#[test]
fn test_three_type_cycle_chain() {
    let types = vec![ty_ref("a", "b"), ty_ref("b", "c"), ty_ref("c", "a")];
    let analysis = resolve_creation_order(&types);

    assert_eq!(analysis.cycles.len(), 1);
    let chain = &analysis.cycles[0].chain;
    assert_eq!(chain.len(), 4);
    assert_eq!(chain.first(), chain.last());
    assert_eq!(analysis.ordered, vec!["hr.a", "hr.b", "hr.c"]);
}

#[test]
fn test_qualified_names_fold_case() {
    let types = vec![
        CompositeType::new("HR", "Outer").with_attributes(vec![
            TypeAttribute::referencing("inner", "Inner_T", "HR.INNER_T"),
        ]),
        CompositeType::new("hr", "inner_t"),
    ];
    let analysis = resolve_creation_order(&types);
    assert_eq!(analysis.ordered, vec!["hr.inner_t", "hr.outer"]);
}
