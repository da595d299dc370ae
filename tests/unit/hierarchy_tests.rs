//! Unit tests for CONNECT BY analysis

use plsql2pg::parser::HierarchyAnalyzer;
use plsql2pg::TransformError;

const BASIC: &str =
    "SELECT empno, ename, LEVEL FROM emp START WITH mgr IS NULL CONNECT BY PRIOR empno = mgr";

#[test]
fn test_basic_hierarchy_components() {
    let components = HierarchyAnalyzer::analyze(BASIC).unwrap();
    assert_eq!(components.base_table(), "emp");
    assert!(components.base_alias().is_none());
    assert_eq!(components.start_with_predicate(), Some("mgr IS NULL"));
    assert!(!components.no_cycle());

    let prior = components.prior_expression();
    assert!(prior.prior_on_left());
    assert_eq!(prior.prior_column(), "empno");
    assert_eq!(prior.child_column(), "mgr");

    assert!(components.pseudo_columns().uses_level_in_select);
    assert!(!components.pseudo_columns().uses_level_in_filter);
    assert!(components.pseudo_columns().uses_level());
}

#[test]
fn test_table_alias_captured() {
    let components = HierarchyAnalyzer::analyze(
        "SELECT e.ename FROM emp e CONNECT BY PRIOR e.empno = e.mgr",
    )
    .unwrap();
    assert_eq!(components.base_table(), "emp");
    assert_eq!(components.base_alias(), Some("e"));
}

#[test]
fn test_start_with_optional() {
    let components =
        HierarchyAnalyzer::analyze("SELECT ename FROM emp CONNECT BY PRIOR empno = mgr").unwrap();
    assert!(components.start_with_predicate().is_none());
}

#[test]
fn test_nocycle_flag() {
    let components = HierarchyAnalyzer::analyze(
        "SELECT ename FROM emp CONNECT BY NOCYCLE PRIOR empno = mgr",
    )
    .unwrap();
    assert!(components.no_cycle());
    assert_eq!(components.prior_expression().prior_column(), "empno");
}

#[test]
fn test_prior_on_right_side() {
    let components =
        HierarchyAnalyzer::analyze("SELECT ename FROM emp CONNECT BY mgr = PRIOR empno").unwrap();
    let prior = components.prior_expression();
    assert!(!prior.prior_on_left());
    assert_eq!(prior.prior_column(), "empno");
    assert_eq!(prior.child_column(), "mgr");
}

#[test]
fn test_join_condition_strips_qualifiers() {
    let components = HierarchyAnalyzer::analyze(
        "SELECT e.ename FROM emp e CONNECT BY PRIOR e.empno = e.mgr",
    )
    .unwrap();
    assert_eq!(
        components.prior_expression().join_condition("e", "eh"),
        "e.mgr = eh.empno"
    );
}

#[test]
fn test_no_connect_by_is_contract_violation() {
    let err = HierarchyAnalyzer::analyze("SELECT ename FROM emp").unwrap_err();
    assert!(matches!(err, TransformError::InvalidInput { .. }));
}

#[test]
fn test_multiple_tables_unsupported() {
    let err = HierarchyAnalyzer::analyze(
        "SELECT e.ename FROM emp e, dept d CONNECT BY PRIOR e.empno = e.mgr",
    )
    .unwrap_err();
    match err {
        TransformError::UnsupportedConstruct { construct } => {
            assert!(construct.contains("multiple tables"), "got: {construct}");
        }
        other => panic!("expected UnsupportedConstruct, got: {other}"),
    }
}

#[test]
fn test_join_in_from_unsupported() {
    let err = HierarchyAnalyzer::analyze(
        "SELECT e.ename FROM emp e JOIN dept d ON e.deptno = d.deptno CONNECT BY PRIOR e.empno = e.mgr",
    )
    .unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedConstruct { .. }));
}

#[test]
fn test_subquery_in_from_unsupported() {
    let err = HierarchyAnalyzer::analyze(
        "SELECT ename FROM (SELECT * FROM emp) CONNECT BY PRIOR empno = mgr",
    )
    .unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedConstruct { .. }));
}

#[test]
fn test_non_equality_recursion_unsupported() {
    let err = HierarchyAnalyzer::analyze(
        "SELECT ename FROM emp CONNECT BY PRIOR empno = mgr AND sal = comm",
    )
    .unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedConstruct { .. }));
}

#[test]
fn test_missing_prior_unsupported() {
    let err =
        HierarchyAnalyzer::analyze("SELECT ename FROM emp CONNECT BY empno = mgr").unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedConstruct { .. }));
}

#[test]
fn test_level_in_filter() {
    let components = HierarchyAnalyzer::analyze(
        "SELECT ename FROM emp WHERE LEVEL <= 3 CONNECT BY PRIOR empno = mgr",
    )
    .unwrap();
    assert!(components.pseudo_columns().uses_level_in_filter);
    assert!(!components.pseudo_columns().uses_level_in_select);
}

#[test]
fn test_qualified_level_is_plain_column() {
    // e.level is a column reference, not the pseudo-column
    let components = HierarchyAnalyzer::analyze(
        "SELECT e.level FROM emp e CONNECT BY PRIOR e.empno = e.mgr",
    )
    .unwrap();
    assert!(!components.pseudo_columns().uses_level());
}

#[test]
fn test_connect_by_root_and_isleaf_flags() {
    let components = HierarchyAnalyzer::analyze(
        "SELECT CONNECT_BY_ROOT ename, CONNECT_BY_ISLEAF FROM emp CONNECT BY PRIOR empno = mgr",
    )
    .unwrap();
    assert!(components.pseudo_columns().uses_connect_by_root);
    assert!(components.pseudo_columns().uses_connect_by_is_leaf);
}

#[test]
fn test_path_column_collected() {
    let components = HierarchyAnalyzer::analyze(
        "SELECT SYS_CONNECT_BY_PATH(ename, '/') FROM emp CONNECT BY PRIOR empno = mgr",
    )
    .unwrap();
    let paths = &components.pseudo_columns().path_columns;
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].expression, "ename");
    assert_eq!(paths[0].separator, "/");
    assert_eq!(paths[0].column_name, "path_1");
}

#[test]
fn test_duplicate_path_calls_deduplicated() {
    let components = HierarchyAnalyzer::analyze(
        "SELECT SYS_CONNECT_BY_PATH(ename, '/'), SYS_CONNECT_BY_PATH(ename, '/') \
         FROM emp CONNECT BY PRIOR empno = mgr",
    )
    .unwrap();
    assert_eq!(components.pseudo_columns().path_columns.len(), 1);
}

#[test]
fn test_distinct_separators_get_distinct_columns() {
    let components = HierarchyAnalyzer::analyze(
        "SELECT SYS_CONNECT_BY_PATH(ename, '/'), SYS_CONNECT_BY_PATH(ename, '->') \
         FROM emp CONNECT BY PRIOR empno = mgr",
    )
    .unwrap();
    let paths = &components.pseudo_columns().path_columns;
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].column_name, "path_1");
    assert_eq!(paths[1].column_name, "path_2");
    assert_eq!(paths[1].separator, "->");
}

#[test]
fn test_path_call_wrong_arity_rejected() {
    let err = HierarchyAnalyzer::analyze(
        "SELECT SYS_CONNECT_BY_PATH(ename) FROM emp CONNECT BY PRIOR empno = mgr",
    )
    .unwrap_err();
    match err {
        TransformError::InvalidInput { message } => {
            assert!(message.contains("exactly 2 arguments"), "got: {message}");
        }
        other => panic!("expected InvalidInput, got: {other}"),
    }
}

#[test]
fn test_path_separator_must_be_literal() {
    let err = HierarchyAnalyzer::analyze(
        "SELECT SYS_CONNECT_BY_PATH(ename, sep_col) FROM emp CONNECT BY PRIOR empno = mgr",
    )
    .unwrap_err();
    assert!(matches!(err, TransformError::InvalidInput { .. }));
}

#[test]
fn test_multiple_connect_by_clauses_unsupported() {
    let err = HierarchyAnalyzer::analyze(
        "SELECT ename FROM emp CONNECT BY PRIOR empno = mgr CONNECT BY PRIOR empno = mgr",
    )
    .unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedConstruct { .. }));
}
