//! Unit tests for the semantic tree pipeline (parse, build, emit)

use plsql2pg::semantic::{ColumnInfo, MetadataIndices, TransformationContext};
use plsql2pg::{transform_select, TransformError};
use pretty_assertions::assert_eq;

fn bare_ctx() -> TransformationContext {
    TransformationContext::bare("hr")
}

#[test]
fn test_simple_select_round_trips() {
    let out = transform_select("SELECT empno, ename FROM emp", &bare_ctx()).unwrap();
    assert_eq!(out, "SELECT empno, ename FROM emp");
}

#[test]
fn test_table_alias_round_trips() {
    let out = transform_select("SELECT empno FROM employees e", &bare_ctx()).unwrap();
    assert_eq!(out, "SELECT empno FROM employees e");
}

#[test]
fn test_aliased_column_references_kept() {
    let out = transform_select("SELECT e.empno, e.ename FROM emp e", &bare_ctx()).unwrap();
    assert_eq!(out, "SELECT e.empno, e.ename FROM emp e");
}

#[test]
fn test_nvl_becomes_coalesce() {
    let out = transform_select("SELECT NVL(comm, 0) FROM emp", &bare_ctx()).unwrap();
    assert_eq!(out, "SELECT COALESCE(comm, 0) FROM emp");
}

#[test]
fn test_nvl_wrong_arity_rejected() {
    let one = transform_select("SELECT NVL(comm) FROM emp", &bare_ctx()).unwrap_err();
    match one {
        TransformError::InvalidInput { message } => {
            assert!(message.contains("found: 1"), "got: {message}");
        }
        other => panic!("expected InvalidInput, got: {other}"),
    }

    let three = transform_select("SELECT NVL(comm, 0, 1) FROM emp", &bare_ctx()).unwrap_err();
    assert!(matches!(three, TransformError::InvalidInput { .. }));
}

#[test]
fn test_decode_is_unsupported() {
    let err =
        transform_select("SELECT DECODE(deptno, 10, 'ACC', 'OTHER') FROM emp", &bare_ctx())
            .unwrap_err();
    match err {
        TransformError::UnsupportedConstruct { construct } => {
            assert!(construct.contains("DECODE"), "got: {construct}");
        }
        other => panic!("expected UnsupportedConstruct, got: {other}"),
    }
}

#[test]
fn test_sysdate_becomes_current_timestamp() {
    let out = transform_select("SELECT SYSDATE FROM dual", &bare_ctx()).unwrap();
    assert_eq!(out, "SELECT CURRENT_TIMESTAMP FROM dual");
}

#[test]
fn test_where_predicates_round_trip() {
    let out = transform_select(
        "SELECT ename FROM emp WHERE sal > 1000 AND comm IS NOT NULL",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(out, "SELECT ename FROM emp WHERE sal > 1000 AND comm IS NOT NULL");
}

#[test]
fn test_between_and_in_list() {
    let out = transform_select(
        "SELECT ename FROM emp WHERE sal BETWEEN 1000 AND 2000 AND deptno IN (10, 20)",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(
        out,
        "SELECT ename FROM emp WHERE sal BETWEEN 1000 AND 2000 AND deptno IN (10, 20)"
    );
}

#[test]
fn test_searched_case_expression() {
    let out = transform_select(
        "SELECT CASE WHEN sal > 2000 THEN 'high' ELSE 'low' END FROM emp",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(
        out,
        "SELECT CASE WHEN sal > 2000 THEN 'high' ELSE 'low' END FROM emp"
    );
}

#[test]
fn test_simple_case_with_operand() {
    let out = transform_select(
        "SELECT CASE deptno WHEN 10 THEN 'ACC' END FROM emp",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(out, "SELECT CASE deptno WHEN 10 THEN 'ACC' END FROM emp");
}

#[test]
fn test_order_by_with_direction_and_nulls() {
    let out = transform_select(
        "SELECT ename FROM emp ORDER BY sal DESC NULLS LAST, ename",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(out, "SELECT ename FROM emp ORDER BY sal DESC NULLS LAST, ename");
}

#[test]
fn test_distinct_select() {
    let out = transform_select("SELECT DISTINCT deptno FROM emp", &bare_ctx()).unwrap();
    assert_eq!(out, "SELECT DISTINCT deptno FROM emp");
}

#[test]
fn test_group_by_and_having() {
    let out = transform_select(
        "SELECT deptno, COUNT(*) FROM emp GROUP BY deptno HAVING COUNT(*) > 3",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(
        out,
        "SELECT deptno, COUNT(*) FROM emp GROUP BY deptno HAVING COUNT(*) > 3"
    );
}

#[test]
fn test_union_all() {
    let out = transform_select(
        "SELECT empno FROM emp UNION ALL SELECT empno FROM emp_archive",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(out, "SELECT empno FROM emp UNION ALL SELECT empno FROM emp_archive");
}

#[test]
fn test_with_clause() {
    let out = transform_select(
        "WITH dept_emps AS (SELECT empno FROM emp) SELECT empno FROM dept_emps",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(
        out,
        "WITH dept_emps AS (SELECT empno FROM emp) SELECT empno FROM dept_emps"
    );
}

#[test]
fn test_synonym_table_resolved_to_target() {
    let indices = MetadataIndices::builder()
        .synonym("hr", "emp_syn", "hr.employees")
        .build();
    let ctx = TransformationContext::new("hr", indices);

    let out = transform_select("SELECT ename FROM emp_syn", &ctx).unwrap();
    assert_eq!(out, "SELECT ename FROM hr.employees");
}

#[test]
fn test_public_synonym_fallback() {
    let indices = MetadataIndices::builder()
        .synonym("public", "all_emps", "hr.employees")
        .build();
    let ctx = TransformationContext::new("sales", indices);

    let out = transform_select("SELECT ename FROM all_emps", &ctx).unwrap();
    assert_eq!(out, "SELECT ename FROM hr.employees");
}

#[test]
fn test_cte_name_shadows_synonym() {
    let indices = MetadataIndices::builder()
        .synonym("hr", "emp_syn", "hr.employees")
        .build();
    let ctx = TransformationContext::new("hr", indices);

    let out = transform_select(
        "WITH emp_syn AS (SELECT 1 FROM dual) SELECT 1 FROM emp_syn",
        &ctx,
    )
    .unwrap();
    assert_eq!(out, "WITH emp_syn AS (SELECT 1 FROM dual) SELECT 1 FROM emp_syn");
}

#[test]
fn test_subquery_in_from() {
    let out = transform_select(
        "SELECT empno FROM (SELECT empno FROM emp) t",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(out, "SELECT empno FROM (SELECT empno FROM emp) t");
}

#[test]
fn test_in_subquery_and_exists() {
    let out = transform_select(
        "SELECT ename FROM emp WHERE deptno IN (SELECT deptno FROM dept) AND EXISTS (SELECT 1 FROM dept)",
        &bare_ctx(),
    )
    .unwrap();
    assert_eq!(
        out,
        "SELECT ename FROM emp WHERE deptno IN (SELECT deptno FROM dept) AND EXISTS (SELECT 1 FROM dept)"
    );
}

#[test]
fn test_for_update_is_unsupported() {
    let err = transform_select("SELECT ename FROM emp FOR UPDATE", &bare_ctx()).unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedConstruct { .. }));
}

#[test]
fn test_explicit_join_is_unsupported() {
    let err = transform_select(
        "SELECT e.ename FROM emp e JOIN dept d ON e.deptno = d.deptno",
        &bare_ctx(),
    )
    .unwrap_err();
    assert!(matches!(err, TransformError::UnsupportedConstruct { .. }));
}

#[test]
fn test_syntax_errors_surface_as_error() {
    let err = transform_select("SELECT FROM WHERE", &bare_ctx()).unwrap_err();
    match err {
        TransformError::SyntaxErrors { count, .. } => assert!(count >= 1),
        other => panic!("expected SyntaxErrors, got: {other}"),
    }
}

#[test]
fn test_empty_select_list_rejected() {
    use plsql2pg::semantic::SemanticNode;

    let node = SemanticNode::QueryBlock {
        distinct: false,
        select_items: Vec::new(),
        from: Vec::new(),
        selection: None,
        group_by: Vec::new(),
        having: None,
    };
    let err = node.emit(&bare_ctx()).unwrap_err();
    assert!(matches!(err, TransformError::InvalidInput { .. }));
}

fn address_ctx() -> TransformationContext {
    let indices = MetadataIndices::builder()
        .table(
            "hr.employees",
            vec![
                ColumnInfo::new("empno", "NUMBER"),
                ColumnInfo::new("addr", "address_t").with_type_owner("hr"),
            ],
        )
        .type_method("hr.address_t", "formatted")
        .object_type("hr.address_t")
        .build();
    TransformationContext::new("hr", indices)
}

#[test]
fn test_parameterless_package_function_gains_call_parentheses() {
    let indices = MetadataIndices::builder()
        .package_function("hr.rates_pkg.default_rate")
        .build();
    let ctx = TransformationContext::new("hr", indices);

    let out = transform_select("SELECT rates_pkg.default_rate FROM dual", &ctx).unwrap();
    assert_eq!(out, "SELECT rates_pkg.default_rate() FROM dual");
}

#[test]
fn test_from_table_column_beats_package_function() {
    let indices = MetadataIndices::builder()
        .table("hr.emp", vec![ColumnInfo::new("ename", "VARCHAR2")])
        .package_function("hr.emp.ename")
        .build();
    let ctx = TransformationContext::new("hr", indices);

    let out = transform_select("SELECT emp.ename FROM emp", &ctx).unwrap();
    assert_eq!(out, "SELECT emp.ename FROM emp");
}

#[test]
fn test_catalog_column_reference_outside_from() {
    let indices = MetadataIndices::builder()
        .table("hr.emp", vec![ColumnInfo::new("ename", "VARCHAR2")])
        .package_function("hr.emp.ename")
        .build();
    let ctx = TransformationContext::new("hr", indices);

    // emp is absent from FROM; the catalog still marks emp.ename a column
    let out = transform_select("SELECT emp.ename FROM dual", &ctx).unwrap();
    assert_eq!(out, "SELECT emp.ename FROM dual");
}

#[test]
fn test_type_method_reference_becomes_function_call() {
    let out =
        transform_select("SELECT e.addr.formatted FROM employees e", &address_ctx()).unwrap();
    assert_eq!(out, "SELECT hr.address_t_formatted(e.addr) FROM employees e");
}

#[test]
fn test_type_method_call_keeps_arguments() {
    let out =
        transform_select("SELECT e.addr.formatted(1) FROM employees e", &address_ctx()).unwrap();
    assert_eq!(
        out,
        "SELECT hr.address_t_formatted(e.addr, 1) FROM employees e"
    );
}

#[test]
fn test_unknown_three_part_identifier_passes_through() {
    let out = transform_select("SELECT e.addr.street FROM employees e", &address_ctx()).unwrap();
    assert_eq!(out, "SELECT e.addr.street FROM employees e");
}
