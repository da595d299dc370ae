//! End-to-end tests for the decomposition pipeline

use std::fs;

use plsql2pg::{decompose_container, decompose_containers};
use tempfile::TempDir;

const PACKAGE_BODY: &str = "\
CREATE OR REPLACE PACKAGE BODY emp_pkg AS

  -- package state
  g_counter NUMBER := 0;

  FUNCTION get_salary(p_id IN NUMBER) RETURN NUMBER IS
    v_sal NUMBER;
  BEGIN
    SELECT sal INTO v_sal FROM emp WHERE empno = p_id; -- lookup
    RETURN v_sal;
  END get_salary;

  PROCEDURE raise_salary(p_id IN NUMBER, p_amount IN NUMBER) IS
  BEGIN
    /* bump */
    UPDATE emp SET sal = sal + p_amount WHERE empno = p_id;
  END raise_salary;

END emp_pkg;
";

#[test]
fn test_decompose_produces_all_artifacts() {
    let artifacts = decompose_container("emp_pkg", PACKAGE_BODY).unwrap();

    assert_eq!(artifacts.container, "emp_pkg");
    assert_eq!(artifacts.segments.unit_count(), 2);
    assert_eq!(artifacts.stubs.len(), 2);
    assert!(!artifacts.cleaned.contains("-- package state"));
    assert!(!artifacts.reduced.contains("FUNCTION get_salary"));
    assert!(artifacts.reduced.contains("g_counter NUMBER := 0;"));
    assert!(artifacts.reduction_percentage() > 0.0);
}

#[test]
fn test_decompose_container_read_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("emp_pkg.pkb");
    fs::write(&path, PACKAGE_BODY).unwrap();

    let source = fs::read_to_string(&path).unwrap();
    let artifacts = decompose_container("emp_pkg", &source).unwrap();
    assert_eq!(artifacts.segments.unit_count(), 2);
    assert_eq!(artifacts.stubs[0].name, "get_salary");
    assert_eq!(artifacts.stubs[1].name, "raise_salary");
}

#[test]
fn test_batch_keeps_input_order_and_isolates_failures() {
    let broken = "FUNCTION broken RETURN NUMBER IS\nBEGIN\n  RETURN 1;\n".to_string();
    let containers = vec![
        ("good_pkg".to_string(), PACKAGE_BODY.to_string()),
        ("broken_pkg".to_string(), broken),
        ("also_good".to_string(), PACKAGE_BODY.to_string()),
    ];

    let results = decompose_containers(&containers);
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_err(), "one broken container must not stop the batch");
    assert!(results[2].is_ok());
}

#[test]
fn test_large_batch_takes_parallel_path() {
    // Past the threshold where decomposition fans out across threads
    let containers: Vec<(String, String)> = (0..12)
        .map(|i| (format!("pkg_{i}"), PACKAGE_BODY.to_string()))
        .collect();

    let results = decompose_containers(&containers);
    assert_eq!(results.len(), 12);
    for (i, result) in results.iter().enumerate() {
        let artifacts = result.as_ref().unwrap();
        assert_eq!(artifacts.container, format!("pkg_{i}"));
        assert_eq!(artifacts.segments.unit_count(), 2);
    }
}
