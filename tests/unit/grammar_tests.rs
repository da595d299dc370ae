//! Unit tests for the grammar parser wrapper

use plsql2pg::parser::GrammarParser;
use plsql2pg::TransformError;

#[test]
fn test_parse_valid_select() {
    let parser = GrammarParser::new();
    let outcome = parser.parse_select("SELECT empno, ename FROM emp").unwrap();
    assert!(outcome.is_success());
    assert!(outcome.tree().is_some());
    assert!(outcome.errors().is_empty());
}

#[test]
fn test_empty_input_is_contract_violation() {
    let parser = GrammarParser::new();
    let err = parser.parse_select("").unwrap_err();
    assert!(matches!(err, TransformError::InvalidInput { .. }));
}

#[test]
fn test_blank_input_is_contract_violation() {
    let parser = GrammarParser::new();
    let err = parser.parse_select("   \n\t  ").unwrap_err();
    assert!(matches!(err, TransformError::InvalidInput { .. }));
}

#[test]
fn test_syntax_error_collected_not_raised() {
    let parser = GrammarParser::new();
    // Malformed SQL must not fail the call; errors land in the outcome
    let outcome = parser.parse_select("SELECT FROM WHERE").unwrap();
    assert!(outcome.has_errors());
    assert!(outcome.tree().is_none());
    assert!(!outcome.is_success());
}

#[test]
fn test_error_message_joins_errors() {
    let parser = GrammarParser::new();
    let outcome = parser.parse_select("SELECT FROM WHERE").unwrap();
    let message = outcome.error_message().unwrap();
    assert!(!message.is_empty());
}

#[test]
fn test_non_select_statement_rejected_via_outcome() {
    let parser = GrammarParser::new();
    let outcome = parser.parse_select("DELETE FROM emp").unwrap();
    assert!(outcome.has_errors());
    assert!(outcome
        .error_message()
        .unwrap()
        .contains("expected a SELECT statement"));
}

#[test]
fn test_original_sql_preserved() {
    let parser = GrammarParser::new();
    let sql = "SELECT 1 FROM dual";
    let outcome = parser.parse_select(sql).unwrap();
    assert_eq!(outcome.original_sql(), sql);
}

#[test]
fn test_oracle_identifiers_parse() {
    let parser = GrammarParser::new();
    let outcome = parser
        .parse_select("SELECT sid, serial# FROM v$session")
        .unwrap();
    assert!(outcome.is_success(), "errors: {:?}", outcome.errors());
}

#[test]
fn test_multiple_statements_rejected() {
    let parser = GrammarParser::new();
    let outcome = parser.parse_select("SELECT 1; SELECT 2").unwrap();
    assert!(outcome.has_errors());
    assert!(outcome
        .error_message()
        .unwrap()
        .contains("exactly one statement"));
}
