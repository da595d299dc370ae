//! Grammar parser wrapper
//!
//! Thin wrapper around the sqlparser engine for single SQL fragments. Syntax
//! errors are collected into the [`ParseOutcome`] instead of being raised, so
//! callers can decide between skip-and-continue and abort; the only hard
//! failures are a null/empty fragment (contract violation) and internal
//! parser breakage.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::parser::Parser;

use crate::error::TransformError;
use crate::parser::plsql_dialect::ExtendedPlSqlDialect;

/// Extract line number from a sqlparser error message (format: "... at Line: X, Column: Y")
static LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Line:\s*(\d+)").unwrap());

/// One collected syntax error.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    /// 1-based line number when the parser reported one.
    pub line: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Result of parsing one SQL fragment: the parse tree (when one could be
/// built) plus any syntax errors encountered.
#[derive(Debug)]
pub struct ParseOutcome {
    tree: Option<Statement>,
    errors: Vec<SyntaxError>,
    original_sql: String,
}

impl ParseOutcome {
    /// The parse tree root, present when parsing succeeded.
    pub fn tree(&self) -> Option<&Statement> {
        self.tree.as_ref()
    }

    /// Consumes the outcome, returning the tree.
    pub fn into_tree(self) -> Option<Statement> {
        self.tree
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn original_sql(&self) -> &str {
        &self.original_sql
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.tree.is_some()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All error messages joined, or `None` when parsing succeeded.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Parser for single SQL fragments against the PL/SQL dialect.
///
/// This is the only place that instantiates the sqlparser engine directly.
#[derive(Debug, Default)]
pub struct GrammarParser {
    dialect: ExtendedPlSqlDialect,
}

impl GrammarParser {
    pub fn new() -> Self {
        Self {
            dialect: ExtendedPlSqlDialect::new(),
        }
    }

    /// Parses a single SELECT statement (view definitions, query fragments).
    ///
    /// Empty or blank input is a contract violation and fails with
    /// [`TransformError::InvalidInput`]. Syntax errors never fail the call;
    /// they are collected into the outcome.
    pub fn parse_select(&self, sql: &str) -> Result<ParseOutcome, TransformError> {
        if sql.trim().is_empty() {
            return Err(TransformError::invalid_input(
                "SQL fragment cannot be null or empty",
            ));
        }

        match Parser::parse_sql(&self.dialect, sql) {
            Ok(mut statements) => {
                if statements.len() != 1 {
                    return Ok(ParseOutcome {
                        tree: None,
                        errors: vec![SyntaxError {
                            line: None,
                            message: format!(
                                "expected exactly one statement, found {}",
                                statements.len()
                            ),
                        }],
                        original_sql: sql.to_string(),
                    });
                }
                let statement = statements.remove(0);
                match statement {
                    Statement::Query(_) => Ok(ParseOutcome {
                        tree: Some(statement),
                        errors: Vec::new(),
                        original_sql: sql.to_string(),
                    }),
                    other => Ok(ParseOutcome {
                        tree: None,
                        errors: vec![SyntaxError {
                            line: None,
                            message: format!("expected a SELECT statement, found: {}", other),
                        }],
                        original_sql: sql.to_string(),
                    }),
                }
            }
            Err(err) => {
                let message = err.to_string();
                let line = extract_line_from_error(&message);
                Ok(ParseOutcome {
                    tree: None,
                    errors: vec![SyntaxError { line, message }],
                    original_sql: sql.to_string(),
                })
            }
        }
    }
}

fn extract_line_from_error(error_msg: &str) -> Option<usize> {
    let caps = LINE_RE.captures(error_msg)?;
    caps.get(1)?.as_str().parse().ok()
}
