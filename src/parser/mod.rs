//! Parsing layer: dialect, grammar wrapper, and token-level analyzers
//!
//! `grammar` is the only module that runs the full parser engine; `signature`
//! and `hierarchy` work directly on token streams, which is both cheaper and
//! tolerant of procedural syntax the SQL grammar does not cover.

mod grammar;
mod hierarchy;
mod plsql_dialect;
mod signature;

pub use grammar::{GrammarParser, ParseOutcome, SyntaxError};
pub use hierarchy::{
    HierarchicalQueryComponents, HierarchyAnalyzer, PathColumn, PriorExpression, PseudoColumnUsage,
};
pub use plsql_dialect::ExtendedPlSqlDialect;
pub use signature::{
    parse_unit_metadata, ParameterMode, SignatureTokenParser, UnitMetadata, UnitParameter,
};
