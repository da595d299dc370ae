//! Extended PL/SQL dialect for sqlparser-rs
//!
//! sqlparser has no Oracle dialect, so this module provides a custom dialect
//! that delegates to `GenericDialect` while adjusting identifier handling to
//! Oracle rules (`$` and `#` are legal identifier characters, delimited
//! identifiers use double quotes only).
//!
//! The token-level parsers in this crate (signature extraction, hierarchical
//! clause analysis) share this dialect so the whole engine tokenizes source
//! the same way.

use std::any::TypeId;

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, GenericDialect};
use sqlparser::parser::{Parser, ParserError};

/// Oracle-flavoured dialect wrapping `GenericDialect`.
#[derive(Debug)]
pub struct ExtendedPlSqlDialect {
    base: GenericDialect,
}

impl Default for ExtendedPlSqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtendedPlSqlDialect {
    pub fn new() -> Self {
        Self {
            base: GenericDialect {},
        }
    }
}

impl Dialect for ExtendedPlSqlDialect {
    // Report as GenericDialect for sqlparser's internal dialect_of!() checks,
    // so generic parsing paths stay enabled.
    fn dialect(&self) -> TypeId {
        TypeId::of::<GenericDialect>()
    }

    fn is_identifier_start(&self, ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn is_identifier_part(&self, ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' || ch == '#'
    }

    // Oracle delimits identifiers with double quotes only (no backticks)
    fn is_delimited_identifier_start(&self, ch: char) -> bool {
        ch == '"'
    }

    fn parse_statement(&self, parser: &mut Parser) -> Option<Result<Statement, ParserError>> {
        self.base.parse_statement(parser)
    }

    fn supports_connect_by(&self) -> bool {
        true
    }

    // Oracle SQL has no boolean literals; TRUE/FALSE stay identifiers
    fn supports_boolean_literals(&self) -> bool {
        false
    }

    fn supports_filter_during_aggregation(&self) -> bool {
        self.base.supports_filter_during_aggregation()
    }
}
