//! Token-based unit signature parsing
//!
//! Extracts metadata (name, kind, parameters, return type) from a callable
//! unit's signature or stub. Because stubs carry the full signature with a
//! minimal body, tokenizing a stub is all that metadata extraction ever needs
//! — the full implementation is parsed only when a unit is actually selected
//! for transformation.
//!
//! ## Supported syntax
//!
//! ```sql
//! FUNCTION name(p1 IN NUMBER, p2 IN OUT VARCHAR2 DEFAULT 'x') RETURN NUMBER IS ...
//! PROCEDURE name(p1 OUT NUMBER) IS ...
//! MEMBER FUNCTION name RETURN VARCHAR2 IS ...
//! STATIC PROCEDURE name(...) IS ...
//! MAP MEMBER FUNCTION name RETURN NUMBER IS ...
//! ORDER MEMBER FUNCTION name(other mytype) RETURN INTEGER IS ...
//! CONSTRUCTOR FUNCTION name(...) RETURN SELF AS RESULT IS ...
//! ```

use sqlparser::tokenizer::{Token, TokenWithSpan, Tokenizer};

use crate::error::TransformError;
use crate::parser::plsql_dialect::ExtendedPlSqlDialect;
use crate::segment::UnitKind;

/// Parameter passing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    #[default]
    In,
    Out,
    InOut,
}

impl ParameterMode {
    pub fn as_sql(self) -> &'static str {
        match self {
            ParameterMode::In => "IN",
            ParameterMode::Out => "OUT",
            ParameterMode::InOut => "IN OUT",
        }
    }
}

/// A parameter extracted from a unit signature.
#[derive(Debug, Clone)]
pub struct UnitParameter {
    pub name: String,
    pub mode: ParameterMode,
    /// Data type, uppercased (e.g. "NUMBER", "VARCHAR2(100)", "EMP.SAL%TYPE")
    pub data_type: String,
    /// Default value expression, if specified
    pub default_value: Option<String>,
}

/// Metadata extracted from one unit signature.
#[derive(Debug, Clone)]
pub struct UnitMetadata {
    pub name: String,
    pub kind: UnitKind,
    pub parameters: Vec<UnitParameter>,
    /// Return type for value-returning units; `SELF` for constructors.
    pub return_type: Option<String>,
}

/// Parses one unit signature (or stub) into metadata.
///
/// Fails with [`TransformError::InvalidInput`] when the text does not start
/// with a recognizable unit signature.
pub fn parse_unit_metadata(sql: &str) -> Result<UnitMetadata, TransformError> {
    if sql.trim().is_empty() {
        return Err(TransformError::invalid_input(
            "unit signature cannot be null or empty",
        ));
    }
    SignatureTokenParser::new(sql)
        .and_then(|mut p| p.parse_signature())
        .ok_or_else(|| {
            TransformError::invalid_input(format!(
                "unable to parse unit signature: {}",
                sql.lines().next().unwrap_or_default()
            ))
        })
}

/// Token-based signature parser.
pub struct SignatureTokenParser {
    tokens: Vec<TokenWithSpan>,
    pos: usize,
}

impl SignatureTokenParser {
    /// Create a new parser for a signature string.
    pub fn new(sql: &str) -> Option<Self> {
        let dialect = ExtendedPlSqlDialect::new();
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize_with_location()
            .ok()?;

        Some(Self { tokens, pos: 0 })
    }

    /// Parse the signature and return unit metadata.
    pub fn parse_signature(&mut self) -> Option<UnitMetadata> {
        self.skip_whitespace();

        let kind = self.parse_kind()?;
        self.skip_whitespace();

        let name = self.parse_identifier()?;
        self.skip_whitespace();

        let parameters = self.parse_parameters();
        self.skip_whitespace();

        let return_type = if self.check_word_ci("RETURN") {
            self.advance();
            self.skip_whitespace();
            if self.check_word_ci("SELF") {
                // Constructor form: RETURN SELF AS RESULT
                self.advance();
                Some("SELF".to_string())
            } else {
                Some(self.parse_data_type()?)
            }
        } else {
            None
        };

        Some(UnitMetadata {
            name,
            kind,
            parameters,
            return_type,
        })
    }

    /// Parse the introducer keyword sequence into a unit kind.
    fn parse_kind(&mut self) -> Option<UnitKind> {
        if self.check_word_ci("FUNCTION") {
            self.advance();
            return Some(UnitKind::Function);
        }
        if self.check_word_ci("PROCEDURE") {
            self.advance();
            return Some(UnitKind::Procedure);
        }
        if self.check_word_ci("MEMBER") {
            self.advance();
            self.skip_whitespace();
            if self.check_word_ci("FUNCTION") {
                self.advance();
                return Some(UnitKind::MemberFunction);
            }
            if self.check_word_ci("PROCEDURE") {
                self.advance();
                return Some(UnitKind::MemberProcedure);
            }
            return None;
        }
        if self.check_word_ci("STATIC") {
            self.advance();
            self.skip_whitespace();
            if self.check_word_ci("FUNCTION") {
                self.advance();
                return Some(UnitKind::StaticFunction);
            }
            if self.check_word_ci("PROCEDURE") {
                self.advance();
                return Some(UnitKind::StaticProcedure);
            }
            return None;
        }
        if self.check_word_ci("MAP") {
            self.advance();
            self.skip_whitespace();
            if self.check_word_ci("MEMBER") {
                self.advance();
                self.skip_whitespace();
                if self.check_word_ci("FUNCTION") {
                    self.advance();
                    return Some(UnitKind::MapFunction);
                }
            }
            return None;
        }
        if self.check_word_ci("ORDER") {
            self.advance();
            self.skip_whitespace();
            if self.check_word_ci("MEMBER") {
                self.advance();
                self.skip_whitespace();
                if self.check_word_ci("FUNCTION") {
                    self.advance();
                    return Some(UnitKind::OrderFunction);
                }
            }
            return None;
        }
        if self.check_word_ci("CONSTRUCTOR") {
            self.advance();
            self.skip_whitespace();
            if self.check_word_ci("FUNCTION") {
                self.advance();
                return Some(UnitKind::Constructor);
            }
            return None;
        }
        None
    }

    /// Parse the parameter list: `(name [IN|OUT|IN OUT] TYPE [DEFAULT expr], ...)`
    fn parse_parameters(&mut self) -> Vec<UnitParameter> {
        let mut params = Vec::new();

        if !self.check_token(&Token::LParen) {
            // Parameterless units have no parentheses at all
            return params;
        }
        self.advance();
        self.skip_whitespace();

        if self.check_token(&Token::RParen) {
            self.advance();
            return params;
        }

        loop {
            if let Some(param) = self.parse_single_parameter() {
                params.push(param);
            } else {
                self.skip_to_param_delimiter();
            }

            self.skip_whitespace();

            if self.check_token(&Token::Comma) {
                self.advance();
                self.skip_whitespace();
            } else if self.check_token(&Token::RParen) {
                self.advance();
                break;
            } else {
                // Unexpected token, recover by finding the closing paren
                self.skip_to_token(&Token::RParen);
                if self.check_token(&Token::RParen) {
                    self.advance();
                }
                break;
            }
        }

        params
    }

    fn parse_single_parameter(&mut self) -> Option<UnitParameter> {
        let name = self.parse_identifier()?;
        self.skip_whitespace();

        let mode = self.parse_mode();
        self.skip_whitespace();

        // NOCOPY hint carries no type information
        if self.check_word_ci("NOCOPY") {
            self.advance();
            self.skip_whitespace();
        }

        let data_type = self.parse_data_type()?;
        self.skip_whitespace();

        let default_value = if self.check_word_ci("DEFAULT") || self.check_token(&Token::Assignment)
        {
            self.advance();
            self.skip_whitespace();
            Some(self.parse_default_value())
        } else {
            None
        };

        Some(UnitParameter {
            name,
            mode,
            data_type,
            default_value,
        })
    }

    fn parse_mode(&mut self) -> ParameterMode {
        if self.check_word_ci("IN") {
            self.advance();
            self.skip_whitespace();
            if self.check_word_ci("OUT") {
                self.advance();
                return ParameterMode::InOut;
            }
            return ParameterMode::In;
        }
        if self.check_word_ci("OUT") {
            self.advance();
            return ParameterMode::Out;
        }
        ParameterMode::In
    }

    /// Parse a data type: `NUMBER`, `VARCHAR2(100)`, `hr.address_type`,
    /// `emp.sal%TYPE`. Uppercased for normalization.
    fn parse_data_type(&mut self) -> Option<String> {
        let mut result = String::new();

        let base = self.parse_identifier()?;
        result.push_str(&base.to_uppercase());

        // Qualified type names (schema.type or table.column%TYPE)
        while self.check_token(&Token::Period) {
            self.advance();
            let part = self.parse_identifier()?;
            result.push('.');
            result.push_str(&part.to_uppercase());
        }

        // Length/precision arguments, e.g. VARCHAR2(100) or NUMBER(10, 2)
        self.skip_whitespace();
        if self.check_token(&Token::LParen) {
            result.push('(');
            self.advance();
            let mut depth = 1usize;
            while !self.is_at_end() && depth > 0 {
                let token = &self.tokens[self.pos].token;
                match token {
                    Token::LParen => {
                        depth += 1;
                        result.push('(');
                    }
                    Token::RParen => {
                        depth -= 1;
                        if depth > 0 {
                            result.push(')');
                        }
                    }
                    Token::Whitespace(_) => {}
                    Token::Comma => result.push_str(", "),
                    other => result.push_str(&other.to_string().to_uppercase()),
                }
                self.advance();
            }
            result.push(')');
        }

        // Anchored types: %TYPE and %ROWTYPE
        self.skip_whitespace();
        if self.check_token(&Token::Mod) {
            self.advance();
            self.skip_whitespace();
            if self.check_word_ci("TYPE") {
                self.advance();
                result.push_str("%TYPE");
            } else if self.check_word_ci("ROWTYPE") {
                self.advance();
                result.push_str("%ROWTYPE");
            }
        }

        Some(result)
    }

    /// Collect the default value expression up to a top-level comma or the
    /// closing parenthesis of the parameter list.
    fn parse_default_value(&mut self) -> String {
        let mut depth = 0usize;
        let mut parts: Vec<String> = Vec::new();

        while !self.is_at_end() {
            let token = &self.tokens[self.pos].token;
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Token::Comma if depth == 0 => break,
                _ => {}
            }
            if !matches!(token, Token::Whitespace(_)) {
                parts.push(token.to_string());
            }
            self.advance();
        }

        parts.join(" ")
    }

    // ---- token cursor helpers ----

    fn current_token(&self) -> Option<&TokenWithSpan> {
        self.tokens.get(self.pos)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || matches!(self.tokens[self.pos].token, Token::EOF)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && matches!(self.tokens[self.pos].token, Token::Whitespace(_)) {
            self.advance();
        }
    }

    fn check_token(&self, expected: &Token) -> bool {
        self.current_token()
            .map(|t| &t.token == expected)
            .unwrap_or(false)
    }

    fn check_word_ci(&self, word: &str) -> bool {
        match self.current_token().map(|t| &t.token) {
            Some(Token::Word(w)) => w.value.eq_ignore_ascii_case(word),
            _ => false,
        }
    }

    fn parse_identifier(&mut self) -> Option<String> {
        match self.current_token().map(|t| &t.token) {
            Some(Token::Word(w)) => {
                let value = w.value.clone();
                self.advance();
                Some(value)
            }
            _ => None,
        }
    }

    fn skip_to_param_delimiter(&mut self) {
        let mut depth = 0usize;
        while !self.is_at_end() {
            match &self.tokens[self.pos].token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                Token::Comma if depth == 0 => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_to_token(&mut self, target: &Token) {
        while !self.is_at_end() && !self.check_token(target) {
            self.advance();
        }
    }
}
