//! Hierarchical query (CONNECT BY) analysis
//!
//! Inspects one query block's recursive self-join clause and produces the
//! structured facts needed to generate a PostgreSQL recursive CTE: base
//! table, optional START WITH predicate, the recursion predicate with its
//! PRIOR direction, and pseudo-column usage (LEVEL, CONNECT_BY_ROOT,
//! CONNECT_BY_ISLEAF, SYS_CONNECT_BY_PATH). Analysis only — code generation
//! is a separate concern.
//!
//! Oracle shape handled here:
//!
//! ```sql
//! SELECT columns
//! FROM table                              -- single table only
//! WHERE filter                            -- optional
//! START WITH root_condition               -- optional
//! CONNECT BY [NOCYCLE] PRIOR col = col
//! ORDER BY ...                           -- optional
//! ```

use std::collections::HashMap;

use sqlparser::tokenizer::{Token, Tokenizer};

use crate::error::TransformError;
use crate::parser::plsql_dialect::ExtendedPlSqlDialect;

/// Which side of the recursion predicate carries the PRIOR marker.
///
/// PRIOR marks the parent reference: `PRIOR emp_id = manager_id` means
/// `parent.emp_id = child.manager_id`.
#[derive(Debug, Clone)]
pub struct PriorExpression {
    prior_on_left: bool,
    prior_column: String,
    child_column: String,
}

impl PriorExpression {
    pub fn prior_on_left(&self) -> bool {
        self.prior_on_left
    }

    /// The parent-side column expression, e.g. `emp_id` or `e.emp_id`.
    pub fn prior_column(&self) -> &str {
        &self.prior_column
    }

    /// The child-side column expression, e.g. `manager_id`.
    pub fn child_column(&self) -> &str {
        &self.child_column
    }

    /// Join condition for the recursive CTE member:
    /// `child_alias.child_col = cte_alias.prior_col`.
    pub fn join_condition(&self, child_alias: &str, cte_alias: &str) -> String {
        let prior = strip_qualifier(&self.prior_column);
        let child = strip_qualifier(&self.child_column);
        format!("{child_alias}.{child} = {cte_alias}.{prior}")
    }
}

/// Strips table qualifiers, keeping the last path segment.
fn strip_qualifier(column: &str) -> &str {
    column.rsplit('.').next().unwrap_or(column)
}

/// One deduplicated SYS_CONNECT_BY_PATH occurrence. Each distinct
/// (expression, separator) pair becomes one extra CTE output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathColumn {
    /// First argument, rendered (e.g. `ename` or `e.ename`).
    pub expression: String,
    /// Separator literal content, without quotes (e.g. `/`).
    pub separator: String,
    /// Generated CTE column name: `path_1`, `path_2`, ...
    pub column_name: String,
}

/// Pseudo-column usage found in the query block. Each flag implies extra
/// recursive-CTE output columns during generation.
#[derive(Debug, Clone, Default)]
pub struct PseudoColumnUsage {
    pub uses_level_in_select: bool,
    pub uses_level_in_filter: bool,
    pub uses_connect_by_root: bool,
    pub uses_connect_by_is_leaf: bool,
    pub path_columns: Vec<PathColumn>,
}

impl PseudoColumnUsage {
    pub fn uses_level(&self) -> bool {
        self.uses_level_in_select || self.uses_level_in_filter
    }
}

/// Analyzed components of one hierarchical query block. Read-only after
/// construction.
#[derive(Debug, Clone)]
pub struct HierarchicalQueryComponents {
    base_table: String,
    base_alias: Option<String>,
    start_with_predicate: Option<String>,
    recursion_predicate: String,
    prior_expression: PriorExpression,
    no_cycle: bool,
    pseudo_columns: PseudoColumnUsage,
}

impl HierarchicalQueryComponents {
    pub fn base_table(&self) -> &str {
        &self.base_table
    }

    pub fn base_alias(&self) -> Option<&str> {
        self.base_alias.as_deref()
    }

    pub fn start_with_predicate(&self) -> Option<&str> {
        self.start_with_predicate.as_deref()
    }

    pub fn recursion_predicate(&self) -> &str {
        &self.recursion_predicate
    }

    pub fn prior_expression(&self) -> &PriorExpression {
        &self.prior_expression
    }

    pub fn no_cycle(&self) -> bool {
        self.no_cycle
    }

    pub fn pseudo_columns(&self) -> &PseudoColumnUsage {
        &self.pseudo_columns
    }
}

/// Token-level analyzer for one query block's hierarchical clause.
pub struct HierarchyAnalyzer {
    tokens: Vec<Token>,
}

/// Clause boundaries inside the query block, as token indices. Each range is
/// exclusive of the clause's introducing keyword(s).
#[derive(Debug, Default)]
struct ClauseMap {
    select_list: Option<(usize, usize)>,
    from: Option<(usize, usize)>,
    filter: Option<(usize, usize)>,
    start_with: Option<(usize, usize)>,
    connect_by: Option<(usize, usize)>,
    order_by: Option<(usize, usize)>,
    connect_by_count: usize,
}

impl HierarchyAnalyzer {
    /// Analyzes a query block containing a CONNECT BY clause.
    ///
    /// Fails with [`TransformError::InvalidInput`] when no hierarchical
    /// clause is present, and [`TransformError::UnsupportedConstruct`] for
    /// patterns outside the supported shape (multiple clauses, multiple
    /// tables, joins, subqueries in FROM, non-equality recursion predicates).
    pub fn analyze(sql: &str) -> Result<HierarchicalQueryComponents, TransformError> {
        if sql.trim().is_empty() {
            return Err(TransformError::invalid_input(
                "query block cannot be null or empty",
            ));
        }

        let dialect = ExtendedPlSqlDialect::new();
        let tokens: Vec<Token> = Tokenizer::new(&dialect, sql)
            .tokenize_with_location()
            .map_err(|e| TransformError::invalid_input(format!("tokenization failed: {e}")))?
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
            .collect();

        let analyzer = Self { tokens };
        let clauses = analyzer.map_clauses()?;

        if clauses.connect_by_count == 0 {
            return Err(TransformError::invalid_input(
                "no hierarchical query clause found",
            ));
        }
        if clauses.connect_by_count > 1 {
            return Err(TransformError::unsupported(format!(
                "multiple hierarchical query clauses ({} found)",
                clauses.connect_by_count
            )));
        }

        let (base_table, base_alias) = analyzer.extract_table(&clauses)?;

        let (no_cycle, recursion_predicate, prior_expression) =
            analyzer.analyze_connect_by(&clauses)?;

        let start_with_predicate = clauses
            .start_with
            .map(|(lo, hi)| analyzer.render(lo, hi))
            .filter(|p| !p.is_empty());

        let pseudo_columns = analyzer.scan_pseudo_columns(&clauses)?;

        Ok(HierarchicalQueryComponents {
            base_table,
            base_alias,
            start_with_predicate,
            recursion_predicate,
            prior_expression,
            no_cycle,
            pseudo_columns,
        })
    }

    /// Locates clause boundaries at paren depth 0. Nested subqueries keep
    /// their own clause keywords out of the map.
    fn map_clauses(&self) -> Result<ClauseMap, TransformError> {
        // (start-of-range, which-clause) markers in source order
        let mut markers: Vec<(usize, usize, Clause)> = Vec::new();
        let mut depth = 0usize;
        let mut i = 0usize;

        while i < self.tokens.len() {
            match &self.tokens[i] {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Word(w) if depth == 0 => {
                    let upper = w.value.to_uppercase();
                    match upper.as_str() {
                        "SELECT" => markers.push((i, i + 1, Clause::Select)),
                        "FROM" => markers.push((i, i + 1, Clause::From)),
                        "WHERE" => markers.push((i, i + 1, Clause::Filter)),
                        "START" if self.word_at(i + 1, "WITH") => {
                            markers.push((i, i + 2, Clause::StartWith));
                            i += 1;
                        }
                        "CONNECT" if self.word_at(i + 1, "BY") => {
                            markers.push((i, i + 2, Clause::ConnectBy));
                            i += 1;
                        }
                        "GROUP" if self.word_at(i + 1, "BY") => {
                            markers.push((i, i + 2, Clause::Other));
                            i += 1;
                        }
                        "ORDER" if self.word_at(i + 1, "BY") => {
                            markers.push((i, i + 2, Clause::OrderBy));
                            i += 1;
                        }
                        "HAVING" => markers.push((i, i + 1, Clause::Other)),
                        _ => {}
                    }
                }
                _ => {}
            }
            i += 1;
        }

        let mut map = ClauseMap::default();
        for (idx, &(_, body_start, clause)) in markers.iter().enumerate() {
            let end = markers
                .get(idx + 1)
                .map(|&(next_start, _, _)| next_start)
                .unwrap_or(self.tokens.len());
            let range = (body_start, end);
            match clause {
                Clause::Select => map.select_list = Some(range),
                Clause::From => map.from = Some(range),
                Clause::Filter => map.filter = Some(range),
                Clause::StartWith => map.start_with = Some(range),
                Clause::ConnectBy => {
                    map.connect_by = Some(range);
                    map.connect_by_count += 1;
                }
                Clause::OrderBy => map.order_by = Some(range),
                Clause::Other => {}
            }
        }

        Ok(map)
    }

    /// Extracts the single base table name and optional alias from FROM.
    fn extract_table(&self, clauses: &ClauseMap) -> Result<(String, Option<String>), TransformError> {
        let (lo, hi) = clauses
            .from
            .ok_or_else(|| TransformError::invalid_input("CONNECT BY requires a FROM clause"))?;

        if lo >= hi {
            return Err(TransformError::invalid_input(
                "FROM clause has no table references",
            ));
        }

        // Reject multi-table and join forms up front
        let mut table_count = 1usize;
        let mut depth = 0usize;
        for i in lo..hi {
            match &self.tokens[i] {
                Token::LParen => {
                    if depth == 0 && i == lo {
                        return Err(TransformError::unsupported(
                            "CONNECT BY with subquery in FROM",
                        ));
                    }
                    depth += 1;
                }
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Comma if depth == 0 => table_count += 1,
                Token::Word(w) if depth == 0 => {
                    let upper = w.value.to_uppercase();
                    if matches!(upper.as_str(), "JOIN" | "INNER" | "LEFT" | "RIGHT" | "CROSS") {
                        return Err(TransformError::unsupported("CONNECT BY with JOIN in FROM"));
                    }
                }
                _ => {}
            }
        }
        if table_count > 1 {
            return Err(TransformError::unsupported(format!(
                "CONNECT BY with multiple tables ({table_count} found)"
            )));
        }

        // name: Word (. Word)*
        let mut i = lo;
        let mut name = match &self.tokens[i] {
            Token::Word(w) => w.value.clone(),
            other => {
                return Err(TransformError::invalid_input(format!(
                    "cannot extract table name from FROM clause, found: {other}"
                )))
            }
        };
        i += 1;
        while i + 1 < hi && self.tokens[i] == Token::Period {
            if let Token::Word(w) = &self.tokens[i + 1] {
                name.push('.');
                name.push_str(&w.value);
                i += 2;
            } else {
                break;
            }
        }

        // optional alias
        let alias = match self.tokens.get(i).filter(|_| i < hi) {
            Some(Token::Word(w)) => Some(w.value.clone()),
            _ => None,
        };

        Ok((name, alias))
    }

    /// Analyzes the CONNECT BY clause: NOCYCLE flag, rendered recursion
    /// predicate, and the PRIOR expression split.
    fn analyze_connect_by(
        &self,
        clauses: &ClauseMap,
    ) -> Result<(bool, String, PriorExpression), TransformError> {
        let (mut lo, hi) = clauses
            .connect_by
            .ok_or_else(|| TransformError::invalid_input("CONNECT BY clause missing condition"))?;

        let no_cycle = self.word_at(lo, "NOCYCLE");
        if no_cycle {
            lo += 1;
        }
        if lo >= hi {
            return Err(TransformError::invalid_input(
                "CONNECT BY clause missing condition",
            ));
        }

        // Find the single top-level equality and the single PRIOR marker
        let mut depth = 0usize;
        let mut eq_pos: Option<usize> = None;
        let mut eq_count = 0usize;
        let mut prior_positions: Vec<usize> = Vec::new();
        for i in lo..hi {
            match &self.tokens[i] {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Eq if depth == 0 => {
                    eq_pos = Some(i);
                    eq_count += 1;
                }
                Token::Word(w) if w.value.eq_ignore_ascii_case("PRIOR") => {
                    prior_positions.push(i);
                }
                _ => {}
            }
        }

        if eq_count != 1 {
            return Err(TransformError::unsupported(format!(
                "CONNECT BY condition must be a single equality, found {eq_count} comparisons"
            )));
        }
        if prior_positions.len() != 1 {
            return Err(TransformError::unsupported(format!(
                "CONNECT BY condition must contain exactly one PRIOR marker, found {}",
                prior_positions.len()
            )));
        }

        let eq = eq_pos.unwrap();
        let prior = prior_positions[0];
        let prior_on_left = prior < eq;

        let (prior_range, child_range) = if prior_on_left {
            ((prior + 1, eq), (eq + 1, hi))
        } else {
            ((prior + 1, hi), (lo, eq))
        };

        let prior_column = self.render(prior_range.0, prior_range.1);
        let child_column = self.render(child_range.0, child_range.1);
        if prior_column.is_empty() || child_column.is_empty() {
            return Err(TransformError::unsupported(
                "CONNECT BY condition with empty comparison side",
            ));
        }

        let recursion_predicate = self.render(lo, hi);

        Ok((
            no_cycle,
            recursion_predicate,
            PriorExpression {
                prior_on_left,
                prior_column,
                child_column,
            },
        ))
    }

    /// Scans select list, filter, and ORDER BY for pseudo-column usage.
    fn scan_pseudo_columns(&self, clauses: &ClauseMap) -> Result<PseudoColumnUsage, TransformError> {
        let mut usage = PseudoColumnUsage::default();
        // key = expression|separator, kept in first-seen order via counter
        let mut path_map: HashMap<String, PathColumn> = HashMap::new();
        let mut path_counter = 1usize;
        let mut ordered_paths: Vec<String> = Vec::new();

        let sections: [(Option<(usize, usize)>, bool); 3] = [
            (clauses.select_list, true),
            (clauses.filter, false),
            (clauses.order_by, false),
        ];

        for (section, is_select_list) in sections {
            let Some((lo, hi)) = section else { continue };
            let mut i = lo;
            while i < hi {
                if let Token::Word(w) = &self.tokens[i] {
                    let upper = w.value.to_uppercase();
                    match upper.as_str() {
                        "LEVEL" if self.is_bare_identifier(i) => {
                            if is_select_list {
                                usage.uses_level_in_select = true;
                            } else {
                                usage.uses_level_in_filter = true;
                            }
                        }
                        "CONNECT_BY_ROOT" => usage.uses_connect_by_root = true,
                        "CONNECT_BY_ISLEAF" if self.is_bare_identifier(i) => {
                            usage.uses_connect_by_is_leaf = true;
                        }
                        "SYS_CONNECT_BY_PATH" => {
                            let (expression, separator, next) =
                                self.parse_path_call(i + 1, hi)?;
                            let key = format!("{expression}|{separator}");
                            if !path_map.contains_key(&key) {
                                path_map.insert(
                                    key.clone(),
                                    PathColumn {
                                        expression,
                                        separator,
                                        column_name: format!("path_{path_counter}"),
                                    },
                                );
                                ordered_paths.push(key);
                                path_counter += 1;
                            }
                            i = next;
                            continue;
                        }
                        _ => {}
                    }
                }
                i += 1;
            }
        }

        usage.path_columns = ordered_paths
            .into_iter()
            .filter_map(|key| path_map.remove(&key))
            .collect();

        Ok(usage)
    }

    /// Parses `(expr, 'sep')` starting at the token after the function name.
    /// Returns (rendered expression, separator content, index past `)`).
    fn parse_path_call(
        &self,
        open: usize,
        limit: usize,
    ) -> Result<(String, String, usize), TransformError> {
        if self.tokens.get(open) != Some(&Token::LParen) {
            return Err(TransformError::invalid_input(
                "SYS_CONNECT_BY_PATH must be a function call",
            ));
        }

        // Split arguments at top-level commas inside the call
        let mut depth = 1usize;
        let mut arg_bounds: Vec<usize> = vec![open + 1];
        let mut close = None;
        let mut i = open + 1;
        while i < limit {
            match &self.tokens[i] {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                Token::Comma if depth == 1 => arg_bounds.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        let close = close.ok_or_else(|| {
            TransformError::invalid_input("SYS_CONNECT_BY_PATH call is missing a closing parenthesis")
        })?;

        if arg_bounds.len() != 2 {
            return Err(TransformError::invalid_input(format!(
                "SYS_CONNECT_BY_PATH requires exactly 2 arguments (column, separator), found: {}",
                arg_bounds.len()
            )));
        }

        let expr_end = arg_bounds[1] - 1; // the comma
        let expression = self.render(arg_bounds[0], expr_end);

        // Separator must be a single string literal
        let sep_lo = arg_bounds[1];
        if close != sep_lo + 1 {
            return Err(TransformError::invalid_input(format!(
                "SYS_CONNECT_BY_PATH separator must be a string literal, found: {}",
                self.render(sep_lo, close)
            )));
        }
        let separator = match &self.tokens[sep_lo] {
            Token::SingleQuotedString(s) => s.clone(),
            other => {
                return Err(TransformError::invalid_input(format!(
                    "SYS_CONNECT_BY_PATH separator must be a string literal, found: {other}"
                )))
            }
        };

        Ok((expression, separator, close + 1))
    }

    /// A word is a bare identifier when it is neither qualified
    /// (`alias.level`) nor a function call (`level(...)`).
    fn is_bare_identifier(&self, i: usize) -> bool {
        let qualified = i > 0 && self.tokens[i - 1] == Token::Period;
        let called = matches!(
            self.tokens.get(i + 1),
            Some(Token::Period) | Some(Token::LParen)
        );
        !qualified && !called
    }

    fn word_at(&self, i: usize, word: &str) -> bool {
        matches!(self.tokens.get(i), Some(Token::Word(w)) if w.value.eq_ignore_ascii_case(word))
    }

    /// Renders a token range back to SQL text with conventional spacing.
    fn render(&self, lo: usize, hi: usize) -> String {
        let mut out = String::new();
        for i in lo..hi.min(self.tokens.len()) {
            let token = &self.tokens[i];
            let text = token.to_string();
            if !out.is_empty() {
                let no_space_before = matches!(
                    token,
                    Token::Comma | Token::RParen | Token::Period | Token::SemiColon
                ) || (matches!(token, Token::LParen)
                    && matches!(self.tokens.get(i.wrapping_sub(1)), Some(Token::Word(_))));
                let no_space_after_prev = matches!(
                    self.tokens.get(i.wrapping_sub(1)),
                    Some(Token::LParen) | Some(Token::Period)
                );
                if !no_space_before && !no_space_after_prev {
                    out.push(' ');
                }
            }
            out.push_str(&text);
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
enum Clause {
    Select,
    From,
    Filter,
    StartWith,
    ConnectBy,
    OrderBy,
    Other,
}
