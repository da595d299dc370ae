//! Semantic tree builder
//!
//! Walks a parse tree and instantiates the semantic node tree. Each parse
//! node maps either 1:1 to a [`SemanticNode`] variant (optionally rewriting
//! immediately, e.g. `NVL(a, b)` becomes `COALESCE(a, b)`) or to a named
//! unsupported-construct failure identifying the production.
//!
//! Dotted-identifier disambiguation (table.column vs package.function vs
//! type.method, plus alias and synonym qualifiers) happens here, at build
//! time, against the context's indices — emission downstream is a pure
//! function of the already-resolved tree.

use std::collections::{HashMap, HashSet};

use sqlparser::ast::{
    Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments, GroupByExpr, Query, Select,
    SelectItem, SetExpr, SetOperator, SetQuantifier, Statement, TableFactor, TableWithJoins,
    UnaryOperator,
};

use crate::error::TransformError;
use crate::semantic::context::TransformationContext;
use crate::semantic::node::{CommonTableExpr, OrderItem, SemanticNode};

/// Builds a semantic tree from one parsed statement.
///
/// Holds query-local resolution state (table aliases, CTE names); create a
/// fresh builder per statement.
pub struct SemanticTreeBuilder<'a> {
    ctx: &'a TransformationContext,
    /// lowercase alias -> lowercase table name, for the current statement
    table_aliases: HashMap<String, String>,
    /// lowercase unaliased FROM table name -> lowercase resolved table name
    from_tables: HashMap<String, String>,
    /// lowercase CTE names from WITH clauses
    cte_names: HashSet<String>,
}

impl<'a> SemanticTreeBuilder<'a> {
    pub fn new(ctx: &'a TransformationContext) -> Self {
        Self {
            ctx,
            table_aliases: HashMap::new(),
            from_tables: HashMap::new(),
            cte_names: HashSet::new(),
        }
    }

    /// Builds the semantic tree for a statement. Only queries have semantic
    /// mappings; everything else is an unsupported construct.
    pub fn build(&mut self, statement: &Statement) -> Result<SemanticNode, TransformError> {
        match statement {
            Statement::Query(query) => self.build_query(query),
            other => Err(TransformError::unsupported(format!("statement: {other}"))),
        }
    }

    fn build_query(&mut self, query: &Query) -> Result<SemanticNode, TransformError> {
        if query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
            return Err(TransformError::unsupported("row-limiting clause"));
        }
        if !query.limit_by.is_empty() {
            return Err(TransformError::unsupported("LIMIT BY clause"));
        }
        if !query.locks.is_empty() {
            return Err(TransformError::unsupported("FOR UPDATE / locking clause"));
        }

        let mut ctes = Vec::new();
        if let Some(with) = &query.with {
            if with.recursive {
                return Err(TransformError::unsupported("recursive WITH clause"));
            }
            for cte in &with.cte_tables {
                if !cte.alias.columns.is_empty() {
                    return Err(TransformError::unsupported("CTE column list"));
                }
                let name = cte.alias.name.value.clone();
                self.cte_names.insert(name.to_lowercase());
                ctes.push(CommonTableExpr {
                    name,
                    query: self.build_query(&cte.query)?,
                });
            }
        }

        let body = self.build_set_expr(&query.body)?;

        let mut order_items = Vec::new();
        if let Some(order_by) = &query.order_by {
            for item in &order_by.exprs {
                order_items.push(OrderItem {
                    expr: self.build_expr(&item.expr)?,
                    ascending: item.asc,
                    nulls_first: item.nulls_first,
                });
            }
        }

        Ok(SemanticNode::Query {
            ctes,
            body: Box::new(body),
            order_by: order_items,
        })
    }

    fn build_set_expr(&mut self, body: &SetExpr) -> Result<SemanticNode, TransformError> {
        match body {
            SetExpr::Select(select) => self.build_select(select),
            SetExpr::Query(query) => Ok(SemanticNode::Subquery(Box::new(
                self.build_query(query)?,
            ))),
            SetExpr::SetOperation {
                op,
                set_quantifier,
                left,
                right,
            } => {
                let op_text = match (op, set_quantifier) {
                    (SetOperator::Union, SetQuantifier::All) => "UNION ALL",
                    (SetOperator::Union, SetQuantifier::None | SetQuantifier::Distinct) => "UNION",
                    (SetOperator::Intersect, SetQuantifier::None | SetQuantifier::Distinct) => {
                        "INTERSECT"
                    }
                    (SetOperator::Except, SetQuantifier::None | SetQuantifier::Distinct) => {
                        "EXCEPT"
                    }
                    (op, quantifier) => {
                        return Err(TransformError::unsupported(format!(
                            "set operation: {op} {quantifier}"
                        )))
                    }
                };
                Ok(SemanticNode::SetOperation {
                    op: op_text.to_string(),
                    left: Box::new(self.build_set_expr(left)?),
                    right: Box::new(self.build_set_expr(right)?),
                })
            }
            other => Err(TransformError::unsupported(format!(
                "query body: {other}"
            ))),
        }
    }

    fn build_select(&mut self, select: &Select) -> Result<SemanticNode, TransformError> {
        if select.top.is_some() {
            return Err(TransformError::unsupported("TOP clause"));
        }
        if select.into.is_some() {
            return Err(TransformError::unsupported("SELECT INTO"));
        }
        if !select.lateral_views.is_empty() {
            return Err(TransformError::unsupported("LATERAL VIEW clause"));
        }
        if select.qualify.is_some() {
            return Err(TransformError::unsupported("QUALIFY clause"));
        }
        if select.connect_by.is_some() {
            return Err(TransformError::unsupported("hierarchical query clause"));
        }
        if select.value_table_mode.is_some() {
            return Err(TransformError::unsupported("value table mode"));
        }
        if !select.cluster_by.is_empty()
            || !select.distribute_by.is_empty()
            || !select.sort_by.is_empty()
        {
            return Err(TransformError::unsupported("CLUSTER/DISTRIBUTE/SORT BY"));
        }
        if !select.named_window.is_empty() {
            return Err(TransformError::unsupported("named WINDOW clause"));
        }

        let distinct = match &select.distinct {
            None => false,
            Some(sqlparser::ast::Distinct::Distinct) => true,
            Some(sqlparser::ast::Distinct::On(_)) => {
                return Err(TransformError::unsupported("DISTINCT ON"))
            }
        };

        // FROM first so aliases are registered before expressions resolve
        let mut from = Vec::new();
        for table in &select.from {
            from.push(self.build_table_with_joins(table)?);
        }

        let mut select_items = Vec::new();
        for item in &select.projection {
            select_items.push(self.build_select_item(item)?);
        }

        let selection = select
            .selection
            .as_ref()
            .map(|e| self.build_expr(e))
            .transpose()?
            .map(Box::new);

        let group_by = match &select.group_by {
            GroupByExpr::Expressions(exprs, modifiers) => {
                if !modifiers.is_empty() {
                    return Err(TransformError::unsupported("GROUP BY modifier"));
                }
                exprs
                    .iter()
                    .map(|e| self.build_expr(e))
                    .collect::<Result<Vec<_>, _>>()?
            }
            GroupByExpr::All(_) => return Err(TransformError::unsupported("GROUP BY ALL")),
        };

        let having = select
            .having
            .as_ref()
            .map(|e| self.build_expr(e))
            .transpose()?
            .map(Box::new);

        Ok(SemanticNode::QueryBlock {
            distinct,
            select_items,
            from,
            selection,
            group_by,
            having,
        })
    }

    fn build_table_with_joins(
        &mut self,
        table: &TableWithJoins,
    ) -> Result<SemanticNode, TransformError> {
        if !table.joins.is_empty() {
            return Err(TransformError::unsupported("explicit JOIN syntax"));
        }
        self.build_table_factor(&table.relation)
    }

    fn build_table_factor(&mut self, factor: &TableFactor) -> Result<SemanticNode, TransformError> {
        match factor {
            TableFactor::Table {
                name,
                alias,
                args,
                with_hints,
                ..
            } => {
                if args.is_some() {
                    return Err(TransformError::unsupported("table function in FROM"));
                }
                if !with_hints.is_empty() {
                    return Err(TransformError::unsupported("table hints"));
                }

                let written = name.to_string();
                // Synonyms resolve to their target; CTE names stay untouched
                let resolved = if self.cte_names.contains(&written.to_lowercase()) {
                    written
                } else {
                    match self.ctx.resolve_synonym(&written) {
                        Some(target) => target.to_string(),
                        None => written,
                    }
                };

                let alias_name = match alias {
                    Some(alias) => {
                        if !alias.columns.is_empty() {
                            return Err(TransformError::unsupported("table alias column list"));
                        }
                        let value = alias.name.value.clone();
                        self.table_aliases
                            .insert(value.to_lowercase(), resolved.to_lowercase());
                        Some(value)
                    }
                    None => {
                        // Without an alias the table name itself qualifies
                        // column references
                        let key = resolved
                            .rsplit('.')
                            .next()
                            .unwrap_or(resolved.as_str())
                            .to_lowercase();
                        self.from_tables.insert(key, resolved.to_lowercase());
                        None
                    }
                };

                Ok(SemanticNode::TableReference {
                    name: resolved,
                    alias: alias_name,
                })
            }
            TableFactor::Derived {
                lateral,
                subquery,
                alias,
            } => {
                if *lateral {
                    return Err(TransformError::unsupported("LATERAL subquery"));
                }
                let query = self.build_query(subquery)?;
                let alias_name = match alias {
                    Some(alias) => {
                        if !alias.columns.is_empty() {
                            return Err(TransformError::unsupported("table alias column list"));
                        }
                        Some(alias.name.value.clone())
                    }
                    None => None,
                };
                Ok(SemanticNode::DerivedTable {
                    query: Box::new(query),
                    alias: alias_name,
                })
            }
            other => Err(TransformError::unsupported(format!(
                "table reference: {other}"
            ))),
        }
    }

    fn build_select_item(&mut self, item: &SelectItem) -> Result<SemanticNode, TransformError> {
        match item {
            SelectItem::UnnamedExpr(expr) => Ok(SemanticNode::SelectItem {
                expr: Box::new(self.build_expr(expr)?),
                alias: None,
            }),
            SelectItem::ExprWithAlias { expr, alias } => Ok(SemanticNode::SelectItem {
                expr: Box::new(self.build_expr(expr)?),
                alias: Some(alias.value.clone()),
            }),
            SelectItem::Wildcard(_) => Ok(SemanticNode::Wildcard),
            SelectItem::QualifiedWildcard(name, _) => {
                Ok(SemanticNode::QualifiedWildcard(name.to_string()))
            }
        }
    }

    fn build_expr(&mut self, expr: &Expr) -> Result<SemanticNode, TransformError> {
        match expr {
            Expr::Identifier(ident) => {
                // SYSDATE is an identifier in the source grammar, a function
                // keyword in the target
                if ident.quote_style.is_none() && ident.value.eq_ignore_ascii_case("SYSDATE") {
                    return Ok(SemanticNode::FunctionCall {
                        name: "CURRENT_TIMESTAMP".to_string(),
                        args: Vec::new(),
                        bare: true,
                    });
                }
                Ok(SemanticNode::Identifier(ident.to_string()))
            }

            Expr::CompoundIdentifier(idents) => {
                let parts: Vec<String> = idents.iter().map(|i| i.to_string()).collect();
                Ok(self.resolve_compound(&parts))
            }

            Expr::Value(value) => Ok(SemanticNode::Literal(value.to_string())),

            Expr::BinaryOp { left, op, right } => Ok(SemanticNode::Binary {
                left: Box::new(self.build_expr(left)?),
                op: op.to_string(),
                right: Box::new(self.build_expr(right)?),
            }),

            Expr::UnaryOp { op, expr } => {
                let op_text = match op {
                    UnaryOperator::Not => "NOT".to_string(),
                    other => other.to_string(),
                };
                Ok(SemanticNode::Unary {
                    op: op_text,
                    expr: Box::new(self.build_expr(expr)?),
                })
            }

            Expr::IsNull(inner) => Ok(SemanticNode::Postfix {
                expr: Box::new(self.build_expr(inner)?),
                op: "IS NULL".to_string(),
            }),
            Expr::IsNotNull(inner) => Ok(SemanticNode::Postfix {
                expr: Box::new(self.build_expr(inner)?),
                op: "IS NOT NULL".to_string(),
            }),

            Expr::Nested(inner) => Ok(SemanticNode::Nested(Box::new(self.build_expr(inner)?))),

            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => Ok(SemanticNode::Between {
                expr: Box::new(self.build_expr(expr)?),
                negated: *negated,
                low: Box::new(self.build_expr(low)?),
                high: Box::new(self.build_expr(high)?),
            }),

            Expr::InList {
                expr,
                list,
                negated,
            } => Ok(SemanticNode::InList {
                expr: Box::new(self.build_expr(expr)?),
                negated: *negated,
                list: list
                    .iter()
                    .map(|e| self.build_expr(e))
                    .collect::<Result<Vec<_>, _>>()?,
            }),

            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => Ok(SemanticNode::InSubquery {
                expr: Box::new(self.build_expr(expr)?),
                negated: *negated,
                subquery: Box::new(self.build_query(subquery)?),
            }),

            Expr::Exists { subquery, negated } => Ok(SemanticNode::Exists {
                negated: *negated,
                subquery: Box::new(self.build_query(subquery)?),
            }),

            Expr::Subquery(query) => Ok(SemanticNode::Subquery(Box::new(
                self.build_query(query)?,
            ))),

            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                if conditions.len() != results.len() {
                    return Err(TransformError::invalid_input(
                        "CASE expression has mismatched WHEN/THEN arms",
                    ));
                }
                let operand = operand
                    .as_ref()
                    .map(|e| self.build_expr(e))
                    .transpose()?
                    .map(Box::new);
                let mut branches = Vec::with_capacity(conditions.len());
                for (condition, result) in conditions.iter().zip(results.iter()) {
                    branches.push((self.build_expr(condition)?, self.build_expr(result)?));
                }
                let else_result = else_result
                    .as_ref()
                    .map(|e| self.build_expr(e))
                    .transpose()?
                    .map(Box::new);
                Ok(SemanticNode::Case {
                    operand,
                    branches,
                    else_result,
                })
            }

            Expr::Function(function) => self.build_function(function),

            // Not-yet-specialized productions travel as rendered source text
            e @ (Expr::Like { .. }
            | Expr::ILike { .. }
            | Expr::Cast { .. }
            | Expr::Extract { .. }
            | Expr::Substring { .. }
            | Expr::Trim { .. }
            | Expr::Position { .. }
            | Expr::TypedString { .. }) => Ok(SemanticNode::Passthrough(e.to_string())),

            other => Err(TransformError::unsupported(format!(
                "expression: {other}"
            ))),
        }
    }

    fn build_function(&mut self, function: &Function) -> Result<SemanticNode, TransformError> {
        // Window/aggregate decorations have no rewrite rules; keep verbatim
        if function.over.is_some()
            || function.filter.is_some()
            || function.null_treatment.is_some()
            || !function.within_group.is_empty()
        {
            return Ok(SemanticNode::Passthrough(function.to_string()));
        }

        let name = function.name.to_string();
        let upper = name.to_uppercase();

        let args = match &function.args {
            FunctionArguments::None => Vec::new(),
            FunctionArguments::Subquery(query) => {
                vec![SemanticNode::Subquery(Box::new(self.build_query(query)?))]
            }
            FunctionArguments::List(list) => {
                if list.duplicate_treatment.is_some() {
                    return Err(TransformError::unsupported(format!(
                        "DISTINCT/ALL inside {name} call"
                    )));
                }
                if !list.clauses.is_empty() {
                    return Err(TransformError::unsupported(format!(
                        "argument clause inside {name} call"
                    )));
                }
                let mut built = Vec::with_capacity(list.args.len());
                for arg in &list.args {
                    built.push(self.build_function_arg(&name, arg)?);
                }
                built
            }
        };

        // An invoked dotted name may be a type method on a column of a FROM
        // table; the object becomes the migrated function's first argument
        let name_parts: Vec<&str> = name.split('.').collect();
        if name_parts.len() == 3 {
            if let Some(call) =
                self.method_call(name_parts[0], name_parts[1], name_parts[2], &args)
            {
                return Ok(call);
            }
        }

        match upper.as_str() {
            // NVL maps 1:1 onto COALESCE, but only in its two-argument form
            "NVL" => {
                if args.len() != 2 {
                    return Err(TransformError::invalid_input(format!(
                        "NVL requires exactly 2 arguments, found: {}",
                        args.len()
                    )));
                }
                Ok(SemanticNode::FunctionCall {
                    name: "COALESCE".to_string(),
                    args,
                    bare: false,
                })
            }
            "DECODE" => Err(TransformError::unsupported("DECODE function")),
            "SYSDATE" => Ok(SemanticNode::FunctionCall {
                name: "CURRENT_TIMESTAMP".to_string(),
                args: Vec::new(),
                bare: true,
            }),
            _ => Ok(SemanticNode::FunctionCall {
                name,
                args,
                bare: false,
            }),
        }
    }

    fn build_function_arg(
        &mut self,
        function_name: &str,
        arg: &FunctionArg,
    ) -> Result<SemanticNode, TransformError> {
        match arg {
            FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => self.build_expr(expr),
            FunctionArg::Unnamed(FunctionArgExpr::Wildcard) => Ok(SemanticNode::Wildcard),
            FunctionArg::Unnamed(FunctionArgExpr::QualifiedWildcard(name)) => {
                Ok(SemanticNode::QualifiedWildcard(name.to_string()))
            }
            _ => Err(TransformError::unsupported(format!(
                "named argument in {function_name} call"
            ))),
        }
    }

    /// Resolves a dotted identifier against query-local and catalog state.
    ///
    /// Two-part names disambiguate table.column from package.function:
    /// alias-, CTE-, and table-qualified columns pass through untouched,
    /// `synonym.column` rewrites the qualifier to the synonym's target, and a
    /// parameterless package function gains the call parentheses the target
    /// dialect requires. Three-part names additionally resolve
    /// `qualifier.column.method` references to type method calls. Names that
    /// resolve to nothing keep their written form.
    fn resolve_compound(&self, parts: &[String]) -> SemanticNode {
        if parts.len() == 2 {
            let qualifier = parts[0].to_lowercase();
            if self.table_for_qualifier(&qualifier).is_some()
                || self.cte_names.contains(&qualifier)
            {
                return SemanticNode::Identifier(parts.join("."));
            }
            if let Some(target) = self.ctx.resolve_synonym(&qualifier) {
                return SemanticNode::Identifier(format!("{target}.{}", parts[1]));
            }
            // A catalog-known table can qualify columns without appearing in
            // FROM (correlated references)
            if self
                .ctx
                .indices()
                .has_column(&self.ctx.qualify_table(&qualifier), &parts[1])
            {
                return SemanticNode::Identifier(parts.join("."));
            }
            let function_key = format!(
                "{}.{}.{}",
                self.ctx.current_schema(),
                qualifier,
                parts[1]
            );
            if self.ctx.indices().is_package_function(&function_key) {
                return SemanticNode::FunctionCall {
                    name: parts.join("."),
                    args: Vec::new(),
                    bare: false,
                };
            }
        }
        if parts.len() == 3 {
            if let Some(call) = self.method_call(&parts[0], &parts[1], &parts[2], &[]) {
                return call;
            }
        }
        SemanticNode::Identifier(parts.join("."))
    }

    /// Table a qualifier refers to, as a qualified name fit for index lookup.
    fn table_for_qualifier(&self, qualifier: &str) -> Option<String> {
        self.table_aliases
            .get(qualifier)
            .or_else(|| self.from_tables.get(qualifier))
            .map(|table| self.ctx.qualify_table(table))
    }

    /// Resolves `qualifier.column.method` into a type method call when the
    /// column's declared type carries the method. Type methods migrate as
    /// `schema.type_method(object, args...)` functions.
    fn method_call(
        &self,
        qualifier: &str,
        column: &str,
        method: &str,
        extra_args: &[SemanticNode],
    ) -> Option<SemanticNode> {
        let table = self.table_for_qualifier(&qualifier.to_lowercase())?;
        let info = self.ctx.indices().column_info(&table, column)?;
        let object_type = if info.is_custom_type() {
            info.qualified_type()
        } else {
            self.ctx.qualify_type_name(&info.data_type)
        };
        if !self.ctx.indices().has_type_method(&object_type, method) {
            return None;
        }
        let mut args = Vec::with_capacity(extra_args.len() + 1);
        args.push(SemanticNode::Identifier(format!("{qualifier}.{column}")));
        args.extend_from_slice(extra_args);
        Some(SemanticNode::FunctionCall {
            name: format!("{object_type}_{}", method.to_lowercase()),
            args,
            bare: false,
        })
    }
}
