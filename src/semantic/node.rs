//! Semantic node tree
//!
//! One variant per supported grammar production. Every node knows how to emit
//! target-dialect text given the shared [`TransformationContext`]; emission
//! either produces valid text or fails with a typed error, never dropping
//! semantics silently.
//!
//! Name resolution happens at build time, so most identifier variants hold
//! already-resolved text and emission is a pure tree fold. Productions with
//! no specialized transformation rule yet travel as [`SemanticNode::Passthrough`]
//! carrying their rendered source text.

use crate::error::TransformError;
use crate::semantic::context::TransformationContext;

/// An ORDER BY element.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub expr: SemanticNode,
    /// `None` leaves direction implicit.
    pub ascending: Option<bool>,
    pub nulls_first: Option<bool>,
}

/// A CTE from a WITH clause.
#[derive(Debug, Clone)]
pub struct CommonTableExpr {
    pub name: String,
    pub query: SemanticNode,
}

/// The semantic tree. Built by the tree builder, consumed by `emit`.
#[derive(Debug, Clone)]
pub enum SemanticNode {
    /// Full query: optional WITH clause, body, optional ORDER BY.
    Query {
        ctes: Vec<CommonTableExpr>,
        body: Box<SemanticNode>,
        order_by: Vec<OrderItem>,
    },
    /// One SELECT block.
    QueryBlock {
        distinct: bool,
        select_items: Vec<SemanticNode>,
        from: Vec<SemanticNode>,
        selection: Option<Box<SemanticNode>>,
        group_by: Vec<SemanticNode>,
        having: Option<Box<SemanticNode>>,
    },
    /// UNION / INTERSECT / EXCEPT between two query bodies.
    SetOperation {
        op: String,
        left: Box<SemanticNode>,
        right: Box<SemanticNode>,
    },
    /// Select-list element with optional alias.
    SelectItem {
        expr: Box<SemanticNode>,
        alias: Option<String>,
    },
    Wildcard,
    QualifiedWildcard(String),
    /// Table in a FROM clause; alias emitted bare (no AS), Oracle style.
    TableReference {
        name: String,
        alias: Option<String>,
    },
    /// Subquery in a FROM clause.
    DerivedTable {
        query: Box<SemanticNode>,
        alias: Option<String>,
    },
    /// Resolved identifier, possibly dotted. Held as final target text.
    Identifier(String),
    /// Literal, already rendered (quotes included for strings).
    Literal(String),
    Binary {
        left: Box<SemanticNode>,
        op: String,
        right: Box<SemanticNode>,
    },
    Unary {
        op: String,
        expr: Box<SemanticNode>,
    },
    /// Postfix predicate: IS NULL, IS NOT NULL.
    Postfix {
        expr: Box<SemanticNode>,
        op: String,
    },
    /// Parenthesized expression.
    Nested(Box<SemanticNode>),
    Case {
        operand: Option<Box<SemanticNode>>,
        branches: Vec<(SemanticNode, SemanticNode)>,
        else_result: Option<Box<SemanticNode>>,
    },
    /// Function call; `bare` suppresses the parentheses for zero-argument
    /// keywords like CURRENT_TIMESTAMP.
    FunctionCall {
        name: String,
        args: Vec<SemanticNode>,
        bare: bool,
    },
    Between {
        expr: Box<SemanticNode>,
        negated: bool,
        low: Box<SemanticNode>,
        high: Box<SemanticNode>,
    },
    InList {
        expr: Box<SemanticNode>,
        negated: bool,
        list: Vec<SemanticNode>,
    },
    InSubquery {
        expr: Box<SemanticNode>,
        negated: bool,
        subquery: Box<SemanticNode>,
    },
    Exists {
        negated: bool,
        subquery: Box<SemanticNode>,
    },
    /// Parenthesized scalar subquery.
    Subquery(Box<SemanticNode>),
    /// Rendered source text for productions without a specialized rule.
    Passthrough(String),
}

impl SemanticNode {
    /// Emits target-dialect text for this subtree.
    pub fn emit(&self, ctx: &TransformationContext) -> Result<String, TransformError> {
        match self {
            SemanticNode::Query {
                ctes,
                body,
                order_by,
            } => {
                let mut out = String::new();
                if !ctes.is_empty() {
                    let rendered: Result<Vec<String>, TransformError> = ctes
                        .iter()
                        .map(|cte| {
                            Ok(format!("{} AS ({})", cte.name, cte.query.emit(ctx)?))
                        })
                        .collect();
                    out.push_str("WITH ");
                    out.push_str(&rendered?.join(", "));
                    out.push(' ');
                }
                out.push_str(&body.emit(ctx)?);
                if !order_by.is_empty() {
                    out.push_str(" ORDER BY ");
                    out.push_str(&emit_order_items(order_by, ctx)?);
                }
                Ok(out)
            }

            SemanticNode::QueryBlock {
                distinct,
                select_items,
                from,
                selection,
                group_by,
                having,
            } => {
                if select_items.is_empty() {
                    return Err(TransformError::invalid_input(
                        "query block has an empty select list",
                    ));
                }
                let mut out = String::from("SELECT ");
                if *distinct {
                    out.push_str("DISTINCT ");
                }
                out.push_str(&emit_list(select_items, ctx)?);
                if !from.is_empty() {
                    out.push_str(" FROM ");
                    out.push_str(&emit_list(from, ctx)?);
                }
                if let Some(predicate) = selection {
                    out.push_str(" WHERE ");
                    out.push_str(&predicate.emit(ctx)?);
                }
                if !group_by.is_empty() {
                    out.push_str(" GROUP BY ");
                    out.push_str(&emit_list(group_by, ctx)?);
                }
                if let Some(predicate) = having {
                    out.push_str(" HAVING ");
                    out.push_str(&predicate.emit(ctx)?);
                }
                Ok(out)
            }

            SemanticNode::SetOperation { op, left, right } => Ok(format!(
                "{} {op} {}",
                left.emit(ctx)?,
                right.emit(ctx)?
            )),

            SemanticNode::SelectItem { expr, alias } => {
                let text = expr.emit(ctx)?;
                Ok(match alias {
                    Some(alias) => format!("{text} AS {alias}"),
                    None => text,
                })
            }

            SemanticNode::Wildcard => Ok("*".to_string()),
            SemanticNode::QualifiedWildcard(prefix) => Ok(format!("{prefix}.*")),

            SemanticNode::TableReference { name, alias } => Ok(match alias {
                Some(alias) => format!("{name} {alias}"),
                None => name.clone(),
            }),

            SemanticNode::DerivedTable { query, alias } => {
                let text = format!("({})", query.emit(ctx)?);
                Ok(match alias {
                    Some(alias) => format!("{text} {alias}"),
                    None => text,
                })
            }

            SemanticNode::Identifier(text) => Ok(text.clone()),
            SemanticNode::Literal(text) => Ok(text.clone()),

            SemanticNode::Binary { left, op, right } => Ok(format!(
                "{} {op} {}",
                left.emit(ctx)?,
                right.emit(ctx)?
            )),

            SemanticNode::Unary { op, expr } => {
                // Word operators need a separating space, sign operators don't
                if op.chars().all(|c| c.is_ascii_alphabetic()) {
                    Ok(format!("{op} {}", expr.emit(ctx)?))
                } else {
                    Ok(format!("{op}{}", expr.emit(ctx)?))
                }
            }

            SemanticNode::Postfix { expr, op } => Ok(format!("{} {op}", expr.emit(ctx)?)),

            SemanticNode::Nested(inner) => Ok(format!("({})", inner.emit(ctx)?)),

            SemanticNode::Case {
                operand,
                branches,
                else_result,
            } => {
                if branches.is_empty() {
                    return Err(TransformError::invalid_input(
                        "CASE expression has no WHEN branches",
                    ));
                }
                let mut out = String::from("CASE");
                if let Some(operand) = operand {
                    out.push(' ');
                    out.push_str(&operand.emit(ctx)?);
                }
                for (condition, result) in branches {
                    out.push_str(" WHEN ");
                    out.push_str(&condition.emit(ctx)?);
                    out.push_str(" THEN ");
                    out.push_str(&result.emit(ctx)?);
                }
                if let Some(else_result) = else_result {
                    out.push_str(" ELSE ");
                    out.push_str(&else_result.emit(ctx)?);
                }
                out.push_str(" END");
                Ok(out)
            }

            SemanticNode::FunctionCall { name, args, bare } => {
                if *bare {
                    return Ok(name.clone());
                }
                Ok(format!("{name}({})", emit_list(args, ctx)?))
            }

            SemanticNode::Between {
                expr,
                negated,
                low,
                high,
            } => Ok(format!(
                "{} {}BETWEEN {} AND {}",
                expr.emit(ctx)?,
                if *negated { "NOT " } else { "" },
                low.emit(ctx)?,
                high.emit(ctx)?
            )),

            SemanticNode::InList {
                expr,
                negated,
                list,
            } => Ok(format!(
                "{} {}IN ({})",
                expr.emit(ctx)?,
                if *negated { "NOT " } else { "" },
                emit_list(list, ctx)?
            )),

            SemanticNode::InSubquery {
                expr,
                negated,
                subquery,
            } => Ok(format!(
                "{} {}IN ({})",
                expr.emit(ctx)?,
                if *negated { "NOT " } else { "" },
                subquery.emit(ctx)?
            )),

            SemanticNode::Exists { negated, subquery } => Ok(format!(
                "{}EXISTS ({})",
                if *negated { "NOT " } else { "" },
                subquery.emit(ctx)?
            )),

            SemanticNode::Subquery(query) => Ok(format!("({})", query.emit(ctx)?)),

            SemanticNode::Passthrough(text) => Ok(text.clone()),
        }
    }
}

fn emit_list(
    nodes: &[SemanticNode],
    ctx: &TransformationContext,
) -> Result<String, TransformError> {
    let rendered: Result<Vec<String>, TransformError> =
        nodes.iter().map(|n| n.emit(ctx)).collect();
    Ok(rendered?.join(", "))
}

fn emit_order_items(
    items: &[OrderItem],
    ctx: &TransformationContext,
) -> Result<String, TransformError> {
    let rendered: Result<Vec<String>, TransformError> = items
        .iter()
        .map(|item| {
            let mut text = item.expr.emit(ctx)?;
            match item.ascending {
                Some(true) => text.push_str(" ASC"),
                Some(false) => text.push_str(" DESC"),
                None => {}
            }
            match item.nulls_first {
                Some(true) => text.push_str(" NULLS FIRST"),
                Some(false) => text.push_str(" NULLS LAST"),
                None => {}
            }
            Ok(text)
        })
        .collect();
    Ok(rendered?.join(", "))
}
