//! SELECT blocks, table sources and set operations.

use std::sync::Arc;

use super::expression::ExpressionRules;
use super::number;
use crate::ast::{
    AliasNode, IdentifierNode, JoinNode, JoinOperator, KeywordNode, ListNode, Node, OrderByNode,
    OrderDirection, ParenthesisNode, SelectNode, SetOperationNode, SetOperator, TopNode,
    ValuesNode,
};
use crate::dialect::Dialect;
use crate::lexer::Keyword;
use crate::parser::combinator::{
    deferred, first, left_apply, list_separated_by, optional, parenthesized, right_apply, rule,
    symbol, Arity, Parser,
};
use crate::parser::cursor::Cursor;

/// Query rules shared with the statement grammar.
pub(super) struct QueryRules {
    pub query: Parser<Node>,
    pub table_source: Parser<Node>,
    /// A table reference without joins, optionally aliased.
    pub table_primary: Parser<Node>,
    pub values: Parser<Node>,
    pub value_row: Parser<Node>,
}

/// `[AS] name [(col, ...)]`.
fn alias(exprs: &ExpressionRules) -> Parser<(Arc<IdentifierNode>, Vec<Arc<IdentifierNode>>)> {
    let name = exprs.identifier.clone();
    let columns = optional(parenthesized(list_separated_by(
        exprs.identifier.clone(),
        symbol(","),
        1,
    )));
    rule(move |c| {
        c.keyword(Keyword::As);
        let name = name.parse(c)?;
        let columns = columns.parse(c)?.map(|(_, cols)| cols).unwrap_or_default();
        Some((name, columns))
    })
}

/// Wraps `source` in an alias when one follows it.
fn aliased(source: Parser<Node>, alias: Parser<(Arc<IdentifierNode>, Vec<Arc<IdentifierNode>>)>) -> Parser<Node> {
    rule(move |c| {
        let source = source.parse(c)?;
        let Some((name, columns)) = alias.parse(c) else {
            return Some(source);
        };
        let location = source.location();
        Some(Node::from(AliasNode {
            source: Some(source),
            alias: Some(name),
            columns,
            location,
        }))
    })
}

/// Consumes `ROW` or `ROWS`.
fn rows(c: &mut Cursor) -> Option<()> {
    c.keyword(Keyword::Rows)
        .or_else(|| c.keyword(Keyword::Row))
        .map(|_| ())
}

/// `FETCH NEXT|FIRST n ROW[S] ONLY`, returning `n`.
fn fetch_clause(count: Parser<Node>) -> Parser<Node> {
    rule(move |c| {
        c.keyword(Keyword::Fetch)?;
        c.keyword(Keyword::Next).or_else(|| c.keyword(Keyword::First))?;
        let count = count.parse(c)?;
        rows(c)?;
        c.keyword(Keyword::Only)?;
        Some(count)
    })
}

/// The row limiting clauses that follow ORDER BY.
#[derive(Default)]
struct RowLimit {
    limit: Option<Node>,
    offset: Option<Node>,
    fetch: Option<Node>,
}

fn row_limit(dialect: Dialect, count: Parser<Node>) -> Parser<RowLimit> {
    let fetch = fetch_clause(count.clone());
    match dialect {
        Dialect::TSql => rule(move |c| {
            let mut limit = RowLimit::default();
            if c.keyword(Keyword::Offset).is_some() {
                limit.offset = Some(count.parse(c)?);
                rows(c)?;
                limit.fetch = fetch.parse(c);
            }
            Some(limit)
        }),
        // PostgreSQL takes the clauses in any order, each at most once.
        // FETCH FIRST is the standard spelling of LIMIT and is kept as one.
        Dialect::Postgres => rule(move |c| {
            let mut limit = RowLimit::default();
            loop {
                if limit.limit.is_none() && c.keyword(Keyword::Limit).is_some() {
                    limit.limit = Some(count.parse(c)?);
                } else if limit.offset.is_none() && c.keyword(Keyword::Offset).is_some() {
                    limit.offset = Some(count.parse(c)?);
                    let _ = rows(c);
                } else if limit.limit.is_none() && c.peek_keyword(Keyword::Fetch) {
                    limit.limit = Some(fetch.parse(c)?);
                } else {
                    return Some(limit);
                }
            }
        }),
    }
}

/// `TOP (expr)` or `TOP n`, with `PERCENT` and `WITH TIES`.
fn top(exprs: &ExpressionRules) -> Parser<Node> {
    let value = first(vec![
        parenthesized(exprs.expression.clone()).map(|(_, value)| value),
        number(),
    ]);
    rule(move |c| {
        let t = c.keyword(Keyword::Top)?;
        let value = value.parse(c)?;
        let percent = c.keyword(Keyword::Percent).is_some();
        let with_ties = c.keywords(&[Keyword::With, Keyword::Ties]).is_some();
        Some(Node::from(TopNode {
            value,
            percent,
            with_ties,
            location: t.location,
        }))
    })
}

/// A comma separated list wrapped in a [`ListNode`].
fn list_node(item: Parser<Node>) -> Parser<Node> {
    let items = list_separated_by(item, symbol(","), 1);
    rule(move |c| {
        let location = c.location();
        let items = items.parse(c)?;
        Some(Node::from(ListNode::new(items, location)))
    })
}

fn join_operator(dialect: Dialect) -> Parser<JoinOperator> {
    rule(move |c| {
        let operator = if c.symbol(",").is_some() {
            JoinOperator::Comma
        } else if c.keyword(Keyword::Join).is_some()
            || c.keywords(&[Keyword::Inner, Keyword::Join]).is_some()
        {
            JoinOperator::Inner
        } else if let Some(operator) = outer_join(c) {
            operator
        } else if c.keywords(&[Keyword::Cross, Keyword::Join]).is_some() {
            JoinOperator::Cross
        } else if dialect.supports_apply() && c.keywords(&[Keyword::Cross, Keyword::Apply]).is_some() {
            JoinOperator::CrossApply
        } else if dialect.supports_apply() && c.keywords(&[Keyword::Outer, Keyword::Apply]).is_some() {
            JoinOperator::OuterApply
        } else if c.keywords(&[Keyword::Natural, Keyword::Join]).is_some() {
            JoinOperator::Natural
        } else {
            return None;
        };
        Some(operator)
    })
}

/// `LEFT|RIGHT|FULL [OUTER] JOIN`.
fn outer_join(c: &mut Cursor) -> Option<JoinOperator> {
    let start = c.position();
    let operator = if c.keyword(Keyword::Left).is_some() {
        JoinOperator::Left
    } else if c.keyword(Keyword::Right).is_some() {
        JoinOperator::Right
    } else if c.keyword(Keyword::Full).is_some() {
        JoinOperator::Full
    } else {
        return None;
    };
    c.keyword(Keyword::Outer);
    if c.keyword(Keyword::Join).is_none() {
        c.reset(start);
        return None;
    }
    Some(operator)
}

fn set_operator() -> Parser<SetOperator> {
    rule(|c| {
        if c.keyword(Keyword::Union).is_some() {
            if c.keyword(Keyword::All).is_some() {
                Some(SetOperator::UnionAll)
            } else {
                Some(SetOperator::Union)
            }
        } else if c.keyword(Keyword::Except).is_some() {
            Some(SetOperator::Except)
        } else {
            c.keyword(Keyword::Intersect).map(|_| SetOperator::Intersect)
        }
    })
}

pub(super) fn rules(
    dialect: Dialect,
    exprs: &ExpressionRules,
    query_ref: &Parser<Node>,
) -> QueryRules {
    let expression = exprs.expression.clone();
    let alias = alias(exprs);

    let subquery = parenthesized(query_ref.clone())
        .map(|(location, query)| Node::from(ParenthesisNode::new(query, location)));

    let value_row = {
        let default = rule(|c| {
            let t = c.keyword(Keyword::Default)?;
            Some(Node::from(KeywordNode::new("DEFAULT", t.location)))
        });
        let item = first(vec![default, expression.clone()]);
        parenthesized(list_node(item))
            .map(|(location, row)| Node::from(ParenthesisNode::new(row, location)))
    };
    let values = {
        let rows = list_separated_by(value_row.clone(), symbol(","), 1);
        rule(move |c| {
            let t = c.keyword(Keyword::Values)?;
            let rows = rows.parse(c)?;
            Some(Node::from(ValuesNode {
                rows,
                location: t.location,
            }))
        })
    };

    let (table_source_ref, table_source_slot) = deferred();
    let table_primary = {
        let nested = parenthesized(table_source_ref)
            .map(|(location, source)| Node::from(ParenthesisNode::new(source, location)));
        let function = exprs.function_call.clone();
        let variable = exprs.variable.clone();
        let table = exprs.object_identifier.clone().map(Node::from);
        first(vec![
            aliased(subquery.clone(), alias.clone()),
            nested,
            aliased(function, alias.clone()),
            aliased(variable, alias.clone()),
            aliased(table, alias.clone()),
        ])
    };

    let table_source = {
        let primary = table_primary.clone();
        let expression = expression.clone();
        let join = join_operator(dialect);
        let suffix = rule(move |c| {
            let operator = join.parse(c)?;
            let right = primary.parse(c)?;
            let condition = if operator.requires_condition() {
                c.keyword(Keyword::On)?;
                Some(expression.parse(c)?)
            } else {
                None
            };
            Some((operator, right, condition))
        });
        left_apply(
            table_primary.clone(),
            suffix,
            |left, (operator, right, condition)| {
                let location = left.location();
                JoinNode {
                    left,
                    operator,
                    right,
                    condition,
                    location,
                }
                .into()
            },
            Arity::ZeroOrMore,
        )
    };
    table_source_slot.set(&table_source);

    let select_item = {
        let item = aliased(expression.clone(), alias.clone());
        first(vec![exprs.star.clone(), item])
    };
    let order_item = {
        let expression = expression.clone();
        rule(move |c| {
            let expr = expression.parse(c)?;
            let direction = if c.keyword(Keyword::Asc).is_some() {
                Some(OrderDirection::Asc)
            } else if c.keyword(Keyword::Desc).is_some() {
                Some(OrderDirection::Desc)
            } else {
                None
            };
            let location = expr.location();
            Some(Node::from(OrderByNode {
                expr,
                direction,
                location,
            }))
        })
    };

    let select = {
        let top = top(exprs);
        let columns = list_node(select_item);
        let from = table_source.clone();
        let group_by = list_node(expression.clone());
        let order_by = list_node(order_item);
        let row_limit = row_limit(dialect, expression.clone());
        rule(move |c| {
            let t = c.keyword(Keyword::Select)?;
            let distinct = if c.keyword(Keyword::Distinct).is_some() {
                true
            } else {
                c.keyword(Keyword::All);
                false
            };
            let top = if dialect.supports_top() {
                top.parse(c)
            } else {
                None
            };
            let mut select = SelectNode::new(columns.parse(c)?, t.location);
            select.distinct = distinct;
            select.top = top;
            if c.keyword(Keyword::From).is_some() {
                select.from = Some(from.parse(c)?);
            }
            if c.keyword(Keyword::Where).is_some() {
                select.where_clause = Some(expression.parse(c)?);
            }
            if c.keywords(&[Keyword::Group, Keyword::By]).is_some() {
                select.group_by = Some(group_by.parse(c)?);
            }
            if c.keyword(Keyword::Having).is_some() {
                select.having = Some(expression.parse(c)?);
            }
            if c.keywords(&[Keyword::Order, Keyword::By]).is_some() {
                select.order_by = Some(order_by.parse(c)?);
            }
            let limit = row_limit.parse(c)?;
            select.limit = limit.limit;
            select.offset = limit.offset;
            select.fetch = limit.fetch;
            Some(Node::from(select))
        })
    };

    let mut primaries = vec![select, subquery];
    if dialect.supports_values_table() {
        primaries.push(values.clone());
    }
    let query = right_apply(first(primaries), set_operator(), |left, operator, right| {
        let location = left.location();
        SetOperationNode {
            left,
            operator,
            right,
            location,
        }
        .into()
    });

    QueryRules {
        query,
        table_source,
        table_primary,
        values,
        value_row,
    }
}
