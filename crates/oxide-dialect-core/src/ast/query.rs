//! Query expression nodes: SELECT and its clauses, joins, set operations.

use std::sync::Arc;

use super::{same, same_all, same_opt, structural_eq, Node, SqlNode};
use crate::dialect::Dialect;
use crate::lexer::Location;
use crate::writer::SqlWriter;

/// A SELECT query block. Absent clauses are `None`.
///
/// Row limiting is kept as written: `top` (T-SQL `TOP`), `limit`
/// (PostgreSQL `LIMIT` or `FETCH FIRST`), `offset` (both) and `fetch`
/// (T-SQL `FETCH NEXT`).
/// The writer translates between them for the target dialect.
#[derive(Debug, Clone)]
pub struct SelectNode {
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// `TopNode`.
    pub top: Option<Node>,
    /// `ListNode` of select items.
    pub columns: Node,
    /// Table source: a table primary or a `JoinNode` tree.
    pub from: Option<Node>,
    /// WHERE condition.
    pub where_clause: Option<Node>,
    /// `ListNode` of grouping expressions.
    pub group_by: Option<Node>,
    /// HAVING condition.
    pub having: Option<Node>,
    /// `ListNode` of `OrderByNode`s.
    pub order_by: Option<Node>,
    /// Row count of a PostgreSQL `LIMIT` or `FETCH FIRST`.
    pub limit: Option<Node>,
    /// Number of rows skipped.
    pub offset: Option<Node>,
    /// Row count of a T-SQL `FETCH NEXT`.
    pub fetch: Option<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(SelectNode {
    distinct,
    top,
    columns,
    from,
    where_clause,
    group_by,
    having,
    order_by,
    limit,
    offset,
    fetch
});

impl SelectNode {
    /// Creates a query block with only a select list.
    #[must_use]
    pub const fn new(columns: Node, location: Location) -> Self {
        Self {
            distinct: false,
            top: None,
            columns,
            from: None,
            where_clause: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
            offset: None,
            fetch: None,
            location,
        }
    }

    /// Returns the node with new clauses, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, clauses: Self) -> Arc<Self> {
        let unchanged = same_opt(self.top.as_ref(), clauses.top.as_ref())
            && same(&self.columns, &clauses.columns)
            && same_opt(self.from.as_ref(), clauses.from.as_ref())
            && same_opt(self.where_clause.as_ref(), clauses.where_clause.as_ref())
            && same_opt(self.group_by.as_ref(), clauses.group_by.as_ref())
            && same_opt(self.having.as_ref(), clauses.having.as_ref())
            && same_opt(self.order_by.as_ref(), clauses.order_by.as_ref())
            && same_opt(self.limit.as_ref(), clauses.limit.as_ref())
            && same_opt(self.offset.as_ref(), clauses.offset.as_ref())
            && same_opt(self.fetch.as_ref(), clauses.fetch.as_ref());
        if unchanged {
            return Arc::clone(self);
        }
        Arc::new(Self {
            distinct: self.distinct,
            location: self.location,
            ..clauses
        })
    }

    fn write_row_limit_prefix(&self, w: &mut SqlWriter) {
        if w.dialect() != Dialect::TSql {
            return;
        }
        if let Some(top) = &self.top {
            w.node(top);
            w.push(" ");
        } else if let (Some(limit), None) = (&self.limit, &self.offset) {
            w.push("TOP (");
            w.node(limit);
            w.push(") ");
        } else if let (Some(fetch), None) = (&self.fetch, &self.offset) {
            w.push("TOP (");
            w.node(fetch);
            w.push(") ");
        }
    }

    fn write_row_limit_suffix(&self, w: &mut SqlWriter) {
        match w.dialect() {
            Dialect::TSql => {
                let Some(offset) = &self.offset else {
                    return;
                };
                w.newline();
                w.push("OFFSET ");
                w.node(offset);
                w.push(" ROWS");
                if let Some(count) = self.fetch.as_ref().or(self.limit.as_ref()) {
                    w.newline();
                    w.push("FETCH NEXT ");
                    w.node(count);
                    w.push(" ROWS ONLY");
                }
            }
            Dialect::Postgres => {
                let top = match &self.top {
                    Some(Node::Top(top)) => Some(&top.value),
                    _ => None,
                };
                if let Some(count) = self.limit.as_ref().or(self.fetch.as_ref()).or(top) {
                    w.newline();
                    w.push("LIMIT ");
                    w.node(count);
                }
                if let Some(offset) = &self.offset {
                    w.newline();
                    w.push("OFFSET ");
                    w.node(offset);
                }
            }
        }
    }
}

impl SqlNode for SelectNode {
    const KIND: &'static str = "SelectNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("SELECT ");
        if self.distinct {
            w.push("DISTINCT ");
        }
        self.write_row_limit_prefix(w);
        w.node(&self.columns);
        let clauses = [
            ("FROM ", &self.from),
            ("WHERE ", &self.where_clause),
            ("GROUP BY ", &self.group_by),
            ("HAVING ", &self.having),
            ("ORDER BY ", &self.order_by),
        ];
        for (keyword, clause) in clauses {
            if let Some(clause) = clause {
                w.newline();
                w.push(keyword);
                w.node(clause);
            }
        }
        self.write_row_limit_suffix(w);
    }
}

/// `TOP (value) [PERCENT] [WITH TIES]`.
#[derive(Debug, Clone)]
pub struct TopNode {
    /// Row count or percentage.
    pub value: Node,
    /// `PERCENT`.
    pub percent: bool,
    /// `WITH TIES`.
    pub with_ties: bool,
    /// Source location.
    pub location: Location,
}

structural_eq!(TopNode {
    value,
    percent,
    with_ties
});

impl TopNode {
    /// Returns the node with a new value, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, value: Node) -> Arc<Self> {
        if same(&self.value, &value) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            value,
            percent: self.percent,
            with_ties: self.with_ties,
            location: self.location,
        })
    }
}

impl SqlNode for TopNode {
    const KIND: &'static str = "TopNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("TOP (");
        w.node(&self.value);
        w.push(")");
        if self.percent {
            w.push(" PERCENT");
        }
        if self.with_ties {
            w.push(" WITH TIES");
        }
    }
}

/// The operator of a [`JoinNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOperator {
    /// `[INNER] JOIN`
    Inner,
    /// `LEFT [OUTER] JOIN`
    Left,
    /// `RIGHT [OUTER] JOIN`
    Right,
    /// `FULL [OUTER] JOIN`
    Full,
    /// `CROSS JOIN`
    Cross,
    /// `CROSS APPLY`
    CrossApply,
    /// `OUTER APPLY`
    OuterApply,
    /// `NATURAL JOIN`
    Natural,
    /// `a, b`
    Comma,
}

impl JoinOperator {
    /// Returns the SQL text of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
            Self::CrossApply => "CROSS APPLY",
            Self::OuterApply => "OUTER APPLY",
            Self::Natural => "NATURAL JOIN",
            Self::Comma => ",",
        }
    }

    /// Returns true if the operator must be followed by `ON condition`.
    ///
    /// `CROSS JOIN`, `CROSS APPLY` and `OUTER APPLY` never take one: a cross
    /// join is unconditional and an APPLY correlates through its right side.
    #[must_use]
    pub const fn requires_condition(self) -> bool {
        matches!(self, Self::Inner | Self::Left | Self::Right | Self::Full)
    }
}

/// A binary join. Chains nest on the left: `a JOIN b JOIN c` is
/// `(a JOIN b) JOIN c`.
#[derive(Debug, Clone)]
pub struct JoinNode {
    /// Left table source.
    pub left: Node,
    /// Join operator.
    pub operator: JoinOperator,
    /// Right table source.
    pub right: Node,
    /// ON condition, present exactly when the operator requires one.
    pub condition: Option<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(JoinNode {
    left,
    operator,
    right,
    condition
});

impl JoinNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, left: Node, right: Node, condition: Option<Node>) -> Arc<Self> {
        if same(&self.left, &left)
            && same(&self.right, &right)
            && same_opt(self.condition.as_ref(), condition.as_ref())
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            left,
            operator: self.operator,
            right,
            condition,
            location: self.location,
        })
    }
}

impl SqlNode for JoinNode {
    const KIND: &'static str = "JoinNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.node(&self.left);
        if self.operator == JoinOperator::Comma {
            w.push(", ");
        } else {
            w.newline();
            w.push(self.operator.as_str());
            w.push(" ");
        }
        w.node(&self.right);
        if let Some(condition) = &self.condition {
            w.push(" ON ");
            w.node(condition);
        }
    }
}

/// Sort direction of an ORDER BY item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// `ASC`
    Asc,
    /// `DESC`
    Desc,
}

/// `expr [ASC | DESC]`.
#[derive(Debug, Clone)]
pub struct OrderByNode {
    /// Sort key.
    pub expr: Node,
    /// Explicit direction.
    pub direction: Option<OrderDirection>,
    /// Source location.
    pub location: Location,
}

structural_eq!(OrderByNode { expr, direction });

impl OrderByNode {
    /// Returns the node with a new key, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, expr: Node) -> Arc<Self> {
        if same(&self.expr, &expr) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            expr,
            direction: self.direction,
            location: self.location,
        })
    }
}

impl SqlNode for OrderByNode {
    const KIND: &'static str = "OrderByNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.node(&self.expr);
        match self.direction {
            Some(OrderDirection::Asc) => w.push(" ASC"),
            Some(OrderDirection::Desc) => w.push(" DESC"),
            None => {}
        }
    }
}

/// A set operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// `UNION`
    Union,
    /// `UNION ALL`
    UnionAll,
    /// `EXCEPT`
    Except,
    /// `INTERSECT`
    Intersect,
}

impl SetOperator {
    /// Returns the SQL text of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Except => "EXCEPT",
            Self::Intersect => "INTERSECT",
        }
    }
}

/// `left UNION right` and friends. Chains nest on the right.
#[derive(Debug, Clone)]
pub struct SetOperationNode {
    /// Left query.
    pub left: Node,
    /// Operator.
    pub operator: SetOperator,
    /// Right query, possibly another set operation.
    pub right: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(SetOperationNode {
    left,
    operator,
    right
});

impl SetOperationNode {
    /// Returns the node with new operands, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, left: Node, right: Node) -> Arc<Self> {
        if same(&self.left, &left) && same(&self.right, &right) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            left,
            operator: self.operator,
            right,
            location: self.location,
        })
    }
}

impl SqlNode for SetOperationNode {
    const KIND: &'static str = "SetOperationNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.node(&self.left);
        w.newline();
        w.push(self.operator.as_str());
        w.newline();
        w.node(&self.right);
    }
}

/// `VALUES (..), (..)`: each row is a `ParenthesisNode` around a `ListNode`.
#[derive(Debug, Clone)]
pub struct ValuesNode {
    /// Rows.
    pub rows: Vec<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(ValuesNode { rows });

impl ValuesNode {
    /// Returns the node with new rows, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, rows: Vec<Node>) -> Arc<Self> {
        if same_all(&self.rows, &rows) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            rows,
            location: self.location,
        })
    }
}

impl SqlNode for ValuesNode {
    const KIND: &'static str = "ValuesNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("VALUES ");
        w.nodes(&self.rows, ", ");
    }
}
