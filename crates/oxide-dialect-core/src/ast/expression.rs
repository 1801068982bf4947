//! Scalar expression nodes and the generic wrapper nodes.

use std::sync::Arc;

use super::{
    same, same_all, same_arc_opt, same_arcs, same_opt, structural_eq, DataTypeNode,
    IdentifierNode, Node, ObjectIdentifierNode, OperatorNode, SqlNode,
};
use crate::lexer::{Keyword, Location};
use crate::writer::SqlWriter;

/// A prefix operation: `-x`, `+x`, `~x`, `NOT x`, `EXISTS (query)`.
#[derive(Debug, Clone)]
pub struct PrefixNode {
    /// The operator.
    pub operator: Arc<OperatorNode>,
    /// The operand.
    pub operand: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(PrefixNode { operator, operand });

impl PrefixNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, operator: Arc<OperatorNode>, operand: Node) -> Arc<Self> {
        if Arc::ptr_eq(&self.operator, &operator) && same(&self.operand, &operand) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            operator,
            operand,
            location: self.location,
        })
    }
}

impl SqlNode for PrefixNode {
    const KIND: &'static str = "PrefixNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        self.operator.write_sql(w);
        let needs_space = self.operator.is_word()
            || matches!(&self.operand, Node::Prefix(_))
            || matches!(&self.operand, Node::Number(n) if n.value.is_sign_negative());
        if needs_space {
            w.push(" ");
        }
        w.operand(&self.operand);
    }
}

/// A binary operation. Comparison, arithmetic, bitwise, `LIKE` and the
/// boolean `AND`/`OR` all use this node.
#[derive(Debug, Clone)]
pub struct InfixNode {
    /// Left operand.
    pub left: Node,
    /// The operator.
    pub operator: Arc<OperatorNode>,
    /// Right operand.
    pub right: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(InfixNode {
    left,
    operator,
    right
});

impl InfixNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        left: Node,
        operator: Arc<OperatorNode>,
        right: Node,
    ) -> Arc<Self> {
        if same(&self.left, &left)
            && Arc::ptr_eq(&self.operator, &operator)
            && same(&self.right, &right)
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            left,
            operator,
            right,
            location: self.location,
        })
    }
}

impl SqlNode for InfixNode {
    const KIND: &'static str = "InfixNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.operand(&self.left);
        if self.operator.is_boolean() {
            w.newline();
        } else {
            w.push(" ");
        }
        self.operator.write_sql(w);
        w.push(" ");
        w.operand(&self.right);
    }
}

/// `expr [NOT] BETWEEN low AND high`.
#[derive(Debug, Clone)]
pub struct BetweenNode {
    /// The tested expression.
    pub expr: Node,
    /// Whether the test is negated.
    pub not: bool,
    /// Lower bound.
    pub low: Node,
    /// Upper bound.
    pub high: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(BetweenNode {
    expr,
    not,
    low,
    high
});

impl BetweenNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, expr: Node, low: Node, high: Node) -> Arc<Self> {
        if same(&self.expr, &expr) && same(&self.low, &low) && same(&self.high, &high) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            expr,
            not: self.not,
            low,
            high,
            location: self.location,
        })
    }
}

impl SqlNode for BetweenNode {
    const KIND: &'static str = "BetweenNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.operand(&self.expr);
        w.push(if self.not { " NOT BETWEEN " } else { " BETWEEN " });
        w.operand(&self.low);
        w.push(" AND ");
        w.operand(&self.high);
    }
}

/// `expr [NOT] IN (list)` or `expr [NOT] IN (query)`.
#[derive(Debug, Clone)]
pub struct InNode {
    /// The tested expression.
    pub expr: Node,
    /// Whether the test is negated.
    pub not: bool,
    /// A `ParenthesisNode` around a `ListNode` or a query.
    pub list: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(InNode { expr, not, list });

impl InNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, expr: Node, list: Node) -> Arc<Self> {
        if same(&self.expr, &expr) && same(&self.list, &list) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            expr,
            not: self.not,
            list,
            location: self.location,
        })
    }
}

impl SqlNode for InNode {
    const KIND: &'static str = "InNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.operand(&self.expr);
        w.push(if self.not { " NOT IN " } else { " IN " });
        w.node(&self.list);
    }
}

/// `expr IS [NOT] NULL`.
#[derive(Debug, Clone)]
pub struct IsNullNode {
    /// The tested expression.
    pub expr: Node,
    /// Whether the test is negated.
    pub not: bool,
    /// Source location.
    pub location: Location,
}

structural_eq!(IsNullNode { expr, not });

impl IsNullNode {
    /// Returns the node with a new operand, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, expr: Node) -> Arc<Self> {
        if same(&self.expr, &expr) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            expr,
            not: self.not,
            location: self.location,
        })
    }
}

impl SqlNode for IsNullNode {
    const KIND: &'static str = "IsNullNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.operand(&self.expr);
        w.push(if self.not { " IS NOT NULL" } else { " IS NULL" });
    }
}

/// A simple (`CASE x WHEN ...`) or searched (`CASE WHEN ...`) CASE expression.
#[derive(Debug, Clone)]
pub struct CaseNode {
    /// The input of a simple CASE.
    pub input: Option<Node>,
    /// `CaseWhenNode`s, at least one after a successful parse.
    pub whens: Vec<Node>,
    /// The ELSE result.
    pub else_result: Option<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(CaseNode {
    input,
    whens,
    else_result
});

impl CaseNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        input: Option<Node>,
        whens: Vec<Node>,
        else_result: Option<Node>,
    ) -> Arc<Self> {
        if same_opt(self.input.as_ref(), input.as_ref())
            && same_all(&self.whens, &whens)
            && same_opt(self.else_result.as_ref(), else_result.as_ref())
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            input,
            whens,
            else_result,
            location: self.location,
        })
    }
}

impl SqlNode for CaseNode {
    const KIND: &'static str = "CaseNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("CASE");
        if let Some(input) = &self.input {
            w.push(" ");
            w.node(input);
        }
        for when in &self.whens {
            w.push(" ");
            w.node(when);
        }
        if let Some(else_result) = &self.else_result {
            w.push(" ELSE ");
            w.node(else_result);
        }
        w.push(" END");
    }
}

/// One `WHEN condition THEN result` arm of a CASE.
#[derive(Debug, Clone)]
pub struct CaseWhenNode {
    /// The tested value or condition.
    pub condition: Node,
    /// The result.
    pub result: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(CaseWhenNode { condition, result });

impl CaseWhenNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, condition: Node, result: Node) -> Arc<Self> {
        if same(&self.condition, &condition) && same(&self.result, &result) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            condition,
            result,
            location: self.location,
        })
    }
}

impl SqlNode for CaseWhenNode {
    const KIND: &'static str = "CaseWhenNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("WHEN ");
        w.node(&self.condition);
        w.push(" THEN ");
        w.node(&self.result);
    }
}

/// A function call: `name([DISTINCT] args)`.
#[derive(Debug, Clone)]
pub struct FunctionCallNode {
    /// Function name.
    pub name: Arc<ObjectIdentifierNode>,
    /// Whether `DISTINCT` precedes the arguments.
    pub distinct: bool,
    /// Arguments.
    pub arguments: Vec<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(FunctionCallNode {
    name,
    distinct,
    arguments
});

impl FunctionCallNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        name: Arc<ObjectIdentifierNode>,
        arguments: Vec<Node>,
    ) -> Arc<Self> {
        if Arc::ptr_eq(&self.name, &name) && same_all(&self.arguments, &arguments) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            name,
            distinct: self.distinct,
            arguments,
            location: self.location,
        })
    }
}

impl SqlNode for FunctionCallNode {
    const KIND: &'static str = "FunctionCallNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        // Built-in names such as MAX or LEFT lex as keywords; delimiting them
        // would turn them into user-defined function names.
        let dialect = w.dialect();
        match self.name_str() {
            Some(name)
                if Keyword::from_str(name).is_some_and(|k| {
                    dialect.has_keyword(k)
                        && (!dialect.is_reserved(k) || matches!(k, Keyword::Left | Keyword::Right))
                }) =>
            {
                w.push(name);
            }
            _ => self.name.write_sql(w),
        }
        w.push("(");
        if self.distinct {
            w.push("DISTINCT ");
        }
        w.nodes(&self.arguments, ", ");
        w.push(")");
    }
}

impl FunctionCallNode {
    /// Returns the name when it has a single part.
    #[must_use]
    pub fn name_str(&self) -> Option<&str> {
        self.name.is_simple().then(|| self.name.name_str())
    }
}

/// `CAST(expr AS type)`; also produced by PostgreSQL's `expr::type`.
#[derive(Debug, Clone)]
pub struct CastNode {
    /// The converted expression.
    pub expr: Node,
    /// The target type.
    pub data_type: Arc<DataTypeNode>,
    /// Source location.
    pub location: Location,
}

structural_eq!(CastNode { expr, data_type });

impl CastNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, expr: Node, data_type: Arc<DataTypeNode>) -> Arc<Self> {
        if same(&self.expr, &expr) && Arc::ptr_eq(&self.data_type, &data_type) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            expr,
            data_type,
            location: self.location,
        })
    }
}

impl SqlNode for CastNode {
    const KIND: &'static str = "CastNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("CAST(");
        w.node(&self.expr);
        w.push(" AS ");
        self.data_type.write_sql(w);
        w.push(")");
    }
}

/// A node wrapped in parentheses.
///
/// Used for subqueries, `IN` lists, `VALUES` rows, derived tables and
/// parenthesized table sources. Grouping parentheses around scalar
/// expressions are not kept; the writer adds them back where needed.
#[derive(Debug, Clone)]
pub struct ParenthesisNode {
    /// The wrapped node.
    pub inner: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(ParenthesisNode { inner });

impl ParenthesisNode {
    /// Wraps `inner` in parentheses.
    #[must_use]
    pub const fn new(inner: Node, location: Location) -> Self {
        Self { inner, location }
    }

    /// Returns the node with a new inner node, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, inner: Node) -> Arc<Self> {
        if same(&self.inner, &inner) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            inner,
            location: self.location,
        })
    }
}

impl SqlNode for ParenthesisNode {
    const KIND: &'static str = "ParenthesisNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("(");
        if self.inner.is_query() && !matches!(self.inner, Node::Parenthesis(_)) {
            w.indent();
            w.newline();
            w.node(&self.inner);
            w.dedent();
            w.newline();
        } else {
            w.node(&self.inner);
        }
        w.push(")");
    }
}

/// `source [AS] alias [(columns)]`.
///
/// Both the source and the alias are optional in the type so that partially
/// built trees can be represented; validation rejects either being absent.
#[derive(Debug, Clone)]
pub struct AliasNode {
    /// The aliased expression or table source.
    pub source: Option<Node>,
    /// The alias name.
    pub alias: Option<Arc<IdentifierNode>>,
    /// Column names of a derived table.
    pub columns: Vec<Arc<IdentifierNode>>,
    /// Source location.
    pub location: Location,
}

structural_eq!(AliasNode {
    source,
    alias,
    columns
});

impl AliasNode {
    /// Creates an alias without a column list.
    #[must_use]
    pub fn new(source: Node, alias: IdentifierNode, location: Location) -> Self {
        Self {
            source: Some(source),
            alias: Some(Arc::new(alias)),
            columns: Vec::new(),
            location,
        }
    }

    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        source: Option<Node>,
        alias: Option<Arc<IdentifierNode>>,
        columns: Vec<Arc<IdentifierNode>>,
    ) -> Arc<Self> {
        if same_opt(self.source.as_ref(), source.as_ref())
            && same_arc_opt(self.alias.as_ref(), alias.as_ref())
            && same_arcs(&self.columns, &columns)
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            source,
            alias,
            columns,
            location: self.location,
        })
    }

    /// Returns the alias name.
    #[must_use]
    pub fn alias_str(&self) -> Option<&str> {
        self.alias.as_deref().map(|a| a.name.as_str())
    }
}

impl SqlNode for AliasNode {
    const KIND: &'static str = "AliasNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        if let Some(source) = &self.source {
            w.node(source);
        }
        if let Some(alias) = &self.alias {
            w.push(" AS ");
            alias.write_sql(w);
        }
        if !self.columns.is_empty() {
            w.push("(");
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                column.write_sql(w);
            }
            w.push(")");
        }
    }
}

/// How the items of a [`ListNode`] are separated when written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListSeparator {
    /// `a, b, c`
    #[default]
    Comma,
    /// One item per line, each line but the last ending in a comma.
    Lines,
}

/// An ordered sequence of nodes of one kind of element: expressions of an
/// `IN` list or `VALUES` row, select items, sort keys, assignments.
#[derive(Debug, Clone)]
pub struct ListNode {
    /// The items.
    pub items: Vec<Node>,
    /// Separator used when writing.
    pub separator: ListSeparator,
    /// Source location.
    pub location: Location,
}

structural_eq!(ListNode { items });

impl ListNode {
    /// Creates a comma separated list.
    #[must_use]
    pub const fn new(items: Vec<Node>, location: Location) -> Self {
        Self {
            items,
            separator: ListSeparator::Comma,
            location,
        }
    }

    /// Sets the separator.
    #[must_use]
    pub const fn with_separator(mut self, separator: ListSeparator) -> Self {
        self.separator = separator;
        self
    }

    /// Returns the node with new items, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, items: Vec<Node>) -> Arc<Self> {
        if same_all(&self.items, &items) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            items,
            separator: self.separator,
            location: self.location,
        })
    }
}

impl SqlNode for ListNode {
    const KIND: &'static str = "ListNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        match self.separator {
            ListSeparator::Comma => w.nodes(&self.items, ", "),
            ListSeparator::Lines => {
                for (i, item) in self.items.iter().enumerate() {
                    if i > 0 {
                        w.push(",");
                        w.newline();
                    }
                    w.node(item);
                }
            }
        }
    }
}
