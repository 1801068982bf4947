//! Statement nodes.

use std::sync::Arc;

use super::{
    same, same_all, same_arcs, same_opt, structural_eq, DataTypeNode, IdentifierNode, Node,
    OperatorNode, SqlNode, VariableNode,
};
use crate::dialect::Dialect;
use crate::lexer::Location;
use crate::writer::SqlWriter;

fn write_column_list(w: &mut SqlWriter, columns: &[Arc<IdentifierNode>]) {
    if columns.is_empty() {
        return;
    }
    w.push("(");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        column.write_sql(w);
    }
    w.push(")");
}

/// `INSERT INTO target [(columns)] source`.
#[derive(Debug, Clone)]
pub struct InsertNode {
    /// Target table.
    pub target: Node,
    /// Target columns.
    pub columns: Vec<Arc<IdentifierNode>>,
    /// A `ValuesNode` or a query.
    pub source: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(InsertNode {
    target,
    columns,
    source
});

impl InsertNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        target: Node,
        columns: Vec<Arc<IdentifierNode>>,
        source: Node,
    ) -> Arc<Self> {
        if same(&self.target, &target)
            && same_arcs(&self.columns, &columns)
            && same(&self.source, &source)
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            target,
            columns,
            source,
            location: self.location,
        })
    }
}

impl SqlNode for InsertNode {
    const KIND: &'static str = "InsertNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("INSERT INTO ");
        w.node(&self.target);
        write_column_list(w, &self.columns);
        w.newline();
        w.node(&self.source);
    }
}

/// `UPDATE target SET assignments [FROM sources] [WHERE condition]`.
#[derive(Debug, Clone)]
pub struct UpdateNode {
    /// Target table or alias.
    pub target: Node,
    /// `ListNode` of assignments, each an `InfixNode` with `=` or a
    /// compound assignment operator.
    pub assignments: Node,
    /// Additional table sources.
    pub from: Option<Node>,
    /// WHERE condition.
    pub where_clause: Option<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(UpdateNode {
    target,
    assignments,
    from,
    where_clause
});

impl UpdateNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        target: Node,
        assignments: Node,
        from: Option<Node>,
        where_clause: Option<Node>,
    ) -> Arc<Self> {
        if same(&self.target, &target)
            && same(&self.assignments, &assignments)
            && same_opt(self.from.as_ref(), from.as_ref())
            && same_opt(self.where_clause.as_ref(), where_clause.as_ref())
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            target,
            assignments,
            from,
            where_clause,
            location: self.location,
        })
    }
}

impl SqlNode for UpdateNode {
    const KIND: &'static str = "UpdateNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("UPDATE ");
        w.node(&self.target);
        w.newline();
        w.push("SET ");
        w.node(&self.assignments);
        if let Some(from) = &self.from {
            w.newline();
            w.push("FROM ");
            w.node(from);
        }
        if let Some(condition) = &self.where_clause {
            w.newline();
            w.push("WHERE ");
            w.node(condition);
        }
    }
}

/// `DELETE FROM target [FROM | USING sources] [WHERE condition]`.
#[derive(Debug, Clone)]
pub struct DeleteNode {
    /// Target table or alias.
    pub target: Node,
    /// Additional table sources (T-SQL `FROM`, PostgreSQL `USING`).
    pub from: Option<Node>,
    /// WHERE condition.
    pub where_clause: Option<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(DeleteNode {
    target,
    from,
    where_clause
});

impl DeleteNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        target: Node,
        from: Option<Node>,
        where_clause: Option<Node>,
    ) -> Arc<Self> {
        if same(&self.target, &target)
            && same_opt(self.from.as_ref(), from.as_ref())
            && same_opt(self.where_clause.as_ref(), where_clause.as_ref())
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            target,
            from,
            where_clause,
            location: self.location,
        })
    }
}

impl SqlNode for DeleteNode {
    const KIND: &'static str = "DeleteNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("DELETE FROM ");
        w.node(&self.target);
        if let Some(from) = &self.from {
            w.newline();
            w.push(match w.dialect() {
                Dialect::TSql => "FROM ",
                Dialect::Postgres => "USING ",
            });
            w.node(from);
        }
        if let Some(condition) = &self.where_clause {
            w.newline();
            w.push("WHERE ");
            w.node(condition);
        }
    }
}

/// `MERGE INTO target USING source ON condition WHEN ...`.
#[derive(Debug, Clone)]
pub struct MergeNode {
    /// Target table, possibly aliased.
    pub target: Node,
    /// Source table or query, possibly aliased.
    pub source: Node,
    /// Match condition.
    pub condition: Node,
    /// `MergeMatchNode`s.
    pub clauses: Vec<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(MergeNode {
    target,
    source,
    condition,
    clauses
});

impl MergeNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        target: Node,
        source: Node,
        condition: Node,
        clauses: Vec<Node>,
    ) -> Arc<Self> {
        if same(&self.target, &target)
            && same(&self.source, &source)
            && same(&self.condition, &condition)
            && same_all(&self.clauses, &clauses)
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            target,
            source,
            condition,
            clauses,
            location: self.location,
        })
    }
}

impl SqlNode for MergeNode {
    const KIND: &'static str = "MergeNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("MERGE INTO ");
        w.node(&self.target);
        w.newline();
        w.push("USING ");
        w.node(&self.source);
        w.newline();
        w.push("ON ");
        w.node(&self.condition);
        for clause in &self.clauses {
            w.newline();
            w.node(clause);
        }
    }
}

/// Which rows a MERGE `WHEN` clause applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMatchKind {
    /// `WHEN MATCHED`
    Matched,
    /// `WHEN NOT MATCHED [BY TARGET]`
    NotMatchedByTarget,
    /// `WHEN NOT MATCHED BY SOURCE`
    NotMatchedBySource,
}

impl MergeMatchKind {
    /// Returns the SQL text of the clause head, after `WHEN`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::NotMatchedByTarget => "NOT MATCHED",
            Self::NotMatchedBySource => "NOT MATCHED BY SOURCE",
        }
    }
}

/// The action of a MERGE `WHEN` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    /// `UPDATE SET assignments`, holding a `ListNode` of assignments.
    Update(Node),
    /// `DELETE`
    Delete,
    /// `INSERT [(columns)] VALUES (values)`, `values` being a
    /// `ParenthesisNode` around a `ListNode`.
    Insert {
        /// Target columns.
        columns: Vec<Arc<IdentifierNode>>,
        /// The inserted row.
        values: Node,
    },
}

impl MergeAction {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Update(a), Self::Update(b)) => same(a, b),
            (Self::Delete, Self::Delete) => true,
            (
                Self::Insert { columns, values },
                Self::Insert {
                    columns: other_columns,
                    values: other_values,
                },
            ) => same_arcs(columns, other_columns) && same(values, other_values),
            _ => false,
        }
    }

    /// Returns the action keyword.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Update(_) => "UPDATE",
            Self::Delete => "DELETE",
            Self::Insert { .. } => "INSERT",
        }
    }
}

/// `WHEN kind [AND condition] THEN action`.
#[derive(Debug, Clone)]
pub struct MergeMatchNode {
    /// Clause kind.
    pub kind: MergeMatchKind,
    /// Extra condition.
    pub condition: Option<Node>,
    /// Action.
    pub action: MergeAction,
    /// Source location.
    pub location: Location,
}

structural_eq!(MergeMatchNode {
    kind,
    condition,
    action
});

impl MergeMatchNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, condition: Option<Node>, action: MergeAction) -> Arc<Self> {
        if same_opt(self.condition.as_ref(), condition.as_ref()) && self.action.same_as(&action) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            kind: self.kind,
            condition,
            action,
            location: self.location,
        })
    }
}

impl SqlNode for MergeMatchNode {
    const KIND: &'static str = "MergeMatchNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("WHEN ");
        w.push(self.kind.as_str());
        if let Some(condition) = &self.condition {
            w.push(" AND ");
            w.operand(condition);
        }
        w.push(" THEN");
        w.indent();
        w.newline();
        match &self.action {
            MergeAction::Update(assignments) => {
                w.push("UPDATE SET ");
                w.node(assignments);
            }
            MergeAction::Delete => w.push("DELETE"),
            MergeAction::Insert { columns, values } => {
                w.push("INSERT");
                if !columns.is_empty() {
                    w.push(" ");
                }
                write_column_list(w, columns);
                w.push(" VALUES ");
                w.node(values);
            }
        }
        w.dedent();
    }
}

/// `WITH [RECURSIVE] cte, ... statement`.
#[derive(Debug, Clone)]
pub struct WithNode {
    /// `RECURSIVE` was written.
    pub recursive: bool,
    /// `CteNode`s.
    pub ctes: Vec<Node>,
    /// The statement the CTEs are visible in.
    pub statement: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(WithNode {
    recursive,
    ctes,
    statement
});

impl WithNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, ctes: Vec<Node>, statement: Node) -> Arc<Self> {
        if same_all(&self.ctes, &ctes) && same(&self.statement, &statement) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            recursive: self.recursive,
            ctes,
            statement,
            location: self.location,
        })
    }
}

impl SqlNode for WithNode {
    const KIND: &'static str = "WithNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("WITH ");
        if self.recursive && w.dialect().supports_recursive_cte() {
            w.push("RECURSIVE ");
        }
        for (i, cte) in self.ctes.iter().enumerate() {
            if i > 0 {
                w.push(",");
                w.newline();
            }
            w.node(cte);
        }
        w.newline();
        w.node(&self.statement);
    }
}

/// `name [(columns)] AS (query)`.
#[derive(Debug, Clone)]
pub struct CteNode {
    /// CTE name.
    pub name: Arc<IdentifierNode>,
    /// Column names.
    pub columns: Vec<Arc<IdentifierNode>>,
    /// The defining query, a `ParenthesisNode`.
    pub query: Node,
    /// The query refers to the CTE's own name.
    pub self_reference: bool,
    /// Source location.
    pub location: Location,
}

structural_eq!(CteNode {
    name,
    columns,
    query,
    self_reference
});

impl CteNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        name: Arc<IdentifierNode>,
        columns: Vec<Arc<IdentifierNode>>,
        query: Node,
    ) -> Arc<Self> {
        if Arc::ptr_eq(&self.name, &name)
            && same_arcs(&self.columns, &columns)
            && same(&self.query, &query)
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            name,
            columns,
            query,
            self_reference: self.self_reference,
            location: self.location,
        })
    }
}

impl SqlNode for CteNode {
    const KIND: &'static str = "CteNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        self.name.write_sql(w);
        write_column_list(w, &self.columns);
        w.push(" AS ");
        w.node(&self.query);
    }
}

/// `DECLARE @name type [= value]`.
#[derive(Debug, Clone)]
pub struct DeclareNode {
    /// Declared variable.
    pub variable: Arc<VariableNode>,
    /// Its type.
    pub data_type: Arc<DataTypeNode>,
    /// Initial value.
    pub value: Option<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(DeclareNode {
    variable,
    data_type,
    value
});

impl DeclareNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        variable: Arc<VariableNode>,
        data_type: Arc<DataTypeNode>,
        value: Option<Node>,
    ) -> Arc<Self> {
        if Arc::ptr_eq(&self.variable, &variable)
            && Arc::ptr_eq(&self.data_type, &data_type)
            && same_opt(self.value.as_ref(), value.as_ref())
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            variable,
            data_type,
            value,
            location: self.location,
        })
    }
}

impl SqlNode for DeclareNode {
    const KIND: &'static str = "DeclareNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("DECLARE ");
        self.variable.write_sql(w);
        w.push(" ");
        self.data_type.write_sql(w);
        if let Some(value) = &self.value {
            w.push(" = ");
            w.node(value);
        }
    }
}

/// `SET target op value`, where `op` is `=` or a compound assignment.
///
/// PostgreSQL's `SET name TO value` is held with the `=` operator.
#[derive(Debug, Clone)]
pub struct SetNode {
    /// A `VariableNode`, or an `ObjectIdentifierNode` naming a setting.
    pub target: Node,
    /// Assignment operator.
    pub operator: Arc<OperatorNode>,
    /// Assigned value.
    pub value: Node,
    /// Source location.
    pub location: Location,
}

structural_eq!(SetNode {
    target,
    operator,
    value
});

impl SetNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        target: Node,
        operator: Arc<OperatorNode>,
        value: Node,
    ) -> Arc<Self> {
        if same(&self.target, &target)
            && Arc::ptr_eq(&self.operator, &operator)
            && same(&self.value, &value)
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            target,
            operator,
            value,
            location: self.location,
        })
    }
}

impl SqlNode for SetNode {
    const KIND: &'static str = "SetNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("SET ");
        w.node(&self.target);
        w.push(" ");
        self.operator.write_sql(w);
        w.push(" ");
        w.node(&self.value);
    }
}

/// `IF condition statement [ELSE statement]`.
#[derive(Debug, Clone)]
pub struct IfNode {
    /// Condition.
    pub condition: Node,
    /// Statement run when the condition holds.
    pub then_branch: Node,
    /// Statement run otherwise.
    pub else_branch: Option<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(IfNode {
    condition,
    then_branch,
    else_branch
});

impl IfNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(
        self: &Arc<Self>,
        condition: Node,
        then_branch: Node,
        else_branch: Option<Node>,
    ) -> Arc<Self> {
        if same(&self.condition, &condition)
            && same(&self.then_branch, &then_branch)
            && same_opt(self.else_branch.as_ref(), else_branch.as_ref())
        {
            return Arc::clone(self);
        }
        Arc::new(Self {
            condition,
            then_branch,
            else_branch,
            location: self.location,
        })
    }
}

fn write_branch(w: &mut SqlWriter, branch: &Node) {
    if matches!(branch, Node::StatementList(_)) {
        w.newline();
        w.node(branch);
    } else {
        w.indent();
        w.newline();
        w.node(branch);
        w.dedent();
    }
}

impl SqlNode for IfNode {
    const KIND: &'static str = "IfNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("IF ");
        w.node(&self.condition);
        write_branch(w, &self.then_branch);
        if let Some(else_branch) = &self.else_branch {
            w.newline();
            w.push("ELSE");
            write_branch(w, else_branch);
        }
    }
}

/// `EXEC procedure arguments`. Named arguments are `InfixNode`s with `=`.
#[derive(Debug, Clone)]
pub struct ExecuteNode {
    /// Procedure name, or a variable holding it.
    pub procedure: Node,
    /// Arguments.
    pub arguments: Vec<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(ExecuteNode {
    procedure,
    arguments
});

impl ExecuteNode {
    /// Returns the node with new children, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, procedure: Node, arguments: Vec<Node>) -> Arc<Self> {
        if same(&self.procedure, &procedure) && same_all(&self.arguments, &arguments) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            procedure,
            arguments,
            location: self.location,
        })
    }
}

impl SqlNode for ExecuteNode {
    const KIND: &'static str = "ExecuteNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push(match w.dialect() {
            Dialect::TSql => "EXEC ",
            Dialect::Postgres => "EXECUTE ",
        });
        w.node(&self.procedure);
        if !self.arguments.is_empty() {
            w.push(" ");
            w.nodes(&self.arguments, ", ");
        }
    }
}

/// An ordered sequence of statements: the root of every parse, and the body
/// of a `BEGIN ... END` block.
#[derive(Debug, Clone)]
pub struct StatementListNode {
    /// Statements.
    pub statements: Vec<Node>,
    /// Bracketed by `BEGIN` and `END`.
    pub begin_end: bool,
    /// Source location.
    pub location: Location,
}

structural_eq!(StatementListNode {
    statements,
    begin_end
});

impl StatementListNode {
    /// Returns the node with new statements, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, statements: Vec<Node>) -> Arc<Self> {
        if same_all(&self.statements, &statements) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            statements,
            begin_end: self.begin_end,
            location: self.location,
        })
    }

    /// Returns the error nodes among the statements, searching nested
    /// blocks and IF branches.
    #[must_use]
    pub fn errors(&self) -> Vec<&ErrorNode> {
        let mut errors = Vec::new();
        collect_errors(&self.statements, &mut errors);
        errors
    }
}

fn collect_errors<'a>(statements: &'a [Node], errors: &mut Vec<&'a ErrorNode>) {
    for statement in statements {
        match statement {
            Node::Error(error) => errors.push(error),
            Node::StatementList(list) => collect_errors(&list.statements, errors),
            Node::If(branch) => {
                collect_errors(std::slice::from_ref(&branch.then_branch), errors);
                if let Some(else_branch) = &branch.else_branch {
                    collect_errors(std::slice::from_ref(else_branch), errors);
                }
            }
            _ => {}
        }
    }
}

impl SqlNode for StatementListNode {
    const KIND: &'static str = "StatementListNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        if self.begin_end {
            w.push("BEGIN");
            w.indent();
            for statement in &self.statements {
                w.newline();
                w.node(statement);
                w.push(";");
            }
            w.dedent();
            w.newline();
            w.push("END");
        } else {
            for (i, statement) in self.statements.iter().enumerate() {
                if i > 0 {
                    w.newline();
                }
                w.node(statement);
                w.push(";");
            }
        }
    }
}

/// A statement that could not be parsed. Holds the expectation message of
/// the failed parse; its location is where the failure was detected.
#[derive(Debug, Clone)]
pub struct ErrorNode {
    /// Human-readable expectation message.
    pub message: String,
    /// Source location.
    pub location: Location,
}

structural_eq!(ErrorNode { message });

impl SqlNode for ErrorNode {
    const KIND: &'static str = "ErrorNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("/* error: ");
        w.push(&self.message.replace("*/", "* /"));
        w.push(" */");
    }
}
