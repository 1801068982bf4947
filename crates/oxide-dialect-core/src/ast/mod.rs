//! Abstract Syntax Tree (AST) types for SQL statements.
//!
//! Every node kind is a plain struct held behind an [`Arc`]; [`Node`] is the
//! sum type over all of them. Nodes are immutable once built. Rewrites go
//! through each struct's `update` method, which hands back the original `Arc`
//! when every child is pointer-identical to the old one, so a pass that
//! changes nothing allocates nothing.
//!
//! Source locations are informational: they are carried for diagnostics and
//! ignored by equality.

mod expression;
mod query;
mod statement;
mod terminal;
mod types;

use std::sync::Arc;

use crate::dialect::Dialect;
use crate::lexer::Location;
use crate::visit::Visitor;
use crate::writer::SqlWriter;

pub use expression::{
    AliasNode, BetweenNode, CaseNode, CaseWhenNode, CastNode, FunctionCallNode, InNode, InfixNode,
    IsNullNode, ListNode, ListSeparator, ParenthesisNode, PrefixNode,
};
pub use query::{
    JoinNode, JoinOperator, OrderByNode, OrderDirection, SelectNode, SetOperationNode, SetOperator,
    TopNode, ValuesNode,
};
pub use statement::{
    CteNode, DeclareNode, DeleteNode, ErrorNode, ExecuteNode, IfNode, InsertNode, MergeAction,
    MergeMatchKind, MergeMatchNode, MergeNode, SetNode, StatementListNode, UpdateNode, WithNode,
};
pub use terminal::{
    IdentifierNode, KeywordNode, NullNode, NumberNode, ObjectIdentifierNode, OperatorNode,
    StarNode, StringNode, VariableNode,
};
pub use types::DataTypeNode;

/// Behaviour shared by every node struct.
pub trait SqlNode {
    /// The node kind name used in diagnostics, e.g. `"SelectNode"`.
    const KIND: &'static str;

    /// Where the node starts in the source text.
    fn location(&self) -> Location;

    /// Renders the node into `w`.
    fn write_sql(&self, w: &mut SqlWriter);
}

/// Implements `PartialEq` over the listed fields, leaving out the location.
macro_rules! structural_eq {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl PartialEq for $ty {
            #[allow(unused_variables)]
            fn eq(&self, other: &Self) -> bool {
                true $(&& self.$field == other.$field)*
            }
        }
    };
}
pub(crate) use structural_eq;

macro_rules! define_nodes {
    ($($variant:ident($ty:ident) => $visit:ident,)*) => {
        /// A node of the syntax tree.
        ///
        /// Cloning a `Node` clones one `Arc`.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Node {
            $(
                #[allow(missing_docs)]
                $variant(Arc<$ty>),
            )*
        }

        impl Node {
            /// Where the node starts in the source text.
            #[must_use]
            pub fn location(&self) -> Location {
                match self {
                    $(Self::$variant(n) => n.location(),)*
                }
            }

            /// The node kind name, e.g. `"SelectNode"`.
            #[must_use]
            pub fn kind_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => $ty::KIND,)*
                }
            }

            /// Returns true if both values point at the very same node.
            #[must_use]
            pub fn ptr_eq(&self, other: &Self) -> bool {
                match (self, other) {
                    $((Self::$variant(a), Self::$variant(b)) => Arc::ptr_eq(a, b),)*
                    _ => false,
                }
            }

            /// Dispatches to the visitor method for this node kind.
            pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Self {
                match self {
                    $(Self::$variant(n) => visitor.$visit(n),)*
                }
            }

            /// Renders the node into `w`.
            pub fn write_sql(&self, w: &mut SqlWriter) {
                match self {
                    $(Self::$variant(n) => n.write_sql(w),)*
                }
            }
        }

        $(
            impl From<$ty> for Node {
                fn from(node: $ty) -> Self {
                    Self::$variant(Arc::new(node))
                }
            }

            impl From<Arc<$ty>> for Node {
                fn from(node: Arc<$ty>) -> Self {
                    Self::$variant(node)
                }
            }
        )*
    };
}

define_nodes! {
    Identifier(IdentifierNode) => visit_identifier,
    ObjectIdentifier(ObjectIdentifierNode) => visit_object_identifier,
    Keyword(KeywordNode) => visit_keyword,
    Operator(OperatorNode) => visit_operator,
    Number(NumberNode) => visit_number,
    String(StringNode) => visit_string,
    Null(NullNode) => visit_null,
    Variable(VariableNode) => visit_variable,
    Star(StarNode) => visit_star,
    Prefix(PrefixNode) => visit_prefix,
    Infix(InfixNode) => visit_infix,
    Between(BetweenNode) => visit_between,
    In(InNode) => visit_in,
    IsNull(IsNullNode) => visit_is_null,
    Case(CaseNode) => visit_case,
    CaseWhen(CaseWhenNode) => visit_case_when,
    FunctionCall(FunctionCallNode) => visit_function_call,
    Cast(CastNode) => visit_cast,
    DataType(DataTypeNode) => visit_data_type,
    Parenthesis(ParenthesisNode) => visit_parenthesis,
    Alias(AliasNode) => visit_alias,
    List(ListNode) => visit_list,
    Select(SelectNode) => visit_select,
    Top(TopNode) => visit_top,
    Join(JoinNode) => visit_join,
    OrderBy(OrderByNode) => visit_order_by,
    SetOperation(SetOperationNode) => visit_set_operation,
    Values(ValuesNode) => visit_values,
    Insert(InsertNode) => visit_insert,
    Update(UpdateNode) => visit_update,
    Delete(DeleteNode) => visit_delete,
    Merge(MergeNode) => visit_merge,
    MergeMatch(MergeMatchNode) => visit_merge_match,
    With(WithNode) => visit_with,
    Cte(CteNode) => visit_cte,
    Declare(DeclareNode) => visit_declare,
    Set(SetNode) => visit_set,
    If(IfNode) => visit_if,
    Execute(ExecuteNode) => visit_execute,
    StatementList(StatementListNode) => visit_statement_list,
    Error(ErrorNode) => visit_error,
}

impl Node {
    /// Renders the node as SQL text for `dialect`.
    ///
    /// Re-parsing the output with the same dialect yields an equal tree.
    #[must_use]
    pub fn to_sql(&self, dialect: Dialect) -> String {
        let mut w = SqlWriter::new(dialect);
        self.write_sql(&mut w);
        w.finish()
    }

    /// Returns true for the literal terminals: numbers, strings, NULL and
    /// keywords used as values.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Number(_) | Self::String(_) | Self::Null(_) | Self::Keyword(_)
        )
    }

    /// Returns true for statement nodes that open a symbol scope.
    #[must_use]
    pub const fn is_symbol_scope(&self) -> bool {
        matches!(
            self,
            Self::Select(_)
                | Self::Insert(_)
                | Self::Update(_)
                | Self::Delete(_)
                | Self::Merge(_)
                | Self::With(_)
                | Self::StatementList(_)
        )
    }

    /// Returns true for query expressions: SELECT, set operations and
    /// parenthesized queries.
    #[must_use]
    pub fn is_query(&self) -> bool {
        match self {
            Self::Select(_) | Self::SetOperation(_) | Self::Values(_) => true,
            Self::Parenthesis(p) => p.inner.is_query(),
            _ => false,
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql(Dialect::TSql))
    }
}

/// Returns true if the two children are the same node.
pub(crate) fn same(a: &Node, b: &Node) -> bool {
    a.ptr_eq(b)
}

/// Returns true if the two optional children are the same node (or both absent).
pub(crate) fn same_opt(a: Option<&Node>, b: Option<&Node>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.ptr_eq(b),
        (None, None) => true,
        _ => false,
    }
}

/// Returns true if the two child sequences hold the same nodes.
pub(crate) fn same_all(a: &[Node], b: &[Node]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
}

/// Returns true if the two optional typed children are the same node.
pub(crate) fn same_arc_opt<T>(a: Option<&Arc<T>>, b: Option<&Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Returns true if the two typed child sequences hold the same nodes.
pub(crate) fn same_arcs<T>(a: &[Arc<T>], b: &[Arc<T>]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Arc::ptr_eq(x, y))
}
