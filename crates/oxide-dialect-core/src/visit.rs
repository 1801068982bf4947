//! The rewrite engine.
//!
//! [`Visitor`] has one method per node kind. Each method returns the node
//! that replaces the visited one. The default for a composite node walks its
//! children through the matching `walk_*` function and rebuilds it with the
//! node's `update` method, so an unchanged subtree comes back as the very
//! same `Arc`. The default for a terminal returns the node itself.
//!
//! A pass overrides the kinds it cares about. To rewrite bottom-up, call the
//! `walk_*` function first and inspect its result:
//!
//! ```
//! use std::sync::Arc;
//!
//! use oxide_dialect_core::ast::{Node, VariableNode};
//! use oxide_dialect_core::visit::Visitor;
//!
//! #[derive(Default)]
//! struct CountVariables(usize);
//!
//! impl Visitor for CountVariables {
//!     fn visit_variable(&mut self, node: &Arc<VariableNode>) -> Node {
//!         self.0 += 1;
//!         Node::Variable(Arc::clone(node))
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::ast::{
    AliasNode, BetweenNode, CaseNode, CaseWhenNode, CastNode, CteNode, DataTypeNode, DeclareNode,
    DeleteNode, ErrorNode, ExecuteNode, FunctionCallNode, IdentifierNode, IfNode, InNode,
    InfixNode, InsertNode, IsNullNode, JoinNode, KeywordNode, ListNode, MergeAction,
    MergeMatchNode, MergeNode, Node, NullNode, NumberNode, ObjectIdentifierNode, OperatorNode,
    OrderByNode, ParenthesisNode, PrefixNode, SelectNode, SetNode, SetOperationNode, StarNode,
    StatementListNode, StringNode, TopNode, UpdateNode, ValuesNode, VariableNode, WithNode,
};

/// A tree rewrite. See the [module documentation](self).
#[allow(missing_docs)]
pub trait Visitor {
    // Terminals

    fn visit_identifier(&mut self, node: &Arc<IdentifierNode>) -> Node {
        Node::Identifier(Arc::clone(node))
    }

    fn visit_object_identifier(&mut self, node: &Arc<ObjectIdentifierNode>) -> Node {
        Node::ObjectIdentifier(Arc::clone(node))
    }

    fn visit_keyword(&mut self, node: &Arc<KeywordNode>) -> Node {
        Node::Keyword(Arc::clone(node))
    }

    fn visit_operator(&mut self, node: &Arc<OperatorNode>) -> Node {
        Node::Operator(Arc::clone(node))
    }

    fn visit_number(&mut self, node: &Arc<NumberNode>) -> Node {
        Node::Number(Arc::clone(node))
    }

    fn visit_string(&mut self, node: &Arc<StringNode>) -> Node {
        Node::String(Arc::clone(node))
    }

    fn visit_null(&mut self, node: &Arc<NullNode>) -> Node {
        Node::Null(Arc::clone(node))
    }

    fn visit_variable(&mut self, node: &Arc<VariableNode>) -> Node {
        Node::Variable(Arc::clone(node))
    }

    fn visit_star(&mut self, node: &Arc<StarNode>) -> Node {
        Node::Star(Arc::clone(node))
    }

    // Expressions

    fn visit_prefix(&mut self, node: &Arc<PrefixNode>) -> Node {
        walk_prefix(self, node)
    }

    fn visit_infix(&mut self, node: &Arc<InfixNode>) -> Node {
        walk_infix(self, node)
    }

    fn visit_between(&mut self, node: &Arc<BetweenNode>) -> Node {
        walk_between(self, node)
    }

    fn visit_in(&mut self, node: &Arc<InNode>) -> Node {
        walk_in(self, node)
    }

    fn visit_is_null(&mut self, node: &Arc<IsNullNode>) -> Node {
        walk_is_null(self, node)
    }

    fn visit_case(&mut self, node: &Arc<CaseNode>) -> Node {
        walk_case(self, node)
    }

    fn visit_case_when(&mut self, node: &Arc<CaseWhenNode>) -> Node {
        walk_case_when(self, node)
    }

    fn visit_function_call(&mut self, node: &Arc<FunctionCallNode>) -> Node {
        walk_function_call(self, node)
    }

    fn visit_cast(&mut self, node: &Arc<CastNode>) -> Node {
        walk_cast(self, node)
    }

    fn visit_data_type(&mut self, node: &Arc<DataTypeNode>) -> Node {
        walk_data_type(self, node)
    }

    fn visit_parenthesis(&mut self, node: &Arc<ParenthesisNode>) -> Node {
        walk_parenthesis(self, node)
    }

    fn visit_alias(&mut self, node: &Arc<AliasNode>) -> Node {
        walk_alias(self, node)
    }

    fn visit_list(&mut self, node: &Arc<ListNode>) -> Node {
        walk_list(self, node)
    }

    // Queries

    fn visit_select(&mut self, node: &Arc<SelectNode>) -> Node {
        walk_select(self, node)
    }

    fn visit_top(&mut self, node: &Arc<TopNode>) -> Node {
        walk_top(self, node)
    }

    fn visit_join(&mut self, node: &Arc<JoinNode>) -> Node {
        walk_join(self, node)
    }

    fn visit_order_by(&mut self, node: &Arc<OrderByNode>) -> Node {
        walk_order_by(self, node)
    }

    fn visit_set_operation(&mut self, node: &Arc<SetOperationNode>) -> Node {
        walk_set_operation(self, node)
    }

    fn visit_values(&mut self, node: &Arc<ValuesNode>) -> Node {
        walk_values(self, node)
    }

    // Statements

    fn visit_insert(&mut self, node: &Arc<InsertNode>) -> Node {
        walk_insert(self, node)
    }

    fn visit_update(&mut self, node: &Arc<UpdateNode>) -> Node {
        walk_update(self, node)
    }

    fn visit_delete(&mut self, node: &Arc<DeleteNode>) -> Node {
        walk_delete(self, node)
    }

    fn visit_merge(&mut self, node: &Arc<MergeNode>) -> Node {
        walk_merge(self, node)
    }

    fn visit_merge_match(&mut self, node: &Arc<MergeMatchNode>) -> Node {
        walk_merge_match(self, node)
    }

    fn visit_with(&mut self, node: &Arc<WithNode>) -> Node {
        walk_with(self, node)
    }

    fn visit_cte(&mut self, node: &Arc<CteNode>) -> Node {
        walk_cte(self, node)
    }

    fn visit_declare(&mut self, node: &Arc<DeclareNode>) -> Node {
        walk_declare(self, node)
    }

    fn visit_set(&mut self, node: &Arc<SetNode>) -> Node {
        walk_set(self, node)
    }

    fn visit_if(&mut self, node: &Arc<IfNode>) -> Node {
        walk_if(self, node)
    }

    fn visit_execute(&mut self, node: &Arc<ExecuteNode>) -> Node {
        walk_execute(self, node)
    }

    fn visit_statement_list(&mut self, node: &Arc<StatementListNode>) -> Node {
        walk_statement_list(self, node)
    }

    fn visit_error(&mut self, node: &Arc<ErrorNode>) -> Node {
        Node::Error(Arc::clone(node))
    }
}

fn opt<V: Visitor + ?Sized>(v: &mut V, node: Option<&Node>) -> Option<Node> {
    node.map(|n| n.accept(v))
}

fn all<V: Visitor + ?Sized>(v: &mut V, nodes: &[Node]) -> Vec<Node> {
    nodes.iter().map(|n| n.accept(v)).collect()
}

// A typed child keeps its old value if the visitor replaces it with a node
// of another kind.

fn identifier<V: Visitor + ?Sized>(v: &mut V, node: &Arc<IdentifierNode>) -> Arc<IdentifierNode> {
    match v.visit_identifier(node) {
        Node::Identifier(new) => new,
        _ => Arc::clone(node),
    }
}

fn identifiers<V: Visitor + ?Sized>(
    v: &mut V,
    nodes: &[Arc<IdentifierNode>],
) -> Vec<Arc<IdentifierNode>> {
    nodes.iter().map(|n| identifier(v, n)).collect()
}

fn operator<V: Visitor + ?Sized>(v: &mut V, node: &Arc<OperatorNode>) -> Arc<OperatorNode> {
    match v.visit_operator(node) {
        Node::Operator(new) => new,
        _ => Arc::clone(node),
    }
}

fn object_identifier<V: Visitor + ?Sized>(
    v: &mut V,
    node: &Arc<ObjectIdentifierNode>,
) -> Arc<ObjectIdentifierNode> {
    match v.visit_object_identifier(node) {
        Node::ObjectIdentifier(new) => new,
        _ => Arc::clone(node),
    }
}

fn data_type<V: Visitor + ?Sized>(v: &mut V, node: &Arc<DataTypeNode>) -> Arc<DataTypeNode> {
    match v.visit_data_type(node) {
        Node::DataType(new) => new,
        _ => Arc::clone(node),
    }
}

fn variable<V: Visitor + ?Sized>(v: &mut V, node: &Arc<VariableNode>) -> Arc<VariableNode> {
    match v.visit_variable(node) {
        Node::Variable(new) => new,
        _ => Arc::clone(node),
    }
}

pub fn walk_prefix<V: Visitor + ?Sized>(v: &mut V, node: &Arc<PrefixNode>) -> Node {
    let op = operator(v, &node.operator);
    let operand = node.operand.accept(v);
    node.update(op, operand).into()
}

pub fn walk_infix<V: Visitor + ?Sized>(v: &mut V, node: &Arc<InfixNode>) -> Node {
    let left = node.left.accept(v);
    let op = operator(v, &node.operator);
    let right = node.right.accept(v);
    node.update(left, op, right).into()
}

pub fn walk_between<V: Visitor + ?Sized>(v: &mut V, node: &Arc<BetweenNode>) -> Node {
    let expr = node.expr.accept(v);
    let low = node.low.accept(v);
    let high = node.high.accept(v);
    node.update(expr, low, high).into()
}

pub fn walk_in<V: Visitor + ?Sized>(v: &mut V, node: &Arc<InNode>) -> Node {
    let expr = node.expr.accept(v);
    let list = node.list.accept(v);
    node.update(expr, list).into()
}

pub fn walk_is_null<V: Visitor + ?Sized>(v: &mut V, node: &Arc<IsNullNode>) -> Node {
    let expr = node.expr.accept(v);
    node.update(expr).into()
}

pub fn walk_case<V: Visitor + ?Sized>(v: &mut V, node: &Arc<CaseNode>) -> Node {
    let input = opt(v, node.input.as_ref());
    let whens = all(v, &node.whens);
    let else_result = opt(v, node.else_result.as_ref());
    node.update(input, whens, else_result).into()
}

pub fn walk_case_when<V: Visitor + ?Sized>(v: &mut V, node: &Arc<CaseWhenNode>) -> Node {
    let condition = node.condition.accept(v);
    let result = node.result.accept(v);
    node.update(condition, result).into()
}

pub fn walk_function_call<V: Visitor + ?Sized>(v: &mut V, node: &Arc<FunctionCallNode>) -> Node {
    let name = object_identifier(v, &node.name);
    let arguments = all(v, &node.arguments);
    node.update(name, arguments).into()
}

pub fn walk_cast<V: Visitor + ?Sized>(v: &mut V, node: &Arc<CastNode>) -> Node {
    let expr = node.expr.accept(v);
    let ty = data_type(v, &node.data_type);
    node.update(expr, ty).into()
}

pub fn walk_data_type<V: Visitor + ?Sized>(v: &mut V, node: &Arc<DataTypeNode>) -> Node {
    let arguments = all(v, &node.arguments);
    node.update(arguments).into()
}

pub fn walk_parenthesis<V: Visitor + ?Sized>(v: &mut V, node: &Arc<ParenthesisNode>) -> Node {
    let inner = node.inner.accept(v);
    node.update(inner).into()
}

pub fn walk_alias<V: Visitor + ?Sized>(v: &mut V, node: &Arc<AliasNode>) -> Node {
    let source = opt(v, node.source.as_ref());
    let alias = node.alias.as_ref().map(|a| identifier(v, a));
    let columns = identifiers(v, &node.columns);
    node.update(source, alias, columns).into()
}

pub fn walk_list<V: Visitor + ?Sized>(v: &mut V, node: &Arc<ListNode>) -> Node {
    let items = all(v, &node.items);
    node.update(items).into()
}

pub fn walk_select<V: Visitor + ?Sized>(v: &mut V, node: &Arc<SelectNode>) -> Node {
    let top = opt(v, node.top.as_ref());
    let columns = node.columns.accept(v);
    let mut clauses = SelectNode::new(columns, node.location);
    clauses.top = top;
    clauses.from = opt(v, node.from.as_ref());
    clauses.where_clause = opt(v, node.where_clause.as_ref());
    clauses.group_by = opt(v, node.group_by.as_ref());
    clauses.having = opt(v, node.having.as_ref());
    clauses.order_by = opt(v, node.order_by.as_ref());
    clauses.limit = opt(v, node.limit.as_ref());
    clauses.offset = opt(v, node.offset.as_ref());
    clauses.fetch = opt(v, node.fetch.as_ref());
    node.update(clauses).into()
}

pub fn walk_top<V: Visitor + ?Sized>(v: &mut V, node: &Arc<TopNode>) -> Node {
    let value = node.value.accept(v);
    node.update(value).into()
}

pub fn walk_join<V: Visitor + ?Sized>(v: &mut V, node: &Arc<JoinNode>) -> Node {
    let left = node.left.accept(v);
    let right = node.right.accept(v);
    let condition = opt(v, node.condition.as_ref());
    node.update(left, right, condition).into()
}

pub fn walk_order_by<V: Visitor + ?Sized>(v: &mut V, node: &Arc<OrderByNode>) -> Node {
    let expr = node.expr.accept(v);
    node.update(expr).into()
}

pub fn walk_set_operation<V: Visitor + ?Sized>(v: &mut V, node: &Arc<SetOperationNode>) -> Node {
    let left = node.left.accept(v);
    let right = node.right.accept(v);
    node.update(left, right).into()
}

pub fn walk_values<V: Visitor + ?Sized>(v: &mut V, node: &Arc<ValuesNode>) -> Node {
    let rows = all(v, &node.rows);
    node.update(rows).into()
}

pub fn walk_insert<V: Visitor + ?Sized>(v: &mut V, node: &Arc<InsertNode>) -> Node {
    let target = node.target.accept(v);
    let columns = identifiers(v, &node.columns);
    let source = node.source.accept(v);
    node.update(target, columns, source).into()
}

pub fn walk_update<V: Visitor + ?Sized>(v: &mut V, node: &Arc<UpdateNode>) -> Node {
    let target = node.target.accept(v);
    let from = opt(v, node.from.as_ref());
    let assignments = node.assignments.accept(v);
    let where_clause = opt(v, node.where_clause.as_ref());
    node.update(target, assignments, from, where_clause).into()
}

pub fn walk_delete<V: Visitor + ?Sized>(v: &mut V, node: &Arc<DeleteNode>) -> Node {
    let target = node.target.accept(v);
    let from = opt(v, node.from.as_ref());
    let where_clause = opt(v, node.where_clause.as_ref());
    node.update(target, from, where_clause).into()
}

pub fn walk_merge<V: Visitor + ?Sized>(v: &mut V, node: &Arc<MergeNode>) -> Node {
    let target = node.target.accept(v);
    let source = node.source.accept(v);
    let condition = node.condition.accept(v);
    let clauses = all(v, &node.clauses);
    node.update(target, source, condition, clauses).into()
}

pub fn walk_merge_match<V: Visitor + ?Sized>(v: &mut V, node: &Arc<MergeMatchNode>) -> Node {
    let condition = opt(v, node.condition.as_ref());
    let action = match &node.action {
        MergeAction::Update(assignments) => MergeAction::Update(assignments.accept(v)),
        MergeAction::Delete => MergeAction::Delete,
        MergeAction::Insert { columns, values } => MergeAction::Insert {
            columns: identifiers(v, columns),
            values: values.accept(v),
        },
    };
    node.update(condition, action).into()
}

pub fn walk_with<V: Visitor + ?Sized>(v: &mut V, node: &Arc<WithNode>) -> Node {
    let ctes = all(v, &node.ctes);
    let statement = node.statement.accept(v);
    node.update(ctes, statement).into()
}

pub fn walk_cte<V: Visitor + ?Sized>(v: &mut V, node: &Arc<CteNode>) -> Node {
    let name = identifier(v, &node.name);
    let columns = identifiers(v, &node.columns);
    let query = node.query.accept(v);
    node.update(name, columns, query).into()
}

pub fn walk_declare<V: Visitor + ?Sized>(v: &mut V, node: &Arc<DeclareNode>) -> Node {
    let var = variable(v, &node.variable);
    let ty = data_type(v, &node.data_type);
    let value = opt(v, node.value.as_ref());
    node.update(var, ty, value).into()
}

pub fn walk_set<V: Visitor + ?Sized>(v: &mut V, node: &Arc<SetNode>) -> Node {
    let target = node.target.accept(v);
    let op = operator(v, &node.operator);
    let value = node.value.accept(v);
    node.update(target, op, value).into()
}

pub fn walk_if<V: Visitor + ?Sized>(v: &mut V, node: &Arc<IfNode>) -> Node {
    let condition = node.condition.accept(v);
    let then_branch = node.then_branch.accept(v);
    let else_branch = opt(v, node.else_branch.as_ref());
    node.update(condition, then_branch, else_branch).into()
}

pub fn walk_execute<V: Visitor + ?Sized>(v: &mut V, node: &Arc<ExecuteNode>) -> Node {
    let procedure = node.procedure.accept(v);
    let arguments = all(v, &node.arguments);
    node.update(procedure, arguments).into()
}

pub fn walk_statement_list<V: Visitor + ?Sized>(
    v: &mut V,
    node: &Arc<StatementListNode>,
) -> Node {
    let statements = all(v, &node.statements);
    node.update(statements).into()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::lexer::Location;

    struct Identity;

    impl Visitor for Identity {}

    struct Negate;

    impl Visitor for Negate {
        fn visit_number(&mut self, node: &Arc<NumberNode>) -> Node {
            NumberNode::new(-node.value, node.location).into()
        }
    }

    fn sample() -> Node {
        let number = |n: i64| -> Node { NumberNode::new(Decimal::from(n), Location::start()).into() };
        let sum: Node = InfixNode {
            left: number(1),
            operator: Arc::new(OperatorNode::new("+", Location::start())),
            right: number(2),
            location: Location::start(),
        }
        .into();
        let name: Node =
            ObjectIdentifierNode::simple(IdentifierNode::new("a", Location::start())).into();
        let columns: Node = ListNode::new(vec![sum, name], Location::start()).into();
        SelectNode::new(columns, Location::start()).into()
    }

    #[test]
    fn test_identity_pass_shares_the_whole_tree() {
        let tree = sample();
        let out = tree.accept(&mut Identity);
        assert!(out.ptr_eq(&tree));
    }

    #[test]
    fn test_rewrite_allocates_only_the_changed_spine() {
        let tree = sample();
        let out = tree.accept(&mut Negate);
        assert!(!out.ptr_eq(&tree));
        let (Node::Select(before), Node::Select(after)) = (&tree, &out) else {
            panic!("expected select nodes");
        };
        let (Node::List(before), Node::List(after)) = (&before.columns, &after.columns) else {
            panic!("expected lists");
        };
        assert!(!before.items[0].ptr_eq(&after.items[0]));
        // The untouched column is shared.
        assert!(before.items[1].ptr_eq(&after.items[1]));
        assert_eq!(out.to_string(), "SELECT -1 + -2, a");
    }
}
