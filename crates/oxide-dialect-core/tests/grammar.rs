//! Tree shapes produced by the two grammars.

mod common;
use common::*;

use oxide_dialect_core::ast::{JoinOperator, Node, SetOperator};
use oxide_dialect_core::Dialect;

fn columns(dialect: Dialect, sql: &str) -> Vec<Node> {
    match &parse_select(dialect, sql).columns {
        Node::List(list) => list.items.clone(),
        other => panic!("Expected column list, got {other:?}"),
    }
}

fn operator(node: &Node) -> &str {
    match node {
        Node::Infix(infix) => &infix.operator.operator,
        other => panic!("Expected infix, got {other:?}"),
    }
}

#[test]
fn keywords_in_brackets_are_identifiers() {
    let items = columns(Dialect::TSql, "SELECT [SELECT], [FROM] FROM MyTable");
    let names: Vec<_> = items
        .iter()
        .map(|item| match item {
            Node::ObjectIdentifier(id) => id.name_str().to_string(),
            other => panic!("Expected identifier, got {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["SELECT", "FROM"]);
    let select = parse_select(Dialect::TSql, "SELECT [SELECT], [FROM] FROM MyTable");
    assert!(matches!(&select.from, Some(Node::ObjectIdentifier(t)) if t.name_str() == "MyTable"));
}

#[test]
fn arithmetic_binds_tighter_than_comparison() {
    let select = parse_select(Dialect::TSql, "SELECT a FROM t WHERE a + 1 * 2 > 3 AND b = 4 OR c = 5");
    let Some(condition) = &select.where_clause else {
        panic!("Expected WHERE");
    };
    assert_eq!(operator(condition), "OR");
    let Node::Infix(or) = condition else {
        unreachable!()
    };
    assert_eq!(operator(&or.left), "AND");
    let Node::Infix(and) = &or.left else {
        unreachable!()
    };
    assert_eq!(operator(&and.left), ">");
    let Node::Infix(gt) = &and.left else {
        unreachable!()
    };
    assert_eq!(operator(&gt.left), "+");
}

#[test]
fn same_precedence_operators_associate_left() {
    let items = columns(Dialect::TSql, "SELECT 10 - 4 - 3");
    let Node::Infix(outer) = &items[0] else {
        panic!("Expected infix");
    };
    assert_eq!(outer.operator.operator, "-");
    assert!(matches!(&outer.left, Node::Infix(inner) if inner.operator.operator == "-"));
    assert!(matches!(&outer.right, Node::Number(_)));
}

#[test]
fn join_chains_nest_on_the_left() {
    let select = parse_select(
        Dialect::TSql,
        "SELECT * FROM a JOIN b ON a.x = b.x RIGHT JOIN c ON b.x = c.x FULL OUTER JOIN d ON c.x = d.x",
    );
    let Some(Node::Join(full)) = &select.from else {
        panic!("Expected join");
    };
    assert_eq!(full.operator, JoinOperator::Full);
    assert!(matches!(&full.right, Node::ObjectIdentifier(t) if t.name_str() == "d"));
    let Node::Join(right) = &full.left else {
        panic!("Expected join");
    };
    assert_eq!(right.operator, JoinOperator::Right);
    assert!(matches!(&right.left, Node::Join(inner) if inner.operator == JoinOperator::Inner));
}

#[test]
fn parenthesized_join_nests_on_the_right() {
    let select = parse_select(Dialect::TSql, "SELECT * FROM a JOIN (b JOIN c ON b.x = c.x) ON a.x = b.x");
    let Some(Node::Join(join)) = &select.from else {
        panic!("Expected join");
    };
    assert!(matches!(&join.right, Node::Parenthesis(p) if matches!(p.inner, Node::Join(_))));
}

#[test]
fn backtracking_between_subquery_and_grouping() {
    // `(` opens a subquery in one case and an expression group in the other.
    let items = columns(Dialect::TSql, "SELECT (SELECT 1), (1 + 2) * 3");
    assert!(matches!(&items[0], Node::Parenthesis(p) if p.inner.is_query()));
    assert_eq!(operator(&items[1]), "*");

    // `x` is a column here, and an alias once `AS` is seen.
    let items = columns(Dialect::TSql, "SELECT x, y AS x");
    assert!(matches!(&items[0], Node::ObjectIdentifier(_)));
    assert!(matches!(&items[1], Node::Alias(_)));
}

#[test]
fn function_and_column_share_a_prefix() {
    let items = columns(Dialect::TSql, "SELECT dbo.f(1), dbo.t.c, t.*");
    assert!(matches!(&items[0], Node::FunctionCall(f) if f.arguments.len() == 1));
    assert!(matches!(&items[1], Node::ObjectIdentifier(id) if id.parts().len() == 3));
    assert!(matches!(&items[2], Node::Star(s) if s.qualifier.is_some()));
}

#[test]
fn set_operations_chain() {
    let Node::SetOperation(op) = first_statement(Dialect::TSql, "SELECT 1 UNION SELECT 2 INTERSECT SELECT 3")
    else {
        panic!("Expected set operation");
    };
    assert_eq!(op.operator, SetOperator::Union);
    assert!(matches!(&op.right, Node::SetOperation(r) if r.operator == SetOperator::Intersect));
}

#[test]
fn dialect_specific_productions() {
    let _ = parse_err(Dialect::Postgres, "SELECT TOP 5 a FROM t");
    let _ = parse_err(Dialect::TSql, "SELECT a FROM t LIMIT 5");
    let _ = parse_err(Dialect::Postgres, "SELECT * FROM a CROSS APPLY f(a.x)");
    let _ = parse_err(Dialect::TSql, "SELECT a::int");
    assert!(matches!(
        first_statement(Dialect::Postgres, "SELECT * FROM (VALUES (1, 2)) AS v (a, b)"),
        Node::Select(_)
    ));
}

#[test]
fn postgres_folds_unquoted_identifiers() {
    let select = parse_select(Dialect::Postgres, "SELECT Col FROM \"MyTable\"");
    let Node::List(items) = &select.columns else {
        panic!("Expected list");
    };
    assert!(matches!(&items.items[0], Node::ObjectIdentifier(c) if c.name_str() == "col"));
    assert!(matches!(&select.from, Some(Node::ObjectIdentifier(t)) if t.name_str() == "MyTable"));
}

#[test]
fn syntax_errors_point_at_the_token() {
    let err = parse_err(Dialect::TSql, "SELECT a\nFROM t\nWHERE");
    assert!(matches!(err.location(), Some((3, _))), "{err}");
    assert!(err.to_string().starts_with("tsql syntax error at line 3"), "{err}");
}
