#![allow(dead_code)]

use std::sync::Arc;

use oxide_dialect_core::ast::{SelectNode, StatementListNode};
use oxide_dialect_core::{Dialect, Node, ParseError};

pub fn parse(dialect: Dialect, sql: &str) -> Arc<StatementListNode> {
    oxide_dialect_core::parse(dialect, sql)
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e}"))
}

pub fn parse_err(dialect: Dialect, sql: &str) -> ParseError {
    oxide_dialect_core::parse(dialect, sql)
        .expect_err(&format!("Expected parse error for: {sql}"))
}

pub fn tree(dialect: Dialect, sql: &str) -> Node {
    Node::StatementList(parse(dialect, sql))
}

pub fn first_statement(dialect: Dialect, sql: &str) -> Node {
    parse(dialect, sql)
        .statements
        .first()
        .cloned()
        .unwrap_or_else(|| panic!("No statement in: {sql}"))
}

pub fn parse_select(dialect: Dialect, sql: &str) -> Arc<SelectNode> {
    match first_statement(dialect, sql) {
        Node::Select(s) => s,
        other => panic!("Expected SELECT, got {other:?}"),
    }
}

/// Renders `sql` after parsing it with `from`, in the syntax of `to`.
pub fn translate(from: Dialect, to: Dialect, sql: &str) -> String {
    tree(from, sql).to_sql(to)
}

/// Verifies that rendering produces a fixed point: the rendered text parses
/// to a tree equal to the first one, and renders to the same text again.
pub fn round_trip(dialect: Dialect, sql: &str) {
    let ast1 = tree(dialect, sql);
    let rendered1 = ast1.to_sql(dialect);
    let ast2 = tree(dialect, &rendered1);
    let rendered2 = ast2.to_sql(dialect);
    assert_eq!(
        rendered1, rendered2,
        "Round-trip failed.\n  Input:    {sql}\n  First:    {rendered1}\n  Second:   {rendered2}"
    );
    assert_eq!(ast1, ast2, "Re-parsed tree differs.\n  Input:    {sql}\n  Rendered: {rendered1}");
}
