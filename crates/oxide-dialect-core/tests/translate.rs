//! Rendering a tree in the other dialect.

mod common;
use common::*;

use oxide_dialect_core::Dialect;

#[test]
fn top_becomes_limit() {
    assert_eq!(
        translate(Dialect::TSql, Dialect::Postgres, "SELECT TOP 5 a FROM t"),
        "SELECT a\nFROM t\nLIMIT 5;"
    );
}

#[test]
fn limit_becomes_top() {
    assert_eq!(
        translate(Dialect::Postgres, Dialect::TSql, "SELECT a FROM t LIMIT 5"),
        "SELECT TOP (5) a\nFROM t;"
    );
}

#[test]
fn limit_with_offset_becomes_offset_fetch() {
    assert_eq!(
        translate(Dialect::Postgres, Dialect::TSql, "SELECT a FROM t ORDER BY a LIMIT 10 OFFSET 5"),
        "SELECT a\nFROM t\nORDER BY a\nOFFSET 5 ROWS\nFETCH NEXT 10 ROWS ONLY;"
    );
}

#[test]
fn offset_fetch_becomes_limit_offset() {
    assert_eq!(
        translate(
            Dialect::TSql,
            Dialect::Postgres,
            "SELECT a FROM t ORDER BY a OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
        ),
        "SELECT a\nFROM t\nORDER BY a\nLIMIT 10\nOFFSET 5;"
    );
}

#[test]
fn identifier_delimiters_follow_the_target() {
    assert_eq!(
        translate(Dialect::TSql, Dialect::Postgres, "SELECT [order], [My Col] FROM dbo.t"),
        "SELECT \"order\", \"My Col\"\nFROM dbo.t;"
    );
    assert_eq!(
        translate(Dialect::Postgres, Dialect::TSql, "SELECT \"select\" FROM t"),
        "SELECT [select]\nFROM t;"
    );
}

#[test]
fn translated_text_parses_in_the_target() {
    let sql = "SELECT TOP 3 [key], COUNT(*) FROM [Order Details] GROUP BY [key]";
    let rendered = translate(Dialect::TSql, Dialect::Postgres, sql);
    let _ = parse(Dialect::Postgres, &rendered);
}

#[test]
fn concatenation_becomes_plus() {
    let sql = translate(Dialect::Postgres, Dialect::TSql, "SELECT a || 'x' FROM t");
    assert_eq!(sql, "SELECT a + 'x'\nFROM t;");
    let _ = parse(Dialect::TSql, &sql);
    assert_eq!(
        translate(Dialect::Postgres, Dialect::Postgres, "SELECT a || 'x' FROM t"),
        "SELECT a || 'x'\nFROM t;"
    );
}
