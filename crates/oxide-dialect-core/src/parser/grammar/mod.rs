//! The statement grammar, assembled from combinators.
//!
//! One assembly serves both dialects; the few productions that exist in only
//! one of them are switched on the [`Dialect`]. Recursive nonterminals
//! (expression, query, statement) are declared first as deferred parsers and
//! backpatched once their definitions are built.

mod expression;
mod query;
mod statement;

use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use rust_decimal::Decimal;

use super::combinator::{deferred, rule, token, Parser};
use crate::ast::{IdentifierNode, Node, NumberNode, ObjectIdentifierNode, OperatorNode};
use crate::dialect::Dialect;
use crate::lexer::{Token, TokenKind};

/// The parsers of one dialect.
///
/// The grammar owns the rules behind its deferred references, so it must
/// outlive every parse that uses them.
pub struct Grammar {
    dialect: Dialect,
    expression: Parser<Node>,
    query: Parser<Node>,
    statement: Parser<Node>,
    statement_or_error: Parser<Node>,
}

impl Grammar {
    /// Builds the grammar for `dialect`.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        let (expression_ref, expression_slot) = deferred();
        let (query_ref, query_slot) = deferred();
        let (statement_ref, statement_slot) = deferred();

        let exprs = expression::rules(dialect, &expression_ref, &query_ref);
        let queries = query::rules(dialect, &exprs, &query_ref);
        let statements = statement::rules(dialect, &exprs, &queries, &statement_ref);

        expression_slot.set(&exprs.expression);
        query_slot.set(&queries.query);
        statement_slot.set(&statements.statement);

        Self {
            dialect,
            expression: exprs.expression,
            query: queries.query,
            statement: statements.statement,
            statement_or_error: statements.statement_or_error,
        }
    }

    /// The dialect this grammar parses.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// A scalar expression.
    #[must_use]
    pub const fn expression(&self) -> &Parser<Node> {
        &self.expression
    }

    /// A query expression: SELECT blocks joined by set operators.
    #[must_use]
    pub const fn query(&self) -> &Parser<Node> {
        &self.query
    }

    /// A single statement with its trailing semicolons.
    #[must_use]
    pub const fn statement(&self) -> &Parser<Node> {
        &self.statement
    }

    /// A statement, or an `ErrorNode` covering the tokens up to the next
    /// statement boundary. Fails only at end of input or `END`.
    #[must_use]
    pub const fn statement_or_error(&self) -> &Parser<Node> {
        &self.statement_or_error
    }
}

/// Returns the shared grammar for `dialect`, building it on first use.
pub fn grammar(dialect: Dialect) -> &'static Grammar {
    static TSQL: OnceLock<Grammar> = OnceLock::new();
    static POSTGRES: OnceLock<Grammar> = OnceLock::new();
    let cell = match dialect {
        Dialect::TSql => &TSQL,
        Dialect::Postgres => &POSTGRES,
    };
    cell.get_or_init(|| Grammar::new(dialect))
}

/// Converts a token that was accepted as a name into an identifier node.
///
/// Keywords used as names follow the dialect's case folding like any other
/// undelimited word.
fn identifier_from(token: Token, dialect: Dialect) -> Arc<IdentifierNode> {
    let name = if matches!(token.kind, TokenKind::Keyword(_)) && dialect.folds_identifiers() {
        token.value.to_lowercase()
    } else {
        token.value
    };
    Arc::new(IdentifierNode::new(name, token.location))
}

/// An identifier: a plain or delimited identifier token, or a keyword the
/// dialect does not reserve.
fn identifier(dialect: Dialect) -> Parser<Arc<IdentifierNode>> {
    token("identifier", move |t| match t.kind {
        TokenKind::Identifier => true,
        TokenKind::Keyword(k) => !dialect.is_reserved(k),
        _ => false,
    })
    .map(move |t| identifier_from(t, dialect))
}

/// A dotted name of one to four parts; `a..b` skips a part.
fn object_identifier(dialect: Dialect) -> Parser<Arc<ObjectIdentifierNode>> {
    let part = identifier(dialect);
    rule(move |c| {
        let first = part.parse(c)?;
        let location = first.location;
        let mut parts = vec![Some(first)];
        loop {
            let before = c.position();
            let skipped = if c.peek_symbol("..") {
                true
            } else if c.peek_symbol(".") {
                false
            } else {
                break;
            };
            c.advance();
            let Some(next) = part.parse(c) else {
                c.reset(before);
                break;
            };
            if skipped {
                parts.push(None);
            }
            parts.push(Some(next));
        }
        ObjectIdentifierNode::from_parts(parts, location).map(Arc::new)
    })
}

/// A numeric literal.
fn number() -> Parser<Node> {
    token("number", |t| t.kind == TokenKind::Number).and_then(|t| {
        let value = Decimal::from_str(&t.value).ok()?;
        Some(NumberNode::new(value, t.location).into())
    })
}

/// One of the given symbols, as an operator node.
fn operator(description: &'static str, symbols: &'static [&'static str]) -> Parser<Arc<OperatorNode>> {
    token(description, move |t| {
        t.kind == TokenKind::Symbol && symbols.contains(&t.value.as_str())
    })
    .map(|t| Arc::new(OperatorNode::new(t.value, t.location)))
}

/// Optional trailing semicolons.
fn semicolons() -> Parser<()> {
    rule(|c| {
        while c.peek_symbol(";") {
            c.advance();
        }
        Some(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::cursor::Cursor;

    fn cursor(sql: &str, dialect: Dialect) -> Cursor {
        Cursor::new(tokenize(sql, dialect).unwrap(), dialect, 128)
    }

    #[test]
    fn test_object_identifier_parts() {
        let p = object_identifier(Dialect::TSql);
        let name = p.parse(&mut cursor("srv.db.dbo.t", Dialect::TSql)).unwrap();
        assert_eq!(name.server.as_ref().unwrap().name, "srv");
        assert_eq!(name.name_str(), "t");

        let name = p.parse(&mut cursor("srv..t", Dialect::TSql)).unwrap();
        assert_eq!(name.server.as_ref().unwrap().name, "srv");
        assert!(name.database.is_none());
        assert_eq!(name.schema, None);
    }

    #[test]
    fn test_object_identifier_stops_before_star() {
        let p = object_identifier(Dialect::TSql);
        let mut c = cursor("t.*", Dialect::TSql);
        assert_eq!(p.parse(&mut c).unwrap().name_str(), "t");
        assert!(c.peek_symbol("."));
    }

    #[test]
    fn test_unreserved_keyword_is_an_identifier() {
        let p = identifier(Dialect::TSql);
        assert_eq!(p.parse(&mut cursor("source", Dialect::TSql)).unwrap().name, "source");
        assert!(p.parse(&mut cursor("FROM", Dialect::TSql)).is_none());
        assert_eq!(p.parse(&mut cursor("[FROM]", Dialect::TSql)).unwrap().name, "FROM");
    }

    #[test]
    fn test_postgres_folds_keyword_names() {
        let p = identifier(Dialect::Postgres);
        assert_eq!(p.parse(&mut cursor("Source", Dialect::Postgres)).unwrap().name, "source");
    }

    #[test]
    fn test_grammar_is_shared() {
        assert!(std::ptr::eq(grammar(Dialect::TSql), grammar(Dialect::TSql)));
        assert_eq!(grammar(Dialect::Postgres).dialect(), Dialect::Postgres);
    }
}
