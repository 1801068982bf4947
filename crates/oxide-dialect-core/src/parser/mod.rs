//! Parsing entry points.
//!
//! [`parse`] turns source text into a [`StatementListNode`]. Every statement
//! is tried against the dialect's [`Grammar`]; a statement that matches no
//! production is kept in the tree as an [`ErrorNode`] so the statements after
//! it are still parsed. [`parse_tree`] returns that tree as is, while
//! [`parse`] reports the first error node as a [`ParseError::Syntax`].

pub mod combinator;
pub mod cursor;
mod error;
mod grammar;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

pub use self::cursor::Cursor;
pub use self::error::{ParseError, Result};
pub use self::grammar::{grammar, Grammar};
use crate::ast::{ErrorNode, Node, StatementListNode};
use crate::dialect::Dialect;
use crate::lexer::tokenize;

/// Default limit on nested rule re-entries and chain links.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Limits applied to a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of recursive rules (parentheses, subqueries, blocks)
    /// and operator chains. Deeper input fails with a syntax error instead
    /// of exhausting the stack.
    pub max_depth: usize,
    /// Wall-clock budget, checked between top-level statements.
    pub timeout: Option<Duration>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: None,
        }
    }
}

impl ParseOptions {
    /// Sets the nesting limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the time budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Parses `sql`, failing on the first statement that does not parse.
///
/// # Errors
///
/// Returns [`ParseError::Lex`] for input that cannot be tokenized and
/// [`ParseError::Syntax`] for the first statement that matches no
/// production.
pub fn parse(dialect: Dialect, sql: &str) -> Result<Arc<StatementListNode>> {
    parse_with_options(dialect, sql, ParseOptions::default())
}

/// Like [`parse`], with explicit limits.
///
/// # Errors
///
/// As [`parse`], plus [`ParseError::Timeout`] when the time budget runs out.
pub fn parse_with_options(
    dialect: Dialect,
    sql: &str,
    options: ParseOptions,
) -> Result<Arc<StatementListNode>> {
    let tree = parse_tree_with_options(dialect, sql, options)?;
    if let Some(error) = tree.errors().first() {
        return Err(ParseError::syntax(dialect, error.location, error.message.clone()));
    }
    Ok(tree)
}

/// Parses `sql`, keeping statements that do not parse as error nodes.
///
/// # Errors
///
/// Returns [`ParseError::Lex`] for input that cannot be tokenized.
pub fn parse_tree(dialect: Dialect, sql: &str) -> Result<Arc<StatementListNode>> {
    parse_tree_with_options(dialect, sql, ParseOptions::default())
}

/// Like [`parse_tree`], with explicit limits.
///
/// # Errors
///
/// Returns [`ParseError::Lex`] for input that cannot be tokenized and
/// [`ParseError::Timeout`] when the time budget runs out.
pub fn parse_tree_with_options(
    dialect: Dialect,
    sql: &str,
    options: ParseOptions,
) -> Result<Arc<StatementListNode>> {
    let tokens = tokenize(sql, dialect)?;
    let mut cursor = Cursor::new(tokens, dialect, options.max_depth);
    let deadline = options.timeout.map(|timeout| Instant::now() + timeout);
    let grammar = grammar(dialect);
    let location = cursor.location();
    debug!(%dialect, tokens = cursor.token_count(), "parsing");

    let mut statements: Vec<Node> = Vec::new();
    loop {
        while cursor.peek_symbol(";") {
            cursor.advance();
        }
        if cursor.is_eof() {
            break;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ParseError::Timeout {
                dialect,
                statements: statements.len(),
            });
        }
        if let Some(statement) = grammar.statement_or_error().parse(&mut cursor) {
            statements.push(statement);
            continue;
        }
        // Recovery stops before END; at top level there is no block to close.
        let token = cursor.advance();
        statements.push(
            ErrorNode {
                message: format!("unexpected '{}'", token.value),
                location: token.location,
            }
            .into(),
        );
    }

    let tree = Arc::new(StatementListNode {
        statements,
        begin_end: false,
        location,
    });
    debug!(
        %dialect,
        statements = tree.statements.len(),
        errors = tree.errors().len(),
        "parsed"
    );
    Ok(tree)
}
