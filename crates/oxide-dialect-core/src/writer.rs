//! The stringify buffer.
//!
//! Nodes render themselves through [`SqlWriter`], which tracks indentation and
//! the target dialect. Output is meant to re-parse to an equal tree, not to
//! reproduce the input text: whitespace, comments and keyword casing are
//! normalized.

use crate::ast::Node;
use crate::dialect::Dialect;
use crate::lexer::Keyword;

const INDENT: &str = "    ";

/// An indentation-tracking text buffer.
#[derive(Debug)]
pub struct SqlWriter {
    buf: String,
    indent: usize,
    dialect: Dialect,
    line_start: bool,
}

impl SqlWriter {
    /// Creates an empty buffer writing `dialect` syntax.
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            buf: String::new(),
            indent: 0,
            dialect,
            line_start: true,
        }
    }

    /// The target dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Appends text, indenting first if at the start of a line.
    pub fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.line_start {
            for _ in 0..self.indent {
                self.buf.push_str(INDENT);
            }
            self.line_start = false;
        }
        self.buf.push_str(text);
    }

    /// Ends the current line.
    pub fn newline(&mut self) {
        let trimmed = self.buf.trim_end_matches(' ').len();
        self.buf.truncate(trimmed);
        self.buf.push('\n');
        self.line_start = true;
    }

    /// Increases the indentation of following lines.
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decreases the indentation of following lines.
    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Writes a node.
    pub fn node(&mut self, node: &Node) {
        node.write_sql(self);
    }

    /// Writes nodes separated by `separator`.
    pub fn nodes(&mut self, nodes: &[Node], separator: &str) {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.node(node);
        }
    }

    /// Writes a node in operand position, parenthesizing predicates and
    /// binary operations.
    pub fn operand(&mut self, node: &Node) {
        let wrap = match node {
            Node::Infix(_) | Node::Between(_) | Node::In(_) | Node::IsNull(_) => true,
            Node::Prefix(prefix) => prefix.operator.operator == "NOT",
            _ => false,
        };
        if wrap {
            self.push("(");
            self.node(node);
            self.push(")");
        } else {
            self.node(node);
        }
    }

    /// Writes an identifier, delimiting it when it would not lex back as the
    /// same identifier.
    pub fn identifier(&mut self, name: &str) {
        if needs_delimiters(name, self.dialect) {
            let (open, close) = self.dialect.identifier_delimiters();
            let escaped = name.replace(close, &format!("{close}{close}"));
            self.push(&format!("{open}{escaped}{close}"));
        } else {
            self.push(name);
        }
    }

    /// Returns the written text.
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }
}

fn needs_delimiters(name: &str, dialect: Dialect) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !(first.is_alphabetic() || first == '_') {
        return true;
    }
    if !chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '@')) {
        return true;
    }
    if dialect.folds_identifiers() && name.chars().any(char::is_uppercase) {
        return true;
    }
    Keyword::from_str(name).is_some_and(|k| dialect.has_keyword(k))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, dialect: Dialect) -> String {
        let mut w = SqlWriter::new(dialect);
        w.identifier(name);
        w.finish()
    }

    #[test]
    fn test_plain_identifiers_are_bare() {
        assert_eq!(ident("users", Dialect::TSql), "users");
        assert_eq!(ident("Users", Dialect::TSql), "Users");
        assert_eq!(ident("users", Dialect::Postgres), "users");
    }

    #[test]
    fn test_keywords_are_delimited() {
        assert_eq!(ident("SELECT", Dialect::TSql), "[SELECT]");
        assert_eq!(ident("from", Dialect::Postgres), "\"from\"");
        // LIMIT is not a T-SQL keyword.
        assert_eq!(ident("limit", Dialect::TSql), "limit");
    }

    #[test]
    fn test_delimiters_are_escaped() {
        assert_eq!(ident("a]b", Dialect::TSql), "[a]]b]");
        assert_eq!(ident("a\"b", Dialect::Postgres), "\"a\"\"b\"");
        assert_eq!(ident("my table", Dialect::TSql), "[my table]");
        assert_eq!(ident("", Dialect::TSql), "[]");
    }

    #[test]
    fn test_postgres_preserves_upper_case_by_quoting() {
        assert_eq!(ident("MyTable", Dialect::Postgres), "\"MyTable\"");
    }

    #[test]
    fn test_indentation() {
        let mut w = SqlWriter::new(Dialect::TSql);
        w.push("BEGIN");
        w.indent();
        w.newline();
        w.push("SELECT 1;");
        w.dedent();
        w.newline();
        w.push("END");
        assert_eq!(w.finish(), "BEGIN\n    SELECT 1;\nEND");
    }
}
