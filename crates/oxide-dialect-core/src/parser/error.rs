//! Parser error types.

use crate::dialect::Dialect;
use crate::lexer::{LexError, Location};

/// A failed parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The input could not be tokenized.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// No grammar alternative matched.
    #[error("{dialect} syntax error at line {line}, column {column}: {message}")]
    Syntax {
        /// Dialect the input was parsed as.
        dialect: Dialect,
        /// 1-based line.
        line: usize,
        /// 1-based column.
        column: usize,
        /// Expectation message, e.g. `expected FROM, found 'WHERE'`.
        message: String,
    },

    /// The deadline passed before the input was fully parsed.
    #[error("{dialect} parse timed out after {statements} statement(s)")]
    Timeout {
        /// Dialect the input was parsed as.
        dialect: Dialect,
        /// Statements parsed before the deadline.
        statements: usize,
    },
}

impl ParseError {
    /// Creates a syntax error at `location`.
    #[must_use]
    pub fn syntax(dialect: Dialect, location: Location, message: impl Into<String>) -> Self {
        Self::Syntax {
            dialect,
            line: location.line,
            column: location.column,
            message: message.into(),
        }
    }

    /// Returns the location of the error, if it has one.
    #[must_use]
    pub const fn location(&self) -> Option<(usize, usize)> {
        match self {
            Self::Lex(e) => Some((e.location.line, e.location.column)),
            Self::Syntax { line, column, .. } => Some((*line, *column)),
            Self::Timeout { .. } => None,
        }
    }
}

/// Result type for parsing.
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = ParseError::syntax(Dialect::TSql, Location::new(2, 5, 12), "expected FROM");
        assert_eq!(
            err.to_string(),
            "tsql syntax error at line 2, column 5: expected FROM"
        );
        assert_eq!(err.location(), Some((2, 5)));
    }

    #[test]
    fn test_lex_error_converts() {
        let err: ParseError = LexError::new("Unterminated string literal", Location::start()).into();
        assert!(matches!(err, ParseError::Lex(_)));
        assert_eq!(err.location(), Some((1, 1)));
    }
}
