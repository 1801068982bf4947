//! Lexer error type.

use super::Location;

/// A fatal lexical error, such as an unterminated string or comment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {location}")]
pub struct LexError {
    /// The error message.
    pub message: String,
    /// Where the offending token starts.
    pub location: Location,
}

impl LexError {
    /// Creates a new lexical error.
    #[must_use]
    pub fn new(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}
