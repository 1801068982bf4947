//! SQL Lexer/Tokenizer
//!
//! This module provides a hand-written lexer for SQL that produces a stream of
//! tokens. Whitespace and comments are kept as tokens so locations stay exact;
//! the parser filters them out.

mod error;
mod location;
mod token;
mod tokenizer;

pub use error::LexError;
pub use location::Location;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::{tokenize, Lexer};
