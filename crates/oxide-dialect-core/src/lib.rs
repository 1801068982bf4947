//! # oxide-dialect-core
//!
//! A combinator-based SQL parser for two dialects, T-SQL and PostgreSQL,
//! sharing one syntax tree.
//!
//! This crate provides:
//! - A tokenizer with per-dialect keywords and identifier quoting
//! - Backtracking parser combinators and a grammar for each dialect
//! - An immutable syntax tree with structural sharing on rewrite
//! - A [`Visitor`](visit::Visitor) rewrite engine and a constant folder
//! - A stringifier whose output parses back to an equal tree
//! - Symbol tables and a structural validator
//!
//! ## Round-tripping
//!
//! ```rust
//! use oxide_dialect_core::{parse, Dialect, Node};
//!
//! let tree = parse(Dialect::TSql, "select a from [t] where b=1").unwrap();
//! let sql = Node::from(tree).to_sql(Dialect::TSql);
//! assert_eq!(sql, "SELECT a\nFROM t\nWHERE b = 1;");
//! ```
//!
//! ## Translating
//!
//! Rendering with another dialect swaps identifier quoting and row limiting:
//!
//! ```rust
//! use oxide_dialect_core::{parse, Dialect, Node};
//!
//! let tree = parse(Dialect::TSql, "SELECT TOP 5 [order] FROM t").unwrap();
//! let sql = Node::from(tree).to_sql(Dialect::Postgres);
//! assert_eq!(sql, "SELECT \"order\"\nFROM t\nLIMIT 5;");
//! ```

pub mod ast;
pub mod dialect;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod symbols;
pub mod validate;
pub mod visit;
pub mod writer;

pub use ast::{Node, StatementListNode};
pub use dialect::Dialect;
pub use lexer::{tokenize, LexError, Location, Token, TokenKind};
pub use optimizer::fold_constants;
pub use parser::{parse, parse_tree, parse_tree_with_options, parse_with_options, ParseError, ParseOptions};
pub use symbols::{build_symbol_tables, ScopeTree, SymbolError, SymbolTable};
pub use validate::{validate, ValidationError, ValidationResult};
pub use visit::Visitor;
