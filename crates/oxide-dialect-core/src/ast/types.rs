//! SQL data type references, as used by `CAST` and `DECLARE`.

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;

use super::{same_all, structural_eq, Node, SqlNode};
use crate::lexer::{Keyword, Location};
use crate::writer::SqlWriter;

/// A data type with its optional parenthesized size.
///
/// The arguments are `NumberNode`s (size, or precision and scale) or a single
/// `KeywordNode` holding `MAX`.
#[derive(Debug, Clone)]
pub struct DataTypeNode {
    /// The type name; keyword types are upper case.
    pub name: String,
    /// Size arguments.
    pub arguments: Vec<Node>,
    /// Source location.
    pub location: Location,
}

structural_eq!(DataTypeNode { name, arguments });

impl DataTypeNode {
    /// Creates a data type reference.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Vec<Node>, location: Location) -> Self {
        Self {
            name: name.into(),
            arguments,
            location,
        }
    }

    /// Returns the node with new arguments, or `self` if nothing changed.
    #[must_use]
    pub fn update(self: &Arc<Self>, arguments: Vec<Node>) -> Arc<Self> {
        if same_all(&self.arguments, &arguments) {
            return Arc::clone(self);
        }
        Arc::new(Self {
            name: self.name.clone(),
            arguments,
            location: self.location,
        })
    }

    /// Returns the keyword naming this type, if it is a built-in type.
    #[must_use]
    pub fn keyword(&self) -> Option<Keyword> {
        Keyword::from_str(&self.name).filter(|k| k.is_data_type())
    }

    /// Returns true for `CHAR` and `NCHAR`.
    #[must_use]
    pub fn is_fixed_char(&self) -> bool {
        matches!(self.keyword(), Some(Keyword::Char | Keyword::Nchar))
    }

    /// Returns true for fixed and variable length character types.
    #[must_use]
    pub fn is_character(&self) -> bool {
        matches!(
            self.keyword(),
            Some(Keyword::Char | Keyword::Nchar | Keyword::Varchar | Keyword::Nvarchar)
        )
    }

    /// Returns true for the exact numeric and bit types.
    #[must_use]
    pub fn is_exact_numeric(&self) -> bool {
        matches!(
            self.keyword(),
            Some(
                Keyword::Int
                    | Keyword::Integer
                    | Keyword::Bigint
                    | Keyword::Smallint
                    | Keyword::Tinyint
                    | Keyword::Bit
                    | Keyword::Numeric
                    | Keyword::Decimal
            )
        )
    }

    /// Returns true if the size is `MAX`.
    #[must_use]
    pub fn is_max(&self) -> bool {
        matches!(self.arguments.as_slice(), [Node::Keyword(k)] if k.keyword == "MAX")
    }

    /// Returns the numeric argument at `index` as an integer.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<i64> {
        match self.arguments.get(index) {
            Some(Node::Number(n)) => n.value.trunc().to_i64(),
            _ => None,
        }
    }

    /// Returns the declared length, `None` when absent or `MAX`.
    #[must_use]
    pub fn length(&self) -> Option<i64> {
        self.argument(0)
    }
}

impl SqlNode for DataTypeNode {
    const KIND: &'static str = "DataTypeNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        match self.keyword() {
            Some(k) if w.dialect().has_keyword(k) => w.push(&self.name),
            _ => w.identifier(&self.name),
        }
        if !self.arguments.is_empty() {
            w.push("(");
            w.nodes(&self.arguments, ", ");
            w.push(")");
        }
    }
}
