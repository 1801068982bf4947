//! Terminal nodes: names, literals, keywords and operators.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::{structural_eq, SqlNode};
use crate::lexer::Location;
use crate::writer::SqlWriter;

/// A single, possibly delimited, identifier.
#[derive(Debug, Clone)]
pub struct IdentifierNode {
    /// The unescaped name.
    pub name: String,
    /// Source location.
    pub location: Location,
}

structural_eq!(IdentifierNode { name });

impl IdentifierNode {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

impl SqlNode for IdentifierNode {
    const KIND: &'static str = "IdentifierNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.identifier(&self.name);
    }
}

/// A dotted name of up to four parts: `server.database.schema.name`.
///
/// Parts are anchored on the right, so `a.b` is `schema = a, name = b`.
/// Leading parts that were not written are `None`. A part skipped in the
/// middle (`server..name`) is also `None`.
#[derive(Debug, Clone)]
pub struct ObjectIdentifierNode {
    /// Server part.
    pub server: Option<Arc<IdentifierNode>>,
    /// Database part.
    pub database: Option<Arc<IdentifierNode>>,
    /// Schema part; for a column reference this is the table or alias.
    pub schema: Option<Arc<IdentifierNode>>,
    /// The rightmost part.
    pub name: Arc<IdentifierNode>,
    /// Source location.
    pub location: Location,
}

structural_eq!(ObjectIdentifierNode {
    server,
    database,
    schema,
    name
});

impl ObjectIdentifierNode {
    /// Creates a single-part name.
    #[must_use]
    pub fn simple(name: IdentifierNode) -> Self {
        let location = name.location;
        Self {
            server: None,
            database: None,
            schema: None,
            name: Arc::new(name),
            location,
        }
    }

    /// Builds a name from left-to-right parts, anchoring them on the right.
    ///
    /// Returns `None` for zero or more than four parts, or if the rightmost
    /// part is missing.
    #[must_use]
    pub fn from_parts(parts: Vec<Option<Arc<IdentifierNode>>>, location: Location) -> Option<Self> {
        if parts.is_empty() || parts.len() > 4 {
            return None;
        }
        let mut parts = parts.into_iter().rev();
        let name = parts.next()??;
        let schema = parts.next().flatten();
        let database = parts.next().flatten();
        let server = parts.next().flatten();
        Some(Self {
            server,
            database,
            schema,
            name,
            location,
        })
    }

    /// Returns the parts from left to right, starting at the leftmost part
    /// that is present. Skipped middle parts are `None`.
    #[must_use]
    pub fn parts(&self) -> Vec<Option<&IdentifierNode>> {
        let all = [
            self.server.as_deref(),
            self.database.as_deref(),
            self.schema.as_deref(),
            Some(self.name.as_ref()),
        ];
        let first = all.iter().position(Option::is_some).unwrap_or(3);
        all[first..].to_vec()
    }

    /// Returns true if only the name part is present.
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        self.server.is_none() && self.database.is_none() && self.schema.is_none()
    }

    /// Returns the rightmost part.
    #[must_use]
    pub fn name_str(&self) -> &str {
        &self.name.name
    }
}

impl SqlNode for ObjectIdentifierNode {
    const KIND: &'static str = "ObjectIdentifierNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        for (i, part) in self.parts().into_iter().enumerate() {
            if i > 0 {
                w.push(".");
            }
            if let Some(part) = part {
                w.identifier(&part.name);
            }
        }
    }
}

/// A keyword used as a value, such as `DEFAULT` or the `MAX` size of a type.
#[derive(Debug, Clone)]
pub struct KeywordNode {
    /// The keyword text in upper case.
    pub keyword: String,
    /// Source location.
    pub location: Location,
}

structural_eq!(KeywordNode { keyword });

impl KeywordNode {
    /// Creates a new keyword node.
    #[must_use]
    pub fn new(keyword: impl Into<String>, location: Location) -> Self {
        Self {
            keyword: keyword.into().to_ascii_uppercase(),
            location,
        }
    }
}

impl SqlNode for KeywordNode {
    const KIND: &'static str = "KeywordNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push(&self.keyword);
    }
}

/// An operator of a prefix or infix expression, or of an assignment.
#[derive(Debug, Clone)]
pub struct OperatorNode {
    /// The operator text; word operators are upper case (`AND`, `NOT LIKE`).
    pub operator: String,
    /// Source location.
    pub location: Location,
}

structural_eq!(OperatorNode { operator });

impl OperatorNode {
    /// Creates a new operator node.
    #[must_use]
    pub fn new(operator: impl Into<String>, location: Location) -> Self {
        Self {
            operator: operator.into().to_ascii_uppercase(),
            location,
        }
    }

    /// Returns true for operators spelled as words.
    #[must_use]
    pub fn is_word(&self) -> bool {
        self.operator.starts_with(|c: char| c.is_ascii_alphabetic())
    }

    /// Returns true for `AND` and `OR`.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.operator == "AND" || self.operator == "OR"
    }
}

impl SqlNode for OperatorNode {
    const KIND: &'static str = "OperatorNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        if self.operator == "||" && !w.dialect().supports_concat_operator() {
            w.push("+");
        } else {
            w.push(&self.operator);
        }
    }
}

/// A numeric literal, held as an exact decimal.
#[derive(Debug, Clone)]
pub struct NumberNode {
    /// The value.
    pub value: Decimal,
    /// Source location.
    pub location: Location,
}

structural_eq!(NumberNode { value });

impl NumberNode {
    /// Creates a new number node.
    #[must_use]
    pub const fn new(value: Decimal, location: Location) -> Self {
        Self { value, location }
    }
}

impl SqlNode for NumberNode {
    const KIND: &'static str = "NumberNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push(&self.value.to_string());
    }
}

/// A string literal.
#[derive(Debug, Clone)]
pub struct StringNode {
    /// The unescaped value.
    pub value: String,
    /// Source location.
    pub location: Location,
}

structural_eq!(StringNode { value });

impl StringNode {
    /// Creates a new string node.
    #[must_use]
    pub fn new(value: impl Into<String>, location: Location) -> Self {
        Self {
            value: value.into(),
            location,
        }
    }
}

impl SqlNode for StringNode {
    const KIND: &'static str = "StringNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push(&format!("'{}'", self.value.replace('\'', "''")));
    }
}

/// The `NULL` literal.
#[derive(Debug, Clone)]
pub struct NullNode {
    /// Source location.
    pub location: Location,
}

structural_eq!(NullNode {});

impl SqlNode for NullNode {
    const KIND: &'static str = "NullNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push("NULL");
    }
}

/// A `@name` or `$name` variable; the name keeps its prefix.
#[derive(Debug, Clone)]
pub struct VariableNode {
    /// The variable name including its prefix.
    pub name: String,
    /// Source location.
    pub location: Location,
}

structural_eq!(VariableNode { name });

impl VariableNode {
    /// Creates a new variable node.
    #[must_use]
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

impl SqlNode for VariableNode {
    const KIND: &'static str = "VariableNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        w.push(&self.name);
    }
}

/// `*` or `qualifier.*` in a select list or function argument.
#[derive(Debug, Clone)]
pub struct StarNode {
    /// Table qualifier.
    pub qualifier: Option<Arc<ObjectIdentifierNode>>,
    /// Source location.
    pub location: Location,
}

structural_eq!(StarNode { qualifier });

impl SqlNode for StarNode {
    const KIND: &'static str = "StarNode";

    fn location(&self) -> Location {
        self.location
    }

    fn write_sql(&self, w: &mut SqlWriter) {
        if let Some(qualifier) = &self.qualifier {
            qualifier.write_sql(w);
            w.push(".");
        }
        w.push("*");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Option<Arc<IdentifierNode>> {
        Some(Arc::new(IdentifierNode::new(name, Location::start())))
    }

    #[test]
    fn test_object_identifier_is_right_anchored() {
        let two = ObjectIdentifierNode::from_parts(vec![ident("dbo"), ident("t")], Location::start())
            .unwrap();
        assert_eq!(two.name_str(), "t");
        assert_eq!(two.schema.as_ref().unwrap().name, "dbo");
        assert!(two.database.is_none());
        assert!(two.server.is_none());

        let four = ObjectIdentifierNode::from_parts(
            vec![ident("srv"), ident("db"), ident("dbo"), ident("t")],
            Location::start(),
        )
        .unwrap();
        assert_eq!(four.server.as_ref().unwrap().name, "srv");
        assert_eq!(four.database.as_ref().unwrap().name, "db");
    }

    #[test]
    fn test_object_identifier_limits() {
        assert!(ObjectIdentifierNode::from_parts(vec![], Location::start()).is_none());
        assert!(ObjectIdentifierNode::from_parts(
            vec![ident("a"), ident("b"), ident("c"), ident("d"), ident("e")],
            Location::start()
        )
        .is_none());
        assert!(ObjectIdentifierNode::from_parts(vec![ident("a"), None], Location::start()).is_none());
    }

    #[test]
    fn test_object_identifier_parts_keep_gaps() {
        let name = ObjectIdentifierNode::from_parts(vec![ident("srv"), None, ident("t")], Location::start())
            .unwrap();
        let parts: Vec<_> = name.parts().iter().map(|p| p.map(|i| i.name.clone())).collect();
        assert_eq!(parts, vec![Some(String::from("srv")), None, Some(String::from("t"))]);
    }

    #[test]
    fn test_equality_ignores_location() {
        let a = IdentifierNode::new("x", Location::new(1, 1, 0));
        let b = IdentifierNode::new("x", Location::new(9, 9, 90));
        assert_eq!(a, b);
        assert_ne!(a, IdentifierNode::new("y", Location::start()));
    }

    #[test]
    fn test_operator_classification() {
        let and = OperatorNode::new("and", Location::start());
        assert_eq!(and.operator, "AND");
        assert!(and.is_word());
        assert!(and.is_boolean());
        assert!(!OperatorNode::new("+", Location::start()).is_word());
    }
}
