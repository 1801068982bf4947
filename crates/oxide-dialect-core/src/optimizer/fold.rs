//! Constant folding.
//!
//! Operators applied to literals are replaced by their result, bottom-up, so
//! `1 + 2 * 3` becomes `7`. `CAST` of a literal to a character type becomes a
//! string literal, and `CAST` of a string literal to an exact numeric type
//! becomes a number. Anything that cannot be evaluated exactly (division by
//! zero, overflow, unparsable text) is left as written.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::ast::{CastNode, DataTypeNode, InfixNode, Node, NumberNode, PrefixNode, StringNode};
use crate::lexer::Keyword;
use crate::visit::{walk_cast, walk_infix, walk_prefix, Visitor};

/// Folds constant expressions in `node`.
///
/// Subtrees without constants are shared with the input.
#[must_use]
pub fn fold_constants(node: &Node) -> Node {
    let mut folder = ConstantFolder::new();
    let folded = node.accept(&mut folder);
    debug!(folded = folder.folded(), "constant folding finished");
    folded
}

/// The folding pass. Counts the nodes it replaced.
#[derive(Debug, Default)]
pub struct ConstantFolder {
    folded: usize,
}

impl ConstantFolder {
    /// Creates a folder.
    #[must_use]
    pub const fn new() -> Self {
        Self { folded: 0 }
    }

    /// The number of nodes replaced so far.
    #[must_use]
    pub const fn folded(&self) -> usize {
        self.folded
    }

    fn replaced(&mut self, node: impl Into<Node>) -> Node {
        self.folded += 1;
        node.into()
    }
}

/// The integer part of `value`; bitwise operators and `%` work on it.
fn integer(value: Decimal) -> Option<i64> {
    value.trunc().to_i64()
}

fn fold_prefix(operator: &str, value: Decimal) -> Option<Decimal> {
    match operator {
        "-" => Some(-value),
        "+" => Some(value),
        "~" => integer(value).map(|i| Decimal::from(!i)),
        _ => None,
    }
}

fn fold_numbers(operator: &str, left: Decimal, right: Decimal) -> Option<Decimal> {
    match operator {
        "+" => left.checked_add(right),
        "-" => left.checked_sub(right),
        "*" => left.checked_mul(right),
        "/" => left.checked_div(right),
        "%" => integer(left)?.checked_rem(integer(right)?).map(Decimal::from),
        "&" => Some(Decimal::from(integer(left)? & integer(right)?)),
        "^" => Some(Decimal::from(integer(left)? ^ integer(right)?)),
        "|" => Some(Decimal::from(integer(left)? | integer(right)?)),
        _ => None,
    }
}

/// Longest `CHAR` a cast is padded out to; longer ones are not folded.
const MAX_PADDED_LENGTH: usize = 8000;

/// Text of a literal converted to a character type: cut to the declared
/// length, and for `CHAR` padded to it with spaces.
fn to_character(text: String, data_type: &DataTypeNode) -> Option<String> {
    let Some(length) = data_type.length().and_then(|l| usize::try_from(l).ok()) else {
        return Some(text);
    };
    let mut text: String = text.chars().take(length).collect();
    if data_type.is_fixed_char() {
        if length > MAX_PADDED_LENGTH {
            return None;
        }
        let padding = length - text.chars().count();
        text.extend(std::iter::repeat_n(' ', padding));
    }
    Some(text)
}

/// The range of an integer type, for types narrower than `BIGINT`.
fn integer_range(keyword: Keyword) -> Option<(i64, i64)> {
    match keyword {
        Keyword::Int | Keyword::Integer => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
        Keyword::Smallint => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
        Keyword::Tinyint => Some((0, i64::from(u8::MAX))),
        _ => None,
    }
}

/// A string literal converted to an exact numeric type.
fn to_number(text: &str, data_type: &DataTypeNode) -> Option<Decimal> {
    let text = text.trim();
    let keyword = data_type.keyword()?;
    match keyword {
        Keyword::Bit => {
            let value = text.parse::<i64>().ok()?;
            Some(Decimal::from(i64::from(value > 0)))
        }
        Keyword::Numeric | Keyword::Decimal => Decimal::from_str(text).ok(),
        _ => {
            let value = text.parse::<i64>().ok()?;
            if let Some((min, max)) = integer_range(keyword) {
                if !(min..=max).contains(&value) {
                    return None;
                }
            }
            Some(Decimal::from(value))
        }
    }
}

fn fold_cast(cast: &CastNode) -> Option<Node> {
    let data_type = &cast.data_type;
    if data_type.is_character() {
        let text = match &cast.expr {
            Node::Number(n) => n.value.to_string(),
            Node::String(s) => s.value.clone(),
            _ => return None,
        };
        let value = to_character(text, data_type)?;
        return Some(StringNode::new(value, cast.location).into());
    }
    if data_type.is_exact_numeric() {
        if let Node::String(s) = &cast.expr {
            let value = to_number(&s.value, data_type)?;
            return Some(NumberNode::new(value, cast.location).into());
        }
    }
    None
}

impl Visitor for ConstantFolder {
    fn visit_prefix(&mut self, node: &Arc<PrefixNode>) -> Node {
        let rewritten = walk_prefix(self, node);
        if let Node::Prefix(prefix) = &rewritten {
            if let Node::Number(operand) = &prefix.operand {
                if let Some(value) = fold_prefix(&prefix.operator.operator, operand.value) {
                    return self.replaced(NumberNode::new(value, prefix.location));
                }
            }
        }
        rewritten
    }

    fn visit_infix(&mut self, node: &Arc<InfixNode>) -> Node {
        let rewritten = walk_infix(self, node);
        let Node::Infix(infix) = &rewritten else {
            return rewritten;
        };
        let operator = infix.operator.operator.as_str();
        match (&infix.left, &infix.right) {
            (Node::Number(left), Node::Number(right)) => {
                if let Some(value) = fold_numbers(operator, left.value, right.value) {
                    return self.replaced(NumberNode::new(value, infix.location));
                }
            }
            (Node::String(left), Node::String(right)) if matches!(operator, "+" | "||") => {
                let value = format!("{}{}", left.value, right.value);
                return self.replaced(StringNode::new(value, infix.location));
            }
            _ => {}
        }
        rewritten
    }

    fn visit_cast(&mut self, node: &Arc<CastNode>) -> Node {
        let rewritten = walk_cast(self, node);
        if let Node::Cast(cast) = &rewritten {
            if let Some(folded) = fold_cast(cast) {
                return self.replaced(folded);
            }
        }
        rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::parser::parse;

    /// Parses `SELECT expr` and returns the folded select-list item.
    fn fold(expr: &str) -> Node {
        let tree = parse(Dialect::TSql, &format!("SELECT {expr}")).unwrap();
        let folded = fold_constants(&Node::StatementList(tree));
        let Node::StatementList(list) = folded else {
            panic!("expected statement list");
        };
        let Node::Select(select) = &list.statements[0] else {
            panic!("expected select");
        };
        let Node::List(columns) = &select.columns else {
            panic!("expected column list");
        };
        columns.items[0].clone()
    }

    fn assert_number(node: &Node, expected: i64) {
        match node {
            Node::Number(n) => assert_eq!(n.value, Decimal::from(expected)),
            other => panic!("expected {expected}, got {other:?}"),
        }
    }

    fn assert_string(node: &Node, expected: &str) {
        match node {
            Node::String(s) => assert_eq!(s.value, expected),
            other => panic!("expected '{expected}', got {other:?}"),
        }
    }

    #[test]
    fn test_unary_operators() {
        assert_number(&fold("-5"), -5);
        assert_number(&fold("+5"), 5);
        assert_number(&fold("~10"), -11);
        assert_number(&fold("- -5"), 5);
    }

    #[test]
    fn test_arithmetic_folds_bottom_up() {
        assert_number(&fold("1 + 2 * 3"), 7);
        assert_number(&fold("(1 + 2) * 3"), 9);
        assert_number(&fold("7 % 3"), 1);
        assert_number(&fold("6 & 3"), 2);
        assert_number(&fold("6 | 3"), 7);
        assert_number(&fold("6 ^ 3"), 5);
    }

    #[test]
    fn test_string_concatenation() {
        assert_string(&fold("'A' + 'B'"), "AB");
    }

    #[test]
    fn test_cast_to_character_types() {
        assert_string(&fold("CAST(5 AS VARCHAR(MAX))"), "5");
        assert_string(&fold("CAST(12345 AS VARCHAR(3))"), "123");
        assert_string(&fold("CAST('ab' AS CHAR(4))"), "ab  ");
        assert_string(&fold("CAST('ab' AS VARCHAR(4))"), "ab");
        assert_string(&fold("CAST('abc' AS VARCHAR)"), "abc");
    }

    #[test]
    fn test_huge_char_cast_is_left_alone() {
        assert!(matches!(fold("CAST('a' AS CHAR(300000000))"), Node::Cast(_)));
        assert!(matches!(fold("CAST('a' AS CHAR(70000))"), Node::Cast(_)));
        assert_string(&fold("CAST('a' AS VARCHAR(300000000))"), "a");
        let Node::String(padded) = fold("CAST('a' AS CHAR(8000))") else {
            panic!("expected string");
        };
        assert_eq!(padded.value.len(), 8000);
        assert!(padded.value.starts_with("a "));
    }

    #[test]
    fn test_integer_casts_respect_the_type_range() {
        assert!(matches!(fold("CAST('99999999999' AS INT)"), Node::Cast(_)));
        assert_number(&fold("CAST('99999999999' AS BIGINT)"), 99_999_999_999);
        assert_number(&fold("CAST('-2147483648' AS INT)"), -2_147_483_648);
        assert!(matches!(fold("CAST('40000' AS SMALLINT)"), Node::Cast(_)));
        assert!(matches!(fold("CAST('-1' AS TINYINT)"), Node::Cast(_)));
        assert_number(&fold("CAST('255' AS TINYINT)"), 255);
    }

    #[test]
    fn test_cast_to_numeric_types() {
        assert_number(&fold("CAST('12345' AS INT)"), 12345);
        assert_number(&fold("CAST(' 42 ' AS BIGINT)"), 42);
        assert_number(&fold("CAST('5' AS BIT)"), 1);
        assert_number(&fold("CAST('-5' AS BIT)"), 0);
        assert!(matches!(fold("CAST('1.25' AS DECIMAL(5, 2))"), Node::Number(n) if n.value == Decimal::new(125, 2)));
        assert!(matches!(fold("CAST('x' AS INT)"), Node::Cast(_)));
    }

    #[test]
    fn test_unfoldable_expressions_are_kept() {
        assert!(matches!(fold("1 / 0"), Node::Infix(_)));
        assert!(matches!(fold("a + 1"), Node::Infix(_)));
        assert!(matches!(fold("'a' - 'b'"), Node::Infix(_)));
    }

    #[test]
    fn test_partial_folding() {
        let node = fold("a + (2 * 3)");
        let Node::Infix(infix) = node else {
            panic!("expected infix");
        };
        assert_number(&infix.right, 6);
    }

    #[test]
    fn test_tree_without_constants_is_shared() {
        let tree = Node::StatementList(parse(Dialect::TSql, "SELECT a FROM t WHERE b = c").unwrap());
        let mut folder = ConstantFolder::new();
        let folded = tree.accept(&mut folder);
        assert!(folded.ptr_eq(&tree));
        assert_eq!(folder.folded(), 0);
    }
}
