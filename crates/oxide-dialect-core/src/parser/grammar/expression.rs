//! Scalar expressions.
//!
//! Precedence is layered from tightest to loosest binding:
//!
//! 1. primaries: literals, variables, names, calls, `CAST`, `CASE`,
//!    subqueries, parenthesized expressions, `EXISTS`, PostgreSQL `::` casts
//! 2. unary `-` `+` `~`
//! 3. `*` `/` `%`
//! 4. `+` `-` `&` `^` `|` (and PostgreSQL `||`)
//! 5. at most one comparison, `BETWEEN`, `IN`, `LIKE` or `IS NULL`
//! 6. `NOT`
//! 7. `AND`
//! 8. `OR`
//!
//! `NOT` sits below the comparisons rather than with the other unary
//! operators, so `NOT a = 1` is `NOT (a = 1)`.

use std::sync::Arc;

use super::{identifier, identifier_from, number, object_identifier, operator};
use crate::ast::{
    BetweenNode, CaseNode, CaseWhenNode, CastNode, DataTypeNode, FunctionCallNode, IdentifierNode,
    InNode, InfixNode, IsNullNode, KeywordNode, ListNode, Node, NullNode, ObjectIdentifierNode,
    OperatorNode, ParenthesisNode, PrefixNode, StarNode, StringNode, VariableNode,
};
use crate::dialect::Dialect;
use crate::lexer::{Keyword, TokenKind};
use crate::parser::combinator::{
    first, left_apply, list, list_separated_by, optional, parenthesized, rule, symbol, token,
    Arity, Parser,
};

/// Expression rules shared with the query and statement grammars.
pub(super) struct ExpressionRules {
    pub expression: Parser<Node>,
    pub identifier: Parser<Arc<IdentifierNode>>,
    pub object_identifier: Parser<Arc<ObjectIdentifierNode>>,
    pub variable: Parser<Node>,
    pub function_call: Parser<Node>,
    pub star: Parser<Node>,
    pub data_type: Parser<Arc<DataTypeNode>>,
}

/// A suffix of the comparison tier, applied to its left operand.
enum Predicate {
    Compare(Arc<OperatorNode>, Node),
    Between { not: bool, low: Node, high: Node },
    In { not: bool, list: Node },
    IsNull { not: bool },
}

fn combine_predicate(left: Node, predicate: Predicate) -> Node {
    let location = left.location();
    match predicate {
        Predicate::Compare(operator, right) => InfixNode {
            left,
            operator,
            right,
            location,
        }
        .into(),
        Predicate::Between { not, low, high } => BetweenNode {
            expr: left,
            not,
            low,
            high,
            location,
        }
        .into(),
        Predicate::In { not, list } => InNode {
            expr: left,
            not,
            list,
            location,
        }
        .into(),
        Predicate::IsNull { not } => IsNullNode {
            expr: left,
            not,
            location,
        }
        .into(),
    }
}

fn infix(left: Node, (operator, right): (Arc<OperatorNode>, Node)) -> Node {
    let location = left.location();
    InfixNode {
        left,
        operator,
        right,
        location,
    }
    .into()
}

/// A keyword as an operator node.
fn word_operator(keyword: Keyword) -> Parser<Arc<OperatorNode>> {
    rule(move |c| {
        let t = c.keyword(keyword)?;
        Some(Arc::new(OperatorNode::new(keyword.as_str(), t.location)))
    })
}

/// Prefix operators applied to `operand`, folded right to left. Written as
/// a loop so long operator runs do not recurse while parsing; each operator
/// still counts against the depth limit, since the tree it builds is nested.
fn prefixed(operators: Parser<Arc<OperatorNode>>, operand: Parser<Node>) -> Parser<Node> {
    rule(move |c| {
        let mut ops = Vec::new();
        let mut exceeded = false;
        while let Some(op) = operators.parse(c) {
            if !c.enter() {
                exceeded = true;
                break;
            }
            ops.push(op);
        }
        let operand = if exceeded { None } else { operand.parse(c) };
        for _ in 0..ops.len() {
            c.exit();
        }
        let mut node = operand?;
        while let Some(operator) = ops.pop() {
            let location = operator.location;
            node = PrefixNode {
                operator,
                operand: node,
                location,
            }
            .into();
        }
        Some(node)
    })
}

fn data_type(dialect: Dialect) -> Parser<Arc<DataTypeNode>> {
    let name = first(vec![
        token("data type", |t| t.as_keyword().is_some_and(Keyword::is_data_type))
            .and_then(|t| Some((t.as_keyword()?.as_str().to_string(), t.location))),
        identifier(dialect).map(|i| (i.name.clone(), i.location)),
    ]);
    let max = rule(|c| {
        let t = c.keyword(Keyword::Max)?;
        Some(vec![Node::from(KeywordNode::new("MAX", t.location))])
    });
    let size = first(vec![max, list_separated_by(number(), symbol(","), 1)]);
    let arguments = optional(parenthesized(size));
    rule(move |c| {
        let (name, location) = name.parse(c)?;
        let arguments = arguments.parse(c)?.map(|(_, a)| a).unwrap_or_default();
        Some(Arc::new(DataTypeNode::new(name, arguments, location)))
    })
}

pub(super) fn rules(
    dialect: Dialect,
    expression_ref: &Parser<Node>,
    query_ref: &Parser<Node>,
) -> ExpressionRules {
    let ident = identifier(dialect);
    let object_ident = object_identifier(dialect);
    let data_type = data_type(dialect);

    let string = token("string", |t| t.kind == TokenKind::QuotedString)
        .map(|t| Node::from(StringNode::new(t.value, t.location)));
    let null = rule(|c| {
        let t = c.keyword(Keyword::Null)?;
        Some(Node::from(NullNode {
            location: t.location,
        }))
    });
    let variable = token("variable", |t| t.kind == TokenKind::Variable)
        .map(|t| Node::from(VariableNode::new(t.value, t.location)));

    let star = {
        let qualifier = object_ident.clone();
        rule(move |c| {
            let start = c.position();
            let mut qualified = qualifier.parse(c);
            if qualified.is_some() && c.peek_symbol(".") {
                c.advance();
            } else {
                qualified = None;
                c.reset(start);
            }
            let t = c.symbol("*")?;
            let location = qualified.as_ref().map_or(t.location, |q| q.location);
            Some(Node::from(StarNode {
                qualifier: qualified,
                location,
            }))
        })
    };

    let function_call = {
        // LEFT and RIGHT are reserved for joins but also name functions.
        let name = first(vec![
            object_ident.clone(),
            token("function name", |t| {
                matches!(t.as_keyword(), Some(Keyword::Left | Keyword::Right))
            })
            .map(move |t| {
                let name = identifier_from(t, dialect);
                Arc::new(ObjectIdentifierNode::simple(IdentifierNode::clone(&name)))
            }),
        ]);
        let argument = first(vec![star.clone(), expression_ref.clone()]);
        let arguments = list_separated_by(argument, symbol(","), 0);
        rule(move |c| {
            let name = name.parse(c)?;
            c.symbol("(")?;
            let distinct = c.keyword(Keyword::Distinct).is_some();
            let arguments = arguments.parse(c)?;
            c.symbol(")")?;
            let location = name.location;
            Some(Node::from(FunctionCallNode {
                name,
                distinct,
                arguments,
                location,
            }))
        })
    };

    let cast = {
        let expr = expression_ref.clone();
        let data_type = data_type.clone();
        rule(move |c| {
            let t = c.keyword(Keyword::Cast)?;
            c.symbol("(")?;
            let expr = expr.parse(c)?;
            c.keyword(Keyword::As)?;
            let data_type = data_type.parse(c)?;
            c.symbol(")")?;
            Some(Node::from(CastNode {
                expr,
                data_type,
                location: t.location,
            }))
        })
    };

    let case = {
        let expr = expression_ref.clone();
        let when = {
            let expr = expr.clone();
            rule(move |c| {
                let t = c.keyword(Keyword::When)?;
                let condition = expr.parse(c)?;
                c.keyword(Keyword::Then)?;
                let result = expr.parse(c)?;
                Some(Node::from(CaseWhenNode {
                    condition,
                    result,
                    location: t.location,
                }))
            })
        };
        let input = optional(expr.clone());
        let whens = list(when);
        rule(move |c| {
            let t = c.keyword(Keyword::Case)?;
            let input = input.parse(c)?;
            let whens = whens.parse(c)?;
            if whens.is_empty() {
                c.expect("WHEN");
                return None;
            }
            let else_result = if c.keyword(Keyword::Else).is_some() {
                Some(expr.parse(c)?)
            } else {
                None
            };
            c.keyword(Keyword::End)?;
            Some(Node::from(CaseNode {
                input,
                whens,
                else_result,
                location: t.location,
            }))
        })
    };

    let subquery = parenthesized(query_ref.clone())
        .map(|(location, query)| Node::from(ParenthesisNode::new(query, location)));
    // Grouping parentheses around a scalar expression are not kept.
    let grouped = parenthesized(expression_ref.clone()).map(|(_, expr)| expr);

    let exists = {
        let subquery = subquery.clone();
        rule(move |c| {
            let t = c.keyword(Keyword::Exists)?;
            let operand = subquery.parse(c)?;
            Some(Node::from(PrefixNode {
                operator: Arc::new(OperatorNode::new("EXISTS", t.location)),
                operand,
                location: t.location,
            }))
        })
    };

    let column = object_ident.clone().map(Node::from);
    let mut primary = first(vec![
        number(),
        string,
        null,
        variable.clone(),
        cast,
        case,
        exists,
        function_call.clone(),
        subquery.clone(),
        grouped,
        column,
    ]);
    if dialect.supports_double_colon_cast() {
        let suffix = rule({
            let data_type = data_type.clone();
            move |c| {
                c.symbol("::")?;
                data_type.parse(c)
            }
        });
        primary = left_apply(
            primary,
            suffix,
            |expr, data_type| {
                let location = expr.location();
                CastNode {
                    expr,
                    data_type,
                    location,
                }
                .into()
            },
            Arity::ZeroOrMore,
        );
    }

    let unary = prefixed(operator("unary operator", &["-", "+", "~"]), primary);

    let multiplicative = {
        let suffix = operator("operator", &["*", "/", "%"]).then(unary.clone());
        left_apply(unary, suffix, infix, Arity::ZeroOrMore)
    };

    let additive = {
        let symbols: &'static [&'static str] = if dialect.supports_concat_operator() {
            &["+", "-", "&", "^", "|", "||"]
        } else {
            &["+", "-", "&", "^", "|"]
        };
        let suffix = operator("operator", symbols).then(multiplicative.clone());
        left_apply(multiplicative, suffix, infix, Arity::ZeroOrMore)
    };

    let predicate = {
        let compare = operator(
            "comparison operator",
            &["=", "<>", "!=", "<", ">", "<=", ">=", "!<", "!>"],
        )
        .then(additive.clone())
        .map(|(op, right)| Predicate::Compare(op, right));

        let like = {
            let additive = additive.clone();
            rule(move |c| {
                let not = c.keyword(Keyword::Not);
                let t = c.keyword(Keyword::Like)?;
                let text = if not.is_some() { "NOT LIKE" } else { "LIKE" };
                let location = not.map_or(t.location, |n| n.location);
                let pattern = additive.parse(c)?;
                Some(Predicate::Compare(
                    Arc::new(OperatorNode::new(text, location)),
                    pattern,
                ))
            })
        };

        let between = {
            let additive = additive.clone();
            rule(move |c| {
                let not = c.keyword(Keyword::Not).is_some();
                c.keyword(Keyword::Between)?;
                let low = additive.parse(c)?;
                c.keyword(Keyword::And)?;
                let high = additive.parse(c)?;
                Some(Predicate::Between { not, low, high })
            })
        };

        let in_list = {
            let items = list_separated_by(expression_ref.clone(), symbol(","), 1);
            let list = parenthesized(rule(move |c| {
                let location = c.location();
                let items = items.parse(c)?;
                Some(Node::from(ListNode::new(items, location)))
            }))
            .map(|(location, list)| Node::from(ParenthesisNode::new(list, location)));
            let target = first(vec![subquery, list]);
            rule(move |c| {
                let not = c.keyword(Keyword::Not).is_some();
                c.keyword(Keyword::In)?;
                let list = target.parse(c)?;
                Some(Predicate::In { not, list })
            })
        };

        let is_null = rule(|c| {
            c.keyword(Keyword::Is)?;
            let not = c.keyword(Keyword::Not).is_some();
            c.keyword(Keyword::Null)?;
            Some(Predicate::IsNull { not })
        });

        first(vec![compare, like, between, in_list, is_null])
    };

    let comparison = left_apply(additive, predicate, combine_predicate, Arity::ZeroOrOne);
    let negation = prefixed(word_operator(Keyword::Not), comparison);

    let conjunction = {
        let suffix = word_operator(Keyword::And).then(negation.clone());
        left_apply(negation, suffix, infix, Arity::ZeroOrMore)
    };
    let disjunction = {
        let suffix = word_operator(Keyword::Or).then(conjunction.clone());
        left_apply(conjunction, suffix, infix, Arity::ZeroOrMore)
    };

    ExpressionRules {
        expression: disjunction,
        identifier: ident,
        object_identifier: object_ident,
        variable,
        function_call,
        star,
        data_type,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::parser::grammar::grammar;
    use crate::lexer::tokenize;
    use crate::parser::cursor::Cursor;

    fn expr(sql: &str) -> Node {
        expr_in(sql, Dialect::TSql)
    }

    fn expr_in(sql: &str, dialect: Dialect) -> Node {
        let mut c = Cursor::new(tokenize(sql, dialect).unwrap(), dialect, 128);
        let node = grammar(dialect).expression().parse(&mut c).unwrap();
        assert!(c.is_eof(), "trailing input after {sql}");
        node
    }

    fn infix_parts(node: &Node) -> (&Node, &str, &Node) {
        match node {
            Node::Infix(i) => (&i.left, i.operator.operator.as_str(), &i.right),
            other => panic!("expected infix, got {other:?}"),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let node = expr("1 + 2 * 3");
        let (left, op, right) = infix_parts(&node);
        assert_eq!(op, "+");
        assert!(matches!(left, Node::Number(_)));
        assert_eq!(infix_parts(right).1, "*");

        let node = expr("1 * 2 + 3");
        let (left, op, _) = infix_parts(&node);
        assert_eq!(op, "+");
        assert_eq!(infix_parts(left).1, "*");
    }

    #[test]
    fn test_unary_minus_binds_tightest() {
        let node = expr("1 + 2 * -3");
        let (_, _, right) = infix_parts(&node);
        let (_, op, operand) = infix_parts(right);
        assert_eq!(op, "*");
        let Node::Prefix(prefix) = operand else {
            panic!("expected prefix");
        };
        assert_eq!(prefix.operator.operator, "-");
        assert!(matches!(&prefix.operand, Node::Number(n) if n.value == Decimal::from(3)));
    }

    #[test]
    fn test_boolean_precedence() {
        let node = expr("a = 1 OR b = 2 AND NOT c = 3");
        let (_, op, right) = infix_parts(&node);
        assert_eq!(op, "OR");
        let (_, op, right) = infix_parts(right);
        assert_eq!(op, "AND");
        assert!(matches!(right, Node::Prefix(p) if p.operator.operator == "NOT"));
    }

    #[test]
    fn test_not_applies_to_the_whole_comparison() {
        let Node::Prefix(not) = expr("NOT a = 1") else {
            panic!("expected prefix");
        };
        assert_eq!(not.operator.operator, "NOT");
        assert_eq!(infix_parts(&not.operand).1, "=");
        assert!(matches!(expr("-a = 1"), Node::Infix(i) if matches!(i.left, Node::Prefix(_))));
    }

    #[test]
    fn test_grouping_parentheses_are_dropped() {
        let node = expr("(1 + 2) * 3");
        let (left, op, _) = infix_parts(&node);
        assert_eq!(op, "*");
        assert_eq!(infix_parts(left).1, "+");
    }

    #[test]
    fn test_predicates() {
        assert!(matches!(expr("a BETWEEN 1 AND 2"), Node::Between(b) if !b.not));
        assert!(matches!(expr("a NOT BETWEEN 1 AND 2"), Node::Between(b) if b.not));
        assert!(matches!(expr("a NOT IN (1, 2)"), Node::In(i) if i.not));
        assert!(matches!(expr("a IN (SELECT b FROM t)"), Node::In(_)));
        assert!(matches!(expr("a IS NOT NULL"), Node::IsNull(i) if i.not));
        let node = expr("name NOT LIKE 'a%'");
        assert_eq!(infix_parts(&node).1, "NOT LIKE");
    }

    #[test]
    fn test_between_and_is_not_boolean_and() {
        let node = expr("a BETWEEN 1 AND 2 AND b = 1");
        let (left, op, _) = infix_parts(&node);
        assert_eq!(op, "AND");
        assert!(matches!(left, Node::Between(_)));
    }

    #[test]
    fn test_case_forms() {
        let Node::Case(simple) = expr("CASE x WHEN 1 THEN 'a' ELSE 'b' END") else {
            panic!("expected case");
        };
        assert!(simple.input.is_some());
        assert_eq!(simple.whens.len(), 1);
        assert!(simple.else_result.is_some());

        let Node::Case(searched) = expr("CASE WHEN a > 1 THEN 1 WHEN a > 2 THEN 2 END") else {
            panic!("expected case");
        };
        assert!(searched.input.is_none());
        assert_eq!(searched.whens.len(), 2);
    }

    #[test]
    fn test_cast_sizes() {
        let Node::Cast(cast) = expr("CAST(x AS VARCHAR(MAX))") else {
            panic!("expected cast");
        };
        assert!(cast.data_type.is_max());
        let Node::Cast(cast) = expr("CAST(x AS DECIMAL(10, 2))") else {
            panic!("expected cast");
        };
        assert_eq!(cast.data_type.argument(0), Some(10));
        assert_eq!(cast.data_type.argument(1), Some(2));
    }

    #[test]
    fn test_function_calls() {
        let Node::FunctionCall(call) = expr("COUNT(DISTINCT t.a)") else {
            panic!("expected call");
        };
        assert!(call.distinct);
        assert_eq!(call.arguments.len(), 1);
        assert!(matches!(expr("COUNT(*)"), Node::FunctionCall(c) if matches!(c.arguments[0], Node::Star(_))));
        assert!(matches!(expr("LEFT(name, 2)"), Node::FunctionCall(c) if c.name_str() == Some("LEFT")));
        assert!(matches!(expr("GETDATE()"), Node::FunctionCall(c) if c.arguments.is_empty()));
    }

    #[test]
    fn test_postgres_double_colon_and_concat() {
        assert!(matches!(expr_in("a::int", Dialect::Postgres), Node::Cast(_)));
        let node = expr_in("a || 'x'", Dialect::Postgres);
        assert_eq!(infix_parts(&node).1, "||");
    }

    #[test]
    fn test_exists() {
        let node = expr("NOT EXISTS (SELECT 1)");
        let Node::Prefix(not) = node else {
            panic!("expected prefix");
        };
        assert!(matches!(&not.operand, Node::Prefix(p) if p.operator.operator == "EXISTS"));
    }
}
