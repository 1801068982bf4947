//! Parser combinators.
//!
//! A [`Parser`] maps the current [`Cursor`] position to a value and a new
//! position, or fails. Every parser built here restores the cursor position
//! when it fails, so an ordered choice always tries its next alternative from
//! exactly where the previous one started.

use std::sync::{Arc, OnceLock, Weak};

use super::cursor::Cursor;
use crate::lexer::{Keyword, Location, Token};

type ParseFn<T> = dyn Fn(&mut Cursor) -> Option<T> + Send + Sync;

/// A reusable parsing rule producing a `T`.
pub struct Parser<T>(Arc<ParseFn<T>>);

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> std::fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Parser")
    }
}

impl<T: 'static> Parser<T> {
    /// Runs the parser. On failure the cursor is back where it started.
    pub fn parse(&self, cursor: &mut Cursor) -> Option<T> {
        let start = cursor.position();
        let result = (self.0)(cursor);
        if result.is_none() {
            cursor.reset(start);
        }
        result
    }

    /// Transforms the parsed value.
    #[must_use]
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Parser<U> {
        rule(move |c| self.parse(c).map(&f))
    }

    /// Transforms the parsed value, failing when `f` returns `None`.
    #[must_use]
    pub fn and_then<U: 'static>(
        self,
        f: impl Fn(T) -> Option<U> + Send + Sync + 'static,
    ) -> Parser<U> {
        rule(move |c| self.parse(c).and_then(&f))
    }

    /// Parses `self` and then `next`, keeping both values.
    #[must_use]
    pub fn then<U: 'static>(self, next: Parser<U>) -> Parser<(T, U)> {
        rule(move |c| {
            let a = self.parse(c)?;
            let b = next.parse(c)?;
            Some((a, b))
        })
    }
}

/// Builds a parser from a function. The function may consume tokens and
/// then fail; the position is restored by [`Parser::parse`].
///
/// Sequences are written as closures using `?` on sub-parsers, which gives
/// the all-or-nothing semantics of a grammar rule.
pub fn rule<T: 'static>(f: impl Fn(&mut Cursor) -> Option<T> + Send + Sync + 'static) -> Parser<T> {
    Parser(Arc::new(f))
}

/// Consumes one token satisfying `pred`. `description` names the token in
/// syntax errors.
pub fn token(
    description: &'static str,
    pred: impl Fn(&Token) -> bool + Send + Sync + 'static,
) -> Parser<Token> {
    rule(move |c| c.next_if(description, &pred))
}

/// Consumes the keyword `keyword`.
pub fn keyword(keyword: Keyword) -> Parser<Token> {
    rule(move |c| c.keyword(keyword))
}

/// Consumes the symbol `symbol`.
pub fn symbol(symbol: &'static str) -> Parser<Token> {
    rule(move |c| c.symbol(symbol))
}

/// Ordered choice: the first alternative that succeeds.
pub fn first<T: 'static>(alternatives: Vec<Parser<T>>) -> Parser<T> {
    rule(move |c| alternatives.iter().find_map(|p| p.parse(c)))
}

/// Succeeds with `None`, consuming nothing, when `p` fails.
pub fn optional<T: 'static>(p: Parser<T>) -> Parser<Option<T>> {
    rule(move |c| Some(p.parse(c)))
}

/// Zero or more repetitions of `p`. Stops at the first match that consumes
/// nothing.
pub fn list<T: 'static>(p: Parser<T>) -> Parser<Vec<T>> {
    rule(move |c| {
        let mut items = Vec::new();
        loop {
            let before = c.position();
            let Some(item) = p.parse(c) else { break };
            items.push(item);
            if c.position() == before {
                break;
            }
        }
        Some(items)
    })
}

/// At least `min` repetitions of `p`, separated by `separator`.
///
/// A trailing separator is not consumed.
pub fn list_separated_by<T: 'static, S: 'static>(
    p: Parser<T>,
    separator: Parser<S>,
    min: usize,
) -> Parser<Vec<T>> {
    rule(move |c| {
        let mut items = Vec::new();
        if let Some(item) = p.parse(c) {
            items.push(item);
            loop {
                let before = c.position();
                if separator.parse(c).is_none() {
                    break;
                }
                let Some(item) = p.parse(c) else {
                    c.reset(before);
                    break;
                };
                items.push(item);
                if c.position() == before {
                    break;
                }
            }
        }
        (items.len() >= min).then_some(items)
    })
}

/// How many suffixes [`left_apply`] requires and allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Any number, including none.
    ZeroOrMore,
    /// At most one.
    ZeroOrOne,
    /// Exactly one.
    One,
    /// At least one.
    OneOrMore,
}

impl Arity {
    const fn min(self) -> usize {
        match self {
            Self::ZeroOrMore | Self::ZeroOrOne => 0,
            Self::One | Self::OneOrMore => 1,
        }
    }

    const fn max(self) -> usize {
        match self {
            Self::ZeroOrOne | Self::One => 1,
            Self::ZeroOrMore | Self::OneOrMore => usize::MAX,
        }
    }
}

/// Left-associative chaining without left recursion: parses `initial`, then
/// repeatedly a `suffix`, folding each into the value so far with
/// `combine`. `a op b op c` becomes `(a op b) op c`.
///
/// Each application nests the result one level deeper, so each one counts
/// against the cursor's depth limit until the chain is complete.
pub fn left_apply<T: 'static, S: 'static>(
    initial: Parser<T>,
    suffix: Parser<S>,
    combine: impl Fn(T, S) -> T + Send + Sync + 'static,
    arity: Arity,
) -> Parser<T> {
    rule(move |c| {
        let mut value = initial.parse(c)?;
        let mut count = 0;
        let mut exceeded = false;
        while count < arity.max() {
            let before = c.position();
            let Some(s) = suffix.parse(c) else { break };
            if !c.enter() {
                exceeded = true;
                break;
            }
            value = combine(value, s);
            count += 1;
            if c.position() == before {
                break;
            }
        }
        for _ in 0..count {
            c.exit();
        }
        (!exceeded && count >= arity.min()).then_some(value)
    })
}

/// Right-associative chaining: `a op b op c` becomes `a op (b op c)`.
///
/// Like [`left_apply`], each operator counts against the depth limit.
pub fn right_apply<T: 'static, O: 'static>(
    operand: Parser<T>,
    operator: Parser<O>,
    combine: impl Fn(T, O, T) -> T + Send + Sync + 'static,
) -> Parser<T> {
    rule(move |c| {
        let first = operand.parse(c)?;
        let mut rest: Vec<(O, T)> = Vec::new();
        let mut exceeded = false;
        loop {
            let before = c.position();
            let Some(op) = operator.parse(c) else { break };
            if !c.enter() {
                exceeded = true;
                break;
            }
            let Some(next) = operand.parse(c) else {
                c.exit();
                c.reset(before);
                break;
            };
            rest.push((op, next));
        }
        for _ in 0..rest.len() {
            c.exit();
        }
        if exceeded {
            return None;
        }
        // Each operand is paired with the operator preceding it.
        let Some((mut op, mut acc)) = rest.pop() else {
            return Some(first);
        };
        while let Some((prev_op, prev)) = rest.pop() {
            acc = combine(prev, op, acc);
            op = prev_op;
        }
        Some(combine(first, op, acc))
    })
}

/// The target of a [`deferred`] parser, set once the real rule exists.
pub struct DeferredSlot<T>(Arc<OnceLock<Weak<ParseFn<T>>>>);

impl<T: 'static> DeferredSlot<T> {
    /// Points the deferred parser at `target`.
    ///
    /// The deferred parser holds only a weak reference, so recursive grammars
    /// do not form reference cycles. The owner of the grammar must keep
    /// `target` alive.
    pub fn set(&self, target: &Parser<T>) {
        // A second call keeps the first target.
        let _ = self.0.set(Arc::downgrade(&target.0));
    }
}

/// A parser that resolves its rule at parse time, for recursive grammars.
///
/// Each entry counts against the cursor's depth limit, so pathological
/// nesting fails cleanly instead of exhausting the stack.
pub fn deferred<T: 'static>() -> (Parser<T>, DeferredSlot<T>) {
    let cell: Arc<OnceLock<Weak<ParseFn<T>>>> = Arc::new(OnceLock::new());
    let slot = DeferredSlot(Arc::clone(&cell));
    let parser = rule(move |c| {
        let target = cell.get()?.upgrade()?;
        if !c.enter() {
            return None;
        }
        let start = c.position();
        let result = target(c);
        if result.is_none() {
            c.reset(start);
        }
        c.exit();
        result
    });
    (parser, slot)
}

/// `( p )`, returning the location of the opening parenthesis.
pub fn parenthesized<T: 'static>(p: Parser<T>) -> Parser<(Location, T)> {
    rule(move |c| {
        let open = c.symbol("(")?;
        let value = p.parse(c)?;
        c.symbol(")")?;
        Some((open.location, value))
    })
}

/// `p` or `( p )`.
pub fn maybe_parenthesized<T: 'static>(p: Parser<T>) -> Parser<T> {
    let wrapped = parenthesized(p.clone()).map(|(_, value)| value);
    first(vec![wrapped, p])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::lexer::{tokenize, TokenKind};

    fn cursor(sql: &str) -> Cursor {
        Cursor::new(tokenize(sql, Dialect::TSql).unwrap(), Dialect::TSql, 16)
    }

    fn ident() -> Parser<String> {
        token("identifier", |t| t.kind == TokenKind::Identifier).map(|t| t.value)
    }

    #[test]
    fn test_failed_alternative_leaves_no_trace() {
        // Both earlier alternatives consume two tokens before failing.
        let a = rule(|c| {
            c.keyword(Keyword::Select)?;
            c.advance();
            c.keyword(Keyword::From).map(|_| "a")
        });
        let b = rule(|c| {
            c.keyword(Keyword::Select)?;
            c.advance();
            c.keyword(Keyword::Where).map(|_| "b")
        });
        let c3 = rule(|c| {
            c.keyword(Keyword::Select)?;
            c.advance();
            c.keyword(Keyword::Order).map(|_| "c")
        });
        let mut c = cursor("SELECT x ORDER");
        assert_eq!(first(vec![a, b, c3]).parse(&mut c), Some("c"));
        assert!(c.is_eof());
    }

    #[test]
    fn test_rule_rewinds_on_failure() {
        let p = rule(|c| {
            c.keyword(Keyword::Select)?;
            c.keyword(Keyword::From)
        });
        let mut c = cursor("SELECT x");
        assert!(p.parse(&mut c).is_none());
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_optional_consumes_nothing_on_failure() {
        let mut c = cursor("a");
        assert_eq!(optional(keyword(Keyword::Select)).parse(&mut c).map(|t| t.is_some()), Some(false));
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_list_stops_on_zero_width_match() {
        let empty = rule(|_| Some(()));
        let mut c = cursor("a");
        assert_eq!(list(empty).parse(&mut c).map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_list_separated_by() {
        let p = list_separated_by(ident(), symbol(","), 1);
        let mut c = cursor("a, b, c,");
        assert_eq!(p.parse(&mut c), Some(vec!["a".into(), "b".into(), "c".into()]));
        // The dangling comma is left for the caller.
        assert!(c.peek_symbol(","));

        let mut c = cursor("FROM");
        assert!(p.parse(&mut c).is_none());
        let zero = list_separated_by(ident(), symbol(","), 0);
        assert_eq!(zero.parse(&mut c), Some(vec![]));
    }

    fn binary(arity: Arity) -> Parser<String> {
        let suffix = symbol("+").then(ident()).map(|(_, r)| r);
        left_apply(ident(), suffix, |l, r| format!("({l}+{r})"), arity)
    }

    #[test]
    fn test_left_apply_folds_left() {
        let mut c = cursor("a + b + c");
        assert_eq!(binary(Arity::ZeroOrMore).parse(&mut c).as_deref(), Some("((a+b)+c)"));
    }

    #[test]
    fn test_left_apply_arity() {
        let mut c = cursor("a");
        assert_eq!(binary(Arity::ZeroOrOne).parse(&mut c).as_deref(), Some("a"));
        let mut c = cursor("a");
        assert!(binary(Arity::One).parse(&mut c).is_none());
        assert_eq!(c.position(), 0);
        let mut c = cursor("a + b + c");
        assert_eq!(binary(Arity::ZeroOrOne).parse(&mut c).as_deref(), Some("(a+b)"));
        assert!(c.peek_symbol("+"));
        let mut c = cursor("a + b + c");
        assert_eq!(binary(Arity::OneOrMore).parse(&mut c).as_deref(), Some("((a+b)+c)"));
    }

    #[test]
    fn test_chains_count_against_depth_limit() {
        let long = format!("a{}", " + b".repeat(20));
        let mut c = cursor(&long);
        assert!(binary(Arity::ZeroOrMore).parse(&mut c).is_none());
        assert!(c.depth_exceeded());
        assert_eq!(c.position(), 0);

        let short = format!("a{}", " + b".repeat(16));
        let mut c = cursor(&short);
        assert!(binary(Arity::ZeroOrMore).parse(&mut c).is_some());
        assert!(c.is_eof());
        // Every level taken by the chain is given back.
        for _ in 0..16 {
            assert!(c.enter());
        }

        let p = right_apply(ident(), symbol("+"), |l, _, r| format!("({l}+{r})"));
        let mut c = cursor(&long);
        assert!(p.parse(&mut c).is_none());
        assert!(c.depth_exceeded());
    }

    #[test]
    fn test_right_apply_folds_right() {
        let p = right_apply(ident(), symbol("+"), |l, _, r| format!("({l}+{r})"));
        let mut c = cursor("a + b + c");
        assert_eq!(p.parse(&mut c).as_deref(), Some("(a+(b+c))"));
        let mut c = cursor("a + ");
        assert_eq!(p.parse(&mut c).as_deref(), Some("a"));
        assert!(c.peek_symbol("+"));
    }

    #[test]
    fn test_deferred_recursion_and_depth_limit() {
        let (nested, slot) = deferred::<usize>();
        let inner = nested.clone();
        let real = first(vec![
            parenthesized(inner).map(|(_, depth)| depth + 1),
            ident().map(|_| 0),
        ]);
        slot.set(&real);

        let mut c = cursor("((a))");
        assert_eq!(real.parse(&mut c), Some(2));

        let deep = format!("{}a{}", "(".repeat(40), ")".repeat(40));
        let mut c = cursor(&deep);
        assert!(real.parse(&mut c).is_none());
        assert!(c.depth_exceeded());
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_maybe_parenthesized() {
        let p = maybe_parenthesized(ident());
        assert_eq!(p.parse(&mut cursor("(a)")).as_deref(), Some("a"));
        assert_eq!(p.parse(&mut cursor("a")).as_deref(), Some("a"));
    }
}
