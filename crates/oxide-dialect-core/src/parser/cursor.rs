//! Random-access position over the significant tokens of an input.

use crate::dialect::Dialect;
use crate::lexer::{Keyword, Location, Token, TokenKind};

/// The token sequence a parse runs over, with a movable position.
///
/// Whitespace and comments are dropped on construction; the last token is
/// always [`TokenKind::EndOfInput`]. Besides the position the cursor tracks
/// the nesting depth of deferred rules and operator chains, and the furthest
/// position at which a token was expected but not found, which is where
/// syntax errors are reported.
#[derive(Debug)]
pub struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    dialect: Dialect,
    depth: usize,
    max_depth: usize,
    depth_exceeded: bool,
    furthest: usize,
    expected: Vec<String>,
}

impl Cursor {
    /// Creates a cursor at the first significant token.
    #[must_use]
    pub fn new(tokens: Vec<Token>, dialect: Dialect, max_depth: usize) -> Self {
        let mut tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.is_trivia()).collect();
        if !tokens.last().is_some_and(Token::is_eof) {
            let location = tokens.last().map_or_else(Location::start, |t| t.location);
            tokens.push(Token::new(TokenKind::EndOfInput, "", location));
        }
        Self {
            tokens,
            pos: 0,
            dialect,
            depth: 0,
            max_depth,
            depth_exceeded: false,
            furthest: 0,
            expected: Vec::new(),
        }
    }

    /// The dialect being parsed.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The current position, for a later [`reset`](Self::reset).
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Moves back (or forward) to a position returned by
    /// [`position`](Self::position).
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len() - 1);
    }

    /// The number of significant tokens, including the end-of-input token.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if only the end-of-input token remains.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.peek().is_eof()
    }

    /// The current token.
    #[must_use]
    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// The token `n` positions ahead of the current one.
    #[must_use]
    pub fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    /// The location of the current token.
    #[must_use]
    pub fn location(&self) -> Location {
        self.peek().location
    }

    /// Consumes the current token. The end-of-input token is never consumed.
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    /// Consumes the current token if `pred` holds for it; otherwise records
    /// `description` as an expectation at the current position.
    pub fn next_if(&mut self, description: &str, pred: impl Fn(&Token) -> bool) -> Option<Token> {
        if pred(self.peek()) {
            Some(self.advance())
        } else {
            self.expect(description);
            None
        }
    }

    /// Consumes `keyword`.
    pub fn keyword(&mut self, keyword: Keyword) -> Option<Token> {
        self.next_if(keyword.as_str(), |t| t.as_keyword() == Some(keyword))
    }

    /// Consumes the keywords in order, or none of them.
    pub fn keywords(&mut self, keywords: &[Keyword]) -> Option<Token> {
        let start = self.pos;
        let mut first = None;
        for &keyword in keywords {
            let Some(token) = self.keyword(keyword) else {
                self.pos = start;
                return None;
            };
            first.get_or_insert(token);
        }
        first
    }

    /// Consumes the symbol `symbol`.
    pub fn symbol(&mut self, symbol: &str) -> Option<Token> {
        self.next_if(&format!("'{symbol}'"), |t| t.is_symbol(symbol))
    }

    /// Returns true if the current token is `keyword`.
    #[must_use]
    pub fn peek_keyword(&self, keyword: Keyword) -> bool {
        self.peek().as_keyword() == Some(keyword)
    }

    /// Returns true if the current token is the symbol `symbol`.
    #[must_use]
    pub fn peek_symbol(&self, symbol: &str) -> bool {
        self.peek().is_symbol(symbol)
    }

    /// Records that `description` was expected at the current position.
    pub fn expect(&mut self, description: &str) {
        if self.pos > self.furthest {
            self.furthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.furthest && !self.expected.iter().any(|e| e == description) {
            self.expected.push(description.to_string());
        }
    }

    /// Enters one nesting level. Returns false if the depth limit is reached.
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.depth_exceeded = true;
            return false;
        }
        self.depth += 1;
        true
    }

    /// Leaves a nesting level.
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Returns true if a rule was cut off by the depth limit.
    #[must_use]
    pub const fn depth_exceeded(&self) -> bool {
        self.depth_exceeded
    }

    /// The location of the furthest failed expectation.
    #[must_use]
    pub fn error_location(&self) -> Location {
        self.tokens[self.furthest.min(self.tokens.len() - 1)].location
    }

    /// Describes the furthest failed expectation, e.g.
    /// `expected FROM or ',', found 'WHERE'`.
    #[must_use]
    pub fn error_message(&self) -> String {
        if self.depth_exceeded {
            return format!("nesting depth limit of {} exceeded", self.max_depth);
        }
        let token = &self.tokens[self.furthest.min(self.tokens.len() - 1)];
        let found = if token.is_eof() {
            String::from("end of input")
        } else {
            format!("'{}'", token.value)
        };
        match self.expected.as_slice() {
            [] => format!("unexpected {found}"),
            [only] => format!("expected {only}, found {found}"),
            [init @ .., last] => format!("expected {} or {last}, found {found}", init.join(", ")),
        }
    }

    /// Forgets recorded expectations, typically after reporting them.
    pub fn clear_expectations(&mut self) {
        self.furthest = self.pos;
        self.expected.clear();
        self.depth_exceeded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn cursor(sql: &str) -> Cursor {
        Cursor::new(tokenize(sql, Dialect::TSql).unwrap(), Dialect::TSql, 8)
    }

    #[test]
    fn test_trivia_is_skipped() {
        let mut c = cursor("SELECT /* x */ a -- y\n FROM t");
        assert_eq!(c.token_count(), 5);
        assert!(c.keyword(Keyword::Select).is_some());
        assert_eq!(c.advance().value, "a");
        assert!(c.peek_keyword(Keyword::From));
    }

    #[test]
    fn test_end_of_input_is_sticky() {
        let mut c = cursor("a");
        c.advance();
        assert!(c.is_eof());
        c.advance();
        assert!(c.is_eof());
        assert_eq!(c.position(), 1);
    }

    #[test]
    fn test_keywords_all_or_nothing() {
        let mut c = cursor("GROUP ORDER");
        assert!(c.keywords(&[Keyword::Group, Keyword::By]).is_none());
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_furthest_expectation_wins() {
        let mut c = cursor("SELECT a WHERE");
        c.keyword(Keyword::Select);
        c.advance();
        c.keyword(Keyword::From);
        c.symbol(",");
        c.reset(0);
        c.keyword(Keyword::Insert);
        assert_eq!(c.error_message(), "expected FROM or ',', found 'WHERE'");
        assert_eq!(c.error_location().column, 10);
    }

    #[test]
    fn test_depth_limit() {
        let mut c = cursor("a");
        for _ in 0..8 {
            assert!(c.enter());
        }
        assert!(!c.enter());
        assert!(c.depth_exceeded());
        assert_eq!(c.error_message(), "nesting depth limit of 8 exceeded");
    }
}
