//! SQL Tokenizer implementation.

use core::str::FromStr;

use rust_decimal::Decimal;

use super::{Keyword, LexError, Location, Token, TokenKind};
use crate::dialect::Dialect;

/// Multi-character symbols, tried before any single-character symbol.
const MULTI_CHAR_SYMBOLS: [&str; 18] = [
    "<>", ">=", "<=", "!=", "!<", "!>", "::", "->", "..", "+=", "-=", "*=", "/=", "%=", "&=",
    "^=", "|=", "||",
];

/// Single-character symbols.
const SINGLE_CHAR_SYMBOLS: &str = "(),;.=<>+-*/%&|^~!:";

/// A lexer that tokenizes SQL input.
///
/// The lexer is an iterator: tokens are produced one at a time, ending with a
/// single [`TokenKind::EndOfInput`] token. After the first error the iterator
/// is exhausted.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The dialect whose lexical rules apply.
    dialect: Dialect,
    /// The current byte position.
    pos: usize,
    /// The location of the current position.
    location: Location,
    /// Set once the end-of-input token or an error has been produced.
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str, dialect: Dialect) -> Self {
        Self {
            input,
            dialect,
            pos: 0,
            location: Location::start(),
            finished: false,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        self.location = self.location.advance(c);
        Some(c)
    }

    /// Advances while `pred` holds.
    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    fn is_identifier_body(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '$' || c == '@'
    }

    /// Scans a run of whitespace.
    fn scan_whitespace(&mut self, start: usize, location: Location) -> Token {
        self.advance_while(char::is_whitespace);
        Token::new(TokenKind::Whitespace, &self.input[start..self.pos], location)
    }

    /// Scans a `--` comment up to, but not including, the end of the line.
    fn scan_line_comment(&mut self, start: usize, location: Location) -> Token {
        self.advance_while(|c| c != '\n');
        Token::new(TokenKind::Comment, &self.input[start..self.pos], location)
    }

    /// Scans a `/* ... */` comment. The first `*/` closes it.
    fn scan_block_comment(&mut self, start: usize, location: Location) -> Result<Token, LexError> {
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(Token::new(
                        TokenKind::Comment,
                        &self.input[start..self.pos],
                        location,
                    ));
                }
                Some(_) => {}
                None => return Err(LexError::new("Unterminated comment", location)),
            }
        }
    }

    /// Scans text enclosed by `close`, where a doubled `close` stands for one
    /// literal `close` character. The opening character must be current.
    fn scan_delimited(
        &mut self,
        close: char,
        what: &str,
        location: Location,
    ) -> Result<String, LexError> {
        self.advance(); // opening delimiter
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == close => {
                    if self.peek() == Some(close) {
                        self.advance();
                        value.push(close);
                    } else {
                        return Ok(value);
                    }
                }
                Some(c) => value.push(c),
                None => return Err(LexError::new(format!("Unterminated {what}"), location)),
            }
        }
    }

    /// Scans a number: a digit sequence with an optional fractional part.
    fn scan_number(&mut self, start: usize, location: Location) -> Result<Token, LexError> {
        self.advance_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit());
        }
        let text = &self.input[start..self.pos];
        if Decimal::from_str(text).is_err() {
            return Err(LexError::new(
                format!("Numeric literal out of range: {text}"),
                location,
            ));
        }
        Ok(Token::new(TokenKind::Number, text, location))
    }

    /// Scans an identifier or keyword.
    fn scan_word(&mut self, start: usize, location: Location) -> Token {
        self.advance_while(Self::is_identifier_body);
        let text = &self.input[start..self.pos];

        match Keyword::from_str(text) {
            Some(keyword) if self.dialect.has_keyword(keyword) => {
                Token::new(TokenKind::Keyword(keyword), text, location)
            }
            _ if self.dialect.folds_identifiers() => {
                Token::new(TokenKind::Identifier, text.to_lowercase(), location)
            }
            _ => Token::new(TokenKind::Identifier, text, location),
        }
    }

    /// Scans a `@name` or `$name` variable.
    fn scan_variable(&mut self, start: usize, location: Location) -> Token {
        self.advance(); // prefix
        self.advance_while(Self::is_identifier_body);
        Token::new(TokenKind::Variable, &self.input[start..self.pos], location)
    }

    /// Scans an operator or punctuation symbol, longest match first.
    fn scan_symbol(&mut self, location: Location) -> Result<Token, LexError> {
        let input = self.input;
        let rest = &input[self.pos..];
        let symbol = MULTI_CHAR_SYMBOLS
            .iter()
            .find(|s| rest.starts_with(**s))
            .map(|s| (*s).to_string())
            .or_else(|| {
                rest.chars()
                    .next()
                    .filter(|c| SINGLE_CHAR_SYMBOLS.contains(*c))
                    .map(String::from)
            });

        match symbol {
            Some(symbol) => {
                for _ in symbol.chars() {
                    self.advance();
                }
                Ok(Token::new(TokenKind::Symbol, symbol, location))
            }
            None => {
                let c = rest.chars().next().unwrap_or_default();
                Err(LexError::new(format!("Unexpected character: {c}"), location))
            }
        }
    }

    /// Scans the next token.
    ///
    /// # Errors
    ///
    /// Returns a `LexError` for unterminated strings, comments or delimited
    /// identifiers, out-of-range numbers and characters that start no token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let location = self.location;

        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::EndOfInput, "", location));
        };

        match c {
            c if c.is_whitespace() => Ok(self.scan_whitespace(start, location)),
            '-' if self.peek_next() == Some('-') => Ok(self.scan_line_comment(start, location)),
            '/' if self.peek_next() == Some('*') => self.scan_block_comment(start, location),
            '\'' => {
                let value = self.scan_delimited('\'', "string literal", location)?;
                Ok(Token::new(TokenKind::QuotedString, value, location))
            }
            c if self.dialect.closing_delimiter(c).is_some() => {
                let close = self.dialect.closing_delimiter(c).unwrap_or(c);
                let value = self.scan_delimited(close, "delimited identifier", location)?;
                Ok(Token::new(TokenKind::Identifier, value, location))
            }
            '@' | '$' if self.peek_next().is_some_and(Self::is_identifier_body) => {
                Ok(self.scan_variable(start, location))
            }
            c if c.is_ascii_digit() => self.scan_number(start, location),
            c if c.is_alphabetic() || c == '_' => Ok(self.scan_word(start, location)),
            _ => self.scan_symbol(location),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        if result.as_ref().map_or(true, Token::is_eof) {
            self.finished = true;
        }
        Some(result)
    }
}

/// Tokenizes the entire input, including whitespace and comment tokens.
///
/// # Errors
///
/// Returns the first lexical error encountered.
pub fn tokenize(input: &str, dialect: Dialect) -> Result<Vec<Token>, LexError> {
    Lexer::new(input, dialect).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(input: &str, dialect: Dialect) -> Vec<(TokenKind, String)> {
        tokenize(input, dialect)
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| (t.kind, t.value))
            .collect()
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        significant(input, Dialect::TSql)
            .into_iter()
            .map(|(k, _)| k)
            .collect()
    }

    fn values(input: &str, dialect: Dialect) -> Vec<String> {
        significant(input, dialect)
            .into_iter()
            .map(|(_, v)| v)
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let tokens = tokenize("", Dialect::TSql).unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
    }

    #[test]
    fn test_whitespace_and_comments_are_tokens() {
        let tokens = tokenize("SELECT -- note\n/* block */ 1", Dialect::TSql).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::Whitespace,
                TokenKind::Number,
                TokenKind::EndOfInput,
            ]
        );
        assert_eq!(tokens[2].value, "-- note");
        assert_eq!(tokens[4].value, "/* block */");
    }

    #[test]
    fn test_locations_advance_through_comments() {
        let tokens = tokenize("SELECT /* a\nb */ x", Dialect::TSql).unwrap();
        let x = tokens.iter().find(|t| t.value == "x").unwrap();
        assert_eq!(x.location, Location::new(2, 6, 17));
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("select FROM wHeRe"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Keyword(Keyword::Where),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_keyword_tables_per_dialect() {
        assert_eq!(kinds("TOP")[0], TokenKind::Keyword(Keyword::Top));
        assert_eq!(
            significant("top limit", Dialect::Postgres)[0].0,
            TokenKind::Identifier
        );
        assert_eq!(
            significant("top limit", Dialect::Postgres)[1].0,
            TokenKind::Keyword(Keyword::Limit)
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            values("foo bar_baz _qux a$b@c", Dialect::TSql),
            vec!["foo", "bar_baz", "_qux", "a$b@c", ""]
        );
    }

    #[test]
    fn test_postgres_folds_identifiers() {
        assert_eq!(
            values("MyTable \"MyTable\"", Dialect::Postgres),
            vec!["mytable", "MyTable", ""]
        );
    }

    #[test]
    fn test_bracketed_identifiers() {
        let tokens = significant("[SELECT] [a]]b] \"from\"", Dialect::TSql);
        assert_eq!(tokens[0], (TokenKind::Identifier, String::from("SELECT")));
        assert_eq!(tokens[1], (TokenKind::Identifier, String::from("a]b")));
        assert_eq!(tokens[2], (TokenKind::Identifier, String::from("from")));
    }

    #[test]
    fn test_brackets_are_not_identifiers_in_postgres() {
        assert!(tokenize("[x]", Dialect::Postgres).is_err());
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            significant("@id @@rowcount $1", Dialect::TSql),
            vec![
                (TokenKind::Variable, String::from("@id")),
                (TokenKind::Variable, String::from("@@rowcount")),
                (TokenKind::Variable, String::from("$1")),
                (TokenKind::EndOfInput, String::new()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(values("42 3.25 1.", Dialect::TSql), vec!["42", "3.25", "1", ".", ""]);
    }

    #[test]
    fn test_number_out_of_range() {
        let err = tokenize("SELECT 123456789012345678901234567890123", Dialect::TSql).unwrap_err();
        assert!(err.message.contains("out of range"));
        assert_eq!(err.location.column, 8);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            significant("'it''s' ''", Dialect::TSql),
            vec![
                (TokenKind::QuotedString, String::from("it's")),
                (TokenKind::QuotedString, String::new()),
                (TokenKind::EndOfInput, String::new()),
            ]
        );
    }

    #[test]
    fn test_longest_match_symbols() {
        assert_eq!(
            values("<> >= <= != :: -> .. += || < > = :", Dialect::TSql),
            vec!["<>", ">=", "<=", "!=", "::", "->", "..", "+=", "||", "<", ">", "=", ":", ""]
        );
    }

    #[test]
    fn test_minus_is_not_part_of_number() {
        assert_eq!(values("1-2", Dialect::TSql), vec!["1", "-", "2", ""]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("SELECT 'abc", Dialect::TSql).unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.location, Location::new(1, 8, 7));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize("SELECT /* abc", Dialect::TSql).unwrap_err();
        assert_eq!(err.message, "Unterminated comment");
    }

    #[test]
    fn test_unterminated_bracket() {
        let err = tokenize("SELECT [abc", Dialect::TSql).unwrap_err();
        assert_eq!(err.message, "Unterminated delimited identifier");
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("SELECT #", Dialect::TSql).unwrap_err();
        assert!(err.message.contains('#'));
    }

    #[test]
    fn test_lexer_is_lazy() {
        let mut lexer = Lexer::new("SELECT 1", Dialect::TSql);
        let first = lexer.next().unwrap().unwrap();
        assert_eq!(first.as_keyword(), Some(Keyword::Select));
        assert_eq!(lexer.count(), 3);
    }
}
