//! Token types for the SQL lexer.

use super::Location;

/// SQL keywords.
///
/// Which of these a dialect recognizes, and which it reserves, is decided by
/// [`crate::dialect::Dialect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Queries
    Select,
    From,
    Where,
    Group,
    By,
    Having,
    Order,
    Asc,
    Desc,
    Distinct,
    All,
    As,

    // Row limiting
    Top,
    Percent,
    Ties,
    With,
    Limit,
    Offset,
    Fetch,
    Next,
    First,
    Rows,
    Row,
    Only,

    // Joins
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    Natural,
    Apply,
    On,
    Using,

    // Set operations
    Union,
    Except,
    Intersect,

    // Data manipulation
    Insert,
    Into,
    Values,
    Default,
    Update,
    Set,
    To,
    Delete,
    Merge,
    Matched,
    Target,
    Source,

    // Common table expressions
    Recursive,

    // Procedural
    Declare,
    If,
    Else,
    Begin,
    End,
    Exec,
    Execute,

    // Predicates and logical operators
    And,
    Or,
    Not,
    In,
    Between,
    Like,
    Is,
    Null,
    Exists,

    // Expressions
    Case,
    When,
    Then,
    Cast,
    Max,

    // Data types
    Int,
    Integer,
    Bigint,
    Smallint,
    Tinyint,
    Bit,
    Decimal,
    Numeric,
    Float,
    Real,
    Char,
    Varchar,
    Nchar,
    Nvarchar,
    Text,
    Date,
    Datetime,
    Time,
    Timestamp,
    Boolean,
    Money,
}

impl Keyword {
    /// Attempts to parse a keyword from a string (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Some(Self::Select),
            "FROM" => Some(Self::From),
            "WHERE" => Some(Self::Where),
            "GROUP" => Some(Self::Group),
            "BY" => Some(Self::By),
            "HAVING" => Some(Self::Having),
            "ORDER" => Some(Self::Order),
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            "DISTINCT" => Some(Self::Distinct),
            "ALL" => Some(Self::All),
            "AS" => Some(Self::As),
            "TOP" => Some(Self::Top),
            "PERCENT" => Some(Self::Percent),
            "TIES" => Some(Self::Ties),
            "WITH" => Some(Self::With),
            "LIMIT" => Some(Self::Limit),
            "OFFSET" => Some(Self::Offset),
            "FETCH" => Some(Self::Fetch),
            "NEXT" => Some(Self::Next),
            "FIRST" => Some(Self::First),
            "ROWS" => Some(Self::Rows),
            "ROW" => Some(Self::Row),
            "ONLY" => Some(Self::Only),
            "JOIN" => Some(Self::Join),
            "INNER" => Some(Self::Inner),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "FULL" => Some(Self::Full),
            "OUTER" => Some(Self::Outer),
            "CROSS" => Some(Self::Cross),
            "NATURAL" => Some(Self::Natural),
            "APPLY" => Some(Self::Apply),
            "ON" => Some(Self::On),
            "USING" => Some(Self::Using),
            "UNION" => Some(Self::Union),
            "EXCEPT" => Some(Self::Except),
            "INTERSECT" => Some(Self::Intersect),
            "INSERT" => Some(Self::Insert),
            "INTO" => Some(Self::Into),
            "VALUES" => Some(Self::Values),
            "DEFAULT" => Some(Self::Default),
            "UPDATE" => Some(Self::Update),
            "SET" => Some(Self::Set),
            "TO" => Some(Self::To),
            "DELETE" => Some(Self::Delete),
            "MERGE" => Some(Self::Merge),
            "MATCHED" => Some(Self::Matched),
            "TARGET" => Some(Self::Target),
            "SOURCE" => Some(Self::Source),
            "RECURSIVE" => Some(Self::Recursive),
            "DECLARE" => Some(Self::Declare),
            "IF" => Some(Self::If),
            "ELSE" => Some(Self::Else),
            "BEGIN" => Some(Self::Begin),
            "END" => Some(Self::End),
            "EXEC" => Some(Self::Exec),
            "EXECUTE" => Some(Self::Execute),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            "IN" => Some(Self::In),
            "BETWEEN" => Some(Self::Between),
            "LIKE" => Some(Self::Like),
            "IS" => Some(Self::Is),
            "NULL" => Some(Self::Null),
            "EXISTS" => Some(Self::Exists),
            "CASE" => Some(Self::Case),
            "WHEN" => Some(Self::When),
            "THEN" => Some(Self::Then),
            "CAST" => Some(Self::Cast),
            "MAX" => Some(Self::Max),
            "INT" => Some(Self::Int),
            "INTEGER" => Some(Self::Integer),
            "BIGINT" => Some(Self::Bigint),
            "SMALLINT" => Some(Self::Smallint),
            "TINYINT" => Some(Self::Tinyint),
            "BIT" => Some(Self::Bit),
            "DECIMAL" => Some(Self::Decimal),
            "NUMERIC" => Some(Self::Numeric),
            "FLOAT" => Some(Self::Float),
            "REAL" => Some(Self::Real),
            "CHAR" => Some(Self::Char),
            "VARCHAR" => Some(Self::Varchar),
            "NCHAR" => Some(Self::Nchar),
            "NVARCHAR" => Some(Self::Nvarchar),
            "TEXT" => Some(Self::Text),
            "DATE" => Some(Self::Date),
            "DATETIME" => Some(Self::Datetime),
            "TIME" => Some(Self::Time),
            "TIMESTAMP" => Some(Self::Timestamp),
            "BOOLEAN" => Some(Self::Boolean),
            "MONEY" => Some(Self::Money),
            _ => None,
        }
    }

    /// Returns the keyword as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Group => "GROUP",
            Self::By => "BY",
            Self::Having => "HAVING",
            Self::Order => "ORDER",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
            Self::As => "AS",
            Self::Top => "TOP",
            Self::Percent => "PERCENT",
            Self::Ties => "TIES",
            Self::With => "WITH",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Fetch => "FETCH",
            Self::Next => "NEXT",
            Self::First => "FIRST",
            Self::Rows => "ROWS",
            Self::Row => "ROW",
            Self::Only => "ONLY",
            Self::Join => "JOIN",
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Outer => "OUTER",
            Self::Cross => "CROSS",
            Self::Natural => "NATURAL",
            Self::Apply => "APPLY",
            Self::On => "ON",
            Self::Using => "USING",
            Self::Union => "UNION",
            Self::Except => "EXCEPT",
            Self::Intersect => "INTERSECT",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Default => "DEFAULT",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::To => "TO",
            Self::Delete => "DELETE",
            Self::Merge => "MERGE",
            Self::Matched => "MATCHED",
            Self::Target => "TARGET",
            Self::Source => "SOURCE",
            Self::Recursive => "RECURSIVE",
            Self::Declare => "DECLARE",
            Self::If => "IF",
            Self::Else => "ELSE",
            Self::Begin => "BEGIN",
            Self::End => "END",
            Self::Exec => "EXEC",
            Self::Execute => "EXECUTE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Like => "LIKE",
            Self::Is => "IS",
            Self::Null => "NULL",
            Self::Exists => "EXISTS",
            Self::Case => "CASE",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::Cast => "CAST",
            Self::Max => "MAX",
            Self::Int => "INT",
            Self::Integer => "INTEGER",
            Self::Bigint => "BIGINT",
            Self::Smallint => "SMALLINT",
            Self::Tinyint => "TINYINT",
            Self::Bit => "BIT",
            Self::Decimal => "DECIMAL",
            Self::Numeric => "NUMERIC",
            Self::Float => "FLOAT",
            Self::Real => "REAL",
            Self::Char => "CHAR",
            Self::Varchar => "VARCHAR",
            Self::Nchar => "NCHAR",
            Self::Nvarchar => "NVARCHAR",
            Self::Text => "TEXT",
            Self::Date => "DATE",
            Self::Datetime => "DATETIME",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Boolean => "BOOLEAN",
            Self::Money => "MONEY",
        }
    }

    /// Returns true for the keywords both dialects reserve.
    #[must_use]
    pub const fn is_common_reserved(self) -> bool {
        matches!(
            self,
            Self::Select
                | Self::From
                | Self::Where
                | Self::Group
                | Self::By
                | Self::Having
                | Self::Order
                | Self::Asc
                | Self::Desc
                | Self::Distinct
                | Self::All
                | Self::As
                | Self::Offset
                | Self::Fetch
                | Self::Join
                | Self::Inner
                | Self::Left
                | Self::Right
                | Self::Full
                | Self::Outer
                | Self::Cross
                | Self::Natural
                | Self::On
                | Self::Using
                | Self::Union
                | Self::Except
                | Self::Intersect
                | Self::Insert
                | Self::Into
                | Self::Values
                | Self::Default
                | Self::Update
                | Self::Set
                | Self::Delete
                | Self::Merge
                | Self::With
                | Self::Declare
                | Self::If
                | Self::Else
                | Self::Begin
                | Self::End
                | Self::Exec
                | Self::Execute
                | Self::And
                | Self::Or
                | Self::Not
                | Self::In
                | Self::Between
                | Self::Like
                | Self::Is
                | Self::Null
                | Self::Exists
                | Self::Case
                | Self::When
                | Self::Then
                | Self::Cast
        )
    }

    /// Returns true if the keyword names a data type.
    #[must_use]
    pub const fn is_data_type(self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Integer
                | Self::Bigint
                | Self::Smallint
                | Self::Tinyint
                | Self::Bit
                | Self::Decimal
                | Self::Numeric
                | Self::Float
                | Self::Real
                | Self::Char
                | Self::Varchar
                | Self::Nchar
                | Self::Nvarchar
                | Self::Text
                | Self::Date
                | Self::Datetime
                | Self::Time
                | Self::Timestamp
                | Self::Boolean
                | Self::Money
        )
    }
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A word from the dialect's keyword table.
    Keyword(Keyword),
    /// A plain or delimited identifier.
    Identifier,
    /// An operator or punctuation symbol.
    Symbol,
    /// A decimal number literal.
    Number,
    /// A single-quoted string literal.
    QuotedString,
    /// A `@name` or `$name` variable.
    Variable,
    /// A run of whitespace.
    Whitespace,
    /// A `--` or `/* */` comment.
    Comment,
    /// End of input.
    EndOfInput,
}

/// A token with its text and location in the source code.
///
/// `value` holds the unescaped content: identifier names without their
/// delimiters, string contents without quotes, the original spelling of
/// keywords and the literal text of everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The token text.
    pub value: String,
    /// Where the token starts.
    pub location: Location,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, value: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            value: value.into(),
            location,
        }
    }

    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::EndOfInput)
    }

    /// Returns true for whitespace and comments.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    /// Returns true if this is the given symbol.
    #[must_use]
    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.value == symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::from_str("SELECT"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("select"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("SeLeCt"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("not_a_keyword"), None);
    }

    #[test]
    fn test_keyword_as_str() {
        assert_eq!(Keyword::Select.as_str(), "SELECT");
        assert_eq!(Keyword::Nvarchar.as_str(), "NVARCHAR");
        assert_eq!(Keyword::Exec.as_str(), "EXEC");
    }

    #[test]
    fn test_keyword_round_trip() {
        for kw in [Keyword::Merge, Keyword::Matched, Keyword::Recursive, Keyword::Ties] {
            assert_eq!(Keyword::from_str(kw.as_str()), Some(kw));
        }
    }

    #[test]
    fn test_keyword_categories() {
        assert!(Keyword::Select.is_common_reserved());
        assert!(!Keyword::Max.is_common_reserved());
        assert!(Keyword::Varchar.is_data_type());
        assert!(!Keyword::Select.is_data_type());
    }

    #[test]
    fn test_token_helpers() {
        let eof = Token::new(TokenKind::EndOfInput, "", Location::start());
        let select = Token::new(TokenKind::Keyword(Keyword::Select), "select", Location::start());
        let comma = Token::new(TokenKind::Symbol, ",", Location::start());
        assert!(eof.is_eof());
        assert!(!select.is_eof());
        assert_eq!(select.as_keyword(), Some(Keyword::Select));
        assert_eq!(comma.as_keyword(), None);
        assert!(comma.is_symbol(","));
        assert!(!comma.is_symbol(";"));
    }
}
