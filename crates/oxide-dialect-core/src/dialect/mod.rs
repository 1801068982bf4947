//! SQL dialect support.
//!
//! Both dialects share one AST and one grammar assembly. The dialect value
//! selects the lexical rules (keyword table, identifier delimiters, case
//! folding) and toggles the handful of productions that only exist in one of
//! them.

mod postgres;
mod tsql;

use core::fmt;
use core::str::FromStr;

use crate::lexer::Keyword;

/// A supported SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Transact-SQL style grammar (`[x]`, `@var`, `TOP`, `OFFSET .. FETCH`).
    #[default]
    TSql,
    /// PostgreSQL grammar (`"x"`, `$var`, `LIMIT`, `VALUES` table sources).
    Postgres,
}

impl Dialect {
    /// Returns the name of the dialect.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TSql => "tsql",
            Self::Postgres => "postgres",
        }
    }

    /// Returns true if `keyword` is part of this dialect's keyword table.
    ///
    /// Words outside the table lex as plain identifiers.
    #[must_use]
    pub fn has_keyword(self, keyword: Keyword) -> bool {
        match self {
            Self::TSql => tsql::has_keyword(keyword),
            Self::Postgres => postgres::has_keyword(keyword),
        }
    }

    /// Returns true if `keyword` cannot be used as an undelimited identifier.
    #[must_use]
    pub fn is_reserved(self, keyword: Keyword) -> bool {
        self.has_keyword(keyword)
            && match self {
                Self::TSql => tsql::is_reserved(keyword),
                Self::Postgres => postgres::is_reserved(keyword),
            }
    }

    /// Returns the opening and closing characters of a delimited identifier
    /// as written by the stringifier.
    #[must_use]
    pub const fn identifier_delimiters(self) -> (char, char) {
        match self {
            Self::TSql => ('[', ']'),
            Self::Postgres => ('"', '"'),
        }
    }

    /// Returns the closing character for a delimited identifier opened by `open`,
    /// or `None` if `open` does not start one in this dialect.
    #[must_use]
    pub const fn closing_delimiter(self, open: char) -> Option<char> {
        match (self, open) {
            (Self::TSql, '[') => Some(']'),
            (_, '"') => Some('"'),
            _ => None,
        }
    }

    /// Returns true if undelimited identifiers are folded to lower case.
    #[must_use]
    pub const fn folds_identifiers(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// `TOP (n)` row limiting.
    #[must_use]
    pub const fn supports_top(self) -> bool {
        matches!(self, Self::TSql)
    }

    /// `LIMIT n` row limiting.
    #[must_use]
    pub const fn supports_limit(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// `VALUES (..), (..)` as a table source in FROM.
    #[must_use]
    pub const fn supports_values_table(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// `WITH RECURSIVE`.
    #[must_use]
    pub const fn supports_recursive_cte(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// `CROSS APPLY` and `OUTER APPLY`.
    #[must_use]
    pub const fn supports_apply(self) -> bool {
        matches!(self, Self::TSql)
    }

    /// `expr::type` casts.
    #[must_use]
    pub const fn supports_double_colon_cast(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// `a || b` string concatenation.
    #[must_use]
    pub const fn supports_concat_operator(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Compound assignment operators (`+=`, `-=`, ...).
    #[must_use]
    pub const fn supports_compound_assignment(self) -> bool {
        matches!(self, Self::TSql)
    }

    /// `WHEN NOT MATCHED BY SOURCE` / `BY TARGET` in MERGE.
    #[must_use]
    pub const fn supports_merge_by_source(self) -> bool {
        matches!(self, Self::TSql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a dialect name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect '{0}' (expected 'tsql' or 'postgres')")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tsql" | "t-sql" | "mssql" | "sqlserver" => Ok(Self::TSql),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}
