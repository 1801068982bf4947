//! PostgreSQL keyword table.

use crate::lexer::Keyword;

/// Keywords lexed as such by the PostgreSQL dialect.
pub(super) const fn has_keyword(keyword: Keyword) -> bool {
    !matches!(
        keyword,
        Keyword::Top
            | Keyword::Percent
            | Keyword::Ties
            | Keyword::Apply
            | Keyword::Exec
            | Keyword::Nvarchar
            | Keyword::Nchar
            | Keyword::Tinyint
            | Keyword::Bit
            | Keyword::Datetime
            | Keyword::Money
    )
}

/// Keywords that PostgreSQL refuses as undelimited identifiers.
pub(super) const fn is_reserved(keyword: Keyword) -> bool {
    keyword.is_common_reserved() || matches!(keyword, Keyword::Limit | Keyword::To)
}
