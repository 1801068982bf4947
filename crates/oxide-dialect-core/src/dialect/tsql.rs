//! T-SQL keyword table.

use crate::lexer::Keyword;

/// Keywords lexed as such by the T-SQL dialect.
pub(super) const fn has_keyword(keyword: Keyword) -> bool {
    !matches!(
        keyword,
        Keyword::Limit | Keyword::Recursive | Keyword::To | Keyword::Boolean
    )
}

/// Keywords that T-SQL refuses as undelimited identifiers.
pub(super) const fn is_reserved(keyword: Keyword) -> bool {
    keyword.is_common_reserved() || matches!(keyword, Keyword::Top)
}
