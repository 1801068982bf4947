//! Source location tracking for tokens and AST nodes.

use core::fmt;

/// A position in the source text.
///
/// Lines and columns are 1-based; `offset` is the 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
    /// Byte offset from the start of the input.
    pub offset: usize,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// The location of the first character of an input.
    #[must_use]
    pub const fn start() -> Self {
        Self::new(1, 1, 0)
    }

    /// Returns the location after scanning `c` from this location.
    #[must_use]
    pub const fn advance(self, c: char) -> Self {
        if c == '\n' {
            Self::new(self.line + 1, 1, self.offset + 1)
        } else {
            Self::new(self.line, self.column + 1, self.offset + c.len_utf8())
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_start() {
        let loc = Location::start();
        assert_eq!((loc.line, loc.column, loc.offset), (1, 1, 0));
    }

    #[test]
    fn test_location_advance_column() {
        let loc = Location::start().advance('a').advance('b');
        assert_eq!((loc.line, loc.column, loc.offset), (1, 3, 2));
    }

    #[test]
    fn test_location_advance_newline() {
        let loc = Location::start().advance('a').advance('\n');
        assert_eq!((loc.line, loc.column, loc.offset), (2, 1, 2));
    }

    #[test]
    fn test_location_multibyte() {
        let loc = Location::start().advance('é');
        assert_eq!(loc.column, 2);
        assert_eq!(loc.offset, 2);
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new(3, 7, 20).to_string(), "line 3, column 7");
    }
}
