//! Source code location tracking
//!
//! Locations are attached to every token and AST node so that diagnostics
//! can report an accurate file, line and column. Columns count bytes of
//! the encoded source, not codepoints: a two-byte Cyrillic letter
//! occupies two columns. This keeps offsets reproducible regardless of
//! how the source is later sliced.

use std::fmt;

/// A position in a source file (line and column, both 1-indexed).
///
/// The column is a byte column within the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub filename: String,
    /// Line number (1-indexed)
    pub line: u32,
    /// Byte column within the line (1-indexed)
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A byte range into the source buffer a token was scanned from.
///
/// Only valid for the lifetime of that buffer; the lexeme slice of an
/// identifier or keyword token is exactly `span.text(source)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Get the source bytes for this span
    pub fn bytes<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        &source[self.start..self.end]
    }

    /// Get the source text for this span, replacing ill-formed bytes
    pub fn text(&self, source: &[u8]) -> String {
        String::from_utf8_lossy(self.bytes(source)).into_owned()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bytes() {
        let source = "поздрав свете".as_bytes();
        let span = Span::new(0, 14);
        assert_eq!(span.text(source), "поздрав");
        assert_eq!(span.len(), 14);
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation::new("тест.ћпп", 3, 7);
        assert_eq!(loc.to_string(), "тест.ћпп:3:7");
    }
}
