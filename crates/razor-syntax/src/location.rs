//! Source positions.
//!
//! Every span, block and diagnostic is anchored by a [`SourceLocation`]. All
//! three indices are byte based: `absolute_index` is the offset into the
//! UTF-8 source, `character_index` the offset from the start of the line.

use std::fmt;

/// A position in the source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub absolute_index: usize,
    pub line_index: usize,
    pub character_index: usize,
}

impl SourceLocation {
    pub const ZERO: SourceLocation = SourceLocation::new(0, 0, 0);

    pub const fn new(absolute_index: usize, line_index: usize, character_index: usize) -> Self {
        Self {
            absolute_index,
            line_index,
            character_index,
        }
    }

    /// The location reached after reading `text` starting here.
    pub fn advance(self, text: &str) -> Self {
        let mut location = self;
        let mut chars = text.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            location.absolute_index += c.len_utf8();
            match c {
                '\r' if chars.peek().is_some_and(|&(_, next)| next == '\n') => {
                    location.character_index += 1;
                }
                '\r' | '\n' => {
                    location.line_index += 1;
                    location.character_index = 0;
                }
                _ => location.character_index += c.len_utf8(),
            }
        }
        location
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{},{})",
            self.absolute_index, self.line_index, self.character_index
        )
    }
}

/// Line start table for one source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    line_starts.push(i + 2);
                    i += 2;
                    continue;
                }
                b'\r' | b'\n' => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        Self { line_starts }
    }

    /// Map a byte offset to a full location.
    pub fn location(&self, offset: usize) -> SourceLocation {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        SourceLocation::new(offset, line, offset - self.line_starts[line])
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn location_on_first_line() {
        let index = LineIndex::new("hello");
        assert_eq!(index.location(3), SourceLocation::new(3, 0, 3));
    }

    #[test]
    fn all_newline_styles_start_lines() {
        let index = LineIndex::new("a\nb\r\nc\rd");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.location(2), SourceLocation::new(2, 1, 0));
        assert_eq!(index.location(5), SourceLocation::new(5, 2, 0));
        assert_eq!(index.location(7), SourceLocation::new(7, 3, 0));
    }

    #[test]
    fn crlf_is_a_single_break() {
        let index = LineIndex::new("\r\nx");
        // Offset 1 sits between \r and \n, still on line 0
        assert_eq!(index.location(1), SourceLocation::new(1, 0, 1));
        assert_eq!(index.location(2), SourceLocation::new(2, 1, 0));
    }

    #[test]
    fn offset_at_end_of_text() {
        let index = LineIndex::new("ab\n");
        assert_eq!(index.location(3), SourceLocation::new(3, 1, 0));
    }

    #[test]
    fn advance_matches_line_index() {
        let text = "one\r\ntwo\nthree\rfour";
        let index = LineIndex::new(text);
        assert_eq!(SourceLocation::ZERO.advance(text), index.location(text.len()));
        assert_eq!(
            SourceLocation::ZERO.advance(&text[..6]),
            index.location(6)
        );
    }
}
