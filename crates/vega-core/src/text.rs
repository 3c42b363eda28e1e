//! Text model primitives: sizes, ranges, positions, and conversions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use text_size::{TextRange, TextSize};

/// LSP-compatible position (UTF-16 code units).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// LSP-compatible half-open range (UTF-16 code units).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("position out of range: {line}:{character}")]
    OutOfRange { line: u32, character: u32 },
    #[error("position {line}:{character} splits a UTF-16 surrogate pair")]
    Utf16Split { line: u32, character: u32 },
    #[error("offset {offset} is out of range (len={len})")]
    OffsetOutOfRange { offset: u32, len: u32 },
}

/// Pre-computed line start offsets for a particular text snapshot.
///
/// All queries are `O(log lines)` plus the length of the addressed line for
/// UTF-16 conversions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    line_ends: Vec<TextSize>,
    text_len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = Vec::with_capacity(128);
        let mut line_ends = Vec::with_capacity(128);
        line_starts.push(TextSize::from(0));

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_ends.push(TextSize::from(i as u32));
                    line_starts.push(TextSize::from((i + 1) as u32));
                    i += 1;
                }
                b'\r' => {
                    line_ends.push(TextSize::from(i as u32));
                    if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                        line_starts.push(TextSize::from((i + 2) as u32));
                        i += 2;
                    } else {
                        line_starts.push(TextSize::from((i + 1) as u32));
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        line_ends.push(TextSize::from(text.len() as u32));

        Self {
            line_starts,
            line_ends,
            text_len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.text_len
    }

    #[inline]
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    #[inline]
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }

    /// Offset of the end of `line`, excluding the line terminator.
    #[inline]
    pub fn line_end(&self, line: u32) -> Option<TextSize> {
        self.line_ends.get(line as usize).copied()
    }

    /// Zero-based line containing `offset`. Offsets past the end clamp to the last line.
    pub fn line_of(&self, offset: TextSize) -> u32 {
        let offset = offset.min(self.text_len);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line as u32,
            Err(insert) => insert.saturating_sub(1) as u32,
        }
    }

    /// Convert a byte offset to an LSP-compatible UTF-16 position.
    ///
    /// `text` must be the same snapshot used to construct this [`LineIndex`].
    pub fn position(&self, text: &str, offset: TextSize) -> Position {
        debug_assert_eq!(TextSize::from(text.len() as u32), self.text_len);
        let offset = offset.min(self.text_len);
        let line = self.line_of(offset);
        let line_start = self.line_starts[line as usize];
        let line_end = self.line_ends[line as usize];
        let offset = offset.min(line_end);
        let start = u32::from(line_start) as usize;
        let end = u32::from(offset) as usize;
        let utf16_col: u32 = text
            .get(start..end)
            .unwrap_or("")
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();

        Position {
            line,
            character: utf16_col,
        }
    }

    /// Checked variant of [`LineIndex::position`].
    pub fn try_position(&self, text: &str, offset: TextSize) -> Result<Position, PositionError> {
        if offset > self.text_len {
            return Err(PositionError::OffsetOutOfRange {
                offset: offset.into(),
                len: self.text_len.into(),
            });
        }
        Ok(self.position(text, offset))
    }

    /// Convert an LSP-compatible UTF-16 position into a byte offset.
    pub fn offset(&self, text: &str, position: Position) -> Result<TextSize, PositionError> {
        debug_assert_eq!(TextSize::from(text.len() as u32), self.text_len);
        let out_of_range = PositionError::OutOfRange {
            line: position.line,
            character: position.character,
        };
        let line_start = self.line_start(position.line).ok_or(out_of_range)?;
        let line_end = self.line_end(position.line).ok_or(out_of_range)?;
        if position.character == 0 {
            return Ok(line_start);
        }

        let line_text = &text[u32::from(line_start) as usize..u32::from(line_end) as usize];
        let mut utf16 = 0u32;
        for (byte_idx, ch) in line_text.char_indices() {
            if utf16 == position.character {
                return Ok(line_start + TextSize::from(byte_idx as u32));
            }
            let width = ch.len_utf16() as u32;
            if utf16 + width > position.character {
                return Err(PositionError::Utf16Split {
                    line: position.line,
                    character: position.character,
                });
            }
            utf16 += width;
        }

        if utf16 == position.character {
            Ok(line_end)
        } else {
            Err(out_of_range)
        }
    }

    /// Convert a byte range to an LSP-compatible range using UTF-16 positions.
    pub fn range(&self, text: &str, range: TextRange) -> Range {
        Range {
            start: self.position(text, range.start()),
            end: self.position(text, range.end()),
        }
    }

    /// Convert an LSP-compatible range into a byte range.
    pub fn text_range(&self, text: &str, range: Range) -> Result<TextRange, PositionError> {
        let start = self.offset(text, range.start)?;
        let end = self.offset(text, range.end)?;
        if end < start {
            return Err(PositionError::OutOfRange {
                line: range.end.line,
                character: range.end.character,
            });
        }
        Ok(TextRange::new(start, end))
    }

    /// Offset of the first byte of the line containing `offset`.
    pub fn line_start_of(&self, offset: TextSize) -> TextSize {
        self.line_starts[self.line_of(offset) as usize]
    }
}

#[cfg(feature = "lsp")]
mod lsp_compat {
    use super::{Position, Range};

    impl From<Position> for lsp_types::Position {
        fn from(value: Position) -> Self {
            lsp_types::Position {
                line: value.line,
                character: value.character,
            }
        }
    }

    impl From<lsp_types::Position> for Position {
        fn from(value: lsp_types::Position) -> Self {
            Position {
                line: value.line,
                character: value.character,
            }
        }
    }

    impl From<Range> for lsp_types::Range {
        fn from(value: Range) -> Self {
            lsp_types::Range {
                start: value.start.into(),
                end: value.end.into(),
            }
        }
    }

    impl From<lsp_types::Range> for Range {
        fn from(value: lsp_types::Range) -> Self {
            Range {
                start: value.start.into(),
                end: value.end.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_surrogate_pair_conversions() {
        // 😀 is a surrogate pair in UTF-16 (2 code units, 4 bytes in UTF-8).
        let text = "a😀b\nx";
        let index = LineIndex::new(text);

        assert_eq!(index.position(text, TextSize::from(0)), Position::new(0, 0));
        assert_eq!(index.position(text, TextSize::from(1)), Position::new(0, 1));
        assert_eq!(index.position(text, TextSize::from(5)), Position::new(0, 3));
        assert_eq!(index.position(text, TextSize::from(7)), Position::new(1, 0));

        assert_eq!(index.offset(text, Position::new(0, 3)), Ok(TextSize::from(5)));
        assert_eq!(
            index.offset(text, Position::new(0, 2)),
            Err(PositionError::Utf16Split {
                line: 0,
                character: 2
            })
        );
    }

    #[test]
    fn crlf_line_endings_are_excluded_from_columns() {
        let text = "ab\r\ncd";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.position(text, TextSize::from(2)), Position::new(0, 2));
        assert_eq!(index.offset(text, Position::new(1, 1)), Ok(TextSize::from(5)));
        assert!(index.offset(text, Position::new(0, 3)).is_err());
    }

    #[test]
    fn positions_past_the_last_line_are_rejected() {
        let text = "x";
        let index = LineIndex::new(text);
        assert_eq!(
            index.offset(text, Position::new(3, 0)),
            Err(PositionError::OutOfRange {
                line: 3,
                character: 0
            })
        );
    }
}
