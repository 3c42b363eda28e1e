//! Text edit primitives and utilities.

use crate::{TextRange, TextSize};
use thiserror::Error;

/// A replacement of a byte range in a single document.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(offset: TextSize, text: impl Into<String>) -> Self {
        Self::new(TextRange::empty(offset), text)
    }

    pub fn delete(range: TextRange) -> Self {
        Self::new(range, String::new())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum EditError {
    #[error("edit range {range:?} is out of bounds for text length {text_len:?}")]
    RangeOutOfBounds { range: TextRange, text_len: TextSize },
    #[error("offset {offset:?} is not a UTF-8 character boundary")]
    InvalidUtf8Boundary { offset: TextSize },
    #[error("overlapping edits: {first:?} overlaps {second:?}")]
    OverlappingEdits { first: TextRange, second: TextRange },
}

/// Apply a list of edits to a text snapshot.
///
/// Edits are normalized first and then applied from the end of the text
/// backwards, so the result does not depend on the input order.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut edits = edits.to_vec();
    normalize_text_edits(text, &mut edits)?;

    let mut out = text.to_string();
    for edit in edits.into_iter().rev() {
        let start = u32::from(edit.range.start()) as usize;
        let end = u32::from(edit.range.end()) as usize;
        out.replace_range(start..end, &edit.replacement);
    }
    Ok(out)
}

/// Sort edits by `(start, end)` and check for overlaps / out-of-bounds ranges.
///
/// Several insertions at the same offset are merged into one edit, keeping the
/// order in which they were produced.
pub fn normalize_text_edits(text: &str, edits: &mut Vec<TextEdit>) -> Result<(), EditError> {
    edits.sort_by_key(|e| (e.range.start(), e.range.end()));

    let text_len = TextSize::of(text);
    for edit in edits.iter() {
        if edit.range.end() > text_len {
            return Err(EditError::RangeOutOfBounds {
                range: edit.range,
                text_len,
            });
        }
        for offset in [edit.range.start(), edit.range.end()] {
            if !text.is_char_boundary(u32::from(offset) as usize) {
                return Err(EditError::InvalidUtf8Boundary { offset });
            }
        }
    }

    let mut merged: Vec<TextEdit> = Vec::with_capacity(edits.len());
    for edit in edits.drain(..) {
        if let Some(last) = merged.last_mut() {
            if last.range.is_empty() && edit.range.is_empty() && last.range == edit.range {
                last.replacement.push_str(&edit.replacement);
                continue;
            }
            if edit.range.start() < last.range.end() {
                return Err(EditError::OverlappingEdits {
                    first: last.range,
                    second: edit.range,
                });
            }
        }
        merged.push(edit);
    }
    *edits = merged;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::from(start), TextSize::from(end))
    }

    #[test]
    fn apply_multiple_edits_is_deterministic() {
        let text = "abcdef";
        let mut edits = vec![
            TextEdit::new(range(2, 4), "XX"),
            TextEdit::insert(TextSize::from(0), "!"),
            TextEdit::delete(range(5, 6)),
        ];

        let out1 = apply_text_edits(text, &edits).unwrap();
        edits.reverse();
        let out2 = apply_text_edits(text, &edits).unwrap();

        assert_eq!(out1, out2);
        assert_eq!(out1, "!abXXe");
    }

    #[test]
    fn detect_overlapping_edits() {
        let text = "abcdef";
        let edits = vec![
            TextEdit::new(range(1, 4), "X"),
            TextEdit::new(range(3, 5), "Y"),
        ];

        assert!(matches!(
            apply_text_edits(text, &edits),
            Err(EditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn inserts_at_the_same_offset_keep_production_order() {
        let text = "ab";
        let edits = vec![
            TextEdit::insert(TextSize::from(1), "1"),
            TextEdit::insert(TextSize::from(1), "2"),
        ];
        assert_eq!(apply_text_edits(text, &edits).unwrap(), "a12b");
    }

    #[test]
    fn rejects_edits_inside_multibyte_chars() {
        let text = "é";
        let edits = vec![TextEdit::insert(TextSize::from(1), "x")];
        assert_eq!(
            apply_text_edits(text, &edits),
            Err(EditError::InvalidUtf8Boundary {
                offset: TextSize::from(1)
            })
        );
    }
}
