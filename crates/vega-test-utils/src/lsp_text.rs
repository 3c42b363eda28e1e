use lsp_types::{Position, TextEdit};
use vega_core::{LineIndex, TextSize};

/// Converts a UTF-8 byte offset into an LSP UTF-16 position.
#[must_use]
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let index = LineIndex::new(text);
    let pos = index.position(text, TextSize::from(offset.min(text.len()) as u32));
    Position::new(pos.line, pos.character)
}

/// Converts an LSP UTF-16 position into a UTF-8 byte offset.
///
/// Returns `None` if the position is not representable in `text`.
#[must_use]
pub fn position_to_offset(text: &str, pos: Position) -> Option<usize> {
    let index = LineIndex::new(text);
    index
        .offset(text, vega_core::Position::new(pos.line, pos.character))
        .ok()
        .map(usize::from)
}

/// Apply LSP text edits (in any order) to `text`.
///
/// Panics on unrepresentable positions or overlapping edits, which are
/// always bugs in the code under test.
#[must_use]
pub fn apply_lsp_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut resolved: Vec<(usize, usize, &str)> = edits
        .iter()
        .map(|edit| {
            let start = position_to_offset(text, edit.range.start)
                .unwrap_or_else(|| panic!("invalid start position {:?}", edit.range.start));
            let end = position_to_offset(text, edit.range.end)
                .unwrap_or_else(|| panic!("invalid end position {:?}", edit.range.end));
            (start, end, edit.new_text.as_str())
        })
        .collect();
    resolved.sort_by_key(|(start, end, _)| (*start, *end));
    for pair in resolved.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "overlapping edits: {pair:?}");
    }

    let mut out = text.to_string();
    for (start, end, new_text) in resolved.into_iter().rev() {
        out.replace_range(start..end, new_text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::Range;

    #[test]
    fn roundtrips_offsets_at_char_boundaries() {
        let text = "a\n\u{1F603}b\n\u{3B1}\u{3B2}";
        for offset in [0, 1, 2, "a\n".len(), "a\n\u{1F603}".len(), text.len()] {
            let pos = offset_to_position(text, offset);
            assert_eq!(position_to_offset(text, pos), Some(offset));
        }
    }

    #[test]
    fn applies_edits_regardless_of_order() {
        let text = "one\ntwo\n";
        let edits = vec![
            TextEdit::new(Range::new(Position::new(1, 0), Position::new(1, 3)), "2".into()),
            TextEdit::new(Range::new(Position::new(0, 0), Position::new(0, 3)), "1".into()),
        ];
        assert_eq!(apply_lsp_edits(text, &edits), "1\n2\n");
    }
}
