use pretty_assertions::assert_eq;
use proptest::prelude::*;
use vega_core::{LineIndex, Position, TextSize};

#[test]
fn range_round_trips_through_positions() {
    let text = "package p\n\nfunc f() {\n\ts := \"héllo\"\n}\n";
    let index = LineIndex::new(text);
    let start = text.find("héllo").unwrap();
    let end = start + "héllo".len();
    let range = vega_core::TextRange::new(
        TextSize::from(start as u32),
        TextSize::from(end as u32),
    );

    let lsp = index.range(text, range);
    assert_eq!(lsp.start, Position::new(3, 7));
    assert_eq!(lsp.end, Position::new(3, 12));
    assert_eq!(index.text_range(text, lsp), Ok(range));
}

proptest! {
    #[test]
    fn every_char_boundary_round_trips(text in "[a-z\u{e9}\u{1F600}\n]{0,40}") {
        let index = LineIndex::new(&text);
        for (offset, _) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
            let offset = TextSize::from(offset as u32);
            let pos = index.position(&text, offset);
            prop_assert_eq!(index.offset(&text, pos), Ok(offset));
        }
    }
}
