use std::sync::Arc;

use text_size::{TextRange, TextSize};
use vega_core::{FileId, LineIndex, Position, PositionError, Range};

use crate::ast::{NodeId, SyntaxTree};
use crate::file_set::Pos;
use crate::token::{Token, TokenKind};
use crate::ParseError;

/// Bidirectional mapping between byte offsets and protocol positions for one
/// document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper {
    text: Arc<str>,
    index: LineIndex,
}

impl Mapper {
    pub fn new(text: Arc<str>) -> Self {
        let index = LineIndex::new(&text);
        Mapper { text, index }
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.index
    }

    pub fn offset_of(&self, position: Position) -> Result<TextSize, PositionError> {
        self.index.offset(&self.text, position)
    }

    pub fn position_of(&self, offset: TextSize) -> Result<Position, PositionError> {
        self.index.try_position(&self.text, offset)
    }

    pub fn range_of(&self, start: TextSize, end: TextSize) -> Result<Range, PositionError> {
        Ok(Range::new(self.position_of(start)?, self.position_of(end)?))
    }

    pub fn text_range(&self, range: Range) -> Result<TextRange, PositionError> {
        self.index.text_range(&self.text, range)
    }

    pub fn node_range(&self, tree: &SyntaxTree, node: NodeId) -> Result<Range, PositionError> {
        let range = tree.range(node);
        self.range_of(range.start(), range.end())
    }
}

/// An immutable parsed Go file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub file: FileId,
    /// Base of this file in the snapshot's [`crate::FileSet`].
    pub base: u32,
    pub text: Arc<str>,
    /// All tokens, including comments and implicit semicolons.
    pub tokens: Vec<Token>,
    pub tree: SyntaxTree,
    pub errors: Vec<ParseError>,
    /// The parser repaired the input (synthesized nodes or delimiters).
    pub fixed: bool,
    pub mapper: Mapper,
}

impl ParsedFile {
    pub fn parse(file: FileId, base: u32, text: impl Into<Arc<str>>) -> ParsedFile {
        let text: Arc<str> = text.into();
        let parse = crate::parse(&text);
        tracing::trace!(
            target: "vega.syntax",
            file = %file,
            errors = parse.errors.len(),
            "parsed file"
        );
        ParsedFile {
            mapper: Mapper::new(text.clone()),
            file,
            base,
            text,
            tokens: parse.tokens,
            tree: parse.tree,
            errors: parse.errors,
            fixed: parse.fixed,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn pos(&self, offset: TextSize) -> Pos {
        Pos::new(self.base, offset)
    }

    /// Byte offset of `pos`, if it lies within this file.
    pub fn offset(&self, pos: Pos) -> Option<TextSize> {
        let raw = pos.raw().checked_sub(self.base)?;
        (raw <= self.text.len() as u32).then(|| TextSize::from(raw))
    }

    pub fn contains_pos(&self, pos: Pos) -> bool {
        pos.is_valid() && self.offset(pos).is_some()
    }

    pub fn node_pos(&self, node: NodeId) -> (Pos, Pos) {
        let range = self.tree.range(node);
        (self.pos(range.start()), self.pos(range.end()))
    }

    pub fn text_of(&self, node: NodeId) -> &str {
        &self.text[self.tree.range(node)]
    }

    pub fn slice(&self, range: TextRange) -> &str {
        &self.text[range]
    }

    /// Protocol range to token positions.
    pub fn range_pos(&self, range: Range) -> Result<(Pos, Pos), PositionError> {
        let range = self.mapper.text_range(range)?;
        Ok((self.pos(range.start()), self.pos(range.end())))
    }

    /// The non-comment token containing `offset` (a token's end counts as inside).
    pub fn token_at(&self, offset: TextSize) -> Option<&Token> {
        let idx = self
            .tokens
            .partition_point(|t| t.range.end() < offset);
        self.tokens[idx..]
            .iter()
            .take_while(|t| t.range.start() <= offset)
            .find(|t| !t.implicit && t.kind != TokenKind::Comment && t.kind != TokenKind::Eof)
    }

    /// Comment tokens overlapping `range`.
    pub fn comments_in(&self, range: TextRange) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(move |t| {
            t.kind == TokenKind::Comment
                && t.range.start() < range.end()
                && range.start() < t.range.end()
        })
    }

    /// Indentation (leading tabs and spaces) of the line containing `offset`.
    pub fn indent_at(&self, offset: TextSize) -> &str {
        let start = usize::from(self.mapper.line_index().line_start_of(offset));
        let line = &self.text[start..];
        let len = line
            .bytes()
            .take_while(|b| *b == b'\t' || *b == b' ')
            .count();
        &line[..len]
    }

    pub fn line_of(&self, offset: TextSize) -> u32 {
        self.mapper.line_index().line_of(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_round_trip_through_the_mapper() {
        let pf = ParsedFile::parse(
            FileId::new("/p/a.go"),
            10,
            "package p\n\nvar s = \"é\"\n",
        );
        assert!(!pf.has_errors());
        let (start, end) = pf.range_pos(Range::new(Position::new(2, 8), Position::new(2, 11))).unwrap();
        assert_eq!(pf.offset(start), Some(TextSize::from(19)));
        assert_eq!(pf.offset(end), Some(TextSize::from(23)));
        assert_eq!(pf.mapper.position_of(TextSize::from(23)).unwrap(), Position::new(2, 11));
        assert!(pf.mapper.position_of(TextSize::from(99)).is_err());
    }

    #[test]
    fn token_at_prefers_the_token_ending_at_the_cursor() {
        let pf = ParsedFile::parse(FileId::new("/p/a.go"), 1, "package p\nvar xy = 1\n");
        let tok = pf.token_at(TextSize::from(16)).unwrap();
        assert_eq!(tok.text(&pf.text), "xy");
    }
}
