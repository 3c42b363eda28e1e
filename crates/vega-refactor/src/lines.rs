//! Split a bracketed list onto one line per item, or join it back.

use vega_core::{TextRange, TextSize};
use vega_syntax::{NodeId, NodeKind, ParsedFile, Pos, SyntaxTree};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::selection::Selection;
use crate::RefactorError;

/// A parenthesized or braced list with at least one item.
#[derive(Debug)]
struct ItemList {
    open: TextSize,
    close: TextSize,
    /// Item ranges, in order.
    items: Vec<TextRange>,
    what: &'static str,
}

fn list_of(tree: &SyntaxTree, node: NodeId) -> Option<ItemList> {
    let (open, close, items, what) = match tree.kind(node) {
        NodeKind::FieldList {
            open: Some(open),
            fields,
            close: Some(close),
        } => {
            let what = match tree.parent(node).map(|p| tree.kind(p)) {
                Some(NodeKind::FuncType { results: Some(r), .. }) if *r == node => "results",
                Some(NodeKind::FuncType { .. }) => "parameters",
                _ => return None,
            };
            let items = fields.iter().map(|&f| tree.range(f)).collect();
            (*open, *close, items, what)
        }
        NodeKind::Call {
            lparen,
            args,
            ellipsis,
            rparen,
            ..
        } => {
            let mut items: Vec<TextRange> = args.iter().map(|&a| tree.range(a)).collect();
            if let (Some(dots), Some(last)) = (ellipsis, items.last_mut()) {
                *last = TextRange::new(last.start(), *dots + TextSize::from(3));
            }
            (*lparen, *rparen, items, "arguments")
        }
        NodeKind::CompositeLit { lbrace, elts, rbrace, .. } => {
            let items = elts.iter().map(|&e| tree.range(e)).collect();
            (*lbrace, *rbrace, items, "elements")
        }
        _ => return None,
    };
    Some(ItemList {
        open,
        close,
        items,
        what,
    })
    .filter(|l| !l.items.is_empty())
}

/// The innermost list whose brackets enclose `[start, end)`.
fn enclosing_list(file: &ParsedFile, start: TextSize, end: TextSize) -> Option<ItemList> {
    let selection = Selection::from_offsets(file, start, end);
    selection.path.iter().find_map(|&n| {
        list_of(&file.tree, n).filter(|l| l.open < start && end <= l.close)
    })
}

impl ItemList {
    fn is_split(&self, file: &ParsedFile) -> bool {
        let mut prev_line = file.line_of(self.open);
        for item in &self.items {
            let line = file.line_of(item.start());
            if line == prev_line {
                return false;
            }
            prev_line = file.line_of(item.end());
        }
        file.line_of(self.close) != prev_line
    }

    fn is_joined(&self, file: &ParsedFile) -> bool {
        file.line_of(self.open) == file.line_of(self.close)
    }

    /// Each item with the block comments preceding it, and the comments
    /// after the last item.
    fn pieces(&self, file: &ParsedFile) -> Result<(Vec<String>, Vec<String>), RefactorError> {
        let inner = TextRange::new(self.open + TextSize::from(1), self.close);
        for comment in file.comments_in(inner) {
            if comment.text(&file.text).starts_with("//") {
                return Err(RefactorError::structural("the list contains line comments"));
            }
        }
        let mut gap_start = inner.start();
        let mut pieces = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let mut piece: Vec<&str> = file
                .comments_in(TextRange::new(gap_start, item.start()))
                .map(|c| c.text(&file.text))
                .collect();
            piece.push(file.slice(*item));
            pieces.push(piece.join(" "));
            gap_start = item.end();
        }
        let trailing = file
            .comments_in(TextRange::new(gap_start, self.close))
            .map(|c| c.text(&file.text).to_string())
            .collect();
        Ok((pieces, trailing))
    }

    fn inner_pos(&self, file: &ParsedFile) -> (Pos, Pos) {
        (file.pos(self.open + TextSize::from(1)), file.pos(self.close))
    }
}

fn split_text(indent: &str, pieces: &[String], trailing: &[String]) -> String {
    let mut out = String::from("\n");
    for piece in pieces {
        out.push_str(&format!("{indent}\t{piece},\n"));
    }
    for comment in trailing {
        out.push_str(&format!("{indent}\t{comment}\n"));
    }
    out.push_str(indent);
    out
}

fn join_text(pieces: &[String], trailing: &[String]) -> String {
    let mut out = pieces.join(", ");
    for comment in trailing {
        out.push(' ');
        out.push_str(comment);
    }
    out
}

/// Which of split and join apply at the selection.
pub fn probe_lines(input: &FileInput<'_>) -> Result<(bool, bool), RefactorError> {
    let file = input.file;
    let (Some(start), Some(end)) = (file.offset(input.start), file.offset(input.end)) else {
        return Ok((false, false));
    };
    let Some(list) = enclosing_list(file, start, end) else {
        return Ok((false, false));
    };
    if list.pieces(file).is_err() {
        return Ok((false, false));
    }
    Ok((!list.is_split(file), !list.is_joined(file)))
}

fn target(input: &FileInput<'_>) -> Result<ItemList, RefactorError> {
    let file = input.file;
    let (Some(start), Some(end)) = (file.offset(input.start), file.offset(input.end)) else {
        return Err(RefactorError::Bug("selection outside the file".into()));
    };
    enclosing_list(file, start, end).ok_or_else(|| RefactorError::structural("no list encloses the selection"))
}

pub(crate) fn split_lines(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let file = input.file;
    let list = target(input)?;
    if list.is_split(file) {
        return Ok(None);
    }
    let (pieces, trailing) = list.pieces(file)?;
    let indent = file.indent_at(list.open);
    let (start, end) = list.inner_pos(file);
    Ok(Some(SuggestedFix::new(
        format!("Split {} into separate lines", list.what),
        vec![Edit::replace(start, end, split_text(indent, &pieces, &trailing))],
    )))
}

pub(crate) fn join_lines(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let file = input.file;
    let list = target(input)?;
    if list.is_joined(file) {
        return Ok(None);
    }
    let (pieces, trailing) = list.pieces(file)?;
    let (start, end) = list.inner_pos(file);
    Ok(Some(SuggestedFix::new(
        format!("Join {} into one line", list.what),
        vec![Edit::replace(start, end, join_text(&pieces, &trailing))],
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vega_core::FileId;

    fn list_at(src: &str, marker: &str) -> (ParsedFile, ItemList) {
        let file = ParsedFile::parse(FileId::new("/ws/a.go"), 1, src);
        let at = TextSize::from(src.find(marker).unwrap() as u32);
        let list = enclosing_list(&file, at, at).unwrap();
        (file, list)
    }

    #[test]
    fn splits_call_arguments_one_level_deeper() {
        let src = "package p\n\nfunc f() {\n\tg(a, b...)\n}\n";
        let (file, list) = list_at(src, "a,");
        assert_eq!(list.what, "arguments");
        assert!(!list.is_split(&file));
        let (pieces, trailing) = list.pieces(&file).unwrap();
        assert_eq!(pieces, vec!["a".to_string(), "b...".to_string()]);
        assert_eq!(split_text(file.indent_at(list.open), &pieces, &trailing), "\n\t\ta,\n\t\tb...,\n\t");
    }

    #[test]
    fn joins_parameters_keeping_block_comments() {
        let src = "package p\n\nfunc f(\n\ta int, /* x */\n\tb string,\n) {}\n";
        let (file, list) = list_at(src, "a int");
        assert_eq!(list.what, "parameters");
        assert!(list.is_split(&file));
        let (pieces, trailing) = list.pieces(&file).unwrap();
        assert_eq!(join_text(&pieces, &trailing), "a int, /* x */ b string");
    }

    #[test]
    fn line_comments_disqualify() {
        let src = "package p\n\nvar x = []int{\n\t1, // one\n\t2,\n}\n";
        let (file, list) = list_at(src, "1,");
        assert!(list.pieces(&file).unwrap_err().is_refusal());
    }
}
