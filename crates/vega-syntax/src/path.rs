//! Enclosing-node search.

use text_size::{TextRange, TextSize};

use crate::ast::{NodeId, NodeKind, SyntaxTree};

/// The chain of nodes enclosing `[start, end)`, innermost first and ending at
/// the file root, plus whether the innermost node spans exactly the interval
/// (ignoring surrounding whitespace).
///
/// A node encloses the interval when `node.start <= start && end <= node.end`,
/// so a cursor at either boundary of a node belongs to it. When two siblings
/// both qualify (the cursor sits between adjacent tokens) the earlier one wins.
pub fn path_enclosing_interval(
    tree: &SyntaxTree,
    src: &str,
    start: TextSize,
    end: TextSize,
) -> (Vec<NodeId>, bool) {
    let (start, end) = trim_interval(src, start, end);
    let interval = TextRange::new(start, end.max(start));

    let mut path = vec![tree.root()];
    let mut current = tree.root();
    'descend: loop {
        for child in tree.children(current) {
            let range = tree.range(child);
            if range.is_empty() {
                continue;
            }
            if range.start() <= interval.start() && interval.end() <= range.end() {
                path.push(child);
                current = child;
                continue 'descend;
            }
        }
        break;
    }
    path.reverse();

    let innermost = path[0];
    let exact = tree.range(innermost) == interval && !interval.is_empty();
    (path, exact)
}

fn trim_interval(src: &str, start: TextSize, end: TextSize) -> (TextSize, TextSize) {
    if start >= end {
        return (start, end);
    }
    let text = &src[usize::from(start)..usize::from(end)];
    let lead = text.len() - text.trim_start().len();
    let trail = text.len() - text.trim_end().len();
    if lead == text.len() {
        return (start, start);
    }
    (
        start + TextSize::from(lead as u32),
        end - TextSize::from(trail as u32),
    )
}

/// The innermost node on `path` satisfying `pred`.
pub fn find_on_path(
    tree: &SyntaxTree,
    path: &[NodeId],
    pred: impl Fn(&NodeKind) -> bool,
) -> Option<NodeId> {
    path.iter().copied().find(|&id| pred(tree.kind(id)))
}

/// The `FuncDecl` enclosing `path`, if any.
pub fn enclosing_func_decl(tree: &SyntaxTree, path: &[NodeId]) -> Option<NodeId> {
    find_on_path(tree, path, |k| matches!(k, NodeKind::FuncDecl { .. }))
}

/// The top-level declaration on `path` (the child of the file root).
pub fn enclosing_top_level_decl(path: &[NodeId]) -> Option<NodeId> {
    (path.len() >= 2).then(|| path[path.len() - 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn path_kinds(src: &str, start: u32, end: u32) -> (Vec<&'static str>, bool) {
        let parse = parse(src);
        let (path, exact) = path_enclosing_interval(
            &parse.tree,
            src,
            TextSize::from(start),
            TextSize::from(end),
        );
        let kinds = path
            .iter()
            .map(|&id| match parse.tree.kind(id) {
                NodeKind::Ident { .. } => "Ident",
                NodeKind::Binary { .. } => "Binary",
                NodeKind::Return { .. } => "Return",
                NodeKind::Block { .. } => "Block",
                NodeKind::FuncDecl { .. } => "FuncDecl",
                NodeKind::File { .. } => "File",
                NodeKind::BasicLit { .. } => "BasicLit",
                _ => "Other",
            })
            .collect();
        (kinds, exact)
    }

    #[test]
    fn exact_binary_operand() {
        let src = "package p; func f(x int) int { return x*2 + 1 }";
        let start = src.find("x*2").unwrap() as u32;
        let (kinds, exact) = path_kinds(src, start, start + 3);
        assert_eq!(
            kinds,
            vec!["Binary", "Binary", "Return", "Block", "FuncDecl", "File"]
        );
        assert!(exact);
    }

    #[test]
    fn cursor_at_identifier_end_belongs_to_identifier() {
        let src = "package p; func f(x int) int { return x }";
        let at = src.rfind('x').unwrap() as u32 + 1;
        let (kinds, exact) = path_kinds(src, at, at);
        assert_eq!(kinds[0], "Ident");
        assert!(!exact);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let src = "package p; var v = 1 + 2";
        let start = src.find("1 +").unwrap() as u32 - 1;
        let end = src.len() as u32;
        let (kinds, exact) = path_kinds(src, start, end);
        assert_eq!(kinds[0], "Binary");
        assert!(exact);
    }
}
