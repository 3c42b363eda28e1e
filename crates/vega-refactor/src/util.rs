//! Syntax and scope helpers shared by the refactorings.

use vega_core::{TextRange, TextSize};
use vega_syntax::{NodeId, NodeKind, ParsedFile, Pos, Printer, SyntaxTree, TokenKind};
use vega_types::{Builtin, Mode, NodeKey, ObjId, ObjKind, Program, ScopeId, ScopeKind, Signature};

/// All identifiers in the subtree of `node`, in source order.
pub(crate) fn idents(tree: &SyntaxTree, node: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    tree.walk(node, &mut |n| {
        if matches!(tree.kind(n), NodeKind::Ident { .. }) {
            out.push(n);
        }
        true
    });
    out
}

/// Nodes of the subtree of `node` matching `pred`, without descending into
/// function literals.
pub(crate) fn collect_outside_func_lits(
    tree: &SyntaxTree,
    node: NodeId,
    pred: impl Fn(&NodeKind) -> bool,
) -> Vec<NodeId> {
    let mut out = Vec::new();
    tree.walk(node, &mut |n| {
        if n != node && matches!(tree.kind(n), NodeKind::FuncLit { .. }) {
            return false;
        }
        if pred(tree.kind(n)) {
            out.push(n);
        }
        true
    });
    out
}

pub(crate) fn encloses(tree: &SyntaxTree, outer: NodeId, inner: NodeId) -> bool {
    tree.range(outer).contains_range(tree.range(inner))
}

/// A statement within a statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StmtSite {
    pub stmt: NodeId,
    /// The `Block`, `CaseClause` or `CommClause` owning the list.
    pub owner: NodeId,
    pub index: usize,
}

/// Statement lists live in blocks and in case clauses; the block of a
/// switch or select holds clauses, not statements.
pub(crate) fn stmt_list(tree: &SyntaxTree, owner: NodeId) -> &[NodeId] {
    match tree.kind(owner) {
        NodeKind::Block { stmts, .. } if !is_clause_block(tree, owner) => stmts,
        NodeKind::CaseClause { body, .. } | NodeKind::CommClause { body, .. } => body,
        _ => &[],
    }
}

fn is_clause_block(tree: &SyntaxTree, block: NodeId) -> bool {
    tree.parent(block).is_some_and(|p| {
        matches!(
            tree.kind(p),
            NodeKind::Switch { .. } | NodeKind::TypeSwitch { .. } | NodeKind::Select { .. }
        )
    })
}

/// The innermost statement-list entry containing `node`. Conditions and
/// init statements of `if`, `for` and `switch` resolve to the head
/// statement, so code inserted before the site runs before them.
pub(crate) fn enclosing_stmt(tree: &SyntaxTree, node: NodeId) -> Option<StmtSite> {
    let mut current = node;
    loop {
        let parent = tree.parent(current)?;
        if matches!(tree.kind(parent), NodeKind::FuncDecl { .. } | NodeKind::File { .. }) {
            return None;
        }
        if let Some(index) = stmt_list(tree, parent).iter().position(|s| *s == current) {
            return Some(StmtSite {
                stmt: current,
                owner: parent,
                index,
            });
        }
        current = parent;
    }
}

/// The innermost function (declaration or literal) on `path`.
pub(crate) fn enclosing_func(tree: &SyntaxTree, path: &[NodeId]) -> Option<NodeId> {
    path.iter()
        .copied()
        .find(|&n| matches!(tree.kind(n), NodeKind::FuncDecl { .. } | NodeKind::FuncLit { .. }))
}

/// The `FuncType` and body of a function node.
pub(crate) fn func_parts(tree: &SyntaxTree, func: NodeId) -> Option<(NodeId, Option<NodeId>)> {
    match tree.kind(func) {
        NodeKind::FuncDecl { ty, body, .. } => Some((*ty, *body)),
        NodeKind::FuncLit { ty, body } => Some((*ty, Some(*body))),
        _ => None,
    }
}

/// The checked signature of a function declaration or literal.
pub(crate) fn func_signature(program: &Program, file: &ParsedFile, func: NodeId) -> Option<Signature> {
    let ty = match file.tree.kind(func) {
        NodeKind::FuncDecl { .. } => program.obj(program.func_of_decl(file, func)?).ty,
        _ => program.type_of(file, func)?,
    };
    program.types().signature(ty).cloned()
}

/// Whether a function declaration has type parameters, directly or through
/// its receiver.
pub(crate) fn is_generic_func(program: &Program, file: &ParsedFile, decl: NodeId) -> bool {
    let Some(sig) = func_signature(program, file, decl) else {
        return false;
    };
    if !sig.type_params.is_empty() {
        return true;
    }
    sig.recv.as_ref().is_some_and(|recv| {
        let types = program.types();
        types
            .named(types.deref(recv.ty).0)
            .is_some_and(|named| !named.type_params.is_empty() || !named.type_args.is_empty())
    })
}

/// Whether `obj` is declared inside a function.
pub(crate) fn is_local(program: &Program, obj: ObjId) -> bool {
    program
        .obj(obj)
        .parent
        .is_some_and(|s| matches!(program.scope(s).kind(), ScopeKind::Func | ScopeKind::Block))
}

/// Copy `text` (which starts at offset `base` of its file) with the given
/// non-overlapping file ranges replaced.
pub(crate) fn splice(text: &str, base: TextSize, mut replacements: Vec<(TextRange, String)>) -> String {
    replacements.sort_by_key(|(r, _)| r.start());
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for (range, new_text) in replacements {
        let start = usize::from(range.start() - base);
        let end = usize::from(range.end() - base);
        if start < cursor {
            continue;
        }
        out.push_str(&text[cursor..start]);
        out.push_str(&new_text);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Whether evaluating `node` may have side effects: calls other than
/// conversions and pure builtins, and channel receives.
pub(crate) fn has_effects(program: &Program, file: &ParsedFile, node: NodeId) -> bool {
    let tree = &file.tree;
    let mut effects = false;
    tree.walk(node, &mut |n| {
        if effects {
            return false;
        }
        match tree.kind(n) {
            NodeKind::FuncLit { .. } => return false,
            NodeKind::Unary {
                op: TokenKind::Arrow, ..
            } => effects = true,
            NodeKind::Call { fun, .. } => {
                let fun = tree.unparen(*fun);
                let conversion = program
                    .info()
                    .types
                    .get(&NodeKey::new(file, fun))
                    .is_some_and(|tv| tv.mode == Mode::TypeExpr);
                let pure_builtin = program.object_of(file, fun).is_some_and(|obj| {
                    matches!(
                        program.obj(obj).kind,
                        ObjKind::Builtin(
                            Builtin::Len
                                | Builtin::Cap
                                | Builtin::Real
                                | Builtin::Imag
                                | Builtin::Complex
                                | Builtin::Min
                                | Builtin::Max
                                | Builtin::Make
                                | Builtin::New
                        )
                    )
                });
                if !conversion && !pure_builtin {
                    effects = true;
                }
            }
            _ => {}
        }
        true
    });
    effects
}

/// Identifiers, literals and constants may be evaluated any number of times.
pub(crate) fn is_duplicable(program: &Program, file: &ParsedFile, node: NodeId) -> bool {
    let tree = &file.tree;
    let node = tree.unparen(node);
    match tree.kind(node) {
        NodeKind::Ident { .. } | NodeKind::BasicLit { .. } => true,
        NodeKind::Selector { x, .. } => program
            .object_of(file, tree.unparen(*x))
            .is_some_and(|obj| program.obj(obj).is_pkg_name()),
        _ => matches!(
            program.info().types.get(&NodeKey::new(file, node)).map(|tv| &tv.mode),
            Some(Mode::Constant(_))
        ),
    }
}

/// gofmt spelling of a single-line expression; multi-line expressions keep
/// their source layout.
pub(crate) fn expr_text(file: &ParsedFile, node: NodeId) -> String {
    let source = file.text_of(node);
    if source.contains('\n') {
        source.to_string()
    } else {
        Printer::new(&file.tree, &file.text).print_expr(node)
    }
}

/// Start of the line containing `offset`.
pub(crate) fn line_start(file: &ParsedFile, offset: TextSize) -> TextSize {
    file.mapper.line_index().line_start_of(offset)
}

/// Whether only blanks precede `offset` on its line.
pub(crate) fn starts_line(file: &ParsedFile, offset: TextSize) -> bool {
    let start = line_start(file, offset);
    file.text[usize::from(start)..usize::from(offset)]
        .bytes()
        .all(|b| b == b' ' || b == b'\t')
}

/// End of the line containing `offset`, after its newline.
pub(crate) fn line_end_inclusive(file: &ParsedFile, offset: TextSize) -> TextSize {
    let rest = &file.text[usize::from(offset)..];
    match rest.find('\n') {
        Some(i) => offset + TextSize::from(i as u32 + 1),
        None => TextSize::of(&*file.text),
    }
}

/// Re-indent the lines after the first from `from` to `to`.
pub(crate) fn reindent(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if line.trim().is_empty() {
                continue;
            }
            out.push_str(to);
            out.push_str(line.strip_prefix(from).unwrap_or(line));
        } else {
            out.push_str(line);
        }
    }
    out
}

pub(crate) fn is_keyword(name: &str) -> bool {
    TokenKind::keyword(name).is_some()
}

/// `base`, or `base` with the smallest numeric suffix, such that the name
/// neither resolves at `pos` from `scope` nor is declared in `scope` or any
/// scope nested in it, and is not one of `taken`.
pub(crate) fn fresh_name(program: &Program, scope: ScopeId, pos: Pos, base: &str, taken: &[String]) -> String {
    (0..)
        .map(|n| if n == 0 { base.to_string() } else { format!("{base}{n}") })
        .find(|name| {
            !is_keyword(name)
                && !taken.contains(name)
                && program.lookup_parent(scope, name, pos).is_none()
                && program.is_free_in_subtree(scope, name)
        })
        .unwrap_or_else(|| base.to_string())
}

/// Lower-case the first letter of `name`.
pub(crate) fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-case the first letter of `name`.
pub(crate) fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vega_core::FileId;

    #[test]
    fn reindent_moves_nested_lines() {
        assert_eq!(reindent("if x {\n\t\ty()\n\t}", "\t", ""), "if x {\n\ty()\n}");
        assert_eq!(reindent("a\n\n\tb", "\t", "\t\t"), "a\n\n\t\tb");
    }

    #[test]
    fn case_clause_conditions_resolve_to_the_switch() {
        let src = "package p\n\nfunc f(x int) {\n\tswitch x {\n\tcase 1:\n\t\tx++\n\t}\n}\n";
        let file = ParsedFile::parse(FileId::new("/ws/a.go"), 1, src);
        let tree = &file.tree;
        let one = TextSize::from(src.find("1:").unwrap() as u32);
        let (path, _) = vega_syntax::path_enclosing_interval(tree, src, one, one);
        let site = enclosing_stmt(tree, path[0]).unwrap();
        assert!(matches!(tree.kind(site.stmt), NodeKind::Switch { .. }));

        let inc = TextSize::from(src.find("x++").unwrap() as u32);
        let (path, _) = vega_syntax::path_enclosing_interval(tree, src, inc, inc);
        let site = enclosing_stmt(tree, path[0]).unwrap();
        assert!(matches!(tree.kind(site.stmt), NodeKind::IncDec { .. }));
        assert!(matches!(tree.kind(site.owner), NodeKind::CaseClause { .. }));
    }

    #[test]
    fn splice_replaces_ranges_relative_to_base() {
        let text = "return a, b";
        let base = TextSize::from(10);
        let a = TextRange::at(TextSize::from(17), TextSize::from(1));
        let b = TextRange::at(TextSize::from(20), TextSize::from(1));
        let out = splice(text, base, vec![(b, "y".into()), (a, "x".into())]);
        assert_eq!(out, "return x, y");
    }

    #[test]
    fn case_helpers() {
        assert_eq!(lower_first("Reader"), "reader");
        assert_eq!(upper_first("value"), "Value");
        assert!(is_keyword("func"));
        assert!(!is_keyword("newVar"));
    }
}
