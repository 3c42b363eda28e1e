//! Resolving a request range to syntax.

use vega_core::{Range, TextSize};
use vega_syntax::{NodeId, NodeKind, ParsedFile, Pos, TokenKind};
use vega_types::{ObjId, Program, SelectionKind, Type};

use crate::RefactorError;

/// A byte range of one file with the chain of nodes enclosing it.
#[derive(Debug, Clone)]
pub struct Selection<'f> {
    pub file: &'f ParsedFile,
    pub start: TextSize,
    pub end: TextSize,
    /// Innermost first, ending at the file root.
    pub path: Vec<NodeId>,
    /// The innermost node spans exactly the (whitespace-trimmed) range.
    pub exact: bool,
}

impl<'f> Selection<'f> {
    pub fn new(file: &'f ParsedFile, start: Pos, end: Pos) -> Result<Self, RefactorError> {
        let (Some(s), Some(e)) = (file.offset(start), file.offset(end)) else {
            return Err(RefactorError::Bug(format!("position outside {}", file.file)));
        };
        if e < s {
            return Err(RefactorError::Bug("inverted selection".into()));
        }
        Ok(Selection::from_offsets(file, s, e))
    }

    pub fn from_offsets(file: &'f ParsedFile, start: TextSize, end: TextSize) -> Self {
        let (path, exact) = vega_syntax::path_enclosing_interval(&file.tree, &file.text, start, end);
        Selection {
            file,
            start,
            end,
            path,
            exact,
        }
    }

    pub fn innermost(&self) -> NodeId {
        self.path[0]
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn find(&self, pred: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
        vega_syntax::find_on_path(&self.file.tree, &self.path, pred)
    }

    /// The enclosing top-level declaration, if any.
    pub fn top_level_decl(&self) -> Option<NodeId> {
        vega_syntax::path::enclosing_top_level_decl(&self.path)
    }

    /// Import declarations and the package clause are never refactored.
    pub fn in_header(&self) -> bool {
        let tree = &self.file.tree;
        if let NodeKind::File { name, .. } = tree.kind(tree.root()) {
            if self.end <= tree.range(*name).end() {
                return true;
            }
        }
        self.path.iter().any(|&n| {
            matches!(
                tree.kind(n),
                NodeKind::ImportSpec { .. } | NodeKind::GenDecl { tok: TokenKind::Import, .. }
            )
        })
    }
}

/// Convert a protocol range of `file` to token positions.
pub fn range_pos(file: &ParsedFile, range: Range) -> Result<(Pos, Pos), RefactorError> {
    Ok(file.range_pos(range)?)
}

/// The function parameter under a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSite {
    pub decl: NodeId,
    pub field: NodeId,
    pub name: Option<NodeId>,
    /// Flattened index among the parameters; `None` when the range covers a
    /// field that declares several names without selecting one.
    pub index: Option<usize>,
}

/// The parameter of a function declaration selected by `[start, end)`.
pub fn find_parameter(file: &ParsedFile, start: TextSize, end: TextSize) -> Option<ParamSite> {
    let selection = Selection::from_offsets(file, start, end);
    let tree = &file.tree;
    let ident = selection.find(|k| matches!(k, NodeKind::Ident { .. }));
    let field = selection.find(|k| matches!(k, NodeKind::Field { .. }))?;
    let decl = selection.find(|k| matches!(k, NodeKind::FuncDecl { .. }))?;
    let NodeKind::FuncDecl { ty, .. } = tree.kind(decl) else {
        return None;
    };
    let NodeKind::FuncType { params, .. } = tree.kind(*ty) else {
        return None;
    };
    let NodeKind::FieldList { fields, .. } = tree.kind(*params) else {
        return None;
    };
    let field_idx = fields.iter().position(|f| *f == field)?;
    let mut index: usize = fields[..field_idx].iter().map(|f| field_arity(file, *f)).sum();
    let NodeKind::Field { names, .. } = tree.kind(field) else {
        return None;
    };
    let name = ident.and_then(|id| names.iter().position(|n| *n == id).map(|i| (i, id)));
    let (name, index) = match name {
        Some((i, id)) => {
            index += i;
            (Some(id), Some(index))
        }
        None if names.len() <= 1 => (names.first().copied(), Some(index)),
        None => (None, None),
    };
    Some(ParamSite {
        decl,
        field,
        name,
        index,
    })
}

/// Number of parameters a `Field` declares.
pub(crate) fn field_arity(file: &ParsedFile, field: NodeId) -> usize {
    match file.tree.kind(field) {
        NodeKind::Field { names, .. } => names.len().max(1),
        _ => 0,
    }
}

/// A call whose callee is statically known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCall {
    pub call: NodeId,
    pub callee: ObjId,
}

/// The innermost call around the selection whose opening parenthesis is on
/// the selection's line, provided its callee is a declared function or a
/// concrete method.
pub fn enclosing_static_call(
    program: &Program,
    file: &ParsedFile,
    start: TextSize,
    end: TextSize,
) -> Result<StaticCall, RefactorError> {
    let selection = Selection::from_offsets(file, start, end);
    let tree = &file.tree;
    let line = file.line_of(start);
    let mut call = None;
    for &n in &selection.path {
        match tree.kind(n) {
            NodeKind::FuncLit { .. } => break,
            NodeKind::Call { lparen, .. } if file.line_of(*lparen) == line => {
                call = Some(n);
                break;
            }
            _ => {}
        }
    }
    let call = call.ok_or_else(|| RefactorError::structural("no enclosing call"))?;
    let NodeKind::Call { fun, .. } = tree.kind(call) else {
        return Err(RefactorError::structural("no enclosing call"));
    };
    let fun = tree.unparen(*fun);
    let callee = match tree.kind(fun) {
        NodeKind::Ident { .. } => program.object_of(file, fun),
        NodeKind::Selector { sel, .. } => {
            match program.info().selections.get(&vega_types::NodeKey::new(file, fun)) {
                Some(sel_info) => {
                    let recv = program.types().deref(sel_info.recv).0;
                    let interface = matches!(program.types().get(program.types().underlying(recv)), Type::Interface(_));
                    if sel_info.kind != SelectionKind::MethodVal || interface {
                        return Err(RefactorError::structural("not a static function call"));
                    }
                    Some(sel_info.obj)
                }
                None => program.object_of(file, *sel),
            }
        }
        NodeKind::Index { x, .. } => program.object_of(file, tree.unparen(*x)),
        _ => None,
    };
    match callee {
        Some(obj) if program.obj(obj).is_func() => Ok(StaticCall { call, callee: obj }),
        _ => Err(RefactorError::structural("not a static function call")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vega_core::FileId;

    fn parsed(src: &str) -> ParsedFile {
        ParsedFile::parse(FileId::new("/ws/a.go"), 1, src)
    }

    fn at(src: &str, needle: &str) -> TextSize {
        TextSize::from(src.find(needle).unwrap() as u32)
    }

    #[test]
    fn parameter_index_counts_grouped_names() {
        let src = "package p\n\nfunc F(a, b int, c string) {}\n";
        let file = parsed(src);
        let c = at(src, "c string");
        let site = find_parameter(&file, c, c).unwrap();
        assert_eq!(site.index, Some(2));
        let b = at(src, "b int");
        assert_eq!(find_parameter(&file, b, b).unwrap().index, Some(1));
    }

    #[test]
    fn parameter_type_of_grouped_field_has_no_index() {
        let src = "package p\n\nfunc F(a, b int) {}\n";
        let file = parsed(src);
        let ty = at(src, "int");
        let site = find_parameter(&file, ty, ty).unwrap();
        assert_eq!(site.index, None);
        assert_eq!(site.name, None);
    }

    #[test]
    fn results_are_not_parameters() {
        let src = "package p\n\nfunc F() (r int) { return 0 }\n";
        let file = parsed(src);
        let r = at(src, "r int");
        assert_eq!(find_parameter(&file, r, r), None);
    }

    #[test]
    fn header_is_not_refactorable() {
        let src = "package p\n\nimport \"fmt\"\n\nvar _ = fmt.Sprint\n";
        let file = parsed(src);
        let fmt = at(src, "\"fmt\"");
        assert!(Selection::from_offsets(&file, fmt, fmt).in_header());
        let pkg = at(src, "p\n");
        assert!(Selection::from_offsets(&file, pkg, pkg).in_header());
        let var = at(src, "var");
        assert!(!Selection::from_offsets(&file, var, var).in_header());
    }
}
