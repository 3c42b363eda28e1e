//! Extract variable and extract constant.

use std::mem::discriminant;

use vega_syntax::{NodeId, NodeKind, ParsedFile, SyntaxTree, TokenKind};
use vega_types::{BasicKind, Mode, NodeKey, ObjId, Program, Type};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::util::{self, StmtSite};
use crate::RefactorError;

/// What extracting the selected expression would produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractProbe {
    pub constant: bool,
    /// Occurrences in the enclosing function, the selection included.
    pub occurrences: usize,
}

struct Target {
    expr: NodeId,
    constant: bool,
    arity: usize,
}

enum Anchor {
    Stmt(StmtSite),
    /// A package-level declaration; the binding goes right above it.
    Decl(NodeId),
}

pub fn probe_extract_variable(input: &FileInput<'_>) -> Result<ExtractProbe, RefactorError> {
    let target = target(input)?;
    let occurrences = occurrences(input, &target, true).len();
    Ok(ExtractProbe {
        constant: target.constant,
        occurrences,
    })
}

pub(crate) fn extract_variable(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    extract(input, false).map(Some)
}

pub(crate) fn extract_variable_all(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    extract(input, true).map(Some)
}

fn extract(input: &FileInput<'_>, all: bool) -> Result<SuggestedFix, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let target = target(input)?;
    let occs = occurrences(input, &target, all);
    let anchor = anchor(file, &occs)?;

    let insert_at = match &anchor {
        Anchor::Stmt(site) => tree.range(site.stmt).start(),
        Anchor::Decl(decl) => tree
            .doc_comment(&file.text, *decl)
            .map_or_else(|| tree.range(*decl).start(), |doc| doc.range().start()),
    };
    let insert_pos = file.pos(insert_at);
    let scope = match anchor {
        Anchor::Stmt(_) => program.scope_at(file, insert_pos),
        Anchor::Decl(_) => program.file_scope(file),
    }
    .ok_or_else(|| RefactorError::Bug(format!("no scope at {insert_pos:?}")))?;

    for ident in util::idents(tree, target.expr) {
        if is_selected_name(tree, ident) {
            continue;
        }
        let (Some(obj), Some(name)) = (program.object_of(file, ident), tree.ident_name(ident)) else {
            continue;
        };
        if program.lookup_parent(scope, name, insert_pos).map(|(_, o)| o) != Some(obj) {
            return Err(RefactorError::semantic(format!(
                "{name} is not visible where the new declaration would go"
            )));
        }
    }

    let base = if target.constant { "newConst" } else { "newVar" };
    let mut names: Vec<String> = Vec::with_capacity(target.arity);
    for _ in 0..target.arity {
        let name = util::fresh_name(program, scope, insert_pos, base, &names);
        names.push(name);
    }
    let text = util::expr_text(file, target.expr);
    let lhs = names.join(", ");

    let mut edits = Vec::with_capacity(occs.len() + 1);
    match anchor {
        Anchor::Stmt(_) => {
            let decl = if target.constant {
                format!("const {lhs} = {text}")
            } else {
                format!("{lhs} := {text}")
            };
            let indent = file.indent_at(insert_at).to_string();
            if util::starts_line(file, insert_at) {
                let line = util::line_start(file, insert_at);
                edits.push(Edit::insert(file.pos(line), format!("{indent}{decl}\n")));
            } else {
                edits.push(Edit::insert(insert_pos, format!("{decl}\n{indent}")));
            }
        }
        Anchor::Decl(_) => {
            let keyword = if target.constant { "const" } else { "var" };
            edits.push(Edit::insert(insert_pos, format!("{keyword} {lhs} = {text}\n\n")));
        }
    }
    for occ in &occs {
        let (s, e) = file.node_pos(*occ);
        edits.push(Edit::replace(s, e, lhs.clone()));
    }

    tracing::debug!(
        target: "vega.refactor",
        file = %file.file,
        occurrences = occs.len(),
        constant = target.constant,
        "extracting expression"
    );
    let title = match (target.constant, occs.len() > 1) {
        (false, false) => "Extract variable".to_string(),
        (true, false) => "Extract constant".to_string(),
        (false, true) => format!("Extract {} occurrences of {text}", occs.len()),
        (true, true) => format!("Extract {} occurrences of const expression {text}", occs.len()),
    };
    Ok(SuggestedFix::new(title, edits))
}

fn target(input: &FileInput<'_>) -> Result<Target, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    if selection.in_header() {
        return Err(RefactorError::structural("cannot extract from the package clause or imports"));
    }
    if selection.is_empty() || !selection.exact {
        return Err(RefactorError::structural("selection is not an expression"));
    }
    let expr = selection.innermost();
    let kind = tree.kind(expr);
    if !kind.is_expr()
        || matches!(
            kind,
            NodeKind::KeyValue { .. } | NodeKind::Ellipsis { .. } | NodeKind::FuncType { .. } | NodeKind::Bad
        )
    {
        return Err(RefactorError::structural("selection is not an expression"));
    }
    if is_lvalue(program, file, expr) {
        return Err(RefactorError::structural("cannot extract the target of an assignment"));
    }
    let key = NodeKey::new(file, expr);
    if program.info().defs.contains_key(&key) {
        return Err(RefactorError::structural("cannot extract a declared name"));
    }
    let tv = program
        .info()
        .types
        .get(&key)
        .ok_or_else(|| RefactorError::semantic("expression has no type"))?;
    match tv.mode {
        Mode::TypeExpr => return Err(RefactorError::structural("cannot extract a type")),
        Mode::NoValue => return Err(RefactorError::structural("call has no value")),
        Mode::Builtin => return Err(RefactorError::structural("cannot extract a builtin")),
        _ => {}
    }
    let types = program.types();
    let arity = match types.get(tv.ty) {
        Type::Tuple(elems) => elems.len(),
        Type::Basic(BasicKind::UntypedNil) => {
            return Err(RefactorError::structural("cannot extract untyped nil"));
        }
        _ => 1,
    };
    Ok(Target {
        expr,
        constant: matches!(tv.mode, Mode::Constant(_)),
        arity,
    })
}

/// The `sel` of `x.sel` is not an independent expression.
fn is_selected_name(tree: &SyntaxTree, node: NodeId) -> bool {
    tree.parent(node)
        .is_some_and(|p| matches!(tree.kind(p), NodeKind::Selector { sel, .. } if *sel == node))
}

/// Whether `node` is written to, has its address taken, or names something
/// rather than evaluating to a value.
fn is_lvalue(program: &Program, file: &ParsedFile, node: NodeId) -> bool {
    let tree = &file.tree;
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    match tree.kind(parent) {
        NodeKind::Assign { lhs, .. } => lhs.contains(&node),
        NodeKind::IncDec { .. } => true,
        NodeKind::Unary { op: TokenKind::And, .. } => true,
        NodeKind::Range { key, value, tok, .. } => {
            tok.is_some() && (*key == Some(node) || *value == Some(node))
        }
        NodeKind::Selector { sel, x } => *sel == node || (*x == node && is_lvalue(program, file, parent)),
        NodeKind::Index { x, .. } | NodeKind::Slice { x, .. } => *x == node && is_lvalue(program, file, parent),
        NodeKind::Paren { .. } | NodeKind::Star { .. } => is_lvalue(program, file, parent),
        NodeKind::KeyValue { key, .. } if *key == node => program
            .object_of(file, node)
            .is_some_and(|obj| program.obj(obj).is_field()),
        NodeKind::Labeled { label, .. } => *label == node,
        NodeKind::Branch { .. } => true,
        _ => false,
    }
}

/// The selection, plus (for `all`) every other occurrence of the same
/// expression in the enclosing function, in source order.
fn occurrences(input: &FileInput<'_>, target: &Target, all: bool) -> Vec<NodeId> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    if !all {
        return vec![target.expr];
    }
    let path: Vec<NodeId> = std::iter::once(target.expr).chain(tree.ancestors(target.expr)).collect();
    let Some(body) = util::enclosing_func(tree, &path)
        .and_then(|f| util::func_parts(tree, f))
        .and_then(|(_, body)| body)
    else {
        return vec![target.expr];
    };

    let text = util::expr_text(file, target.expr);
    let objects = referenced_objects(program, file, target.expr);
    let kind = discriminant(tree.kind(target.expr));
    let mut out = Vec::new();
    tree.walk(body, &mut |n| {
        if n == target.expr {
            out.push(n);
            return false;
        }
        if matches!(tree.kind(n), NodeKind::FuncLit { .. }) {
            return false;
        }
        if discriminant(tree.kind(n)) == kind
            && !is_lvalue(program, file, n)
            && !is_selected_name(tree, n)
            && util::expr_text(file, n) == text
            && referenced_objects(program, file, n) == objects
        {
            out.push(n);
            return false;
        }
        true
    });
    out.sort_by_key(|n| tree.range(*n).start());
    out
}

fn referenced_objects(program: &Program, file: &ParsedFile, node: NodeId) -> Vec<Option<ObjId>> {
    util::idents(&file.tree, node)
        .into_iter()
        .map(|id| program.object_of(file, id))
        .collect()
}

/// The statement before which the new binding goes: the innermost one whose
/// statement list encloses every occurrence.
fn anchor(file: &ParsedFile, occs: &[NodeId]) -> Result<Anchor, RefactorError> {
    let tree = &file.tree;
    let first = occs[0];
    let Some(mut site) = util::enclosing_stmt(tree, first) else {
        let in_func = tree
            .ancestors(first)
            .any(|n| matches!(tree.kind(n), NodeKind::FuncDecl { .. } | NodeKind::FuncLit { .. }));
        if in_func {
            return Err(RefactorError::structural("cannot extract from a function signature"));
        }
        let root = tree.root();
        let decl = std::iter::once(first)
            .chain(tree.ancestors(first))
            .find(|n| tree.parent(*n) == Some(root))
            .ok_or_else(|| RefactorError::structural("no enclosing declaration"))?;
        return match tree.kind(decl) {
            NodeKind::GenDecl { tok, .. } if *tok != TokenKind::Import => Ok(Anchor::Decl(decl)),
            _ => Err(RefactorError::structural("cannot extract here")),
        };
    };
    while !occs.iter().all(|o| util::encloses(tree, site.owner, *o)) {
        site = util::enclosing_stmt(tree, site.owner)
            .ok_or_else(|| RefactorError::structural("occurrences have no common statement"))?;
    }
    for occ in occs {
        for ancestor in tree.ancestors(*occ) {
            if ancestor == site.owner {
                break;
            }
            if let NodeKind::For { cond, post, .. } = tree.kind(ancestor) {
                let in_loop_head = [cond, post]
                    .into_iter()
                    .flatten()
                    .any(|part| util::encloses(tree, *part, *occ));
                if in_loop_head {
                    return Err(RefactorError::structural(
                        "cannot extract from a loop condition or post statement",
                    ));
                }
            }
        }
    }
    Ok(Anchor::Stmt(site))
}
