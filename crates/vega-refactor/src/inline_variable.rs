//! Inline a use of a local variable with its initializer.

use vega_syntax::printer::{context_precedence, expr_precedence};
use vega_syntax::{NodeId, NodeKind, ParsedFile, TokenKind};
use vega_types::{NodeKey, ObjId, Program};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::util;
use crate::RefactorError;

struct Candidate {
    use_: NodeId,
    obj: ObjId,
    init: NodeId,
}

pub fn probe_inline_variable(input: &FileInput<'_>) -> Result<bool, RefactorError> {
    Ok(candidate(input).is_ok())
}

fn candidate(input: &FileInput<'_>) -> Result<Candidate, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    let use_ = selection.innermost();
    if !matches!(tree.kind(use_), NodeKind::Ident { .. }) {
        return Err(RefactorError::structural("selection is not an identifier"));
    }
    let key = NodeKey::new(file, use_);
    let obj = program
        .info()
        .uses
        .get(&key)
        .copied()
        .ok_or_else(|| RefactorError::structural("identifier is not a use of a variable"))?;
    if !program.obj(obj).is_var() || !util::is_local(program, obj) {
        return Err(RefactorError::structural("not a local variable"));
    }
    let decl_file = program
        .decl_file(obj)
        .ok_or_else(|| RefactorError::semantic("declaration not found"))?;
    if decl_file.file != file.file {
        return Err(RefactorError::Bug("local variable declared in another file".into()));
    }
    let init = initializer(program, file, obj)?;
    Ok(Candidate { use_, obj, init })
}

/// The single initializer paired with the variable's name.
fn initializer(program: &Program, file: &ParsedFile, obj: ObjId) -> Result<NodeId, RefactorError> {
    let tree = &file.tree;
    let def = program
        .info()
        .defs
        .iter()
        .find(|(k, o)| **o == obj && k.file == file.base)
        .map(|(k, _)| k.node)
        .ok_or_else(|| RefactorError::semantic("declaration not found"))?;
    let parent = tree
        .parent(def)
        .ok_or_else(|| RefactorError::Bug("declaring identifier has no parent".into()))?;
    match tree.kind(parent) {
        NodeKind::Assign {
            lhs,
            tok: TokenKind::Define,
            rhs,
            ..
        } if lhs.len() == 1 && rhs.len() == 1 => Ok(rhs[0]),
        NodeKind::ValueSpec { names, values, .. } if names.len() == 1 && values.len() == 1 => Ok(values[0]),
        NodeKind::Assign { .. } | NodeKind::ValueSpec { .. } => Err(RefactorError::structural(
            "variable is not declared with a single initializer",
        )),
        _ => Err(RefactorError::structural("variable has no initializer")),
    }
}

pub(crate) fn inline_variable(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let Candidate { use_, obj, init } = candidate(input)?;
    let name = program.obj(obj).name.clone();

    if is_reassigned(program, file, obj) {
        return Err(RefactorError::semantic(format!("{name} is assigned after its declaration")));
    }

    let use_pos = file.pos(tree.range(use_).start());
    let scope = program
        .scope_at(file, use_pos)
        .ok_or_else(|| RefactorError::Bug(format!("no scope at {use_pos:?}")))?;
    for ident in util::idents(tree, init) {
        let selected = tree
            .parent(ident)
            .is_some_and(|p| matches!(tree.kind(p), NodeKind::Selector { sel, .. } if *sel == ident));
        if selected {
            continue;
        }
        let (Some(ref_obj), Some(ident_name)) = (program.object_of(file, ident), tree.ident_name(ident)) else {
            continue;
        };
        if program.lookup_parent(scope, ident_name, use_pos).map(|(_, o)| o) != Some(ref_obj) {
            return Err(RefactorError::semantic(format!(
                "{ident_name} refers to a different declaration at the use of {name}"
            )));
        }
    }

    let mut text = util::expr_text(file, init);
    if expr_precedence(tree, tree.unparen(init)) < context_precedence(tree, use_) {
        text = format!("({text})");
    }
    let (start, end) = file.node_pos(use_);
    tracing::debug!(target: "vega.refactor", file = %file.file, variable = %name, "inlining variable");
    Ok(Some(SuggestedFix::new(
        format!("Inline variable {name}"),
        vec![Edit::replace(start, end, text)],
    )))
}

/// Whether `obj` is written to or has its address taken anywhere in the file.
fn is_reassigned(program: &Program, file: &ParsedFile, obj: ObjId) -> bool {
    let tree = &file.tree;
    let mut written = false;
    tree.walk(tree.root(), &mut |n| {
        if written {
            return false;
        }
        let targets: Vec<NodeId> = match tree.kind(n) {
            NodeKind::Assign { lhs, tok, .. } if *tok != TokenKind::Define => lhs.clone(),
            NodeKind::IncDec { x, .. } => vec![*x],
            NodeKind::Unary { op: TokenKind::And, x } => vec![*x],
            NodeKind::Range {
                key,
                value,
                tok: Some(TokenKind::Assign),
                ..
            } => key.iter().chain(value.iter()).copied().collect(),
            _ => Vec::new(),
        };
        written = targets
            .into_iter()
            .map(|t| tree.unparen(t))
            .any(|t| program.info().uses.get(&NodeKey::new(file, t)) == Some(&obj));
        true
    });
    written
}
