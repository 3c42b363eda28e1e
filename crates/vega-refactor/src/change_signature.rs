//! Removing and reordering function parameters.
//!
//! The declaration is rewritten directly. Call sites are rewritten by
//! appending, to a scratch copy of the declaring file, a stand-in with the
//! new parameter list and a wrapper with the old one that calls it, then
//! inlining the wrapper at every call. The inliner takes care of dropping
//! pure arguments and keeping the effects of the others in order.

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use vega_core::{FileId, TextRange};
use vega_syntax::{NodeId, NodeKind, ParsedFile, SyntaxTree};
use vega_types::{NodeKey, ObjId, ObjKind, PkgId, Program, Type};

use crate::edit::{Edit, SuggestedFix, WorkspaceEdit};
use crate::fixers::PackageInput;
use crate::inline::{guarded_inline, InlineRequest, SimpleInliner};
use crate::selection::find_parameter;
use crate::util;
use crate::RefactorError;

/// One parameter edit, by flattened parameter index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "index")]
pub enum SignatureChange {
    Remove(usize),
    MoveLeft(usize),
    MoveRight(usize),
}

impl SignatureChange {
    /// The new parameter list as indices into the old one.
    pub fn permutation(self, len: usize) -> Option<Vec<usize>> {
        let mut order: Vec<usize> = (0..len).collect();
        match self {
            SignatureChange::Remove(i) if i < len => {
                order.remove(i);
            }
            SignatureChange::MoveLeft(i) if i > 0 && i < len => order.swap(i - 1, i),
            SignatureChange::MoveRight(i) if i + 1 < len => order.swap(i, i + 1),
            _ => return None,
        }
        Some(order)
    }

    pub fn index(self) -> usize {
        match self {
            SignatureChange::Remove(i) | SignatureChange::MoveLeft(i) | SignatureChange::MoveRight(i) => i,
        }
    }
}

/// Which changes apply to the parameter under the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterChoice {
    pub index: usize,
    pub name: String,
    pub can_remove: bool,
    pub can_move_left: bool,
    pub can_move_right: bool,
}

/// A declaration's parameter as written: its name, if any, and type text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParamText {
    name: Option<String>,
    ty: String,
}

struct Target {
    decl: NodeId,
    obj: ObjId,
    params: Vec<ParamText>,
    variadic: bool,
}

fn target(input: &PackageInput<'_>) -> Result<(Target, usize), RefactorError> {
    let program = input.program();
    let file: &ParsedFile = input.file;
    let (Some(start), Some(end)) = (file.offset(input.start), file.offset(input.end)) else {
        return Err(RefactorError::Bug("selection outside the file".into()));
    };
    let site = find_parameter(file, start, end).ok_or_else(|| RefactorError::structural("no parameter selected"))?;
    let index = site
        .index
        .ok_or_else(|| RefactorError::structural("select a single parameter"))?;
    let obj = program
        .func_of_decl(file, site.decl)
        .ok_or_else(|| RefactorError::semantic("function is not type-checked"))?;
    let sig = util::func_signature(program, file, site.decl)
        .ok_or_else(|| RefactorError::semantic("function is not type-checked"))?;
    Ok((
        Target {
            decl: site.decl,
            obj,
            params: param_texts(file, site.decl),
            variadic: sig.variadic,
        },
        index,
    ))
}

pub fn probe_change_signature(input: &PackageInput<'_>) -> Result<ParameterChoice, RefactorError> {
    let program = input.program();
    check_package(input)?;
    let (target, index) = target(input)?;
    let len = target.params.len();
    let last = len.saturating_sub(1);
    let moves_variadic = |other: usize| target.variadic && (index == last || other == last);
    let name = target.params[index].name.clone().unwrap_or_else(|| "_".to_string());
    let used = param_used(program, input.file, target.decl, index);
    Ok(ParameterChoice {
        index,
        name,
        can_remove: !used,
        can_move_left: index > 0 && !moves_variadic(index - 1),
        can_move_right: index + 1 < len && !moves_variadic(index + 1),
    })
}

/// The rewrite re-checks the package, so it must start out clean.
fn check_package(input: &PackageInput<'_>) -> Result<(), RefactorError> {
    if input.view.has_errors() {
        return Err(RefactorError::semantic("cannot change the signature in a package with errors"));
    }
    Ok(())
}

pub fn change_signature(input: &PackageInput<'_>, change: SignatureChange) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file: &Arc<ParsedFile> = input.file;
    let tree = &file.tree;
    check_package(input)?;
    let (target, _) = target(input)?;
    let name = program.obj(target.obj).name.to_string();
    if util::is_generic_func(program, file, target.decl) {
        return Err(RefactorError::semantic("cannot change the signature of a generic function"));
    }
    let len = target.params.len();
    let order = change
        .permutation(len)
        .ok_or_else(|| RefactorError::structural("no such parameter"))?;
    let last = len.saturating_sub(1);
    if target.variadic && order.contains(&last) && order.last() != Some(&last) {
        return Err(RefactorError::semantic("the variadic parameter must stay last"));
    }
    for removed in (0..len).filter(|i| !order.contains(i)) {
        if param_used(program, file, target.decl, removed) {
            let param = target.params[removed].name.as_deref().unwrap_or("_");
            return Err(RefactorError::semantic(format!("parameter {param} is used")));
        }
    }
    let is_method = matches!(tree.kind(target.decl), NodeKind::FuncDecl { recv: Some(_), .. });
    if is_method && interface_declares(program, &name) {
        return Err(RefactorError::semantic(format!(
            "{name} may implement an interface method"
        )));
    }

    let calls = call_sites(program, target.obj)?;
    input.cx.check()?;

    let mut edits = vec![param_list_edit(file, target.decl, &target.params, &order)?];
    if !calls.is_empty() {
        edits.extend(rewrite_calls(input, &target, &order, &calls)?);
    }

    let title = match change {
        SignatureChange::Remove(i) => format!(
            "Remove unused parameter {}",
            target.params[i].name.as_deref().unwrap_or("_")
        ),
        SignatureChange::MoveLeft(_) => "Move parameter left".to_string(),
        SignatureChange::MoveRight(_) => "Move parameter right".to_string(),
    };
    let fix = SuggestedFix::new(title, edits);
    let edit = WorkspaceEdit::assemble(&fix, program.fset(), input.snapshot)?;
    edit.verify(input.snapshot)?;
    edit.verify_types(input.snapshot, input.cx, program)?;
    tracing::debug!(
        target: "vega.refactor",
        function = %name,
        calls = calls.len(),
        "changed signature"
    );
    Ok(Some(fix))
}

fn param_texts(file: &ParsedFile, decl: NodeId) -> Vec<ParamText> {
    let tree = &file.tree;
    let Some(fields) = param_fields(tree, decl) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for field in fields {
        let NodeKind::Field { names, ty, .. } = tree.kind(field) else { continue };
        let ty = file.text_of(*ty).to_string();
        if names.is_empty() {
            out.push(ParamText { name: None, ty });
            continue;
        }
        for n in names {
            out.push(ParamText {
                name: tree.ident_name(*n).map(|n| n.to_string()),
                ty: ty.clone(),
            });
        }
    }
    out
}

fn param_fields(tree: &SyntaxTree, decl: NodeId) -> Option<Vec<NodeId>> {
    let NodeKind::FuncDecl { ty, .. } = tree.kind(decl) else { return None };
    let NodeKind::FuncType { params, .. } = tree.kind(*ty) else { return None };
    let NodeKind::FieldList { fields, .. } = tree.kind(*params) else { return None };
    Some(fields.clone())
}

/// `a, c int, s string`: consecutive named parameters of one type share it.
fn render_params(params: &[&ParamText]) -> String {
    let mut groups: Vec<(Vec<String>, String)> = Vec::new();
    for p in params {
        match (&p.name, groups.last_mut()) {
            (Some(name), Some((names, ty))) if *ty == p.ty && !names.is_empty() => names.push(name.clone()),
            _ => groups.push((p.name.iter().cloned().collect(), p.ty.clone())),
        }
    }
    groups
        .into_iter()
        .map(|(names, ty)| {
            if names.is_empty() {
                ty
            } else {
                format!("{} {ty}", names.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn param_list_edit(file: &ParsedFile, decl: NodeId, params: &[ParamText], order: &[usize]) -> Result<Edit, RefactorError> {
    let tree = &file.tree;
    let NodeKind::FuncDecl { ty, .. } = tree.kind(decl) else {
        return Err(RefactorError::Bug("not a function declaration".into()));
    };
    let NodeKind::FuncType { params: list, .. } = tree.kind(*ty) else {
        return Err(RefactorError::Bug("function without a type".into()));
    };
    let new: Vec<&ParamText> = order.iter().map(|i| &params[*i]).collect();
    let (start, end) = file.node_pos(*list);
    Ok(Edit::replace(start, end, format!("({})", render_params(&new))))
}

/// Whether the parameter at flattened `index` is referenced in the body.
fn param_used(program: &Program, file: &ParsedFile, decl: NodeId, index: usize) -> bool {
    let tree = &file.tree;
    let NodeKind::FuncDecl { body: Some(body), .. } = tree.kind(decl) else {
        return false;
    };
    let Some(sig) = util::func_signature(program, file, decl) else {
        return true;
    };
    let Some(obj) = sig.params.get(index).and_then(|p| p.obj) else {
        return false;
    };
    util::idents(tree, *body)
        .into_iter()
        .any(|id| program.object_of(file, id) == Some(obj))
}

/// Whether any interface type in the program has a method named `name`.
fn interface_declares(program: &Program, name: &str) -> bool {
    let types = program.types();
    program.packages().any(|pkg| {
        program.scope(pkg.scope).names().any(|(_, obj)| {
            let obj = program.obj(obj);
            matches!(obj.kind, ObjKind::TypeName { .. })
                && matches!(types.get(types.underlying(obj.ty)), Type::Interface(_))
                && types.interface_methods(obj.ty).iter().any(|m| m.name == name)
        })
    })
}

/// A static call of the function, by file and call range.
#[derive(Debug, Clone)]
struct CallSite {
    file: FileId,
    range: TextRange,
}

/// Every reference to `obj`, each of which must be the callee of a call.
fn call_sites(program: &Program, obj: ObjId) -> Result<Vec<CallSite>, RefactorError> {
    let name = program.obj(obj).name.clone();
    let Some(pkg) = program.obj(obj).pkg else {
        return Ok(Vec::new());
    };
    let mut out: Vec<CallSite> = Vec::new();
    for dep in program.reverse_dependencies(pkg) {
        for file in program.view(dep).files() {
            let tree = &file.tree;
            for ident in util::idents(tree, tree.root()) {
                let key = NodeKey::new(file, ident);
                if program.info().uses.get(&key) != Some(&obj) {
                    continue;
                }
                let call = callee_call(tree, ident)
                    .ok_or_else(|| RefactorError::semantic(format!("{name} is used other than in a call")))?;
                out.push(CallSite {
                    file: file.file.clone(),
                    range: tree.range(call),
                });
            }
        }
    }
    for (i, a) in out.iter().enumerate() {
        let nested = out
            .iter()
            .enumerate()
            .any(|(j, b)| i != j && a.file == b.file && a.range.contains_range(b.range));
        if nested {
            return Err(RefactorError::semantic(format!("cannot rewrite nested calls of {name}")));
        }
    }
    Ok(out)
}

/// The call whose callee is `ident`, as `f(…)`, `pkg.f(…)` or `x.f(…)`.
fn callee_call(tree: &SyntaxTree, ident: NodeId) -> Option<NodeId> {
    let mut fun = ident;
    let parent = tree.parent(ident)?;
    if matches!(tree.kind(parent), NodeKind::Selector { sel, .. } if *sel == ident) {
        fun = parent;
    }
    let mut call = tree.parent(fun)?;
    while let NodeKind::Paren { .. } = tree.kind(call) {
        fun = call;
        call = tree.parent(call)?;
    }
    matches!(tree.kind(call), NodeKind::Call { fun: f, .. } if *f == fun).then_some(call)
}

/// Inline, at every call, a wrapper with the old parameters that calls the
/// function with the new argument order.
fn rewrite_calls(
    input: &PackageInput<'_>,
    target: &Target,
    order: &[usize],
    calls: &[CallSite],
) -> Result<Vec<Edit>, RefactorError> {
    let program = input.program();
    let file: &ParsedFile = input.file;
    let scratch_decls = scratch_decls(program, file, target, order)?;
    let mut scratch = file.text.to_string();
    if !scratch.ends_with('\n') {
        scratch.push('\n');
    }
    let original_len = scratch.len();
    scratch.push_str(&scratch_decls.text);

    let overlay = input.snapshot.with_overlay([(file.file.clone(), scratch)]);
    let scratch_program = overlay.program(input.cx)?;
    let scratch_file = scratch_program
        .file(&file.file)
        .ok_or_else(|| RefactorError::MissingFile(file.file.clone()))?;
    let wrapper_decl = scratch_file
        .tree
        .decls()
        .iter()
        .copied()
        .rev()
        .find(|d| {
            matches!(scratch_file.tree.kind(*d), NodeKind::FuncDecl { name, .. }
                if scratch_file.tree.ident_name(*name).is_some_and(|n| *n == scratch_decls.wrapper))
        })
        .ok_or_else(|| RefactorError::Synthesis("wrapper did not parse".into()))?;
    let wrapper_obj = scratch_program
        .func_of_decl(scratch_file, wrapper_decl)
        .ok_or_else(|| RefactorError::Synthesis("wrapper was not type-checked".into()))?;

    let updated = Regex::new(&format!(r"\b{}\b", scratch_decls.updated)).expect("valid regex");
    let name = program.obj(target.obj).name.to_string();
    let mut edits = Vec::new();
    for site in calls {
        input.cx.check()?;
        let caller = scratch_program
            .file(&site.file)
            .ok_or_else(|| RefactorError::MissingFile(site.file.clone()))?;
        let caller_pkg: PkgId = scratch_program
            .package_of_file(&site.file)
            .ok_or_else(|| RefactorError::MissingFile(site.file.clone()))?;
        let call = call_at(&caller.tree, site.range)
            .ok_or_else(|| RefactorError::Bug(format!("call moved in {}", site.file)))?;
        let request = InlineRequest {
            program: scratch_program,
            caller,
            caller_pkg,
            call,
            callee_file: scratch_file,
            callee_decl: wrapper_decl,
            callee: wrapper_obj,
        };
        for edit in guarded_inline(&SimpleInliner, &request)? {
            let mut edit = translate(program, scratch_program, &edit, &file.file, original_len)?;
            edit.new_text = updated.replace_all(&edit.new_text, name.as_str()).into_owned();
            edits.push(edit);
        }
    }
    Ok(edits)
}

fn call_at(tree: &SyntaxTree, range: TextRange) -> Option<NodeId> {
    let mut found = None;
    tree.walk(tree.root(), &mut |n| {
        if found.is_some() || !tree.range(n).contains_range(range) {
            return false;
        }
        if tree.range(n) == range && matches!(tree.kind(n), NodeKind::Call { .. }) {
            found = Some(n);
            return false;
        }
        true
    });
    found
}

/// Move an edit from the scratch program's positions to the original's.
/// Offsets agree because the scratch file only grew at its end.
fn translate(
    program: &Program,
    scratch: &Program,
    edit: &Edit,
    decl_file: &FileId,
    original_len: usize,
) -> Result<Edit, RefactorError> {
    let map = |pos| -> Result<vega_syntax::Pos, RefactorError> {
        let (file, offset) = scratch
            .fset()
            .resolve(pos)
            .ok_or_else(|| RefactorError::Bug(format!("edit position {pos:?} is not in any file")))?;
        if file == decl_file && usize::from(offset) > original_len {
            return Err(RefactorError::Bug("edit inside the generated wrapper".into()));
        }
        let original = program.file(file).ok_or_else(|| RefactorError::MissingFile(file.clone()))?;
        Ok(original.pos(offset))
    };
    Ok(Edit {
        pos: map(edit.pos)?,
        end: map(edit.end)?,
        new_text: edit.new_text.clone(),
    })
}

/// Declarations appended to the scratch copy of the declaring file.
struct ScratchDecls {
    /// The function with the new parameter list.
    updated: String,
    /// The wrapper with the old parameter list, calling `updated`.
    wrapper: String,
    text: String,
}

fn scratch_decls(
    program: &Program,
    file: &ParsedFile,
    target: &Target,
    order: &[usize],
) -> Result<ScratchDecls, RefactorError> {
    let tree = &file.tree;
    let NodeKind::FuncDecl { recv, ty, .. } = tree.kind(target.decl) else {
        return Err(RefactorError::Bug("not a function declaration".into()));
    };
    let name = program.obj(target.obj).name.to_string();
    let pkg_scope = program
        .file_scope(file)
        .ok_or_else(|| RefactorError::Bug("file has no scope".into()))?;

    let mut receiver = None;
    if let Some(recv) = recv {
        let field = match tree.kind(*recv) {
            NodeKind::FieldList { fields, .. } => fields.first().copied(),
            _ => None,
        };
        let Some(NodeKind::Field { names, ty, .. }) = field.map(|f| tree.kind(f)) else {
            return Err(RefactorError::Bug("method without receiver".into()));
        };
        let recv_name = names
            .first()
            .and_then(|n| tree.ident_name(*n))
            .filter(|n| *n != "_")
            .map_or_else(|| "recv".to_string(), |n| n.to_string());
        receiver = Some((recv_name, file.text_of(*ty).to_string()));
    }

    let mut taken: Vec<String> = vec![name.clone()];
    taken.extend(receiver.iter().map(|(n, _)| n.clone()));
    let mut names = Vec::with_capacity(target.params.len());
    for (i, p) in target.params.iter().enumerate() {
        let usable = p
            .name
            .as_ref()
            .filter(|n| *n != "_" && !taken.contains(n));
        let chosen = match usable {
            Some(n) => n.clone(),
            None => (0..)
                .map(|k| if k == 0 { format!("p{i}") } else { format!("p{i}_{k}") })
                .find(|c| !taken.contains(c) && target.params.iter().all(|q| q.name.as_ref() != Some(c)))
                .unwrap_or_else(|| format!("p{i}")),
        };
        taken.push(chosen.clone());
        names.push(chosen);
    }

    let fresh = |base: String| {
        (0..)
            .map(|k| if k == 0 { base.clone() } else { format!("{base}{k}") })
            .find(|c| program.lookup_parent(pkg_scope, c, vega_syntax::Pos::NONE).is_none())
            .unwrap_or_else(|| base.clone())
    };
    let wrapper_name = fresh(format!("vegaWrapped{name}"));
    let updated_name = fresh(format!("vegaUpdated{name}"));

    let params: Vec<String> = target
        .params
        .iter()
        .zip(&names)
        .map(|(p, n)| format!("{n} {}", p.ty))
        .collect();
    let last = target.params.len().saturating_sub(1);
    let args: Vec<String> = order
        .iter()
        .map(|i| {
            if target.variadic && *i == last {
                format!("{}...", names[*i])
            } else {
                names[*i].clone()
            }
        })
        .collect();
    let NodeKind::FuncType { results, .. } = tree.kind(*ty) else {
        return Err(RefactorError::Bug("function without a type".into()));
    };
    let result_types = result_types(file, *results);
    let callee = match &receiver {
        Some((recv_name, _)) => format!("{recv_name}.{updated_name}"),
        None => updated_name.clone(),
    };
    let call = format!("{callee}({})", args.join(", "));
    let body = if result_types.is_empty() {
        call
    } else {
        format!("return {call}")
    };
    let recv_text = receiver.map_or_else(String::new, |(n, t)| format!("({n} {t}) "));
    let results_text = match result_types.as_slice() {
        [] => String::new(),
        [one] => format!(" {one}"),
        many => format!(" ({})", many.join(", ")),
    };
    let new_params: Vec<&ParamText> = order.iter().map(|i| &target.params[*i]).collect();
    let text = format!(
        "\nfunc {recv_text}{updated_name}({}){results_text} {{\n\tpanic(\"unreachable\")\n}}\n\
         \nfunc {recv_text}{wrapper_name}({}){results_text} {{\n\t{body}\n}}\n",
        render_params(&new_params),
        params.join(", ")
    );
    Ok(ScratchDecls {
        updated: updated_name,
        wrapper: wrapper_name,
        text,
    })
}

/// Result types with names stripped, one per result.
fn result_types(file: &ParsedFile, results: Option<NodeId>) -> Vec<String> {
    let tree = &file.tree;
    let Some(results) = results else {
        return Vec::new();
    };
    let NodeKind::FieldList { fields, .. } = tree.kind(results) else {
        return vec![file.text_of(results).to_string()];
    };
    let mut out = Vec::new();
    for field in fields {
        if let NodeKind::Field { names, ty, .. } = tree.kind(*field) {
            for _ in 0..names.len().max(1) {
                out.push(file.text_of(*ty).to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: Option<&str>, ty: &str) -> ParamText {
        ParamText {
            name: name.map(str::to_string),
            ty: ty.to_string(),
        }
    }

    #[test]
    fn permutations() {
        assert_eq!(SignatureChange::Remove(1).permutation(3), Some(vec![0, 2]));
        assert_eq!(SignatureChange::MoveLeft(1).permutation(3), Some(vec![1, 0, 2]));
        assert_eq!(SignatureChange::MoveRight(1).permutation(3), Some(vec![0, 2, 1]));
        assert_eq!(SignatureChange::MoveLeft(0).permutation(3), None);
        assert_eq!(SignatureChange::MoveRight(2).permutation(3), None);
        assert_eq!(SignatureChange::Remove(3).permutation(3), None);
    }

    #[test]
    fn consecutive_parameters_of_one_type_are_grouped() {
        let a = param(Some("a"), "int");
        let c = param(Some("c"), "int");
        let s = param(Some("s"), "string");
        assert_eq!(render_params(&[&a, &c]), "a, c int");
        assert_eq!(render_params(&[&a, &s, &c]), "a int, s string, c int");
        let t = param(None, "int");
        let u = param(None, "int");
        assert_eq!(render_params(&[&t, &u]), "int, int");
    }

    #[test]
    fn change_serializes_with_kind_and_index() {
        let json = serde_json::to_value(SignatureChange::Remove(2)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "remove", "index": 2}));
    }
}
