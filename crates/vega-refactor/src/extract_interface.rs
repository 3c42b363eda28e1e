//! Replace the type of a struct field with an interface of the methods
//! called on it.

use std::collections::BTreeMap;

use vega_core::{Name, TextSize};
use vega_syntax::{NodeId, NodeKind, ParsedFile};
use vega_types::{NodeKey, ObjId, Program, SelectionKind};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::qualify::TypeSpeller;
use crate::util;
use crate::RefactorError;

struct FieldSite {
    field: NodeId,
    ty: NodeId,
    obj: ObjId,
    name: Name,
}

fn field_site(input: &FileInput<'_>) -> Result<FieldSite, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    let field = selection
        .find(|k| matches!(k, NodeKind::Field { .. }))
        .ok_or_else(|| RefactorError::structural("selection is not a struct field"))?;
    let in_struct = tree
        .parent(field)
        .and_then(|list| tree.parent(list))
        .is_some_and(|st| matches!(tree.kind(st), NodeKind::StructType { .. }));
    if !in_struct {
        return Err(RefactorError::structural("selection is not a struct field"));
    }
    let NodeKind::Field { names, ty, .. } = tree.kind(field) else {
        return Err(RefactorError::Bug("field node changed kind".into()));
    };
    let [ident] = names.as_slice() else {
        return Err(RefactorError::structural("select a field declared with a single name"));
    };
    let obj = program
        .object_of(file, *ident)
        .ok_or_else(|| RefactorError::semantic("field has no object"))?;
    let name = tree
        .ident_name(*ident)
        .cloned()
        .ok_or_else(|| RefactorError::Bug("field name is not an identifier".into()))?;

    let types = program.types();
    let field_ty = program.obj(obj).ty;
    let (base, _) = types.deref(field_ty);
    if types.named(base).is_none() || types.is_interface(base) {
        return Err(RefactorError::semantic(format!("the type of {name} is not a concrete named type")));
    }
    Ok(FieldSite {
        field,
        ty: *ty,
        obj,
        name,
    })
}

pub fn probe_extract_interface(input: &FileInput<'_>) -> Result<bool, RefactorError> {
    Ok(field_site(input).is_ok())
}

/// Methods called through the field anywhere in the workspace, by name.
fn called_methods(program: &Program, field: ObjId) -> Result<BTreeMap<Name, ObjId>, RefactorError> {
    let info = program.info();
    let mut methods = BTreeMap::new();
    for (key, sel) in &info.selections {
        if sel.obj != field || sel.kind != SelectionKind::FieldVal {
            continue;
        }
        let Some(file) = program.file_by_base(key.file) else {
            continue;
        };
        let tree = &file.tree;
        let mut use_ = key.node;
        let mut parent = tree.parent(use_);
        while let Some(p) = parent.filter(|p| matches!(tree.kind(*p), NodeKind::Paren { .. })) {
            use_ = p;
            parent = tree.parent(p);
        }
        let Some(parent) = parent else {
            continue;
        };
        match tree.kind(parent) {
            NodeKind::Selector { x, .. } if *x == use_ => {
                let outer = info.selections.get(&NodeKey { file: key.file, node: parent });
                match outer {
                    Some(m) if m.kind == SelectionKind::MethodVal => {
                        methods.insert(program.obj(m.obj).name.clone(), m.obj);
                    }
                    _ => {
                        return Err(RefactorError::semantic(format!(
                            "{} is used other than by calling its methods",
                            program.obj(field).name
                        )))
                    }
                }
            }
            NodeKind::Assign { lhs, .. } if lhs.contains(&use_) => {}
            _ => {
                return Err(RefactorError::semantic(format!(
                    "{} is used other than by calling its methods",
                    program.obj(field).name
                )))
            }
        }
    }
    Ok(methods)
}

fn interface_name(program: &Program, input: &FileInput<'_>, field: &str) -> String {
    let base = format!("{}Interface", util::upper_first(field));
    let scope = input.view.scope();
    (0..)
        .map(|n| if n == 0 { base.clone() } else { format!("{base}{n}") })
        .find(|name| program.scope(scope).lookup(name).is_none())
        .unwrap_or(base)
}

/// Offset before the doc comment of the top-level declaration enclosing
/// `node`, at the start of its line.
fn decl_start(file: &ParsedFile, node: NodeId) -> Option<TextSize> {
    let tree = &file.tree;
    let decl = std::iter::once(node)
        .chain(tree.ancestors(node))
        .find(|&n| tree.parent(n) == Some(tree.root()))?;
    let start = tree
        .doc_comment(&file.text, decl)
        .map_or(tree.range(decl).start(), |doc| doc.range().start());
    Some(util::line_start(file, start))
}

pub(crate) fn extract_interface(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file = input.file;
    let site = field_site(input)?;
    let methods = called_methods(program, site.obj)?;
    if methods.is_empty() {
        return Err(RefactorError::semantic(format!("no methods of {} are called", site.name)));
    }

    let types = program.types();
    let pkg = input.view.id();
    let speller = TypeSpeller::new(program, file, pkg);
    let mut lines = Vec::new();
    for (name, &method) in &methods {
        let obj = program.obj(method);
        if !obj.is_exported() && obj.pkg != Some(pkg) {
            return Err(RefactorError::semantic(format!(
                "{name} is an unexported method of another package"
            )));
        }
        let sig = types
            .signature(obj.ty)
            .ok_or_else(|| RefactorError::Bug(format!("method {name} has no signature")))?;
        if sig.params.iter().chain(&sig.results).any(|p| !speller.is_accessible(p.ty)) {
            return Err(RefactorError::semantic(format!(
                "the signature of {name} refers to inaccessible types"
            )));
        }
        lines.push(format!("\t{name}{}\n", speller.signature(sig)));
    }

    let iface = interface_name(program, input, &site.name);
    let at = decl_start(file, site.field)
        .ok_or_else(|| RefactorError::Bug("field outside a declaration".into()))?;
    let decl = format!("type {iface} interface {{\n{}}}\n\n", lines.concat());
    let (ty_start, ty_end) = file.node_pos(site.ty);
    tracing::debug!(
        target: "vega.refactor",
        field = %site.name,
        interface = %iface,
        methods = methods.len(),
        "extracting interface"
    );
    let mut edits = vec![Edit::insert(file.pos(at), decl), Edit::replace(ty_start, ty_end, iface.clone())];
    edits.extend(speller.import_edits());
    Ok(Some(SuggestedFix::new(
        format!("Extract interface {iface} for {}", site.name),
        edits,
    )))
}
