//! Fill a struct literal with its missing fields, or a `switch` with the
//! missing constants of its tag's type.

use std::collections::HashSet;

use vega_core::{TextRange, TextSize};
use vega_syntax::{NodeId, NodeKind, ParsedFile};
use vega_types::{ObjId, PkgId, Program, Type, TypeId};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::imports;
use crate::qualify::TypeSpeller;
use crate::util;
use crate::RefactorError;

struct StructLit {
    lit: NodeId,
    ty: TypeId,
    lbrace: TextSize,
    rbrace: TextSize,
    missing: Vec<(String, TypeId)>,
}

fn struct_lit(input: &FileInput<'_>) -> Result<StructLit, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    let lit = selection
        .find(|k| matches!(k, NodeKind::CompositeLit { .. }))
        .ok_or_else(|| RefactorError::structural("selection is not in a composite literal"))?;
    let NodeKind::CompositeLit { elts, lbrace, rbrace, .. } = tree.kind(lit) else {
        return Err(RefactorError::Bug("composite literal changed kind".into()));
    };
    let types = program.types();
    let ty = program
        .type_of(file, lit)
        .ok_or_else(|| RefactorError::semantic("composite literal has no type"))?;
    let (base, _) = types.deref(ty);
    let Type::Struct(st) = types.get(types.underlying(base)) else {
        return Err(RefactorError::structural("not a struct literal"));
    };

    let mut present = HashSet::new();
    for &elt in elts {
        let NodeKind::KeyValue { key, .. } = tree.kind(elt) else {
            return Err(RefactorError::structural("the literal has positional elements"));
        };
        if let Some(name) = tree.ident_name(*key) {
            present.insert(name.to_string());
        }
    }
    let pkg = input.view.id();
    let missing = st
        .fields
        .iter()
        .filter(|f| !present.contains(f.name.as_str()))
        .filter(|f| program.obj(f.obj).is_exported() || program.obj(f.obj).pkg == Some(pkg))
        .map(|f| (f.name.to_string(), f.ty))
        .collect();
    Ok(StructLit {
        lit,
        ty,
        lbrace: *lbrace,
        rbrace: *rbrace,
        missing,
    })
}

pub fn probe_fill_struct(input: &FileInput<'_>) -> Result<bool, RefactorError> {
    Ok(struct_lit(input).is_ok_and(|s| !s.missing.is_empty()))
}

pub(crate) fn fill_struct(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let site = struct_lit(input)?;
    if site.missing.is_empty() {
        return Ok(None);
    }
    let inner = TextRange::new(site.lbrace + TextSize::from(1), site.rbrace);
    if file.comments_in(inner).next().is_some() {
        return Err(RefactorError::structural("the literal contains comments"));
    }
    let speller = TypeSpeller::new(program, file, input.view.id());
    let indent = file.indent_at(tree.range(site.lit).start());

    let mut body = String::from("\n");
    if let NodeKind::CompositeLit { elts, .. } = tree.kind(site.lit) {
        for &elt in elts {
            body.push_str(&format!("{indent}\t{},\n", file.text_of(elt)));
        }
    }
    for (name, ty) in &site.missing {
        if !speller.is_accessible(*ty) {
            continue;
        }
        body.push_str(&format!("{indent}\t{name}: {},\n", speller.zero_value(*ty)));
    }
    body.push_str(indent);

    let type_name = speller.type_string(site.ty);
    tracing::debug!(target: "vega.refactor", ty = %type_name, fields = site.missing.len(), "filling struct literal");
    let mut edits = vec![Edit::replace(file.pos(inner.start()), file.pos(inner.end()), body)];
    edits.extend(speller.import_edits());
    Ok(Some(SuggestedFix::new(format!("Fill {type_name}"), edits)))
}

struct SwitchSite {
    rbrace: TextSize,
    switch: NodeId,
    tag_ty: TypeId,
    missing: Vec<ObjId>,
}

/// Constants of exactly type `t` declared at package level next to it.
fn enum_members(program: &Program, t: TypeId) -> Vec<ObjId> {
    let types = program.types();
    let Some(named) = types.named(t) else {
        return Vec::new();
    };
    let Some(pkg) = program.obj(named.obj).pkg else {
        return Vec::new();
    };
    let scope = program.package(pkg).scope;
    let mut members: Vec<ObjId> = program
        .scope(scope)
        .names()
        .map(|(_, obj)| obj)
        .filter(|&obj| {
            let o = program.obj(obj);
            o.is_const() && o.name.as_str() != "_" && types.identical(o.ty, t)
        })
        .collect();
    members.sort_by_key(|&obj| program.obj(obj).pos);
    members
}

fn switch_site(input: &FileInput<'_>) -> Result<SwitchSite, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    let switch = selection
        .find(|k| matches!(k, NodeKind::Switch { .. }))
        .ok_or_else(|| RefactorError::structural("selection is not in a switch statement"))?;
    let NodeKind::Switch { tag, body, .. } = tree.kind(switch) else {
        return Err(RefactorError::Bug("switch changed kind".into()));
    };
    let tag = tag.ok_or_else(|| RefactorError::structural("the switch has no tag"))?;
    let NodeKind::Block { stmts, rbrace, .. } = tree.kind(*body) else {
        return Err(RefactorError::Bug("switch body is not a block".into()));
    };
    let tag_ty = program
        .type_of(file, tag)
        .ok_or_else(|| RefactorError::semantic("the switch tag has no type"))?;
    let members = enum_members(program, tag_ty);
    if members.is_empty() {
        return Err(RefactorError::semantic("the tag's type declares no constants"));
    }

    let mut covered = HashSet::new();
    for &clause in stmts {
        let NodeKind::CaseClause { list, .. } = tree.kind(clause) else {
            continue;
        };
        for &value in list {
            let ident = match tree.kind(tree.unparen(value)) {
                NodeKind::Selector { sel, .. } => *sel,
                _ => tree.unparen(value),
            };
            if let Some(obj) = program.object_of(file, ident) {
                covered.insert(obj);
            }
        }
    }
    let pkg = input.view.id();
    let missing = members
        .into_iter()
        .filter(|obj| !covered.contains(obj))
        .filter(|&obj| program.obj(obj).is_exported() || program.obj(obj).pkg == Some(pkg))
        .collect();
    Ok(SwitchSite {
        rbrace: *rbrace,
        switch,
        tag_ty,
        missing,
    })
}

pub fn probe_fill_switch(input: &FileInput<'_>) -> Result<bool, RefactorError> {
    Ok(switch_site(input).is_ok_and(|s| !s.missing.is_empty()))
}

/// How `file` spells a constant of another package, with the import it
/// needs when the file lacks one.
fn const_name(program: &Program, file: &ParsedFile, pkg: PkgId, obj: ObjId) -> (String, Option<String>) {
    let o = program.obj(obj);
    let Some(home) = o.pkg.filter(|&p| p != pkg) else {
        return (o.name.to_string(), None);
    };
    let home = program.package(home);
    let local = imports::file_imports(program, file)
        .into_iter()
        .find(|i| i.path == home.path && i.local != "_" && i.local != ".")
        .map(|i| i.local);
    match local {
        Some(local) => (format!("{local}.{}", o.name), None),
        None => (format!("{}.{}", home.name, o.name), Some(home.path.clone())),
    }
}

pub(crate) fn fill_switch(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let site = switch_site(input)?;
    if site.missing.is_empty() {
        return Ok(None);
    }
    let pkg = input.view.id();
    let indent = file.indent_at(tree.range(site.switch).start());
    let mut cases = String::new();
    let mut needed = Vec::new();
    for &obj in &site.missing {
        let (name, import) = const_name(program, file, pkg, obj);
        cases.push_str(&format!("{indent}case {name}:\n"));
        if let Some(path) = import {
            if !needed.contains(&path) {
                needed.push(path);
            }
        }
    }
    let edit = if util::starts_line(file, site.rbrace) {
        Edit::insert(file.pos(util::line_start(file, site.rbrace)), cases)
    } else {
        Edit::insert(file.pos(site.rbrace), format!("\n{cases}{indent}"))
    };
    let type_name = program.type_string_in(site.tag_ty, pkg);
    tracing::debug!(target: "vega.refactor", ty = %type_name, cases = site.missing.len(), "filling switch");
    let mut edits = vec![edit];
    let paths: Vec<&str> = needed.iter().map(String::as_str).collect();
    edits.extend(imports::add_imports_edits(file, &paths));
    Ok(Some(SuggestedFix::new(format!("Add cases for {type_name}"), edits)))
}
