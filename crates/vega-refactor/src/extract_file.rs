//! Move top-level declarations into a new file of the same package.

use std::collections::BTreeSet;

use vega_core::{FileId, TextSize};
use vega_syntax::{NodeId, NodeKind, ParsedFile, TokenKind};
use vega_types::{ObjKind, Program};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::PackageInput;
use crate::imports::{self, ImportInfo};
use crate::util;
use crate::RefactorError;

const MAX_NAME_ATTEMPTS: usize = 5;

/// The top-level declarations wholly covered by `[start, end)`.
pub fn selected_decls(file: &ParsedFile, start: TextSize, end: TextSize) -> Result<Vec<NodeId>, RefactorError> {
    let tree = &file.tree;
    if start == end {
        return Err(RefactorError::structural("select the declarations to move"));
    }
    if let NodeKind::File { name, .. } = tree.kind(tree.root()) {
        if start < tree.range(*name).end() {
            return Err(RefactorError::structural("selection includes the package clause"));
        }
    }
    let mut out = Vec::new();
    for &decl in tree.decls() {
        let range = tree.range(decl);
        let doc_start = tree
            .doc_comment(&file.text, decl)
            .map_or(range.start(), |doc| doc.range().start());
        if range.end() <= start || end <= doc_start {
            continue;
        }
        if matches!(tree.kind(decl), NodeKind::GenDecl { tok: TokenKind::Import, .. }) {
            return Err(RefactorError::structural("selection includes imports"));
        }
        if start > range.start() || end < range.end() {
            return Err(RefactorError::structural("selection must cover whole declarations"));
        }
        out.push(decl);
    }
    if out.is_empty() {
        return Err(RefactorError::structural("selection contains no declarations"));
    }
    Ok(out)
}

/// Name of the first symbol a declaration introduces.
fn first_symbol(file: &ParsedFile, decl: NodeId) -> Option<String> {
    let tree = &file.tree;
    let ident = match tree.kind(decl) {
        NodeKind::FuncDecl { name, .. } => *name,
        NodeKind::GenDecl { specs, .. } => match tree.kind(*specs.first()?) {
            NodeKind::TypeSpec { name, .. } => *name,
            NodeKind::ValueSpec { names, .. } => *names.iter().find(|n| tree.ident_name(**n).is_some_and(|n| n != "_"))?,
            _ => return None,
        },
        _ => return None,
    };
    tree.ident_name(ident).map(|n| n.to_string())
}

/// Copyright notices and build constraints above the package clause.
pub(crate) fn file_header(file: &ParsedFile) -> String {
    let tree = &file.tree;
    let package_start = file
        .tokens
        .iter()
        .find(|t| t.kind == TokenKind::Package)
        .map_or(TextSize::from(0), |t| t.range.start());
    let mut out = String::new();
    for group in tree.comments().iter().filter(|g| g.range().end() <= package_start) {
        let text = file.slice(group.range());
        let keep = text.to_ascii_lowercase().contains("copyright")
            || text.starts_with("//go:build")
            || text.starts_with("// +build");
        if keep {
            out.push_str(text);
            out.push_str("\n\n");
        }
    }
    out
}

/// Import paths referenced from the subtree of `node`.
fn referenced_imports(program: &Program, file: &ParsedFile, node: NodeId) -> BTreeSet<String> {
    util::idents(&file.tree, node)
        .into_iter()
        .filter_map(|id| program.object_of(file, id))
        .filter_map(|obj| match &program.obj(obj).kind {
            ObjKind::PkgName { path, .. } => Some(path.to_string()),
            _ => None,
        })
        .collect()
}

pub(crate) fn extract_to_new_file(input: &PackageInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file: &ParsedFile = input.file;
    let tree = &file.tree;
    let (Some(start), Some(end)) = (file.offset(input.start), file.offset(input.end)) else {
        return Err(RefactorError::Bug("selection outside the file".into()));
    };
    let decls = selected_decls(file, start, end)?;
    input.cx.check()?;

    let file_imports = imports::file_imports(program, file);
    if file_imports.iter().any(|i| i.local == ".") {
        return Err(RefactorError::semantic("dot imports are not supported"));
    }

    let symbol = first_symbol(file, decls[0])
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "extracted".to_string());
    let target = target_file(&file.file, &symbol, |f| input.snapshot.contains(f))
        .ok_or_else(|| RefactorError::structural(format!("cannot choose a file name for {symbol}")))?;

    let mut moved_imports = BTreeSet::new();
    for &decl in &decls {
        moved_imports.extend(referenced_imports(program, file, decl));
    }
    let mut remaining_imports = BTreeSet::new();
    for &decl in tree.decls() {
        let is_import = matches!(tree.kind(decl), NodeKind::GenDecl { tok: TokenKind::Import, .. });
        if !decls.contains(&decl) && !is_import {
            remaining_imports.extend(referenced_imports(program, file, decl));
        }
    }

    let mut edits = Vec::new();
    let mut moved_text = Vec::new();
    for &decl in &decls {
        let range = tree.range(decl);
        let doc_start = tree
            .doc_comment(&file.text, decl)
            .map_or(range.start(), |doc| doc.range().start());
        moved_text.push(file.text[usize::from(doc_start)..usize::from(range.end())].to_string());
        let delete_start = if util::starts_line(file, doc_start) {
            util::line_start(file, doc_start)
        } else {
            doc_start
        };
        let mut delete_end = util::line_end_inclusive(file, range.end());
        if file.text[usize::from(delete_end)..].starts_with('\n') {
            delete_end += TextSize::from(1);
        }
        edits.push(Edit::delete(file.pos(delete_start), file.pos(delete_end)));
    }
    for info in &file_imports {
        if moved_imports.contains(&info.path) && !remaining_imports.contains(&info.path) {
            edits.extend(imports::delete_import_edits(file, info.spec));
        }
    }

    let new_text = new_file_text(file, &file_imports, &moved_imports, &moved_text);
    tracing::debug!(
        target: "vega.refactor",
        from = %file.file,
        to = %target,
        decls = decls.len(),
        "extracting declarations to a new file"
    );
    let title = format!("Extract declarations to new file {}", target.file_name());
    Ok(Some(SuggestedFix::new(title, edits).with_new_file(target, new_text)))
}

fn new_file_text(
    file: &ParsedFile,
    file_imports: &[ImportInfo],
    used: &BTreeSet<String>,
    decls: &[String],
) -> String {
    let package = file.tree.package_name().map_or_else(|| "main".to_string(), |n| n.to_string());
    let mut out = file_header(file);
    out.push_str(&format!("package {package}\n\n"));
    let specs: Vec<(String, Option<String>)> = file_imports
        .iter()
        .filter(|i| used.contains(&i.path))
        .map(|i| (i.path.clone(), i.name.clone()))
        .collect();
    if !specs.is_empty() {
        out.push_str(&imports::render_import_block(&specs));
        out.push_str("\n\n");
    }
    out.push_str(&decls.join("\n\n"));
    out.push('\n');
    out
}

/// `<symbol>.go` next to `file`, or `<symbol>.<n>.go` when taken.
fn target_file(file: &FileId, symbol: &str, exists: impl Fn(&FileId) -> bool) -> Option<FileId> {
    (0..MAX_NAME_ATTEMPTS)
        .map(|n| {
            let name = if n == 0 { format!("{symbol}.go") } else { format!("{symbol}.{n}.go") };
            file.sibling(&name)
        })
        .find(|candidate| !exists(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(src: &str) -> ParsedFile {
        ParsedFile::parse(FileId::new("/ws/a.go"), 1, src)
    }

    fn offsets(src: &str, from: &str, to: &str) -> (TextSize, TextSize) {
        let s = src.find(from).unwrap();
        let e = src.find(to).unwrap() + to.len();
        (TextSize::from(s as u32), TextSize::from(e as u32))
    }

    #[test]
    fn whole_declarations_are_selected() {
        let src = "package p\n\n// F does.\nfunc F() {}\n\nfunc G() {}\n\nvar x = 1\n";
        let file = parsed(src);
        let (s, e) = offsets(src, "// F does.", "func G() {}");
        let decls = selected_decls(&file, s, e).unwrap();
        assert_eq!(decls.len(), 2);
        assert_eq!(first_symbol(&file, decls[0]).as_deref(), Some("F"));
    }

    #[test]
    fn partial_declarations_are_rejected() {
        let src = "package p\n\nfunc F() {\n\tprintln()\n}\n";
        let file = parsed(src);
        let (s, e) = offsets(src, "println", "println()");
        assert!(selected_decls(&file, s, e).unwrap_err().is_refusal());
        let (s, e) = offsets(src, "package", "func F");
        assert!(selected_decls(&file, s, e).is_err());
    }

    #[test]
    fn header_keeps_copyright_and_build_constraints() {
        let src = "// Copyright 2024 The Authors.\n\n//go:build linux\n\n// Package p does.\npackage p\n";
        let file = parsed(src);
        assert_eq!(file_header(&file), "// Copyright 2024 The Authors.\n\n//go:build linux\n\n");
    }

    #[test]
    fn colliding_names_get_numeric_suffixes() {
        let file = FileId::new("/ws/a.go");
        let taken = vec![FileId::new("/ws/f.go"), FileId::new("/ws/f.1.go")];
        assert_eq!(target_file(&file, "f", |f| taken.contains(f)), Some(FileId::new("/ws/f.2.go")));
    }
}
