//! Import management: resolving missing and unused imports, quick fixes,
//! organize imports, and the edits that add or delete import specs.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use vega_core::TextSize;
use vega_db::Snapshot;
use vega_syntax::{NodeId, NodeKind, ParsedFile, SyntaxTree, TokenKind};
use vega_types::{stdlib, PackageView, Program};

use crate::edit::{diff_edits, Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::util::{line_end_inclusive, line_start, starts_line};
use crate::RefactorError;

/// An import spec of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    pub spec: NodeId,
    pub path: String,
    /// The explicit name, if the spec has one.
    pub name: Option<String>,
    /// The name the file refers to the package by.
    pub local: String,
}

pub fn file_imports(program: &Program, file: &ParsedFile) -> Vec<ImportInfo> {
    let tree = &file.tree;
    tree.imports()
        .iter()
        .filter_map(|&spec| {
            let path = tree.import_path(spec)?;
            let NodeKind::ImportSpec { name, .. } = tree.kind(spec) else {
                return None;
            };
            let name = name.and_then(|n| tree.ident_name(n)).map(|n| n.to_string());
            let local = name.clone().unwrap_or_else(|| {
                program
                    .package_by_path(&path)
                    .map(|p| program.package(p).name.to_string())
                    .unwrap_or_else(|| last_segment(&path).to_string())
            });
            Some(ImportInfo {
                spec,
                path,
                name,
                local,
            })
        })
        .collect()
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn spec_text(path: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{name} {}", vega_syntax::literals::quote(path)),
        None => vega_syntax::literals::quote(path),
    }
}

fn import_decls(tree: &SyntaxTree) -> Vec<NodeId> {
    tree.decls()
        .iter()
        .copied()
        .filter(|&d| matches!(tree.kind(d), NodeKind::GenDecl { tok: TokenKind::Import, .. }))
        .collect()
}

/// Edits adding unnamed imports of `paths` to `file`.
pub(crate) fn add_imports_edits(file: &ParsedFile, paths: &[&str]) -> Vec<Edit> {
    let specs: Vec<(String, Option<String>)> = paths.iter().map(|p| (p.to_string(), None)).collect();
    add_named_imports_edits(file, &specs)
}

/// Edits adding imports `(path, name)` to `file`, keeping the standard
/// library group first and each group sorted by path.
pub(crate) fn add_named_imports_edits(file: &ParsedFile, specs: &[(String, Option<String>)]) -> Vec<Edit> {
    let tree = &file.tree;
    let existing: BTreeSet<String> = tree.imports().iter().filter_map(|s| tree.import_path(*s)).collect();
    let mut new: Vec<&(String, Option<String>)> = specs.iter().filter(|(p, _)| !existing.contains(p)).collect();
    new.sort();
    new.dedup();
    if new.is_empty() {
        return Vec::new();
    }

    let decls = import_decls(tree);
    let block = decls.iter().copied().find(|&d| {
        matches!(
            tree.kind(d),
            NodeKind::GenDecl {
                lparen: Some(_),
                ..
            }
        )
    });

    if let Some(block) = block {
        let NodeKind::GenDecl { specs: block_specs, rparen, .. } = tree.kind(block) else {
            return Vec::new();
        };
        let mut edits = Vec::new();
        for (path, name) in new {
            let std = stdlib::is_std_path(path);
            let group: Vec<NodeId> = block_specs
                .iter()
                .copied()
                .filter(|s| tree.import_path(*s).is_some_and(|p| stdlib::is_std_path(&p) == std))
                .collect();
            let line = format!("\t{}\n", spec_text(path, name.as_deref()));
            let before = group
                .iter()
                .copied()
                .find(|s| tree.import_path(*s).is_some_and(|p| p.as_str() > path.as_str()));
            let at = match (before, group.last(), block_specs.first()) {
                (Some(s), _, _) => line_start(file, tree.range(s).start()),
                (None, Some(&last), _) => line_end_inclusive(file, tree.range(last).end()),
                (None, None, Some(&first)) if std => {
                    edits.push(Edit::insert(file.pos(line_start(file, tree.range(first).start())), format!("{line}\n")));
                    continue;
                }
                (None, None, Some(_)) => {
                    let last = block_specs[block_specs.len() - 1];
                    let at = line_end_inclusive(file, tree.range(last).end());
                    edits.push(Edit::insert(file.pos(at), format!("\n{line}")));
                    continue;
                }
                (None, None, None) => match rparen {
                    Some(rparen) => line_start(file, *rparen),
                    None => continue,
                },
            };
            edits.push(Edit::insert(file.pos(at), line));
        }
        return edits;
    }

    if let Some(&first) = decls.first() {
        // Fold the single-spec declaration and the new imports into a block.
        let mut all: Vec<(String, Option<String>)> = new.into_iter().cloned().collect();
        let NodeKind::GenDecl { specs: old, .. } = tree.kind(first) else {
            return Vec::new();
        };
        for &spec in old {
            let Some(path) = tree.import_path(spec) else { continue };
            let name = match tree.kind(spec) {
                NodeKind::ImportSpec { name: Some(n), .. } => tree.ident_name(*n).map(|n| n.to_string()),
                _ => None,
            };
            all.push((path, name));
        }
        let (start, end) = file.node_pos(first);
        return vec![Edit::replace(start, end, render_import_block(&all))];
    }

    let NodeKind::File { name, .. } = tree.kind(tree.root()) else {
        return Vec::new();
    };
    let all: Vec<(String, Option<String>)> = new.into_iter().cloned().collect();
    let at = file.pos(tree.range(*name).end());
    vec![Edit::insert(at, format!("\n\n{}", render_import_block(&all)))]
}

/// `import "p"`, or a parenthesized block with the standard library group
/// first.
pub(crate) fn render_import_block(specs: &[(String, Option<String>)]) -> String {
    let mut specs: Vec<&(String, Option<String>)> = specs.iter().collect();
    specs.sort();
    specs.dedup();
    if let [(path, name)] = specs.as_slice() {
        return format!("import {}", spec_text(path, name.as_deref()));
    }
    let (std, other): (Vec<_>, Vec<_>) = specs.into_iter().partition(|(p, _)| stdlib::is_std_path(p));
    let mut out = String::from("import (\n");
    for (i, group) in [std, other].iter().filter(|g| !g.is_empty()).enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for (path, name) in group {
            out.push('\t');
            out.push_str(&spec_text(path, name.as_deref()));
            out.push('\n');
        }
    }
    out.push(')');
    out
}

/// Edits deleting one import spec, and its declaration when it is the
/// only spec.
pub(crate) fn delete_import_edits(file: &ParsedFile, spec: NodeId) -> Vec<Edit> {
    let tree = &file.tree;
    let Some(decl) = tree.parent(spec) else {
        return Vec::new();
    };
    let NodeKind::GenDecl { specs, .. } = tree.kind(decl) else {
        return Vec::new();
    };
    let target = if specs.len() == 1 { decl } else { spec };
    let range = tree.range(target);
    if !starts_line(file, range.start()) {
        let (start, end) = file.node_pos(target);
        return vec![Edit::delete(start, end)];
    }
    let start = line_start(file, range.start());
    let mut end = line_end_inclusive(file, range.end());
    if target == decl {
        // Swallow one of the blank lines around a removed declaration.
        let rest = &file.text[usize::from(end)..];
        if rest.starts_with('\n') {
            end += TextSize::from(1);
        }
    }
    vec![Edit::delete(file.pos(start), file.pos(end))]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportFixKind {
    Add,
    Delete,
    /// Change (or drop) the explicit name of an existing import.
    SetName,
}

/// A change to the imports of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFix {
    pub kind: ImportFixKind,
    pub path: String,
    pub name: Option<String>,
    /// The identifier the fix makes resolvable, or the unused import's name.
    pub ident: String,
}

impl ImportFix {
    pub fn title(&self) -> String {
        let spec = spec_text(&self.path, self.name.as_deref());
        match self.kind {
            ImportFixKind::Add => format!("Add import: {spec}"),
            ImportFixKind::Delete => format!("Delete import: {spec}"),
            ImportFixKind::SetName => format!("Update import: {spec}"),
        }
    }

    /// Whether this fix resolves a diagnostic with `message`.
    pub fn resolves(&self, message: &str) -> bool {
        let adds = matches!(self.kind, ImportFixKind::Add | ImportFixKind::SetName);
        let deletes = matches!(self.kind, ImportFixKind::Delete | ImportFixKind::SetName);
        if let Some(name) = message
            .strip_prefix("undeclared name: ")
            .or_else(|| message.strip_prefix("undefined: "))
        {
            return adds && name.trim() == self.ident;
        }
        if let Some(path) = message.strip_prefix("could not import") {
            let path = path.strip_prefix(':').unwrap_or(path);
            let path = path.split_whitespace().next().unwrap_or_default().trim_matches('"');
            return adds && path == self.path;
        }
        if let Some(caps) = unused_import_re().captures(message) {
            let subject = caps.get(1).map_or("", |m| m.as_str());
            let path = subject.trim_matches('"');
            return deletes && (path == self.path || subject == self.ident);
        }
        false
    }
}

fn unused_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^("[^"]+"|\S+) imported (?:as \S+ )?(?:but|and) not used"#).expect("valid regex")
    })
}

fn undefined_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:undefined|undeclared name): (\w+)$").expect("valid regex"))
}

/// Computes the import fixes of a file.
pub trait ImportResolver {
    fn fixes(&self, view: &PackageView<'_>, file: &ParsedFile) -> Result<Vec<ImportFix>, RefactorError>;
}

/// Resolves missing imports against the workspace packages and the
/// standard library of a snapshot.
pub struct WorkspaceImportResolver<'s> {
    snapshot: &'s Snapshot,
}

impl<'s> WorkspaceImportResolver<'s> {
    pub fn new(snapshot: &'s Snapshot) -> Self {
        WorkspaceImportResolver { snapshot }
    }
}

impl ImportResolver for WorkspaceImportResolver<'_> {
    fn fixes(&self, view: &PackageView<'_>, file: &ParsedFile) -> Result<Vec<ImportFix>, RefactorError> {
        let program = view.program();
        let tree = &file.tree;
        let errors: Vec<_> = view
            .type_errors()
            .iter()
            .filter(|e| file.contains_pos(e.pos))
            .collect();

        let mut deletes = Vec::new();
        for err in &errors {
            if !unused_import_re().is_match(&err.message) {
                continue;
            }
            let Some(offset) = file.offset(err.pos) else { continue };
            let Some(info) = file_imports(program, file)
                .into_iter()
                .find(|i| tree.range(i.spec).contains_inclusive(offset))
            else {
                continue;
            };
            deletes.push(ImportFix {
                kind: ImportFixKind::Delete,
                ident: info.local.clone(),
                path: info.path,
                name: info.name,
            });
        }

        let known = self.snapshot.known_packages()?;
        let mut adds: Vec<ImportFix> = Vec::new();
        for err in &errors {
            let Some(caps) = undefined_re().captures(&err.message) else {
                continue;
            };
            let ident = caps[1].to_string();
            if adds.iter().any(|f| f.ident == ident) {
                continue;
            }
            let Some(offset) = file.offset(err.pos) else { continue };
            let (path, _) = vega_syntax::path_enclosing_interval(tree, &file.text, offset, offset);
            let selected = path.iter().find_map(|&n| match tree.kind(n) {
                NodeKind::Selector { x, sel } if tree.ident_name(*x).is_some_and(|x| *x == ident) => {
                    tree.ident_name(*sel).map(|s| s.to_string())
                }
                _ => None,
            });
            let Some(selected) = selected else { continue };
            let exports = |pkg_path: &str| {
                program.package_by_path(pkg_path).is_some_and(|p| {
                    program
                        .scope(program.package(p).scope)
                        .lookup(&selected)
                        .is_some_and(|o| program.obj(o).is_exported())
                })
            };
            let best = known
                .iter()
                .filter(|k| k.name == ident.as_str() && k.path != view.path())
                .min_by_key(|k| {
                    (
                        !exports(&k.path),
                        !stdlib::is_std_path(&k.path),
                        k.path.len(),
                        k.path.clone(),
                    )
                });
            if let Some(best) = best {
                adds.push(ImportFix {
                    kind: ImportFixKind::Add,
                    name: (last_segment(&best.path) != ident).then(|| ident.clone()),
                    path: best.path.clone(),
                    ident,
                });
            }
        }

        // A needed path that is imported under an unused name is renamed.
        let mut fixes = Vec::new();
        for add in adds {
            match deletes.iter().position(|d| d.path == add.path) {
                Some(i) => {
                    deletes.remove(i);
                    fixes.push(ImportFix {
                        kind: ImportFixKind::SetName,
                        ..add
                    });
                }
                None => fixes.push(add),
            }
        }
        fixes.extend(deletes);
        tracing::debug!(target: "vega.refactor", file = %file.file, fixes = fixes.len(), "resolved imports");
        Ok(fixes)
    }
}

/// The edits applying one import fix.
pub fn import_fix_edits(program: &Program, file: &ParsedFile, fix: &ImportFix) -> Vec<Edit> {
    let tree = &file.tree;
    let existing = file_imports(program, file).into_iter().find(|i| i.path == fix.path);
    match fix.kind {
        ImportFixKind::Add => add_named_imports_edits(file, &[(fix.path.clone(), fix.name.clone())]),
        ImportFixKind::Delete => existing.map_or_else(Vec::new, |i| delete_import_edits(file, i.spec)),
        ImportFixKind::SetName => {
            let Some(info) = existing else { return Vec::new() };
            let NodeKind::ImportSpec { name, path } = tree.kind(info.spec) else {
                return Vec::new();
            };
            match (name, &fix.name) {
                (Some(old), Some(new)) => {
                    let (s, e) = file.node_pos(*old);
                    vec![Edit::replace(s, e, new.clone())]
                }
                (Some(old), None) => {
                    let (s, _) = file.node_pos(*old);
                    let (p, _) = file.node_pos(*path);
                    vec![Edit::delete(s, p)]
                }
                (None, Some(new)) => vec![Edit::insert(file.node_pos(*path).0, format!("{new} "))],
                (None, None) => Vec::new(),
            }
        }
    }
}

/// One suggested fix per import fix.
pub fn import_quick_fixes(
    view: &PackageView<'_>,
    file: &ParsedFile,
    resolver: &dyn ImportResolver,
) -> Result<Vec<(ImportFix, SuggestedFix)>, RefactorError> {
    let fixes = resolver.fixes(view, file)?;
    Ok(fixes
        .into_iter()
        .filter_map(|fix| {
            let edits = import_fix_edits(view.program(), file, &fix);
            (!edits.is_empty()).then(|| {
                let suggested = SuggestedFix::new(fix.title(), edits);
                (fix, suggested)
            })
        })
        .collect())
}

/// Apply every import fix and sort the imports: one declaration, standard
/// library group first, each group sorted by path. `None` when the imports
/// are already organized.
pub fn organize_imports(
    view: &PackageView<'_>,
    file: &ParsedFile,
    resolver: &dyn ImportResolver,
) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = view.program();
    let tree = &file.tree;
    let fixes = resolver.fixes(view, file)?;
    let decls = import_decls(tree);

    let Some((&first, &last)) = decls.first().zip(decls.last()) else {
        let adds: Vec<(String, Option<String>)> = fixes
            .iter()
            .filter(|f| f.kind == ImportFixKind::Add)
            .map(|f| (f.path.clone(), f.name.clone()))
            .collect();
        let edits = add_named_imports_edits(file, &adds);
        return Ok((!edits.is_empty()).then(|| SuggestedFix::new("Organize imports", edits)));
    };
    let interleaved = tree
        .decls()
        .iter()
        .any(|d| !decls.contains(d) && tree.range(*d).start() > tree.range(first).start() && tree.range(*d).end() < tree.range(last).end());
    if interleaved {
        return Err(RefactorError::structural("imports are interleaved with declarations"));
    }

    let mut specs: Vec<(String, Option<String>, String)> = Vec::new();
    for info in file_imports(program, file) {
        if fixes.iter().any(|f| f.kind == ImportFixKind::Delete && f.path == info.path) {
            continue;
        }
        let name = match fixes.iter().find(|f| f.kind == ImportFixKind::SetName && f.path == info.path) {
            Some(f) => f.name.clone(),
            None => info.name.clone(),
        };
        specs.push((info.path.clone(), name, trailing_comment(file, info.spec)));
    }
    for fix in fixes.iter().filter(|f| f.kind == ImportFixKind::Add) {
        specs.push((fix.path.clone(), fix.name.clone(), String::new()));
    }
    specs.sort();
    specs.dedup_by(|a, b| a.0 == b.0 && a.1 == b.1);

    let start = tree.range(first).start();
    let mut end = tree.range(last).end();
    let comment = trailing_comment(file, last);
    if !comment.is_empty() {
        let line_end = line_end_inclusive(file, end);
        end = line_end - TextSize::of(if file.text[..usize::from(line_end)].ends_with('\n') { "\n" } else { "" });
    }
    let old = &file.text[usize::from(start)..usize::from(end)];
    let new = render_specs(&specs);
    if old == new {
        return Ok(None);
    }
    let edits = if new.is_empty() {
        let end = line_end_inclusive(file, end);
        let end = if file.text[usize::from(end)..].starts_with('\n') {
            end + TextSize::from(1)
        } else {
            end
        };
        vec![Edit::delete(file.pos(start), file.pos(end))]
    } else {
        diff_edits(old, &new, start)
            .into_iter()
            .map(|e| Edit::replace(file.pos(e.range.start()), file.pos(e.range.end()), e.replacement))
            .collect()
    };
    Ok(Some(SuggestedFix::new("Organize imports", edits)))
}

fn trailing_comment(file: &ParsedFile, spec: NodeId) -> String {
    let end = file.tree.range(spec).end();
    let line_end = line_end_inclusive(file, end);
    let rest = file.text[usize::from(end)..usize::from(line_end)].trim();
    if rest.starts_with("//") {
        format!(" {rest}")
    } else {
        String::new()
    }
}

fn render_specs(specs: &[(String, Option<String>, String)]) -> String {
    match specs {
        [] => String::new(),
        [(path, name, comment)] => format!("import {}{comment}", spec_text(path, name.as_deref())),
        _ => {
            let (std, other): (Vec<_>, Vec<_>) = specs.iter().partition(|(p, _, _)| stdlib::is_std_path(p));
            let mut out = String::from("import (\n");
            for (i, group) in [std, other].iter().filter(|g| !g.is_empty()).enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                for (path, name, comment) in group {
                    out.push('\t');
                    out.push_str(&spec_text(path, name.as_deref()));
                    out.push_str(comment);
                    out.push('\n');
                }
            }
            out.push(')');
            out
        }
    }
}

/// Add `import _ "embed"` to a file using `//go:embed` directives without
/// importing the package.
pub(crate) fn add_embed_import(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let file = input.file;
    let has_directive = file
        .tokens
        .iter()
        .any(|t| t.kind == TokenKind::Comment && file.slice(t.range).starts_with("//go:embed"));
    let imported = file.tree.imports().iter().any(|s| file.tree.import_path(*s).as_deref() == Some("embed"));
    if !has_directive || imported {
        return Ok(None);
    }
    let edits = add_named_imports_edits(file, &[("embed".to_string(), Some("_".to_string()))]);
    Ok(Some(SuggestedFix::new("Add missing \"embed\" import", edits)))
}
