//! Extract function and extract method.
//!
//! The selected statements move into a new declaration placed after the
//! enclosing top-level declaration. Locals declared before the selection
//! become parameters; locals the rest of the function still reads become
//! results. A `return` inside the selection is threaded back to the call
//! site, either directly (the selection ends in a `return`) or through a
//! trailing `shouldReturn` flag.

use std::collections::HashSet;

use vega_core::TextRange;
use vega_syntax::{NodeId, NodeKind, ParsedFile, TokenKind};
use vega_types::{ObjId, ObjKind, Program, Qualifier, Type, TypeId, VarKind};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::qualify::TypeSpeller;
use crate::util;
use crate::RefactorError;

/// A run of whole statements of one statement list.
struct Region {
    stmts: Vec<NodeId>,
    range: TextRange,
    /// Innermost function containing the statements.
    func: NodeId,
    decl: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// No `return` in the selection.
    Plain,
    /// The selection ends with a `return`.
    Direct,
    /// Some nested statement returns.
    Conditional,
}

/// Checks that the selection can become a function; `Ok(true)` when it
/// can become a method as well.
pub fn probe_extract_function(input: &FileInput<'_>) -> Result<bool, RefactorError> {
    let region = region(input)?;
    check_branches(&input.file.tree, &region)?;
    Ok(receiver(input.file, region.decl).is_some())
}

pub(crate) fn extract_function(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    extract(input, false).map(Some)
}

pub(crate) fn extract_method(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    extract(input, true).map(Some)
}

fn region(input: &FileInput<'_>) -> Result<Region, RefactorError> {
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    if selection.in_header() {
        return Err(RefactorError::structural("cannot extract from the package clause or imports"));
    }
    let (start, end) = (selection.start, selection.end);
    if start == end {
        return Err(RefactorError::structural("select the statements to extract"));
    }
    let overlaps = |n: NodeId| {
        let r = tree.range(n);
        r.start() < end && start < r.end()
    };
    let owner = selection
        .path
        .iter()
        .copied()
        .find(|&n| util::stmt_list(tree, n).iter().any(|s| overlaps(*s)))
        .ok_or_else(|| RefactorError::structural("selection does not contain statements"))?;
    let stmts: Vec<NodeId> = util::stmt_list(tree, owner)
        .iter()
        .copied()
        .filter(|s| overlaps(*s))
        .collect();
    let (Some(&first), Some(&last)) = (stmts.first(), stmts.last()) else {
        return Err(RefactorError::structural("selection does not contain statements"));
    };
    let range = TextRange::new(tree.range(first).start(), tree.range(last).end());
    if range.start() < start || end < range.end() {
        return Err(RefactorError::structural("selection must cover whole statements"));
    }
    let stray = file.tokens.iter().any(|t| {
        let leading = t.range.start() < range.start() && t.range.end() > start;
        let trailing = t.range.start() >= range.end() && t.range.start() < end;
        (leading || trailing)
            && !t.implicit
            && !matches!(t.kind, TokenKind::Comment | TokenKind::Semicolon | TokenKind::Eof)
    });
    if stray {
        return Err(RefactorError::structural("selection must cover whole statements"));
    }

    let path: Vec<NodeId> = std::iter::once(owner).chain(tree.ancestors(owner)).collect();
    let func = util::enclosing_func(tree, &path)
        .ok_or_else(|| RefactorError::structural("statements are not inside a function"))?;
    let decl = vega_syntax::path::enclosing_top_level_decl(&path)
        .ok_or_else(|| RefactorError::structural("no enclosing declaration"))?;
    Ok(Region {
        stmts,
        range,
        func,
        decl,
    })
}

/// The named receiver of a method declaration: `(field, name)`.
fn receiver(file: &ParsedFile, decl: NodeId) -> Option<(NodeId, NodeId)> {
    let tree = &file.tree;
    let NodeKind::FuncDecl { recv: Some(recv), .. } = tree.kind(decl) else {
        return None;
    };
    let NodeKind::FieldList { fields, .. } = tree.kind(*recv) else {
        return None;
    };
    let field = *fields.first()?;
    let NodeKind::Field { names, .. } = tree.kind(field) else {
        return None;
    };
    let name = *names.first()?;
    (tree.ident_name(name).is_some_and(|n| n != "_")).then_some((*recv, name))
}

/// Every `break`, `continue` and `goto` must land inside the selection.
fn check_branches(tree: &vega_syntax::SyntaxTree, region: &Region) -> Result<(), RefactorError> {
    let inside = |n: NodeId| region.range.contains_range(tree.range(n));
    let labeled_inside = |label: &str| {
        region.stmts.iter().any(|s| {
            let mut found = false;
            tree.walk(*s, &mut |n| {
                if let NodeKind::Labeled { label: l, .. } = tree.kind(n) {
                    found |= tree.ident_name(*l).is_some_and(|name| name == label);
                }
                !found
            });
            found
        })
    };
    for &stmt in &region.stmts {
        let mut problem = None;
        tree.walk(stmt, &mut |n| {
            if problem.is_some() {
                return false;
            }
            match tree.kind(n) {
                NodeKind::FuncLit { .. } => return false,
                NodeKind::Defer { .. } => problem = Some("cannot extract a defer statement"),
                NodeKind::Branch { tok, label } => {
                    let lands_inside = match (tok, label) {
                        (TokenKind::Fallthrough, _) => false,
                        (_, Some(label)) => tree.ident_name(*label).is_some_and(|l| labeled_inside(l)),
                        (TokenKind::Break | TokenKind::Continue, None) => tree
                            .ancestors(n)
                            .take_while(|a| inside(*a))
                            .any(|a| match tree.kind(a) {
                                NodeKind::For { .. } | NodeKind::Range { .. } => true,
                                NodeKind::Switch { .. } | NodeKind::TypeSwitch { .. } | NodeKind::Select { .. } => {
                                    *tok == TokenKind::Break
                                }
                                _ => false,
                            }),
                        _ => false,
                    };
                    if !lands_inside {
                        problem = Some("a branch statement jumps out of the selection");
                    }
                }
                _ => {}
            }
            true
        });
        if let Some(message) = problem {
            return Err(RefactorError::structural(message));
        }
    }
    Ok(())
}

/// The variable written through `node` when it is assigned to or has its
/// address taken: `x`, `x.f` of a struct value, `x[i]` of an array.
fn mutated_root(program: &Program, file: &ParsedFile, node: NodeId) -> Option<ObjId> {
    let tree = &file.tree;
    let types = program.types();
    let mut node = node;
    loop {
        node = tree.unparen(node);
        match tree.kind(node) {
            NodeKind::Ident { .. } => return program.object_of(file, node),
            NodeKind::Selector { x, .. } => {
                let x_ty = program.type_of(file, *x)?;
                if matches!(types.get(types.underlying(x_ty)), Type::Pointer(_)) {
                    return None;
                }
                node = *x;
            }
            NodeKind::Index { x, .. } => {
                let x_ty = program.type_of(file, *x)?;
                if !matches!(types.get(types.underlying(x_ty)), Type::Array { .. }) {
                    return None;
                }
                node = *x;
            }
            _ => return None,
        }
    }
}

fn assigned_objects(program: &Program, file: &ParsedFile, stmts: &[NodeId]) -> HashSet<ObjId> {
    let tree = &file.tree;
    let mut out = HashSet::new();
    for &stmt in stmts {
        tree.walk(stmt, &mut |n| {
            let targets: Vec<NodeId> = match tree.kind(n) {
                NodeKind::Assign { lhs, .. } => lhs.clone(),
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
            out.extend(targets.into_iter().filter_map(|t| mutated_root(program, file, t)));
            true
        });
    }
    out
}

fn is_selected_name(tree: &vega_syntax::SyntaxTree, node: NodeId) -> bool {
    tree.parent(node)
        .is_some_and(|p| matches!(tree.kind(p), NodeKind::Selector { sel, .. } if *sel == node))
}

/// `*testing.T` and friends, and `context.Context`, lead the parameter list.
fn is_leading_param(program: &Program, ty: TypeId) -> bool {
    matches!(
        program.type_string(ty, Qualifier::Path).as_str(),
        "*testing.T" | "*testing.B" | "*testing.F" | "testing.TB" | "context.Context"
    )
}

fn extract(input: &FileInput<'_>, method: bool) -> Result<SuggestedFix, RefactorError> {
    let program = input.program();
    let types = program.types();
    let file = input.file;
    let tree = &file.tree;
    let region = region(input)?;
    check_branches(tree, &region)?;

    if matches!(tree.kind(region.decl), NodeKind::FuncDecl { .. }) && util::is_generic_func(program, file, region.decl) {
        return Err(RefactorError::semantic("cannot extract from a generic function"));
    }
    let recv = if method {
        Some(receiver(file, region.decl).ok_or_else(|| RefactorError::structural("enclosing function is not a method with a named receiver"))?)
    } else {
        None
    };
    let recv_obj = recv.and_then(|(_, name)| program.object_of(file, name));

    // Locals the statements reference, split by where they are declared.
    let mut params: Vec<ObjId> = Vec::new();
    let mut declared_inside: Vec<ObjId> = Vec::new();
    for &stmt in &region.stmts {
        for ident in util::idents(tree, stmt) {
            if is_selected_name(tree, ident) {
                continue;
            }
            let Some(obj) = program.object_of(file, ident) else {
                continue;
            };
            if !util::is_local(program, obj) {
                continue;
            }
            let object = program.obj(obj);
            match object.kind {
                ObjKind::TypeName { .. } => {
                    return Err(RefactorError::semantic("cannot extract code that uses a local type"));
                }
                ObjKind::Var(VarKind::Field) => continue,
                ObjKind::Var(_) | ObjKind::Const(_) => {}
                _ => continue,
            }
            let inside = file.offset(object.pos).is_some_and(|o| region.range.contains(o));
            if inside {
                if !declared_inside.contains(&obj) {
                    declared_inside.push(obj);
                }
            } else if Some(obj) != recv_obj && !params.contains(&obj) {
                params.push(obj);
            }
        }
    }
    let lead: Vec<ObjId> = params.iter().copied().filter(|p| is_leading_param(program, program.obj(*p).ty)).collect();
    params.retain(|p| !lead.contains(p));
    params.splice(0..0, lead);

    // Locals read after the selection, or anywhere in an enclosing loop.
    let (_, body) = util::func_parts(tree, region.func).ok_or_else(|| RefactorError::Bug("function without parts".into()))?;
    let body = body.ok_or_else(|| RefactorError::structural("function has no body"))?;
    let loop_start = tree
        .ancestors(region.stmts[0])
        .take_while(|a| *a != region.func)
        .filter(|a| matches!(tree.kind(*a), NodeKind::For { .. } | NodeKind::Range { .. }))
        .last()
        .map(|l| tree.range(l).start());
    let used_after: HashSet<ObjId> = util::idents(tree, body)
        .into_iter()
        .filter(|id| {
            let at = tree.range(*id).start();
            at >= region.range.end() || loop_start.is_some_and(|l| at >= l && at < region.range.start())
        })
        .filter_map(|id| program.object_of(file, id))
        .collect();
    let assigned = assigned_objects(program, file, &region.stmts);
    let mut ret_vars: Vec<ObjId> = params
        .iter()
        .copied()
        .filter(|p| assigned.contains(p) && used_after.contains(p))
        .collect();
    let redefined = ret_vars.len();
    ret_vars.extend(declared_inside.iter().copied().filter(|v| used_after.contains(v)));

    let returns: Vec<NodeId> = region
        .stmts
        .iter()
        .flat_map(|s| util::collect_outside_func_lits(tree, *s, |k| matches!(k, NodeKind::Return { .. })))
        .collect();
    let last = region.stmts[region.stmts.len() - 1];
    let shape = if matches!(tree.kind(last), NodeKind::Return { .. }) {
        Shape::Direct
    } else if returns.is_empty() {
        Shape::Plain
    } else {
        Shape::Conditional
    };
    let enclosing = util::func_signature(program, file, region.func)
        .ok_or_else(|| RefactorError::semantic("enclosing function is not type-checked"))?;
    if shape != Shape::Plain {
        for ret in &returns {
            let NodeKind::Return { results } = tree.kind(*ret) else {
                continue;
            };
            if results.is_empty() && !enclosing.results.is_empty() {
                return Err(RefactorError::semantic("cannot extract a bare return of named results"));
            }
            if shape == Shape::Conditional && results.len() == 1 && enclosing.results.len() > 1 {
                return Err(RefactorError::semantic("cannot extract a return of a multi-value call"));
            }
        }
    }

    let speller = TypeSpeller::new(program, file, input.view.id());
    let var_ty = |obj: ObjId| types.default_type(program.obj(obj).ty);
    for &p in params.iter().chain(&ret_vars) {
        if types.is_type_param(var_ty(p)) {
            return Err(RefactorError::semantic("cannot extract code using type parameters"));
        }
    }
    let name_of = |obj: ObjId| program.obj(obj).name.to_string();

    let start_pos = file.pos(region.range.start());
    let scope = program
        .scope_at(file, start_pos)
        .ok_or_else(|| RefactorError::Bug("no scope at the selection".into()))?;
    let mut taken: Vec<String> = params.iter().chain(&ret_vars).map(|o| name_of(*o)).collect();
    let mut fresh = |base: &str| {
        let name = util::fresh_name(program, scope, start_pos, base, &taken);
        taken.push(name.clone());
        name
    };
    let result_names: Vec<String> = match shape {
        Shape::Conditional => enclosing.results.iter().map(|_| fresh("ret")).collect(),
        _ => Vec::new(),
    };
    let should_return = (shape == Shape::Conditional).then(|| fresh("shouldReturn"));

    // The new declaration.
    let mut result_types: Vec<String> = Vec::new();
    match shape {
        Shape::Plain => result_types.extend(ret_vars.iter().map(|v| speller.type_string(var_ty(*v)))),
        Shape::Direct => result_types.extend(enclosing.results.iter().map(|r| speller.type_string(r.ty))),
        Shape::Conditional => {
            result_types.extend(ret_vars.iter().map(|v| speller.type_string(var_ty(*v))));
            result_types.extend(enclosing.results.iter().map(|r| speller.type_string(r.ty)));
            result_types.push("bool".into());
        }
    }
    let results_text = match result_types.as_slice() {
        [] => String::new(),
        [one] => format!(" {one}"),
        many => format!(" ({})", many.join(", ")),
    };
    let params_text = params
        .iter()
        .map(|p| format!("{} {}", name_of(*p), speller.type_string(var_ty(*p))))
        .collect::<Vec<_>>()
        .join(", ");

    let mut replacements = Vec::new();
    if shape == Shape::Conditional {
        for &ret in &returns {
            let NodeKind::Return { results } = tree.kind(ret) else {
                continue;
            };
            let mut parts: Vec<String> = ret_vars.iter().map(|v| speller.zero_value(var_ty(*v))).collect();
            parts.extend(results.iter().map(|r| file.text_of(*r).to_string()));
            parts.push("true".into());
            replacements.push((tree.range(ret), format!("return {}", parts.join(", "))));
        }
    }
    let source = &file.text[region.range];
    let moved = util::splice(source, region.range.start(), replacements);
    let indent = file.indent_at(region.range.start()).to_string();
    let mut body_text = format!("\t{}", util::reindent(&moved, &indent, "\t"));
    match shape {
        Shape::Plain if !ret_vars.is_empty() => {
            let names: Vec<String> = ret_vars.iter().map(|v| name_of(*v)).collect();
            body_text.push_str(&format!("\n\treturn {}", names.join(", ")));
        }
        Shape::Conditional => {
            let mut parts: Vec<String> = ret_vars.iter().map(|v| name_of(*v)).collect();
            parts.extend(enclosing.results.iter().map(|r| speller.zero_value(r.ty)));
            parts.push("false".into());
            body_text.push_str(&format!("\n\treturn {}", parts.join(", ")));
        }
        _ => {}
    }

    let pkg = input.view.id();
    let recv_ty = recv_obj.map(|o| program.obj(o).ty);
    let file_scope = program.file_scope(file);
    let base = if method { "newMethod" } else { "newFunction" };
    let func_name = (0..)
        .map(|n| if n == 0 { base.to_string() } else { format!("{base}{n}") })
        .find(|name| {
            input.view.lookup(name).is_none()
                && file_scope.map_or(true, |s| program.scope(s).lookup(name).is_none())
                && recv_ty.map_or(true, |t| program.lookup_field_or_method(t, true, Some(pkg), name).is_none())
        })
        .unwrap_or_else(|| base.to_string());
    let recv_text = match recv {
        Some((list, _)) => format!("{} ", file.text_of(list)),
        None => String::new(),
    };
    let decl_text = format!("\n\nfunc {recv_text}{func_name}({params_text}){results_text} {{\n{body_text}\n}}");

    // The call site.
    let callee = match recv {
        Some((_, name)) => format!("{}.{func_name}", file.text_of(name)),
        None => func_name.clone(),
    };
    let args = params.iter().map(|p| name_of(*p)).collect::<Vec<_>>().join(", ");
    let call = format!("{callee}({args})");
    let call_site = match shape {
        Shape::Plain if ret_vars.is_empty() => call,
        Shape::Plain => bind_results(&speller, program, &ret_vars, redefined, &[], &call, &indent),
        Shape::Direct if enclosing.results.is_empty() => format!("{call}\n{indent}return"),
        Shape::Direct => format!("return {call}"),
        Shape::Conditional => {
            let should = should_return.unwrap_or_else(|| "shouldReturn".to_string());
            let mut extra: Vec<(String, String)> = result_names
                .iter()
                .zip(&enclosing.results)
                .map(|(n, r)| (n.clone(), speller.type_string(r.ty)))
                .collect();
            extra.push((should.clone(), "bool".into()));
            let assign = bind_results(&speller, program, &ret_vars, redefined, &extra, &call, &indent);
            let ret = if result_names.is_empty() {
                "return".to_string()
            } else {
                format!("return {}", result_names.join(", "))
            };
            format!("{assign}\n{indent}if {should} {{\n{indent}\t{ret}\n{indent}}}")
        }
    };

    let (_, decl_end) = file.node_pos(region.decl);
    let mut edits = vec![
        Edit::replace(file.pos(region.range.start()), file.pos(region.range.end()), call_site),
        Edit::insert(decl_end, decl_text),
    ];
    edits.extend(speller.import_edits());
    tracing::debug!(
        target: "vega.refactor",
        file = %file.file,
        params = params.len(),
        results = ret_vars.len(),
        ?shape,
        "extracting function"
    );
    let title = if method { "Extract method" } else { "Extract function" };
    Ok(SuggestedFix::new(title, edits))
}

/// `a, b := call`, or, when some of the names already exist, declarations
/// of the new ones followed by `a, b = call`. The first `redefined` of
/// `vars` exist already; `extra` names are always new.
fn bind_results(
    speller: &TypeSpeller<'_>,
    program: &Program,
    vars: &[ObjId],
    redefined: usize,
    extra: &[(String, String)],
    call: &str,
    indent: &str,
) -> String {
    let types = program.types();
    let mut lhs: Vec<String> = vars.iter().map(|v| program.obj(*v).name.to_string()).collect();
    lhs.extend(extra.iter().map(|(n, _)| n.clone()));
    if redefined == 0 {
        return format!("{} := {call}", lhs.join(", "));
    }
    let mut out = String::new();
    for v in &vars[redefined..] {
        let obj = program.obj(*v);
        out.push_str(&format!("var {} {}\n{indent}", obj.name, speller.type_string(types.default_type(obj.ty))));
    }
    for (name, ty) in extra {
        out.push_str(&format!("var {name} {ty}\n{indent}"));
    }
    out.push_str(&format!("{} = {call}", lhs.join(", ")));
    out
}
