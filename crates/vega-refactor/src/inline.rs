//! Inlining a call to a declared function.
//!
//! The inliner replaces one call with the callee's body, binding arguments
//! to fresh variables where substituting them would change evaluation order
//! or repeat side effects. It is conservative: when in doubt it refuses.

use std::panic::{self, AssertUnwindSafe};

use vega_core::TextRange;
use vega_syntax::printer::{context_precedence, expr_precedence, HIGHEST_PREC, UNARY_PREC};
use vega_syntax::{NodeId, NodeKind, ParsedFile, Pos, SyntaxTree, TokenKind};
use vega_types::{Builtin, NodeKey, ObjId, ObjKind, PkgId, Program, ScopeId, SelectionKind, Type, TypeId};

use crate::edit::Edit;
use crate::imports;
use crate::qualify::TypeSpeller;
use crate::util::{self, StmtSite};
use crate::RefactorError;

/// One call to inline.
#[derive(Clone, Copy)]
pub struct InlineRequest<'a> {
    pub program: &'a Program,
    pub caller: &'a ParsedFile,
    pub caller_pkg: PkgId,
    pub call: NodeId,
    pub callee_file: &'a ParsedFile,
    /// The callee's `FuncDecl`.
    pub callee_decl: NodeId,
    pub callee: ObjId,
}

pub trait Inliner {
    /// Edits to the caller's file, in positions of the request's program.
    fn inline(&self, req: &InlineRequest<'_>) -> Result<Vec<Edit>, RefactorError>;
}

/// Run `inliner`, turning a panic into an internal error.
pub fn guarded_inline(inliner: &dyn Inliner, req: &InlineRequest<'_>) -> Result<Vec<Edit>, RefactorError> {
    match panic::catch_unwind(AssertUnwindSafe(|| inliner.inline(req))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(
                target: "vega.refactor",
                callee = %req.program.obj(req.callee).name,
                file = %req.caller.file,
                %message,
                "inliner panicked"
            );
            Err(RefactorError::Bug(format!("inliner panicked: {message}")))
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleInliner;

enum Body {
    Expr(NodeId),
    /// `return a, b` for a call that is the only value on its right-hand side.
    Exprs(Vec<NodeId>),
    Stmts(Vec<NodeId>),
}

struct Actual {
    text: String,
    prec: u8,
    pure: bool,
    /// Literals, constants and plain identifiers.
    duplicable: bool,
    /// Constants and caller-local variables; their value cannot change while
    /// the callee body runs.
    stable: bool,
    /// Converting to the parameter type is needed to keep its type.
    convert: bool,
    /// Caller nodes the text came from.
    nodes: Vec<NodeId>,
    /// A receiver without its `&` or `*`, for uses as the `x` of `x.f`.
    plain: Option<(String, u8)>,
}

struct Slot {
    name: String,
    ty: TypeId,
    uses: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Plan {
    Drop,
    Discard,
    Subst,
    /// Substitute an argument with effects, evaluated at its use.
    SubstOrdered,
    Bind(String),
}

impl Inliner for SimpleInliner {
    fn inline(&self, req: &InlineRequest<'_>) -> Result<Vec<Edit>, RefactorError> {
        let program = req.program;
        let caller = req.caller;
        let ctree = &caller.tree;
        let callee_file = req.callee_file;
        let btree = &callee_file.tree;
        let callee_name = program.obj(req.callee).name.clone();

        let NodeKind::FuncDecl { body, .. } = btree.kind(req.callee_decl) else {
            return Err(RefactorError::Bug("callee is not a function declaration".into()));
        };
        let body = body.ok_or_else(|| RefactorError::semantic(format!("{callee_name} has no body")))?;
        if util::is_generic_func(program, callee_file, req.callee_decl) {
            return Err(RefactorError::semantic("cannot inline a generic function"));
        }
        let sig = util::func_signature(program, callee_file, req.callee_decl)
            .ok_or_else(|| RefactorError::Bug(format!("{callee_name} has no signature")))?;
        if sig.results.iter().any(|r| !r.name.is_empty()) {
            return Err(RefactorError::semantic("cannot inline a function with named results"));
        }
        check_body(program, callee_file, body, req.callee)?;

        let outer = outer_expr(ctree, req.call);
        let context = ctree.parent(outer).map(|p| ctree.kind(p).clone());
        let value_unused = matches!(
            context,
            Some(NodeKind::ExprStmt { .. } | NodeKind::Go { .. } | NodeKind::Defer { .. })
        );
        let in_go_or_defer = matches!(context, Some(NodeKind::Go { .. } | NodeKind::Defer { .. }));
        let form = body_form(callee_file, body, ctree, outer, value_unused)?;
        match &form {
            Body::Expr(e) if in_go_or_defer && !matches!(btree.kind(btree.unparen(*e)), NodeKind::Call { .. }) => {
                return Err(RefactorError::semantic("cannot inline into a go or defer statement"));
            }
            Body::Stmts(_) if in_go_or_defer => {
                return Err(RefactorError::semantic("cannot inline into a go or defer statement"));
            }
            _ => {}
        }

        let speller = TypeSpeller::new(program, caller, req.caller_pkg);
        let (slots, actuals) = bind_arguments(req, &sig, &speller, body)?;
        let body_root = match &form {
            Body::Expr(e) => *e,
            _ => body,
        };
        let body_effects = util::has_effects(program, callee_file, body_root);
        let mut plans = plan_arguments(program, callee_file, &slots, &actuals, &form, body_effects);

        let call_start = ctree.range(req.call).start();
        let call_pos = caller.pos(call_start);
        let call_scope = program
            .scope_at(caller, call_pos)
            .ok_or_else(|| RefactorError::Bug(format!("no scope at {call_pos:?}")))?;

        // Locals the statement form declares land in the caller's block.
        let mut taken: Vec<String> = util::idents(btree, body)
            .into_iter()
            .filter_map(|id| btree.ident_name(id).map(|n| n.to_string()))
            .collect();
        if let Body::Stmts(_) = &form {
            for ident in util::idents(btree, body) {
                if !program.info().defs.contains_key(&NodeKey::new(callee_file, ident)) {
                    continue;
                }
                if util::enclosing_stmt(btree, ident).map(|s| s.owner) != Some(body) {
                    continue;
                }
                let Some(name) = btree.ident_name(ident) else { continue };
                if name == "_" {
                    continue;
                }
                if program.lookup_parent(call_scope, name, call_pos).is_some()
                    || !program.is_free_in_subtree(call_scope, name)
                {
                    return Err(RefactorError::semantic(format!(
                        "{name} declared in {callee_name} would conflict with the caller"
                    )));
                }
            }
        }

        let needs_site = plans.iter().any(|p| matches!(p, Plan::Bind(_) | Plan::Discard));
        let site = match (&form, needs_site) {
            (Body::Stmts(_), _) => Some(
                util::enclosing_stmt(ctree, req.call)
                    .ok_or_else(|| RefactorError::Bug("call statement is not in a block".into()))?,
            ),
            (_, true) => Some(binding_site(ctree, req.call)?),
            (_, false) => None,
        };

        let mut bindings = Vec::new();
        if let Some(site) = site {
            let insert_at = ctree.range(site.stmt).start();
            let insert_pos = caller.pos(insert_at);
            let scope = program
                .scope_at(caller, insert_pos)
                .ok_or_else(|| RefactorError::Bug(format!("no scope at {insert_pos:?}")))?;
            let moves_effects = plans
                .iter()
                .zip(&actuals)
                .any(|(plan, actual)| matches!(plan, Plan::Bind(_) | Plan::Discard) && !actual.pure);
            if moves_effects && effects_before(program, caller, site.stmt, req.call) {
                return Err(RefactorError::semantic(
                    "cannot preserve evaluation order of the arguments",
                ));
            }
            for (i, plan) in plans.iter_mut().enumerate() {
                let (slot, actual) = (&slots[i], &actuals[i]);
                match plan {
                    Plan::Bind(name) => {
                        check_visible(program, caller, &actual.nodes, scope, insert_pos)?;
                        let base = if slot.name.is_empty() || slot.name == "_" { "arg" } else { slot.name.as_str() };
                        let fresh = util::fresh_name(program, scope, insert_pos, base, &taken);
                        taken.push(fresh.clone());
                        bindings.push(if actual.convert {
                            format!("var {fresh} {} = {}", speller.type_string(slot.ty), actual.text)
                        } else {
                            format!("{fresh} := {}", actual.text)
                        });
                        *name = fresh;
                    }
                    Plan::Discard => {
                        check_visible(program, caller, &actual.nodes, scope, insert_pos)?;
                        bindings.push(format!("_ = {}", actual.text));
                    }
                    _ => {}
                }
            }
        }

        // Rewrite the body's free names for the caller.
        let mut replacements: Vec<(TextRange, String)> = Vec::new();
        let mut qualifier = Qualifier::new(program, caller, call_scope, call_pos);
        let callee_pkg = program.obj(req.callee).pkg;
        for ident in util::idents(btree, body_root) {
            if slots.iter().any(|s| s.uses.contains(&ident)) {
                continue;
            }
            if let Some(selector) = selected_by(btree, ident) {
                if let Some(sel) = program.info().selections.get(&NodeKey::new(callee_file, selector)) {
                    let obj = program.obj(sel.obj);
                    if !obj.is_exported() && obj.pkg != Some(req.caller_pkg) {
                        return Err(RefactorError::semantic(format!(
                            "{callee_name} refers to unexported {}",
                            obj.name
                        )));
                    }
                }
                continue;
            }
            let Some(obj_id) = program.object_of(callee_file, ident) else {
                continue;
            };
            if program.info().defs.contains_key(&NodeKey::new(callee_file, ident)) || util::is_local(program, obj_id) {
                continue;
            }
            let obj = program.obj(obj_id);
            let name = obj.name.to_string();
            match &obj.kind {
                ObjKind::PkgName { path, imported } => {
                    let default = imported.map_or_else(
                        || path.rsplit('/').next().unwrap_or(path).to_string(),
                        |p| program.package(p).name.to_string(),
                    );
                    let local = qualifier.import_name(path, &default)?;
                    if local != name {
                        replacements.push((btree.range(ident), local));
                    }
                }
                _ if obj.is_field() => {
                    if !obj.is_exported() && obj.pkg != Some(req.caller_pkg) {
                        return Err(RefactorError::semantic(format!("{callee_name} refers to unexported {name}")));
                    }
                }
                _ if obj.pkg.is_none() || obj.pkg == Some(req.caller_pkg) => {
                    if program.lookup_parent(call_scope, &name, call_pos).map(|(_, o)| o) != Some(obj_id) {
                        return Err(RefactorError::semantic(format!("{name} is shadowed at the call site")));
                    }
                }
                _ => {
                    if !obj.is_exported() {
                        return Err(RefactorError::semantic(format!("{callee_name} refers to unexported {name}")));
                    }
                    let Some(pkg) = obj.pkg.or(callee_pkg).map(|p| program.package(p)) else {
                        continue;
                    };
                    let local = qualifier.import_name(&pkg.path, &pkg.name)?;
                    replacements.push((btree.range(ident), format!("{local}.{name}")));
                }
            }
        }

        for ((slot, actual), plan) in slots.iter().zip(&actuals).zip(&plans) {
            for &use_ in &slot.uses {
                let text = match plan {
                    Plan::Subst | Plan::SubstOrdered => {
                        let (text, prec) = actual.rendered(&speller, slot.ty, btree, use_);
                        if prec < context_precedence(btree, use_) {
                            format!("({text})")
                        } else {
                            text
                        }
                    }
                    Plan::Bind(name) => name.clone(),
                    Plan::Drop | Plan::Discard => continue,
                };
                replacements.push((btree.range(use_), text));
            }
        }

        let caller_indent = caller.indent_at(call_start).to_string();
        let site_stmt = site.map(|s| s.stmt);
        let (target, text) = match &form {
            Body::Expr(e) => {
                let inner = btree.unparen(*e);
                let mut text = render(callee_file, *e, &replacements, &caller_indent);
                let substituted = slots.iter().position(|s| s.uses.contains(&inner));
                let mut prec = match substituted.map(|i| (i, &plans[i])) {
                    Some((i, Plan::Subst | Plan::SubstOrdered)) => {
                        actuals[i].rendered(&speller, slots[i].ty, btree, inner).1
                    }
                    _ => expr_precedence(btree, inner),
                };
                let returned = matches!(btree.parent(*e).map(|p| btree.kind(p)), Some(NodeKind::Return { .. }));
                if returned && !value_unused && sig.results.len() == 1 {
                    if let Some(converted) = convert_result(program, &speller, callee_file, *e, sig.results[0].ty, &text) {
                        text = converted;
                        prec = HIGHEST_PREC;
                    }
                }
                if matches!(context, Some(NodeKind::ExprStmt { .. }))
                    && !matches!(btree.kind(btree.unparen(*e)), NodeKind::Call { .. } | NodeKind::Unary { op: TokenKind::Arrow, .. })
                {
                    (ctree.parent(outer).unwrap_or(outer), format!("_ = {text}"))
                } else if prec < context_precedence(ctree, outer) {
                    (outer, format!("({text})"))
                } else {
                    (outer, text)
                }
            }
            Body::Exprs(results) => {
                let parts: Vec<String> = results
                    .iter()
                    .zip(&sig.results)
                    .map(|(r, result)| {
                        let text = render(callee_file, *r, &replacements, &caller_indent);
                        convert_result(program, &speller, callee_file, *r, result.ty, &text).unwrap_or(text)
                    })
                    .collect();
                (outer, parts.join(", "))
            }
            Body::Stmts(stmts) => {
                let stmt = ctree.parent(outer).unwrap_or(outer);
                let text = match (stmts.first(), stmts.last()) {
                    (Some(&first), Some(&last)) => {
                        let range = btree.range(first).cover(btree.range(last));
                        let raw = util::splice(
                            callee_file.slice(range),
                            range.start(),
                            within(&replacements, range),
                        );
                        util::reindent(&raw, callee_file.indent_at(range.start()), &caller_indent)
                    }
                    _ => String::new(),
                };
                (stmt, text)
            }
        };

        let mut edits = Vec::new();
        let separator = format!("\n{caller_indent}");
        if site_stmt == Some(target) {
            let mut parts = bindings.clone();
            if !text.is_empty() {
                parts.push(text);
            }
            let combined = parts.join(&separator);
            let range = ctree.range(target);
            if combined.is_empty() && util::starts_line(caller, range.start()) {
                let start = util::line_start(caller, range.start());
                let end = util::line_end_inclusive(caller, range.end());
                edits.push(Edit::delete(caller.pos(start), caller.pos(end)));
            } else {
                let (s, e) = caller.node_pos(target);
                edits.push(Edit::replace(s, e, combined));
            }
        } else {
            if let Some(stmt) = site_stmt {
                if !bindings.is_empty() {
                    let at = ctree.range(stmt).start();
                    let indent = caller.indent_at(at).to_string();
                    if util::starts_line(caller, at) {
                        let lines: String = bindings.iter().map(|b| format!("{indent}{b}\n")).collect();
                        edits.push(Edit::insert(caller.pos(util::line_start(caller, at)), lines));
                    } else {
                        let lines: String = bindings.iter().map(|b| format!("{b}\n{indent}")).collect();
                        edits.push(Edit::insert(caller.pos(at), lines));
                    }
                }
            }
            let (s, e) = caller.node_pos(target);
            edits.push(Edit::replace(s, e, text));
        }

        let mut dropped: Vec<NodeId> = Vec::new();
        if let NodeKind::Call { fun, .. } = ctree.kind(req.call) {
            dropped.push(*fun);
        }
        for (plan, actual) in plans.iter().zip(&actuals) {
            if *plan == Plan::Drop {
                dropped.extend(actual.nodes.iter().copied());
            }
        }
        edits.extend(unused_import_edits(program, caller, &dropped, &qualifier.used));

        let mut new_imports = qualifier.added;
        new_imports.extend(speller.missing_imports().into_iter().map(|(path, _)| (path, None)));
        edits.extend(imports::add_named_imports_edits(caller, &new_imports));

        tracing::debug!(
            target: "vega.refactor",
            callee = %callee_name,
            file = %caller.file,
            bindings = bindings.len(),
            "inlined call"
        );
        Ok(edits)
    }
}

impl Actual {
    /// The text and precedence of the argument as substituted for a use of
    /// a parameter of type `ty`.
    fn rendered(&self, speller: &TypeSpeller<'_>, ty: TypeId, tree: &SyntaxTree, use_: NodeId) -> (String, u8) {
        if let Some(plain) = &self.plain {
            if selected_through(tree, use_) {
                return plain.clone();
            }
        }
        if self.convert {
            (conversion(&speller.type_string(ty), &self.text), HIGHEST_PREC)
        } else {
            (self.text.clone(), self.prec)
        }
    }
}

/// `T(x)`, parenthesizing type spellings that would otherwise parse as an
/// expression.
fn conversion(ty: &str, text: &str) -> String {
    if ty.starts_with('*') || ty.starts_with("<-") || ty.starts_with("func") {
        format!("({ty})({text})")
    } else {
        format!("{ty}({text})")
    }
}

/// `text` converted to the declared result type, when the returned
/// expression has a different type.
fn convert_result(
    program: &Program,
    speller: &TypeSpeller<'_>,
    file: &ParsedFile,
    expr: NodeId,
    result: TypeId,
    text: &str,
) -> Option<String> {
    let ty = program.type_of(file, expr)?;
    needs_conversion(program, ty, result).then(|| conversion(&speller.type_string(result), text))
}

fn needs_conversion(program: &Program, from: TypeId, to: TypeId) -> bool {
    let types = program.types();
    if types.identical(from, to) {
        return false;
    }
    if types.is_untyped(from) {
        return !types.identical(types.default_type(from), to);
    }
    true
}

/// Refuse bodies whose control flow cannot be moved into the caller.
fn check_body(program: &Program, file: &ParsedFile, body: NodeId, callee: ObjId) -> Result<(), RefactorError> {
    let tree = &file.tree;
    let mut problem = None;
    tree.walk(body, &mut |n| {
        if problem.is_some() {
            return false;
        }
        match tree.kind(n) {
            NodeKind::Defer { .. } => problem = Some("cannot inline a function that defers calls"),
            NodeKind::Labeled { .. } | NodeKind::Branch { tok: TokenKind::Goto, .. } => {
                problem = Some("cannot inline a function with labels")
            }
            NodeKind::Branch { label: Some(_), .. } => problem = Some("cannot inline a function with labels"),
            NodeKind::Ident { .. } if program.object_of(file, n) == Some(callee) => {
                problem = Some("cannot inline a recursive function")
            }
            NodeKind::Call { fun, .. } => {
                let recovers = program
                    .object_of(file, tree.unparen(*fun))
                    .is_some_and(|obj| program.obj(obj).kind == ObjKind::Builtin(Builtin::Recover));
                if recovers {
                    problem = Some("cannot inline a function that calls recover");
                }
            }
            _ => {}
        }
        true
    });
    match problem {
        Some(message) => Err(RefactorError::semantic(message)),
        None => Ok(()),
    }
}

/// The call with any enclosing parentheses.
fn outer_expr(tree: &SyntaxTree, call: NodeId) -> NodeId {
    let mut node = call;
    while let Some(parent) = tree.parent(node) {
        if !matches!(tree.kind(parent), NodeKind::Paren { .. }) {
            break;
        }
        node = parent;
    }
    node
}

/// Whether `expr` is the only value on the right of an assignment, in a
/// var spec or in a return.
fn is_sole_value(tree: &SyntaxTree, expr: NodeId) -> bool {
    match tree.parent(expr).map(|p| tree.kind(p)) {
        Some(NodeKind::Assign { rhs, .. }) => rhs.as_slice() == [expr],
        Some(NodeKind::ValueSpec { values, .. }) => values.as_slice() == [expr],
        Some(NodeKind::Return { results }) => results.as_slice() == [expr],
        _ => false,
    }
}

fn body_form(
    callee: &ParsedFile,
    body: NodeId,
    ctree: &SyntaxTree,
    outer: NodeId,
    value_unused: bool,
) -> Result<Body, RefactorError> {
    let btree = &callee.tree;
    let NodeKind::Block { stmts, .. } = btree.kind(body) else {
        return Err(RefactorError::Bug("function body is not a block".into()));
    };
    if let [only] = stmts.as_slice() {
        match btree.kind(*only) {
            NodeKind::Return { results } if results.len() == 1 => return Ok(Body::Expr(results[0])),
            NodeKind::Return { results } if results.len() > 1 => {
                if !is_sole_value(ctree, outer) {
                    return Err(RefactorError::semantic(
                        "a call returning several values must be the only value on its right-hand side",
                    ));
                }
                return Ok(Body::Exprs(results.clone()));
            }
            NodeKind::ExprStmt { x } if value_unused => return Ok(Body::Expr(*x)),
            _ => {}
        }
    }
    if !matches!(ctree.parent(outer).map(|p| ctree.kind(p)), Some(NodeKind::ExprStmt { .. })) {
        return Err(RefactorError::semantic("function body is too complex to inline as an expression"));
    }
    let returns = util::collect_outside_func_lits(btree, body, |k| matches!(k, NodeKind::Return { .. }));
    let mut kept = stmts.clone();
    match returns.as_slice() {
        [] => {}
        [ret] if stmts.last() == Some(ret) && matches!(btree.kind(*ret), NodeKind::Return { results } if results.is_empty()) => {
            kept.pop();
        }
        _ => return Err(RefactorError::semantic("cannot inline a function with early returns")),
    }
    Ok(Body::Stmts(kept))
}

/// Pair each parameter (the receiver first) with its argument.
fn bind_arguments(
    req: &InlineRequest<'_>,
    sig: &vega_types::Signature,
    speller: &TypeSpeller<'_>,
    body: NodeId,
) -> Result<(Vec<Slot>, Vec<Actual>), RefactorError> {
    let program = req.program;
    let types = program.types();
    let caller = req.caller;
    let ctree = &caller.tree;
    let NodeKind::Call { fun, args, ellipsis, .. } = ctree.kind(req.call) else {
        return Err(RefactorError::Bug("not a call".into()));
    };
    let fun = ctree.unparen(*fun);
    let uses_of = |obj: Option<ObjId>| -> Vec<NodeId> {
        let Some(obj) = obj else { return Vec::new() };
        util::idents(&req.callee_file.tree, body)
            .into_iter()
            .filter(|id| program.object_of(req.callee_file, *id) == Some(obj))
            .collect()
    };

    let mut slots = Vec::new();
    let mut actuals = Vec::new();
    if let Some(recv) = &sig.recv {
        let NodeKind::Selector { x, .. } = ctree.kind(fun) else {
            return Err(RefactorError::semantic("cannot inline a method expression"));
        };
        let sel = program
            .info()
            .selections
            .get(&NodeKey::new(caller, fun))
            .ok_or_else(|| RefactorError::Bug("method call without selection".into()))?;
        if sel.kind != SelectionKind::MethodVal {
            return Err(RefactorError::semantic("cannot inline a method expression"));
        }
        if sel.index.len() > 1 {
            return Err(RefactorError::semantic("cannot inline a promoted method"));
        }
        let uses = uses_of(recv.obj);
        let mut actual = Actual::from_expr(program, caller, *x, None);
        let x_ty = program.type_of(caller, *x).unwrap_or(recv.ty);
        let want_ptr = types.pointer_elem(recv.ty).is_some();
        let have_ptr = types.pointer_elem(x_ty).is_some();
        if want_ptr && !have_ptr {
            let addressable = program
                .info()
                .types
                .get(&NodeKey::new(caller, *x))
                .is_some_and(|tv| tv.addressable());
            if !addressable {
                return Err(RefactorError::semantic("receiver is not addressable"));
            }
            actual.plain = Some((actual.text.clone(), actual.prec));
            actual.text = format!("&{}", paren_operand(&actual.text, actual.prec, UNARY_PREC));
            actual.prec = UNARY_PREC;
            actual.duplicable = false;
        } else if !want_ptr && have_ptr {
            actual.plain = Some((actual.text.clone(), actual.prec));
            actual.text = format!("*{}", paren_operand(&actual.text, actual.prec, UNARY_PREC));
            actual.prec = UNARY_PREC;
            actual.duplicable = false;
            actual.pure = false;
        }
        slots.push(Slot {
            name: recv.name.to_string(),
            ty: recv.ty,
            uses,
        });
        actuals.push(actual);
    }

    if let [single] = args.as_slice() {
        let multi = program
            .type_of(caller, *single)
            .is_some_and(|t| matches!(types.get(t), Type::Tuple(elems) if elems.len() > 1));
        if multi {
            return Err(RefactorError::semantic("cannot inline a call with a multi-value argument"));
        }
    }
    let n = sig.params.len();
    for (i, param) in sig.params.iter().enumerate() {
        let packs = sig.variadic && i + 1 == n && ellipsis.is_none();
        let actual = if packs {
            let rest = args.get(i..).unwrap_or(&[]);
            if rest.is_empty() {
                Actual {
                    text: "nil".into(),
                    prec: HIGHEST_PREC,
                    pure: true,
                    duplicable: true,
                    stable: true,
                    convert: true,
                    nodes: Vec::new(),
                    plain: None,
                }
            } else {
                let elems: Vec<String> = rest.iter().map(|a| util::expr_text(caller, *a)).collect();
                Actual {
                    text: format!("{}{{{}}}", speller.type_string(param.ty), elems.join(", ")),
                    prec: HIGHEST_PREC,
                    pure: rest.iter().all(|a| !util::has_effects(program, caller, *a)),
                    duplicable: false,
                    stable: false,
                    convert: false,
                    nodes: rest.to_vec(),
                    plain: None,
                }
            }
        } else {
            let arg = *args
                .get(i)
                .ok_or_else(|| RefactorError::Bug(format!("missing argument {i}")))?;
            Actual::from_expr(program, caller, arg, Some(param.ty))
        };
        slots.push(Slot {
            name: param.name.to_string(),
            ty: param.ty,
            uses: uses_of(param.obj),
        });
        actuals.push(actual);
    }
    Ok((slots, actuals))
}

impl Actual {
    fn from_expr(program: &Program, file: &ParsedFile, expr: NodeId, param: Option<TypeId>) -> Actual {
        let tree = &file.tree;
        let inner = tree.unparen(expr);
        let constant = matches!(
            program.info().types.get(&NodeKey::new(file, inner)).map(|tv| &tv.mode),
            Some(vega_types::Mode::Constant(_))
        );
        let local_ident = matches!(tree.kind(inner), NodeKind::Ident { .. })
            && program
                .object_of(file, inner)
                .is_some_and(|obj| util::is_local(program, obj) && program.obj(obj).is_var());
        let convert = match (param, program.type_of(file, inner)) {
            (Some(param), Some(arg)) => needs_conversion(program, arg, param),
            _ => false,
        };
        Actual {
            text: util::expr_text(file, expr),
            prec: expr_precedence(tree, inner),
            pure: !util::has_effects(program, file, expr),
            duplicable: util::is_duplicable(program, file, expr),
            stable: constant || local_ident,
            convert,
            nodes: vec![expr],
            plain: None,
        }
    }
}

fn paren_operand(text: &str, prec: u8, want: u8) -> String {
    if prec < want {
        format!("({text})")
    } else {
        text.to_string()
    }
}

/// Whether `ident` is the `x` of a selector `x.f`.
fn selected_through(tree: &SyntaxTree, ident: NodeId) -> bool {
    tree.parent(ident)
        .is_some_and(|p| matches!(tree.kind(p), NodeKind::Selector { x, .. } if *x == ident))
}

/// The selector whose `sel` is `ident`.
fn selected_by(tree: &SyntaxTree, ident: NodeId) -> Option<NodeId> {
    let parent = tree.parent(ident)?;
    matches!(tree.kind(parent), NodeKind::Selector { sel, .. } if *sel == ident).then_some(parent)
}

/// Whether a use of a parameter writes to it or to a part of it.
fn is_mutated(program: &Program, file: &ParsedFile, use_: NodeId) -> bool {
    let tree = &file.tree;
    let mut node = use_;
    loop {
        let Some(parent) = tree.parent(node) else {
            return false;
        };
        match tree.kind(parent) {
            NodeKind::Paren { .. } => node = parent,
            NodeKind::Selector { x, .. } if *x == node => {
                if let Some(sel) = program.info().selections.get(&NodeKey::new(file, parent)) {
                    if sel.kind == SelectionKind::MethodVal {
                        let types = program.types();
                        let pointer_method = types
                            .signature(program.obj(sel.obj).ty)
                            .and_then(|s| s.recv.as_ref())
                            .is_some_and(|r| types.pointer_elem(r.ty).is_some());
                        let on_value = program.type_of(file, node).is_some_and(|t| types.pointer_elem(t).is_none());
                        return pointer_method && on_value;
                    }
                }
                node = parent;
            }
            NodeKind::Index { x, .. } if *x == node => node = parent,
            NodeKind::Assign { lhs, .. } => return lhs.contains(&node),
            NodeKind::IncDec { .. } => return true,
            NodeKind::Unary { op: TokenKind::And, .. } => return true,
            NodeKind::Range { key, value, tok, .. } => {
                return tok.is_some() && (*key == Some(node) || *value == Some(node));
            }
            _ => return false,
        }
    }
}

/// Whether `use_` is evaluated unconditionally and at most once within
/// `root`.
fn evaluated_once(tree: &SyntaxTree, root: NodeId, use_: NodeId) -> bool {
    let mut node = use_;
    while node != root {
        let Some(parent) = tree.parent(node) else {
            return false;
        };
        match tree.kind(parent) {
            NodeKind::FuncLit { .. } => return false,
            NodeKind::Binary {
                op: TokenKind::LAnd | TokenKind::LOr,
                y,
                ..
            } if *y == node => return false,
            _ => {}
        }
        node = parent;
    }
    true
}

fn plan_arguments(
    program: &Program,
    callee: &ParsedFile,
    slots: &[Slot],
    actuals: &[Actual],
    form: &Body,
    body_effects: bool,
) -> Vec<Plan> {
    let btree = &callee.tree;
    let expr_root = match form {
        Body::Expr(e) => Some(*e),
        _ => None,
    };
    let mut plans: Vec<Plan> = slots
        .iter()
        .zip(actuals)
        .map(|(slot, actual)| {
            let bind = Plan::Bind(slot.name.clone());
            if slot.uses.is_empty() {
                return if actual.pure { Plan::Drop } else { Plan::Discard };
            }
            if slot.uses.iter().any(|u| is_mutated(program, callee, *u)) {
                return bind;
            }
            if actual.pure {
                if body_effects && !actual.stable {
                    return bind;
                }
                if actual.duplicable || slot.uses.len() == 1 {
                    return Plan::Subst;
                }
                return bind;
            }
            match (expr_root, slot.uses.as_slice()) {
                (Some(root), [use_])
                    if evaluated_once(btree, root, *use_) && !effects_before(program, callee, root, *use_) =>
                {
                    Plan::SubstOrdered
                }
                _ => bind,
            }
        })
        .collect();

    // Arguments with effects must still run in argument order: bound ones
    // run before the statement, substituted ones at their use.
    loop {
        let last_bound = plans
            .iter()
            .zip(actuals)
            .rposition(|(p, a)| !a.pure && matches!(p, Plan::Bind(_) | Plan::Discard));
        let mut changed = false;
        let mut previous_use = None;
        for (i, plan) in plans.iter_mut().enumerate() {
            if *plan != Plan::SubstOrdered {
                continue;
            }
            let use_start = btree.range(slots[i].uses[0]).start();
            let out_of_order = last_bound.is_some_and(|b| i < b) || previous_use.is_some_and(|p| use_start < p);
            if out_of_order {
                *plan = Plan::Bind(slots[i].name.clone());
                changed = true;
            } else {
                previous_use = Some(use_start);
            }
        }
        if !changed {
            return plans;
        }
    }
}

/// Whether an effect in `root` is evaluated before `target`: anything
/// lexically to its left that does not enclose it.
fn effects_before(program: &Program, file: &ParsedFile, root: NodeId, target: NodeId) -> bool {
    let tree = &file.tree;
    let target_start = tree.range(target).start();
    let mut found = false;
    tree.walk(root, &mut |n| {
        if found || n == target {
            return false;
        }
        let range = tree.range(n);
        if range.end() <= target_start {
            if util::has_effects(program, file, n) {
                found = true;
            }
            return false;
        }
        range.start() <= target_start
    });
    found
}

/// The statement before which argument bindings go, provided code there
/// runs exactly when the call's statement starts.
fn binding_site(tree: &SyntaxTree, call: NodeId) -> Result<StmtSite, RefactorError> {
    let site = util::enclosing_stmt(tree, call)
        .ok_or_else(|| RefactorError::semantic("cannot bind arguments outside a function body"))?;
    let mut node = call;
    while node != site.stmt {
        let Some(parent) = tree.parent(node) else { break };
        let conditional = match tree.kind(parent) {
            NodeKind::For { cond, post, .. } => *cond == Some(node) || *post == Some(node),
            NodeKind::If { init, else_, .. } => init.is_some() || *else_ == Some(node),
            NodeKind::Switch { init, .. } | NodeKind::TypeSwitch { init, .. } => init.is_some(),
            NodeKind::CaseClause { .. } | NodeKind::CommClause { .. } | NodeKind::FuncLit { .. } => true,
            NodeKind::Binary {
                op: TokenKind::LAnd | TokenKind::LOr,
                y,
                ..
            } => *y == node,
            _ => false,
        };
        if conditional {
            return Err(RefactorError::semantic(
                "cannot bind arguments where the call is evaluated conditionally",
            ));
        }
        node = parent;
    }
    Ok(site)
}

fn check_visible(
    program: &Program,
    file: &ParsedFile,
    nodes: &[NodeId],
    scope: ScopeId,
    pos: Pos,
) -> Result<(), RefactorError> {
    let tree = &file.tree;
    for &node in nodes {
        for ident in util::idents(tree, node) {
            if selected_by(tree, ident).is_some() {
                continue;
            }
            let (Some(obj), Some(name)) = (program.object_of(file, ident), tree.ident_name(ident)) else {
                continue;
            };
            if program.lookup_parent(scope, name, pos).map(|(_, o)| o) != Some(obj) {
                return Err(RefactorError::semantic(format!("{name} is not visible before the call's statement")));
            }
        }
    }
    Ok(())
}

fn within(replacements: &[(TextRange, String)], range: TextRange) -> Vec<(TextRange, String)> {
    replacements
        .iter()
        .filter(|(r, _)| range.contains_range(*r))
        .cloned()
        .collect()
}

/// Callee text of `node` with the replacements applied, indented for the
/// caller.
fn render(file: &ParsedFile, node: NodeId, replacements: &[(TextRange, String)], indent: &str) -> String {
    let range = file.tree.range(node);
    let text = util::splice(file.slice(range), range.start(), within(replacements, range));
    util::reindent(&text, file.indent_at(range.start()), indent)
}

/// Import names for references the inlined body makes to other packages.
struct Qualifier<'a> {
    program: &'a Program,
    imports: Vec<imports::ImportInfo>,
    scope: ScopeId,
    pos: Pos,
    /// Local names the inlined text uses.
    used: Vec<String>,
    added: Vec<(String, Option<String>)>,
}

impl<'a> Qualifier<'a> {
    fn new(program: &'a Program, file: &ParsedFile, scope: ScopeId, pos: Pos) -> Self {
        Qualifier {
            program,
            imports: imports::file_imports(program, file),
            scope,
            pos,
            used: Vec::new(),
            added: Vec::new(),
        }
    }

    fn import_name(&mut self, path: &str, default: &str) -> Result<String, RefactorError> {
        let existing = self
            .imports
            .iter()
            .find(|i| i.path == path && i.local != "_" && i.local != ".")
            .map(|i| i.local.clone());
        let name = match existing {
            Some(local) => local,
            None if self.added.iter().any(|(p, _)| p == path) => default.to_string(),
            None => {
                if self.program.lookup_parent(self.scope, default, self.pos).is_some() {
                    return Err(RefactorError::semantic(format!(
                        "cannot import {path}: {default} is already declared"
                    )));
                }
                self.added.push((path.to_string(), None));
                default.to_string()
            }
        };
        self.used.push(name.clone());
        Ok(name)
    }
}

/// Delete imports whose only uses were in the removed caller nodes.
fn unused_import_edits(program: &Program, file: &ParsedFile, removed: &[NodeId], used: &[String]) -> Vec<Edit> {
    let tree = &file.tree;
    let mut edits = Vec::new();
    for info in imports::file_imports(program, file) {
        if info.local == "_" || info.local == "." || used.contains(&info.local) {
            continue;
        }
        let uses: Vec<NodeId> = util::idents(tree, tree.root())
            .into_iter()
            .filter(|id| {
                !program.info().defs.contains_key(&NodeKey::new(file, *id))
                    && program
                        .object_of(file, *id)
                        .is_some_and(|obj| matches!(&program.obj(obj).kind, ObjKind::PkgName { path, .. } if *path == info.path))
            })
            .collect();
        let removed_uses = uses
            .iter()
            .filter(|u| removed.iter().any(|r| util::encloses(tree, *r, **u)))
            .count();
        if removed_uses > 0 && removed_uses == uses.len() {
            edits.extend(imports::delete_import_edits(file, info.spec));
        }
    }
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_parenthesize_pointer_and_func_types() {
        assert_eq!(conversion("int64", "x"), "int64(x)");
        assert_eq!(conversion("*T", "nil"), "(*T)(nil)");
        assert_eq!(conversion("func()", "f"), "(func())(f)");
    }

    #[test]
    fn operands_are_parenthesized_by_precedence() {
        assert_eq!(paren_operand("a + b", 4, UNARY_PREC), "(a + b)");
        assert_eq!(paren_operand("a", HIGHEST_PREC, UNARY_PREC), "a");
    }
}
