//! Statements and function bodies.

use vega_syntax::{NodeId, NodeKind, SyntaxTree, TokenKind};

use super::{Checker, Operand};
use crate::constant::ConstValue;
use crate::info::Mode;
use crate::objects::{Builtin, ObjKind, VarKind};
use crate::scope::ScopeKind;
use crate::types::{BasicKind, Type, TypeId, TypeTable};

impl Checker<'_> {
    /// Check a function body in the current (function) scope.
    pub(super) fn func_body(&mut self, body: NodeId) {
        let pf = self.pf();
        let NodeKind::Block { stmts, rbrace, .. } = pf.tree.kind(body) else {
            return;
        };
        self.stmt_list(stmts);
        let has_results = self
            .ctx
            .sig
            .and_then(|s| self.types().signature(s))
            .is_some_and(|s| !s.results.is_empty());
        if has_results && !self.is_terminating_list(&pf.tree, stmts) {
            let pos = pf.pos(*rbrace);
            self.error_at(pos, pos.offset_by(1), "missing return");
        }
    }

    /// Report the local variables of the finished function that were never
    /// used.
    pub(super) fn report_unused(&mut self) {
        let mut unused: Vec<_> = std::mem::take(&mut self.ctx.locals)
            .into_iter()
            .filter(|o| !self.used_vars.contains(o) && !self.symbolic.contains(o))
            .collect();
        unused.sort_by_key(|o| self.prog.objects[o.idx()].pos);
        for obj in unused {
            let o = &self.prog.objects[obj.idx()];
            if o.name == "_" || o.pos == vega_syntax::Pos::NONE {
                continue;
            }
            let (pos, name) = (o.pos, o.name.clone());
            self.error_at(pos, pos.offset_by(name.len() as u32), format!("declared and not used: {name}"));
        }
    }

    fn stmt_list(&mut self, stmts: &[NodeId]) {
        for &s in stmts {
            self.stmt(s);
        }
    }

    fn stmt(&mut self, s: NodeId) {
        let pf = self.pf();
        let tree = &pf.tree;
        match tree.kind(s) {
            NodeKind::DeclStmt { decl } => self.local_decl(*decl),
            NodeKind::EmptyStmt | NodeKind::Bad => {}
            NodeKind::Labeled { label, stmt } => {
                let name = self.ident_name(*label);
                let obj = self.new_object(name, ObjKind::Label, TypeTable::INVALID, Some(*label), None);
                self.record_def(*label, obj);
                self.stmt(*stmt);
            }
            NodeKind::ExprStmt { x } => self.expr_stmt(*x),
            NodeKind::Send { chan, value } => {
                let ch = self.value(*chan);
                let mut v = self.value(*value);
                if ch.is_invalid() || v.is_invalid() {
                    return;
                }
                match self.types().get(self.core(ch.ty)).clone() {
                    Type::Chan { dir, elem } => {
                        if dir == vega_syntax::ChanDir::Recv {
                            let desc = self.describe(*chan, &ch);
                            self.error(s, format!("invalid operation: cannot send to receive-only channel {desc}"));
                            return;
                        }
                        self.assign_to(*value, &mut v, elem, "send");
                    }
                    _ => {
                        let desc = self.describe(*chan, &ch);
                        self.error(s, format!("invalid operation: cannot send to non-channel {desc}"));
                    }
                }
            }
            NodeKind::IncDec { x, tok } => {
                let Some(op) = self.lhs_var(*x) else {
                    self.error(*x, "cannot use _ as value");
                    return;
                };
                if op.is_invalid() {
                    return;
                }
                if !self.types().basic_kind(self.core(op.ty)).is_some_and(|k| k.is_numeric()) {
                    let desc = self.describe(*x, &op);
                    let text = if *tok == TokenKind::Inc { "++" } else { "--" };
                    self.error(s, format!("invalid operation: {}{text} (non-numeric type {})", self.text(*x), desc));
                }
            }
            NodeKind::Assign { lhs, tok, rhs, .. } => self.assign_stmt(s, lhs, *tok, rhs),
            NodeKind::Go { call } | NodeKind::Defer { call } => {
                let keyword = if matches!(tree.kind(s), NodeKind::Go { .. }) { "go" } else { "defer" };
                let inner = tree.unparen(*call);
                if !matches!(tree.kind(inner), NodeKind::Call { .. }) {
                    self.expr(*call);
                    self.error(*call, format!("expression in {keyword} must be function call"));
                    return;
                }
                self.expr(*call);
            }
            NodeKind::Return { results } => self.return_stmt(s, results),
            NodeKind::Branch { .. } => {}
            NodeKind::Block { stmts, .. } => {
                self.open_scope(s, ScopeKind::Block);
                self.stmt_list(stmts);
                self.close_scope();
            }
            NodeKind::If { init, cond, body, else_ } => {
                self.open_scope(s, ScopeKind::Block);
                if let Some(init) = init {
                    self.stmt(*init);
                }
                self.condition(*cond, "if statement");
                self.stmt(*body);
                if let Some(e) = else_ {
                    self.stmt(*e);
                }
                self.close_scope();
            }
            NodeKind::Switch { init, tag, body } => {
                self.open_scope(s, ScopeKind::Block);
                if let Some(init) = init {
                    self.stmt(*init);
                }
                self.switch_body(*tag, *body);
                self.close_scope();
            }
            NodeKind::TypeSwitch { init, assign, body } => {
                self.open_scope(s, ScopeKind::Block);
                if let Some(init) = init {
                    self.stmt(*init);
                }
                self.type_switch(*assign, *body);
                self.close_scope();
            }
            NodeKind::Select { body } => {
                let NodeKind::Block { stmts, .. } = tree.kind(*body) else {
                    return;
                };
                for &clause in stmts {
                    let NodeKind::CommClause { comm, body, .. } = tree.kind(clause) else {
                        continue;
                    };
                    self.open_scope(clause, ScopeKind::Block);
                    if let Some(comm) = comm {
                        self.stmt(*comm);
                    }
                    self.stmt_list(body);
                    self.close_scope();
                }
            }
            NodeKind::For { init, cond, post, body } => {
                self.open_scope(s, ScopeKind::Block);
                if let Some(init) = init {
                    self.stmt(*init);
                }
                if let Some(cond) = cond {
                    self.condition(*cond, "for statement");
                }
                if let Some(post) = post {
                    self.stmt(*post);
                }
                self.stmt(*body);
                self.close_scope();
            }
            NodeKind::Range { key, value, tok, x, body } => {
                self.open_scope(s, ScopeKind::Block);
                self.range_clause(*key, *value, *tok, *x, *body);
                self.stmt(*body);
                self.close_scope();
            }
            _ => {}
        }
    }

    fn condition(&mut self, cond: NodeId, context: &str) {
        let mut c = self.value(cond);
        if c.is_invalid() {
            return;
        }
        if !self.types().basic_kind(self.core(c.ty)).is_some_and(|k| k.is_boolean()) {
            let text = self.text(cond);
            self.error(cond, format!("non-boolean condition in {context}: {text}"));
            return;
        }
        self.default_untyped(cond, &mut c);
    }

    fn expr_stmt(&mut self, x: NodeId) {
        let pf = self.pf();
        let inner = pf.tree.unparen(x);
        let op = self.expr(x);
        if op.is_invalid() {
            return;
        }
        let used = match pf.tree.kind(inner) {
            NodeKind::Call { fun, .. } => match op.mode {
                Mode::NoValue => true,
                _ => !self.is_pure_builtin(pf.tree.unparen(*fun)),
            },
            NodeKind::Unary { op: TokenKind::Arrow, .. } => true,
            _ => false,
        };
        if !used {
            let desc = self.describe(x, &op);
            self.error(x, format!("{desc} is not used"));
        }
    }

    /// Builtins whose result must be used.
    fn is_pure_builtin(&self, fun: NodeId) -> bool {
        let key = self.key(fun);
        let Some(obj) = self.prog.info.uses.get(&key) else {
            return false;
        };
        matches!(
            self.prog.objects[obj.idx()].kind,
            ObjKind::Builtin(
                Builtin::Len
                    | Builtin::Cap
                    | Builtin::Append
                    | Builtin::Make
                    | Builtin::New
                    | Builtin::Complex
                    | Builtin::Real
                    | Builtin::Imag
                    | Builtin::Min
                    | Builtin::Max
            )
        ) || matches!(self.prog.info.types.get(&key), Some(tv) if tv.mode == Mode::TypeExpr)
    }

    fn return_stmt(&mut self, node: NodeId, results: &[NodeId]) {
        let Some(sig) = self.ctx.sig.and_then(|s| self.types().signature(s)).cloned() else {
            return;
        };
        let want: Vec<TypeId> = sig.results.iter().map(|r| r.ty).collect();
        if results.is_empty() {
            let named = sig.results.first().is_some_and(|r| !r.name.is_empty());
            if !want.is_empty() && !named {
                let want = self.type_list(&want);
                self.error(node, format!("not enough return values\n\thave ()\n\twant ({want})"));
            }
            return;
        }
        if want.is_empty() {
            for &r in results {
                self.expr(r);
            }
            self.error(results[0], "too many return values");
            return;
        }

        let mut ops: Vec<(NodeId, Operand)> = Vec::new();
        if let ([single], true) = (results, want.len() > 1) {
            let x = self.expr(*single);
            match self.types().get(x.ty) {
                Type::Tuple(elems) => ops.extend(elems.iter().map(|&e| (*single, Operand::value(e)))),
                _ => ops.push((*single, self.single_value(*single, x))),
            }
        } else {
            for &r in results {
                let x = self.value(r);
                ops.push((r, x));
            }
        }
        if ops.iter().any(|(_, x)| x.is_invalid()) {
            return;
        }
        if ops.len() != want.len() {
            let have = ops.iter().map(|(_, x)| self.result_type_str(x)).collect::<Vec<_>>().join(", ");
            let want_str = self.type_list(&want);
            let few = ops.len() < want.len();
            let message = format!(
                "{} return values\n\thave ({have})\n\twant ({want_str})",
                if few { "not enough" } else { "too many" }
            );
            let at = if few { results[0] } else { ops[want.len()].0 };
            self.error(at, message);
            return;
        }
        for ((r, mut x), t) in ops.into_iter().zip(want) {
            self.assign_to(r, &mut x, t, "return statement");
        }
    }

    fn type_list(&self, types: &[TypeId]) -> String {
        types.iter().map(|&t| self.type_str(t)).collect::<Vec<_>>().join(", ")
    }

    fn switch_body(&mut self, tag: Option<NodeId>, body: NodeId) {
        let pf = self.pf();
        let tree = &pf.tree;
        let mut tag_op = tag.map(|t| {
            let mut x = self.value(t);
            if !x.is_invalid() {
                self.default_untyped(t, &mut x);
            }
            (t, x)
        });
        let NodeKind::Block { stmts, .. } = tree.kind(body) else {
            return;
        };
        let mut seen_default = false;
        for &clause in stmts {
            let NodeKind::CaseClause { list, is_default, body, .. } = tree.kind(clause) else {
                continue;
            };
            if *is_default {
                if seen_default {
                    self.error(clause, "multiple defaults in switch");
                }
                seen_default = true;
            }
            for &e in list {
                let mut x = self.value(e);
                if x.is_invalid() {
                    continue;
                }
                match &mut tag_op {
                    Some((tn, t)) if !t.is_invalid() => {
                        let mut t = t.clone();
                        if !self.match_types(e, &mut x, *tn, &mut t) {
                            let (xs, ts) = (self.type_str(x.ty), self.type_str(t.ty));
                            let text = self.text(e);
                            self.error(e, format!("invalid case {text} in switch on {} (mismatched types {xs} and {ts})", self.text(*tn)));
                        }
                    }
                    Some(_) => {}
                    None => {
                        let bool_ty = TypeTable::basic(BasicKind::Bool);
                        self.assign_to(e, &mut x, bool_ty, "switch case");
                    }
                }
            }
            self.open_scope(clause, ScopeKind::Block);
            self.stmt_list(body);
            self.close_scope();
        }
    }

    fn type_switch(&mut self, guard: NodeId, body: NodeId) {
        let pf = self.pf();
        let tree = &pf.tree;
        let (symbol, x) = match tree.kind(guard) {
            NodeKind::Assign { lhs, rhs, .. } => match (lhs.as_slice(), rhs.as_slice()) {
                ([l], [r]) => (Some(*l), *r),
                _ => return,
            },
            NodeKind::ExprStmt { x } => (None, *x),
            _ => return,
        };
        let NodeKind::TypeAssert { x: operand, ty: None } = tree.kind(tree.unparen(x)) else {
            self.error(x, "invalid type switch guard");
            return;
        };
        let xo = self.value(*operand);
        let valid = !xo.is_invalid();
        if valid && !self.types().is_interface(xo.ty) {
            let desc = self.describe(*operand, &xo);
            self.error(*operand, format!("{desc} is not an interface"));
        }
        let name = symbol.map(|s| self.ident_name(s));
        if let (Some(s), Some(name)) = (symbol, &name) {
            if name == "_" {
                self.error(s, "no new variable on left side of :=");
            }
        }

        let NodeKind::Block { stmts, .. } = tree.kind(body) else {
            return;
        };
        for &clause in stmts {
            let NodeKind::CaseClause { list, body, colon, .. } = tree.kind(clause) else {
                continue;
            };
            let mut single: Option<TypeId> = None;
            for &e in list {
                if tree.ident_name(e).is_some_and(|n| n == "nil") {
                    let nil = self.expr(e);
                    if nil.ty == TypeTable::basic(BasicKind::UntypedNil) {
                        single = None;
                        continue;
                    }
                }
                let t = self.typ(e);
                if list.len() == 1 && !self.is_invalid_type(t) {
                    single = Some(t);
                }
                if valid && !self.is_invalid_type(t) && !self.types().is_interface(t) && self.types().is_interface(xo.ty) {
                    if let Some(missing) = self.prog.missing_method(t, xo.ty) {
                        let (ts, is) = (self.type_str(t), self.type_str(xo.ty));
                        let text = self.text(*operand);
                        self.error(
                            e,
                            format!("impossible type switch case: {text} (variable of type {is}) cannot have dynamic type {ts} (missing method {})", missing.name),
                        );
                    }
                }
            }
            self.open_scope(clause, ScopeKind::Block);
            if let Some(name) = name.as_ref().filter(|n| *n != "_") {
                let ty = single.unwrap_or(if valid { xo.ty } else { TypeTable::INVALID });
                let obj = self.new_object(name.clone(), ObjKind::Var(VarKind::Local), ty, symbol, Some(clause));
                self.record_implicit(clause, obj);
                self.symbolic.insert(obj);
                let scope_pos = pf.pos(*colon).offset_by(1);
                let scope = self.scope;
                self.declare(scope, None, obj, scope_pos);
            }
            self.stmt_list(body);
            self.close_scope();
        }
    }

    fn range_clause(&mut self, key: Option<NodeId>, value: Option<NodeId>, tok: Option<TokenKind>, x: NodeId, body: NodeId) {
        let mut xo = self.value(x);
        let (kt, vt) = if xo.is_invalid() {
            (TypeTable::INVALID, Some(TypeTable::INVALID))
        } else {
            let int = TypeTable::basic(BasicKind::Int);
            let core = self.core(xo.ty);
            match self.types().get(core).clone() {
                Type::Basic(k) if k.is_string() => (int, Some(TypeTable::basic(BasicKind::Rune))),
                Type::Basic(k) if k.is_integer() => {
                    self.default_untyped(x, &mut xo);
                    (xo.ty, None)
                }
                Type::Array { elem, .. } | Type::Slice(elem) => (int, Some(elem)),
                Type::Pointer(p) => match self.types().get(self.underlying(p)).clone() {
                    Type::Array { elem, .. } => (int, Some(elem)),
                    _ => self.cannot_range(x, &xo),
                },
                Type::Map { key, value } => (key, Some(value)),
                Type::Chan { elem, .. } => (elem, None),
                Type::Signature(sig) if sig.params.len() == 1 && sig.results.is_empty() => {
                    match self.types().signature(sig.params[0].ty).map(|y| y.params.iter().map(|p| p.ty).collect::<Vec<_>>()) {
                        Some(ps) if ps.len() <= 2 => (
                            ps.first().copied().unwrap_or(TypeTable::INVALID),
                            ps.get(1).copied(),
                        ),
                        _ => self.cannot_range(x, &xo),
                    }
                }
                _ => self.cannot_range(x, &xo),
            }
        };
        if value.is_some() && vt.is_none() {
            let desc = self.describe(x, &xo);
            let v = value.map(|v| self.text(v)).unwrap_or_default();
            self.error(value.unwrap_or(x), format!("range over {desc} permits only one iteration variable {v}"));
        }

        let slots = [(key, kt), (value, vt.unwrap_or(TypeTable::INVALID))];
        match tok {
            Some(TokenKind::Define) => {
                let scope = self.scope;
                let scope_pos = self.pos(body);
                for (ident, ty) in slots {
                    let Some(ident) = ident else {
                        continue;
                    };
                    let Some(name) = self.tree().ident_name(ident).cloned() else {
                        let text = self.text(ident);
                        self.error(ident, format!("non-name {text} on left side of :="));
                        continue;
                    };
                    let obj = self.new_object(name, ObjKind::Var(VarKind::Local), ty, Some(ident), None);
                    self.declare(scope, Some(ident), obj, scope_pos);
                    self.ctx.locals.push(obj);
                }
            }
            Some(_) => {
                for (node, ty) in slots {
                    let Some(node) = node else {
                        continue;
                    };
                    if let Some(lhs) = self.lhs_var(node) {
                        if !lhs.is_invalid() && !self.is_invalid_type(ty) {
                            let mut v = Operand::value(ty);
                            self.assign_to(node, &mut v, lhs.ty, "range clause");
                        }
                    }
                }
            }
            None => {}
        }
    }

    fn cannot_range(&mut self, x: NodeId, xo: &Operand) -> (TypeId, Option<TypeId>) {
        let desc = self.describe(x, xo);
        self.error(x, format!("cannot range over {desc}"));
        (TypeTable::INVALID, Some(TypeTable::INVALID))
    }

    fn local_decl(&mut self, decl: NodeId) {
        let pf = self.pf();
        let tree = &pf.tree;
        let NodeKind::GenDecl { tok, specs, .. } = tree.kind(decl) else {
            return;
        };
        let scope = self.scope;
        match tok {
            TokenKind::Var => {
                for &spec in specs {
                    let NodeKind::ValueSpec { names, ty, values } = tree.kind(spec) else {
                        continue;
                    };
                    let declared = ty.map(|t| self.typ(t));
                    let objs: Vec<_> = names
                        .iter()
                        .map(|&n| {
                            let name = self.ident_name(n);
                            self.new_object(name, ObjKind::Var(VarKind::Local), TypeTable::INVALID, Some(n), Some(spec))
                        })
                        .collect();
                    let types = if values.is_empty() {
                        vec![declared.unwrap_or(TypeTable::INVALID); objs.len()]
                    } else {
                        self.assign_rhs(spec, &vec![declared; objs.len()], values, "variable declaration")
                    };
                    let scope_pos = self.end(spec);
                    for ((&n, obj), t) in names.iter().zip(objs).zip(types) {
                        self.set_obj_ty(obj, t);
                        self.declare(scope, Some(n), obj, scope_pos);
                        self.ctx.locals.push(obj);
                    }
                }
            }
            TokenKind::Const => {
                let mut last: (Option<NodeId>, Vec<NodeId>) = (None, Vec::new());
                let saved = self.ctx.iota.take();
                for (iota, &spec) in specs.iter().enumerate() {
                    let NodeKind::ValueSpec { names, ty, values } = tree.kind(spec) else {
                        continue;
                    };
                    if ty.is_some() || !values.is_empty() {
                        last = (*ty, values.clone());
                    }
                    self.ctx.iota = Some(ConstValue::Int(iota as i128));
                    let scope_pos = self.end(spec);
                    for (i, &n) in names.iter().enumerate() {
                        let (t, value) = self.const_value(last.0, last.1.get(i).copied());
                        let name = self.ident_name(n);
                        let obj = self.new_object(name, ObjKind::Const(value), t, Some(n), Some(spec));
                        self.declare(scope, Some(n), obj, scope_pos);
                    }
                }
                self.ctx.iota = saved;
            }
            TokenKind::Type => {
                for &spec in specs {
                    let NodeKind::TypeSpec { name, assign, .. } = tree.kind(spec) else {
                        continue;
                    };
                    let tname = self.ident_name(*name);
                    let obj = self.new_object(tname, ObjKind::TypeName { alias: *assign }, TypeTable::INVALID, Some(*name), Some(spec));
                    if !*assign {
                        let named = self.alloc(Type::Named(crate::types::Named {
                            obj,
                            underlying: TypeTable::INVALID,
                            methods: Vec::new(),
                            type_params: Vec::new(),
                            type_args: Vec::new(),
                            origin: None,
                        }));
                        self.set_obj_ty(obj, named);
                    }
                    let scope_pos = self.pos(*name);
                    self.declare(scope, Some(*name), obj, scope_pos);
                    self.type_decl(obj, spec);
                }
            }
            _ => {}
        }
    }

    fn is_terminating_list(&self, tree: &SyntaxTree, stmts: &[NodeId]) -> bool {
        stmts
            .iter()
            .rev()
            .find(|s| !matches!(tree.kind(**s), NodeKind::EmptyStmt))
            .is_some_and(|s| self.is_terminating(tree, *s, None))
    }

    fn is_terminating(&self, tree: &SyntaxTree, s: NodeId, label: Option<&str>) -> bool {
        match tree.kind(s) {
            NodeKind::Return { .. } => true,
            NodeKind::Branch { tok, .. } => matches!(tok, TokenKind::Goto | TokenKind::Fallthrough),
            NodeKind::ExprStmt { x } => match tree.kind(tree.unparen(*x)) {
                NodeKind::Call { fun, .. } => {
                    let key = self.key(tree.unparen(*fun));
                    self.prog
                        .info
                        .uses
                        .get(&key)
                        .is_some_and(|o| self.prog.objects[o.idx()].kind == ObjKind::Builtin(Builtin::Panic))
                }
                _ => false,
            },
            NodeKind::Block { stmts, .. } => self.is_terminating_list(tree, stmts),
            NodeKind::If { body, else_: Some(e), .. } => {
                self.is_terminating(tree, *body, None) && self.is_terminating(tree, *e, None)
            }
            NodeKind::For { cond: None, body, .. } => !has_break(tree, *body, label, true),
            NodeKind::Labeled { label: l, stmt } => {
                let name = tree.ident_name(*l).map(|n| n.as_str());
                self.is_terminating(tree, *stmt, name)
            }
            NodeKind::Switch { body, .. } | NodeKind::TypeSwitch { body, .. } => {
                let NodeKind::Block { stmts, .. } = tree.kind(*body) else {
                    return false;
                };
                let mut has_default = false;
                for &clause in stmts {
                    let NodeKind::CaseClause { is_default, body, .. } = tree.kind(clause) else {
                        return false;
                    };
                    has_default |= *is_default;
                    let ends = self.is_terminating_list(tree, body)
                        || body.last().is_some_and(|l| matches!(tree.kind(*l), NodeKind::Branch { tok: TokenKind::Fallthrough, .. }));
                    if !ends || body.iter().any(|b| has_break(tree, *b, label, true)) {
                        return false;
                    }
                }
                has_default
            }
            NodeKind::Select { body } => {
                let NodeKind::Block { stmts, .. } = tree.kind(*body) else {
                    return false;
                };
                stmts.iter().all(|&clause| match tree.kind(clause) {
                    NodeKind::CommClause { body, .. } => {
                        self.is_terminating_list(tree, body) && !body.iter().any(|b| has_break(tree, *b, label, true))
                    }
                    _ => false,
                })
            }
            _ => false,
        }
    }
}

/// Whether `s` contains a break out of the enclosing statement: an unlabeled
/// break when `implicit`, or a break to `label`.
fn has_break(tree: &SyntaxTree, s: NodeId, label: Option<&str>, implicit: bool) -> bool {
    match tree.kind(s) {
        NodeKind::Branch { tok: TokenKind::Break, label: None } => implicit,
        NodeKind::Branch { tok: TokenKind::Break, label: Some(l) } => {
            label.is_some() && tree.ident_name(*l).map(|n| n.as_str()) == label
        }
        NodeKind::Block { stmts, .. } => stmts.iter().any(|b| has_break(tree, *b, label, implicit)),
        NodeKind::If { body, else_, .. } => {
            has_break(tree, *body, label, implicit) || else_.is_some_and(|e| has_break(tree, e, label, implicit))
        }
        NodeKind::Labeled { stmt, .. } => has_break(tree, *stmt, label, implicit),
        NodeKind::CaseClause { body, .. } | NodeKind::CommClause { body, .. } => {
            body.iter().any(|b| has_break(tree, *b, label, implicit))
        }
        NodeKind::For { body, .. }
        | NodeKind::Range { body, .. }
        | NodeKind::Switch { body, .. }
        | NodeKind::TypeSwitch { body, .. }
        | NodeKind::Select { body } => label.is_some() && has_break(tree, *body, label, false),
        _ => false,
    }
}
