//! Assignability, untyped conversion and the assignment forms.

use vega_syntax::{NodeId, NodeKind, TokenKind};

use super::resolver::plural;
use super::{Checker, Operand};
use crate::info::Mode;
use crate::objects::{ObjId, ObjKind, VarKind};
use crate::types::{BasicKind, Type, TypeId, TypeTable};

impl Checker<'_> {
    /// `x (variable of type T)`, `"a" (untyped string constant)`, ...
    pub(super) fn describe(&self, node: NodeId, x: &Operand) -> String {
        let text = self.text(node);
        if x.ty == TypeTable::basic(BasicKind::UntypedNil) {
            return text;
        }
        let ts = self.type_str(x.ty);
        let what = match &x.mode {
            Mode::NoValue => return format!("{text} (no value)"),
            Mode::Builtin => return format!("{text} (built-in)"),
            Mode::TypeExpr => return format!("{text} (type)"),
            Mode::Constant(v) => {
                let shown = v.to_string();
                let value = if shown == text || v.is_unknown() { String::new() } else { format!(" {shown}") };
                return if self.types().is_untyped(x.ty) {
                    format!("{text} ({ts} constant{value})")
                } else {
                    format!("{text} (constant{value} of type {ts})")
                };
            }
            Mode::Variable => "variable",
            Mode::MapIndex => "map index expression",
            Mode::CommaOk => "comma, ok expression",
            Mode::Value => "value",
        };
        if self.types().is_untyped(x.ty) {
            return format!("{text} ({ts} {what})");
        }
        format!("{text} ({what} of type {ts})")
    }

    /// Whether a value `x` may be assigned to a variable of type `t`. The
    /// error carries an explanation suffix such as `: T does not implement I
    /// (missing method M)`.
    pub(super) fn assignable(&self, x: &Operand, t: TypeId) -> Result<(), String> {
        let types = self.types();
        let v = x.ty;
        if types.identical(v, t) {
            return Ok(());
        }
        let (vu, tu) = (types.underlying(v), types.underlying(t));
        let params = types.is_type_param(v) || types.is_type_param(t);
        if !params && types.identical(vu, tu) && (!types.is_named(v) || !types.is_named(t)) {
            return Ok(());
        }
        if v == TypeTable::basic(BasicKind::UntypedNil) && types.has_nil(t) {
            return Ok(());
        }
        if types.is_interface(t) && !types.is_type_param(t) {
            return match self.prog.missing_method(v, t) {
                None => Ok(()),
                Some(missing) => {
                    let (vs, ts) = (self.type_str(v), self.type_str(t));
                    let why = if missing.pointer_receiver {
                        format!("method {} has pointer receiver", missing.name)
                    } else if missing.wrong_type {
                        format!("wrong type for method {}", missing.name)
                    } else {
                        format!("missing method {}", missing.name)
                    };
                    Err(format!(": {vs} does not implement {ts} ({why})"))
                }
            };
        }
        if let (Type::Chan { dir: vega_syntax::ChanDir::Both, elem: ve }, Type::Chan { elem: te, .. }) =
            (types.get(vu), types.get(tu))
        {
            if types.identical(*ve, *te) && (!types.is_named(v) || !types.is_named(t)) {
                return Ok(());
            }
        }
        if types.is_interface(v) && !types.is_type_param(v) {
            return Err(": need type assertion".to_string());
        }
        Err(String::new())
    }

    /// Check that `x` can be assigned to `t` in `context` (`assignment`,
    /// `argument to f`, ...), converting untyped operands.
    pub(super) fn assign_to(&mut self, node: NodeId, x: &mut Operand, t: TypeId, context: &str) -> bool {
        if x.is_invalid() || self.is_invalid_type(t) {
            return false;
        }
        let desc = self.describe(node, x);
        if self.types().is_untyped(x.ty) {
            let nil = x.ty == TypeTable::basic(BasicKind::UntypedNil);
            let target = if self.types().is_interface(t) && !self.types().is_type_param(t) && !nil {
                self.types().default_type(x.ty)
            } else {
                t
            };
            if !self.convert_untyped(node, x, target) {
                let ts = self.type_str(t);
                let suffix = truncation(x, target, self);
                self.error(node, format!("cannot use {desc} as {ts} value in {context}{suffix}"));
                return false;
            }
        }
        if let Err(reason) = self.assignable(x, t) {
            let ts = self.type_str(t);
            self.error(node, format!("cannot use {desc} as {ts} value in {context}{reason}"));
            return false;
        }
        true
    }

    /// Give an untyped operand the type `target`, updating the recorded types
    /// of the expression tree. Returns false when the operand cannot take
    /// that type; nothing is reported.
    pub(super) fn convert_untyped(&mut self, node: NodeId, x: &mut Operand, target: TypeId) -> bool {
        if !self.types().is_untyped(x.ty) || self.is_invalid_type(target) {
            return true;
        }
        let Some(kind) = self.types().basic_kind(x.ty) else {
            return false;
        };
        if self.types().is_untyped(target) {
            // Both untyped: only numeric kinds combine.
            let tk = self.types().basic_kind(target);
            return match tk {
                Some(tk) if tk == kind => true,
                Some(tk) if tk.is_numeric() && kind.is_numeric() => {
                    x.ty = target;
                    true
                }
                _ => false,
            };
        }
        let nil = kind == BasicKind::UntypedNil;
        let tu = self.underlying(target);
        let ok = match self.types().get(tu).clone() {
            Type::Basic(tk) => {
                if nil {
                    tk == BasicKind::UnsafePointer
                } else {
                    let compatible = match kind {
                        BasicKind::UntypedBool => tk.is_boolean(),
                        BasicKind::UntypedString => tk.is_string(),
                        _ => tk.is_numeric(),
                    };
                    match x.constant().cloned() {
                        Some(v) if compatible => {
                            if v.representable(tk) || !(kind == BasicKind::UntypedFloat && tk.is_integer()) {
                                x.mode = Mode::Constant(v.convert(tk));
                                true
                            } else {
                                false
                            }
                        }
                        _ => compatible,
                    }
                }
            }
            Type::Interface(_) => {
                if self.types().is_type_param(target) {
                    true
                } else if nil {
                    return true;
                } else {
                    let default = self.types().default_type(x.ty);
                    x.ty = default;
                    self.update_untyped(node, default);
                    return true;
                }
            }
            Type::Pointer(_) | Type::Slice(_) | Type::Map { .. } | Type::Chan { .. } | Type::Signature(_) => {
                if nil {
                    x.ty = target;
                    return true;
                }
                false
            }
            _ => false,
        };
        if ok {
            x.ty = target;
            self.update_untyped(node, target);
        }
        ok
    }

    /// Replace the untyped type recorded for `node` (and the untyped operands
    /// it was computed from) with `ty`.
    pub(super) fn update_untyped(&mut self, node: NodeId, ty: TypeId) {
        let key = self.key(node);
        let Some(tv) = self.prog.info.types.get_mut(&key) else {
            return;
        };
        if !self.prog.types.is_untyped(tv.ty) {
            return;
        }
        tv.ty = ty;
        if let (Mode::Constant(v), Some(k)) = (tv.mode.clone(), self.prog.types.basic_kind(self.prog.types.underlying(ty))) {
            tv.mode = Mode::Constant(v.convert(k));
        }
        let pf = self.pf();
        match pf.tree.kind(node) {
            NodeKind::Paren { x } => self.update_untyped(*x, ty),
            NodeKind::Unary { op, x } if !matches!(op, TokenKind::And | TokenKind::Arrow) => {
                self.update_untyped(*x, ty)
            }
            NodeKind::Binary { op, x, y, .. } => {
                if super::expr::is_comparison(*op) {
                    return;
                }
                self.update_untyped(*x, ty);
                if !matches!(op, TokenKind::Shl | TokenKind::Shr) {
                    self.update_untyped(*y, ty);
                }
            }
            _ => {}
        }
    }

    /// Give an untyped operand its default type.
    pub(super) fn default_untyped(&mut self, node: NodeId, x: &mut Operand) {
        if self.types().is_untyped(x.ty) && x.ty != TypeTable::basic(BasicKind::UntypedNil) {
            let default = self.types().default_type(x.ty);
            self.convert_untyped(node, x, default);
        }
    }

    /// Resolve package-level variables `lhs` from their declared type and
    /// initializers.
    pub(super) fn init_vars(&mut self, lhs: &[ObjId], declared: Option<TypeId>, values: &[NodeId], at: Option<NodeId>) {
        if values.is_empty() {
            let ty = declared.unwrap_or(TypeTable::INVALID);
            for &obj in lhs {
                self.set_obj_ty(obj, ty);
            }
            return;
        }
        let targets = vec![declared; lhs.len()];
        let at = at.unwrap_or(values[0]);
        let types = self.assign_rhs(at, &targets, values, "variable declaration");
        for (&obj, ty) in lhs.iter().zip(types) {
            self.set_obj_ty(obj, ty);
        }
    }

    /// Evaluate `rhs` for one left-hand slot per entry of `targets`. A target
    /// is the type of the variable being assigned, or `None` to infer it.
    /// Returns the type of each slot.
    pub(super) fn assign_rhs(&mut self, at: NodeId, targets: &[Option<TypeId>], rhs: &[NodeId], context: &str) -> Vec<TypeId> {
        let n = targets.len();
        if rhs.len() == n {
            let mut out = Vec::with_capacity(n);
            for (&r, target) in rhs.iter().zip(targets) {
                let mut x = self.value(r);
                if x.is_invalid() {
                    out.push(target.unwrap_or(TypeTable::INVALID));
                    continue;
                }
                match target {
                    Some(t) => {
                        self.assign_to(r, &mut x, *t, context);
                        out.push(*t);
                    }
                    None => {
                        if x.ty == TypeTable::basic(BasicKind::UntypedNil) {
                            self.error(r, format!("use of untyped nil in {context}"));
                            out.push(TypeTable::INVALID);
                            continue;
                        }
                        self.default_untyped(r, &mut x);
                        out.push(x.ty);
                    }
                }
            }
            return out;
        }

        if rhs.len() == 1 {
            let r = rhs[0];
            let x = self.expr(r);
            if x.is_invalid() {
                return targets.iter().map(|t| t.unwrap_or(TypeTable::INVALID)).collect();
            }
            if x.mode == Mode::NoValue {
                let text = self.text(r);
                self.error(r, format!("{text} (no value) used as value"));
                return vec![TypeTable::INVALID; n];
            }
            let elems = match self.types().get(x.ty) {
                Type::Tuple(elems) => elems.clone(),
                _ if n == 2 && matches!(x.mode, Mode::CommaOk | Mode::MapIndex) => {
                    vec![x.ty, TypeTable::basic(BasicKind::Bool)]
                }
                _ => vec![x.ty],
            };
            if elems.len() != n {
                let returns = if matches!(self.tree().kind(self.tree().unparen(r)), NodeKind::Call { .. }) {
                    let text = self.text(r);
                    format!("{text} returns {} value{}", elems.len(), plural(elems.len()))
                } else {
                    format!("{} value{}", elems.len(), plural(elems.len()))
                };
                self.error(at, format!("assignment mismatch: {n} variable{} but {returns}", plural(n)));
                return vec![TypeTable::INVALID; n];
            }
            let mut out = Vec::with_capacity(n);
            for (elem, target) in elems.into_iter().zip(targets) {
                match target {
                    Some(t) => {
                        let mut op = Operand::value(elem);
                        if !self.is_invalid_type(*t) && self.assignable(&op, *t).is_err() {
                            self.default_untyped(r, &mut op);
                            let (es, ts) = (self.type_str(op.ty), self.type_str(*t));
                            self.error(r, format!("cannot use {es} value as {ts} value in {context}"));
                        }
                        out.push(*t);
                    }
                    None => out.push(self.types().default_type(elem)),
                }
            }
            return out;
        }

        for &r in rhs {
            self.expr(r);
        }
        self.error(
            at,
            format!("assignment mismatch: {n} variable{} but {} value{}", plural(n), rhs.len(), plural(rhs.len())),
        );
        vec![TypeTable::INVALID; n]
    }

    /// The left-hand side of `=` or `op=`: `None` for the blank identifier.
    /// Assigning to a local variable does not count as using it.
    pub(super) fn lhs_var(&mut self, node: NodeId) -> Option<Operand> {
        let pf = self.pf();
        let inner = pf.tree.unparen(node);
        if let NodeKind::Ident { name } = pf.tree.kind(inner) {
            if name == "_" {
                return None;
            }
            if let Some(obj) = self.lookup(name, self.pos(inner)) {
                if matches!(self.prog.objects[obj.idx()].kind, ObjKind::Var(VarKind::Local | VarKind::Param | VarKind::Result)) {
                    self.record_use(inner, obj);
                    let x = Operand {
                        mode: Mode::Variable,
                        ty: self.obj_ty(obj),
                    };
                    self.record_operand(inner, &x);
                    return Some(x);
                }
            }
        }
        let x = self.value(node);
        if x.is_invalid() {
            return Some(x);
        }
        if !matches!(x.mode, Mode::Variable | Mode::MapIndex) {
            let text = self.text(node);
            self.error(node, format!("cannot assign to {text} (neither addressable nor a map index expression)"));
            return Some(Operand::invalid());
        }
        Some(x)
    }

    pub(super) fn assign_stmt(&mut self, node: NodeId, lhs: &[NodeId], tok: TokenKind, rhs: &[NodeId]) {
        match tok {
            TokenKind::Define => self.short_var_decl(node, lhs, rhs),
            TokenKind::Assign => {
                let targets: Vec<Option<Operand>> = lhs.iter().map(|&l| self.lhs_var(l)).collect();
                if targets.iter().flatten().any(Operand::is_invalid) {
                    for &r in rhs {
                        self.expr(r);
                    }
                    return;
                }
                let types: Vec<Option<TypeId>> = targets.iter().map(|t| t.as_ref().map(|x| x.ty)).collect();
                self.assign_rhs(node, &types, rhs, "assignment");
            }
            op => {
                let Some(base) = op.assign_base() else {
                    return;
                };
                let ([l], [r]) = (lhs, rhs) else {
                    self.error(node, format!("assignment operation {} requires single-valued expressions", op.text()));
                    return;
                };
                let Some(x) = self.lhs_var(*l) else {
                    self.error(*l, "cannot use _ as value");
                    return;
                };
                let y = self.value(*r);
                let result = self.binary(node, base, *l, x.clone(), *r, y);
                if result.is_invalid() || x.is_invalid() {
                    return;
                }
                let mut result = result;
                self.assign_to(*r, &mut result, x.ty, "assignment");
            }
        }
    }

    fn short_var_decl(&mut self, node: NodeId, lhs: &[NodeId], rhs: &[NodeId]) {
        let pf = self.pf();
        let scope = self.scope;
        let mut targets = Vec::with_capacity(lhs.len());
        let mut new_vars: Vec<(NodeId, ObjId)> = Vec::new();
        let mut any_new = false;
        for &l in lhs {
            let NodeKind::Ident { name } = pf.tree.kind(l) else {
                let text = self.text(l);
                self.error(l, format!("non-name {text} on left side of :="));
                targets.push(None);
                continue;
            };
            if name == "_" {
                targets.push(None);
                continue;
            }
            if let Some(existing) = self.prog.scopes[scope.idx()].lookup(name) {
                self.record_use(l, existing);
                targets.push(Some(self.obj_ty(existing)));
                continue;
            }
            if new_vars.iter().any(|(n, _)| pf.tree.ident_name(*n) == Some(name)) {
                self.error(l, format!("{name} repeated on left side of :="));
                targets.push(None);
                continue;
            }
            any_new = true;
            let obj = self.new_object(name.clone(), ObjKind::Var(VarKind::Local), TypeTable::INVALID, Some(l), None);
            new_vars.push((l, obj));
            targets.push(None);
        }
        if !any_new {
            self.error(node, "no new variables on left side of :=");
        }

        let types = self.assign_rhs(node, &targets, rhs, "assignment");
        let scope_pos = self.end(node);
        let mut slot = new_vars.iter().peekable();
        for (&l, ty) in lhs.iter().zip(types) {
            if let Some(&&(ident, obj)) = slot.peek() {
                if ident == l {
                    slot.next();
                    self.set_obj_ty(obj, ty);
                    self.declare(scope, Some(ident), obj, scope_pos);
                    self.ctx.locals.push(obj);
                }
            }
        }
    }
}

/// ` (truncated)` when an untyped float constant is used as an integer.
fn truncation(x: &Operand, target: TypeId, cx: &Checker<'_>) -> &'static str {
    let float = cx.types().basic_kind(x.ty) == Some(BasicKind::UntypedFloat);
    let integer = cx
        .types()
        .basic_kind(cx.types().underlying(target))
        .is_some_and(|k| k.is_integer());
    if float && integer && x.constant().is_some() {
        " (truncated)"
    } else {
        ""
    }
}
