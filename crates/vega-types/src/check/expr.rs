//! Expressions.

use vega_syntax::{NodeId, NodeKind, TokenKind};

use super::{Checker, Operand};
use crate::constant::{ConstError, ConstValue};
use crate::info::{Mode, Selection, SelectionKind};
use crate::lookup::LookupResult;
use crate::objects::{ObjId, ObjKind, PkgId};
use crate::scope::ScopeKind;
use crate::types::{BasicKind, Param, Signature, Type, TypeId, TypeTable};

impl Checker<'_> {
    pub(super) fn expr(&mut self, node: NodeId) -> Operand {
        self.expr_hint(node, None)
    }

    /// Evaluate `node`; `hint` is the element type that an untyped composite
    /// literal (`{1, 2}` inside `[][]int{...}`) takes.
    pub(super) fn expr_hint(&mut self, node: NodeId, hint: Option<TypeId>) -> Operand {
        let x = self.expr_inner(node, hint);
        self.record_operand(node, &x);
        x
    }

    /// Evaluate `node`, which must denote a single value.
    pub(super) fn value(&mut self, node: NodeId) -> Operand {
        let x = self.expr(node);
        self.single_value(node, x)
    }

    pub(super) fn single_value(&mut self, node: NodeId, x: Operand) -> Operand {
        if x.is_invalid() {
            return x;
        }
        let text = self.text(node);
        let message = match &x.mode {
            Mode::NoValue => format!("{text} (no value) used as value"),
            Mode::TypeExpr => format!("{text} (type) is not an expression"),
            Mode::Builtin => format!("{text} (built-in) must be called"),
            _ => match self.types().get(x.ty) {
                Type::Tuple(_) => {
                    let ts = self.type_str(x.ty);
                    format!("multiple-value {text} (value of type {ts}) in single-value context")
                }
                _ => return x,
            },
        };
        self.error(node, message);
        Operand::invalid()
    }

    fn expr_inner(&mut self, node: NodeId, hint: Option<TypeId>) -> Operand {
        let pf = self.pf();
        let tree = &pf.tree;
        match tree.kind(node) {
            NodeKind::Ident { name } => {
                if name == "_" {
                    self.error(node, "cannot use _ as value");
                    return Operand::invalid();
                }
                match self.resolve_ident(node, true) {
                    Some(obj) => self.object_operand(node, obj),
                    None => Operand::invalid(),
                }
            }
            NodeKind::BasicLit { kind, value } => {
                let basic = match kind {
                    TokenKind::Int => BasicKind::UntypedInt,
                    TokenKind::Float => BasicKind::UntypedFloat,
                    TokenKind::Char => BasicKind::UntypedRune,
                    TokenKind::String => BasicKind::UntypedString,
                    _ => BasicKind::Complex128,
                };
                Operand {
                    mode: Mode::Constant(ConstValue::from_literal(*kind, value)),
                    ty: TypeTable::basic(basic),
                }
            }
            NodeKind::CompositeLit { ty, elts, .. } => self.composite_lit(node, *ty, elts, hint),
            NodeKind::FuncLit { ty, body } => {
                let outer = self.scope;
                let (start, end) = (self.pos(node), self.end(node));
                let scope = self.open_scope_at(*ty, start, end, ScopeKind::Func);
                let sig = self.func_type(*ty, Some(scope));
                let sig_ty = self.alloc(Type::Signature(sig));
                self.record(*ty, Mode::TypeExpr, sig_ty);
                let saved_sig = self.ctx.sig.replace(sig_ty);
                let saved_iota = self.ctx.iota.take();
                self.func_body(*body);
                self.ctx.sig = saved_sig;
                self.ctx.iota = saved_iota;
                self.scope = outer;
                Operand::value(sig_ty)
            }
            NodeKind::Paren { x } => self.expr_hint(*x, hint),
            NodeKind::Selector { x, sel } => self.selector(node, *x, *sel),
            NodeKind::Index { x, indices, .. } => self.index_expr(node, *x, indices),
            NodeKind::Slice { x, low, high, max, .. } => self.slice_expr(node, *x, [*low, *high, *max]),
            NodeKind::TypeAssert { x, ty } => {
                let xo = self.value(*x);
                let Some(ty) = ty else {
                    self.error(node, "invalid syntax tree: use of .(type) outside type switch");
                    return Operand::invalid();
                };
                let t = self.typ(*ty);
                if xo.is_invalid() || self.is_invalid_type(t) {
                    return Operand::invalid();
                }
                if !self.types().is_interface(xo.ty) {
                    let desc = self.describe(*x, &xo);
                    self.error(*x, format!("invalid operation: {desc} is not an interface"));
                    return Operand::invalid();
                }
                if !self.types().is_interface(t) {
                    if let Some(missing) = self.prog.missing_method(t, xo.ty) {
                        let text = self.text(node);
                        let (ts, is) = (self.type_str(t), self.type_str(xo.ty));
                        self.error(
                            node,
                            format!("impossible type assertion: {text}\n\t{ts} does not implement {is} (missing method {})", missing.name),
                        );
                    }
                }
                Operand { mode: Mode::CommaOk, ty: t }
            }
            NodeKind::Call { .. } => self.call(node),
            NodeKind::Star { x } => {
                let xo = self.expr(*x);
                if xo.is_invalid() {
                    return xo;
                }
                if xo.mode == Mode::TypeExpr {
                    let t = self.prog.types.pointer(xo.ty);
                    return Operand { mode: Mode::TypeExpr, ty: t };
                }
                let xo = self.single_value(*x, xo);
                if xo.is_invalid() {
                    return xo;
                }
                match self.types().pointer_elem(self.core(xo.ty)) {
                    Some(elem) => Operand { mode: Mode::Variable, ty: elem },
                    None => {
                        let desc = self.describe(*x, &xo);
                        self.error(node, format!("invalid operation: cannot indirect {desc}"));
                        Operand::invalid()
                    }
                }
            }
            NodeKind::Unary { op, x } => self.unary(node, *op, *x),
            NodeKind::Binary { op, x, y, .. } => {
                let xo = self.value(*x);
                let yo = self.value(*y);
                self.binary(node, *op, *x, xo, *y, yo)
            }
            NodeKind::KeyValue { .. } => {
                self.error(node, "unexpected key:value expression");
                Operand::invalid()
            }
            NodeKind::ArrayType { .. }
            | NodeKind::StructType { .. }
            | NodeKind::FuncType { .. }
            | NodeKind::InterfaceType { .. }
            | NodeKind::MapType { .. }
            | NodeKind::ChanType { .. } => {
                let t = self.typ(node);
                if self.is_invalid_type(t) {
                    return Operand::invalid();
                }
                Operand { mode: Mode::TypeExpr, ty: t }
            }
            _ => Operand::invalid(),
        }
    }

    /// The operand denoted by a resolved identifier.
    pub(super) fn object_operand(&mut self, ident: NodeId, obj: ObjId) -> Operand {
        self.ensure_resolved(obj);
        let o = &self.prog.objects[obj.idx()];
        let ty = o.ty;
        match o.kind.clone() {
            ObjKind::Var(_) => Operand { mode: Mode::Variable, ty },
            ObjKind::Const(value) => {
                if obj == self.prog.universe.iota {
                    return match self.ctx.iota.clone() {
                        Some(v) => Operand { mode: Mode::Constant(v), ty },
                        None => {
                            self.error(ident, "cannot use iota outside constant declaration");
                            Operand::invalid()
                        }
                    };
                }
                if self.is_invalid_type(ty) {
                    return Operand::invalid();
                }
                Operand { mode: Mode::Constant(value), ty }
            }
            ObjKind::TypeName { .. } => Operand { mode: Mode::TypeExpr, ty },
            ObjKind::Func => Operand::value(ty),
            ObjKind::PkgName { .. } => {
                let name = o.name.clone();
                self.error(ident, format!("use of package {name} without selector"));
                Operand::invalid()
            }
            ObjKind::Builtin(_) => Operand { mode: Mode::Builtin, ty: TypeTable::INVALID },
            ObjKind::Nil => Operand::value(TypeTable::basic(BasicKind::UntypedNil)),
            ObjKind::Label => Operand::invalid(),
        }
    }

    fn selector(&mut self, node: NodeId, x: NodeId, sel: NodeId) -> Operand {
        if let Some(ObjKind::PkgName { imported, .. }) = self.package_ref(x) {
            let Some(imported) = imported else {
                return Operand::invalid();
            };
            return match self.qualified_member(imported, sel) {
                Some(obj) => {
                    let op = self.object_operand(sel, obj);
                    self.record_operand(sel, &op);
                    op
                }
                None => Operand::invalid(),
            };
        }

        let xo = self.expr(x);
        if xo.is_invalid() {
            return xo;
        }
        let name = self.ident_name(sel);

        if xo.mode == Mode::TypeExpr {
            return self.method_expr(node, x, sel, xo.ty);
        }
        let xo = self.single_value(x, xo);
        if xo.is_invalid() {
            return xo;
        }

        let found = self
            .prog
            .lookup_field_or_method(xo.ty, xo.mode == Mode::Variable, Some(self.pkg), &name);
        let Some(found) = found else {
            let text = self.text(x);
            let ts = self.type_str(xo.ty);
            self.error(
                sel,
                format!("{text}.{name} undefined (type {ts} has no field or method {name})"),
            );
            return Operand::invalid();
        };
        self.record_use(sel, found.obj);

        if !found.is_method {
            let mode = if xo.mode == Mode::Variable || found.indirect {
                Mode::Variable
            } else {
                Mode::Value
            };
            self.record_selection(node, SelectionKind::FieldVal, xo.ty, &found, found.ty);
            return Operand { mode, ty: found.ty };
        }

        self.ensure_resolved(found.obj);
        let sig_ty = self.method_signature(&found);
        if found.needs_pointer {
            let ts = self.type_str(xo.ty);
            self.error(sel, format!("cannot call pointer method {name} on {ts}"));
        }
        self.record_selection(node, SelectionKind::MethodVal, xo.ty, &found, sig_ty);
        Operand::value(sig_ty)
    }

    /// The receiver-less signature of a looked-up method, with the holder's
    /// type arguments substituted.
    fn method_signature(&mut self, found: &LookupResult) -> TypeId {
        let declared = self.obj_ty(found.obj);
        let declared = if self.types().signature(declared).is_some() { declared } else { found.ty };
        let (holder, _) = self.types().deref(found.holder);
        let map = self.prog.receiver_map(holder);
        let subst = self.prog.types.subst(declared, &map);
        match self.types().signature(subst).cloned() {
            Some(sig) if sig.recv.is_some() => self.alloc(Type::Signature(Signature { recv: None, ..sig })),
            _ => subst,
        }
    }

    fn method_expr(&mut self, node: NodeId, x: NodeId, sel: NodeId, recv: TypeId) -> Operand {
        let name = self.ident_name(sel);
        let found = self
            .prog
            .lookup_field_or_method(recv, true, Some(self.pkg), &name)
            .filter(|f| f.is_method);
        let Some(found) = found else {
            let text = self.text(x);
            let ts = self.type_str(recv);
            self.error(sel, format!("{text}.{name} undefined (type {ts} has no method {name})"));
            return Operand::invalid();
        };
        self.record_use(sel, found.obj);
        self.ensure_resolved(found.obj);
        let method = self.method_signature(&found);
        let Some(sig) = self.types().signature(method).cloned() else {
            return Operand::invalid();
        };
        let mut params = vec![Param {
            name: Default::default(),
            ty: recv,
            obj: None,
        }];
        params.extend(sig.params);
        let ty = self.alloc(Type::Signature(Signature { params, ..sig }));
        self.record_selection(node, SelectionKind::MethodExpr, recv, &found, ty);
        Operand::value(ty)
    }

    fn record_selection(&mut self, node: NodeId, kind: SelectionKind, recv: TypeId, found: &LookupResult, ty: TypeId) {
        let key = self.key(node);
        self.prog.info.selections.insert(
            key,
            Selection {
                kind,
                recv,
                obj: found.obj,
                ty,
                index: found.index.clone(),
                indirect: found.indirect,
            },
        );
    }

    /// Look up an exported member of an imported package.
    pub(super) fn qualified_member(&mut self, pkg: PkgId, sel: NodeId) -> Option<ObjId> {
        let name = self.ident_name(sel);
        let scope = self.prog.packages[pkg.idx()].scope;
        let pkg_name = self.prog.packages[pkg.idx()].name.clone();
        match self.prog.scopes[scope.idx()].lookup(&name) {
            Some(obj) if self.prog.objects[obj.idx()].is_exported() => {
                self.record_use(sel, obj);
                Some(obj)
            }
            Some(_) => {
                self.error(sel, format!("name {name} not exported by package {pkg_name}"));
                None
            }
            None => {
                self.error(sel, format!("undefined: {pkg_name}.{name}"));
                None
            }
        }
    }

    fn composite_lit(&mut self, node: NodeId, ty: Option<NodeId>, elts: &[NodeId], hint: Option<TypeId>) -> Operand {
        let pf = self.pf();
        let tree = &pf.tree;
        let mut open_array = false;
        let (base, result_ptr) = match ty {
            Some(t) => match tree.kind(t) {
                NodeKind::ArrayType { len: Some(len), elem } if matches!(tree.kind(*len), NodeKind::Ellipsis { .. }) => {
                    open_array = true;
                    let elem = self.typ(*elem);
                    (self.alloc(Type::Array { len: None, elem }), false)
                }
                _ => (self.typ(t), false),
            },
            None => match hint {
                Some(h) => match self.types().get(h) {
                    Type::Pointer(elem) => (*elem, true),
                    _ => (h, false),
                },
                None => {
                    self.error(node, "invalid composite literal type: missing type");
                    for &e in elts {
                        self.expr(e);
                    }
                    return Operand::invalid();
                }
            },
        };
        if self.is_invalid_type(base) {
            return Operand::invalid();
        }

        let mut result = base;
        match self.types().get(self.core(base)).clone() {
            Type::Struct(st) => {
                let keyed = elts
                    .first()
                    .is_some_and(|e| matches!(tree.kind(*e), NodeKind::KeyValue { .. }));
                if keyed {
                    for &e in elts {
                        let NodeKind::KeyValue { key, value } = tree.kind(e) else {
                            self.error(e, "mixture of field:value and value elements in struct literal");
                            self.expr(e);
                            continue;
                        };
                        let fname = tree.ident_name(*key).cloned().unwrap_or_default();
                        match st.fields.iter().find(|f| f.name == fname) {
                            Some(field) => {
                                self.record_use(*key, field.obj);
                                self.element(*value, field.ty, "struct literal");
                            }
                            None => {
                                let ts = self.type_str(base);
                                self.error(*key, format!("unknown field {fname} in struct literal of type {ts}"));
                                self.expr(*value);
                            }
                        }
                    }
                } else {
                    for (i, &e) in elts.iter().enumerate() {
                        match st.fields.get(i) {
                            Some(field) => self.element(e, field.ty, "struct literal"),
                            None => {
                                let ts = self.type_str(base);
                                self.error(e, format!("too many values in struct literal of type {ts}"));
                                break;
                            }
                        }
                    }
                    if !elts.is_empty() && elts.len() < st.fields.len() {
                        let ts = self.type_str(base);
                        self.error_at(self.end(node), self.end(node), format!("too few values in struct literal of type {ts}"));
                    }
                }
            }
            Type::Array { elem, .. } | Type::Slice(elem) => {
                let mut index: u64 = 0;
                let mut max: u64 = 0;
                for &e in elts {
                    let value = match tree.kind(e) {
                        NodeKind::KeyValue { key, value } => {
                            let k = self.value(*key);
                            if let Some(i) = k.constant().and_then(|v| v.as_i128()).and_then(|i| u64::try_from(i).ok()) {
                                index = i;
                            }
                            *value
                        }
                        _ => e,
                    };
                    self.element(value, elem, "array or slice literal");
                    index += 1;
                    max = max.max(index);
                }
                if open_array {
                    result = self.alloc(Type::Array { len: Some(max), elem });
                }
            }
            Type::Map { key, value } => {
                for &e in elts {
                    let NodeKind::KeyValue { key: k, value: v } = tree.kind(e) else {
                        self.error(e, "missing key in map literal");
                        self.expr(e);
                        continue;
                    };
                    self.element(*k, key, "map literal");
                    self.element(*v, value, "map literal");
                }
            }
            _ => {
                let ts = self.type_str(base);
                self.error(node, format!("invalid composite literal type {ts}"));
                for &e in elts {
                    self.expr(e);
                }
                return Operand::invalid();
            }
        }
        if result_ptr {
            result = self.prog.types.pointer(result);
        }
        Operand::value(result)
    }

    fn element(&mut self, value: NodeId, ty: TypeId, context: &str) {
        let x = if matches!(self.tree().kind(value), NodeKind::CompositeLit { ty: None, .. }) {
            self.expr_hint(value, Some(ty))
        } else {
            self.expr(value)
        };
        let mut x = self.single_value(value, x);
        if !x.is_invalid() {
            self.assign_to(value, &mut x, ty, context);
        }
    }

    fn index_expr(&mut self, node: NodeId, x: NodeId, indices: &[NodeId]) -> Operand {
        let xo = self.expr(x);
        if xo.mode == Mode::TypeExpr {
            let t = self.instantiate_type(node, xo.ty, indices);
            if self.is_invalid_type(t) {
                return Operand::invalid();
            }
            return Operand { mode: Mode::TypeExpr, ty: t };
        }
        if xo.is_invalid() {
            for &i in indices {
                self.expr(i);
            }
            return xo;
        }
        if let Some(sig) = self.types().signature(xo.ty).cloned() {
            if !sig.type_params.is_empty() {
                let args: Vec<TypeId> = indices.iter().map(|&i| self.typ(i)).collect();
                if args.len() > sig.type_params.len() {
                    self.error(node, format!("got {} type arguments but {} has {} type parameters", args.len(), self.text(x), sig.type_params.len()));
                    return Operand::invalid();
                }
                let map = sig.type_params.iter().copied().zip(args).collect();
                let inst = self.prog.types.subst(xo.ty, &map);
                return Operand::value(inst);
            }
        }
        let xo = self.single_value(x, xo);
        if xo.is_invalid() {
            return xo;
        }
        let [index] = indices else {
            self.error(node, "unexpected comma; expecting ]");
            return Operand::invalid();
        };

        let core = self.core(xo.ty);
        let (mode, elem) = match self.types().get(core).clone() {
            Type::Basic(k) if k.is_string() => (Mode::Value, TypeTable::basic(BasicKind::Byte)),
            Type::Slice(elem) => (Mode::Variable, elem),
            Type::Array { elem, .. } => {
                let mode = if xo.mode == Mode::Variable { Mode::Variable } else { Mode::Value };
                (mode, elem)
            }
            Type::Pointer(p) => match self.types().get(self.underlying(p)).clone() {
                Type::Array { elem, .. } => (Mode::Variable, elem),
                _ => return self.cannot_index(node, x, &xo, *index),
            },
            Type::Map { key, value } => {
                let mut k = self.value(*index);
                if !k.is_invalid() {
                    self.assign_to(*index, &mut k, key, "map index");
                }
                return Operand { mode: Mode::MapIndex, ty: value };
            }
            _ => return self.cannot_index(node, x, &xo, *index),
        };
        self.index_value(*index);
        Operand { mode, ty: elem }
    }

    fn cannot_index(&mut self, node: NodeId, x: NodeId, xo: &Operand, index: NodeId) -> Operand {
        self.expr(index);
        let desc = self.describe(x, xo);
        self.error(node, format!("invalid operation: cannot index {desc}"));
        Operand::invalid()
    }

    /// An index or slice bound, which must be an integer.
    fn index_value(&mut self, index: NodeId) {
        let mut i = self.value(index);
        if i.is_invalid() {
            return;
        }
        if self.types().is_untyped(i.ty) {
            let int = TypeTable::basic(BasicKind::Int);
            if !self.convert_untyped(index, &mut i, int) {
                let desc = self.describe(index, &i);
                self.error(index, format!("invalid argument: index {desc} must be integer"));
            }
            return;
        }
        if !self.types().basic_kind(self.core(i.ty)).is_some_and(|k| k.is_integer()) {
            let desc = self.describe(index, &i);
            self.error(index, format!("invalid argument: index {desc} must be integer"));
        }
    }

    fn slice_expr(&mut self, node: NodeId, x: NodeId, bounds: [Option<NodeId>; 3]) -> Operand {
        let xo = self.value(x);
        for b in bounds.into_iter().flatten() {
            self.index_value(b);
        }
        if xo.is_invalid() {
            return xo;
        }
        let core = self.core(xo.ty);
        let ty = match self.types().get(core).clone() {
            Type::Basic(k) if k.is_string() => {
                if k == BasicKind::UntypedString {
                    TypeTable::basic(BasicKind::String)
                } else {
                    xo.ty
                }
            }
            Type::Slice(_) => xo.ty,
            Type::Array { elem, .. } => {
                if xo.mode != Mode::Variable {
                    let desc = self.describe(x, &xo);
                    self.error(node, format!("invalid operation: {desc} (slice of unaddressable value)"));
                }
                self.prog.types.slice(elem)
            }
            Type::Pointer(p) => match self.types().get(self.underlying(p)).clone() {
                Type::Array { elem, .. } => self.prog.types.slice(elem),
                _ => return self.cannot_slice(node, x, &xo),
            },
            _ => return self.cannot_slice(node, x, &xo),
        };
        Operand::value(ty)
    }

    fn cannot_slice(&mut self, node: NodeId, x: NodeId, xo: &Operand) -> Operand {
        let desc = self.describe(x, xo);
        self.error(node, format!("cannot slice {desc}"));
        Operand::invalid()
    }

    fn unary(&mut self, node: NodeId, op: TokenKind, x: NodeId) -> Operand {
        let pf = self.pf();
        match op {
            TokenKind::And => {
                let inner = pf.tree.unparen(x);
                let is_lit = matches!(pf.tree.kind(inner), NodeKind::CompositeLit { .. });
                let xo = self.value(x);
                if xo.is_invalid() {
                    return xo;
                }
                if xo.mode != Mode::Variable && !is_lit {
                    let desc = self.describe(x, &xo);
                    self.error(node, format!("invalid operation: cannot take address of {desc}"));
                    return Operand::invalid();
                }
                let t = self.prog.types.pointer(xo.ty);
                Operand::value(t)
            }
            TokenKind::Arrow => {
                let xo = self.value(x);
                if xo.is_invalid() {
                    return xo;
                }
                match self.types().get(self.core(xo.ty)).clone() {
                    Type::Chan { dir, elem } => {
                        if dir == vega_syntax::ChanDir::Send {
                            let desc = self.describe(x, &xo);
                            self.error(node, format!("invalid operation: cannot receive from send-only channel {desc}"));
                        }
                        Operand { mode: Mode::CommaOk, ty: elem }
                    }
                    _ => {
                        let desc = self.describe(x, &xo);
                        self.error(node, format!("invalid operation: cannot receive from non-channel {desc}"));
                        Operand::invalid()
                    }
                }
            }
            _ => {
                let xo = self.value(x);
                if xo.is_invalid() {
                    return xo;
                }
                let kind = self.types().basic_kind(self.core(xo.ty));
                let ok = match op {
                    TokenKind::Not => kind.is_some_and(|k| k.is_boolean()),
                    TokenKind::Xor => kind.is_some_and(|k| k.is_integer()),
                    TokenKind::Add | TokenKind::Sub => kind.is_some_and(|k| k.is_numeric()),
                    _ => false,
                };
                if !ok && !self.types().is_type_param(xo.ty) {
                    let desc = self.describe(x, &xo);
                    self.error(node, format!("invalid operation: operator {} not defined on {desc}", op.text()));
                    return Operand::invalid();
                }
                match xo.constant() {
                    Some(v) => {
                        let bits = kind.filter(|k| k.is_unsigned()).and_then(|k| k.int_bits());
                        let value = ConstValue::unary(op, v, bits);
                        Operand { mode: Mode::Constant(value), ty: xo.ty }
                    }
                    None => Operand::value(xo.ty),
                }
            }
        }
    }

    /// Type a binary operation on evaluated operands.
    pub(super) fn binary(&mut self, node: NodeId, op: TokenKind, xn: NodeId, mut x: Operand, yn: NodeId, mut y: Operand) -> Operand {
        if x.is_invalid() || y.is_invalid() {
            return Operand::invalid();
        }
        if matches!(op, TokenKind::Shl | TokenKind::Shr) {
            return self.shift(node, op, xn, x, yn, y);
        }
        let untyped_nil = TypeTable::basic(BasicKind::UntypedNil);
        let against_nil = x.ty == untyped_nil || y.ty == untyped_nil;
        if !self.match_types(xn, &mut x, yn, &mut y) {
            let text = self.text(node);
            let (xs, ys) = (self.type_str(x.ty), self.type_str(y.ty));
            self.error(node, format!("invalid operation: {text} (mismatched types {xs} and {ys})"));
            return Operand::invalid();
        }

        if is_comparison(op) {
            return self.comparison(node, op, xn, &x, &y, against_nil);
        }

        let kind = self.types().basic_kind(self.core(x.ty));
        let defined = match op {
            TokenKind::Add => kind.is_some_and(|k| k.is_numeric() || k.is_string()),
            TokenKind::Sub | TokenKind::Mul | TokenKind::Quo => kind.is_some_and(|k| k.is_numeric()),
            TokenKind::Rem | TokenKind::And | TokenKind::Or | TokenKind::Xor | TokenKind::AndNot => {
                kind.is_some_and(|k| k.is_integer())
            }
            TokenKind::LAnd | TokenKind::LOr => kind.is_some_and(|k| k.is_boolean()),
            _ => false,
        };
        if !defined && !self.types().is_type_param(x.ty) {
            let desc = self.describe(xn, &x);
            self.error(node, format!("invalid operation: operator {} not defined on {desc}", op.text()));
            return Operand::invalid();
        }

        if matches!(op, TokenKind::Quo | TokenKind::Rem) {
            let zero = y.constant().is_some_and(|v| v.as_f64() == Some(0.0));
            if zero && kind.is_some_and(|k| k.is_integer() || k.is_untyped()) {
                self.error(yn, "invalid operation: division by zero");
                return Operand::invalid();
            }
        }

        match (x.constant(), y.constant()) {
            (Some(a), Some(b)) => {
                // Integer division of untyped or typed integer constants truncates.
                let integer = kind.is_some_and(|k| k.is_integer());
                let value = match ConstValue::binary(op, a, b) {
                    Ok(ConstValue::Float(f)) if integer && op == TokenKind::Quo => ConstValue::Int(f.trunc() as i128),
                    Ok(v) => v,
                    Err(ConstError::DivisionByZero) => {
                        self.error(yn, "invalid operation: division by zero");
                        return Operand::invalid();
                    }
                    Err(ConstError::Invalid) => ConstValue::Unknown,
                };
                Operand { mode: Mode::Constant(value), ty: x.ty }
            }
            _ => Operand::value(x.ty),
        }
    }

    /// `against_nil` is set when either operand was the untyped `nil` before
    /// the operands were matched.
    fn comparison(&mut self, node: NodeId, op: TokenKind, xn: NodeId, x: &Operand, y: &Operand, against_nil: bool) -> Operand {
        let types = self.types();
        let ordered = matches!(op, TokenKind::Lss | TokenKind::Leq | TokenKind::Gtr | TokenKind::Geq);
        let ok = if ordered {
            types.basic_kind(types.core_type(x.ty)).is_some_and(|k| k.is_ordered()) || types.is_type_param(x.ty)
        } else {
            types.comparable(x.ty) || against_nil && (types.has_nil(x.ty) || types.has_nil(y.ty))
        };
        if !ok {
            let desc = self.describe(xn, x);
            let text = self.text(node);
            let message = if ordered {
                format!("invalid operation: {text} (operator {} not defined on {desc})", op.text())
            } else {
                let ts = self.type_str(x.ty);
                format!("invalid operation: {text} ({ts} cannot be compared)")
            };
            self.error(node, message);
            return Operand::invalid();
        }
        let ty = TypeTable::basic(BasicKind::UntypedBool);
        match (x.constant(), y.constant()) {
            (Some(a), Some(b)) => {
                let value = ConstValue::compare(op, a, b).map_or(ConstValue::Unknown, ConstValue::Bool);
                Operand { mode: Mode::Constant(value), ty }
            }
            _ => Operand::value(ty),
        }
    }

    fn shift(&mut self, node: NodeId, op: TokenKind, xn: NodeId, mut x: Operand, yn: NodeId, mut y: Operand) -> Operand {
        // The count must be an integer (or an untyped constant representable as one).
        if self.types().is_untyped(y.ty) {
            let integral = y.constant().and_then(|v| v.as_i128()).is_some();
            if integral {
                let uint = TypeTable::basic(BasicKind::Uint);
                self.convert_untyped(yn, &mut y, uint);
            } else if y.constant().is_some() {
                let desc = self.describe(yn, &y);
                self.error(yn, format!("invalid operation: shift count {desc} must be integer"));
                return Operand::invalid();
            }
        } else if !self.types().basic_kind(self.core(y.ty)).is_some_and(|k| k.is_integer()) {
            let desc = self.describe(yn, &y);
            self.error(yn, format!("invalid operation: shift count {desc} must be integer"));
            return Operand::invalid();
        }

        if self.types().is_untyped(x.ty) {
            if x.constant().and_then(|v| v.as_i128()).is_none() {
                let desc = self.describe(xn, &x);
                self.error(xn, format!("invalid operation: shifted operand {desc} must be integer"));
                return Operand::invalid();
            }
            if y.constant().is_none() {
                let int = TypeTable::basic(BasicKind::Int);
                self.convert_untyped(xn, &mut x, int);
            } else if x.ty != TypeTable::basic(BasicKind::UntypedRune) {
                x.ty = TypeTable::basic(BasicKind::UntypedInt);
            }
        } else if !self.types().basic_kind(self.core(x.ty)).is_some_and(|k| k.is_integer()) {
            let desc = self.describe(xn, &x);
            self.error(node, format!("invalid operation: shifted operand {desc} must be integer"));
            return Operand::invalid();
        }

        match (x.constant(), y.constant().and_then(|v| v.as_i128())) {
            (Some(v), Some(count)) if count >= 0 => {
                let value = ConstValue::shift(op, v, count as u64);
                Operand { mode: Mode::Constant(value), ty: x.ty }
            }
            _ => Operand::value(x.ty),
        }
    }

    /// Bring the operands of a binary operation to a common type. Untyped
    /// operands take the type of the other operand.
    pub(super) fn match_types(&mut self, xn: NodeId, x: &mut Operand, yn: NodeId, y: &mut Operand) -> bool {
        let (xu, yu) = (self.types().is_untyped(x.ty), self.types().is_untyped(y.ty));
        if xu && !yu {
            if !self.convert_untyped(xn, x, y.ty) {
                return false;
            }
        } else if yu && !xu {
            if !self.convert_untyped(yn, y, x.ty) {
                return false;
            }
        } else if xu && yu {
            let (Some(kx), Some(ky)) = (self.types().basic_kind(x.ty), self.types().basic_kind(y.ty)) else {
                return false;
            };
            if kx.is_numeric() && ky.is_numeric() {
                let rank = |k: BasicKind| match k {
                    BasicKind::UntypedInt => 0,
                    BasicKind::UntypedRune => 1,
                    _ => 2,
                };
                let target = if rank(kx) >= rank(ky) { x.ty } else { y.ty };
                x.ty = target;
                y.ty = target;
                return true;
            }
            return kx == ky || kx == BasicKind::UntypedNil && ky == BasicKind::UntypedNil;
        }
        let types = self.types();
        types.identical(x.ty, y.ty)
            || self.assignable(x, y.ty).is_ok()
            || self.assignable(y, x.ty).is_ok()
    }
}

pub(super) fn is_comparison(op: TokenKind) -> bool {
    matches!(
        op,
        TokenKind::Eql | TokenKind::Neq | TokenKind::Lss | TokenKind::Leq | TokenKind::Gtr | TokenKind::Geq
    )
}
