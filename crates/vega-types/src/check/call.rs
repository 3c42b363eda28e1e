//! Calls, conversions and builtins.

use std::collections::HashMap;

use vega_syntax::{NodeId, NodeKind, TokenKind};

use super::{Checker, Operand};
use crate::constant::ConstValue;
use crate::info::Mode;
use crate::objects::{Builtin, ObjKind};
use crate::types::{BasicKind, Signature, Type, TypeId, TypeTable};

impl Checker<'_> {
    pub(super) fn call(&mut self, node: NodeId) -> Operand {
        let pf = self.pf();
        let NodeKind::Call { fun, args, ellipsis, .. } = pf.tree.kind(node) else {
            return Operand::invalid();
        };
        let f = self.expr(*fun);
        match f.mode {
            Mode::TypeExpr => return self.conversion(node, f.ty, args),
            Mode::Builtin => {
                let ident = pf.tree.unparen(*fun);
                let key = self.key(ident);
                let builtin = self
                    .prog
                    .info
                    .uses
                    .get(&key)
                    .and_then(|o| match self.prog.objects[o.idx()].kind {
                        ObjKind::Builtin(b) => Some(b),
                        _ => None,
                    });
                return match builtin {
                    Some(b) => self.builtin(node, b, args, ellipsis.is_some()),
                    None => Operand::invalid(),
                };
            }
            _ => {}
        }
        if f.is_invalid() {
            self.eval_args(args);
            return Operand::invalid();
        }
        let f = self.single_value(*fun, f);
        let Some(mut sig) = self.types().signature(self.core(f.ty)).cloned() else {
            if !f.is_invalid() {
                let desc = self.describe(*fun, &f);
                self.error(node, format!("invalid operation: cannot call non-function {desc}"));
            }
            self.eval_args(args);
            return Operand::invalid();
        };

        let mut ops = self.arguments(args);
        let fname = self.text(*fun);

        if !sig.type_params.is_empty() {
            match self.infer(&sig, &ops) {
                Ok(map) => {
                    let inst = self.prog.types.subst(f.ty, &map);
                    match self.types().signature(inst).cloned() {
                        Some(s) => {
                            self.record(*fun, Mode::Value, inst);
                            sig = s;
                        }
                        None => return Operand::invalid(),
                    }
                }
                Err(name) => {
                    self.error(node, format!("in call to {fname}, cannot infer {name}"));
                    return Operand::invalid();
                }
            }
        }

        self.check_arguments(node, &fname, &sig, &mut ops, ellipsis.is_some());

        let results = sig.results.iter().map(|r| r.ty).collect::<Vec<_>>();
        match results.as_slice() {
            [] => Operand {
                mode: Mode::NoValue,
                ty: TypeTable::INVALID,
            },
            [single] => Operand::value(*single),
            _ => {
                let t = self.prog.types.tuple(results);
                Operand::value(t)
            }
        }
    }

    fn eval_args(&mut self, args: &[NodeId]) {
        for &a in args {
            self.expr(a);
        }
    }

    /// Evaluate call arguments; a single multi-value call is spread into
    /// one operand per result.
    fn arguments(&mut self, args: &[NodeId]) -> Vec<(NodeId, Operand)> {
        if let [single] = args {
            let x = self.expr(*single);
            if let Type::Tuple(elems) = self.types().get(x.ty) {
                return elems.iter().map(|&e| (*single, Operand::value(e))).collect();
            }
            let x = self.single_value(*single, x);
            return vec![(*single, x)];
        }
        args.iter().map(|&a| (a, self.value(a))).collect()
    }

    fn check_arguments(&mut self, node: NodeId, fname: &str, sig: &Signature, ops: &mut [(NodeId, Operand)], spread: bool) {
        let nparams = sig.params.len();
        let nargs = ops.len();
        let count_ok = if spread {
            sig.variadic && nargs == nparams
        } else if sig.variadic {
            nargs + 1 >= nparams
        } else {
            nargs == nparams
        };
        if !count_ok {
            if spread && !sig.variadic {
                self.error(node, format!("have (...) argument in call to non-variadic {fname}"));
                return;
            }
            let few = nargs < nparams;
            let have = ops
                .iter()
                .map(|(_, x)| self.result_type_str(x))
                .collect::<Vec<_>>()
                .join(", ");
            let want = sig
                .params
                .iter()
                .enumerate()
                .map(|(i, p)| match self.types().get(p.ty) {
                    Type::Slice(elem) if sig.variadic && i + 1 == nparams => format!("...{}", self.type_str(*elem)),
                    _ => self.type_str(p.ty),
                })
                .collect::<Vec<_>>()
                .join(", ");
            let message = format!(
                "{} arguments in call to {fname}\n\thave ({have})\n\twant ({want})",
                if few { "not enough" } else { "too many" }
            );
            match (few, ops.get(nparams)) {
                (false, Some((extra, _))) => self.error(*extra, message),
                _ => {
                    let end = self.end(node);
                    self.error_at(end, end, message);
                }
            }
            return;
        }
        if ops.iter().any(|(_, x)| x.is_invalid()) {
            return;
        }
        let context = format!("argument to {fname}");
        for (i, (arg, x)) in ops.iter_mut().enumerate() {
            let param = if sig.variadic && i + 1 >= nparams {
                let last = sig.params[nparams - 1].ty;
                if spread {
                    last
                } else {
                    match self.types().get(last) {
                        Type::Slice(elem) => *elem,
                        _ => last,
                    }
                }
            } else {
                sig.params[i].ty
            };
            self.assign_to(*arg, x, param, &context);
        }
    }

    /// Spelling of an operand type in `have (...)` lists: untyped constants
    /// are shown as `number`.
    pub(super) fn result_type_str(&self, x: &Operand) -> String {
        match self.types().basic_kind(x.ty) {
            Some(k) if k.is_untyped() && k.is_numeric() => "number".to_string(),
            Some(BasicKind::UntypedNil) => "nil".to_string(),
            Some(BasicKind::UntypedString) => "string".to_string(),
            Some(BasicKind::UntypedBool) => "bool".to_string(),
            _ => self.type_str(x.ty),
        }
    }

    /// Infer the type arguments of a generic call from its arguments. Typed
    /// arguments are unified first, then untyped constants supply default
    /// types, then core types of constraints fill in what remains.
    fn infer(&mut self, sig: &Signature, ops: &[(NodeId, Operand)]) -> Result<HashMap<TypeId, TypeId>, String> {
        let tparams = sig.type_params.clone();
        let mut map: HashMap<TypeId, TypeId> = HashMap::new();
        let param_ty = |i: usize| -> Option<TypeId> {
            if sig.variadic && i + 1 >= sig.params.len() {
                let last = sig.params.last()?.ty;
                match self.types().get(last) {
                    Type::Slice(elem) => Some(*elem),
                    _ => Some(last),
                }
            } else {
                sig.params.get(i).map(|p| p.ty)
            }
        };
        let mut untyped = Vec::new();
        for (i, (_, x)) in ops.iter().enumerate() {
            let Some(p) = param_ty(i) else {
                break;
            };
            if x.is_invalid() {
                continue;
            }
            if self.types().is_untyped(x.ty) {
                untyped.push((p, x.ty));
                continue;
            }
            self.unify(p, x.ty, &tparams, &mut map);
        }
        for (p, arg) in untyped {
            if tparams.contains(&p) && !map.contains_key(&p) && arg != TypeTable::basic(BasicKind::UntypedNil) {
                map.insert(p, self.types().default_type(arg));
            }
        }
        for &tp in &tparams {
            let Type::TypeParam(data) = self.types().get(tp) else {
                continue;
            };
            let core = self.types().core_type(data.constraint);
            if core == data.constraint || self.is_invalid_type(core) {
                continue;
            }
            match map.get(&tp).copied() {
                Some(bound) => {
                    let u = self.underlying(bound);
                    self.unify(core, u, &tparams, &mut map);
                }
                None => {
                    let resolved = self.prog.types.subst(core, &map);
                    if !mentions(self.types(), resolved, &tparams) {
                        map.insert(tp, resolved);
                    }
                }
            }
        }
        for &tp in &tparams {
            if !map.contains_key(&tp) {
                let name = match self.types().get(tp) {
                    Type::TypeParam(data) => self.prog.objects[data.obj.idx()].name.to_string(),
                    _ => String::new(),
                };
                return Err(name);
            }
        }
        Ok(map)
    }

    fn unify(&self, p: TypeId, a: TypeId, tparams: &[TypeId], map: &mut HashMap<TypeId, TypeId>) {
        let types = self.types();
        if tparams.contains(&p) {
            map.entry(p).or_insert(a);
            return;
        }
        let a = if !types.is_named(p) && types.is_named(a) { types.underlying(a) } else { a };
        match (types.get(p), types.get(a)) {
            (Type::Pointer(pe), Type::Pointer(ae)) | (Type::Slice(pe), Type::Slice(ae)) => self.unify(*pe, *ae, tparams, map),
            (Type::Array { elem: pe, .. }, Type::Array { elem: ae, .. }) | (Type::Chan { elem: pe, .. }, Type::Chan { elem: ae, .. }) => {
                self.unify(*pe, *ae, tparams, map)
            }
            (Type::Map { key: pk, value: pv }, Type::Map { key: ak, value: av }) => {
                self.unify(*pk, *ak, tparams, map);
                self.unify(*pv, *av, tparams, map);
            }
            (Type::Signature(ps), Type::Signature(asig)) => {
                for (x, y) in ps.params.iter().zip(&asig.params) {
                    self.unify(x.ty, y.ty, tparams, map);
                }
                for (x, y) in ps.results.iter().zip(&asig.results) {
                    self.unify(x.ty, y.ty, tparams, map);
                }
            }
            (Type::Named(pn), Type::Named(an)) if types.origin(p) == types.origin(a) => {
                for (x, y) in pn.type_args.iter().zip(&an.type_args) {
                    self.unify(*x, *y, tparams, map);
                }
            }
            _ => {}
        }
    }

    fn conversion(&mut self, node: NodeId, t: TypeId, args: &[NodeId]) -> Operand {
        let ts = self.type_str(t);
        let [arg] = args else {
            self.eval_args(args);
            let message = if args.is_empty() {
                format!("missing argument in conversion to {ts}")
            } else {
                format!("too many arguments in conversion to {ts}")
            };
            self.error(node, message);
            return Operand::invalid();
        };
        let mut x = self.value(*arg);
        if x.is_invalid() || self.is_invalid_type(t) {
            return Operand::invalid();
        }
        let target = self.types().basic_kind(self.underlying(t));

        if let (Some(v), Some(tk)) = (x.constant().cloned(), target) {
            if tk.is_const_type() {
                let from = self.types().basic_kind(self.underlying(x.ty));
                let ok = match from {
                    Some(k) if k.is_numeric() && tk.is_numeric() => true,
                    Some(k) if k.is_integer() && tk.is_string() => true,
                    Some(k) => k.is_string() && tk.is_string() || k.is_boolean() && tk.is_boolean(),
                    None => false,
                };
                if ok {
                    let value = match (from, &v) {
                        (Some(k), ConstValue::Int(c)) if k.is_integer() && tk.is_string() => {
                            let ch = u32::try_from(*c).ok().and_then(char::from_u32).unwrap_or('\u{FFFD}');
                            ConstValue::String(ch.to_string())
                        }
                        _ => v.convert(tk),
                    };
                    if self.types().is_untyped(x.ty) && from.is_some_and(|k| k.is_numeric() == tk.is_numeric()) {
                        self.update_untyped(*arg, t);
                    }
                    return Operand {
                        mode: Mode::Constant(value),
                        ty: t,
                    };
                }
            }
        }

        if self.types().is_untyped(x.ty) {
            let nil = x.ty == TypeTable::basic(BasicKind::UntypedNil);
            if nil && !self.types().has_nil(t) {
                self.error(node, format!("cannot convert nil to type {ts}"));
                return Operand::invalid();
            }
            let goal = if target.is_some() || nil { t } else { self.types().default_type(x.ty) };
            if !self.convert_untyped(*arg, &mut x, goal) {
                self.default_untyped(*arg, &mut x);
            }
        }
        if !self.convertible(&x, t) {
            let desc = self.describe(*arg, &x);
            self.error(node, format!("cannot convert {desc} to type {ts}"));
            return Operand::invalid();
        }
        Operand::value(t)
    }

    fn convertible(&self, x: &Operand, t: TypeId) -> bool {
        if self.assignable(x, t).is_ok() {
            return true;
        }
        let types = self.types();
        let (v, vu, tu) = (x.ty, types.underlying(x.ty), types.underlying(t));
        if types.is_type_param(v) || types.is_type_param(t) {
            return true;
        }
        if types.identical(vu, tu) {
            return true;
        }
        if let (Type::Pointer(a), Type::Pointer(b)) = (types.get(vu), types.get(tu)) {
            if types.identical(types.underlying(*a), types.underlying(*b)) {
                return true;
            }
        }
        let (vk, tk) = (types.basic_kind(vu), types.basic_kind(tu));
        if vk.is_some_and(|k| k.is_numeric()) && tk.is_some_and(|k| k.is_numeric()) {
            return true;
        }
        let bytes_or_runes = |t: TypeId| match types.get(t) {
            Type::Slice(e) => matches!(
                types.basic_kind(types.underlying(*e)),
                Some(BasicKind::Byte | BasicKind::Uint8 | BasicKind::Rune | BasicKind::Int32)
            ),
            _ => false,
        };
        if tk.is_some_and(|k| k.is_string()) && (vk.is_some_and(|k| k.is_integer() || k.is_string()) || bytes_or_runes(vu)) {
            return true;
        }
        if vk.is_some_and(|k| k.is_string()) && bytes_or_runes(tu) {
            return true;
        }
        if let Type::Slice(e) = types.get(vu) {
            match types.get(tu) {
                Type::Array { elem, .. } => return types.identical(*e, *elem),
                Type::Pointer(p) => {
                    if let Type::Array { elem, .. } = types.get(types.underlying(*p)) {
                        return types.identical(*e, *elem);
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn builtin(&mut self, node: NodeId, b: Builtin, args: &[NodeId], spread: bool) -> Operand {
        let name = b.name();
        let int = TypeTable::basic(BasicKind::Int);
        let no_value = Operand {
            mode: Mode::NoValue,
            ty: TypeTable::INVALID,
        };
        let arity = |n: usize| args.len() == n;
        match b {
            Builtin::Len | Builtin::Cap => {
                if !arity(1) {
                    return self.builtin_arity(node, name, args);
                }
                let x = self.value(args[0]);
                if x.is_invalid() {
                    return x;
                }
                let core = self.core(x.ty);
                let core = match self.types().get(core) {
                    Type::Pointer(p) if matches!(self.types().get(self.underlying(*p)), Type::Array { .. }) => self.underlying(*p),
                    _ => core,
                };
                let ok = match self.types().get(core) {
                    Type::Basic(k) => k.is_string() && b == Builtin::Len,
                    Type::Array { .. } | Type::Slice(_) | Type::Chan { .. } => true,
                    Type::Map { .. } => b == Builtin::Len,
                    _ => self.types().is_type_param(x.ty),
                };
                if !ok {
                    let desc = self.describe(args[0], &x);
                    self.error(args[0], format!("invalid argument: {desc} for built-in {name}"));
                    return Operand::invalid();
                }
                let constant = match (self.types().get(core), x.constant()) {
                    (Type::Basic(_), Some(v)) => v.as_str().map(|s| s.len() as i128),
                    _ => None,
                };
                match constant {
                    Some(n) => Operand {
                        mode: Mode::Constant(ConstValue::Int(n)),
                        ty: int,
                    },
                    None => Operand::value(int),
                }
            }
            Builtin::Append => {
                let Some((&first, rest)) = args.split_first() else {
                    return self.builtin_arity(node, name, args);
                };
                let s = self.value(first);
                if s.is_invalid() {
                    self.eval_args(rest);
                    return s;
                }
                if s.ty == TypeTable::basic(BasicKind::UntypedNil) {
                    self.eval_args(rest);
                    self.error(first, "first argument to append must be a typed slice; have untyped nil");
                    return Operand::invalid();
                }
                let Type::Slice(elem) = self.types().get(self.core(s.ty)).clone() else {
                    self.eval_args(rest);
                    let desc = self.describe(first, &s);
                    self.error(first, format!("invalid argument: {desc} is not a slice"));
                    return Operand::invalid();
                };
                if spread {
                    if let [r] = rest {
                        let mut x = self.value(*r);
                        let is_string = self.types().basic_kind(self.core(x.ty)).is_some_and(|k| k.is_string());
                        if !x.is_invalid() && !is_string {
                            self.assign_to(*r, &mut x, s.ty, "argument to append");
                        }
                    } else {
                        self.eval_args(rest);
                    }
                } else {
                    for &r in rest {
                        let mut x = self.value(r);
                        if !x.is_invalid() {
                            self.assign_to(r, &mut x, elem, "argument to append");
                        }
                    }
                }
                Operand::value(s.ty)
            }
            Builtin::Make => {
                let Some((&first, sizes)) = args.split_first() else {
                    return self.builtin_arity(node, name, args);
                };
                let t = self.typ(first);
                for &size in sizes {
                    let mut x = self.value(size);
                    if !x.is_invalid() {
                        self.assign_to(size, &mut x, int, "argument to make");
                    }
                }
                if self.is_invalid_type(t) {
                    return Operand::invalid();
                }
                if !matches!(self.types().get(self.core(t)), Type::Slice(_) | Type::Map { .. } | Type::Chan { .. }) {
                    let ts = self.type_str(t);
                    self.error(first, format!("invalid argument: cannot make {ts}; type must be slice, map, or channel"));
                    return Operand::invalid();
                }
                Operand::value(t)
            }
            Builtin::New => {
                if !arity(1) {
                    return self.builtin_arity(node, name, args);
                }
                let t = self.typ(args[0]);
                if self.is_invalid_type(t) {
                    return Operand::invalid();
                }
                let p = self.prog.types.pointer(t);
                Operand::value(p)
            }
            Builtin::Delete => {
                if !arity(2) {
                    return self.builtin_arity(node, name, args);
                }
                let m = self.value(args[0]);
                let mut k = self.value(args[1]);
                if let Type::Map { key, .. } = self.types().get(self.core(m.ty)).clone() {
                    if !k.is_invalid() {
                        self.assign_to(args[1], &mut k, key, "argument to delete");
                    }
                } else if !m.is_invalid() {
                    let desc = self.describe(args[0], &m);
                    self.error(args[0], format!("invalid argument: {desc} is not a map"));
                }
                no_value
            }
            Builtin::Close | Builtin::Clear => {
                if !arity(1) {
                    return self.builtin_arity(node, name, args);
                }
                self.value(args[0]);
                no_value
            }
            Builtin::Copy => {
                if !arity(2) {
                    return self.builtin_arity(node, name, args);
                }
                self.value(args[0]);
                self.value(args[1]);
                Operand::value(int)
            }
            Builtin::Panic => {
                if !arity(1) {
                    return self.builtin_arity(node, name, args);
                }
                let mut x = self.value(args[0]);
                let any = self.prog.universe.any;
                if !x.is_invalid() {
                    self.assign_to(args[0], &mut x, any, "argument to panic");
                }
                no_value
            }
            Builtin::Print | Builtin::Println => {
                for &a in args {
                    let mut x = self.value(a);
                    if !x.is_invalid() {
                        self.default_untyped(a, &mut x);
                    }
                }
                no_value
            }
            Builtin::Recover => {
                self.eval_args(args);
                Operand::value(self.prog.universe.any)
            }
            Builtin::Complex => {
                self.eval_args(args);
                Operand::value(TypeTable::basic(BasicKind::Complex128))
            }
            Builtin::Real | Builtin::Imag => {
                self.eval_args(args);
                Operand::value(TypeTable::basic(BasicKind::Float64))
            }
            Builtin::Min | Builtin::Max => {
                let Some((&first, rest)) = args.split_first() else {
                    return self.builtin_arity(node, name, args);
                };
                let mut acc = self.value(first);
                for &r in rest {
                    let mut y = self.value(r);
                    if acc.is_invalid() || y.is_invalid() {
                        return Operand::invalid();
                    }
                    if !self.match_types(first, &mut acc, r, &mut y) {
                        let (xs, ys) = (self.type_str(acc.ty), self.type_str(y.ty));
                        let text = self.text(r);
                        self.error(node, format!("invalid argument: mismatched types {xs} (previous argument) and {ys} (type of {text})"));
                        return Operand::invalid();
                    }
                    acc = match (acc.constant().cloned(), y.constant().cloned()) {
                        (Some(a), Some(c)) => {
                            let op = if b == Builtin::Min { TokenKind::Lss } else { TokenKind::Gtr };
                            let keep = ConstValue::compare(op, &a, &c).unwrap_or(true);
                            let value = if keep { a } else { c };
                            Operand { mode: Mode::Constant(value), ty: acc.ty }
                        }
                        _ => Operand::value(acc.ty),
                    };
                }
                acc
            }
        }
    }

    fn builtin_arity(&mut self, node: NodeId, name: &str, args: &[NodeId]) -> Operand {
        self.eval_args(args);
        let few = args.is_empty() || matches!(name, "delete" | "copy") && args.len() < 2;
        let message = if few {
            format!("not enough arguments for {name}")
        } else {
            format!("too many arguments for {name}")
        };
        self.error(node, message);
        Operand::invalid()
    }
}

/// Whether `t` mentions any of `tparams`.
fn mentions(types: &TypeTable, t: TypeId, tparams: &[TypeId]) -> bool {
    if tparams.contains(&t) {
        return true;
    }
    match types.get(t) {
        Type::Pointer(e) | Type::Slice(e) | Type::Array { elem: e, .. } | Type::Chan { elem: e, .. } => {
            mentions(types, *e, tparams)
        }
        Type::Map { key, value } => mentions(types, *key, tparams) || mentions(types, *value, tparams),
        Type::Signature(sig) => sig.params.iter().chain(&sig.results).any(|p| mentions(types, p.ty, tparams)),
        Type::Named(named) => named.type_args.iter().any(|a| mentions(types, *a, tparams)),
        Type::Tuple(elems) => elems.iter().any(|e| mentions(types, *e, tparams)),
        _ => false,
    }
}
