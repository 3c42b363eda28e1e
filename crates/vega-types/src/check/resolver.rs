//! Package-level objects: collection, lazy resolution and method association.

use vega_core::Name;
use vega_syntax::{NodeId, NodeKind, Pos, SyntaxTree, TokenKind};

use super::{Checker, DeclInfo, DeclKind, FuncContext};
use crate::constant::ConstValue;
use crate::objects::{ObjKind, ObjId, VarKind};
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::types::{Param, Signature, Type, TypeTable};

impl Checker<'_> {
    pub(super) fn collect_objects(&mut self) {
        let pkg_scope = self.prog.packages[self.pkg.idx()].scope;
        for i in 0..self.files.len() {
            self.file = i;
            let pf = self.pf();
            let tree = &pf.tree;
            let root = tree.root();

            let (start, end) = pf.node_pos(root);
            let mut scope = Scope::new(ScopeKind::File, Some(pkg_scope), start, end);
            scope.node = Some(self.key(root));
            let file_scope = self.prog.new_scope(scope);
            let key = self.key(root);
            self.prog.info.scopes.insert(key, file_scope);
            self.file_scopes.push(file_scope);

            for &spec in tree.imports() {
                self.import_spec(tree, spec, file_scope);
            }

            for &decl in tree.decls() {
                match tree.kind(decl) {
                    NodeKind::GenDecl { tok, specs, .. } => match tok {
                        TokenKind::Const => self.collect_consts(tree, specs, pkg_scope),
                        TokenKind::Var => self.collect_vars(tree, specs, pkg_scope),
                        TokenKind::Type => {
                            for &spec in specs {
                                self.collect_type(tree, spec, pkg_scope);
                            }
                        }
                        _ => {}
                    },
                    NodeKind::FuncDecl { recv: Some(_), .. } => self.methods.push((i, decl)),
                    NodeKind::FuncDecl { name, .. } => {
                        let fname = self.ident_name(*name);
                        let obj = self.new_object(fname.clone(), ObjKind::Func, TypeTable::INVALID, Some(*name), Some(decl));
                        if fname == "init" || fname == "_" {
                            self.record_def(*name, obj);
                        } else {
                            self.declare(pkg_scope, Some(*name), obj, Pos::NONE);
                        }
                        self.decls.insert(obj, DeclInfo { file: i, kind: DeclKind::Func { decl } });
                        self.order.push(obj);
                    }
                    _ => {}
                }
            }
        }
    }

    fn import_spec(&mut self, tree: &SyntaxTree, spec: NodeId, file_scope: ScopeId) {
        let NodeKind::ImportSpec { name, path } = tree.kind(spec) else {
            return;
        };
        let Some(import_path) = tree.import_path(spec) else {
            return;
        };
        let imported = self.prog.by_path.get(&import_path).copied();
        if let Some(dep) = imported {
            self.prog.packages[self.pkg.idx()]
                .imports
                .insert(import_path.clone(), dep);
        } else {
            self.error(*path, format!("could not import {import_path} (no package for import {import_path})"));
        }

        let declared = match imported {
            Some(dep) => self.prog.packages[dep.idx()].name.clone(),
            None => Name::new(import_path.rsplit('/').next().unwrap_or(&import_path)),
        };
        let local = name.map_or_else(|| declared.clone(), |n| self.ident_name(n));
        if local == "_" {
            return;
        }

        let obj = self.new_object(
            local.clone(),
            ObjKind::PkgName {
                path: import_path,
                imported,
            },
            TypeTable::INVALID,
            *name,
            Some(spec),
        );
        if imported.is_none() {
            self.used_imports.insert(obj);
        }
        if local == "." {
            self.used_imports.insert(obj);
            self.record_implicit(spec, obj);
            if let Some(dep) = imported {
                let dep_scope = self.prog.packages[dep.idx()].scope;
                let exported: Vec<(Name, ObjId)> = self.prog.scopes[dep_scope.idx()]
                    .names
                    .iter()
                    .filter(|(_, o)| self.prog.objects[o.idx()].is_exported())
                    .map(|(n, o)| (n.clone(), *o))
                    .collect();
                for (n, o) in exported {
                    self.prog.scopes[file_scope.idx()].names.entry(n).or_insert(o);
                }
            }
            return;
        }
        match name {
            Some(ident) => self.declare(file_scope, Some(*ident), obj, Pos::NONE),
            None => {
                self.record_implicit(spec, obj);
                self.declare(file_scope, None, obj, Pos::NONE);
            }
        }
    }

    fn collect_consts(&mut self, tree: &SyntaxTree, specs: &[NodeId], pkg_scope: ScopeId) {
        // A spec without values repeats the previous type and values.
        let mut last: (Option<NodeId>, Vec<NodeId>) = (None, Vec::new());
        for (iota, &spec) in specs.iter().enumerate() {
            let NodeKind::ValueSpec { names, ty, values } = tree.kind(spec) else {
                continue;
            };
            if ty.is_some() || !values.is_empty() {
                last = (*ty, values.clone());
            }
            for (i, &ident) in names.iter().enumerate() {
                let name = self.ident_name(ident);
                let obj = self.new_object(name, ObjKind::Const(ConstValue::Unknown), TypeTable::INVALID, Some(ident), Some(spec));
                self.declare(pkg_scope, Some(ident), obj, Pos::NONE);
                self.decls.insert(
                    obj,
                    DeclInfo {
                        file: self.file,
                        kind: DeclKind::Const {
                            ty: last.0,
                            init: last.1.get(i).copied(),
                            iota: iota as i128,
                        },
                    },
                );
                self.order.push(obj);
            }
        }
    }

    fn collect_vars(&mut self, tree: &SyntaxTree, specs: &[NodeId], pkg_scope: ScopeId) {
        for &spec in specs {
            let NodeKind::ValueSpec { names, ty, values } = tree.kind(spec) else {
                continue;
            };
            let multi = values.len() == 1 && names.len() > 1;
            let lhs: Vec<ObjId> = names
                .iter()
                .map(|&ident| {
                    let name = self.ident_name(ident);
                    self.new_object(name, ObjKind::Var(VarKind::PackageLevel), TypeTable::INVALID, Some(ident), Some(spec))
                })
                .collect();
            for (i, (&ident, &obj)) in names.iter().zip(&lhs).enumerate() {
                self.declare(pkg_scope, Some(ident), obj, Pos::NONE);
                let init = if multi { values.first() } else { values.get(i) };
                self.decls.insert(
                    obj,
                    DeclInfo {
                        file: self.file,
                        kind: DeclKind::Var {
                            ty: *ty,
                            init: init.copied(),
                            lhs: lhs.clone(),
                            multi,
                        },
                    },
                );
                self.order.push(obj);
            }
            if !values.is_empty() && !multi && values.len() != names.len() {
                self.error(
                    spec,
                    format!(
                        "assignment mismatch: {} variable{} but {} value{}",
                        names.len(),
                        plural(names.len()),
                        values.len(),
                        plural(values.len())
                    ),
                );
            }
        }
    }

    fn collect_type(&mut self, tree: &SyntaxTree, spec: NodeId, scope: ScopeId) {
        let NodeKind::TypeSpec { name, assign, .. } = tree.kind(spec) else {
            return;
        };
        let tname = self.ident_name(*name);
        let obj = self.new_object(tname, ObjKind::TypeName { alias: *assign }, TypeTable::INVALID, Some(*name), Some(spec));
        if !*assign {
            let named = self.prog.types.alloc(Type::Named(crate::types::Named {
                obj,
                underlying: TypeTable::INVALID,
                methods: Vec::new(),
                type_params: Vec::new(),
                type_args: Vec::new(),
                origin: None,
            }));
            self.set_obj_ty(obj, named);
        }
        self.declare(scope, Some(*name), obj, Pos::NONE);
        self.decls.insert(obj, DeclInfo { file: self.file, kind: DeclKind::Type { spec } });
        self.order.push(obj);
    }

    pub(super) fn associate_methods(&mut self) {
        let pkg_scope = self.prog.packages[self.pkg.idx()].scope;
        for (file, decl) in std::mem::take(&mut self.methods) {
            self.file = file;
            let pf = self.pf();
            let tree = &pf.tree;
            let NodeKind::FuncDecl { recv: Some(recv), name, .. } = tree.kind(decl) else {
                continue;
            };
            let mname = self.ident_name(*name);
            let obj = self.new_object(mname.clone(), ObjKind::Func, TypeTable::INVALID, Some(*name), Some(decl));
            self.record_def(*name, obj);
            self.decls.insert(obj, DeclInfo { file, kind: DeclKind::Func { decl } });
            self.order.push(obj);

            let Some(base) = receiver_base(tree, *recv) else {
                continue;
            };
            let base_name = self.ident_name(base);
            let Some(tobj) = self.prog.scopes[pkg_scope.idx()].lookup(&base_name) else {
                continue;
            };
            let named = self.obj_ty(tobj);
            if !matches!(self.prog.objects[tobj.idx()].kind, ObjKind::TypeName { alias: false }) {
                continue;
            }
            let duplicate = self
                .prog
                .types
                .declared_methods(named)
                .iter()
                .any(|m| self.prog.objects[m.idx()].name == mname);
            if duplicate && mname != "_" {
                self.error(*name, format!("method {base_name}.{mname} already declared"));
                continue;
            }
            if let Some(n) = self.prog.types.named_mut(named) {
                n.methods.push(obj);
            }
        }
    }

    /// Resolve the type, value or signature of a package-level object.
    pub(super) fn obj_decl(&mut self, obj: ObjId) {
        if self.resolved.contains(&obj) || self.resolving.contains(&obj) {
            return;
        }
        let Some(info) = self.decls.get(&obj).cloned() else {
            return;
        };
        self.resolving.push(obj);
        let saved_file = self.file;
        let saved_scope = self.scope;
        let saved_ctx = std::mem::take(&mut self.ctx);
        self.file = info.file;
        self.scope = self.file_scopes[info.file];

        match info.kind {
            DeclKind::Const { ty, init, iota } => self.const_decl(obj, ty, init, iota),
            DeclKind::Var { ty, init, lhs, multi } => {
                if multi {
                    for o in &lhs {
                        self.resolving.push(*o);
                    }
                    let declared = ty.map(|t| self.typ(t));
                    self.init_vars(&lhs, declared, init.as_slice(), init);
                    for o in &lhs {
                        self.resolving.retain(|r| r != o);
                        self.resolved.insert(*o);
                    }
                } else {
                    let declared = ty.map(|t| self.typ(t));
                    self.init_vars(&[obj], declared, init.as_slice(), init);
                }
            }
            DeclKind::Type { spec } => self.type_decl(obj, spec),
            DeclKind::Func { decl } => self.func_decl(obj, decl),
        }
        self.report_unused();

        self.file = saved_file;
        self.scope = saved_scope;
        self.ctx = saved_ctx;
        self.resolving.retain(|r| *r != obj);
        self.resolved.insert(obj);
    }

    fn const_decl(&mut self, obj: ObjId, ty: Option<vega_syntax::NodeId>, init: Option<NodeId>, iota: i128) {
        self.ctx.iota = Some(ConstValue::Int(iota));
        let (t, value) = self.const_value(ty, init);
        self.ctx.iota = None;
        self.set_obj_ty(obj, t);
        self.prog.objects[obj.idx()].kind = ObjKind::Const(value);
    }

    /// Type and value of a constant declared with `ty` and `init`.
    pub(super) fn const_value(&mut self, ty: Option<NodeId>, init: Option<NodeId>) -> (crate::types::TypeId, ConstValue) {
        let declared = ty.map(|t| self.typ(t));
        let Some(init) = init else {
            return (TypeTable::INVALID, ConstValue::Unknown);
        };
        let mut x = self.expr(init);
        if x.is_invalid() {
            return (TypeTable::INVALID, ConstValue::Unknown);
        }
        if x.constant().is_none() {
            let desc = self.describe(init, &x);
            self.error(init, format!("{desc} is not constant"));
            return (TypeTable::INVALID, ConstValue::Unknown);
        }
        if let Some(t) = declared {
            if !self.assign_to(init, &mut x, t, "constant declaration") {
                return (TypeTable::INVALID, ConstValue::Unknown);
            }
        }
        let value = x.constant().cloned().unwrap_or(ConstValue::Unknown);
        (x.ty, value)
    }

    pub(super) fn type_decl(&mut self, obj: ObjId, spec: NodeId) {
        let pf = self.pf();
        let NodeKind::TypeSpec { type_params, assign, ty, .. } = pf.tree.kind(spec) else {
            return;
        };
        if *assign {
            let t = self.typ(*ty);
            self.set_obj_ty(obj, t);
            return;
        }
        let named = self.obj_ty(obj);
        let outer = self.scope;
        if let Some(tparams) = type_params {
            self.open_scope(spec, ScopeKind::Block);
            let params = self.declare_type_params(*tparams);
            if let Some(n) = self.prog.types.named_mut(named) {
                n.type_params = params;
            }
        }
        let rhs = self.typ(*ty);
        let underlying = self.underlying(rhs);
        if let Some(n) = self.prog.types.named_mut(named) {
            n.underlying = underlying;
        }
        self.scope = outer;
        self.prog.types.complete_pending();
    }

    fn func_decl(&mut self, obj: ObjId, decl: NodeId) {
        let pf = self.pf();
        let NodeKind::FuncDecl { recv, ty, .. } = pf.tree.kind(decl) else {
            return;
        };
        let (start, _) = pf.node_pos(*ty);
        let (_, end) = pf.node_pos(decl);
        let outer = self.scope;
        let scope = self.open_scope_at(*ty, start, end, ScopeKind::Func);

        let recv_param = recv.and_then(|r| self.receiver(r, scope));
        let mut sig = self.func_type(*ty, Some(scope));
        sig.recv = recv_param;
        let sig_ty = self.alloc(Type::Signature(sig));
        self.record(*ty, crate::info::Mode::TypeExpr, sig_ty);
        self.set_obj_ty(obj, sig_ty);
        self.scope = outer;
    }

    /// Declare the receiver (and its type parameters) in the method scope.
    fn receiver(&mut self, recv: NodeId, scope: ScopeId) -> Option<Param> {
        let pf = self.pf();
        let tree = &pf.tree;
        let NodeKind::FieldList { fields, .. } = tree.kind(recv) else {
            return None;
        };
        let &field = fields.first()?;
        let NodeKind::Field { names, ty, .. } = tree.kind(field) else {
            return None;
        };

        // Receiver type parameters denote the base type's parameters.
        let mut base = *ty;
        loop {
            match tree.kind(base) {
                NodeKind::Star { x } | NodeKind::Paren { x } => base = *x,
                _ => break,
            }
        }
        if let NodeKind::Index { x, indices, .. } = tree.kind(base) {
            let base_name = self.ident_name(*x);
            let pkg_scope = self.prog.packages[self.pkg.idx()].scope;
            let origin = self.prog.scopes[pkg_scope.idx()]
                .lookup(&base_name)
                .map(|o| self.obj_ty(o));
            let tparams = origin
                .and_then(|o| self.prog.types.named(o))
                .map(|n| n.type_params.clone())
                .unwrap_or_default();
            for (i, &ident) in indices.iter().enumerate() {
                let Some(&tp) = tparams.get(i) else {
                    break;
                };
                let name = self.ident_name(ident);
                let obj = self.new_object(name, ObjKind::TypeName { alias: true }, tp, Some(ident), None);
                self.declare(scope, Some(ident), obj, Pos::NONE);
            }
        }

        let t = self.typ(*ty);
        let (base_ty, _) = self.types().deref(t);
        if !self.is_invalid_type(base_ty) && !matches!(self.types().get(base_ty), Type::Named(_)) {
            self.error(*ty, format!("invalid receiver type {}", self.type_str(t)));
        }
        let (name, obj) = match names.first() {
            Some(&ident) => {
                let name = self.ident_name(ident);
                let obj = self.new_object(name.clone(), ObjKind::Var(VarKind::Receiver), t, Some(ident), Some(field));
                self.declare(scope, Some(ident), obj, Pos::NONE);
                (name, Some(obj))
            }
            None => (Name::default(), None),
        };
        Some(Param { name, ty: t, obj })
    }

    pub(super) fn check_bodies(&mut self) {
        for obj in self.order.clone() {
            let Some(DeclInfo { file, kind: DeclKind::Func { decl } }) = self.decls.get(&obj).cloned() else {
                continue;
            };
            self.file = file;
            let pf = self.pf();
            let NodeKind::FuncDecl { ty, body: Some(body), .. } = pf.tree.kind(decl) else {
                continue;
            };
            let Some(&scope) = self.prog.info.scopes.get(&self.key(*ty)) else {
                continue;
            };
            self.scope = scope;
            self.ctx = FuncContext {
                sig: Some(self.obj_ty(obj)),
                ..FuncContext::default()
            };
            self.func_body(*body);
            self.report_unused();
            self.ctx = FuncContext::default();
            self.scope = self.file_scopes[file];
        }
    }

    pub(super) fn unused_imports(&mut self) {
        for i in 0..self.files.len() {
            self.file = i;
            let scope = self.file_scopes[i];
            let unused: Vec<ObjId> = self.prog.scopes[scope.idx()]
                .names
                .values()
                .copied()
                .filter(|o| {
                    self.prog.objects[o.idx()].is_pkg_name()
                        && self.prog.objects[o.idx()].parent == Some(scope)
                        && !self.used_imports.contains(o)
                })
                .collect();
            for obj in unused {
                let o = &self.prog.objects[obj.idx()];
                let (ObjKind::PkgName { path, imported }, Some(decl)) = (&o.kind, o.decl) else {
                    continue;
                };
                let declared = imported.map(|p| self.prog.packages[p.idx()].name.clone());
                let message = match declared {
                    Some(declared) if declared != o.name => {
                        format!("{:?} imported as {} and not used", path, o.name)
                    }
                    _ => format!("{path:?} imported and not used"),
                };
                self.error(decl.node, message);
            }
        }
    }

    /// Build a signature from a `FuncType`, declaring parameters in `scope`
    /// when given.
    pub(super) fn func_type(&mut self, ft: NodeId, scope: Option<ScopeId>) -> Signature {
        let pf = self.pf();
        let NodeKind::FuncType { type_params, params, results } = pf.tree.kind(ft) else {
            return Signature::default();
        };
        let type_params = match type_params {
            Some(tp) => self.declare_type_params(*tp),
            None => Vec::new(),
        };
        let (params, variadic) = self.param_list(*params, scope, VarKind::Param);
        let (results, _) = match results {
            Some(r) => self.param_list(*r, scope, VarKind::Result),
            None => (Vec::new(), false),
        };
        Signature {
            recv: None,
            type_params,
            params,
            results,
            variadic,
        }
    }

    fn param_list(&mut self, list: NodeId, scope: Option<ScopeId>, kind: VarKind) -> (Vec<Param>, bool) {
        let pf = self.pf();
        let tree = &pf.tree;
        let NodeKind::FieldList { fields, .. } = tree.kind(list) else {
            // A single unparenthesized result type.
            let t = self.typ(list);
            return (vec![Param { name: Name::default(), ty: t, obj: None }], false);
        };
        let mut out = Vec::new();
        let mut variadic = false;
        for (i, &field) in fields.iter().enumerate() {
            let NodeKind::Field { names, ty, .. } = tree.kind(field) else {
                continue;
            };
            let t = match tree.kind(*ty) {
                NodeKind::Ellipsis { elt } => {
                    let elem = match elt {
                        Some(e) => self.typ(*e),
                        None => TypeTable::INVALID,
                    };
                    if i + 1 == fields.len() && kind == VarKind::Param {
                        variadic = true;
                    } else {
                        self.error(*ty, "can only use ... with final parameter in list");
                    }
                    let t = self.prog.types.slice(elem);
                    self.record(*ty, crate::info::Mode::TypeExpr, t);
                    t
                }
                _ => self.typ(*ty),
            };
            if names.is_empty() {
                out.push(Param { name: Name::default(), ty: t, obj: None });
                continue;
            }
            for &ident in names {
                let name = self.ident_name(ident);
                let obj = self.new_object(name.clone(), ObjKind::Var(kind), t, Some(ident), Some(field));
                match scope {
                    Some(scope) => self.declare(scope, Some(ident), obj, Pos::NONE),
                    None => self.record_def(ident, obj),
                }
                out.push(Param { name, ty: t, obj: Some(obj) });
            }
        }
        (out, variadic)
    }

    /// Declare a type parameter list in the current scope.
    pub(super) fn declare_type_params(&mut self, list: NodeId) -> Vec<crate::types::TypeId> {
        let pf = self.pf();
        let tree = &pf.tree;
        let NodeKind::FieldList { fields, .. } = tree.kind(list) else {
            return Vec::new();
        };
        let mut params = Vec::new();
        let mut bounds = Vec::new();
        for &field in fields {
            let NodeKind::Field { names, ty, .. } = tree.kind(field) else {
                continue;
            };
            for &ident in names {
                let name = self.ident_name(ident);
                let obj = self.new_object(name, ObjKind::TypeName { alias: false }, TypeTable::INVALID, Some(ident), Some(field));
                let tp = self.alloc(Type::TypeParam(crate::types::TypeParam {
                    obj,
                    constraint: TypeTable::INVALID,
                    index: params.len(),
                }));
                self.set_obj_ty(obj, tp);
                let scope = self.scope;
                self.declare(scope, Some(ident), obj, Pos::NONE);
                params.push(tp);
                bounds.push(*ty);
            }
        }
        for (tp, bound) in params.iter().zip(bounds) {
            let constraint = self.constraint(bound);
            if let Type::TypeParam(p) = self.types().get(*tp).clone() {
                self.prog.types.set(*tp, Type::TypeParam(crate::types::TypeParam { constraint, ..p }));
            }
        }
        params
    }
}

/// The identifier naming a receiver's base type: `T` in `*T`, `T[K]` or `(T)`.
pub(super) fn receiver_base(tree: &SyntaxTree, recv: NodeId) -> Option<NodeId> {
    let NodeKind::FieldList { fields, .. } = tree.kind(recv) else {
        return None;
    };
    let NodeKind::Field { ty, .. } = tree.kind(*fields.first()?) else {
        return None;
    };
    let mut t = *ty;
    loop {
        match tree.kind(t) {
            NodeKind::Star { x } | NodeKind::Paren { x } => t = *x,
            NodeKind::Index { x, .. } => t = *x,
            NodeKind::Ident { .. } => return Some(t),
            _ => return None,
        }
    }
}

pub(super) fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
