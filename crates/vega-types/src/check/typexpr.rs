//! Type expressions.

use vega_core::Name;
use vega_syntax::{literals, NodeId, NodeKind, TokenKind};

use super::Checker;
use crate::info::Mode;
use crate::objects::{ObjId, ObjKind, VarKind};
use crate::types::{Field, Interface, Method, Struct, Term, Type, TypeId, TypeTable};

impl Checker<'_> {
    /// Evaluate `node` as a type and record it.
    pub(super) fn typ(&mut self, node: NodeId) -> TypeId {
        let t = self.typ_inner(node);
        if !self.is_invalid_type(t) {
            self.record(node, Mode::TypeExpr, t);
        }
        t
    }

    fn typ_inner(&mut self, node: NodeId) -> TypeId {
        let pf = self.pf();
        let tree = &pf.tree;
        match tree.kind(node) {
            NodeKind::Ident { name } => {
                if name == "_" {
                    self.error(node, "cannot use _ as value or type");
                    return TypeTable::INVALID;
                }
                let Some(obj) = self.resolve_ident(node, true) else {
                    return TypeTable::INVALID;
                };
                self.type_of_type_name(node, obj)
            }
            NodeKind::Selector { x, sel } => {
                let Some(obj) = self.qualified_ident(*x, *sel) else {
                    return TypeTable::INVALID;
                };
                self.type_of_type_name(node, obj)
            }
            NodeKind::Paren { x } => self.typ(*x),
            NodeKind::Star { x } => {
                let elem = self.typ(*x);
                if self.is_invalid_type(elem) {
                    return TypeTable::INVALID;
                }
                self.prog.types.pointer(elem)
            }
            NodeKind::ArrayType { len: None, elem } => {
                let elem = self.typ(*elem);
                self.prog.types.slice(elem)
            }
            NodeKind::ArrayType { len: Some(len), elem } => {
                let n = self.array_length(*len);
                let elem = self.typ(*elem);
                self.alloc(Type::Array { len: n, elem })
            }
            NodeKind::MapType { key, value } => {
                let k = self.typ(*key);
                let v = self.typ(*value);
                if !self.is_invalid_type(k) && !self.types().is_type_param(k) && !self.types().comparable(k) {
                    let ks = self.type_str(k);
                    self.error(*key, format!("invalid map key type {ks}"));
                }
                self.alloc(Type::Map { key: k, value: v })
            }
            NodeKind::ChanType { dir, value } => {
                let elem = self.typ(*value);
                self.alloc(Type::Chan { dir: *dir, elem })
            }
            NodeKind::FuncType { .. } => {
                let sig = self.func_type(node, None);
                self.alloc(Type::Signature(sig))
            }
            NodeKind::StructType { fields } => self.struct_type(*fields),
            NodeKind::InterfaceType { methods } => self.interface_type(*methods),
            NodeKind::Index { x, indices, .. } => {
                let origin = self.typ(*x);
                self.instantiate_type(node, origin, indices)
            }
            NodeKind::Bad => TypeTable::INVALID,
            _ => {
                let text = self.text(node);
                self.error(node, format!("{text} is not a type"));
                TypeTable::INVALID
            }
        }
    }

    fn type_of_type_name(&mut self, node: NodeId, obj: ObjId) -> TypeId {
        self.ensure_resolved(obj);
        let o = &self.prog.objects[obj.idx()];
        match o.kind {
            ObjKind::TypeName { .. } => o.ty,
            _ => {
                let text = self.text(node);
                self.error(node, format!("{text} is not a type"));
                TypeTable::INVALID
            }
        }
    }

    /// Instantiate a generic named type with the types in `indices`.
    pub(super) fn instantiate_type(&mut self, node: NodeId, origin: TypeId, indices: &[NodeId]) -> TypeId {
        let args: Vec<TypeId> = indices.iter().map(|&i| self.typ(i)).collect();
        let Some(named) = self.types().named(origin).cloned() else {
            if !self.is_invalid_type(origin) {
                let ts = self.type_str(origin);
                self.error(node, format!("{ts} is not a generic type"));
            }
            return TypeTable::INVALID;
        };
        if named.type_params.len() != args.len() {
            let message = if args.len() < named.type_params.len() {
                format!("not enough type arguments for type {}: have {}, want {}", self.type_str(origin), args.len(), named.type_params.len())
            } else {
                format!("too many type arguments for type {}: have {}, want {}", self.type_str(origin), args.len(), named.type_params.len())
            };
            self.error(node, message);
            return TypeTable::INVALID;
        }
        if args == named.type_params {
            return origin;
        }
        self.prog.types.instantiate(origin, args)
    }

    /// The length of an array type, if it is a valid constant.
    fn array_length(&mut self, len: NodeId) -> Option<u64> {
        if matches!(self.tree().kind(len), NodeKind::Ellipsis { .. }) {
            return None;
        }
        let x = self.expr(len);
        if x.is_invalid() {
            return None;
        }
        match x.constant().and_then(|v| v.as_i128()) {
            Some(n) if n >= 0 => u64::try_from(n).ok(),
            Some(_) => {
                let text = self.text(len);
                self.error(len, format!("invalid array length {text}"));
                None
            }
            None => {
                let desc = self.describe(len, &x);
                self.error(len, format!("array length {desc} must be constant"));
                None
            }
        }
    }

    fn struct_type(&mut self, list: NodeId) -> TypeId {
        let pf = self.pf();
        let tree = &pf.tree;
        let NodeKind::FieldList { fields, .. } = tree.kind(list) else {
            return TypeTable::INVALID;
        };
        let mut out: Vec<Field> = Vec::new();
        for &field in fields {
            let NodeKind::Field { names, ty, tag } = tree.kind(field) else {
                continue;
            };
            let t = self.typ(*ty);
            let tag = tag.and_then(|t| match tree.kind(t) {
                NodeKind::BasicLit { value, .. } => literals::unquote(value).ok(),
                _ => None,
            });
            if names.is_empty() {
                let name = embedded_name(tree, *ty).unwrap_or_default();
                let obj = self.new_object(name.clone(), ObjKind::Var(VarKind::Field), t, None, Some(field));
                self.record_implicit(field, obj);
                self.push_field(&mut out, field, Field { name, ty: t, embedded: true, obj, tag: tag.clone() });
                continue;
            }
            for &ident in names {
                let name = self.ident_name(ident);
                let obj = self.new_object(name.clone(), ObjKind::Var(VarKind::Field), t, Some(ident), Some(field));
                self.record_def(ident, obj);
                self.push_field(&mut out, ident, Field { name, ty: t, embedded: false, obj, tag: tag.clone() });
            }
        }
        self.alloc(Type::Struct(Struct { fields: out }))
    }

    fn push_field(&mut self, out: &mut Vec<Field>, at: NodeId, field: Field) {
        if field.name != "_" && out.iter().any(|f| f.name == field.name) {
            self.error(at, format!("{} redeclared", field.name));
            return;
        }
        out.push(field);
    }

    fn interface_type(&mut self, list: NodeId) -> TypeId {
        let pf = self.pf();
        let tree = &pf.tree;
        let NodeKind::FieldList { fields, .. } = tree.kind(list) else {
            return TypeTable::INVALID;
        };
        let mut iface = Interface::default();
        for &field in fields {
            let NodeKind::Field { names, ty, .. } = tree.kind(field) else {
                continue;
            };
            match names.first() {
                Some(&ident) => {
                    let name = self.ident_name(ident);
                    let sig = self.func_type(*ty, None);
                    let sig = self.alloc(Type::Signature(sig));
                    self.record(*ty, Mode::TypeExpr, sig);
                    let obj = self.new_object(name.clone(), ObjKind::Func, sig, Some(ident), Some(field));
                    self.record_def(ident, obj);
                    if iface.methods.iter().any(|m| m.name == name) {
                        self.error(ident, format!("duplicate method {name}"));
                        continue;
                    }
                    iface.methods.push(Method { name, sig, obj });
                }
                None => {
                    let terms = self.union_terms(*ty);
                    match terms.as_slice() {
                        [Term { tilde: false, ty }] if self.types().is_interface(*ty) => iface.embeddeds.push(*ty),
                        _ => iface.terms.extend(terms),
                    }
                }
            }
        }
        self.alloc(Type::Interface(iface))
    }

    fn union_terms(&mut self, node: NodeId) -> Vec<Term> {
        let pf = self.pf();
        match pf.tree.kind(node) {
            NodeKind::Binary { op: TokenKind::Or, x, y, .. } => {
                let mut terms = self.union_terms(*x);
                terms.extend(self.union_terms(*y));
                terms
            }
            NodeKind::Unary { op: TokenKind::Tilde, x } => {
                let ty = self.typ(*x);
                vec![Term { tilde: true, ty }]
            }
            _ => {
                let ty = self.typ(node);
                vec![Term { tilde: false, ty }]
            }
        }
    }

    /// A type parameter bound; a bare union or `~T` is wrapped in an
    /// implicit interface.
    pub(super) fn constraint(&mut self, node: NodeId) -> TypeId {
        let terms = self.union_terms(node);
        match terms.as_slice() {
            [Term { tilde: false, ty }] if self.types().is_interface(*ty) || self.is_invalid_type(*ty) => *ty,
            _ => self.alloc(Type::Interface(Interface {
                methods: Vec::new(),
                embeddeds: Vec::new(),
                terms,
            })),
        }
    }

    /// Resolve an identifier in the current scope, recording the use. Reports
    /// `undefined: x` when it does not resolve.
    pub(super) fn resolve_ident(&mut self, ident: NodeId, mark_used: bool) -> Option<ObjId> {
        let name = self.ident_name(ident);
        let pos = self.pos(ident);
        let Some(obj) = self.lookup(&name, pos) else {
            self.error(ident, format!("undefined: {name}"));
            return None;
        };
        self.record_use(ident, obj);
        if mark_used || self.prog.objects[obj.idx()].is_pkg_name() {
            self.mark_used(obj);
        }
        Some(obj)
    }

    /// Resolve `pkg.Name` when `x` names an imported package. Returns `None`
    /// (after reporting) when `x` is a package but `Name` is not exported or
    /// missing, and also when `x` is not a package.
    pub(super) fn qualified_ident(&mut self, x: NodeId, sel: NodeId) -> Option<ObjId> {
        let ObjKind::PkgName { imported, .. } = self.package_ref(x)? else {
            return None;
        };
        self.qualified_member(imported?, sel)
    }

    /// The package object `x` refers to, if `x` is an identifier naming an
    /// import. Marks the import used.
    pub(super) fn package_ref(&mut self, x: NodeId) -> Option<ObjKind> {
        let name = self.tree().ident_name(x)?.clone();
        let pos = self.pos(x);
        let obj = self.lookup(&name, pos)?;
        let kind = self.prog.objects[obj.idx()].kind.clone();
        if !matches!(kind, ObjKind::PkgName { .. }) {
            return None;
        }
        self.record_use(x, obj);
        self.mark_used(obj);
        Some(kind)
    }
}

/// Name of an embedded field: the type name without pointer, package
/// qualifier or type arguments.
fn embedded_name(tree: &vega_syntax::SyntaxTree, mut ty: NodeId) -> Option<Name> {
    loop {
        match tree.kind(ty) {
            NodeKind::Star { x } | NodeKind::Paren { x } => ty = *x,
            NodeKind::Index { x, .. } => ty = *x,
            NodeKind::Selector { sel, .. } => ty = *sel,
            NodeKind::Ident { name } => return Some(name.clone()),
            _ => return None,
        }
    }
}
