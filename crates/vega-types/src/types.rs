//! The Go type graph.
//!
//! Types live in a [`TypeTable`] arena and are referred to by [`TypeId`].
//! Basic types are preallocated so `TypeTable::basic(kind)` is a constant
//! lookup. Named types are mutable while their declaration is resolved; every
//! other type is immutable once allocated.

use std::collections::{HashMap, HashSet};
use std::fmt;

use vega_core::Name;
use vega_syntax::ChanDir;

use crate::objects::ObjId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    #[must_use]
    pub const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    /// `byte`, identical to `uint8`.
    Byte,
    /// `rune`, identical to `int32`.
    Rune,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub const ALL: [BasicKind; 27] = [
        BasicKind::Invalid,
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::UnsafePointer,
        BasicKind::Byte,
        BasicKind::Rune,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedRune,
        BasicKind::UntypedFloat,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::Byte => "byte",
            BasicKind::Rune => "rune",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    /// Collapses the `byte`/`rune` aliases.
    pub fn canonical(self) -> BasicKind {
        match self {
            BasicKind::Byte => BasicKind::Uint8,
            BasicKind::Rune => BasicKind::Int32,
            k => k,
        }
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self.canonical(),
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self.canonical(),
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            BasicKind::Float32 | BasicKind::Float64 | BasicKind::UntypedFloat
        )
    }

    pub fn is_complex(self) -> bool {
        matches!(self, BasicKind::Complex64 | BasicKind::Complex128)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }

    pub fn is_ordered(self) -> bool {
        self.is_integer() || self.is_float() || self.is_string()
    }

    /// Valid types for constants.
    pub fn is_const_type(self) -> bool {
        self.is_boolean() || self.is_numeric() || self.is_string()
    }

    /// Bit size of sized integer kinds; `int`, `uint` and `uintptr` are 64-bit.
    pub fn int_bits(self) -> Option<u32> {
        Some(match self.canonical() {
            BasicKind::Int8 | BasicKind::Uint8 => 8,
            BasicKind::Int16 | BasicKind::Uint16 => 16,
            BasicKind::Int32 | BasicKind::Uint32 => 32,
            BasicKind::Int | BasicKind::Int64 | BasicKind::Uint | BasicKind::Uint64 | BasicKind::Uintptr => 64,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Name,
    pub ty: TypeId,
    pub obj: Option<ObjId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub recv: Option<Param>,
    pub type_params: Vec<TypeId>,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    /// The last parameter is `...T`; its recorded type is `[]T`.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Name,
    pub ty: TypeId,
    pub embedded: bool,
    pub obj: ObjId,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Struct {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: Name,
    pub sig: TypeId,
    pub obj: ObjId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub tilde: bool,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interface {
    /// Explicitly declared methods, in source order.
    pub methods: Vec<Method>,
    pub embeddeds: Vec<TypeId>,
    /// Union terms of a constraint interface (`~int | string`).
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Named {
    pub obj: ObjId,
    pub underlying: TypeId,
    /// Declared methods; instances look them up on their origin.
    pub methods: Vec<ObjId>,
    pub type_params: Vec<TypeId>,
    pub type_args: Vec<TypeId>,
    pub origin: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub obj: ObjId,
    pub constraint: TypeId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Basic(BasicKind),
    Pointer(TypeId),
    Slice(TypeId),
    /// `len` is `None` while unknown (`[...]T` outside a literal, or a
    /// non-constant length).
    Array { len: Option<u64>, elem: TypeId },
    Map { key: TypeId, value: TypeId },
    Chan { dir: ChanDir, elem: TypeId },
    Signature(Signature),
    Struct(Struct),
    Interface(Interface),
    /// Result list of a multi-value call.
    Tuple(Vec<TypeId>),
    Named(Named),
    TypeParam(TypeParam),
}

struct IdentCx<'a> {
    map: &'a HashMap<TypeId, TypeId>,
    assumed: Vec<(TypeId, TypeId)>,
}

#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<Type>,
    pointers: HashMap<TypeId, TypeId>,
    slices: HashMap<TypeId, TypeId>,
    instances: HashMap<(TypeId, Vec<TypeId>), TypeId>,
    /// Instances created before their origin's underlying type was known.
    pending: Vec<TypeId>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub const INVALID: TypeId = TypeId(0);

    pub fn new() -> Self {
        TypeTable {
            types: BasicKind::ALL.iter().map(|k| Type::Basic(*k)).collect(),
            pointers: HashMap::new(),
            slices: HashMap::new(),
            instances: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub const fn basic(kind: BasicKind) -> TypeId {
        TypeId(kind as u32)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.idx()]
    }

    pub(crate) fn alloc(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub(crate) fn named_mut(&mut self, id: TypeId) -> Option<&mut Named> {
        match &mut self.types[id.idx()] {
            Type::Named(named) => Some(named),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, id: TypeId, ty: Type) {
        self.types[id.idx()] = ty;
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        if let Some(id) = self.pointers.get(&elem) {
            return *id;
        }
        let id = self.alloc(Type::Pointer(elem));
        self.pointers.insert(elem, id);
        id
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        if let Some(id) = self.slices.get(&elem) {
            return *id;
        }
        let id = self.alloc(Type::Slice(elem));
        self.slices.insert(elem, id);
        id
    }

    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.alloc(Type::Tuple(elems))
    }

    pub fn is_invalid(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Basic(BasicKind::Invalid))
    }

    /// The underlying type. Type parameters are their own underlying type.
    pub fn underlying(&self, mut id: TypeId) -> TypeId {
        for _ in 0..64 {
            match self.get(id) {
                Type::Named(named) => id = named.underlying,
                _ => return id,
            }
        }
        Self::INVALID
    }

    pub fn basic_kind(&self, id: TypeId) -> Option<BasicKind> {
        match self.get(self.underlying(id)) {
            Type::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_untyped(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Basic(k) if k.is_untyped())
    }

    pub fn is_named(&self, id: TypeId) -> bool {
        matches!(
            self.get(id),
            Type::Named(_) | Type::TypeParam(_) | Type::Basic(_)
        )
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        matches!(self.get(self.underlying(id)), Type::Interface(_))
            && !matches!(self.get(id), Type::TypeParam(_))
    }

    pub fn is_type_param(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::TypeParam(_))
    }

    pub fn signature(&self, id: TypeId) -> Option<&Signature> {
        match self.get(self.underlying(id)) {
            Type::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn named(&self, id: TypeId) -> Option<&Named> {
        match self.get(id) {
            Type::Named(named) => Some(named),
            _ => None,
        }
    }

    /// `T` for `*T`, otherwise `None`.
    pub fn pointer_elem(&self, id: TypeId) -> Option<TypeId> {
        match self.get(self.underlying(id)) {
            Type::Pointer(elem) => Some(*elem),
            _ => None,
        }
    }

    /// Strips one level of pointer indirection, if any.
    pub fn deref(&self, id: TypeId) -> (TypeId, bool) {
        match self.get(id) {
            Type::Pointer(elem) => (*elem, true),
            _ => (id, false),
        }
    }

    /// The type an untyped value takes when no other type is imposed.
    pub fn default_type(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::Basic(kind) => Self::basic(match kind {
                BasicKind::UntypedBool => BasicKind::Bool,
                BasicKind::UntypedInt => BasicKind::Int,
                BasicKind::UntypedRune => BasicKind::Rune,
                BasicKind::UntypedFloat => BasicKind::Float64,
                BasicKind::UntypedString => BasicKind::String,
                _ => return id,
            }),
            _ => id,
        }
    }

    /// Values of the type can be compared with `==`.
    pub fn comparable(&self, id: TypeId) -> bool {
        let mut seen = HashSet::new();
        self.comparable_inner(id, &mut seen)
    }

    fn comparable_inner(&self, id: TypeId, seen: &mut HashSet<TypeId>) -> bool {
        if !seen.insert(id) {
            return true;
        }
        match self.get(self.underlying(id)) {
            Type::Basic(kind) => *kind != BasicKind::UntypedNil,
            Type::Pointer(_) | Type::Chan { .. } | Type::Interface(_) | Type::TypeParam(_) => true,
            Type::Struct(st) => st.fields.iter().all(|f| self.comparable_inner(f.ty, seen)),
            Type::Array { elem, .. } => self.comparable_inner(*elem, seen),
            _ => false,
        }
    }

    /// Whether `nil` is assignable to the type.
    pub fn has_nil(&self, id: TypeId) -> bool {
        matches!(
            self.get(self.underlying(id)),
            Type::Pointer(_)
                | Type::Slice(_)
                | Type::Map { .. }
                | Type::Chan { .. }
                | Type::Signature(_)
                | Type::Interface(_)
                | Type::Basic(BasicKind::UnsafePointer)
        )
    }

    pub fn identical(&self, a: TypeId, b: TypeId) -> bool {
        self.identical_with(a, b, &HashMap::new())
    }

    /// Identity after replacing type parameters of `a` according to `map`.
    pub fn identical_with(&self, a: TypeId, b: TypeId, map: &HashMap<TypeId, TypeId>) -> bool {
        let mut cx = IdentCx {
            map,
            assumed: Vec::new(),
        };
        self.identical_inner(a, b, &mut cx)
    }

    fn identical_inner(&self, a: TypeId, b: TypeId, assumed: &mut IdentCx<'_>) -> bool {
        let a = assumed.map.get(&a).copied().unwrap_or(a);
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Type::Basic(x), Type::Basic(y)) => x.canonical() == y.canonical(),
            (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => {
                self.identical_inner(*x, *y, assumed)
            }
            (Type::Array { len: l1, elem: e1 }, Type::Array { len: l2, elem: e2 }) => {
                l1 == l2 && self.identical_inner(*e1, *e2, assumed)
            }
            (Type::Map { key: k1, value: v1 }, Type::Map { key: k2, value: v2 }) => {
                self.identical_inner(*k1, *k2, assumed) && self.identical_inner(*v1, *v2, assumed)
            }
            (Type::Chan { dir: d1, elem: e1 }, Type::Chan { dir: d2, elem: e2 }) => {
                d1 == d2 && self.identical_inner(*e1, *e2, assumed)
            }
            (Type::Signature(s1), Type::Signature(s2)) => {
                s1.variadic == s2.variadic
                    && s1.type_params.len() == s2.type_params.len()
                    && self.params_identical(&s1.params, &s2.params, assumed)
                    && self.params_identical(&s1.results, &s2.results, assumed)
            }
            (Type::Struct(s1), Type::Struct(s2)) => {
                s1.fields.len() == s2.fields.len()
                    && s1.fields.iter().zip(&s2.fields).all(|(f1, f2)| {
                        f1.name == f2.name
                            && f1.embedded == f2.embedded
                            && f1.tag == f2.tag
                            && self.identical_inner(f1.ty, f2.ty, assumed)
                    })
            }
            (Type::Interface(_), Type::Interface(_)) => {
                if assumed.assumed.contains(&(a, b)) {
                    return true;
                }
                assumed.assumed.push((a, b));
                let m1 = self.interface_methods(a);
                let m2 = self.interface_methods(b);
                let (t1, t2) = (self.interface_terms(a), self.interface_terms(b));
                let same = m1.len() == m2.len()
                    && m1.iter().zip(&m2).all(|(x, y)| {
                        x.name == y.name && self.identical_inner(x.sig, y.sig, assumed)
                    })
                    && t1.len() == t2.len()
                    && t1.iter().zip(&t2).all(|(x, y)| {
                        x.tilde == y.tilde && self.identical_inner(x.ty, y.ty, assumed)
                    });
                assumed.assumed.pop();
                same
            }
            (Type::Tuple(x), Type::Tuple(y)) => {
                x.len() == y.len()
                    && x.iter().zip(y).all(|(p, q)| self.identical_inner(*p, *q, assumed))
            }
            (Type::Named(n1), Type::Named(n2)) => match (n1.origin, n2.origin) {
                (Some(o1), Some(o2)) => {
                    o1 == o2
                        && n1.type_args.len() == n2.type_args.len()
                        && n1
                            .type_args
                            .iter()
                            .zip(&n2.type_args)
                            .all(|(x, y)| self.identical_inner(*x, *y, assumed))
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn params_identical(&self, p1: &[Param], p2: &[Param], assumed: &mut IdentCx<'_>) -> bool {
        p1.len() == p2.len()
            && p1
                .iter()
                .zip(p2)
                .all(|(x, y)| self.identical_inner(x.ty, y.ty, assumed))
    }

    /// The complete method set of an interface (including embedded
    /// interfaces), sorted by name.
    pub fn interface_methods(&self, id: TypeId) -> Vec<Method> {
        let mut out: Vec<Method> = Vec::new();
        let mut seen = HashSet::new();
        self.collect_interface_methods(id, &mut out, &mut seen);
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out.dedup_by(|a, b| a.name == b.name);
        out
    }

    fn collect_interface_methods(&self, id: TypeId, out: &mut Vec<Method>, seen: &mut HashSet<TypeId>) {
        if !seen.insert(id) {
            return;
        }
        let Type::Interface(iface) = self.get(self.underlying(id)) else {
            return;
        };
        out.extend(iface.methods.iter().cloned());
        for embedded in &iface.embeddeds {
            self.collect_interface_methods(*embedded, out, seen);
        }
    }

    fn interface_terms(&self, id: TypeId) -> Vec<Term> {
        match self.get(self.underlying(id)) {
            Type::Interface(iface) => {
                let mut terms = iface.terms.clone();
                for embedded in &iface.embeddeds {
                    if !self.is_interface(*embedded) {
                        terms.push(Term {
                            tilde: false,
                            ty: *embedded,
                        });
                    }
                }
                terms
            }
            _ => Vec::new(),
        }
    }

    /// Whether the interface is a plain method set (usable as a value type).
    pub fn is_basic_interface(&self, id: TypeId) -> bool {
        self.is_interface(id) && self.interface_terms(id).is_empty()
    }

    /// The single underlying type of a type parameter's constraint, if it has
    /// one (`~[]E` has core type `[]E`). Other types are their own core type.
    pub fn core_type(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::TypeParam(tp) => {
                let terms = self.interface_terms(tp.constraint);
                let mut core: Option<TypeId> = None;
                for term in terms {
                    let u = self.underlying(term.ty);
                    match core {
                        None => core = Some(u),
                        Some(c) if self.identical(c, u) => {}
                        Some(_) => return Self::INVALID,
                    }
                }
                core.unwrap_or(Self::INVALID)
            }
            _ => self.underlying(id),
        }
    }

    /// Instantiate a generic named type.
    pub fn instantiate(&mut self, origin: TypeId, args: Vec<TypeId>) -> TypeId {
        let key = (origin, args.clone());
        if let Some(id) = self.instances.get(&key) {
            return *id;
        }
        let Some(named) = self.named(origin).cloned() else {
            return Self::INVALID;
        };
        let id = self.alloc(Type::Named(Named {
            obj: named.obj,
            underlying: Self::INVALID,
            methods: Vec::new(),
            type_params: Vec::new(),
            type_args: args,
            origin: Some(origin),
        }));
        self.instances.insert(key, id);
        if self.is_invalid(named.underlying) {
            self.pending.push(id);
        } else {
            self.expand(id);
        }
        id
    }

    fn expand(&mut self, instance: TypeId) {
        let Some(inst) = self.named(instance).cloned() else {
            return;
        };
        let Some(origin) = inst.origin.and_then(|o| self.named(o).cloned()) else {
            return;
        };
        let map: HashMap<TypeId, TypeId> = origin
            .type_params
            .iter()
            .copied()
            .zip(inst.type_args.iter().copied())
            .collect();
        let underlying = self.subst(origin.underlying, &map);
        if let Some(named) = self.named_mut(instance) {
            named.underlying = underlying;
        }
    }

    /// Expand instances whose origin has since been resolved.
    pub(crate) fn complete_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for id in pending {
            let ready = self
                .named(id)
                .and_then(|n| n.origin)
                .and_then(|o| self.named(o))
                .is_some_and(|o| !self.is_invalid(o.underlying));
            if ready {
                self.expand(id);
            } else {
                self.pending.push(id);
            }
        }
    }

    /// Replace type parameters according to `map`.
    pub fn subst(&mut self, id: TypeId, map: &HashMap<TypeId, TypeId>) -> TypeId {
        if map.is_empty() {
            return id;
        }
        let mut depth = 0;
        self.subst_inner(id, map, &mut depth)
    }

    fn subst_inner(&mut self, id: TypeId, map: &HashMap<TypeId, TypeId>, depth: &mut u32) -> TypeId {
        if let Some(to) = map.get(&id) {
            return *to;
        }
        if *depth > 32 {
            return id;
        }
        *depth += 1;
        let ty = self.get(id).clone();
        let out = match ty {
            Type::Basic(_) | Type::TypeParam(_) => id,
            Type::Pointer(elem) => {
                let e = self.subst_inner(elem, map, depth);
                if e == elem {
                    id
                } else {
                    self.pointer(e)
                }
            }
            Type::Slice(elem) => {
                let e = self.subst_inner(elem, map, depth);
                if e == elem {
                    id
                } else {
                    self.slice(e)
                }
            }
            Type::Array { len, elem } => {
                let e = self.subst_inner(elem, map, depth);
                if e == elem {
                    id
                } else {
                    self.alloc(Type::Array { len, elem: e })
                }
            }
            Type::Map { key, value } => {
                let k = self.subst_inner(key, map, depth);
                let v = self.subst_inner(value, map, depth);
                if k == key && v == value {
                    id
                } else {
                    self.alloc(Type::Map { key: k, value: v })
                }
            }
            Type::Chan { dir, elem } => {
                let e = self.subst_inner(elem, map, depth);
                if e == elem {
                    id
                } else {
                    self.alloc(Type::Chan { dir, elem: e })
                }
            }
            Type::Signature(sig) => {
                let mut changed = false;
                let mut subst_params = |this: &mut Self, params: &[Param]| -> Vec<Param> {
                    params
                        .iter()
                        .map(|p| {
                            let ty = this.subst_inner(p.ty, map, depth);
                            changed |= ty != p.ty;
                            Param { ty, ..p.clone() }
                        })
                        .collect()
                };
                let params = subst_params(self, &sig.params);
                let results = subst_params(self, &sig.results);
                if changed {
                    self.alloc(Type::Signature(Signature {
                        recv: sig.recv.clone(),
                        type_params: Vec::new(),
                        params,
                        results,
                        variadic: sig.variadic,
                    }))
                } else {
                    id
                }
            }
            Type::Struct(st) => {
                let mut changed = false;
                let fields = st
                    .fields
                    .iter()
                    .map(|f| {
                        let ty = self.subst_inner(f.ty, map, depth);
                        changed |= ty != f.ty;
                        Field { ty, ..f.clone() }
                    })
                    .collect();
                if changed {
                    self.alloc(Type::Struct(Struct { fields }))
                } else {
                    id
                }
            }
            Type::Interface(iface) => {
                let mut changed = false;
                let methods = iface
                    .methods
                    .iter()
                    .map(|m| {
                        let sig = self.subst_inner(m.sig, map, depth);
                        changed |= sig != m.sig;
                        Method { sig, ..m.clone() }
                    })
                    .collect();
                let embeddeds = iface
                    .embeddeds
                    .iter()
                    .map(|e| {
                        let t = self.subst_inner(*e, map, depth);
                        changed |= t != *e;
                        t
                    })
                    .collect();
                let terms = iface
                    .terms
                    .iter()
                    .map(|t| {
                        let ty = self.subst_inner(t.ty, map, depth);
                        changed |= ty != t.ty;
                        Term { tilde: t.tilde, ty }
                    })
                    .collect();
                if changed {
                    self.alloc(Type::Interface(Interface {
                        methods,
                        embeddeds,
                        terms,
                    }))
                } else {
                    id
                }
            }
            Type::Tuple(elems) => {
                let new: Vec<TypeId> = elems.iter().map(|e| self.subst_inner(*e, map, depth)).collect();
                if new == elems {
                    id
                } else {
                    self.tuple(new)
                }
            }
            Type::Named(named) => match named.origin {
                Some(origin) if !named.type_args.is_empty() => {
                    let args: Vec<TypeId> = named
                        .type_args
                        .iter()
                        .map(|a| self.subst_inner(*a, map, depth))
                        .collect();
                    if args == named.type_args {
                        id
                    } else {
                        self.instantiate(origin, args)
                    }
                }
                _ => id,
            },
        };
        *depth -= 1;
        out
    }

    /// The origin of an instantiated named type, or the type itself.
    pub fn origin(&self, id: TypeId) -> TypeId {
        self.named(id).and_then(|n| n.origin).unwrap_or(id)
    }

    /// Declared methods of a named type (or of its origin).
    pub fn declared_methods(&self, id: TypeId) -> &[ObjId] {
        match self.named(self.origin(id)) {
            Some(named) => &named.methods,
            None => &[],
        }
    }

    /// Type-parameter substitution that maps an instance's origin parameters
    /// to its arguments.
    pub fn instance_map(&self, id: TypeId) -> HashMap<TypeId, TypeId> {
        let Some(named) = self.named(id) else {
            return HashMap::new();
        };
        let Some(origin) = named.origin.and_then(|o| self.named(o)) else {
            return HashMap::new();
        };
        origin
            .type_params
            .iter()
            .copied()
            .zip(named.type_args.iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_is_identical_to_uint8() {
        let mut table = TypeTable::new();
        let a = table.slice(TypeTable::basic(BasicKind::Byte));
        let b = table.alloc(Type::Slice(TypeTable::basic(BasicKind::Uint8)));
        assert!(table.identical(a, b));
        assert!(!table.identical(a, TypeTable::basic(BasicKind::String)));
    }

    #[test]
    fn untyped_defaults() {
        let table = TypeTable::new();
        assert_eq!(
            table.default_type(TypeTable::basic(BasicKind::UntypedFloat)),
            TypeTable::basic(BasicKind::Float64)
        );
        assert_eq!(
            table.default_type(TypeTable::basic(BasicKind::UntypedRune)),
            TypeTable::basic(BasicKind::Rune)
        );
    }
}
