//! Field and method lookup, method sets and interface satisfaction.

use std::collections::{HashMap, HashSet};

use vega_core::Name;

use crate::objects::{ObjId, PkgId};
use crate::program::Program;
use crate::types::{Type, TypeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    pub obj: ObjId,
    /// Field type, or the declared method signature (before substituting the
    /// receiver's type arguments).
    pub ty: TypeId,
    pub index: Vec<usize>,
    pub indirect: bool,
    pub is_method: bool,
    /// The method has a pointer receiver but the operand is neither a pointer
    /// nor addressable.
    pub needs_pointer: bool,
    /// The named type that declares the method or the struct holding the
    /// field, as reached from the operand.
    pub holder: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMethod {
    pub name: Name,
    /// The method exists with a different signature.
    pub wrong_type: bool,
    /// The method exists but only on the pointer type.
    pub pointer_receiver: bool,
}

struct Embedded {
    ty: TypeId,
    index: Vec<usize>,
    indirect: bool,
}

impl Program {
    /// Look up a field or method `name` on values of type `t`, searching
    /// embedded fields breadth first. Unexported names only match objects of
    /// package `pkg`. Ambiguous selectors yield `None`.
    pub fn lookup_field_or_method(
        &self,
        t: TypeId,
        addressable: bool,
        pkg: Option<PkgId>,
        name: &str,
    ) -> Option<LookupResult> {
        if name == "_" {
            return None;
        }
        let types = &self.types;
        let exported = name.chars().next().is_some_and(char::is_uppercase);
        let visible = |obj: ObjId| exported || self.obj(obj).pkg == pkg || self.obj(obj).pkg.is_none();

        // Methods are not looked up through a named pointer type.
        let (start, is_ptr) = match types.get(t) {
            Type::Pointer(elem) => (*elem, true),
            Type::Named(_) if types.pointer_elem(t).is_some() => {
                let elem = types.pointer_elem(t)?;
                return self
                    .lookup_field_or_method(elem, true, pkg, name)
                    .filter(|r| !r.is_method)
                    .map(|r| LookupResult { indirect: true, ..r });
            }
            _ => (t, false),
        };

        let mut current = vec![Embedded {
            ty: start,
            index: Vec::new(),
            indirect: is_ptr,
        }];
        let mut seen: HashSet<TypeId> = HashSet::new();

        while !current.is_empty() {
            let mut next = Vec::new();
            let mut found: Option<LookupResult> = None;
            let mut count = 0;

            for e in current {
                let mut typ = e.ty;
                if let Type::Named(_) = types.get(typ) {
                    if !seen.insert(typ) {
                        continue;
                    }
                    let methods = types.declared_methods(typ);
                    if let Some((i, &m)) = methods
                        .iter()
                        .enumerate()
                        .find(|(_, m)| self.obj(**m).name == name && visible(**m))
                    {
                        count += 1;
                        let ptr_recv = self.has_pointer_receiver(m);
                        let mut index = e.index.clone();
                        index.push(i);
                        found = Some(LookupResult {
                            obj: m,
                            ty: self.obj(m).ty,
                            index,
                            indirect: e.indirect,
                            is_method: true,
                            needs_pointer: ptr_recv && !e.indirect && !addressable,
                            holder: typ,
                        });
                        continue;
                    }
                    typ = types.underlying(typ);
                }

                match types.get(typ) {
                    Type::Struct(st) => {
                        for (i, field) in st.fields.iter().enumerate() {
                            let mut index = e.index.clone();
                            index.push(i);
                            if field.name == name && visible(field.obj) {
                                count += 1;
                                found = Some(LookupResult {
                                    obj: field.obj,
                                    ty: field.ty,
                                    index,
                                    indirect: e.indirect,
                                    is_method: false,
                                    needs_pointer: false,
                                    holder: e.ty,
                                });
                                continue;
                            }
                            if field.embedded {
                                let (fty, ptr) = types.deref(field.ty);
                                next.push(Embedded {
                                    ty: fty,
                                    index,
                                    indirect: e.indirect || ptr,
                                });
                            }
                        }
                    }
                    Type::Interface(_) => {
                        if let Some((i, m)) = types
                            .interface_methods(typ)
                            .into_iter()
                            .enumerate()
                            .find(|(_, m)| m.name == name)
                        {
                            count += 1;
                            let mut index = e.index.clone();
                            index.push(i);
                            found = Some(LookupResult {
                                obj: m.obj,
                                ty: m.sig,
                                index,
                                indirect: e.indirect,
                                is_method: true,
                                needs_pointer: false,
                                holder: e.ty,
                            });
                        }
                    }
                    Type::TypeParam(tp) => {
                        if let Some((i, m)) = types
                            .interface_methods(tp.constraint)
                            .into_iter()
                            .enumerate()
                            .find(|(_, m)| m.name == name)
                        {
                            count += 1;
                            let mut index = e.index.clone();
                            index.push(i);
                            found = Some(LookupResult {
                                obj: m.obj,
                                ty: m.sig,
                                index,
                                indirect: e.indirect,
                                is_method: true,
                                needs_pointer: false,
                                holder: e.ty,
                            });
                        }
                    }
                    _ => {}
                }
            }

            match count {
                0 => {}
                1 => return found,
                _ => return None,
            }
            current = next;
        }
        None
    }

    /// Whether a method object's receiver is a pointer.
    pub fn has_pointer_receiver(&self, method: ObjId) -> bool {
        self.types
            .signature(self.obj(method).ty)
            .and_then(|sig| sig.recv.as_ref())
            .is_some_and(|recv| matches!(self.types.get(recv.ty), Type::Pointer(_)))
    }

    /// The substitution mapping a method's receiver type parameters to the
    /// type arguments of `holder`.
    pub fn receiver_map(&self, holder: TypeId) -> HashMap<TypeId, TypeId> {
        self.types.instance_map(holder)
    }

    /// The first method of interface `iface` that `v` lacks, if any.
    pub fn missing_method(&self, v: TypeId, iface: TypeId) -> Option<MissingMethod> {
        let types = &self.types;
        let wanted = types.interface_methods(iface);
        if types.is_interface(v) {
            let have = types.interface_methods(v);
            for m in &wanted {
                match have.iter().find(|h| h.name == m.name) {
                    None => {
                        return Some(MissingMethod {
                            name: m.name.clone(),
                            wrong_type: false,
                            pointer_receiver: false,
                        })
                    }
                    Some(h) if !types.identical(h.sig, m.sig) => {
                        return Some(MissingMethod {
                            name: m.name.clone(),
                            wrong_type: true,
                            pointer_receiver: false,
                        })
                    }
                    Some(_) => {}
                }
            }
            return None;
        }

        for m in &wanted {
            let pkg = self.obj(m.obj).pkg;
            let found = self.lookup_field_or_method(v, false, pkg, &m.name);
            let Some(found) = found.filter(|f| f.is_method) else {
                return Some(MissingMethod {
                    name: m.name.clone(),
                    wrong_type: false,
                    pointer_receiver: false,
                });
            };
            if found.needs_pointer {
                return Some(MissingMethod {
                    name: m.name.clone(),
                    wrong_type: false,
                    pointer_receiver: true,
                });
            }
            let map = self.receiver_map(found.holder);
            if !types.identical_with(found.ty, m.sig, &map) {
                return Some(MissingMethod {
                    name: m.name.clone(),
                    wrong_type: true,
                    pointer_receiver: false,
                });
            }
        }
        None
    }

    pub fn implements(&self, v: TypeId, iface: TypeId) -> bool {
        self.types.is_interface(iface) && self.missing_method(v, iface).is_none()
    }

    /// Methods callable on values of type `t` (pointer receivers included
    /// when `t` is a pointer), sorted by name.
    pub fn method_set(&self, t: TypeId) -> Vec<ObjId> {
        let types = &self.types;
        if types.is_interface(t) {
            return types.interface_methods(t).into_iter().map(|m| m.obj).collect();
        }
        let (base, is_ptr) = types.deref(t);
        let mut names: Vec<(Name, ObjId)> = Vec::new();
        let mut visit = vec![(base, is_ptr)];
        let mut seen = HashSet::new();
        while let Some((ty, ptr)) = visit.pop() {
            if !seen.insert(ty) {
                continue;
            }
            for &m in types.declared_methods(ty) {
                let obj = self.obj(m);
                if (ptr || !self.has_pointer_receiver(m)) && !names.iter().any(|(n, _)| *n == obj.name) {
                    names.push((obj.name.clone(), m));
                }
            }
            if let Type::Struct(st) = types.get(types.underlying(ty)) {
                for field in st.fields.iter().filter(|f| f.embedded) {
                    let (fty, fptr) = types.deref(field.ty);
                    visit.push((fty, ptr || fptr));
                }
            }
        }
        names.sort_by(|a, b| a.0.cmp(&b.0));
        names.into_iter().map(|(_, m)| m).collect()
    }

    /// Whether `t` is the `error` interface.
    pub fn is_error_type(&self, t: TypeId) -> bool {
        t == self.universe.error
    }
}
