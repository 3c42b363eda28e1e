//! Go spelling of types.

use std::collections::HashSet;

use vega_syntax::ChanDir;

use crate::objects::PkgId;
use crate::program::{Package, Program};
use crate::types::{Param, Signature, Type, TypeId};

/// How package-qualified names are spelled.
#[derive(Clone, Copy)]
pub enum Qualifier<'a> {
    /// Full import path (`"net/http".Request`), as in tracing output.
    Path,
    /// Package names, omitting the given package.
    Relative(PkgId),
    /// Caller-chosen spelling; `None` omits the qualifier.
    Custom(&'a dyn Fn(&Package) -> Option<String>),
}

impl Program {
    pub fn type_string(&self, t: TypeId, qual: Qualifier<'_>) -> String {
        let mut out = String::new();
        self.write_type(&mut out, t, qual);
        out
    }

    /// The type as written inside package `pkg`.
    pub fn type_string_in(&self, t: TypeId, pkg: PkgId) -> String {
        self.type_string(t, Qualifier::Relative(pkg))
    }

    /// A signature without the leading `func`, with parameter names when the
    /// signature has them: `(p []byte) (int, error)`.
    pub fn signature_string(&self, sig: &Signature, qual: Qualifier<'_>) -> String {
        let mut out = String::new();
        self.write_signature(&mut out, sig, qual);
        out
    }

    /// Packages whose names appear in the spelling of `t`, in first-use order.
    pub fn referenced_packages(&self, t: TypeId) -> Vec<PkgId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_packages(t, &mut out, &mut seen);
        out
    }

    fn collect_packages(&self, t: TypeId, out: &mut Vec<PkgId>, seen: &mut HashSet<TypeId>) {
        if !seen.insert(t) {
            return;
        }
        let types = &self.types;
        match types.get(t) {
            Type::Basic(_) | Type::TypeParam(_) => {}
            Type::Pointer(e) | Type::Slice(e) | Type::Array { elem: e, .. } | Type::Chan { elem: e, .. } => {
                self.collect_packages(*e, out, seen)
            }
            Type::Map { key, value } => {
                self.collect_packages(*key, out, seen);
                self.collect_packages(*value, out, seen);
            }
            Type::Signature(sig) => {
                for p in sig.params.iter().chain(&sig.results) {
                    self.collect_packages(p.ty, out, seen);
                }
            }
            Type::Struct(st) => {
                for f in &st.fields {
                    self.collect_packages(f.ty, out, seen);
                }
            }
            Type::Interface(iface) => {
                for m in &iface.methods {
                    self.collect_packages(m.sig, out, seen);
                }
                for e in &iface.embeddeds {
                    self.collect_packages(*e, out, seen);
                }
            }
            Type::Tuple(elems) => {
                for e in elems {
                    self.collect_packages(*e, out, seen);
                }
            }
            Type::Named(named) => {
                if let Some(pkg) = self.obj(named.obj).pkg {
                    if !out.contains(&pkg) {
                        out.push(pkg);
                    }
                }
                for a in &named.type_args {
                    self.collect_packages(*a, out, seen);
                }
            }
        }
    }

    fn qualify(&self, pkg: Option<PkgId>, qual: Qualifier<'_>) -> Option<String> {
        let pkg = pkg?;
        let data = self.package(pkg);
        match qual {
            Qualifier::Path => Some(data.path.clone()),
            Qualifier::Relative(current) => (current != pkg).then(|| data.name.to_string()),
            Qualifier::Custom(f) => f(data),
        }
    }

    fn write_type(&self, out: &mut String, t: TypeId, qual: Qualifier<'_>) {
        let types = &self.types;
        match types.get(t) {
            Type::Basic(kind) => out.push_str(kind.name()),
            Type::Pointer(elem) => {
                out.push('*');
                self.write_type(out, *elem, qual);
            }
            Type::Slice(elem) => {
                out.push_str("[]");
                self.write_type(out, *elem, qual);
            }
            Type::Array { len, elem } => {
                match len {
                    Some(n) => out.push_str(&format!("[{n}]")),
                    None => out.push_str("[...]"),
                }
                self.write_type(out, *elem, qual);
            }
            Type::Map { key, value } => {
                out.push_str("map[");
                self.write_type(out, *key, qual);
                out.push(']');
                self.write_type(out, *value, qual);
            }
            Type::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                // chan (<-chan int) needs parentheses.
                let paren = *dir == ChanDir::Both
                    && matches!(types.get(*elem), Type::Chan { dir: ChanDir::Recv, .. });
                if paren {
                    out.push('(');
                }
                self.write_type(out, *elem, qual);
                if paren {
                    out.push(')');
                }
            }
            Type::Signature(sig) => {
                out.push_str("func");
                self.write_signature(out, sig, qual);
            }
            Type::Struct(st) => {
                out.push_str("struct{");
                for (i, f) in st.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !f.embedded {
                        out.push_str(&f.name);
                        out.push(' ');
                    }
                    self.write_type(out, f.ty, qual);
                    if let Some(tag) = &f.tag {
                        out.push(' ');
                        out.push_str(&vega_syntax::literals::quote(tag));
                    }
                }
                out.push('}');
            }
            Type::Interface(iface) => {
                if t == self.universe.any {
                    out.push_str("any");
                    return;
                }
                out.push_str("interface{");
                let mut first = true;
                for e in &iface.embeddeds {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    self.write_type(out, *e, qual);
                }
                if !iface.terms.is_empty() {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    for (i, term) in iface.terms.iter().enumerate() {
                        if i > 0 {
                            out.push_str(" | ");
                        }
                        if term.tilde {
                            out.push('~');
                        }
                        self.write_type(out, term.ty, qual);
                    }
                }
                for m in &iface.methods {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    out.push_str(&m.name);
                    if let Some(sig) = types.signature(m.sig) {
                        self.write_signature(out, sig, qual);
                    }
                }
                out.push('}');
            }
            Type::Tuple(elems) => {
                out.push('(');
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, *e, qual);
                }
                out.push(')');
            }
            Type::Named(named) => {
                let obj = self.obj(named.obj);
                if let Some(prefix) = self.qualify(obj.pkg, qual) {
                    out.push_str(&prefix);
                    out.push('.');
                }
                out.push_str(&obj.name);
                if !named.type_args.is_empty() {
                    out.push('[');
                    for (i, a) in named.type_args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write_type(out, *a, qual);
                    }
                    out.push(']');
                }
            }
            Type::TypeParam(tp) => out.push_str(&self.obj(tp.obj).name),
        }
    }

    fn write_params(
        &self,
        out: &mut String,
        params: &[Param],
        variadic: bool,
        qual: Qualifier<'_>,
    ) {
        let named = params.iter().any(|p| !p.name.is_empty());
        out.push('(');
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if named {
                out.push_str(if p.name.is_empty() { "_" } else { &p.name });
                out.push(' ');
            }
            if variadic && i + 1 == params.len() {
                out.push_str("...");
                let elem = match self.types.get(p.ty) {
                    Type::Slice(elem) => *elem,
                    _ => p.ty,
                };
                self.write_type(out, elem, qual);
            } else {
                self.write_type(out, p.ty, qual);
            }
        }
        out.push(')');
    }

    fn write_signature(&self, out: &mut String, sig: &Signature, qual: Qualifier<'_>) {
        self.write_params(out, &sig.params, sig.variadic, qual);
        match sig.results.as_slice() {
            [] => {}
            [single] if single.name.is_empty() => {
                out.push(' ');
                self.write_type(out, single.ty, qual);
            }
            results => {
                out.push(' ');
                self.write_params(out, results, false, qual);
            }
        }
    }
}
