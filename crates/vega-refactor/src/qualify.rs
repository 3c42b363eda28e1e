//! Spelling types in generated code.

use std::cell::RefCell;
use std::collections::BTreeMap;

use vega_syntax::ParsedFile;
use vega_types::{Package, PkgId, Program, Qualifier, Signature, Type, TypeId};

use crate::edit::Edit;
use crate::imports;

/// Spells types as written in one file of package `pkg`, using the file's
/// import names and recording packages the file does not import yet.
pub(crate) struct TypeSpeller<'a> {
    program: &'a Program,
    file: Option<&'a ParsedFile>,
    pkg: PkgId,
    /// Import path to the name the file refers to it by.
    names: BTreeMap<String, String>,
    missing: RefCell<BTreeMap<String, String>>,
}

impl<'a> TypeSpeller<'a> {
    pub(crate) fn new(program: &'a Program, file: &'a ParsedFile, pkg: PkgId) -> Self {
        let names = imports::file_imports(program, file)
            .into_iter()
            .filter(|i| i.local != "_" && i.local != ".")
            .map(|i| (i.path, i.local))
            .collect();
        TypeSpeller {
            program,
            file: Some(file),
            pkg,
            names,
            missing: RefCell::new(BTreeMap::new()),
        }
    }

    /// A speller for a file that does not exist yet.
    pub(crate) fn detached(program: &'a Program, pkg: PkgId) -> Self {
        TypeSpeller {
            program,
            file: None,
            pkg,
            names: BTreeMap::new(),
            missing: RefCell::new(BTreeMap::new()),
        }
    }

    fn qualifier(&self, p: &Package) -> Option<String> {
        if p.id == self.pkg {
            return None;
        }
        if let Some(name) = self.names.get(&p.path) {
            return Some(name.clone());
        }
        self.missing
            .borrow_mut()
            .insert(p.path.clone(), p.name.to_string());
        Some(p.name.to_string())
    }

    pub(crate) fn type_string(&self, t: TypeId) -> String {
        let qual = |p: &Package| self.qualifier(p);
        self.program.type_string(t, Qualifier::Custom(&qual))
    }

    /// `(p []byte) (int, error)`.
    pub(crate) fn signature(&self, sig: &Signature) -> String {
        let qual = |p: &Package| self.qualifier(p);
        self.program.signature_string(sig, Qualifier::Custom(&qual))
    }

    /// Whether every named type in the spelling of `t` can be referenced
    /// from the target package.
    pub(crate) fn is_accessible(&self, t: TypeId) -> bool {
        let types = self.program.types();
        let mut stack = vec![t];
        let mut seen = Vec::new();
        while let Some(t) = stack.pop() {
            if seen.contains(&t) {
                continue;
            }
            seen.push(t);
            match types.get(t) {
                Type::Named(named) => {
                    let obj = self.program.obj(named.obj);
                    if obj.pkg.is_some_and(|p| p != self.pkg) && !obj.is_exported() {
                        return false;
                    }
                    stack.extend(named.type_args.iter().copied());
                }
                Type::Pointer(e) | Type::Slice(e) | Type::Array { elem: e, .. } | Type::Chan { elem: e, .. } => {
                    stack.push(*e)
                }
                Type::Map { key, value } => stack.extend([*key, *value]),
                Type::Signature(sig) => stack.extend(sig.params.iter().chain(&sig.results).map(|p| p.ty)),
                Type::Struct(st) => stack.extend(st.fields.iter().map(|f| f.ty)),
                Type::Tuple(elems) => stack.extend(elems.iter().copied()),
                Type::Interface(iface) => {
                    stack.extend(iface.methods.iter().map(|m| m.sig));
                    stack.extend(iface.embeddeds.iter().copied());
                }
                Type::Basic(_) | Type::TypeParam(_) => {}
            }
        }
        true
    }

    /// Go's zero value for `t`.
    pub(crate) fn zero_value(&self, t: TypeId) -> String {
        let types = self.program.types();
        match types.get(types.underlying(t)) {
            Type::Basic(kind) => {
                if kind.is_boolean() {
                    "false".into()
                } else if kind.is_string() {
                    "\"\"".into()
                } else if kind.is_numeric() {
                    "0".into()
                } else {
                    "nil".into()
                }
            }
            Type::Struct(_) | Type::Array { .. } => format!("{}{{}}", self.type_string(t)),
            Type::TypeParam(_) => format!("*new({})", self.type_string(t)),
            _ => "nil".into(),
        }
    }

    /// Imports the spelled text needs, as `(path, name)`.
    pub(crate) fn missing_imports(&self) -> Vec<(String, String)> {
        self.missing
            .borrow()
            .iter()
            .map(|(p, n)| (p.clone(), n.clone()))
            .collect()
    }

    /// Edits adding the missing imports to the file.
    pub(crate) fn import_edits(&self) -> Vec<Edit> {
        let Some(file) = self.file else {
            return Vec::new();
        };
        let missing = self.missing_imports();
        let paths: Vec<&str> = missing.iter().map(|(p, _)| p.as_str()).collect();
        imports::add_imports_edits(file, &paths)
    }
}
