//! The package checker.
//!
//! Checking runs in three passes over a package:
//!
//! 1. [`resolver`] collects package-level objects and file scopes,
//! 2. every package-level object is resolved (lazily, so declarations may
//!    refer to each other in any order),
//! 3. function bodies are checked and unused imports reported.
//!
//! Only errors the checker is confident about are reported; constructs it
//! does not model precisely produce an invalid operand silently so that one
//! mistake does not cascade.

mod assign;
mod call;
mod expr;
mod resolver;
mod stmt;
mod typexpr;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use vega_core::Name;
use vega_syntax::{NodeId, ParsedFile, Pos, SyntaxTree};

use crate::constant::ConstValue;
use crate::info::{Mode, NodeKey, TypeAndValue};
use crate::objects::{ObjId, ObjKind, Object, PkgId};
use crate::program::{Program, TypeError};
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::types::{Type, TypeId, TypeTable};

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Operand {
    pub(crate) mode: Mode,
    pub(crate) ty: TypeId,
}

impl Operand {
    pub(crate) fn invalid() -> Operand {
        Operand {
            mode: Mode::Value,
            ty: TypeTable::INVALID,
        }
    }

    pub(crate) fn value(ty: TypeId) -> Operand {
        Operand { mode: Mode::Value, ty }
    }

    pub(crate) fn is_invalid(&self) -> bool {
        self.ty == TypeTable::INVALID && !matches!(self.mode, Mode::NoValue | Mode::Builtin)
    }

    pub(crate) fn constant(&self) -> Option<&ConstValue> {
        match &self.mode {
            Mode::Constant(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum DeclKind {
    Const {
        ty: Option<NodeId>,
        init: Option<NodeId>,
        iota: i128,
    },
    /// `lhs` holds every object declared by the spec; a multi-value
    /// initializer resolves them together.
    Var {
        ty: Option<NodeId>,
        init: Option<NodeId>,
        lhs: Vec<ObjId>,
        multi: bool,
    },
    Type {
        spec: NodeId,
    },
    Func {
        decl: NodeId,
    },
}

#[derive(Debug, Clone)]
struct DeclInfo {
    file: usize,
    kind: DeclKind,
}

/// Per-function state.
#[derive(Debug, Clone, Default)]
struct FuncContext {
    sig: Option<TypeId>,
    iota: Option<ConstValue>,
    /// Local variables declared in the current function body.
    locals: Vec<ObjId>,
}

pub(crate) struct Checker<'p> {
    prog: &'p mut Program,
    pkg: PkgId,
    files: Vec<Arc<ParsedFile>>,
    file: usize,
    file_scopes: Vec<ScopeId>,
    decls: HashMap<ObjId, DeclInfo>,
    /// Package-level objects in declaration order.
    order: Vec<ObjId>,
    /// Method declarations, attached to their receiver types after
    /// collection.
    methods: Vec<(usize, NodeId)>,
    resolved: HashSet<ObjId>,
    resolving: Vec<ObjId>,
    used_imports: HashSet<ObjId>,
    used_vars: HashSet<ObjId>,
    /// Type-switch symbolic variables, which are never reported as unused.
    symbolic: HashSet<ObjId>,
    scope: ScopeId,
    ctx: FuncContext,
    errors: Vec<TypeError>,
}

impl<'p> Checker<'p> {
    pub(crate) fn new(prog: &'p mut Program, pkg: PkgId) -> Self {
        let files: Vec<Arc<ParsedFile>> = prog.packages[pkg.idx()]
            .files
            .iter()
            .map(|idx| prog.files[*idx].clone())
            .collect();
        let scope = prog.packages[pkg.idx()].scope;
        Checker {
            prog,
            pkg,
            files,
            file: 0,
            file_scopes: Vec::new(),
            decls: HashMap::new(),
            order: Vec::new(),
            methods: Vec::new(),
            resolved: HashSet::new(),
            resolving: Vec::new(),
            used_imports: HashSet::new(),
            used_vars: HashSet::new(),
            symbolic: HashSet::new(),
            scope,
            ctx: FuncContext::default(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn check(mut self) {
        self.collect_objects();
        self.associate_methods();
        for obj in self.order.clone() {
            self.obj_decl(obj);
        }
        self.prog.types.complete_pending();
        self.check_bodies();
        self.unused_imports();

        let mut errors = std::mem::take(&mut self.errors);
        errors.sort_by_key(|e| e.pos);
        errors.dedup();
        if !errors.is_empty() {
            tracing::debug!(
                target: "vega.types",
                package = %self.prog.packages[self.pkg.idx()].path,
                errors = errors.len(),
                "type errors"
            );
        }
        self.prog.packages[self.pkg.idx()].errors = errors;
    }

    fn pf(&self) -> Arc<ParsedFile> {
        self.files[self.file].clone()
    }

    fn tree(&self) -> &SyntaxTree {
        &self.files[self.file].tree
    }

    fn key(&self, node: NodeId) -> NodeKey {
        NodeKey {
            file: self.files[self.file].base,
            node,
        }
    }

    fn pos(&self, node: NodeId) -> Pos {
        self.files[self.file].node_pos(node).0
    }

    fn end(&self, node: NodeId) -> Pos {
        self.files[self.file].node_pos(node).1
    }

    fn text(&self, node: NodeId) -> String {
        self.files[self.file].text_of(node).to_string()
    }

    fn error(&mut self, node: NodeId, message: impl Into<String>) {
        let (pos, end) = self.files[self.file].node_pos(node);
        self.error_at(pos, end, message);
    }

    fn error_at(&mut self, pos: Pos, end: Pos, message: impl Into<String>) {
        let message = message.into();
        tracing::trace!(target: "vega.types", %message, "type error");
        self.errors.push(TypeError { pos, end, message });
    }

    fn types(&self) -> &TypeTable {
        &self.prog.types
    }

    fn type_str(&self, t: TypeId) -> String {
        self.prog.type_string_in(t, self.pkg)
    }

    fn record(&mut self, node: NodeId, mode: Mode, ty: TypeId) {
        let key = self.key(node);
        self.prog.info.types.insert(key, TypeAndValue { mode, ty });
    }

    fn record_operand(&mut self, node: NodeId, x: &Operand) {
        if !x.is_invalid() {
            self.record(node, x.mode.clone(), x.ty);
        }
    }

    fn record_def(&mut self, ident: NodeId, obj: ObjId) {
        let key = self.key(ident);
        self.prog.info.defs.insert(key, obj);
    }

    fn record_use(&mut self, ident: NodeId, obj: ObjId) {
        let key = self.key(ident);
        self.prog.info.uses.insert(key, obj);
    }

    fn record_implicit(&mut self, node: NodeId, obj: ObjId) {
        let key = self.key(node);
        self.prog.info.implicits.insert(key, obj);
    }

    fn ident_name(&self, ident: NodeId) -> Name {
        self.tree().ident_name(ident).cloned().unwrap_or_default()
    }

    /// Create an object of the current package, declared at `ident`.
    fn new_object(&mut self, name: Name, kind: ObjKind, ty: TypeId, ident: Option<NodeId>, decl: Option<NodeId>) -> ObjId {
        let pos = ident.map_or(Pos::NONE, |n| self.pos(n));
        let decl = decl.or(ident).map(|n| self.key(n));
        self.prog.new_object(Object {
            name,
            kind,
            ty,
            pkg: Some(self.pkg),
            pos,
            scope_pos: Pos::NONE,
            parent: None,
            decl,
        })
    }

    /// Open a scope nested in the current one, covering `node`.
    fn open_scope(&mut self, node: NodeId, kind: ScopeKind) -> ScopeId {
        let (start, end) = self.files[self.file].node_pos(node);
        self.open_scope_at(node, start, end, kind)
    }

    /// Open a scope keyed by `node` with an explicit extent.
    fn open_scope_at(&mut self, node: NodeId, start: Pos, end: Pos, kind: ScopeKind) -> ScopeId {
        let mut scope = Scope::new(kind, Some(self.scope), start, end);
        scope.node = Some(self.key(node));
        let id = self.prog.new_scope(scope);
        let key = self.key(node);
        self.prog.info.scopes.insert(key, id);
        self.scope = id;
        id
    }

    fn close_scope(&mut self) {
        if let Some(parent) = self.prog.scopes[self.scope.idx()].parent {
            self.scope = parent;
        }
    }

    /// Insert `obj` into `scope`, reporting a redeclaration. Blank names are
    /// never inserted.
    fn declare(&mut self, scope: ScopeId, ident: Option<NodeId>, obj: ObjId, scope_pos: Pos) {
        if let Some(ident) = ident {
            self.record_def(ident, obj);
        }
        let name = self.prog.objects[obj.idx()].name.clone();
        if name == "_" || name.is_empty() {
            return;
        }
        if self.prog.scopes[scope.idx()].names.contains_key(&name) {
            if let Some(ident) = ident {
                self.error(ident, format!("{name} redeclared in this block"));
            }
            return;
        }
        let o = &mut self.prog.objects[obj.idx()];
        o.parent = Some(scope);
        o.scope_pos = scope_pos;
        self.prog.scopes[scope.idx()].names.insert(name, obj);
    }

    fn lookup(&self, name: &str, pos: Pos) -> Option<ObjId> {
        self.prog.lookup_parent(self.scope, name, pos).map(|(_, obj)| obj)
    }

    /// Resolve a package-level object of this package on first use.
    fn ensure_resolved(&mut self, obj: ObjId) {
        if self.decls.contains_key(&obj) && !self.resolved.contains(&obj) {
            self.obj_decl(obj);
        }
    }

    fn mark_used(&mut self, obj: ObjId) {
        match &self.prog.objects[obj.idx()].kind {
            ObjKind::PkgName { .. } => {
                self.used_imports.insert(obj);
            }
            ObjKind::Var(_) => {
                self.used_vars.insert(obj);
            }
            _ => {}
        }
    }

    fn obj_ty(&self, obj: ObjId) -> TypeId {
        self.prog.objects[obj.idx()].ty
    }

    fn set_obj_ty(&mut self, obj: ObjId, ty: TypeId) {
        self.prog.objects[obj.idx()].ty = ty;
    }

    fn underlying(&self, t: TypeId) -> TypeId {
        self.prog.types.underlying(t)
    }

    fn core(&self, t: TypeId) -> TypeId {
        self.prog.types.core_type(t)
    }

    fn is_invalid_type(&self, t: TypeId) -> bool {
        self.prog.types.is_invalid(t)
    }

    fn alloc(&mut self, ty: Type) -> TypeId {
        self.prog.types.alloc(ty)
    }
}
