//! A checked workspace: every package of a snapshot, sharing one type graph.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use vega_core::{FileId, Name};
use vega_syntax::{FileSet, ParseError, ParsedFile, Pos};

use crate::check::Checker;
use crate::info::{NodeKey, TypeInfo};
use crate::objects::{ObjId, Object, PkgId};
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::types::{TypeId, TypeTable};
use crate::universe::{self, Universe};

/// Input for one package: its parsed files plus metadata.
#[derive(Debug, Clone)]
pub struct PackageSource {
    pub path: String,
    pub dir: String,
    pub files: Vec<Arc<ParsedFile>>,
    pub module: Option<String>,
    pub std: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TypeError {
    pub pos: Pos,
    pub end: Pos,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Package {
    pub id: PkgId,
    pub path: String,
    pub name: Name,
    pub dir: String,
    pub module: Option<String>,
    pub std: bool,
    pub(crate) files: Vec<usize>,
    pub scope: ScopeId,
    /// Import path to package, for every resolved import of the package.
    pub imports: BTreeMap<String, PkgId>,
    pub errors: Vec<TypeError>,
    pub parse_errors: Vec<(FileId, ParseError)>,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) fset: FileSet,
    pub(crate) files: Vec<Arc<ParsedFile>>,
    pub(crate) file_by_base: HashMap<u32, usize>,
    pub(crate) packages: Vec<Package>,
    pub(crate) by_path: HashMap<String, PkgId>,
    pub(crate) types: TypeTable,
    pub(crate) objects: Vec<Object>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) info: TypeInfo,
    pub(crate) universe: Universe,
}

impl Program {
    /// Type-check `sources` in dependency order.
    pub fn check(fset: FileSet, sources: Vec<PackageSource>) -> Program {
        let mut types = TypeTable::new();
        let mut objects = Vec::new();
        let mut scopes = Vec::new();
        let universe = universe::build(&mut types, &mut objects, &mut scopes);
        let mut program = Program {
            fset,
            files: Vec::new(),
            file_by_base: HashMap::new(),
            packages: Vec::new(),
            by_path: HashMap::new(),
            types,
            objects,
            scopes,
            info: TypeInfo::default(),
            universe,
        };

        for source in sources {
            program.add_package(source);
        }
        let order = program.dependency_order();
        for pkg in order {
            let _span = tracing::debug_span!(
                target: "vega.types",
                "check_package",
                path = %program.packages[pkg.idx()].path
            )
            .entered();
            Checker::new(&mut program, pkg).check();
        }
        program
    }

    fn add_package(&mut self, source: PackageSource) -> PkgId {
        let id = PkgId::from_raw(self.packages.len() as u32);
        let scope = self.new_scope(Scope::new(
            ScopeKind::Package,
            Some(self.universe.scope),
            Pos::NONE,
            Pos::NONE,
        ));
        let name = source
            .files
            .iter()
            .find_map(|f| f.tree.package_name().cloned())
            .unwrap_or_default();
        let mut file_indices = Vec::new();
        let mut parse_errors = Vec::new();
        for file in source.files {
            parse_errors.extend(file.errors.iter().map(|e| (file.file.clone(), e.clone())));
            let idx = self.files.len();
            self.file_by_base.insert(file.base, idx);
            self.files.push(file);
            file_indices.push(idx);
        }
        self.by_path.insert(source.path.clone(), id);
        self.packages.push(Package {
            id,
            path: source.path,
            name,
            dir: source.dir,
            module: source.module,
            std: source.std,
            files: file_indices,
            scope,
            imports: BTreeMap::new(),
            errors: Vec::new(),
            parse_errors,
        });
        id
    }

    pub(crate) fn new_scope(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId::from_raw(self.scopes.len() as u32);
        if let Some(parent) = scope.parent {
            if scope.kind != ScopeKind::Package {
                self.scopes[parent.idx()].children.push(id);
            }
        }
        self.scopes.push(scope);
        id
    }

    pub(crate) fn new_object(&mut self, obj: Object) -> ObjId {
        let id = ObjId::from_raw(self.objects.len() as u32);
        self.objects.push(obj);
        id
    }

    /// Import paths mentioned by a package's files.
    pub(crate) fn import_paths(&self, pkg: PkgId) -> Vec<String> {
        let mut out = Vec::new();
        for &idx in &self.packages[pkg.idx()].files {
            let tree = &self.files[idx].tree;
            for &spec in tree.imports() {
                if let Some(path) = tree.import_path(spec) {
                    if !out.contains(&path) {
                        out.push(path);
                    }
                }
            }
        }
        out
    }

    /// Post-order over imports so that dependencies are checked first. An
    /// import cycle is broken at the edge that closes it.
    fn dependency_order(&self) -> Vec<PkgId> {
        fn visit(
            program: &Program,
            pkg: PkgId,
            state: &mut HashMap<PkgId, bool>,
            out: &mut Vec<PkgId>,
        ) {
            if state.contains_key(&pkg) {
                return;
            }
            state.insert(pkg, false);
            for path in program.import_paths(pkg) {
                if let Some(dep) = program.by_path.get(&path) {
                    visit(program, *dep, state, out);
                }
            }
            state.insert(pkg, true);
            out.push(pkg);
        }

        let mut state = HashMap::new();
        let mut out = Vec::new();
        for pkg in &self.packages {
            visit(self, pkg.id, &mut state, &mut out);
        }
        out
    }

    pub fn fset(&self) -> &FileSet {
        &self.fset
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn info(&self) -> &TypeInfo {
        &self.info
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn obj(&self, id: ObjId) -> &Object {
        &self.objects[id.idx()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.idx()]
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn package(&self, id: PkgId) -> &Package {
        &self.packages[id.idx()]
    }

    pub fn package_by_path(&self, path: &str) -> Option<PkgId> {
        self.by_path.get(path).copied()
    }

    pub fn view(&self, pkg: PkgId) -> PackageView<'_> {
        PackageView { program: self, pkg }
    }

    pub fn files(&self) -> impl Iterator<Item = &Arc<ParsedFile>> {
        self.files.iter()
    }

    /// The file with the given `FileSet` base.
    pub fn file_by_base(&self, base: u32) -> Option<&Arc<ParsedFile>> {
        self.file_by_base.get(&base).map(|idx| &self.files[*idx])
    }

    pub fn file(&self, id: &FileId) -> Option<&Arc<ParsedFile>> {
        self.files.iter().find(|f| &f.file == id)
    }

    /// The file containing `pos`.
    pub fn file_of_pos(&self, pos: Pos) -> Option<&Arc<ParsedFile>> {
        let (file, _) = self.fset.resolve(pos)?;
        self.file(file)
    }

    pub fn package_of_file(&self, id: &FileId) -> Option<PkgId> {
        self.packages
            .iter()
            .find(|p| p.files.iter().any(|idx| &self.files[*idx].file == id))
            .map(|p| p.id)
    }

    /// The file declaring `obj`.
    pub fn decl_file(&self, obj: ObjId) -> Option<&Arc<ParsedFile>> {
        let key = self.obj(obj).decl?;
        self.file_by_base(key.file)
    }

    pub fn type_of(&self, file: &ParsedFile, node: vega_syntax::NodeId) -> Option<TypeId> {
        self.info.type_of(NodeKey::new(file, node))
    }

    pub fn object_of(&self, file: &ParsedFile, node: vega_syntax::NodeId) -> Option<ObjId> {
        self.info.object_of(NodeKey::new(file, node))
    }

    /// The file scope of a file.
    pub fn file_scope(&self, file: &ParsedFile) -> Option<ScopeId> {
        self.info
            .scopes
            .get(&NodeKey::new(file, file.tree.root()))
            .copied()
    }

    /// The innermost scope of `file` containing `pos`.
    pub fn scope_at(&self, file: &ParsedFile, pos: Pos) -> Option<ScopeId> {
        let mut scope = self.file_scope(file)?;
        'descend: loop {
            for &child in &self.scopes[scope.idx()].children {
                if self.scopes[child.idx()].contains(pos) {
                    scope = child;
                    continue 'descend;
                }
            }
            return Some(scope);
        }
    }

    /// Resolve `name` as seen at `pos` from `scope` outwards. Local objects
    /// declared after `pos` are not visible.
    pub fn lookup_parent(&self, scope: ScopeId, name: &str, pos: Pos) -> Option<(ScopeId, ObjId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.idx()];
            if let Some(obj) = s.lookup(name) {
                let local = matches!(s.kind, ScopeKind::Func | ScopeKind::Block);
                if !local || !pos.is_valid() || self.objects[obj.idx()].scope_pos <= pos {
                    return Some((id, obj));
                }
            }
            current = s.parent;
        }
        None
    }

    /// Whether `name` is free (unused) in `scope` and all scopes nested in it.
    pub fn is_free_in_subtree(&self, scope: ScopeId, name: &str) -> bool {
        let s = &self.scopes[scope.idx()];
        s.lookup(name).is_none()
            && s
                .children
                .iter()
                .all(|child| self.is_free_in_subtree(*child, name))
    }

    /// Package-level function or method declared by `decl` in `file`.
    pub fn func_of_decl(&self, file: &ParsedFile, decl: vega_syntax::NodeId) -> Option<ObjId> {
        let vega_syntax::NodeKind::FuncDecl { name, .. } = file.tree.kind(decl) else {
            return None;
        };
        self.info.defs.get(&NodeKey::new(file, *name)).copied()
    }

    /// Every package that (transitively) imports `pkg`, plus `pkg` itself.
    pub fn reverse_dependencies(&self, pkg: PkgId) -> Vec<PkgId> {
        let mut out = vec![pkg];
        let mut seen: HashSet<PkgId> = HashSet::from([pkg]);
        let mut i = 0;
        while i < out.len() {
            let target = out[i];
            for p in &self.packages {
                if p.imports.values().any(|d| *d == target) && seen.insert(p.id) {
                    out.push(p.id);
                }
            }
            i += 1;
        }
        out
    }
}

/// An immutable view of one checked package.
#[derive(Debug, Clone, Copy)]
pub struct PackageView<'a> {
    program: &'a Program,
    pkg: PkgId,
}

impl<'a> PackageView<'a> {
    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn id(&self) -> PkgId {
        self.pkg
    }

    fn data(&self) -> &'a Package {
        &self.program.packages[self.pkg.idx()]
    }

    pub fn path(&self) -> &'a str {
        &self.data().path
    }

    pub fn name(&self) -> &'a Name {
        &self.data().name
    }

    pub fn dir(&self) -> &'a str {
        &self.data().dir
    }

    pub fn module(&self) -> Option<&'a str> {
        self.data().module.as_deref()
    }

    pub fn scope(&self) -> ScopeId {
        self.data().scope
    }

    pub fn imports(&self) -> &'a BTreeMap<String, PkgId> {
        &self.data().imports
    }

    pub fn files(&self) -> impl Iterator<Item = &'a Arc<ParsedFile>> + 'a {
        let program = self.program;
        self.data().files.iter().map(move |idx| &program.files[*idx])
    }

    pub fn file(&self, id: &FileId) -> Option<&'a Arc<ParsedFile>> {
        self.files().find(|f| &f.file == id)
    }

    pub fn info(&self) -> &'a TypeInfo {
        &self.program.info
    }

    pub fn type_errors(&self) -> &'a [TypeError] {
        &self.data().errors
    }

    pub fn parse_errors(&self) -> &'a [(FileId, ParseError)] {
        &self.data().parse_errors
    }

    pub fn has_errors(&self) -> bool {
        !self.data().errors.is_empty() || !self.data().parse_errors.is_empty()
    }

    /// A package-level object by name.
    pub fn lookup(&self, name: &str) -> Option<ObjId> {
        self.program.scopes[self.scope().idx()].lookup(name)
    }
}
