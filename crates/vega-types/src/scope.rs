use std::collections::BTreeMap;

use vega_core::Name;
use vega_syntax::Pos;

use crate::info::NodeKey;
use crate::objects::ObjId;

/// Identifier for a lexical scope. This is an index into the program's scope
/// arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    /// Function signature and body (parameters, results, receiver).
    Func,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub(crate) kind: ScopeKind,
    pub(crate) parent: Option<ScopeId>,
    pub(crate) children: Vec<ScopeId>,
    pub(crate) names: BTreeMap<Name, ObjId>,
    pub(crate) start: Pos,
    pub(crate) end: Pos,
    pub(crate) node: Option<NodeKey>,
}

impl Scope {
    pub(crate) fn new(kind: ScopeKind, parent: Option<ScopeId>, start: Pos, end: Pos) -> Self {
        Scope {
            kind,
            parent,
            children: Vec::new(),
            names: BTreeMap::new(),
            start,
            end,
            node: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    #[must_use]
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ObjId> {
        self.names.get(name).copied()
    }

    /// Names declared directly in this scope, sorted.
    pub fn names(&self) -> impl Iterator<Item = (&Name, ObjId)> {
        self.names.iter().map(|(n, o)| (n, *o))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Source extent of the scope; universe and package scopes have none.
    #[must_use]
    pub fn extent(&self) -> (Pos, Pos) {
        (self.start, self.end)
    }

    /// The syntax node that opened this scope.
    #[must_use]
    pub fn node(&self) -> Option<NodeKey> {
        self.node
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.start.is_valid() && self.start <= pos && pos <= self.end
    }
}
