use std::collections::HashMap;

use vega_syntax::{NodeId, ParsedFile};

use crate::constant::ConstValue;
use crate::objects::ObjId;
use crate::scope::ScopeId;
use crate::types::TypeId;

/// A syntax node of a particular file: the file's base in the program's
/// `FileSet` plus the node index. Unique across a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub file: u32,
    pub node: NodeId,
}

impl NodeKey {
    pub fn new(file: &ParsedFile, node: NodeId) -> Self {
        NodeKey {
            file: file.base,
            node,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// A call without results.
    NoValue,
    Builtin,
    TypeExpr,
    Constant(ConstValue),
    /// Addressable value.
    Variable,
    /// `m[k]`: assignable but not addressable, may be used with comma-ok.
    MapIndex,
    Value,
    /// Value that may be used in a comma-ok assignment (type assertion, receive).
    CommaOk,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAndValue {
    pub mode: Mode,
    pub ty: TypeId,
}

impl TypeAndValue {
    pub fn is_type(&self) -> bool {
        self.mode == Mode::TypeExpr
    }

    pub fn is_value(&self) -> bool {
        matches!(
            self.mode,
            Mode::Constant(_) | Mode::Variable | Mode::MapIndex | Mode::Value | Mode::CommaOk
        )
    }

    pub fn is_void(&self) -> bool {
        self.mode == Mode::NoValue
    }

    pub fn addressable(&self) -> bool {
        self.mode == Mode::Variable
    }

    pub fn value(&self) -> Option<&ConstValue> {
        match &self.mode {
            Mode::Constant(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    FieldVal,
    MethodVal,
    MethodExpr,
}

/// A resolved `x.f` selector that is not a qualified identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    pub recv: TypeId,
    pub obj: ObjId,
    /// Type of the selected field or method value.
    pub ty: TypeId,
    /// Path through embedded fields; the last entry selects `obj`.
    pub index: Vec<usize>,
    /// A pointer indirection was needed to reach the selected field or method.
    pub indirect: bool,
}

/// Facts recorded while checking: expression types, identifier resolution,
/// selectors and scopes. Keys are nodes of the program's files.
#[derive(Debug, Clone, Default)]
pub struct TypeInfo {
    pub types: HashMap<NodeKey, TypeAndValue>,
    /// Defining identifiers (package name and blank identifiers have none).
    pub defs: HashMap<NodeKey, ObjId>,
    pub uses: HashMap<NodeKey, ObjId>,
    /// Objects implicitly declared by import specs without a name, type
    /// switch clauses and anonymous fields.
    pub implicits: HashMap<NodeKey, ObjId>,
    pub selections: HashMap<NodeKey, Selection>,
    /// Scopes opened by files, function types, blocks, `if`/`for`/`switch`
    /// statements and case clauses.
    pub scopes: HashMap<NodeKey, ScopeId>,
}

impl TypeInfo {
    pub fn type_of(&self, key: NodeKey) -> Option<TypeId> {
        self.types.get(&key).map(|tv| tv.ty)
    }

    /// The object an identifier defines or uses.
    pub fn object_of(&self, key: NodeKey) -> Option<ObjId> {
        self.defs.get(&key).or_else(|| self.uses.get(&key)).copied()
    }
}
