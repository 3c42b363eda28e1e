use std::fmt;

use vega_core::Name;
use vega_syntax::Pos;

use crate::constant::ConstValue;
use crate::info::NodeKey;
use crate::scope::ScopeId;
use crate::types::TypeId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(u32);

impl ObjId {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjId({})", self.0)
    }
}

/// Index of a checked package within a [`crate::Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PkgId(u32);

impl PkgId {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    PackageLevel,
    Local,
    Param,
    Result,
    Receiver,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub const ALL: [Builtin; 18] = [
        Builtin::Append,
        Builtin::Cap,
        Builtin::Clear,
        Builtin::Close,
        Builtin::Complex,
        Builtin::Copy,
        Builtin::Delete,
        Builtin::Imag,
        Builtin::Len,
        Builtin::Make,
        Builtin::Max,
        Builtin::Min,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
        Builtin::Real,
        Builtin::Recover,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Clear => "clear",
            Builtin::Close => "close",
            Builtin::Complex => "complex",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Imag => "imag",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Real => "real",
            Builtin::Recover => "recover",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjKind {
    Var(VarKind),
    Const(ConstValue),
    TypeName { alias: bool },
    Func,
    PkgName {
        path: String,
        imported: Option<PkgId>,
    },
    Builtin(Builtin),
    Nil,
    Label,
}

/// A named language entity: variable, constant, type name, function,
/// imported package name, builtin or label.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: Name,
    pub kind: ObjKind,
    pub ty: TypeId,
    pub pkg: Option<PkgId>,
    pub pos: Pos,
    /// Position from which a local object is visible in its scope.
    pub scope_pos: Pos,
    pub parent: Option<ScopeId>,
    /// The declaring syntax: the `FuncDecl`, `TypeSpec` or `ValueSpec`, the
    /// field or parameter `Field`, or the defining identifier.
    pub decl: Option<NodeKey>,
}

impl Object {
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind, ObjKind::Var(_))
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, ObjKind::Var(VarKind::Field))
    }

    pub fn is_func(&self) -> bool {
        matches!(self.kind, ObjKind::Func)
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, ObjKind::Const(_))
    }

    pub fn is_type_name(&self) -> bool {
        matches!(self.kind, ObjKind::TypeName { .. })
    }

    pub fn is_pkg_name(&self) -> bool {
        matches!(self.kind, ObjKind::PkgName { .. })
    }

    pub fn const_value(&self) -> Option<&ConstValue> {
        match &self.kind {
            ObjKind::Const(value) => Some(value),
            _ => None,
        }
    }

    /// Package-level variables, constants, types and functions.
    pub fn is_package_level(&self, package_scope: ScopeId) -> bool {
        self.parent == Some(package_scope)
    }
}
