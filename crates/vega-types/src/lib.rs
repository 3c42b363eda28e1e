//! Go type checking for Vega.
//!
//! [`Program::check`] type-checks a set of packages (usually the workspace
//! plus the bundled [`stdlib`] declarations) into one shared type graph.
//! Refactorings query it through [`Program`] and [`PackageView`]: the
//! [`TypeInfo`] maps record, for every syntax node, its type, the object an
//! identifier defines or uses, selections and scopes.

mod check;
pub mod constant;
mod format;
pub mod info;
mod lookup;
pub mod objects;
mod program;
pub mod scope;
pub mod stdlib;
pub mod types;
mod universe;

pub use constant::ConstValue;
pub use format::Qualifier;
pub use info::{Mode, NodeKey, Selection, SelectionKind, TypeAndValue, TypeInfo};
pub use lookup::{LookupResult, MissingMethod};
pub use objects::{Builtin, ObjId, ObjKind, Object, PkgId, VarKind};
pub use program::{Package, PackageSource, PackageView, Program, TypeError};
pub use scope::{Scope, ScopeId, ScopeKind};
pub use types::{BasicKind, Field, Interface, Method, Named, Param, Signature, Struct, Term, Type, TypeId, TypeParam, TypeTable};
pub use universe::Universe;
