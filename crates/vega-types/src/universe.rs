//! The universe scope: predeclared types, constants, `nil` and builtins.

use vega_core::Name;
use vega_syntax::Pos;

use crate::constant::ConstValue;
use crate::objects::{Builtin, ObjId, ObjKind, Object};
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::types::{BasicKind, Interface, Method, Named, Param, Signature, Type, TypeId, TypeTable};

#[derive(Debug, Clone)]
pub struct Universe {
    pub scope: ScopeId,
    pub error: TypeId,
    pub any: TypeId,
    pub comparable: TypeId,
    pub iota: ObjId,
}

pub(crate) fn build(types: &mut TypeTable, objects: &mut Vec<Object>, scopes: &mut Vec<Scope>) -> Universe {
    let scope = ScopeId::from_raw(scopes.len() as u32);
    scopes.push(Scope::new(ScopeKind::Universe, None, Pos::NONE, Pos::NONE));

    let declare = |objects: &mut Vec<Object>, scopes: &mut Vec<Scope>, name: &str, kind: ObjKind, ty: TypeId| {
        let id = ObjId::from_raw(objects.len() as u32);
        objects.push(Object {
            name: Name::new(name),
            kind,
            ty,
            pkg: None,
            pos: Pos::NONE,
            scope_pos: Pos::NONE,
            parent: Some(scope),
            decl: None,
        });
        scopes[scope.idx()].names.insert(Name::new(name), id);
        id
    };

    for kind in BasicKind::ALL {
        if kind == BasicKind::Invalid || kind == BasicKind::UnsafePointer || kind.is_untyped() {
            continue;
        }
        declare(
            objects,
            scopes,
            kind.name(),
            ObjKind::TypeName { alias: false },
            TypeTable::basic(kind),
        );
    }

    let any = types.alloc(Type::Interface(Interface::default()));
    declare(objects, scopes, "any", ObjKind::TypeName { alias: true }, any);

    // error: interface { Error() string }
    let error = types.alloc(Type::Named(Named {
        obj: ObjId::from_raw(0),
        underlying: TypeTable::INVALID,
        methods: Vec::new(),
        type_params: Vec::new(),
        type_args: Vec::new(),
        origin: None,
    }));
    let error_obj = declare(objects, scopes, "error", ObjKind::TypeName { alias: false }, error);
    let error_sig = types.alloc(Type::Signature(Signature {
        recv: Some(Param {
            name: Name::default(),
            ty: error,
            obj: None,
        }),
        type_params: Vec::new(),
        params: Vec::new(),
        results: vec![Param {
            name: Name::default(),
            ty: TypeTable::basic(BasicKind::String),
            obj: None,
        }],
        variadic: false,
    }));
    let error_method = ObjId::from_raw(objects.len() as u32);
    objects.push(Object {
        name: Name::new("Error"),
        kind: ObjKind::Func,
        ty: error_sig,
        pkg: None,
        pos: Pos::NONE,
        scope_pos: Pos::NONE,
        parent: None,
        decl: None,
    });
    let error_iface = types.alloc(Type::Interface(Interface {
        methods: vec![Method {
            name: Name::new("Error"),
            sig: error_sig,
            obj: error_method,
        }],
        embeddeds: Vec::new(),
        terms: Vec::new(),
    }));
    if let Some(named) = types.named_mut(error) {
        named.obj = error_obj;
        named.underlying = error_iface;
    }

    let comparable = types.alloc(Type::Named(Named {
        obj: ObjId::from_raw(0),
        underlying: any,
        methods: Vec::new(),
        type_params: Vec::new(),
        type_args: Vec::new(),
        origin: None,
    }));
    let comparable_obj = declare(
        objects,
        scopes,
        "comparable",
        ObjKind::TypeName { alias: false },
        comparable,
    );
    if let Some(named) = types.named_mut(comparable) {
        named.obj = comparable_obj;
    }

    let untyped_bool = TypeTable::basic(BasicKind::UntypedBool);
    declare(objects, scopes, "true", ObjKind::Const(ConstValue::Bool(true)), untyped_bool);
    declare(objects, scopes, "false", ObjKind::Const(ConstValue::Bool(false)), untyped_bool);
    let iota = declare(
        objects,
        scopes,
        "iota",
        ObjKind::Const(ConstValue::Int(0)),
        TypeTable::basic(BasicKind::UntypedInt),
    );
    declare(objects, scopes, "nil", ObjKind::Nil, TypeTable::basic(BasicKind::UntypedNil));

    for builtin in Builtin::ALL {
        declare(objects, scopes, builtin.name(), ObjKind::Builtin(builtin), TypeTable::INVALID);
    }

    Universe {
        scope,
        error,
        any,
        comparable,
        iota,
    }
}
