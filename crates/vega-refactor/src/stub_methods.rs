//! Declaring methods and functions the checker reports as missing.
//!
//! Three fixers share the machinery here: stubbing every method a concrete
//! type lacks for an interface it is converted to, declaring a single
//! method called on a type that has none by that name, and declaring a
//! function called before it exists. Generated bodies panic.

use vega_core::{Name, TextSize};
use vega_syntax::{NodeId, NodeKind, ParsedFile, TokenKind};
use vega_types::{BasicKind, NodeKey, PkgId, Program, Type, TypeId};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::qualify::TypeSpeller;
use crate::selection::Selection;
use crate::util;
use crate::RefactorError;

const STUB_BODY: &str = "{\n\tpanic(\"unimplemented\")\n}";

/// Where a named type's methods go.
struct TypeHome<'p> {
    file: &'p ParsedFile,
    pkg: PkgId,
    /// End of the top-level declaration holding the type.
    insert_at: TextSize,
    /// `T` or `T[K, V]`, as written in a receiver.
    receiver_type: String,
}

struct Receiver {
    name: String,
    pointer: bool,
}

impl Receiver {
    fn render(&self, home: &TypeHome<'_>) -> String {
        let star = if self.pointer { "*" } else { "" };
        format!("({} {star}{})", self.name, home.receiver_type)
    }
}

fn type_home<'p>(program: &'p Program, named: TypeId) -> Result<TypeHome<'p>, RefactorError> {
    let types = program.types();
    let origin = types.origin(named);
    let info = types
        .named(origin)
        .ok_or_else(|| RefactorError::semantic("not a named type"))?;
    let obj = program.obj(info.obj);
    let pkg = obj
        .pkg
        .ok_or_else(|| RefactorError::semantic(format!("cannot add methods to {}", obj.name)))?;
    if program.package(pkg).std {
        return Err(RefactorError::semantic(format!(
            "cannot add methods to {} of the standard library",
            obj.name
        )));
    }
    if util::is_local(program, info.obj) {
        return Err(RefactorError::semantic(format!(
            "cannot add methods to the local type {}",
            obj.name
        )));
    }
    let key = obj
        .decl
        .ok_or_else(|| RefactorError::semantic(format!("declaration of {} not found", obj.name)))?;
    let file = program
        .decl_file(info.obj)
        .ok_or_else(|| RefactorError::semantic(format!("declaration of {} not found", obj.name)))?;
    let tree = &file.tree;
    let NodeKind::TypeSpec { type_params, .. } = tree.kind(key.node) else {
        return Err(RefactorError::Bug(format!("{} is not declared by a type spec", obj.name)));
    };
    let decl = tree
        .parent(key.node)
        .filter(|p| matches!(tree.kind(*p), NodeKind::GenDecl { .. }))
        .ok_or_else(|| RefactorError::Bug("type spec outside a declaration".into()))?;

    let mut receiver_type = obj.name.to_string();
    if let Some(NodeKind::FieldList { fields, .. }) = type_params.map(|tp| tree.kind(tp)) {
        let names: Vec<String> = fields
            .iter()
            .filter_map(|&f| match tree.kind(f) {
                NodeKind::Field { names, .. } => Some(names.clone()),
                _ => None,
            })
            .flatten()
            .filter_map(|n| tree.ident_name(n).map(|n| n.to_string()))
            .collect();
        if !names.is_empty() {
            receiver_type = format!("{receiver_type}[{}]", names.join(", "));
        }
    }
    Ok(TypeHome {
        file,
        pkg,
        insert_at: tree.range(decl).end(),
        receiver_type,
    })
}

/// Receiver name and pointer-ness, following the type's existing methods.
/// `via_pointer` says whether the value needing the methods is a pointer.
fn receiver(program: &Program, named: TypeId, via_pointer: bool) -> Receiver {
    let types = program.types();
    let methods = types.declared_methods(types.origin(named));
    let name = methods
        .iter()
        .filter_map(|&m| types.signature(program.obj(m).ty)?.recv.as_ref())
        .map(|recv| recv.name.to_string())
        .find(|n| !n.is_empty() && n != "_")
        .unwrap_or_else(|| {
            let type_name = types
                .named(named)
                .map(|n| program.obj(n.obj).name.to_string())
                .unwrap_or_default();
            type_name
                .chars()
                .next()
                .map(|c| c.to_lowercase().collect())
                .unwrap_or_else(|| "r".to_string())
        });
    let pointer = via_pointer && (methods.is_empty() || methods.iter().any(|&m| program.has_pointer_receiver(m)));
    Receiver { name, pointer }
}

/// An expression converted to an interface type it does not implement.
struct Conversion {
    concrete: TypeId,
    iface: TypeId,
}

fn type_of_key(program: &Program, file: &ParsedFile, node: NodeId) -> Option<TypeId> {
    program.info().types.get(&NodeKey::new(file, node)).map(|tv| tv.ty)
}

/// The type an expression in position `expr` under `parent` is assigned to.
fn assignment_target(program: &Program, file: &ParsedFile, path: &[NodeId], at: usize) -> Option<TypeId> {
    let tree = &file.tree;
    let expr = path[at];
    let parent = *path.get(at + 1)?;
    let types = program.types();
    match tree.kind(parent) {
        NodeKind::ValueSpec { names, ty: Some(_), values } => {
            let i = values.iter().position(|&v| v == expr)?;
            let obj = program.object_of(file, *names.get(i)?);
            match obj {
                Some(obj) => Some(program.obj(obj).ty),
                None => {
                    // Blank names have no object; the declared type applies.
                    let NodeKind::ValueSpec { ty: Some(ty), .. } = tree.kind(parent) else {
                        return None;
                    };
                    type_of_key(program, file, *ty)
                }
            }
        }
        NodeKind::Assign {
            lhs,
            tok: TokenKind::Assign,
            rhs,
            ..
        } if lhs.len() == rhs.len() => {
            let i = rhs.iter().position(|&r| r == expr)?;
            type_of_key(program, file, lhs[i])
        }
        NodeKind::Return { results } => {
            let i = results.iter().position(|&r| r == expr)?;
            let func = util::enclosing_func(tree, &path[at..])?;
            let sig = util::func_signature(program, file, func)?;
            if sig.results.len() != results.len() {
                return None;
            }
            Some(sig.results[i].ty)
        }
        NodeKind::Call { fun, args, .. } => {
            let i = args.iter().position(|&a| a == expr)?;
            let tv = program.info().types.get(&NodeKey::new(file, *fun))?;
            if tv.is_type() {
                return Some(tv.ty);
            }
            let sig = types.signature(tv.ty)?;
            if sig.variadic && i + 1 >= sig.params.len() {
                let last = sig.params.last()?;
                return match types.get(last.ty) {
                    Type::Slice(elem) => Some(*elem),
                    _ => None,
                };
            }
            sig.params.get(i).map(|p| p.ty)
        }
        _ => None,
    }
}

fn find_conversion(program: &Program, selection: &Selection<'_>) -> Option<Conversion> {
    let file = selection.file;
    let types = program.types();
    for at in 0..selection.path.len().saturating_sub(1) {
        let Some(concrete) = type_of_key(program, file, selection.path[at]) else {
            continue;
        };
        let Some(iface) = assignment_target(program, file, &selection.path, at) else {
            continue;
        };
        if types.is_interface(iface) && !types.is_interface(concrete) && !program.implements(concrete, iface) {
            return Some(Conversion { concrete, iface });
        }
    }
    None
}

pub(crate) fn stub_missing_methods(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let selection = input.selection()?;
    let Some(Conversion { concrete, iface }) = find_conversion(program, &selection) else {
        return Ok(None);
    };
    let types = program.types();
    let (named, via_pointer) = types.deref(concrete);
    if types.named(named).is_none() {
        return Err(RefactorError::semantic("only named types can have methods"));
    }
    let home = type_home(program, named)?;
    let recv = receiver(program, named, via_pointer);
    let speller = TypeSpeller::new(program, home.file, home.pkg);

    let mut stubs = String::new();
    let mut count = 0;
    for method in types.interface_methods(iface) {
        let lookup = program.lookup_field_or_method(concrete, true, Some(home.pkg), &method.name);
        if let Some(found) = lookup {
            if !found.is_method {
                return Err(RefactorError::semantic(format!(
                    "{} has a field named {}",
                    home.receiver_type, method.name
                )));
            }
            let map = program.receiver_map(found.holder);
            if !types.identical_with(found.ty, method.sig, &map) {
                return Err(RefactorError::semantic(format!(
                    "{} has a method {} with the wrong signature",
                    home.receiver_type, method.name
                )));
            }
            continue;
        }
        let obj = program.obj(method.obj);
        if !obj.is_exported() && obj.pkg != Some(home.pkg) {
            return Err(RefactorError::semantic(format!(
                "cannot implement the unexported method {} of another package",
                method.name
            )));
        }
        let sig = types
            .signature(method.sig)
            .ok_or_else(|| RefactorError::Bug(format!("method {} has no signature", method.name)))?;
        if sig.params.iter().chain(&sig.results).any(|p| !speller.is_accessible(p.ty)) {
            return Err(RefactorError::semantic(format!(
                "the signature of {} refers to inaccessible types",
                method.name
            )));
        }
        stubs.push_str(&format!(
            "\n\nfunc {} {}{} {STUB_BODY}",
            recv.render(&home),
            method.name,
            speller.signature(sig)
        ));
        count += 1;
    }
    if count == 0 {
        return Ok(None);
    }

    let iface_name = program.type_string_in(iface, home.pkg);
    tracing::debug!(
        target: "vega.refactor",
        concrete = %home.receiver_type,
        interface = %iface_name,
        count,
        "stubbing missing methods"
    );
    let at = home.file.pos(home.insert_at);
    let mut edits = vec![Edit::insert(at, stubs)];
    edits.extend(speller.import_edits());
    Ok(Some(SuggestedFix::new(
        format!("Declare missing methods of {iface_name}"),
        edits,
    )))
}

/// Parameters for a declaration called with `args`, named after plain
/// identifier arguments or the argument types.
fn params_from_args(
    program: &Program,
    file: &ParsedFile,
    speller: &TypeSpeller<'_>,
    args: &[NodeId],
) -> Result<Vec<String>, RefactorError> {
    let tree = &file.tree;
    let types = program.types();
    let mut taken: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for &arg in args {
        let ty = type_of_key(program, file, arg)
            .ok_or_else(|| RefactorError::semantic("cannot infer the type of an argument"))?;
        if matches!(types.get(ty), Type::Tuple(_)) || types.is_invalid(ty) {
            return Err(RefactorError::semantic("cannot infer the parameter types"));
        }
        let ty = types.default_type(ty);
        if !speller.is_accessible(ty) {
            return Err(RefactorError::semantic("an argument has an inaccessible type"));
        }
        let base = match tree.ident_name(tree.unparen(arg)) {
            Some(name) if name.as_str() != "_" && name.as_str() != "nil" => name.to_string(),
            _ => name_for_type(program, ty),
        };
        let name = (0..)
            .map(|n| if n == 0 { base.clone() } else { format!("{base}{n}") })
            .find(|n| !taken.contains(n) && !util::is_keyword(n))
            .unwrap_or(base);
        out.push(format!("{name} {}", speller.type_string(ty)));
        taken.push(name);
    }
    Ok(out)
}

/// A short lower-case name for a value of type `t`.
fn name_for_type(program: &Program, t: TypeId) -> String {
    let types = program.types();
    match types.get(t) {
        Type::Named(named) => util::lower_first(program.obj(named.obj).name.as_str()),
        Type::Pointer(e) | Type::Slice(e) | Type::Array { elem: e, .. } | Type::Chan { elem: e, .. } => {
            name_for_type(program, *e)
        }
        Type::Map { .. } => "m".into(),
        Type::Signature(_) => "f".into(),
        Type::Basic(kind) => match kind.name().chars().next() {
            Some(c) if *kind != BasicKind::UntypedNil => c.to_string(),
            _ => "v".into(),
        },
        _ => "v".into(),
    }
}

/// Result types for `call`, inferred from how its value is used.
fn results_from_use(program: &Program, file: &ParsedFile, path: &[NodeId], at: usize) -> Result<Vec<TypeId>, RefactorError> {
    let tree = &file.tree;
    let call = path[at];
    let Some(&parent) = path.get(at + 1) else {
        return Ok(Vec::new());
    };
    let unknown = || RefactorError::semantic("cannot infer the result types from the use of the call");
    match tree.kind(parent) {
        NodeKind::ExprStmt { .. } | NodeKind::Go { .. } | NodeKind::Defer { .. } => Ok(Vec::new()),
        NodeKind::Assign {
            lhs,
            tok: TokenKind::Assign,
            rhs,
            ..
        } if rhs.len() == 1 && rhs[0] == call => lhs
            .iter()
            .map(|&l| {
                if tree.ident_name(l).is_some_and(|n| n.as_str() == "_") {
                    return Err(unknown());
                }
                type_of_key(program, file, l).ok_or_else(unknown)
            })
            .collect(),
        NodeKind::Return { results } if results.len() == 1 => {
            let func = util::enclosing_func(tree, &path[at..]).ok_or_else(unknown)?;
            let sig = util::func_signature(program, file, func).ok_or_else(unknown)?;
            Ok(sig.results.iter().map(|r| r.ty).collect())
        }
        _ => assignment_target(program, file, path, at).map(|t| vec![t]).ok_or_else(unknown),
    }
}

fn render_results(speller: &TypeSpeller<'_>, results: &[TypeId]) -> Result<String, RefactorError> {
    if results.iter().any(|&t| !speller.is_accessible(t)) {
        return Err(RefactorError::semantic("a result has an inaccessible type"));
    }
    let spelled: Vec<String> = results.iter().map(|&t| speller.type_string(t)).collect();
    Ok(match spelled.len() {
        0 => String::new(),
        1 => format!(" {}", spelled[0]),
        _ => format!(" ({})", spelled.join(", ")),
    })
}

/// The call whose callee is `fun`, with its position on `path`.
fn call_of(tree: &vega_syntax::SyntaxTree, path: &[NodeId], fun: NodeId) -> Option<(usize, Vec<NodeId>)> {
    let at = path.iter().position(|&n| n == fun)? + 1;
    match tree.kind(*path.get(at)?) {
        NodeKind::Call { fun: f, args, .. } if *f == fun => Some((at, args.clone())),
        _ => None,
    }
}

pub(crate) fn declare_missing_method(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    let found = selection.path.iter().copied().find_map(|n| match tree.kind(n) {
        NodeKind::Selector { x, sel } if program.info().selections.get(&NodeKey::new(file, n)).is_none() => {
            Some((n, *x, *sel))
        }
        _ => None,
    });
    let Some((selector, x, sel)) = found else {
        return Ok(None);
    };
    let Some(method) = tree.ident_name(sel).cloned() else {
        return Ok(None);
    };
    let recv_ty = type_of_key(program, file, x).ok_or_else(|| RefactorError::semantic("receiver has no type"))?;
    if matches!(program.info().types.get(&NodeKey::new(file, x)), Some(tv) if tv.is_type()) {
        return Err(RefactorError::semantic("cannot declare a method from a method expression"));
    }
    let types = program.types();
    let (named, via_pointer) = types.deref(recv_ty);
    if types.named(named).is_none() || types.is_interface(named) {
        return Err(RefactorError::semantic(format!("cannot declare {method} on this type")));
    }
    let (at, args) = call_of(tree, &selection.path, selector)
        .ok_or_else(|| RefactorError::structural(format!("{method} is not called")))?;

    let home = type_home(program, named)?;
    let addressable = program
        .info()
        .types
        .get(&NodeKey::new(file, x))
        .is_some_and(|tv| tv.addressable());
    let recv = receiver(program, named, via_pointer || addressable);
    let speller = TypeSpeller::new(program, home.file, home.pkg);
    let params = params_from_args(program, file, &speller, &args)?;
    let results = results_from_use(program, file, &selection.path, at)?;
    let results = render_results(&speller, &results)?;

    let stub = format!(
        "\n\nfunc {} {method}({}){results} {STUB_BODY}",
        recv.render(&home),
        params.join(", ")
    );
    tracing::debug!(target: "vega.refactor", method = %method, receiver = %home.receiver_type, "declaring missing method");
    let mut edits = vec![Edit::insert(home.file.pos(home.insert_at), stub)];
    edits.extend(speller.import_edits());
    Ok(Some(SuggestedFix::new(
        format!("Declare missing method {}.{method}", home.receiver_type),
        edits,
    )))
}

pub(crate) fn create_undeclared_func(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    let ident = selection.innermost();
    let Some(name) = tree.ident_name(ident).cloned() else {
        return Ok(None);
    };
    if name.as_str() == "_" || program.object_of(file, ident).is_some() {
        return Ok(None);
    }
    let selected = tree
        .parent(ident)
        .is_some_and(|p| matches!(tree.kind(p), NodeKind::Selector { sel, .. } if *sel == ident));
    if selected {
        return Ok(None);
    }
    let (at, args) = call_of(tree, &selection.path, ident)
        .ok_or_else(|| RefactorError::structural(format!("{name} is not called")))?;
    let decl = selection
        .top_level_decl()
        .ok_or_else(|| RefactorError::structural("call is outside a declaration"))?;

    let speller = TypeSpeller::new(program, file, input.view.id());
    let params = params_from_args(program, file, &speller, &args)?;
    let results = results_from_use(program, file, &selection.path, at)?;
    let results = render_results(&speller, &results)?;

    let func = format!("\n\nfunc {name}({}){results} {STUB_BODY}", params.join(", "));
    tracing::debug!(target: "vega.refactor", function = %name, "creating undeclared function");
    let mut edits = vec![Edit::insert(file.pos(tree.range(decl).end()), func)];
    edits.extend(speller.import_edits());
    Ok(Some(SuggestedFix::new(format!("Create function {name}"), edits)))
}

/// Names of the methods of `iface` that `concrete` lacks entirely.
fn missing_method_names(program: &Program, concrete: TypeId, iface: TypeId) -> Vec<Name> {
    program
        .types()
        .interface_methods(iface)
        .into_iter()
        .filter(|m| {
            program
                .lookup_field_or_method(concrete, true, program.obj(m.obj).pkg, &m.name)
                .is_none()
        })
        .map(|m| m.name)
        .collect()
}

/// Whether the selection holds a conversion to an interface the value does
/// not implement.
pub fn probe_stub_methods(input: &FileInput<'_>) -> Result<bool, RefactorError> {
    let program = input.program();
    let selection = input.selection()?;
    Ok(find_conversion(program, &selection)
        .is_some_and(|c| !missing_method_names(program, c.concrete, c.iface).is_empty()))
}
