use pretty_assertions::assert_eq;
use vega_syntax::{NodeKind, ParsedFile};
use vega_types::{ConstValue, ObjKind, Qualifier, SelectionKind};

use super::{check, messages, pkg};

/// The first identifier named `name` at or after byte offset `from`.
fn ident(file: &ParsedFile, name: &str, from: usize) -> vega_syntax::NodeId {
    file.tree
        .ids()
        .filter(|&id| matches!(file.tree.kind(id), NodeKind::Ident { name: n } if n == name))
        .filter(|&id| usize::from(file.tree.range(id).start()) >= from)
        .min_by_key(|&id| file.tree.range(id).start())
        .unwrap_or_else(|| panic!("no identifier {name}"))
}

#[test]
fn iota_constants_are_folded() {
    let program = check(&[(
        "/ws/p/a.go",
        "package p\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n\nconst Mask = 1<<C | B\n",
    )]);
    assert_eq!(messages(&program, "example.com/p"), Vec::<String>::new());
    let view = program.view(pkg(&program, "example.com/p"));
    let value = |name: &str| program.obj(view.lookup(name).unwrap()).const_value().cloned();
    assert_eq!(value("C"), Some(ConstValue::Int(2)));
    assert_eq!(value("Mask"), Some(ConstValue::Int(5)));
}

#[test]
fn generic_calls_infer_type_arguments() {
    let src = "package p\n\nfunc Id[T any](x T) T { return x }\n\nvar s = Id(\"a\")\n";
    let program = check(&[("/ws/p/a.go", src)]);
    assert_eq!(messages(&program, "example.com/p"), Vec::<String>::new());
    let view = program.view(pkg(&program, "example.com/p"));
    let s = program.obj(view.lookup("s").unwrap());
    assert_eq!(program.type_string(s.ty, Qualifier::Path), "string");
}

#[test]
fn selections_record_fields_and_methods() {
    let src = "package p\n\ntype T struct{ n int }\n\nfunc (t *T) Inc() { t.n++ }\n\nfunc use(t T) int {\n\tt.Inc()\n\treturn t.n\n}\n";
    let program = check(&[("/ws/p/a.go", src)]);
    assert_eq!(messages(&program, "example.com/p"), Vec::<String>::new());
    let file = program.file(&vega_core::FileId::new("/ws/p/a.go")).unwrap();
    let body = src.find("func use").unwrap();
    let selector = |sel| {
        file.tree
            .parent(sel)
            .and_then(|parent| {
                program
                    .info()
                    .selections
                    .get(&vega_types::NodeKey::new(file, parent))
                    .cloned()
            })
            .unwrap()
    };
    let inc = selector(ident(file, "Inc", body));
    assert_eq!(inc.kind, SelectionKind::MethodVal);
    assert!(program.has_pointer_receiver(inc.obj));
    let n = selector(ident(file, "n", body));
    assert_eq!(n.kind, SelectionKind::FieldVal);
    assert_eq!(program.type_string(n.ty, Qualifier::Path), "int");
}

#[test]
fn qualified_identifiers_resolve_to_imported_packages() {
    let src = "package p\n\nimport \"fmt\"\n\nfunc f() { fmt.Println(1) }\n";
    let program = check(&[("/ws/p/a.go", src)]);
    let file = program.file(&vega_core::FileId::new("/ws/p/a.go")).unwrap();
    let at = src.find("fmt.Println").unwrap();
    let fmt = program.object_of(file, ident(file, "fmt", at)).unwrap();
    let ObjKind::PkgName { path, imported } = &program.obj(fmt).kind else {
        panic!("fmt is not a package name");
    };
    assert_eq!(path, "fmt");
    assert_eq!(*imported, program.package_by_path("fmt"));
    let println = program.object_of(file, ident(file, "Println", at)).unwrap();
    assert!(program.obj(println).is_func());
    assert_eq!(program.obj(println).pkg, program.package_by_path("fmt"));
}

#[test]
fn locals_are_visible_after_their_declaration_only() {
    let src = "package p\n\nvar x = 1\n\nfunc f() int {\n\ty := x\n\tx := y + 1\n\treturn x\n}\n";
    let program = check(&[("/ws/p/a.go", src)]);
    assert_eq!(messages(&program, "example.com/p"), Vec::<String>::new());
    let file = program.file(&vega_core::FileId::new("/ws/p/a.go")).unwrap();
    let first_use = ident(file, "x", src.find("y := x").unwrap() + 5);
    let last_use = ident(file, "x", src.find("return x").unwrap());
    let view = program.view(pkg(&program, "example.com/p"));
    let global = view.lookup("x").unwrap();
    assert_eq!(program.object_of(file, first_use), Some(global));
    assert_ne!(program.object_of(file, last_use), Some(global));

    let scope = program
        .scope_at(file, file.pos(file.tree.range(first_use).start()))
        .unwrap();
    let (_, seen) = program
        .lookup_parent(scope, "x", file.pos(file.tree.range(first_use).start()))
        .unwrap();
    assert_eq!(seen, global);
}

#[test]
fn reverse_dependencies_follow_imports() {
    let program = check(&[
        ("/ws/lib/lib.go", "package lib\n\nfunc F() {}\n"),
        ("/ws/app/app.go", "package app\n\nimport \"example.com/lib\"\n\nfunc G() { lib.F() }\n"),
    ]);
    let lib = pkg(&program, "example.com/lib");
    let app = pkg(&program, "example.com/app");
    assert_eq!(program.reverse_dependencies(lib), vec![lib, app]);
    assert_eq!(program.reverse_dependencies(app), vec![app]);
}
