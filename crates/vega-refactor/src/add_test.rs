//! Generate a table-driven test for a function or method.

use serde::{Deserialize, Serialize};
use vega_core::{FileId, TextSize};
use vega_syntax::{NodeKind, ParsedFile};
use vega_types::{ObjId, Program, Qualifier, Signature, TypeId};

use crate::edit::{Edit, SuggestedFix};
use crate::extract_file::file_header;
use crate::fixers::{FileInput, PackageInput};
use crate::imports;
use crate::qualify::TypeSpeller;
use crate::util;
use crate::RefactorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AddTestOptions {
    /// Construct the receiver of a method with a constructor function of
    /// its package when one exists.
    pub prefer_constructor: bool,
}

impl Default for AddTestOptions {
    fn default() -> Self {
        AddTestOptions { prefer_constructor: true }
    }
}

struct Target {
    func: ObjId,
    sig: Signature,
    /// Named type of the receiver, for methods.
    recv: Option<TypeId>,
}

fn target(program: &Program, input: &FileInput<'_>) -> Result<Target, RefactorError> {
    let file = input.file;
    if file.file.is_test_file() {
        return Err(RefactorError::structural("the function is already in a test file"));
    }
    let selection = input.selection()?;
    let decl = selection
        .find(|k| matches!(k, NodeKind::FuncDecl { .. }))
        .ok_or_else(|| RefactorError::structural("selection is not in a function declaration"))?;
    if let NodeKind::FuncDecl { body: Some(body), .. } = file.tree.kind(decl) {
        if selection.start > file.tree.range(*body).start() {
            return Err(RefactorError::structural("select the function name or signature"));
        }
    }
    let func = program
        .func_of_decl(file, decl)
        .ok_or_else(|| RefactorError::semantic("function has no object"))?;
    let name = program.obj(func).name.clone();
    if name == "init" || (name == "main" && input.view.name() == "main") || name == "_" {
        return Err(RefactorError::structural(format!("cannot test {name}")));
    }
    if util::is_generic_func(program, file, decl) {
        return Err(RefactorError::semantic("type-parameterized functions are not supported"));
    }
    let sig = util::func_signature(program, file, decl)
        .ok_or_else(|| RefactorError::semantic("function has no signature"))?;
    let recv = sig.recv.as_ref().map(|r| program.types().deref(r.ty).0);
    Ok(Target {
        func,
        sig,
        recv,
    })
}

pub fn probe_add_test(input: &FileInput<'_>) -> Result<bool, RefactorError> {
    Ok(target(input.program(), input).is_ok())
}

/// `<basename>_test.go` next to `file`.
pub fn test_file_for(file: &FileId) -> FileId {
    let name = file.file_name();
    let stem = name.strip_suffix(".go").unwrap_or(name);
    file.sibling(&format!("{stem}_test.go"))
}

/// `TestF`, `Test_f`, `TestT_M`.
fn test_name(func: &str, recv: Option<&str>) -> String {
    let base = match recv {
        Some(recv) => format!("{recv}_{func}"),
        None => func.to_string(),
    };
    if base.starts_with(|c: char| c.is_lowercase()) {
        format!("Test_{base}")
    } else {
        format!("Test{base}")
    }
}

/// A function of the receiver's package returning the receiver type,
/// preferring `New<Type>`.
fn constructor(program: &Program, recv: TypeId, external: bool) -> Option<ObjId> {
    let types = program.types();
    let named = types.named(recv)?;
    let type_obj = program.obj(named.obj);
    let pkg = type_obj.pkg?;
    let preferred = format!("New{}", util::upper_first(&type_obj.name));
    let mut found: Vec<ObjId> = program
        .scope(program.package(pkg).scope)
        .names()
        .map(|(_, obj)| obj)
        .filter(|&obj| {
            let o = program.obj(obj);
            if !o.is_func() || (external && !o.is_exported()) {
                return false;
            }
            let Some(sig) = types.signature(o.ty) else {
                return false;
            };
            let returns_recv = sig
                .results
                .first()
                .is_some_and(|r| types.identical(types.deref(r.ty).0, recv));
            let error_only = sig.results.len() == 1 || sig.results.get(1).is_some_and(|r| program.is_error_type(r.ty));
            sig.recv.is_none() && sig.type_params.is_empty() && returns_recv && error_only && sig.results.len() <= 2
        })
        .collect();
    found.sort_by_key(|&obj| (program.obj(obj).name != preferred.as_str(), program.obj(obj).name.clone()));
    found.first().copied()
}

struct Names<'a> {
    program: &'a Program,
    speller: TypeSpeller<'a>,
    /// Qualifier for names of the target's package, in an external test.
    qualifier: Option<String>,
}

impl Names<'_> {
    fn qualify(&self, name: &str) -> String {
        match &self.qualifier {
            Some(q) => format!("{q}.{name}"),
            None => name.to_string(),
        }
    }

    fn ty(&self, t: TypeId) -> Result<String, RefactorError> {
        if !self.speller.is_accessible(t) {
            return Err(RefactorError::semantic(format!(
                "{} is not accessible from the test package",
                self.program.type_string(t, Qualifier::Path)
            )));
        }
        Ok(self.speller.type_string(t))
    }
}

fn render_test(
    program: &Program,
    target: &Target,
    names: &Names<'_>,
    test: &str,
    options: AddTestOptions,
    external: bool,
) -> Result<String, RefactorError> {
    let types = program.types();
    let func_name = program.obj(target.func).name.to_string();
    let sig = &target.sig;

    let mut fields = vec!["\t\tname string // description of this test case\n".to_string()];
    let mut args = Vec::new();
    let mut taken = vec!["name".to_string(), "want".to_string(), "wantErr".to_string()];
    if !sig.params.is_empty() {
        fields.push("\t\t// Named input parameters for target function.\n".to_string());
    }
    for (i, param) in sig.params.iter().enumerate() {
        let base = if param.name.is_empty() || param.name == "_" {
            format!("arg{i}")
        } else {
            param.name.to_string()
        };
        let name = (0..)
            .map(|n| if n == 0 { base.clone() } else { format!("{base}{n}") })
            .find(|n| !taken.contains(n))
            .unwrap_or(base);
        fields.push(format!("\t\t{name} {}\n", names.ty(param.ty)?));
        let variadic = sig.variadic && i + 1 == sig.params.len();
        args.push(if variadic { format!("tt.{name}...") } else { format!("tt.{name}") });
        taken.push(name);
    }

    let has_err = sig.results.last().is_some_and(|r| program.is_error_type(r.ty));
    let values: Vec<TypeId> = sig
        .results
        .iter()
        .take(sig.results.len() - usize::from(has_err))
        .map(|r| r.ty)
        .collect();
    let mut got = Vec::new();
    for (i, &ty) in values.iter().enumerate() {
        let suffix = if i == 0 { String::new() } else { (i + 1).to_string() };
        fields.push(format!("\t\twant{suffix} {}\n", names.ty(ty)?));
        got.push(format!("got{suffix}"));
    }
    if has_err {
        fields.push("\t\twantErr bool\n".to_string());
    }

    let mut body = String::new();
    let callee = match target.recv {
        Some(recv) => {
            let named = types
                .named(recv)
                .ok_or_else(|| RefactorError::semantic("receiver is not a named type"))?;
            let recv_name = program.obj(named.obj).name.to_string();
            if external && !program.obj(named.obj).is_exported() {
                return Err(RefactorError::semantic(format!(
                    "the receiver type {recv_name} is not exported"
                )));
            }
            let ctor = options
                .prefer_constructor
                .then(|| constructor(program, recv, external))
                .flatten();
            match ctor {
                Some(ctor) => {
                    let ctor_sig = types
                        .signature(program.obj(ctor).ty)
                        .ok_or_else(|| RefactorError::Bug("constructor has no signature".into()))?;
                    let zeros: Vec<String> = ctor_sig.params.iter().map(|p| names.speller.zero_value(p.ty)).collect();
                    let call = format!("{}({})", names.qualify(&program.obj(ctor).name), zeros.join(", "));
                    if ctor_sig.results.len() == 2 {
                        body.push_str(&format!(
                            "\t\t\tr, err := {call}\n\t\t\tif err != nil {{\n\t\t\t\tt.Fatalf(\"could not construct receiver type: %v\", err)\n\t\t\t}}\n"
                        ));
                    } else {
                        body.push_str(&format!("\t\t\tr := {call}\n"));
                    }
                }
                None => {
                    let spelled = names.ty(sig.recv.as_ref().map_or(recv, |r| r.ty))?;
                    body.push_str(&format!(
                        "\t\t\t// TODO: construct the receiver type.\n\t\t\tvar r {spelled}\n"
                    ));
                }
            }
            format!("r.{func_name}")
        }
        None => {
            if external && !program.obj(target.func).is_exported() {
                return Err(RefactorError::semantic(format!("{func_name} is not exported")));
            }
            names.qualify(&func_name)
        }
    };

    let call = format!("{callee}({})", args.join(", "));
    let mut lhs = got.clone();
    if has_err {
        lhs.push("gotErr".to_string());
    }
    if lhs.is_empty() {
        body.push_str(&format!("\t\t\t{call}\n"));
    } else {
        body.push_str(&format!("\t\t\t{} := {call}\n", lhs.join(", ")));
    }
    if has_err {
        body.push_str(&format!(
            "\t\t\tif gotErr != nil {{\n\t\t\t\tif !tt.wantErr {{\n\t\t\t\t\tt.Errorf(\"{func_name}() failed: %v\", gotErr)\n\t\t\t\t}}\n\t\t\t\treturn\n\t\t\t}}\n\t\t\tif tt.wantErr {{\n\t\t\t\tt.Fatal(\"{func_name}() succeeded unexpectedly\")\n\t\t\t}}\n"
        ));
    }
    for (i, (g, &ty)) in got.iter().zip(&values).enumerate() {
        let want = if i == 0 { "want".to_string() } else { format!("want{}", i + 1) };
        if types.comparable(ty) {
            body.push_str(&format!("\t\t\tif {g} != tt.{want} {{\n"));
        } else {
            body.push_str(&format!(
                "\t\t\t// TODO: update the condition below to compare {g} with tt.{want}.\n\t\t\tif true {{\n"
            ));
        }
        body.push_str(&format!(
            "\t\t\t\tt.Errorf(\"{func_name}() = %v, want %v\", {g}, tt.{want})\n\t\t\t}}\n"
        ));
    }

    Ok(format!(
        "func {test}(t *testing.T) {{\n\ttests := []struct {{\n{}\t}}{{\n\t\t// TODO: Add test cases.\n\t}}\n\tfor _, tt := range tests {{\n\t\tt.Run(tt.name, func(t *testing.T) {{\n{body}\t\t}})\n\t}}\n}}\n",
        fields.concat()
    ))
}

/// Add a test for the function at the selection to its sibling test file.
pub fn add_test(input: &PackageInput<'_>, options: AddTestOptions) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file: &ParsedFile = input.file;
    let target = target(program, &input.file_input())?;
    input.cx.check()?;

    let pkg = input.view.id();
    let test_id = test_file_for(&file.file);
    let existing = program.file(&test_id).cloned();
    let (test_pkg, external) = match &existing {
        Some(_) => {
            let test_pkg = program
                .package_of_file(&test_id)
                .ok_or_else(|| RefactorError::semantic(format!("{} has no package", test_id.file_name())))?;
            (test_pkg, test_pkg != pkg)
        }
        None => (pkg, false),
    };

    let speller = match &existing {
        Some(test_file) => TypeSpeller::new(program, test_file, test_pkg),
        None => TypeSpeller::detached(program, test_pkg),
    };
    let mut extra_imports: Vec<String> = vec!["testing".to_string()];
    let qualifier = if external {
        let home = program.package(pkg);
        let local = existing
            .as_ref()
            .and_then(|f| {
                imports::file_imports(program, f)
                    .into_iter()
                    .find(|i| i.path == home.path)
                    .map(|i| i.local)
            })
            .unwrap_or_else(|| {
                extra_imports.push(home.path.clone());
                home.name.to_string()
            });
        Some(local)
    } else {
        None
    };
    let names = Names {
        program,
        speller,
        qualifier,
    };

    let func = program.obj(target.func);
    let recv_name = target
        .recv
        .and_then(|r| program.types().named(r))
        .map(|n| program.obj(n.obj).name.to_string());
    let base_name = test_name(&func.name, recv_name.as_deref());
    let scope = program.package(test_pkg).scope;
    let test = (0..)
        .map(|n| if n == 0 { base_name.clone() } else { format!("{base_name}{n}") })
        .find(|n| program.scope(scope).lookup(n).is_none())
        .unwrap_or(base_name);

    let text = render_test(program, &target, &names, &test, options, external)?;
    let mut paths: Vec<String> = extra_imports;
    paths.extend(names.speller.missing_imports().into_iter().map(|(p, _)| p));
    tracing::debug!(
        target: "vega.refactor",
        function = %func.name,
        test = %test,
        file = %test_id,
        creating = existing.is_none(),
        "adding test"
    );

    let title = format!("Add test for {}", func.name);
    match existing {
        Some(test_file) => {
            let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            let mut edits = imports::add_imports_edits(&test_file, &path_refs);
            let end = TextSize::of(&*test_file.text);
            let sep = if test_file.text.ends_with('\n') { "\n" } else { "\n\n" };
            edits.push(Edit::insert(test_file.pos(end), format!("{sep}{text}")));
            Ok(Some(SuggestedFix::new(title, edits)))
        }
        None => {
            let package = file.tree.package_name().map_or_else(|| "main".to_string(), |n| n.to_string());
            let mut specs: Vec<(String, Option<String>)> = paths.into_iter().map(|p| (p, None)).collect();
            specs.sort();
            specs.dedup();
            let new_text = format!(
                "{}package {package}\n\n{}\n\n{text}",
                file_header(file),
                imports::render_import_block(&specs)
            );
            Ok(Some(SuggestedFix::new(title, Vec::new()).with_new_file(test_id, new_text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_follow_exportedness() {
        assert_eq!(test_name("Parse", None), "TestParse");
        assert_eq!(test_name("parse", None), "Test_parse");
        assert_eq!(test_name("Close", Some("Conn")), "TestConn_Close");
        assert_eq!(test_name("close", Some("conn")), "Test_conn_close");
    }

    #[test]
    fn test_file_is_a_sibling() {
        assert_eq!(test_file_for(&FileId::new("/ws/p/a.go")), FileId::new("/ws/p/a_test.go"));
    }

    #[test]
    fn options_default_to_constructors() {
        let options: AddTestOptions = serde_json::from_str("{}").unwrap();
        assert!(options.prefer_constructor);
        let options: AddTestOptions = serde_json::from_str(r#"{"preferConstructor":false}"#).unwrap();
        assert!(!options.prefer_constructor);
    }
}
