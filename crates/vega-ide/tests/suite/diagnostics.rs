use lsp_types::{CodeActionKind, Diagnostic, NumberOrString};
use pretty_assertions::assert_eq;
use vega_core::FileId;
use vega_ide::diagnostics::file_diagnostics;

use super::harness::{workspace, Workspace};

fn diagnostic(ws: &Workspace, needle: &str, message: &str) -> Diagnostic {
    Diagnostic {
        range: ws.range_of("/ws/p/a.go", needle),
        message: message.to_string(),
        ..Diagnostic::default()
    }
}

#[test]
fn missing_imports_claim_their_diagnostic() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f() {
	/*cursor*/fmt.Println("hi")
}
"#,
    );
    let undefined = diagnostic(&ws, "fmt", "undefined: fmt");
    let mut request = ws.request();
    request.diagnostics = vec![undefined.clone()];
    request.only = Some(vec![CodeActionKind::QUICKFIX]);

    let response = ws.actions(&request);
    let [action] = response.actions.as_slice() else {
        panic!("expected one action: {:?}", response.actions);
    };
    assert_eq!(action.title, "Add import: \"fmt\"");
    assert_eq!(action.kind, Some(CodeActionKind::QUICKFIX));
    assert_eq!(action.diagnostics, Some(vec![undefined]));
    let edit = action.edit.as_ref().expect("inline edit");
    assert!(ws.after(edit, "/ws/p/a.go").contains("import \"fmt\""));
}

#[test]
fn import_fixes_need_a_matching_diagnostic() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f() {
	/*cursor*/fmt.Println("hi")
}
"#,
    );
    let mut request = ws.request();
    request.only = Some(vec![CodeActionKind::QUICKFIX]);
    assert!(ws.actions(&request).actions.is_empty());

    request.diagnostics = vec![diagnostic(&ws, "fmt", "undefined: os")];
    assert!(ws.actions(&request).actions.is_empty());
}

#[test]
fn unused_imports_are_deleted() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

import /*cursor*/"os"

func f() {}
"#,
    );
    let unused = diagnostic(&ws, "\"os\"", "\"os\" imported and not used");
    let mut request = ws.request();
    request.diagnostics = vec![unused.clone()];
    request.only = Some(vec![CodeActionKind::QUICKFIX]);
    let response = ws.actions(&request);
    let [action] = response.actions.as_slice() else {
        panic!("expected one action: {:?}", response.actions);
    };
    assert_eq!(action.title, "Delete import: \"os\"");
    assert_eq!(action.diagnostics, Some(vec![unused]));
    let edit = action.edit.as_ref().expect("inline edit");
    assert_eq!(ws.after(edit, "/ws/p/a.go"), "package p\n\nfunc f() {}\n");
}

#[test]
fn missing_methods_are_stubbed_from_the_diagnostic() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type Reader interface {
	Read(p []byte) (int, error)
}

type myType struct{}

var /*cursor*/_ Reader = myType{}
"#,
    );
    let missing = diagnostic(
        &ws,
        "myType{}",
        "cannot use myType{} (value of type myType) as Reader value in variable declaration: myType does not implement Reader (missing method Read)",
    );
    let mut request = ws.request();
    request.diagnostics = vec![missing.clone()];
    request.only = Some(vec![CodeActionKind::QUICKFIX]);
    let response = ws.actions(&request);
    let action = response
        .actions
        .iter()
        .find(|a| a.title == "Declare missing methods of Reader")
        .expect("stub action");
    assert_eq!(action.diagnostics, Some(vec![missing]));
    let text = ws.after(action.edit.as_ref().expect("inline edit"), "/ws/p/a.go");
    assert!(
        text.contains("func (m myType) Read(p []byte) (int, error) {\n\tpanic(\"unimplemented\")\n}\n"),
        "{text}"
    );
}

#[test]
fn diagnostic_codes_name_their_fixer() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type Point struct {
	X, Y int
}

var /*cursor*/p = Point{}
"#,
    );
    let incomplete = Diagnostic {
        code: Some(NumberOrString::String("fill_struct".into())),
        ..diagnostic(&ws, "Point{}", "Point literal omits fields")
    };
    let mut request = ws.request();
    request.diagnostics = vec![incomplete.clone()];
    request.only = Some(vec![CodeActionKind::QUICKFIX]);
    let response = ws.actions(&request);
    let action = response
        .actions
        .iter()
        .find(|a| a.title == "Fill Point")
        .expect("fill action");
    assert_eq!(action.diagnostics, Some(vec![incomplete]));
}

#[test]
fn checker_errors_become_diagnostics() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f() {
	/*cursor*/fmt.Println("hi")
}
"#,
    );
    let file = FileId::new("/ws/p/a.go");
    let (view, parsed) = ws.snapshot.package_for_file(&ws.cx, &file).unwrap();
    let diagnostics = file_diagnostics(&view, &parsed);
    let undefined = diagnostics
        .iter()
        .find(|d| d.message == "undefined: fmt")
        .expect("undefined diagnostic");
    assert_eq!(undefined.range, ws.range_of("/ws/p/a.go", "fmt"));
    assert_eq!(undefined.source.as_deref(), Some("vega"));
}
