use pretty_assertions::assert_eq;
use vega_refactor::probe_stub_methods;

use super::harness::workspace;

#[test]
fn interface_conversion_stubs_the_missing_methods() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type Reader interface {
	Read(p []byte) (int, error)
}

type myType struct{}

var _ Reader = /*cursor*/myType{}
"#,
    );
    assert!(ws.at_selection(|input| probe_stub_methods(&input.file_input())).unwrap());
    let fix = ws.fix("stub_methods").unwrap().unwrap();
    assert_eq!(fix.message, "Declare missing methods of Reader");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(
        text.contains(
            "type myType struct{}\n\nfunc (m myType) Read(p []byte) (int, error) {\n\tpanic(\"unimplemented\")\n}\n"
        ),
        "{text}"
    );
}

#[test]
fn existing_methods_choose_the_receiver() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

import "io"

type buf struct{}

func (b *buf) Close() error { return nil }

var _ io.ReadCloser = /*cursor*/&buf{}
"#,
    );
    let fix = ws.fix("stub_methods").unwrap().unwrap();
    assert_eq!(fix.message, "Declare missing methods of io.ReadCloser");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("func (b *buf) Read(p []byte) (n int, err error) {"), "{text}");
    assert_eq!(text.matches("Close()").count(), 1, "{text}");
}

#[test]
fn implemented_interfaces_offer_nothing() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type Namer interface{ Name() string }

type T struct{}

func (T) Name() string { return "t" }

var _ Namer = /*cursor*/T{}
"#,
    );
    assert!(!ws.at_selection(|input| probe_stub_methods(&input.file_input())).unwrap());
    assert!(ws.fix("stub_methods").unwrap().is_none());
}

#[test]
fn standard_library_types_are_refused() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

import "strings"

type Closer interface{ Close() error }

var _ Closer = /*cursor*/strings.Builder{}
"#,
    );
    assert!(ws.fix("stub_methods").unwrap_err().is_refusal());
}

#[test]
fn a_called_method_is_declared_on_its_receiver() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type T struct{}

func f(t T) {
	t./*cursor*/Run(1)
}
"#,
    );
    let fix = ws.fix("missing_method").unwrap().unwrap();
    assert_eq!(fix.message, "Declare missing method T.Run");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(
        text.contains("type T struct{}\n\nfunc (t *T) Run(i int) {\n\tpanic(\"unimplemented\")\n}\n"),
        "{text}"
    );
}

#[test]
fn an_undeclared_function_is_created_from_its_call() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(name string) int {
	return /*cursor*/count(name, 2)
}
"#,
    );
    let fix = ws.fix("undeclared_name").unwrap().unwrap();
    assert_eq!(fix.message, "Create function count");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(
        text.ends_with("}\n\nfunc count(name string, i int) int {\n\tpanic(\"unimplemented\")\n}\n"),
        "{text}"
    );
}
