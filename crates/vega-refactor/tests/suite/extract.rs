use pretty_assertions::assert_eq;

use super::harness::workspace;

#[test]
fn extract_variable_binds_the_selection_above_its_statement() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	return /*start*/x * 2/*end*/ + 1
}
"#,
    );
    let fix = ws.fix("extract_variable").unwrap().unwrap();
    assert_eq!(fix.message, "Extract variable");
    assert_eq!(
        ws.after(&fix, "/ws/p/a.go"),
        "package p\n\nfunc f(x int) int {\n\tnewVar := x * 2\n\treturn newVar + 1\n}\n"
    );
}

#[test]
fn extracted_names_avoid_visible_ones() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	newVar := 3
	return /*start*/x * 2/*end*/ + newVar
}
"#,
    );
    let fix = ws.fix("extract_variable").unwrap().unwrap();
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\tnewVar1 := x * 2\n"), "{text}");
    assert!(text.contains("return newVar1 + newVar"), "{text}");
}

#[test]
fn constant_expressions_extract_as_constants() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f() int {
	return /*start*/60 * 60/*end*/
}
"#,
    );
    let probe = ws
        .at_selection(|input| vega_refactor::probe_extract_variable(&input.file_input()))
        .unwrap();
    assert!(probe.constant);
    assert_eq!(probe.occurrences, 1);

    let fix = ws.fix("extract_variable").unwrap().unwrap();
    assert_eq!(fix.message, "Extract constant");
    assert!(ws.after(&fix, "/ws/p/a.go").contains("\tconst newConst = 60 * 60\n\treturn newConst\n"));
}

#[test]
fn all_occurrences_are_replaced_together() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(s []int) int {
	a := /*start*/len(s)/*end*/ + 1
	b := len(s) - 1
	return a * b
}
"#,
    );
    let probe = ws
        .at_selection(|input| vega_refactor::probe_extract_variable(&input.file_input()))
        .unwrap();
    assert_eq!(probe.occurrences, 2);

    let fix = ws.fix("extract_variable_all").unwrap().unwrap();
    assert_eq!(fix.message, "Extract 2 occurrences of len(s)");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\tnewVar := len(s)\n\ta := newVar + 1\n\tb := newVar - 1\n"), "{text}");
}

#[test]
fn extraction_refuses_a_statement_selection() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f() {
	/*start*/println(1)/*end*/
}
"#,
    );
    let err = ws.fix("extract_variable").unwrap_err();
    assert!(err.is_refusal(), "{err}");
}

#[test]
fn extract_function_passes_free_variables() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) {
	/*start*/y := x + 1
	println(y)/*end*/
}
"#,
    );
    let fix = ws.fix("extract_function").unwrap().unwrap();
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\tnewFunction(x)\n"), "{text}");
    assert!(text.contains("func newFunction(x int) {\n\ty := x + 1\n\tprintln(y)\n}"), "{text}");
}

#[test]
fn extract_function_refuses_partial_statements() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) {
	y := /*start*/x + 1
	println(y)/*end*/
}
"#,
    );
    assert!(ws.fix("extract_function").unwrap_err().is_refusal());
}

#[test]
fn extract_to_new_file_moves_the_declaration() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

import "fmt"

/*start*/func Hello() {
	fmt.Println("hi")
}/*end*/

func other() {}
"#,
    );
    let fix = ws.fix("extract_to_new_file").unwrap().unwrap();
    assert!(fix.creates_files());
    let files = ws.apply(&fix);
    let (_, created) = files
        .iter()
        .find(|(f, _)| f.as_str() == "/ws/p/hello.go")
        .expect("new file");
    assert!(created.starts_with("package p\n"), "{created}");
    assert!(created.contains("\"fmt\""), "{created}");
    assert!(created.contains("func Hello() {\n\tfmt.Println(\"hi\")\n}"), "{created}");
    let old = ws.after(&fix, "/ws/p/a.go");
    assert!(!old.contains("func Hello"), "{old}");
    assert!(old.contains("func other() {}"), "{old}");
}

#[test]
fn extract_method_forwards_the_receiver() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type T struct{ n int }

func (t *T) add(x int) {
	/*start*/t.n += x
	println(t.n)/*end*/
}
"#,
    );
    let as_method = ws
        .at_selection(|input| vega_refactor::probe_extract_function(&input.file_input()))
        .unwrap();
    assert!(as_method);

    let fix = ws.fix("extract_method").unwrap().unwrap();
    assert_eq!(fix.message, "Extract method");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("func (t *T) add(x int) {\n\tt.newMethod(x)\n}"), "{text}");
    assert!(
        text.contains("func (t *T) newMethod(x int) {\n\tt.n += x\n\tprintln(t.n)\n}"),
        "{text}"
    );

    let fix = ws.fix("extract_function").unwrap().unwrap();
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\tnewFunction(t, x)\n"), "{text}");
    assert!(text.contains("func newFunction(t *T, x int) {"), "{text}");
}

#[test]
fn a_trailing_return_is_returned_from_the_call() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	y := x + 1
	/*start*/z := y * 2
	return z/*end*/
}
"#,
    );
    let fix = ws.fix("extract_function").unwrap().unwrap();
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\ty := x + 1\n\treturn newFunction(y)\n}"), "{text}");
    assert!(
        text.contains("func newFunction(y int) int {\n\tz := y * 2\n\treturn z\n}"),
        "{text}"
    );
}

#[test]
fn nested_returns_go_through_a_flag() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	/*start*/if x < 0 {
		return -1
	}
	println(x)/*end*/
	return x
}
"#,
    );
    let fix = ws.fix("extract_function").unwrap().unwrap();
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(
        text.contains(
            "\tret, shouldReturn := newFunction(x)\n\tif shouldReturn {\n\t\treturn ret\n\t}\n\treturn x\n}"
        ),
        "{text}"
    );
    assert!(
        text.contains(
            "func newFunction(x int) (int, bool) {\n\tif x < 0 {\n\t\treturn -1, true\n\t}\n\tprintln(x)\n\treturn 0, false\n}"
        ),
        "{text}"
    );
}

#[test]
fn contexts_lead_the_extracted_parameters() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

import "context"

func f(n int, ctx context.Context) {
	/*start*/println(n)
	_ = ctx.Err()/*end*/
}
"#,
    );
    let fix = ws.fix("extract_function").unwrap().unwrap();
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\tnewFunction(ctx, n)\n"), "{text}");
    assert!(text.contains("func newFunction(ctx context.Context, n int) {"), "{text}");
}

#[test]
fn testing_handles_lead_the_extracted_parameters() {
    let ws = workspace(
        r#"
-- /ws/p/a_test.go --
package p

import "testing"

func TestF(t *testing.T) {
	want := 2
	/*start*/if got := 1 + 1; got != want {
		t.Fatalf("got %d", got)
	}/*end*/
}
"#,
    );
    let fix = ws.fix("extract_function").unwrap().unwrap();
    let text = ws.after(&fix, "/ws/p/a_test.go");
    assert!(text.contains("\tnewFunction(t, want)\n"), "{text}");
    assert!(text.contains("func newFunction(t *testing.T, want int) {"), "{text}");
}

#[test]
fn extract_interface_lists_the_called_methods_above_the_doc_comment() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type Store struct{}

func (s *Store) Get(key string) (int, error) { return 0, nil }
func (s *Store) Put(key string, v int) {}
func (s *Store) Close() {}

// Service uses a store.
type Service struct {
	d/*cursor*/b *Store
}

func (s *Service) Load() (int, error) {
	s.db.Put("a", 1)
	return s.db.Get("a")
}
"#,
    );
    assert!(ws
        .at_selection(|input| vega_refactor::probe_extract_interface(&input.file_input()))
        .unwrap());

    let fix = ws.fix("extract_interface").unwrap().unwrap();
    assert_eq!(fix.message, "Extract interface DbInterface for db");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(
        text.contains(
            "type DbInterface interface {\n\tGet(key string) (int, error)\n\tPut(key string, v int)\n}\n\n// Service uses a store.\ntype Service struct {\n\tdb DbInterface\n}"
        ),
        "{text}"
    );
    assert!(!text.contains("\tClose()\n"), "{text}");
}

#[test]
fn new_files_avoid_taken_names_and_keep_the_header() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
// Copyright 2024 The Authors.

//go:build linux

package p

/*start*/func Hello() {}/*end*/

func other() {}
-- /ws/p/hello.go --
package p

func greet() {}
"#,
    );
    let fix = ws.fix("extract_to_new_file").unwrap().unwrap();
    assert_eq!(fix.message, "Extract declarations to new file hello.1.go");
    let files = ws.apply(&fix);
    let (_, created) = files
        .iter()
        .find(|(f, _)| f.as_str() == "/ws/p/hello.1.go")
        .expect("new file");
    assert_eq!(
        created,
        "// Copyright 2024 The Authors.\n\n//go:build linux\n\npackage p\n\nfunc Hello() {}\n"
    );
    assert_eq!(ws.after(&fix, "/ws/p/hello.go"), "package p\n\nfunc greet() {}\n");
}
