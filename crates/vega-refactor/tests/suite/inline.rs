use pretty_assertions::assert_eq;
use vega_refactor::{guarded_inline, probe_inline_call, InlineRequest, Inliner, RefactorError};

use super::harness::workspace;

#[test]
fn a_variable_use_takes_its_initializer() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	y := x + 1
	return /*cursor*/y * 2
}
"#,
    );
    let fix = ws.fix("inline_variable").unwrap().unwrap();
    assert_eq!(fix.message, "Inline variable y");
    assert!(ws.after(&fix, "/ws/p/a.go").contains("\treturn (x + 1) * 2\n"));
}

#[test]
fn reassigned_variables_are_not_inlined() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	y := x + 1
	y++
	return /*cursor*/y
}
"#,
    );
    assert!(ws.fix("inline_variable").unwrap_err().is_refusal());
}

#[test]
fn shadowed_initializer_names_are_refused() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	y := x
	{
		x := 2
		return /*cursor*/y + x
	}
}
"#,
    );
    assert!(ws.fix("inline_variable").unwrap_err().is_refusal());
}

#[test]
fn a_call_with_literal_arguments_becomes_the_returned_expression() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func add(a, b int) int {
	return a + b
}

func f() int {
	return /*cursor*/add(1, 2) * 3
}
"#,
    );
    assert!(ws.at_selection(probe_inline_call).unwrap());
    let fix = ws.fix("inline_call").unwrap().unwrap();
    assert_eq!(fix.message, "Inline call of add");
    assert!(ws.after(&fix, "/ws/p/a.go").contains("\treturn (1 + 2) * 3\n"));
}

#[test]
fn standard_library_calls_are_not_offered() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

import "strings"

func f() string {
	return /*cursor*/strings.ToUpper("x")
}
"#,
    );
    assert!(!ws.at_selection(probe_inline_call).unwrap());
}

#[test]
fn packages_with_errors_are_not_inlined() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func id(a int) int { return a }

func f() int {
	return /*cursor*/id(1) + undefinedName
}
"#,
    );
    assert!(!ws.at_selection(probe_inline_call).unwrap());
    assert!(ws.fix("inline_call").unwrap_err().is_refusal());
}

struct Panicking;

impl Inliner for Panicking {
    fn inline(&self, _: &InlineRequest<'_>) -> Result<Vec<vega_refactor::Edit>, RefactorError> {
        panic!("boom")
    }
}

#[test]
fn inliner_panics_become_errors() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func id(a int) int { return a }

func f() int {
	return /*cursor*/id(1)
}
"#,
    );
    let err = ws.at_selection(|input| {
        let program = input.program();
        let call = vega_refactor::enclosing_static_call(
            program,
            input.file,
            input.file.offset(input.start).unwrap(),
            input.file.offset(input.end).unwrap(),
        )
        .unwrap();
        let decl_file = program.decl_file(call.callee).unwrap();
        let request = InlineRequest {
            program,
            caller: &**input.file,
            caller_pkg: input.view.id(),
            call: call.call,
            callee_file: &**decl_file,
            callee_decl: program.obj(call.callee).decl.map(|key| key.node).unwrap(),
            callee: call.callee,
        };
        guarded_inline(&Panicking, &request).unwrap_err()
    });
    assert!(matches!(err, RefactorError::Bug(ref message) if message.contains("boom")), "{err}");
}
