use lsp_types::CodeActionKind;
use pretty_assertions::assert_eq;
use vega_ide::{code_actions, kinds, CodeActionError, Trigger};

use super::harness::workspace;

const EXTRACT: &str = r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	return /*start*/x * 2/*end*/ + 1
}
"#;

const INLINE: &str = r#"
-- /ws/p/a.go --
package p

func add(a, b int) int {
	return a + b
}

func f() int {
	return /*cursor*/add(1, 2) * 3
}
"#;

#[test]
fn extract_variable_is_resolved_on_demand() {
    let ws = workspace(EXTRACT);
    let action = ws.action(&ws.request(), "Extract variable");
    assert_eq!(action.kind, Some(CodeActionKind::from(kinds::EXTRACT_VARIABLE)));
    assert!(action.edit.is_none());
    assert!(action.data.is_some());

    let resolved = ws.resolve(action);
    assert!(resolved.data.is_none());
    let edit = resolved.edit.expect("resolved edit");
    assert_eq!(
        ws.after(&edit, "/ws/p/a.go"),
        "package p\n\nfunc f(x int) int {\n\tnewVar := x * 2\n\treturn newVar + 1\n}\n"
    );
}

#[test]
fn clients_without_resolve_get_commands() {
    let mut ws = workspace(EXTRACT);
    ws.capabilities.resolve_support = false;
    let action = ws.action(&ws.request(), "Extract variable");
    assert!(action.data.is_none());
    let command = action.command.expect("command");
    assert_eq!(command.command, vega_ide::command::APPLY_FIX);
    assert_eq!(command.arguments.map(|args| args.len()), Some(1));
}

#[test]
fn only_runs_the_requested_producers() {
    let ws = workspace(EXTRACT);
    let mut request = ws.request();
    request.only = Some(vec![CodeActionKind::REFACTOR_INLINE]);
    let response = ws.actions(&request);
    assert_eq!(response.producers_run, vec!["inline_call", "inline_variable"]);
    assert!(response
        .actions
        .iter()
        .all(|a| a.kind.as_ref().is_some_and(|k| k.as_str().starts_with("refactor.inline"))));

    request.only = Some(vec![CodeActionKind::REFACTOR_EXTRACT]);
    let response = ws.actions(&request);
    assert!(!response.producers_run.contains(&"inline_call"));
    assert!(response.producers_run.contains(&"extract_variable"));
    assert!(response.actions.iter().any(|a| a.title == "Extract variable"));
}

#[test]
fn disabled_kinds_are_never_produced() {
    let mut ws = workspace(EXTRACT);
    ws.config.code_actions.disabled_kinds = vec!["refactor.extract".to_string()];
    let response = ws.actions(&ws.request());
    assert!(!response.producers_run.iter().any(|p| p.starts_with("extract_")));
    assert!(response.actions.iter().all(|a| !a.title.starts_with("Extract")));
}

#[test]
fn inline_call_is_quiet_on_cursor_motion() {
    let mut ws = workspace(INLINE);
    let mut request = ws.request();
    assert!(ws.actions(&request).actions.iter().any(|a| a.title == "Inline call of add"));

    request.trigger = Trigger::Automatic;
    let response = ws.actions(&request);
    assert!(!response.producers_run.contains(&"inline_call"));
    assert!(response
        .actions
        .iter()
        .all(|a| a.kind != Some(CodeActionKind::from(kinds::INLINE_CALL))));

    ws.config.code_actions.inline_call_on_cursor = true;
    assert!(ws.actions(&request).actions.iter().any(|a| a.title == "Inline call of add"));
}

#[test]
fn inline_call_resolves_to_the_substituted_body() {
    let ws = workspace(INLINE);
    let action = ws.action(&ws.request(), "Inline call of add");
    let edit = ws.resolve(action).edit.expect("resolved edit");
    assert!(ws.after(&edit, "/ws/p/a.go").contains("\treturn (1 + 2) * 3\n"));
}

#[test]
fn actions_are_sorted_by_kind_and_deterministic() {
    let ws = workspace(EXTRACT);
    let first = ws.actions(&ws.request());
    let kinds: Vec<String> = first
        .actions
        .iter()
        .map(|a| a.kind.as_ref().map(|k| k.as_str().to_string()).unwrap_or_default())
        .collect();
    let mut sorted = kinds.clone();
    sorted.sort();
    assert_eq!(kinds, sorted);
    assert_eq!(ws.actions(&ws.request()), first);
}

#[test]
fn cancelled_requests_return_nothing() {
    let ws = workspace(EXTRACT);
    ws.cx.token().cancel();
    let result = code_actions(&ws.snapshot, &ws.cx, &ws.config, ws.capabilities, &ws.request());
    assert_eq!(result, Err(CodeActionError::Cancelled));
}

#[test]
fn string_literals_offer_a_quote_change() {
    let ws = workspace("-- /ws/p/a.go --\npackage p\n\nvar s = /*cursor*/\"hello\"\n");
    let action = ws.action(&ws.request(), "Convert to raw string literal");
    assert_eq!(action.kind, Some(CodeActionKind::from(kinds::CHANGE_QUOTE)));
    let edit = ws.resolve(action).edit.expect("resolved edit");
    assert_eq!(ws.after(&edit, "/ws/p/a.go"), "package p\n\nvar s = `hello`\n");
}

#[test]
fn invert_if_is_offered_on_the_condition() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func A() {}
func B() {}

func f(x int) {
	if /*cursor*/x > 0 {
		A()
	} else {
		B()
	}
}
"#,
    );
    let action = ws.action(&ws.request(), "Invert if condition");
    let edit = ws.resolve(action).edit.expect("resolved edit");
    let text = ws.after(&edit, "/ws/p/a.go");
    assert!(text.contains("\tif x <= 0 {\n\t\tB()\n\t} else {\n\t\tA()\n\t}\n"), "{text}");
}

#[test]
fn unused_parameters_can_be_removed() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func F(a, /*cursor*/b, c int) int {
	return a + c
}
-- /ws/p/b.go --
package p

func g() int {
	return F(1, 2, 3)
}
"#,
    );
    let request = ws.request();
    let titles: Vec<String> = ws.actions(&request).actions.into_iter().map(|a| a.title).collect();
    assert!(titles.contains(&"Move parameter b left".to_string()), "{titles:?}");
    assert!(titles.contains(&"Move parameter b right".to_string()), "{titles:?}");

    let action = ws.action(&request, "Remove unused parameter b");
    assert_eq!(action.kind, Some(CodeActionKind::from(kinds::REMOVE_UNUSED_PARAM)));
    let edit = ws.resolve(action).edit.expect("resolved edit");
    assert!(ws.after(&edit, "/ws/p/a.go").contains("func F(a, c int) int {"));
    assert!(ws.after(&edit, "/ws/p/b.go").contains("return F(1, 3)"));
}

#[test]
fn add_test_needs_document_changes() {
    let files = r#"
-- /ws/p/a.go --
package p

func /*cursor*/Parse(s string) (int, error) {
	return len(s), nil
}
"#;
    let ws = workspace(files);
    let action = ws.action(&ws.request(), "Add test");
    let edit = ws.resolve(action).edit.expect("resolved edit");
    let text = ws.after(&edit, "/ws/p/a_test.go");
    assert!(text.starts_with("package p\n\nimport \"testing\"\n\nfunc TestParse(t *testing.T) {\n"), "{text}");

    let mut ws = workspace(files);
    ws.capabilities.document_changes = false;
    let response = ws.actions(&ws.request());
    assert!(response.actions.iter().all(|a| a.title != "Add test"));
}

#[test]
fn run_tests_lists_the_selected_tests() {
    let ws = workspace(
        r#"
-- /ws/p/a_test.go --
package p

import "testing"

func TestA(t *testing.T) {}

func /*cursor*/BenchmarkB(b *testing.B) {}
"#,
    );
    let mut request = ws.request();
    request.only = Some(vec![CodeActionKind::from(kinds::SOURCE_TEST)]);
    let response = ws.actions(&request);
    assert_eq!(response.producers_run, vec!["run_tests"]);
    let [action] = response.actions.as_slice() else {
        panic!("expected one action: {:?}", response.actions);
    };
    assert_eq!(action.title, "Run benchmarks");
    let command = action.command.as_ref().expect("command");
    assert_eq!(command.command, vega_ide::command::RUN_TESTS);
    let args = command.arguments.as_ref().expect("arguments");
    assert_eq!(args[0]["benchmarks"], serde_json::json!(["BenchmarkB"]));
    assert_eq!(args[0]["tests"], serde_json::json!([]));
}

#[test]
fn broken_packages_offer_no_signature_changes() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func F(a, /*cursor*/b, c int) error {
	_ = a + c + missing
	return nil
}
"#,
    );
    let response = ws.actions(&ws.request());
    assert!(!response.producers_run.is_empty());
    assert!(response
        .actions
        .iter()
        .all(|a| !a.title.contains("parameter b")), "{:?}", response.actions);
}
