use lsp_types::{CodeAction, ExecuteCommandParams};
use pretty_assertions::assert_eq;
use serde_json::json;
use vega_ide::{execute_command, resolve_code_action, CodeActionError, CommandArgs, CommandOutcome};

use super::harness::{uri, workspace, Workspace};

const EXTRACT: &str = r#"
-- /ws/p/a.go --
package p

func f(x int) int {
	return /*start*/x * 2/*end*/ + 1
}
"#;

fn execute(ws: &Workspace, command: &str, arguments: Vec<serde_json::Value>) -> anyhow::Result<CommandOutcome> {
    let params = ExecuteCommandParams {
        command: command.to_string(),
        arguments,
        work_done_progress_params: Default::default(),
    };
    execute_command(&ws.snapshot, &ws.cx, &ws.config, ws.capabilities, &params)
}

#[test]
fn commands_and_resolution_agree() {
    let mut ws = workspace(EXTRACT);
    let resolved = ws.resolve(ws.action(&ws.request(), "Extract variable"));

    ws.capabilities.resolve_support = false;
    let command = ws.action(&ws.request(), "Extract variable").command.expect("command");
    let outcome = execute(&ws, &command.command, command.arguments.unwrap_or_default()).unwrap();
    assert_eq!(outcome, CommandOutcome::Edit(resolved.edit.expect("resolved edit")));
}

#[test]
fn run_tests_is_handed_back_to_the_client() {
    let ws = workspace(EXTRACT);
    let args = CommandArgs::RunTests {
        uri: uri("/ws/p/a_test.go"),
        tests: vec!["TestA".into()],
        benchmarks: Vec::new(),
    };
    let outcome = execute(&ws, args.command_id(), vec![args.to_value().unwrap()]).unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Tests {
            uri: uri("/ws/p/a_test.go"),
            tests: vec!["TestA".into()],
            benchmarks: Vec::new(),
        }
    );
}

#[test]
fn unknown_commands_are_errors() {
    let ws = workspace(EXTRACT);
    let err = execute(&ws, "vega.frobnicate", vec![json!({})]).unwrap_err();
    assert!(err.to_string().contains("vega.frobnicate"), "{err:#}");
}

#[test]
fn refused_fixes_are_reported() {
    let ws = workspace(EXTRACT);
    let args = CommandArgs::ApplyFix {
        fix: "invert_if_condition".into(),
        uri: uri("/ws/p/a.go"),
        range: ws.range_of("/ws/p/a.go", "x * 2"),
    };
    let err = execute(&ws, args.command_id(), vec![args.to_value().unwrap()]).unwrap_err();
    let cause = err.downcast_ref::<CodeActionError>().expect("code action error");
    assert!(cause.is_refusal(), "{cause:?}");
}

#[test]
fn actions_without_data_resolve_unchanged() {
    let ws = workspace(EXTRACT);
    let action = CodeAction {
        title: "Nothing".into(),
        ..CodeAction::default()
    };
    let resolved = resolve_code_action(&ws.snapshot, &ws.cx, &ws.config, ws.capabilities, action.clone()).unwrap();
    assert_eq!(resolved, action);
}

#[test]
fn malformed_data_is_rejected() {
    let ws = workspace(EXTRACT);
    let action = CodeAction {
        title: "Broken".into(),
        data: Some(json!({ "type": "applyFix" })),
        ..CodeAction::default()
    };
    let err = resolve_code_action(&ws.snapshot, &ws.cx, &ws.config, ws.capabilities, action).unwrap_err();
    assert!(matches!(err, CodeActionError::InvalidData(_)), "{err:?}");
}
