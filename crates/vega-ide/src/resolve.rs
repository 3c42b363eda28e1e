//! `codeAction/resolve` and `workspace/executeCommand`.

use anyhow::Context;
use lsp_types::{CodeAction, ExecuteCommandParams, Uri, WorkspaceEdit as LspWorkspaceEdit};
use vega_config::VegaConfig;
use vega_db::Snapshot;
use vega_refactor::{add_test, apply_fix, change_signature, range_pos, AddTestOptions, PackageInput, RefactorError};
use vega_scheduler::RequestContext;

use crate::code_action::{workspace_edit, ClientCapabilities};
use crate::command::CommandArgs;
use crate::CodeActionError;

/// The result of running a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// An edit for the client to apply with `workspace/applyEdit`.
    Edit(LspWorkspaceEdit),
    /// Tests for the client to run.
    Tests {
        uri: Uri,
        tests: Vec<String>,
        benchmarks: Vec<String>,
    },
}

/// Compute the edit of a command-style action.
pub fn command_edit(
    snapshot: &Snapshot,
    cx: &RequestContext,
    config: &VegaConfig,
    capabilities: ClientCapabilities,
    args: &CommandArgs,
) -> Result<LspWorkspaceEdit, CodeActionError> {
    let file = args.file()?;
    let range = match args {
        CommandArgs::ApplyFix { range, .. }
        | CommandArgs::ChangeSignature { range, .. }
        | CommandArgs::AddTest { range, .. } => *range,
        CommandArgs::RunTests { .. } => {
            return Err(CodeActionError::InvalidData("running tests has no edit".into()));
        }
    };
    let _span = tracing::debug_span!(target: "vega.ide", "command_edit", command = args.command_id(), file = %file)
        .entered();
    let (view, parsed) = snapshot.package_for_file(cx, &file)?;
    let (start, end) = range_pos(&parsed, range.into())?;
    let input = PackageInput::new(snapshot, cx, view, &parsed, start, end);

    let fix = match args {
        CommandArgs::ApplyFix { fix, .. } => apply_fix(fix, &input)?,
        CommandArgs::ChangeSignature { change, .. } => change_signature(&input, *change)?,
        CommandArgs::AddTest { .. } => {
            let options = AddTestOptions {
                prefer_constructor: config.add_test.prefer_constructor,
            };
            add_test(&input, options)?
        }
        CommandArgs::RunTests { .. } => None,
    };
    let fix = fix.ok_or_else(|| RefactorError::Structural("nothing to change at the selection".into()))?;
    workspace_edit(snapshot, cx, capabilities, &fix)
}

/// Fill in the `edit` of an action returned with `data`.
///
/// Actions without `data` are returned unchanged.
pub fn resolve_code_action(
    snapshot: &Snapshot,
    cx: &RequestContext,
    config: &VegaConfig,
    capabilities: ClientCapabilities,
    mut action: CodeAction,
) -> Result<CodeAction, CodeActionError> {
    let Some(data) = action.data.take() else {
        return Ok(action);
    };
    let args = CommandArgs::from_value(data)?;
    action.edit = Some(command_edit(snapshot, cx, config, capabilities, &args)?);
    Ok(action)
}

/// Run a `workspace/executeCommand` request.
pub fn execute_command(
    snapshot: &Snapshot,
    cx: &RequestContext,
    config: &VegaConfig,
    capabilities: ClientCapabilities,
    params: &ExecuteCommandParams,
) -> anyhow::Result<CommandOutcome> {
    let args = CommandArgs::from_command(&params.command, &params.arguments)
        .with_context(|| format!("invalid arguments for {}", params.command))?;
    tracing::debug!(target: "vega.ide", command = %params.command, "executing command");
    match args {
        CommandArgs::RunTests {
            uri,
            tests,
            benchmarks,
        } => Ok(CommandOutcome::Tests {
            uri,
            tests,
            benchmarks,
        }),
        args => {
            let edit = command_edit(snapshot, cx, config, capabilities, &args)
                .with_context(|| format!("{} failed", params.command))?;
            Ok(CommandOutcome::Edit(edit))
        }
    }
}
