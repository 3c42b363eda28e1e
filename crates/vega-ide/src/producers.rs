//! The fixed table of code-action producers.

use lsp_types::{CodeAction, Diagnostic};
use vega_core::TextRange;
use vega_refactor::imports::{import_quick_fixes, organize_imports};
use vega_refactor::{
    apply_fix, enclosing_static_call, probe_add_test, probe_change_signature, probe_extract_function,
    probe_extract_interface, probe_extract_variable, probe_fill_struct, probe_fill_switch, probe_inline_call,
    probe_inline_variable, probe_invert_if, probe_lines, probe_string_literal, selected_decls, Quoting,
    SignatureChange,
};

use crate::code_action::{outcome, Request};
use crate::command::CommandArgs;
use crate::diagnostics::analyzer_fix;
use crate::kinds::*;
use crate::test_discovery::tests_in_range;
use crate::CodeActionError;

type Run = fn(&Request<'_>, &mut Vec<CodeAction>) -> Result<(), CodeActionError>;

pub(crate) struct Producer {
    pub name: &'static str,
    /// Kinds the producer may emit; it runs when any of them is enabled.
    pub kinds: &'static [&'static str],
    pub needs_types: bool,
    /// Suppressed for automatic requests on an empty selection.
    pub distracting: bool,
    pub run: Run,
}

const fn producer(name: &'static str, kinds: &'static [&'static str], run: Run) -> Producer {
    Producer {
        name,
        kinds,
        needs_types: true,
        distracting: false,
        run,
    }
}

pub(crate) const PRODUCERS: &[Producer] = &[
    producer("import_fixes", &[QUICKFIX], import_fixes),
    producer("analyzer_fixes", &[QUICKFIX], analyzer_fixes),
    producer("organize_imports", &[SOURCE_ORGANIZE_IMPORTS], organize),
    producer(
        "extract_variable",
        &[EXTRACT_VARIABLE, EXTRACT_VARIABLE_ALL, EXTRACT_CONSTANT, EXTRACT_CONSTANT_ALL],
        extract_variable,
    ),
    producer("extract_function", &[EXTRACT_FUNCTION, EXTRACT_METHOD], extract_function),
    producer("extract_to_new_file", &[EXTRACT_TO_NEW_FILE], extract_to_new_file),
    producer("extract_interface", &[EXTRACT_INTERFACE], extract_interface),
    Producer {
        distracting: true,
        ..producer("inline_call", &[INLINE_CALL], inline_call)
    },
    producer("inline_variable", &[INLINE_VARIABLE], inline_variable),
    producer(
        "change_signature",
        &[REMOVE_UNUSED_PARAM, MOVE_PARAM_LEFT, MOVE_PARAM_RIGHT],
        change_signature,
    ),
    producer("invert_if", &[INVERT_IF], invert_if),
    producer("lines", &[SPLIT_LINES, JOIN_LINES], lines),
    producer("string_literal", &[CHANGE_QUOTE], string_literal),
    producer("fill", &[FILL_STRUCT, FILL_SWITCH], fill),
    producer("add_test", &[SOURCE_ADD_TEST], add_test),
    Producer {
        needs_types: false,
        ..producer("run_tests", &[SOURCE_TEST], run_tests)
    },
];

/// "Add import" and friends, offered only for the diagnostics they resolve.
fn import_fixes(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    if req.diagnostics().is_empty() {
        return Ok(());
    }
    let Some(input) = req.input() else {
        return Ok(());
    };
    let fixes = outcome("import_fixes", import_quick_fixes(&input.view, input.file, req.import_resolver()))?;
    for (fix, suggested) in fixes.unwrap_or_default() {
        let claimed: Vec<Diagnostic> = req
            .diagnostics()
            .iter()
            .filter(|d| fix.resolves(&d.message))
            .cloned()
            .collect();
        if claimed.is_empty() {
            continue;
        }
        if let Some(action) = req.edit_action(fix.title(), QUICKFIX, &suggested, claimed)? {
            out.push(action);
        }
    }
    Ok(())
}

/// Fixes of analyzer categories, run at each claimed diagnostic's range.
fn analyzer_fixes(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    for diagnostic in req.diagnostics() {
        let Some(name) = analyzer_fix(diagnostic) else {
            continue;
        };
        let Some(input) = outcome(name, req.input_at(diagnostic.range.into()))?.flatten() else {
            continue;
        };
        let Some(fix) = outcome(name, apply_fix(name, &input))?.flatten() else {
            continue;
        };
        if let Some(existing) = out.iter_mut().find(|a| a.title == fix.message) {
            existing.diagnostics.get_or_insert_with(Vec::new).push(diagnostic.clone());
            continue;
        }
        if let Some(action) = req.edit_action(fix.message.clone(), QUICKFIX, &fix, vec![diagnostic.clone()])? {
            out.push(action);
        }
    }
    Ok(())
}

fn organize(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    let fix = outcome("organize_imports", organize_imports(&input.view, input.file, req.import_resolver()))?;
    if let Some(fix) = fix.flatten() {
        if let Some(action) = req.edit_action("Organize imports", SOURCE_ORGANIZE_IMPORTS, &fix, Vec::new())? {
            out.push(action);
        }
    }
    Ok(())
}

fn extract_variable(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    let Some(probe) = outcome("extract_variable", probe_extract_variable(&input.file_input()))? else {
        return Ok(());
    };
    let (one, all, what) = if probe.constant {
        (EXTRACT_CONSTANT, EXTRACT_CONSTANT_ALL, "constant")
    } else {
        (EXTRACT_VARIABLE, EXTRACT_VARIABLE_ALL, "variable")
    };
    if req.enabled(one) {
        out.push(req.fix_action(format!("Extract {what}"), one, "extract_variable")?);
    }
    if probe.occurrences > 1 && req.enabled(all) {
        let title = format!("Extract all {} occurrences as a {what}", probe.occurrences);
        out.push(req.fix_action(title, all, "extract_variable_all")?);
    }
    Ok(())
}

fn extract_function(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    let Some(can_be_method) = outcome("extract_function", probe_extract_function(&input.file_input()))? else {
        return Ok(());
    };
    if req.enabled(EXTRACT_FUNCTION) {
        out.push(req.fix_action("Extract function", EXTRACT_FUNCTION, "extract_function")?);
    }
    if can_be_method && req.enabled(EXTRACT_METHOD) {
        out.push(req.fix_action("Extract method", EXTRACT_METHOD, "extract_method")?);
    }
    Ok(())
}

fn extract_to_new_file(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    if !req.capabilities.document_changes {
        return Ok(());
    }
    let Some(input) = req.input() else {
        return Ok(());
    };
    let file = input.file;
    let (Some(start), Some(end)) = (file.offset(input.start), file.offset(input.end)) else {
        return Ok(());
    };
    let decls = outcome("extract_to_new_file", selected_decls(file, start, end))?;
    if decls.is_some_and(|d| !d.is_empty()) {
        out.push(req.fix_action(
            "Extract declarations to new file",
            EXTRACT_TO_NEW_FILE,
            "extract_to_new_file",
        )?);
    }
    Ok(())
}

fn extract_interface(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    if outcome("extract_interface", probe_extract_interface(&input.file_input()))? == Some(true) {
        out.push(req.fix_action("Extract interface", EXTRACT_INTERFACE, "extract_interface")?);
    }
    Ok(())
}

fn inline_call(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    if outcome("inline_call", probe_inline_call(&input))? != Some(true) {
        return Ok(());
    }
    let file = input.file;
    let program = input.program();
    let title = match (file.offset(input.start), file.offset(input.end)) {
        (Some(start), Some(end)) => match enclosing_static_call(program, file, start, end) {
            Ok(call) => format!("Inline call of {}", program.obj(call.callee).name),
            Err(_) => "Inline call".to_string(),
        },
        _ => "Inline call".to_string(),
    };
    out.push(req.fix_action(title, INLINE_CALL, "inline_call")?);
    Ok(())
}

fn inline_variable(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    if outcome("inline_variable", probe_inline_variable(&input.file_input()))? == Some(true) {
        out.push(req.fix_action("Inline variable", INLINE_VARIABLE, "inline_variable")?);
    }
    Ok(())
}

fn change_signature(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    let Some(choice) = outcome("change_signature", probe_change_signature(&input))? else {
        return Ok(());
    };
    let offers = [
        (
            choice.can_remove,
            REMOVE_UNUSED_PARAM,
            format!("Remove unused parameter {}", choice.name),
            SignatureChange::Remove(choice.index),
        ),
        (
            choice.can_move_left,
            MOVE_PARAM_LEFT,
            format!("Move parameter {} left", choice.name),
            SignatureChange::MoveLeft(choice.index),
        ),
        (
            choice.can_move_right,
            MOVE_PARAM_RIGHT,
            format!("Move parameter {} right", choice.name),
            SignatureChange::MoveRight(choice.index),
        ),
    ];
    for (offered, kind, title, change) in offers {
        if !offered || !req.enabled(kind) {
            continue;
        }
        let args = CommandArgs::ChangeSignature {
            uri: req.uri.clone(),
            range: req.request.range.into(),
            change,
        };
        out.push(req.command_action(title, kind, args)?);
    }
    Ok(())
}

fn invert_if(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    if outcome("invert_if", probe_invert_if(&input.file_input()))? == Some(true) {
        out.push(req.fix_action("Invert if condition", INVERT_IF, "invert_if_condition")?);
    }
    Ok(())
}

fn lines(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    let Some((split, join)) = outcome("lines", probe_lines(&input.file_input()))? else {
        return Ok(());
    };
    if split && req.enabled(SPLIT_LINES) {
        out.push(req.fix_action("Split elements into separate lines", SPLIT_LINES, "split_lines")?);
    }
    if join && req.enabled(JOIN_LINES) {
        out.push(req.fix_action("Join elements into one line", JOIN_LINES, "join_lines")?);
    }
    Ok(())
}

fn string_literal(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    let title = match outcome("string_literal", probe_string_literal(&input.file_input()))?.flatten() {
        Some(Quoting::Raw) => "Convert to raw string literal",
        Some(Quoting::Interpreted) => "Convert to interpreted string literal",
        None => return Ok(()),
    };
    out.push(req.fix_action(title, CHANGE_QUOTE, "convert_string_literal")?);
    Ok(())
}

fn fill(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let Some(input) = req.input() else {
        return Ok(());
    };
    let file_input = input.file_input();
    if req.enabled(FILL_STRUCT) && outcome("fill_struct", probe_fill_struct(&file_input))? == Some(true) {
        out.push(req.fix_action("Fill struct literal", FILL_STRUCT, "fill_struct")?);
    }
    if req.enabled(FILL_SWITCH) && outcome("fill_switch", probe_fill_switch(&file_input))? == Some(true) {
        out.push(req.fix_action("Add missing cases", FILL_SWITCH, "fill_switch")?);
    }
    Ok(())
}

fn add_test(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    // The test file may not exist yet.
    if !req.capabilities.document_changes {
        return Ok(());
    }
    let Some(input) = req.input() else {
        return Ok(());
    };
    if outcome("add_test", probe_add_test(&input.file_input()))? != Some(true) {
        return Ok(());
    }
    let args = CommandArgs::AddTest {
        uri: req.uri.clone(),
        range: req.request.range.into(),
    };
    out.push(req.command_action("Add test", SOURCE_ADD_TEST, args)?);
    Ok(())
}

/// Runs the tests and benchmarks declared in the selection. The action
/// only ever carries a command; it has no edit to resolve.
fn run_tests(req: &Request<'_>, out: &mut Vec<CodeAction>) -> Result<(), CodeActionError> {
    let parsed = &req.parsed;
    let range: TextRange = parsed.mapper.text_range(req.request.range)?;
    let (benchmarks, tests): (Vec<_>, Vec<_>) = tests_in_range(parsed, range)
        .into_iter()
        .partition(|t| t.kind.is_benchmark());
    if tests.is_empty() && benchmarks.is_empty() {
        return Ok(());
    }
    let title = match (tests.len(), benchmarks.len()) {
        (_, 0) => "Run tests",
        (0, _) => "Run benchmarks",
        _ => "Run tests and benchmarks",
    };
    let args = CommandArgs::RunTests {
        uri: req.uri.clone(),
        tests: tests.into_iter().map(|t| t.name).collect(),
        benchmarks: benchmarks.into_iter().map(|t| t.name).collect(),
    };
    out.push(CodeAction {
        title: title.to_string(),
        kind: Some(lsp_kind(SOURCE_TEST)),
        command: Some(args.into_command(title)?),
        ..CodeAction::default()
    });
    Ok(())
}
