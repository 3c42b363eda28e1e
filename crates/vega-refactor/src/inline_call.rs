//! The "Inline call" refactoring.

use vega_syntax::{NodeId, NodeKind, ParsedFile};
use vega_types::{ObjId, Program};

use crate::edit::{SuggestedFix, WorkspaceEdit};
use crate::fixers::PackageInput;
use crate::inline::{guarded_inline, InlineRequest, SimpleInliner};
use crate::selection::enclosing_static_call;
use crate::RefactorError;

/// Whether the selection is inside a call the inliner could be asked to
/// inline. The inliner itself may still refuse.
pub fn probe_inline_call(input: &PackageInput<'_>) -> Result<bool, RefactorError> {
    if input.view.has_errors() {
        return Ok(false);
    }
    let program = input.program();
    let file: &ParsedFile = input.file;
    let (Some(start), Some(end)) = (file.offset(input.start), file.offset(input.end)) else {
        return Ok(false);
    };
    let Ok(call) = enclosing_static_call(program, file, start, end) else {
        return Ok(false);
    };
    Ok(callee_decl(program, call.callee).is_some())
}

/// The file and `FuncDecl` declaring a function, unless it is in the
/// standard library.
pub(crate) fn callee_decl(program: &Program, callee: ObjId) -> Option<(&ParsedFile, NodeId)> {
    let obj = program.obj(callee);
    if obj.pkg.map_or(true, |p| program.package(p).std) {
        return None;
    }
    let key = obj.decl?;
    let file = program.decl_file(callee)?;
    matches!(file.tree.kind(key.node), NodeKind::FuncDecl { .. }).then_some((&**file, key.node))
}

pub(crate) fn inline_call(input: &PackageInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let program = input.program();
    let file: &ParsedFile = input.file;
    if input.view.has_errors() {
        return Err(RefactorError::semantic("cannot inline in a package with errors"));
    }
    let (Some(start), Some(end)) = (file.offset(input.start), file.offset(input.end)) else {
        return Err(RefactorError::Bug("selection outside the file".into()));
    };
    let call = enclosing_static_call(program, file, start, end)?;
    let name = program.obj(call.callee).name.clone();
    let (callee_file, decl) = callee_decl(program, call.callee)
        .ok_or_else(|| RefactorError::semantic(format!("cannot inline {name}: declaration not available")))?;
    let request = InlineRequest {
        program,
        caller: file,
        caller_pkg: input.view.id(),
        call: call.call,
        callee_file,
        callee_decl: decl,
        callee: call.callee,
    };
    let edits = guarded_inline(&SimpleInliner, &request)?;
    input.cx.check()?;

    let fix = SuggestedFix::new(format!("Inline call of {name}"), edits);
    let edit = WorkspaceEdit::assemble(&fix, program.fset(), input.snapshot)?;
    edit.verify(input.snapshot)?;
    edit.verify_types(input.snapshot, input.cx, program)?;
    Ok(Some(fix))
}
