//! The code-action orchestrator.
//!
//! A request runs every enabled producer of [`crate::producers::PRODUCERS`]
//! in table order against one snapshot. Producers share a [`Request`]
//! record: the parsed file, the checked package (loaded once, only when an
//! enabled producer needs types) and lazily memoized sub-results such as
//! the file's import fixes.

use std::sync::Arc;

use lsp_types::{
    CodeAction, CodeActionContext, CodeActionKind, CodeActionOrCommand, CodeActionParams, CodeActionTriggerKind,
    Diagnostic, Uri, WorkspaceEdit as LspWorkspaceEdit,
};
use once_cell::unsync::OnceCell;
use vega_config::VegaConfig;
use vega_core::{FileId, Range};
use vega_db::{Snapshot, SnapshotError};
use vega_refactor::imports::{ImportFix, ImportResolver, WorkspaceImportResolver};
use vega_refactor::lsp::{file_uri, workspace_edit_to_lsp};
use vega_refactor::{range_pos, PackageInput, RefactorError, SuggestedFix, WorkspaceEdit};
use vega_scheduler::RequestContext;
use vega_syntax::{ParsedFile, Pos};
use vega_types::PackageView;

use crate::command::CommandArgs;
use crate::kinds;
use crate::producers::PRODUCERS;
use crate::CodeActionError;

/// Why the client asked for code actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    /// Explicit user intent, such as opening the light-bulb menu.
    #[default]
    Invoked,
    /// Incidental, such as cursor motion.
    Automatic,
}

impl From<Option<CodeActionTriggerKind>> for Trigger {
    fn from(kind: Option<CodeActionTriggerKind>) -> Self {
        match kind {
            Some(CodeActionTriggerKind::AUTOMATIC) => Trigger::Automatic,
            _ => Trigger::Invoked,
        }
    }
}

/// What the client can do with the actions it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientCapabilities {
    /// `workspace.workspaceEdit.documentChanges`: versioned edits and file
    /// operations.
    pub document_changes: bool,
    /// `codeAction/resolve` can fill in the `edit` property.
    pub resolve_support: bool,
}

impl Default for ClientCapabilities {
    fn default() -> Self {
        ClientCapabilities {
            document_changes: true,
            resolve_support: true,
        }
    }
}

impl ClientCapabilities {
    pub fn from_lsp(caps: &lsp_types::ClientCapabilities) -> Self {
        let document_changes = caps
            .workspace
            .as_ref()
            .and_then(|w| w.workspace_edit.as_ref())
            .and_then(|e| e.document_changes)
            .unwrap_or(false);
        let resolve_support = caps
            .text_document
            .as_ref()
            .and_then(|t| t.code_action.as_ref())
            .and_then(|c| c.resolve_support.as_ref())
            .is_some_and(|r| r.properties.iter().any(|p| p == "edit"));
        ClientCapabilities {
            document_changes,
            resolve_support,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeActionRequest {
    pub file: FileId,
    pub range: Range,
    pub diagnostics: Vec<Diagnostic>,
    /// Requested kinds; `None` asks for every kind.
    pub only: Option<Vec<CodeActionKind>>,
    pub trigger: Trigger,
}

impl CodeActionRequest {
    pub fn new(file: FileId, range: Range) -> Self {
        CodeActionRequest {
            file,
            range,
            diagnostics: Vec::new(),
            only: None,
            trigger: Trigger::Invoked,
        }
    }

    pub fn from_params(params: &CodeActionParams) -> Result<Self, CodeActionError> {
        let uri = &params.text_document.uri;
        let file = FileId::from_uri(uri.as_str())
            .ok_or_else(|| CodeActionError::InvalidData(format!("not a file uri: {}", uri.as_str())))?;
        let CodeActionContext {
            diagnostics,
            only,
            trigger_kind,
        } = &params.context;
        Ok(CodeActionRequest {
            file,
            range: params.range.into(),
            diagnostics: diagnostics.clone(),
            only: only.clone(),
            trigger: Trigger::from(*trigger_kind),
        })
    }

    /// Whether the client asked for `kind`.
    pub fn wants(&self, kind: &str) -> bool {
        match &self.only {
            None => true,
            Some(only) => only.iter().any(|requested| kinds::covers(requested.as_str(), kind)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeActionResponse {
    pub actions: Vec<CodeAction>,
    /// Producers invoked for the request, in order.
    pub producers_run: Vec<&'static str>,
}

impl CodeActionResponse {
    pub fn into_lsp(self) -> lsp_types::CodeActionResponse {
        self.actions.into_iter().map(CodeActionOrCommand::CodeAction).collect()
    }
}

/// The checked package of the request's file.
pub(crate) struct Loaded<'a> {
    pub view: PackageView<'a>,
    /// The file as the package parsed it.
    pub file: Arc<ParsedFile>,
    pub start: Pos,
    pub end: Pos,
}

/// Import fixes of the request's file, computed at most once.
struct MemoResolver<'a> {
    inner: WorkspaceImportResolver<'a>,
    fixes: OnceCell<Result<Vec<ImportFix>, RefactorError>>,
}

impl ImportResolver for MemoResolver<'_> {
    fn fixes(&self, view: &PackageView<'_>, file: &ParsedFile) -> Result<Vec<ImportFix>, RefactorError> {
        self.fixes.get_or_init(|| self.inner.fixes(view, file)).clone()
    }
}

/// The record shared by the producers of one request.
pub(crate) struct Request<'a> {
    pub snapshot: &'a Snapshot,
    pub cx: &'a RequestContext,
    pub config: &'a VegaConfig,
    pub capabilities: ClientCapabilities,
    pub request: &'a CodeActionRequest,
    pub uri: Uri,
    pub parsed: Arc<ParsedFile>,
    pub package: Option<Loaded<'a>>,
    imports: MemoResolver<'a>,
}

impl<'a> Request<'a> {
    /// Whether a producer may emit `kind`.
    pub fn enabled(&self, kind: &str) -> bool {
        self.request.wants(kind) && !self.config.code_actions.is_disabled(kind)
    }

    pub fn diagnostics(&self) -> &'a [Diagnostic] {
        &self.request.diagnostics
    }

    pub fn import_resolver(&self) -> &dyn ImportResolver {
        &self.imports
    }

    /// The request's selection in its checked package.
    pub fn input(&self) -> Option<PackageInput<'_>> {
        let loaded = self.package.as_ref()?;
        Some(PackageInput::new(
            self.snapshot,
            self.cx,
            loaded.view,
            &loaded.file,
            loaded.start,
            loaded.end,
        ))
    }

    /// A selection of `range` in the checked package.
    pub fn input_at(&self, range: Range) -> Result<Option<PackageInput<'_>>, RefactorError> {
        let Some(loaded) = self.package.as_ref() else {
            return Ok(None);
        };
        let (start, end) = range_pos(&loaded.file, range)?;
        Ok(Some(PackageInput::new(self.snapshot, self.cx, loaded.view, &loaded.file, start, end)))
    }

    /// An action whose edit is computed now.
    pub fn edit_action(
        &self,
        title: impl Into<String>,
        kind: &'static str,
        fix: &SuggestedFix,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<Option<CodeAction>, CodeActionError> {
        if fix.creates_files() && !self.capabilities.document_changes {
            return Ok(None);
        }
        let edit = workspace_edit(self.snapshot, self.cx, self.capabilities, fix)?;
        Ok(Some(CodeAction {
            title: title.into(),
            kind: Some(kinds::lsp_kind(kind)),
            diagnostics: (!diagnostics.is_empty()).then_some(diagnostics),
            edit: Some(edit),
            ..CodeAction::default()
        }))
    }

    /// An action whose edit is computed when the action is resolved or its
    /// command runs.
    pub fn command_action(
        &self,
        title: impl Into<String>,
        kind: &'static str,
        args: CommandArgs,
    ) -> Result<CodeAction, CodeActionError> {
        let title = title.into();
        let mut action = CodeAction {
            title: title.clone(),
            kind: Some(kinds::lsp_kind(kind)),
            ..CodeAction::default()
        };
        if self.capabilities.resolve_support && self.config.code_actions.resolve_edits {
            action.data = Some(args.to_value()?);
        } else {
            action.command = Some(args.into_command(title)?);
        }
        Ok(action)
    }

    /// A lazily computed action running the fixer `fix` on the selection.
    pub fn fix_action(
        &self,
        title: impl Into<String>,
        kind: &'static str,
        fix: &str,
    ) -> Result<CodeAction, CodeActionError> {
        let args = CommandArgs::ApplyFix {
            fix: fix.to_string(),
            uri: self.uri.clone(),
            range: self.request.range.into(),
        };
        self.command_action(title, kind, args)
    }
}

/// Assemble, verify and convert the edits of `fix`.
pub(crate) fn workspace_edit(
    snapshot: &Snapshot,
    cx: &RequestContext,
    capabilities: ClientCapabilities,
    fix: &SuggestedFix,
) -> Result<LspWorkspaceEdit, CodeActionError> {
    let program = snapshot.program(cx)?;
    let edit = WorkspaceEdit::assemble(fix, program.fset(), snapshot)?;
    cx.check()?;
    edit.verify(snapshot)?;
    let changes = edit.document_changes(snapshot)?;
    Ok(workspace_edit_to_lsp(&changes, capabilities.document_changes)?)
}

/// Turn a kernel result into an optional value, logging and dropping
/// refusals and internal failures. Only cancellation aborts the request.
pub(crate) fn outcome<T>(name: &str, result: Result<T, RefactorError>) -> Result<Option<T>, CodeActionError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RefactorError::Cancelled) => Err(CodeActionError::Cancelled),
        Err(err) if err.is_refusal() => {
            tracing::debug!(target: "vega.ide", producer = name, reason = %err, "refused");
            Ok(None)
        }
        Err(err) => {
            tracing::error!(target: "vega.ide", producer = name, error = %err, "producer failed");
            Ok(None)
        }
    }
}

fn load_package<'a>(
    snapshot: &'a Snapshot,
    cx: &RequestContext,
    request: &CodeActionRequest,
) -> Result<Option<Loaded<'a>>, CodeActionError> {
    let (view, file) = match snapshot.package_for_file(cx, &request.file) {
        Ok(found) => found,
        Err(SnapshotError::NoPackage(file)) => {
            tracing::debug!(target: "vega.ide", file = %file, "no package; type-based producers skipped");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    // The package's parse of the file may differ from the parse cache.
    let (start, end) = file.range_pos(request.range)?;
    Ok(Some(Loaded { view, file, start, end }))
}

/// Compute the code actions of `request`.
///
/// Actions are sorted by kind, then by producer order. A cancelled request
/// returns [`CodeActionError::Cancelled`] and no actions.
pub fn code_actions(
    snapshot: &Snapshot,
    cx: &RequestContext,
    config: &VegaConfig,
    capabilities: ClientCapabilities,
    request: &CodeActionRequest,
) -> Result<CodeActionResponse, CodeActionError> {
    let _span = tracing::debug_span!(target: "vega.ide", "code_actions", file = %request.file).entered();
    cx.check()?;
    let parsed = snapshot.parse(&request.file)?;
    // Validates the range before any producer runs.
    parsed.range_pos(request.range)?;
    let uri = file_uri(&request.file)?;

    let mut req = Request {
        snapshot,
        cx,
        config,
        capabilities,
        request,
        uri,
        parsed,
        package: None,
        imports: MemoResolver {
            inner: WorkspaceImportResolver::new(snapshot),
            fixes: OnceCell::new(),
        },
    };

    let cursor_motion = request.trigger == Trigger::Automatic && request.range.is_empty();
    let enabled: Vec<_> = PRODUCERS
        .iter()
        .filter(|p| p.kinds.iter().any(|kind| req.enabled(kind)))
        .filter(|p| {
            let suppressed = p.distracting && cursor_motion && !config.code_actions.inline_call_on_cursor;
            if suppressed {
                tracing::trace!(target: "vega.ide", producer = p.name, "suppressed on cursor motion");
            }
            !suppressed
        })
        .collect();
    if enabled.iter().any(|p| p.needs_types) {
        req.package = load_package(snapshot, cx, request)?;
    }

    let mut response = CodeActionResponse::default();
    for producer in enabled {
        cx.check()?;
        if producer.needs_types && req.package.is_none() {
            continue;
        }
        response.producers_run.push(producer.name);
        let mut produced = Vec::new();
        match (producer.run)(&req, &mut produced) {
            Ok(()) => response.actions.extend(produced),
            Err(CodeActionError::Cancelled) => return Err(CodeActionError::Cancelled),
            Err(err) => {
                tracing::error!(target: "vega.ide", producer = producer.name, error = %err, "producer failed");
            }
        }
    }
    cx.check()?;

    response
        .actions
        .sort_by(|a, b| kind_str(a).cmp(kind_str(b)));
    tracing::debug!(
        target: "vega.ide",
        actions = response.actions.len(),
        producers = response.producers_run.len(),
        "computed code actions"
    );
    Ok(response)
}

fn kind_str(action: &CodeAction) -> &str {
    action.kind.as_ref().map_or("", |k| k.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vega_core::Position;

    #[test]
    fn only_filters_by_kind_prefix() {
        let mut request = CodeActionRequest::new(FileId::new("/ws/a.go"), Range::point(Position::new(0, 0)));
        assert!(request.wants(kinds::INLINE_CALL));
        request.only = Some(vec![CodeActionKind::REFACTOR_INLINE]);
        assert!(request.wants(kinds::INLINE_CALL));
        assert!(request.wants(kinds::INLINE_VARIABLE));
        assert!(!request.wants(kinds::EXTRACT_VARIABLE));
        assert!(!request.wants(kinds::QUICKFIX));
    }

    #[test]
    fn missing_trigger_kind_means_invoked() {
        assert_eq!(Trigger::from(None), Trigger::Invoked);
        assert_eq!(Trigger::from(Some(CodeActionTriggerKind::AUTOMATIC)), Trigger::Automatic);
    }

    #[test]
    fn capabilities_default_to_off_for_bare_clients() {
        let caps = ClientCapabilities::from_lsp(&lsp_types::ClientCapabilities::default());
        assert!(!caps.document_changes);
        assert!(!caps.resolve_support);
    }
}
