use lsp_types::{
    CodeAction, DocumentChangeOperation, DocumentChanges, OneOf, Range as LspRange, TextEdit, Uri, WorkspaceEdit,
};
use vega_config::VegaConfig;
use vega_core::{FileId, LineIndex, TextRange, TextSize};
use vega_db::Snapshot;
use vega_ide::{code_actions, resolve_code_action, ClientCapabilities, CodeActionRequest, CodeActionResponse};
use vega_refactor::lsp::file_uri;
use vega_scheduler::RequestContext;
use vega_test_utils::{apply_lsp_edits, WorkspaceFixture};

pub const GO_MOD: &str = "-- /ws/go.mod --\nmodule example.com/m\n\ngo 1.22\n";

pub struct Workspace {
    pub fixture: WorkspaceFixture,
    pub snapshot: Snapshot,
    pub cx: RequestContext,
    pub config: VegaConfig,
    pub capabilities: ClientCapabilities,
}

pub fn workspace(files: &str) -> Workspace {
    let fixture = WorkspaceFixture::parse(&format!("{GO_MOD}{files}"));
    let snapshot = Snapshot::new(fixture.files.clone());
    Workspace {
        fixture,
        snapshot,
        cx: RequestContext::detached(),
        config: VegaConfig::default(),
        capabilities: ClientCapabilities::default(),
    }
}

pub fn uri(path: &str) -> Uri {
    file_uri(&FileId::new(path)).unwrap()
}

impl Workspace {
    fn text(&self, path: &str) -> &str {
        self.fixture.text(&FileId::new(path))
    }

    fn lsp_range(&self, path: &str, range: TextRange) -> LspRange {
        let text = self.text(path);
        LineIndex::new(text).range(text, range).into()
    }

    /// The range of the first occurrence of `needle` in `path`.
    pub fn range_of(&self, path: &str, needle: &str) -> LspRange {
        let at = self
            .text(path)
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not in {path}"));
        let start = TextSize::from(at as u32);
        self.lsp_range(path, TextRange::at(start, TextSize::of(needle)))
    }

    /// A request for the fixture's selection.
    pub fn request(&self) -> CodeActionRequest {
        let (file, range) = self.fixture.selection();
        let range = self.lsp_range(file.as_str(), range);
        CodeActionRequest::new(file, range.into())
    }

    pub fn actions(&self, request: &CodeActionRequest) -> CodeActionResponse {
        code_actions(&self.snapshot, &self.cx, &self.config, self.capabilities, request).unwrap()
    }

    pub fn action(&self, request: &CodeActionRequest, title: &str) -> CodeAction {
        let response = self.actions(request);
        let titles: Vec<_> = response.actions.iter().map(|a| a.title.clone()).collect();
        response
            .actions
            .into_iter()
            .find(|a| a.title == title)
            .unwrap_or_else(|| panic!("no action {title:?} in {titles:?}"))
    }

    pub fn resolve(&self, action: CodeAction) -> CodeAction {
        resolve_code_action(&self.snapshot, &self.cx, &self.config, self.capabilities, action).unwrap()
    }

    /// The text of `path` after applying `edit`.
    pub fn after(&self, edit: &WorkspaceEdit, path: &str) -> String {
        let file = FileId::new(path);
        let original = self
            .fixture
            .files
            .iter()
            .find(|(f, _)| *f == file)
            .map_or("", |(_, text)| text.as_str());
        apply_lsp_edits(original, &edits_for(edit, &uri(path)))
    }
}

/// The text edits `edit` makes to `uri`, in either representation.
pub fn edits_for(edit: &WorkspaceEdit, uri: &Uri) -> Vec<TextEdit> {
    if let Some(changes) = &edit.changes {
        return changes.get(uri).cloned().unwrap_or_default();
    }
    let edits = |doc: &lsp_types::TextDocumentEdit| -> Vec<TextEdit> {
        doc.edits
            .iter()
            .map(|e| match e {
                OneOf::Left(edit) => edit.clone(),
                OneOf::Right(annotated) => annotated.text_edit.clone(),
            })
            .collect()
    };
    match &edit.document_changes {
        Some(DocumentChanges::Edits(docs)) => docs
            .iter()
            .filter(|d| d.text_document.uri == *uri)
            .flat_map(edits)
            .collect(),
        Some(DocumentChanges::Operations(ops)) => ops
            .iter()
            .filter_map(|op| match op {
                DocumentChangeOperation::Edit(doc) if doc.text_document.uri == *uri => Some(edits(doc)),
                _ => None,
            })
            .flatten()
            .collect(),
        None => Vec::new(),
    }
}
