use vega_core::FileId;
use vega_db::Snapshot;
use vega_refactor::{PackageInput, RefactorError, SuggestedFix, WorkspaceEdit};
use vega_scheduler::RequestContext;
use vega_test_utils::WorkspaceFixture;

pub const GO_MOD: &str = "-- /ws/go.mod --\nmodule example.com/m\n\ngo 1.22\n";

/// A checked workspace with one selection.
pub struct Workspace {
    pub fixture: WorkspaceFixture,
    pub snapshot: Snapshot,
    pub cx: RequestContext,
}

pub fn workspace(files: &str) -> Workspace {
    let fixture = WorkspaceFixture::parse(&format!("{GO_MOD}{files}"));
    let snapshot = Snapshot::new(fixture.files.clone());
    Workspace {
        fixture,
        snapshot,
        cx: RequestContext::detached(),
    }
}

impl Workspace {
    /// Run `f` on the selection of the fixture.
    pub fn at_selection<R>(&self, f: impl FnOnce(&PackageInput<'_>) -> R) -> R {
        let (file, range) = self.fixture.selection();
        let (view, parsed) = self.snapshot.package_for_file(&self.cx, &file).unwrap();
        let input = PackageInput::new(
            &self.snapshot,
            &self.cx,
            view,
            &parsed,
            parsed.pos(range.start()),
            parsed.pos(range.end()),
        );
        f(&input)
    }

    pub fn fix(&self, name: &str) -> Result<Option<SuggestedFix>, RefactorError> {
        self.at_selection(|input| vega_refactor::apply_fix(name, input))
    }

    /// Texts of the files `fix` touches or creates, after applying it.
    pub fn apply(&self, fix: &SuggestedFix) -> Vec<(FileId, String)> {
        let program = self.snapshot.program(&self.cx).unwrap();
        let edit = WorkspaceEdit::assemble(fix, program.fset(), &self.snapshot).unwrap();
        edit.apply(&self.snapshot).unwrap()
    }

    /// The text of `path` after applying `fix`.
    pub fn after(&self, fix: &SuggestedFix, path: &str) -> String {
        let file = FileId::new(path);
        self.apply(fix)
            .into_iter()
            .find(|(f, _)| *f == file)
            .map(|(_, text)| text)
            .unwrap_or_else(|| self.fixture.text(&file).to_string())
    }
}
