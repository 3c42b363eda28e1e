use thiserror::Error;
use vega_core::PositionError;
use vega_db::SnapshotError;
use vega_refactor::lsp::LspConversionError;
use vega_refactor::RefactorError;
use vega_scheduler::Cancelled;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeActionError {
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Refactor(RefactorError),
    #[error(transparent)]
    Snapshot(SnapshotError),
    #[error(transparent)]
    Conversion(#[from] LspConversionError),
    #[error("invalid position: {0}")]
    Position(#[from] PositionError),
    #[error("invalid code action data: {0}")]
    InvalidData(String),
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

impl CodeActionError {
    /// An expected refusal of the requested refactoring.
    pub fn is_refusal(&self) -> bool {
        matches!(self, CodeActionError::Refactor(err) if err.is_refusal())
    }
}

impl From<Cancelled> for CodeActionError {
    fn from(_: Cancelled) -> Self {
        CodeActionError::Cancelled
    }
}

impl From<RefactorError> for CodeActionError {
    fn from(err: RefactorError) -> Self {
        match err {
            RefactorError::Cancelled => CodeActionError::Cancelled,
            RefactorError::Snapshot(err) => err.into(),
            err => CodeActionError::Refactor(err),
        }
    }
}

impl From<SnapshotError> for CodeActionError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Cancelled(_) => CodeActionError::Cancelled,
            err => CodeActionError::Snapshot(err),
        }
    }
}
