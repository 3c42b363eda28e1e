use thiserror::Error;
use vega_core::{EditError, FileId, PositionError};
use vega_db::SnapshotError;
use vega_scheduler::Cancelled;

/// Why a refactoring produced no edit.
///
/// `Structural` and `Semantic` refusals are expected outcomes of probing a
/// selection; the other variants indicate a failed request or a bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefactorError {
    /// The selection does not have the shape the transformation needs.
    #[error("{0}")]
    Structural(String),
    /// The transformation would change behavior or does not type-check.
    #[error("{0}")]
    Semantic(String),
    /// Generated code failed to parse or type-check.
    #[error("internal error: generated code is invalid: {0}")]
    Synthesis(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("internal error: {0}")]
    Bug(String),
    #[error("no such file: {0}")]
    MissingFile(FileId),
    #[error("invalid position: {0}")]
    Position(#[from] PositionError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Snapshot(SnapshotError),
}

impl RefactorError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        RefactorError::Structural(message.into())
    }

    pub(crate) fn semantic(message: impl Into<String>) -> Self {
        RefactorError::Semantic(message.into())
    }

    /// An expected refusal rather than a failure.
    pub fn is_refusal(&self) -> bool {
        matches!(self, RefactorError::Structural(_) | RefactorError::Semantic(_))
    }
}

impl From<Cancelled> for RefactorError {
    fn from(_: Cancelled) -> Self {
        RefactorError::Cancelled
    }
}

impl From<SnapshotError> for RefactorError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Cancelled(_) => RefactorError::Cancelled,
            SnapshotError::UnknownFile(file) => RefactorError::MissingFile(file),
            other => RefactorError::Snapshot(other),
        }
    }
}
