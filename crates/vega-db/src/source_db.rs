//! Snapshot-safe access to source files.

use std::sync::Arc;

use vega_core::FileId;

/// A minimal source-file interface.
///
/// Returned values are owned so they stay valid independently of the
/// database that produced them.
pub trait SourceDatabase {
    /// The full text of `file`.
    fn file_text(&self, file: &FileId) -> Option<Arc<str>>;

    /// The document version of `file`, as last reported by the client.
    fn file_version(&self, file: &FileId) -> Option<i32>;

    /// All files known to the database, in path order.
    fn all_files(&self) -> Vec<FileId>;
}
