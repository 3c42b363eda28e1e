//! Utilities shared by Vega tests.
//!
//! Fixture helpers for refactoring and code-action tests:
//! - `/*start*/` ... `/*end*/` selection markers ([`extract_range`]),
//! - multi-file workspaces separated by `-- /path/to/file --` headers
//!   ([`WorkspaceFixture`]),
//! - applying LSP text edits to a document ([`apply_lsp_edits`]).

#[cfg(feature = "fixtures")]
mod fixtures;

#[cfg(feature = "lsp-text")]
mod lsp_text;

#[cfg(feature = "fixtures")]
pub use fixtures::*;

#[cfg(feature = "lsp-text")]
pub use lsp_text::*;
