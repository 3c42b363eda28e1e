//! Core shared types for Vega.
//!
//! This crate is intentionally small: file identities, the text/position model
//! shared by every layer, and byte-offset text edits.

mod edit;
mod file;
mod text;

pub use edit::{apply_text_edits, normalize_text_edits, EditError, TextEdit};
pub use file::FileId;
pub use text::{LineIndex, Position, PositionError, Range, TextRange, TextSize};

/// Interned-ish identifier text used by syntax and type layers.
pub type Name = smol_str::SmolStr;
