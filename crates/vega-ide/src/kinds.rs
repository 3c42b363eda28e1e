//! Code-action kinds produced by Vega.
//!
//! Kinds are hierarchical and dot-separated; a client asking for
//! `refactor.extract` receives every `refactor.extract.*` action.

use lsp_types::CodeActionKind;

pub const QUICKFIX: &str = "quickfix";

pub const SOURCE_ORGANIZE_IMPORTS: &str = "source.organizeImports";
pub const SOURCE_ADD_TEST: &str = "source.addTest";
pub const SOURCE_TEST: &str = "source.test";

pub const EXTRACT_VARIABLE: &str = "refactor.extract.variable";
pub const EXTRACT_VARIABLE_ALL: &str = "refactor.extract.variable-all";
pub const EXTRACT_CONSTANT: &str = "refactor.extract.constant";
pub const EXTRACT_CONSTANT_ALL: &str = "refactor.extract.constant-all";
pub const EXTRACT_FUNCTION: &str = "refactor.extract.function";
pub const EXTRACT_METHOD: &str = "refactor.extract.method";
pub const EXTRACT_TO_NEW_FILE: &str = "refactor.extract.toNewFile";
pub const EXTRACT_INTERFACE: &str = "refactor.extract.interface";

pub const INLINE_CALL: &str = "refactor.inline.call";
pub const INLINE_VARIABLE: &str = "refactor.inline.variable";

pub const REMOVE_UNUSED_PARAM: &str = "refactor.rewrite.removeUnusedParam";
pub const MOVE_PARAM_LEFT: &str = "refactor.rewrite.moveParamLeft";
pub const MOVE_PARAM_RIGHT: &str = "refactor.rewrite.moveParamRight";
pub const INVERT_IF: &str = "refactor.rewrite.invertIf";
pub const SPLIT_LINES: &str = "refactor.rewrite.splitLines";
pub const JOIN_LINES: &str = "refactor.rewrite.joinLines";
pub const CHANGE_QUOTE: &str = "refactor.rewrite.changeQuote";
pub const FILL_STRUCT: &str = "refactor.rewrite.fillStruct";
pub const FILL_SWITCH: &str = "refactor.rewrite.fillSwitch";

/// Whether a request for `requested` covers `kind`: equal, or a dotted
/// prefix of it.
pub fn covers(requested: &str, kind: &str) -> bool {
    kind == requested
        || (kind.starts_with(requested) && kind.as_bytes().get(requested.len()) == Some(&b'.'))
}

pub(crate) fn lsp_kind(kind: &'static str) -> CodeActionKind {
    CodeActionKind::from(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_prefixes_cover_their_children() {
        assert!(covers("refactor", EXTRACT_VARIABLE));
        assert!(covers("refactor.extract", EXTRACT_VARIABLE_ALL));
        assert!(covers(QUICKFIX, QUICKFIX));
        assert!(!covers("refactor.ex", EXTRACT_VARIABLE));
        assert!(!covers("source", QUICKFIX));
        assert!(!covers(EXTRACT_VARIABLE, EXTRACT_VARIABLE_ALL));
    }
}
