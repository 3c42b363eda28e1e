//! The table of named fixers.
//!
//! Code actions that compute their edits lazily carry a fixer name; the
//! name is resolved here when the action is resolved or its command runs.
//! A fixer returning `Ok(None)` found nothing to do at the selection.

use std::sync::Arc;

use vega_db::Snapshot;
use vega_scheduler::RequestContext;
use vega_syntax::{FileSet, ParsedFile, Pos};
use vega_types::{PackageView, Program};

use crate::edit::SuggestedFix;
use crate::selection::Selection;
use crate::{
    extract, extract_file, extract_function, extract_interface, fill, imports, inline_call, inline_variable,
    invert_if, lines, stub_methods, string_literal, RefactorError,
};

/// Input of a fixer that only needs one checked file.
#[derive(Clone, Copy)]
pub struct FileInput<'a> {
    pub fset: &'a FileSet,
    pub start: Pos,
    pub end: Pos,
    pub file: &'a ParsedFile,
    pub view: PackageView<'a>,
}

impl<'a> FileInput<'a> {
    pub fn program(&self) -> &'a Program {
        self.view.program()
    }

    pub fn selection(&self) -> Result<Selection<'a>, RefactorError> {
        Selection::new(self.file, self.start, self.end)
    }
}

/// Input of a fixer that may read or re-check the whole workspace.
#[derive(Clone, Copy)]
pub struct PackageInput<'a> {
    pub snapshot: &'a Snapshot,
    pub cx: &'a RequestContext,
    pub view: PackageView<'a>,
    pub file: &'a Arc<ParsedFile>,
    pub start: Pos,
    pub end: Pos,
}

impl<'a> PackageInput<'a> {
    /// Check `file` of `snapshot` and select `[start, end)` in it.
    pub fn new(
        snapshot: &'a Snapshot,
        cx: &'a RequestContext,
        view: PackageView<'a>,
        file: &'a Arc<ParsedFile>,
        start: Pos,
        end: Pos,
    ) -> Self {
        PackageInput {
            snapshot,
            cx,
            view,
            file,
            start,
            end,
        }
    }

    pub fn program(&self) -> &'a Program {
        self.view.program()
    }

    pub fn selection(&self) -> Result<Selection<'a>, RefactorError> {
        Selection::new(self.file, self.start, self.end)
    }

    /// The single-file view of this input.
    pub fn file_input(&self) -> FileInput<'a> {
        FileInput {
            fset: self.program().fset(),
            start: self.start,
            end: self.end,
            file: self.file,
            view: self.view,
        }
    }
}

pub type FileFixer = fn(&FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError>;
pub type PackageFixer = fn(&PackageInput<'_>) -> Result<Option<SuggestedFix>, RefactorError>;

#[derive(Clone, Copy)]
pub enum Fixer {
    File(FileFixer),
    Package(PackageFixer),
}

pub struct FixerEntry {
    pub name: &'static str,
    pub fixer: Fixer,
}

pub const FIXERS: &[FixerEntry] = &[
    FixerEntry { name: "extract_variable", fixer: Fixer::File(extract::extract_variable) },
    FixerEntry { name: "extract_variable_all", fixer: Fixer::File(extract::extract_variable_all) },
    FixerEntry { name: "extract_function", fixer: Fixer::File(extract_function::extract_function) },
    FixerEntry { name: "extract_method", fixer: Fixer::File(extract_function::extract_method) },
    FixerEntry { name: "extract_to_new_file", fixer: Fixer::Package(extract_file::extract_to_new_file) },
    FixerEntry { name: "extract_interface", fixer: Fixer::File(extract_interface::extract_interface) },
    FixerEntry { name: "inline_call", fixer: Fixer::Package(inline_call::inline_call) },
    FixerEntry { name: "inline_variable", fixer: Fixer::File(inline_variable::inline_variable) },
    FixerEntry { name: "invert_if_condition", fixer: Fixer::File(invert_if::invert_if_condition) },
    FixerEntry { name: "split_lines", fixer: Fixer::File(lines::split_lines) },
    FixerEntry { name: "join_lines", fixer: Fixer::File(lines::join_lines) },
    FixerEntry { name: "convert_string_literal", fixer: Fixer::File(string_literal::convert_string_literal) },
    FixerEntry { name: "fill_struct", fixer: Fixer::File(fill::fill_struct) },
    FixerEntry { name: "fill_switch", fixer: Fixer::File(fill::fill_switch) },
    FixerEntry { name: "stub_methods", fixer: Fixer::File(stub_methods::stub_missing_methods) },
    FixerEntry { name: "missing_method", fixer: Fixer::File(stub_methods::declare_missing_method) },
    FixerEntry { name: "undeclared_name", fixer: Fixer::File(stub_methods::create_undeclared_func) },
    FixerEntry { name: "add_embed_import", fixer: Fixer::File(imports::add_embed_import) },
];

pub fn lookup(name: &str) -> Option<&'static FixerEntry> {
    FIXERS.iter().find(|entry| entry.name == name)
}

/// Run the fixer `name` on `input`.
pub fn apply_fix(name: &str, input: &PackageInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let entry = lookup(name).ok_or_else(|| RefactorError::Bug(format!("unknown fixer {name:?}")))?;
    input.cx.check()?;
    let _span = tracing::debug_span!(target: "vega.refactor", "fixer", name).entered();
    match entry.fixer {
        Fixer::File(fixer) => fixer(&input.file_input()),
        Fixer::Package(fixer) => fixer(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixer_names_are_unique() {
        let mut names: Vec<_> = FIXERS.iter().map(|e| e.name).collect();
        names.sort_unstable();
        let len = names.len();
        names.dedup();
        assert_eq!(names.len(), len);
        assert!(lookup("inline_call").is_some());
        assert!(lookup("nope").is_none());
    }
}
