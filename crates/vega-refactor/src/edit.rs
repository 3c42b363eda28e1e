//! Edits produced by refactorings, and their assembly into per-document
//! changes.
//!
//! Kernels describe their output as a [`SuggestedFix`]: replacements
//! addressed by token positions of the program's [`FileSet`], plus whole
//! files to create. [`WorkspaceEdit::assemble`] resolves positions to byte
//! offsets of concrete files, and [`WorkspaceEdit::document_changes`] turns
//! those into protocol ranges tagged with document versions.

use std::collections::BTreeMap;

use similar::{ChangeTag, TextDiff};
use vega_core::{normalize_text_edits, FileId, LineIndex, Position, Range, TextEdit, TextRange, TextSize};
use vega_db::{Snapshot, SourceDatabase};
use vega_scheduler::RequestContext;
use vega_syntax::{FileSet, Pos};
use vega_types::Program;

use crate::RefactorError;

/// Replace the text between two token positions of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub pos: Pos,
    pub end: Pos,
    pub new_text: String,
}

impl Edit {
    pub fn replace(pos: Pos, end: Pos, new_text: impl Into<String>) -> Self {
        Edit {
            pos,
            end,
            new_text: new_text.into(),
        }
    }

    pub fn insert(pos: Pos, new_text: impl Into<String>) -> Self {
        Edit::replace(pos, pos, new_text)
    }

    pub fn delete(pos: Pos, end: Pos) -> Self {
        Edit::replace(pos, end, String::new())
    }
}

/// A file a refactoring creates, with its complete contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFile {
    pub file: FileId,
    pub text: String,
}

/// The output of a refactoring kernel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestedFix {
    pub message: String,
    pub edits: Vec<Edit>,
    pub new_files: Vec<NewFile>,
}

impl SuggestedFix {
    pub fn new(message: impl Into<String>, edits: Vec<Edit>) -> Self {
        SuggestedFix {
            message: message.into(),
            edits,
            new_files: Vec::new(),
        }
    }

    pub fn with_new_file(mut self, file: FileId, text: impl Into<String>) -> Self {
        self.new_files.push(NewFile {
            file,
            text: text.into(),
        });
        self
    }

    pub fn creates_files(&self) -> bool {
        !self.new_files.is_empty()
    }
}

/// Byte-offset edits of one existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub file: FileId,
    pub version: Option<i32>,
    pub edits: Vec<TextEdit>,
}

/// A protocol-range replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEdit {
    pub range: Range,
    pub new_text: String,
}

/// One step of a workspace change, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    Edit {
        file: FileId,
        /// The document version the ranges refer to.
        version: Option<i32>,
        edits: Vec<RangeEdit>,
    },
    Create {
        file: FileId,
    },
    Rename {
        old: FileId,
        new: FileId,
    },
    Delete {
        file: FileId,
    },
}

/// Resolved edits across the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceEdit {
    /// Edits of existing files, sorted by file.
    pub files: Vec<FileEdit>,
    pub created: Vec<NewFile>,
}

impl WorkspaceEdit {
    /// Resolve the positions of `fix` against `fset` and the texts of
    /// `snapshot`. Every edit must lie within one file; the edits of each
    /// file are sorted and must not overlap.
    pub fn assemble(fix: &SuggestedFix, fset: &FileSet, snapshot: &Snapshot) -> Result<Self, RefactorError> {
        let mut by_file: BTreeMap<FileId, Vec<TextEdit>> = BTreeMap::new();
        for edit in &fix.edits {
            let (file, start) = fset
                .resolve(edit.pos)
                .ok_or_else(|| RefactorError::Bug(format!("edit position {:?} is not in any file", edit.pos)))?;
            let end = if edit.end == edit.pos {
                start
            } else {
                match fset.resolve(edit.end) {
                    Some((end_file, end)) if end_file == file => end,
                    _ => {
                        return Err(RefactorError::Bug(format!(
                            "edit of {file} ends outside the file"
                        )))
                    }
                }
            };
            if end < start {
                return Err(RefactorError::Bug(format!("inverted edit range in {file}")));
            }
            let edits = by_file.entry(file.clone()).or_default();
            let edit = TextEdit::new(TextRange::new(start, end), edit.new_text.clone());
            if !edits.contains(&edit) {
                edits.push(edit);
            }
        }

        let mut files = Vec::with_capacity(by_file.len());
        for (file, mut edits) in by_file {
            let text = snapshot
                .file_text(&file)
                .ok_or_else(|| RefactorError::MissingFile(file.clone()))?;
            normalize_text_edits(&text, &mut edits)?;
            files.push(FileEdit {
                version: snapshot.file_version(&file),
                file,
                edits,
            });
        }
        tracing::debug!(
            target: "vega.refactor",
            files = files.len(),
            created = fix.new_files.len(),
            "assembled edits"
        );
        Ok(WorkspaceEdit {
            files,
            created: fix.new_files.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.files.iter().all(|f| f.edits.is_empty())
    }

    /// Texts of every touched file after the edit, created files included.
    pub fn apply(&self, snapshot: &Snapshot) -> Result<Vec<(FileId, String)>, RefactorError> {
        let mut out = Vec::with_capacity(self.files.len() + self.created.len());
        for file_edit in &self.files {
            let text = snapshot
                .file_text(&file_edit.file)
                .ok_or_else(|| RefactorError::MissingFile(file_edit.file.clone()))?;
            out.push((file_edit.file.clone(), vega_core::apply_text_edits(&text, &file_edit.edits)?));
        }
        out.extend(self.created.iter().map(|f| (f.file.clone(), f.text.clone())));
        Ok(out)
    }

    /// Re-parse every edited Go file and fail if the edit introduced syntax
    /// errors. Created files must parse cleanly.
    pub fn verify(&self, snapshot: &Snapshot) -> Result<(), RefactorError> {
        for (file, text) in self.apply(snapshot)? {
            if !file.is_go_file() {
                continue;
            }
            let before = match snapshot.file_text(&file) {
                Some(old) => vega_syntax::parse(&old).errors.len(),
                None => 0,
            };
            let after = vega_syntax::parse(&text);
            if after.errors.len() > before {
                let first = after.errors[0].message.clone();
                tracing::warn!(target: "vega.refactor", file = %file, error = %first, "edit does not parse");
                return Err(RefactorError::Synthesis(format!("{file}: {first}")));
            }
        }
        Ok(())
    }

    /// Type-check the edited workspace and fail if any package the edit
    /// touches has more type errors than it had in `before`.
    pub fn verify_types(&self, snapshot: &Snapshot, cx: &RequestContext, before: &Program) -> Result<(), RefactorError> {
        let changes = self.apply(snapshot)?;
        let touched: Vec<FileId> = changes.iter().map(|(f, _)| f.clone()).collect();
        let overlay = snapshot.with_overlay(changes);
        let after = overlay.program(cx)?;
        let mut checked = Vec::new();
        for file in touched.iter().filter(|f| f.is_go_file()) {
            let Some(pkg) = after.package_of_file(file) else { continue };
            if checked.contains(&pkg) {
                continue;
            }
            checked.push(pkg);
            let package = after.package(pkg);
            let old_errors = before
                .package_by_path(&package.path)
                .map_or(0, |p| before.package(p).errors.len());
            if package.errors.len() > old_errors {
                let first = package.errors.last().map_or_else(String::new, |e| e.message.clone());
                tracing::warn!(
                    target: "vega.refactor",
                    package = %package.path,
                    before = old_errors,
                    after = package.errors.len(),
                    error = %first,
                    "edit does not type-check"
                );
                return Err(RefactorError::Synthesis(format!("{}: {first}", package.path)));
            }
        }
        Ok(())
    }

    /// The edit as ordered document changes. A created file becomes a
    /// creation followed by an insertion of its contents at version 0.
    pub fn document_changes(&self, snapshot: &Snapshot) -> Result<Vec<DocumentChange>, RefactorError> {
        let mut out = Vec::new();
        for created in &self.created {
            out.push(DocumentChange::Create {
                file: created.file.clone(),
            });
            out.push(DocumentChange::Edit {
                file: created.file.clone(),
                version: Some(0),
                edits: vec![RangeEdit {
                    range: Range::point(Position::new(0, 0)),
                    new_text: created.text.clone(),
                }],
            });
        }
        for file_edit in &self.files {
            let text = snapshot
                .file_text(&file_edit.file)
                .ok_or_else(|| RefactorError::MissingFile(file_edit.file.clone()))?;
            let index = LineIndex::new(&text);
            let edits = file_edit
                .edits
                .iter()
                .map(|e| {
                    let start = index.try_position(&text, e.range.start())?;
                    let end = index.try_position(&text, e.range.end())?;
                    Ok(RangeEdit {
                        range: Range::new(start, end),
                        new_text: e.replacement.clone(),
                    })
                })
                .collect::<Result<Vec<_>, RefactorError>>()?;
            out.push(DocumentChange::Edit {
                file: file_edit.file.clone(),
                version: file_edit.version,
                edits,
            });
        }
        Ok(out)
    }
}

/// Minimal line-level edits turning `old` into `new`. Offsets are relative
/// to `base`, the position of `old` within its file.
pub fn diff_edits(old: &str, new: &str, base: TextSize) -> Vec<TextEdit> {
    let diff = TextDiff::from_lines(old, new);
    let mut edits: Vec<TextEdit> = Vec::new();
    let mut offset = 0usize;
    let mut pending: Option<(usize, usize, String)> = None;
    for change in diff.iter_all_changes() {
        let value = change.value();
        match change.tag() {
            ChangeTag::Equal => {
                if let Some((start, end, text)) = pending.take() {
                    edits.push(text_edit(base, start, end, text));
                }
                offset += value.len();
            }
            ChangeTag::Delete => {
                let entry = pending.get_or_insert((offset, offset, String::new()));
                entry.1 += value.len();
                offset += value.len();
            }
            ChangeTag::Insert => {
                let entry = pending.get_or_insert((offset, offset, String::new()));
                entry.2.push_str(value);
            }
        }
    }
    if let Some((start, end, text)) = pending {
        edits.push(text_edit(base, start, end, text));
    }
    edits
}

fn text_edit(base: TextSize, start: usize, end: usize, text: String) -> TextEdit {
    TextEdit::new(
        TextRange::new(base + TextSize::from(start as u32), base + TextSize::from(end as u32)),
        text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_edits_touch_only_changed_lines() {
        let old = "a\nb\nc\n";
        let new = "a\nB\nc\nd\n";
        let edits = diff_edits(old, new, TextSize::from(10));
        assert_eq!(
            edits,
            vec![
                TextEdit::new(TextRange::new(TextSize::from(12), TextSize::from(14)), "B\n"),
                TextEdit::new(TextRange::empty(TextSize::from(16)), "d\n"),
            ]
        );
    }

    #[test]
    fn assemble_sorts_and_dedupes_edits() {
        let file = FileId::new("/ws/a.go");
        let text = "package a\n\nvar x = 1\n";
        let snapshot = Snapshot::new([(file.clone(), text.to_string())]);
        let parsed = snapshot.parse(&file).unwrap();
        let at = |o: u32| parsed.pos(TextSize::from(o));
        let fix = SuggestedFix::new(
            "t",
            vec![
                Edit::replace(at(19), at(20), "2"),
                Edit::insert(at(9), "\n"),
                Edit::insert(at(9), "\n"),
            ],
        );
        let mut fset = FileSet::new();
        fset.add_file(file.clone(), TextSize::of(text));
        let edit = WorkspaceEdit::assemble(&fix, &fset, &snapshot).unwrap();
        assert_eq!(edit.files.len(), 1);
        assert_eq!(edit.files[0].version, Some(1));
        let applied = edit.apply(&snapshot).unwrap();
        assert_eq!(applied[0].1, "package a\n\n\nvar x = 2\n");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let file = FileId::new("/ws/a.go");
        let text = "package a\n";
        let snapshot = Snapshot::new([(file.clone(), text.to_string())]);
        let parsed = snapshot.parse(&file).unwrap();
        let at = |o: u32| parsed.pos(TextSize::from(o));
        let fix = SuggestedFix::new(
            "t",
            vec![Edit::replace(at(0), at(7), "x"), Edit::replace(at(3), at(9), "y")],
        );
        let mut fset = FileSet::new();
        fset.add_file(file, TextSize::of(text));
        assert!(matches!(
            WorkspaceEdit::assemble(&fix, &fset, &snapshot),
            Err(RefactorError::Edit(_))
        ));
    }

    #[test]
    fn created_files_become_create_then_edit() {
        let snapshot = Snapshot::new([(FileId::new("/ws/a.go"), "package a\n".to_string())]);
        let edit = WorkspaceEdit {
            files: Vec::new(),
            created: vec![NewFile {
                file: FileId::new("/ws/b.go"),
                text: "package a\n".into(),
            }],
        };
        let changes = edit.document_changes(&snapshot).unwrap();
        assert_eq!(
            changes,
            vec![
                DocumentChange::Create {
                    file: FileId::new("/ws/b.go")
                },
                DocumentChange::Edit {
                    file: FileId::new("/ws/b.go"),
                    version: Some(0),
                    edits: vec![RangeEdit {
                        range: Range::point(Position::new(0, 0)),
                        new_text: "package a\n".into(),
                    }],
                },
            ]
        );
    }
}
