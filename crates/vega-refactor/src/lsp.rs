use std::collections::HashMap;

use lsp_types::{
    CreateFile, DeleteFile, DocumentChangeOperation, DocumentChanges, OneOf,
    OptionalVersionedTextDocumentIdentifier, RenameFile, ResourceOp, TextDocumentEdit,
    TextEdit as LspTextEdit, Uri, WorkspaceEdit as LspWorkspaceEdit,
};
use thiserror::Error;
use vega_core::FileId;

use crate::edit::{DocumentChange, RangeEdit};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LspConversionError {
    #[error("invalid uri for {0}")]
    InvalidUri(FileId),
    #[error("the client cannot apply file operations")]
    FileOperationsUnsupported,
}

pub fn file_uri(file: &FileId) -> Result<Uri, LspConversionError> {
    file.to_uri()
        .parse::<Uri>()
        .map_err(|_| LspConversionError::InvalidUri(file.clone()))
}

fn lsp_edit(edit: &RangeEdit) -> LspTextEdit {
    LspTextEdit {
        range: edit.range.into(),
        new_text: edit.new_text.clone(),
    }
}

/// Convert document changes into an LSP workspace edit.
///
/// Clients with `documentChanges` support get versioned document edits and
/// resource operations in order. Other clients get a plain `changes` map,
/// which cannot express file operations.
pub fn workspace_edit_to_lsp(
    changes: &[DocumentChange],
    document_changes_supported: bool,
) -> Result<LspWorkspaceEdit, LspConversionError> {
    if document_changes_supported {
        let mut ops = Vec::with_capacity(changes.len());
        for change in changes {
            ops.push(match change {
                DocumentChange::Edit {
                    file,
                    version,
                    edits,
                } => DocumentChangeOperation::Edit(TextDocumentEdit {
                    text_document: OptionalVersionedTextDocumentIdentifier {
                        uri: file_uri(file)?,
                        version: *version,
                    },
                    edits: edits.iter().map(|e| OneOf::Left(lsp_edit(e))).collect(),
                }),
                DocumentChange::Create { file } => DocumentChangeOperation::Op(ResourceOp::Create(CreateFile {
                    uri: file_uri(file)?,
                    options: None,
                    annotation_id: None,
                })),
                DocumentChange::Rename { old, new } => DocumentChangeOperation::Op(ResourceOp::Rename(RenameFile {
                    old_uri: file_uri(old)?,
                    new_uri: file_uri(new)?,
                    options: None,
                    annotation_id: None,
                })),
                DocumentChange::Delete { file } => DocumentChangeOperation::Op(ResourceOp::Delete(DeleteFile {
                    uri: file_uri(file)?,
                    options: None,
                })),
            });
        }
        return Ok(LspWorkspaceEdit {
            changes: None,
            document_changes: Some(DocumentChanges::Operations(ops)),
            change_annotations: None,
        });
    }

    let mut map: HashMap<Uri, Vec<LspTextEdit>> = HashMap::new();
    for change in changes {
        match change {
            DocumentChange::Edit { file, edits, .. } => {
                map.entry(file_uri(file)?)
                    .or_default()
                    .extend(edits.iter().map(lsp_edit));
            }
            _ => return Err(LspConversionError::FileOperationsUnsupported),
        }
    }
    // Some clients apply edits in sequence; last-to-first keeps offsets valid.
    for edits in map.values_mut() {
        edits.sort_by(|a, b| {
            (b.range.start.line, b.range.start.character, b.range.end.line, b.range.end.character).cmp(&(
                a.range.start.line,
                a.range.start.character,
                a.range.end.line,
                a.range.end.character,
            ))
        });
    }
    Ok(LspWorkspaceEdit {
        changes: Some(map),
        document_changes: None,
        change_annotations: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vega_core::{Position, Range};

    fn edit(line: u32, text: &str) -> RangeEdit {
        RangeEdit {
            range: Range::point(Position::new(line, 0)),
            new_text: text.into(),
        }
    }

    #[test]
    fn changes_map_is_sorted_last_to_first() {
        let file = FileId::new("/ws/a.go");
        let changes = vec![DocumentChange::Edit {
            file: file.clone(),
            version: Some(3),
            edits: vec![edit(1, "x"), edit(4, "y")],
        }];
        let lsp = workspace_edit_to_lsp(&changes, false).unwrap();
        let map = lsp.changes.unwrap();
        let edits = &map[&file_uri(&file).unwrap()];
        assert_eq!(edits[0].new_text, "y");
        assert_eq!(edits[1].new_text, "x");
    }

    #[test]
    fn file_creation_needs_document_changes() {
        let changes = vec![DocumentChange::Create {
            file: FileId::new("/ws/b.go"),
        }];
        assert_eq!(
            workspace_edit_to_lsp(&changes, false),
            Err(LspConversionError::FileOperationsUnsupported)
        );
        let lsp = workspace_edit_to_lsp(&changes, true).unwrap();
        assert!(matches!(
            lsp.document_changes,
            Some(DocumentChanges::Operations(ref ops)) if ops.len() == 1
        ));
    }
}
