use vega_core::{FileId, TextRange, TextSize};

const START_MARKER: &str = "/*start*/";
const END_MARKER: &str = "/*end*/";
const CURSOR_MARKER: &str = "/*cursor*/";

/// Extracts a byte range selection from a fixture containing `/*start*/` and
/// `/*end*/` markers, or a single `/*cursor*/` marker for an empty range.
///
/// Returns the fixture with markers removed and the selection pointing at
/// the extracted region.
pub fn extract_range(fixture: &str) -> (String, TextRange) {
    try_extract_range(fixture).expect("fixture missing /*start*/../*end*/ or /*cursor*/ markers")
}

fn try_extract_range(fixture: &str) -> Option<(String, TextRange)> {
    if let Some(at) = fixture.find(CURSOR_MARKER) {
        let mut text = String::with_capacity(fixture.len());
        text.push_str(&fixture[..at]);
        text.push_str(&fixture[at + CURSOR_MARKER.len()..]);
        return Some((text, TextRange::empty(TextSize::from(at as u32))));
    }

    let start = fixture.find(START_MARKER)?;
    let after_start = start + START_MARKER.len();
    let end = fixture.find(END_MARKER)?;
    assert!(end >= after_start, "/*end*/ must come after /*start*/");

    let mut text = String::with_capacity(fixture.len());
    text.push_str(&fixture[..start]);
    text.push_str(&fixture[after_start..end]);
    text.push_str(&fixture[end + END_MARKER.len()..]);

    // The start stays put; the end shrinks by the start marker's length.
    let range = TextRange::new(
        TextSize::from(start as u32),
        TextSize::from((end - START_MARKER.len()) as u32),
    );
    Some((text, range))
}

/// A multi-file workspace written as one string:
///
/// ```text
/// -- /ws/go.mod --
/// module example.com/m
/// -- /ws/p/a.go --
/// package p
/// ```
///
/// At most one file may carry selection markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFixture {
    pub files: Vec<(FileId, String)>,
    pub selection: Option<(FileId, TextRange)>,
}

impl WorkspaceFixture {
    #[must_use]
    pub fn parse(fixture: &str) -> Self {
        let mut files: Vec<(FileId, String)> = Vec::new();
        let mut selection = None;
        let mut current: Option<(FileId, String)> = None;

        let mut finish = |current: Option<(FileId, String)>, files: &mut Vec<(FileId, String)>| {
            let Some((file, text)) = current else {
                return;
            };
            let text = match try_extract_range(&text) {
                Some((stripped, range)) => {
                    assert!(selection.is_none(), "more than one file has selection markers");
                    selection = Some((file.clone(), range));
                    stripped
                }
                None => text,
            };
            files.push((file, text));
        };

        for line in fixture.split_inclusive('\n') {
            let header = line
                .trim_end()
                .strip_prefix("-- ")
                .and_then(|rest| rest.strip_suffix(" --"));
            match header {
                Some(path) => {
                    finish(current.take(), &mut files);
                    current = Some((FileId::new(path.trim()), String::new()));
                }
                None => match &mut current {
                    Some((_, text)) => text.push_str(line),
                    None => assert!(
                        line.trim().is_empty(),
                        "fixture text before the first `-- path --` header"
                    ),
                },
            }
        }
        finish(current.take(), &mut files);
        tracing::trace!(target: "vega.test_utils", files = files.len(), "parsed workspace fixture");

        WorkspaceFixture { files, selection }
    }

    pub fn text(&self, file: &FileId) -> &str {
        self.files
            .iter()
            .find(|(f, _)| f == file)
            .map(|(_, text)| text.as_str())
            .unwrap_or_else(|| panic!("fixture has no file {file}"))
    }

    /// The selected file and range; panics when the fixture has no markers.
    pub fn selection(&self) -> (FileId, TextRange) {
        self.selection.clone().expect("fixture has no selection markers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_markers_are_stripped() {
        let (text, range) = extract_range("a /*start*/bc/*end*/ d");
        assert_eq!(text, "a bc d");
        assert_eq!(&text[range], "bc");
    }

    #[test]
    fn cursor_marker_yields_empty_range() {
        let (text, range) = extract_range("ab/*cursor*/c");
        assert_eq!(text, "abc");
        assert_eq!(range, TextRange::empty(TextSize::from(2)));
    }

    #[test]
    fn workspace_fixture_splits_files() {
        let ws = WorkspaceFixture::parse(
            "-- /ws/go.mod --\nmodule example.com/m\n-- /ws/p/a.go --\npackage p\n\nvar /*start*/x/*end*/ = 1\n",
        );
        assert_eq!(ws.files.len(), 2);
        assert_eq!(ws.text(&FileId::new("/ws/go.mod")), "module example.com/m\n");
        let (file, range) = ws.selection();
        assert_eq!(file, FileId::new("/ws/p/a.go"));
        assert_eq!(&ws.text(&file)[range], "x");
    }
}
