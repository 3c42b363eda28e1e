use std::fmt;

use text_size::TextSize;
use vega_core::FileId;

/// A token position: a file's base plus a byte offset into that file.
///
/// Positions from different files never collide within one [`FileSet`], so a
/// single `Pos` identifies both the file and the offset. `Pos::NONE` (zero) is
/// never a valid position.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos(u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    pub fn new(base: u32, offset: TextSize) -> Pos {
        Pos(base + u32::from(offset))
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn offset_by(self, delta: u32) -> Pos {
        Pos(self.0 + delta)
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileEntry {
    file: FileId,
    base: u32,
    len: u32,
}

/// Assigns each file a disjoint range of [`Pos`] values.
///
/// A file of length `n` with base `b` owns positions `b..=b + n` (the end of
/// file is addressable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    files: Vec<FileEntry>,
    next_base: u32,
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSet {
    pub fn new() -> Self {
        FileSet {
            files: Vec::new(),
            next_base: 1,
        }
    }

    /// Register a file and return its base.
    pub fn add_file(&mut self, file: FileId, len: TextSize) -> u32 {
        let base = self.next_base;
        let len = u32::from(len);
        self.files.push(FileEntry { file, base, len });
        self.next_base = base + len + 1;
        base
    }

    pub fn base_of(&self, file: &FileId) -> Option<u32> {
        self.files.iter().find(|e| &e.file == file).map(|e| e.base)
    }

    pub fn pos(&self, file: &FileId, offset: TextSize) -> Option<Pos> {
        let entry = self.files.iter().find(|e| &e.file == file)?;
        let offset = u32::from(offset);
        (offset <= entry.len).then(|| Pos(entry.base + offset))
    }

    /// Resolve a position to its file and byte offset.
    pub fn resolve(&self, pos: Pos) -> Option<(&FileId, TextSize)> {
        if !pos.is_valid() {
            return None;
        }
        let idx = match self.files.binary_search_by_key(&pos.0, |e| e.base) {
            Ok(idx) => idx,
            Err(0) => return None,
            Err(idx) => idx - 1,
        };
        let entry = &self.files[idx];
        let offset = pos.0 - entry.base;
        (offset <= entry.len).then(|| (&entry.file, TextSize::from(offset)))
    }

    pub fn files(&self) -> impl Iterator<Item = &FileId> {
        self.files.iter().map(|e| &e.file)
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.resolve(pos).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_resolve_to_their_file() {
        let mut fset = FileSet::new();
        let a = FileId::new("/p/a.go");
        let b = FileId::new("/p/b.go");
        let base_a = fset.add_file(a.clone(), TextSize::from(10));
        let base_b = fset.add_file(b.clone(), TextSize::from(4));
        assert_eq!(base_a, 1);
        assert_eq!(base_b, 12);

        let pos = fset.pos(&b, TextSize::from(3)).unwrap();
        assert_eq!(fset.resolve(pos), Some((&b, TextSize::from(3))));
        let end_of_a = fset.pos(&a, TextSize::from(10)).unwrap();
        assert_eq!(fset.resolve(end_of_a), Some((&a, TextSize::from(10))));
        assert_eq!(fset.resolve(Pos::NONE), None);
        assert!(fset.pos(&a, TextSize::from(11)).is_none());
    }
}
