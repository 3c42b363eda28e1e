use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use thiserror::Error;
use vega_core::{FileId, TextSize};
use vega_scheduler::{Cancelled, RequestContext};
use vega_syntax::{FileSet, ParsedFile};
use vega_types::{stdlib, PackageSource, PackageView, Program};

use crate::metadata::{KnownPackage, Metadata};
use crate::source_db::SourceDatabase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("no such file in snapshot: {0}")]
    UnknownFile(FileId),
    #[error("not a Go file: {0}")]
    NotGoFile(FileId),
    #[error("no package contains {0}")]
    NoPackage(FileId),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

#[derive(Debug, Clone)]
struct FileEntry {
    text: Arc<str>,
    version: i32,
}

#[derive(Debug)]
struct SnapshotData {
    version: u64,
    files: BTreeMap<FileId, FileEntry>,
    /// Layout of the Go files; parsed files and the program share it so
    /// token positions agree.
    fset: FileSet,
    parsed: Mutex<HashMap<FileId, Arc<ParsedFile>>>,
    metadata: OnceCell<Arc<Metadata>>,
    program: OnceCell<Arc<Program>>,
}

/// An immutable, versioned view of the workspace.
///
/// Cloning is cheap; clones share the lazily computed parse results,
/// metadata and type information.
#[derive(Debug, Clone)]
pub struct Snapshot {
    data: Arc<SnapshotData>,
}

impl Snapshot {
    /// A snapshot at version 0 whose files are all at document version 1.
    pub fn new(files: impl IntoIterator<Item = (FileId, String)>) -> Snapshot {
        let files = files
            .into_iter()
            .map(|(file, text)| {
                (
                    file,
                    FileEntry {
                        text: text.into(),
                        version: 1,
                    },
                )
            })
            .collect();
        Snapshot::from_entries(0, files)
    }

    fn from_entries(version: u64, files: BTreeMap<FileId, FileEntry>) -> Snapshot {
        let mut fset = FileSet::new();
        for (file, entry) in &files {
            if file.is_go_file() {
                fset.add_file(file.clone(), TextSize::of(&*entry.text));
            }
        }
        Snapshot {
            data: Arc::new(SnapshotData {
                version,
                files,
                fset,
                parsed: Mutex::new(HashMap::new()),
                metadata: OnceCell::new(),
                program: OnceCell::new(),
            }),
        }
    }

    /// A new snapshot with `changes` applied. Changed files get the next
    /// document version; new files start at version 0.
    pub fn with_overlay(&self, changes: impl IntoIterator<Item = (FileId, String)>) -> Snapshot {
        let mut files = self.data.files.clone();
        for (file, text) in changes {
            let version = files.get(&file).map_or(0, |e| e.version + 1);
            files.insert(
                file,
                FileEntry {
                    text: text.into(),
                    version,
                },
            );
        }
        Snapshot::from_entries(self.data.version + 1, files)
    }

    pub fn version(&self) -> u64 {
        self.data.version
    }

    pub fn contains(&self, file: &FileId) -> bool {
        self.data.files.contains_key(file)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileId> {
        self.data.files.keys()
    }

    pub fn text(&self, file: &FileId) -> Result<Arc<str>, SnapshotError> {
        self.data
            .files
            .get(file)
            .map(|e| e.text.clone())
            .ok_or_else(|| SnapshotError::UnknownFile(file.clone()))
    }

    /// The parse of `file`, cached for the snapshot's lifetime.
    pub fn parse(&self, file: &FileId) -> Result<Arc<ParsedFile>, SnapshotError> {
        if !file.is_go_file() {
            return Err(SnapshotError::NotGoFile(file.clone()));
        }
        let text = self.text(file)?;
        if let Some(parsed) = self.data.parsed.lock().get(file) {
            return Ok(parsed.clone());
        }
        let base = self
            .data
            .fset
            .base_of(file)
            .ok_or_else(|| SnapshotError::UnknownFile(file.clone()))?;
        let parsed = Arc::new(ParsedFile::parse(file.clone(), base, text));
        Ok(self
            .data
            .parsed
            .lock()
            .entry(file.clone())
            .or_insert(parsed)
            .clone())
    }

    fn go_files(&self) -> Result<Vec<Arc<ParsedFile>>, SnapshotError> {
        self.data
            .files
            .keys()
            .filter(|f| f.is_go_file())
            .map(|f| self.parse(f))
            .collect()
    }

    pub fn metadata(&self) -> Result<&Metadata, SnapshotError> {
        let metadata = self.data.metadata.get_or_try_init(|| {
            let files = self.go_files()?;
            let go_mods: Vec<_> = self
                .data
                .files
                .iter()
                .filter(|(f, _)| f.file_name() == "go.mod")
                .map(|(f, e)| (f.clone(), e.text.clone()))
                .collect();
            Ok::<_, SnapshotError>(Arc::new(Metadata::build(&files, &go_mods)))
        })?;
        Ok(metadata)
    }

    /// Type-check every workspace package, together with the bundled
    /// standard library. The result is cached.
    pub fn program(&self, cx: &RequestContext) -> Result<&Program, SnapshotError> {
        if let Some(program) = self.data.program.get() {
            return Ok(program);
        }
        cx.check()?;
        let metadata = self.metadata()?;
        cx.check()?;
        let program = self.data.program.get_or_try_init(|| {
            let _span = tracing::debug_span!(
                target: "vega.db",
                "type_check",
                version = self.data.version,
                packages = metadata.packages().len()
            )
            .entered();
            let mut fset = self.data.fset.clone();
            let mut sources = stdlib::load(&mut fset);
            for pkg in metadata.packages() {
                let files = pkg
                    .files
                    .iter()
                    .map(|f| self.parse(f))
                    .collect::<Result<Vec<_>, _>>()?;
                sources.push(PackageSource {
                    path: pkg.path.clone(),
                    dir: pkg.dir.clone(),
                    files,
                    module: pkg.module.clone(),
                    std: false,
                });
            }
            Ok::<_, SnapshotError>(Arc::new(Program::check(fset, sources)))
        })?;
        Ok(program)
    }

    /// The narrowest checked package containing `file`, plus the file as
    /// that package parsed it.
    pub fn package_for_file(
        &self,
        cx: &RequestContext,
        file: &FileId,
    ) -> Result<(PackageView<'_>, Arc<ParsedFile>), SnapshotError> {
        let program = self.program(cx)?;
        let pkg = program
            .package_of_file(file)
            .ok_or_else(|| SnapshotError::NoPackage(file.clone()))?;
        let view = program.view(pkg);
        let parsed = view
            .file(file)
            .cloned()
            .ok_or_else(|| SnapshotError::NoPackage(file.clone()))?;
        Ok((view, parsed))
    }

    /// Packages an import may name: workspace packages and the standard
    /// library, sorted by path.
    pub fn known_packages(&self) -> Result<Vec<KnownPackage>, SnapshotError> {
        let mut out: Vec<KnownPackage> = self.metadata()?.importable().collect();
        out.extend(stdlib::paths().map(|path| KnownPackage {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).into(),
        }));
        out.sort();
        out.dedup();
        Ok(out)
    }
}

impl SourceDatabase for Snapshot {
    fn file_text(&self, file: &FileId) -> Option<Arc<str>> {
        self.data.files.get(file).map(|e| e.text.clone())
    }

    fn file_version(&self, file: &FileId) -> Option<i32> {
        self.data.files.get(file).map(|e| e.version)
    }

    fn all_files(&self) -> Vec<FileId> {
        self.data.files.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_results_are_shared_between_clones() {
        let file = FileId::new("/ws/a.go");
        let snapshot = Snapshot::new([(file.clone(), "package a\n".to_string())]);
        let clone = snapshot.clone();
        let first = snapshot.parse(&file).unwrap();
        let second = clone.parse(&file).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn overlays_bump_versions() {
        let file = FileId::new("/ws/a.go");
        let snapshot = Snapshot::new([(file.clone(), "package a\n".to_string())]);
        let next = snapshot.with_overlay([
            (file.clone(), "package a\n\nvar x = 1\n".to_string()),
            (FileId::new("/ws/b.go"), "package a\n".to_string()),
        ]);
        assert_eq!(next.version(), 1);
        assert_eq!(next.file_version(&file), Some(2));
        assert_eq!(next.file_version(&FileId::new("/ws/b.go")), Some(0));
        assert_eq!(&*snapshot.text(&file).unwrap(), "package a\n");
    }

    #[test]
    fn cancelled_requests_do_not_type_check() {
        let snapshot = Snapshot::new([(FileId::new("/ws/a.go"), "package a\n".to_string())]);
        let cx = RequestContext::detached();
        cx.token().cancel();
        assert!(matches!(snapshot.program(&cx), Err(SnapshotError::Cancelled(_))));
    }
}
