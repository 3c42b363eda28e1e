mod diagnostics;
mod objects;

use std::collections::BTreeMap;
use std::sync::Arc;

use vega_core::{FileId, TextSize};
use vega_syntax::{FileSet, ParsedFile};
use vega_types::{stdlib, PackageSource, PkgId, Program};

/// Type-check workspace files (`/ws/<dir>/<name>.go`); each directory is
/// one package with import path `example.com/<dir>`.
pub(crate) fn check(files: &[(&str, &str)]) -> Program {
    let mut fset = FileSet::new();
    let mut sources = stdlib::load(&mut fset);
    let mut by_dir: BTreeMap<String, Vec<Arc<ParsedFile>>> = BTreeMap::new();
    for (path, text) in files {
        let file = FileId::new(*path);
        let base = fset.add_file(file.clone(), TextSize::of(*text));
        let parsed = ParsedFile::parse(file.clone(), base, *text);
        by_dir
            .entry(file.dir().to_string())
            .or_default()
            .push(Arc::new(parsed));
    }
    for (dir, files) in by_dir {
        let rel = dir.trim_start_matches("/ws").trim_start_matches('/');
        sources.push(PackageSource {
            path: format!("example.com/{rel}"),
            dir,
            files,
            module: Some("example.com".to_string()),
            std: false,
        });
    }
    Program::check(fset, sources)
}

pub(crate) fn pkg(program: &Program, path: &str) -> PkgId {
    program
        .package_by_path(path)
        .unwrap_or_else(|| panic!("no package {path}"))
}

/// Messages of the type errors reported for `path`.
pub(crate) fn messages(program: &Program, path: &str) -> Vec<String> {
    program
        .view(pkg(program, path))
        .type_errors()
        .iter()
        .map(|e| e.message.clone())
        .collect()
}
