//! Declarations of the standard-library packages available to checked code.
//!
//! Each package is a single Go file of declarations (function bodies are
//! omitted), enough to type-check calls into it.

use std::sync::Arc;

use vega_core::{FileId, TextSize};
use vega_syntax::{FileSet, ParsedFile};

use crate::program::PackageSource;

/// Directory the standard library files live under.
pub const GOROOT: &str = "/goroot/src";

const PACKAGES: &[(&str, &str)] = &[
    ("bytes", include_str!("stdlib/bytes.go")),
    ("context", include_str!("stdlib/context.go")),
    ("embed", include_str!("stdlib/embed.go")),
    ("errors", include_str!("stdlib/errors.go")),
    ("fmt", include_str!("stdlib/fmt.go")),
    ("io", include_str!("stdlib/io.go")),
    ("math", include_str!("stdlib/math.go")),
    ("os", include_str!("stdlib/os.go")),
    ("sort", include_str!("stdlib/sort.go")),
    ("strconv", include_str!("stdlib/strconv.go")),
    ("strings", include_str!("stdlib/strings.go")),
    ("sync", include_str!("stdlib/sync.go")),
    ("testing", include_str!("stdlib/testing.go")),
    ("time", include_str!("stdlib/time.go")),
];

/// Import paths of the bundled packages.
pub fn paths() -> impl Iterator<Item = &'static str> {
    PACKAGES.iter().map(|(path, _)| *path)
}

/// Whether an import path names a standard-library package: its first
/// element has no dot.
pub fn is_std_path(path: &str) -> bool {
    !path.split('/').next().unwrap_or(path).contains('.')
}

/// Parse the bundled packages, registering their files in `fset`.
pub fn load(fset: &mut FileSet) -> Vec<PackageSource> {
    PACKAGES
        .iter()
        .map(|(path, text)| {
            let dir = format!("{GOROOT}/{path}");
            let file = FileId::new(format!("{dir}/{path}.go"));
            let base = fset.add_file(file.clone(), TextSize::of(*text));
            let parsed = ParsedFile::parse(file, base, *text);
            if parsed.has_errors() {
                tracing::warn!(target: "vega.types", package = path, "bundled package has syntax errors");
            }
            PackageSource {
                path: (*path).to_string(),
                dir,
                files: vec![Arc::new(parsed)],
                module: None,
                std: true,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_paths_have_no_dot_in_first_element() {
        assert!(is_std_path("fmt"));
        assert!(is_std_path("net/http"));
        assert!(!is_std_path("example.com/m/pkg"));
    }

    #[test]
    fn bundled_packages_parse_cleanly() {
        let mut fset = FileSet::new();
        for source in load(&mut fset) {
            for file in &source.files {
                assert!(!file.has_errors(), "{}: {:?}", source.path, file.errors);
            }
        }
    }
}
