//! Package metadata: which files form which package, and how packages
//! import each other.
//!
//! Files of one directory sharing a package clause form a package. Test
//! files declaring `package <name>_test` form the directory's external test
//! package, whose import path carries a `_test` suffix. Import paths are
//! the enclosing module's path (from the nearest `go.mod`) joined with the
//! directory relative to the module root; outside any module the directory
//! itself is the import path.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use vega_core::{FileId, Name};
use vega_syntax::ParsedFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub path: String,
    pub name: Name,
    pub dir: String,
    pub module: Option<String>,
    pub files: Vec<FileId>,
    /// Import paths mentioned by the package's files.
    pub imports: BTreeSet<String>,
    /// External test package (`package p_test`).
    pub for_test: bool,
}

/// A package that can be imported: its path and declared name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct KnownPackage {
    pub path: String,
    pub name: Name,
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    packages: Vec<PackageMetadata>,
    /// Module root directory to module path.
    modules: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    dir: String,
    name: Name,
}

impl Metadata {
    /// Group `files` into packages. `go_mods` are the `go.mod` files of the
    /// workspace with their text.
    pub fn build(files: &[Arc<ParsedFile>], go_mods: &[(FileId, Arc<str>)]) -> Metadata {
        let modules: BTreeMap<String, String> = go_mods
            .iter()
            .filter_map(|(file, text)| Some((file.dir().to_string(), parse_module_path(text)?)))
            .collect();

        let mut groups: BTreeMap<GroupKey, Vec<&Arc<ParsedFile>>> = BTreeMap::new();
        for file in files {
            let Some(name) = file.tree.package_name() else {
                tracing::debug!(target: "vega.db", file = %file.file, "file has no package clause");
                continue;
            };
            groups
                .entry(GroupKey {
                    dir: file.file.dir().to_string(),
                    name: name.clone(),
                })
                .or_default()
                .push(file);
        }

        let mut packages = Vec::new();
        for (key, members) in groups {
            let module = enclosing_module(&modules, &key.dir);
            let base_path = match &module {
                Some((root, path)) => join_import_path(path, relative_dir(root, &key.dir)),
                None => key.dir.trim_start_matches('/').to_string(),
            };
            let for_test = key.name.ends_with("_test") && members.iter().all(|f| f.file.is_test_file());
            let path = if for_test {
                format!("{base_path}_test")
            } else {
                base_path
            };
            let imports = members
                .iter()
                .flat_map(|f| {
                    f.tree
                        .imports()
                        .iter()
                        .filter_map(|spec| f.tree.import_path(*spec))
                        .collect::<Vec<_>>()
                })
                .collect();
            packages.push(PackageMetadata {
                path,
                name: key.name,
                dir: key.dir,
                module: module.map(|(_, path)| path.to_string()),
                files: members.iter().map(|f| f.file.clone()).collect(),
                imports,
                for_test,
            });
        }
        tracing::debug!(target: "vega.db", packages = packages.len(), modules = modules.len(), "built metadata");
        Metadata { packages, modules }
    }

    pub fn packages(&self) -> &[PackageMetadata] {
        &self.packages
    }

    pub fn package(&self, path: &str) -> Option<&PackageMetadata> {
        self.packages.iter().find(|p| p.path == path)
    }

    /// The package that contains `file`.
    pub fn package_of_file(&self, file: &FileId) -> Option<&PackageMetadata> {
        self.packages.iter().find(|p| p.files.contains(file))
    }

    /// The non-test package of directory `dir`.
    pub fn package_in_dir(&self, dir: &str) -> Option<&PackageMetadata> {
        self.packages.iter().find(|p| p.dir == dir && !p.for_test)
    }

    /// Path of the module enclosing `dir`.
    pub fn module_of(&self, dir: &str) -> Option<&str> {
        enclosing_module(&self.modules, dir).map(|(_, path)| path)
    }

    /// Packages that import `path`, directly or transitively, including the
    /// package itself, in breadth-first order.
    pub fn reverse_dependencies(&self, path: &str) -> Vec<&PackageMetadata> {
        let mut out: Vec<&PackageMetadata> = self.package(path).into_iter().collect();
        let mut seen: BTreeSet<&str> = out.iter().map(|p| p.path.as_str()).collect();
        let mut i = 0;
        while i < out.len() {
            let target = out[i].path.clone();
            for pkg in &self.packages {
                if pkg.imports.contains(&target) && seen.insert(pkg.path.as_str()) {
                    out.push(pkg);
                }
            }
            i += 1;
        }
        out
    }

    /// Workspace packages other code may import.
    pub fn importable(&self) -> impl Iterator<Item = KnownPackage> + '_ {
        self.packages
            .iter()
            .filter(|p| !p.for_test && p.name != "main")
            .map(|p| KnownPackage {
                path: p.path.clone(),
                name: p.name.clone(),
            })
    }
}

/// The module path declared by a `go.mod` file.
pub fn parse_module_path(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}

fn enclosing_module<'m>(modules: &'m BTreeMap<String, String>, dir: &str) -> Option<(&'m str, &'m str)> {
    modules
        .iter()
        .filter(|(root, _)| relative_dir_opt(root, dir).is_some())
        .max_by_key(|(root, _)| root.len())
        .map(|(root, path)| (root.as_str(), path.as_str()))
}

fn relative_dir_opt<'a>(root: &str, dir: &'a str) -> Option<&'a str> {
    if root == "/" {
        return Some(dir.trim_start_matches('/'));
    }
    let rest = dir.strip_prefix(root)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

fn relative_dir<'a>(root: &str, dir: &'a str) -> &'a str {
    relative_dir_opt(root, dir).unwrap_or(dir)
}

fn join_import_path(module: &str, rel: &str) -> String {
    if rel.is_empty() {
        module.to_string()
    } else {
        format!("{module}/{rel}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_path_ignores_comments_and_quotes() {
        assert_eq!(
            parse_module_path("// header\nmodule \"example.com/m\" // trailing\n\ngo 1.22\n"),
            Some("example.com/m".to_string())
        );
        assert_eq!(parse_module_path("modulex foo\n"), None);
    }

    #[test]
    fn nested_modules_win() {
        let modules = BTreeMap::from([
            ("/ws".to_string(), "example.com/outer".to_string()),
            ("/ws/inner".to_string(), "example.com/inner".to_string()),
        ]);
        assert_eq!(
            enclosing_module(&modules, "/ws/inner/pkg"),
            Some(("/ws/inner", "example.com/inner"))
        );
        assert_eq!(enclosing_module(&modules, "/ws/innerx"), Some(("/ws", "example.com/outer")));
        assert_eq!(enclosing_module(&modules, "/other"), None);
    }
}
