//! Test, benchmark, fuzz and example functions of `_test.go` files.

use vega_core::TextRange;
use vega_syntax::{NodeId, NodeKind, ParsedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    Test,
    Benchmark,
    Fuzz,
    Example,
}

impl TestKind {
    fn prefix(self) -> &'static str {
        match self {
            TestKind::Test => "Test",
            TestKind::Benchmark => "Benchmark",
            TestKind::Fuzz => "Fuzz",
            TestKind::Example => "Example",
        }
    }

    /// The `testing` parameter type, `None` for examples.
    fn param(self) -> Option<&'static str> {
        match self {
            TestKind::Test => Some("*testing.T"),
            TestKind::Benchmark => Some("*testing.B"),
            TestKind::Fuzz => Some("*testing.F"),
            TestKind::Example => None,
        }
    }

    pub fn is_benchmark(self) -> bool {
        self == TestKind::Benchmark
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFunc {
    pub name: String,
    pub kind: TestKind,
    pub decl: NodeId,
    /// Range of the function name.
    pub name_range: TextRange,
}

/// `go test` runs `name` as a `prefix` function when the rest of the name
/// does not start with a lowercase letter.
fn has_test_prefix(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => !rest.chars().next().is_some_and(char::is_lowercase),
        None => false,
    }
}

fn test_kind(file: &ParsedFile, name: &str, ty: NodeId) -> Option<TestKind> {
    let tree = &file.tree;
    let NodeKind::FuncType {
        type_params,
        params,
        results,
    } = tree.kind(ty)
    else {
        return None;
    };
    if type_params.is_some() || results.is_some() {
        return None;
    }
    let NodeKind::FieldList { fields, .. } = tree.kind(*params) else {
        return None;
    };
    let kind = [TestKind::Test, TestKind::Benchmark, TestKind::Fuzz, TestKind::Example]
        .into_iter()
        .find(|kind| has_test_prefix(name, kind.prefix()))?;
    match (kind.param(), fields.as_slice()) {
        (None, []) => Some(kind),
        (Some(expected), [field]) => {
            let NodeKind::Field { names, ty, .. } = tree.kind(*field) else {
                return None;
            };
            let written: String = file.text_of(*ty).split_whitespace().collect();
            (names.len() <= 1 && written == expected).then_some(kind)
        }
        _ => None,
    }
}

/// The test functions `go test` would run from `file`, in source order.
pub fn discover_tests(file: &ParsedFile) -> Vec<TestFunc> {
    if !file.file.is_test_file() {
        return Vec::new();
    }
    let tree = &file.tree;
    tree.decls()
        .iter()
        .filter_map(|&decl| {
            let NodeKind::FuncDecl {
                recv: None,
                name,
                ty,
                body: Some(_),
            } = tree.kind(decl)
            else {
                return None;
            };
            let ident = tree.ident_name(*name)?;
            let kind = test_kind(file, ident, *ty)?;
            Some(TestFunc {
                name: ident.to_string(),
                kind,
                decl,
                name_range: tree.range(*name),
            })
        })
        .collect()
}

/// Tests whose declarations intersect `range`. An empty range selects the
/// declaration containing it.
pub fn tests_in_range(file: &ParsedFile, range: TextRange) -> Vec<TestFunc> {
    discover_tests(file)
        .into_iter()
        .filter(|test| {
            let decl = file.tree.range(test.decl);
            if range.is_empty() {
                decl.contains_inclusive(range.start())
            } else {
                decl.intersect(range).is_some_and(|r| !r.is_empty())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vega_core::{FileId, TextSize};

    fn names(path: &str, src: &str) -> Vec<(String, TestKind)> {
        let file = ParsedFile::parse(FileId::new(path), 1, src);
        discover_tests(&file).into_iter().map(|t| (t.name, t.kind)).collect()
    }

    #[test]
    fn prefixes_follow_go_test_rules() {
        assert!(has_test_prefix("Test", "Test"));
        assert!(has_test_prefix("TestParse", "Test"));
        assert!(has_test_prefix("Test_parse", "Test"));
        assert!(!has_test_prefix("Testify", "Test"));
        assert!(!has_test_prefix("test", "Test"));
    }

    #[test]
    fn finds_each_kind_with_the_right_signature() {
        let src = "package p\n\nimport \"testing\"\n\n\
                   func TestA(t *testing.T) {}\n\n\
                   func BenchmarkB(b *testing.B) {}\n\n\
                   func FuzzC(f *testing.F) {}\n\n\
                   func ExampleD() {}\n\n\
                   func TestWrong(b *testing.B) {}\n\n\
                   func helper(t *testing.T) {}\n\n\
                   func ExampleArgs(x int) {}\n";
        assert_eq!(
            names("/ws/p/a_test.go", src),
            vec![
                ("TestA".to_string(), TestKind::Test),
                ("BenchmarkB".to_string(), TestKind::Benchmark),
                ("FuzzC".to_string(), TestKind::Fuzz),
                ("ExampleD".to_string(), TestKind::Example),
            ]
        );
    }

    #[test]
    fn only_test_files_have_tests() {
        let src = "package p\n\nimport \"testing\"\n\nfunc TestA(t *testing.T) {}\n";
        assert!(names("/ws/p/a.go", src).is_empty());
    }

    #[test]
    fn selection_picks_intersecting_declarations() {
        let src = "package p\n\nimport \"testing\"\n\nfunc TestA(t *testing.T) {}\n\nfunc TestB(t *testing.T) {}\n";
        let file = ParsedFile::parse(FileId::new("/ws/p/a_test.go"), 1, src);
        let at = TextSize::from(src.find("TestB").unwrap() as u32);
        let found: Vec<_> = tests_in_range(&file, TextRange::empty(at)).into_iter().map(|t| t.name).collect();
        assert_eq!(found, vec!["TestB"]);
        let all = TextRange::new(TextSize::from(0), TextSize::of(src));
        assert_eq!(tests_in_range(&file, all).len(), 2);
    }
}
