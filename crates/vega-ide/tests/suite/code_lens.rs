use lsp_types::{Position, Range};
use pretty_assertions::assert_eq;
use vega_core::FileId;
use vega_ide::{code_lenses, command};

use super::harness::{uri, workspace};

#[test]
fn tests_and_benchmarks_get_run_lenses() {
    let ws = workspace(
        r#"
-- /ws/p/a_test.go --
package p

import "testing"

func TestA(t *testing.T) {}

func BenchmarkB(b *testing.B) {}

func ExampleA() {}

func helper(t *testing.T) {}
"#,
    );
    let lenses = code_lenses(&ws.snapshot, &FileId::new("/ws/p/a_test.go")).unwrap();
    let titles: Vec<&str> = lenses
        .iter()
        .map(|l| l.command.as_ref().map_or("", |c| c.title.as_str()))
        .collect();
    assert_eq!(titles, vec!["run file benchmarks", "run test", "run benchmark", "run test"]);
    assert!(lenses
        .iter()
        .all(|l| l.command.as_ref().is_some_and(|c| c.command == command::RUN_TESTS)));

    assert_eq!(lenses[0].range, Range::new(Position::new(0, 8), Position::new(0, 9)));
    let file_args = &lenses[0].command.as_ref().unwrap().arguments.as_ref().unwrap()[0];
    assert_eq!(file_args["benchmarks"], serde_json::json!(["BenchmarkB"]));

    assert_eq!(lenses[1].range, ws.range_of("/ws/p/a_test.go", "TestA"));
    let test_args = &lenses[1].command.as_ref().unwrap().arguments.as_ref().unwrap()[0];
    assert_eq!(test_args["tests"], serde_json::json!(["TestA"]));
    assert_eq!(test_args["uri"], serde_json::json!(uri("/ws/p/a_test.go").as_str()));
}

#[test]
fn files_without_benchmarks_have_no_file_lens() {
    let ws = workspace(
        r#"
-- /ws/p/a_test.go --
package p

import "testing"

func TestA(t *testing.T) {}
"#,
    );
    let lenses = code_lenses(&ws.snapshot, &FileId::new("/ws/p/a_test.go")).unwrap();
    assert_eq!(lenses.len(), 1);
    assert_eq!(lenses[0].command.as_ref().unwrap().title, "run test");
}

#[test]
fn ordinary_files_have_no_lenses() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func TestA() {}
"#,
    );
    assert!(code_lenses(&ws.snapshot, &FileId::new("/ws/p/a.go")).unwrap().is_empty());
}
