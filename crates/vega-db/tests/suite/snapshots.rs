use pretty_assertions::assert_eq;
use vega_core::FileId;
use vega_db::{KnownPackage, Snapshot, SnapshotError};
use vega_scheduler::RequestContext;
use vega_test_utils::WorkspaceFixture;

const WORKSPACE: &str = r#"
-- /ws/go.mod --
module example.com/m

go 1.22
-- /ws/lib/lib.go --
package lib

func Double(x int) int { return x * 2 }
-- /ws/lib/lib_test.go --
package lib

import "testing"

func TestDouble(t *testing.T) {
	if Double(2) != 4 {
		t.Fatal("bad")
	}
}
-- /ws/lib/ext_test.go --
package lib_test

import (
	"testing"

	"example.com/m/lib"
)

func TestExternal(t *testing.T) {
	_ = lib.Double(1)
}
-- /ws/cmd/main.go --
package main

import "example.com/m/lib"

func main() { _ = lib.Double(3) }
"#;

fn snapshot() -> Snapshot {
    Snapshot::new(WorkspaceFixture::parse(WORKSPACE).files)
}

#[test]
fn metadata_groups_files_by_directory_and_package_clause() {
    let snapshot = snapshot();
    let metadata = snapshot.metadata().unwrap();
    let mut paths: Vec<_> = metadata.packages().iter().map(|p| p.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["example.com/m/cmd", "example.com/m/lib", "example.com/m/lib_test"]);

    let lib = metadata.package("example.com/m/lib").unwrap();
    assert_eq!(lib.files.len(), 2);
    assert!(!lib.for_test);
    let ext = metadata.package_of_file(&FileId::new("/ws/lib/ext_test.go")).unwrap();
    assert!(ext.for_test);
    assert_eq!(ext.module.as_deref(), Some("example.com/m"));

    let rdeps: Vec<_> = metadata
        .reverse_dependencies("example.com/m/lib")
        .iter()
        .map(|p| p.path.as_str())
        .collect();
    assert_eq!(rdeps, vec!["example.com/m/lib", "example.com/m/cmd", "example.com/m/lib_test"]);
}

#[test]
fn workspace_type_checks_cleanly() {
    let snapshot = snapshot();
    let cx = RequestContext::detached();
    let program = snapshot.program(&cx).unwrap();
    for pkg in program.packages().filter(|p| !p.std) {
        assert_eq!(pkg.errors, Vec::new(), "{}", pkg.path);
        assert_eq!(pkg.parse_errors, Vec::new(), "{}", pkg.path);
    }
    let (view, file) = snapshot
        .package_for_file(&cx, &FileId::new("/ws/lib/lib_test.go"))
        .unwrap();
    assert_eq!(view.path(), "example.com/m/lib");
    assert!(std::sync::Arc::ptr_eq(
        &file,
        &snapshot.parse(&FileId::new("/ws/lib/lib_test.go")).unwrap()
    ));
}

#[test]
fn known_packages_include_the_standard_library() {
    let known = snapshot().known_packages().unwrap();
    assert!(known.contains(&KnownPackage {
        path: "example.com/m/lib".to_string(),
        name: "lib".into(),
    }));
    assert!(known.contains(&KnownPackage {
        path: "fmt".to_string(),
        name: "fmt".into(),
    }));
    assert!(!known.iter().any(|p| p.path == "example.com/m/cmd"));
}

#[test]
fn non_go_files_are_not_parsed() {
    let err = snapshot().parse(&FileId::new("/ws/go.mod")).unwrap_err();
    assert_eq!(err, SnapshotError::NotGoFile(FileId::new("/ws/go.mod")));
}
