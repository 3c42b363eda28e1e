use pretty_assertions::assert_eq;
use vega_core::FileId;
use vega_refactor::imports::{import_quick_fixes, organize_imports, ImportFix, ImportFixKind, WorkspaceImportResolver};
use vega_refactor::SuggestedFix;

use super::harness::{workspace, Workspace};

fn quick_fixes(ws: &Workspace, path: &str) -> Vec<(ImportFix, SuggestedFix)> {
    let file = FileId::new(path);
    let (view, parsed) = ws.snapshot.package_for_file(&ws.cx, &file).unwrap();
    import_quick_fixes(&view, &parsed, &WorkspaceImportResolver::new(&ws.snapshot)).unwrap()
}

fn organized(ws: &Workspace, path: &str) -> Option<SuggestedFix> {
    let file = FileId::new(path);
    let (view, parsed) = ws.snapshot.package_for_file(&ws.cx, &file).unwrap();
    organize_imports(&view, &parsed, &WorkspaceImportResolver::new(&ws.snapshot)).unwrap()
}

#[test]
fn undefined_package_names_are_imported() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f() {
	fmt.Println("hi")
}
"#,
    );
    let fixes = quick_fixes(&ws, "/ws/p/a.go");
    assert_eq!(fixes.len(), 1);
    let (fix, suggested) = &fixes[0];
    assert_eq!(fix.kind, ImportFixKind::Add);
    assert_eq!(fix.path, "fmt");
    assert_eq!(suggested.message, "Add import: \"fmt\"");
    assert!(fix.resolves("undefined: fmt"));
    assert!(!fix.resolves("undefined: os"));
    assert!(ws.after(suggested, "/ws/p/a.go").contains("import \"fmt\""));
}

#[test]
fn workspace_packages_are_importable() {
    let ws = workspace(
        r#"
-- /ws/util/util.go --
package util

func Double(x int) int { return x * 2 }
-- /ws/p/a.go --
package p

import "fmt"

func f() {
	fmt.Println(util.Double(2))
}
"#,
    );
    let fixes = quick_fixes(&ws, "/ws/p/a.go");
    let (fix, suggested) = fixes
        .iter()
        .find(|(f, _)| f.ident == "util")
        .expect("util import fix");
    assert_eq!(fix.path, "example.com/m/util");
    assert_eq!(suggested.message, "Add import: \"example.com/m/util\"");
}

#[test]
fn unused_imports_are_deleted() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

import "os"

func f() {}
"#,
    );
    let fixes = quick_fixes(&ws, "/ws/p/a.go");
    assert_eq!(fixes.len(), 1);
    let (fix, suggested) = &fixes[0];
    assert_eq!(fix.kind, ImportFixKind::Delete);
    assert!(fix.resolves("\"os\" imported and not used"));
    assert_eq!(ws.after(suggested, "/ws/p/a.go"), "package p\n\nfunc f() {}\n");
}

#[test]
fn organize_imports_sorts_and_prunes() {
    let ws = workspace(
        r#"
-- /ws/util/util.go --
package util

func Double(x int) int { return x * 2 }
-- /ws/p/a.go --
package p

import (
	"strings"
	"example.com/m/util"
	"os"
	"fmt"
)

func f() {
	fmt.Println(strings.ToUpper("x"), util.Double(1))
}
"#,
    );
    let fix = organized(&ws, "/ws/p/a.go").unwrap();
    assert_eq!(fix.message, "Organize imports");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(
        text.contains("import (\n\t\"fmt\"\n\t\"strings\"\n\n\t\"example.com/m/util\"\n)\n"),
        "{text}"
    );
}

#[test]
fn organized_imports_are_left_alone() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

import "fmt"

func f() { fmt.Println() }
"#,
    );
    assert!(organized(&ws, "/ws/p/a.go").is_none());
}

#[test]
fn embed_directives_get_the_embed_import() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

//go:embed hello.txt
var /*cursor*/hello string
"#,
    );
    let fix = ws.fix("add_embed_import").unwrap().unwrap();
    assert!(ws.after(&fix, "/ws/p/a.go").contains("import _ \"embed\""));
}

#[test]
fn failed_imports_are_claimed_with_or_without_a_colon() {
    let fix = ImportFix {
        kind: ImportFixKind::Add,
        path: "fmt".to_string(),
        name: None,
        ident: "fmt".to_string(),
    };
    assert!(fix.resolves("could not import: fmt"));
    assert!(fix.resolves("could not import fmt (no package)"));
    assert!(fix.resolves("could not import \"fmt\""));
    assert!(!fix.resolves("could not import: os"));

    let delete = ImportFix {
        kind: ImportFixKind::Delete,
        ..fix
    };
    assert!(!delete.resolves("could not import: fmt"));
}
