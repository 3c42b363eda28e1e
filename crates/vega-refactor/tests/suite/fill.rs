use pretty_assertions::assert_eq;
use vega_refactor::{probe_fill_struct, probe_fill_switch};

use super::harness::workspace;

#[test]
fn struct_literals_get_their_missing_fields() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type Point struct {
	X, Y  int
	Label string
	tags  []string
}

func f() Point {
	return Point{/*cursor*/X: 1}
}
"#,
    );
    assert!(ws.at_selection(|input| probe_fill_struct(&input.file_input())).unwrap());
    let fix = ws.fix("fill_struct").unwrap().unwrap();
    assert_eq!(fix.message, "Fill Point");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(
        text.contains("\treturn Point{\n\t\tX: 1,\n\t\tY: 0,\n\t\tLabel: \"\",\n\t\ttags: nil,\n\t}\n"),
        "{text}"
    );
}

#[test]
fn unexported_fields_of_other_packages_are_skipped() {
    let ws = workspace(
        r#"
-- /ws/q/q.go --
package q

type Opts struct {
	Name    string
	Verbose bool
	secret  int
}
-- /ws/p/a.go --
package p

import "example.com/m/q"

var o = q.Opts{/*cursor*/}
"#,
    );
    let fix = ws.fix("fill_struct").unwrap().unwrap();
    assert_eq!(fix.message, "Fill q.Opts");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("q.Opts{\n\tName: \"\",\n\tVerbose: false,\n}"), "{text}");
    assert!(!text.contains("secret"), "{text}");
}

#[test]
fn complete_or_positional_literals_offer_nothing() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type P struct{ A int }

var x = P{/*cursor*/A: 1}
"#,
    );
    assert!(!ws.at_selection(|input| probe_fill_struct(&input.file_input())).unwrap());

    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type P struct{ A, B int }

var x = P{/*cursor*/1, 2}
"#,
    );
    assert!(ws.fix("fill_struct").unwrap_err().is_refusal());
}

#[test]
fn switches_get_the_missing_constants() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type Color int

const (
	Red Color = iota
	Green
	Blue
)

func f(c Color) {
	switch /*cursor*/c {
	case Red:
	}
}
"#,
    );
    assert!(ws.at_selection(|input| probe_fill_switch(&input.file_input())).unwrap());
    let fix = ws.fix("fill_switch").unwrap().unwrap();
    assert_eq!(fix.message, "Add cases for Color");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\tcase Red:\n\tcase Green:\n\tcase Blue:\n\t}\n"), "{text}");
}

#[test]
fn constants_of_other_packages_are_qualified() {
    let ws = workspace(
        r#"
-- /ws/q/q.go --
package q

type Mode int

const (
	Fast Mode = iota
	Slow
)
-- /ws/p/a.go --
package p

import "example.com/m/q"

func f(m q.Mode) {
	switch /*cursor*/m {
	}
}
"#,
    );
    let fix = ws.fix("fill_switch").unwrap().unwrap();
    assert_eq!(fix.message, "Add cases for q.Mode");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\tcase q.Fast:\n\tcase q.Slow:\n\t}\n"), "{text}");
}
