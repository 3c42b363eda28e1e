use pretty_assertions::assert_eq;
use vega_refactor::{probe_invert_if, probe_lines, probe_string_literal, Quoting};

use super::harness::workspace;

#[test]
fn invert_if_negates_and_swaps_branches() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) string {
	if /*cursor*/x > 0 {
		return "pos"
	} else {
		return "other"
	}
}
"#,
    );
    assert!(ws.at_selection(|input| probe_invert_if(&input.file_input())).unwrap());
    let fix = ws.fix("invert_if_condition").unwrap().unwrap();
    assert_eq!(fix.message, "Invert if condition");
    assert_eq!(
        ws.after(&fix, "/ws/p/a.go"),
        "package p\n\nfunc f(x int) string {\n\tif x <= 0 {\n\t\treturn \"other\"\n\t} else {\n\t\treturn \"pos\"\n\t}\n}\n"
    );
}

#[test]
fn invert_if_wraps_an_else_if_chain() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(a, b bool) int {
	if /*cursor*/a {
		return 1
	} else if b {
		return 2
	}
	return 3
}
"#,
    );
    let fix = ws.fix("invert_if_condition").unwrap().unwrap();
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(
        text.contains("\tif !a {\n\t\tif b {\n\t\t\treturn 2\n\t\t}\n\t} else {\n\t\treturn 1\n\t}\n"),
        "{text}"
    );
}

#[test]
fn invert_if_needs_an_else_branch() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func f(x int) {
	if /*cursor*/x > 0 {
		println(x)
	}
}
"#,
    );
    assert!(!ws.at_selection(|input| probe_invert_if(&input.file_input())).unwrap());
    assert!(ws.fix("invert_if_condition").unwrap_err().is_refusal());
}

#[test]
fn string_literals_toggle_between_forms() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

var s = /*cursor*/"a\tb"
"#,
    );
    let probe = ws.at_selection(|input| probe_string_literal(&input.file_input())).unwrap();
    assert_eq!(probe, Some(Quoting::Raw));
    let fix = ws.fix("convert_string_literal").unwrap().unwrap();
    assert_eq!(fix.message, "Convert to raw string literal");
    assert_eq!(ws.after(&fix, "/ws/p/a.go"), "package p\n\nvar s = `a\tb`\n");

    let ws = workspace("-- /ws/p/a.go --\npackage p\n\nvar s = /*cursor*/`C:\\dir`\n");
    let probe = ws.at_selection(|input| probe_string_literal(&input.file_input())).unwrap();
    assert_eq!(probe, Some(Quoting::Interpreted));
    let fix = ws.fix("convert_string_literal").unwrap().unwrap();
    assert_eq!(fix.message, "Convert to interpreted string literal");
    assert_eq!(ws.after(&fix, "/ws/p/a.go"), "package p\n\nvar s = \"C:\\\\dir\"\n");
}

#[test]
fn literals_with_backquotes_stay_interpreted() {
    let ws = workspace("-- /ws/p/a.go --\npackage p\n\nvar s = /*cursor*/\"`x`\"\n");
    let probe = ws.at_selection(|input| probe_string_literal(&input.file_input())).unwrap();
    assert_eq!(probe, None);
}

#[test]
fn split_and_join_call_arguments() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func g(a, b, c int) {}

func f() {
	g(1, /*cursor*/2, 3)
}
"#,
    );
    let (split, join) = ws.at_selection(|input| probe_lines(&input.file_input())).unwrap();
    assert!(split);
    assert!(!join);
    let fix = ws.fix("split_lines").unwrap().unwrap();
    assert_eq!(fix.message, "Split arguments into separate lines");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("\tg(\n\t\t1,\n\t\t2,\n\t\t3,\n\t)\n"), "{text}");

    let ws = workspace(&format!("-- /ws/p/a.go --\n{}", text.replacen("\t\t2,", "\t\t/*cursor*/2,", 1)));
    let (split, join) = ws.at_selection(|input| probe_lines(&input.file_input())).unwrap();
    assert!(!split);
    assert!(join);
    let fix = ws.fix("join_lines").unwrap().unwrap();
    assert_eq!(fix.message, "Join arguments into one line");
    assert!(ws.after(&fix, "/ws/p/a.go").contains("\tg(1, 2, 3)\n"));
}
