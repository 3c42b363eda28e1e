use pretty_assertions::assert_eq;
use vega_refactor::{add_test, probe_add_test, AddTestOptions};

use super::harness::workspace;

#[test]
fn a_new_test_file_gets_a_table_test() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func /*cursor*/Parse(s string) (int, error) {
	return len(s), nil
}
"#,
    );
    assert!(ws.at_selection(|input| probe_add_test(&input.file_input())).unwrap());
    let fix = ws
        .at_selection(|input| add_test(input, AddTestOptions::default()))
        .unwrap()
        .unwrap();
    assert_eq!(fix.message, "Add test for Parse");
    assert!(fix.creates_files());
    let text = ws.after(&fix, "/ws/p/a_test.go");
    assert!(text.starts_with("package p\n\nimport \"testing\"\n\nfunc TestParse(t *testing.T) {\n"), "{text}");
    assert!(text.contains("\t\tname string // description of this test case\n"), "{text}");
    assert!(text.contains("\t\ts string\n\t\twant int\n\t\twantErr bool\n"), "{text}");
    assert!(text.contains("\t\t\tgot, gotErr := Parse(tt.s)\n"), "{text}");
    assert!(text.contains("\t\t\tif got != tt.want {\n"), "{text}");
}

#[test]
fn an_existing_test_file_is_appended_to() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func /*cursor*/double(x int) int { return x * 2 }
-- /ws/p/a_test.go --
package p

import "testing"

func TestOther(t *testing.T) {}
"#,
    );
    let fix = ws
        .at_selection(|input| add_test(input, AddTestOptions::default()))
        .unwrap()
        .unwrap();
    assert!(!fix.creates_files());
    let text = ws.after(&fix, "/ws/p/a_test.go");
    assert!(text.starts_with("package p\n\nimport \"testing\"\n\nfunc TestOther(t *testing.T) {}\n\nfunc Test_double(t *testing.T) {\n"), "{text}");
    assert_eq!(text.matches("import").count(), 1, "{text}");
}

#[test]
fn methods_use_the_package_constructor() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

type Counter struct{ n int }

func NewCounter() *Counter { return &Counter{} }

func (c *Counter) /*cursor*/Add(d int) int {
	c.n += d
	return c.n
}
"#,
    );
    let fix = ws
        .at_selection(|input| add_test(input, AddTestOptions::default()))
        .unwrap()
        .unwrap();
    let text = ws.after(&fix, "/ws/p/a_test.go");
    assert!(text.contains("func TestCounter_Add(t *testing.T) {\n"), "{text}");
    assert!(text.contains("\t\t\tr := NewCounter()\n\t\t\tgot := r.Add(tt.d)\n"), "{text}");

    let fix = ws
        .at_selection(|input| {
            add_test(
                input,
                AddTestOptions {
                    prefer_constructor: false,
                },
            )
        })
        .unwrap()
        .unwrap();
    let text = ws.after(&fix, "/ws/p/a_test.go");
    assert!(text.contains("\t\t\t// TODO: construct the receiver type.\n\t\t\tvar r *Counter\n"), "{text}");
}

#[test]
fn external_test_packages_qualify_the_target() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func /*cursor*/Sum(xs ...int) int { return 0 }
-- /ws/p/a_test.go --
package p_test

import "testing"

func TestOther(t *testing.T) {}
"#,
    );
    let fix = ws
        .at_selection(|input| add_test(input, AddTestOptions::default()))
        .unwrap()
        .unwrap();
    let text = ws.after(&fix, "/ws/p/a_test.go");
    assert!(text.contains("\"example.com/m/p\""), "{text}");
    assert!(text.contains("\t\t\tgot := p.Sum(tt.xs...)\n"), "{text}");
}

#[test]
fn unfit_targets_are_refused() {
    for src in [
        "package p\n\nfunc /*cursor*/init() {}\n",
        "package p\n\nfunc /*cursor*/Map[T any](x T) T { return x }\n",
        "package p\n\nfunc F() {\n\t/*cursor*/println()\n}\n",
    ] {
        let ws = workspace(&format!("-- /ws/p/a.go --\n{src}"));
        assert!(!ws.at_selection(|input| probe_add_test(&input.file_input())).unwrap(), "{src}");
        let err = ws
            .at_selection(|input| add_test(input, AddTestOptions::default()))
            .unwrap_err();
        assert!(err.is_refusal(), "{src}: {err}");
    }
}
