use pretty_assertions::assert_eq;
use vega_refactor::{change_signature, probe_change_signature, ParameterChoice, SignatureChange};

use super::harness::workspace;

const UNUSED_MIDDLE: &str = r#"
-- /ws/p/a.go --
package p

func F(a, /*cursor*/b, c int) int {
	return a + c
}
-- /ws/p/b.go --
package p

func g() int {
	return F(1, 2, 3)
}
"#;

#[test]
fn the_selected_parameter_is_reported() {
    let ws = workspace(UNUSED_MIDDLE);
    let choice = ws.at_selection(probe_change_signature).unwrap();
    assert_eq!(
        choice,
        ParameterChoice {
            index: 1,
            name: "b".to_string(),
            can_remove: true,
            can_move_left: true,
            can_move_right: true,
        }
    );
}

#[test]
fn removing_an_unused_parameter_updates_every_call() {
    let ws = workspace(UNUSED_MIDDLE);
    let fix = ws
        .at_selection(|input| change_signature(input, SignatureChange::Remove(1)))
        .unwrap()
        .unwrap();
    assert_eq!(fix.message, "Remove unused parameter b");
    let decl = ws.after(&fix, "/ws/p/a.go");
    assert!(decl.contains("func F(a, c int) int {"), "{decl}");
    let caller = ws.after(&fix, "/ws/p/b.go");
    assert!(caller.contains("return F(1, 3)"), "{caller}");
}

#[test]
fn moving_a_parameter_reorders_arguments() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func F(/*cursor*/s string, n int) string {
	return s[n:]
}

func g() string {
	return F("abc", 1)
}
"#,
    );
    let fix = ws
        .at_selection(|input| change_signature(input, SignatureChange::MoveRight(0)))
        .unwrap()
        .unwrap();
    assert_eq!(fix.message, "Move parameter right");
    let text = ws.after(&fix, "/ws/p/a.go");
    assert!(text.contains("func F(n int, s string) string {"), "{text}");
    assert!(text.contains("return F(1, \"abc\")"), "{text}");
}

#[test]
fn used_parameters_cannot_be_removed() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func F(/*cursor*/a int) int {
	return a
}
"#,
    );
    let choice = ws.at_selection(probe_change_signature).unwrap();
    assert!(!choice.can_remove);
    assert!(!choice.can_move_left);
    assert!(!choice.can_move_right);
    let err = ws
        .at_selection(|input| change_signature(input, SignatureChange::Remove(0)))
        .unwrap_err();
    assert!(err.is_refusal(), "{err}");
}

#[test]
fn variadic_parameters_stay_last() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func F(a int, /*cursor*/xs ...int) int {
	return a + len(xs)
}
"#,
    );
    let choice = ws.at_selection(probe_change_signature).unwrap();
    assert!(!choice.can_move_left);
    let err = ws
        .at_selection(|input| change_signature(input, SignatureChange::MoveLeft(1)))
        .unwrap_err();
    assert!(err.is_refusal(), "{err}");
}

#[test]
fn permutations_reject_out_of_range_indices() {
    assert_eq!(SignatureChange::Remove(1).permutation(3), Some(vec![0, 2]));
    assert_eq!(SignatureChange::MoveLeft(2).permutation(3), Some(vec![0, 2, 1]));
    assert_eq!(SignatureChange::MoveLeft(0).permutation(3), None);
    assert_eq!(SignatureChange::MoveRight(2).permutation(3), None);
}

#[test]
fn packages_with_errors_offer_no_signature_changes() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func F(a, /*cursor*/b, c int) error {
	_ = a + c + undefinedName
	return nil
}
"#,
    );
    assert!(ws.at_selection(probe_change_signature).unwrap_err().is_refusal());
}

#[test]
fn functions_returning_nil_errors_can_change() {
    let ws = workspace(
        r#"
-- /ws/p/a.go --
package p

func F(a, /*cursor*/b, c int) error {
	_ = a + c
	return nil
}
-- /ws/p/b.go --
package p

func g() error {
	return F(1, 2, 3)
}
"#,
    );
    assert!(ws.at_selection(probe_change_signature).unwrap().can_remove);
    let fix = ws
        .at_selection(|input| change_signature(input, SignatureChange::Remove(1)))
        .unwrap()
        .unwrap();
    assert!(ws.after(&fix, "/ws/p/a.go").contains("func F(a, c int) error {"));
    assert!(ws.after(&fix, "/ws/p/b.go").contains("return F(1, 3)"));
}
