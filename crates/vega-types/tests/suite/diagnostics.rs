use pretty_assertions::assert_eq;

use super::{check, messages};

#[test]
fn clean_package_has_no_errors() {
    let program = check(&[(
        "/ws/p/a.go",
        r#"package p

import (
	"errors"
	"fmt"
	"strings"
)

type Shape interface {
	Area() float64
}

type Rect struct {
	W, H float64
}

func (r Rect) Area() float64 { return r.W * r.H }

type Counter struct {
	n     int
	names map[string]int
}

func (c *Counter) Add(name string) {
	if c.names == nil {
		c.names = make(map[string]int)
	}
	c.names[name]++
	c.n++
}

var ErrEmpty = errors.New("empty")

func Total(shapes []Shape) (float64, error) {
	if len(shapes) == 0 {
		return 0, ErrEmpty
	}
	total := 0.0
	for _, s := range shapes {
		total += s.Area()
	}
	return total, nil
}

func Describe(words ...string) string {
	var b strings.Builder
	for i, w := range words {
		if i > 0 {
			b.WriteString(", ")
		}
		b.WriteString(strings.ToUpper(w))
	}
	return fmt.Sprintf("%d: %s", len(words), b.String())
}

func Kind(v any) string {
	switch x := v.(type) {
	case int:
		return fmt.Sprint(x + 1)
	case string:
		return x
	default:
		return "other"
	}
}
"#,
    )]);
    assert_eq!(messages(&program, "example.com/p"), Vec::<String>::new());
}

#[test]
fn reports_missing_method_on_interface_assignment() {
    let program = check(&[(
        "/ws/p/a.go",
        "package p\n\ntype Reader interface {\n\tRead(p []byte) (int, error)\n}\n\ntype myType struct{}\n\nvar _ Reader = myType{}\n",
    )]);
    assert_eq!(
        messages(&program, "example.com/p"),
        vec![
            "cannot use myType{} (value of type myType) as Reader value in variable declaration: myType does not implement Reader (missing method Read)"
                .to_string()
        ]
    );
}

#[test]
fn reports_pointer_receiver_methods() {
    let program = check(&[(
        "/ws/p/a.go",
        "package p\n\ntype Closer interface {\n\tClose() error\n}\n\ntype file struct{}\n\nfunc (f *file) Close() error { return nil }\n\nvar _ Closer = file{}\n",
    )]);
    assert_eq!(
        messages(&program, "example.com/p"),
        vec![
            "cannot use file{} (value of type file) as Closer value in variable declaration: file does not implement Closer (method Close has pointer receiver)"
                .to_string()
        ]
    );
}

#[test]
fn reports_undefined_names() {
    let program = check(&[(
        "/ws/p/a.go",
        "package p\n\nfunc f() {\n\tfmt.Println(\"hi\")\n}\n",
    )]);
    assert_eq!(messages(&program, "example.com/p"), vec!["undefined: fmt".to_string()]);
}

#[test]
fn reports_unused_imports_and_variables() {
    let program = check(&[(
        "/ws/p/a.go",
        "package p\n\nimport \"os\"\n\nfunc f() {\n\tx := 1\n}\n",
    )]);
    assert_eq!(
        messages(&program, "example.com/p"),
        vec![
            "\"os\" imported and not used".to_string(),
            "declared and not used: x".to_string(),
        ]
    );
}

#[test]
fn reports_missing_return() {
    let program = check(&[(
        "/ws/p/a.go",
        "package p\n\nfunc f(x int) int {\n\tif x > 0 {\n\t\treturn 1\n\t}\n}\n",
    )]);
    assert_eq!(messages(&program, "example.com/p"), vec!["missing return".to_string()]);
}

#[test]
fn unexported_names_of_other_packages_are_rejected() {
    let program = check(&[
        ("/ws/lib/lib.go", "package lib\n\nfunc helper() int { return 1 }\n\nfunc Helper() int { return helper() }\n"),
        (
            "/ws/app/main.go",
            "package app\n\nimport \"example.com/lib\"\n\nfunc f() int {\n\treturn lib.helper()\n}\n",
        ),
    ]);
    assert_eq!(messages(&program, "example.com/lib"), Vec::<String>::new());
    assert_eq!(
        messages(&program, "example.com/app"),
        vec!["name helper not exported by package lib".to_string()]
    );
}

#[test]
fn nil_is_assignable_to_every_nilable_type() {
    let program = check(&[(
        "/ws/p/a.go",
        r#"package p

type T struct{}

func Err() error { return nil }

func Ptr() *T { return nil }

func Parts() ([]int, map[string]int, chan int, func()) {
	return nil, nil, nil, nil
}

var fallback error = nil

type Stringer interface{ String() string }

func Use(s Stringer) {}

func Call() {
	Use(nil)
}
"#,
    )]);
    assert_eq!(messages(&program, "example.com/p"), Vec::<String>::new());
}

#[test]
fn nilable_values_compare_against_nil() {
    let program = check(&[(
        "/ws/p/a.go",
        r#"package p

func Check(m map[string]int, s []int, f func(), err error, p *int, c chan int) bool {
	return m == nil || s != nil || f == nil || err != nil || p == nil || nil == c
}
"#,
    )]);
    assert_eq!(messages(&program, "example.com/p"), Vec::<String>::new());
}

#[test]
fn slices_are_only_comparable_to_nil() {
    let program = check(&[(
        "/ws/p/a.go",
        "package p\n\nfunc Same(a, b []int) bool {\n\treturn a == b\n}\n",
    )]);
    assert_eq!(
        messages(&program, "example.com/p"),
        vec!["invalid operation: a == b ([]int cannot be compared)".to_string()]
    );
}

#[test]
fn ranging_over_a_non_sequence_is_reported() {
    let program = check(&[(
        "/ws/p/a.go",
        "package p\n\nfunc F(b bool, p *[]int) {\n\tfor range b {\n\t}\n\tfor range p {\n\t}\n}\n",
    )]);
    assert_eq!(
        messages(&program, "example.com/p"),
        vec![
            "cannot range over b (variable of type bool)".to_string(),
            "cannot range over p (variable of type *[]int)".to_string(),
        ]
    );
}
