use pretty_assertions::assert_eq;
use vega_syntax::{parse, NodeKind, TokenKind};

const SOURCE: &str = r#"// Package shapes does geometry.
package shapes

import (
	"fmt"
	m "math"
)

// Area of a circle.
func Area(r float64) float64 {
	return m.Pi * r * r
}

type Point[T any] struct {
	X, Y T `json:"x"`
}

func (p *Point[T]) String() string {
	if p == nil {
		return "<nil>"
	} else if x := p.X; any(x) != nil {
		return fmt.Sprint(x)
	}
	for i, v := range []int{1, 2} {
		_ = i + v
	}
	switch v := any(p).(type) {
	case fmt.Stringer:
		_ = v
	default:
	}
	return fmt.Sprintf("%v", *p)
}
"#;

#[test]
fn parses_a_complete_file_without_errors() {
    let parse = parse(SOURCE);
    assert_eq!(parse.errors, vec![]);
    assert!(!parse.fixed);
    let tree = &parse.tree;
    assert_eq!(tree.package_name().map(|n| n.as_str()), Some("shapes"));

    let paths: Vec<String> = tree
        .imports()
        .iter()
        .filter_map(|&spec| tree.import_path(spec))
        .collect();
    assert_eq!(paths, vec!["fmt".to_string(), "math".to_string()]);

    let funcs: Vec<&str> = tree
        .decls()
        .iter()
        .filter_map(|&d| match tree.kind(d) {
            NodeKind::FuncDecl { name, .. } => tree.ident_name(*name).map(|n| n.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(funcs, vec!["Area", "String"]);
}

#[test]
fn doc_comments_attach_to_the_following_declaration() {
    let parse = parse(SOURCE);
    let tree = &parse.tree;
    let area = tree.decls()[1];
    let doc = tree.doc_comment(SOURCE, area).expect("doc comment");
    assert_eq!(doc.text(SOURCE), "Area of a circle.\n");
}

#[test]
fn implicit_semicolons_follow_line_ends() {
    let parse = parse("package p\nvar x = f(\n\t1,\n)\n");
    assert_eq!(parse.errors, vec![]);
    let implicit = parse
        .tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Semicolon && t.implicit)
        .count();
    assert_eq!(implicit, 2);
}

#[test]
fn missing_brace_is_repaired() {
    let parse = parse("package p\nfunc f() {\n\tx := 1\n");
    assert!(!parse.errors.is_empty());
    assert!(parse.fixed);
    let tree = &parse.tree;
    assert!(matches!(
        tree.kind(tree.decls()[0]),
        NodeKind::FuncDecl { body: Some(_), .. }
    ));
}

#[test]
fn composite_literal_not_allowed_in_if_header() {
    let src = "package p\nfunc f(x T) {\n\tif x == (T{}) {\n\t}\n}\n";
    let parse = parse(src);
    assert_eq!(parse.errors, vec![]);
}
