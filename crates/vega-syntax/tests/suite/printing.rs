use pretty_assertions::assert_eq;
use vega_syntax::printer::{context_precedence, expr_precedence};
use vega_syntax::{parse, parse_expr, NodeKind, Printer};

fn reprint(src: &str) -> String {
    let (tree, errors) = parse_expr(src);
    assert_eq!(errors, vec![]);
    Printer::new(&tree, src).print_expr(tree.root())
}

#[test]
fn expressions_print_like_gofmt() {
    assert_eq!(reprint("a*b+c*d"), "a*b + c*d");
    assert_eq!(reprint("(a+b)*c"), "(a + b) * c");
    assert_eq!(reprint("x<<8|y"), "x<<8 | y");
    assert_eq!(reprint("!ok"), "!ok");
    assert_eq!(reprint("p.f(a,b)"), "p.f(a, b)");
    assert_eq!(reprint("m[k]"), "m[k]");
    assert_eq!(reprint("x.(interface{ M() })"), "x.(interface{ M() })");
    assert_eq!(reprint("make(chan<- int, 1)"), "make(chan<- int, 1)");
    assert_eq!(reprint("&T{}"), "&T{}");
}

#[test]
fn operand_contexts() {
    let src = "package p\nvar v = -a * (b + c)\n";
    let parse = parse(src);
    let tree = &parse.tree;
    let mut binaries = Vec::new();
    tree.walk(tree.root(), &mut |id| {
        if matches!(tree.kind(id), NodeKind::Binary { .. }) {
            binaries.push(id);
        }
        true
    });
    let outer = binaries[0];
    let NodeKind::Binary { x, y, .. } = *tree.kind(outer) else {
        unreachable!()
    };
    assert_eq!(expr_precedence(tree, outer), 5);
    assert_eq!(context_precedence(tree, x), 5);
    assert_eq!(context_precedence(tree, y), 6);
    assert_eq!(expr_precedence(tree, x), 6);
}
