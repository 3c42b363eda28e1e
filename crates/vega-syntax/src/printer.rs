//! gofmt-compatible printing of expressions and types.
//!
//! Spacing around binary operators follows gofmt: whether blanks surround an
//! operator depends on the operator precedences present in the expression
//! and on its nesting depth (`x*2 + 1`, but `x * 2` on its own).

use std::collections::HashMap;

use crate::ast::{ChanDir, NodeId, NodeKind, SyntaxTree};
use crate::token::TokenKind;

pub const LOWEST_PREC: u8 = 0;
pub const UNARY_PREC: u8 = 6;
pub const HIGHEST_PREC: u8 = 7;

/// Precedence of an expression as an operand: binary operators report their
/// own precedence, everything else binds at least as tightly as a unary
/// operator.
pub fn expr_precedence(tree: &SyntaxTree, id: NodeId) -> u8 {
    match tree.kind(id) {
        NodeKind::Binary { op, .. } => op.precedence(),
        NodeKind::Unary { .. } | NodeKind::Star { .. } => UNARY_PREC,
        NodeKind::KeyValue { .. } => LOWEST_PREC,
        _ => HIGHEST_PREC,
    }
}

/// The minimum operand precedence the parent of `id` requires for `id` to be
/// replaced without parentheses.
pub fn context_precedence(tree: &SyntaxTree, id: NodeId) -> u8 {
    let Some(parent) = tree.parent(id) else {
        return LOWEST_PREC;
    };
    match tree.kind(parent) {
        NodeKind::Binary { op, y, .. } => {
            if *y == id {
                op.precedence() + 1
            } else {
                op.precedence()
            }
        }
        NodeKind::Unary { .. } | NodeKind::Star { .. } => UNARY_PREC,
        NodeKind::Selector { x, .. }
        | NodeKind::Index { x, .. }
        | NodeKind::Slice { x, .. }
        | NodeKind::TypeAssert { x, .. } => {
            if *x == id {
                HIGHEST_PREC
            } else {
                LOWEST_PREC
            }
        }
        NodeKind::Call { fun, .. } if *fun == id => HIGHEST_PREC,
        NodeKind::IncDec { .. } => HIGHEST_PREC,
        _ => LOWEST_PREC,
    }
}

pub struct Printer<'a> {
    tree: &'a SyntaxTree,
    src: &'a str,
    overrides: HashMap<NodeId, (String, u8)>,
    out: String,
}

impl<'a> Printer<'a> {
    pub fn new(tree: &'a SyntaxTree, src: &'a str) -> Self {
        Printer {
            tree,
            src,
            overrides: HashMap::new(),
            out: String::new(),
        }
    }

    /// Print `text` (an operand of precedence `prec`) in place of `id`,
    /// parenthesized where the context requires it.
    pub fn with_override(mut self, id: NodeId, text: impl Into<String>, prec: u8) -> Self {
        self.overrides.insert(id, (text.into(), prec));
        self
    }

    pub fn print_expr(mut self, id: NodeId) -> String {
        self.expr1(id, LOWEST_PREC, 1);
        self.out
    }

    /// Print `id` as an operand that must bind at least as tightly as `prec1`.
    pub fn print_operand(mut self, id: NodeId, prec1: u8) -> String {
        self.expr1(id, prec1, 1);
        self.out
    }

    pub fn print_expr_list(mut self, ids: &[NodeId]) -> String {
        self.expr_list(ids, 1);
        self.out
    }

    /// Print a `FuncType` as a signature without the `func` keyword.
    pub fn print_signature(mut self, func_type: NodeId) -> String {
        self.signature(func_type);
        self.out
    }

    fn push(&mut self, text: &str) {
        // Avoid gluing operators into a different token (`- -x`, `a & ^b`).
        if let (Some(last), Some(first)) = (self.out.chars().last(), text.chars().next()) {
            let combine = matches!(
                (last, first),
                ('-', '-') | ('+', '+') | ('&', '&') | ('&', '^') | ('<', '-') | ('/', '*')
            );
            if combine {
                self.out.push(' ');
            }
        }
        self.out.push_str(text);
    }

    fn expr0(&mut self, id: NodeId, depth: u32) {
        self.expr1(id, LOWEST_PREC, depth);
    }

    fn expr(&mut self, id: NodeId) {
        self.expr1(id, LOWEST_PREC, 1);
    }

    fn expr_list(&mut self, ids: &[NodeId], depth: u32) {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr0(*id, depth);
        }
    }

    fn expr1(&mut self, id: NodeId, prec1: u8, depth: u32) {
        if let Some((text, prec)) = self.overrides.get(&id) {
            let text = if *prec < prec1 {
                format!("({text})")
            } else {
                text.clone()
            };
            self.push(&text);
            return;
        }

        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Ident { name } => self.push(name),
            NodeKind::BasicLit { value, .. } => self.push(value),
            NodeKind::Binary { .. } => {
                let cutoff = cutoff(tree, id, depth.max(1));
                self.binary_expr(id, prec1, cutoff, depth.max(1));
            }
            NodeKind::Unary { op, x } => {
                if UNARY_PREC < prec1 {
                    self.push("(");
                    self.expr(id);
                    self.push(")");
                } else {
                    self.push(op.text());
                    self.expr1(*x, UNARY_PREC, depth);
                }
            }
            NodeKind::Star { x } => {
                if UNARY_PREC < prec1 {
                    self.push("(*");
                    self.expr(*x);
                    self.push(")");
                } else {
                    self.push("*");
                    self.expr(*x);
                }
            }
            NodeKind::Paren { x } => {
                if matches!(tree.kind(*x), NodeKind::Paren { .. }) {
                    self.expr0(*x, depth);
                } else {
                    self.push("(");
                    self.expr0(*x, reduce_depth(depth));
                    self.push(")");
                }
            }
            NodeKind::Selector { x, sel } => {
                self.expr1(*x, HIGHEST_PREC, depth);
                self.push(".");
                self.expr(*sel);
            }
            NodeKind::TypeAssert { x, ty } => {
                self.expr1(*x, HIGHEST_PREC, depth);
                self.push(".(");
                match ty {
                    Some(ty) => self.expr(*ty),
                    None => self.push("type"),
                }
                self.push(")");
            }
            NodeKind::Index { x, indices, .. } => {
                self.expr1(*x, HIGHEST_PREC, 1);
                self.push("[");
                self.expr_list(indices, depth + 1);
                self.push("]");
            }
            NodeKind::Slice {
                x, low, high, max, ..
            } => {
                self.expr1(*x, HIGHEST_PREC, 1);
                self.push("[");
                let mut indices = vec![*low, *high];
                if max.is_some() {
                    indices.push(*max);
                }
                let needs_blanks = depth <= 1 && {
                    let present: Vec<NodeId> = indices.iter().flatten().copied().collect();
                    present.len() > 1
                        && present
                            .iter()
                            .any(|i| matches!(tree.kind(*i), NodeKind::Binary { .. }))
                };
                for (i, index) in indices.iter().enumerate() {
                    if i > 0 {
                        if indices[i - 1].is_some() && needs_blanks {
                            self.out.push(' ');
                        }
                        self.out.push(':');
                        if index.is_some() && needs_blanks {
                            self.out.push(' ');
                        }
                    }
                    if let Some(index) = index {
                        self.expr0(*index, depth + 1);
                    }
                }
                self.push("]");
            }
            NodeKind::Call {
                fun,
                args,
                ellipsis,
                ..
            } => {
                let depth = if args.len() > 1 { depth + 1 } else { depth };
                if matches!(tree.kind(*fun), NodeKind::FuncType { .. }) {
                    self.push("(");
                    self.expr1(*fun, HIGHEST_PREC, depth);
                    self.push(")");
                } else {
                    self.expr1(*fun, HIGHEST_PREC, depth);
                }
                self.push("(");
                self.expr_list(args, depth);
                if ellipsis.is_some() {
                    self.push("...");
                }
                self.push(")");
            }
            NodeKind::CompositeLit { ty, elts, .. } => {
                if let Some(ty) = ty {
                    self.expr1(*ty, HIGHEST_PREC, depth);
                }
                self.push("{");
                self.expr_list(elts, 1);
                self.push("}");
            }
            NodeKind::KeyValue { key, value } => {
                self.expr(*key);
                self.push(": ");
                self.expr(*value);
            }
            NodeKind::FuncLit { ty, body } => {
                self.push("func");
                self.signature(*ty);
                self.out.push(' ');
                let body = &self.src[tree.range(*body)];
                self.out.push_str(body);
            }
            NodeKind::FuncType { .. } => {
                self.push("func");
                self.signature(id);
            }
            NodeKind::ArrayType { len, elem } => {
                self.push("[");
                if let Some(len) = len {
                    self.expr(*len);
                }
                self.push("]");
                self.expr(*elem);
            }
            NodeKind::StructType { fields } => {
                self.push("struct");
                self.field_block(*fields, false);
            }
            NodeKind::InterfaceType { methods } => {
                self.push("interface");
                self.field_block(*methods, true);
            }
            NodeKind::MapType { key, value } => {
                self.push("map[");
                self.expr(*key);
                self.push("]");
                self.expr(*value);
            }
            NodeKind::ChanType { dir, value } => {
                self.push(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.expr(*value);
            }
            NodeKind::Ellipsis { elt } => {
                self.push("...");
                if let Some(elt) = elt {
                    self.expr(*elt);
                }
            }
            NodeKind::Bad => self.push("BadExpr"),
            _ => {
                let text = &self.src[tree.range(id)];
                self.out.push_str(text);
            }
        }
    }

    fn binary_expr(&mut self, id: NodeId, prec1: u8, cutoff: u8, depth: u32) {
        let NodeKind::Binary { op, x, y, .. } = *self.tree.kind(id) else {
            return;
        };
        let prec = op.precedence();
        if prec < prec1 {
            self.push("(");
            self.expr0(id, reduce_depth(depth));
            self.push(")");
            return;
        }
        let print_blank = prec < cutoff;
        self.expr1(x, prec, depth + diff_prec(self.tree, x, prec));
        if print_blank {
            self.out.push(' ');
        }
        self.push(op.text());
        if print_blank {
            self.out.push(' ');
        }
        self.expr1(y, prec + 1, depth + 1);
    }

    fn signature(&mut self, func_type: NodeId) {
        let NodeKind::FuncType {
            type_params,
            params,
            results,
        } = self.tree.kind(func_type)
        else {
            return;
        };
        if let Some(tp) = type_params {
            self.push("[");
            self.field_list(*tp);
            self.push("]");
        }
        self.push("(");
        self.field_list(*params);
        self.push(")");
        let Some(results) = results else {
            return;
        };
        let NodeKind::FieldList { fields, .. } = self.tree.kind(*results) else {
            return;
        };
        if fields.is_empty() {
            return;
        }
        let single_unnamed = fields.len() == 1
            && matches!(self.tree.kind(fields[0]), NodeKind::Field { names, .. } if names.is_empty());
        self.out.push(' ');
        if single_unnamed {
            let NodeKind::Field { ty, .. } = self.tree.kind(fields[0]) else {
                return;
            };
            self.expr(*ty);
        } else {
            self.push("(");
            self.field_list(*results);
            self.push(")");
        }
    }

    /// `a, b int, c string`
    fn field_list(&mut self, list: NodeId) {
        let NodeKind::FieldList { fields, .. } = self.tree.kind(list) else {
            return;
        };
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.field(*field, false);
        }
    }

    fn field(&mut self, field: NodeId, method: bool) {
        let NodeKind::Field { names, ty, tag } = self.tree.kind(field) else {
            return;
        };
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(*name);
        }
        if method && !names.is_empty() {
            self.signature(*ty);
        } else {
            if !names.is_empty() {
                self.out.push(' ');
            }
            self.expr(*ty);
        }
        if let Some(tag) = tag {
            self.out.push(' ');
            self.expr(*tag);
        }
    }

    fn field_block(&mut self, list: NodeId, interface: bool) {
        let NodeKind::FieldList { fields, .. } = self.tree.kind(list) else {
            return;
        };
        if fields.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{ ");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push_str("; ");
            }
            self.field(*field, interface);
        }
        self.out.push_str(" }");
    }
}

fn reduce_depth(depth: u32) -> u32 {
    depth.saturating_sub(1).max(1)
}

fn diff_prec(tree: &SyntaxTree, x: NodeId, prec: u8) -> u32 {
    match tree.kind(x) {
        NodeKind::Binary { op, .. } if op.precedence() == prec => 0,
        _ => 1,
    }
}

fn cutoff(tree: &SyntaxTree, id: NodeId, depth: u32) -> u8 {
    let (has4, has5, max_problem) = walk_binary(tree, id);
    if max_problem > 0 {
        return max_problem + 1;
    }
    if has4 && has5 {
        return if depth == 1 { 5 } else { 4 };
    }
    if depth == 1 {
        6
    } else {
        4
    }
}

fn walk_binary(tree: &SyntaxTree, id: NodeId) -> (bool, bool, u8) {
    let NodeKind::Binary { op, x, y, .. } = *tree.kind(id) else {
        return (false, false, 0);
    };
    let prec = op.precedence();
    let mut has4 = prec == 4;
    let mut has5 = prec == 5;
    let mut max_problem = 0;

    if let NodeKind::Binary { op: lop, .. } = tree.kind(x) {
        if lop.precedence() >= prec {
            let (h4, h5, mp) = walk_binary(tree, x);
            has4 |= h4;
            has5 |= h5;
            max_problem = max_problem.max(mp);
        }
    }

    match tree.kind(y) {
        NodeKind::Binary { op: rop, .. } => {
            if rop.precedence() > prec {
                let (h4, h5, mp) = walk_binary(tree, y);
                has4 |= h4;
                has5 |= h5;
                max_problem = max_problem.max(mp);
            }
        }
        NodeKind::Star { .. } => {
            if op == TokenKind::Quo {
                max_problem = 5;
            }
        }
        NodeKind::Unary { op: uop, .. } => match (op, *uop) {
            (TokenKind::And, TokenKind::And) | (TokenKind::And, TokenKind::Xor) => max_problem = 5,
            (TokenKind::Add, TokenKind::Add) | (TokenKind::Sub, TokenKind::Sub) => {
                max_problem = max_problem.max(4)
            }
            _ => {}
        },
        _ => {}
    }
    (has4, has5, max_problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_expr;

    fn fmt(src: &str) -> String {
        let (tree, errors) = parse_expr(src);
        assert!(errors.is_empty(), "{errors:?}");
        Printer::new(&tree, src).print_expr(tree.root())
    }

    #[test]
    fn binary_spacing_follows_gofmt() {
        assert_eq!(fmt("x*2"), "x * 2");
        assert_eq!(fmt("x*2+1"), "x*2 + 1");
        assert_eq!(fmt("a+b+c"), "a + b + c");
        assert_eq!(fmt("f(a+b, c)"), "f(a+b, c)");
        assert_eq!(fmt("f(a+b)"), "f(a + b)");
        assert_eq!(fmt("x > 0 && y < 1"), "x > 0 && y < 1");
    }

    #[test]
    fn unary_operators_do_not_merge() {
        assert_eq!(fmt("-(-x)"), "-(-x)");
        assert_eq!(fmt("a - -b"), "a - -b");
    }

    #[test]
    fn types_and_literals() {
        assert_eq!(fmt("map[string][]int{}"), "map[string][]int{}");
        assert_eq!(fmt("func(a, b int) (int, error){ return 0, nil }"), "func(a, b int) (int, error) { return 0, nil }");
        assert_eq!(fmt("s[a+1 : b]"), "s[a+1 : b]");
        assert_eq!(fmt("T{A: 1, B: \"x\"}"), "T{A: 1, B: \"x\"}");
    }

    #[test]
    fn overrides_are_parenthesized_by_context() {
        let src = "p * 2";
        let (tree, _) = parse_expr(src);
        let NodeKind::Binary { x, .. } = tree.kind(tree.root()) else {
            panic!("expected binary");
        };
        let out = Printer::new(&tree, src)
            .with_override(*x, "a + b", 4)
            .print_expr(tree.root());
        assert_eq!(out, "(a + b) * 2");
    }
}
