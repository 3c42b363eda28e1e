//! Negate the condition of an `if`/`else` and swap its branches.

use vega_syntax::printer::{expr_precedence, UNARY_PREC};
use vega_syntax::{NodeId, NodeKind, ParsedFile, TokenKind};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::util;
use crate::RefactorError;

struct IfSite {
    cond: NodeId,
    body: NodeId,
    else_: NodeId,
    stmt: NodeId,
}

fn if_site(input: &FileInput<'_>) -> Result<IfSite, RefactorError> {
    let file = input.file;
    let tree = &file.tree;
    let selection = input.selection()?;
    for &n in &selection.path {
        let NodeKind::If { cond, body, else_, .. } = tree.kind(n) else {
            continue;
        };
        if selection.end > tree.range(*body).start() {
            // Inside a branch; only an enclosing header qualifies.
            continue;
        }
        let else_ = else_.ok_or_else(|| RefactorError::structural("the if statement has no else branch"))?;
        return Ok(IfSite {
            cond: *cond,
            body: *body,
            else_,
            stmt: n,
        });
    }
    Err(RefactorError::structural("selection is not in an if condition"))
}

pub fn probe_invert_if(input: &FileInput<'_>) -> Result<bool, RefactorError> {
    Ok(if_site(input).is_ok())
}

fn inverse(op: TokenKind) -> Option<TokenKind> {
    Some(match op {
        TokenKind::Eql => TokenKind::Neq,
        TokenKind::Neq => TokenKind::Eql,
        TokenKind::Lss => TokenKind::Geq,
        TokenKind::Geq => TokenKind::Lss,
        TokenKind::Gtr => TokenKind::Leq,
        TokenKind::Leq => TokenKind::Gtr,
        _ => return None,
    })
}

/// `!e`, parenthesizing `e` unless it is already a unary operand.
fn not(file: &ParsedFile, e: NodeId) -> String {
    let tree = &file.tree;
    match tree.kind(e) {
        NodeKind::Unary { op: TokenKind::Not, x } => file.text_of(*x).to_string(),
        _ if expr_precedence(tree, e) >= UNARY_PREC => format!("!{}", file.text_of(e)),
        _ => format!("!({})", file.text_of(e)),
    }
}

/// The negation of a condition. Only the outermost operator is rewritten.
fn negate(file: &ParsedFile, cond: NodeId) -> String {
    let tree = &file.tree;
    match tree.kind(cond) {
        NodeKind::Paren { x } => negate(file, *x),
        NodeKind::Unary { op: TokenKind::Not, x } => file.text_of(tree.unparen(*x)).to_string(),
        NodeKind::Ident { name } if name.as_str() == "true" => "false".to_string(),
        NodeKind::Ident { name } if name.as_str() == "false" => "true".to_string(),
        NodeKind::Binary { op, x, y, .. } => match (op, inverse(*op)) {
            (_, Some(inv)) => format!("{} {} {}", file.text_of(*x), inv.text(), file.text_of(*y)),
            (TokenKind::LAnd, None) => format!("{} || {}", not(file, *x), not(file, *y)),
            (TokenKind::LOr, None) => format!("{} && {}", not(file, *x), not(file, *y)),
            _ => not(file, cond),
        },
        _ => not(file, cond),
    }
}

pub(crate) fn invert_if_condition(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let file = input.file;
    let tree = &file.tree;
    let site = if_site(input)?;

    let body_text = file.text_of(site.body).to_string();
    let else_text = match tree.kind(site.else_) {
        NodeKind::Block { .. } => file.text_of(site.else_).to_string(),
        NodeKind::If { .. } => {
            let indent = file.indent_at(tree.range(site.stmt).start());
            let nested = util::reindent(file.text_of(site.else_), indent, &format!("{indent}\t"));
            format!("{{\n{indent}\t{nested}\n{indent}}}")
        }
        _ => return Err(RefactorError::Bug("else branch is neither a block nor an if".into())),
    };

    let (cond_start, cond_end) = file.node_pos(site.cond);
    let (body_start, body_end) = file.node_pos(site.body);
    let (else_start, else_end) = file.node_pos(site.else_);
    Ok(Some(SuggestedFix::new(
        "Invert if condition",
        vec![
            Edit::replace(cond_start, cond_end, negate(file, site.cond)),
            Edit::replace(body_start, body_end, else_text),
            Edit::replace(else_start, else_end, body_text),
        ],
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vega_core::{FileId, TextSize};

    fn negated(cond: &str) -> String {
        let src = format!("package p\n\nfunc f() {{\n\tif {cond} {{\n\t}} else {{\n\t}}\n}}\n");
        let file = ParsedFile::parse(FileId::new("/ws/a.go"), 1, src.as_str());
        let at = TextSize::from(src.find(cond).unwrap() as u32);
        let selection = crate::selection::Selection::from_offsets(&file, at, at);
        let node = selection
            .find(|k| matches!(k, NodeKind::If { .. }))
            .unwrap();
        let NodeKind::If { cond, .. } = file.tree.kind(node) else {
            unreachable!()
        };
        negate(&file, *cond)
    }

    #[test]
    fn comparisons_flip() {
        assert_eq!(negated("x > 0"), "x <= 0");
        assert_eq!(negated("a == b"), "a != b");
    }

    #[test]
    fn de_morgan_applies_at_the_top_only() {
        assert_eq!(negated("a && b < 1"), "!a || !(b < 1)");
        assert_eq!(negated("!ok || done"), "ok && !done");
        assert_eq!(negated("!(a && b)"), "a && b");
    }

    #[test]
    fn other_conditions_get_a_not() {
        assert_eq!(negated("ready()"), "!ready()");
        assert_eq!(negated("true"), "false");
    }
}
