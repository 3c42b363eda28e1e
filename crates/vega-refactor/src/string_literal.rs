//! Toggle a string literal between its raw and interpreted forms.

use vega_syntax::literals::{can_backquote, quote, unquote};
use vega_syntax::{NodeId, NodeKind, ParsedFile, TokenKind};

use crate::edit::{Edit, SuggestedFix};
use crate::fixers::FileInput;
use crate::RefactorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    Raw,
    Interpreted,
}

fn string_lit(input: &FileInput<'_>) -> Result<(NodeId, Quoting), RefactorError> {
    let file = input.file;
    let selection = input.selection()?;
    let lit = selection
        .find(|k| matches!(k, NodeKind::BasicLit { kind: TokenKind::String, .. }))
        .ok_or_else(|| RefactorError::structural("selection is not in a string literal"))?;
    let quoting = if file.text_of(lit).starts_with('`') {
        Quoting::Raw
    } else {
        Quoting::Interpreted
    };
    Ok((lit, quoting))
}

/// The raw form of an interpreted literal, if the value has one.
fn to_raw(text: &str) -> Result<String, RefactorError> {
    let value = unquote(text).map_err(|e| RefactorError::semantic(format!("invalid literal: {e}")))?;
    if !value.split('\n').all(can_backquote) {
        return Err(RefactorError::semantic("the string cannot be written as a raw literal"));
    }
    Ok(format!("`{value}`"))
}

fn to_interpreted(text: &str) -> Result<String, RefactorError> {
    let value = unquote(text).map_err(|e| RefactorError::semantic(format!("invalid literal: {e}")))?;
    Ok(quote(&value))
}

/// The quoting the literal at the selection would be converted to.
pub fn probe_string_literal(input: &FileInput<'_>) -> Result<Option<Quoting>, RefactorError> {
    let Ok((lit, quoting)) = string_lit(input) else {
        return Ok(None);
    };
    let text = input.file.text_of(lit);
    Ok(match quoting {
        Quoting::Raw => Some(Quoting::Interpreted),
        Quoting::Interpreted => to_raw(text).is_ok().then_some(Quoting::Raw),
    })
}

fn converted(file: &ParsedFile, lit: NodeId, quoting: Quoting) -> Result<String, RefactorError> {
    let text = file.text_of(lit);
    match quoting {
        Quoting::Raw => to_interpreted(text),
        Quoting::Interpreted => to_raw(text),
    }
}

pub(crate) fn convert_string_literal(input: &FileInput<'_>) -> Result<Option<SuggestedFix>, RefactorError> {
    let file = input.file;
    let (lit, quoting) = string_lit(input)?;
    let new_text = converted(file, lit, quoting)?;
    let title = match quoting {
        Quoting::Raw => "Convert to interpreted string literal",
        Quoting::Interpreted => "Convert to raw string literal",
    };
    let (start, end) = file.node_pos(lit);
    Ok(Some(SuggestedFix::new(title, vec![Edit::replace(start, end, new_text)])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreted_strings_become_raw_across_lines() {
        assert_eq!(to_raw(r#""a\tb\nc""#).unwrap(), "`a\tb\nc`");
        assert_eq!(to_raw(r#""\"quoted\"""#).unwrap(), "`\"quoted\"`");
    }

    #[test]
    fn unrepresentable_payloads_are_refused() {
        assert!(to_raw(r#""has `backquote`""#).unwrap_err().is_refusal());
        assert!(to_raw(r#""bell\a""#).is_err());
        assert!(to_raw(r#""cr\r""#).is_err());
    }

    #[test]
    fn raw_strings_become_interpreted() {
        assert_eq!(to_interpreted("`C:\\dir\n\"x\"`").unwrap(), r#""C:\\dir\n\"x\"""#);
    }
}
