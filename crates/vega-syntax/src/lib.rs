//! Go syntax: lexer, error-tolerant parser, arena syntax tree, token
//! positions and a gofmt-compatible expression printer.

pub mod ast;
pub mod file_set;
pub mod lexer;
pub mod literals;
mod parsed;
mod parser;
pub mod path;
pub mod printer;
pub mod token;

use serde::{Deserialize, Serialize};
use text_size::TextRange;

pub use ast::{ChanDir, CommentGroup, Node, NodeId, NodeKind, SyntaxTree};
pub use file_set::{FileSet, Pos};
pub use parsed::{Mapper, ParsedFile};
pub use path::{enclosing_func_decl, find_on_path, path_enclosing_interval};
pub use printer::Printer;
pub use token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub range: TextRange,
}

impl ParseError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        ParseError {
            message: message.into(),
            range,
        }
    }
}

/// Result of parsing one Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    pub tree: SyntaxTree,
    /// All tokens, including comments and implicit semicolons.
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
    pub fixed: bool,
}

pub fn parse(text: &str) -> Parse {
    let (tokens, mut errors) = lexer::lex(text);
    let out = parser::parse_tokens(text, &tokens);
    errors.extend(out.errors);
    errors.sort_by_key(|e| e.range.start());
    Parse {
        tree: out.tree,
        tokens,
        errors,
        fixed: out.fixed,
    }
}

/// Parse a standalone Go expression.
pub fn parse_expr(text: &str) -> (SyntaxTree, Vec<ParseError>) {
    let (tokens, mut errors) = lexer::lex(text);
    let (tree, parse_errors) = parser::parse_expr_tokens(text, &tokens);
    errors.extend(parse_errors);
    (tree, errors)
}
