//! Recursive-descent Go parser producing a [`SyntaxTree`].
//!
//! The parser is error tolerant: it records a [`ParseError`], synthesizes a
//! `Bad` node or a missing closing delimiter, and keeps going. Whenever it had
//! to synthesize something the result is flagged as `fixed`.

use text_size::{TextRange, TextSize};

use crate::ast::{ChanDir, CommentGroup, Node, NodeId, NodeKind, SyntaxTree};
use crate::token::{Token, TokenKind};
use crate::ParseError;

pub(crate) struct ParseOutput {
    pub(crate) tree: SyntaxTree,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) fixed: bool,
}

pub(crate) fn parse_tokens(src: &str, all_tokens: &[Token]) -> ParseOutput {
    let comments = group_comments(src, all_tokens);
    let tokens: Vec<Token> = all_tokens
        .iter()
        .copied()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect();
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
        last_end: TextSize::from(0),
        nodes: Vec::new(),
        errors: Vec::new(),
        expr_lev: 0,
        fixed: false,
    };
    let root = parser.parse_file();
    ParseOutput {
        tree: SyntaxTree::new(parser.nodes, root, comments),
        errors: parser.errors,
        fixed: parser.fixed,
    }
}

/// Groups adjacent comments. A comment that trails code on the same line forms
/// a group of its own.
fn group_comments(src: &str, tokens: &[Token]) -> Vec<CommentGroup> {
    let mut groups: Vec<CommentGroup> = Vec::new();
    let mut open = false;
    let mut last_code_end: Option<TextSize> = None;
    let mut prev_was_comment = false;

    for tok in tokens {
        match tok.kind {
            TokenKind::Comment => {
                let trailing = last_code_end.is_some_and(|end| {
                    !src[usize::from(end)..usize::from(tok.range.start())].contains('\n')
                });
                let joins = open && prev_was_comment && !trailing && {
                    let prev_end = groups
                        .last()
                        .map_or(tok.range.start(), |g| g.range().end());
                    src[usize::from(prev_end)..usize::from(tok.range.start())]
                        .matches('\n')
                        .count()
                        <= 1
                };
                if joins {
                    if let Some(group) = groups.last_mut() {
                        group.comments.push(tok.range);
                    }
                } else {
                    groups.push(CommentGroup {
                        comments: vec![tok.range],
                    });
                }
                // A trailing comment closes its group immediately.
                open = !trailing;
                prev_was_comment = true;
                last_code_end = None;
            }
            TokenKind::Semicolon if tok.implicit => {}
            _ => {
                open = false;
                prev_was_comment = false;
                last_code_end = Some(tok.range.end());
            }
        }
    }
    groups
}

enum ParamEntry {
    /// A lone identifier: either a parameter name or a type name.
    Ident(NodeId),
    Named(NodeId, NodeId),
    Type(NodeId),
}

enum Simple {
    Stmt(NodeId),
    Range {
        key: Option<NodeId>,
        value: Option<NodeId>,
        tok: Option<TokenKind>,
        x: NodeId,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SimpleMode {
    Basic,
    LabelOk,
    RangeOk,
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    last_end: TextSize,
    nodes: Vec<Node>,
    errors: Vec<ParseError>,
    expr_lev: i32,
    fixed: bool,
}

impl<'a> Parser<'a> {
    // ----- token plumbing -------------------------------------------------

    fn cur(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn tok(&self) -> TokenKind {
        self.cur().kind
    }

    fn peek(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.tok() == kind
    }

    fn start(&self) -> TextSize {
        self.cur().range.start()
    }

    fn bump(&mut self) -> Token {
        let tok = self.cur();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        if !tok.implicit {
            self.last_end = tok.range.end();
        }
        tok
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        self.at(kind).then(|| self.bump())
    }

    fn describe(&self, tok: Token) -> String {
        match tok.kind {
            TokenKind::Semicolon if tok.implicit => "newline".to_owned(),
            TokenKind::Eof => "EOF".to_owned(),
            TokenKind::Ident | TokenKind::Int | TokenKind::Float | TokenKind::String => {
                tok.text(self.src).to_owned()
            }
            kind => format!("'{}'", kind.text()),
        }
    }

    fn error_at(&mut self, range: TextRange, message: impl Into<String>) {
        self.errors.push(ParseError::new(message, range));
    }

    fn error_expected(&mut self, what: &str) {
        let tok = self.cur();
        let found = self.describe(tok);
        self.error_at(tok.range, format!("expected {what}, found {found}"));
    }

    /// Consumes `kind` or records an error. Returns the token start either way.
    fn expect(&mut self, kind: TokenKind) -> TextSize {
        let pos = self.start();
        if self.at(kind) {
            self.bump();
        } else {
            self.error_expected(&format!("'{}'", kind.text()));
        }
        pos
    }

    /// Like [`Parser::expect`] for closing delimiters; a missing one is synthesized.
    fn expect_closing(&mut self, kind: TokenKind) -> TextSize {
        if self.at(TokenKind::Semicolon) && self.cur().implicit && self.peek(1) == kind {
            let range = self.cur().range;
            self.error_at(range, "missing ',' before newline");
            self.bump();
        }
        if self.at(kind) {
            return self.bump().range.start();
        }
        self.error_expected(&format!("'{}'", kind.text()));
        self.fixed = true;
        self.last_end
    }

    fn expect_semi(&mut self) {
        match self.tok() {
            TokenKind::RParen | TokenKind::RBrace => {}
            TokenKind::Semicolon => {
                self.bump();
            }
            _ => {
                self.error_expected("';'");
                while !matches!(
                    self.tok(),
                    TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                ) {
                    self.bump();
                }
                self.eat(TokenKind::Semicolon);
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Node { kind, range });
        id
    }

    fn finish(&mut self, kind: NodeKind, start: TextSize) -> NodeId {
        let end = self.last_end.max(start);
        self.alloc(kind, TextRange::new(start, end))
    }

    fn range_of(&self, id: NodeId) -> TextRange {
        self.nodes[id.idx()].range
    }

    fn bad(&mut self) -> NodeId {
        self.fixed = true;
        let at = self.start();
        self.alloc(NodeKind::Bad, TextRange::empty(at))
    }

    // ----- file and declarations -------------------------------------------

    fn parse_file(&mut self) -> NodeId {
        self.expect(TokenKind::Package);
        let name = self.parse_ident();
        self.expect_semi();

        let mut imports = Vec::new();
        let mut decls = Vec::new();
        while self.at(TokenKind::Import) {
            let decl = self.parse_gen_decl(TokenKind::Import);
            if let NodeKind::GenDecl { specs, .. } = &self.nodes[decl.idx()].kind {
                imports.extend(specs.iter().copied());
            }
            decls.push(decl);
            self.expect_semi();
        }

        while !self.at(TokenKind::Eof) {
            let before = self.pos;
            match self.tok() {
                TokenKind::Const | TokenKind::Var | TokenKind::Type | TokenKind::Import => {
                    if self.at(TokenKind::Import) {
                        let range = self.cur().range;
                        self.error_at(range, "imports must appear before other declarations");
                    }
                    let kw = self.tok();
                    decls.push(self.parse_gen_decl(kw));
                    self.expect_semi();
                }
                TokenKind::Func => {
                    decls.push(self.parse_func_decl());
                    self.expect_semi();
                }
                _ => {
                    self.error_expected("declaration");
                    self.bump();
                    while !matches!(
                        self.tok(),
                        TokenKind::Const
                            | TokenKind::Var
                            | TokenKind::Type
                            | TokenKind::Func
                            | TokenKind::Import
                            | TokenKind::Eof
                    ) {
                        self.bump();
                    }
                }
            }
            if self.pos == before {
                self.bump();
            }
        }

        let len = TextSize::of(self.src);
        self.alloc(
            NodeKind::File {
                name,
                imports,
                decls,
            },
            TextRange::new(TextSize::from(0), len),
        )
    }

    fn parse_ident(&mut self) -> NodeId {
        if self.at(TokenKind::Ident) {
            let tok = self.bump();
            let name = tok.text(self.src).into();
            return self.alloc(NodeKind::Ident { name }, tok.range);
        }
        self.error_expected("identifier");
        self.fixed = true;
        let at = self.start();
        self.alloc(NodeKind::Ident { name: "_".into() }, TextRange::empty(at))
    }

    fn parse_ident_list(&mut self) -> Vec<NodeId> {
        let mut names = vec![self.parse_ident()];
        while self.eat(TokenKind::Comma).is_some() {
            names.push(self.parse_ident());
        }
        names
    }

    fn parse_gen_decl(&mut self, kw: TokenKind) -> NodeId {
        let start = self.expect(kw);
        let mut specs = Vec::new();
        let (lparen, rparen) = if let Some(open) = self.eat(TokenKind::LParen) {
            while !matches!(self.tok(), TokenKind::RParen | TokenKind::Eof) {
                let before = self.pos;
                specs.push(self.parse_spec(kw));
                self.expect_semi();
                if self.pos == before {
                    self.bump();
                }
            }
            let close = self.expect_closing(TokenKind::RParen);
            (Some(open.range.start()), Some(close))
        } else {
            specs.push(self.parse_spec(kw));
            (None, None)
        };
        self.finish(
            NodeKind::GenDecl {
                tok: kw,
                lparen,
                specs,
                rparen,
            },
            start,
        )
    }

    fn parse_spec(&mut self, kw: TokenKind) -> NodeId {
        match kw {
            TokenKind::Import => self.parse_import_spec(),
            TokenKind::Type => self.parse_type_spec(),
            _ => self.parse_value_spec(kw),
        }
    }

    fn parse_import_spec(&mut self) -> NodeId {
        let start = self.start();
        let name = match self.tok() {
            TokenKind::Ident => Some(self.parse_ident()),
            TokenKind::Period => {
                let tok = self.bump();
                Some(self.alloc(NodeKind::Ident { name: ".".into() }, tok.range))
            }
            _ => None,
        };
        let path = if self.at(TokenKind::String) {
            let tok = self.bump();
            self.alloc(
                NodeKind::BasicLit {
                    kind: TokenKind::String,
                    value: tok.text(self.src).into(),
                },
                tok.range,
            )
        } else {
            self.error_expected("import path");
            self.bad()
        };
        self.finish(NodeKind::ImportSpec { name, path }, start)
    }

    fn parse_value_spec(&mut self, kw: TokenKind) -> NodeId {
        let start = self.start();
        let names = self.parse_ident_list();
        let ty = if matches!(
            self.tok(),
            TokenKind::Assign | TokenKind::Semicolon | TokenKind::RParen | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_type())
        };
        let values = if self.eat(TokenKind::Assign).is_some() {
            self.parse_expr_list()
        } else {
            Vec::new()
        };
        if kw == TokenKind::Var && ty.is_none() && values.is_empty() {
            let range = TextRange::new(start, self.last_end.max(start));
            self.error_at(range, "missing variable type or initialization");
        }
        self.finish(NodeKind::ValueSpec { names, ty, values }, start)
    }

    fn parse_type_spec(&mut self) -> NodeId {
        let start = self.start();
        let name = self.parse_ident();
        let type_params = if self.at(TokenKind::LBrack)
            && self.peek(1) == TokenKind::Ident
            && matches!(
                self.peek(2),
                TokenKind::Ident
                    | TokenKind::Comma
                    | TokenKind::Interface
                    | TokenKind::Tilde
                    | TokenKind::LBrack
                    | TokenKind::Map
                    | TokenKind::Chan
                    | TokenKind::Func
                    | TokenKind::Struct
            ) {
            Some(self.parse_parameters(TokenKind::LBrack, TokenKind::RBrack))
        } else {
            None
        };
        let assign = self.eat(TokenKind::Assign).is_some();
        let ty = self.parse_type();
        self.finish(
            NodeKind::TypeSpec {
                name,
                type_params,
                assign,
                ty,
            },
            start,
        )
    }

    fn parse_func_decl(&mut self) -> NodeId {
        let start = self.expect(TokenKind::Func);
        let recv = self
            .at(TokenKind::LParen)
            .then(|| self.parse_parameters(TokenKind::LParen, TokenKind::RParen));
        let name = self.parse_ident();
        let sig_start = self.start();
        let type_params = self
            .at(TokenKind::LBrack)
            .then(|| self.parse_parameters(TokenKind::LBrack, TokenKind::RBrack));
        let params = self.parse_parameters(TokenKind::LParen, TokenKind::RParen);
        let results = self.parse_result();
        let ty = self.finish(
            NodeKind::FuncType {
                type_params,
                params,
                results,
            },
            sig_start,
        );
        let body = self.at(TokenKind::LBrace).then(|| {
            let saved = self.expr_lev;
            self.expr_lev = 0;
            let body = self.parse_block();
            self.expr_lev = saved;
            body
        });
        self.finish(
            NodeKind::FuncDecl {
                recv,
                name,
                ty,
                body,
            },
            start,
        )
    }

    // ----- parameters and types ----------------------------------------------

    fn can_start_type(kind: TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Ident
                | TokenKind::LBrack
                | TokenKind::Struct
                | TokenKind::Mul
                | TokenKind::Func
                | TokenKind::Interface
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::LParen
                | TokenKind::Arrow
        )
    }

    fn parse_parameters(&mut self, open: TokenKind, close: TokenKind) -> NodeId {
        let start = self.start();
        let open_pos = self.expect(open);
        let type_params = open == TokenKind::LBrack;
        let mut entries = Vec::new();
        let saved = self.expr_lev;
        self.expr_lev += 1;
        while !matches!(self.tok(), TokenKind::Eof) && !self.at(close) {
            let before = self.pos;
            entries.push(self.parse_param_decl(type_params));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expr_lev = saved;
        let close_pos = self.expect_closing(close);

        let named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
        let mut fields = Vec::new();
        if named {
            let mut pending: Vec<NodeId> = Vec::new();
            for entry in entries {
                match entry {
                    ParamEntry::Ident(id) => pending.push(id),
                    ParamEntry::Named(name, ty) => {
                        pending.push(name);
                        let names = std::mem::take(&mut pending);
                        fields.push(self.field(names, ty));
                    }
                    ParamEntry::Type(ty) => {
                        let range = self.range_of(ty);
                        self.error_at(range, "mixed named and unnamed parameters");
                        fields.push(self.field(Vec::new(), ty));
                    }
                }
            }
            for id in pending {
                let range = self.range_of(id);
                self.error_at(range, "missing parameter type");
                fields.push(self.field(Vec::new(), id));
            }
        } else {
            for entry in entries {
                let ty = match entry {
                    ParamEntry::Ident(id) | ParamEntry::Type(id) | ParamEntry::Named(_, id) => id,
                };
                fields.push(self.field(Vec::new(), ty));
            }
        }

        self.finish(
            NodeKind::FieldList {
                open: Some(open_pos),
                fields,
                close: Some(close_pos),
            },
            start,
        )
    }

    fn field(&mut self, names: Vec<NodeId>, ty: NodeId) -> NodeId {
        let start = names
            .first()
            .map_or(self.range_of(ty).start(), |n| self.range_of(*n).start());
        let end = self.range_of(ty).end();
        self.alloc(
            NodeKind::Field {
                names,
                ty,
                tag: None,
            },
            TextRange::new(start, end),
        )
    }

    fn parse_param_decl(&mut self, type_params: bool) -> ParamEntry {
        if self.at(TokenKind::Ellipsis) {
            return ParamEntry::Type(self.parse_variadic());
        }
        if !self.at(TokenKind::Ident) {
            let ty = if type_params {
                self.parse_constraint()
            } else {
                self.parse_type()
            };
            return ParamEntry::Type(ty);
        }

        let ident = self.parse_ident();
        match self.tok() {
            TokenKind::Period => {
                let ty = self.parse_qualified(ident);
                ParamEntry::Type(ty)
            }
            TokenKind::Ellipsis => {
                let ty = self.parse_variadic();
                ParamEntry::Named(ident, ty)
            }
            TokenKind::LBrack if !type_params => self.parse_array_or_instance(ident),
            TokenKind::Comma | TokenKind::RParen | TokenKind::RBrack => ParamEntry::Ident(ident),
            TokenKind::Tilde if type_params => ParamEntry::Named(ident, self.parse_constraint()),
            kind if Self::can_start_type(kind) => {
                let ty = if type_params {
                    self.parse_constraint()
                } else {
                    self.parse_type()
                };
                ParamEntry::Named(ident, ty)
            }
            _ => ParamEntry::Ident(ident),
        }
    }

    /// `name [N]T` (a named array parameter) versus `T[A, B]` (an instantiated type).
    fn parse_array_or_instance(&mut self, ident: NodeId) -> ParamEntry {
        let start = self.range_of(ident).start();
        let lbrack = self.bump().range.start();
        if self.at(TokenKind::RBrack) {
            self.bump();
            let elem = self.parse_type();
            let ty = self.finish(NodeKind::ArrayType { len: None, elem }, lbrack);
            return ParamEntry::Named(ident, ty);
        }
        let mut args = vec![self.parse_array_len_or_type()];
        while self.eat(TokenKind::Comma).is_some() && !self.at(TokenKind::RBrack) {
            args.push(self.parse_type());
        }
        let rbrack = self.expect_closing(TokenKind::RBrack);
        if args.len() == 1 && Self::can_start_type(self.tok()) {
            let elem = self.parse_type();
            let ty = self.finish(
                NodeKind::ArrayType {
                    len: Some(args[0]),
                    elem,
                },
                lbrack,
            );
            return ParamEntry::Named(ident, ty);
        }
        ParamEntry::Type(self.finish(
            NodeKind::Index {
                x: ident,
                lbrack,
                indices: args,
                rbrack,
            },
            start,
        ))
    }

    fn parse_array_len_or_type(&mut self) -> NodeId {
        if self.at(TokenKind::Ellipsis) {
            let tok = self.bump();
            return self.alloc(NodeKind::Ellipsis { elt: None }, tok.range);
        }
        self.parse_expr()
    }

    fn parse_variadic(&mut self) -> NodeId {
        let start = self.expect(TokenKind::Ellipsis);
        let elt = Some(self.parse_type());
        self.finish(NodeKind::Ellipsis { elt }, start)
    }

    /// A type-set constraint: `~int | string | fmt.Stringer`.
    fn parse_constraint(&mut self) -> NodeId {
        let start = self.start();
        let mut x = self.parse_constraint_term();
        while self.at(TokenKind::Or) {
            let op_pos = self.bump().range.start();
            let y = self.parse_constraint_term();
            x = self.finish(
                NodeKind::Binary {
                    op: TokenKind::Or,
                    op_pos,
                    x,
                    y,
                },
                start,
            );
        }
        x
    }

    fn parse_constraint_term(&mut self) -> NodeId {
        if self.at(TokenKind::Tilde) {
            let start = self.bump().range.start();
            let x = self.parse_type();
            return self.finish(
                NodeKind::Unary {
                    op: TokenKind::Tilde,
                    x,
                },
                start,
            );
        }
        self.parse_type()
    }

    fn parse_result(&mut self) -> Option<NodeId> {
        if self.at(TokenKind::LParen) {
            return Some(self.parse_parameters(TokenKind::LParen, TokenKind::RParen));
        }
        if !Self::can_start_type(self.tok()) {
            return None;
        }
        let ty = self.parse_type();
        let field = self.field(Vec::new(), ty);
        let range = self.range_of(ty);
        Some(self.alloc(
            NodeKind::FieldList {
                open: None,
                fields: vec![field],
                close: None,
            },
            range,
        ))
    }

    fn parse_signature(&mut self, start: TextSize) -> NodeId {
        let params = self.parse_parameters(TokenKind::LParen, TokenKind::RParen);
        let results = self.parse_result();
        self.finish(
            NodeKind::FuncType {
                type_params: None,
                params,
                results,
            },
            start,
        )
    }

    pub(crate) fn parse_type(&mut self) -> NodeId {
        let start = self.start();
        match self.tok() {
            TokenKind::Ident => self.parse_type_name(),
            TokenKind::LBrack => {
                self.bump();
                let len = if self.at(TokenKind::RBrack) {
                    None
                } else {
                    self.expr_lev += 1;
                    let len = self.parse_array_len_or_type();
                    self.expr_lev -= 1;
                    Some(len)
                };
                self.expect_closing(TokenKind::RBrack);
                let elem = self.parse_type();
                self.finish(NodeKind::ArrayType { len, elem }, start)
            }
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => self.parse_interface_type(),
            TokenKind::Mul => {
                self.bump();
                let x = self.parse_type();
                self.finish(NodeKind::Star { x }, start)
            }
            TokenKind::Func => {
                self.bump();
                self.parse_signature(start)
            }
            TokenKind::Map => {
                self.bump();
                self.expect(TokenKind::LBrack);
                let key = self.parse_type();
                self.expect_closing(TokenKind::RBrack);
                let value = self.parse_type();
                self.finish(NodeKind::MapType { key, value }, start)
            }
            TokenKind::Chan => {
                self.bump();
                let dir = if self.eat(TokenKind::Arrow).is_some() {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let value = self.parse_type();
                self.finish(NodeKind::ChanType { dir, value }, start)
            }
            TokenKind::Arrow => {
                self.bump();
                self.expect(TokenKind::Chan);
                let value = self.parse_type();
                self.finish(
                    NodeKind::ChanType {
                        dir: ChanDir::Recv,
                        value,
                    },
                    start,
                )
            }
            TokenKind::LParen => {
                self.bump();
                let x = self.parse_type();
                self.expect_closing(TokenKind::RParen);
                self.finish(NodeKind::Paren { x }, start)
            }
            _ => {
                self.error_expected("type");
                self.bad()
            }
        }
    }

    fn parse_type_name(&mut self) -> NodeId {
        let ident = self.parse_ident();
        let x = if self.at(TokenKind::Period) {
            self.parse_qualified(ident)
        } else {
            ident
        };
        if self.at(TokenKind::LBrack) {
            return self.parse_type_args(x);
        }
        x
    }

    fn parse_qualified(&mut self, pkg: NodeId) -> NodeId {
        let start = self.range_of(pkg).start();
        self.expect(TokenKind::Period);
        let sel = self.parse_ident();
        let x = self.finish(NodeKind::Selector { x: pkg, sel }, start);
        if self.at(TokenKind::LBrack) {
            return self.parse_type_args(x);
        }
        x
    }

    fn parse_type_args(&mut self, x: NodeId) -> NodeId {
        let start = self.range_of(x).start();
        let lbrack = self.bump().range.start();
        let mut indices = Vec::new();
        while !matches!(self.tok(), TokenKind::RBrack | TokenKind::Eof) {
            indices.push(self.parse_type());
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let rbrack = self.expect_closing(TokenKind::RBrack);
        self.finish(
            NodeKind::Index {
                x,
                lbrack,
                indices,
                rbrack,
            },
            start,
        )
    }

    fn parse_struct_type(&mut self) -> NodeId {
        let start = self.expect(TokenKind::Struct);
        let list_start = self.start();
        let open = self.expect(TokenKind::LBrace);
        let mut fields = Vec::new();
        while !matches!(self.tok(), TokenKind::RBrace | TokenKind::Eof) {
            let before = self.pos;
            fields.push(self.parse_struct_field());
            self.expect_semi();
            if self.pos == before {
                self.bump();
            }
        }
        let close = self.expect_closing(TokenKind::RBrace);
        let list = self.finish(
            NodeKind::FieldList {
                open: Some(open),
                fields,
                close: Some(close),
            },
            list_start,
        );
        self.finish(NodeKind::StructType { fields: list }, start)
    }

    fn parse_struct_field(&mut self) -> NodeId {
        let start = self.start();
        let (names, ty) = if self.at(TokenKind::Mul) {
            (Vec::new(), self.parse_type())
        } else if self.at(TokenKind::Ident)
            && matches!(
                self.peek(1),
                TokenKind::Period | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::String
            )
        {
            (Vec::new(), self.parse_type_name())
        } else if self.at(TokenKind::Ident) && self.peek(1) == TokenKind::LBrack {
            let ident = self.parse_ident();
            match self.parse_array_or_instance(ident) {
                ParamEntry::Named(name, ty) => (vec![name], ty),
                ParamEntry::Type(ty) | ParamEntry::Ident(ty) => (Vec::new(), ty),
            }
        } else {
            let names = self.parse_ident_list();
            (names, self.parse_type())
        };
        let tag = if self.at(TokenKind::String) {
            let tok = self.bump();
            Some(self.alloc(
                NodeKind::BasicLit {
                    kind: TokenKind::String,
                    value: tok.text(self.src).into(),
                },
                tok.range,
            ))
        } else {
            None
        };
        self.finish(NodeKind::Field { names, ty, tag }, start)
    }

    fn parse_interface_type(&mut self) -> NodeId {
        let start = self.expect(TokenKind::Interface);
        let list_start = self.start();
        let open = self.expect(TokenKind::LBrace);
        let mut fields = Vec::new();
        while !matches!(self.tok(), TokenKind::RBrace | TokenKind::Eof) {
            let before = self.pos;
            let field_start = self.start();
            if self.at(TokenKind::Ident) && self.peek(1) == TokenKind::LParen {
                let name = self.parse_ident();
                let sig_start = self.start();
                let ty = self.parse_signature(sig_start);
                fields.push(self.finish(
                    NodeKind::Field {
                        names: vec![name],
                        ty,
                        tag: None,
                    },
                    field_start,
                ));
            } else {
                let ty = self.parse_constraint();
                fields.push(self.field(Vec::new(), ty));
            }
            self.expect_semi();
            if self.pos == before {
                self.bump();
            }
        }
        let close = self.expect_closing(TokenKind::RBrace);
        let list = self.finish(
            NodeKind::FieldList {
                open: Some(open),
                fields,
                close: Some(close),
            },
            list_start,
        );
        self.finish(NodeKind::InterfaceType { methods: list }, start)
    }

    // ----- statements ----------------------------------------------------------

    fn parse_block(&mut self) -> NodeId {
        let start = self.start();
        let lbrace = self.expect(TokenKind::LBrace);
        let saved = self.expr_lev;
        self.expr_lev = 0;
        let stmts = self.parse_stmt_list();
        self.expr_lev = saved;
        let rbrace = self.expect_closing(TokenKind::RBrace);
        self.finish(
            NodeKind::Block {
                lbrace,
                stmts,
                rbrace,
            },
            start,
        )
    }

    fn parse_stmt_list(&mut self) -> Vec<NodeId> {
        let mut stmts = Vec::new();
        while !matches!(
            self.tok(),
            TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
        ) {
            let before = self.pos;
            if let Some(stmt) = self.parse_stmt() {
                stmts.push(stmt);
            }
            if self.pos == before {
                self.bump();
            }
        }
        stmts
    }

    fn parse_stmt(&mut self) -> Option<NodeId> {
        let start = self.start();
        let stmt = match self.tok() {
            TokenKind::Const | TokenKind::Type | TokenKind::Var => {
                let kw = self.tok();
                let decl = self.parse_gen_decl(kw);
                let stmt = self.finish(NodeKind::DeclStmt { decl }, start);
                self.expect_semi();
                stmt
            }
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imag
            | TokenKind::Char
            | TokenKind::String
            | TokenKind::Func
            | TokenKind::LParen
            | TokenKind::LBrack
            | TokenKind::Struct
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Interface
            | TokenKind::Add
            | TokenKind::Sub
            | TokenKind::Mul
            | TokenKind::And
            | TokenKind::Xor
            | TokenKind::Arrow
            | TokenKind::Not => {
                let stmt = match self.parse_simple_stmt(SimpleMode::LabelOk) {
                    Simple::Stmt(stmt) => stmt,
                    Simple::Range { x, .. } => x,
                };
                if !matches!(self.nodes[stmt.idx()].kind, NodeKind::Labeled { .. }) {
                    self.expect_semi();
                }
                stmt
            }
            TokenKind::Go | TokenKind::Defer => {
                let kw = self.bump().kind;
                let call = self.parse_expr();
                if !matches!(
                    self.nodes[self.unparen(call).idx()].kind,
                    NodeKind::Call { .. }
                ) {
                    let range = self.range_of(call);
                    self.error_at(range, format!("expression in {} must be function call", kw.text()));
                }
                let stmt = if kw == TokenKind::Go {
                    self.finish(NodeKind::Go { call }, start)
                } else {
                    self.finish(NodeKind::Defer { call }, start)
                };
                self.expect_semi();
                stmt
            }
            TokenKind::Return => {
                self.bump();
                let results = if matches!(self.tok(), TokenKind::Semicolon | TokenKind::RBrace) {
                    Vec::new()
                } else {
                    self.parse_expr_list()
                };
                let stmt = self.finish(NodeKind::Return { results }, start);
                self.expect_semi();
                stmt
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Goto | TokenKind::Fallthrough => {
                let tok = self.bump().kind;
                let label = (tok != TokenKind::Fallthrough && self.at(TokenKind::Ident))
                    .then(|| self.parse_ident());
                let stmt = self.finish(NodeKind::Branch { tok, label }, start);
                self.expect_semi();
                stmt
            }
            TokenKind::LBrace => {
                let block = self.parse_block();
                self.expect_semi();
                block
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Select => self.parse_select(),
            TokenKind::For => self.parse_for(),
            TokenKind::Semicolon => {
                self.bump();
                return None;
            }
            TokenKind::RBrace => return None,
            _ => {
                self.error_expected("statement");
                self.fixed = true;
                while !matches!(
                    self.tok(),
                    TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                ) {
                    self.bump();
                }
                let stmt = self.finish(NodeKind::Bad, start);
                self.eat(TokenKind::Semicolon);
                stmt
            }
        };
        Some(stmt)
    }

    fn unparen(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Paren { x } = self.nodes[id.idx()].kind {
            id = x;
        }
        id
    }

    fn parse_simple_stmt(&mut self, mode: SimpleMode) -> Simple {
        let start = self.start();
        if mode == SimpleMode::RangeOk && self.at(TokenKind::Range) {
            self.bump();
            let x = self.parse_expr();
            return Simple::Range {
                key: None,
                value: None,
                tok: None,
                x,
            };
        }

        let lhs = self.parse_expr_list();
        let tok = self.tok();
        if tok.is_assign_op() {
            let tok_pos = self.bump().range.start();
            if mode == SimpleMode::RangeOk
                && self.at(TokenKind::Range)
                && matches!(tok, TokenKind::Define | TokenKind::Assign)
            {
                self.bump();
                let x = self.parse_expr();
                if lhs.len() > 2 {
                    let range = self.range_of(lhs[2]);
                    self.error_at(range, "range clause permits at most two iteration variables");
                }
                return Simple::Range {
                    key: lhs.first().copied(),
                    value: lhs.get(1).copied(),
                    tok: Some(tok),
                    x,
                };
            }
            let rhs = self.parse_expr_list();
            return Simple::Stmt(self.finish(
                NodeKind::Assign {
                    lhs,
                    tok,
                    tok_pos,
                    rhs,
                },
                start,
            ));
        }

        if lhs.len() > 1 {
            self.error_expected("1 expression");
        }
        let x = lhs[0];
        match tok {
            TokenKind::Colon
                if mode == SimpleMode::LabelOk
                    && matches!(self.nodes[x.idx()].kind, NodeKind::Ident { .. }) =>
            {
                self.bump();
                let stmt = match self.parse_stmt() {
                    Some(stmt) => stmt,
                    None => {
                        let at = self.last_end;
                        self.alloc(NodeKind::EmptyStmt, TextRange::empty(at))
                    }
                };
                Simple::Stmt(self.finish(NodeKind::Labeled { label: x, stmt }, start))
            }
            TokenKind::Arrow => {
                self.bump();
                let value = self.parse_expr();
                Simple::Stmt(self.finish(NodeKind::Send { chan: x, value }, start))
            }
            TokenKind::Inc | TokenKind::Dec => {
                self.bump();
                Simple::Stmt(self.finish(NodeKind::IncDec { x, tok }, start))
            }
            _ => Simple::Stmt(self.finish(NodeKind::ExprStmt { x }, start)),
        }
    }

    fn simple_stmt(&mut self, mode: SimpleMode) -> NodeId {
        match self.parse_simple_stmt(mode) {
            Simple::Stmt(id) => id,
            Simple::Range { x, .. } => x,
        }
    }

    /// Converts a statement used in expression position (an `if`/`switch` header).
    fn stmt_to_expr(&mut self, stmt: NodeId, what: &str) -> NodeId {
        match self.nodes[stmt.idx()].kind {
            NodeKind::ExprStmt { x } => x,
            _ => {
                let range = self.range_of(stmt);
                self.error_at(range, format!("cannot use statement as {what}"));
                self.fixed = true;
                self.alloc(NodeKind::Bad, range)
            }
        }
    }

    fn parse_if(&mut self) -> NodeId {
        let start = self.expect(TokenKind::If);
        let saved = self.expr_lev;
        self.expr_lev = -1;
        let mut init = None;
        let mut cond_stmt = None;
        if self.at(TokenKind::LBrace) {
            let range = self.cur().range;
            self.error_at(range, "missing condition in if statement");
        } else {
            if !self.at(TokenKind::Semicolon) {
                init = Some(self.simple_stmt(SimpleMode::Basic));
            }
            if self.at(TokenKind::Semicolon) {
                self.bump();
                if !self.at(TokenKind::LBrace) {
                    cond_stmt = Some(self.simple_stmt(SimpleMode::Basic));
                }
            } else {
                cond_stmt = init.take();
            }
        }
        self.expr_lev = saved;
        let cond = match cond_stmt {
            Some(stmt) => self.stmt_to_expr(stmt, "value"),
            None => self.bad(),
        };
        let body = self.parse_block();
        let else_ = if self.eat(TokenKind::Else).is_some() {
            match self.tok() {
                TokenKind::If => Some(self.parse_if()),
                TokenKind::LBrace => {
                    let block = self.parse_block();
                    self.expect_semi();
                    Some(block)
                }
                _ => {
                    self.error_expected("if statement or block");
                    Some(self.bad())
                }
            }
        } else {
            self.expect_semi();
            None
        };
        // The trailing semicolon belongs to the outermost statement.
        let end = else_.map_or(self.range_of(body).end(), |e| self.range_of(e).end());
        self.alloc(
            NodeKind::If {
                init,
                cond,
                body,
                else_,
            },
            TextRange::new(start, end),
        )
    }

    fn is_type_switch_guard(&self, stmt: NodeId) -> bool {
        let is_guard = |x: NodeId| {
            matches!(
                self.nodes[x.idx()].kind,
                NodeKind::TypeAssert { ty: None, .. }
            )
        };
        match &self.nodes[stmt.idx()].kind {
            NodeKind::ExprStmt { x } => is_guard(*x),
            NodeKind::Assign { lhs, tok, rhs, .. } => {
                *tok == TokenKind::Define && lhs.len() == 1 && rhs.len() == 1 && is_guard(rhs[0])
            }
            _ => false,
        }
    }

    fn parse_switch(&mut self) -> NodeId {
        let start = self.expect(TokenKind::Switch);
        let saved = self.expr_lev;
        self.expr_lev = -1;
        let mut s1 = None;
        let mut s2 = None;
        if !self.at(TokenKind::LBrace) {
            if !self.at(TokenKind::Semicolon) {
                s2 = Some(self.simple_stmt(SimpleMode::Basic));
            }
            if self.at(TokenKind::Semicolon) {
                self.bump();
                s1 = s2.take();
                if !self.at(TokenKind::LBrace) {
                    s2 = Some(self.simple_stmt(SimpleMode::Basic));
                }
            }
        }
        self.expr_lev = saved;

        let type_switch = s2.is_some_and(|s| self.is_type_switch_guard(s));
        let body_start = self.start();
        let lbrace = self.expect(TokenKind::LBrace);
        let mut clauses = Vec::new();
        while matches!(self.tok(), TokenKind::Case | TokenKind::Default) {
            clauses.push(self.parse_case_clause());
        }
        let rbrace = self.expect_closing(TokenKind::RBrace);
        let body = self.finish(
            NodeKind::Block {
                lbrace,
                stmts: clauses,
                rbrace,
            },
            body_start,
        );
        let stmt = match (type_switch, s2) {
            (true, Some(assign)) => self.finish(
                NodeKind::TypeSwitch {
                    init: s1,
                    assign,
                    body,
                },
                start,
            ),
            (_, tag) => {
                let tag = tag.map(|s| self.stmt_to_expr(s, "switch expression"));
                self.finish(NodeKind::Switch { init: s1, tag, body }, start)
            }
        };
        self.expect_semi();
        stmt
    }

    fn parse_case_clause(&mut self) -> NodeId {
        let start = self.start();
        let (list, is_default) = if self.eat(TokenKind::Case).is_some() {
            (self.parse_expr_list(), false)
        } else {
            self.expect(TokenKind::Default);
            (Vec::new(), true)
        };
        let colon = self.expect(TokenKind::Colon);
        let body = self.parse_stmt_list();
        self.finish(
            NodeKind::CaseClause {
                list,
                is_default,
                colon,
                body,
            },
            start,
        )
    }

    fn parse_select(&mut self) -> NodeId {
        let start = self.expect(TokenKind::Select);
        let body_start = self.start();
        let lbrace = self.expect(TokenKind::LBrace);
        let mut clauses = Vec::new();
        while matches!(self.tok(), TokenKind::Case | TokenKind::Default) {
            let clause_start = self.start();
            let comm = if self.eat(TokenKind::Case).is_some() {
                Some(self.simple_stmt(SimpleMode::Basic))
            } else {
                self.expect(TokenKind::Default);
                None
            };
            let colon = self.expect(TokenKind::Colon);
            let body = self.parse_stmt_list();
            clauses.push(self.finish(NodeKind::CommClause { comm, colon, body }, clause_start));
        }
        let rbrace = self.expect_closing(TokenKind::RBrace);
        let body = self.finish(
            NodeKind::Block {
                lbrace,
                stmts: clauses,
                rbrace,
            },
            body_start,
        );
        let stmt = self.finish(NodeKind::Select { body }, start);
        self.expect_semi();
        stmt
    }

    fn parse_for(&mut self) -> NodeId {
        let start = self.expect(TokenKind::For);
        let saved = self.expr_lev;
        self.expr_lev = -1;
        let mut init = None;
        let mut cond = None;
        let mut post = None;
        let mut range = None;
        if !self.at(TokenKind::LBrace) {
            if !self.at(TokenKind::Semicolon) {
                match self.parse_simple_stmt(SimpleMode::RangeOk) {
                    Simple::Stmt(stmt) => cond = Some(stmt),
                    Simple::Range { key, value, tok, x } => range = Some((key, value, tok, x)),
                }
            }
            if range.is_none() && self.at(TokenKind::Semicolon) {
                self.bump();
                init = cond.take();
                if !self.at(TokenKind::Semicolon) {
                    cond = Some(self.simple_stmt(SimpleMode::Basic));
                }
                if self.at(TokenKind::Semicolon) {
                    self.bump();
                } else {
                    self.error_expected("';'");
                }
                if !self.at(TokenKind::LBrace) {
                    post = Some(self.simple_stmt(SimpleMode::Basic));
                }
            }
        }
        self.expr_lev = saved;
        let body = self.parse_block();
        let stmt = match range {
            Some((key, value, tok, x)) => self.finish(
                NodeKind::Range {
                    key,
                    value,
                    tok,
                    x,
                    body,
                },
                start,
            ),
            None => {
                let cond = cond.map(|s| self.stmt_to_expr(s, "for condition"));
                self.finish(
                    NodeKind::For {
                        init,
                        cond,
                        post,
                        body,
                    },
                    start,
                )
            }
        };
        self.expect_semi();
        stmt
    }

    // ----- expressions ---------------------------------------------------------

    fn parse_expr_list(&mut self) -> Vec<NodeId> {
        let mut list = vec![self.parse_expr()];
        while self.eat(TokenKind::Comma).is_some() {
            list.push(self.parse_expr());
        }
        list
    }

    pub(crate) fn parse_expr(&mut self) -> NodeId {
        self.parse_binary_expr(1)
    }

    fn parse_binary_expr(&mut self, prec1: u8) -> NodeId {
        let start = self.start();
        let mut x = self.parse_unary_expr();
        loop {
            let op = self.tok();
            let prec = op.precedence();
            if prec == 0 || prec < prec1 {
                return x;
            }
            let op_pos = self.bump().range.start();
            let y = self.parse_binary_expr(prec + 1);
            x = self.finish(NodeKind::Binary { op, op_pos, x, y }, start);
        }
    }

    fn parse_unary_expr(&mut self) -> NodeId {
        let start = self.start();
        match self.tok() {
            TokenKind::Add
            | TokenKind::Sub
            | TokenKind::Not
            | TokenKind::Xor
            | TokenKind::And
            | TokenKind::Tilde => {
                let op = self.bump().kind;
                let x = self.parse_unary_expr();
                self.finish(NodeKind::Unary { op, x }, start)
            }
            TokenKind::Arrow => {
                if self.peek(1) == TokenKind::Chan {
                    return self.parse_type();
                }
                self.bump();
                let x = self.parse_unary_expr();
                self.finish(
                    NodeKind::Unary {
                        op: TokenKind::Arrow,
                        x,
                    },
                    start,
                )
            }
            TokenKind::Mul => {
                self.bump();
                let x = self.parse_unary_expr();
                self.finish(NodeKind::Star { x }, start)
            }
            _ => self.parse_primary_expr(),
        }
    }

    fn parse_primary_expr(&mut self) -> NodeId {
        let start = self.start();
        let mut x = self.parse_operand();
        loop {
            match self.tok() {
                TokenKind::Period => {
                    self.bump();
                    match self.tok() {
                        TokenKind::Ident => {
                            let sel = self.parse_ident();
                            x = self.finish(NodeKind::Selector { x, sel }, start);
                        }
                        TokenKind::LParen => {
                            self.bump();
                            let ty = if self.eat(TokenKind::Type).is_some() {
                                None
                            } else {
                                Some(self.parse_type())
                            };
                            self.expect_closing(TokenKind::RParen);
                            x = self.finish(NodeKind::TypeAssert { x, ty }, start);
                        }
                        _ => {
                            self.error_expected("selector or type assertion");
                            let sel = self.parse_ident();
                            x = self.finish(NodeKind::Selector { x, sel }, start);
                            return x;
                        }
                    }
                }
                TokenKind::LBrack => x = self.parse_index_or_slice(x, start),
                TokenKind::LParen => x = self.parse_call(x, start),
                TokenKind::LBrace => {
                    let t = self.unparen(x);
                    let allowed = match self.nodes[t.idx()].kind {
                        NodeKind::Bad
                        | NodeKind::Ident { .. }
                        | NodeKind::Selector { .. }
                        | NodeKind::Index { .. } => self.expr_lev >= 0,
                        NodeKind::ArrayType { .. }
                        | NodeKind::StructType { .. }
                        | NodeKind::MapType { .. } => true,
                        _ => false,
                    };
                    if !allowed {
                        return x;
                    }
                    x = self.parse_composite_lit(Some(x), start);
                }
                _ => return x,
            }
        }
    }

    fn parse_operand(&mut self) -> NodeId {
        let start = self.start();
        match self.tok() {
            TokenKind::Ident => self.parse_ident(),
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imag
            | TokenKind::Char
            | TokenKind::String => {
                let tok = self.bump();
                self.alloc(
                    NodeKind::BasicLit {
                        kind: tok.kind,
                        value: tok.text(self.src).into(),
                    },
                    tok.range,
                )
            }
            TokenKind::LParen => {
                self.bump();
                self.expr_lev += 1;
                let x = self.parse_expr();
                self.expr_lev -= 1;
                self.expect_closing(TokenKind::RParen);
                self.finish(NodeKind::Paren { x }, start)
            }
            TokenKind::Func => {
                self.bump();
                let ty = self.parse_signature(start);
                if self.at(TokenKind::LBrace) {
                    self.expr_lev += 1;
                    let body = self.parse_block();
                    self.expr_lev -= 1;
                    return self.finish(NodeKind::FuncLit { ty, body }, start);
                }
                ty
            }
            TokenKind::LBrack
            | TokenKind::Struct
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Interface => self.parse_type(),
            _ => {
                self.error_expected("operand");
                self.bad()
            }
        }
    }

    fn parse_index_or_slice(&mut self, x: NodeId, start: TextSize) -> NodeId {
        let lbrack = self.bump().range.start();
        self.expr_lev += 1;
        let mut idx: [Option<NodeId>; 3] = [None; 3];
        if !self.at(TokenKind::Colon) {
            idx[0] = Some(self.parse_expr());
        }
        let mut colons = 0;
        while self.at(TokenKind::Colon) && colons < 2 {
            self.bump();
            colons += 1;
            if !matches!(
                self.tok(),
                TokenKind::Colon | TokenKind::RBrack | TokenKind::Eof
            ) {
                idx[colons] = Some(self.parse_expr());
            }
        }
        let mut indices = Vec::new();
        if colons == 0 {
            indices.extend(idx[0]);
            while self.eat(TokenKind::Comma).is_some() && !self.at(TokenKind::RBrack) {
                indices.push(self.parse_type_or_expr());
            }
        }
        self.expr_lev -= 1;
        let rbrack = self.expect_closing(TokenKind::RBrack);
        if colons > 0 {
            return self.finish(
                NodeKind::Slice {
                    x,
                    low: idx[0],
                    high: idx[1],
                    max: idx[2],
                    slice3: colons == 2,
                },
                start,
            );
        }
        self.finish(
            NodeKind::Index {
                x,
                lbrack,
                indices,
                rbrack,
            },
            start,
        )
    }

    fn parse_type_or_expr(&mut self) -> NodeId {
        self.parse_expr()
    }

    fn parse_call(&mut self, fun: NodeId, start: TextSize) -> NodeId {
        let lparen = self.bump().range.start();
        self.expr_lev += 1;
        let mut args = Vec::new();
        let mut ellipsis = None;
        while !matches!(self.tok(), TokenKind::RParen | TokenKind::Eof) {
            let before = self.pos;
            args.push(self.parse_type_or_expr());
            if let Some(tok) = self.eat(TokenKind::Ellipsis) {
                ellipsis = Some(tok.range.start());
            }
            if self.eat(TokenKind::Comma).is_none() || self.pos == before {
                break;
            }
        }
        self.expr_lev -= 1;
        let rparen = self.expect_closing(TokenKind::RParen);
        self.finish(
            NodeKind::Call {
                fun,
                lparen,
                args,
                ellipsis,
                rparen,
            },
            start,
        )
    }

    fn parse_composite_lit(&mut self, ty: Option<NodeId>, start: TextSize) -> NodeId {
        let lbrace = self.expect(TokenKind::LBrace);
        self.expr_lev += 1;
        let mut elts = Vec::new();
        while !matches!(self.tok(), TokenKind::RBrace | TokenKind::Eof) {
            let before = self.pos;
            elts.push(self.parse_element());
            if self.eat(TokenKind::Comma).is_none() || self.pos == before {
                break;
            }
        }
        self.expr_lev -= 1;
        let rbrace = self.expect_closing(TokenKind::RBrace);
        self.finish(
            NodeKind::CompositeLit {
                ty,
                lbrace,
                elts,
                rbrace,
            },
            start,
        )
    }

    fn parse_value(&mut self) -> NodeId {
        if self.at(TokenKind::LBrace) {
            let start = self.start();
            return self.parse_composite_lit(None, start);
        }
        self.parse_expr()
    }

    fn parse_element(&mut self) -> NodeId {
        let start = self.start();
        let key = self.parse_value();
        if self.eat(TokenKind::Colon).is_some() {
            let value = self.parse_value();
            return self.finish(NodeKind::KeyValue { key, value }, start);
        }
        key
    }
}

/// Parse a standalone expression (used to validate synthesized snippets).
pub(crate) fn parse_expr_tokens(src: &str, tokens: &[Token]) -> (SyntaxTree, Vec<ParseError>) {
    let tokens: Vec<Token> = tokens
        .iter()
        .copied()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect();
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
        last_end: TextSize::from(0),
        nodes: Vec::new(),
        errors: Vec::new(),
        expr_lev: 0,
        fixed: false,
    };
    let root = parser.parse_expr();
    parser.eat(TokenKind::Semicolon);
    if !parser.at(TokenKind::Eof) {
        parser.error_expected("end of expression");
    }
    (
        SyntaxTree::new(parser.nodes, root, Vec::new()),
        parser.errors,
    )
}
