//! Go lexer with automatic semicolon insertion.
//!
//! Comments are kept in the token stream so that layout-sensitive kernels
//! (join/split lines, doc-comment detection) can inspect them; the parser
//! filters them out.

use text_size::{TextRange, TextSize};

use crate::token::{Token, TokenKind};
use crate::ParseError;

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    insert_semi: bool,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

/// Lex `src` into tokens (including comments and implicit semicolons).
pub fn lex(src: &str) -> (Vec<Token>, Vec<ParseError>) {
    let mut lexer = Lexer {
        src,
        bytes: src.as_bytes(),
        pos: 0,
        insert_semi: false,
        tokens: Vec::new(),
        errors: Vec::new(),
    };
    lexer.run();
    (lexer.tokens, lexer.errors)
}

impl<'a> Lexer<'a> {
    fn run(&mut self) {
        loop {
            self.skip_blanks();
            if self.pos >= self.bytes.len() {
                if self.insert_semi {
                    self.push_implicit_semi(self.pos);
                }
                let end = TextSize::from(self.pos as u32);
                self.tokens.push(Token {
                    kind: TokenKind::Eof,
                    range: TextRange::empty(end),
                    implicit: false,
                });
                return;
            }

            let c = self.bytes[self.pos];
            if c == b'\n' {
                if self.insert_semi {
                    self.push_implicit_semi(self.pos);
                }
                self.pos += 1;
                continue;
            }

            if c == b'/' && self.peek(1) == Some(b'/') {
                if self.insert_semi {
                    self.push_implicit_semi(self.pos);
                }
                let start = self.pos;
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                let mut end = self.pos;
                if end > start && self.bytes[end - 1] == b'\r' {
                    end -= 1;
                }
                self.push(TokenKind::Comment, start, end);
                continue;
            }

            if c == b'/' && self.peek(1) == Some(b'*') {
                let start = self.pos;
                self.pos += 2;
                let mut closed = false;
                let mut has_newline = false;
                while self.pos < self.bytes.len() {
                    if self.bytes[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                        self.pos += 2;
                        closed = true;
                        break;
                    }
                    if self.bytes[self.pos] == b'\n' {
                        has_newline = true;
                    }
                    self.pos += 1;
                }
                if !closed {
                    self.error(start, self.pos, "comment not terminated");
                }
                if self.insert_semi && (has_newline || !closed) {
                    self.push_implicit_semi(start);
                }
                self.push(TokenKind::Comment, start, self.pos);
                continue;
            }

            let start = self.pos;
            let kind = self.scan_token();
            self.insert_semi = matches!(
                kind,
                TokenKind::Ident
                    | TokenKind::Int
                    | TokenKind::Float
                    | TokenKind::Imag
                    | TokenKind::Char
                    | TokenKind::String
                    | TokenKind::Break
                    | TokenKind::Continue
                    | TokenKind::Fallthrough
                    | TokenKind::Return
                    | TokenKind::Inc
                    | TokenKind::Dec
                    | TokenKind::RParen
                    | TokenKind::RBrack
                    | TokenKind::RBrace
            );
            self.tokens.push(Token {
                kind,
                range: TextRange::new(
                    TextSize::from(start as u32),
                    TextSize::from(self.pos as u32),
                ),
                implicit: false,
            });
        }
    }

    fn peek(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn skip_blanks(&mut self) {
        while let Some(&c) = self.bytes.get(self.pos) {
            if c == b' ' || c == b'\t' || c == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            range: TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32)),
            implicit: false,
        });
    }

    fn push_implicit_semi(&mut self, at: usize) {
        self.tokens.push(Token {
            kind: TokenKind::Semicolon,
            range: TextRange::empty(TextSize::from(at as u32)),
            implicit: true,
        });
        self.insert_semi = false;
    }

    fn error(&mut self, start: usize, end: usize, message: impl Into<String>) {
        self.errors.push(ParseError::new(
            message,
            TextRange::new(TextSize::from(start as u32), TextSize::from(end as u32)),
        ));
    }

    fn scan_token(&mut self) -> TokenKind {
        let c = self.bytes[self.pos];
        if c.is_ascii_digit() || (c == b'.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.scan_number();
        }
        if c == b'_' || c.is_ascii_alphabetic() || c >= 0x80 {
            if let Some(kind) = self.scan_ident() {
                return kind;
            }
        }

        let start = self.pos;
        match c {
            b'"' => return self.scan_string(),
            b'`' => return self.scan_raw_string(),
            b'\'' => return self.scan_rune(),
            _ => {}
        }

        let rest = &self.bytes[self.pos..];
        const OPS: &[(&str, TokenKind)] = &[
            ("&^=", TokenKind::AndNotAssign),
            ("<<=", TokenKind::ShlAssign),
            (">>=", TokenKind::ShrAssign),
            ("...", TokenKind::Ellipsis),
            ("&&", TokenKind::LAnd),
            ("||", TokenKind::LOr),
            ("<-", TokenKind::Arrow),
            ("++", TokenKind::Inc),
            ("--", TokenKind::Dec),
            ("==", TokenKind::Eql),
            ("!=", TokenKind::Neq),
            ("<=", TokenKind::Leq),
            (">=", TokenKind::Geq),
            (":=", TokenKind::Define),
            ("+=", TokenKind::AddAssign),
            ("-=", TokenKind::SubAssign),
            ("*=", TokenKind::MulAssign),
            ("/=", TokenKind::QuoAssign),
            ("%=", TokenKind::RemAssign),
            ("&=", TokenKind::AndAssign),
            ("|=", TokenKind::OrAssign),
            ("^=", TokenKind::XorAssign),
            ("<<", TokenKind::Shl),
            (">>", TokenKind::Shr),
            ("&^", TokenKind::AndNot),
            ("+", TokenKind::Add),
            ("-", TokenKind::Sub),
            ("*", TokenKind::Mul),
            ("/", TokenKind::Quo),
            ("%", TokenKind::Rem),
            ("&", TokenKind::And),
            ("|", TokenKind::Or),
            ("^", TokenKind::Xor),
            ("<", TokenKind::Lss),
            (">", TokenKind::Gtr),
            ("=", TokenKind::Assign),
            ("!", TokenKind::Not),
            ("~", TokenKind::Tilde),
            ("(", TokenKind::LParen),
            ("[", TokenKind::LBrack),
            ("{", TokenKind::LBrace),
            (",", TokenKind::Comma),
            (".", TokenKind::Period),
            (")", TokenKind::RParen),
            ("]", TokenKind::RBrack),
            ("}", TokenKind::RBrace),
            (";", TokenKind::Semicolon),
            (":", TokenKind::Colon),
        ];
        for (text, kind) in OPS {
            if rest.starts_with(text.as_bytes()) {
                self.pos += text.len();
                return *kind;
            }
        }

        let ch_len = self.src[self.pos..].chars().next().map_or(1, char::len_utf8);
        self.pos += ch_len;
        self.error(start, self.pos, format!("invalid character {:?}", &self.src[start..self.pos]));
        TokenKind::Illegal
    }

    fn scan_ident(&mut self) -> Option<TokenKind> {
        let start = self.pos;
        let mut end = self.pos;
        for (idx, ch) in self.src[self.pos..].char_indices() {
            let ok = if idx == 0 {
                ch == '_' || unicode_ident::is_xid_start(ch)
            } else {
                ch == '_' || unicode_ident::is_xid_continue(ch)
            };
            if !ok {
                break;
            }
            end = self.pos + idx + ch.len_utf8();
        }
        if end == start {
            return None;
        }
        self.pos = end;
        Some(TokenKind::keyword(&self.src[start..end]).unwrap_or(TokenKind::Ident))
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.pos;
        let mut kind = TokenKind::Int;
        let is_digit = |b: u8, radix: u32| (b as char).is_digit(radix) || b == b'_';

        if self.bytes[self.pos] == b'0'
            && matches!(self.peek(1), Some(b'x' | b'X' | b'b' | b'B' | b'o' | b'O'))
        {
            let radix = match self.bytes[self.pos + 1] {
                b'x' | b'X' => 16,
                b'b' | b'B' => 2,
                _ => 8,
            };
            self.pos += 2;
            while self.pos < self.bytes.len() && is_digit(self.bytes[self.pos], radix) {
                self.pos += 1;
            }
            if radix == 16 && self.peek(0) == Some(b'.') {
                kind = TokenKind::Float;
                self.pos += 1;
                while self.pos < self.bytes.len() && is_digit(self.bytes[self.pos], 16) {
                    self.pos += 1;
                }
            }
            if radix == 16 && matches!(self.peek(0), Some(b'p' | b'P')) {
                kind = TokenKind::Float;
                self.scan_exponent();
            }
        } else {
            while self.pos < self.bytes.len() && is_digit(self.bytes[self.pos], 10) {
                self.pos += 1;
            }
            if self.peek(0) == Some(b'.') {
                kind = TokenKind::Float;
                self.pos += 1;
                while self.pos < self.bytes.len() && is_digit(self.bytes[self.pos], 10) {
                    self.pos += 1;
                }
            }
            if matches!(self.peek(0), Some(b'e' | b'E')) {
                kind = TokenKind::Float;
                self.scan_exponent();
            }
        }

        if self.peek(0) == Some(b'i') {
            self.pos += 1;
            kind = TokenKind::Imag;
        }
        if self.pos == start {
            self.pos += 1;
        }
        kind
    }

    fn scan_exponent(&mut self) {
        self.pos += 1;
        if matches!(self.peek(0), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        if digits_start == self.pos {
            self.error(digits_start, self.pos, "exponent has no digits");
        }
    }

    fn scan_escape(&mut self, quote: u8) {
        // `self.pos` is on the byte after the backslash.
        let Some(c) = self.peek(0) else {
            return;
        };
        let digits = match c {
            b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' | b'\\' => {
                self.pos += 1;
                return;
            }
            c if c == quote => {
                self.pos += 1;
                return;
            }
            b'0'..=b'7' => 3,
            b'x' => {
                self.pos += 1;
                2
            }
            b'u' => {
                self.pos += 1;
                4
            }
            b'U' => {
                self.pos += 1;
                8
            }
            _ => {
                let start = self.pos.saturating_sub(1);
                self.error(start, self.pos + 1, "unknown escape sequence");
                self.pos += 1;
                return;
            }
        };
        for _ in 0..digits {
            match self.peek(0) {
                Some(b) if (b as char).is_ascii_hexdigit() => self.pos += 1,
                _ => {
                    self.error(self.pos, self.pos, "illegal character in escape sequence");
                    return;
                }
            }
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    self.error(start, self.pos, "string literal not terminated");
                    break;
                }
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    self.scan_escape(b'"');
                }
                Some(_) => self.pos += 1,
            }
        }
        TokenKind::String
    }

    fn scan_raw_string(&mut self) -> TokenKind {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                None => {
                    self.error(start, self.pos, "raw string literal not terminated");
                    break;
                }
                Some(b'`') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        TokenKind::String
    }

    fn scan_rune(&mut self) -> TokenKind {
        let start = self.pos;
        self.pos += 1;
        let mut count = 0;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    self.error(start, self.pos, "rune literal not terminated");
                    break;
                }
                Some(b'\'') => {
                    self.pos += 1;
                    if count != 1 {
                        self.error(start, self.pos, "illegal rune literal");
                    }
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    self.scan_escape(b'\'');
                    count += 1;
                }
                Some(_) => {
                    let len = self.src[self.pos..].chars().next().map_or(1, char::len_utf8);
                    self.pos += len;
                    count += 1;
                }
            }
        }
        TokenKind::Char
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn inserts_semicolons_at_line_ends() {
        assert_eq!(
            kinds("x := 1\nreturn\n"),
            vec![
                TokenKind::Ident,
                TokenKind::Define,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Return,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn semicolon_precedes_trailing_line_comment() {
        let (tokens, errors) = lex("f() // call\n");
        assert!(errors.is_empty());
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Comment,
                TokenKind::Eof,
            ]
        );
        assert!(tokens[3].implicit);
    }

    #[test]
    fn numbers_and_strings() {
        assert_eq!(
            kinds("0x1F 1.5e3 2i 'a' \"s\\n\" `raw`"),
            vec![
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Imag,
                TokenKind::Char,
                TokenKind::String,
                TokenKind::String,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn reports_unterminated_string() {
        let (_, errors) = lex("\"abc\n");
        assert_eq!(errors.len(), 1);
    }
}
