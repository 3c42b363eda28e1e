use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LiteralError {
    pub message: String,
    /// Byte range within the provided literal text (not file offsets).
    pub span: Range<usize>,
}

fn err(message: impl Into<String>, span: Range<usize>) -> LiteralError {
    LiteralError {
        message: message.into(),
        span,
    }
}

/// Decode a Go string or rune literal (including its quotes).
pub fn unquote(text: &str) -> Result<String, LiteralError> {
    let bytes = text.as_bytes();
    if bytes.len() < 2 {
        return Err(err("literal too short", 0..text.len()));
    }
    let quote = bytes[0];
    if bytes[bytes.len() - 1] != quote {
        return Err(err("unterminated literal", 0..text.len()));
    }
    let body = &text[1..text.len() - 1];
    match quote {
        // Carriage returns are discarded from raw strings.
        b'`' => Ok(body.replace('\r', "")),
        b'"' | b'\'' => unescape(body, quote as char).map_err(|mut e| {
            e.span = e.span.start + 1..e.span.end + 1;
            e
        }),
        _ => Err(err("not a quoted literal", 0..1)),
    }
}

fn unescape(body: &str, quote: char) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut bytes_out: Vec<u8> = Vec::new();
    let mut chars = body.char_indices().peekable();

    // `\xNN` and octal escapes produce raw bytes, so collect into a byte buffer
    // and validate UTF-8 at the end.
    let flush = |out: &mut String, bytes_out: &mut Vec<u8>| -> Result<(), LiteralError> {
        if bytes_out.is_empty() {
            return Ok(());
        }
        let s = String::from_utf8(std::mem::take(bytes_out))
            .map_err(|_| err("invalid UTF-8 produced by byte escapes", 0..0))?;
        out.push_str(&s);
        Ok(())
    };

    while let Some((idx, ch)) = chars.next() {
        if ch == quote {
            return Err(err("unescaped quote", idx..idx + 1));
        }
        if ch != '\\' {
            flush(&mut out, &mut bytes_out)?;
            out.push(ch);
            continue;
        }
        let Some((_, esc)) = chars.next() else {
            return Err(err("trailing backslash", idx..idx + 1));
        };
        let simple = match esc {
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0C}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{0B}'),
            '\\' => Some('\\'),
            c if c == quote => Some(c),
            _ => None,
        };
        if let Some(c) = simple {
            flush(&mut out, &mut bytes_out)?;
            out.push(c);
            continue;
        }
        let (digits, radix) = match esc {
            'x' => (2, 16),
            'u' => (4, 16),
            'U' => (8, 16),
            '0'..='7' => (2, 8),
            _ => return Err(err(format!("unknown escape sequence \\{esc}"), idx..idx + 2)),
        };
        let mut value: u32 = if radix == 8 { esc as u32 - '0' as u32 } else { 0 };
        for _ in 0..digits {
            let Some((didx, d)) = chars.next() else {
                return Err(err("escape sequence too short", idx..body.len()));
            };
            let Some(v) = d.to_digit(radix) else {
                return Err(err("invalid digit in escape sequence", didx..didx + d.len_utf8()));
            };
            value = value * radix + v;
        }
        match esc {
            'x' | '0'..='7' => {
                if value > 0xFF {
                    return Err(err("octal escape value > 255", idx..idx + 4));
                }
                bytes_out.push(value as u8);
            }
            _ => {
                flush(&mut out, &mut bytes_out)?;
                let c = char::from_u32(value)
                    .ok_or_else(|| err("escape is an invalid Unicode code point", idx..idx + 2))?;
                out.push(c);
            }
        }
    }
    flush(&mut out, &mut bytes_out)?;
    Ok(out)
}

/// Go `strconv.Quote`: a double-quoted literal using Go escapes for
/// non-printable characters.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0B}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c as u32 == 0x7F => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => {
                if (c as u32) < 0x10000 {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                } else {
                    out.push_str(&format!("\\U{:08x}", c as u32));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Go `strconv.CanBackquote`: whether `s` can be written as a raw string
/// literal on a single line.
pub fn can_backquote(s: &str) -> bool {
    s.chars().all(|c| {
        c != '`' && c != '\u{FEFF}' && c != '\u{FFFD}' && (c == '\t' || !c.is_control())
    })
}

/// Parse the value of a Go integer literal (`0x1F`, `0o17`, `017`, `1_000`).
pub fn parse_int_literal(text: &str) -> Result<u64, LiteralError> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (&lower[1..], 8)
    } else {
        (lower.as_str(), 10)
    };
    if digits.is_empty() {
        return Err(err("integer literal has no digits", 0..text.len()));
    }
    u64::from_str_radix(digits, radix).map_err(|e| err(e.to_string(), 0..text.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquotes_interpreted_and_raw_strings() {
        assert_eq!(unquote(r#""a\tb\"c""#).unwrap(), "a\tb\"c");
        assert_eq!(unquote("`a\\n`").unwrap(), "a\\n");
        assert_eq!(unquote(r#""\x41é""#).unwrap(), "Aé");
        assert_eq!(unquote("'x'").unwrap(), "x");
        assert!(unquote(r#""\q""#).is_err());
    }

    #[test]
    fn quote_escapes_control_characters() {
        assert_eq!(quote("a\"b\n"), r#""a\"b\n""#);
        assert_eq!(quote("\u{1}"), r#""\x01""#);
    }

    #[test]
    fn backquote_rules() {
        assert!(can_backquote("hello\tworld"));
        assert!(!can_backquote("a`b"));
        assert!(!can_backquote("a\nb"));
    }

    #[test]
    fn integer_literals() {
        assert_eq!(parse_int_literal("0x1F").unwrap(), 31);
        assert_eq!(parse_int_literal("017").unwrap(), 15);
        assert_eq!(parse_int_literal("1_000").unwrap(), 1000);
        assert_eq!(parse_int_literal("0").unwrap(), 0);
    }
}
