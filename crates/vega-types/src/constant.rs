//! Compile-time constant values.
//!
//! Integers are tracked exactly up to 128 bits; anything beyond (and complex
//! numbers) degrades to [`ConstValue::Unknown`], which is still a constant
//! but never folded.

use std::fmt;

use vega_syntax::literals;
use vega_syntax::TokenKind;

use crate::types::BasicKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    String(String),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConstError {
    #[error("invalid operation: division by zero")]
    DivisionByZero,
    #[error("invalid constant operation")]
    Invalid,
}

impl ConstValue {
    /// Value of a basic literal token.
    pub fn from_literal(kind: TokenKind, text: &str) -> ConstValue {
        match kind {
            TokenKind::Int => literals::parse_int_literal(text)
                .map(|v| ConstValue::Int(i128::from(v)))
                .unwrap_or(ConstValue::Unknown),
            TokenKind::Float => {
                let cleaned: String = text.chars().filter(|&c| c != '_').collect();
                if cleaned.starts_with("0x") || cleaned.starts_with("0X") {
                    return ConstValue::Unknown;
                }
                cleaned
                    .parse::<f64>()
                    .map(ConstValue::Float)
                    .unwrap_or(ConstValue::Unknown)
            }
            TokenKind::Char => match literals::unquote(text) {
                Ok(s) => s
                    .chars()
                    .next()
                    .map(|c| ConstValue::Int(i128::from(u32::from(c))))
                    .unwrap_or(ConstValue::Unknown),
                Err(_) => ConstValue::Unknown,
            },
            TokenKind::String => literals::unquote(text)
                .map(ConstValue::String)
                .unwrap_or(ConstValue::Unknown),
            _ => ConstValue::Unknown,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e38 => Some(*f as i128),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Int(v) => Some(*v as f64),
            ConstValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ConstValue::Unknown)
    }

    /// Whether the value is representable by a value of the basic kind.
    pub fn representable(&self, kind: BasicKind) -> bool {
        let kind = kind.canonical();
        match self {
            ConstValue::Unknown => true,
            ConstValue::Bool(_) => kind.is_boolean(),
            ConstValue::String(_) => kind.is_string(),
            ConstValue::Int(v) => {
                if kind.is_float() || kind.is_complex() || kind == BasicKind::UntypedInt || kind == BasicKind::UntypedRune {
                    return true;
                }
                if !kind.is_integer() {
                    return false;
                }
                let Some(bits) = kind.int_bits() else {
                    return false;
                };
                if kind.is_unsigned() {
                    *v >= 0 && (bits == 128 || *v < (1i128 << bits))
                } else {
                    let bound = 1i128 << (bits - 1);
                    -bound <= *v && *v < bound
                }
            }
            ConstValue::Float(f) => {
                if kind.is_float() || kind.is_complex() {
                    true
                } else if kind.is_integer() {
                    f.fract() == 0.0 && ConstValue::Int(*f as i128).representable(kind)
                } else {
                    false
                }
            }
        }
    }

    /// Convert to the representation used by values of `kind`.
    pub fn convert(self, kind: BasicKind) -> ConstValue {
        match (self, kind.canonical()) {
            (ConstValue::Int(v), k) if k.is_float() => ConstValue::Float(v as f64),
            (ConstValue::Float(f), k) if k.is_integer() && f.fract() == 0.0 => ConstValue::Int(f as i128),
            (v, _) => v,
        }
    }

    pub fn unary(op: TokenKind, x: &ConstValue, unsigned_bits: Option<u32>) -> ConstValue {
        match (op, x) {
            (TokenKind::Add, v) => v.clone(),
            (TokenKind::Sub, ConstValue::Int(v)) => v.checked_neg().map_or(ConstValue::Unknown, ConstValue::Int),
            (TokenKind::Sub, ConstValue::Float(f)) => ConstValue::Float(-f),
            (TokenKind::Not, ConstValue::Bool(b)) => ConstValue::Bool(!b),
            (TokenKind::Xor, ConstValue::Int(v)) => match unsigned_bits {
                Some(bits) if bits < 128 => ConstValue::Int(!v & ((1i128 << bits) - 1)),
                _ => ConstValue::Int(!v),
            },
            _ => ConstValue::Unknown,
        }
    }

    pub fn binary(op: TokenKind, x: &ConstValue, y: &ConstValue) -> Result<ConstValue, ConstError> {
        use ConstValue::*;
        let value = match (x, y) {
            (Unknown, _) | (_, Unknown) => Unknown,
            (Int(a), Int(b)) => {
                let (a, b) = (*a, *b);
                let r = match op {
                    TokenKind::Add => a.checked_add(b),
                    TokenKind::Sub => a.checked_sub(b),
                    TokenKind::Mul => a.checked_mul(b),
                    TokenKind::Quo | TokenKind::Rem if b == 0 => return Err(ConstError::DivisionByZero),
                    TokenKind::Quo => a.checked_div(b),
                    TokenKind::Rem => a.checked_rem(b),
                    TokenKind::And => Some(a & b),
                    TokenKind::Or => Some(a | b),
                    TokenKind::Xor => Some(a ^ b),
                    TokenKind::AndNot => Some(a & !b),
                    _ => return Err(ConstError::Invalid),
                };
                r.map_or(Unknown, Int)
            }
            (Int(_) | Float(_), Int(_) | Float(_)) => {
                let (Some(a), Some(b)) = (x.as_f64(), y.as_f64()) else {
                    return Err(ConstError::Invalid);
                };
                match op {
                    TokenKind::Add => Float(a + b),
                    TokenKind::Sub => Float(a - b),
                    TokenKind::Mul => Float(a * b),
                    TokenKind::Quo if b == 0.0 => return Err(ConstError::DivisionByZero),
                    TokenKind::Quo => Float(a / b),
                    _ => return Err(ConstError::Invalid),
                }
            }
            (String(a), String(b)) if op == TokenKind::Add => String(format!("{a}{b}")),
            (Bool(a), Bool(b)) => match op {
                TokenKind::LAnd => Bool(*a && *b),
                TokenKind::LOr => Bool(*a || *b),
                _ => return Err(ConstError::Invalid),
            },
            _ => return Err(ConstError::Invalid),
        };
        Ok(value)
    }

    pub fn shift(op: TokenKind, x: &ConstValue, count: u64) -> ConstValue {
        let Some(v) = x.as_i128() else {
            return ConstValue::Unknown;
        };
        match op {
            TokenKind::Shl if count < 127 => v.checked_shl(count as u32).map_or(ConstValue::Unknown, ConstValue::Int),
            TokenKind::Shr => ConstValue::Int(if count >= 127 { if v < 0 { -1 } else { 0 } } else { v >> count }),
            _ => ConstValue::Unknown,
        }
    }

    /// `None` when the comparison cannot be decided at compile time.
    pub fn compare(op: TokenKind, x: &ConstValue, y: &ConstValue) -> Option<bool> {
        use std::cmp::Ordering;
        let ord = match (x, y) {
            (ConstValue::Int(a), ConstValue::Int(b)) => a.cmp(b),
            (ConstValue::String(a), ConstValue::String(b)) => a.cmp(b),
            (ConstValue::Bool(a), ConstValue::Bool(b)) => {
                return match op {
                    TokenKind::Eql => Some(a == b),
                    TokenKind::Neq => Some(a != b),
                    _ => None,
                }
            }
            _ => {
                let (a, b) = (x.as_f64()?, y.as_f64()?);
                a.partial_cmp(&b)?
            }
        };
        Some(match op {
            TokenKind::Eql => ord == Ordering::Equal,
            TokenKind::Neq => ord != Ordering::Equal,
            TokenKind::Lss => ord == Ordering::Less,
            TokenKind::Leq => ord != Ordering::Greater,
            TokenKind::Gtr => ord == Ordering::Greater,
            TokenKind::Geq => ord != Ordering::Less,
            _ => return None,
        })
    }
}

impl fmt::Display for ConstValue {
    /// Go source spelling of the value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Float(x) => {
                if x.fract() == 0.0 && x.abs() < 1e21 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            ConstValue::String(s) => f.write_str(&literals::quote(s)),
            ConstValue::Unknown => f.write_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_arithmetic_is_exact() {
        let seven = ConstValue::from_literal(TokenKind::Int, "7");
        let two = ConstValue::from_literal(TokenKind::Int, "0b10");
        assert_eq!(ConstValue::binary(TokenKind::Quo, &seven, &two), Ok(ConstValue::Int(3)));
        assert_eq!(
            ConstValue::binary(TokenKind::Quo, &seven, &ConstValue::Int(0)),
            Err(ConstError::DivisionByZero)
        );
        assert_eq!(ConstValue::shift(TokenKind::Shl, &ConstValue::Int(1), 10), ConstValue::Int(1024));
    }

    #[test]
    fn representability() {
        assert!(ConstValue::Int(255).representable(BasicKind::Byte));
        assert!(!ConstValue::Int(256).representable(BasicKind::Uint8));
        assert!(!ConstValue::Int(-1).representable(BasicKind::Uint));
        assert!(ConstValue::Float(2.0).representable(BasicKind::Int));
        assert!(!ConstValue::Float(2.5).representable(BasicKind::Int));
    }

    #[test]
    fn rune_literals_are_code_points() {
        assert_eq!(ConstValue::from_literal(TokenKind::Char, "'a'"), ConstValue::Int(97));
        assert_eq!(ConstValue::from_literal(TokenKind::String, r#""a\n""#).as_str(), Some("a\n"));
    }
}
