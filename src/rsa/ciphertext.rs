// RSA Ciphertext Interchange Format
// An ordered list of decimal integers, one per encrypted block

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::bigint::RsaBigInt;
use super::error::{Result, RsaError};

/// Encrypted blocks in plaintext order.
///
/// Rendered as a JSON array of decimal strings, e.g. `["1234","5678"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ciphertext {
    blocks: Vec<RsaBigInt>,
}

impl Ciphertext {
    pub fn new(blocks: Vec<RsaBigInt>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[RsaBigInt] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Parse the textual form.
    ///
    /// Accepts a JSON array of decimal strings, or a single bare decimal value
    /// (optionally JSON-quoted) which is read as a one-block ciphertext.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::String(s) => parse_decimal(s),
                    Value::Number(n) => parse_decimal(&n.to_string()),
                    _ => Err(RsaError::InvalidCiphertext(format!(
                        "block {} is not a decimal string",
                        index
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::new),
            Ok(Value::String(s)) => Ok(Self::new(vec![parse_decimal(&s)?])),
            _ => Ok(Self::new(vec![parse_decimal(trimmed)?])),
        }
    }

    /// Render as a compact JSON array of decimal strings
    pub fn to_json(&self) -> String {
        // Decimal digits never need JSON escaping
        let items: Vec<String> = self
            .blocks
            .iter()
            .map(|b| format!("\"{}\"", b.to_str_radix(10)))
            .collect();
        format!("[{}]", items.join(","))
    }
}

fn parse_decimal(s: &str) -> Result<RsaBigInt> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RsaError::InvalidCiphertext(format!(
            "'{}' is not a decimal integer",
            truncate(s)
        )));
    }

    RsaBigInt::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| RsaError::InvalidCiphertext(format!("'{}' is not a decimal integer", truncate(s))))
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(32) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl FromStr for Ciphertext {
    type Err = RsaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::bigint::from_u64;

    #[test]
    fn test_render_json_array() {
        let ct = Ciphertext::new(vec![from_u64(12), from_u64(345)]);
        assert_eq!(ct.to_json(), r#"["12","345"]"#);
        assert_eq!(ct.to_string(), r#"["12","345"]"#);
        assert_eq!(Ciphertext::default().to_json(), "[]");
    }

    #[test]
    fn test_render_is_valid_json() {
        let big = (RsaBigInt::from(1u8) << 2048u32) - 1u8;
        let ct = Ciphertext::new(vec![big.clone(), from_u64(0)]);

        let items: Vec<String> = serde_json::from_str(&ct.to_json()).unwrap();
        assert_eq!(items, vec![big.to_str_radix(10), String::from("0")]);
    }

    #[test]
    fn test_parse_array() {
        let ct = Ciphertext::parse(" [\"12\", \"345\"]\n").unwrap();
        assert_eq!(ct.blocks(), &[from_u64(12), from_u64(345)]);
    }

    #[test]
    fn test_parse_bare_value_is_one_block() {
        let ct: Ciphertext = "98765432109876543210".parse().unwrap();
        assert_eq!(ct.len(), 1);
        assert_eq!(ct.blocks()[0].to_string(), "98765432109876543210");

        let quoted = Ciphertext::parse("\"42\"").unwrap();
        assert_eq!(quoted.blocks(), &[from_u64(42)]);
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(Ciphertext::parse("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "hello", "[\"12\", \"x\"]", "[true]", "-5", "{\"a\":1}"] {
            assert!(
                matches!(Ciphertext::parse(input), Err(RsaError::InvalidCiphertext(_))),
                "accepted {:?}",
                input
            );
        }
    }
}
