//! Escaped string literal codec for embedded payloads.
//!
//! Payloads are stored in artifacts as printable, double-quote-safe text.
//! Printable ASCII passes through except `"` and `\`; `\n`, `\r` and `\t`
//! use their short escapes; every other byte (control characters, byte
//! order marks, non-ASCII) becomes `\xNN`. Decoding is the exact inverse.
//!
//! # Examples
//!
//! ```
//! use embedfs::literal::{decode, encode};
//!
//! let raw = b"\xEF\xBB\xBFsay \"hi\"\n";
//! let text = encode(raw);
//! assert_eq!(text, r#"\xEF\xBB\xBFsay \"hi\"\n"#);
//! assert_eq!(decode(&text).unwrap(), raw);
//! ```

use crate::error::{EmbedError, Result};

/// Encodes bytes as an escaped literal body (without surrounding quotes).
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\x{byte:02X}")),
        }
    }
    out
}

/// Decodes an escaped literal body.
///
/// # Errors
///
/// Returns [`EmbedError::Artifact`] on a truncated or unknown escape or a
/// non-ASCII character.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let invalid = |reason: String| EmbedError::Artifact { reason };
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'\\' {
            if !byte.is_ascii() {
                return Err(invalid(format!("non-ASCII byte in literal at offset {i}")));
            }
            out.push(byte);
            i += 1;
            continue;
        }

        let escape = *bytes
            .get(i + 1)
            .ok_or_else(|| invalid(format!("dangling escape at offset {i}")))?;
        match escape {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'x' => {
                let hex = text
                    .get(i + 2..i + 4)
                    .ok_or_else(|| invalid(format!("truncated \\x escape at offset {i}")))?;
                let value = hex
                    .bytes()
                    .all(|b| b.is_ascii_hexdigit())
                    .then(|| u8::from_str_radix(hex, 16).ok())
                    .flatten()
                    .ok_or_else(|| invalid(format!("bad hex escape '\\x{hex}' at offset {i}")))?;
                out.push(value);
                i += 2;
            }
            other => {
                return Err(invalid(format!(
                    "unknown escape '\\{}' at offset {i}",
                    char::from(other)
                )));
            }
        }
        i += 2;
    }

    Ok(out)
}

/// Serde adapter storing `Option<Vec<u8>>` as an optional escaped literal.
pub(crate) mod serde_literal {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S>(value: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&super::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| super::decode(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
