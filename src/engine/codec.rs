//! KEEPSAKE - Token Codec
//! Reversible escaping of arbitrary strings into lowercase hex digits, so
//! tokens never contain newlines, tabs or the container's delimiters.
//!
//! ## Token Format (per UTF-16 code unit)
//! ```text
//! '\n'                      -> "00"
//! '\t'                      -> "01"
//! 0x02..=0xFF (otherwise)   -> two hex digits, e.g. 'A' -> "41"
//! anything else             -> "0a" + four hex digits, e.g. 'é' -> "0a00e9"
//! ```
//! Every token is an even number of characters, so the encoded length is
//! always even. `"0a"` never appears as a plain token because `'\n'` has its
//! own sentinel. `"09"` is never produced but still decodes to `'\t'`, its
//! plain hex value.

use std::fmt::Write;

use crate::error::{KeepsakeError, Result};

const NEWLINE_TOKEN: &str = "00";
const TAB_TOKEN: &str = "01";
const WIDE_PREFIX: &str = "0a";

/// Encode `input` into the hex token alphabet. The empty string encodes to itself.
pub fn encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    for unit in input.encode_utf16() {
        match unit {
            0x0A => out.push_str(NEWLINE_TOKEN),
            0x09 => out.push_str(TAB_TOKEN),
            0x02..=0xFF => {
                let _ = write!(out, "{:02x}", unit);
            }
            _ => {
                out.push_str(WIDE_PREFIX);
                let _ = write!(out, "{:04x}", unit);
            }
        }
    }
    out
}

/// Decode text produced by [`encode`].
///
/// Fails with `InvalidEncoding` on odd length, non-hex characters, a truncated
/// wide token, or an unpaired surrogate.
pub fn decode(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(KeepsakeError::InvalidEncoding(format!(
            "odd number of encoded characters ({})",
            bytes.len()
        )));
    }

    let mut units = Vec::with_capacity(bytes.len() / 2);
    let mut pos = 0;
    while pos < bytes.len() {
        let pair = &bytes[pos..pos + 2];
        pos += 2;
        match pair {
            b"00" => units.push(0x0A),
            b"01" => units.push(0x09),
            b"0a" | b"0A" => {
                let wide = bytes.get(pos..pos + 4).ok_or_else(|| {
                    KeepsakeError::InvalidEncoding("truncated wide token".into())
                })?;
                pos += 4;
                units.push(parse_hex(wide)? as u16);
            }
            _ => units.push(parse_hex(pair)? as u16),
        }
    }

    String::from_utf16(&units)
        .map_err(|_| KeepsakeError::InvalidEncoding("unpaired surrogate".into()))
}

fn parse_hex(digits: &[u8]) -> Result<u32> {
    digits.iter().try_fold(0u32, |acc, &b| {
        let digit = (b as char).to_digit(16).ok_or_else(|| {
            KeepsakeError::InvalidEncoding(format!(
                "unrecognized hex characters {:?}",
                String::from_utf8_lossy(digits)
            ))
        })?;
        Ok(acc * 16 + digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_identity() {
        assert_eq!(encode(""), "");
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn test_ascii_matches_plain_hex() {
        assert_eq!(encode("Hi!"), "486921");
        assert_eq!(decode("486921").unwrap(), "Hi!");
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(encode("a\nb\tc"), "6100620163");
        assert_eq!(encode("\n\t"), "0001");
        assert_eq!(decode("0001").unwrap(), "\n\t");
        assert_eq!(decode("09").unwrap(), "\t");
    }

    #[test]
    fn test_wide_and_low_control_characters() {
        assert_eq!(encode("é"), "0a00e9");
        assert_eq!(encode("\u{0}"), "0a0000");
        assert_eq!(encode("\u{1}"), "0a0001");
        assert_eq!(decode("0a00e9").unwrap(), "é");
    }

    #[test]
    fn test_round_trip_mixed() {
        let samples = [
            "plain ascii",
            "comma,dash-brace{}paren()",
            "line\nbreak\ttab\r\n",
            "日本語 🦀 café",
            "\u{0}\u{1}\u{2}\u{7f}\u{ff}\u{100}\u{ffff}",
        ];
        for s in samples {
            let encoded = encode(s);
            assert_eq!(encoded.len() % 2, 0);
            assert!(encoded.bytes().all(|b| b.is_ascii_hexdigit()), "{encoded}");
            assert_eq!(decode(&encoded).unwrap(), s);
        }
    }

    #[test]
    fn test_decode_rejects_odd_length() {
        assert!(matches!(decode("416"), Err(KeepsakeError::InvalidEncoding(_))));
    }

    #[test]
    fn test_decode_rejects_bad_tokens() {
        assert!(decode("zz").is_err());
        assert!(decode("0a00").is_err());
        assert!(decode("é!").is_err());
        // lone high surrogate
        assert!(decode("0ad800").is_err());
    }
}
