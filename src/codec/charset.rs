//! Windows-1252 text conversion for word payloads.
//!
//! Words are single-byte text: one byte is one character. Bytes
//! `0x00-0x7F` and `0xA0-0xFF` map to the code point with the same value;
//! `0x80-0x9F` go through [`HIGH_TABLE`]. The five positions the code page
//! leaves undefined map to the C1 control of the same value, so decoding
//! never fails and every byte survives a decode/encode cycle.

use crate::error::{ApiwireError, Result};

/// Code points for bytes `0x80..=0x9F`.
const HIGH_TABLE: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Map a single byte to its character.
#[inline]
pub fn decode_byte(byte: u8) -> char {
    match byte {
        0x80..=0x9F => HIGH_TABLE[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

/// Map a character back to its byte, if the code page has one.
pub fn encode_char(c: char) -> Option<u8> {
    match u32::from(c) {
        cp @ (0x00..=0x7F | 0xA0..=0xFF) => Some(cp as u8),
        _ => HIGH_TABLE
            .iter()
            .position(|&t| t == c)
            .map(|i| 0x80 + i as u8),
    }
}

/// Decode `bytes` and append the text to `out`.
pub fn decode_into(bytes: &[u8], out: &mut String) {
    out.reserve(bytes.len());
    out.extend(bytes.iter().map(|&b| decode_byte(b)));
}

/// Decode `bytes` into a new string.
pub fn decode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    decode_into(bytes, &mut out);
    out
}

/// Encode `text` into code-page bytes.
///
/// # Errors
///
/// Returns [`ApiwireError::Unencodable`] for the first character the code
/// page cannot represent.
pub fn encode(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| encode_char(c).ok_or(ApiwireError::Unencodable(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_identity() {
        assert_eq!(decode(b"=name=alice"), "=name=alice");
        assert_eq!(encode("=name=alice").unwrap(), b"=name=alice");
    }

    #[test]
    fn test_latin1_range() {
        assert_eq!(decode(&[0xE9]), "é");
        assert_eq!(decode(&[0xA0]), "\u{A0}");
        assert_eq!(encode("ÿ").unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_high_table() {
        assert_eq!(decode_byte(0x80), '€');
        assert_eq!(decode_byte(0x99), '™');
        assert_eq!(decode_byte(0x9F), 'Ÿ');
        assert_eq!(encode_char('€'), Some(0x80));
        assert_eq!(encode_char('—'), Some(0x97));
    }

    #[test]
    fn test_undefined_positions_map_to_c1() {
        for byte in [0x81u8, 0x8D, 0x8F, 0x90, 0x9D] {
            let c = decode_byte(byte);
            assert_eq!(u32::from(c), u32::from(byte));
            assert_eq!(encode_char(c), Some(byte));
        }
    }

    #[test]
    fn test_every_byte_survives() {
        let all_bytes: Vec<u8> = (0..=255).collect();
        let text = decode(&all_bytes);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(encode(&text).unwrap(), all_bytes);
    }

    #[test]
    fn test_unencodable_character() {
        let result = encode("snow ☃");
        assert!(matches!(result, Err(ApiwireError::Unencodable('☃'))));

        // U+0080 is not reachable: byte 0x80 is the euro sign.
        assert_eq!(encode_char('\u{0080}'), None);
    }

    #[test]
    fn test_decode_into_appends() {
        let mut out = String::from("ab");
        decode_into(b"cd", &mut out);
        assert_eq!(out, "abcd");
    }
}
