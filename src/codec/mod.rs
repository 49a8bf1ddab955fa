//! Codec module - length descriptors, word text and sentence encoding.
//!
//! - [`length`] - the 1-5 byte variable-width length descriptor
//! - [`charset`] - single-byte Windows-1252 text conversion
//!
//! The encoders here are the mirror image of the
//! [`FrameAssembler`](crate::protocol::FrameAssembler): they produce exactly
//! the bytes it consumes.
//!
//! # Example
//!
//! ```
//! use apiwire::codec::encode_sentence;
//! use apiwire::protocol::FrameAssembler;
//!
//! let bytes = encode_sentence(&["!done", ".tag=3"]).unwrap();
//!
//! let mut assembler = FrameAssembler::new();
//! let sentences = assembler.push(&bytes).unwrap();
//! assert_eq!(sentences[0].words(), &["!done", ".tag=3"]);
//! ```

pub mod charset;
mod length;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ApiwireError, Result};

pub use length::{
    decode_length, descriptor_width, encode_length, encode_length_into, EncodedLength,
    LengthDescriptor, MAX_DESCRIPTOR_WIDTH,
};

/// Zero-length descriptor closing a sentence.
pub const TERMINATOR: u8 = 0x00;

/// Encode a single word (descriptor + text) into `dst`.
///
/// # Errors
///
/// Fails if the word contains a character outside the code page, or is too
/// long for a length descriptor.
pub fn encode_word(word: &str, dst: &mut BytesMut) -> Result<()> {
    let text = charset::encode(word)?;
    let length = word_length(text.len())?;
    dst.reserve(MAX_DESCRIPTOR_WIDTH + text.len());
    encode_length_into(length, dst);
    dst.put_slice(&text);
    Ok(())
}

/// Byte length of a word as carried by its descriptor.
fn word_length(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| ApiwireError::Unframeable(len))
}

/// Encode a complete sentence: every word, then the terminator.
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    for word in words {
        encode_word(word.as_ref(), &mut buf)?;
    }
    buf.put_u8(TERMINATOR);
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_word_layout() {
        let mut buf = BytesMut::new();
        encode_word("!re", &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x03, b'!', b'r', b'e']);
    }

    #[test]
    fn test_encode_word_uses_code_page() {
        let mut buf = BytesMut::new();
        encode_word("€5", &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x02, 0x80, b'5']);
    }

    #[test]
    fn test_encode_long_word_descriptor() {
        let word = "x".repeat(200);
        let mut buf = BytesMut::new();
        encode_word(&word, &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x80, 200]);
        assert_eq!(buf.len(), 202);
    }

    #[test]
    fn test_word_length_limit() {
        assert_eq!(word_length(0).unwrap(), 0);
        assert_eq!(word_length(u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_word_length_overflow_rejected() {
        let len = u32::MAX as usize + 1;
        assert!(matches!(word_length(len), Err(ApiwireError::Unframeable(n)) if n == len));
    }

    #[test]
    fn test_encode_sentence_terminated() {
        let bytes = encode_sentence(&["!done"]).unwrap();
        assert_eq!(&bytes[..], &[0x05, b'!', b'd', b'o', b'n', b'e', 0x00]);
    }

    #[test]
    fn test_encode_empty_sentence() {
        let words: [&str; 0] = [];
        let bytes = encode_sentence(&words).unwrap();
        assert_eq!(&bytes[..], &[TERMINATOR]);
    }

    #[test]
    fn test_encode_sentence_rejects_unencodable() {
        assert!(encode_sentence(&["=comment=日本"]).is_err());
    }
}
