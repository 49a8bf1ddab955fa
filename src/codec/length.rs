//! Variable-width length descriptor.
//!
//! Every word on the wire is preceded by a 1 to 5 byte descriptor. The high
//! bits of the first byte select the width:
//!
//! ```text
//! ┌───────────┬───────┬──────────────────────────────────────┐
//! │ First byte│ Width │ Length                               │
//! ├───────────┼───────┼──────────────────────────────────────┤
//! │ 0xxxxxxx  │ 1     │ byte0                      (0..2^7)  │
//! │ 10xxxxxx  │ 2     │ byte0 & 0x3F, byte1        (..2^14)  │
//! │ 110xxxxx  │ 3     │ byte0 & 0x1F, byte1..2     (..2^21)  │
//! │ 1110xxxx  │ 4     │ byte0 & 0x0F, byte1..3     (..2^28)  │
//! │ 1111xxxx  │ 5     │ byte1..4 as u32 BE                   │
//! └───────────┴───────┴──────────────────────────────────────┘
//! ```
//!
//! All multi-byte values are Big Endian.

use std::ops::Deref;

use bytes::BufMut;

/// Widest possible descriptor in bytes.
pub const MAX_DESCRIPTOR_WIDTH: usize = 5;

/// A decoded length descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthDescriptor {
    /// Bytes occupied by the descriptor itself (1-5).
    pub width: usize,
    /// Length of the word that follows.
    pub length: u32,
}

/// Width of the descriptor introduced by `first`.
#[inline]
pub fn descriptor_width(first: u8) -> usize {
    if first & 0x80 == 0x00 {
        1
    } else if first & 0xC0 == 0x80 {
        2
    } else if first & 0xE0 == 0xC0 {
        3
    } else if first & 0xF0 == 0xE0 {
        4
    } else {
        5
    }
}

/// Decode a length descriptor from the start of `buf`.
///
/// Returns `None` if `buf` is shorter than the width announced by its first
/// byte (or empty). Callers treat that as "need more data".
///
/// # Example
///
/// ```
/// use apiwire::codec::decode_length;
///
/// let descriptor = decode_length(&[0x81, 0x00]).unwrap();
/// assert_eq!(descriptor.width, 2);
/// assert_eq!(descriptor.length, 0x100);
///
/// assert!(decode_length(&[0x81]).is_none());
/// ```
pub fn decode_length(buf: &[u8]) -> Option<LengthDescriptor> {
    let first = *buf.first()?;
    let width = descriptor_width(first);
    if buf.len() < width {
        return None;
    }

    let length = match width {
        1 => u32::from(first),
        2 => u32::from(first & 0x3F) << 8 | u32::from(buf[1]),
        3 => u32::from(first & 0x1F) << 16 | u32::from(buf[1]) << 8 | u32::from(buf[2]),
        4 => {
            u32::from(first & 0x0F) << 24
                | u32::from(buf[1]) << 16
                | u32::from(buf[2]) << 8
                | u32::from(buf[3])
        }
        _ => u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]),
    };

    Some(LengthDescriptor { width, length })
}

/// An encoded descriptor held on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedLength {
    buf: [u8; MAX_DESCRIPTOR_WIDTH],
    width: usize,
}

impl EncodedLength {
    /// Descriptor width in bytes.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }
}

impl Deref for EncodedLength {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf[..self.width]
    }
}

/// Encode `length` using the narrowest descriptor class that fits.
pub fn encode_length(length: u32) -> EncodedLength {
    let mut buf = [0u8; MAX_DESCRIPTOR_WIDTH];

    let width = if length < 0x80 {
        buf[0] = length as u8;
        1
    } else if length < 0x4000 {
        buf[..2].copy_from_slice(&((length | 0x8000) as u16).to_be_bytes());
        2
    } else if length < 0x20_0000 {
        buf[..3].copy_from_slice(&(length | 0xC0_0000).to_be_bytes()[1..]);
        3
    } else if length < 0x1000_0000 {
        buf[..4].copy_from_slice(&(length | 0xE000_0000).to_be_bytes());
        4
    } else {
        buf[0] = 0xF0;
        buf[1..].copy_from_slice(&length.to_be_bytes());
        5
    };

    EncodedLength { buf, width }
}

/// Encode `length` and append it to `dst`.
#[inline]
pub fn encode_length_into<B: BufMut>(length: u32, dst: &mut B) {
    dst.put_slice(&encode_length(length));
}
