//! Varint helpers for the length and integer payloads written by the bundled codecs.
//!
//! Unlike a tag byte, these are part of a binding's payload: the tagged codec itself never looks
//! at them. They are documented here because every bundled leaf codec relies on them being
//! self-delimiting.

use crate::{
    magic::MAX_VARINT_LEN,
    utils::error::{CodecError, CodecResult},
};

/// Encode an unsigned 64-bit integer using LEB128.
///
/// Format:
/// - Split the value into 7-bit chunks (base-128 digits), least-significant first.
/// - Every chunk but the last is pushed with MSB = 1 (continuation).
/// - The last chunk is pushed with MSB = 0, which terminates the value.
///
/// Returns the number of bytes handed to `encoder`.
///
/// Notes:
/// - Value 0 encodes to a single byte `0x00`.
/// - The encoding for 128 is `[0x80, 0x01]`.
///
/// ```
/// use hybind::encoding::{DynBuf, integer::encode_u64};
/// let mut buf = DynBuf::new();
/// encode_u64(300, &mut |b| buf.extend_from_slice(b));
/// assert_eq!(&buf[..], &[0xAC, 0x02]);
/// ```
pub fn encode_u64<F: FnMut(&[u8])>(mut value: u64, encoder: &mut F) -> u64 {
    let mut size = 1;
    while value >= 0x80 {
        encoder(&[(value as u8 & 0x7F) | 0x80]);
        value >>= 7;
        size += 1;
    }
    encoder(&[value as u8]);
    size
}

/// Incremental LEB128 decoder, fed one byte at a time.
///
/// This lets the async read context and the slice decoder share the same overflow rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct VarintDecoder {
    value: u64,
    consumed: usize,
}

impl VarintDecoder {
    pub const fn new() -> Self {
        Self {
            value: 0,
            consumed: 0,
        }
    }

    /// Feed the next byte. Returns `Ok(Some(value))` once the terminating byte has been seen.
    ///
    /// Fails with [`CodecError::MalformedVarint`] if the tenth byte carries bits beyond the 64th
    /// or does not terminate the value.
    pub fn push(&mut self, byte: u8) -> CodecResult<Option<u64>> {
        let chunk = (byte & 0x7F) as u64;
        let last = self.consumed == MAX_VARINT_LEN - 1;

        // Only the lowest bit of the tenth chunk fits in a u64.
        if last && (chunk > 1 || byte & 0x80 != 0) {
            return Err(CodecError::MalformedVarint {
                max: MAX_VARINT_LEN,
            });
        }

        self.value |= chunk << (7 * self.consumed);
        self.consumed += 1;

        if byte & 0x80 == 0 {
            Ok(Some(self.value))
        } else {
            Ok(None)
        }
    }
}

/// Decode one unsigned 64-bit integer from the front of the given slice.
///
/// On success the slice is advanced past the consumed bytes. Returns `Ok(None)` if the slice is
/// exhausted before a terminating byte is found (the slice is then left empty).
///
/// ```
/// use hybind::encoding::integer::decode_u64;
/// let mut slice: &[u8] = &[0xAC, 0x02, 0x07];
/// assert_eq!(decode_u64(&mut slice).unwrap(), Some(300));
/// assert_eq!(slice, &[0x07]);
/// ```
pub fn decode_u64(buf: &mut &[u8]) -> CodecResult<Option<u64>> {
    let mut decoder = VarintDecoder::new();

    while let Some((&byte, rest)) = buf.split_first() {
        *buf = rest;
        if let Some(value) = decoder.push(byte)? {
            return Ok(Some(value));
        }
    }

    Ok(None)
}

/// Map a signed integer onto an unsigned one so that small magnitudes stay small.
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
