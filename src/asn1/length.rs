//! The length octets of a value.
//!
//! ```text
//! short form:  0lllllll                     length 0 to 127
//! long form:   1nnnnnnn  n length octets    big-endian, 1 <= n <= 4
//! ```
//!
//! The indefinite form `0x80` is not supported. Neither are long forms
//! with more than four octets or lengths that don’t fit into a
//! non-negative 32 bit integer. When encoding, the shortest possible form
//! is always used.

use std::io;
use super::error::{DecodeError, LengthError};
use super::source::ByteSource;


/// The largest length we accept when decoding.
pub const MAX_LENGTH: usize = i32::MAX as usize;

/// Reads the length octets from the beginning of `source`.
pub fn read_length(
    source: &mut dyn ByteSource
) -> Result<usize, DecodeError> {
    let first = source.read_byte()?.ok_or(DecodeError::EarlyEof)?;
    if first < 0x80 {
        return Ok(usize::from(first))
    }
    if first == 0x80 {
        return Err(LengthError::Indefinite.into())
    }
    let count = first & 0x7f;
    if count > 4 {
        return Err(LengthError::TooLong(count).into())
    }
    let mut res = 0u32;
    for _ in 0..count {
        let octet = source.read_byte()?.ok_or(DecodeError::EarlyEof)?;
        res = (res << 8) | u32::from(octet);
    }
    let res = res as usize;
    if res > MAX_LENGTH {
        return Err(LengthError::Overflow.into())
    }
    Ok(res)
}

/// Returns the number of octets of the canonical encoding of `len`.
pub fn encoded_len(len: usize) -> usize {
    if len < 0x80 {
        1
    }
    else {
        1 + magnitude_len(len)
    }
}

/// Writes the canonical encoding of `len` to `target`.
pub fn write_length<W: io::Write>(
    len: usize, target: &mut W
) -> Result<(), io::Error> {
    if len < 0x80 {
        return target.write_all(&[len as u8])
    }
    let count = magnitude_len(len);
    target.write_all(&[0x80 | count as u8])?;
    let bytes = len.to_be_bytes();
    target.write_all(&bytes[bytes.len() - count..])
}

/// Returns the number of octets necessary to represent `len`.
fn magnitude_len(len: usize) -> usize {
    let bits = usize::BITS - len.leading_zeros();
    ((bits + 7) / 8) as usize
}


//============ Tests =========================================================
