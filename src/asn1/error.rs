//! Errors of the TLV codec.

use std::{error, fmt, io};


//------------ LengthError ---------------------------------------------------

/// The reason why the length octets of a value were rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LengthError {
    /// The length octet was `0x80`, the marker for indefinite length.
    Indefinite,

    /// The long form announced more than four length octets.
    ///
    /// The value is the announced number of octets.
    TooLong(u8),

    /// The length does not fit into a non-negative 32 bit integer.
    Overflow,
}

impl fmt::Display for LengthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LengthError::Indefinite => f.write_str("indefinite length"),
            LengthError::TooLong(n) => {
                write!(f, "length with {} octets", n)
            }
            LengthError::Overflow => f.write_str("length overflow"),
        }
    }
}


//------------ DecodeError ---------------------------------------------------

/// An error happened while decoding a TLV value.
///
/// All of these are fatal to the decode call that produced them.
#[derive(Debug)]
pub enum DecodeError {
    /// The data ended inside an identifier, length, or content.
    EarlyEof,

    /// The length octets use an encoding that isn’t supported.
    UnsupportedLength(LengthError),

    /// A primitive value was found where a constructed one was expected.
    UnexpectedPrimitive,

    /// A constructed value was found where a primitive one was expected.
    UnexpectedConstructed,

    /// A member of a constructed value extends past the end of its parent.
    LengthMismatch,

    /// Constructed values are nested deeper than the given limit.
    TooDeep(usize),

    /// A high tag number identifier exceeded the supported size.
    IdentifierTooLong,

    /// Reading from the underlying source failed.
    Io(io::Error),
}

impl DecodeError {
    /// Returns whether the error signals truncated data.
    pub fn is_early_eof(&self) -> bool {
        matches!(*self, DecodeError::EarlyEof)
    }
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::EarlyEof
        }
        else {
            DecodeError::Io(err)
        }
    }
}

impl From<LengthError> for DecodeError {
    fn from(err: LengthError) -> Self {
        DecodeError::UnsupportedLength(err)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::EarlyEof => f.write_str("unexpected end of data"),
            DecodeError::UnsupportedLength(err) => {
                write!(f, "unsupported length: {}", err)
            }
            DecodeError::UnexpectedPrimitive => {
                f.write_str("expected constructed value, found primitive")
            }
            DecodeError::UnexpectedConstructed => {
                f.write_str("expected primitive value, found constructed")
            }
            DecodeError::LengthMismatch => {
                f.write_str("value extends beyond its enclosing value")
            }
            DecodeError::TooDeep(limit) => {
                write!(f, "values nested deeper than {} levels", limit)
            }
            DecodeError::IdentifierTooLong => {
                f.write_str("identifier too long")
            }
            DecodeError::Io(ref err) => err.fmt(f),
        }
    }
}

impl error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            DecodeError::Io(ref err) => Some(err),
            _ => None
        }
    }
}
