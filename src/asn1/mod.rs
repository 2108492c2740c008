//! A minimal codec for BER and DER encoded values.
//!
//! This module deals with encoded ASN.1 values on the level of their
//! tag-length-value structure only. A value is decoded into a tree of
//! [`Value`]s which are either primitive with their content octets or
//! constructed with a list of nested values. Nothing is known about the
//! meaning of the identifiers.
//!
//! Encoding a value tree always produces the shortest possible length
//! octets, which is what DER requires. Decoding followed by encoding thus
//! turns BER with non-minimal lengths into DER. This is what
//! [`convert_to_der`] does. The conversion does not sort the members of
//! SET values and indefinite length encodings are not supported at all.
//!
//! The structured types elsewhere in this crate use _bcder_ instead. The
//! codec here is used where the exact bytes matter, such as when
//! re-creating the signed attributes of a CMS signer for verification.

pub use self::decode::{Decoder, convert_to_der};
pub use self::error::{DecodeError, LengthError};
pub use self::source::{ByteSource, Limited, ReadSource, SliceSource};
pub use self::value::{Constructed, Identifier, Primitive, Value};

pub mod length;

mod decode;
mod error;
mod source;
mod value;
