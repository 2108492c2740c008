//! Identifiers and values.

use std::{fmt, io};
use bytes::Bytes;
use super::error::DecodeError;
use super::length;
use super::source::ByteSource;


//------------ Identifier ----------------------------------------------------

/// The identifier octets of a value.
///
/// The first octet carries the class, the constructed flag in bit 6, and
/// either a tag number below 31 or the escape value 31 in the lower five
/// bits. With the escape value, the tag number follows in base 128 with
/// the high bit set in every octet but the last.
///
/// Apart from the constructed flag, identifiers are treated as opaque.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Identifier(Bytes);

impl Identifier {
    /// The identifier of a universal SEQUENCE.
    pub const SEQUENCE: u8 = 0x30;

    /// The identifier of a universal SET.
    pub const SET: u8 = 0x31;

    /// The identifier of a universal OCTET STRING.
    pub const OCTET_STRING: u8 = 0x04;

    /// The identifier of a universal OBJECT IDENTIFIER.
    pub const OID: u8 = 0x06;

    /// The maximum number of octets of an identifier we accept.
    pub const MAX_LEN: usize = 6;

    /// Creates an identifier from a single octet.
    ///
    /// Returns an error if the octet starts a high tag number.
    pub fn from_octet(octet: u8) -> Result<Self, DecodeError> {
        Self::from_slice(&[octet])
    }

    /// Creates an identifier from a slice of octets.
    ///
    /// Returns an error if the slice isn’t exactly one complete identifier.
    pub fn from_slice(slice: &[u8]) -> Result<Self, DecodeError> {
        let mut source = super::source::SliceSource::new(slice);
        let res = Self::read_from(&mut source)?;
        if !source.remaining().is_empty() {
            return Err(DecodeError::IdentifierTooLong)
        }
        Ok(res)
    }

    /// Reads an identifier from the beginning of a source.
    pub fn read_from(
        source: &mut dyn ByteSource
    ) -> Result<Self, DecodeError> {
        let first = source.read_byte()?.ok_or(DecodeError::EarlyEof)?;
        if first & 0x1f != 0x1f {
            return Ok(Identifier(Bytes::copy_from_slice(&[first])))
        }
        let mut res = vec![first];
        loop {
            let octet = source.read_byte()?.ok_or(DecodeError::EarlyEof)?;
            if res.len() == Self::MAX_LEN {
                return Err(DecodeError::IdentifierTooLong)
            }
            res.push(octet);
            if octet & 0x80 == 0 {
                break
            }
        }
        Ok(Identifier(res.into()))
    }

    /// Returns whether the identifier is for a primitive value.
    pub fn is_primitive(&self) -> bool {
        !self.is_constructed()
    }

    /// Returns whether the identifier is for a constructed value.
    pub fn is_constructed(&self) -> bool {
        self.0[0] & 0x20 != 0
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Returns the number of octets of the identifier.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Identifier(")?;
        for octet in self.0.iter() {
            write!(f, "{:02x}", octet)?;
        }
        f.write_str(")")
    }
}


//------------ Value ---------------------------------------------------------

/// A decoded value.
///
/// A value is either primitive, in which case it carries its content
/// octets, or constructed, in which case it carries a sequence of nested
/// values. Values are immutable once created.
///
/// Encoding a value always uses the shortest form for all length octets.
/// This makes a decode-encode cycle the conversion from BER into DER as far
/// as lengths are concerned.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Primitive(Primitive),
    Constructed(Constructed),
}

impl Value {
    /// Creates a new primitive value.
    pub fn primitive(
        identifier: Identifier, content: impl Into<Bytes>
    ) -> Result<Self, DecodeError> {
        Primitive::new(identifier, content).map(Value::Primitive)
    }

    /// Creates a new constructed value.
    pub fn constructed(
        identifier: Identifier, members: Vec<Value>
    ) -> Result<Self, DecodeError> {
        Constructed::new(identifier, members).map(Value::Constructed)
    }

    /// Decodes a single value from the beginning of a slice.
    ///
    /// Uses a decoder with the default settings. Any data after the
    /// value is ignored.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        super::Decoder::new().decode_slice(data)
    }

    pub fn identifier(&self) -> &Identifier {
        match *self {
            Value::Primitive(ref inner) => inner.identifier(),
            Value::Constructed(ref inner) => inner.identifier(),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(*self, Value::Primitive(_))
    }

    /// Returns the content if this is a primitive value.
    pub fn content(&self) -> Option<&Bytes> {
        match *self {
            Value::Primitive(ref inner) => Some(inner.content()),
            Value::Constructed(_) => None,
        }
    }

    /// Returns the members of a constructed value.
    ///
    /// A primitive value has no members.
    pub fn members(&self) -> &[Value] {
        match *self {
            Value::Primitive(_) => &[],
            Value::Constructed(ref inner) => inner.members(),
        }
    }

    /// Returns the length of the content octets.
    pub fn content_len(&self) -> usize {
        match *self {
            Value::Primitive(ref inner) => inner.content().len(),
            Value::Constructed(ref inner) => inner.content_len(),
        }
    }

    /// Returns the number of octets `write_encoded` will produce.
    pub fn encoded_len(&self) -> usize {
        let len = self.content_len();
        self.identifier().len() + length::encoded_len(len) + len
    }

    /// Writes the encoded value to `target`.
    pub fn write_encoded<W: io::Write>(
        &self, target: &mut W
    ) -> Result<(), io::Error> {
        target.write_all(self.identifier().as_slice())?;
        length::write_length(self.content_len(), target)?;
        match *self {
            Value::Primitive(ref inner) => {
                target.write_all(inner.content().as_ref())
            }
            Value::Constructed(ref inner) => {
                for member in inner.members() {
                    member.write_encoded(target)?;
                }
                Ok(())
            }
        }
    }

    /// Returns the encoded value in a newly allocated vec.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut res = Vec::with_capacity(self.encoded_len());
        // Writing to a vec never fails.
        let _ = self.write_encoded(&mut res);
        res
    }
}

impl From<Primitive> for Value {
    fn from(value: Primitive) -> Self {
        Value::Primitive(value)
    }
}

impl From<Constructed> for Value {
    fn from(value: Constructed) -> Self {
        Value::Constructed(value)
    }
}


//------------ Primitive -----------------------------------------------------

/// A primitive value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Primitive {
    identifier: Identifier,
    content: Bytes,
}

impl Primitive {
    /// Creates a primitive value.
    ///
    /// Returns an error if the identifier is flagged as constructed.
    pub fn new(
        identifier: Identifier, content: impl Into<Bytes>
    ) -> Result<Self, DecodeError> {
        if identifier.is_constructed() {
            return Err(DecodeError::UnexpectedConstructed)
        }
        Ok(Primitive { identifier, content: content.into() })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }
}


//------------ Constructed ---------------------------------------------------

/// A constructed value.
///
/// The length stored with the value is the length of the canonical
/// encoding of its members. It may differ from the length found in the
/// original data if that used non-minimal lengths anywhere below.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Constructed {
    identifier: Identifier,
    length: usize,
    members: Vec<Value>,
}

impl Constructed {
    /// Creates a constructed value.
    ///
    /// Returns an error if the identifier is flagged as primitive.
    pub fn new(
        identifier: Identifier, members: Vec<Value>
    ) -> Result<Self, DecodeError> {
        if identifier.is_primitive() {
            return Err(DecodeError::UnexpectedPrimitive)
        }
        let length = members.iter().map(Value::encoded_len).sum();
        Ok(Constructed { identifier, length, members })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn members(&self) -> &[Value] {
        &self.members
    }

    pub fn into_members(self) -> Vec<Value> {
        self.members
    }

    /// Returns the length of the encoded members.
    pub fn content_len(&self) -> usize {
        self.length
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    fn id(octet: u8) -> Identifier {
        Identifier::from_octet(octet).unwrap()
    }

    fn octets(len: usize) -> Value {
        Value::primitive(id(Identifier::OCTET_STRING), vec![0xAA; len])
            .unwrap()
    }

    #[test]
    fn length_canonicalization() {
        let encoded = octets(127).to_vec();
        assert_eq!(&encoded[..2], b"\x04\x7f");
        assert_eq!(encoded.len(), 129);

        let encoded = octets(128).to_vec();
        assert_eq!(&encoded[..3], b"\x04\x81\x80");
        assert_eq!(encoded.len(), 131);

        let encoded = octets(256).to_vec();
        assert_eq!(&encoded[..4], b"\x04\x82\x01\x00");
        assert_eq!(encoded.len(), 260);
    }

    #[test]
    fn encoded_len_matches_encoding() {
        let value = Value::constructed(
            id(Identifier::SEQUENCE),
            vec![
                octets(0),
                octets(200),
                Value::constructed(
                    id(Identifier::SET), vec![octets(3), octets(127)]
                ).unwrap(),
                Value::primitive(
                    Identifier::from_slice(b"\x9f\x81\x02").unwrap(),
                    &b"\x01"[..]
                ).unwrap(),
            ]
        ).unwrap();
        let encoded = value.to_vec();
        assert_eq!(value.encoded_len(), encoded.len());
        assert_eq!(value.content_len(), 2 + 203 + 137 + 5);
        assert_eq!(&encoded[..5], b"\x30\x82\x01\x5b\x04");
    }

    #[test]
    fn flag_mismatch() {
        assert!(matches!(
            Value::primitive(id(Identifier::SEQUENCE), Bytes::new()),
            Err(DecodeError::UnexpectedConstructed)
        ));
        assert!(matches!(
            Value::constructed(id(Identifier::OCTET_STRING), Vec::new()),
            Err(DecodeError::UnexpectedPrimitive)
        ));
    }

    #[test]
    fn identifiers() {
        assert!(id(0x30).is_constructed());
        assert!(id(0xa0).is_constructed());
        assert!(id(0x80).is_primitive());
        assert_eq!(
            Identifier::from_slice(b"\x5f\x81\x02").unwrap().len(), 3
        );
        assert!(Identifier::from_octet(0x1f).is_err());
        assert!(Identifier::from_slice(b"\x02\x01").is_err());
        assert!(matches!(
            Identifier::from_slice(b"\x1f\x80\x80\x80\x80\x80\x01"),
            Err(DecodeError::IdentifierTooLong)
        ));
    }
}
