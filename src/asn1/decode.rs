//! Decoding values.

use std::cmp;
use bytes::Bytes;
use super::error::DecodeError;
use super::length::read_length;
use super::source::{ByteSource, Limited, SliceSource};
use super::value::{Constructed, Identifier, Primitive, Value};


/// The size of the chunks in which content is read.
///
/// Content is read in chunks so that a bogus length doesn’t make us
/// allocate a lot of memory up front.
const CHUNK_SIZE: usize = 4096;


//------------ Decoder -------------------------------------------------------

/// A decoder for BER encoded values.
///
/// Only definite length encodings are supported. Since constructed values
/// are decoded recursively, the decoder limits how deep they can be
/// nested.
#[derive(Clone, Copy, Debug)]
pub struct Decoder {
    max_depth: usize,
}

impl Decoder {
    /// The nesting limit of a decoder created via `new`.
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn new() -> Self {
        Self::with_max_depth(Self::DEFAULT_MAX_DEPTH)
    }

    /// Creates a decoder that accepts `max_depth` nested constructed values.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Decoder { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Decodes a value from the beginning of a source.
    ///
    /// The source is left positioned right after the value.
    pub fn decode<S: ByteSource>(
        &self, source: &mut S
    ) -> Result<Value, DecodeError> {
        self.take_value(source, 0)
    }

    /// Decodes a value from the beginning of a slice.
    ///
    /// Data following the value is ignored.
    pub fn decode_slice(&self, data: &[u8]) -> Result<Value, DecodeError> {
        self.decode(&mut SliceSource::new(data))
    }

    /// Decodes a primitive value from the beginning of a source.
    pub fn decode_primitive<S: ByteSource>(
        &self, source: &mut S
    ) -> Result<Primitive, DecodeError> {
        Self::take_primitive(source)
    }

    /// Decodes a constructed value from the beginning of a source.
    pub fn decode_constructed<S: ByteSource>(
        &self, source: &mut S
    ) -> Result<Constructed, DecodeError> {
        self.take_constructed(source, 0)
    }

    fn take_value(
        &self, source: &mut dyn ByteSource, depth: usize
    ) -> Result<Value, DecodeError> {
        let first = source.read_byte()?.ok_or(DecodeError::EarlyEof)?;
        source.unread_byte()?;
        if first & 0x20 == 0 {
            Self::take_primitive(source).map(Value::Primitive)
        }
        else {
            self.take_constructed(source, depth).map(Value::Constructed)
        }
    }

    fn take_primitive(
        source: &mut dyn ByteSource
    ) -> Result<Primitive, DecodeError> {
        let identifier = Identifier::read_from(source)?;
        if identifier.is_constructed() {
            return Err(DecodeError::UnexpectedConstructed)
        }
        let len = read_length(source)?;
        let content = Self::take_content(source, len)?;
        Primitive::new(identifier, content)
    }

    fn take_constructed(
        &self, source: &mut dyn ByteSource, depth: usize
    ) -> Result<Constructed, DecodeError> {
        let identifier = Identifier::read_from(source)?;
        if identifier.is_primitive() {
            return Err(DecodeError::UnexpectedPrimitive)
        }
        if depth >= self.max_depth {
            return Err(DecodeError::TooDeep(self.max_depth))
        }
        let len = read_length(source)?;
        let mut content = Limited::new(source, len);
        let mut members = Vec::new();
        loop {
            if content.read_byte()?.is_none() {
                if content.remaining() > 0 {
                    return Err(DecodeError::EarlyEof)
                }
                break
            }
            content.unread_byte()?;
            match self.take_value(&mut content, depth + 1) {
                Ok(value) => members.push(value),
                // The member ran into our limit rather than the end of
                // the data.
                Err(DecodeError::EarlyEof) if content.remaining() == 0 => {
                    return Err(DecodeError::LengthMismatch)
                }
                Err(err) => return Err(err)
            }
        }
        Constructed::new(identifier, members)
    }

    fn take_content(
        source: &mut dyn ByteSource, len: usize
    ) -> Result<Bytes, DecodeError> {
        let mut res = Vec::with_capacity(cmp::min(len, CHUNK_SIZE));
        let mut chunk = [0u8; CHUNK_SIZE];
        while res.len() < len {
            let want = cmp::min(len - res.len(), CHUNK_SIZE);
            let read = source.read_bytes(&mut chunk[..want])?;
            if read == 0 {
                return Err(DecodeError::EarlyEof)
            }
            res.extend_from_slice(&chunk[..read]);
        }
        Ok(res.into())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}


//------------ convert_to_der ------------------------------------------------

/// Converts a BER encoded value into DER.
///
/// The value is decoded and then re-encoded with all lengths in their
/// shortest form. The order of members of SET values is kept as is and
/// indefinite length values are rejected. Anything following the first
/// value in `ber` is ignored.
pub fn convert_to_der(ber: &[u8]) -> Result<Vec<u8>, DecodeError> {
    Decoder::new().decode_slice(ber).map(|value| value.to_vec())
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::io;
    use super::*;
    use crate::asn1::{LengthError, ReadSource};

    fn id(octet: u8) -> Identifier {
        Identifier::from_octet(octet).unwrap()
    }

    fn int(content: &'static [u8]) -> Value {
        Value::primitive(id(0x02), content).unwrap()
    }

    #[test]
    fn round_trip() {
        let value = Value::constructed(
            id(Identifier::SEQUENCE),
            vec![
                int(b"\x01"),
                Value::constructed(
                    id(0xa0),
                    vec![
                        Value::primitive(
                            id(Identifier::OCTET_STRING), vec![7u8; 300]
                        ).unwrap(),
                        Value::constructed(id(Identifier::SET), Vec::new())
                            .unwrap(),
                    ]
                ).unwrap(),
                Value::primitive(
                    Identifier::from_slice(b"\x5f\x81\x02").unwrap(),
                    &b"\xaa"[..]
                ).unwrap(),
                Value::primitive(id(0x05), Bytes::new()).unwrap(),
            ]
        ).unwrap();
        let encoded = value.to_vec();
        assert_eq!(value.encoded_len(), encoded.len());
        assert_eq!(Value::decode(&encoded).unwrap(), value);
    }

    /// Returns members whose encodings add up to exactly `len` octets.
    fn members_of_len(len: usize) -> Vec<Value> {
        let mut res = Vec::new();
        let mut left = len;
        if left % 2 == 1 {
            res.push(int(b"\x00"));
            left -= 3;
        }
        res.extend((0..left / 2).map(|_| {
            Value::primitive(id(0x05), Bytes::new()).unwrap()
        }));
        res
    }

    /// Wraps `value` into `depth` constructed values.
    fn nest(value: Value, depth: usize) -> Value {
        (0..depth).fold(value, |value, level| {
            let tag = if level % 2 == 0 { Identifier::SEQUENCE } else { 0xa1 };
            Value::constructed(id(tag), vec![value]).unwrap()
        })
    }

    fn check_round_trip(value: &Value) {
        let encoded = value.to_vec();
        assert_eq!(value.encoded_len(), encoded.len());
        assert_eq!(Value::decode(&encoded).unwrap(), *value);
        assert_eq!(convert_to_der(&encoded).unwrap(), encoded);

        // The same value with a four octet length on the outside.
        let content = &encoded[encoded.len() - value.content_len()..];
        let mut ber = vec![encoded[0], 0x84];
        ber.extend_from_slice(&(content.len() as u32).to_be_bytes());
        ber.extend_from_slice(content);
        assert_eq!(convert_to_der(&ber).unwrap(), encoded);
        assert!(ber.len() >= encoded.len());
    }

    #[test]
    fn round_trip_lengths_and_depths() {
        let lengths = [0, 127, 128, 255, 256, 65535, 65536];
        let depths = [0, 1, 2, Decoder::DEFAULT_MAX_DEPTH - 1];
        for len in lengths {
            let prim = Value::primitive(
                id(Identifier::OCTET_STRING),
                (0..len).map(|i| i as u8).collect::<Vec<_>>()
            ).unwrap();
            assert_eq!(prim.content_len(), len);
            let cons = Value::constructed(
                id(Identifier::SET), members_of_len(len)
            ).unwrap();
            assert_eq!(cons.content_len(), len);

            for depth in depths {
                check_round_trip(&nest(prim.clone(), depth));
                check_round_trip(&nest(cons.clone(), depth));
            }
        }

        // One more level is too deep.
        let cons = Value::constructed(
            id(Identifier::SET), members_of_len(128)
        ).unwrap();
        let too_deep = nest(cons, Decoder::DEFAULT_MAX_DEPTH).to_vec();
        assert!(matches!(
            Value::decode(&too_deep),
            Err(DecodeError::TooDeep(Decoder::DEFAULT_MAX_DEPTH))
        ));
        assert!(convert_to_der(&too_deep).is_err());
    }

    #[test]
    fn canonical_input_is_unchanged() {
        let data = include_bytes!("../../test-data/response.tsr");
        assert_eq!(convert_to_der(data).unwrap(), data.as_ref());
        let data = include_bytes!("../../test-data/root.der");
        assert_eq!(convert_to_der(data).unwrap(), data.as_ref());
    }

    #[test]
    fn non_minimal_lengths() {
        let ber = b"\x30\x84\x00\x00\x00\x05\x04\x82\x00\x01\xaa";
        let der = convert_to_der(ber).unwrap();
        assert_eq!(der, b"\x30\x03\x04\x01\xaa");
        assert_eq!(convert_to_der(&der).unwrap(), der);

        let value = Value::decode(ber).unwrap();
        assert_eq!(value.content_len(), 3);
        assert_eq!(value.encoded_len(), 5);
    }

    #[test]
    fn idempotence() {
        let inputs: &[&[u8]] = &[
            b"\x02\x01\x05",
            b"\x30\x81\x03\x02\x01\x05",
            b"\x31\x06\x02\x01\x02\x02\x01\x01",
            b"\xa0\x82\x00\x07\x30\x81\x04\x04\x82\x00\x00",
        ];
        for input in inputs {
            let once = convert_to_der(input).unwrap();
            assert_eq!(convert_to_der(&once).unwrap(), once);
            assert!(once.len() <= input.len());
        }
    }

    #[test]
    fn set_order_is_kept() {
        let data = b"\x31\x06\x02\x01\x02\x02\x01\x01";
        assert_eq!(convert_to_der(data).unwrap(), data.as_ref());
    }

    #[test]
    fn bounded_exhaustion() {
        let data = b"\x30\x06\x02\x01\x01\x02\x01\x02\xff\xff";
        let mut source = SliceSource::new(data);
        let value = Decoder::new().decode(&mut source).unwrap();
        assert_eq!(value.members().len(), 2);
        assert_eq!(value.members()[0], int(b"\x01"));
        assert_eq!(value.members()[1], int(b"\x02"));
        assert_eq!(source.position(), 8);
        assert_eq!(source.remaining(), b"\xff\xff");
    }

    #[test]
    fn decode_from_reader() {
        let data = b"\x30\x06\x02\x01\x01\x02\x01\x02\xff";
        let mut source = ReadSource::new(io::Cursor::new(data.as_ref()));
        let value = Decoder::new().decode(&mut source).unwrap();
        assert_eq!(value.members().len(), 2);
        assert_eq!(source.read_byte().unwrap(), Some(0xff));
    }

    #[test]
    fn reject_indefinite() {
        assert!(matches!(
            Value::decode(b"\x30\x80\x02\x01\x01\x00\x00"),
            Err(DecodeError::UnsupportedLength(LengthError::Indefinite))
        ));
    }

    #[test]
    fn reject_truncated() {
        assert!(matches!(Value::decode(b""), Err(DecodeError::EarlyEof)));
        assert!(matches!(Value::decode(b"\x30"), Err(DecodeError::EarlyEof)));
        assert!(matches!(Value::decode(b"\x02"), Err(DecodeError::EarlyEof)));
        assert!(matches!(
            Value::decode(b"\x04\x05\xaa\xbb"), Err(DecodeError::EarlyEof)
        ));
        assert!(matches!(
            Value::decode(b"\x30\x06\x02\x01\x01"), Err(DecodeError::EarlyEof)
        ));
        assert!(matches!(
            Value::decode(b"\x1f\x81"), Err(DecodeError::EarlyEof)
        ));
    }

    #[test]
    fn reject_member_overrun() {
        assert!(matches!(
            Value::decode(b"\x30\x03\x04\x05\xaa\xbb\xcc\xdd\xee"),
            Err(DecodeError::LengthMismatch)
        ));
        assert!(matches!(
            Value::decode(b"\x30\x01\x02\x01\x01"),
            Err(DecodeError::LengthMismatch)
        ));
    }

    #[test]
    fn reject_flag_mismatch() {
        let decoder = Decoder::new();
        assert!(matches!(
            decoder.decode_primitive(&mut SliceSource::new(b"\x30\x00")),
            Err(DecodeError::UnexpectedConstructed)
        ));
        assert!(matches!(
            decoder.decode_constructed(&mut SliceSource::new(b"\x04\x00")),
            Err(DecodeError::UnexpectedPrimitive)
        ));
        assert!(
            decoder.decode_constructed(&mut SliceSource::new(b"\x30\x00"))
                .unwrap().members().is_empty()
        );
    }

    #[test]
    fn depth_limit() {
        let mut value = int(b"\x01");
        for _ in 0..5 {
            value = Value::constructed(
                id(Identifier::SEQUENCE), vec![value]
            ).unwrap();
        }
        let encoded = value.to_vec();
        assert!(Decoder::with_max_depth(5).decode_slice(&encoded).is_ok());
        assert!(matches!(
            Decoder::with_max_depth(4).decode_slice(&encoded),
            Err(DecodeError::TooDeep(4))
        ));

        let mut deep = Vec::new();
        for _ in 0..100 {
            deep.extend_from_slice(b"\x30\x80");
        }
        assert!(Value::decode(&deep).is_err());
    }

    #[test]
    fn depth_limit_with_definite_lengths() {
        // 100 nested empty-ish sequences with correct lengths.
        let mut data = b"\x05\x00".to_vec();
        for _ in 0..100 {
            let mut outer = vec![0x30];
            crate::asn1::length::write_length(data.len(), &mut outer)
                .unwrap();
            outer.extend_from_slice(&data);
            data = outer;
        }
        assert!(matches!(
            Value::decode(&data),
            Err(DecodeError::TooDeep(Decoder::DEFAULT_MAX_DEPTH))
        ));
    }
}
