//! Types common to all things X.509.

use std::{error, fmt, io, ops, str};
use std::str::FromStr;
use bcder::decode;
use bcder::{BitString, Captured, Mode, OctetString, Oid, Tag};
use bcder::decode::{ContentError, DecodeError, IntoSource, Source};
use bcder::encode::PrimitiveContent;
use bytes::Bytes;
use chrono::{DateTime, LocalResult, TimeZone, Timelike, Utc};
use crate::oid;
use crate::crypto::{PublicKey, Signature, SignatureVerificationError};
use crate::util::hex;


//------------ Functions -----------------------------------------------------

/// Takes an algorithm identifier and returns its object identifier.
///
/// ```txt
/// AlgorithmIdentifier ::= SEQUENCE {
///      algorithm          OBJECT IDENTIFIER,
///      parameters         ANY DEFINED BY algorithm OPTIONAL }
/// ```
///
/// The parameters are skipped. None of the algorithms we support have
/// parameters other than an optional `NULL`.
pub fn take_algorithm_oid<S: decode::Source>(
    cons: &mut decode::Constructed<S>
) -> Result<Oid<Bytes>, DecodeError<S::Error>> {
    cons.take_sequence(|cons| {
        let oid = Oid::take_from(cons)?;
        cons.skip_all()?;
        Ok(oid)
    })
}


//------------ Name ----------------------------------------------------------

/// A distinguished name.
///
/// The name is kept in its encoded form. Two names are considered equal if
/// their encodings are identical.
#[derive(Clone, Debug)]
pub struct Name(Captured);

impl Name {
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.capture(|cons| {
            cons.take_sequence(|cons| { // RDNSequence
                while let Some(()) = cons.take_opt_set(|cons| {
                    let mut empty_set = true;
                    while let Some(()) = cons.take_opt_sequence(|cons| {
                        empty_set = false;
                        Oid::skip_in(cons)?;
                        if cons.skip_one()?.is_none() {
                            return Err(cons.content_err(
                                "invalid name"
                            ))
                        }
                        Ok(())
                    })? { }
                    if empty_set {
                        return Err(cons.content_err(
                            "empty relative distinguished name"
                        ));
                    }
                    Ok(())
                })? { }
                Ok(())
            })
        }).map(Name)
    }

    /// Returns the encoded name including its sequence tag.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Returns the first common name of the name if there is one.
    ///
    /// Only string types that are compatible with UTF-8 are considered.
    pub fn common_name(&self) -> Option<String> {
        fn take_cn<S: decode::Source>(
            cons: &mut decode::Constructed<S>
        ) -> Result<Option<String>, DecodeError<S::Error>> {
            let mut res = None;
            cons.take_sequence(|cons| {
                while let Some(()) = cons.take_opt_set(|cons| {
                    while let Some(()) = cons.take_opt_sequence(|cons| {
                        let id = Oid::take_from(cons)?;
                        if id == oid::AT_COMMON_NAME && res.is_none() {
                            res = Name::take_string(cons)?;
                        }
                        else {
                            cons.skip_all()?;
                        }
                        Ok(())
                    })? { }
                    Ok(())
                })? { }
                Ok(())
            })?;
            Ok(res)
        }

        self.0.clone().decode(take_cn).ok().flatten()
    }

    fn take_string<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<String>, DecodeError<S::Error>> {
        cons.take_value(|tag, content| {
            let value = OctetString::from_content(content)?;
            if tag == Tag::PRINTABLE_STRING || tag == Tag::UTF8_STRING
                || tag == Tag::IA5_STRING
            {
                Ok(String::from_utf8(value.to_bytes().to_vec()).ok())
            }
            else {
                Ok(None)
            }
        })
    }
}


//--- PartialEq and Eq

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for Name {}


//--- Display

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.common_name() {
            Some(cn) => write!(f, "CN={}", cn),
            None => write!(f, "<{}>", hex::Hex(self.as_slice())),
        }
    }
}


//------------ Serial --------------------------------------------------------

/// A certificate serial number.
///
/// Serial numbers are non-negative integers of up to 20 octets according
/// to RFC 5280. Since there are plenty of certificates out there that
/// violate this, we keep the content octets of the INTEGER as is except
/// that redundant leading zero octets are removed.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Serial(Bytes);

impl Serial {
    /// Creates a serial number from the content octets of an INTEGER.
    pub fn from_bytes(bytes: Bytes) -> Result<Self, ContentError> {
        if bytes.is_empty() {
            return Err(ContentError::from_static("empty serial number"))
        }
        Ok(Self::normalize(bytes))
    }

    /// Removes leading zero octets that don’t serve as sign octet.
    fn normalize(bytes: Bytes) -> Self {
        let mut start = 0;
        while start + 1 < bytes.len()
            && bytes[start] == 0 && bytes[start + 1] & 0x80 == 0
        {
            start += 1;
        }
        Serial(bytes.slice(start..))
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive_if(Tag::INTEGER, |prim| {
            let bytes = prim.take_all()?;
            Self::from_bytes(bytes).map_err(|err| prim.content_err(err))
        })
    }

    /// Returns the content octets of the serial number.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }
}


//--- From

impl From<u64> for Serial {
    fn from(value: u64) -> Self {
        let mut res = Vec::with_capacity(9);
        res.push(0);
        res.extend_from_slice(&value.to_be_bytes());
        Self::normalize(res.into())
    }
}


//--- PrimitiveContent

impl PrimitiveContent for Serial {
    const TAG: Tag = Tag::INTEGER;

    fn encoded_len(&self, _mode: Mode) -> usize {
        self.0.len()
    }

    fn write_encoded<W: io::Write>(
        &self,
        _mode: Mode,
        target: &mut W
    ) -> Result<(), io::Error> {
        target.write_all(self.0.as_ref())
    }
}


//--- Display and Debug

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::Hex(self.as_slice()))
    }
}

impl fmt::Debug for Serial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Serial({})", self)
    }
}


//------------ SignedData ----------------------------------------------------

/// The outer structure of a signed X.509 object.
///
/// ```txt
/// Certificate  ::=  SEQUENCE  {
///      tbsCertificate       TBSCertificate,
///      signatureAlgorithm   AlgorithmIdentifier,
///      signatureValue       BIT STRING  }
/// ```
#[derive(Clone, Debug)]
pub struct SignedData {
    data: Captured,
    signature: Signature,
}

impl SignedData {
    pub fn data(&self) -> &Captured {
        &self.data
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn decode<S: IntoSource>(
        source: S
    ) -> Result<Self, DecodeError<<S::Source as Source>::Error>> {
        Mode::Der.decode(source, Self::take_from)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(Self::from_constructed)
    }

    pub fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        Ok(SignedData {
            data: cons.capture_one()?,
            signature: Signature::new(
                take_algorithm_oid(cons)?,
                BitString::take_from(cons)?.octet_bytes()
            )
        })
    }

    pub fn verify_signature(
        &self,
        public_key: &PublicKey
    ) -> Result<(), SignatureVerificationError> {
        public_key.verify_signature(self.data.as_ref(), &self.signature)
    }
}


//------------ Time ----------------------------------------------------------

/// A point in time as used in X.509 and time-stamp tokens.
///
/// Time values are encoded either as UTCTime or as GeneralizedTime. For the
/// latter, fractional seconds are accepted as RFC 3161 allows them for the
/// time of a time-stamp token.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Time(DateTime<Utc>);

impl Time {
    pub fn new(dt: DateTime<Utc>) -> Self {
        Time(dt)
    }

    /// Returns the current time.
    ///
    /// Verification takes its time as an argument. This is only the
    /// default used when none is given.
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn utc(
        year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec).single()
            .map(Time)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive(|tag, prim| {
            match tag {
                Tag::UTC_TIME => Self::from_utc_time(prim),
                Tag::GENERALIZED_TIME => Self::from_generalized_time(prim),
                _ => {
                    Err(prim.content_err(
                        "malformed time value"
                    ))
                }
            }
        })
    }

    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        let res = cons.take_opt_primitive_if(
            Tag::UTC_TIME, Self::from_utc_time
        )?;
        if let Some(res) = res {
            return Ok(Some(res))
        }
        cons.take_opt_primitive_if(
            Tag::GENERALIZED_TIME, Self::from_generalized_time
        )
    }

    /// Takes a GeneralizedTime value.
    pub fn take_generalized_time<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive_if(
            Tag::GENERALIZED_TIME, Self::from_generalized_time
        )
    }

    /// Parses the content of a UTCTime value.
    ///
    /// RFC 5280 requires the format YYMMDDHHMMSSZ.
    fn from_utc_time<S: decode::Source>(
        prim: &mut decode::Primitive<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let year = read_two_char(prim)? as i32;
        let year = if year >= 50 { year + 1900 }
                   else { year + 2000 };
        let res = (
            year,
            read_two_char(prim)?,
            read_two_char(prim)?,
            read_two_char(prim)?,
            read_two_char(prim)?,
            read_two_char(prim)?,
        );
        if prim.take_u8()? != b'Z' {
            return Err(prim.content_err(
                "malformed time value"
            ))
        }
        Self::from_parts(res, 0).map_err(|err| prim.content_err(err))
    }

    /// Parses the content of a GeneralizedTime value.
    ///
    /// The format is YYYYMMDDHHMMSS[.s+]Z.
    fn from_generalized_time<S: decode::Source>(
        prim: &mut decode::Primitive<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let res = (
            read_four_char(prim)? as i32,
            read_two_char(prim)?,
            read_two_char(prim)?,
            read_two_char(prim)?,
            read_two_char(prim)?,
            read_two_char(prim)?,
        );
        let mut nanos = 0;
        let mut ch = prim.take_u8()?;
        if ch == b'.' {
            let mut digits = 0;
            let mut scale = 100_000_000;
            loop {
                ch = prim.take_u8()?;
                if !ch.is_ascii_digit() {
                    break
                }
                nanos += u32::from(ch - b'0') * scale;
                scale /= 10;
                digits += 1;
            }
            if digits == 0 {
                return Err(prim.content_err("malformed time value"))
            }
        }
        if ch != b'Z' {
            return Err(prim.content_err(
                "malformed time value"
            ))
        }
        Self::from_parts(res, nanos).map_err(|err| prim.content_err(err))
    }

    fn from_parts(
        parts: (i32, u32, u32, u32, u32, u32),
        nanos: u32,
    ) -> Result<Self, ContentError> {
        match Utc.with_ymd_and_hms(
            parts.0, parts.1, parts.2, parts.3, parts.4, parts.5
        ) {
            LocalResult::Single(dt) => {
                dt.with_nanosecond(nanos).map(Time).ok_or_else(|| {
                    ContentError::from_static("malformed time value")
                })
            }
            _ => Err(ContentError::from_static("malformed time value"))
        }
    }

    pub fn verify_not_before(
        &self,
        now: Time
    ) -> Result<(), ValidityPeriodError> {
        if now.0 < self.0 {
            Err(ValidityPeriodError::too_new())
        }
        else {
            Ok(())
        }
    }

    pub fn verify_not_after(
        &self,
        now: Time
    ) -> Result<(), ValidityPeriodError> {
        if now.0 > self.0 {
            Err(ValidityPeriodError::too_old())
        }
        else {
            Ok(())
        }
    }
}


//--- Deref and AsRef

impl ops::Deref for Time {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<DateTime<Utc>> for Time {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.0
    }
}


//--- From

impl From<DateTime<Utc>> for Time {
    fn from(time: DateTime<Utc>) -> Self {
        Time(time)
    }
}

impl From<Time> for DateTime<Utc> {
    fn from(time: Time) -> Self {
        time.0
    }
}


//--- Display

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}


fn read_two_char<S: decode::Source>(
    source: &mut S
) -> Result<u32, DecodeError<S::Error>> {
    let mut s = [0u8; 2];
    s[0] = source.take_u8()?;
    s[1] = source.take_u8()?;
    parse_digits(source, &s)
}

fn read_four_char<S: decode::Source>(
    source: &mut S
) -> Result<u32, DecodeError<S::Error>> {
    let mut s = [0u8; 4];
    s[0] = source.take_u8()?;
    s[1] = source.take_u8()?;
    s[2] = source.take_u8()?;
    s[3] = source.take_u8()?;
    parse_digits(source, &s)
}

fn parse_digits<S: decode::Source>(
    source: &mut S, s: &[u8]
) -> Result<u32, DecodeError<S::Error>> {
    if !s.iter().all(u8::is_ascii_digit) {
        return Err(source.content_err("malformed time value"))
    }
    let s = match str::from_utf8(s) {
        Ok(s) => s,
        Err(_err) => {
            return Err(source.content_err("malformed time value"))
        }
    };
    u32::from_str(s).map_err(|_err| {
        source.content_err("malformed time value")
    })
}


//------------ Validity ------------------------------------------------------

#[derive(Clone, Debug, Copy, Eq, Hash, PartialEq)]
pub struct Validity {
    not_before: Time,
    not_after: Time,
}

impl Validity {
    pub fn new(not_before: Time, not_after: Time) -> Self {
        Validity { not_before, not_after }
    }

    pub fn not_before(self) -> Time {
        self.not_before
    }

    pub fn not_after(self) -> Time {
        self.not_after
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            Ok(Validity::new(
                Time::take_from(cons)?,
                Time::take_from(cons)?,
            ))
        })
    }

    pub fn verify(self) -> Result<(), ValidityPeriodError> {
        self.verify_at(Time::now())
    }

    pub fn verify_at(self, now: Time) -> Result<(), ValidityPeriodError> {
        self.not_before.verify_not_before(now)?;
        self.not_after.verify_not_after(now)?;
        Ok(())
    }
}


//------------ ValidityPeriodError -------------------------------------------

/// An object is outside of its period of validity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ValidityPeriodError {
    /// Is the object too new?
    ///
    /// It is too old otherwise.
    too_new: bool,
}

impl ValidityPeriodError {
    fn too_new() -> Self {
        ValidityPeriodError { too_new: true }
    }

    fn too_old() -> Self {
        ValidityPeriodError { too_new: false }
    }

    /// Returns whether the object is not yet valid.
    pub fn is_too_new(self) -> bool {
        self.too_new
    }
}

impl fmt::Display for ValidityPeriodError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(
            if self.too_new {
                "object is not yet valid"
            }
            else {
                "object has expired"
            }
        )
    }
}

impl error::Error for ValidityPeriodError { }


//============ Tests =========================================================
