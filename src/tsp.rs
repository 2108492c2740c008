//! The Time-Stamp Protocol.
//!
//! This module implements the messages of [RFC 3161]: the time-stamp
//! request sent to a time-stamping authority (TSA), the response it sends
//! back, and the `TSTInfo` structure signed by the TSA.
//!
//! A request is built from the [`MessageImprint`] of the data to be
//! time-stamped. The response is decoded into a [`TimeStampResp`] which
//! can then be checked against the request and a set of trust roots via
//! [`TimeStampResp::verify`]. How the request gets to the TSA is left to
//! implementations of the [`Timestamper`] trait.
//!
//! [RFC 3161]: https://tools.ietf.org/html/rfc3161

use std::{error, fmt};
use std::convert::Infallible;
use std::time::Duration;
use bcder::{decode, encode};
use bcder::{BitString, Captured, Mode, OctetString, Oid, Tag};
use bcder::decode::{DecodeError, IntoSource};
use bcder::encode::{PrimitiveContent, Values};
use bytes::Bytes;
use log::debug;
use ring::rand::{SecureRandom, SystemRandom};
use crate::oid;
use crate::cert::TrustRoots;
use crate::cms::{SignedData, VerifyOptions};
use crate::crypto::DigestAlgorithm;
use crate::error::VerifyError;
use crate::x509::{Name, Serial, Time};


//------------ MessageImprint ------------------------------------------------

/// The hash of the data to be time-stamped.
///
/// ```txt
/// MessageImprint ::= SEQUENCE  {
///      hashAlgorithm                AlgorithmIdentifier,
///      hashedMessage                OCTET STRING  }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageImprint {
    hash_algorithm: DigestAlgorithm,
    hashed_message: Bytes,
}

impl MessageImprint {
    /// Creates an imprint from an algorithm and an already computed hash.
    pub fn new(hash_algorithm: DigestAlgorithm, hashed_message: Bytes) -> Self {
        MessageImprint { hash_algorithm, hashed_message }
    }

    /// Creates the imprint of the given data.
    pub fn from_data(hash_algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        Self::new(
            hash_algorithm,
            Bytes::copy_from_slice(hash_algorithm.digest(data).as_ref())
        )
    }

    pub fn hash_algorithm(&self) -> DigestAlgorithm {
        self.hash_algorithm
    }

    pub fn hashed_message(&self) -> &Bytes {
        &self.hashed_message
    }

    /// Returns whether the imprint is that of the given data.
    pub fn verify(&self, data: &[u8]) -> bool {
        self.hash_algorithm.digest(data).as_ref()
            == self.hashed_message.as_ref()
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let hash_algorithm = DigestAlgorithm::take_from(cons)?;
            let hashed_message = OctetString::take_from(cons)?.into_bytes();
            if hashed_message.len() != hash_algorithm.output_len() {
                return Err(cons.content_err(
                    "hashed message length doesn't match hash algorithm"
                ))
            }
            Ok(MessageImprint { hash_algorithm, hashed_message })
        })
    }

    pub fn encode_ref(&self) -> impl encode::Values + '_ {
        encode::sequence((
            self.hash_algorithm.encode(),
            OctetString::encode_slice(self.hashed_message.as_ref()),
        ))
    }
}


//------------ Nonce ---------------------------------------------------------

/// A nonce binding a response to its request.
///
/// Nonces are INTEGERs of arbitrary size. We keep their content octets
/// the same way we keep certificate serial numbers.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Nonce(Serial);

impl Nonce {
    /// Creates a new random nonce of 64 bits.
    pub fn random() -> Result<Self, ring::error::Unspecified> {
        let mut buf = [0u8; 8];
        SystemRandom::new().fill(&mut buf)?;
        Ok(Self::from(u64::from_be_bytes(buf)))
    }

    /// Returns the content octets of the nonce.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_primitive_if(Tag::INTEGER, |prim| {
            let bytes = prim.take_all()?;
            Serial::from_bytes(bytes).map(Nonce).map_err(|err| {
                prim.content_err(err)
            })
        })
    }

    pub fn encode_ref(&self) -> impl encode::Values + '_ {
        self.0.encode_ref()
    }
}

impl From<u64> for Nonce {
    fn from(value: u64) -> Self {
        Nonce(Serial::from(value))
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}


//------------ TimeStampReq --------------------------------------------------

/// A time-stamp request.
///
/// ```txt
/// TimeStampReq ::= SEQUENCE  {
///      version                      INTEGER  { v1(1) },
///      messageImprint               MessageImprint,
///      reqPolicy             TSAPolicyId              OPTIONAL,
///      nonce                 INTEGER                  OPTIONAL,
///      certReq               BOOLEAN                  DEFAULT FALSE,
///      extensions            [0] IMPLICIT Extensions  OPTIONAL  }
/// ```
#[derive(Clone, Debug)]
pub struct TimeStampReq {
    message_imprint: MessageImprint,
    req_policy: Option<Oid<Bytes>>,
    nonce: Option<Nonce>,
    cert_req: bool,
    extensions: Option<Captured>,
}

/// # Creation and Modification
///
impl TimeStampReq {
    /// Creates a request for the given imprint without any options.
    pub fn new(message_imprint: MessageImprint) -> Self {
        TimeStampReq {
            message_imprint,
            req_policy: None,
            nonce: None,
            cert_req: false,
            extensions: None,
        }
    }

    pub fn set_nonce(&mut self, nonce: Option<Nonce>) {
        self.nonce = nonce
    }

    /// Sets a new random nonce.
    pub fn set_random_nonce(
        &mut self
    ) -> Result<(), ring::error::Unspecified> {
        self.nonce = Some(Nonce::random()?);
        Ok(())
    }

    /// Sets whether the TSA should include its certificate.
    pub fn set_cert_req(&mut self, cert_req: bool) {
        self.cert_req = cert_req
    }

    /// Sets the policy the TSA should use for the time-stamp.
    pub fn set_policy(&mut self, policy: Option<Oid<Bytes>>) {
        self.req_policy = policy
    }
}

/// # Data Access
///
impl TimeStampReq {
    pub fn message_imprint(&self) -> &MessageImprint {
        &self.message_imprint
    }

    pub fn req_policy(&self) -> Option<&Oid<Bytes>> {
        self.req_policy.as_ref()
    }

    pub fn nonce(&self) -> Option<&Nonce> {
        self.nonce.as_ref()
    }

    pub fn cert_req(&self) -> bool {
        self.cert_req
    }

    /// Returns the content of the extensions if present.
    pub fn extensions(&self) -> Option<&Captured> {
        self.extensions.as_ref()
    }
}

/// # Decoding and Encoding
///
impl TimeStampReq {
    pub fn decode<S: IntoSource>(
        source: S
    ) -> Result<Self, DecodeError<<S::Source as decode::Source>::Error>> {
        Mode::Der.decode(source, Self::take_from)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            cons.skip_u8_if(1)?;
            Ok(TimeStampReq {
                message_imprint: MessageImprint::take_from(cons)?,
                req_policy: Oid::take_opt_from(cons)?,
                nonce: Nonce::take_opt_from(cons)?,
                cert_req: cons.take_opt_bool()?.unwrap_or(false),
                extensions: cons.take_opt_constructed_if(
                    Tag::CTX_0, |cons| cons.capture_all()
                )?,
            })
        })
    }

    pub fn encode_ref(&self) -> impl encode::Values + '_ {
        encode::sequence((
            1u8.encode(),
            self.message_imprint.encode_ref(),
            self.req_policy.as_ref().map(|policy| policy.encode_ref()),
            self.nonce.as_ref().map(Nonce::encode_ref),
            if self.cert_req { Some(true.encode()) } else { None },
            self.extensions.as_ref().map(|ext| {
                encode::sequence_as(Tag::CTX_0, ext)
            }),
        ))
    }

    /// Returns the DER encoding of the request.
    pub fn to_vec(&self) -> Vec<u8> {
        self.encode_ref().to_captured(Mode::Der).into_bytes().to_vec()
    }
}


//------------ PkiStatus -----------------------------------------------------

/// The status of a response.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PkiStatus {
    Granted,
    GrantedWithMods,
    Rejection,
    Waiting,
    RevocationWarning,
    RevocationNotification,
}

impl PkiStatus {
    /// Returns whether the response contains a time-stamp token.
    pub fn is_granted(self) -> bool {
        matches!(self, PkiStatus::Granted | PkiStatus::GrantedWithMods)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive_if(Tag::INTEGER, |prim| {
            match prim.to_u8()? {
                0 => Ok(PkiStatus::Granted),
                1 => Ok(PkiStatus::GrantedWithMods),
                2 => Ok(PkiStatus::Rejection),
                3 => Ok(PkiStatus::Waiting),
                4 => Ok(PkiStatus::RevocationWarning),
                5 => Ok(PkiStatus::RevocationNotification),
                _ => Err(prim.content_err("invalid PKI status")),
            }
        })
    }
}

impl fmt::Display for PkiStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            PkiStatus::Granted => "granted",
            PkiStatus::GrantedWithMods => "granted with modifications",
            PkiStatus::Rejection => "rejected",
            PkiStatus::Waiting => "waiting",
            PkiStatus::RevocationWarning => "revocation warning",
            PkiStatus::RevocationNotification => "revocation notification",
        })
    }
}


//------------ PkiFailureInfo ------------------------------------------------

/// The reasons for a rejected request.
///
/// This is a BIT STRING in the response. We keep the bits in a `u32`
/// with bit _n_ of the BIT STRING at `1 << n`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PkiFailureInfo(u32);

impl PkiFailureInfo {
    /// Unrecognized or unsupported algorithm identifier.
    pub const BAD_ALG: Self = PkiFailureInfo(1 << 0);

    /// Transaction not permitted or supported.
    pub const BAD_REQUEST: Self = PkiFailureInfo(1 << 2);

    /// The data submitted has the wrong format.
    pub const BAD_DATA_FORMAT: Self = PkiFailureInfo(1 << 5);

    /// The TSA’s time source is not available.
    pub const TIME_NOT_AVAILABLE: Self = PkiFailureInfo(1 << 14);

    /// The requested TSA policy is not supported.
    pub const UNACCEPTED_POLICY: Self = PkiFailureInfo(1 << 15);

    /// The requested extension is not supported.
    pub const UNACCEPTED_EXTENSION: Self = PkiFailureInfo(1 << 16);

    /// The additional information requested is not available.
    pub const ADD_INFO_NOT_AVAILABLE: Self = PkiFailureInfo(1 << 17);

    /// The request cannot be handled due to system failure.
    pub const SYSTEM_FAILURE: Self = PkiFailureInfo(1 << 25);

    const NAMES: [(Self, &'static str); 8] = [
        (Self::BAD_ALG, "badAlg"),
        (Self::BAD_REQUEST, "badRequest"),
        (Self::BAD_DATA_FORMAT, "badDataFormat"),
        (Self::TIME_NOT_AVAILABLE, "timeNotAvailable"),
        (Self::UNACCEPTED_POLICY, "unacceptedPolicy"),
        (Self::UNACCEPTED_EXTENSION, "unacceptedExtension"),
        (Self::ADD_INFO_NOT_AVAILABLE, "addInfoNotAvailable"),
        (Self::SYSTEM_FAILURE, "systemFailure"),
    ];

    pub fn from_bits(bits: u32) -> Self {
        PkiFailureInfo(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns whether all the flags of `other` are set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn from_bit_string(bits: &BitString) -> Self {
        let mut res = 0;
        for bit in 0..32 {
            if bits.bit(bit) {
                res |= 1 << bit;
            }
        }
        PkiFailureInfo(res)
    }
}

impl fmt::Display for PkiFailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (flag, name) in Self::NAMES.iter() {
            if self.contains(*flag) {
                if first {
                    first = false;
                }
                else {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
            }
        }
        if first {
            write!(f, "{:#x}", self.0)?;
        }
        Ok(())
    }
}


//------------ PkiStatusInfo -------------------------------------------------

/// The status information of a response.
///
/// ```txt
/// PKIStatusInfo ::= SEQUENCE {
///     status        PKIStatus,
///     statusString  PKIFreeText     OPTIONAL,
///     failInfo      PKIFailureInfo  OPTIONAL  }
///
/// PKIFreeText ::= SEQUENCE SIZE (1..MAX) OF UTF8String
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PkiStatusInfo {
    status: PkiStatus,
    status_string: Option<Vec<String>>,
    fail_info: Option<PkiFailureInfo>,
}

impl PkiStatusInfo {
    pub fn status(&self) -> PkiStatus {
        self.status
    }

    pub fn status_string(&self) -> Option<&[String]> {
        self.status_string.as_deref()
    }

    pub fn fail_info(&self) -> Option<PkiFailureInfo> {
        self.fail_info
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let status = PkiStatus::take_from(cons)?;
            let status_string = cons.take_opt_sequence(|cons| {
                let mut res = Vec::new();
                while let Some(text) = cons.take_opt_primitive_if(
                    Tag::UTF8_STRING, |prim| {
                        let bytes = prim.take_all()?;
                        String::from_utf8(bytes.to_vec()).map_err(|_| {
                            prim.content_err("invalid UTF8String")
                        })
                    }
                )? {
                    res.push(text)
                }
                Ok(res)
            })?;
            let fail_info = cons.take_opt_value_if(
                Tag::BIT_STRING, BitString::from_content
            )?.map(|bits| PkiFailureInfo::from_bit_string(&bits));
            Ok(PkiStatusInfo { status, status_string, fail_info })
        })
    }
}

impl fmt::Display for PkiStatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(ref text) = self.status_string {
            write!(f, " ({})", text.join("; "))?;
        }
        if let Some(info) = self.fail_info {
            write!(f, ": {}", info)?;
        }
        Ok(())
    }
}


//------------ TimeStampResp -------------------------------------------------

/// A time-stamp response.
///
/// ```txt
/// TimeStampResp ::= SEQUENCE  {
///      status                  PKIStatusInfo,
///      timeStampToken          TimeStampToken     OPTIONAL  }
///
/// TimeStampToken ::= ContentInfo
/// ```
///
/// The token is signed data with a `TSTInfo` as its encapsulated
/// content.
#[derive(Clone, Debug)]
pub struct TimeStampResp {
    status: PkiStatusInfo,
    token: Option<SignedData>,
}

impl TimeStampResp {
    pub fn decode<S: IntoSource>(
        source: S
    ) -> Result<Self, DecodeError<<S::Source as decode::Source>::Error>> {
        Mode::Ber.decode(source, Self::take_from)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            Ok(TimeStampResp {
                status: PkiStatusInfo::take_from(cons)?,
                token: SignedData::take_opt_from(cons)?,
            })
        })
    }

    pub fn status(&self) -> &PkiStatusInfo {
        &self.status
    }

    /// Returns the time-stamp token if present.
    pub fn token(&self) -> Option<&SignedData> {
        self.token.as_ref()
    }

    /// Decodes the `TSTInfo` of the token.
    ///
    /// This does not check the signature of the token at all.
    pub fn tst_info(&self) -> Result<TstInfo, ResponseError> {
        let token = self.token.as_ref().ok_or(ResponseError::MissingToken)?;
        if *token.content_type() != oid::CT_TST_INFO {
            return Err(ResponseError::ContentType(
                token.content_type().clone()
            ))
        }
        token.decode_content(TstInfo::take_from).map_err(Into::into)
    }

    /// Verifies the response for the given request.
    ///
    /// The token has to be signed by a TSA certificate that chains to one
    /// of `roots` at the current time. Returns the `TSTInfo` of the token
    /// if it is valid.
    pub fn verify(
        &self,
        request: &TimeStampReq,
        roots: &TrustRoots,
    ) -> Result<TstInfo, ResponseError> {
        self.verify_with(request, roots, &VerifyOptions::default())
    }

    /// Verifies the response with explicit options for the token.
    pub fn verify_with(
        &self,
        request: &TimeStampReq,
        roots: &TrustRoots,
        options: &VerifyOptions,
    ) -> Result<TstInfo, ResponseError> {
        if !self.status.status().is_granted() {
            return Err(ResponseError::NotGranted(self.status.clone()))
        }
        let token = self.token.as_ref().ok_or(ResponseError::MissingToken)?;
        token.verify_with(roots, options)?;
        let info = self.tst_info()?;
        if info.message_imprint() != request.message_imprint() {
            return Err(ResponseError::ImprintMismatch)
        }
        if let Some(nonce) = request.nonce() {
            if info.nonce() != Some(nonce) {
                return Err(ResponseError::NonceMismatch)
            }
        }
        debug!(
            "Time-stamp {} by {} verified, generated at {}.",
            info.serial_number(),
            info.tsa().map(ToString::to_string).unwrap_or_default(),
            info.gen_time(),
        );
        Ok(info)
    }
}


//------------ TstInfo -------------------------------------------------------

/// The information signed by a time-stamping authority.
///
/// ```txt
/// TSTInfo ::= SEQUENCE  {
///     version                      INTEGER  { v1(1) },
///     policy                       TSAPolicyId,
///     messageImprint               MessageImprint,
///     serialNumber                 INTEGER,
///     genTime                      GeneralizedTime,
///     accuracy                     Accuracy                 OPTIONAL,
///     ordering                     BOOLEAN             DEFAULT FALSE,
///     nonce                        INTEGER                  OPTIONAL,
///     tsa                          [0] GeneralName          OPTIONAL,
///     extensions                   [1] IMPLICIT Extensions  OPTIONAL  }
/// ```
#[derive(Clone, Debug)]
pub struct TstInfo {
    policy: Oid<Bytes>,
    message_imprint: MessageImprint,
    serial_number: Serial,
    gen_time: Time,
    accuracy: Option<Accuracy>,
    ordering: bool,
    nonce: Option<Nonce>,
    tsa: Option<GeneralName>,
    extensions: Option<Captured>,
}

impl TstInfo {
    /// Returns the version. Only version 1 is supported.
    pub fn version(&self) -> u8 {
        1
    }

    pub fn policy(&self) -> &Oid<Bytes> {
        &self.policy
    }

    pub fn message_imprint(&self) -> &MessageImprint {
        &self.message_imprint
    }

    pub fn serial_number(&self) -> &Serial {
        &self.serial_number
    }

    /// Returns the time the time-stamp was generated.
    pub fn gen_time(&self) -> Time {
        self.gen_time
    }

    pub fn accuracy(&self) -> Option<Accuracy> {
        self.accuracy
    }

    pub fn ordering(&self) -> bool {
        self.ordering
    }

    pub fn nonce(&self) -> Option<&Nonce> {
        self.nonce.as_ref()
    }

    /// Returns the name of the TSA if present.
    pub fn tsa(&self) -> Option<&GeneralName> {
        self.tsa.as_ref()
    }

    pub fn extensions(&self) -> Option<&Captured> {
        self.extensions.as_ref()
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            cons.skip_u8_if(1)?;
            Ok(TstInfo {
                policy: Oid::take_from(cons)?,
                message_imprint: MessageImprint::take_from(cons)?,
                serial_number: Serial::take_from(cons)?,
                gen_time: Time::take_generalized_time(cons)?,
                accuracy: Accuracy::take_opt_from(cons)?,
                ordering: cons.take_opt_bool()?.unwrap_or(false),
                nonce: Nonce::take_opt_from(cons)?,
                tsa: cons.take_opt_constructed_if(
                    Tag::CTX_0, GeneralName::take_from
                )?,
                extensions: cons.take_opt_constructed_if(
                    Tag::CTX_1, |cons| cons.capture_all()
                )?,
            })
        })
    }
}


//------------ Accuracy ------------------------------------------------------

/// The accuracy of the time of a time-stamp.
///
/// ```txt
/// Accuracy ::= SEQUENCE {
///     seconds        INTEGER              OPTIONAL,
///     millis     [0] INTEGER  (1..999)    OPTIONAL,
///     micros     [1] INTEGER  (1..999)    OPTIONAL  }
/// ```
///
/// Missing fields are treated as zero.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Accuracy {
    seconds: u64,
    millis: u16,
    micros: u16,
}

impl Accuracy {
    pub fn seconds(self) -> u64 {
        self.seconds
    }

    pub fn millis(self) -> u16 {
        self.millis
    }

    pub fn micros(self) -> u16 {
        self.micros
    }

    /// Returns the accuracy as a duration.
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.seconds)
            + Duration::from_millis(self.millis.into())
            + Duration::from_micros(self.micros.into())
    }

    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let seconds = cons.take_opt_u64()?.unwrap_or(0);
            let millis = Self::take_opt_fraction(cons, Tag::CTX_0)?;
            let micros = Self::take_opt_fraction(cons, Tag::CTX_1)?;
            Ok(Accuracy { seconds, millis, micros })
        })
    }

    fn take_opt_fraction<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        tag: Tag,
    ) -> Result<u16, DecodeError<S::Error>> {
        cons.take_opt_primitive_if(tag, |prim| {
            let res = prim.to_u16()?;
            if !(1..=999).contains(&res) {
                return Err(prim.content_err("accuracy out of range"))
            }
            Ok(res)
        }).map(|res| res.unwrap_or(0))
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.as_duration())
    }
}


//------------ GeneralName ---------------------------------------------------

/// The name of a time-stamping authority.
///
/// Only the directory name choice of a general name is interpreted. All
/// other choices are kept as captured values.
#[derive(Clone, Debug)]
pub enum GeneralName {
    DirectoryName(Name),
    Other(Captured),
}

impl GeneralName {
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        if let Some(name) = cons.take_opt_constructed_if(
            Tag::CTX_4, Name::take_from
        )? {
            return Ok(GeneralName::DirectoryName(name))
        }
        cons.capture_one().map(GeneralName::Other)
    }

    /// Returns the directory name if this is one.
    pub fn directory_name(&self) -> Option<&Name> {
        match *self {
            GeneralName::DirectoryName(ref name) => Some(name),
            GeneralName::Other(_) => None,
        }
    }
}

impl fmt::Display for GeneralName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GeneralName::DirectoryName(ref name) => write!(f, "{}", name),
            GeneralName::Other(_) => f.write_str("<other name>"),
        }
    }
}


//------------ Timestamper ---------------------------------------------------

/// A type that can obtain time-stamps from a TSA.
pub trait Timestamper {
    type Error;

    /// Sends the request to the TSA and returns its response.
    ///
    /// The response is not verified.
    fn timestamp(
        &self, req: &TimeStampReq
    ) -> Result<TimeStampResp, Self::Error>;
}


//------------ ResponseError -------------------------------------------------

/// A time-stamp response does not fit its request.
#[derive(Debug)]
pub enum ResponseError {
    /// The TSA did not grant the request.
    NotGranted(PkiStatusInfo),

    /// The response of a granted request has no token.
    MissingToken,

    /// The token failed verification.
    Verify(VerifyError),

    /// The token doesn’t contain a `TSTInfo`.
    ContentType(Oid<Bytes>),

    /// The `TSTInfo` could not be decoded.
    Decode(DecodeError<Infallible>),

    /// The token is for a different message.
    ImprintMismatch,

    /// The token doesn’t contain the nonce of the request.
    NonceMismatch,
}

impl From<VerifyError> for ResponseError {
    fn from(err: VerifyError) -> Self {
        ResponseError::Verify(err)
    }
}

impl From<DecodeError<Infallible>> for ResponseError {
    fn from(err: DecodeError<Infallible>) -> Self {
        ResponseError::Decode(err)
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ResponseError::NotGranted(ref status) => {
                write!(f, "request not granted: {}", status)
            }
            ResponseError::MissingToken => {
                f.write_str("response without time-stamp token")
            }
            ResponseError::Verify(ref err) => {
                write!(f, "invalid time-stamp token: {}", err)
            }
            ResponseError::ContentType(ref oid) => {
                write!(f, "unexpected token content type {}", oid)
            }
            ResponseError::Decode(ref err) => {
                write!(f, "invalid TSTInfo: {}", err)
            }
            ResponseError::ImprintMismatch => {
                f.write_str("message imprint mismatch")
            }
            ResponseError::NonceMismatch => f.write_str("nonce mismatch"),
        }
    }
}

impl error::Error for ResponseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ResponseError::Verify(ref err) => Some(err),
            _ => None
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::cert::ChainError;

    const DATA: &[u8] = include_bytes!("../test-data/data.txt");
    const REQUEST: &[u8] = include_bytes!("../test-data/request.tsq");
    const REQUEST_NO_NONCE: &[u8] = include_bytes!(
        "../test-data/request-nononce.tsq"
    );
    const RESPONSE: &[u8] = include_bytes!("../test-data/response.tsr");

    fn roots() -> TrustRoots {
        TrustRoots::from_der(
            include_bytes!("../test-data/root.der").as_ref()
        ).unwrap()
    }

    fn options() -> VerifyOptions {
        VerifyOptions::new().at(Time::utc(2026, 10, 19, 12, 0, 0).unwrap())
    }

    fn nonce() -> Nonce {
        Nonce::from(0xF024_635F_EEEB_F5E9)
    }

    #[test]
    fn decode_request() {
        let req = TimeStampReq::decode(REQUEST).unwrap();
        assert_eq!(
            req.message_imprint().hash_algorithm(), DigestAlgorithm::Sha256
        );
        assert!(req.message_imprint().verify(DATA));
        assert!(!req.message_imprint().verify(b"other data"));
        assert_eq!(req.nonce(), Some(&nonce()));
        assert!(req.cert_req());
        assert!(req.req_policy().is_none());
        assert!(req.extensions().is_none());
        assert_eq!(req.to_vec(), REQUEST);

        let req = TimeStampReq::decode(REQUEST_NO_NONCE).unwrap();
        assert!(req.nonce().is_none());
        assert!(!req.cert_req());
        assert_eq!(req.to_vec(), REQUEST_NO_NONCE);
    }

    #[test]
    fn build_request() {
        let mut req = TimeStampReq::new(
            MessageImprint::from_data(DigestAlgorithm::Sha256, DATA)
        );
        assert_eq!(req.to_vec(), REQUEST_NO_NONCE);
        req.set_nonce(Some(nonce()));
        req.set_cert_req(true);
        assert_eq!(req.to_vec(), REQUEST);

        req.set_policy(Some(Oid(Bytes::from_static(
            &[42, 3, 4, 1] // 1.2.3.4.1
        ))));
        let decoded = TimeStampReq::decode(req.to_vec().as_slice()).unwrap();
        assert!(decoded.req_policy() == req.req_policy());
        assert_eq!(decoded.nonce(), Some(&nonce()));
    }

    #[test]
    fn random_nonce() {
        let mut req = TimeStampReq::new(
            MessageImprint::from_data(DigestAlgorithm::Sha256, DATA)
        );
        req.set_random_nonce().unwrap();
        let first = req.nonce().cloned().unwrap();
        // The nonce is positive, so any leading octet with the high bit
        // set must be preceded by a zero octet.
        assert!(first.as_slice()[0] & 0x80 == 0);
        req.set_random_nonce().unwrap();
        assert_ne!(req.nonce(), Some(&first));
    }

    #[test]
    fn bad_imprint_length() {
        let mut der = REQUEST_NO_NONCE.to_vec();
        // Shorten the hashed message by one octet.
        der[1] -= 1;
        der[6] -= 1;
        der[23] -= 1;
        der.pop();
        assert!(TimeStampReq::decode(der.as_slice()).is_err());
    }

    #[test]
    fn decode_response() {
        let resp = TimeStampResp::decode(RESPONSE).unwrap();
        assert_eq!(resp.status().status(), PkiStatus::Granted);
        assert!(resp.status().fail_info().is_none());
        let token = resp.token().unwrap();
        assert_eq!(token.certificates().len(), 2);

        let info = resp.tst_info().unwrap();
        assert_eq!(info.version(), 1);
        assert!(*info.policy() == Oid(Bytes::from_static(&[42, 3, 4, 1])));
        assert!(info.message_imprint().verify(DATA));
        assert_eq!(info.serial_number(), &Serial::from(2));
        assert_eq!(
            info.gen_time(), Time::utc(2026, 10, 19, 2, 47, 41).unwrap()
        );
        let accuracy = info.accuracy().unwrap();
        assert_eq!(accuracy.seconds(), 1);
        assert_eq!(accuracy.millis(), 500);
        assert_eq!(accuracy.micros(), 100);
        assert_eq!(accuracy.as_duration(), Duration::new(1, 500_100_000));
        assert!(info.ordering());
        assert_eq!(info.nonce(), Some(&nonce()));
        assert_eq!(
            info.tsa().unwrap().directory_name().unwrap().common_name(),
            Some(String::from("Test TSA"))
        );
        assert!(info.extensions().is_none());
    }

    #[test]
    fn verify_response() {
        let resp = TimeStampResp::decode(RESPONSE).unwrap();
        let roots = roots();

        let req = TimeStampReq::decode(REQUEST).unwrap();
        let info = resp.verify_with(&req, &roots, &options()).unwrap();
        assert_eq!(info.serial_number(), &Serial::from(2));

        // Certificates are valid long enough for the current time, too.
        resp.verify(&req, &roots).unwrap();

        // No nonce in the request means we don’t care.
        let req = TimeStampReq::decode(REQUEST_NO_NONCE).unwrap();
        resp.verify_with(&req, &roots, &options()).unwrap();
    }

    #[test]
    fn verify_response_mismatch() {
        let resp = TimeStampResp::decode(RESPONSE).unwrap();
        let roots = roots();

        let req = TimeStampReq::new(
            MessageImprint::from_data(DigestAlgorithm::Sha256, b"other")
        );
        assert!(matches!(
            resp.verify_with(&req, &roots, &options()),
            Err(ResponseError::ImprintMismatch)
        ));

        let mut req = TimeStampReq::decode(REQUEST).unwrap();
        req.set_nonce(Some(Nonce::from(12)));
        assert!(matches!(
            resp.verify_with(&req, &roots, &options()),
            Err(ResponseError::NonceMismatch)
        ));
    }

    #[test]
    fn verify_response_untrusted() {
        let resp = TimeStampResp::decode(RESPONSE).unwrap();
        let req = TimeStampReq::decode(REQUEST).unwrap();
        let roots = TrustRoots::from_der(
            include_bytes!("../test-data/other.der").as_ref()
        ).unwrap();
        assert!(matches!(
            resp.verify_with(&req, &roots, &options()),
            Err(ResponseError::Verify(VerifyError::Chain(
                ChainError::UnknownAuthority(_)
            )))
        ));
        assert!(matches!(
            resp.verify_with(&req, &TrustRoots::new(), &options()),
            Err(ResponseError::Verify(VerifyError::Chain(_)))
        ));
    }

    #[test]
    fn rejected_response() {
        let der = [
            0x30, 0x10,
            0x30, 0x0e,
                0x02, 0x01, 0x02,
                0x30, 0x05, 0x0c, 0x03, b'b', b'a', b'd',
                0x03, 0x02, 0x07, 0x80,
        ];
        let resp = TimeStampResp::decode(der.as_ref()).unwrap();
        assert_eq!(resp.status().status(), PkiStatus::Rejection);
        assert_eq!(
            resp.status().status_string(), Some(&[String::from("bad")][..])
        );
        let fail_info = resp.status().fail_info().unwrap();
        assert!(fail_info.contains(PkiFailureInfo::BAD_ALG));
        assert!(!fail_info.contains(PkiFailureInfo::SYSTEM_FAILURE));
        assert_eq!(
            resp.status().to_string(), "rejected (bad): badAlg"
        );
        assert!(resp.token().is_none());
        assert!(matches!(resp.tst_info(), Err(ResponseError::MissingToken)));

        let req = TimeStampReq::decode(REQUEST).unwrap();
        assert!(matches!(
            resp.verify(&req, &roots()),
            Err(ResponseError::NotGranted(_))
        ));
    }

    #[test]
    fn granted_without_token() {
        let der = [0x30, 0x05, 0x30, 0x03, 0x02, 0x01, 0x00];
        let resp = TimeStampResp::decode(der.as_ref()).unwrap();
        let req = TimeStampReq::decode(REQUEST).unwrap();
        assert!(matches!(
            resp.verify(&req, &roots()),
            Err(ResponseError::MissingToken)
        ));
    }

    #[test]
    fn failure_info_bits() {
        let info = PkiFailureInfo::from_bits(
            PkiFailureInfo::TIME_NOT_AVAILABLE.bits()
            | PkiFailureInfo::SYSTEM_FAILURE.bits()
        );
        assert_eq!(info.to_string(), "timeNotAvailable, systemFailure");
        assert_eq!(PkiFailureInfo::from_bits(1 << 3).to_string(), "0x8");
    }
}
