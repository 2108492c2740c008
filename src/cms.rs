//! Cryptographic Message Syntax signed data.
//!
//! This module implements the `SignedData` content type of [RFC 5652] as
//! far as it is needed to check signatures made over some encapsulated
//! content. Time-stamp tokens of [RFC 3161] are such signed data.
//!
//! Signed data is decoded by [`SignedData::decode`] and then checked
//! against a set of trust roots by [`SignedData::verify`]. Verification
//! succeeds only if every signer of the signed data can be traced back to
//! one of the roots and its signature and signed attributes check out.
//!
//! [RFC 3161]: https://tools.ietf.org/html/rfc3161
//! [RFC 5652]: https://tools.ietf.org/html/rfc5652
//
// The comments in the code refer to the ASN.1 types of section 5 of
// RFC 5652.

use std::{fmt, slice};
use std::convert::Infallible;
use bcder::decode;
use bcder::{Captured, Mode, OctetString, Oid, Tag};
use bcder::decode::{ContentError, DecodeError, IntoSource, Source};
use bcder::string::OctetStringSource;
use bytes::Bytes;
use log::{debug, warn};
use crate::{asn1, oid};
use crate::cert::{Cert, DEFAULT_MAX_CHAIN_LEN, TrustRoots, verify_chain};
use crate::crypto::{DigestAlgorithm, KeyIdentifier, SignatureAlgorithm};
use crate::error::{AttributeType, VerifyError};
use crate::x509::{Name, Serial, Time, take_algorithm_oid};


//------------ SignedData ----------------------------------------------------

/// Signed data.
///
/// A value of this type contains everything from a `ContentInfo` of
/// type signed data: the encapsulated content, the certificates included
/// by the signers, and the signer infos.
#[derive(Clone, Debug)]
pub struct SignedData {
    version: u8,
    digest_algorithms: Vec<Oid<Bytes>>,
    content_type: Oid<Bytes>,
    content: Option<OctetString>,
    certificates: Vec<Cert>,
    crls: Option<Captured>,
    signer_infos: Vec<SignerInfo>,
}

/// # Data Access
///
impl SignedData {
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the digest algorithm identifiers announced by the signers.
    pub fn digest_algorithms(&self) -> &[Oid<Bytes>] {
        &self.digest_algorithms
    }

    /// Returns a reference to the content type of the encapsulated content.
    pub fn content_type(&self) -> &Oid<Bytes> {
        &self.content_type
    }

    /// Returns a reference to the encapsulated content if present.
    pub fn content(&self) -> Option<&OctetString> {
        self.content.as_ref()
    }

    /// Returns the octets of the encapsulated content.
    ///
    /// If the content is missing, the result is empty.
    pub fn content_bytes(&self) -> Bytes {
        self.content.as_ref().map(OctetString::to_bytes).unwrap_or_default()
    }

    /// Decodes the encapsulated content.
    ///
    /// The content is decoded in DER mode. Missing content is decoded as
    /// empty content.
    pub fn decode_content<F, T>(
        &self, op: F
    ) -> Result<T, DecodeError<<OctetStringSource as Source>::Error>>
    where F: FnOnce(
        &mut decode::Constructed<OctetStringSource>
    ) -> Result<T, DecodeError<<OctetStringSource as Source>::Error>> {
        Mode::Der.decode(
            self.content.clone().unwrap_or_else(|| {
                OctetString::new(Bytes::new())
            }),
            op
        )
    }

    /// Returns the certificates included with the signed data.
    pub fn certificates(&self) -> &[Cert] {
        &self.certificates
    }

    /// Returns the raw content of the CRLs field if present.
    ///
    /// CRLs are not used for verification.
    pub fn crls(&self) -> Option<&Captured> {
        self.crls.as_ref()
    }

    pub fn signer_infos(&self) -> &[SignerInfo] {
        &self.signer_infos
    }

    /// Returns the certificate for the given signer.
    pub fn signer_cert(&self, sid: &SignerIdentifier) -> Option<&Cert> {
        self.certificates.iter().find(|cert| sid.matches(cert))
    }
}

/// # Decoding
///
/// ```txt
/// ContentInfo ::= SEQUENCE {
///     contentType ContentType,
///     content [0] EXPLICIT ANY DEFINED BY contentType }
///
/// SignedData ::= SEQUENCE {
///     version CMSVersion,
///     digestAlgorithms DigestAlgorithmIdentifiers,
///     encapContentInfo EncapsulatedContentInfo,
///     certificates [0] IMPLICIT CertificateSet OPTIONAL,
///     crls [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///     signerInfos SignerInfos }
///
/// EncapsulatedContentInfo ::= SEQUENCE {
///     eContentType ContentType,
///     eContent [0] EXPLICIT OCTET STRING OPTIONAL }
/// ```
impl SignedData {
    /// Decodes signed data from a source.
    ///
    /// The source must contain a `ContentInfo` of type signed data. It is
    /// decoded in BER mode.
    pub fn decode<S: IntoSource>(
        source: S
    ) -> Result<Self, DecodeError<<S::Source as Source>::Error>> {
        Mode::Ber.decode(source.into_source(), Self::take_from)
    }

    /// Takes signed data from the beginning of a constructed value.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(Self::from_content_info)
    }

    /// Takes optional signed data from the beginning of a constructed value.
    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(Self::from_content_info)
    }

    fn from_content_info<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        oid::SIGNED_DATA.skip_if(cons)?; // contentType
        cons.take_constructed_if(Tag::CTX_0, |cons| { // content
            cons.take_sequence(Self::from_constructed)
        })
    }

    fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let version = cons.take_u8()?;
        let digest_algorithms = cons.take_set(|cons| {
            let mut res = Vec::new();
            while let Some(oid) = cons.take_opt_sequence(|cons| {
                let oid = Oid::take_from(cons)?;
                cons.skip_all()?;
                Ok(oid)
            })? {
                res.push(oid)
            }
            Ok(res)
        })?;
        let (content_type, content) = cons.take_sequence(|cons| {
            Ok((
                Oid::take_from(cons)?,
                cons.take_opt_constructed_if(
                    Tag::CTX_0, OctetString::take_from
                )?
            ))
        })?;
        let certificates = cons.take_opt_constructed_if(
            Tag::CTX_0, Self::take_certificates
        )?.unwrap_or_default();
        let crls = cons.take_opt_constructed_if(
            Tag::CTX_1, |cons| cons.capture_all()
        )?;
        let signer_infos = cons.take_set(|cons| {
            let mut res = Vec::new();
            while let Some(info) = SignerInfo::take_opt_from(cons)? {
                res.push(info)
            }
            Ok(res)
        })?;
        Ok(SignedData {
            version, digest_algorithms, content_type, content,
            certificates, crls, signer_infos,
        })
    }

    /// Takes the content of the certificate set.
    ///
    /// ```txt
    /// CertificateChoices ::= CHOICE {
    ///      certificate Certificate,
    ///      extendedCertificate [0] IMPLICIT ExtendedCertificate,
    ///      v1AttrCert [1] IMPLICIT AttributeCertificateV1,
    ///      v2AttrCert [2] IMPLICIT AttributeCertificateV2,
    ///      other [3] IMPLICIT OtherCertificateFormat }
    /// ```
    ///
    /// Only plain certificates are kept. The tagged choices are skipped.
    fn take_certificates<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Vec<Cert>, DecodeError<S::Error>> {
        let mut res = Vec::new();
        while let Some(cert) = cons.take_opt_value(|tag, content| {
            if tag == Tag::SEQUENCE {
                return Cert::from_constructed(
                    content.as_constructed()?
                ).map(Some)
            }
            if ![Tag::CTX_0, Tag::CTX_1, Tag::CTX_2, Tag::CTX_3].contains(
                &tag
            ) {
                return Err(content.content_err("invalid certificate choice"))
            }
            match *content {
                decode::Content::Primitive(ref mut inner) => {
                    inner.skip_all()?
                }
                decode::Content::Constructed(ref mut inner) => {
                    inner.skip_all()?
                }
            }
            Ok(None)
        })? {
            if let Some(cert) = cert {
                res.push(cert)
            }
        }
        Ok(res)
    }
}

/// # Verification
///
impl SignedData {
    /// Verifies the signed data against a set of trust roots.
    ///
    /// This uses the default options, i.e., certificates are checked
    /// against the current time.
    pub fn verify(&self, roots: &TrustRoots) -> Result<(), VerifyError> {
        self.verify_with(roots, &VerifyOptions::default())
    }

    /// Verifies the signed data with the given options.
    ///
    /// There needs to be at least one signer and one certificate. Every
    /// signer needs to pass. The first failing signer determines the error.
    pub fn verify_with(
        &self, roots: &TrustRoots, options: &VerifyOptions
    ) -> Result<(), VerifyError> {
        if self.signer_infos.is_empty() {
            return Err(VerifyError::NoSigners)
        }
        if self.certificates.is_empty() {
            return Err(VerifyError::NoCertificates)
        }
        let now = options.time().unwrap_or_else(Time::now);
        for (idx, signer) in self.signer_infos.iter().enumerate() {
            debug!("verifying signer {} ({})", idx, signer.sid());
            if let Err(err) = self.verify_signer(signer, roots, now, options) {
                warn!("signer {} ({}) rejected: {}", idx, signer.sid(), err);
                return Err(err)
            }
        }
        Ok(())
    }

    fn verify_signer(
        &self,
        signer: &SignerInfo,
        roots: &TrustRoots,
        now: Time,
        options: &VerifyOptions,
    ) -> Result<(), VerifyError> {
        let cert = self.signer_cert(signer.sid()).ok_or_else(|| {
            VerifyError::SignerNotFound(signer.sid().clone())
        })?;
        let chain = verify_chain(
            cert, &self.certificates, roots, now, options.max_chain_len
        )?;
        debug!("signer certificate chain has {} certificates", chain.len());

        let algorithm = signer.signature_algorithm().ok_or_else(|| {
            VerifyError::UnknownAlgorithm {
                digest: signer.digest_algorithm_oid().clone(),
                signature: signer.signature_algorithm_oid().clone(),
            }
        })?;
        let key = cert.subject_public_key_info();
        let attrs = match signer.signed_attrs() {
            Some(attrs) => attrs,
            None => {
                return key.verify(
                    algorithm, &self.content_bytes(), signer.signature()
                ).map_err(Into::into)
            }
        };
        key.verify(algorithm, &attrs.encode_verify(), signer.signature())?;

        let content_type = attrs.content_type().map_err(|_| {
            VerifyError::MalformedAttribute(AttributeType::ContentType)
        })?.ok_or(
            VerifyError::MissingAttribute(AttributeType::ContentType)
        )?;
        if content_type != self.content_type {
            return Err(VerifyError::ContentTypeMismatch {
                expected: self.content_type.clone(),
                found: content_type,
            })
        }

        let message_digest = attrs.message_digest().map_err(|_| {
            VerifyError::MalformedAttribute(AttributeType::MessageDigest)
        })?.ok_or(
            VerifyError::MissingAttribute(AttributeType::MessageDigest)
        )?;
        let digest_algorithm = DigestAlgorithm::from_oid(
            signer.digest_algorithm_oid()
        ).ok_or_else(|| {
            VerifyError::UnsupportedDigestAlgorithm(
                signer.digest_algorithm_oid().clone()
            )
        })?;
        let digest = {
            let mut context = digest_algorithm.start();
            if let Some(content) = self.content.as_ref() {
                content.iter().for_each(|x| context.update(x));
            }
            context.finish()
        };
        if digest.as_ref() != message_digest.as_ref() {
            return Err(VerifyError::DigestMismatch)
        }

        let signing_time = attrs.signing_time().map_err(|_| {
            VerifyError::MalformedAttribute(AttributeType::SigningTime)
        })?;
        if let Some(signing_time) = signing_time {
            let validity = cert.validity();
            if signing_time < validity.not_before()
                || signing_time > validity.not_after()
            {
                return Err(VerifyError::CertificateInactive(signing_time))
            }
        }
        Ok(())
    }
}


//------------ VerifyOptions -------------------------------------------------

/// Options for verifying signed data.
#[derive(Clone, Copy, Debug)]
pub struct VerifyOptions {
    /// The time to verify at or `None` for the current time.
    time: Option<Time>,

    /// The maximum number of certificates in a chain.
    max_chain_len: usize,
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies certificates at the given time instead of now.
    pub fn at(mut self, time: Time) -> Self {
        self.time = Some(time);
        self
    }

    /// Sets the maximum number of certificates in a chain.
    ///
    /// The chain includes both the signer certificate and the root.
    pub fn max_chain_len(mut self, len: usize) -> Self {
        self.max_chain_len = len;
        self
    }

    pub fn time(&self) -> Option<Time> {
        self.time
    }
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions { time: None, max_chain_len: DEFAULT_MAX_CHAIN_LEN }
    }
}


//------------ SignerInfo ----------------------------------------------------

/// Information about a single signer of signed data.
///
/// ```txt
/// SignerInfo ::= SEQUENCE {
///     version CMSVersion,
///     sid SignerIdentifier,
///     digestAlgorithm DigestAlgorithmIdentifier,
///     signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///     signatureAlgorithm SignatureAlgorithmIdentifier,
///     signature SignatureValue,
///     unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL }
/// ```
#[derive(Clone, Debug)]
pub struct SignerInfo {
    version: u8,
    sid: SignerIdentifier,
    digest_algorithm: Oid<Bytes>,
    signed_attrs: Option<SignedAttrs>,
    signature_algorithm: Oid<Bytes>,
    signature: Bytes,
    unsigned_attrs: Option<Captured>,
}

impl SignerInfo {
    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            Ok(SignerInfo {
                version: cons.take_u8()?,
                sid: SignerIdentifier::take_from(cons)?,
                digest_algorithm: take_algorithm_oid(cons)?,
                signed_attrs: SignedAttrs::take_opt_from(cons)?,
                signature_algorithm: take_algorithm_oid(cons)?,
                signature: OctetString::take_from(cons)?.into_bytes(),
                unsigned_attrs: cons.take_opt_constructed_if(
                    Tag::CTX_1, |cons| cons.capture_all()
                )?,
            })
        })
    }

    /// Returns the version of the signer info.
    ///
    /// This is 1 for signers identified by issuer and serial number and
    /// 3 for those identified by subject key identifier.
    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn sid(&self) -> &SignerIdentifier {
        &self.sid
    }

    pub fn digest_algorithm_oid(&self) -> &Oid<Bytes> {
        &self.digest_algorithm
    }

    pub fn signature_algorithm_oid(&self) -> &Oid<Bytes> {
        &self.signature_algorithm
    }

    /// Returns the signature algorithm used by the signer.
    ///
    /// Returns `None` if the combination of digest and signature algorithm
    /// identifiers is unknown.
    pub fn signature_algorithm(&self) -> Option<SignatureAlgorithm> {
        SignatureAlgorithm::resolve(
            &self.digest_algorithm, &self.signature_algorithm
        )
    }

    pub fn signed_attrs(&self) -> Option<&SignedAttrs> {
        self.signed_attrs.as_ref()
    }

    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    /// Returns the raw content of the unsigned attributes if present.
    pub fn unsigned_attrs(&self) -> Option<&Captured> {
        self.unsigned_attrs.as_ref()
    }

    /// Returns the content type attribute.
    pub fn content_type(
        &self
    ) -> Result<Option<Oid<Bytes>>, DecodeError<Infallible>> {
        match self.signed_attrs {
            Some(ref attrs) => attrs.content_type(),
            None => Ok(None)
        }
    }

    /// Returns the message digest attribute.
    pub fn message_digest(
        &self
    ) -> Result<Option<Bytes>, DecodeError<Infallible>> {
        match self.signed_attrs {
            Some(ref attrs) => attrs.message_digest(),
            None => Ok(None)
        }
    }

    /// Returns the signing time attribute.
    pub fn signing_time(
        &self
    ) -> Result<Option<Time>, DecodeError<Infallible>> {
        match self.signed_attrs {
            Some(ref attrs) => attrs.signing_time(),
            None => Ok(None)
        }
    }
}


//------------ SignerIdentifier ----------------------------------------------

/// The identifier of the certificate of a signer.
///
/// ```txt
/// SignerIdentifier ::= CHOICE {
///     issuerAndSerialNumber IssuerAndSerialNumber,
///     subjectKeyIdentifier [0] SubjectKeyIdentifier }
///
/// IssuerAndSerialNumber ::= SEQUENCE {
///     issuer Name,
///     serialNumber CertificateSerialNumber }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerIdentifier {
    IssuerAndSerial {
        issuer: Name,
        serial: Serial,
    },
    SubjectKeyIdentifier(KeyIdentifier),
}

impl SignerIdentifier {
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        if let Some(id) = KeyIdentifier::take_opt_value_if(cons, Tag::CTX_0)? {
            return Ok(SignerIdentifier::SubjectKeyIdentifier(id))
        }
        cons.take_sequence(|cons| {
            Ok(SignerIdentifier::IssuerAndSerial {
                issuer: Name::take_from(cons)?,
                serial: Serial::take_from(cons)?,
            })
        })
    }

    /// Returns whether `cert` is the certificate identified.
    ///
    /// Issuer names are compared bytewise. Key identifiers are compared
    /// against the subject key identifier extension of the certificate.
    pub fn matches(&self, cert: &Cert) -> bool {
        match *self {
            SignerIdentifier::IssuerAndSerial { ref issuer, ref serial } => {
                cert.issuer() == issuer && cert.serial_number() == serial
            }
            SignerIdentifier::SubjectKeyIdentifier(ref id) => {
                cert.subject_key_identifier() == Some(id)
            }
        }
    }
}

impl fmt::Display for SignerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SignerIdentifier::IssuerAndSerial { ref issuer, ref serial } => {
                write!(f, "issuer {}, serial {}", issuer, serial)
            }
            SignerIdentifier::SubjectKeyIdentifier(ref id) => {
                write!(f, "key {}", id)
            }
        }
    }
}


//------------ SignedAttrs ---------------------------------------------------

/// The signed attributes of a signer.
///
/// The signature of a signer with signed attributes is calculated over the
/// DER encoding of the attributes as a SET OF rather than the implicitly
/// tagged `[0]` found in the signer info. In order to be able to produce
/// this encoding from BER input, the attributes are kept as a value of
/// the [`asn1`] codec, too.
///
/// ```txt
/// SignedAttributes ::= SET SIZE (1..MAX) OF Attribute
///
/// Attribute ::= SEQUENCE {
///     attrType OBJECT IDENTIFIER,
///     attrValues SET OF AttributeValue }
/// ```
#[derive(Clone, Debug)]
pub struct SignedAttrs {
    /// The raw content of the attributes set.
    raw: Captured,

    /// The attributes as a SET OF.
    set: asn1::Value,

    /// The attributes in the order they were encountered.
    attrs: Vec<Attribute>,
}

impl SignedAttrs {
    /// Takes optional signed attributes from a constructed value.
    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
            let mut attrs = Vec::new();
            let raw = cons.capture(|cons| {
                while let Some(attr) = Attribute::take_opt_from(cons)? {
                    attrs.push(attr)
                }
                Ok(())
            })?;
            if attrs.is_empty() {
                return Err(cons.content_err("empty signed attributes"))
            }
            let set = Self::reencode(raw.as_slice()).map_err(|err| {
                cons.content_err(ContentError::from_boxed(Box::new(err)))
            })?;
            Ok(SignedAttrs { raw, set, attrs })
        })
    }

    /// Re-encodes the attributes as a SET OF value.
    fn reencode(raw: &[u8]) -> Result<asn1::Value, asn1::DecodeError> {
        let decoder = asn1::Decoder::new();
        let mut source = asn1::SliceSource::new(raw);
        let mut members = Vec::new();
        while !source.remaining().is_empty() {
            members.push(decoder.decode(&mut source)?);
        }
        asn1::Value::constructed(
            asn1::Identifier::from_octet(asn1::Identifier::SET)?,
            members
        )
    }

    /// Returns the raw content of the attributes as found in the data.
    pub fn as_slice(&self) -> &[u8] {
        self.raw.as_slice()
    }

    /// Returns the message the signature is calculated over.
    pub fn encode_verify(&self) -> Vec<u8> {
        self.set.to_vec()
    }

    pub fn iter(&self) -> slice::Iter<Attribute> {
        self.attrs.iter()
    }

    /// Returns the first attribute of the given type.
    pub fn get(&self, attr_type: &Oid<impl AsRef<[u8]>>) -> Option<&Attribute> {
        self.attrs.iter().find(|attr| attr.attr_type == *attr_type)
    }

    /// Returns the content type attribute.
    ///
    /// The attribute is defined in section 11.1 of RFC 5652. Its value is
    /// an OBJECT IDENTIFIER.
    pub fn content_type(
        &self
    ) -> Result<Option<Oid<Bytes>>, DecodeError<Infallible>> {
        self.get(&oid::CONTENT_TYPE).map(|attr| {
            attr.values.clone().decode(|cons| {
                let res = Oid::take_from(cons)?;
                cons.skip_all()?;
                Ok(res)
            })
        }).transpose()
    }

    /// Returns the message digest attribute.
    ///
    /// This is section 11.2 of RFC 5652, the value is an OCTET STRING.
    pub fn message_digest(
        &self
    ) -> Result<Option<Bytes>, DecodeError<Infallible>> {
        self.get(&oid::MESSAGE_DIGEST).map(|attr| {
            attr.values.clone().decode(|cons| {
                let res = OctetString::take_from(cons)?;
                cons.skip_all()?;
                Ok(res.to_bytes())
            })
        }).transpose()
    }

    /// Returns the signing time attribute.
    ///
    /// This is section 11.3 of RFC 5652. The value is either a UTCTime or
    /// a GeneralizedTime.
    pub fn signing_time(
        &self
    ) -> Result<Option<Time>, DecodeError<Infallible>> {
        self.get(&oid::SIGNING_TIME).map(|attr| {
            attr.values.clone().decode(|cons| {
                let res = Time::take_from(cons)?;
                cons.skip_all()?;
                Ok(res)
            })
        }).transpose()
    }
}

impl<'a> IntoIterator for &'a SignedAttrs {
    type Item = &'a Attribute;
    type IntoIter = slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


//------------ Attribute -----------------------------------------------------

/// A single signed attribute.
#[derive(Clone, Debug)]
pub struct Attribute {
    attr_type: Oid<Bytes>,

    /// The content of the SET OF values.
    values: Captured,
}

impl Attribute {
    fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            Ok(Attribute {
                attr_type: Oid::take_from(cons)?,
                values: cons.take_set(|cons| cons.capture_all())?,
            })
        })
    }

    pub fn attr_type(&self) -> &Oid<Bytes> {
        &self.attr_type
    }

    /// Returns the raw content of the set of values.
    pub fn values(&self) -> &Captured {
        &self.values
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use bcder::ConstOid;
    use ring::rand::SystemRandom;
    use ring::signature::{self, EcdsaKeyPair, RsaKeyPair};
    use crate::asn1::{Identifier, Value};
    use crate::cert::ChainError;

    const DATA: &[u8] = include_bytes!("../test-data/data.txt");

    fn cert(data: &'static [u8]) -> Cert {
        Cert::decode(data).unwrap()
    }

    fn roots() -> TrustRoots {
        TrustRoots::from_der(include_bytes!("../test-data/root.der")).unwrap()
    }

    fn signer_cert() -> Cert {
        cert(include_bytes!("../test-data/signer.der"))
    }

    fn now() -> Time {
        Time::utc(2026, 10, 19, 0, 0, 0).unwrap()
    }

    //--- Building signed data

    fn prim(tag: u8, content: impl Into<Bytes>) -> Value {
        Value::primitive(Identifier::from_octet(tag).unwrap(), content)
            .unwrap()
    }

    fn cons(tag: u8, members: Vec<Value>) -> Value {
        Value::constructed(Identifier::from_octet(tag).unwrap(), members)
            .unwrap()
    }

    fn oid(oid: &ConstOid) -> Value {
        prim(0x06, oid.0)
    }

    fn alg(oid_value: &ConstOid) -> Value {
        cons(0x30, vec![oid(oid_value), prim(0x05, Bytes::new())])
    }

    fn attr(attr_type: &ConstOid, value: Value) -> Value {
        cons(0x30, vec![oid(attr_type), cons(0x31, vec![value])])
    }

    fn utc_time(time: &'static str) -> Value {
        prim(0x17, time.as_bytes())
    }

    /// The parts of a signer info that tests want to tweak.
    struct Signer {
        sid: Value,
        digest_algorithm: &'static ConstOid,
        signature_algorithm: &'static ConstOid,
        attrs: Option<Vec<Value>>,
    }

    impl Signer {
        /// A signer with the usual attributes for `content`.
        fn new(cert: &Cert, content: &[u8]) -> Self {
            Signer {
                sid: issuer_and_serial(cert),
                digest_algorithm: &oid::SHA256,
                signature_algorithm: &oid::RSA_ENCRYPTION,
                attrs: Some(vec![
                    attr(&oid::CONTENT_TYPE, oid(&oid::DATA)),
                    attr(&oid::SIGNING_TIME, utc_time("261019024741Z")),
                    attr(
                        &oid::MESSAGE_DIGEST,
                        prim(
                            0x04,
                            DigestAlgorithm::Sha256.digest(content)
                                .as_ref().to_vec()
                        )
                    ),
                ]),
            }
        }

        fn message(&self, content: &[u8]) -> Vec<u8> {
            match self.attrs {
                Some(ref attrs) => cons(0x31, attrs.clone()).to_vec(),
                None => content.to_vec()
            }
        }

        fn sign_rsa(self, content: &[u8]) -> Value {
            let key = RsaKeyPair::from_pkcs8(
                include_bytes!("../test-data/signer.pk8")
            ).unwrap();
            let mut sig = vec![0u8; key.public().modulus_len()];
            key.sign(
                &signature::RSA_PKCS1_SHA256, &SystemRandom::new(),
                &self.message(content), &mut sig
            ).unwrap();
            self.finish(sig)
        }

        fn sign_ecdsa(self, content: &[u8]) -> Value {
            let rng = SystemRandom::new();
            let key = EcdsaKeyPair::from_pkcs8(
                &signature::ECDSA_P256_SHA256_ASN1_SIGNING,
                include_bytes!("../test-data/ec-signer.pk8"),
                &rng,
            ).unwrap();
            let sig = key.sign(&rng, &self.message(content)).unwrap();
            self.finish(sig.as_ref().to_vec())
        }

        fn finish(self, sig: Vec<u8>) -> Value {
            let version = if self.sid.identifier().as_slice() == [0x80] {
                Bytes::from_static(b"\x03")
            }
            else {
                Bytes::from_static(b"\x01")
            };
            let mut members = vec![
                prim(0x02, version),
                self.sid,
                alg(self.digest_algorithm),
            ];
            if let Some(attrs) = self.attrs {
                members.push(cons(0xa0, attrs));
            }
            members.push(alg(self.signature_algorithm));
            members.push(prim(0x04, sig));
            cons(0x30, members)
        }
    }

    fn issuer_and_serial(cert: &Cert) -> Value {
        cons(0x30, vec![
            Value::decode(cert.issuer().as_slice()).unwrap(),
            prim(0x02, cert.serial_number().as_slice().to_vec()),
        ])
    }

    fn signed_data(
        content: &[u8], certs: &[Cert], signers: Vec<Value>
    ) -> SignedData {
        let mut members = vec![
            prim(0x02, Bytes::from_static(b"\x01")),
            cons(0x31, vec![alg(&oid::SHA256)]),
            cons(0x30, vec![
                oid(&oid::DATA),
                cons(0xa0, vec![prim(0x04, content.to_vec())]),
            ]),
        ];
        if !certs.is_empty() {
            members.push(cons(
                0xa0,
                certs.iter().map(|cert| {
                    Value::decode(cert.as_slice()).unwrap()
                }).collect()
            ));
        }
        members.push(cons(0x31, signers));
        let encoded = cons(0x30, vec![
            oid(&oid::SIGNED_DATA),
            cons(0xa0, vec![cons(0x30, members)]),
        ]).to_vec();
        SignedData::decode(encoded.as_slice()).unwrap()
    }

    fn verify(data: &SignedData) -> Result<(), VerifyError> {
        data.verify_with(&roots(), &VerifyOptions::new().at(now()))
    }

    //--- Tests

    #[test]
    fn decode_openssl() {
        let data = SignedData::decode(
            include_bytes!("../test-data/signed.p7").as_ref()
        ).unwrap();
        assert_eq!(data.version(), 1);
        assert_eq!(data.digest_algorithms().len(), 1);
        assert!(data.digest_algorithms()[0] == oid::SHA256);
        assert!(*data.content_type() == oid::DATA);
        assert_eq!(data.content_bytes().as_ref(), DATA);
        assert_eq!(data.certificates().len(), 1);
        assert!(data.crls().is_none());
        assert_eq!(data.signer_infos().len(), 1);

        let signer = &data.signer_infos()[0];
        assert_eq!(signer.version(), 1);
        assert_eq!(
            *signer.sid(),
            SignerIdentifier::IssuerAndSerial {
                issuer: signer_cert().issuer().clone(),
                serial: Serial::from(0x1001u64),
            }
        );
        assert_eq!(
            signer.signature_algorithm(),
            Some(SignatureAlgorithm::RsaSha256)
        );
        assert!(signer.content_type().unwrap().unwrap() == oid::DATA);
        assert_eq!(
            signer.message_digest().unwrap().unwrap().as_ref(),
            DigestAlgorithm::Sha256.digest(DATA).as_ref()
        );
        assert_eq!(
            signer.signing_time().unwrap(),
            Time::utc(2026, 10, 19, 2, 47, 41)
        );
        assert_eq!(signer.signed_attrs().unwrap().iter().count(), 4);
        assert!(signer.unsigned_attrs().is_none());
        assert_eq!(
            data.signer_cert(signer.sid()), Some(&signer_cert())
        );
    }

    #[test]
    fn verify_openssl() {
        let data = SignedData::decode(
            include_bytes!("../test-data/signed.p7").as_ref()
        ).unwrap();
        data.verify(&roots()).unwrap();
        verify(&data).unwrap();

        let other = TrustRoots::from_der(
            include_bytes!("../test-data/other.der")
        ).unwrap();
        assert!(matches!(
            data.verify(&other),
            Err(VerifyError::Chain(ChainError::UnknownAuthority(None)))
        ));
        assert!(matches!(
            data.verify(&TrustRoots::new()),
            Err(VerifyError::Chain(_))
        ));
    }

    #[test]
    fn verify_built() {
        let signer = signer_cert();
        let data = signed_data(
            DATA, &[signer.clone()],
            vec![Signer::new(&signer, DATA).sign_rsa(DATA)]
        );
        verify(&data).unwrap();

        // Without signed attributes, the content itself is signed.
        let mut info = Signer::new(&signer, DATA);
        info.attrs = None;
        let data = signed_data(
            DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
        );
        assert!(data.signer_infos()[0].signed_attrs().is_none());
        verify(&data).unwrap();

        // Identified by key identifier.
        let mut info = Signer::new(&signer, DATA);
        info.sid = prim(
            0x80, signer.subject_key_identifier().unwrap().as_slice().to_vec()
        );
        let data = signed_data(
            DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
        );
        assert_eq!(data.signer_infos()[0].version(), 3);
        verify(&data).unwrap();

        // With a combined signature algorithm identifier.
        let mut info = Signer::new(&signer, DATA);
        info.signature_algorithm = &oid::SHA256_WITH_RSA_ENCRYPTION;
        verify(
            &signed_data(DATA, &[signer.clone()], vec![info.sign_rsa(DATA)])
        ).unwrap();
    }

    #[test]
    fn verify_ecdsa() {
        let signer = cert(include_bytes!("../test-data/ec-signer.der"));
        let mut info = Signer::new(&signer, DATA);
        info.signature_algorithm = &oid::ECDSA_WITH_SHA256;
        let data = signed_data(
            DATA, &[signer.clone()], vec![info.sign_ecdsa(DATA)]
        );
        verify(&data).unwrap();

        // ECDSA with SHA-512 is known but can’t be checked.
        let mut info = Signer::new(&signer, DATA);
        info.signature_algorithm = &oid::ECDSA_WITH_SHA512;
        let data = signed_data(
            DATA, &[signer.clone()], vec![info.sign_ecdsa(DATA)]
        );
        match verify(&data) {
            Err(VerifyError::BadSignature(err)) => {
                assert!(err.is_unsupported())
            }
            res => panic!("unexpected result {:?}", res)
        }
    }

    #[test]
    fn verify_multiple_signers() {
        let signer = signer_cert();
        let ec_signer = cert(include_bytes!("../test-data/ec-signer.der"));
        let mut ec_info = Signer::new(&ec_signer, DATA);
        ec_info.signature_algorithm = &oid::ECDSA_WITH_SHA256;
        let certs = [signer.clone(), ec_signer.clone()];

        let data = signed_data(
            DATA, &certs,
            vec![
                Signer::new(&signer, DATA).sign_rsa(DATA),
                ec_info.sign_ecdsa(DATA),
            ]
        );
        verify(&data).unwrap();

        // The second signer signed something else.
        let mut bad = Signer::new(&ec_signer, b"other content");
        bad.signature_algorithm = &oid::ECDSA_WITH_SHA256;
        let data = signed_data(
            DATA, &certs,
            vec![
                Signer::new(&signer, DATA).sign_rsa(DATA),
                bad.sign_ecdsa(b"other content"),
            ]
        );
        assert!(matches!(verify(&data), Err(VerifyError::DigestMismatch)));
    }

    #[test]
    fn tampered_content() {
        let signer = signer_cert();
        let data = signed_data(
            b"tampered", &[signer.clone()],
            vec![Signer::new(&signer, DATA).sign_rsa(DATA)]
        );
        assert!(matches!(verify(&data), Err(VerifyError::DigestMismatch)));

        // Without signed attributes the signature breaks.
        let mut info = Signer::new(&signer, DATA);
        info.attrs = None;
        let data = signed_data(
            b"tampered", &[signer.clone()], vec![info.sign_rsa(DATA)]
        );
        assert!(matches!(verify(&data), Err(VerifyError::BadSignature(_))));
    }

    #[test]
    fn signing_time() {
        let signer = signer_cert();
        let mut info = Signer::new(&signer, DATA);
        if let Some(attrs) = info.attrs.as_mut() {
            attrs[1] = attr(
                &oid::SIGNING_TIME,
                prim(0x18, Bytes::from_static(b"21210101000000Z"))
            );
        }
        let data = signed_data(
            DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
        );
        match verify(&data) {
            Err(VerifyError::CertificateInactive(time)) => {
                assert_eq!(Some(time), Time::utc(2121, 1, 1, 0, 0, 0))
            }
            res => panic!("unexpected result {:?}", res)
        }

        // No signing time is fine.
        let mut info = Signer::new(&signer, DATA);
        if let Some(attrs) = info.attrs.as_mut() {
            attrs.remove(1);
        }
        verify(
            &signed_data(DATA, &[signer.clone()], vec![info.sign_rsa(DATA)])
        ).unwrap();

        // A broken one isn’t.
        let mut info = Signer::new(&signer, DATA);
        if let Some(attrs) = info.attrs.as_mut() {
            attrs[1] = attr(
                &oid::SIGNING_TIME, prim(0x04, Bytes::from_static(b"now"))
            );
        }
        assert!(matches!(
            verify(&signed_data(
                DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
            )),
            Err(VerifyError::MalformedAttribute(AttributeType::SigningTime))
        ));
    }

    #[test]
    fn attribute_failures() {
        let signer = signer_cert();

        // Missing message digest.
        let mut info = Signer::new(&signer, DATA);
        if let Some(attrs) = info.attrs.as_mut() {
            attrs.remove(2);
        }
        assert!(matches!(
            verify(&signed_data(
                DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
            )),
            Err(VerifyError::MissingAttribute(AttributeType::MessageDigest))
        ));

        // Missing content type.
        let mut info = Signer::new(&signer, DATA);
        if let Some(attrs) = info.attrs.as_mut() {
            attrs.remove(0);
        }
        assert!(matches!(
            verify(&signed_data(
                DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
            )),
            Err(VerifyError::MissingAttribute(AttributeType::ContentType))
        ));

        // Wrong content type.
        let mut info = Signer::new(&signer, DATA);
        if let Some(attrs) = info.attrs.as_mut() {
            attrs[0] = attr(&oid::CONTENT_TYPE, oid(&oid::CT_TST_INFO));
        }
        assert!(matches!(
            verify(&signed_data(
                DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
            )),
            Err(VerifyError::ContentTypeMismatch { .. })
        ));

        // The first of duplicate attributes is used.
        let mut info = Signer::new(&signer, DATA);
        if let Some(attrs) = info.attrs.as_mut() {
            attrs.push(attr(&oid::CONTENT_TYPE, oid(&oid::CT_TST_INFO)));
        }
        verify(
            &signed_data(DATA, &[signer.clone()], vec![info.sign_rsa(DATA)])
        ).unwrap();
    }

    #[test]
    fn algorithm_failures() {
        let signer = signer_cert();

        // Unknown signature algorithm.
        let mut info = Signer::new(&signer, DATA);
        info.signature_algorithm = &oid::EC_PUBLIC_KEY;
        assert!(matches!(
            verify(&signed_data(
                DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
            )),
            Err(VerifyError::UnknownAlgorithm { .. })
        ));

        // Generic RSA with an unknown digest algorithm.
        let mut info = Signer::new(&signer, DATA);
        info.digest_algorithm = &oid::SECP256R1;
        assert!(matches!(
            verify(&signed_data(
                DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
            )),
            Err(VerifyError::UnknownAlgorithm { .. })
        ));

        // Combined algorithm with a digest we can’t calculate.
        let mut info = Signer::new(&signer, DATA);
        info.digest_algorithm = &oid::SECP256R1;
        info.signature_algorithm = &oid::SHA256_WITH_RSA_ENCRYPTION;
        assert!(matches!(
            verify(&signed_data(
                DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
            )),
            Err(VerifyError::UnsupportedDigestAlgorithm(_))
        ));

        // Signature made with the wrong algorithm.
        let mut info = Signer::new(&signer, DATA);
        info.digest_algorithm = &oid::SHA384;
        assert!(matches!(
            verify(&signed_data(
                DATA, &[signer.clone()], vec![info.sign_rsa(DATA)]
            )),
            Err(VerifyError::BadSignature(_))
        ));
    }

    #[test]
    fn structural_failures() {
        let signer = signer_cert();

        let data = signed_data(DATA, &[signer.clone()], Vec::new());
        assert!(matches!(verify(&data), Err(VerifyError::NoSigners)));

        let data = signed_data(
            DATA, &[], vec![Signer::new(&signer, DATA).sign_rsa(DATA)]
        );
        assert!(matches!(verify(&data), Err(VerifyError::NoCertificates)));

        // The signer certificate is missing.
        let data = signed_data(
            DATA, &[cert(include_bytes!("../test-data/tsa.der"))],
            vec![Signer::new(&signer, DATA).sign_rsa(DATA)]
        );
        assert!(matches!(
            verify(&data), Err(VerifyError::SignerNotFound(_))
        ));

        // The signer certificate has expired.
        let data = signed_data(
            DATA, &[signer.clone()],
            vec![Signer::new(&signer, DATA).sign_rsa(DATA)]
        );
        assert!(matches!(
            data.verify_with(
                &roots(),
                &VerifyOptions::new().at(
                    Time::utc(2121, 1, 1, 0, 0, 0).unwrap()
                )
            ),
            Err(VerifyError::Chain(ChainError::Expired))
        ));
        assert!(matches!(
            data.verify_with(&roots(), &VerifyOptions::new().max_chain_len(1)),
            Err(VerifyError::Chain(ChainError::TooLong))
        ));
    }

    #[test]
    fn reencode_ber_attributes() {
        // The same attribute with a non-minimal length.
        let ber = b"\x30\x81\x0f\x06\x09\x2a\x86\x48\x86\xf7\x0d\x01\x09\x03\
                    \x31\x02\x05\x00";
        let der = b"\x31\x11\x30\x0f\x06\x09\x2a\x86\x48\x86\xf7\x0d\x01\x09\
                    \x03\x31\x02\x05\x00";
        assert_eq!(
            SignedAttrs::reencode(ber).unwrap().to_vec().as_slice(),
            der.as_ref()
        );
        assert!(SignedAttrs::reencode(b"\x30\x80\x00\x00").is_err());
    }

    fn certificate_set(
        data: &[u8]
    ) -> Result<Vec<Cert>, DecodeError<Infallible>> {
        Mode::Ber.decode(data, |cons| {
            cons.take_set(SignedData::take_certificates)
        })
    }

    #[test]
    fn skip_other_certificate_choices() {
        let mut content = Vec::new();
        content.extend_from_slice(b"\xa1\x02\x05\x00");
        content.extend_from_slice(include_bytes!("../test-data/signer.der"));
        content.extend_from_slice(b"\x82\x01\x00");
        content.extend_from_slice(b"\xa3\x00");

        let mut set = vec![0x31, 0x82];
        set.extend_from_slice(&(content.len() as u16).to_be_bytes());
        set.extend_from_slice(&content);
        assert_eq!(certificate_set(&set).unwrap(), vec![signer_cert()]);

        let mut set = vec![0x31, 0x80];
        set.extend_from_slice(&content);
        set.extend_from_slice(b"\0\0");
        assert_eq!(certificate_set(&set).unwrap(), vec![signer_cert()]);

        assert_eq!(certificate_set(b"\x31\x00").unwrap(), Vec::new());
        assert!(certificate_set(b"\x31\x02\x04\x00").is_err());
    }
}
