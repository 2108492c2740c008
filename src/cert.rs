//! X.509 certificates and certificate chains.
//!
//! This module implements parsing of general Internet PKI certificates as
//! defined in [RFC 5280] in the type [`Cert`]. Only the parts needed for
//! building and checking certificate chains are interpreted. All other
//! parts are only checked for being well-formed.
//!
//! The set of certificates trusted by a user is represented by
//! [`TrustRoots`]. The function [`verify_chain`] tries to find a path from
//! a certificate to one of those roots.
//!
//! [RFC 5280]: https://tools.ietf.org/html/rfc5280

use std::{error, fmt, ops, slice};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::convert::Infallible;
use bcder::{decode, encode};
use bcder::{BitString, Captured, Mode, OctetString, Oid, Tag};
use bcder::decode::{ContentError, DecodeError, IntoSource, Source};
use bytes::Bytes;
use log::debug;
use crate::{asn1, oid};
use crate::crypto::{KeyIdentifier, PublicKey, SignatureVerificationError};
use crate::util::base64::{Pem, PemError};
use crate::x509::{
    Name, SignedData, Serial, Time, Validity, ValidityPeriodError,
    take_algorithm_oid,
};


//------------ Cert ----------------------------------------------------------

/// An X.509 certificate.
///
/// If a certificate is stored in a file, you can use the [`decode`][Self::decode]
/// function to parse the entire file. If the certificate is part of some
/// other structure, the [`take_from`][Self::take_from] function can be used
/// during parsing of that structure.
///
/// The certificate dereferences into its [`TbsCert`] which provides
/// access to the content of the certificate.
#[derive(Clone, Debug)]
pub struct Cert {
    /// The complete encoding of the certificate.
    ///
    /// This is always DER encoded even if the certificate was part of a
    /// BER encoded structure. Certificates are compared by it.
    encoded: Bytes,

    /// The outer structure of the certificate.
    signed_data: SignedData,

    /// The actual data of the certificate.
    tbs: TbsCert,
}

/// # Decoding
///
impl Cert {
    /// Decodes a source as a certificate.
    pub fn decode<S: IntoSource>(
        source: S,
    ) -> Result<Self, DecodeError<<S::Source as Source>::Error>> {
        Mode::Der.decode(source, Self::take_from)
    }

    /// Takes an encoded certificate from the beginning of a value.
    ///
    /// This function assumes that the certificate is encoded in the next
    /// constructed value in `cons` tagged as a sequence.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(Self::from_constructed)
    }

    /// Takes an optional certificate from the beginning of a value.
    pub fn take_opt_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(Self::from_constructed)
    }

    /// Parses the content of a Certificate sequence.
    ///
    /// The content may be BER encoded. It is converted into DER before
    /// the certificate is parsed.
    pub fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let content = cons.capture_all()?;
        // A captured value can always be written in BER mode.
        let encoded = Captured::from_values(
            Mode::Ber, encode::sequence(&content)
        );
        let der = match asn1::convert_to_der(encoded.as_slice()) {
            Ok(der) => Bytes::from(der),
            Err(err) => {
                return Err(cons.content_err(
                    ContentError::from_boxed(Box::new(err))
                ))
            }
        };
        Self::from_der(der).map_err(DecodeError::convert)
    }

    /// Parses a complete DER encoded certificate.
    fn from_der(der: Bytes) -> Result<Self, DecodeError<Infallible>> {
        let (signed_data, tbs) = Mode::Der.decode(der.clone(), |cons| {
            cons.take_sequence(|cons| {
                let signed_data = SignedData::from_constructed(cons)?;
                let tbs = signed_data.data().clone().decode(
                    TbsCert::from_constructed
                )?;
                Ok((signed_data, tbs))
            })
        })?;
        Ok(Cert { encoded: der, signed_data, tbs })
    }

    /// Returns the complete DER encoding of the certificate.
    pub fn as_slice(&self) -> &[u8] {
        self.encoded.as_ref()
    }

    /// Returns the signature algorithm and value of the certificate.
    pub fn signed_data(&self) -> &SignedData {
        &self.signed_data
    }
}


/// # Verification
///
impl Cert {
    /// Verifies that the certificate is valid at the given time.
    pub fn verify_validity(
        &self, now: Time
    ) -> Result<(), ValidityPeriodError> {
        self.tbs.validity.verify_at(now)
    }

    /// Verifies the certificate’s signature with the given key.
    ///
    /// The algorithm stated in the signature is used. The algorithm in the
    /// signed part of the certificate is not considered.
    pub fn verify_signature(
        &self,
        issuer_key: &PublicKey,
    ) -> Result<(), SignatureVerificationError> {
        self.signed_data.verify_signature(issuer_key)
    }

    /// Returns whether the certificate claims to be issued by itself.
    pub fn is_self_issued(&self) -> bool {
        self.tbs.subject == self.tbs.issuer
    }
}


//--- Deref, AsRef

impl ops::Deref for Cert {
    type Target = TbsCert;

    fn deref(&self) -> &Self::Target {
        &self.tbs
    }
}

impl AsRef<TbsCert> for Cert {
    fn as_ref(&self) -> &TbsCert {
        &self.tbs
    }
}


//--- PartialEq and Eq

impl PartialEq for Cert {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Cert { }


//------------ TbsCert -------------------------------------------------------

/// The data of a certificate.
///
/// ```txt
/// TBSCertificate  ::=  SEQUENCE  {
///      version         [0]  EXPLICIT Version DEFAULT v1,
///      serialNumber         CertificateSerialNumber,
///      signature            AlgorithmIdentifier,
///      issuer               Name,
///      validity             Validity,
///      subject              Name,
///      subjectPublicKeyInfo SubjectPublicKeyInfo,
///      issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
///      subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
///      extensions      [3]  EXPLICIT Extensions OPTIONAL }
/// ```
#[derive(Clone, Debug)]
pub struct TbsCert {
    /// The version number as encoded, i.e., 0 for v1 and 2 for v3.
    version: u8,

    serial_number: Serial,

    /// The signature algorithm identifier given inside the signed data.
    signature: Oid<Bytes>,

    issuer: Name,
    validity: Validity,
    subject: Name,
    subject_public_key_info: PublicKey,

    //--- Extensions

    basic_constraints: Option<BasicConstraints>,
    key_usage: Option<KeyUsage>,
    extended_key_usage: Option<ExtendedKeyUsage>,
    subject_key_identifier: Option<KeyIdentifier>,
    authority_key_identifier: Option<KeyIdentifier>,

    /// Critical extensions we don’t know how to handle.
    unhandled_critical: Vec<Oid<Bytes>>,
}

/// # Data Access
///
impl TbsCert {
    /// Returns the X.509 version of the certificate, i.e., 1, 2, or 3.
    pub fn version(&self) -> u8 {
        self.version + 1
    }

    pub fn serial_number(&self) -> &Serial {
        &self.serial_number
    }

    /// Returns the signature algorithm from the signed data.
    pub fn signature_algorithm(&self) -> &Oid<Bytes> {
        &self.signature
    }

    pub fn issuer(&self) -> &Name {
        &self.issuer
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    pub fn subject(&self) -> &Name {
        &self.subject
    }

    pub fn subject_public_key_info(&self) -> &PublicKey {
        &self.subject_public_key_info
    }

    pub fn basic_constraints(&self) -> Option<BasicConstraints> {
        self.basic_constraints
    }

    /// Returns whether the basic constraints mark this as a CA certificate.
    pub fn is_ca(&self) -> bool {
        self.basic_constraints.map(|bc| bc.is_ca()).unwrap_or(false)
    }

    pub fn key_usage(&self) -> Option<KeyUsage> {
        self.key_usage
    }

    pub fn extended_key_usage(&self) -> Option<&ExtendedKeyUsage> {
        self.extended_key_usage.as_ref()
    }

    pub fn subject_key_identifier(&self) -> Option<&KeyIdentifier> {
        self.subject_key_identifier.as_ref()
    }

    pub fn authority_key_identifier(&self) -> Option<&KeyIdentifier> {
        self.authority_key_identifier.as_ref()
    }

    /// Returns the critical extensions that weren’t understood.
    ///
    /// A certificate with such extensions must not be accepted as part of
    /// a certificate chain.
    pub fn unhandled_critical_extensions(&self) -> &[Oid<Bytes>] {
        &self.unhandled_critical
    }
}

/// # Decoding
///
impl TbsCert {
    /// Parses the content of a TBSCertificate sequence.
    pub fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = cons.take_opt_constructed_if(
                Tag::CTX_0, |c| c.take_u8()
            )?.unwrap_or(0);
            if version > 2 {
                return Err(cons.content_err("invalid certificate version"))
            }

            let serial_number = Serial::take_from(cons)?;
            let signature = take_algorithm_oid(cons)?;
            let issuer = Name::take_from(cons)?;
            let validity = Validity::take_from(cons)?;
            let subject = Name::take_from(cons)?;
            let subject_public_key_info = PublicKey::take_from(cons)?;

            // issuerUniqueID and subjectUniqueID. We don’t need them.
            cons.take_opt_value_if(Tag::CTX_1, |content| {
                content.as_primitive()?.skip_all()
            })?;
            cons.take_opt_value_if(Tag::CTX_2, |content| {
                content.as_primitive()?.skip_all()
            })?;

            let mut res = TbsCert {
                version,
                serial_number,
                signature,
                issuer,
                validity,
                subject,
                subject_public_key_info,
                basic_constraints: None,
                key_usage: None,
                extended_key_usage: None,
                subject_key_identifier: None,
                authority_key_identifier: None,
                unhandled_critical: Vec::new(),
            };
            cons.take_opt_constructed_if(Tag::CTX_3, |c| {
                c.take_sequence(|cons| res.take_extensions(cons))
            })?;
            Ok(res)
        })
    }

    /// Parses the content of the Extensions sequence.
    ///
    /// ```txt
    /// Extension  ::=  SEQUENCE  {
    ///      extnID      OBJECT IDENTIFIER,
    ///      critical    BOOLEAN DEFAULT FALSE,
    ///      extnValue   OCTET STRING }
    /// ```
    ///
    /// A certificate must not contain the same extension twice.
    fn take_extensions<S: decode::Source>(
        &mut self,
        cons: &mut decode::Constructed<S>,
    ) -> Result<(), DecodeError<S::Error>> {
        let mut seen: Vec<Oid<Bytes>> = Vec::new();
        while let Some(()) = cons.take_opt_sequence(|cons| {
            let id = Oid::take_from(cons)?;
            let critical = cons.take_opt_bool()?.unwrap_or(false);
            let value = OctetString::take_from(cons)?;
            if seen.contains(&id) {
                return Err(cons.content_err("duplicate extension"))
            }
            Mode::Der.decode(value, |content| {
                if id == oid::CE_BASIC_CONSTRAINTS {
                    self.basic_constraints = Some(
                        BasicConstraints::take_from(content)?
                    );
                }
                else if id == oid::CE_KEY_USAGE {
                    self.key_usage = Some(KeyUsage::take_from(content)?);
                }
                else if id == oid::CE_EXTENDED_KEY_USAGE {
                    self.extended_key_usage = Some(
                        ExtendedKeyUsage::take_from(content)?
                    );
                }
                else if id == oid::CE_SUBJECT_KEY_IDENTIFIER {
                    self.subject_key_identifier = Some(
                        KeyIdentifier::take_from(content)?
                    );
                }
                else if id == oid::CE_AUTHORITY_KEY_IDENTIFIER {
                    self.authority_key_identifier =
                        Self::take_authority_key_identifier(content)?;
                }
                else if id == oid::CE_SUBJECT_ALT_NAME
                    || id == oid::CE_CERTIFICATE_POLICIES
                {
                    // Known but not relevant for chain building.
                    content.skip_all()?;
                }
                else {
                    if critical {
                        self.unhandled_critical.push(id.clone());
                    }
                    content.skip_all()?;
                }
                Ok(())
            }).map_err(DecodeError::convert)?;
            seen.push(id);
            Ok(())
        })? { }
        Ok(())
    }

    /// Parses the Authority Key Identifier extension.
    ///
    /// ```text
    /// AuthorityKeyIdentifier ::= SEQUENCE {
    ///   keyIdentifier             [0] KeyIdentifier           OPTIONAL,
    ///   authorityCertIssuer       [1] GeneralNames            OPTIONAL,
    ///   authorityCertSerialNumber [2] CertificateSerialNumber OPTIONAL  }
    /// ```
    ///
    /// Only the key identifier is of interest.
    fn take_authority_key_identifier<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
    ) -> Result<Option<KeyIdentifier>, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let res = KeyIdentifier::take_opt_value_if(cons, Tag::CTX_0)?;
            cons.skip_all()?;
            Ok(res)
        })
    }
}


//------------ BasicConstraints ----------------------------------------------

/// The content of the Basic Constraints extension.
///
/// ```text
/// BasicConstraints        ::= SEQUENCE {
///     cA                      BOOLEAN DEFAULT FALSE,
///     pathLenConstraint       INTEGER (0..MAX) OPTIONAL
/// }
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BasicConstraints {
    ca: bool,
    path_len: Option<u64>,
}

impl BasicConstraints {
    pub fn is_ca(self) -> bool {
        self.ca
    }

    /// Returns the maximum number of intermediate certificates below.
    pub fn path_len(self) -> Option<u64> {
        self.path_len
    }

    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            Ok(BasicConstraints {
                ca: cons.take_opt_bool()?.unwrap_or(false),
                path_len: cons.take_opt_u64()?,
            })
        })
    }
}


//------------ KeyUsage ------------------------------------------------------

/// The content of the Key Usage extension.
///
/// ```text
/// KeyUsage ::= BIT STRING {
///      digitalSignature        (0),
///      nonRepudiation          (1),
///      keyEncipherment         (2),
///      dataEncipherment        (3),
///      keyAgreement            (4),
///      keyCertSign             (5),
///      cRLSign                 (6),
///      encipherOnly            (7),
///      decipherOnly            (8) }
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyUsage(u16);

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: usize = 0;
    pub const NON_REPUDIATION: usize = 1;
    pub const KEY_ENCIPHERMENT: usize = 2;
    pub const DATA_ENCIPHERMENT: usize = 3;
    pub const KEY_AGREEMENT: usize = 4;
    pub const KEY_CERT_SIGN: usize = 5;
    pub const CRL_SIGN: usize = 6;
    pub const ENCIPHER_ONLY: usize = 7;
    pub const DECIPHER_ONLY: usize = 8;

    /// Returns whether the given bit is set.
    pub fn bit(self, bit: usize) -> bool {
        bit < 16 && self.0 & (1 << bit) != 0
    }

    pub fn key_cert_sign(self) -> bool {
        self.bit(Self::KEY_CERT_SIGN)
    }

    pub fn digital_signature(self) -> bool {
        self.bit(Self::DIGITAL_SIGNATURE)
    }

    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let bits = BitString::take_from(cons)?;
        let mut res = 0u16;
        for bit in 0..=Self::DECIPHER_ONLY {
            if bits.bit(bit) {
                res |= 1 << bit
            }
        }
        Ok(KeyUsage(res))
    }
}


//------------ ExtendedKeyUsage ----------------------------------------------

/// The content of the Extended Key Usage extension.
///
/// ```text
/// ExtKeyUsageSyntax ::= SEQUENCE SIZE (1..MAX) OF KeyPurposeId
/// KeyPurposeId ::= OBJECT IDENTIFIER
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtendedKeyUsage(Vec<Oid<Bytes>>);

impl ExtendedKeyUsage {
    fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut res = Vec::new();
            while let Some(oid) = Oid::take_opt_from(cons)? {
                res.push(oid);
            }
            if res.is_empty() {
                Err(cons.content_err(
                    "empty Extended key Usage extension"
                ))
            }
            else {
                Ok(ExtendedKeyUsage(res))
            }
        })
    }

    /// Returns whether the given key purpose is included.
    pub fn contains(&self, purpose: &Oid<impl AsRef<[u8]>>) -> bool {
        self.0.iter().any(|item| item == purpose)
    }

    /// Returns whether the key may be used for time stamping.
    pub fn has_time_stamping(&self) -> bool {
        self.0.iter().any(|item| *item == oid::KP_TIME_STAMPING)
    }

    pub fn iter(&self) -> slice::Iter<Oid<Bytes>> {
        self.0.iter()
    }
}


//------------ TrustRoots ----------------------------------------------------

/// The set of certificates trusted as the end of a certificate chain.
///
/// The set is created once and then only read during verification.
#[derive(Clone, Debug, Default)]
pub struct TrustRoots {
    certs: Vec<Cert>,
}

impl TrustRoots {
    /// Creates a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from a single DER encoded certificate.
    pub fn from_der(
        der: &[u8]
    ) -> Result<Self, DecodeError<Infallible>> {
        let mut res = Self::new();
        res.add(Cert::decode(der)?);
        Ok(res)
    }

    /// Creates a set from all certificates in a PEM file.
    ///
    /// Blocks other than `CERTIFICATE` blocks are ignored.
    pub fn from_pem(pem: &[u8]) -> Result<Self, TrustRootsError> {
        let mut res = Self::new();
        for der in Pem.decode_blocks(pem, "CERTIFICATE")? {
            res.add(Cert::decode(Bytes::from(der))?);
        }
        Ok(res)
    }

    /// Adds a certificate to the set.
    ///
    /// If an identical certificate is already present, nothing happens.
    pub fn add(&mut self, cert: Cert) {
        if !self.contains(&cert) {
            self.certs.push(cert)
        }
    }

    /// Returns whether an identical certificate is part of the set.
    pub fn contains(&self, cert: &Cert) -> bool {
        self.certs.iter().any(|item| item == cert)
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<Cert> {
        self.certs.iter()
    }
}

impl<'a> IntoIterator for &'a TrustRoots {
    type Item = &'a Cert;
    type IntoIter = slice::Iter<'a, Cert>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Cert> for TrustRoots {
    fn from_iter<I: IntoIterator<Item = Cert>>(iter: I) -> Self {
        let mut res = Self::new();
        iter.into_iter().for_each(|cert| res.add(cert));
        res
    }
}


//------------ verify_chain --------------------------------------------------

/// The default for the maximum number of certificates in a chain.
pub const DEFAULT_MAX_CHAIN_LEN: usize = 8;

/// Finds and verifies a certificate chain from `leaf` to one of `roots`.
///
/// Intermediate certificates are taken from `intermediates` which may
/// contain unrelated certificates. Every certificate in the chain must be
/// valid at `now`. Chains longer than `max_len` certificates are not
/// considered. Extended key usage is not restricted.
///
/// On success, returns the chain starting with the leaf and ending with
/// the root.
pub fn verify_chain<'a>(
    leaf: &'a Cert,
    intermediates: &'a [Cert],
    roots: &'a TrustRoots,
    now: Time,
    max_len: usize,
) -> Result<Vec<&'a Cert>, ChainError> {
    let mut path = vec![leaf];
    ChainBuilder::new(intermediates, roots, now, max_len).build(&mut path)?;
    Ok(path)
}

/// The maximum number of issuer candidates checked for a single chain.
///
/// Certificates sharing subject and key can be combined into a large
/// number of paths. The search gives up once this many candidates have
/// been tried.
pub const MAX_SIGNATURE_CHECKS: usize = 100;

/// The state of a depth-first search for a certificate chain.
struct ChainBuilder<'a> {
    intermediates: &'a [Cert],
    roots: &'a TrustRoots,
    now: Time,
    max_len: usize,

    /// The number of issuer candidates checked so far.
    checks: Cell<usize>,

    /// The outcome of signature checks keyed by certificate and issuer.
    signatures: RefCell<HashMap<
        (*const Cert, *const Cert),
        Result<(), SignatureVerificationError>
    >>,
}

impl<'a> ChainBuilder<'a> {
    fn new(
        intermediates: &'a [Cert],
        roots: &'a TrustRoots,
        now: Time,
        max_len: usize,
    ) -> Self {
        ChainBuilder {
            intermediates, roots, now, max_len,
            checks: Cell::new(0),
            signatures: RefCell::new(HashMap::new()),
        }
    }

    /// Tries to complete the chain that ends with the last cert in `path`.
    ///
    /// Upon failure, `path` is left as it was.
    fn build(&self, path: &mut Vec<&'a Cert>) -> Result<(), ChainError> {
        let cert = match path.last() {
            Some(cert) => *cert,
            None => return Err(ChainError::UnknownAuthority(None)),
        };
        if let Err(err) = cert.verify_validity(self.now) {
            return Err(
                if err.is_too_new() { ChainError::NotYetValid }
                else { ChainError::Expired }
            )
        }
        if let Some(id) = cert.unhandled_critical_extensions().first() {
            return Err(ChainError::UnhandledCriticalExtension(id.clone()))
        }
        if self.roots.contains(cert) {
            debug!("Chain ends at trusted root {}.", cert.subject());
            return Ok(())
        }
        if path.len() >= self.max_len {
            return Err(ChainError::TooLong)
        }

        let mut last_err = None;
        let candidates = self.roots.iter().map(|cert| (cert, true)).chain(
            self.intermediates.iter().map(|cert| (cert, false))
        );
        for (issuer, is_root) in candidates {
            if issuer.subject() != cert.issuer()
                || path.iter().any(|item| *item == issuer)
            {
                continue
            }
            let checks = self.checks.get() + 1;
            if checks > MAX_SIGNATURE_CHECKS {
                return Err(ChainError::TooManyChecks)
            }
            self.checks.set(checks);
            debug!(
                "Trying issuer {} serial {} for {}.",
                issuer.subject(), issuer.serial_number(), cert.subject()
            );
            let res = self.check_issuer(
                cert, issuer, is_root, path.len()
            ).and_then(|_| {
                path.push(issuer);
                let res = self.build(path);
                if res.is_err() {
                    path.pop();
                }
                res
            });
            match res {
                Ok(()) => return Ok(()),
                Err(ChainError::TooManyChecks) => {
                    return Err(ChainError::TooManyChecks)
                }
                Err(err) => {
                    debug!("Issuer candidate rejected: {}", err);
                    last_err = Some(Box::new(err));
                }
            }
        }
        Err(ChainError::UnknownAuthority(last_err))
    }

    /// Checks that `issuer` may have issued `cert`.
    ///
    /// The `below` argument contains the number of certificates in the
    /// path up to and including `cert`.
    fn check_issuer(
        &self,
        cert: &Cert,
        issuer: &Cert,
        is_root: bool,
        below: usize,
    ) -> Result<(), ChainError> {
        // Old v1 certificates have no extensions. We accept them as CAs
        // only if they are trusted directly.
        if !issuer.is_ca() && !(is_root && issuer.version() == 1) {
            return Err(ChainError::NotCa)
        }
        if let Some(key_usage) = issuer.key_usage() {
            if !key_usage.key_cert_sign() {
                return Err(ChainError::KeyUsage)
            }
        }
        if let Some(max) = issuer.basic_constraints().and_then(|bc| {
            bc.path_len()
        }) {
            // The leaf doesn’t count.
            if (below as u64) - 1 > max {
                return Err(ChainError::PathLength)
            }
        }
        self.signatures.borrow_mut().entry(
            (cert as *const Cert, issuer as *const Cert)
        ).or_insert_with(|| {
            cert.verify_signature(issuer.subject_public_key_info())
        }).clone().map_err(ChainError::BadSignature)
    }

    /// Returns the number of issuer candidates checked so far.
    #[cfg(test)]
    fn checks(&self) -> usize {
        self.checks.get()
    }
}


//============ Error Types ===================================================

//------------ ChainError ----------------------------------------------------

/// No valid certificate chain could be found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChainError {
    /// No issuer certificate leading to a trusted root was found.
    ///
    /// If candidates for the issuer existed, contains the reason the last
    /// one of them was rejected.
    UnknownAuthority(Option<Box<ChainError>>),

    /// A certificate of the chain has expired.
    Expired,

    /// A certificate of the chain is not yet valid.
    NotYetValid,

    /// An issuing certificate is not a CA certificate.
    NotCa,

    /// An issuing certificate is not allowed to sign certificates.
    KeyUsage,

    /// The path length constraint of an issuing certificate was violated.
    PathLength,

    /// A certificate contains a critical extension we don’t know.
    UnhandledCriticalExtension(Oid<Bytes>),

    /// The signature of a certificate is invalid.
    BadSignature(SignatureVerificationError),

    /// The chain became longer than allowed.
    TooLong,

    /// Too many issuer candidates had to be checked.
    TooManyChecks,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ChainError::UnknownAuthority(None) => {
                f.write_str("certificate signed by unknown authority")
            }
            ChainError::UnknownAuthority(Some(ref err)) => {
                write!(
                    f, "certificate signed by unknown authority \
                        (possibly because of: {})",
                    err
                )
            }
            ChainError::Expired => f.write_str("certificate has expired"),
            ChainError::NotYetValid => {
                f.write_str("certificate is not yet valid")
            }
            ChainError::NotCa => {
                f.write_str("issuer is not a CA certificate")
            }
            ChainError::KeyUsage => {
                f.write_str("issuer key usage doesn't permit certificate signing")
            }
            ChainError::PathLength => {
                f.write_str("path length constraint violated")
            }
            ChainError::UnhandledCriticalExtension(ref oid) => {
                write!(f, "unhandled critical extension {}", oid)
            }
            ChainError::BadSignature(ref err) => {
                write!(f, "bad certificate signature: {}", err)
            }
            ChainError::TooLong => {
                f.write_str("certificate chain too long")
            }
            ChainError::TooManyChecks => {
                f.write_str(
                    "too many issuer candidates checked for certificate chain"
                )
            }
        }
    }
}

impl error::Error for ChainError { }


//------------ TrustRootsError -----------------------------------------------

/// Reading trust roots from a PEM file failed.
#[derive(Debug)]
pub enum TrustRootsError {
    Pem(PemError),
    Decode(DecodeError<Infallible>),
}

impl From<PemError> for TrustRootsError {
    fn from(err: PemError) -> Self {
        TrustRootsError::Pem(err)
    }
}

impl From<DecodeError<Infallible>> for TrustRootsError {
    fn from(err: DecodeError<Infallible>) -> Self {
        TrustRootsError::Decode(err)
    }
}

impl fmt::Display for TrustRootsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TrustRootsError::Pem(ref err) => write!(f, "{}", err),
            TrustRootsError::Decode(ref err) => {
                write!(f, "invalid root certificate: {}", err)
            }
        }
    }
}

impl error::Error for TrustRootsError { }


//============ Tests =========================================================
