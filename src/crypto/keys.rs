//! Types and parameters of keys.

use std::{error, fmt};
use bcder::decode;
use bcder::{BitString, Mode, OctetString, Oid, Tag};
use bcder::decode::{DecodeError, IntoSource, Source};
use bytes::Bytes;
use ring::digest;
use ring::signature::{self, UnparsedPublicKey, VerificationAlgorithm};
use crate::oid;
use crate::util::hex;
use super::signature::{Signature, SignatureAlgorithm};


//------------ PublicKeyFormat -----------------------------------------------

/// The formats of public keys we understand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PublicKeyFormat {
    /// An RSA public key.
    Rsa,

    /// An ECDSA public key for the P-256 elliptic curve.
    EcdsaP256,

    /// An ECDSA public key for the P-384 elliptic curve.
    EcdsaP384,

    /// Some other kind of key.
    ///
    /// Signatures made with these keys can never be verified.
    Other,
}

/// # ASN.1 Algorithm Identifiers
///
/// The format of the public key is identified in certificates through a
/// algorithm identifier defined with this ASN.1:
///
/// ```txt
/// AlgorithmIdentifier ::= SEQUENCE {
///      algorithm          OBJECT IDENTIFIER,
///      parameters         ANY DEFINED BY algorithm OPTIONAL }
/// ```
///
/// For RSA keys, the object identifier needs to be that of `rsaEncryption`
/// defined by [RFC 4055] and the parameters should be present and NULL.
/// We also allow them to be absent altogether.
///
/// For ECDSA keys, the object identifer needs to be `ecPublicKey` defined
/// in [RFC 5480] with the parameter being the object identifier of a named
/// curve.
///
/// All other identifiers result in [`PublicKeyFormat::Other`].
///
/// [RFC 4055]: https://tools.ietf.org/html/rfc4055
/// [RFC 5480]: https://tools.ietf.org/html/rfc5480
impl PublicKeyFormat {
    /// Takes and returns a algorithm identifier.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(Self::from_constructed)
    }

    /// Parses the algorithm identifier from the contents of its sequence.
    fn from_constructed<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        let alg = Oid::take_from(cons)?;
        if alg == oid::RSA_ENCRYPTION {
            cons.take_opt_null()?;
            Ok(PublicKeyFormat::Rsa)
        }
        else if alg == oid::EC_PUBLIC_KEY {
            let curve = Oid::take_from(cons)?;
            if curve == oid::SECP256R1 {
                Ok(PublicKeyFormat::EcdsaP256)
            }
            else if curve == oid::SECP384R1 {
                Ok(PublicKeyFormat::EcdsaP384)
            }
            else {
                Ok(PublicKeyFormat::Other)
            }
        }
        else {
            cons.skip_all()?;
            Ok(PublicKeyFormat::Other)
        }
    }

    /// Returns the ring algorithm for verifying a signature.
    fn verification_algorithm(
        self, algorithm: SignatureAlgorithm
    ) -> Option<&'static dyn VerificationAlgorithm> {
        use self::SignatureAlgorithm::*;

        match (self, algorithm) {
            (PublicKeyFormat::Rsa, RsaSha1) => {
                Some(&signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY)
            }
            (PublicKeyFormat::Rsa, RsaSha256) => {
                Some(&signature::RSA_PKCS1_2048_8192_SHA256)
            }
            (PublicKeyFormat::Rsa, RsaSha384) => {
                Some(&signature::RSA_PKCS1_2048_8192_SHA384)
            }
            (PublicKeyFormat::Rsa, RsaSha512) => {
                Some(&signature::RSA_PKCS1_2048_8192_SHA512)
            }
            (PublicKeyFormat::EcdsaP256, EcdsaSha256) => {
                Some(&signature::ECDSA_P256_SHA256_ASN1)
            }
            (PublicKeyFormat::EcdsaP256, EcdsaSha384) => {
                Some(&signature::ECDSA_P256_SHA384_ASN1)
            }
            (PublicKeyFormat::EcdsaP384, EcdsaSha256) => {
                Some(&signature::ECDSA_P384_SHA256_ASN1)
            }
            (PublicKeyFormat::EcdsaP384, EcdsaSha384) => {
                Some(&signature::ECDSA_P384_SHA384_ASN1)
            }
            _ => None
        }
    }
}


//------------ PublicKey -----------------------------------------------------

/// A public key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey {
    algorithm: PublicKeyFormat,
    bits: Bytes,
}

impl PublicKey {
    /// Returns the algorithm of this public key.
    pub fn algorithm(&self) -> PublicKeyFormat {
        self.algorithm
    }

    /// Returns the bits of this public key.
    pub fn bits(&self) -> &[u8] {
        self.bits.as_ref()
    }

    /// Returns a key identifier for this key.
    ///
    /// The identifier will be the SHA-1 hash of the key’s bits as
    /// suggested by section 4.2.1.2 of RFC 5280.
    pub fn key_identifier(&self) -> KeyIdentifier {
        KeyIdentifier(Bytes::copy_from_slice(
            digest::digest(
                &digest::SHA1_FOR_LEGACY_USE_ONLY, self.bits()
            ).as_ref()
        ))
    }

    /// Verifies a signature using this public key.
    ///
    /// Returns an error if the combination of key format and signature
    /// algorithm isn’t supported or if the signature is invalid.
    pub fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureVerificationError> {
        let params = self.algorithm.verification_algorithm(
            algorithm
        ).ok_or_else(|| {
            SignatureVerificationError::unsupported(self.algorithm, algorithm)
        })?;
        UnparsedPublicKey::new(params, self.bits()).verify(
            message, signature
        ).map_err(|_| SignatureVerificationError::invalid())
    }

    /// Verifies a signature value with its algorithm identifier.
    ///
    /// The algorithm identifier needs to be one that names both the
    /// signature scheme and the digest algorithm.
    pub fn verify_signature(
        &self,
        message: &[u8],
        signature: &Signature,
    ) -> Result<(), SignatureVerificationError> {
        let algorithm = signature.algorithm().ok_or_else(|| {
            SignatureVerificationError::unknown_algorithm()
        })?;
        self.verify(algorithm, message, signature.value())
    }
}


/// # As `SubjectPublicKeyInfo`
///
/// Public keys are included in X.509 certificates as `SubjectPublicKeyInfo`
/// structures.
///
/// ```txt
/// SubjectPublicKeyInfo  ::=  SEQUENCE  {
///      algorithm            AlgorithmIdentifier,
///      subjectPublicKey     BIT STRING  }
/// ```
impl PublicKey {
    pub fn decode<S: IntoSource>(
        source: S
    ) -> Result<Self, DecodeError<<S::Source as Source>::Error>> {
        Mode::Der.decode(source, Self::take_from)
    }

    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let algorithm = PublicKeyFormat::take_from(cons)?;
            let bits = BitString::take_from(cons)?;
            let bits = match bits.octet_slice() {
                Some(bits) => Bytes::copy_from_slice(bits),
                None => {
                    return Err(cons.content_err(
                        "public key with unused bits"
                    ))
                }
            };
            Ok(PublicKey { algorithm, bits })
        })
    }
}


//------------ KeyIdentifier -------------------------------------------------

/// A key identifier.
///
/// This is used in the subject and authority key identifier extensions of
/// certificates and to identify the signer in CMS. While it usually is the
/// 160 bit SHA-1 hash of a public key, no assumption on its length is made.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct KeyIdentifier(Bytes);

impl KeyIdentifier {
    pub fn new(value: Bytes) -> Self {
        KeyIdentifier(value)
    }

    /// Returns an octet slice of the key identifer’s value.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Takes an encoded key identifier from a constructed value.
    ///
    /// ```text
    /// KeyIdentifier ::= OCTET STRING
    /// ```
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        OctetString::take_from(cons).map(|s| KeyIdentifier(s.into_bytes()))
    }

    /// Parses an encoded key identifer from encoded content.
    pub fn from_content<S: decode::Source>(
        content: &mut decode::Content<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        OctetString::from_content(content).map(|s| {
            KeyIdentifier(s.into_bytes())
        })
    }

    /// Takes an optional key identifier implicitly tagged with `tag`.
    pub fn take_opt_value_if<S: decode::Source>(
        cons: &mut decode::Constructed<S>,
        tag: Tag,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_value_if(tag, Self::from_content)
    }
}


//--- AsRef

impl AsRef<[u8]> for KeyIdentifier {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}


//--- Display and Debug

impl fmt::Display for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::Hex(self.as_slice()))
    }
}

impl fmt::Debug for KeyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "KeyIdentifier({})", self)
    }
}


//------------ SignatureVerificationError ------------------------------------

/// An error happened while verifying a signature.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SignatureVerificationError {
    kind: VerificationErrorKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VerificationErrorKind {
    UnknownAlgorithm,
    Unsupported(PublicKeyFormat, SignatureAlgorithm),
    Invalid,
}

impl SignatureVerificationError {
    fn unsupported(
        format: PublicKeyFormat, algorithm: SignatureAlgorithm
    ) -> Self {
        SignatureVerificationError {
            kind: VerificationErrorKind::Unsupported(format, algorithm)
        }
    }

    fn unknown_algorithm() -> Self {
        SignatureVerificationError {
            kind: VerificationErrorKind::UnknownAlgorithm
        }
    }

    fn invalid() -> Self {
        SignatureVerificationError { kind: VerificationErrorKind::Invalid }
    }

    /// Returns whether the key and algorithm combination was unsupported.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.kind,
            VerificationErrorKind::UnknownAlgorithm
            | VerificationErrorKind::Unsupported(..)
        )
    }
}

impl fmt::Display for SignatureVerificationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            VerificationErrorKind::UnknownAlgorithm => {
                f.write_str("unknown signature algorithm")
            }
            VerificationErrorKind::Unsupported(format, algorithm) => {
                write!(
                    f, "unsupported signature algorithm {} for {:?} key",
                    algorithm, format
                )
            }
            VerificationErrorKind::Invalid => {
                f.write_str("signature verification failed")
            }
        }
    }
}

impl error::Error for SignatureVerificationError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use ring::rand::SystemRandom;
    use ring::signature::{EcdsaKeyPair, KeyPair, RsaKeyPair};
    use crate::cert::Cert;

    #[test]
    fn decode_keys() {
        let cert = Cert::decode(
            include_bytes!("../../test-data/root.der").as_ref()
        ).unwrap();
        assert_eq!(
            cert.subject_public_key_info().algorithm(),
            PublicKeyFormat::Rsa
        );
        let cert = Cert::decode(
            include_bytes!("../../test-data/ec-signer.der").as_ref()
        ).unwrap();
        assert_eq!(
            cert.subject_public_key_info().algorithm(),
            PublicKeyFormat::EcdsaP256
        );
        assert_eq!(
            cert.subject_public_key_info().key_identifier().as_slice().len(),
            20
        );
    }

    #[test]
    fn verify_rsa() {
        let key = RsaKeyPair::from_pkcs8(
            include_bytes!("../../test-data/signer.pk8")
        ).unwrap();
        let cert = Cert::decode(
            include_bytes!("../../test-data/signer.der").as_ref()
        ).unwrap();
        let public = cert.subject_public_key_info();
        assert_eq!(public.bits(), key.public_key().as_ref());

        let mut sig = vec![0u8; key.public().modulus_len()];
        key.sign(
            &signature::RSA_PKCS1_SHA256, &SystemRandom::new(),
            b"some message", &mut sig
        ).unwrap();
        public.verify(
            SignatureAlgorithm::RsaSha256, b"some message", &sig
        ).unwrap();
        let err = public.verify(
            SignatureAlgorithm::RsaSha256, b"other message", &sig
        ).unwrap_err();
        assert!(!err.is_unsupported());
        assert!(public.verify(
            SignatureAlgorithm::RsaSha384, b"some message", &sig
        ).is_err());
        assert!(public.verify(
            SignatureAlgorithm::EcdsaSha256, b"some message", &sig
        ).unwrap_err().is_unsupported());
    }

    #[test]
    fn verify_ecdsa() {
        let rng = SystemRandom::new();
        let key = EcdsaKeyPair::from_pkcs8(
            &signature::ECDSA_P256_SHA256_ASN1_SIGNING,
            include_bytes!("../../test-data/ec-signer.pk8"),
            &rng,
        ).unwrap();
        let cert = Cert::decode(
            include_bytes!("../../test-data/ec-signer.der").as_ref()
        ).unwrap();
        let public = cert.subject_public_key_info();
        let sig = key.sign(&rng, b"some message").unwrap();
        public.verify(
            SignatureAlgorithm::EcdsaSha256, b"some message", sig.as_ref()
        ).unwrap();
        assert!(public.verify(
            SignatureAlgorithm::EcdsaSha1, b"some message", sig.as_ref()
        ).unwrap_err().is_unsupported());
    }
}
