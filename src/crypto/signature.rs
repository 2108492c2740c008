//! Signature algorithms and operations.

use std::fmt;
use bcder::{ConstOid, Oid};
use bytes::Bytes;
use crate::oid;
use super::digest::DigestAlgorithm;


//------------ SignatureAlgorithm --------------------------------------------

/// A signature algorithm we know how to verify.
///
/// Each algorithm is the combination of a signature scheme and the digest
/// algorithm used with it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    /// RSA PKCS #1 v1.5 with SHA-1.
    RsaSha1,

    /// RSA PKCS #1 v1.5 with SHA-256.
    RsaSha256,

    /// RSA PKCS #1 v1.5 with SHA-384.
    RsaSha384,

    /// RSA PKCS #1 v1.5 with SHA-512.
    RsaSha512,

    /// ECDSA with SHA-1.
    EcdsaSha1,

    /// ECDSA with SHA-256.
    EcdsaSha256,

    /// ECDSA with SHA-384.
    EcdsaSha384,

    /// ECDSA with SHA-512.
    EcdsaSha512,
}

/// # Resolving Object Identifiers
///
/// Signatures in CMS carry two algorithm identifiers: the digest algorithm
/// of the signer and the signature algorithm. The latter can either be the
/// generic `rsaEncryption` in which case the digest algorithm decides, or
/// an identifier that names both the signature scheme and the digest
/// algorithm. In the latter case, the digest algorithm field is ignored.
///
/// X.509 objects only use combined identifiers.
impl SignatureAlgorithm {
    /// Resolves a pair of digest and signature algorithm identifiers.
    ///
    /// Returns `None` if the combination doesn’t name an algorithm we
    /// know. This must always be treated as a verification failure.
    pub fn resolve(
        digest: &Oid<impl AsRef<[u8]>>,
        signature: &Oid<impl AsRef<[u8]>>,
    ) -> Option<Self> {
        if *signature == oid::RSA_ENCRYPTION {
            DigestAlgorithm::from_oid(digest).map(Self::rsa_with)
        }
        else {
            Self::from_signature_oid(signature)
        }
    }

    /// Returns the algorithm for a combined signature algorithm identifier.
    pub fn from_signature_oid(oid: &Oid<impl AsRef<[u8]>>) -> Option<Self> {
        Self::ALL.iter().copied().find(|alg| *oid == *alg.oid())
    }

    /// Returns the RSA PKCS #1 v1.5 algorithm for the digest algorithm.
    pub fn rsa_with(digest: DigestAlgorithm) -> Self {
        match digest {
            DigestAlgorithm::Sha1 => SignatureAlgorithm::RsaSha1,
            DigestAlgorithm::Sha256 => SignatureAlgorithm::RsaSha256,
            DigestAlgorithm::Sha384 => SignatureAlgorithm::RsaSha384,
            DigestAlgorithm::Sha512 => SignatureAlgorithm::RsaSha512,
        }
    }

    /// Returns the combined object identifier for the algorithm.
    pub fn oid(self) -> &'static ConstOid {
        match self {
            SignatureAlgorithm::RsaSha1 => &oid::SHA1_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::RsaSha256 => &oid::SHA256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::RsaSha384 => &oid::SHA384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::RsaSha512 => &oid::SHA512_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::EcdsaSha1 => &oid::ECDSA_WITH_SHA1,
            SignatureAlgorithm::EcdsaSha256 => &oid::ECDSA_WITH_SHA256,
            SignatureAlgorithm::EcdsaSha384 => &oid::ECDSA_WITH_SHA384,
            SignatureAlgorithm::EcdsaSha512 => &oid::ECDSA_WITH_SHA512,
        }
    }

    const ALL: [Self; 8] = [
        SignatureAlgorithm::RsaSha1, SignatureAlgorithm::RsaSha256,
        SignatureAlgorithm::RsaSha384, SignatureAlgorithm::RsaSha512,
        SignatureAlgorithm::EcdsaSha1, SignatureAlgorithm::EcdsaSha256,
        SignatureAlgorithm::EcdsaSha384, SignatureAlgorithm::EcdsaSha512,
    ];
}

/// # Properties
///
impl SignatureAlgorithm {
    /// Returns the digest algorithm used by the signature algorithm.
    pub fn digest_algorithm(self) -> DigestAlgorithm {
        match self {
            SignatureAlgorithm::RsaSha1 | SignatureAlgorithm::EcdsaSha1 => {
                DigestAlgorithm::Sha1
            }
            SignatureAlgorithm::RsaSha256
            | SignatureAlgorithm::EcdsaSha256 => DigestAlgorithm::Sha256,
            SignatureAlgorithm::RsaSha384
            | SignatureAlgorithm::EcdsaSha384 => DigestAlgorithm::Sha384,
            SignatureAlgorithm::RsaSha512
            | SignatureAlgorithm::EcdsaSha512 => DigestAlgorithm::Sha512,
        }
    }

    pub fn is_rsa(self) -> bool {
        matches!(
            self,
            SignatureAlgorithm::RsaSha1 | SignatureAlgorithm::RsaSha256
            | SignatureAlgorithm::RsaSha384 | SignatureAlgorithm::RsaSha512
        )
    }

    pub fn is_ecdsa(self) -> bool {
        !self.is_rsa()
    }
}


//--- Display

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f, "{} with {}",
            if self.is_rsa() { "RSA" } else { "ECDSA" },
            self.digest_algorithm()
        )
    }
}


//------------ Signature -----------------------------------------------------

/// A signature value together with the identifier of its algorithm.
///
/// The algorithm is kept as the raw object identifier so that objects
/// signed with algorithms we don’t know can still be parsed. Such
/// signatures simply fail verification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    algorithm: Oid<Bytes>,
    value: Bytes,
}

impl Signature {
    pub fn new(algorithm: Oid<Bytes>, value: Bytes) -> Self {
        Signature { algorithm, value }
    }

    /// Returns the object identifier of the signature algorithm.
    pub fn algorithm_oid(&self) -> &Oid<Bytes> {
        &self.algorithm
    }

    /// Returns the signature algorithm if it is one we know.
    pub fn algorithm(&self) -> Option<SignatureAlgorithm> {
        SignatureAlgorithm::from_signature_oid(&self.algorithm)
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resolve_generic_rsa() {
        assert_eq!(
            SignatureAlgorithm::resolve(&oid::SHA256, &oid::RSA_ENCRYPTION),
            Some(SignatureAlgorithm::RsaSha256)
        );
        assert_eq!(
            SignatureAlgorithm::resolve(&oid::SHA1, &oid::RSA_ENCRYPTION),
            Some(SignatureAlgorithm::RsaSha1)
        );
        assert_eq!(
            SignatureAlgorithm::resolve(&oid::SHA384, &oid::RSA_ENCRYPTION),
            Some(SignatureAlgorithm::RsaSha384)
        );
        assert_eq!(
            SignatureAlgorithm::resolve(&oid::SHA512, &oid::RSA_ENCRYPTION),
            Some(SignatureAlgorithm::RsaSha512)
        );
        // Generic RSA needs a digest we know.
        assert_eq!(
            SignatureAlgorithm::resolve(
                &oid::SECP256R1, &oid::RSA_ENCRYPTION
            ),
            None
        );
    }

    #[test]
    fn resolve_combined_ignores_digest() {
        assert_eq!(
            SignatureAlgorithm::resolve(&oid::SHA1, &oid::ECDSA_WITH_SHA384),
            Some(SignatureAlgorithm::EcdsaSha384)
        );
        assert_eq!(
            SignatureAlgorithm::resolve(
                &oid::SHA512, &oid::SHA256_WITH_RSA_ENCRYPTION
            ),
            Some(SignatureAlgorithm::RsaSha256)
        );
        assert_eq!(
            SignatureAlgorithm::resolve(
                &oid::SECP384R1, &oid::ECDSA_WITH_SHA1
            ),
            Some(SignatureAlgorithm::EcdsaSha1)
        );
        for alg in SignatureAlgorithm::ALL {
            assert_eq!(
                SignatureAlgorithm::resolve(&oid::SHA256, alg.oid()),
                Some(alg)
            );
        }
    }

    #[test]
    fn resolve_unknown() {
        assert_eq!(
            SignatureAlgorithm::resolve(&oid::SHA256, &oid::EC_PUBLIC_KEY),
            None
        );
        assert_eq!(
            SignatureAlgorithm::resolve(&oid::SHA256, &oid::SHA256),
            None
        );
        // rsassa-pss
        let pss = Oid(&[42u8, 134, 72, 134, 247, 13, 1, 1, 10][..]);
        assert_eq!(SignatureAlgorithm::resolve(&oid::SHA256, &pss), None);
    }

    #[test]
    fn digest_algorithms() {
        assert_eq!(
            SignatureAlgorithm::EcdsaSha384.digest_algorithm(),
            DigestAlgorithm::Sha384
        );
        assert!(SignatureAlgorithm::RsaSha1.is_rsa());
        assert!(SignatureAlgorithm::EcdsaSha512.is_ecdsa());
        assert_eq!(
            SignatureAlgorithm::RsaSha256.to_string(), "RSA with SHA-256"
        );
    }
}
