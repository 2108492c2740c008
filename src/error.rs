//! Errors of the trust verification of signed data.

use std::{error, fmt};
use bcder::Oid;
use bytes::Bytes;
use crate::cert::ChainError;
use crate::cms::SignerIdentifier;
use crate::crypto::SignatureVerificationError;
use crate::x509::Time;


//------------ VerifyError ---------------------------------------------------

/// Signed data failed verification.
///
/// The error describes the failure of the first signer that didn’t pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VerifyError {
    /// The signed data doesn’t have any signer infos.
    NoSigners,

    /// The signed data doesn’t contain any certificates.
    NoCertificates,

    /// The certificate of a signer is not included in the signed data.
    SignerNotFound(SignerIdentifier),

    /// There is no valid chain from a signer certificate to a trust root.
    Chain(ChainError),

    /// The digest and signature algorithms of a signer are unknown.
    UnknownAlgorithm {
        digest: Oid<Bytes>,
        signature: Oid<Bytes>,
    },

    /// The signature of a signer does not verify.
    BadSignature(SignatureVerificationError),

    /// A required signed attribute is missing.
    MissingAttribute(AttributeType),

    /// A signed attribute could not be decoded.
    MalformedAttribute(AttributeType),

    /// The content type attribute differs from the encapsulated content.
    ContentTypeMismatch {
        expected: Oid<Bytes>,
        found: Oid<Bytes>,
    },

    /// The digest algorithm of a signer is not supported.
    UnsupportedDigestAlgorithm(Oid<Bytes>),

    /// The message digest attribute doesn’t match the content.
    DigestMismatch,

    /// The signing time is outside the validity of the signer certificate.
    CertificateInactive(Time),
}

impl From<ChainError> for VerifyError {
    fn from(err: ChainError) -> Self {
        VerifyError::Chain(err)
    }
}

impl From<SignatureVerificationError> for VerifyError {
    fn from(err: SignatureVerificationError) -> Self {
        VerifyError::BadSignature(err)
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VerifyError::NoSigners => f.write_str("no signers"),
            VerifyError::NoCertificates => f.write_str("no certificates"),
            VerifyError::SignerNotFound(ref sid) => {
                write!(f, "signer certificate for {} not found", sid)
            }
            VerifyError::Chain(ref err) => {
                write!(f, "invalid certificate chain: {}", err)
            }
            VerifyError::UnknownAlgorithm { ref digest, ref signature } => {
                write!(
                    f, "unknown signature algorithm {} with digest {}",
                    signature, digest
                )
            }
            VerifyError::BadSignature(ref err) => write!(f, "{}", err),
            VerifyError::MissingAttribute(attr) => {
                write!(f, "missing {} attribute", attr)
            }
            VerifyError::MalformedAttribute(attr) => {
                write!(f, "malformed {} attribute", attr)
            }
            VerifyError::ContentTypeMismatch { ref expected, ref found } => {
                write!(
                    f, "content type mismatch: expected {}, found {}",
                    expected, found
                )
            }
            VerifyError::UnsupportedDigestAlgorithm(ref oid) => {
                write!(f, "unsupported digest algorithm {}", oid)
            }
            VerifyError::DigestMismatch => {
                f.write_str("message digest mismatch")
            }
            VerifyError::CertificateInactive(time) => {
                write!(f, "signed at {} when certificate was inactive", time)
            }
        }
    }
}

impl error::Error for VerifyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            VerifyError::Chain(ref err) => Some(err),
            VerifyError::BadSignature(ref err) => Some(err),
            _ => None
        }
    }
}


//------------ AttributeType -------------------------------------------------

/// The signed attributes checked during verification.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttributeType {
    ContentType,
    MessageDigest,
    SigningTime,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            AttributeType::ContentType => "content type",
            AttributeType::MessageDigest => "message digest",
            AttributeType::SigningTime => "signing time",
        })
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            VerifyError::MissingAttribute(
                AttributeType::MessageDigest
            ).to_string(),
            "missing message digest attribute"
        );
        assert_eq!(
            VerifyError::from(ChainError::Expired).to_string(),
            format!("invalid certificate chain: {}", ChainError::Expired)
        );
    }
}
