//! Digest algorithm and operations.

use std::{fmt, io};
use bcder::{decode, encode};
use bcder::{ConstOid, Oid};
use bcder::decode::DecodeError;
use bcder::encode::PrimitiveContent;
use ring::digest;
use crate::oid;

// Re-export the things from ring for actual digest generation.
pub use ring::digest::Digest;


//------------ DigestAlgorithm -----------------------------------------------

/// The digest algorithms we can calculate.
///
/// These are the algorithms that can be used in message imprints of
/// time-stamp requests and in the message digest attribute of CMS signers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DigestAlgorithm {
    /// SHA-1.
    ///
    /// This is considered broken and is only supported for checking old
    /// signatures.
    Sha1,

    Sha256,
    Sha384,
    Sha512,
}

/// # Creating Digest Values
///
impl DigestAlgorithm {
    /// Returns the digest of `data` using this algorithm.
    pub fn digest(self, data: &[u8]) -> Digest {
        digest::digest(self.ring_algorithm(), data)
    }

    /// Returns a digest context for multi-step calculation of the digest.
    pub fn start(self) -> Context {
        Context(digest::Context::new(self.ring_algorithm()))
    }

    /// Returns the length of the digest value in octets.
    pub fn output_len(self) -> usize {
        self.ring_algorithm().output_len()
    }

    fn ring_algorithm(self) -> &'static digest::Algorithm {
        match self {
            DigestAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            DigestAlgorithm::Sha256 => &digest::SHA256,
            DigestAlgorithm::Sha384 => &digest::SHA384,
            DigestAlgorithm::Sha512 => &digest::SHA512,
        }
    }
}


/// # Object Identifiers
///
impl DigestAlgorithm {
    /// Returns the algorithm for the given object identifier.
    ///
    /// Returns `None` if the identifier is for an algorithm we don’t know.
    pub fn from_oid(oid: &Oid<impl AsRef<[u8]>>) -> Option<Self> {
        if *oid == oid::SHA1 {
            Some(DigestAlgorithm::Sha1)
        }
        else if *oid == oid::SHA256 {
            Some(DigestAlgorithm::Sha256)
        }
        else if *oid == oid::SHA384 {
            Some(DigestAlgorithm::Sha384)
        }
        else if *oid == oid::SHA512 {
            Some(DigestAlgorithm::Sha512)
        }
        else {
            None
        }
    }

    /// Returns the object identifier of the algorithm.
    pub fn oid(self) -> &'static ConstOid {
        match self {
            DigestAlgorithm::Sha1 => &oid::SHA1,
            DigestAlgorithm::Sha256 => &oid::SHA256,
            DigestAlgorithm::Sha384 => &oid::SHA384,
            DigestAlgorithm::Sha512 => &oid::SHA512,
        }
    }
}


/// # ASN.1 Values
///
/// Digest algorithms appear in CMS and in time-stamp requests as algorithm
/// identifiers:
///
/// ```txt
/// DigestAlgorithmIdentifier  ::= AlgorithmIdentifier
/// AlgorithmIdentifier        ::= SEQUENCE {
///      algorithm                 OBJECT IDENTIFIER,
///      parameters                ANY DEFINED BY algorithm OPTIONAL }
/// ```
///
/// For the SHA family, the _parameters_ field is either absent or `NULL`.
impl DigestAlgorithm {
    /// Takes and returns a single digest algorithm identifier.
    ///
    /// Returns a content error if the algorithm isn’t one we know.
    pub fn take_from<S: decode::Source>(
        cons: &mut decode::Constructed<S>
    ) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let oid = Oid::take_from(cons)?;
            cons.take_opt_null()?;
            Self::from_oid(&oid).ok_or_else(|| {
                cons.content_err("unsupported digest algorithm")
            })
        })
    }

    /// Provides an encoder for a single algorithm identifier.
    ///
    /// The parameters are always included as `NULL`.
    pub fn encode(self) -> impl encode::Values {
        encode::sequence((
            self.oid().encode(),
            ().encode(),
        ))
    }
}


//--- Display

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        })
    }
}


//------------ Context -------------------------------------------------------

#[derive(Clone)]
pub struct Context(digest::Context);

impl Context {
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data)
    }

    pub fn finish(self) -> Digest {
        self.0.finish()
    }
}

impl io::Write for Context {
    fn write(&mut self, buf: &[u8]) -> Result<usize, io::Error> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}


//============ Tests =========================================================
