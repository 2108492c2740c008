//! Cryptographic primitives.
//!
//! All the actual cryptography is done by _ring._ This module provides the
//! glue for identifying algorithms through their ASN.1 object identifiers
//! and for parsing public keys from certificates.

pub use self::digest::{Digest, DigestAlgorithm};
pub use self::keys::{
    KeyIdentifier, PublicKey, PublicKeyFormat, SignatureVerificationError
};
pub use self::signature::{Signature, SignatureAlgorithm};

pub mod digest;
pub mod keys;
pub mod signature;
