//! RFC 3161 time-stamping.
//!
//! A time-stamping authority (TSA) attests that some data existed at a
//! certain point in time by signing a hash of the data together with the
//! current time. This crate contains the types needed to ask a TSA for such
//! a time-stamp and to check the time-stamp tokens it hands out.
//!
//! Requests and responses are found in the [`tsp`] module. A response
//! carries its token as CMS signed data which is handled by the [`cms`]
//! module. Verifying a token means tracing the certificate of its signer
//! back to a set of trusted certificates, see [`cert::TrustRoots`], and
//! checking the signature as well as the signed attributes.
//!
//! The [`asn1`] module provides a small codec for BER and DER encoded
//! values that works on the tag-length-value level only. It is used to
//! convert BER into DER where the exact encoding matters.
//!
//! With the `http` feature enabled, the [`http`] module provides a
//! time-stamper that requests time-stamps via HTTP.

pub mod asn1;
pub mod cert;
pub mod cms;
pub mod crypto;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod oid;
pub mod tsp;
pub mod x509;

pub mod util {
    //! Small helpers.

    pub mod base64;
    pub mod hex;
}
