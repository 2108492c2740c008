//! Handling of Base 64-encoded data.
//!
//! Base 64 turns up in this crate only in the PEM encoding of certificates
//! used for configuring trust anchors. The [`Pem`] flavor deals with it.

use std::{error, fmt, str};
use base64::Engine;
use base64::engine::general_purpose::{GeneralPurpose, STANDARD};

pub use base64::DecodeError;


//------------ Pem -----------------------------------------------------------

/// The flavor used by PEM files as defined in RFC 7468.
///
/// This uses the standard alphabet with padding. The encoded data in a PEM
/// block is broken into lines. All white space is removed before decoding.
pub struct Pem;

impl Pem {
    const ENGINE: GeneralPurpose = STANDARD;

    pub fn decode(self, input: &str) -> Result<Vec<u8>, DecodeError> {
        let input: String = input.split_ascii_whitespace().collect();
        Self::ENGINE.decode(input)
    }

    pub fn encode(self, data: &[u8]) -> String {
        Self::ENGINE.encode(data)
    }

    /// Returns the decoded content of all blocks with the given label.
    ///
    /// Text outside of blocks is ignored, as are blocks with a different
    /// label.
    pub fn decode_blocks(
        self, input: &[u8], label: &str
    ) -> Result<Vec<Vec<u8>>, PemError> {
        let input = str::from_utf8(input).map_err(|_| PemError::NotText)?;
        let begin = format!("-----BEGIN {}-----", label);
        let end = format!("-----END {}-----", label);
        let mut res = Vec::new();
        let mut block: Option<String> = None;
        for line in input.lines() {
            let line = line.trim();
            match block.as_mut() {
                None => {
                    if line == begin {
                        block = Some(String::new())
                    }
                }
                Some(content) => {
                    if line == end {
                        res.push(Self.decode(content)?);
                        block = None;
                    }
                    else {
                        content.push_str(line)
                    }
                }
            }
        }
        if block.is_some() {
            return Err(PemError::Unterminated)
        }
        Ok(res)
    }
}


//------------ PemError ------------------------------------------------------

/// A PEM file was malformed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PemError {
    /// The file wasn’t valid UTF-8.
    NotText,

    /// A block was started but never ended.
    Unterminated,

    /// The content of a block was not valid Base 64.
    Base64(DecodeError),
}

impl From<DecodeError> for PemError {
    fn from(err: DecodeError) -> Self {
        PemError::Base64(err)
    }
}

impl fmt::Display for PemError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PemError::NotText => f.write_str("PEM data is not text"),
            PemError::Unterminated => f.write_str("unterminated PEM block"),
            PemError::Base64(ref err) => {
                write!(f, "invalid PEM block: {}", err)
            }
        }
    }
}

impl error::Error for PemError { }


//============ Tests =========================================================
