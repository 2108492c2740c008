//! Converting octet sequences into hex strings.

use std::fmt;


//------------ Hex -----------------------------------------------------------

/// Displays an octet sequence as a string of upper case hex digits.
#[derive(Clone, Copy, Debug)]
pub struct Hex<'a>(pub &'a [u8]);

impl<'a> fmt::Display for Hex<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &ch in self.0 {
            let [left, right] = encode_u8(ch);
            write!(f, "{}{}", char::from(left), char::from(right))?;
        }
        Ok(())
    }
}

/// Returns the two hex digits for an octet.
pub fn encode_u8(ch: u8) -> [u8; 2] {
    [DIGITS[usize::from(ch >> 4)], DIGITS[usize::from(ch & 0x0F)]]
}

const DIGITS: &[u8] = b"0123456789ABCDEF";


//============ Tests =========================================================
