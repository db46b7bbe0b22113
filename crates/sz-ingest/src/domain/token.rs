//! Token validation
//!
//! A token is a run of ASCII digits of one fixed width. Classification is a
//! pure function of the candidate bytes, the configured width and whether the
//! candidate is the last, still-growable fragment of a chunk.

use std::fmt;

use super::config::MAX_TOKEN_WIDTH;

/// Outcome of classifying one candidate line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenClass {
    /// Exactly `width` digits
    Complete,
    /// 1..width-1 digits at the end of a chunk; the next read may extend it
    TooShortInProgress,
    /// Anything else
    Malformed,
}

/// Classify `candidate` against a fixed token `width`.
///
/// `is_final_fragment` marks the unterminated tail of a chunk. Only such a
/// tail may be `TooShortInProgress`; a short terminated line is `Malformed`.
pub fn classify(candidate: &[u8], width: usize, is_final_fragment: bool) -> TokenClass {
    if candidate.is_empty() || !candidate.iter().all(u8::is_ascii_digit) {
        return TokenClass::Malformed;
    }

    match candidate.len() {
        len if len == width => TokenClass::Complete,
        len if len < width && is_final_fragment => TokenClass::TooShortInProgress,
        _ => TokenClass::Malformed,
    }
}

/// A validated, complete token.
///
/// Stored as its numeric value so the dedup store stays compact; leading
/// zeros are restored from the width when rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token {
    value: u64,
    width: u8,
}

impl Token {
    /// Parse a complete token; `None` unless the candidate classifies as
    /// [`TokenClass::Complete`] and `width` fits in a `u64`.
    pub fn parse(candidate: &[u8], width: usize) -> Option<Self> {
        if width > MAX_TOKEN_WIDTH || classify(candidate, width, false) != TokenClass::Complete {
            return None;
        }

        let value = candidate.iter().try_fold(0u64, |acc, digit| {
            acc.checked_mul(10)?.checked_add(u64::from(digit - b'0'))
        })?;

        Some(Self {
            value,
            width: u8::try_from(width).ok()?,
        })
    }

    /// Numeric value of the token
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Number of digits, including leading zeros
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    /// Append the zero-padded digits to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.to_string().as_bytes());
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.value, width = self.width())
    }
}
