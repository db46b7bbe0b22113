//! Ingestion configuration and validation
//!
//! # Example
//!
//! ```
//! use sz_ingest::domain::IngestConfig;
//!
//! let config = IngestConfig::default()
//!     .with_token_width(6)
//!     .with_terminate_keyword("stop");
//! assert!(config.validate().is_ok());
//! ```

use crate::error::IngestError;

/// Default number of digits in a complete token.
pub const DEFAULT_TOKEN_WIDTH: usize = 9;

/// Widest token that still fits in a `u64` without overflow.
pub const MAX_TOKEN_WIDTH: usize = 19;

/// Default line delimiter on the wire and in the log.
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Default control line that shuts the whole service down.
pub const DEFAULT_TERMINATE_KEYWORD: &str = "terminate";

/// Wire-level rules shared by every connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestConfig {
    /// Exact number of digits in a complete token
    pub token_width: usize,
    /// Byte terminating every line
    pub delimiter: u8,
    /// Line value requesting service shutdown
    pub terminate_keyword: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            token_width: DEFAULT_TOKEN_WIDTH,
            delimiter: DEFAULT_DELIMITER,
            terminate_keyword: DEFAULT_TERMINATE_KEYWORD.to_string(),
        }
    }
}

impl IngestConfig {
    /// Check the rules are internally consistent.
    ///
    /// The keyword must never be mistakable for a token, and the delimiter
    /// must never be mistakable for part of one.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.token_width == 0 || self.token_width > MAX_TOKEN_WIDTH {
            return Err(IngestError::Config(format!(
                "token_width must be between 1 and {}, got {}",
                MAX_TOKEN_WIDTH, self.token_width
            )));
        }

        if self.delimiter.is_ascii_digit() {
            return Err(IngestError::Config(
                "delimiter cannot be an ASCII digit".to_string(),
            ));
        }

        if self.terminate_keyword.is_empty() {
            return Err(IngestError::Config(
                "terminate_keyword cannot be empty".to_string(),
            ));
        }

        if self.terminate_keyword.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IngestError::Config(
                "terminate_keyword cannot consist only of digits".to_string(),
            ));
        }

        if self.terminate_keyword.as_bytes().contains(&self.delimiter) {
            return Err(IngestError::Config(
                "terminate_keyword cannot contain the delimiter".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder-style method to set the token width
    pub fn with_token_width(mut self, width: usize) -> Self {
        self.token_width = width;
        self
    }

    /// Builder-style method to set the delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder-style method to set the terminate keyword
    pub fn with_terminate_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.terminate_keyword = keyword.into();
        self
    }

    /// Longest fragment a connection may hold between reads: a digit run
    /// one short of a complete token.
    pub fn max_fragment_len(&self) -> usize {
        self.token_width.saturating_sub(1)
    }
}
