//! Write batch
//!
//! The newly-unique tokens produced by one chunk, in arrival order, persisted
//! with a single append.

use super::token::Token;

/// Ordered tokens awaiting one log append.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    tokens: Vec<Token>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Render every token followed by `delimiter`, preserving order.
    pub fn encode(&self, delimiter: u8) -> Vec<u8> {
        let width = self.tokens.first().map_or(0, Token::width);
        let mut out = Vec::with_capacity(self.tokens.len() * (width + 1));
        for token in &self.tokens {
            token.write_to(&mut out);
            out.push(delimiter);
        }
        out
    }
}

impl FromIterator<Token> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}
