//! Connection frame buffer
//!
//! Re-frames an arbitrarily chunked byte stream into delimiter-terminated
//! lines. Each connection owns one buffer; bytes after the last delimiter
//! stay in it until the ingestion service decides whether they may wait for
//! the next read.

use bytes::{Bytes, BytesMut};

use super::config::IngestConfig;

const CARRIAGE_RETURN: u8 = b'\r';

/// Terminated lines cut from one chunk, in arrival order.
#[derive(Debug, Default)]
pub struct Frames {
    lines: Vec<Bytes>,
}

impl Frames {
    /// Iterate over line contents (delimiter and trailing `\r` removed)
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.lines.iter().map(|line| line.as_ref())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Per-connection re-framing state.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pending: BytesMut,
    delimiter: u8,
    /// A complete token was taken from an unterminated tail; its delimiter
    /// may still open the next chunk.
    owes_delimiter: bool,
}

impl FrameBuffer {
    /// Create an empty buffer for the given wire rules
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            pending: BytesMut::with_capacity(config.token_width),
            delimiter: config.delimiter,
            owes_delimiter: false,
        }
    }

    /// Append `chunk` and cut every delimiter-terminated line off the front.
    ///
    /// Empty lines are returned too. Bytes after the last delimiter remain
    /// pending; see [`FrameBuffer::pending`] and [`FrameBuffer::take_pending`].
    pub fn feed(&mut self, chunk: &[u8]) -> Frames {
        let chunk = self.skip_owed_delimiter(chunk);
        self.pending.extend_from_slice(chunk);

        let delimiter = self.delimiter;
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == delimiter) {
            let mut line = self.pending.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&CARRIAGE_RETURN) {
                line.truncate(pos - 1);
            }
            lines.push(line.freeze());
        }

        Frames { lines }
    }

    /// Bytes after the last delimiter
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Remove and return the pending bytes
    pub fn take_pending(&mut self) -> Bytes {
        self.pending.split().freeze()
    }

    /// Remove the pending bytes, which formed a complete token on their own.
    ///
    /// A delimiter (optionally preceded by `\r`) opening the next chunk then
    /// terminates that token instead of producing an empty line.
    pub fn take_completed(&mut self) -> Bytes {
        self.owes_delimiter = true;
        self.take_pending()
    }

    /// Drop any pending bytes
    pub fn clear(&mut self) {
        self.pending.clear();
        self.owes_delimiter = false;
    }

    fn skip_owed_delimiter<'a>(&mut self, chunk: &'a [u8]) -> &'a [u8] {
        if !std::mem::take(&mut self.owes_delimiter) || chunk.is_empty() {
            return chunk;
        }
        match chunk {
            [first, rest @ ..] if *first == self.delimiter => rest,
            [CARRIAGE_RETURN, second, rest @ ..] if *second == self.delimiter => rest,
            _ => chunk,
        }
    }
}
