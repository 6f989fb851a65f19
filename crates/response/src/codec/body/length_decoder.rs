//! Decoder implementation for response bodies framed by Content-Length.
//!
//! Body bytes are passed through untouched, as slices of the input, until the
//! announced length has been relayed
//! ([RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112#section-6.3)).

use bytes::Bytes;

use crate::protocol::{ParseError, PayloadItem};

/// Relays a body of `Content-Length` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    remaining: u64,
}

impl LengthDecoder {
    pub fn new(content_length: u64) -> Self {
        Self { remaining: content_length }
    }

    /// Bytes still owed by the backend
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Checks nothing was owed any more when the backend closed the stream.
    pub fn finish(&self) -> Result<(), ParseError> {
        match self.remaining {
            0 => Ok(()),
            remaining => Err(ParseError::TruncatedBody { remaining }),
        }
    }

    /// Splits off as much of `src` as the body still owns.
    ///
    /// Yields `Eof` once the whole body was relayed, leaving the rest of `src`
    /// untouched, and `None` when `src` is empty.
    pub fn decode(&mut self, src: &mut Bytes) -> Result<Option<PayloadItem>, ParseError> {
        if self.remaining == 0 {
            return Ok(Some(PayloadItem::Eof));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let take = usize::try_from(self.remaining).map_or(src.len(), |remaining| remaining.min(src.len()));
        let body = src.split_to(take);
        self.remaining -= take as u64;
        Ok(Some(PayloadItem::Chunk(body)))
    }
}
