//! Decoder implementation for response bodies.
//!
//! This module provides a unified decoder over the ways a response body can be delimited:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Close-delimited payloads, ended by the backend closing the stream
//! - Responses with no body
//!
//! The strategy is picked from the [`BodyKind`] resolved out of the header block.

use bytes::Bytes;

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{BodyKind, ParseError, PayloadItem, ResponseLimits};

/// A unified decoder for response payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

/// Enum representing different payload decoding strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Pass everything through until end of stream
    CloseDelimited,

    /// Handle responses with no body
    NoBody,
}

impl PayloadDecoder {
    /// Creates the decoder matching `body_kind`.
    pub fn new(body_kind: BodyKind, limits: &ResponseLimits) -> Self {
        let kind = match body_kind {
            BodyKind::Length(size) => Kind::Length(LengthDecoder::new(size)),
            BodyKind::Chunked => Kind::Chunked(ChunkedDecoder::new(limits)),
            BodyKind::CloseDelimited => Kind::CloseDelimited,
            BodyKind::Empty => Kind::NoBody,
        };
        Self { kind }
    }

    /// Returns whether this decoder handles chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Bytes still owed: by the fixed-length body, or by the current chunk.
    pub fn remaining(&self) -> u64 {
        match &self.kind {
            Kind::Length(length_decoder) => length_decoder.remaining(),
            Kind::Chunked(chunked_decoder) => chunked_decoder.remaining_size(),
            Kind::CloseDelimited | Kind::NoBody => 0,
        }
    }

    /// Decodes the next body item out of `src`.
    ///
    /// Delegates to the specific decoder, returns everything for close-delimited
    /// bodies and EOF immediately for responses without one.
    pub fn decode(&mut self, src: &mut Bytes) -> Result<Option<PayloadItem>, ParseError> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            Kind::CloseDelimited if src.is_empty() => Ok(None),
            Kind::CloseDelimited => Ok(Some(PayloadItem::Chunk(std::mem::take(src)))),
            Kind::NoBody => Ok(Some(PayloadItem::Eof)),
        }
    }

    /// Handles the backend closing the stream.
    ///
    /// Completes close-delimited bodies, and fails bodies that were cut short.
    pub fn finish(&self) -> Result<(), ParseError> {
        match &self.kind {
            Kind::Length(length_decoder) => length_decoder.finish(),
            Kind::Chunked(chunked_decoder) => chunked_decoder.finish(),
            Kind::CloseDelimited | Kind::NoBody => Ok(()),
        }
    }
}
