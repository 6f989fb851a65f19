use std::io;
use thiserror::Error;

use crate::protocol::ResponseState;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed status line: {reason}")]
    MalformedStatusLine { reason: String },

    #[error("malformed headers: {reason}")]
    MalformedHeaders { reason: String },

    #[error("line too long, current: {current_size} exceed the limit {max_size}")]
    LineTooLong { current_size: usize, max_size: usize },

    #[error("response head too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHead { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("chunk size exceed the limit {max_size}")]
    ChunkSizeOverflow { max_size: u64 },

    #[error("malformed chunk framing: {reason}")]
    MalformedChunkFraming { reason: String },

    #[error("body truncated, {remaining} bytes still expected")]
    TruncatedBody { remaining: u64 },

    #[error("response released before completion, state: {state:?}")]
    Incomplete { state: ResponseState },

    #[error("response processing already failed")]
    Aborted,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_status_line<S: ToString>(str: S) -> Self {
        Self::MalformedStatusLine { reason: str.to_string() }
    }

    pub fn malformed_headers<S: ToString>(str: S) -> Self {
        Self::MalformedHeaders { reason: str.to_string() }
    }

    pub fn line_too_long(current_size: usize, max_size: usize) -> Self {
        Self::LineTooLong { current_size, max_size }
    }

    pub fn too_large_head(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHead { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn chunk_size_overflow(max_size: u64) -> Self {
        Self::ChunkSizeOverflow { max_size }
    }

    pub fn malformed_chunk_framing<S: ToString>(str: S) -> Self {
        Self::MalformedChunkFraming { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if the error was raised after the response head had been produced,
    /// meaning the HTTP/2 stream already carries a HEADERS frame and must be reset.
    pub fn is_body_error(&self) -> bool {
        matches!(self, Self::ChunkSizeOverflow { .. } | Self::MalformedChunkFraming { .. } | Self::TruncatedBody { .. })
    }
}
