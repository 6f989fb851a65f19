//! Phases of a single response conversion.

use std::fmt;

/// The phase a [`H2Response`](crate::response::H2Response) is currently in.
///
/// Phases only move forward, in declaration order. The derived `Ord` follows
/// that order, so `state >= ResponseState::Body` means the head is available.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResponseState {
    /// Parsing the HTTP/1.x status line
    StatusLine,
    /// Parsing response header lines
    Headers,
    /// Relaying body bytes
    Body,
    /// The response has been converted completely
    Done,
}

impl ResponseState {
    #[inline]
    pub fn is_done(self) -> bool {
        matches!(self, ResponseState::Done)
    }

    #[inline]
    pub fn has_head(self) -> bool {
        self >= ResponseState::Body
    }
}

impl fmt::Display for ResponseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseState::StatusLine => "status-line",
            ResponseState::Headers => "headers",
            ResponseState::Body => "body",
            ResponseState::Done => "done",
        };
        f.write_str(name)
    }
}
