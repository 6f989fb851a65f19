use std::fmt;

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{parse_header_line, parse_status_line, resolve_body_kind};
use crate::codec::{LineScan, LineScanner};
use crate::ensure;
use crate::protocol::{BodyKind, HeaderLine, ParseError, PayloadItem, ResponseHead, ResponseLimits, ResponseState, StatusLine};
use crate::response::BodySink;

/// Called inline on every phase change with the response, already in its new
/// state, and the state it left.
pub type StateChangeCallback = Box<dyn FnMut(&H2Response, ResponseState) + Send>;

/// One delivery from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Newly received bytes, possibly empty
    Data(Bytes),
    /// The backend closed its side of the stream
    Eof,
}

impl From<Bytes> for Input {
    fn from(bytes: Bytes) -> Self {
        Input::Data(bytes)
    }
}

impl From<&'static [u8]> for Input {
    fn from(bytes: &'static [u8]) -> Self {
        Input::Data(Bytes::from_static(bytes))
    }
}

impl From<&'static str> for Input {
    fn from(str: &'static str) -> Self {
        Input::Data(Bytes::from_static(str.as_bytes()))
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Input::Data(Bytes::from(bytes))
    }
}

/// Converts one HTTP/1.1 backend response into a head and a plain body for an HTTP/2 stream.
///
/// `H2Response` is a pure transform: the owner of the stream reads from the
/// backend, hands whatever arrived to [`advance`](Self::advance), and forwards
/// the head and body spans produced. Nothing blocks and nothing is spawned, so
/// dropping the value is all that is needed to cancel.
///
/// # Phases
///
/// `StatusLine` → `Headers` → `Body` → `Done`, never backwards. The callback
/// registered with [`set_state_change_cb`](Self::set_state_change_cb) runs
/// inside `advance` on each of these transitions, before `advance` returns.
///
/// # Errors
///
/// Any [`ParseError`] ends the conversion. The instance then refuses further
/// input with [`ParseError::Aborted`]; the caller is expected to reset the
/// stream. Other responses are never affected.
pub struct H2Response {
    stream_id: u32,
    state: ResponseState,
    limits: ResponseLimits,
    scanner: LineScanner,

    state_cb: Option<StateChangeCallback>,

    chunked: bool,
    body_len: Option<u64>,
    payload_decoder: PayloadDecoder,

    /// unfinished status or header line
    rawhead: BytesMut,
    head_size: usize,

    status: Option<StatusLine>,
    hlines: Vec<HeaderLine>,

    head: Option<ResponseHead>,
    failed: bool,
}

impl H2Response {
    /// Creates the converter for the response of `stream_id`, using default limits.
    pub fn new(stream_id: u32) -> Self {
        Self::with_limits(stream_id, ResponseLimits::default())
    }

    pub fn with_limits(stream_id: u32, limits: ResponseLimits) -> Self {
        trace!(stream_id, "create response converter");
        Self {
            stream_id,
            state: ResponseState::StatusLine,
            limits,
            scanner: LineScanner::new(limits.max_line_size),
            state_cb: None,
            chunked: false,
            body_len: None,
            payload_decoder: PayloadDecoder::new(BodyKind::Empty, &limits),
            rawhead: BytesMut::new(),
            head_size: 0,
            status: None,
            hlines: Vec::new(),
            head: None,
            failed: false,
        }
    }

    /// Registers the phase change observer, replacing any earlier one.
    ///
    /// Context the observer needs is captured by the closure.
    pub fn set_state_change_cb<F>(&mut self, callback: F)
    where
        F: FnMut(&H2Response, ResponseState) + Send + 'static,
    {
        self.state_cb = Some(Box::new(callback));
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Returns true once an error ended the conversion
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn limits(&self) -> &ResponseLimits {
        &self.limits
    }

    /// Whether the body uses chunked transfer encoding; fixed once the head is complete
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Length announced by Content-Length, `None` for chunked or close-delimited bodies
    pub fn body_len(&self) -> Option<u64> {
        self.body_len
    }

    /// Bytes still owed by the body, or by the current chunk for chunked bodies
    pub fn remain_len(&self) -> u64 {
        self.payload_decoder.remaining()
    }

    /// The parsed status line, once the first line has been read
    pub fn status(&self) -> Option<&StatusLine> {
        self.head.as_ref().map(ResponseHead::status_line).or(self.status.as_ref())
    }

    /// Header lines read so far, in received order
    pub fn hlines(&self) -> &[HeaderLine] {
        match &self.head {
            Some(head) => head.lines(),
            None => &self.hlines,
        }
    }

    /// The response head, available from the `Body` phase on
    pub fn head(&self) -> Option<&ResponseHead> {
        self.head.as_ref()
    }

    /// Feeds the next delivery from the backend.
    ///
    /// Body bytes are pushed into `sink` as soon as they are decoded, as slices
    /// of the input wherever the framing allows it.
    ///
    /// # Returns
    ///
    /// The number of input bytes consumed. Head bytes are always consumed, an
    /// unfinished line is kept for the next call. Bytes past the end of a
    /// Content-Length or chunked body are left unconsumed. Once `Done`, every
    /// call returns `Ok(0)` and changes nothing. [`Input::Eof`] consumes nothing.
    pub fn advance<S>(&mut self, input: impl Into<Input>, sink: &mut S) -> Result<usize, ParseError>
    where
        S: BodySink + ?Sized,
    {
        ensure!(!self.failed, ParseError::Aborted);

        let result = match input.into() {
            Input::Data(data) => self.advance_data(data, sink),
            Input::Eof => self.advance_eof().map(|()| 0),
        };

        if let Err(e) = &result {
            self.failed = true;
            warn!(stream_id = self.stream_id, state = %self.state, cause = %e, "failed to convert response");
        }
        result
    }

    /// Releases the converter.
    ///
    /// Dropping is always fine; this additionally reports, through
    /// [`ParseError::Incomplete`], a response released before it was complete,
    /// so the caller knows the stream has to be reset rather than ended.
    pub fn destroy(self) -> Result<(), ParseError> {
        trace!(stream_id = self.stream_id, state = %self.state, "destroy response converter");
        if self.state.is_done() || self.failed {
            Ok(())
        } else {
            Err(ParseError::Incomplete { state: self.state })
        }
    }

    fn advance_data<S>(&mut self, data: Bytes, sink: &mut S) -> Result<usize, ParseError>
    where
        S: BodySink + ?Sized,
    {
        let total = data.len();
        let mut src = data;

        loop {
            match self.state {
                ResponseState::StatusLine if !src.is_empty() => match self.next_line(&mut src)? {
                    Some(line) => self.on_status_line(&line)?,
                    None => break,
                },

                ResponseState::Headers if !src.is_empty() => match self.next_line(&mut src)? {
                    Some(line) if line.is_empty() => self.on_head_complete()?,
                    Some(line) => self.on_header_line(line)?,
                    None => break,
                },

                ResponseState::Body => {
                    self.decode_body(&mut src, sink)?;
                    if self.state == ResponseState::Body {
                        break;
                    }
                }

                ResponseState::StatusLine | ResponseState::Headers | ResponseState::Done => break,
            }
        }

        Ok(total - src.len())
    }

    fn advance_eof(&mut self) -> Result<(), ParseError> {
        match self.state {
            ResponseState::StatusLine => Err(ParseError::malformed_status_line("stream ended before the status line was complete")),
            ResponseState::Headers => Err(ParseError::malformed_headers("stream ended before the header block was complete")),
            ResponseState::Body => {
                self.payload_decoder.finish()?;
                self.transition(ResponseState::Done);
                Ok(())
            }
            ResponseState::Done => Ok(()),
        }
    }

    /// Scans the next head line out of `src`, advancing `src` past what was used.
    fn next_line(&mut self, src: &mut Bytes) -> Result<Option<Bytes>, ParseError> {
        let scan = self.scanner.scan_line(&mut self.rawhead, src)?;
        let consumed = scan.consumed();

        self.head_size += consumed;
        ensure!(self.head_size <= self.limits.max_head_size, ParseError::too_large_head(self.head_size, self.limits.max_head_size));

        src.advance(consumed);
        match scan {
            LineScan::LineFound { line, .. } => Ok(Some(line)),
            LineScan::NeedMoreData { .. } => Ok(None),
        }
    }

    fn on_status_line(&mut self, line: &[u8]) -> Result<(), ParseError> {
        let status = parse_status_line(line)?;
        debug!(stream_id = self.stream_id, status = status.text(), "parsed status line");
        self.status = Some(status);
        self.transition(ResponseState::Headers);
        Ok(())
    }

    fn on_header_line(&mut self, line: Bytes) -> Result<(), ParseError> {
        ensure!(self.hlines.len() < self.limits.max_header_num, ParseError::too_many_headers(self.limits.max_header_num));
        let line = parse_header_line(line)?;
        trace!(stream_id = self.stream_id, name = %line.name(), "parsed header line");
        self.hlines.push(line);
        Ok(())
    }

    fn on_head_complete(&mut self) -> Result<(), ParseError> {
        let status = self.status.take().ok_or_else(|| ParseError::malformed_status_line("no status line before header block"))?;
        let body_kind = resolve_body_kind(status.code(), &self.hlines)?;

        self.chunked = body_kind.is_chunked();
        self.body_len = body_kind.length();
        self.payload_decoder = PayloadDecoder::new(body_kind, &self.limits);
        self.head = Some(ResponseHead::new(status, std::mem::take(&mut self.hlines)));
        self.rawhead = BytesMut::new();

        debug!(stream_id = self.stream_id, head_size = self.head_size, ?body_kind, "response head complete");
        self.transition(ResponseState::Body);
        Ok(())
    }

    fn decode_body<S>(&mut self, src: &mut Bytes, sink: &mut S) -> Result<(), ParseError>
    where
        S: BodySink + ?Sized,
    {
        loop {
            match self.payload_decoder.decode(src)? {
                Some(PayloadItem::Chunk(bytes)) => {
                    trace!(stream_id = self.stream_id, len = bytes.len(), "relay body bytes");
                    sink.push_body(bytes);
                }
                Some(PayloadItem::Eof) => {
                    self.transition(ResponseState::Done);
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    fn transition(&mut self, next: ResponseState) {
        let prev = self.state;
        debug_assert!(next > prev, "state must move forward, {prev} -> {next}");
        self.state = next;
        debug!(stream_id = self.stream_id, from = %prev, to = %next, "response state changed");

        if let Some(mut callback) = self.state_cb.take() {
            callback(self, prev);
            self.state_cb = Some(callback);
        }
    }
}

impl fmt::Debug for H2Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("H2Response")
            .field("stream_id", &self.stream_id)
            .field("state", &self.state)
            .field("chunked", &self.chunked)
            .field("body_len", &self.body_len)
            .field("remain_len", &self.remain_len())
            .field("head", &self.head)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
