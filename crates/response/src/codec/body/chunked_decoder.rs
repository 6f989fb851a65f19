//! Chunked transfer decoding for response bodies
//! ([RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1)).
//!
//! Chunk data is handed out as slices of the input [`Bytes`]. Only the hex
//! digits of a chunk-size line are buffered, so a size line may straddle any
//! number of inputs.

use std::task::Poll;

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;
use ChunkedState::*;

use crate::protocol::{ParseError, PayloadItem, ResponseLimits};

/// Strips chunked framing from a response body.
///
/// ```text
/// chunk-size [ ";" ext ] CRLF chunk-data CRLF ... "0" CRLF *( trailer CRLF ) CRLF
/// ```
///
/// Extensions and trailer fields are bounded by the configured limits and
/// otherwise dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
    /// hex digits of the size line being read
    chunk_work: BytesMut,
    /// length of the current size or trailer line so far
    line_size: usize,
    max_chunk_size: u64,
    max_chunk_line_size: usize,
    max_trailer_line_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Hex digits of the chunk size
    Size,
    /// Blanks between the size and `;` or CR
    SizeLws,
    /// Chunk extension, skipped up to CR
    Extension,
    /// LF closing the size line
    SizeLf,
    /// Chunk data
    Body,
    /// CR after chunk data
    BodyCr,
    /// LF after chunk data
    BodyLf,
    /// Trailer field, skipped up to CR
    Trailer,
    /// LF closing a trailer field
    TrailerLf,
    /// After the last chunk: a trailer field or the closing CRLF
    EndCr,
    /// LF of the closing CRLF
    EndLf,
    /// Body complete, nothing more is read
    End,
}

type Step = Poll<Result<ChunkedState, ParseError>>;

macro_rules! try_next_byte {
    ($src:ident) => {{
        if $src.has_remaining() {
            $src.get_u8()
        } else {
            return Poll::Pending;
        }
    }};
}

fn invalid(reason: &str) -> Step {
    Poll::Ready(Err(ParseError::malformed_chunk_framing(reason)))
}

impl ChunkedDecoder {
    pub fn new(limits: &ResponseLimits) -> Self {
        Self {
            state: Size,
            remaining_size: 0,
            chunk_work: BytesMut::new(),
            line_size: 0,
            max_chunk_size: limits.max_chunk_size,
            max_chunk_line_size: limits.max_chunk_line_size,
            max_trailer_line_size: limits.max_line_size,
        }
    }

    /// Bytes still owed by the chunk currently being read
    pub fn remaining_size(&self) -> u64 {
        self.remaining_size
    }

    /// Returns true once the last chunk and the trailer section were read
    pub fn is_finished(&self) -> bool {
        self.state == End
    }

    /// Checks the body was complete when the backend closed the stream.
    pub fn finish(&self) -> Result<(), ParseError> {
        if self.is_finished() {
            Ok(())
        } else {
            Err(ParseError::malformed_chunk_framing(format!("stream ended inside chunked body, state {:?}", self.state)))
        }
    }

    /// Decodes from `src`, advancing it past every byte used.
    ///
    /// Yields one `Chunk` per run of chunk data found, `Eof` once the body is
    /// complete, and `None` when `src` ran dry first. Bytes following the end
    /// of the body are left in `src`.
    pub fn decode(&mut self, src: &mut Bytes) -> Result<Option<PayloadItem>, ParseError> {
        loop {
            if self.state == End {
                trace!("chunked body complete");
                return Ok(Some(PayloadItem::Eof));
            }
            if src.is_empty() {
                return Ok(None);
            }

            let mut data = None;
            self.state = match self.step(src, &mut data) {
                Poll::Ready(Ok(next)) => next,
                Poll::Ready(Err(e)) => return Err(e),
                Poll::Pending => return Ok(None),
            };

            if let Some(data) = data {
                trace!(len = data.len(), "chunk data");
                return Ok(Some(PayloadItem::Chunk(data)));
            }
        }
    }

    fn step(&mut self, src: &mut Bytes, data: &mut Option<Bytes>) -> Step {
        match self.state {
            Size => self.read_size(src),
            SizeLws => self.read_size_lws(src),
            Extension => self.read_extension(src),
            SizeLf => self.read_size_lf(src),
            Body => self.read_body(src, data),
            BodyCr => expect_byte(src, b'\r', BodyLf, "missing CR after chunk data"),
            BodyLf => expect_byte(src, b'\n', Size, "missing LF after chunk data"),
            Trailer => self.read_trailer(src),
            TrailerLf => self.read_trailer_lf(src),
            EndCr => self.read_end_cr(src),
            EndLf => expect_byte(src, b'\n', End, "missing LF after last chunk"),
            End => Poll::Ready(Ok(End)),
        }
    }

    /// Counts one byte of the current line against `max_size`.
    fn count_line_byte(&mut self, max_size: usize) -> Result<(), ParseError> {
        self.line_size += 1;
        if self.line_size > max_size {
            return Err(ParseError::line_too_long(self.line_size, max_size));
        }
        Ok(())
    }

    fn finish_size(&mut self) -> Result<(), ParseError> {
        if self.chunk_work.is_empty() {
            return Err(ParseError::malformed_chunk_framing("missing chunk size"));
        }

        let digits = std::str::from_utf8(&self.chunk_work).map_err(ParseError::malformed_chunk_framing)?;
        let size = u64::from_str_radix(digits, 16).map_err(|e| {
            trace!(digits, cause = %e, "chunk size not representable");
            ParseError::chunk_size_overflow(self.max_chunk_size)
        })?;
        if size > self.max_chunk_size {
            return Err(ParseError::chunk_size_overflow(self.max_chunk_size));
        }

        trace!(size, "chunk size");
        self.remaining_size = size;
        self.chunk_work.clear();
        Ok(())
    }

    fn read_size(&mut self, src: &mut Bytes) -> Step {
        let b = try_next_byte!(src);
        if let Err(e) = self.count_line_byte(self.max_chunk_line_size) {
            return Poll::Ready(Err(e));
        }

        let next = match b {
            b if b.is_ascii_hexdigit() => {
                self.chunk_work.extend_from_slice(&[b]);
                return Poll::Ready(Ok(Size));
            }
            b'\t' | b' ' => SizeLws,
            b';' => Extension,
            b'\r' => SizeLf,
            _ => return invalid("invalid byte in chunk size"),
        };
        Poll::Ready(self.finish_size().map(|()| next))
    }

    fn read_size_lws(&mut self, src: &mut Bytes) -> Step {
        let b = try_next_byte!(src);
        if let Err(e) = self.count_line_byte(self.max_chunk_line_size) {
            return Poll::Ready(Err(e));
        }

        match b {
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            _ => invalid("invalid byte after chunk size"),
        }
    }

    fn read_extension(&mut self, src: &mut Bytes) -> Step {
        let b = try_next_byte!(src);
        if let Err(e) = self.count_line_byte(self.max_chunk_line_size) {
            return Poll::Ready(Err(e));
        }

        // bare LF must not end the size line
        match b {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => invalid("bare LF in chunk extension"),
            _ => Poll::Ready(Ok(Extension)),
        }
    }

    fn read_size_lf(&mut self, src: &mut Bytes) -> Step {
        if try_next_byte!(src) != b'\n' {
            return invalid("missing LF after chunk size");
        }
        self.line_size = 0;
        Poll::Ready(Ok(if self.remaining_size == 0 { EndCr } else { Body }))
    }

    fn read_body(&mut self, src: &mut Bytes, data: &mut Option<Bytes>) -> Step {
        if self.remaining_size == 0 {
            return Poll::Ready(Ok(BodyCr));
        }
        if src.is_empty() {
            return Poll::Pending;
        }

        let take = usize::try_from(self.remaining_size).map_or(src.len(), |remaining| remaining.min(src.len()));
        self.remaining_size -= take as u64;
        *data = Some(src.split_to(take));

        Poll::Ready(Ok(if self.remaining_size == 0 { BodyCr } else { Body }))
    }

    fn read_trailer(&mut self, src: &mut Bytes) -> Step {
        let b = try_next_byte!(src);
        if let Err(e) = self.count_line_byte(self.max_trailer_line_size) {
            return Poll::Ready(Err(e));
        }

        match b {
            b'\r' => Poll::Ready(Ok(TrailerLf)),
            b'\n' => invalid("bare LF in trailer section"),
            _ => Poll::Ready(Ok(Trailer)),
        }
    }

    fn read_trailer_lf(&mut self, src: &mut Bytes) -> Step {
        if try_next_byte!(src) != b'\n' {
            return invalid("missing LF after trailer field");
        }
        self.line_size = 0;
        Poll::Ready(Ok(EndCr))
    }

    /// Reads the CR of the closing CRLF, or the first byte of a trailer field.
    fn read_end_cr(&mut self, src: &mut Bytes) -> Step {
        match try_next_byte!(src) {
            b'\r' => Poll::Ready(Ok(EndLf)),
            b'\n' => invalid("bare LF in trailer section"),
            _ => match self.count_line_byte(self.max_trailer_line_size) {
                Ok(()) => Poll::Ready(Ok(Trailer)),
                Err(e) => Poll::Ready(Err(e)),
            },
        }
    }
}

fn expect_byte(src: &mut Bytes, expected: u8, next: ChunkedState, reason: &str) -> Step {
    if try_next_byte!(src) == expected { Poll::Ready(Ok(next)) } else { invalid(reason) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> ChunkedDecoder {
        ChunkedDecoder::new(&ResponseLimits::default())
    }

    /// Feeds `input` split into `step` sized pieces and collects the payload.
    fn decode_in_steps(input: &[u8], step: usize) -> (Vec<u8>, usize) {
        let mut decoder = decoder();
        let mut payload = Vec::new();
        let mut eof_count = 0;

        for piece in input.chunks(step) {
            let mut src = Bytes::copy_from_slice(piece);
            while let Some(item) = decoder.decode(&mut src).unwrap() {
                match item {
                    PayloadItem::Chunk(bytes) => payload.extend_from_slice(&bytes),
                    PayloadItem::Eof => {
                        eof_count += 1;
                        break;
                    }
                }
            }
            assert!(src.is_empty());
        }
        (payload, eof_count)
    }

    #[test]
    fn test_basic() {
        let mut buffer = Bytes::from_static(b"10\r\n1234567890abcdef\r\n0\r\n\r\n");
        let mut decoder = decoder();

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_chunk());
        assert_eq!(item.as_bytes().unwrap().len(), 16);
        assert_eq!(&item.as_bytes().unwrap()[..], b"1234567890abcdef");

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_eof());
        assert!(buffer.is_empty());
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_chunk_is_a_slice_of_the_input() {
        let mut buffer = Bytes::from_static(b"5\r\nhello\r\n0\r\n\r\n");
        let base = buffer.as_ptr();
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap().into_bytes().unwrap();
        assert_eq!(chunk.as_ptr(), base.wrapping_add(3));
    }

    #[test]
    fn test_multiple_chunks() {
        let mut buffer = Bytes::from_static(b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n");
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"hello"));

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b", world"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_chunks_with_extensions() {
        let mut buffer = Bytes::from_static(b"5 ;chunk-ext=value\r\nhello\r\n0;last\r\n\r\n");
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"hello"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_chunks_with_trailers() {
        let mut buffer = Bytes::from_static(b"5\r\nhello\r\n0\r\nTrailer: value\r\nOther: x\r\n\r\nnext");
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"hello"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
        assert_eq!(&buffer[..], b"next");
    }

    #[test]
    fn test_incomplete_chunk() {
        let mut buffer = Bytes::from_static(b"5\r\nhel");
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap();
        assert_eq!(chunk.unwrap().as_bytes().unwrap(), &Bytes::from_static(b"hel"));
        assert_eq!(decoder.remaining_size(), 2);
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(decoder.finish().is_err());

        let mut buffer = Bytes::from_static(b"lo\r\n0\r\n\r\n");
        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"lo"));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_size_line_split_byte_by_byte() {
        let input = b"3e8;name=value\r\n";
        let mut decoder = decoder();

        for b in input {
            let mut src = Bytes::copy_from_slice(&[*b]);
            assert!(decoder.decode(&mut src).unwrap().is_none());
            assert!(src.is_empty());
        }
        assert_eq!(decoder.remaining_size(), 1000);
    }

    #[test]
    fn test_round_trip_any_split() {
        let payloads: [&[u8]; 3] = [b"a", b"0123456789", &[b'z'; 1000]];
        let mut encoded = Vec::new();
        let mut expected = Vec::new();
        for payload in payloads {
            encoded.extend_from_slice(format!("{:X}\r\n", payload.len()).as_bytes());
            encoded.extend_from_slice(payload);
            encoded.extend_from_slice(b"\r\n");
            expected.extend_from_slice(payload);
        }
        encoded.extend_from_slice(b"0\r\n\r\n");

        for step in [1, 2, 3, 7, 64, encoded.len()] {
            let (payload, eof_count) = decode_in_steps(&encoded, step);
            assert_eq!(payload, expected, "step {step}");
            assert_eq!(eof_count, 1, "step {step}");
        }
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut buffer = Bytes::from_static(b"xyz\r\n");
        let result = decoder().decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::MalformedChunkFraming { .. })));

        let mut buffer = Bytes::from_static(b"\r\n");
        let result = decoder().decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::MalformedChunkFraming { .. })));
    }

    #[test]
    fn test_bare_lf_after_size() {
        let mut buffer = Bytes::from_static(b"5\nhello\r\n");
        let result = decoder().decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::MalformedChunkFraming { .. })));

        let mut buffer = Bytes::from_static(b"5;ext\nhello\r\n");
        let result = decoder().decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::MalformedChunkFraming { .. })));
    }

    #[test]
    fn test_missing_crlf() {
        let mut buffer = Bytes::from_static(b"5\r\nhelloBad");
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"hello"));

        let result = decoder.decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::MalformedChunkFraming { .. })));
    }

    #[test]
    fn test_bare_lf_after_last_chunk() {
        let mut buffer = Bytes::from_static(b"0\r\n\nHTTP/1.1 200 OK\r\n\r\n");
        let result = decoder().decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::MalformedChunkFraming { .. })));

        let mut buffer = Bytes::from_static(b"0;x\r\nT: v\n\r\n");
        let result = decoder().decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::MalformedChunkFraming { .. })));
    }

    #[test]
    fn test_trailer_too_long() {
        let limits = ResponseLimits::default().with_max_line_size(4);
        let mut buffer = Bytes::from_static(b"0\r\nTrail\r\n\r\n");
        let result = ChunkedDecoder::new(&limits).decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::LineTooLong { current_size: 5, max_size: 4 })));

        let mut buffer = Bytes::from_static(b"0\r\nTr:\r\n\r\n");
        assert!(ChunkedDecoder::new(&limits).decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn test_chunk_size_overflow() {
        let limits = ResponseLimits::default().with_max_chunk_size(0x1000);
        let mut buffer = Bytes::from_static(b"1001\r\n");
        let result = ChunkedDecoder::new(&limits).decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::ChunkSizeOverflow { max_size: 0x1000 })));

        let mut buffer = Bytes::from_static(b"fffffffffffffffffff\r\n");
        let result = decoder().decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::ChunkSizeOverflow { .. })));
    }

    #[test]
    fn test_extension_too_long() {
        let limits = ResponseLimits::default().with_max_chunk_line_size(16);
        let mut buffer = Bytes::from_static(b"5;a-very-long-extension=value\r\nhello");
        let result = ChunkedDecoder::new(&limits).decode(&mut buffer);
        assert!(matches!(result, Err(ParseError::LineTooLong { max_size: 16, .. })));
    }

    #[test]
    fn test_large_chunk() {
        let size = 1024 * 1024;
        let mut data = Vec::with_capacity(size + 16);
        data.extend(format!("{size:x}\r\n").into_bytes());
        data.extend(vec![b'A'; size]);
        data.extend(b"\r\n0\r\n\r\n");

        let mut buffer = Bytes::from(data);
        let mut decoder = decoder();

        let chunk = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(chunk.as_bytes().unwrap().len(), size);
        assert!(chunk.as_bytes().unwrap().iter().all(|&b| b == b'A'));

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
    }

    #[test]
    fn test_zero_size_chunk() {
        let mut buffer = Bytes::from_static(b"0\r\n\r\n");
        let mut decoder = decoder();

        let eof = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(eof.is_eof());
        assert!(decoder.is_finished());
    }
}
