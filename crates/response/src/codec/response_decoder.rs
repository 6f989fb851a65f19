//! [`Decoder`] adapter over [`H2Response`].
//!
//! Lets a backend connection be wrapped in a `tokio_util::codec::FramedRead`,
//! yielding the response head first, then body chunks, then EOF.
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use micro_h2_response::codec::ResponseDecoder;
//! use micro_h2_response::protocol::{Message, PayloadItem};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::FramedRead;
//!
//! # async fn relay() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = TcpStream::connect("127.0.0.1:8080").await?;
//! let mut framed = FramedRead::new(backend, ResponseDecoder::new(1));
//!
//! while let Some(message) = framed.next().await {
//!     match message? {
//!         Message::Header(head) => println!("{}", head.status()),
//!         Message::Payload(PayloadItem::Chunk(bytes)) => println!("{} body bytes", bytes.len()),
//!         Message::Payload(PayloadItem::Eof) => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{Message, ParseError, PayloadItem, ResponseHead, ResponseLimits};
use crate::response::{H2Response, Input};

/// Decodes one backend response out of a byte stream.
#[derive(Debug)]
pub struct ResponseDecoder {
    response: H2Response,
    pending: VecDeque<Message<ResponseHead>>,
    head_sent: bool,
    eof_sent: bool,
}

impl ResponseDecoder {
    pub fn new(stream_id: u32) -> Self {
        Self::with_limits(stream_id, ResponseLimits::default())
    }

    pub fn with_limits(stream_id: u32, limits: ResponseLimits) -> Self {
        Self::from_response(H2Response::with_limits(stream_id, limits))
    }

    /// Wraps an existing converter, keeping its state change observer.
    pub fn from_response(response: H2Response) -> Self {
        Self { response, pending: VecDeque::new(), head_sent: false, eof_sent: false }
    }

    pub fn response(&self) -> &H2Response {
        &self.response
    }

    pub fn into_response(self) -> H2Response {
        self.response
    }

    /// Queues what the last `advance` produced, head first.
    fn collect(&mut self, spans: Vec<Bytes>) {
        if !self.head_sent {
            if let Some(head) = self.response.head() {
                self.pending.push_back(Message::Header(head.clone()));
                self.head_sent = true;
            }
        }

        self.pending.extend(spans.into_iter().map(|bytes| Message::Payload(PayloadItem::Chunk(bytes))));

        if self.response.is_done() && !self.eof_sent {
            self.pending.push_back(Message::Payload(PayloadItem::Eof));
            self.eof_sent = true;
        }
    }
}

impl Decoder for ResponseDecoder {
    type Item = Message<ResponseHead>;
    type Error = ParseError;

    /// Attempts to decode the next item of the response from `src`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: the response head is complete
    /// - `Ok(Some(Message::Payload(_)))`: a body chunk, or EOF once the body is complete
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the response is malformed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.pending.pop_front() {
            return Ok(Some(message));
        }

        if src.is_empty() || self.response.is_done() {
            return Ok(None);
        }

        let input = src.split().freeze();
        let mut spans = Vec::new();
        let consumed = self.response.advance(input.clone(), &mut spans)?;

        if consumed < input.len() {
            trace!(stream_id = self.response.stream_id(), left = input.len() - consumed, "bytes after the end of the response");
            src.extend_from_slice(&input[consumed..]);
        }

        self.collect(spans);
        Ok(self.pending.pop_front())
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(buf)? {
            return Ok(Some(message));
        }

        if !self.response.is_done() {
            self.response.advance(Input::Eof, &mut Vec::<Bytes>::new())?;
            self.collect(Vec::new());
        }

        Ok(self.pending.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io;
    use tokio_util::codec::FramedRead;
    use tokio_util::io::StreamReader;

    /// A backend that delivers `pieces` one read at a time.
    fn backend(pieces: Vec<&'static [u8]>) -> impl tokio::io::AsyncRead + Unpin {
        StreamReader::new(futures::stream::iter(pieces.into_iter().map(|piece| Ok::<_, io::Error>(Bytes::from_static(piece)))))
    }

    async fn collect<R>(framed: &mut FramedRead<R, ResponseDecoder>) -> Result<(ResponseHead, Vec<u8>), ParseError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut head = None;
        let mut body = Vec::new();
        while let Some(message) = framed.next().await {
            match message? {
                Message::Header(h) => head = Some(h),
                Message::Payload(PayloadItem::Chunk(bytes)) => body.extend_from_slice(&bytes),
                Message::Payload(PayloadItem::Eof) => break,
            }
        }
        Ok((head.expect("response head"), body))
    }

    #[tokio::test]
    async fn test_chunked_over_fragmented_reads() {
        let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();

        let reader = backend(vec![&b"HTTP/1.1 200 OK\r\nTransfer-"[..], b"Encoding: chunked\r\n\r\n5\r\nhe", b"llo\r\n6\r", b"\n world\r\n0\r\n\r\n"]);
        let mut framed = FramedRead::new(reader, ResponseDecoder::new(5));

        let (head, body) = collect(&mut framed).await.unwrap();
        assert_eq!(head.status(), "200 OK");
        assert_eq!(body, b"hello world");
        assert!(framed.decoder().response().is_done());
        assert!(framed.decoder().response().is_chunked());
    }

    #[tokio::test]
    async fn test_close_delimited_ends_at_eof() {
        let reader = backend(vec![&b"HTTP/1.0 200 OK\r\n\r\nstreamed "[..], b"until close"]);
        let mut framed = FramedRead::new(reader, ResponseDecoder::new(1));

        let (_, body) = collect(&mut framed).await.unwrap();
        assert_eq!(body, b"streamed until close");
        assert!(framed.into_parts().codec.into_response().destroy().is_ok());
    }

    #[tokio::test]
    async fn test_truncated_response_is_an_error() {
        let reader = backend(vec![&b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc"[..]]);
        let mut framed = FramedRead::new(reader, ResponseDecoder::new(1));

        let err = collect(&mut framed).await.unwrap_err();
        assert!(matches!(err, ParseError::TruncatedBody { remaining: 7 }));
    }

    #[test]
    fn test_decode_keeps_trailing_bytes() {
        let mut decoder = ResponseDecoder::new(1);
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nokEXTRA"[..]);

        assert!(decoder.decode(&mut buf).unwrap().unwrap().is_header());
        let chunk = decoder.decode(&mut buf).unwrap().unwrap().into_payload_item().unwrap();
        assert_eq!(chunk.as_bytes().unwrap(), &Bytes::from_static(b"ok"));
        assert!(decoder.decode(&mut buf).unwrap().unwrap().into_payload_item().unwrap().is_eof());
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"EXTRA");
    }
}
