//! Converts an HTTP/1.1 backend response into an HTTP/2 stream response
//!
//! A proxy or gateway speaking HTTP/2 to its clients often talks HTTP/1.1 (or
//! CGI) to its backends. This crate is the translation layer in between: it
//! consumes the raw bytes of one backend response, in whatever pieces they
//! arrive, and produces
//!
//! - the status line and the ordered header lines, once the head is complete,
//!   ready to be turned into HTTP/2 response fields, and
//! - the body as plain bytes, with Content-Length and chunked transfer framing
//!   stripped, handed out without copying wherever possible.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use micro_h2_response::protocol::ResponseState;
//! use micro_h2_response::response::{H2Response, Input};
//!
//! let mut response = H2Response::new(1);
//! response.set_state_change_cb(|response, prev| {
//!     tracing::info!(stream_id = response.stream_id(), %prev, now = %response.state(), "state changed");
//! });
//!
//! let mut body: Vec<Bytes> = Vec::new();
//! response.advance("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhel", &mut body).unwrap();
//! response.advance("lo\r\n0\r\n\r\n", &mut body).unwrap();
//! assert_eq!(response.advance(Input::Eof, &mut body).unwrap(), 0);
//!
//! assert_eq!(response.state(), ResponseState::Done);
//! let head = response.head().unwrap().to_http2();
//! assert_eq!(head.status(), http::StatusCode::OK);
//! assert!(head.headers().get(http::header::TRANSFER_ENCODING).is_none());
//! assert_eq!(body.concat(), b"hello");
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`response`]: the [`H2Response`](response::H2Response) state machine, one per stream
//! - [`codec`]: line scanning, head tokenizing and body decoding
//! - [`protocol`]: the head container, states, limits and errors
//!
//! # Error Handling
//!
//! Every failure is a [`protocol::ParseError`] local to one response. A
//! malformed head fails before anything is forwarded; a malformed body fails
//! after the head was handed out, and the HTTP/2 stream has to be reset.
//!
//! # Limits
//!
//! Defaults, all adjustable through [`protocol::ResponseLimits`]:
//!
//! - Maximum line size: 8KB
//! - Maximum number of headers: 64
//! - Maximum head size: 64KB
//! - Maximum chunk size: 16MB

pub mod codec;
pub mod protocol;
pub mod response;

mod utils;
pub(crate) use utils::ensure;
