//! Decoding of the HTTP/1.1 response byte stream.
//!
//! # Architecture
//!
//! - Head handling:
//!   - [`LineScanner`]: finds line boundaries in fragmented input
//!   - [`header`]: status line and header line tokenizers, body framing resolution
//!
//! - Body handling via [`body`]:
//!   - chunked transfer decoding, Content-Length pass-through, close-delimited bodies
//!
//! - Stream integration:
//!   - [`ResponseDecoder`]: `tokio_util` [`Decoder`](tokio_util::codec::Decoder)
//!     over [`H2Response`](crate::response::H2Response)

pub mod body;
pub mod header;
mod line_scanner;
mod response_decoder;

pub use line_scanner::{LineScan, LineScanner};
pub use response_decoder::ResponseDecoder;
