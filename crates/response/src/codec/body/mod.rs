//! Response body decoding.
//!
//! # Components
//!
//! - [`ChunkedDecoder`]: strips chunked transfer encoding
//! - [`LengthDecoder`]: relays a Content-Length delimited body
//! - [`PayloadDecoder`]: picks one of the above, or handles close-delimited and empty bodies
//!
//! All decoders work on [`bytes::Bytes`] and hand body bytes out as slices of
//! their input.

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;
