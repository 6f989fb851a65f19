//! Response head tokenizers.
//!
//! - [`parse_status_line`]: splits the status line into version, code and reason
//! - [`parse_header_line`]: validates one header line and splits name from value
//! - [`resolve_body_kind`]: picks the body framing once the header block is complete

mod header_line;
mod status_line;

pub use header_line::{parse_header_line, resolve_body_kind};
pub use status_line::parse_status_line;
