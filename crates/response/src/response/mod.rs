//! The per-stream response converter.
//!
//! # Components
//!
//! - [`H2Response`]: state machine driving one backend response through
//!   status line, headers and body
//! - [`Input`]: newly received bytes or the end-of-stream marker
//! - [`BodySink`]: where decoded body spans are delivered
//!
//! Each `H2Response` owns all of its buffers. Responses for different streams
//! share nothing and can be advanced from different tasks or threads.

mod h2_response;
mod sink;

pub use h2_response::{H2Response, Input, StateChangeCallback};
pub use sink::BodySink;
