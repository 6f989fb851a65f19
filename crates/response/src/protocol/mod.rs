//! Protocol types shared by the decoders and the response converter.
//!
//! # Architecture
//!
//! - **Message Handling** ([`message`]): items produced while converting
//!   - [`Message`]: either the response head or a payload item
//!   - [`PayloadItem`]: a body chunk or the end-of-body marker
//!   - [`BodyKind`]: how the body is delimited on the wire
//!
//! - **Response Head** ([`head`]): the immutable head container
//!   - [`ResponseHead`]: status line plus ordered header lines
//!   - [`HeaderLine`]: one raw header line with its parsed name and value
//!
//! - **State** ([`state`]): [`ResponseState`], the phases of a conversion
//!
//! - **Limits** ([`limits`]): [`ResponseLimits`], bounds on every buffer
//!
//! - **Error Handling** ([`error`]): [`ParseError`]

mod message;
pub use message::BodyKind;
pub use message::Message;
pub use message::PayloadItem;

mod head;
pub use head::HeaderLine;
pub use head::ResponseHead;
pub use head::StatusLine;

mod state;
pub use state::ResponseState;

pub mod limits;
pub use limits::ResponseLimits;

mod error;
pub use error::ParseError;
