//! Outbound MIME composition.
//!
//! - `message` -- the message model handed in by callers
//! - `encoding` -- wrapped base64 and RFC 2047 header words
//! - `composer` -- byte-exact multipart/mixed rendering

mod composer;
pub mod encoding;
mod message;

pub use composer::{Boundary, ComposedMessage, compose, compose_with_boundary};
pub use message::{Attachment, MessageSpec, OutboundMessage, format_address, mime_type_for};
