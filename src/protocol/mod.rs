//! The IMAP subset spoken to upload drafts: LOGIN, APPEND, LOGOUT.
//!
//! - `tag` -- per-session command tags
//! - `channel` -- line-framed reads and writes with a read deadline
//! - `append` -- the APPEND literal-upload state machine

mod append;
mod channel;
mod tag;

pub use append::{AppendExchange, AppendState};
pub use channel::{LineChannel, completion_status, is_ok};
pub use tag::{Tag, TagGenerator};
