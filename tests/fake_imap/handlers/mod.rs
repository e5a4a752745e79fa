//! IMAP command handlers for the fake server.
//!
//! - `auth` -- LOGIN and LOGOUT, the session lifecycle
//! - `append` -- APPEND, in its two phases around the literal

mod append;
mod auth;

pub use append::{AppendDecision, check_append, handle_append};
pub use auth::{handle_login, handle_logout};
