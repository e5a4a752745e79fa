//! Upload composed emails as IMAP drafts
//!
//! Composes a byte-exact multipart/mixed message from an
//! [`OutboundMessage`] and stores it in the provider's Drafts mailbox
//! with a literal `APPEND`, speaking only `LOGIN`, `APPEND` and
//! `LOGOUT` over implicit TLS.
//!
//! [`DraftUploader`] runs whole batches and returns one
//! [`AppendResult`] per message; [`Session`] and the [`protocol`]
//! module expose the individual steps.

mod client;
mod config;
mod connection;
mod error;
mod flag;
mod folder;
pub mod mime;
pub mod protocol;
mod session;

pub use client::{AppendResult, BatchReport, DraftUploader, run_batch};
pub use config::{DEFAULT_READ_TIMEOUT, ImapConfig};
pub use connection::ImapStream;
pub use error::{Error, Result};
pub use flag::Flag;
pub use folder::Folder;
pub use mime::{Attachment, MessageSpec, OutboundMessage, compose};
pub use session::Session;
pub use tokio_util::sync::CancellationToken;
