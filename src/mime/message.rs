//! Outbound message model

use super::encoding::encode_header;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A fully resolved message ready to be composed.
///
/// `from` and `to` are complete header values (`Name <addr>` or a
/// bare address). Attachments are rendered in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: DateTime<FixedOffset>,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    /// A message dated now, in the local timezone, with no attachments.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            date: Local::now().fixed_offset(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = date;
        self
    }

    /// Append an attachment built from raw bytes.
    #[must_use]
    pub fn attach(
        self,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        self.with_attachment(Attachment::new(filename, mime_type, data))
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// One attachment part.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Attachment {
    #[must_use]
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read an attachment from disk.
    ///
    /// The filename is the path's final component and the MIME type
    /// is inferred from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidMessage(format!("not a file path: {}", path.display()))
            })?;
        let data = std::fs::read(path)?;
        Ok(Self::new(filename, mime_type_for(path), data))
    }
}

/// MIME type for a file, guessed from its extension.
///
/// Unknown or missing extensions fall back to
/// `application/octet-stream`.
#[must_use]
pub fn mime_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Format a sender as `Name <address>`, or the bare address when the
/// name is empty. Non-ASCII names are RFC 2047 encoded; ASCII names
/// containing specials are quoted.
#[must_use]
pub fn format_address(name: &str, address: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return address.to_string();
    }
    if !name.is_ascii() {
        return format!("{} <{address}>", encode_header(name));
    }
    if name.contains(|c: char| "()<>[]:;@\\,.\"".contains(c)) {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        return format!("\"{escaped}\" <{address}>");
    }
    format!("{name} <{address}>")
}

/// A message as described in a batch input file.
///
/// Attachments are file paths resolved when the message is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSpec {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
}

impl MessageSpec {
    /// Build the outbound message, reading attachments from disk.
    ///
    /// Attachments whose files do not exist are skipped with a
    /// warning; any other read failure is an error.
    pub fn into_message(self, from: &str) -> Result<OutboundMessage> {
        let mut message = OutboundMessage::new(from, self.to, self.subject, self.body);
        for path in &self.attachments {
            if !path.exists() {
                warn!("Skipping missing attachment {}", path.display());
                continue;
            }
            message = message.with_attachment(Attachment::from_path(path)?);
        }
        Ok(message)
    }
}
