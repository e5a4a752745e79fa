//! Byte-exact multipart/mixed composition.
//!
//! The composed document is the single source of truth for the APPEND
//! literal: its length is read from the finished buffer and never
//! computed separately.

use super::encoding::{encode, encode_header};
use super::message::OutboundMessage;
use crate::error::{Error, Result};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;

const BOUNDARY_PREFIX: &str = "----=_Part_";
const BOUNDARY_RANDOM_LEN: usize = 24;

/// A multipart boundary.
///
/// Generated boundaries start with `----=_Part_`; `-` and `_` are
/// outside the base64 alphabet, so no encoded attachment line can ever
/// equal a delimiter line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary(String);

impl Boundary {
    /// A fixed boundary, for deterministic output.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// A fresh random boundary.
    #[must_use]
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(BOUNDARY_RANDOM_LEN)
            .map(char::from)
            .collect();
        Self(format!("{BOUNDARY_PREFIX}{suffix}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rendered RFC 5322 document.
#[derive(Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    bytes: Vec<u8>,
    boundary: Boundary,
}

impl ComposedMessage {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Exact byte length; this is the APPEND literal size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub const fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for ComposedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedMessage")
            .field("len", &self.bytes.len())
            .field("boundary", &self.boundary)
            .finish()
    }
}

/// Compose `message` with a freshly generated boundary.
///
/// The boundary is regenerated in the unlikely case the body text
/// already contains it.
pub fn compose(message: &OutboundMessage) -> Result<ComposedMessage> {
    let mut boundary = Boundary::generate();
    while message.body.contains(boundary.as_str()) {
        boundary = Boundary::generate();
    }
    compose_with_boundary(message, &boundary)
}

/// Compose `message` using `boundary`.
///
/// Output is a pure function of the message (including its date) and
/// the boundary. Lines end in CRLF, the text body is copied verbatim
/// and the document ends right after the closing delimiter.
pub fn compose_with_boundary(
    message: &OutboundMessage,
    boundary: &Boundary,
) -> Result<ComposedMessage> {
    validate(message, boundary)?;

    let b = boundary.as_str();
    let mut out = String::with_capacity(estimate_len(message));

    push_header(&mut out, "MIME-Version", "1.0");
    push_header(&mut out, "From", &message.from);
    push_header(&mut out, "To", &message.to);
    push_header(&mut out, "Subject", &encode_header(&message.subject));
    push_header(&mut out, "Date", &message.date.to_rfc2822());
    push_header(
        &mut out,
        "Content-Type",
        &format!("multipart/mixed; boundary=\"{b}\""),
    );
    out.push_str("\r\n");

    out.push_str(&format!("--{b}\r\n"));
    push_header(&mut out, "Content-Type", "text/plain; charset=utf-8");
    push_header(&mut out, "Content-Transfer-Encoding", "8bit");
    out.push_str("\r\n");
    out.push_str(&message.body);
    out.push_str("\r\n");

    for attachment in &message.attachments {
        let name = quote_param(&attachment.filename);
        out.push_str(&format!("--{b}\r\n"));
        push_header(
            &mut out,
            "Content-Type",
            &format!("{}; name={name}", attachment.mime_type),
        );
        push_header(&mut out, "Content-Transfer-Encoding", "base64");
        push_header(
            &mut out,
            "Content-Disposition",
            &format!("attachment; filename={name}"),
        );
        out.push_str("\r\n");
        let encoded = encode(&attachment.data);
        if !encoded.is_empty() {
            out.push_str(&encoded);
            out.push_str("\r\n");
        }
    }

    out.push_str(&format!("--{b}--"));

    Ok(ComposedMessage {
        bytes: out.into_bytes(),
        boundary: boundary.clone(),
    })
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

/// Quote a MIME parameter value, encoding non-ASCII names.
fn quote_param(value: &str) -> String {
    let value = encode_header(value);
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn estimate_len(message: &OutboundMessage) -> usize {
    let attachments: usize = message
        .attachments
        .iter()
        .map(|a| a.data.len() * 4 / 3 + a.data.len() / 57 * 2 + 256)
        .sum();
    message.body.len() + attachments + 512
}

fn validate(message: &OutboundMessage, boundary: &Boundary) -> Result<()> {
    if message.to.trim().is_empty() {
        return Err(Error::InvalidMessage("No recipient email".into()));
    }

    let header_fields = [
        ("From", message.from.as_str()),
        ("To", message.to.as_str()),
        ("Subject", message.subject.as_str()),
    ];
    for (name, value) in header_fields {
        if value.contains(['\r', '\n']) {
            return Err(Error::InvalidMessage(format!(
                "{name} header contains a line break"
            )));
        }
    }
    for attachment in &message.attachments {
        if attachment.filename.contains(['\r', '\n'])
            || attachment.mime_type.contains(['\r', '\n'])
        {
            return Err(Error::InvalidMessage(format!(
                "attachment {:?} has a line break in its headers",
                attachment.filename
            )));
        }
        if !attachment.mime_type.contains('/') {
            return Err(Error::InvalidMessage(format!(
                "attachment {:?} has invalid MIME type {:?}",
                attachment.filename, attachment.mime_type
            )));
        }
    }

    let b = boundary.as_str();
    if b.is_empty() || b.len() > 70 || b.contains(['\r', '\n', '"']) {
        return Err(Error::InvalidMessage(format!("unusable boundary {b:?}")));
    }
    if message.body.contains(b) {
        return Err(Error::InvalidMessage(
            "body text contains the multipart boundary".into(),
        ));
    }
    Ok(())
}
