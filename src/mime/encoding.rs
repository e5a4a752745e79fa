//! Transfer encodings for outbound MIME.
//!
//! Base64 bodies wrapped at 76 characters (RFC 2045 §6.8) and RFC 2047
//! encoded words for non-ASCII header text.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::borrow::Cow;

/// Maximum length of an encoded base64 line, excluding CRLF.
pub const MAX_LINE_LENGTH: usize = 76;

/// Raw bytes per RFC 2047 encoded word; keeps each word under 75
/// characters once the `=?utf-8?B?` / `?=` wrapper is added.
const ENCODED_WORD_CHUNK: usize = 45;

/// Encodes `data` as standard base64 wrapped into CRLF-separated lines
/// of at most [`MAX_LINE_LENGTH`] characters.
///
/// There is no trailing CRLF; empty input yields an empty string.
#[must_use]
pub fn encode(data: &[u8]) -> String {
    let flat = STANDARD.encode(data);
    let lines = flat.len().div_ceil(MAX_LINE_LENGTH);
    let mut out = String::with_capacity(flat.len() + lines.saturating_sub(1) * 2);

    for (i, chunk) in flat.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        out.extend(chunk.iter().copied().map(char::from));
    }
    out
}

/// Decodes wrapped base64, ignoring line breaks.
///
/// # Errors
///
/// Returns [`Error::InvalidMessage`] if the input is not valid base64.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let flat: String = text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    STANDARD
        .decode(flat)
        .map_err(|e| Error::InvalidMessage(format!("invalid base64: {e}")))
}

/// Encodes header text as RFC 2047 `B` encoded words when it is not
/// plain ASCII.
///
/// Long values are split on character boundaries into several words
/// joined by folding whitespace.
#[must_use]
pub fn encode_header(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (idx, c) in text.char_indices() {
        let next = idx + c.len_utf8();
        if next - start > ENCODED_WORD_CHUNK && end > start {
            words.push(encoded_word(&text[start..end]));
            start = end;
        }
        end = next;
    }
    if end > start {
        words.push(encoded_word(&text[start..end]));
    }

    Cow::Owned(words.join("\r\n "))
}

fn encoded_word(chunk: &str) -> String {
    format!("=?utf-8?B?{}?=", STANDARD.encode(chunk.as_bytes()))
}
