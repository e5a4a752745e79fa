//! Shared I/O helpers for the fake IMAP server.
//!
//! Every write is flushed immediately so responses reach the client in
//! the order the handlers produce them.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Write a string to the stream and flush.
pub async fn write_line<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    line: &str,
) -> std::io::Result<()> {
    stream.get_mut().write_all(line.as_bytes()).await?;
    stream.get_mut().flush().await
}

/// Read a `{n}` literal: exactly `len` raw bytes followed by the rest of
/// the command line (normally just CRLF).
///
/// Returns `(literal, rest_of_line)`.
pub async fn read_literal<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    len: usize,
) -> std::io::Result<(Vec<u8>, String)> {
    let mut literal = vec![0u8; len];
    stream.read_exact(&mut literal).await?;
    let mut rest = String::new();
    stream.read_line(&mut rest).await?;
    Ok((literal, rest))
}

/// The byte count of a synchronizing literal announced at the end of a
/// command line, e.g. `... {1234}\r\n`.
pub fn literal_length(line: &str) -> Option<usize> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let open = trimmed.rfind('{')?;
    trimmed[open + 1..].strip_suffix('}')?.parse().ok()
}
