//! Line-framed command channel.
//!
//! IMAP exchanges are CRLF-terminated lines interleaved with raw
//! literal bytes. `LineChannel` is the "read a line / write raw bytes"
//! seam the session and the APPEND state machine are written against,
//! so both can be driven by an in-memory duplex stream in tests.

use super::tag::Tag;
use crate::error::{Error, Result};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Maximum accepted length of a single server line.
const MAX_LINE_LENGTH: u64 = 64 * 1024;

/// Literal bytes written per deadline-bounded write.
const LITERAL_CHUNK: usize = 16 * 1024;

/// Buffered line I/O over one stream. Every read and write is bounded
/// by the same deadline.
pub struct LineChannel<S> {
    reader: BufReader<S>,
    read_timeout: Duration,
}

impl<S> LineChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, read_timeout: Duration) -> Self {
        Self {
            reader: BufReader::new(stream),
            read_timeout,
        }
    }

    /// Read one server line, without its line terminator.
    ///
    /// End of stream is a protocol violation: every caller is waiting
    /// for a specific response when it reads. A line that does not
    /// arrive within the read timeout yields [`Error::Timeout`].
    pub async fn read_line(&mut self) -> Result<String> {
        let deadline = self.read_timeout;
        let mut buf = Vec::new();

        let read = {
            let mut limited = (&mut self.reader).take(MAX_LINE_LENGTH);
            tokio::time::timeout(deadline, limited.read_until(b'\n', &mut buf))
                .await
                .map_err(|_| Error::Timeout(deadline))??
        };

        if read == 0 {
            return Err(Error::Protocol(
                "connection closed while waiting for a response".into(),
            ));
        }
        if !buf.ends_with(b"\n") {
            if read as u64 >= MAX_LINE_LENGTH {
                return Err(Error::Protocol(format!(
                    "response line exceeds {MAX_LINE_LENGTH} bytes"
                )));
            }
            return Err(Error::Protocol(
                "connection closed in the middle of a response line".into(),
            ));
        }

        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        debug!("S: {}", line);
        Ok(line)
    }

    /// Write `<tag> <command>\r\n` and flush.
    ///
    /// Only the command verb is logged so credentials never reach the
    /// log output. A peer that stops reading yields [`Error::Timeout`].
    pub async fn write_command(&mut self, tag: &Tag, command: &str) -> Result<()> {
        let verb = command.split_whitespace().next().unwrap_or_default();
        debug!("C: {} {} ...", tag, verb);

        let line = format!("{tag} {command}\r\n");
        let stream = self.reader.get_mut();
        within(self.read_timeout, async {
            stream.write_all(line.as_bytes()).await?;
            stream.flush().await
        })
        .await
    }

    /// Write literal bytes unmodified followed by the CRLF that ends
    /// the command line, then flush.
    ///
    /// The deadline applies to each chunk, so a large literal on a slow
    /// link is fine while a peer that stops reading is not.
    pub async fn write_literal(&mut self, bytes: &[u8]) -> Result<()> {
        debug!("C: <{} literal bytes>", bytes.len());
        let deadline = self.read_timeout;
        let stream = self.reader.get_mut();
        for chunk in bytes.chunks(LITERAL_CHUNK) {
            within(deadline, stream.write_all(chunk)).await?;
        }
        within(deadline, async {
            stream.write_all(b"\r\n").await?;
            stream.flush().await
        })
        .await
    }

    /// Read lines until the tagged completion for `tag` arrives.
    ///
    /// Untagged data (`* ...`), continuation requests and lines for
    /// other tags are discarded.
    pub async fn wait_for_tagged(&mut self, tag: &Tag) -> Result<String> {
        loop {
            let line = self.read_line().await?;
            if tag.completes(&line) {
                return Ok(line);
            }
        }
    }

    /// Shut down the write half, which sends TLS `close_notify` on
    /// encrypted streams.
    ///
    /// Bounded like every other write: a peer that has stopped reading
    /// cannot hold the session open.
    pub async fn shutdown(&mut self) -> Result<()> {
        within(self.read_timeout, self.reader.get_mut().shutdown()).await
    }
}

/// Run one write-side operation under `deadline`.
async fn within<T>(deadline: Duration, op: impl Future<Output = io::Result<T>>) -> Result<T> {
    tokio::time::timeout(deadline, op)
        .await
        .map_err(|_| Error::Timeout(deadline))?
        .map_err(Error::from)
}

/// The status word of a tagged completion (`OK`, `NO`, `BAD`).
#[must_use]
pub fn completion_status(line: &str) -> Option<&str> {
    line.split_whitespace().nth(1)
}

/// Whether a tagged completion reports success.
#[must_use]
pub fn is_ok(line: &str) -> bool {
    completion_status(line).is_some_and(|s| s.eq_ignore_ascii_case("OK"))
}
