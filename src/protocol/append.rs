//! APPEND exchange state machine.
//!
//! One `AppendExchange` uploads one composed message as a literal:
//!
//! ```text
//!   IDLE --send "<tag> APPEND ... {N}"--> CMD_SENT
//!   CMD_SENT --------------------------> AWAITING_CONTINUATION
//!   AWAITING_CONTINUATION --"+ ..."----> STREAMING_BODY
//!   AWAITING_CONTINUATION --other------> FAILED   (literal never sent)
//!   STREAMING_BODY --N bytes + CRLF----> AWAITING_COMPLETION
//!   AWAITING_COMPLETION --"<tag> OK"---> DONE
//!   AWAITING_COMPLETION --"<tag> NO"---> FAILED
//! ```

use super::channel::{LineChannel, is_ok};
use super::tag::Tag;
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::folder::Folder;
use crate::mime::ComposedMessage;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

/// Where an APPEND exchange currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendState {
    Idle,
    CommandSent,
    AwaitingContinuation,
    StreamingBody,
    AwaitingCompletion,
    Done,
    Failed,
}

impl AppendState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// A single APPEND of one composed message into one mailbox.
#[derive(Debug)]
pub struct AppendExchange<'a> {
    tag: Tag,
    mailbox: &'a Folder,
    flags: &'a [Flag],
    message: &'a ComposedMessage,
    state: AppendState,
}

impl<'a> AppendExchange<'a> {
    #[must_use]
    pub const fn new(
        tag: Tag,
        mailbox: &'a Folder,
        flags: &'a [Flag],
        message: &'a ComposedMessage,
    ) -> Self {
        Self {
            tag,
            mailbox,
            flags,
            message,
            state: AppendState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> AppendState {
        self.state
    }

    /// The command line, without tag: `APPEND "<mailbox>" (<flags>) {N}`.
    #[must_use]
    pub fn command(&self) -> String {
        format!(
            "APPEND {} {} {{{}}}",
            self.mailbox.quoted(),
            Flag::list(self.flags),
            self.message.len()
        )
    }

    /// Drive the exchange to a terminal state.
    ///
    /// Returns the tagged OK completion on success. A tagged NO/BAD,
    /// either instead of the continuation request or after the literal,
    /// is [`Error::AppendRejected`] and leaves the channel usable. Any
    /// other deviation is a session-fatal error.
    pub async fn run<S>(&mut self, channel: &mut LineChannel<S>) -> Result<String>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let result = self.drive(channel).await;
        if result.is_err() {
            self.transition(AppendState::Failed);
        }
        result
    }

    async fn drive<S>(&mut self, channel: &mut LineChannel<S>) -> Result<String>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let declared = self.message.len();

        loop {
            match self.state {
                AppendState::Idle => {
                    channel.write_command(&self.tag, &self.command()).await?;
                    self.transition(AppendState::CommandSent);
                }
                AppendState::CommandSent => {
                    self.transition(AppendState::AwaitingContinuation);
                }
                AppendState::AwaitingContinuation => {
                    let line = channel.read_line().await?;
                    if line.starts_with('+') {
                        self.transition(AppendState::StreamingBody);
                    } else if self.tag.completes(&line) {
                        return Err(Error::AppendRejected(line));
                    } else {
                        return Err(Error::Protocol(format!(
                            "expected continuation request, got: {line}"
                        )));
                    }
                }
                AppendState::StreamingBody => {
                    let bytes = self.message.as_bytes();
                    if bytes.len() != declared {
                        return Err(Error::Encoding {
                            declared,
                            actual: bytes.len(),
                        });
                    }
                    channel.write_literal(bytes).await?;
                    self.transition(AppendState::AwaitingCompletion);
                }
                AppendState::AwaitingCompletion => {
                    let line = channel.wait_for_tagged(&self.tag).await?;
                    if is_ok(&line) {
                        self.transition(AppendState::Done);
                        return Ok(line);
                    }
                    return Err(Error::AppendRejected(line));
                }
                AppendState::Done | AppendState::Failed => {
                    return Err(Error::Protocol(format!(
                        "APPEND {} already finished",
                        self.tag
                    )));
                }
            }
        }
    }

    fn transition(&mut self, next: AppendState) {
        trace!(tag = %self.tag, from = ?self.state, to = ?next, "APPEND transition");
        self.state = next;
    }
}
