//! One authenticated IMAP connection
//!
//! A `Session` owns its stream and its tag sequence. It is driven by
//! one caller at a time (`&mut self`): every command runs to its
//! tagged completion before the next one is written.

use crate::config::ImapConfig;
use crate::connection::{self, ImapStream};
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::folder::{Folder, is_quotable, quote};
use crate::mime::ComposedMessage;
use crate::protocol::{AppendExchange, LineChannel, TagGenerator, is_ok};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

pub struct Session<S> {
    channel: LineChannel<S>,
    tags: TagGenerator,
    authenticated: bool,
}

impl Session<ImapStream> {
    /// Connect over TLS and consume the server greeting.
    pub async fn connect(config: &ImapConfig) -> Result<Self> {
        let stream = connection::connect(config).await?;
        Self::establish(stream, config.read_timeout).await
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established stream and read the greeting line.
    ///
    /// A `* BYE` greeting means the server refused the connection.
    pub async fn establish(stream: S, read_timeout: Duration) -> Result<Self> {
        let mut channel = LineChannel::new(stream, read_timeout);
        let greeting = channel.read_line().await.map_err(|e| match e {
            Error::Protocol(_) => Error::Connection("server closed before greeting".into()),
            other => other,
        })?;

        if greeting.starts_with("* BYE") {
            return Err(Error::Connection(format!("server refused: {greeting}")));
        }
        debug!("Greeting consumed");

        Ok(Self {
            channel,
            tags: TagGenerator::default(),
            authenticated: greeting.starts_with("* PREAUTH"),
        })
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Number of commands issued on this session.
    #[must_use]
    pub const fn commands_issued(&self) -> u64 {
        self.tags.issued()
    }

    /// LOGIN with a username and password. Any completion other than
    /// OK is [`Error::Authentication`] carrying the server's line.
    ///
    /// Credentials that cannot be sent as quoted strings are refused
    /// with [`Error::Config`] before anything is written.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if !is_quotable(username) || !is_quotable(password) {
            return Err(Error::Config(
                "credentials must be printable ASCII without line breaks".into(),
            ));
        }
        let tag = self.tags.next_tag();
        let command = format!("LOGIN {} {}", quote(username), quote(password));
        self.channel.write_command(&tag, &command).await?;

        let completion = self.channel.wait_for_tagged(&tag).await?;
        if !is_ok(&completion) {
            return Err(Error::Authentication(completion));
        }

        self.authenticated = true;
        info!("Logged in as {}", username);
        Ok(())
    }

    /// APPEND one composed message to `mailbox` with `flags`.
    ///
    /// Returns the tagged OK completion. [`Error::AppendRejected`]
    /// leaves the session usable; any other error does not.
    pub async fn append(
        &mut self,
        mailbox: &Folder,
        flags: &[Flag],
        message: &ComposedMessage,
    ) -> Result<String> {
        if !self.authenticated {
            return Err(Error::Protocol("APPEND issued before LOGIN".into()));
        }
        if !is_quotable(mailbox.as_str()) {
            return Err(Error::Config(format!(
                "mailbox \"{mailbox}\" cannot be sent as a quoted string"
            )));
        }

        let mut exchange = AppendExchange::new(self.tags.next_tag(), mailbox, flags, message);
        let completion = exchange.run(&mut self.channel).await?;
        debug!("Appended {} bytes to {}", message.len(), mailbox);
        Ok(completion)
    }

    /// LOGOUT, read one response line, then close the stream.
    ///
    /// The stream is shut down even when the LOGOUT exchange fails; the
    /// first error encountered is returned.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tags.next_tag();
        let exchange = match self.channel.write_command(&tag, "LOGOUT").await {
            Ok(()) => self.channel.read_line().await.map(drop),
            Err(e) => Err(e),
        };
        let shutdown = self.channel.shutdown().await;
        self.authenticated = false;
        debug!("Session closed");
        exchange.and(shutdown)
    }

    /// Close the stream without LOGOUT, for sessions whose framing can
    /// no longer be trusted.
    pub async fn close(mut self) -> Result<()> {
        self.authenticated = false;
        self.channel.shutdown().await
    }
}
