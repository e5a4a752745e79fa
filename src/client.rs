//! Draft upload orchestration

use crate::config::ImapConfig;
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::folder::Folder;
use crate::mime::{OutboundMessage, compose};
use crate::session::Session;
use futures::future::join_all;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Outcome of uploading one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendResult {
    pub recipient: String,
    pub subject: String,
    pub success: bool,
    /// The server's completion line, or the reason the message was not
    /// stored.
    pub response: String,
}

impl AppendResult {
    fn succeeded(message: &OutboundMessage, response: String) -> Self {
        Self {
            recipient: message.to.clone(),
            subject: message.subject.clone(),
            success: true,
            response,
        }
    }

    fn failed(message: &OutboundMessage, response: String) -> Self {
        Self {
            recipient: message.to.clone(),
            subject: message.subject.clone(),
            success: false,
            response,
        }
    }
}

/// Results for a whole batch, one per input message in input order.
///
/// `aborted` holds the error that ended the batch early; every message
/// after it is reported as failed rather than dropped.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<AppendResult>,
    pub aborted: Option<Error>,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    fn not_attempted(messages: &[OutboundMessage], error: Error) -> Self {
        let reason = format!("not attempted: {error}");
        Self {
            results: messages
                .iter()
                .map(|m| AppendResult::failed(m, reason.clone()))
                .collect(),
            aborted: Some(error),
        }
    }
}

/// Uploads outbound messages as drafts
pub struct DraftUploader {
    config: ImapConfig,
    flags: Vec<Flag>,
}

impl DraftUploader {
    #[must_use]
    pub fn new(config: ImapConfig) -> Self {
        Self {
            config,
            flags: vec![Flag::Draft],
        }
    }

    /// Also mark uploaded drafts `\Seen`.
    #[must_use]
    pub fn mark_seen(mut self) -> Self {
        if !self.flags.contains(&Flag::Seen) {
            self.flags.push(Flag::Seen);
        }
        self
    }

    /// Also set a keyword on uploaded drafts.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        let flag = Flag::Keyword(keyword.into());
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ImapConfig {
        &self.config
    }

    /// Upload every message over one session.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or LOGIN fails. Failures after
    /// login are reported per message in the [`BatchReport`].
    pub async fn upload(&self, messages: &[OutboundMessage]) -> Result<BatchReport> {
        self.upload_with_cancel(messages, &CancellationToken::new())
            .await
    }

    /// Like [`upload`](Self::upload), stopping early when `cancel`
    /// fires. Cancelled messages are reported as failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or LOGIN fails.
    pub async fn upload_with_cancel(
        &self,
        messages: &[OutboundMessage],
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        if messages.is_empty() {
            return Ok(BatchReport::default());
        }

        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            session = self.open_session() => Some(session?),
        };
        let Some(session) = connected else {
            return Ok(BatchReport::not_attempted(messages, Error::Cancelled));
        };

        info!(
            "Uploading {} draft(s) to {}",
            messages.len(),
            self.config.mailbox
        );
        let report = finish_session(
            session,
            &self.config.mailbox,
            &self.flags,
            messages,
            cancel,
        )
        .await;

        info!(
            "Batch finished: {} stored, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Upload over up to `sessions` concurrent connections, all sharing
    /// the same cancellation token.
    ///
    /// Messages are split into contiguous chunks, one per session, and
    /// results come back in input order. A chunk whose session cannot
    /// be opened reports its messages as failed; only when every
    /// session fails to open is the first error returned.
    ///
    /// # Errors
    ///
    /// Returns an error if no session could connect and log in.
    pub async fn upload_concurrent(
        &self,
        messages: &[OutboundMessage],
        sessions: usize,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        if messages.is_empty() {
            return Ok(BatchReport::default());
        }

        let sessions = sessions.clamp(1, messages.len());
        let chunk_size = messages.len().div_ceil(sessions);

        let chunks: Vec<&[OutboundMessage]> = messages.chunks(chunk_size).collect();
        let outcomes = join_all(
            chunks
                .iter()
                .map(|chunk| self.upload_with_cancel(chunk, cancel)),
        )
        .await;

        let mut merged = BatchReport::default();
        let mut open_failures = 0;
        for (chunk, outcome) in chunks.iter().zip(outcomes) {
            let report = match outcome {
                Ok(report) => report,
                Err(e) => {
                    warn!("Session for {} message(s) failed to open: {}", chunk.len(), e);
                    open_failures += 1;
                    BatchReport::not_attempted(chunk, e)
                }
            };
            merged.results.extend(report.results);
            if merged.aborted.is_none() {
                merged.aborted = report.aborted;
            }
        }

        if open_failures == chunks.len() {
            return Err(merged.aborted.unwrap_or(Error::Cancelled));
        }
        Ok(merged)
    }

    async fn open_session(&self) -> Result<Session<crate::connection::ImapStream>> {
        self.config.validate()?;
        let mut session = Session::connect(&self.config).await?;
        if let Err(e) = session
            .login(&self.config.username, &self.config.password)
            .await
        {
            if let Err(close) = session.close().await {
                warn!("Failed to close session after login failure: {}", close);
            }
            return Err(e);
        }
        Ok(session)
    }
}

/// Run a batch over `session`, then end it: LOGOUT after a clean run,
/// a bare close when the batch was aborted.
async fn finish_session<S>(
    mut session: Session<S>,
    mailbox: &Folder,
    flags: &[Flag],
    messages: &[OutboundMessage],
    cancel: &CancellationToken,
) -> BatchReport
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let report = run_batch(&mut session, mailbox, flags, messages, cancel).await;

    let closed = if report.aborted.is_some() {
        session.close().await
    } else {
        session.logout().await
    };
    if let Err(e) = closed {
        warn!("Failed to close session cleanly: {}", e);
    }
    report
}

/// Append `messages` one at a time over an authenticated session.
///
/// Rejected or unrenderable messages are recorded and the batch moves
/// on. A session-fatal error (or cancellation) stops the batch: the
/// failing message and everything after it are reported as failed and
/// the error is kept in [`BatchReport::aborted`]. The caller closes the
/// session.
pub async fn run_batch<S>(
    session: &mut Session<S>,
    mailbox: &Folder,
    flags: &[Flag],
    messages: &[OutboundMessage],
    cancel: &CancellationToken,
) -> BatchReport
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut report = BatchReport {
        results: Vec::with_capacity(messages.len()),
        aborted: None,
    };

    for message in messages {
        if let Some(reason) = &report.aborted {
            report
                .results
                .push(AppendResult::failed(message, format!("not attempted: {reason}")));
            continue;
        }

        let composed = match compose(message) {
            Ok(composed) => composed,
            Err(e) => {
                warn!("Cannot compose draft for {}: {}", message.to, e);
                report.results.push(AppendResult::failed(message, e.to_string()));
                continue;
            }
        };

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Error::Cancelled),
            outcome = session.append(mailbox, flags, &composed) => outcome,
        };

        match outcome {
            Ok(completion) => {
                info!("Draft for {} stored", message.to);
                report
                    .results
                    .push(AppendResult::succeeded(message, completion));
            }
            Err(Error::AppendRejected(line)) => {
                warn!("Draft for {} rejected: {}", message.to, line);
                report.results.push(AppendResult::failed(message, line));
            }
            Err(e) if !e.is_session_fatal() => {
                warn!("Draft for {} failed: {}", message.to, e);
                report.results.push(AppendResult::failed(message, e.to_string()));
            }
            Err(e) => {
                warn!("Aborting batch at {}: {}", message.to, e);
                report.results.push(AppendResult::failed(message, e.to_string()));
                report.aborted = Some(e);
            }
        }
    }

    report
}
