//! APPEND handler.
//!
//! APPEND carries the message as a synchronizing literal, so the server
//! answers twice:
//!
//! ```text
//!   C: a2 APPEND "Drafts" (\Draft) {310}
//!   S: + Ready for literal data          <- check_append
//!   C: <310 bytes>\r\n
//!   S: a2 OK [APPENDUID 1 1] APPEND completed   <- handle_append
//! ```
//!
//! `check_append` can also refuse outright (`a2 NO ...`) in which case
//! the client must not send the literal at all.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::{Mailbox, StoredMessage};
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// What the server told the client about the announced literal.
#[derive(Debug, PartialEq, Eq)]
pub enum AppendDecision {
    /// `+` sent; the literal follows.
    Continue,
    /// Tagged NO sent; no literal will follow.
    Refused,
}

/// Phase one: accept or refuse the literal size before any bytes flow.
pub async fn check_append<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    declared: usize,
    mailbox: &Mutex<Mailbox>,
    stream: &mut BufReader<S>,
) -> AppendDecision {
    let quota = {
        let mut mb = mailbox.lock().unwrap();
        mb.append_commands += 1;
        mb.quota
    };

    if quota.is_some_and(|limit| declared > limit) {
        let resp = format!("{tag} NO [OVERQUOTA] quota exceeded\r\n");
        let _ = write_line(stream, &resp).await;
        return AppendDecision::Refused;
    }

    let _ = write_line(stream, "+ Ready for literal data\r\n").await;
    AppendDecision::Continue
}

/// Phase two: store the received literal in `folder`.
pub async fn handle_append<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder: &str,
    command: &str,
    literal: Vec<u8>,
    mailbox: &Mutex<Mailbox>,
    stream: &mut BufReader<S>,
) {
    let uid = {
        let mut mb = mailbox.lock().unwrap();
        mb.get_folder_mut(folder).map(|f| {
            f.messages.push(StoredMessage {
                command: command.to_string(),
                raw: literal,
            });
            f.messages.len()
        })
    };

    let resp = match uid {
        Some(uid) => format!("{tag} OK [APPENDUID 1 {uid}] APPEND completed\r\n"),
        None => format!("{tag} NO [TRYCREATE] Mailbox doesn't exist: {folder}\r\n"),
    };
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::MailboxBuilder;
    use tokio::io::{AsyncReadExt, BufReader};

    async fn output_of(
        stream: BufReader<tokio::io::DuplexStream>,
        client: tokio::io::DuplexStream,
    ) -> String {
        drop(stream);
        let mut buf = String::new();
        BufReader::new(client).read_to_string(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn continues_within_quota() {
        let mailbox = Mutex::new(MailboxBuilder::new().quota(100).build());
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        let decision = check_append("a2", 100, &mailbox, &mut stream).await;
        assert_eq!(decision, AppendDecision::Continue);
        assert_eq!(output_of(stream, client).await, "+ Ready for literal data\r\n");
    }

    #[tokio::test]
    async fn refuses_over_quota() {
        let mailbox = Mutex::new(MailboxBuilder::new().quota(100).build());
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        let decision = check_append("a2", 101, &mailbox, &mut stream).await;
        assert_eq!(decision, AppendDecision::Refused);
        assert_eq!(
            output_of(stream, client).await,
            "a2 NO [OVERQUOTA] quota exceeded\r\n"
        );
        assert_eq!(mailbox.lock().unwrap().append_commands, 1);
    }

    #[tokio::test]
    async fn stores_into_existing_folder() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("Drafts").build());
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        let command = "APPEND \"Drafts\" {3}";
        handle_append("a2", "Drafts", command, b"abc".to_vec(), &mailbox, &mut stream).await;
        assert_eq!(
            output_of(stream, client).await,
            "a2 OK [APPENDUID 1 1] APPEND completed\r\n"
        );
        let mb = mailbox.lock().unwrap();
        assert_eq!(mb.get_folder("Drafts").unwrap().messages[0].raw, b"abc");
    }

    #[tokio::test]
    async fn unknown_folder_is_trycreate() {
        let mailbox = Mutex::new(MailboxBuilder::new().folder("Drafts").build());
        let (client, server) = tokio::io::duplex(1024);
        let mut stream = BufReader::new(server);

        let command = "APPEND \"Nope\" {1}";
        handle_append("a2", "Nope", command, b"x".to_vec(), &mailbox, &mut stream).await;
        assert!(output_of(stream, client).await.starts_with("a2 NO [TRYCREATE]"));
    }
}
