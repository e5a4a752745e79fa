//! LOGIN and LOGOUT handlers.
//!
//! Credentials are not checked: the mailbox either accepts every LOGIN
//! or, when built with `reject_login()`, refuses every one the way
//! Gmail does for a wrong app password.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use std::sync::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle LOGIN. Returns whether the session is now authenticated.
pub async fn handle_login<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    mailbox: &Mutex<Mailbox>,
    stream: &mut BufReader<S>,
) -> bool {
    let accepted = {
        let mut mb = mailbox.lock().unwrap();
        if !mb.reject_login {
            mb.logins += 1;
        }
        !mb.reject_login
    };

    let resp = if accepted {
        format!("* CAPABILITY IMAP4rev1 UIDPLUS\r\n{tag} OK LOGIN completed\r\n")
    } else {
        format!("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials (Failure)\r\n")
    };
    write_line(stream, &resp).await.is_ok() && accepted
}

/// Handle LOGOUT: untagged BYE, then the tagged OK.
pub async fn handle_logout<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    stream: &mut BufReader<S>,
) {
    let _ = write_line(stream, "* BYE Logging out\r\n").await;
    let resp = format!("{tag} OK LOGOUT completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::MailboxBuilder;
    use tokio::io::{AsyncReadExt, BufReader, DuplexStream};

    fn pipe() -> (DuplexStream, BufReader<DuplexStream>) {
        let (client, server) = tokio::io::duplex(1024);
        (client, BufReader::new(server))
    }

    /// Everything written to the client once the server side is gone.
    async fn written(mut client: DuplexStream) -> String {
        let mut buf = String::new();
        client.read_to_string(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn login_accepted_counts() {
        let mailbox = Mutex::new(MailboxBuilder::new().build());
        let (client, mut stream) = pipe();

        assert!(handle_login("a1", &mailbox, &mut stream).await);
        drop(stream);

        assert!(written(client).await.ends_with("a1 OK LOGIN completed\r\n"));
        assert_eq!(mailbox.lock().unwrap().logins, 1);
    }

    #[tokio::test]
    async fn login_rejected() {
        let mailbox = Mutex::new(MailboxBuilder::new().reject_login().build());
        let (client, mut stream) = pipe();

        assert!(!handle_login("a1", &mailbox, &mut stream).await);
        drop(stream);

        assert_eq!(
            written(client).await,
            "a1 NO [AUTHENTICATIONFAILED] Invalid credentials (Failure)\r\n"
        );
        assert_eq!(mailbox.lock().unwrap().logins, 0);
    }

    #[tokio::test]
    async fn logout_sends_bye_before_ok() {
        let (client, mut stream) = pipe();
        handle_logout("a9", &mut stream).await;
        drop(stream);

        let output = written(client).await;
        let bye = output.find("* BYE").unwrap();
        let ok = output.find("a9 OK").unwrap();
        assert!(bye < ok);
    }
}
