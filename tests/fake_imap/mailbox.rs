//! Test data model for the fake IMAP server
//!
//! Provides a builder-style API for constructing server state:
//!
//! ```ignore
//! let mailbox = MailboxBuilder::new()
//!     .folder("Drafts")
//!     .quota(10_000)
//!     .build();
//! ```
//!
//! The `Mailbox` is shared with the fake IMAP server behind a mutex so
//! tests can inspect what was appended after the client disconnects.

/// Server state: folders with the messages appended to them, plus the
/// knobs that make the server misbehave.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    pub folders: Vec<Folder>,
    /// Answer LOGIN with `NO [AUTHENTICATIONFAILED]`.
    pub reject_login: bool,
    /// Largest literal accepted; bigger APPENDs are refused before the
    /// continuation request.
    pub quota: Option<usize>,
    /// Successful LOGINs across all connections.
    pub logins: usize,
    /// APPEND commands received, accepted or not.
    pub append_commands: usize,
}

impl Mailbox {
    /// Look up a folder by name (case-sensitive, matching real IMAP).
    pub fn get_folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    pub fn get_folder_mut(&mut self, name: &str) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.name == name)
    }
}

/// A single IMAP folder (e.g. "Drafts", "[Gmail]/Drafts").
#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub messages: Vec<StoredMessage>,
}

/// A message stored by APPEND.
///
/// - `command`: the APPEND command line as received, without the
///   literal (useful for checking flags and the declared size).
/// - `raw`: the literal bytes exactly as the client sent them.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub command: String,
    pub raw: Vec<u8>,
}

/// Builder for constructing a `Mailbox` with test data.
pub struct MailboxBuilder {
    mailbox: Mailbox,
}

impl MailboxBuilder {
    pub fn new() -> Self {
        Self {
            mailbox: Mailbox::default(),
        }
    }

    /// Add an empty folder.
    pub fn folder(mut self, name: &str) -> Self {
        self.mailbox.folders.push(Folder {
            name: name.to_string(),
            messages: Vec::new(),
        });
        self
    }

    /// Refuse every LOGIN.
    pub const fn reject_login(mut self) -> Self {
        self.mailbox.reject_login = true;
        self
    }

    /// Refuse APPENDs larger than `bytes`.
    pub const fn quota(mut self, bytes: usize) -> Self {
        self.mailbox.quota = Some(bytes);
        self
    }

    pub fn build(self) -> Mailbox {
        self.mailbox
    }
}
