//! Target mailbox types
//!
//! Provides a strongly-typed enum for the mailbox drafts are appended
//! to instead of raw strings. Gmail keeps drafts under the `[Gmail]`
//! hierarchy, most other providers use a top-level `Drafts` folder,
//! and anything else uses the `Custom` variant.

use std::fmt;

/// An IMAP mailbox that can receive drafts.
///
/// # Examples
///
/// ```
/// use imap_drafter::Folder;
///
/// assert_eq!(Folder::GmailDrafts.as_str(), "[Gmail]/Drafts");
/// assert_eq!(Folder::GmailDrafts.quoted(), "\"[Gmail]/Drafts\"");
///
/// let custom = Folder::custom("Outreach/Drafts");
/// assert_eq!(custom.as_str(), "Outreach/Drafts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Folder {
    /// The conventional top-level `Drafts` folder.
    Drafts,
    /// Gmail's drafts folder (`[Gmail]/Drafts`).
    GmailDrafts,
    /// A user-defined or server-specific folder.
    Custom(String),
}

impl Folder {
    /// Create a folder for a user-defined or non-standard mailbox.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// The IMAP folder name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Drafts => "Drafts",
            Self::GmailDrafts => "[Gmail]/Drafts",
            Self::Custom(name) => name,
        }
    }

    /// The folder name as an IMAP quoted string.
    ///
    /// Backslashes and double quotes are escaped (RFC 3501 `quoted`).
    #[must_use]
    pub fn quoted(&self) -> String {
        quote(self.as_str())
    }
}

/// Whether `s` can travel as an IMAP quoted string: ASCII with no
/// control characters, so in particular no CR or LF.
pub(crate) fn is_quotable(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii() && !b.is_ascii_control())
}

/// Render `s` as an IMAP quoted string.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Folder {
    fn from(s: &str) -> Self {
        match s {
            "Drafts" => Self::Drafts,
            "[Gmail]/Drafts" => Self::GmailDrafts,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for Folder {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
