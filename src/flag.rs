//! IMAP message flags for APPEND
//!
//! Provides a strongly-typed enum for the flags attached to an
//! appended message instead of raw strings.

use std::fmt;

/// An IMAP message flag.
///
/// System flags (prefixed with `\` in the IMAP protocol) have
/// dedicated variants. User-defined keyword flags use [`Flag::Keyword`].
///
/// # Examples
///
/// ```
/// use imap_drafter::Flag;
///
/// assert_eq!(Flag::Draft.as_imap_str(), "\\Draft");
/// assert_eq!(Flag::list(&[Flag::Draft, Flag::Seen]), "(\\Draft \\Seen)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// Message is a draft (`\Draft`).
    Draft,
    /// Message has been read (`\Seen`).
    Seen,
    /// A user-defined keyword such as `$Outreach` (no `\` prefix),
    /// for tagging a batch of drafts.
    Keyword(String),
}

impl Flag {
    /// The IMAP wire representation of this flag.
    #[must_use]
    pub fn as_imap_str(&self) -> &str {
        match self {
            Self::Draft => "\\Draft",
            Self::Seen => "\\Seen",
            Self::Keyword(kw) => kw,
        }
    }

    /// A parenthesized flag list as used by APPEND, e.g. `(\Draft)`.
    #[must_use]
    pub fn list(flags: &[Self]) -> String {
        let inner: Vec<&str> = flags.iter().map(Self::as_imap_str).collect();
        format!("({})", inner.join(" "))
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_imap_str())
    }
}
