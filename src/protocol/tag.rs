//! Command tags.
//!
//! Tags are used to match commands with their tagged completions.

use std::fmt;

/// A tag identifying one in-flight command, e.g. `a3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `line` is the tagged completion for this tag.
    #[must_use]
    pub fn completes(&self, line: &str) -> bool {
        line.strip_prefix(self.as_str())
            .is_some_and(|rest| rest.starts_with(' '))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-session tag generator.
///
/// Generates strictly increasing tags `a1`, `a2`, ... and is owned by
/// exactly one session, so no atomics are needed. The `u64` counter
/// cannot be exhausted by any real connection.
#[derive(Debug)]
pub struct TagGenerator {
    counter: u64,
    prefix: char,
}

impl TagGenerator {
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Issues the next tag.
    pub fn next_tag(&mut self) -> Tag {
        self.counter = self.counter.saturating_add(1);
        Tag(format!("{}{}", self.prefix, self.counter))
    }

    /// Number of tags issued so far.
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.counter
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('a')
    }
}
