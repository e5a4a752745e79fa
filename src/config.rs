//! IMAP connection configuration

use crate::error::{Error, Result};
use crate::folder::{Folder, is_quotable};
use std::env;
use std::time::Duration;

/// Default read deadline for a single server line.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// IMAP connection configuration for draft uploads
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Mailbox the drafts are appended to.
    pub mailbox: Folder,
    /// How long to wait for any single server line.
    pub read_timeout: Duration,
    /// Skip certificate verification (local bridges, test servers).
    pub accept_invalid_certs: bool,
}

impl ImapConfig {
    /// Configuration for `host:port` with the given credentials and
    /// defaults for everything else.
    ///
    /// Spaces are stripped from the password: providers display app
    /// passwords in groups of four.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: &str,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: strip_spaces(password),
            mailbox: Folder::GmailDrafts,
            read_timeout: DEFAULT_READ_TIMEOUT,
            accept_invalid_certs: false,
        }
    }

    /// Load IMAP configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_USERNAME`
    /// - `IMAP_PASSWORD`
    ///
    /// Optional (with defaults):
    /// - `IMAP_HOST` (default: `imap.gmail.com`)
    /// - `IMAP_PORT` (default: `993`)
    /// - `IMAP_DRAFTS_MAILBOX` (default: `[Gmail]/Drafts`)
    /// - `IMAP_TIMEOUT_SECS` (default: `30`)
    /// - `IMAP_ACCEPT_INVALID_CERTS` (default: `false`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let timeout_secs: u64 = env::var("IMAP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|e| Error::Config(format!("Invalid IMAP_TIMEOUT_SECS: {e}")))?;

        let config = Self {
            host: env::var("IMAP_HOST").unwrap_or_else(|_| "imap.gmail.com".to_string()),
            port: env::var("IMAP_PORT")
                .unwrap_or_else(|_| "993".to_string())
                .parse()
                .map_err(|e| Error::Config(format!("Invalid IMAP_PORT: {e}")))?,
            username: env::var("IMAP_USERNAME")
                .map_err(|_| Error::Config("IMAP_USERNAME not set".into()))?,
            password: env::var("IMAP_PASSWORD")
                .map(|p| strip_spaces(&p))
                .map_err(|_| Error::Config("IMAP_PASSWORD not set".into()))?,
            mailbox: env::var("IMAP_DRAFTS_MAILBOX")
                .map_or(Folder::GmailDrafts, Folder::from),
            read_timeout: Duration::from_secs(timeout_secs),
            accept_invalid_certs: env::var("IMAP_ACCEPT_INVALID_CERTS")
                .map(|v| parse_bool(&v))
                .unwrap_or(Ok(false))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly log in.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(Error::Config("IMAP credentials not configured".into()));
        }
        let quoted_fields = [
            ("IMAP_USERNAME", self.username.as_str()),
            ("IMAP_PASSWORD", self.password.as_str()),
            ("IMAP_DRAFTS_MAILBOX", self.mailbox.as_str()),
        ];
        for (name, value) in quoted_fields {
            if !is_quotable(value) {
                return Err(Error::Config(format!(
                    "{name} must be printable ASCII without line breaks"
                )));
            }
        }
        if self.read_timeout.is_zero() {
            return Err(Error::Config("IMAP_TIMEOUT_SECS must be positive".into()));
        }
        Ok(())
    }
}

fn strip_spaces(s: &str) -> String {
    s.chars().filter(|c| *c != ' ').collect()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!(
            "Invalid IMAP_ACCEPT_INVALID_CERTS: {other}"
        ))),
    }
}
