#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for uploading composed emails as IMAP drafts

use anyhow::Context;
use clap::{Parser, Subcommand};
use imap_drafter::mime::format_address;
use imap_drafter::{
    AppendResult, BatchReport, CancellationToken, DraftUploader, Error, ImapConfig, MessageSpec,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "drafts-cli")]
#[command(about = "Upload emails as drafts over IMAP")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Sender display name (the address is IMAP_USERNAME)
    #[arg(long, global = true, default_value = "")]
    from_name: String,

    /// Also flag uploaded drafts as \Seen
    #[arg(long, global = true)]
    mark_seen: bool,

    /// Keyword to set on uploaded drafts (repeatable)
    #[arg(long = "keyword", global = true)]
    keywords: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a single draft
    Draft {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// Body text
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the body text from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// File to attach (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },

    /// Upload every message described in a JSON file
    Batch {
        /// JSON array of {to, subject, body, attachments}
        file: PathBuf,

        /// Number of concurrent IMAP sessions
        #[arg(long, default_value = "1")]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ImapConfig::from_env()?;
    let from = format_address(&args.from_name, &config.username);

    let mut uploader = DraftUploader::new(config);
    if args.mark_seen {
        uploader = uploader.mark_seen();
    }
    for keyword in &args.keywords {
        uploader = uploader.with_keyword(keyword.as_str());
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let (specs, concurrency) = match args.command {
        Command::Draft {
            ref to,
            ref subject,
            ref body,
            ref body_file,
            ref attachments,
        } => {
            let body = match (body, body_file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("Either --body or --body-file is required"),
            };
            let spec = MessageSpec {
                to: to.clone(),
                subject: subject.clone(),
                body,
                attachments: attachments.clone(),
            };
            (vec![spec], 1)
        }
        Command::Batch {
            ref file,
            concurrency,
        } => {
            let raw = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let specs: Vec<MessageSpec> = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid batch file {}", file.display()))?;
            (specs, concurrency)
        }
    };

    let messages = specs
        .into_iter()
        .map(|spec| spec.into_message(&from))
        .collect::<Result<Vec<_>, _>>()?;

    let report = uploader
        .upload_concurrent(&messages, concurrency, &cancel)
        .await
        .map_err(|e| match e {
            Error::Authentication(line) => anyhow::anyhow!(
                "Login failed - check IMAP_USERNAME and the app password in IMAP_PASSWORD ({line})"
            ),
            other => other.into(),
        })?;

    print_report(&report, args.json)?;

    if report.failed() > 0 {
        anyhow::bail!(
            "{} of {} draft(s) failed",
            report.failed(),
            report.results.len()
        );
    }
    Ok(())
}

fn print_report(report: &BatchReport, json: bool) -> anyhow::Result<()> {
    if json {
        let output = serde_json::json!({
            "results": report.results,
            "aborted": report.aborted.as_ref().map(ToString::to_string),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_result_table(&report.results);
    if let Some(reason) = &report.aborted {
        println!("\nBatch aborted: {reason}");
    }
    Ok(())
}

fn print_result_table(results: &[AppendResult]) {
    if results.is_empty() {
        println!("No drafts uploaded.");
        return;
    }

    let header = format!("{:<8} {:<30} {:<30} {}", "Status", "To", "Subject", "Response");
    println!("{header}");
    println!("{}", "-".repeat(100));

    for result in results {
        println!(
            "{:<8} {:<30} {:<30} {}",
            if result.success { "OK" } else { "FAILED" },
            truncate(&result.recipient, 28),
            truncate(&result.subject, 28),
            result.response,
        );
    }

    let stored = results.iter().filter(|r| r.success).count();
    println!("\n{stored} of {} draft(s) stored", results.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
