use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use chatcal_core::{CommandClassifier, ItemKind, parse_whatsapp_export, process_message};
use chatcal_provider_google::GoogleCalendar;

#[derive(Parser)]
#[command(name = "chatcal", about = "Sync chat messages into your calendar")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single message and sync it into the calendar
    Process {
        /// The message text
        text: String,

        /// IANA timezone for naive event dates
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },

    /// Parse a WhatsApp chat export and process every message
    Import {
        /// Path to the exported chat .txt file
        file: PathBuf,

        /// IANA timezone for naive event dates
        #[arg(long, default_value = "UTC")]
        timezone: String,

        /// Stop after this many messages
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process { text, timezone } => process(&text, &timezone).await,
        Commands::Import {
            file,
            timezone,
            limit,
        } => import(&file, &timezone, limit).await,
    }
}

async fn process(text: &str, timezone: &str) -> Result<()> {
    let calendar = GoogleCalendar::from_config()?;
    let classifier = CommandClassifier::default_binary();

    let summary = process_message(text, &classifier, &calendar, timezone).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

async fn import(file: &PathBuf, timezone: &str, limit: Option<usize>) -> Result<()> {
    let calendar = GoogleCalendar::from_config()?;
    let classifier = CommandClassifier::default_binary();

    let messages = parse_whatsapp_export(file)
        .with_context(|| format!("Failed to parse chat export {}", file.display()))?;
    let total = messages.len();
    tracing::info!(total, "parsed chat export");

    let mut processed = 0usize;
    let mut events = 0usize;
    let mut tasks = 0usize;
    let mut failures = 0usize;

    for message in messages.into_iter().take(limit.unwrap_or(usize::MAX)) {
        if message.text.is_empty() {
            continue;
        }
        processed += 1;

        match process_message(&message.text, &classifier, &calendar, timezone).await {
            Ok(summary) => match summary.kind {
                ItemKind::Event => {
                    events += 1;
                    tracing::info!(
                        name = summary.name.as_deref().unwrap_or(""),
                        action = ?summary.action,
                        event_id = summary.event_id.as_deref().unwrap_or(""),
                        "synced event"
                    );
                }
                ItemKind::Task => {
                    tasks += 1;
                    tracing::info!(name = summary.name.as_deref().unwrap_or(""), "found task");
                }
                ItemKind::Other => {}
            },
            // Keep going: one bad message shouldn't abort a whole import.
            Err(err) => {
                failures += 1;
                tracing::warn!(error = %err, "failed to process message");
            }
        }
    }

    println!("Processed {processed} messages: {events} events, {tasks} tasks, {failures} failures");

    Ok(())
}
