//! `docscan` command line tool.
//!
//! Replays scan scenarios against the mock engines and exposes the chip
//! message filter and credential deriver for inspecting captured payloads.

mod scenario;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use docscan_core::{CompletionEvent, classify, derive_credential};
use docscan_engine::ReaderConfig;
use docscan_session::SessionConfig;

use crate::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(name = "docscan")]
#[command(version, about = "Two-phase identity document capture tools", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scan scenario against the mock engines
    Replay {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Reader configuration JSON file
        #[arg(long)]
        reader_config: Option<PathBuf>,

        /// Session configuration JSON file
        #[arg(long)]
        session_config: Option<PathBuf>,

        /// Abort when no engine event arrives within this many milliseconds
        #[arg(long, default_value = "1000")]
        idle_timeout_ms: u64,
    },

    /// Classify raw chip stream messages
    Classify {
        /// Messages to classify
        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Derive the chip access credential from an optical completion payload
    Derive {
        /// Completion payload JSON file
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Replay {
            scenario,
            reader_config,
            session_config,
            idle_timeout_ms,
        } => {
            let scenario = Scenario::from_file(&scenario)?;
            let reader_config = match reader_config {
                Some(path) => ReaderConfig::from_file(&path)
                    .with_context(|| format!("failed to load reader config {}", path.display()))?,
                None => ReaderConfig::default(),
            };
            let session_config = match session_config {
                Some(path) => SessionConfig::from_file(&path)
                    .with_context(|| format!("failed to load session config {}", path.display()))?,
                None => SessionConfig::default(),
            };

            let report = scenario::replay(
                &scenario,
                &reader_config,
                &session_config,
                Duration::from_millis(idle_timeout_ms),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Classify { messages } => {
            for message in messages {
                let kind = serde_json::to_value(classify(&message))?;
                println!("{}", json!({ "message": message, "kind": kind }));
            }
        }

        Command::Derive { payload } => {
            let raw = std::fs::read_to_string(&payload)
                .with_context(|| format!("failed to read payload {}", payload.display()))?;
            let event = CompletionEvent::from_json(&raw).context("invalid completion payload")?;

            let report = match derive_credential(&event.fields) {
                Some(credential) => json!({
                    "credential": true,
                    "passwordType": credential.password_type().to_string(),
                    "wireValue": credential.password_type().wire_value(),
                    "secretLength": credential.secret().chars().count(),
                }),
                None => json!({ "credential": false }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
