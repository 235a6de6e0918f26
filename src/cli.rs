use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::config::CliConfig;
use crate::error::error_chain;
use crate::format::{rating_label, status_label, truncate, updated_label};
use crate::models::{Rating, TrackedItemId, TrackedItemRecord};
use crate::storage::Backend;
use crate::tracker::{Intent, NotificationKind, Tracker};

#[derive(Parser, Debug)]
#[command(
    name = "watch-tracker",
    version,
    about = "Track unwatched episodes across named watch lists"
)]
pub struct Cli {
    /// Path to the TOML config file (default: <home>/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum, global = true)]
    pub backend: Option<Backend>,

    /// Path of the JSON store file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Name of the protected default list
    #[arg(long, global = true)]
    pub default_list: Option<String>,

    /// Base URL of the origin site
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Maximum number of items refreshed at once
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the active list
    Show,
    /// Add an item to the active list
    Add { id: TrackedItemId },
    /// Remove an item from the active list
    Remove { id: TrackedItemId },
    /// Rate a cached item from 1 to 5
    Rate {
        id: TrackedItemId,
        #[arg(required_unless_present = "clear")]
        rating: Option<Rating>,
        /// Remove the rating instead
        #[arg(long, conflicts_with = "rating")]
        clear: bool,
        /// Fetch the item first if it is not cached
        #[arg(long)]
        fetch: bool,
    },
    /// Refresh every item of the active list
    Refresh,
    /// Show all list names
    Lists,
    /// Create a new list
    Create { name: String },
    /// Delete a list (cached items are kept)
    Delete { name: String },
    /// Make a list the active one
    Select { name: String },
    /// Rename a list
    Rename { from: String, to: String },
    /// Merge another list into the active one
    Merge { source: String },
    /// Add everything from the origin's viewing history to the active list
    ImportHistory,
    /// Open the interactive terminal UI
    Tui,
}

impl Cli {
    pub fn cli_config(&self) -> CliConfig {
        CliConfig {
            backend: self.backend,
            store_path: self.store.clone(),
            default_list: self.default_list.clone(),
            base_url: self.base_url.clone(),
            concurrency: self.concurrency,
            log_file: self.log_file.clone(),
        }
    }

    /// No subcommand opens the TUI.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Tui)
    }
}

impl Command {
    /// The intent this command stands for, if it changes anything.
    pub fn intent(&self) -> Option<Intent> {
        Some(match self {
            Command::Show | Command::Lists | Command::Tui => return None,
            Command::Add { id } => Intent::Add(*id),
            Command::Remove { id } => Intent::Remove(*id),
            Command::Rate {
                id, rating, clear, ..
            } => Intent::Rate(*id, if *clear { None } else { *rating }),
            Command::Refresh => Intent::RefreshAll,
            Command::Create { name } => Intent::CreateList(name.clone()),
            Command::Delete { name } => Intent::DeleteList(name.clone()),
            Command::Select { name } => Intent::SwitchList(name.clone()),
            Command::Rename { from, to } => Intent::RenameList {
                from: from.clone(),
                to: to.clone(),
            },
            Command::Merge { source } => Intent::MergeList(source.clone()),
            Command::ImportHistory => Intent::ImportHistory,
        })
    }
}

/// Runs a one-shot command. Returns `false` when the command reported a failure.
pub async fn run_command(tracker: &mut Tracker, command: &Command) -> Result<bool> {
    let now = Utc::now();

    match command {
        Command::Show => {
            let (name, records) = tracker
                .view()
                .await
                .context("Failed to load the active list")?;
            print!("{}", render_table(&name, &records, now));
            Ok(true)
        }
        Command::Lists => {
            let names = tracker.list_names().await.context("Failed to read lists")?;
            let selected = tracker.registry().selected();
            for name in names {
                let marker = if name == selected { "*" } else { " " };
                println!("{marker} {name}");
            }
            Ok(true)
        }
        Command::Tui => anyhow::bail!("the TUI is started from main"),
        Command::Rate {
            id, fetch: true, ..
        } => {
            if let Err(error) = tracker.records().ensure_cached(*id).await {
                eprintln!("✗ {}", error_chain(&error));
                return Ok(false);
            }
            apply(tracker, command, now).await
        }
        _ => apply(tracker, command, now).await,
    }
}

async fn apply(tracker: &mut Tracker, command: &Command, now: DateTime<Utc>) -> Result<bool> {
    let Some(intent) = command.intent() else {
        return Ok(true);
    };

    let outcome = tracker.handle(intent).await;
    match outcome.notification.kind {
        NotificationKind::Success => println!("✓ {}", outcome.notification.message),
        NotificationKind::Failure => eprintln!("✗ {}", outcome.notification.message),
    }
    println!();
    print!("{}", render_table(&outcome.list_name, &outcome.records, now));

    Ok(!outcome.notification.is_failure())
}

/// Plain-text table of a list, one item per line.
pub fn render_table(list_name: &str, records: &[TrackedItemRecord], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{list_name}] {} item(s)", records.len());
    if records.is_empty() {
        return out;
    }

    let _ = writeln!(
        out,
        "{:<10} {:<40} {:<14} {:<9} {:<8} {}",
        "ID", "TITLE", "STATUS", "UPDATED", "SEASON", "RATING"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:<10} {:<40} {:<14} {:<9} {:<8} {}",
            record.id,
            truncate(&record.title, 40),
            status_label(record),
            updated_label(record, now),
            record.season_tag,
            rating_label(record)
        );
    }
    out
}
