use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use watch_tracker::cli::{self, Cli, Command};
use watch_tracker::config::{self, AppConfig, CONFIG_FILE_NAME, FileConfig};
use watch_tracker::origin::DanimeScraper;
use watch_tracker::storage::open_store;
use watch_tracker::tracker::Tracker;
use watch_tracker::tui;

const LOG_ENV: &str = "WATCH_TRACKER_LOG";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command();

    let home = config::default_home();
    let file_config = match &cli.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => FileConfig::load_optional(&home.join(CONFIG_FILE_NAME))?,
    };
    let app_config = AppConfig::resolve(&home, &cli.cli_config(), file_config)?;

    // The TUI owns the terminal, so it always logs to a file.
    let log_file = match (&app_config.log_file, &command) {
        (Some(path), _) => Some(path.clone()),
        (None, Command::Tui) => Some(app_config.default_log_file()),
        (None, _) => None,
    };
    init_logging(log_file.as_deref())?;

    info!(
        backend = ?app_config.backend,
        store = %app_config.store_path.display(),
        origin = %app_config.base_url,
        "configuration loaded"
    );

    let store = open_store(app_config.backend, &app_config.store_path)
        .await
        .with_context(|| format!("Failed to open store at {:?}", app_config.store_path))?;
    let scraper = Arc::new(DanimeScraper::new(
        &app_config.base_url,
        &app_config.user_agent,
        app_config.timeout,
    )?);
    let mut tracker = Tracker::open(
        store,
        scraper,
        app_config.refresh_policy()?,
        app_config.tracker_options(),
    )
    .await
    .context("Failed to open watch lists")?;

    match command {
        Command::Tui => {
            tui::run_tui(tracker).await?;
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let succeeded = cli::run_command(&mut tracker, &command).await?;
            Ok(if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()?;
        }
        None => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
    }
    Ok(())
}
