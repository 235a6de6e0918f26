use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::origin::danime::DEFAULT_BASE_URL;
use crate::refresh_policy::{DEFAULT_COMPLETE_MARKER, RefreshPolicy};
use crate::registry::DEFAULT_LIST_NAME;
use crate::storage::Backend;
use crate::tracker::{DEFAULT_REFRESH_CONCURRENCY, TrackerOptions};

/// Overrides the directory holding the config, store and log files.
pub const HOME_ENV: &str = "WATCH_TRACKER_HOME";

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STORE_FILE_NAME: &str = "store.json";
pub const LOG_FILE_NAME: &str = "watch-tracker.log";

const DEFAULT_USER_AGENT: &str = concat!("watch-tracker/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// `$WATCH_TRACKER_HOME`, else `$HOME/.watch-tracker`.
pub fn default_home() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(home);
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".watch-tracker")
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub backend: Option<Backend>,
    pub store_path: Option<PathBuf>,
    pub default_list: Option<String>,
    pub log_file: Option<PathBuf>,

    pub origin: Option<OriginConfig>,
    pub refresh: Option<RefreshConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct OriginConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    /// Maximum number of items refreshed at once.
    pub concurrency: Option<usize>,
    /// Title pattern marking a finished series.
    pub complete_marker: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Like `load`, but a missing file is not an error.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }
}

/// Command-line values. Anything set here wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub backend: Option<Backend>,
    pub store_path: Option<PathBuf>,
    pub default_list: Option<String>,
    pub base_url: Option<String>,
    pub concurrency: Option<usize>,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub home: PathBuf,
    pub backend: Backend,
    pub store_path: PathBuf,
    pub default_list: String,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub refresh_concurrency: usize,
    pub complete_marker: String,
    /// Explicit log file. The TUI falls back to `default_log_file` when unset.
    pub log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Resolves configuration from CLI values and the optional TOML file.
    /// CLI values override the file, which overrides built-in defaults.
    pub fn resolve(home: &Path, cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let origin = file.origin.unwrap_or_default();
        let refresh = file.refresh.unwrap_or_default();

        let backend = cli.backend.or(file.backend).unwrap_or_default();
        let store_path = cli
            .store_path
            .clone()
            .or(file.store_path)
            .unwrap_or_else(|| home.join(STORE_FILE_NAME));

        let default_list = cli
            .default_list
            .clone()
            .or(file.default_list)
            .unwrap_or_else(|| DEFAULT_LIST_NAME.to_string());
        if default_list.trim().is_empty() {
            bail!("default_list must not be blank");
        }

        let base_url = cli
            .base_url
            .clone()
            .or(origin.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("origin base_url must be an http(s) URL: {}", base_url);
        }

        let refresh_concurrency = cli
            .concurrency
            .or(refresh.concurrency)
            .unwrap_or(DEFAULT_REFRESH_CONCURRENCY);
        if refresh_concurrency == 0 {
            bail!("refresh concurrency must be at least 1");
        }

        Ok(Self {
            home: home.to_path_buf(),
            backend,
            store_path,
            default_list: default_list.trim().to_string(),
            base_url,
            user_agent: origin
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout: Duration::from_secs(origin.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            refresh_concurrency,
            complete_marker: refresh
                .complete_marker
                .unwrap_or_else(|| DEFAULT_COMPLETE_MARKER.to_string()),
            log_file: cli.log_file.clone().or(file.log_file),
        })
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.home.join(LOG_FILE_NAME)
    }

    pub fn refresh_policy(&self) -> Result<RefreshPolicy> {
        RefreshPolicy::new(&self.complete_marker)
            .with_context(|| format!("Invalid complete_marker pattern: {}", self.complete_marker))
    }

    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            default_list: self.default_list.clone(),
            refresh_concurrency: self.refresh_concurrency,
        }
    }
}
