use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Result, TrackerError, error_chain};
use crate::item_store::ItemRecordStore;
use crate::models::{Rating, TrackedItemId, TrackedItemRecord};
use crate::origin::Scraper;
use crate::refresh_policy::RefreshPolicy;
use crate::registry::{DEFAULT_LIST_NAME, WatchListRegistry};
use crate::storage::KeyValueStore;

pub const DEFAULT_REFRESH_CONCURRENCY: usize = 4;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add(TrackedItemId),
    Remove(TrackedItemId),
    /// `None` clears the rating.
    Rate(TrackedItemId, Option<Rating>),
    RefreshAll,
    SwitchList(String),
    CreateList(String),
    DeleteList(String),
    RenameList { from: String, to: String },
    /// Merges the named list into the active one.
    MergeList(String),
    ImportHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Failure,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind == NotificationKind::Failure
    }
}

/// What the presentation layer gets back after an intent: one notification and the
/// re-read active list.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub notification: Notification,
    pub list_name: String,
    pub records: Vec<TrackedItemRecord>,
}

#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub default_list: String,
    pub refresh_concurrency: usize,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            default_list: DEFAULT_LIST_NAME.to_string(),
            refresh_concurrency: DEFAULT_REFRESH_CONCURRENCY,
        }
    }
}

/// Entry point for presentation adapters. Turns intents into list and cache operations.
pub struct Tracker {
    records: ItemRecordStore,
    registry: WatchListRegistry,
    refresh_concurrency: usize,
}

impl Tracker {
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        scraper: Arc<dyn Scraper>,
        policy: RefreshPolicy,
        options: TrackerOptions,
    ) -> Result<Self> {
        let registry = WatchListRegistry::open(Arc::clone(&store), options.default_list).await?;
        let records = ItemRecordStore::new(store, scraper, policy);

        info!(
            selected = %registry.selected(),
            complete_marker = records.policy().marker(),
            "tracker ready"
        );
        Ok(Self {
            records,
            registry,
            refresh_concurrency: options.refresh_concurrency.max(1),
        })
    }

    pub fn records(&self) -> &ItemRecordStore {
        &self.records
    }

    pub fn registry(&self) -> &WatchListRegistry {
        &self.registry
    }

    /// Applies an intent. Failures are reported in the notification, never returned.
    pub async fn handle(&mut self, intent: Intent) -> Outcome {
        info!(?intent, "handling intent");

        let mut notification = match self.apply(intent).await {
            Ok(notification) => notification,
            Err(error) => {
                let message = error_chain(&error);
                warn!(error = %message, "intent failed");
                Notification::failure(message)
            }
        };

        let list_name = self.registry.selected().to_string();
        let records = match self.snapshot().await {
            Ok((records, _)) => records,
            Err(error) => {
                let cause = error_chain(&error);
                warn!(error = %cause, list = %list_name, "could not read active list");
                notification = Notification::failure(format!(
                    "{} (list could not be read: {cause})",
                    notification.message
                ));
                Vec::new()
            }
        };

        Outcome {
            notification,
            list_name,
            records,
        }
    }

    /// The active list as it can be shown right now. Members that cannot be resolved are left
    /// out and reported in a failure notification.
    pub async fn current(&self) -> Outcome {
        let list_name = self.registry.selected().to_string();
        let (records, notification) = match self.snapshot().await {
            Ok((records, 0)) => (records, Notification::success(format!("Showing '{list_name}'"))),
            Ok((records, missing)) => (
                records,
                Notification::failure(format!(
                    "{missing} item(s) in '{list_name}' could not be loaded"
                )),
            ),
            Err(error) => {
                let cause = error_chain(&error);
                warn!(error = %cause, list = %list_name, "could not read active list");
                (
                    Vec::new(),
                    Notification::failure(format!("List '{list_name}' could not be read: {cause}")),
                )
            }
        };

        Outcome {
            notification,
            list_name,
            records,
        }
    }

    /// Active list name and its records, fetching any that are not cached yet.
    pub async fn view(&self) -> Result<(String, Vec<TrackedItemRecord>)> {
        let list = self.registry.selected_list().await?;
        let records = list.get_list(&self.records).await?;
        Ok((list.name().to_string(), records))
    }

    pub async fn list_names(&self) -> Result<Vec<String>> {
        self.registry.list_names().await
    }

    async fn apply(&mut self, intent: Intent) -> Result<Notification> {
        match intent {
            Intent::Add(id) => {
                let mut list = self.registry.selected_list().await?;
                let record = list.add(id, &self.records).await?;
                Ok(Notification::success(format!(
                    "Added '{}' to '{}'",
                    record.title,
                    list.name()
                )))
            }
            Intent::Remove(id) => {
                let mut list = self.registry.selected_list().await?;
                let message = if list.remove(id, &self.records).await? {
                    format!("Removed {id} from '{}'", list.name())
                } else {
                    format!("Item {id} was not in '{}'", list.name())
                };
                Ok(Notification::success(message))
            }
            Intent::Rate(id, Some(rating)) => {
                self.records.set_rating(id, rating).await?;
                Ok(Notification::success(format!("Rated {id} {}", rating.stars())))
            }
            Intent::Rate(id, None) => {
                self.records.clear_rating(id).await?;
                Ok(Notification::success(format!("Cleared rating for {id}")))
            }
            Intent::RefreshAll => {
                let list = self.registry.selected_list().await?;
                let report = list
                    .refresh_all(&self.records, self.refresh_concurrency)
                    .await?;
                if report.failures.is_empty() {
                    Ok(Notification::success(report.summary()))
                } else {
                    Ok(Notification::failure(report.summary()))
                }
            }
            Intent::SwitchList(name) => {
                self.registry.select(&name).await?;
                Ok(Notification::success(format!(
                    "Switched to '{}'",
                    self.registry.selected()
                )))
            }
            Intent::CreateList(name) => {
                let list = self.registry.create(&name).await?;
                Ok(Notification::success(format!("Created list '{}'", list.name())))
            }
            Intent::DeleteList(name) => {
                self.registry.delete(&name).await?;
                Ok(Notification::success(format!("Deleted list '{}'", name.trim())))
            }
            Intent::RenameList { from, to } => {
                let list = self.registry.rename(&from, &to).await?;
                Ok(Notification::success(format!(
                    "Renamed '{}' to '{}'",
                    from.trim(),
                    list.name()
                )))
            }
            Intent::MergeList(source) => {
                let target = self.registry.selected().to_string();
                let report = self.registry.merge(&source, &target).await?;
                Ok(Notification::success(format!(
                    "Merged {} item(s) from '{}' into '{target}', {} already present",
                    report.added,
                    source.trim(),
                    report.duplicates
                )))
            }
            Intent::ImportHistory => self.import_history().await,
        }
    }

    /// Adds every work in the origin's viewing history to the active list.
    async fn import_history(&mut self) -> Result<Notification> {
        let entries = self
            .records
            .scraper()
            .fetch_history()
            .await
            .map_err(TrackerError::HistoryFailure)?;

        let mut list = self.registry.selected_list().await?;
        let (mut added, mut duplicates, mut failed) = (0usize, 0usize, 0usize);

        for entry in entries {
            if list.contains(entry.id) {
                duplicates += 1;
                continue;
            }
            match list.add(entry.id, &self.records).await {
                Ok(_) => added += 1,
                Err(error) if error.is_fetch_failure() => {
                    warn!(
                        id = %entry.id,
                        title = %entry.title,
                        error = %error_chain(&error),
                        "history item skipped"
                    );
                    failed += 1;
                }
                Err(error) => return Err(error),
            }
        }

        let mut message = format!(
            "Imported {added} item(s) from history, {duplicates} already listed"
        );
        if failed > 0 {
            message.push_str(&format!(", {failed} failed"));
            return Ok(Notification::failure(message));
        }
        Ok(Notification::success(message))
    }

    /// Records of the active list for display, plus how many members could not be resolved.
    ///
    /// Fetch failures and unreadable cached records skip the member; only a list that cannot be
    /// read at all is an error.
    async fn snapshot(&self) -> Result<(Vec<TrackedItemRecord>, usize)> {
        let list = self.registry.selected_list().await?;
        let mut records = Vec::with_capacity(list.len());
        let mut missing = 0;
        for id in list.ids() {
            match self.records.get(*id).await {
                Ok(record) => records.push(record),
                Err(error @ (TrackerError::FetchFailure { .. } | TrackerError::Storage(_))) => {
                    warn!(%id, error = %error_chain(&error), "item missing from view");
                    missing += 1;
                }
                Err(error) => return Err(error),
            }
        }
        Ok((records, missing))
    }
}
