use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::error::{Result, TrackerError, error_chain};
use crate::item_store::{ItemRecordStore, RefreshKind};
use crate::models::{TrackedItemId, TrackedItemRecord};
use crate::storage::{self, KeyValueStore, keys};

/// Named, ordered, duplicate-free collection of item ids.
///
/// A list only references items; their records stay in the item store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchList {
    name: String,
    items: Vec<TrackedItemId>,
}

/// An item that could not be refreshed; its last-known record was kept.
#[derive(Debug)]
pub struct RefreshFailure {
    pub id: TrackedItemId,
    pub error: TrackerError,
}

/// Result of refreshing every member of a list.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Records in list order. Failed items appear with their last-known record when one exists.
    pub records: Vec<TrackedItemRecord>,
    pub fetched: usize,
    pub skipped: usize,
    pub failures: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Refreshed {} item(s), {} already complete",
            self.fetched, self.skipped
        );
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failures.len()));
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub duplicates: usize,
}

impl WatchList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Loads the list stored under `name`; a list never written yet loads empty.
    pub async fn load(store: &dyn KeyValueStore, name: &str) -> Result<Self> {
        let items: Vec<TrackedItemId> = storage::load(store, &keys::list(name))
            .await?
            .unwrap_or_default();

        let mut list = Self::new(name);
        // Stored data predating the uniqueness rule is folded on load.
        for id in items {
            if !list.contains(id) {
                list.items.push(id);
            }
        }
        Ok(list)
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        storage::save(store, &keys::list(&self.name), &self.items).await?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn ids(&self) -> &[TrackedItemId] {
        &self.items
    }

    pub fn contains(&self, id: TrackedItemId) -> bool {
        self.items.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds an item, warming its cache entry. Duplicates are rejected so the caller can tell
    /// the user; a fetch failure leaves the list untouched.
    pub async fn add(
        &mut self,
        id: TrackedItemId,
        records: &ItemRecordStore,
    ) -> Result<TrackedItemRecord> {
        if self.contains(id) {
            return Err(TrackerError::DuplicateMember {
                list: self.name.clone(),
                id,
            });
        }

        let record = records.get(id).await?;
        self.items.push(id);
        self.save(records.kv()).await?;
        info!(list = %self.name, %id, title = %record.title, "item added");
        Ok(record)
    }

    /// Removes an item if present. Returns whether anything changed.
    pub async fn remove(&mut self, id: TrackedItemId, records: &ItemRecordStore) -> Result<bool> {
        let before = self.items.len();
        self.items.retain(|member| *member != id);
        let removed = self.items.len() != before;

        self.save(records.kv()).await?;
        if removed {
            info!(list = %self.name, %id, "item removed");
        }
        Ok(removed)
    }

    /// Refreshes every member, at most `concurrency` at a time.
    ///
    /// A failing item does not stop the others: it is reported in `failures` and keeps its
    /// last-known record.
    pub async fn refresh_all(
        &self,
        records: &ItemRecordStore,
        concurrency: usize,
    ) -> Result<RefreshReport> {
        let outcomes: Vec<_> = stream::iter(self.items.iter().copied())
            .map(|id| async move { (id, records.refresh_with_kind(id).await) })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut report = RefreshReport::default();
        for (id, outcome) in outcomes {
            match outcome {
                Ok((record, kind)) => {
                    match kind {
                        RefreshKind::Fetched => report.fetched += 1,
                        RefreshKind::Skipped => report.skipped += 1,
                    }
                    report.records.push(record);
                }
                Err(error) => {
                    warn!(
                        list = %self.name,
                        %id,
                        error = %error_chain(&error),
                        "refresh failed, keeping cached record"
                    );
                    if let Ok(Some(record)) = records.cached(id).await {
                        report.records.push(record);
                    }
                    report.failures.push(RefreshFailure { id, error });
                }
            }
        }

        self.save(records.kv()).await?;
        info!(list = %self.name, "{}", report.summary());
        Ok(report)
    }

    /// Full records in list order, fetching any that are not cached.
    pub async fn get_list(&self, records: &ItemRecordStore) -> Result<Vec<TrackedItemRecord>> {
        let mut resolved = Vec::with_capacity(self.items.len());
        for id in &self.items {
            resolved.push(records.get(*id).await?);
        }
        Ok(resolved)
    }

    /// Appends the members of `other` that are not already here, keeping their order.
    pub fn merge_from(&mut self, other: &WatchList) -> MergeReport {
        let mut report = MergeReport::default();
        for id in other.ids() {
            if self.contains(*id) {
                report.duplicates += 1;
            } else {
                self.items.push(*id);
                report.added += 1;
            }
        }
        report
    }
}
