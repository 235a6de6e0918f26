use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::models::{Rating, ScrapedItem, TrackedItemId, TrackedItemRecord};
use crate::origin::Scraper;
use crate::refresh_policy::RefreshPolicy;
use crate::storage::{self, KeyValueStore, keys};

/// How a refresh was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// The origin was scraped and the snapshot replaced.
    Fetched,
    /// The refresh policy kept the cached record.
    Skipped,
}

/// Cached-snapshot accessor for single tracked items.
///
/// Owns the fetch-or-return-cached decision and the rating mutation path. Records are keyed
/// `item:<id>` and are never deleted by list operations.
pub struct ItemRecordStore {
    store: Arc<dyn KeyValueStore>,
    scraper: Arc<dyn Scraper>,
    policy: RefreshPolicy,
}

impl ItemRecordStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        scraper: Arc<dyn Scraper>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            scraper,
            policy,
        }
    }

    pub fn kv(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn scraper(&self) -> &dyn Scraper {
        self.scraper.as_ref()
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// Cached record, without touching the origin.
    pub async fn cached(&self, id: TrackedItemId) -> Result<Option<TrackedItemRecord>> {
        Ok(storage::load(self.kv(), &keys::item(id)).await?)
    }

    /// Cached record, or a freshly fetched one on a miss. Never reports "not found".
    pub async fn get(&self, id: TrackedItemId) -> Result<TrackedItemRecord> {
        if let Some(record) = self.cached(id).await? {
            debug!(%id, "cache hit");
            return Ok(record);
        }

        debug!(%id, "cache miss, fetching from origin");
        let record = TrackedItemRecord::from_scraped(self.fetch(id).await?, None);
        self.put(&record).await?;
        Ok(record)
    }

    /// Makes sure the item is cached, fetching it if needed.
    pub async fn ensure_cached(&self, id: TrackedItemId) -> Result<TrackedItemRecord> {
        self.get(id).await
    }

    /// Re-fetches the item, keeping its rating.
    pub async fn refresh(&self, id: TrackedItemId) -> Result<TrackedItemRecord> {
        self.refresh_with_kind(id).await.map(|(record, _)| record)
    }

    pub async fn refresh_with_kind(
        &self,
        id: TrackedItemId,
    ) -> Result<(TrackedItemRecord, RefreshKind)> {
        let previous = self.cached(id).await?;

        if let Some(existing) = &previous
            && self.policy.should_skip_refresh(existing)
        {
            debug!(%id, "refresh skipped by policy");
            return Ok((existing.clone(), RefreshKind::Skipped));
        }

        let scraped = self.fetch(id).await?;
        // Re-read so a rating written while the fetch was in flight is not lost.
        let rating = match self.cached(id).await? {
            Some(current) => current.rating,
            None => previous.and_then(|record| record.rating),
        };

        let record = TrackedItemRecord::from_scraped(scraped, rating);
        self.put(&record).await?;
        info!(%id, unwatched = record.unwatched_count(), "item refreshed");
        Ok((record, RefreshKind::Fetched))
    }

    /// Rates a cached item. Rating never reaches out to the origin: an uncached item fails
    /// with `NotCached`, and callers that want it warmed call `ensure_cached` first.
    pub async fn set_rating(&self, id: TrackedItemId, rating: Rating) -> Result<()> {
        self.update_rating(id, Some(rating)).await
    }

    pub async fn clear_rating(&self, id: TrackedItemId) -> Result<()> {
        self.update_rating(id, None).await
    }

    async fn update_rating(&self, id: TrackedItemId, rating: Option<Rating>) -> Result<()> {
        let mut record = self
            .cached(id)
            .await?
            .ok_or(TrackerError::NotCached(id))?;
        record.rating = rating;
        self.put(&record).await?;
        info!(%id, rating = ?rating.map(Rating::value), "rating updated");
        Ok(())
    }

    async fn fetch(&self, id: TrackedItemId) -> Result<ScrapedItem> {
        self.scraper
            .fetch(id)
            .await
            .map_err(|source| TrackerError::FetchFailure { id, source })
    }

    async fn put(&self, record: &TrackedItemRecord) -> Result<()> {
        storage::save(self.kv(), &keys::item(record.id), record).await?;
        Ok(())
    }
}
