#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use watch_tracker::error::FetchError;
use watch_tracker::item_store::ItemRecordStore;
use watch_tracker::models::{EpisodeRecord, HistoryEntry, ScrapedItem, TrackedItemId};
use watch_tracker::origin::Scraper;
use watch_tracker::refresh_policy::RefreshPolicy;
use watch_tracker::storage::MemoryStore;
use watch_tracker::tracker::{Tracker, TrackerOptions};

/// Scraper double serving canned items, counting calls, failing on demand.
#[derive(Default)]
pub struct FakeScraper {
    items: Mutex<HashMap<TrackedItemId, ScrapedItem>>,
    failing: Mutex<HashSet<TrackedItemId>>,
    history: Mutex<Vec<HistoryEntry>>,
    calls: AtomicUsize,
    calls_by_id: Mutex<HashMap<TrackedItemId, usize>>,
}

impl FakeScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, item: ScrapedItem) -> Self {
        self.insert(item);
        self
    }

    pub fn insert(&self, item: ScrapedItem) {
        self.items.lock().unwrap().insert(item.id, item);
    }

    pub fn fail(&self, id: u64) {
        self.failing.lock().unwrap().insert(TrackedItemId(id));
    }

    pub fn recover(&self, id: u64) {
        self.failing.lock().unwrap().remove(&TrackedItemId(id));
    }

    pub fn set_history(&self, ids: &[u64]) {
        *self.history.lock().unwrap() = ids
            .iter()
            .map(|id| HistoryEntry {
                id: TrackedItemId(*id),
                title: format!("History {id}"),
            })
            .collect();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, id: u64) -> usize {
        self.calls_by_id
            .lock()
            .unwrap()
            .get(&TrackedItemId(id))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Scraper for FakeScraper {
    async fn fetch(&self, id: TrackedItemId) -> Result<ScrapedItem, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.calls_by_id.lock().unwrap().entry(id).or_insert(0) += 1;

        if self.failing.lock().unwrap().contains(&id) {
            return Err(FetchError::Status {
                url: format!("https://example.test/store/ci_pc?workId={id}"),
                status: 503,
            });
        }

        self.items
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: format!("https://example.test/store/ci_pc?workId={id}"),
                status: 404,
            })
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, FetchError> {
        Ok(self.history.lock().unwrap().clone())
    }
}

/// A work with `episodes` episodes, the first `watched` of them watched.
pub fn scraped(id: u64, title: &str, episodes: u32, watched: u32) -> ScrapedItem {
    ScrapedItem {
        id: TrackedItemId(id),
        title: title.to_string(),
        description: format!("Description of {title}"),
        season_tag: "2024年春".to_string(),
        page_url: format!("https://example.test/store/ci_pc?workId={id}"),
        episodes: (1..=episodes)
            .map(|number| EpisodeRecord {
                id: format!("episodePartId{id}{number:03}"),
                number,
                title: format!("Episode {number}"),
                url: format!("https://example.test/store/sc_d_pc?partId={id}{number:03}"),
                watched: number <= watched,
                created_at: Utc
                    .timestamp_millis_opt(1_700_000_000_000 + i64::from(number) * 604_800_000)
                    .unwrap(),
            })
            .collect(),
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub scraper: Arc<FakeScraper>,
    pub records: ItemRecordStore,
}

pub fn fixture(scraper: FakeScraper) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let scraper = Arc::new(scraper);
    let records = ItemRecordStore::new(store.clone(), scraper.clone(), RefreshPolicy::default());
    Fixture {
        store,
        scraper,
        records,
    }
}

pub async fn tracker(scraper: FakeScraper) -> (Tracker, Arc<FakeScraper>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let scraper = Arc::new(scraper);
    let tracker = Tracker::open(
        store.clone(),
        scraper.clone(),
        RefreshPolicy::default(),
        TrackerOptions::default(),
    )
    .await
    .unwrap();
    (tracker, scraper, store)
}
