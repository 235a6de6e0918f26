use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{HistoryEntry, ScrapedItem, TrackedItemId};

pub mod danime;

pub use danime::{DanimeScraper, parse_history_page, parse_item_page};

/// Source of fresh item snapshots.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn fetch(&self, id: TrackedItemId) -> Result<ScrapedItem, FetchError>;

    /// Works the user recently watched on the origin, newest first.
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, FetchError> {
        Ok(Vec::new())
    }
}
