use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Identifier of a work on the origin site (its `workId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedItemId(pub u64);

impl fmt::Display for TrackedItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrackedItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(TrackedItemId)
    }
}

impl From<u64> for TrackedItemId {
    fn from(value: u64) -> Self {
        TrackedItemId(value)
    }
}

/// User rating, one to five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl Rating {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn stars(self) -> String {
        let filled = self.value() as usize;
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

impl TryFrom<u8> for Rating {
    type Error = TrackerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Rating::One),
            2 => Ok(Rating::Two),
            3 => Ok(Rating::Three),
            4 => Ok(Rating::Four),
            5 => Ok(Rating::Five),
            other => Err(TrackerError::InvalidRating(other.to_string())),
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl FromStr for Rating {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<u8>()
            .map_err(|_| TrackerError::InvalidRating(trimmed.to_string()))?;
        Rating::try_from(value)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: String,
    pub number: u32,
    pub title: String,
    pub url: String,
    pub watched: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// A freshly scraped item, before any user state is attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedItem {
    pub id: TrackedItemId,
    pub title: String,
    pub description: String,
    pub season_tag: String,
    pub page_url: String,
    pub episodes: Vec<EpisodeRecord>,
}

/// One row of the origin's viewing history page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: TrackedItemId,
    pub title: String,
}

/// Cached snapshot of a tracked item plus the user's rating.
///
/// Watched state summaries (`all_watched`, `unwatched_count`, `updated_at`) are computed from
/// the episode list on every call, so they always agree with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedItemRecord {
    pub id: TrackedItemId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub season_tag: String,
    #[serde(default)]
    pub page_url: String,
    pub episodes: Vec<EpisodeRecord>,
    #[serde(default)]
    pub rating: Option<Rating>,
}

impl TrackedItemRecord {
    pub fn from_scraped(scraped: ScrapedItem, rating: Option<Rating>) -> Self {
        let mut episodes = scraped.episodes;
        episodes.sort_by_key(|episode| episode.number);

        Self {
            id: scraped.id,
            title: scraped.title,
            description: scraped.description,
            season_tag: scraped.season_tag,
            page_url: scraped.page_url,
            episodes,
            rating,
        }
    }

    pub fn all_watched(&self) -> bool {
        self.episodes.iter().all(|episode| episode.watched)
    }

    pub fn unwatched_count(&self) -> usize {
        self.episodes.iter().filter(|episode| !episode.watched).count()
    }

    /// Creation time of the latest episode.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.episodes.last().map(|episode| episode.created_at)
    }

    /// First episode in sequence order the user has not watched yet.
    pub fn next_unwatched(&self) -> Option<&EpisodeRecord> {
        self.episodes.iter().find(|episode| !episode.watched)
    }

    /// Where to send the user to keep watching.
    pub fn continue_url(&self) -> &str {
        self.next_unwatched()
            .map(|episode| episode.url.as_str())
            .unwrap_or(&self.page_url)
    }
}
