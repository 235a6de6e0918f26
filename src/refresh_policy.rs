use regex::Regex;
use tracing::debug;

use crate::models::TrackedItemRecord;

/// The "（全12話）" annotation the origin appends to the title of a finished series, in
/// full-width or half-width brackets but never a mix of the two.
pub const DEFAULT_COMPLETE_MARKER: &str = r"（全\d+話）$|\(全\d+話\)$";

/// Decides whether a cached record can skip a re-fetch.
#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    complete_marker: Regex,
}

impl RefreshPolicy {
    /// Builds a policy from a marker pattern. The pattern is matched against the trimmed title
    /// and should be anchored; a loose pattern would freeze records that can still grow.
    pub fn new(complete_marker: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            complete_marker: Regex::new(complete_marker)?,
        })
    }

    pub fn marker(&self) -> &str {
        self.complete_marker.as_str()
    }

    pub fn is_complete_series(&self, title: &str) -> bool {
        self.complete_marker.is_match(title.trim())
    }

    /// A finished series the user has fully watched cannot gain episodes.
    pub fn should_skip_refresh(&self, record: &TrackedItemRecord) -> bool {
        let skip = record.all_watched() && self.is_complete_series(&record.title);
        if skip {
            debug!(id = %record.id, title = %record.title, "complete and fully watched");
        }
        skip
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            complete_marker: Regex::new(DEFAULT_COMPLETE_MARKER)
                .expect("default marker is a valid pattern"),
        }
    }
}
