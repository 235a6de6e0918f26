use chrono::{DateTime, Utc};

use crate::models::TrackedItemRecord;

/// Hours below one day, whole days above.
pub fn format_elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(since);
    let days = elapsed.num_days();
    if days < 1 {
        let hours = elapsed.num_hours().max(0);
        format!("{hours}h ago")
    } else {
        format!("{days}d ago")
    }
}

pub fn status_label(record: &TrackedItemRecord) -> String {
    if record.all_watched() {
        "all watched".to_string()
    } else {
        format!("{} unwatched", record.unwatched_count())
    }
}

pub fn rating_label(record: &TrackedItemRecord) -> String {
    record
        .rating
        .map(|rating| rating.stars())
        .unwrap_or_else(|| "-".to_string())
}

pub fn updated_label(record: &TrackedItemRecord, now: DateTime<Utc>) -> String {
    record
        .updated_at()
        .map(|updated_at| format_elapsed(updated_at, now))
        .unwrap_or_else(|| "-".to_string())
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
