// Integration tests for the cached item record store

mod common;

use common::{FakeScraper, fixture, scraped};
use watch_tracker::error::TrackerError;
use watch_tracker::item_store::RefreshKind;
use watch_tracker::models::{Rating, TrackedItemId};

#[tokio::test]
async fn test_get_fetches_once_then_serves_cache() {
    let f = fixture(FakeScraper::new().with_item(scraped(101, "Seasonal", 12, 10)));

    let first = f.records.get(TrackedItemId(101)).await.unwrap();
    let second = f.records.get(TrackedItemId(101)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(f.scraper.calls(), 1);
    assert_eq!(first.rating, None);
    assert_eq!(first.unwatched_count(), 2);
    assert!(!first.all_watched());
    assert_eq!(f.store.keys().await, vec!["item:101".to_string()]);
}

#[tokio::test]
async fn test_get_failure_caches_nothing() {
    let scraper = FakeScraper::new().with_item(scraped(5, "Broken", 3, 0));
    scraper.fail(5);
    let f = fixture(scraper);

    let err = f.records.get(TrackedItemId(5)).await.unwrap_err();

    assert!(matches!(err, TrackerError::FetchFailure { id, .. } if id == TrackedItemId(5)));
    assert!(f.records.cached(TrackedItemId(5)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_keeps_rating_and_takes_new_episodes() {
    let f = fixture(FakeScraper::new().with_item(scraped(101, "Seasonal", 12, 10)));
    f.records.get(TrackedItemId(101)).await.unwrap();
    f.records
        .set_rating(TrackedItemId(101), Rating::Four)
        .await
        .unwrap();

    f.scraper.insert(scraped(101, "Seasonal", 13, 12));
    let refreshed = f.records.refresh(TrackedItemId(101)).await.unwrap();

    assert_eq!(refreshed.rating, Some(Rating::Four));
    assert_eq!(refreshed.episodes.len(), 13);
    assert_eq!(refreshed.unwatched_count(), 1);
    assert_eq!(f.scraper.calls(), 2);
    assert_eq!(
        f.records.cached(TrackedItemId(101)).await.unwrap(),
        Some(refreshed)
    );
}

#[tokio::test]
async fn test_rating_set_and_clear() {
    let f = fixture(FakeScraper::new().with_item(scraped(7, "Show", 2, 1)));
    f.records.get(TrackedItemId(7)).await.unwrap();

    f.records.set_rating(TrackedItemId(7), Rating::Four).await.unwrap();
    let rated = f.records.get(TrackedItemId(7)).await.unwrap();
    assert_eq!(rated.rating.map(Rating::value), Some(4));

    f.records.clear_rating(TrackedItemId(7)).await.unwrap();
    let cleared = f.records.get(TrackedItemId(7)).await.unwrap();
    assert_eq!(cleared.rating, None);

    assert_eq!(f.scraper.calls(), 1);
}

#[tokio::test]
async fn test_rating_uncached_item_does_not_fetch() {
    let f = fixture(FakeScraper::new().with_item(scraped(8, "Show", 2, 0)));

    let err = f
        .records
        .set_rating(TrackedItemId(8), Rating::Two)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotCached(id) if id == TrackedItemId(8)));
    assert_eq!(f.scraper.calls(), 0);

    f.records.ensure_cached(TrackedItemId(8)).await.unwrap();
    f.records.set_rating(TrackedItemId(8), Rating::Two).await.unwrap();
    assert_eq!(
        f.records.cached(TrackedItemId(8)).await.unwrap().unwrap().rating,
        Some(Rating::Two)
    );
}

#[tokio::test]
async fn test_complete_and_watched_item_skips_refresh() {
    let f = fixture(FakeScraper::new().with_item(scraped(202, "Finished（全12話）", 12, 12)));
    let cached = f.records.get(TrackedItemId(202)).await.unwrap();

    let (record, kind) = f
        .records
        .refresh_with_kind(TrackedItemId(202))
        .await
        .unwrap();

    assert_eq!(kind, RefreshKind::Skipped);
    assert_eq!(record, cached);
    assert_eq!(f.scraper.calls_for(202), 1);
}

#[tokio::test]
async fn test_complete_but_unwatched_item_is_refreshed() {
    let f = fixture(FakeScraper::new().with_item(scraped(203, "Finished（全12話）", 12, 11)));
    f.records.get(TrackedItemId(203)).await.unwrap();

    let (record, kind) = f
        .records
        .refresh_with_kind(TrackedItemId(203))
        .await
        .unwrap();

    assert_eq!(kind, RefreshKind::Fetched);
    assert_eq!(record.unwatched_count(), 1);
    assert_eq!(f.scraper.calls_for(203), 2);
}

#[tokio::test]
async fn test_refresh_failure_keeps_cached_record() {
    let f = fixture(FakeScraper::new().with_item(scraped(9, "Show", 4, 1)));
    let before = f.records.get(TrackedItemId(9)).await.unwrap();

    f.scraper.fail(9);
    let err = f.records.refresh(TrackedItemId(9)).await.unwrap_err();

    assert!(err.is_fetch_failure());
    assert_eq!(f.records.cached(TrackedItemId(9)).await.unwrap(), Some(before));
}
